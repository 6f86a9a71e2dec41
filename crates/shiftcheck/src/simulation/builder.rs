use super::{Simulation, SimulatorError};
use crate::{device::Device, signal::SignalTable};

/// A fluent builder for a [`Simulation`] around a single device.
pub struct SimulationBuilder {
    device: Box<dyn Device>,
    time_limit: Option<u64>,
}

impl SimulationBuilder {
    pub(crate) fn new(device: Box<dyn Device>) -> Self {
        Self {
            device,
            time_limit: None,
        }
    }

    /// Abort waits that would run past `ticks` of simulated time.
    pub fn time_limit(mut self, ticks: u64) -> Self {
        self.time_limit = Some(ticks);
        self
    }

    pub fn build(self) -> Result<Simulation, SimulatorError> {
        let Self {
            mut device,
            time_limit,
        } = self;
        let ports = device.ports();
        if ports.is_empty() {
            return Err(SimulatorError::NoPorts);
        }
        let signals = SignalTable::new(ports)?;
        device.bind(&signals)?;

        let mut sim = Simulation::new(device, signals);
        sim.time_limit = time_limit;
        sim.settle()?;
        Ok(sim)
    }
}
