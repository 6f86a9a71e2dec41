use super::{ClockConfig, HarnessError};
use crate::{Simulation, signal::SignalRef};

/// Free-running two-phase clock on a 1-bit signal.
///
/// The clock lives in the kernel's event queue and keeps toggling until
/// [`Simulation::cancel_clocks`] is called.
#[derive(Debug, Clone, Copy)]
pub struct ClockGenerator {
    signal: SignalRef,
    config: ClockConfig,
}

impl ClockGenerator {
    pub fn new(signal: SignalRef, config: ClockConfig) -> Self {
        Self { signal, config }
    }

    pub fn signal(&self) -> SignalRef {
        self.signal
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn start(&self, sim: &mut Simulation) -> Result<(), HarnessError> {
        self.config.validate()?;
        sim.modify(|io| io.set(self.signal, 0u8))?;
        sim.add_clock(
            self.signal,
            self.config.high(),
            self.config.low(),
            self.config.initial_delay,
        )?;
        log::debug!(
            "clock '{}' started: period {} (high {}, low {})",
            sim.signals().name(self.signal),
            self.config.period_ticks,
            self.config.high(),
            self.config.low()
        );
        Ok(())
    }
}
