//! Cycle-accurate verification harness for parameterizable serial shift registers.
//!
//! A [`Simulation`] runs a [`Device`] (the unit under test) on a
//! discrete-event timeline. The [`ScenarioRunner`] drives clock, reset and
//! data into it, predicts the serial output with a [`ShiftRegisterModel`],
//! and checks every shift event with an [`AssertionEngine`].

mod device;
mod harness;
mod model;
mod scheduler;
mod signal;
mod simulation;

pub use device::{Device, DeviceContext, ShiftRegisterDevice, ShiftTrigger};
pub use harness::{
    AssertionEngine, ClockConfig, ClockGenerator, ConfigError, EventContext, HarnessConfig,
    HarnessError, MAX_TICKS, Phase, PhaseChecks, PhaseReport, PortNames, ResetPlan,
    ResetPolarity, ResetSequencer, Scenario, ScenarioReport, ScenarioRunner, ShiftMode,
    StimulusDriver, Step, ToggleTiming,
};
pub use model::ShiftRegisterModel;
pub use signal::{MAX_WIDTH, PortDecl, PortDirection, SignalRef, SignalTable};
pub use simulation::{RuntimeErrorCode, Simulation, SimulationBuilder, SimulatorError, Trigger};

pub(crate) use fxhash::FxHashMap as HashMap;

/// Write access to the port values, handed to [`Simulation::modify`].
pub struct IOContext<'a> {
    pub(crate) signals: &'a mut SignalTable,
    pub(crate) error: Option<RuntimeErrorCode>,
}

impl IOContext<'_> {
    pub fn set<T: Into<u64>>(&mut self, signal: SignalRef, val: T) {
        let res = self.signals.set(signal, val.into());
        self.record(res);
    }

    pub fn set_bit(&mut self, signal: SignalRef, bit: usize, val: bool) {
        let res = self.signals.set_bit(signal, bit, val);
        self.record(res);
    }

    /// Writes the complement of the current bit value.
    pub fn toggle_bit(&mut self, signal: SignalRef, bit: usize) {
        let res = self
            .signals
            .get_bit(signal, bit)
            .and_then(|cur| self.signals.set_bit(signal, bit, !cur));
        self.record(res);
    }

    pub fn get(&self, signal: SignalRef) -> u64 {
        self.signals.get(signal)
    }

    fn record(&mut self, res: Result<(), RuntimeErrorCode>) {
        if let Err(err) = res {
            if self.error.is_none() {
                self.error = Some(err);
            }
        }
    }
}
