use super::HarnessError;
use crate::{HashMap, Simulation, Trigger, signal::SignalRef};

/// One stimulus action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Absolute single-bit write; takes effect immediately.
    SetBit {
        signal: SignalRef,
        bit: usize,
        value: bool,
    },
    /// Absolute whole-bus write; takes effect immediately.
    SetValue { signal: SignalRef, value: u64 },
    /// Writes the complement of the current bit.
    ToggleBit { signal: SignalRef, bit: usize },
    /// Suspends the caller for exactly this many ticks.
    Wait(u64),
}

/// Applies [`Step`]s to a simulation.
///
/// Writes to the same signal are never coalesced: a second write within the
/// tick of the previous one is delayed by one tick so that every
/// intermediate value is visible to the device for at least one tick.
#[derive(Debug, Default)]
pub struct StimulusDriver {
    last_write: HashMap<SignalRef, u64>,
    writes: u64,
}

impl StimulusDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes applied so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    pub fn apply(&mut self, sim: &mut Simulation, step: Step) -> Result<(), HarnessError> {
        match step {
            Step::SetBit { signal, bit, value } => {
                self.before_write(sim, signal)?;
                sim.modify(|io| io.set_bit(signal, bit, value))?;
            }
            Step::SetValue { signal, value } => {
                self.before_write(sim, signal)?;
                sim.modify(|io| io.set(signal, value))?;
            }
            Step::ToggleBit { signal, bit } => {
                self.before_write(sim, signal)?;
                sim.modify(|io| io.toggle_bit(signal, bit))?;
            }
            Step::Wait(ticks) => sim.wait(Trigger::Timer(ticks))?,
        }
        Ok(())
    }

    pub fn apply_all<I>(&mut self, sim: &mut Simulation, steps: I) -> Result<(), HarnessError>
    where
        I: IntoIterator<Item = Step>,
    {
        steps
            .into_iter()
            .try_for_each(|step| self.apply(sim, step))
    }

    fn before_write(
        &mut self,
        sim: &mut Simulation,
        signal: SignalRef,
    ) -> Result<(), HarnessError> {
        if self.last_write.get(&signal) == Some(&sim.time()) {
            sim.wait(Trigger::Timer(1))?;
        }
        self.last_write.insert(signal, sim.time());
        self.writes += 1;
        Ok(())
    }
}
