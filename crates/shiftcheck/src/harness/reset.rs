use super::{HarnessError, ResetPlan, Step, StimulusDriver};
use crate::{Simulation, Trigger, signal::SignalRef};

/// Drives reset through assert, hold and release.
#[derive(Debug, Clone, Copy)]
pub struct ResetSequencer {
    signal: SignalRef,
    clock: Option<SignalRef>,
}

impl ResetSequencer {
    /// `clock`: when set, [`ResetSequencer::apply_reset`] returns only after
    /// the first rising edge following release.
    pub fn new(signal: SignalRef, clock: Option<SignalRef>) -> Self {
        Self { signal, clock }
    }

    pub fn apply_reset(
        &self,
        sim: &mut Simulation,
        driver: &mut StimulusDriver,
        plan: &ResetPlan,
    ) -> Result<(), HarnessError> {
        plan.validate()?;
        let active = plan.polarity.active_level();

        log::info!("Resetting the shift register");
        driver.apply(
            sim,
            Step::SetBit {
                signal: self.signal,
                bit: 0,
                value: active,
            },
        )?;
        driver.apply(sim, Step::Wait(plan.assert_duration_ticks))?;
        driver.apply(
            sim,
            Step::SetBit {
                signal: self.signal,
                bit: 0,
                value: !active,
            },
        )?;

        if let Some(clock) = self.clock {
            sim.wait(Trigger::RisingEdge(clock))?;
        }
        log::info!("Reset released at t={}", sim.time());
        Ok(())
    }
}
