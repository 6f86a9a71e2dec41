use super::{HarnessError, Phase, PhaseReport};

/// Where a sample was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext<'a> {
    pub phase: &'a str,
    /// Shift event index, counted from the first event after reset.
    pub event: u64,
    /// Simulated time of the sample.
    pub time: u64,
}

/// Compares predicted and sampled outputs and keeps running statistics.
#[derive(Debug, Default)]
pub struct AssertionEngine {
    checks: u64,
    phase_events: u64,
    phase_ones: u64,
    total_events: u64,
    total_ones: u64,
    phases: Vec<PhaseReport>,
}

impl AssertionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails on the first difference between `predicted` and `actual`.
    pub fn check(
        &mut self,
        predicted: bool,
        actual: bool,
        ctx: &EventContext<'_>,
    ) -> Result<(), HarnessError> {
        self.checks += 1;
        if predicted != actual {
            return Err(HarnessError::Mismatch {
                phase: ctx.phase.to_string(),
                event: ctx.event,
                time: ctx.time,
                expected: u8::from(predicted),
                actual: u8::from(actual),
            });
        }
        Ok(())
    }

    /// Adds one sampled output bit to the phase and scenario tallies.
    pub fn tally(&mut self, actual: bool) {
        let bit = u64::from(actual);
        self.phase_events += 1;
        self.phase_ones += bit;
        self.total_events += 1;
        self.total_ones += bit;
    }

    pub fn checks(&self) -> u64 {
        self.checks
    }

    pub fn phase_tally(&self) -> u64 {
        self.phase_ones
    }

    pub fn total_tally(&self) -> u64 {
        self.total_ones
    }

    pub fn total_events(&self) -> u64 {
        self.total_events
    }

    pub fn phases(&self) -> &[PhaseReport] {
        &self.phases
    }

    /// Closes the running phase, checking its tally if one is expected.
    pub fn finish_phase(&mut self, phase: &Phase) -> Result<(), HarnessError> {
        let report = PhaseReport {
            name: phase.name.clone(),
            input: phase.input,
            events: self.phase_events,
            ones: self.phase_ones,
            expected_tally: phase.checks.expected_tally,
        };
        self.phase_events = 0;
        self.phase_ones = 0;

        let observed = report.ones;
        self.phases.push(report);
        match phase.checks.expected_tally {
            Some(expected) if expected != observed => Err(HarnessError::AggregateMismatch {
                scope: format!("phase '{}'", phase.name),
                expected,
                observed,
            }),
            _ => Ok(()),
        }
    }

    pub fn check_total(&self, scenario: &str, expected: u64) -> Result<(), HarnessError> {
        if expected != self.total_ones {
            return Err(HarnessError::AggregateMismatch {
                scope: format!("scenario '{}'", scenario),
                expected,
                observed: self.total_ones,
            });
        }
        Ok(())
    }
}
