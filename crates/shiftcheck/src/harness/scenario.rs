use super::ConfigError;
use serde::{Deserialize, Serialize};

/// Which checks run during a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseChecks {
    /// Compare the sampled output against the model at every event.
    pub per_event: bool,
    /// Number of ones that must appear on the output over the phase.
    pub expected_tally: Option<u64>,
}

impl Default for PhaseChecks {
    fn default() -> Self {
        Self {
            per_event: true,
            expected_tally: None,
        }
    }
}

/// Hold `input` for `events` shift events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub input: bool,
    pub events: u64,
    #[serde(default)]
    pub checks: PhaseChecks,
}

impl Phase {
    pub fn new(name: &str, input: bool, events: u64) -> Self {
        Self {
            name: name.to_string(),
            input,
            events,
            checks: PhaseChecks::default(),
        }
    }

    pub fn expect_tally(mut self, ones: u64) -> Self {
        self.checks.expected_tally = Some(ones);
        self
    }

    /// Only the aggregate tally is checked.
    pub fn tally_only(mut self) -> Self {
        self.checks.per_event = false;
        self
    }
}

/// Outcome of one completed phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub name: String,
    pub input: bool,
    pub events: u64,
    pub ones: u64,
    pub expected_tally: Option<u64>,
}

/// An ordered list of phases run after reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub phases: Vec<Phase>,
    /// Ones expected on the output across the whole scenario.
    #[serde(default)]
    pub expected_total: Option<u64>,
}

impl Scenario {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            phases: Vec::new(),
            expected_total: None,
        }
    }

    pub fn phase(mut self, phase: Phase) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn expect_total(mut self, ones: u64) -> Self {
        self.expected_total = Some(ones);
        self
    }

    /// Drain with zeros, fill with `depth + 1` ones, drain again.
    pub fn standard(depth: usize) -> Self {
        let n = depth as u64;
        Self::new("standard")
            .phase(Phase::new("drain", false, n).expect_tally(0))
            .phase(Phase::new("fill", true, n + 1).expect_tally(1))
            .phase(Phase::new("drain_again", false, n).expect_tally(n))
            .expect_total(n + 1)
    }

    /// `len` ones right after reset, then zeros up to `2 * depth` events.
    pub fn pulse(depth: usize, len: u64) -> Result<Self, ConfigError> {
        let n = depth as u64;
        if len == 0 || len > n {
            return Err(ConfigError::new(
                "pulse_len",
                format!("must lie in 1..={n} (got {len})"),
            ));
        }
        Ok(Self::new("pulse")
            .phase(Phase::new("inject", true, len).expect_tally(0))
            .phase(Phase::new("flush", false, 2 * n - len).expect_tally(len))
            .expect_total(len))
    }

    /// `depth + 1` ones straight after reset; exactly the last sample is 1.
    pub fn fill_only(depth: usize) -> Self {
        let n = depth as u64;
        Self::new("fill_only")
            .phase(Phase::new("fill", true, n + 1).expect_tally(1))
            .expect_total(1)
    }

    /// `depth + 1` ones straight after reset, then `depth + 1` zeros.
    pub fn fill_flush(depth: usize) -> Self {
        let n = depth as u64;
        Self::new("fill_flush")
            .phase(Phase::new("fill", true, n + 1).expect_tally(1))
            .phase(Phase::new("flush", false, n + 1).expect_tally(n))
            .expect_total(n + 1)
    }

    /// Parses a `[scenario]` table.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::new("scenario", e.to_string()))
    }

    pub fn total_events(&self) -> u64 {
        self.phases.iter().map(|p| p.events).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.phases.is_empty() {
            return Err(ConfigError::new("phases", "scenario has no phases"));
        }
        for (i, phase) in self.phases.iter().enumerate() {
            if phase.name.is_empty() {
                return Err(ConfigError::new(
                    format!("phases[{i}].name"),
                    "must not be empty",
                ));
            }
            if phase.events == 0 {
                return Err(ConfigError::new(
                    format!("phases[{i}].events"),
                    "a phase needs at least one shift event",
                ));
            }
            if let Some(expected) = phase.checks.expected_tally {
                if expected > phase.events {
                    return Err(ConfigError::new(
                        format!("phases[{i}].checks.expected_tally"),
                        format!("{expected} ones cannot appear in {} events", phase.events),
                    ));
                }
            }
        }
        if let Some(expected) = self.expected_total {
            let total = self.total_events();
            if expected > total {
                return Err(ConfigError::new(
                    "expected_total",
                    format!("{expected} ones cannot appear in {total} events"),
                ));
            }
        }
        Ok(())
    }
}
