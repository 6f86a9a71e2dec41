use super::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Largest tick count accepted for any configured delay, duration or period.
pub const MAX_TICKS: u64 = 1 << 40;

fn check_ticks(field: &str, ticks: u64) -> Result<(), ConfigError> {
    if ticks > MAX_TICKS {
        return Err(ConfigError::new(
            field,
            format!("must not exceed {MAX_TICKS} ticks (got {ticks})"),
        ));
    }
    Ok(())
}

/// What counts as a shift event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftMode {
    /// Every rising edge of the clock shifts the register.
    #[default]
    Clock,
    /// Every transition of the strobe bit shifts the register.
    Toggle,
}

impl std::fmt::Display for ShiftMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clock => write!(f, "clock"),
            Self::Toggle => write!(f, "toggle"),
        }
    }
}

/// When the strobe bit is flipped in toggle-driven mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ToggleTiming {
    /// Flip, then sample after `ticks`, without waiting for any edge.
    FixedInterval { ticks: u64 },
    /// Flip right after each rising clock edge, then sample after the settle time.
    OnClockEdge,
}

impl Default for ToggleTiming {
    fn default() -> Self {
        Self::FixedInterval { ticks: 10 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl ResetPolarity {
    /// Level of the reset line while reset is asserted.
    pub fn active_level(self) -> bool {
        matches!(self, Self::ActiveHigh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub period_ticks: u64,
    /// Length of the high phase; half the period when unset.
    pub high_ticks: Option<u64>,
    /// Time of the first rising edge.
    pub initial_delay: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            period_ticks: 10,
            high_ticks: None,
            initial_delay: 0,
        }
    }
}

impl ClockConfig {
    pub fn with_period(period_ticks: u64) -> Self {
        Self {
            period_ticks,
            ..Self::default()
        }
    }

    pub fn high(&self) -> u64 {
        self.high_ticks.unwrap_or(self.period_ticks / 2)
    }

    pub fn low(&self) -> u64 {
        self.period_ticks.saturating_sub(self.high())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_ticks("clock.period_ticks", self.period_ticks)?;
        check_ticks("clock.initial_delay", self.initial_delay)?;
        if self.period_ticks < 2 {
            return Err(ConfigError::new(
                "clock.period_ticks",
                "must be at least 2 so that both clock phases last one tick",
            ));
        }
        let high = self.high();
        if high == 0 || high >= self.period_ticks {
            return Err(ConfigError::new(
                "clock.high_ticks",
                format!("must lie in 1..{} (got {high})", self.period_ticks),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResetPlan {
    pub assert_duration_ticks: u64,
    pub polarity: ResetPolarity,
}

impl Default for ResetPlan {
    fn default() -> Self {
        Self {
            assert_duration_ticks: 20,
            polarity: ResetPolarity::ActiveLow,
        }
    }
}

impl ResetPlan {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assert_duration_ticks == 0 {
            return Err(ConfigError::new(
                "reset.assert_duration_ticks",
                "must be greater than zero",
            ));
        }
        check_ticks("reset.assert_duration_ticks", self.assert_duration_ticks)
    }
}

/// Names of the ports the harness drives and samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortNames {
    pub clock: String,
    pub reset: String,
    pub input: String,
    pub output: String,
}

impl Default for PortNames {
    fn default() -> Self {
        Self {
            clock: "clk".to_string(),
            reset: "rst_n".to_string(),
            input: "ui_in".to_string(),
            output: "uo_out".to_string(),
        }
    }
}

/// Everything the scenario runner needs besides the phase list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Register depth (`SR_LEN`).
    pub depth: usize,
    pub mode: ShiftMode,
    /// `None` runs without a clock; only valid in toggle mode with a fixed interval.
    pub clock: Option<ClockConfig>,
    pub reset: ResetPlan,
    pub toggle: ToggleTiming,
    /// Bit of the input bus carrying serial data.
    pub data_bit: usize,
    /// Bit of the input bus used as shift strobe in toggle mode.
    pub strobe_bit: usize,
    /// Bit of the output bus carrying the serial output.
    pub output_bit: usize,
    /// Delay between a shift event and the output sample.
    pub settle_ticks: u64,
    /// Hard limit on simulated time; derived from the scenario when unset.
    pub max_ticks: Option<u64>,
    pub ports: PortNames,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            depth: 8,
            mode: ShiftMode::Clock,
            clock: Some(ClockConfig::default()),
            reset: ResetPlan::default(),
            toggle: ToggleTiming::default(),
            data_bit: 0,
            strobe_bit: 1,
            output_bit: 0,
            settle_ticks: 10,
            max_ticks: None,
            ports: PortNames::default(),
        }
    }
}

impl HarnessConfig {
    pub fn new(depth: usize, mode: ShiftMode) -> Self {
        Self {
            depth,
            mode,
            ..Self::default()
        }
    }

    /// Parses a `[harness]` table.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::new("harness", e.to_string()))
    }

    pub fn clock(mut self, clock: Option<ClockConfig>) -> Self {
        self.clock = clock;
        self
    }

    pub fn reset(mut self, reset: ResetPlan) -> Self {
        self.reset = reset;
        self
    }

    pub fn toggle(mut self, toggle: ToggleTiming) -> Self {
        self.toggle = toggle;
        self
    }

    pub fn settle_ticks(mut self, ticks: u64) -> Self {
        self.settle_ticks = ticks;
        self
    }

    pub fn max_ticks(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.depth == 0 {
            return Err(ConfigError::new(
                "depth",
                "a shift register needs at least one stage",
            ));
        }
        if let Some(clock) = &self.clock {
            clock.validate()?;
        }
        self.reset.validate()?;
        check_ticks("settle_ticks", self.settle_ticks)?;
        if let ToggleTiming::FixedInterval { ticks } = self.toggle {
            check_ticks("toggle.ticks", ticks)?;
        }

        match (self.mode, self.toggle, &self.clock) {
            (ShiftMode::Clock, _, None) => {
                return Err(ConfigError::new("clock", "clock-driven mode requires a clock"));
            }
            (ShiftMode::Clock, _, Some(clock)) if self.settle_ticks > clock.period_ticks => {
                return Err(ConfigError::new(
                    "settle_ticks",
                    format!(
                        "must not exceed the clock period ({} > {})",
                        self.settle_ticks, clock.period_ticks
                    ),
                ));
            }
            (ShiftMode::Toggle, ToggleTiming::OnClockEdge, None) => {
                return Err(ConfigError::new(
                    "toggle",
                    "toggling on clock edges requires a clock",
                ));
            }
            (ShiftMode::Toggle, ToggleTiming::OnClockEdge, Some(clock))
                if self.settle_ticks + 1 > clock.period_ticks =>
            {
                return Err(ConfigError::new(
                    "settle_ticks",
                    format!(
                        "must be shorter than the clock period ({} >= {})",
                        self.settle_ticks, clock.period_ticks
                    ),
                ));
            }
            (ShiftMode::Toggle, ToggleTiming::FixedInterval { ticks: 0 }, _) => {
                return Err(ConfigError::new(
                    "toggle.ticks",
                    "must be greater than zero",
                ));
            }
            _ => {}
        }

        if self.mode == ShiftMode::Toggle && self.strobe_bit == self.data_bit {
            return Err(ConfigError::new(
                "strobe_bit",
                "strobe and data must use different input bits",
            ));
        }
        if self.max_ticks == Some(0) {
            return Err(ConfigError::new("max_ticks", "must be greater than zero"));
        }
        Ok(())
    }
}
