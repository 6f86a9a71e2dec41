use clap::ValueEnum;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use shiftcheck::{
    ClockConfig, ConfigError, HarnessConfig, Scenario, ScenarioRunner, ShiftMode,
    ShiftRegisterDevice, ShiftTrigger, Simulation, ToggleTiming,
};
use std::path::Path;

pub use shiftcheck::ScenarioReport;

/// Pulse length used when `--pulse-len` is not given.
const DEFAULT_PULSE_LEN: u64 = 10;

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub harness: HarnessConfig,
    pub scenario: Option<Scenario>,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::new("config", e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to parse {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Clock,
    Toggle,
}

impl From<ModeArg> for ShiftMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Clock => ShiftMode::Clock,
            ModeArg::Toggle => ShiftMode::Toggle,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TimingArg {
    /// Flip the strobe at a fixed interval
    Interval,
    /// Flip the strobe right after each rising clock edge
    ClockEdge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioArg {
    /// Drain, fill with depth + 1 ones, drain again
    Standard,
    /// A short burst of ones followed by zeros
    Pulse,
    /// Fill straight after reset, then flush
    Fill,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub depth: Option<usize>,
    pub mode: Option<ModeArg>,
    pub timing: Option<TimingArg>,
    pub period: Option<u64>,
    pub settle: Option<u64>,
    pub reset_ticks: Option<u64>,
}

impl Overrides {
    pub fn apply(&self, mut config: HarnessConfig) -> HarnessConfig {
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(mode) = self.mode {
            config.mode = mode.into();
        }
        match (self.timing, config.toggle) {
            (Some(TimingArg::ClockEdge), _) => config.toggle = ToggleTiming::OnClockEdge,
            (Some(TimingArg::Interval), ToggleTiming::OnClockEdge) => {
                config.toggle = ToggleTiming::default()
            }
            _ => {}
        }
        if let Some(period) = self.period {
            let clock = config.clock.unwrap_or_default();
            config.clock = Some(ClockConfig {
                period_ticks: period,
                ..clock
            });
        }
        if let Some(settle) = self.settle {
            config.settle_ticks = settle;
        }
        if let Some(ticks) = self.reset_ticks {
            config.reset.assert_duration_ticks = ticks;
        }
        config
    }
}

/// Picks the scenario to run: an explicit `kind` wins over the one from the
/// config file, and the standard scenario is the fallback.
pub fn select_scenario(
    from_file: Option<Scenario>,
    kind: Option<ScenarioArg>,
    depth: usize,
    pulse_len: Option<u64>,
) -> Result<Scenario, ConfigError> {
    match (kind, from_file) {
        (Some(ScenarioArg::Standard), _) | (None, None) => Ok(Scenario::standard(depth)),
        (Some(ScenarioArg::Fill), _) => Ok(Scenario::fill_flush(depth)),
        (Some(ScenarioArg::Pulse), _) => {
            let len = pulse_len.unwrap_or(DEFAULT_PULSE_LEN.min(depth as u64));
            Scenario::pulse(depth, len)
        }
        (None, Some(scenario)) => Ok(scenario),
    }
}

/// Builds the behavioural unit under test wired the way `config` expects.
pub fn build_device(
    config: &HarnessConfig,
    sr_len: usize,
) -> Result<ShiftRegisterDevice, ConfigError> {
    let trigger = match config.mode {
        ShiftMode::Clock => ShiftTrigger::Clock,
        ShiftMode::Toggle => ShiftTrigger::Strobe {
            bit: config.strobe_bit,
        },
    };
    Ok(ShiftRegisterDevice::new(sr_len)?
        .with_trigger(trigger)
        .with_reset_polarity(config.reset.polarity)
        .with_bits(config.data_bit, config.output_bit)
        .with_port_names(config.ports.clone()))
}

/// Runs `scenario` against a fresh unit under test with `uut_depth` stages
/// (the configured depth when unset).
pub fn run(
    config: HarnessConfig,
    scenario: &Scenario,
    uut_depth: Option<usize>,
) -> Result<ScenarioReport> {
    let sr_len = uut_depth.unwrap_or(config.depth);
    let runner = ScenarioRunner::new(config).into_diagnostic()?;
    let device = build_device(runner.config(), sr_len).into_diagnostic()?;
    let mut sim = Simulation::builder(device).build().into_diagnostic()?;
    if let Some(param) = sim.parameter("SR_LEN") {
        log::info!(
            "UUT SR_LEN={}, model depth={}",
            param,
            runner.config().depth
        );
    }
    runner
        .run(&mut sim, scenario)
        .into_diagnostic()
        .wrap_err_with(|| format!("scenario '{}' failed", scenario.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_take_precedence() {
        let overrides = Overrides {
            depth: Some(32),
            mode: Some(ModeArg::Toggle),
            timing: Some(TimingArg::ClockEdge),
            period: Some(20),
            settle: Some(5),
            reset_ticks: Some(40),
        };
        let config = overrides.apply(HarnessConfig::default());
        assert_eq!(config.depth, 32);
        assert_eq!(config.mode, ShiftMode::Toggle);
        assert_eq!(config.toggle, ToggleTiming::OnClockEdge);
        assert_eq!(config.clock.map(|c| c.period_ticks), Some(20));
        assert_eq!(config.settle_ticks, 5);
        assert_eq!(config.reset.assert_duration_ticks, 40);
        config.validate().unwrap();
    }

    #[test]
    fn interval_keeps_a_configured_interval() {
        let base = HarnessConfig::default().toggle(ToggleTiming::FixedInterval { ticks: 3 });
        let overrides = Overrides {
            timing: Some(TimingArg::Interval),
            ..Overrides::default()
        };
        assert_eq!(
            overrides.apply(base).toggle,
            ToggleTiming::FixedInterval { ticks: 3 }
        );
    }

    #[test]
    fn scenario_selection() {
        let custom = Scenario::new("custom").phase(shiftcheck::Phase::new("ones", true, 4));
        assert_eq!(select_scenario(None, None, 8, None).unwrap().name, "standard");
        assert_eq!(
            select_scenario(Some(custom.clone()), None, 8, None).unwrap(),
            custom
        );
        assert_eq!(
            select_scenario(Some(custom), Some(ScenarioArg::Fill), 8, None)
                .unwrap()
                .name,
            "fill_flush"
        );
        // The default pulse never exceeds the register.
        let pulse = select_scenario(None, Some(ScenarioArg::Pulse), 4, None).unwrap();
        assert_eq!(pulse.expected_total, Some(4));
        let err = select_scenario(None, Some(ScenarioArg::Pulse), 4, Some(9)).unwrap_err();
        assert_eq!(err.field, "pulse_len");
    }
}
