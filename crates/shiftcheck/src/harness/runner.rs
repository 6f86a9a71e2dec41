use super::{
    AssertionEngine, ClockGenerator, ConfigError, EventContext, HarnessConfig, HarnessError,
    PhaseReport, ResetSequencer, Scenario, ShiftMode, Step, StimulusDriver, ToggleTiming,
};
use crate::{ShiftRegisterModel, Simulation, Trigger, signal::SignalRef};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Extra ticks on top of the derived time budget.
const BUDGET_SLACK: u64 = 64;

/// Summary of a passing scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub depth: usize,
    pub mode: ShiftMode,
    pub events: u64,
    pub checks: u64,
    pub ones: u64,
    pub start_time: u64,
    pub end_time: u64,
    pub phases: Vec<PhaseReport>,
}

impl std::fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (SR_LEN={}, {} mode): {} events, {} checks, {} ones [{}] t={}..{}",
            self.scenario,
            self.depth,
            self.mode,
            self.events,
            self.checks,
            self.ones,
            self.phases
                .iter()
                .map(|p| format!("{}={}/{}", p.name, p.ones, p.events))
                .join(", "),
            self.start_time,
            self.end_time
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Ports {
    clock: Option<SignalRef>,
    reset: SignalRef,
    input: SignalRef,
    output: SignalRef,
}

/// Runs scenarios end to end: clock, reset, then every phase with
/// per-event and aggregate checks.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    config: HarnessConfig,
}

impl ScenarioRunner {
    pub fn new(config: HarnessConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Ticks the scenario may take before it is considered hung.
    pub fn time_budget(&self, scenario: &Scenario) -> u64 {
        if let Some(max) = self.config.max_ticks {
            return max;
        }
        let clock = self
            .config
            .clock
            .map(|c| c.period_ticks.saturating_add(c.initial_delay))
            .unwrap_or(0);
        let settle = self.config.settle_ticks;
        let per_event = match (self.config.mode, self.config.toggle) {
            (ShiftMode::Clock, _) => clock.saturating_add(settle),
            (ShiftMode::Toggle, ToggleTiming::FixedInterval { ticks }) => ticks.saturating_add(1),
            (ShiftMode::Toggle, ToggleTiming::OnClockEdge) => {
                clock.saturating_add(settle).saturating_add(1)
            }
        };
        let reset = self.config.reset.assert_duration_ticks.saturating_add(clock);
        let slots = scenario
            .total_events()
            .saturating_add(scenario.phases.len() as u64);
        slots
            .saturating_mul(per_event)
            .saturating_add(reset)
            .saturating_mul(2)
            .saturating_add(BUDGET_SLACK)
    }

    /// Runs `scenario` against the device in `sim`.
    ///
    /// Configuration problems are reported before simulated time advances.
    /// Clocks started by the runner are cancelled when it returns.
    pub fn run(
        &self,
        sim: &mut Simulation,
        scenario: &Scenario,
    ) -> Result<ScenarioReport, HarnessError> {
        scenario.validate()?;
        let ports = self.resolve(sim)?;

        let previous_limit = sim.time_limit();
        sim.set_time_limit(Some(sim.time().saturating_add(self.time_budget(scenario))));
        let result = self.execute(sim, ports, scenario);
        sim.cancel_clocks();
        sim.set_time_limit(previous_limit);

        match &result {
            Ok(report) => log::info!("Test completed successfully: {}", report),
            Err(err) => log::error!("Scenario '{}' failed: {}", scenario.name, err),
        }
        result
    }

    fn resolve(&self, sim: &Simulation) -> Result<Ports, HarnessError> {
        let names = &self.config.ports;
        let signals = sim.signals();
        let clock = match self.config.clock {
            Some(_) => {
                let clk = sim.signal(&names.clock)?;
                if signals.width(clk) != 1 {
                    return Err(
                        ConfigError::new("ports.clock", "clock must be a 1-bit port").into(),
                    );
                }
                Some(clk)
            }
            None => None,
        };
        let reset = sim.signal(&names.reset)?;
        if signals.width(reset) != 1 {
            return Err(ConfigError::new("ports.reset", "reset must be a 1-bit port").into());
        }
        let input = sim.signal(&names.input)?;
        let output = sim.signal(&names.output)?;

        let in_width = signals.width(input);
        if self.config.data_bit >= in_width {
            return Err(bit_error("data_bit", self.config.data_bit, in_width).into());
        }
        if self.config.mode == ShiftMode::Toggle && self.config.strobe_bit >= in_width {
            return Err(bit_error("strobe_bit", self.config.strobe_bit, in_width).into());
        }
        let out_width = signals.width(output);
        if self.config.output_bit >= out_width {
            return Err(bit_error("output_bit", self.config.output_bit, out_width).into());
        }

        Ok(Ports {
            clock,
            reset,
            input,
            output,
        })
    }

    fn execute(
        &self,
        sim: &mut Simulation,
        ports: Ports,
        scenario: &Scenario,
    ) -> Result<ScenarioReport, HarnessError> {
        let start_time = sim.time();
        let mut driver = StimulusDriver::new();

        driver.apply(
            sim,
            Step::SetValue {
                signal: ports.input,
                value: 0,
            },
        )?;
        if let (Some(clk), Some(config)) = (ports.clock, self.config.clock) {
            ClockGenerator::new(clk, config).start(sim)?;
        }
        ResetSequencer::new(ports.reset, ports.clock).apply_reset(
            sim,
            &mut driver,
            &self.config.reset,
        )?;

        let mut model = ShiftRegisterModel::new(self.config.depth, self.config.mode)?;
        let mut engine = AssertionEngine::new();
        let mut event = 0u64;

        for phase in &scenario.phases {
            log::info!(
                "Phase '{}': applying input {} for {} event(s)",
                phase.name,
                u8::from(phase.input),
                phase.events
            );
            driver.apply(
                sim,
                Step::SetBit {
                    signal: ports.input,
                    bit: self.config.data_bit,
                    value: phase.input,
                },
            )?;

            for _ in 0..phase.events {
                let predicted =
                    self.shift_event(sim, &mut driver, ports, &mut model, phase.input)?;
                let actual = sim.get_bit(ports.output, self.config.output_bit)?;
                log::debug!("Cycle {}: uo_out = {}", event, sim.get(ports.output));

                if phase.checks.per_event {
                    let ctx = EventContext {
                        phase: &phase.name,
                        event,
                        time: sim.time(),
                    };
                    engine.check(predicted, actual, &ctx)?;
                }
                engine.tally(actual);
                event += 1;
            }
            engine.finish_phase(phase)?;
        }

        if let Some(expected) = scenario.expected_total {
            engine.check_total(&scenario.name, expected)?;
        }

        Ok(ScenarioReport {
            scenario: scenario.name.clone(),
            depth: model.depth(),
            mode: self.config.mode,
            events: engine.total_events(),
            checks: engine.checks(),
            ones: engine.total_tally(),
            start_time,
            end_time: sim.time(),
            phases: engine.phases().to_vec(),
        })
    }

    /// Produces one shift event and returns the model's prediction for it.
    /// Returns once the output is ready to be sampled.
    fn shift_event(
        &self,
        sim: &mut Simulation,
        driver: &mut StimulusDriver,
        ports: Ports,
        model: &mut ShiftRegisterModel,
        input: bool,
    ) -> Result<bool, HarnessError> {
        let strobe = Step::ToggleBit {
            signal: ports.input,
            bit: self.config.strobe_bit,
        };
        let predicted = match (self.config.mode, self.config.toggle, ports.clock) {
            (ShiftMode::Clock, _, Some(clk)) => {
                sim.wait(Trigger::RisingEdge(clk))?;
                let predicted = model.on_rising_edge(input);
                driver.apply(sim, Step::Wait(self.config.settle_ticks))?;
                predicted
            }
            (ShiftMode::Toggle, ToggleTiming::FixedInterval { ticks }, _) => {
                driver.apply(sim, strobe)?;
                let predicted = model.on_control_toggle(input);
                driver.apply(sim, Step::Wait(ticks))?;
                predicted
            }
            (ShiftMode::Toggle, ToggleTiming::OnClockEdge, Some(clk)) => {
                sim.wait(Trigger::RisingEdge(clk))?;
                driver.apply(sim, strobe)?;
                let predicted = model.on_control_toggle(input);
                driver.apply(sim, Step::Wait(self.config.settle_ticks))?;
                predicted
            }
            _ => None,
        };
        predicted.ok_or_else(|| {
            ConfigError::new(
                "mode",
                format!("no shift event source for {} mode", self.config.mode),
            )
            .into()
        })
    }
}

fn bit_error(field: &str, bit: usize, width: usize) -> ConfigError {
    ConfigError::new(field, format!("bit {bit} is outside the {width}-bit port"))
}
