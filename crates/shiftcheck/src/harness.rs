mod assertion;
mod clock;
mod config;
mod error;
mod reset;
mod runner;
mod scenario;
mod stimulus;

pub use assertion::{AssertionEngine, EventContext};
pub use clock::ClockGenerator;
pub use config::{
    ClockConfig, HarnessConfig, MAX_TICKS, PortNames, ResetPlan, ResetPolarity, ShiftMode,
    ToggleTiming,
};
pub use error::{ConfigError, HarnessError};
pub use reset::ResetSequencer;
pub use runner::{ScenarioReport, ScenarioRunner};
pub use scenario::{Phase, PhaseChecks, PhaseReport, Scenario};
pub use stimulus::{Step, StimulusDriver};
