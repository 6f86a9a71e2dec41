use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimulatorError {
    #[error("Runtime error: {0}")]
    Runtime(#[from] crate::RuntimeErrorCode),
    #[error("Device declares no ports")]
    NoPorts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeErrorCode {
    UnknownSignal(String),
    DuplicatePort(String),
    InvalidWidth { signal: String, width: usize },
    ValueTooWide { signal: String, width: usize, value: u64 },
    BitOutOfRange { signal: String, bit: usize, width: usize },
    NotAClock(String),
    ScheduleInPast { time: u64, now: u64 },
    Unbound(String),
    CombinationalLoop { time: u64 },
    NoPendingEvents { waiting_for: String, time: u64 },
    TimeLimitExceeded { limit: u64, waiting_for: String },
    TimeOverflow { now: u64, delay: u64 },
}

impl std::fmt::Display for RuntimeErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSignal(name) => write!(f, "Unknown signal '{}'", name),
            Self::DuplicatePort(name) => write!(f, "Port '{}' is declared twice", name),
            Self::InvalidWidth { signal, width } => write!(
                f,
                "Port '{}' has invalid width {} (supported: 1..={})",
                signal,
                width,
                crate::signal::MAX_WIDTH
            ),
            Self::ValueTooWide {
                signal,
                width,
                value,
            } => write!(
                f,
                "Value {:#x} does not fit in {}-bit signal '{}'",
                value, width, signal
            ),
            Self::BitOutOfRange { signal, bit, width } => write!(
                f,
                "Bit {} is out of range for {}-bit signal '{}'",
                bit, width, signal
            ),
            Self::NotAClock(name) => write!(
                f,
                "Signal '{}' cannot be driven as a clock (clocks must be 1-bit with non-empty phases)",
                name
            ),
            Self::ScheduleInPast { time, now } => write!(
                f,
                "Cannot schedule an event at t={} (current time is t={})",
                time, now
            ),
            Self::Unbound(name) => write!(
                f,
                "Device '{}' was evaluated before its ports were bound",
                name
            ),
            Self::CombinationalLoop { time } => {
                write!(f, "Detected combinational loop at t={}", time)
            }
            Self::NoPendingEvents { waiting_for, time } => write!(
                f,
                "No pending events at t={} while waiting for {}",
                time, waiting_for
            ),
            Self::TimeLimitExceeded { limit, waiting_for } => write!(
                f,
                "Time limit of {} ticks exceeded while waiting for {}",
                limit, waiting_for
            ),
            Self::TimeOverflow { now, delay } => write!(
                f,
                "Cannot reach t={} + {}: simulation time would overflow",
                now, delay
            ),
        }
    }
}

impl std::error::Error for RuntimeErrorCode {}
