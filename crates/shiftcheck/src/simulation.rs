use crate::{
    IOContext,
    device::{Device, DeviceContext},
    scheduler::{ClockDef, Scheduler},
    signal::{SignalRef, SignalTable},
};
use bit_set::BitSet;

mod builder;
mod error;

pub use builder::SimulationBuilder;
pub use error::{RuntimeErrorCode, SimulatorError};

/// Upper bound on delta cycles within one time slot.
const MAX_DELTA_CYCLES: usize = 64;

/// A condition the caller suspends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Resume `ticks` later, before any event scheduled at that time.
    Timer(u64),
    /// Resume after the time slot in which bit 0 went 0 -> 1.
    RisingEdge(SignalRef),
    /// Resume after the time slot in which bit 0 went 1 -> 0.
    FallingEdge(SignalRef),
    /// Resume after the time slot in which bit 0 changed.
    AnyEdge(SignalRef),
}

/// A timed, event-driven simulation of a single device.
///
/// Manages simulation time, periodic clocks, and an event queue. The caller
/// is the testbench: it suspends with [`Simulation::wait`] while the kernel
/// processes scheduled events.
pub struct Simulation {
    pub(crate) device: Box<dyn Device>,
    pub(crate) signals: SignalTable,
    /// Port values as of the last settled evaluation.
    pub(crate) settled: Vec<u64>,
    pub(crate) scheduler: Scheduler,
    pub(crate) last_changes: BitSet,
    pub(crate) time_limit: Option<u64>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("time", &self.scheduler.time)
            .field("time_limit", &self.time_limit)
            .finish()
    }
}

impl Simulation {
    pub fn builder<D: Device + 'static>(device: D) -> SimulationBuilder {
        SimulationBuilder::new(Box::new(device))
    }

    pub(crate) fn new(device: Box<dyn Device>, signals: SignalTable) -> Self {
        let settled = signals.snapshot();
        let last_changes = BitSet::with_capacity(signals.len());
        Self {
            device,
            signals,
            settled,
            scheduler: Scheduler::new(),
            last_changes,
            time_limit: None,
        }
    }

    /// Resolves a port name into a [`SignalRef`].
    pub fn signal(&self, name: &str) -> Result<SignalRef, RuntimeErrorCode> {
        self.signals.resolve(name)
    }

    pub fn signals(&self) -> &SignalTable {
        &self.signals
    }

    /// # Panics
    ///
    /// Panics if `signal` was issued by another simulation with more ports.
    pub fn get(&self, signal: SignalRef) -> u64 {
        self.signals.get(signal)
    }

    pub fn get_bit(&self, signal: SignalRef, bit: usize) -> Result<bool, RuntimeErrorCode> {
        self.signals.get_bit(signal, bit)
    }

    /// Looks up an elaboration parameter of the device.
    pub fn parameter(&self, name: &str) -> Option<u64> {
        self.device.parameter(name)
    }

    /// Writes ports via a callback and re-evaluates the device immediately.
    ///
    /// The first failing write aborts the callback's effect on the device and
    /// is returned.
    pub fn modify<F>(&mut self, f: F) -> Result<(), RuntimeErrorCode>
    where
        F: FnOnce(&mut IOContext<'_>),
    {
        let mut ctx = IOContext {
            signals: &mut self.signals,
            error: None,
        };
        f(&mut ctx);
        if let Some(err) = ctx.error {
            return Err(err);
        }
        self.settle()
    }

    /// Register a periodic clock, enqueuing its first rising edge at `initial_delay`.
    pub fn add_clock(
        &mut self,
        signal: SignalRef,
        high: u64,
        low: u64,
        initial_delay: u64,
    ) -> Result<(), RuntimeErrorCode> {
        if self.signals.width(signal) != 1 || high == 0 || low == 0 {
            return Err(RuntimeErrorCode::NotAClock(
                self.signals.name(signal).to_string(),
            ));
        }
        let time = self.offset(initial_delay)?;
        self.scheduler.set_clock(signal, ClockDef { high, low });
        self.scheduler.push_clock_edge(time, signal, 1);
        Ok(())
    }

    /// Stops every periodic clock. One-shot events stay scheduled.
    pub fn cancel_clocks(&mut self) {
        self.scheduler.cancel_clocks();
    }

    /// Schedule a one-shot write of `value` to `signal` at absolute `time`.
    pub fn schedule(
        &mut self,
        signal: SignalRef,
        time: u64,
        value: u64,
    ) -> Result<(), RuntimeErrorCode> {
        if time < self.scheduler.time {
            return Err(RuntimeErrorCode::ScheduleInPast {
                time,
                now: self.scheduler.time,
            });
        }
        let width = self.signals.width(signal);
        if value & !crate::signal::mask(width) != 0 {
            return Err(RuntimeErrorCode::ValueTooWide {
                signal: self.signals.name(signal).to_string(),
                width,
                value,
            });
        }
        self.scheduler.push(time, signal, value);
        Ok(())
    }

    /// Advance time to the next scheduled event and process all events at that time.
    /// Returns the new simulation time, or None if no events are scheduled.
    pub fn step(&mut self) -> Result<Option<u64>, RuntimeErrorCode> {
        let (current_time, events_to_process) = match self.scheduler.pop_all_at_next_time() {
            Some(res) => res,
            None => return Ok(None),
        };
        self.scheduler.time = current_time;

        let before = self.signals.snapshot();
        for ev in &events_to_process {
            self.signals.set(ev.signal, ev.next_val)?;
        }
        self.settle()?;

        self.last_changes.clear();
        for (id, (old, new)) in before.iter().zip(self.signals.values()).enumerate() {
            if old != new {
                self.last_changes.insert(id);
            }
        }
        log::trace!(
            "t={}: {} event(s), {} signal(s) changed",
            current_time,
            events_to_process.len(),
            self.last_changes.len()
        );

        // Reschedule clocks
        for ev in events_to_process.iter().filter(|ev| ev.periodic) {
            if let Some(def) = self.scheduler.clock(ev.signal) {
                let (delay, next_val) = if ev.next_val != 0 {
                    (def.high, 0)
                } else {
                    (def.low, 1)
                };
                let time = self.offset(delay)?;
                self.scheduler.push_clock_edge(time, ev.signal, next_val);
            }
        }

        Ok(Some(current_time))
    }

    /// Advance time and run until `end_time` (inclusive).
    pub fn run_until(&mut self, end_time: u64) -> Result<(), RuntimeErrorCode> {
        while let Some(next_time) = self.scheduler.next_event_time() {
            if next_time > end_time {
                break;
            }
            self.step()?;
        }
        self.scheduler.time = self.scheduler.time.max(end_time);
        Ok(())
    }

    /// Process every event strictly before `time`, then move time to `time`.
    fn advance_to(&mut self, time: u64) -> Result<(), RuntimeErrorCode> {
        while let Some(next_time) = self.scheduler.next_event_time() {
            if next_time >= time {
                break;
            }
            self.step()?;
        }
        self.scheduler.time = self.scheduler.time.max(time);
        Ok(())
    }

    /// Suspends the caller until `trigger` fires.
    pub fn wait(&mut self, trigger: Trigger) -> Result<(), RuntimeErrorCode> {
        let (signal, wanted) = match trigger {
            Trigger::Timer(ticks) => {
                let target = self.offset(ticks)?;
                self.check_limit(target, trigger)?;
                return self.advance_to(target);
            }
            Trigger::RisingEdge(signal) => (signal, Some(true)),
            Trigger::FallingEdge(signal) => (signal, Some(false)),
            Trigger::AnyEdge(signal) => (signal, None),
        };

        loop {
            let next_time =
                self.scheduler
                    .next_event_time()
                    .ok_or_else(|| RuntimeErrorCode::NoPendingEvents {
                        waiting_for: self.describe(trigger),
                        time: self.scheduler.time,
                    })?;
            self.check_limit(next_time, trigger)?;

            let old = self.signals.get(signal) & 1 == 1;
            self.step()?;
            if !self.last_changes.contains(signal.id) {
                continue;
            }
            let new = self.signals.get(signal) & 1 == 1;
            if old != new && wanted.is_none_or(|level| level == new) {
                return Ok(());
            }
        }
    }

    /// Returns the current simulation time.
    pub fn time(&self) -> u64 {
        self.scheduler.time
    }

    /// Returns the time of the next scheduled event, if any.
    pub fn next_event_time(&self) -> Option<u64> {
        self.scheduler.next_event_time()
    }

    pub fn time_limit(&self) -> Option<u64> {
        self.time_limit
    }

    pub fn set_time_limit(&mut self, limit: Option<u64>) {
        self.time_limit = limit;
    }

    /// Whether `signal` changed in the most recently processed time slot.
    pub fn changed(&self, signal: SignalRef) -> bool {
        self.last_changes.contains(signal.id)
    }

    /// Re-evaluates the device until no port changes any more.
    pub(crate) fn settle(&mut self) -> Result<(), RuntimeErrorCode> {
        let mut deltas = 0;
        loop {
            let before = self.signals.snapshot();
            let mut ctx = DeviceContext {
                signals: &mut self.signals,
                previous: &self.settled,
            };
            self.device.evaluate(&mut ctx)?;
            self.settled = before;
            if self.signals.values() == self.settled.as_slice() {
                return Ok(());
            }
            deltas += 1;
            if deltas >= MAX_DELTA_CYCLES {
                return Err(RuntimeErrorCode::CombinationalLoop {
                    time: self.scheduler.time,
                });
            }
        }
    }

    /// The current time plus `delay`, or an error if that is not representable.
    fn offset(&self, delay: u64) -> Result<u64, RuntimeErrorCode> {
        let now = self.scheduler.time;
        now.checked_add(delay)
            .ok_or(RuntimeErrorCode::TimeOverflow { now, delay })
    }

    fn check_limit(&self, time: u64, trigger: Trigger) -> Result<(), RuntimeErrorCode> {
        match self.time_limit {
            Some(limit) if time > limit => Err(RuntimeErrorCode::TimeLimitExceeded {
                limit,
                waiting_for: self.describe(trigger),
            }),
            _ => Ok(()),
        }
    }

    fn describe(&self, trigger: Trigger) -> String {
        match trigger {
            Trigger::Timer(ticks) => format!("a {}-tick timer", ticks),
            Trigger::RisingEdge(s) => format!("a rising edge of '{}'", self.signals.name(s)),
            Trigger::FallingEdge(s) => format!("a falling edge of '{}'", self.signals.name(s)),
            Trigger::AnyEdge(s) => format!("an edge of '{}'", self.signals.name(s)),
        }
    }
}
