use crate::signal::SignalRef;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDef {
    pub high: u64,
    pub low: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimEvent {
    pub time: u64,
    /// Insertion order; keeps same-time events FIFO.
    pub seq: u64,
    pub signal: SignalRef,
    pub next_val: u64,
    /// Edge of a registered clock rather than a one-shot write.
    pub periodic: bool,
}

impl PartialOrd for SimEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Earlier time has higher priority (BinaryHeap is a Max-Heap)
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    pub(crate) time: u64,
    pub(crate) clocks: Vec<Option<ClockDef>>,
    pub(crate) event_queue: BinaryHeap<SimEvent>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.event_queue.peek().map(|e| e.time)
    }

    /// Queues a one-shot write.
    pub fn push(&mut self, time: u64, signal: SignalRef, next_val: u64) {
        self.enqueue(time, signal, next_val, false);
    }

    /// Queues a clock edge; dropped again by [`Scheduler::cancel_clocks`].
    pub fn push_clock_edge(&mut self, time: u64, signal: SignalRef, next_val: u64) {
        self.enqueue(time, signal, next_val, true);
    }

    fn enqueue(&mut self, time: u64, signal: SignalRef, next_val: u64, periodic: bool) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.event_queue.push(SimEvent {
            time,
            seq,
            signal,
            next_val,
            periodic,
        });
    }

    pub fn pop_all_at_next_time(&mut self) -> Option<(u64, Vec<SimEvent>)> {
        let next_time = self.next_event_time()?;
        let mut events = Vec::new();
        while self.next_event_time() == Some(next_time) {
            if let Some(ev) = self.event_queue.pop() {
                events.push(ev);
            }
        }
        Some((next_time, events))
    }

    pub fn clock(&self, signal: SignalRef) -> Option<ClockDef> {
        self.clocks.get(signal.id).copied().flatten()
    }

    pub fn set_clock(&mut self, signal: SignalRef, def: ClockDef) {
        if signal.id >= self.clocks.len() {
            self.clocks.resize(signal.id + 1, None);
        }
        self.clocks[signal.id] = Some(def);
    }

    /// Drops every periodic clock together with its pending edges.
    pub fn cancel_clocks(&mut self) {
        self.clocks.clear();
        self.event_queue.retain(|ev| !ev.periodic);
    }
}
