use crate::harness::{ConfigError, ShiftMode};
use std::collections::VecDeque;

/// Bit-exact reference model of an N-stage serial shift register.
///
/// The queue front is the next bit to leave the register, the back is the
/// most recently shifted-in bit. Each shift event pops the front (the
/// predicted output) and pushes the current input, so the output at event
/// `k` equals the input presented at event `k - N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftRegisterModel {
    stages: VecDeque<bool>,
    mode: ShiftMode,
    events: u64,
}

impl ShiftRegisterModel {
    pub fn new(depth: usize, mode: ShiftMode) -> Result<Self, ConfigError> {
        if depth == 0 {
            return Err(ConfigError::new(
                "depth",
                "a shift register needs at least one stage",
            ));
        }
        Ok(Self {
            stages: std::iter::repeat_n(false, depth).collect(),
            mode,
            events: 0,
        })
    }

    pub fn depth(&self) -> usize {
        self.stages.len()
    }

    pub fn mode(&self) -> ShiftMode {
        self.mode
    }

    /// Number of shift events applied since construction or the last reset.
    pub fn events(&self) -> u64 {
        self.events
    }

    /// Stage contents, next output first.
    pub fn contents(&self) -> impl Iterator<Item = bool> + '_ {
        self.stages.iter().copied()
    }

    /// Refills every stage with zero.
    pub fn reset(&mut self) {
        self.stages.iter_mut().for_each(|b| *b = false);
        self.events = 0;
    }

    /// Rising clock edge. `None` if this model is toggle-driven.
    pub fn on_rising_edge(&mut self, input: bool) -> Option<bool> {
        match self.mode {
            ShiftMode::Clock => Some(self.shift(input)),
            ShiftMode::Toggle => None,
        }
    }

    /// Either transition of the strobe bit. `None` if this model is clock-driven.
    pub fn on_control_toggle(&mut self, input: bool) -> Option<bool> {
        match self.mode {
            ShiftMode::Toggle => Some(self.shift(input)),
            ShiftMode::Clock => None,
        }
    }

    /// Applies one shift event regardless of mode.
    pub fn shift(&mut self, input: bool) -> bool {
        let out = self.stages.pop_front().unwrap_or(false);
        self.stages.push_back(input);
        self.events += 1;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_depth_is_a_configuration_error() {
        let err = ShiftRegisterModel::new(0, ShiftMode::Clock).unwrap_err();
        assert_eq!(err.field, "depth");
    }

    #[test]
    fn events_of_the_other_variant_do_not_shift() {
        let mut m = ShiftRegisterModel::new(2, ShiftMode::Toggle).unwrap();
        assert_eq!(m.on_rising_edge(true), None);
        assert_eq!(m.events(), 0);
        assert_eq!(m.on_control_toggle(true), Some(false));
        assert_eq!(m.on_control_toggle(false), Some(false));
        assert_eq!(m.on_control_toggle(false), Some(true));
        assert_eq!(m.events(), 3);
    }

    #[test]
    fn reset_clears_contents_and_count() {
        let mut m = ShiftRegisterModel::new(3, ShiftMode::Clock).unwrap();
        m.shift(true);
        m.shift(true);
        m.reset();
        assert_eq!(m.events(), 0);
        assert!(m.contents().all(|b| !b));
        assert_eq!(m.depth(), 3);
    }
}
