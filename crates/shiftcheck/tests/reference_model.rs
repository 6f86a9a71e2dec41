use proptest::prelude::*;
use shiftcheck::{ShiftMode, ShiftRegisterModel};
use test_case::test_case;

fn run(model: &mut ShiftRegisterModel, inputs: &[bool]) -> Vec<bool> {
    inputs.iter().map(|&bit| model.shift(bit)).collect()
}

#[test_case(8   ; "eight stages")]
#[test_case(128 ; "128 stages")]
#[test_case(256 ; "256 stages")]
#[test_case(448 ; "448 stages")]
fn test_first_one_emerges_after_depth_events(depth: usize) {
    // Input held at 1 for depth + 1 events from an all-zero state.
    let mut model = ShiftRegisterModel::new(depth, ShiftMode::Clock).unwrap();
    let outs: Vec<bool> = (0..=depth)
        .map(|_| model.on_rising_edge(true).unwrap())
        .collect();
    assert!(outs[..depth].iter().all(|&b| !b));
    assert!(outs[depth]);
}

#[test]
fn test_depth_eight_concrete() {
    let mut model = ShiftRegisterModel::new(8, ShiftMode::Clock).unwrap();
    let outs = run(&mut model, &[true; 9]);
    assert_eq!(
        outs,
        vec![false, false, false, false, false, false, false, false, true]
    );
}

#[test]
fn test_toggle_driven_256_pulse_of_ten() {
    let depth = 256;
    let mut model = ShiftRegisterModel::new(depth, ShiftMode::Toggle).unwrap();
    let outs: Vec<bool> = (0..2 * depth)
        .map(|i| model.on_control_toggle(i < 10).unwrap())
        .collect();

    assert_eq!(outs.iter().filter(|&&b| b).count(), 10);
    let first = outs.iter().position(|&b| b).unwrap();
    assert_eq!(first, depth);
    assert!(outs[depth..depth + 10].iter().all(|&b| b));
}

proptest! {
    #[test]
    fn prop_reset_model_drains_zeros(
        depth in 1usize..64,
        history in proptest::collection::vec(any::<bool>(), 0..128),
    ) {
        let mut model = ShiftRegisterModel::new(depth, ShiftMode::Clock).unwrap();
        run(&mut model, &history);
        model.reset();
        let outs = run(&mut model, &vec![false; depth]);
        prop_assert!(outs.iter().all(|&b| !b));
        prop_assert_eq!(model.depth(), depth);
    }

    #[test]
    fn prop_first_depth_outputs_are_zero(
        depth in 1usize..64,
        inputs in proptest::collection::vec(any::<bool>(), 64),
    ) {
        let mut model = ShiftRegisterModel::new(depth, ShiftMode::Clock).unwrap();
        let outs = run(&mut model, &inputs[..depth]);
        prop_assert!(outs.iter().all(|&b| !b));
    }

    #[test]
    fn prop_output_is_input_delayed_by_depth(
        depth in 1usize..48,
        inputs in proptest::collection::vec(any::<bool>(), 1..160),
    ) {
        let mut model = ShiftRegisterModel::new(depth, ShiftMode::Toggle).unwrap();
        let outs = run(&mut model, &inputs);
        for (k, &out) in outs.iter().enumerate() {
            let expected = k >= depth && inputs[k - depth];
            prop_assert_eq!(out, expected, "event {}", k);
        }
        prop_assert_eq!(model.events(), inputs.len() as u64);
    }

    #[test]
    fn prop_single_pulse_appears_once(depth in 1usize..96) {
        let mut model = ShiftRegisterModel::new(depth, ShiftMode::Clock).unwrap();
        let inputs: Vec<bool> = (0..2 * depth).map(|k| k == 0).collect();
        let outs = run(&mut model, &inputs);
        let ones: Vec<usize> = outs
            .iter()
            .enumerate()
            .filter_map(|(k, &b)| b.then_some(k))
            .collect();
        prop_assert_eq!(ones, vec![depth]);
    }

    #[test]
    fn prop_drain_is_idempotent(depth in 1usize..64, extra in 0usize..256) {
        let mut model = ShiftRegisterModel::new(depth, ShiftMode::Clock).unwrap();
        let outs = run(&mut model, &vec![false; depth + extra]);
        prop_assert!(outs.iter().all(|&b| !b));
        prop_assert!(model.contents().all(|b| !b));
    }

    #[test]
    fn prop_aggregate_counts_the_run(
        depth in 1usize..64,
        k_seed in 1usize..64,
        lead in 0usize..8,
        extra in 0usize..16,
    ) {
        let k = 1 + (k_seed - 1) % depth;
        let mut model = ShiftRegisterModel::new(depth, ShiftMode::Clock).unwrap();
        let total = lead + depth + k + extra;
        let inputs: Vec<bool> = (0..total).map(|i| i >= lead && i < lead + k).collect();
        let outs = run(&mut model, &inputs);
        let window_start = lead.saturating_sub(extra % (lead + 1));
        let tally = outs[window_start..].iter().filter(|&&b| b).count();
        prop_assert_eq!(tally, k);
    }

    #[test]
    fn prop_toggle_and_clock_variants_agree(
        depth in 1usize..64,
        inputs in proptest::collection::vec(any::<bool>(), 0..200),
    ) {
        let mut clocked = ShiftRegisterModel::new(depth, ShiftMode::Clock).unwrap();
        let mut toggled = ShiftRegisterModel::new(depth, ShiftMode::Toggle).unwrap();
        let a: Vec<Option<bool>> = inputs.iter().map(|&b| clocked.on_rising_edge(b)).collect();
        let b: Vec<Option<bool>> = inputs.iter().map(|&b| toggled.on_control_toggle(b)).collect();
        prop_assert_eq!(a, b);
        prop_assert_eq!(
            clocked.contents().collect::<Vec<_>>(),
            toggled.contents().collect::<Vec<_>>()
        );
    }
}
