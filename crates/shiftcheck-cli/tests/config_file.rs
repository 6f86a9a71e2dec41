use shiftcheck::{ResetPolarity, ShiftMode, ToggleTiming};
use shiftcheck_cli::{FileConfig, Overrides, run, select_scenario};
use std::io::Write;

fn write_config(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_runs() {
    let file = write_config(
        r#"
[harness]
depth = 16
mode = "toggle"
settle_ticks = 4

[harness.toggle]
kind = "on_clock_edge"

[harness.reset]
assert_duration_ticks = 30
polarity = "active_high"

[scenario]
name = "burst"

[[scenario.phases]]
name = "drain"
input = false
events = 16

[[scenario.phases]]
name = "burst"
input = true
events = 3

[[scenario.phases]]
name = "flush"
input = false
events = 16
checks = { per_event = true, expected_tally = 3 }
"#,
    );

    let config = FileConfig::load(file.path()).unwrap();
    assert_eq!(config.harness.depth, 16);
    assert_eq!(config.harness.mode, ShiftMode::Toggle);
    assert_eq!(config.harness.toggle, ToggleTiming::OnClockEdge);
    assert_eq!(config.harness.reset.polarity, ResetPolarity::ActiveHigh);

    let scenario = select_scenario(config.scenario, None, config.harness.depth, None).unwrap();
    let report = run(config.harness, &scenario, None).unwrap();
    assert_eq!(report.scenario, "burst");
    assert_eq!(report.ones, 3);
    assert_eq!(report.events, 35);
}

#[test]
fn test_empty_file_uses_defaults() {
    let file = write_config("");
    let config = FileConfig::load(file.path()).unwrap();
    assert_eq!(config.harness.depth, 8);
    assert!(config.scenario.is_none());

    let scenario = select_scenario(None, None, config.harness.depth, None).unwrap();
    let report = run(config.harness, &scenario, None).unwrap();
    insta::assert_snapshot!(
        report.to_string(),
        @"standard (SR_LEN=8, clock mode): 25 events, 25 checks, 9 ones [drain=0/8, fill=1/9, drain_again=8/8] t=0..280"
    );
}

#[test]
fn test_command_line_overrides_file() {
    let file = write_config("[harness]\ndepth = 16\n");
    let config = FileConfig::load(file.path()).unwrap();
    let overrides = Overrides {
        depth: Some(4),
        ..Overrides::default()
    };
    let harness = overrides.apply(config.harness);
    assert_eq!(harness.depth, 4);
    let report = run(harness, &shiftcheck::Scenario::standard(4), None).unwrap();
    assert_eq!(report.ones, 5);
}

#[test]
fn test_mismatched_uut_fails() {
    let harness = Overrides::default().apply(Default::default());
    let scenario = select_scenario(None, None, harness.depth, None).unwrap();
    let err = run(harness, &scenario, Some(9)).unwrap_err();
    assert_eq!(err.to_string(), "scenario 'standard' failed");
    let cause = err.chain().nth(1).unwrap().to_string();
    assert!(cause.starts_with("output mismatch in phase 'fill'"), "{cause}");
}

#[test]
fn test_bad_config_is_reported() {
    let file = write_config("[harness]\ndepth = \"eight\"\n");
    let err = FileConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("failed to parse"));

    let missing = file.path().with_extension("missing");
    assert!(FileConfig::load(&missing).is_err());
}

#[test]
fn test_oversized_reset_is_a_config_error() {
    let overrides = Overrides {
        reset_ticks: Some(u64::MAX),
        ..Overrides::default()
    };
    let harness = overrides.apply(Default::default());
    let err = run(harness, &shiftcheck::Scenario::standard(8), None).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("invalid configuration `reset.assert_duration_ticks`"),
        "{err}"
    );
}
