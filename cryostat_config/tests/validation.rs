use cryostat_config::{
    Config, DEFAULT_INTEGRATION_S, DEFAULT_SETPOINT_K, RawProgram, load_toml,
};
use rstest::rstest;

const FULL: &str = r#"
[program]
setpoint_k = 77.4
ramp_k_per_min = 2.0
integration_s = 30.0
temp_tolerance_k = 0.25
stable_tolerance_s = 5.0

[polling]
temperature_hz = 10
signal_hz = 2
tick_ms = 500
plot_every_s = 5
read_timeout_ms = 1500

[sample]
file = "NbSe2_run7.txt"
name = "NbSe2 flake"
user = "rt"
material = "NbSe2"
reference_resistor_ohm = 1.0e4
amplification = 100.0

[instruments]
thermometer_addr = 15
thermometer_channel = "B"
voltmeter_addr = 9
lockin_addr = 8

[logging]
level = "debug"

[simulation]
initial_k = 300.0
tau_s = 2.0
noise_k = 0.01
"#;

#[test]
fn parses_full_config_and_validates() {
    let cfg = load_toml(FULL).expect("parse");
    cfg.validate().expect("validate");
    assert_eq!(cfg.program.setpoint_k, 77.4);
    assert_eq!(cfg.polling.signal_hz, 2);
    assert_eq!(cfg.sample.material, "NbSe2");
    assert_eq!(cfg.instruments.thermometer_channel, "B");
}

#[test]
fn empty_toml_yields_documented_defaults() {
    let cfg = load_toml("").expect("parse empty");
    cfg.validate().expect("defaults must validate");
    assert_eq!(cfg.program.setpoint_k, DEFAULT_SETPOINT_K);
    assert_eq!(cfg.program.integration_s, DEFAULT_INTEGRATION_S);
    assert_eq!(cfg.sample.reference_resistor_ohm, 1.0e4);
    assert_eq!(cfg.sample.amplification, 1.0e2);
    assert_eq!(cfg.sample.file, "Sample_001.txt");
}

#[rstest]
#[case("[program]\nsetpoint_k = 0.0", "setpoint_k")]
#[case("[program]\nsetpoint_k = -4.2", "setpoint_k")]
#[case("[program]\ntemp_tolerance_k = 0.0", "temp_tolerance_k")]
#[case("[program]\nintegration_s = 0.0", "integration_s")]
#[case("[program]\nstable_tolerance_s = -1.0", "stable_tolerance_s")]
#[case("[polling]\ntemperature_hz = 0", "temperature_hz")]
#[case("[polling]\nsignal_hz = 0", "signal_hz")]
#[case("[polling]\ntick_ms = 0", "tick_ms")]
#[case("[sample]\namplification = 0.0", "amplification")]
#[case("[sample]\nreference_resistor_ohm = -1.0", "reference_resistor_ohm")]
#[case("[sample]\nfile = \"\"", "file")]
#[case("[simulation]\ntau_s = 0.0", "tau_s")]
fn validate_rejects_out_of_range(#[case] toml: &str, #[case] field: &str) {
    let cfg = load_toml(toml).expect("parse");
    let err = cfg.validate().expect_err("must reject");
    assert!(
        err.to_string().contains(field),
        "error {err} should mention {field}"
    );
}

#[test]
fn raw_program_resolves_numeric_entries() {
    let raw = RawProgram {
        setpoint: " 250.0 ".to_string(),
        ramp: "1.5".to_string(),
        integration: "12".to_string(),
        temp_tolerance: "0.5".to_string(),
        stable_tolerance: "2".to_string(),
    };
    let (program, warnings) = raw.resolve();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
    assert_eq!(program.setpoint_k, 250.0);
    assert_eq!(program.integration_s, 12.0);
}

#[test]
fn raw_program_falls_back_per_field_with_warnings() {
    let raw = RawProgram {
        setpoint: "two hundred".to_string(),
        ramp: "1.0".to_string(),
        integration: "".to_string(),
        temp_tolerance: "0.3".to_string(),
        stable_tolerance: "NaN".to_string(),
    };
    let (program, warnings) = raw.resolve();
    // Bad entries fall back, good entries survive.
    assert_eq!(program.setpoint_k, DEFAULT_SETPOINT_K);
    assert_eq!(program.integration_s, DEFAULT_INTEGRATION_S);
    assert_eq!(program.temp_tolerance_k, 0.3);
    let fields: Vec<_> = warnings.iter().map(|w| w.field).collect();
    assert_eq!(fields, vec!["setpoint", "integration", "stable_tolerance"]);
}
