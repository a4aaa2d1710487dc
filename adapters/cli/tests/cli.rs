use std::process::Command;

#[test]
fn json_summary_reports_a_short_run() {
    let output = Command::new(env!("CARGO_BIN_EXE_horde-sim"))
        .args(["--duration", "15", "--seed", "7", "--tick-ms", "50", "--json"])
        .output()
        .expect("failed to launch horde-sim");
    assert!(
        output.status.success(),
        "horde-sim failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("summary is JSON");
    assert_eq!(summary["seed"], 7);
    assert!(summary["tally"]["waves_started"].as_u64() >= Some(1));
    assert!(summary["tally"]["spawns"].as_u64() > Some(0));
    assert!(summary["pools"].as_array().is_some_and(|pools| !pools.is_empty()));
}

#[test]
fn rejects_out_of_range_tick() {
    let output = Command::new(env!("CARGO_BIN_EXE_horde-sim"))
        .args(["--tick-ms", "0"])
        .output()
        .expect("failed to launch horde-sim");
    assert!(!output.status.success());
}

#[test]
fn missing_config_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_horde-sim"))
        .args(["--config", "/nonexistent/encounter.toml"])
        .output()
        .expect("failed to launch horde-sim");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("encounter.toml"));
}
