use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "peloton-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_peloton-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("slipstream"));
}

#[test]
fn cli_runs_smoke_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_peloton-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "smoke,determinism",
            "--iterations",
            "1",
            "--seeds",
            "1,0x2A",
            "--players",
            "3",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Peloton Automated Tester"));

    let report = std::fs::read_to_string(output_path).expect("read report");
    let value: serde_json::Value = serde_json::from_str(&report).expect("json report");
    let runs = value.as_array().expect("array of results");
    assert_eq!(runs.len(), 4);
    assert!(runs.iter().all(|run| run["passed"] == true));
}

#[test]
fn cli_fails_on_unreachable_turn_cap() {
    let exe = env!("CARGO_BIN_EXE_peloton-tester");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "smoke",
            "--iterations",
            "1",
            "--max-turns",
            "1",
            "--report",
            "markdown",
        ])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Peloton Logic Test Results"));
}
