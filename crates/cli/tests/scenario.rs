// GCX Debug - GPU Diagnostic Capture
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use std::path::PathBuf;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_temp_file(prefix: &str, contents: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    dir.push("gcxdebug-tests");
    let _ = std::fs::create_dir_all(&dir);

    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = dir.join(format!("{}-{}.yaml", prefix, nonce));
    std::fs::write(&path, contents).expect("Failed to write temp file");
    path
}

const MMU_FAULT: &str = r#"
schema_version: "1.0"
chip:
  model: 0x320
  revision: 0x5007
  registers:
    0x062: 0x3
    0x064: 0x10000040
steps:
  - power: on
  - irq: 0x00000001
  - read: last_error
  - irq: 0x40000001
  - set_register: { address: 0x064, value: 0x0 }
  - read: last_error
  - blt: { sources: 2, width: 100, height: 50 }
  - blt: { sources: 2, width: 100, height: 50 }
  - blt: { sources: 1, width: 10, height: 10 }
  - read: blt_stats
  - read: blt_stats
"#;

#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_gcxdebug"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("GCX Debug scenario runner"));
}

#[test]
fn test_cli_missing_scenario() {
    let output = Command::new(env!("CARGO_BIN_EXE_gcxdebug"))
        .args(["-s", "non_existent_scenario.yaml"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
}

#[test]
fn test_cli_rejects_bad_schema() {
    let path = write_temp_file("bad-schema", "schema_version: \"9\"\nsteps:\n  - read: id\n");
    let output = Command::new(env!("CARGO_BIN_EXE_gcxdebug"))
        .args(["--scenario", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Unsupported schema_version"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_cli_mmu_fault_scenario() {
    let path = write_temp_file("mmu-fault", MMU_FAULT);
    let output = Command::new(env!("CARGO_BIN_EXE_gcxdebug"))
        .args(["--scenario", path.to_str().unwrap()])
        .output()
        .expect("Failed to execute command");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert!(stdout.contains("==> last_error\nGC gpu current power status: GCPWR_ON\nGPU last error status: not valid.\n"));
    assert!(stdout.contains("GPU last error status: cached at: GC_DEBUG_DRIVER_IRQ"));
    assert!(stdout.contains("irq acknowledge = 0x40000001"));
    assert!(stdout.contains("mmu status = 0x00000003"));
    // Latched before the register changed.
    assert!(stdout.contains("exception address 0 = 0x10000040"));

    assert!(stdout.contains(" 2 src: 2 (66%)"));
    assert!(stdout.contains(" 2 src: 10000 (99%)"));
    assert!(stdout.ends_with("==> blt_stats\ntotal blts: 0\ntotal dst pixels: 0\n"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_cli_writes_snapshot() {
    let path = write_temp_file("snapshot", MMU_FAULT);
    let config = write_temp_file(
        "config",
        "cache_status_every_irq: true\nlog:\n  enabled: true\n",
    );
    let snapshot_path = std::env::temp_dir().join(format!(
        "gcxdebug-snapshot-{}.json",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));

    let output = Command::new(env!("CARGO_BIN_EXE_gcxdebug"))
        .args([
            "--scenario",
            path.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--snapshot",
            snapshot_path.to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute gcxdebug");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    // Continuous capture: the first, error-free interrupt is sampled but not latched.
    assert!(stdout.contains("GPU last error status: not valid."));

    let content = std::fs::read_to_string(&snapshot_path).unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(snapshot["cache_status_every_irq"], true);
    assert_eq!(snapshot["last_error"]["irq_acknowledge"], 0x4000_0001u32);
    assert_eq!(snapshot["last_error"]["exception_address"][0], 0x1000_0040u32);
    assert_eq!(snapshot["blt"]["total_count"], 0);

    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(&config);
    let _ = std::fs::remove_file(&snapshot_path);
}
