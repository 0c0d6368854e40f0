//! CLI Tests
//!
//! Runs the built binary to check argument handling and exit status.

use std::fs;
use std::process::Command;

use tempfile::tempdir;

fn aymix() -> Command {
    Command::new(env!("CARGO_BIN_EXE_aymix"))
}

#[test]
fn test_no_arguments_is_usage_error() {
    let output = aymix().output().unwrap();
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"), "stderr: {}", stderr);
}

#[test]
fn test_two_arguments_is_usage_error() {
    let dir = tempdir().unwrap();
    let output = aymix()
        .arg("one")
        .arg("two")
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_missing_dumps_report_error_code() {
    let dir = tempdir().unwrap();
    let output = aymix().arg(dir.path().join("nothing")).output().unwrap();

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error[INPUT_NOT_FOUND]"), "stderr: {}", stderr);
    assert!(!dir.path().join("nothing.flac").exists());
}

#[test]
fn test_successful_render() {
    let dir = tempdir().unwrap();
    let base = dir.path().join("song");
    let samples: Vec<u8> = (0..4375u32)
        .flat_map(|i| (((i / 200) % 2) as u16 * 30_000).to_le_bytes())
        .collect();
    for suffix in ["_a", "_b", "_c"] {
        fs::write(dir.path().join(format!("song{}", suffix)), &samples).unwrap();
    }

    let output = aymix().arg(&base).env("RUST_LOG", "warn").output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let flac = fs::read(dir.path().join("song.flac")).unwrap();
    assert_eq!(&flac[..4], b"fLaC");
    assert!(String::from_utf8_lossy(&output.stdout).contains("960 frames"));
}
