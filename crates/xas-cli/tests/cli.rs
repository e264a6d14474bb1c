use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;
use xas_core::project::Project;

fn xas_batch(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_xas-batch"))
        .args(args)
        .env("XAS_LOG", "info")
        .output()
        .expect("xas-batch should launch")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path should be UTF-8")
}

fn write_scan(dir: &Path, name: &str, edge_height: f64) {
    let mut text = String::from("# energy time i0 it\n");
    for index in 0..=200 {
        let energy = 8800.0 + 2.0 * index as f64;
        let mu = 0.3 + edge_height / (1.0 + (-(energy - 8979.0) / 3.0).exp());
        text.push_str(&format!(
            "{:.2}, 0.5, {:.6}, {:.6}\n",
            energy,
            5.0e4,
            5.0e4 * (-mu).exp()
        ));
    }
    fs::write(dir.join(name), text).expect("scan should be written");
}

fn scan_dir() -> TempDir {
    let temp = TempDir::new().expect("tempdir should be created");
    write_scan(temp.path(), "Cu_foil_001.dat", 1.0);
    write_scan(temp.path(), "Cu_foil_002.dat", 1.0);
    write_scan(temp.path(), "Cu_foil_003.dat", 1.1);
    temp
}

#[test]
fn groups_command_prints_json_groups() {
    let temp = scan_dir();
    let output = xas_batch(&["groups", path_arg(temp.path()), "*.dat"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let groups: Value = serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    let groups = groups.as_array().expect("groups should be an array");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["key"], "Cu_foil_00");
    assert_eq!(
        groups[0]["files"],
        serde_json::json!(["Cu_foil_001.dat", "Cu_foil_002.dat", "Cu_foil_003.dat"])
    );
}

#[test]
fn missing_arguments_exit_zero_with_message() {
    let output = xas_batch(&["process"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("missing arguments"), "stdout: {}", stdout);
    assert!(stdout.contains("<dir> <pattern> [group]"));

    let output = xas_batch(&["groups"]);
    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn process_command_writes_outputs_and_run_log() {
    let temp = scan_dir();
    let output_dir = temp.path().join("results");
    let output = xas_batch(&[
        "process",
        path_arg(temp.path()),
        "*.dat",
        "yes",
        "--output",
        path_arg(&output_dir),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let batch_dir = output_dir.join("Cu_foil_00");
    assert!(batch_dir.join("Cu_foil_001.dat.svg").is_file());
    assert!(batch_dir.join("Cu_foil_00_merged.svg").is_file());
    assert!(batch_dir.join("Cu_foil_00.csv").is_file());

    let project = Project::load(&batch_dir.join("Cu_foil_00.prj.json")).expect("project should load");
    assert_eq!(project.groups().len(), 4);

    let run_log = fs::read_to_string(output_dir.join("xas_batch.log")).expect("run log should exist");
    assert!(run_log.contains("discovered data files"));
    assert!(run_log.contains("run complete"));
    assert!(!run_log.contains('\u{1b}'), "run log should carry no ANSI escapes");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Processed 3 file(s) in 1 batch(es)"));
}

#[test]
fn process_without_grouping_uses_default_output_dir() {
    let temp = scan_dir();
    let output = xas_batch(&["process", path_arg(temp.path()), "*.dat", "false"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    for name in ["Cu_foil_001.dat", "Cu_foil_002.dat", "Cu_foil_003.dat"] {
        let csv = temp.path().join("processed").join(name).join(format!("{}.csv", name));
        assert!(csv.is_file(), "missing {}", csv.display());
    }
}

#[test]
fn invalid_pattern_reports_input_error() {
    let temp = scan_dir();
    let output = xas_batch(&["groups", path_arg(temp.path()), "[unclosed"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.DISCOVERY_PATTERN]"), "stderr: {}", stderr);
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn missing_directory_reports_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let missing = temp.path().join("nope");
    let output = xas_batch(&["groups", path_arg(&missing), "*.dat"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("IO.DISCOVERY_READ_DIR"));
}
