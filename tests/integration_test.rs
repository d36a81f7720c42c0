use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

fn aacneo_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_aacneo"))
}

fn run(dir: &Path, args: &[&str]) -> Output {
    aacneo_cmd().current_dir(dir).args(args).output().unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

fn init_project() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let output = run(tmp.path(), &["init"]);
    assert!(output.status.success());
    tmp
}

#[test]
fn test_init_creates_project_directory() {
    let tmp = init_project();

    assert!(tmp.path().join(".aacneo").exists());
    assert!(tmp.path().join(".aacneo/store.json").exists());
    assert!(tmp.path().join(".aacneo/config.yaml").exists());
}

#[test]
fn test_init_twice_fails() {
    let tmp = init_project();

    let output = run(tmp.path(), &["init"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Already initialized"));
}

#[test]
fn test_batch_create_without_init_fails() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["batch", "create", "1520", "3"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not in an aacneo project"));
}

#[test]
fn test_batch_create_rejects_invalid_number() {
    let tmp = init_project();

    let output = run(tmp.path(), &["batch", "create", "15", "3"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("batchNumber"));
}

#[test]
fn test_full_batch_workflow() {
    let tmp = init_project();

    let output = run(tmp.path(), &["batch", "create", "1520", "3", "--json"]);
    assert!(output.status.success());
    let created = stdout_json(&output);
    assert_eq!(created["batchId"], "1520");
    assert_eq!(created["mouldId"], "3");
    assert_eq!(created["status"], "In Progress");
    assert_eq!(created["metadata"]["createdBy"], "app_user");

    let payload = tmp.path().join("batching.json");
    fs::write(
        &payload,
        json!({
            "freshSlurry": "2395",
            "cement": "abc",
            "dischargeTemp": "47",
            "mixingTime": {"hours": "1", "minutes": "30"},
            "dischargeTime": "10:42 PM"
        })
        .to_string(),
    )
    .unwrap();

    let output = run(
        tmp.path(),
        &["record", "batching", "1520", "--file", payload.to_str().unwrap(), "--json"],
    );
    assert!(output.status.success());
    let record = stdout_json(&output);
    let batching = &record["processSteps"]["batching"];
    assert_eq!(batching["materials"]["freshSlurry"], 2395.0);
    assert_eq!(batching["materials"]["cement"], 0.0);
    assert_eq!(batching["process"]["mixingTime"], 1.5);

    let output = run(tmp.path(), &["batch", "list", "--json"]);
    assert!(output.status.success());
    let summaries = stdout_json(&output);
    let summaries = summaries.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["batchNumber"], "1520");
    assert_eq!(summaries[0]["stages"]["batching"], "completed");
    assert_eq!(summaries[0]["stages"]["ferryCart"], "in-progress");

    let output = run(
        tmp.path(),
        &["batch", "list", "--stage", "ferry-cart", "--stage-status", "in-progress"],
    );
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("1520"));

    let output = run(tmp.path(), &["batch", "show", "1520"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Batch 1520 (mould 3)"));
    assert!(stdout.contains("batching"));
}

#[test]
fn test_segregation_completes_batch() {
    let tmp = init_project();
    run(tmp.path(), &["batch", "create", "1521", "4"]);

    let payload = tmp.path().join("segregation.json");
    fs::write(
        &payload,
        json!({
            "totalBlocks": "180",
            "shift": "Night",
            "stage1": {"rainCracks": "2", "cornerDamage": "1"},
            "stage4": {"chippedBlocks": "3"}
        })
        .to_string(),
    )
    .unwrap();

    let output = run(
        tmp.path(),
        &["record", "segregation", "1521", "-f", payload.to_str().unwrap(), "--json"],
    );
    assert!(output.status.success());
    let record = stdout_json(&output);
    assert_eq!(record["status"], "Completed");
    assert_eq!(record["processSteps"]["segregation"]["totalDefects"], 6);

    let output = run(tmp.path(), &["batch", "list", "--status", "completed", "--json"]);
    let summaries = stdout_json(&output);
    assert_eq!(summaries.as_array().unwrap().len(), 1);
}

#[test]
fn test_record_unknown_batch_fails() {
    let tmp = init_project();
    let payload = tmp.path().join("ferry.json");
    fs::write(&payload, r#"{"flow": "17"}"#).unwrap();

    let output = run(
        tmp.path(),
        &["record", "ferry-cart", "9999", "--file", payload.to_str().unwrap()],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Not found"));
}

#[test]
fn test_stage_set_updates_flags() {
    let tmp = init_project();
    run(tmp.path(), &["batch", "create", "1522", "5"]);

    let output = run(tmp.path(), &["stage", "set", "1522", "cutting", "in-progress"]);
    assert!(output.status.success());

    let output = run(tmp.path(), &["stage", "set", "1522", "packing", "completed"]);
    assert!(!output.status.success());

    let output = run(tmp.path(), &["stage", "set", "1522", "segregation", "completed"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("[completed]"));
}

#[test]
fn test_autoclave_cycle_updates_batches() {
    let tmp = init_project();
    run(tmp.path(), &["batch", "create", "1510", "1"]);
    run(tmp.path(), &["batch", "create", "1511", "2"]);

    let payload = tmp.path().join("autoclave.json");
    fs::write(
        &payload,
        json!({
            "autoclaveNumber": "3",
            "shift": "Day",
            "batchesProcessed": ["1510", "1511"],
            "previousDoorOpenTime": "2:38 AM",
            "doorCloseTime": "3:23 AM",
            "doorClosePressure": "-0.4",
            "doorOpenTime": "1:38 PM"
        })
        .to_string(),
    )
    .unwrap();

    let output = run(
        tmp.path(),
        &["autoclave", "record", "--file", payload.to_str().unwrap(), "--json"],
    );
    assert!(output.status.success());
    let cycle = stdout_json(&output);
    assert_eq!(cycle["autoclaveId"], 3);
    assert_eq!(cycle["batchesProcessed"], "1510, 1511");
    assert_eq!(cycle["doorCloseDuration"], "0h 45m");

    let output = run(tmp.path(), &["autoclave", "list", "--batch", "1511", "--json"]);
    let cycles = stdout_json(&output);
    assert_eq!(cycles.as_array().unwrap().len(), 1);

    let output = run(tmp.path(), &["batch", "show", "1510", "--json"]);
    let batch = stdout_json(&output);
    assert_eq!(batch["processSteps"]["autoclave"]["autoclaveNumber"], "3");
}

#[test]
fn test_autoclave_cycle_with_unknown_batch_changes_nothing() {
    let tmp = init_project();
    run(tmp.path(), &["batch", "create", "1510", "1"]);

    let payload = tmp.path().join("autoclave.json");
    fs::write(
        &payload,
        json!({
            "autoclaveNumber": "3",
            "shift": "Day",
            "batchesProcessed": ["1510", "7777"],
            "previousDoorOpenTime": "2:38 AM",
            "doorCloseTime": "3:23 AM",
            "doorOpenTime": "1:38 PM"
        })
        .to_string(),
    )
    .unwrap();

    let output = run(tmp.path(), &["autoclave", "record", "--file", payload.to_str().unwrap()]);
    assert!(!output.status.success());

    let output = run(tmp.path(), &["autoclave", "list", "--json"]);
    assert_eq!(stdout_json(&output).as_array().unwrap().len(), 0);
}

#[test]
fn test_import_workbook() {
    let tmp = init_project();

    let workbook = tmp.path().join("report.json");
    fs::write(
        &workbook,
        json!({
            "1. Batching ": [
                {"Batch No.": 1520, "Mould No.": 3, "Fresh Slurry Kg": 2395,
                 "Discharge Time": "1899-12-30T22:42:00.000Z"},
                {"Batch No.": 1521, "Mould No.": 4, "Fresh Slurry Kg": 2400}
            ],
            "4.Cutting Report": [
                {"Batch No.": 1520, "Mould No.": 3, "Chipping Rejection": 2}
            ],
            "5.Autoclave": [
                {"Autoclave Id": 3, "Shift": "Day", "Batches Processed": "1520, 1521"}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let output = run(
        tmp.path(),
        &["import", workbook.to_str().unwrap(), "--date", "2025-04-09", "--json"],
    );
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["manufacturing"]["inserted"], 2);
    assert_eq!(report["autoclave"]["inserted"], 1);
    assert!(tmp.path().join(".aacneo/plant.db").exists());

    // Same document ids on a second import.
    let output = run(
        tmp.path(),
        &["import", workbook.to_str().unwrap(), "--date", "2025-04-09"],
    );
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("failed"));
}

#[test]
fn test_import_rejects_bad_date() {
    let tmp = init_project();
    let workbook = tmp.path().join("report.json");
    fs::write(&workbook, "{}").unwrap();

    let output = run(
        tmp.path(),
        &["import", workbook.to_str().unwrap(), "--date", "09/04/2025"],
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("YYYY-MM-DD"));
}

#[test]
fn test_batch_export() {
    let tmp = init_project();
    run(tmp.path(), &["batch", "create", "1530", "6"]);
    run(tmp.path(), &["batch", "create", "1531", "7"]);

    let output = run(tmp.path(), &["batch", "export", "--json"]);
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["collection"], "ManufacturingProcess");
    assert_eq!(report["attempted"], 2);
    assert_eq!(report["inserted"], 2);

    let output = run(tmp.path(), &["batch", "export", "--json"]);
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["attempted"], 0);
    assert_eq!(report["inserted"], 0);

    run(tmp.path(), &["batch", "create", "1532", "8"]);
    let output = run(tmp.path(), &["batch", "export"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1/1 inserted"));
    assert!(stdout.contains("2 already exported"));
}

#[test]
fn test_duration_across_midnight() {
    let tmp = TempDir::new().unwrap();

    let output = run(tmp.path(), &["duration", "11:50 PM", "12:10 AM"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0h 20m");

    let output = run(tmp.path(), &["duration", "25:00", "12:10 AM"]);
    assert!(!output.status.success());
}
