//! Integration tests for the QCD CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get a qcd command isolated from the caller's environment
fn qcd() -> Command {
    let mut cmd = Command::cargo_bin("qcd").unwrap();
    cmd.env_remove("QCD_WORKSPACE")
        .env_remove("QCD_INSPECTOR")
        .env_remove("QCD_EXPORT_DIR")
        .env_remove("QCD_LOG");
    cmd
}

/// Helper to create a workspace in a temp directory
fn setup_workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    qcd().current_dir(tmp.path()).arg("init").assert().success();
    tmp
}

/// Run a command in the workspace and expect success
fn run_ok(tmp: &TempDir, args: &[&str]) -> String {
    let output = qcd().current_dir(tmp.path()).args(args).output().unwrap();
    assert!(
        output.status.success(),
        "qcd {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// A workspace with client CLT@1, project PRJ@1 and inspector QCI@1
fn setup_project() -> TempDir {
    let tmp = setup_workspace();
    run_ok(&tmp, &["client", "new", "--name", "Acme Energy"]);
    run_ok(
        &tmp,
        &["project", "new", "--name", "Boiler Deck", "--client", "CLT@1"],
    );
    run_ok(
        &tmp,
        &["inspector", "new", "--name", "Dana Reyes", "--role", "QC Inspector"],
    );
    tmp
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    qcd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("QC Dashboard"))
        .stdout(predicate::str::contains("mdr"))
        .stdout(predicate::str::contains("ncr"));
}

#[test]
fn test_version_displays() {
    qcd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("qcd"));
}

#[test]
fn test_outside_workspace_fails() {
    let tmp = TempDir::new().unwrap();
    qcd()
        .current_dir(tmp.path())
        .args(["client", "list"])
        .assert()
        .failure();
}

// ============================================================================
// Init Tests
// ============================================================================

#[test]
fn test_init_creates_workspace() {
    let tmp = TempDir::new().unwrap();
    qcd()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized QCD workspace"));

    assert!(tmp.path().join(".qcd").is_dir());
    assert!(tmp.path().join(".qcd/config.yaml").exists());
}

#[test]
fn test_init_twice_warns() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn test_workspace_flag_from_elsewhere() {
    let tmp = setup_workspace();
    let other = TempDir::new().unwrap();
    qcd()
        .current_dir(other.path())
        .args(["-w", tmp.path().to_str().unwrap(), "client", "new", "--name", "Remote"])
        .assert()
        .success();
    let out = run_ok(&tmp, &["client", "list", "-f", "short-id"]);
    assert!(out.contains("CLT@1"));
}

// ============================================================================
// Client & Project Tests
// ============================================================================

#[test]
fn test_client_new_and_list() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["client", "new", "--name", "Acme Energy", "--email", "qa@acme.test"])
        .assert()
        .success()
        .stderr(predicate::str::contains("CLT@1"));

    let out = run_ok(&tmp, &["client", "list", "-f", "json"]);
    assert!(out.contains("Acme Energy"));
}

#[test]
fn test_client_without_name_rejected() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["client", "new", "--email", "x@y.test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_project_without_client_rejected() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["project", "new", "--name", "Orphan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please select a client first"));

    let out = run_ok(&tmp, &["project", "list", "--count"]);
    assert_eq!(out.trim(), "0");
}

#[test]
fn test_client_with_projects_cannot_be_deleted() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .args(["client", "delete", "CLT@1", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("still owns 1 project"));
}

#[test]
fn test_delete_without_yes_is_cancelled() {
    let tmp = setup_workspace();
    run_ok(&tmp, &["client", "new", "--name", "Keep Me"]);

    qcd()
        .current_dir(tmp.path())
        .args(["client", "delete", "CLT@1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Delete cancelled"));

    let out = run_ok(&tmp, &["client", "list", "--count"]);
    assert_eq!(out.trim(), "1");
}

#[test]
fn test_delete_with_yes() {
    let tmp = setup_workspace();
    run_ok(&tmp, &["client", "new", "--name", "Gone Soon"]);
    run_ok(&tmp, &["client", "delete", "CLT@1", "--yes"]);
    let out = run_ok(&tmp, &["client", "list", "--count"]);
    assert_eq!(out.trim(), "0");
}

#[test]
fn test_json_reply_for_mutation() {
    let tmp = setup_workspace();
    let out = run_ok(&tmp, &["client", "new", "--name", "Json Co", "-f", "json"]);
    let reply: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(reply["success"], true);
    assert_eq!(reply["data"]["short_id"], "CLT@1");
    assert_eq!(reply["data"]["name"], "Json Co");
}

// ============================================================================
// Material Tests
// ============================================================================

#[test]
fn test_material_where_filter() {
    let tmp = setup_project();
    run_ok(
        &tmp,
        &["material", "new", "--mark", "B1", "--qty", "2", "--heat", "H-100", "-p", "PRJ@1"],
    );
    run_ok(
        &tmp,
        &["material", "new", "--mark", "C7", "--qty", "1", "--heat", "H-200", "-p", "PRJ@1"],
    );

    let out = run_ok(&tmp, &["material", "list", "--where", "heat=h-1", "--count"]);
    assert_eq!(out.trim(), "1");

    let out = run_ok(&tmp, &["material", "list", "-p", "PRJ@1", "--count"]);
    assert_eq!(out.trim(), "2");
}

#[test]
fn test_material_bad_filter_rejected() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["material", "list", "--where", "colour=red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown filter field"));
}

#[test]
fn test_material_zero_quantity_rejected() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["material", "new", "--mark", "B1", "--qty", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Quantity must be greater than 0"));
}

#[test]
fn test_import_template() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["material", "import", "--template"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mark"));
}

#[test]
fn test_import_csv() {
    let tmp = setup_project();
    let file = tmp.path().join("marks.csv");
    fs::write(&file, "Mark,Qty,Heat No\nB1,2,H-1\nB2,4,H-2\n").unwrap();

    qcd()
        .current_dir(tmp.path())
        .args(["material", "import", file.to_str().unwrap(), "-p", "PRJ@1", "--yes"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Imported 2 material(s)"));

    let out = run_ok(&tmp, &["material", "list", "--count"]);
    assert_eq!(out.trim(), "2");
}

#[test]
fn test_import_dry_run_creates_nothing() {
    let tmp = setup_workspace();
    let file = tmp.path().join("marks.csv");
    fs::write(&file, "Mark,Qty\nB1,2\n").unwrap();

    qcd()
        .current_dir(tmp.path())
        .args(["material", "import", file.to_str().unwrap(), "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Dry run"));

    let out = run_ok(&tmp, &["material", "list", "--count"]);
    assert_eq!(out.trim(), "0");
}

#[test]
fn test_import_row_errors_block_commit() {
    let tmp = setup_workspace();
    let file = tmp.path().join("marks.csv");
    fs::write(&file, "Mark,Qty\nB1,2\n,3\nB3,abc\n").unwrap();

    qcd()
        .current_dir(tmp.path())
        .args(["material", "import", file.to_str().unwrap(), "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import blocked"));

    let out = run_ok(&tmp, &["material", "list", "--count"]);
    assert_eq!(out.trim(), "0");
}

#[test]
fn test_import_unsupported_extension() {
    let tmp = setup_workspace();
    let file = tmp.path().join("marks.ods");
    fs::write(&file, "").unwrap();

    qcd()
        .current_dir(tmp.path())
        .args(["material", "import", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("can be imported"));
}

// ============================================================================
// Welder Tests
// ============================================================================

#[test]
fn test_welder_score_out_of_range() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["welder", "new", "--name", "Sam", "--cert-id", "W-1", "--score", "140"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Score must be between 0 and 100"));
}

// ============================================================================
// ITP Tests
// ============================================================================

#[test]
fn test_itp_items_and_export() {
    let tmp = setup_project();
    run_ok(&tmp, &["itp", "new", "--title", "Welding Plan", "-p", "PRJ@1"]);
    run_ok(
        &tmp,
        &["itp", "item", "add", "ITP@1", "--stage", "Fit-up", "--hold"],
    );
    run_ok(
        &tmp,
        &["itp", "item", "add", "ITP@1", "--stage", "Visual", "--witness"],
    );

    let out = run_ok(&tmp, &["itp", "show", "ITP@1"]);
    assert!(out.contains("Fit-up"));
    assert!(out.contains("Visual"));

    run_ok(&tmp, &["itp", "export", "ITP@1", "--to", "md"]);
    let exported = tmp.path().join("exports/ITP_welding-plan.md");
    let text = fs::read_to_string(exported).unwrap();
    assert!(text.contains("Welding Plan"));
    assert!(text.contains("Fit-up"));
}

#[test]
fn test_itp_evidence_attach() {
    let tmp = setup_project();
    run_ok(&tmp, &["itp", "new", "--title", "Paint Plan", "-p", "PRJ@1"]);
    let file = tmp.path().join("dft-readings.txt");
    fs::write(&file, "120 um").unwrap();

    run_ok(
        &tmp,
        &["itp", "evidence", "add", "ITP@1", file.to_str().unwrap()],
    );
    let out = run_ok(&tmp, &["itp", "show", "ITP@1"]);
    assert!(out.contains("dft-readings.txt"));
}

#[test]
fn test_itp_show_unknown_is_not_found_view() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["itp", "show", "ITP@99"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ITP not found"))
        .stdout(predicate::str::contains("qcd itp list"));
}

// ============================================================================
// Inspection & NCR Tests
// ============================================================================

#[test]
fn test_manual_ncr_requires_project() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .args(["ncr", "new", "--inspector", "QCI@1", "-d", "Undercut at joint 4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please select a project first"));

    let out = run_ok(&tmp, &["inspection", "list", "--count"]);
    assert_eq!(out.trim(), "0");
}

#[test]
fn test_manual_ncr_records_failed_inspection() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .args([
            "ncr",
            "new",
            "-p",
            "PRJ@1",
            "--inspector",
            "QCI@1",
            "-d",
            "Undercut at joint 4",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("NCR-"));

    let out = run_ok(&tmp, &["inspection", "list", "-f", "json"]);
    let rows: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert!(out.to_lowercase().contains("fail"));
}

#[test]
fn test_manual_ncr_uses_default_inspector() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .env("QCD_INSPECTOR", "QCI@1")
        .args(["ncr", "new", "-p", "PRJ@1", "-d", "Missing weld"])
        .assert()
        .success();
}

#[test]
fn test_ncr_against_existing_inspection() {
    let tmp = setup_project();
    run_ok(
        &tmp,
        &["inspection", "new", "-p", "PRJ@1", "--inspector", "QCI@1", "--result", "fail"],
    );
    run_ok(
        &tmp,
        &["ncr", "new", "--inspection", "INS@1", "-d", "Porosity", "--number", "NCR-X1"],
    );

    run_ok(&tmp, &["ncr", "close", "NCR@1"]);
    let out = run_ok(&tmp, &["ncr", "show", "NCR@1"]);
    assert!(out.contains("NCR-X1"));
    assert!(out.to_uppercase().contains("CLOSED"));
}

#[test]
fn test_duplicate_ncr_number_rejected() {
    let tmp = setup_project();
    run_ok(
        &tmp,
        &["inspection", "new", "-p", "PRJ@1", "--inspector", "QCI@1", "--result", "fail"],
    );
    run_ok(
        &tmp,
        &["ncr", "new", "--inspection", "INS@1", "-d", "First", "--number", "NCR-7"],
    );
    qcd()
        .current_dir(tmp.path())
        .args(["ncr", "new", "--inspection", "INS@1", "-d", "Second", "--number", "NCR-7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_ncr_show_unknown_is_not_found_view() {
    let tmp = setup_workspace();
    qcd()
        .current_dir(tmp.path())
        .args(["ncr", "show", "NCR@42"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NCR not found"));
}

#[test]
fn test_inspection_without_project_rejected() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .args(["inspection", "new", "--inspector", "QCI@1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please select a project first"));
}

// ============================================================================
// MDR Tests
// ============================================================================

#[test]
fn test_mdr_new_and_list() {
    let tmp = setup_project();
    run_ok(
        &tmp,
        &[
            "mdr",
            "cutting",
            "new",
            "-p",
            "PRJ@1",
            "--inspector",
            "QCI@1",
            "--status",
            "pass",
            "--set",
            "mark_no=B1",
            "--set",
            "length=1200",
        ],
    );

    let out = run_ok(&tmp, &["mdr", "cutting", "list", "-f", "json"]);
    assert!(out.contains("B1"));

    let out = run_ok(&tmp, &["mdr", "welding", "list", "--count"]);
    assert_eq!(out.trim(), "0");
}

#[test]
fn test_mdr_status_outside_vocabulary_rejected() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .args([
            "mdr", "cutting", "new", "-p", "PRJ@1", "--inspector", "QCI@1", "--status", "hold",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a Cutting status"));
}

#[test]
fn test_mdr_unknown_field_rejected() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .args([
            "mdr",
            "ndt",
            "new",
            "-p",
            "PRJ@1",
            "--inspector",
            "QCI@1",
            "--set",
            "colour=blue",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown NDT field"));
}

#[test]
fn test_mdr_unparseable_number_rejected() {
    let tmp = setup_project();
    qcd()
        .current_dir(tmp.path())
        .args([
            "mdr",
            "fitup",
            "new",
            "-p",
            "PRJ@1",
            "--inspector",
            "QCI@1",
            "--set",
            "gap=abc",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'gap' must be a number"));

    let out = run_ok(&tmp, &["mdr", "fitup", "list", "--count"]);
    assert_eq!(out.trim(), "0");
}

#[test]
fn test_mdr_other_discipline_rejected() {
    let tmp = setup_project();
    run_ok(
        &tmp,
        &["mdr", "painting", "new", "-p", "PRJ@1", "--inspector", "QCI@1"],
    );
    qcd()
        .current_dir(tmp.path())
        .args(["mdr", "cutting", "show", "MDR@1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Painting report"));
}

#[test]
fn test_mdr_welding_with_welder() {
    let tmp = setup_project();
    run_ok(
        &tmp,
        &["welder", "new", "--name", "Sam Ortiz", "--cert-id", "W-77", "--score", "91"],
    );
    run_ok(
        &tmp,
        &[
            "mdr",
            "welding",
            "new",
            "-p",
            "PRJ@1",
            "--inspector",
            "QCI@1",
            "--status",
            "reject",
            "--set",
            "welder_id=WLD@1",
        ],
    );

    let out = run_ok(&tmp, &["welder", "list", "-f", "json"]);
    assert!(out.contains("Sam Ortiz"));
}

// ============================================================================
// Dashboard & Validate Tests
// ============================================================================

#[test]
fn test_dashboard_json() {
    let tmp = setup_project();
    let out = run_ok(&tmp, &["dashboard", "-f", "json"]);
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(stats["clients"], 1);
    assert_eq!(stats["projects"], 1);
    assert_eq!(stats["inspectors"], 1);
}

#[test]
fn test_validate_clean_workspace() {
    let tmp = setup_project();
    run_ok(
        &tmp,
        &["mdr", "fitup", "new", "-p", "PRJ@1", "--inspector", "QCI@1"],
    );
    qcd()
        .current_dir(tmp.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("all valid"));
}

// ============================================================================
// Completions
// ============================================================================

#[test]
fn test_completions_bash() {
    qcd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("qcd"));
}

#[test]
fn test_completions_to_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("completions/qcd.fish");
    qcd()
        .args(["completions", "fish", "--output", path.to_str().unwrap()])
        .assert()
        .success();
    assert!(fs::read_to_string(path).unwrap().contains("qcd"));
}
