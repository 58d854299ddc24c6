//! Integration tests for the qf CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd, with
//! the catalog served from CSV files in a temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MATERIALS_CSV: &str = "\
name,category,density,cost_per_unit_mass,priority
Aluminum 6061,Metal,0.0975,3.5,
Test Metal,Metal,0.1,5.0,yes
ABS,Plastic,0.0376,2.0,
";

const PROCESSES_CSV: &str = "\
name,category,setup_time_mins,hourly_rate,run_time_mins
Test Cutting,Cutting,10,100,5
Machining,Machining,20,150,30
Welding,Fabrication,15,90,
Test Finish,Finishing,0,50,10
";

const REFERENCE_SESSION: &str = "\
parts:
  - name: Part A
    volume: 2.5
    quantity: 10
    material: Test Metal
    cutting: Test Cutting
    machining: true
    finishing: Test Finish
";

/// Helper to get a qf command isolated from the user's config
fn qf(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("qf").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("QF_MATERIALS_URL")
        .env_remove("QF_PROCESSES_URL")
        .env_remove("QF_REFRESH_MINUTES")
        .env_remove("QF_UNITS")
        .env_remove("QF_ON_UNRESOLVED")
        .env_remove("RUST_LOG");
    cmd
}

/// Temp dir with both catalog tables written out
fn setup_catalog() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("materials.csv"), MATERIALS_CSV).unwrap();
    fs::write(tmp.path().join("processes.csv"), PROCESSES_CSV).unwrap();
    tmp
}

/// qf command with the catalog endpoints set through the environment
fn qf_with_catalog(tmp: &TempDir) -> Command {
    let mut cmd = qf(tmp.path());
    cmd.env("QF_MATERIALS_URL", tmp.path().join("materials.csv"))
        .env("QF_PROCESSES_URL", tmp.path().join("processes.csv"));
    cmd
}

fn write_session(tmp: &TempDir, name: &str, content: &str) -> String {
    let path = tmp.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Estimates part cost"));
}

#[test]
fn test_version_displays() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("qf"));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path())
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_completions_generate() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("qf"));
}

// ============================================================================
// Init Command Tests
// ============================================================================

#[test]
fn test_init_creates_config() {
    let tmp = TempDir::new().unwrap();

    qf(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized"));

    assert!(tmp.path().join(".qf/config.yaml").exists());
}

#[test]
fn test_init_twice_warns() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path()).arg("init").assert().success();

    qf(tmp.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    qf(tmp.path()).args(["init", "--force"]).assert().success();
}

// ============================================================================
// Quote Command Tests
// ============================================================================

#[test]
fn test_quote_reference_scenario() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    qf_with_catalog(&tmp)
        .args(["quote", &session])
        .assert()
        .success()
        .stdout(predicate::str::contains("Part A"))
        .stdout(predicate::str::contains("Material: Test Metal"))
        .stdout(predicate::str::contains("$12.50"))
        .stdout(predicate::str::contains("$100.00"))
        .stdout(predicate::str::contains("$800.00"))
        .stdout(predicate::str::contains("$83.33"))
        .stdout(predicate::str::contains("$995.83"));
}

#[test]
fn test_quote_json() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    let output = qf_with_catalog(&tmp)
        .args(["quote", &session, "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let parts: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let part = &parts[0];
    assert_eq!(part["name"], "Part A");
    assert_eq!(part["quantity"], 10);
    let total = part["total_cost_batch"].as_f64().unwrap();
    assert!((total - 995.833_333).abs() < 1e-3);
    let breakdown = part["breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 4);
    assert_eq!(breakdown[0]["line_item_key"], "Material: Test Metal");
    assert_eq!(breakdown[1]["line_item_key"], "Test Cutting");
    assert_eq!(breakdown[2]["line_item_key"], "Machining");
    assert_eq!(breakdown[3]["line_item_key"], "Test Finish");
}

#[test]
fn test_quote_set_override() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    // machining at $120/hr: 40 setup + 60 x 10 run = 640 instead of 800
    qf_with_catalog(&tmp)
        .args(["quote", &session, "--set", "Part A::Machining::rate=120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$640.00"))
        .stdout(predicate::str::contains("$835.83"))
        .stdout(predicate::str::contains("$120.00/hr*"));
}

#[test]
fn test_quote_clear_restores_catalog_rates() {
    let tmp = setup_catalog();
    let session = write_session(
        &tmp,
        "session.yaml",
        &format!(
            "{}    overrides:\n      Machining:\n        rate: 120\n",
            REFERENCE_SESSION
        ),
    );

    qf_with_catalog(&tmp)
        .args(["quote", &session])
        .assert()
        .success()
        .stdout(predicate::str::contains("$835.83"));

    qf_with_catalog(&tmp)
        .args(["quote", &session, "--clear", "Part A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$995.83"));
}

#[test]
fn test_quote_set_unknown_part_fails() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    qf_with_catalog(&tmp)
        .args(["quote", &session, "--set", "Part B::Machining::rate=120"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown part"));
}

#[test]
fn test_quote_rejects_malformed_set() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    qf_with_catalog(&tmp)
        .args(["quote", &session, "--set", "Part A::Machining::speed=3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("speed"));
}

#[test]
fn test_quote_metric_session_matches_imperial() {
    let tmp = setup_catalog();
    // 2.5 in^3 = 40.96766 cm^3
    let session = write_session(
        &tmp,
        "metric.yaml",
        "units: metric\nparts:\n  - name: Part A\n    volume: 40.96766\n    quantity: 10\n    material: Test Metal\n    cutting: Test Cutting\n    machining: true\n    finishing: Test Finish\n",
    );

    qf_with_catalog(&tmp)
        .args(["quote", &session])
        .assert()
        .success()
        .stdout(predicate::str::contains("kg"))
        .stdout(predicate::str::contains("$995.83"));
}

#[test]
fn test_quote_unknown_material_skipped_by_default() {
    let tmp = setup_catalog();
    let session = write_session(
        &tmp,
        "session.yaml",
        "parts:\n  - name: Odd\n    volume: 2.5\n    material: Unobtainium\n    welding: true\n",
    );

    // welding only: 15 x 90 / 60 + 60 x 90 / 60 = 22.50 + 90.00
    qf_with_catalog(&tmp)
        .args(["quote", &session])
        .assert()
        .success()
        .stdout(predicate::str::contains("$112.50"));
}

#[test]
fn test_quote_unknown_material_rejected_when_configured() {
    let tmp = setup_catalog();
    let session = write_session(
        &tmp,
        "session.yaml",
        "parts:\n  - name: Odd\n    volume: 2.5\n    material: Unobtainium\n",
    );

    qf_with_catalog(&tmp)
        .env("QF_ON_UNRESOLVED", "reject")
        .args(["quote", &session])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unobtainium"));
}

#[test]
fn test_quote_zero_quantity_is_invalid() {
    let tmp = setup_catalog();
    let session = write_session(
        &tmp,
        "session.yaml",
        "parts:\n  - name: None\n    volume: 2.5\n    quantity: 0\n",
    );

    qf_with_catalog(&tmp)
        .args(["quote", &session])
        .assert()
        .failure()
        .stderr(predicate::str::contains("quantity"));
}

#[test]
fn test_quote_catalog_unavailable() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    qf(tmp.path())
        .env("QF_MATERIALS_URL", tmp.path().join("missing.csv"))
        .env("QF_PROCESSES_URL", tmp.path().join("processes.csv"))
        .args(["quote", &session])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn test_quote_skips_non_finite_catalog_rows() {
    let tmp = setup_catalog();
    // the bad row comes first, so a lookup would otherwise pick it
    fs::write(
        tmp.path().join("processes.csv"),
        format!(
            "name,category,setup_time_mins,hourly_rate,run_time_mins\n\
             Machining,Machining,NaN,150,inf\n{}",
            PROCESSES_CSV.lines().skip(1).collect::<Vec<_>>().join("\n")
        ),
    )
    .unwrap();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    qf_with_catalog(&tmp)
        .args(["quote", &session])
        .assert()
        .success()
        .stdout(predicate::str::contains("$995.83"))
        .stdout(predicate::str::contains("NaN").not())
        .stderr(predicate::str::contains("skipping process row"));
}

#[test]
fn test_quote_duplicate_part_names() {
    let tmp = setup_catalog();
    let session = write_session(
        &tmp,
        "session.yaml",
        "parts:\n  - name: A\n    volume: 1\n  - name: A\n    volume: 2\n",
    );

    qf_with_catalog(&tmp)
        .args(["quote", &session])
        .assert()
        .failure()
        .stderr(predicate::str::contains("more than once"));
}

// ============================================================================
// Export Command Tests
// ============================================================================

#[test]
fn test_export_csv_reference_scenario() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    let output = qf_with_catalog(&tmp)
        .args(["export", &session])
        .output()
        .unwrap();
    assert!(output.status.success());

    let csv = String::from_utf8(output.stdout).unwrap();
    let mut lines = csv.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Part Name,Quantity,Material,Weight (lb),Material Cost ($),Per-Part Cost ($),\
Total Batch Cost ($),Cutting,Machining,Turning,3D Printing,Forming,Threading,Welding,\
Finishing,Cost: Machining ($),Cost: Test Cutting ($),Cost: Test Finish ($)"
    );
    assert_eq!(
        lines.next().unwrap(),
        "Part A,10,Test Metal,0.250,12.50,99.58,995.83,Test Cutting,Yes,None,None,None,\
None,None,Test Finish,800.00,100.00,83.33"
    );
}

#[test]
fn test_export_union_of_process_columns() {
    let tmp = setup_catalog();
    let session = write_session(
        &tmp,
        "session.yaml",
        "parts:\n  - name: Plate\n    volume: 4\n    welding: true\n  - name: Pin\n    volume: 1\n    machining: true\n",
    );

    let output = qf_with_catalog(&tmp)
        .args(["export", &session])
        .output()
        .unwrap();
    let csv = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = csv.lines().collect();

    assert!(lines[0].ends_with("Cost: Machining ($),Cost: Welding ($)"));
    // no material: Material, Weight and Material Cost are empty cells
    assert!(lines[1].starts_with("Plate,1,,,,"));
    // Plate has no machining line, Pin has no welding line
    assert!(lines[1].ends_with(",,112.50"));
    assert!(lines[2].ends_with(",125.00,"));
}

#[test]
fn test_export_unpriced_material_costs_zero() {
    let tmp = setup_catalog();
    let session = write_session(
        &tmp,
        "session.yaml",
        "parts:\n  - name: Odd\n    volume: 2.5\n    material: Unobtainium\n    welding: true\n",
    );

    let output = qf_with_catalog(&tmp)
        .args(["export", &session])
        .output()
        .unwrap();
    assert!(output.status.success());

    let csv = String::from_utf8(output.stdout).unwrap();
    let row = csv.lines().nth(1).unwrap();
    assert!(row.starts_with("Odd,1,Unobtainium,"));
    assert!(row.contains(",0.00,112.50,112.50,"));
}

#[test]
fn test_export_markdown_to_file() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);
    let out = tmp.path().join("quote.md");

    qf_with_catalog(&tmp)
        .args(["export", &session, "-f", "md", "-o"])
        .arg(&out)
        .assert()
        .success();

    let md = fs::read_to_string(&out).unwrap();
    assert!(md.contains("| Part Name"));
    assert!(md.contains("995.83"));
}

#[test]
fn test_export_json_records() {
    let tmp = setup_catalog();
    let session = write_session(&tmp, "session.yaml", REFERENCE_SESSION);

    let output = qf_with_catalog(&tmp)
        .args(["export", &session, "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records[0]["Part Name"], "Part A");
    assert_eq!(records[0]["Turning"], "None");
    assert_eq!(records[0]["Machining"], "Yes");
}

// ============================================================================
// Catalog Command Tests
// ============================================================================

#[test]
fn test_catalog_materials_priority_first() {
    let tmp = setup_catalog();

    let output = qf_with_catalog(&tmp)
        .args(["catalog", "materials", "-f", "csv"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let csv = String::from_utf8(output.stdout).unwrap();
    let names: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(names, ["Test Metal", "Aluminum 6061", "ABS"]);
}

#[test]
fn test_catalog_materials_category_filter() {
    let tmp = setup_catalog();

    qf_with_catalog(&tmp)
        .args(["catalog", "materials", "--category", "plastic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ABS"))
        .stdout(predicate::str::contains("Aluminum").not());
}

#[test]
fn test_catalog_processes_category_filter() {
    let tmp = setup_catalog();

    qf_with_catalog(&tmp)
        .args(["catalog", "processes", "--category", "finishing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Finish"))
        .stdout(predicate::str::contains("Machining").not());
}

#[test]
fn test_catalog_status_json() {
    let tmp = setup_catalog();

    let output = qf_with_catalog(&tmp)
        .args(["catalog", "status", "-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["table"], "materials");
    assert_eq!(rows[0]["rows"], 3);
    assert_eq!(rows[1]["table"], "processes");
    assert_eq!(rows[1]["rows"], 4);
}

#[test]
fn test_catalog_status_reports_missing_endpoint() {
    let tmp = TempDir::new().unwrap();

    qf(tmp.path())
        .args(["catalog", "status"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn test_catalog_from_project_config() {
    let tmp = setup_catalog();
    qf(tmp.path()).arg("init").assert().success();

    let materials = tmp.path().join("materials.csv");
    let processes = tmp.path().join("processes.csv");
    qf(tmp.path())
        .args(["config", "set", "endpoints.materials"])
        .arg(&materials)
        .assert()
        .success();
    qf(tmp.path())
        .args(["config", "set", "endpoints.processes"])
        .arg(&processes)
        .assert()
        .success();

    qf(tmp.path())
        .args(["catalog", "processes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test Cutting"));
}

// ============================================================================
// Config Command Tests
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let tmp = TempDir::new().unwrap();

    qf(tmp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("refresh_rate_minutes"))
        .stdout(predicate::str::contains("15"));
}

#[test]
fn test_config_keys() {
    let tmp = TempDir::new().unwrap();

    qf(tmp.path())
        .args(["config", "keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoints.materials"))
        .stdout(predicate::str::contains("on_unresolved"));
}

#[test]
fn test_config_set_show_unset() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path()).arg("init").assert().success();

    qf(tmp.path())
        .args(["config", "set", "units", "metric"])
        .assert()
        .success();
    qf(tmp.path())
        .args(["config", "show", "units"])
        .assert()
        .success()
        .stdout(predicate::str::contains("metric"));

    qf(tmp.path())
        .args(["config", "unset", "units"])
        .assert()
        .success();
    qf(tmp.path())
        .args(["config", "show", "units"])
        .assert()
        .success()
        .stdout(predicate::str::contains("imperial"));
}

#[test]
fn test_config_env_overrides_project() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path()).arg("init").assert().success();
    qf(tmp.path())
        .args(["config", "set", "refresh_rate_minutes", "30"])
        .assert()
        .success();

    qf(tmp.path())
        .env("QF_REFRESH_MINUTES", "5")
        .args(["config", "show", "refresh_rate_minutes"])
        .assert()
        .success()
        .stdout(predicate::str::diff("5\n"));
}

#[test]
fn test_config_set_rejects_bad_input() {
    let tmp = TempDir::new().unwrap();
    qf(tmp.path()).arg("init").assert().success();

    qf(tmp.path())
        .args(["config", "set", "author", "me"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown configuration key"));

    qf(tmp.path())
        .args(["config", "set", "units", "furlongs"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_config_set_outside_project_fails() {
    let tmp = TempDir::new().unwrap();

    qf(tmp.path())
        .args(["config", "set", "units", "metric"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a QuoteForge project"));
}
