//! Integration tests for the menudex query command

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command as AssertCommand;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// Test environment with an isolated config file and catalog
struct TestEnv {
    #[allow(dead_code)]
    temp_dir: TempDir,
    config_path: PathBuf,
    catalog_path: PathBuf,
}

const TEST_CATALOG: &str = r#"[
    {"id":"m1","name":"Street Tacos","dsc":"Corn tortillas with carne asada.","country":"Mexico","img":"a.jpg","rate":5,"price":8.5},
    {"id":"m2","name":"Margherita Pizza","dsc":"Tomato, mozzarella, basil.","country":"Italy","img":"b.jpg","rate":4,"price":12.0},
    {"id":"m3","name":"Pad Thai","dsc":"Rice noodles with tamarind and peanuts.","country":"Thailand","img":"c.jpg","rate":4,"price":10.25},
    {"id":"m4","name":"Taco Bowl","dsc":"Deconstructed taco over rice.","country":"Mexico","img":"d.jpg","rate":3,"price":9.0}
]"#;

impl TestEnv {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(config_content: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let catalog_path = temp_dir.path().join("meals.json");

        fs::write(&config_path, config_content).unwrap();
        fs::write(&catalog_path, TEST_CATALOG).unwrap();

        Self {
            temp_dir,
            config_path,
            catalog_path,
        }
    }

    fn query(&self, term: &str) -> AssertCommand {
        let mut cmd = menudex_cmd();
        cmd.args([
            "--config",
            self.config_path.to_str().unwrap(),
            "--catalog",
            self.catalog_path.to_str().unwrap(),
            "query",
            term,
        ]);
        cmd
    }
}

fn menudex_cmd() -> AssertCommand {
    AssertCommand::cargo_bin("menudex").unwrap()
}

/// Extract the tab-separated result lines (everything after the summary)
fn result_lines(stdout: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .skip(1)
        .map(|line| line.to_string())
        .collect()
}

// =============================================================================
// Query Tests
// =============================================================================

#[test]
fn test_query_matches_name() {
    let env = TestEnv::new();
    env.query("Tacos")
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 meal(s) matching \"Tacos\""))
        .stdout(predicate::str::contains("Street Tacos"));
}

#[test]
fn test_query_is_case_insensitive() {
    let env = TestEnv::new();
    for term in ["pizza", "PIZZA", "PiZzA"] {
        env.query(term)
            .assert()
            .success()
            .stdout(predicate::str::contains("Margherita Pizza"));
    }
}

#[test]
fn test_query_matches_description_and_country() {
    let env = TestEnv::new();
    env.query("tamarind")
        .assert()
        .success()
        .stdout(predicate::str::contains("Pad Thai"));

    let output = env.query("mexico").assert().success();
    let lines = result_lines(&output.get_output().stdout);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Street Tacos\t"));
    assert!(lines[1].starts_with("Taco Bowl\t"));
}

#[test]
fn test_query_no_match() {
    let env = TestEnv::new();
    env.query("sushi")
        .assert()
        .success()
        .stdout(predicate::str::contains("No matches for \"sushi\""));
}

#[test]
fn test_query_trims_whitespace() {
    let env = TestEnv::new();
    env.query("  tacos  ")
        .assert()
        .success()
        .stdout(predicate::str::contains("Street Tacos"));
}

#[test]
fn test_empty_query_lists_full_catalog_in_order() {
    let env = TestEnv::new();
    let output = env.query("").assert().success();
    let lines = result_lines(&output.get_output().stdout);
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Street Tacos\t"));
    assert!(lines[1].starts_with("Margherita Pizza\t"));
    assert!(lines[2].starts_with("Pad Thai\t"));
    assert!(lines[3].starts_with("Taco Bowl\t"));
}

#[test]
fn test_query_output_columns() {
    let env = TestEnv::new();
    let output = env.query("Tacos").assert().success();
    let lines = result_lines(&output.get_output().stdout);
    assert_eq!(lines.len(), 1);
    let columns: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(columns, vec!["Street Tacos", "Mexico", "★★★★★", "$8.50"]);
}

#[test]
fn test_embedded_catalog_is_used_without_catalog_flag() {
    let env = TestEnv::new();
    let mut cmd = menudex_cmd();
    cmd.args([
        "--config",
        env.config_path.to_str().unwrap(),
        "query",
        "",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Street Tacos"));
}

// =============================================================================
// Catalog Validation Tests
// =============================================================================

#[test]
fn test_duplicate_id_is_rejected() {
    let env = TestEnv::new();
    fs::write(
        &env.catalog_path,
        r#"[
            {"id":"m1","name":"A","dsc":"a","country":"X","img":"a.jpg","rate":1,"price":1.0},
            {"id":"m1","name":"B","dsc":"b","country":"Y","img":"b.jpg","rate":2,"price":2.0}
        ]"#,
    )
    .unwrap();

    env.query("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate meal id"));
}

#[test]
fn test_negative_price_is_rejected() {
    let env = TestEnv::new();
    fs::write(
        &env.catalog_path,
        r#"[{"id":"m1","name":"A","dsc":"a","country":"X","img":"a.jpg","rate":1,"price":-1.0}]"#,
    )
    .unwrap();

    env.query("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("negative price"));
}

#[test]
fn test_out_of_range_rating_is_clamped_with_warning() {
    let env = TestEnv::new();
    fs::write(
        &env.catalog_path,
        r#"[{"id":"m1","name":"A","dsc":"a","country":"X","img":"a.jpg","rate":9,"price":1.0}]"#,
    )
    .unwrap();

    let output = env.query("").assert().success();
    let lines = result_lines(&output.get_output().stdout);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("★★★★★"));

    let stderr = String::from_utf8_lossy(&output.get_output().stderr).to_string();
    assert!(stderr.contains("clamping"));
}

#[test]
fn test_invalid_catalog_json_fails() {
    let env = TestEnv::new();
    fs::write(&env.catalog_path, "not json").unwrap();
    env.query("").assert().failure();
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_currency_from_config() {
    let env = TestEnv::with_config("currency = \"€\"\n");
    let output = env.query("Tacos").assert().success();
    let lines = result_lines(&output.get_output().stdout);
    assert!(lines[0].ends_with("€8.50"));
}

#[test]
fn test_catalog_path_from_config() {
    let env = TestEnv::new();
    let config = format!("catalog = \"{}\"\n", env.catalog_path.display());
    fs::write(&env.config_path, config).unwrap();

    let mut cmd = menudex_cmd();
    cmd.args([
        "--config",
        env.config_path.to_str().unwrap(),
        "query",
        "Bowl",
    ]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Taco Bowl"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let env = TestEnv::new();
    let mut cmd = menudex_cmd();
    cmd.args([
        "--config",
        env.temp_dir.path().join("nope.toml").to_str().unwrap(),
        "--catalog",
        env.catalog_path.to_str().unwrap(),
        "query",
        "",
    ]);
    cmd.assert().failure();
}

#[test]
fn test_invalid_search_mode_fails() {
    let env = TestEnv::with_config("[search]\nmode = \"eventually\"\n");
    env.query("").assert().failure();
}

#[test]
fn test_unknown_config_key_warns_but_succeeds() {
    let env = TestEnv::with_config("frobnicate = true\n");
    env.query("Tacos")
        .assert()
        .success()
        .stderr(predicate::str::contains("unknown"));
}
