use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn ctc(data_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ctc").expect("binary");
    cmd.env("CTC_DATA_DIR", data_dir)
        .env_remove("CTC_HISTORY_CAP")
        .env_remove("CTC_BUCKET_POLICY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("API_KEY")
        .env("CTC_GEMINI_BASE_URL", "http://127.0.0.1:9");
    cmd
}

fn history_json(data_dir: &Path, extra: &[&str]) -> Value {
    let output = ctc(data_dir)
        .arg("history")
        .arg("--json")
        .args(extra)
        .output()
        .expect("history run");
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn check_prints_status_link() {
    let temp = tempdir().unwrap();
    ctc(temp.path())
        .args(["check", "1fujgldr5clbp8834"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "VehicleComplianceStatusLookup?vin=1FUJGLDR5CLBP8834",
        ));

    ctc(temp.path())
        .args(["check", "TR-1234", "--kind", "trucrs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("?entity=TR-1234"));
}

#[test]
fn empty_value_is_rejected() {
    let temp = tempdir().unwrap();
    ctc(temp.path()).args(["check", "   "]).assert().failure();
    let history = history_json(temp.path(), &[]);
    assert_eq!(history["total"], 0);
}

#[test]
fn cap_flag_bounds_history() {
    let temp = tempdir().unwrap();
    for value in ["AAA", "BBB", "CCC", "DDD"] {
        ctc(temp.path())
            .args(["--cap", "3", "check", value, "--kind", "entity"])
            .assert()
            .success();
    }
    let history = history_json(temp.path(), &["--sort", "value"]);
    let values: Vec<&str> = history["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["value"].as_str().unwrap())
        .collect();
    assert_eq!(values, vec!["BBB", "CCC", "DDD"]);
}

#[test]
fn cap_from_config_file() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("config.toml"), "history_cap = 1\n").unwrap();
    for value in ["AAA", "BBB"] {
        ctc(temp.path())
            .args(["check", value, "--kind", "owner"])
            .assert()
            .success();
    }
    let history = history_json(temp.path(), &[]);
    assert_eq!(history["total"], 1);
    assert_eq!(history["history"][0]["value"], "BBB");
}

#[test]
fn history_table_and_filter() {
    let temp = tempdir().unwrap();
    for value in ["ALPHA1", "BRAVO2"] {
        ctc(temp.path())
            .args(["check", value, "--kind", "entity"])
            .assert()
            .success();
    }
    ctc(temp.path())
        .args(["history", "--search", "bravo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BRAVO2"))
        .stdout(predicate::str::contains("ALPHA1").not())
        .stdout(predicate::str::contains("(1 of 2 shown)"));
}

#[test]
fn session_and_theme_round_trip() {
    let temp = tempdir().unwrap();
    ctc(temp.path())
        .args(["login", "ops@fleet.example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created and signed in as ops@fleet.example"));
    ctc(temp.path())
        .args(["theme", "toggle"])
        .assert()
        .success()
        .stdout("dark\n");

    let output = ctc(temp.path())
        .args(["whoami", "--json"])
        .output()
        .unwrap();
    let whoami: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(whoami["identity"], "ops@fleet.example");
    assert_eq!(whoami["theme"], "dark");

    ctc(temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed out ops@fleet.example"));
    ctc(temp.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}

#[test]
fn ask_without_key_answers_offline() {
    let temp = tempdir().unwrap();
    ctc(temp.path())
        .args(["ask", "Why is my DMV registration blocked?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("registration blocked"))
        .stdout(predicate::str::contains("Need clarity? 617-359-6953"));

    ctc(temp.path())
        .arg("recent")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1. Why is my DMV registration blocked?",
        ));
}

#[test]
fn find_tester_falls_back_to_generic_county() {
    let temp = tempdir().unwrap();
    ctc(temp.path())
        .args(["find-tester", "93701"])
        .assert()
        .success()
        .stdout(predicate::str::contains("California County"));

    ctc(temp.path())
        .args(["find-tester", "ABCDE"])
        .assert()
        .failure();
}

#[test]
fn scan_without_key_fails() {
    let temp = tempdir().unwrap();
    let image = temp.path().join("vin.jpg");
    fs::write(&image, [0xff, 0xd8, 0xff]).unwrap();
    ctc(temp.path())
        .arg("scan")
        .arg(&image)
        .assert()
        .failure()
        .stderr(predicate::str::contains("VIN scan failed"));
}

#[test]
fn checklist_prints_pre_test_steps() {
    let temp = tempdir().unwrap();
    ctc(temp.path())
        .args(["checklist", "smoke"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OVI (Smoke) pre-test checklist"))
        .stdout(predicate::str::contains("Disable exhaust brake/retarder"))
        .stdout(predicate::str::contains("OBD pre-test").not());

    let output = ctc(temp.path())
        .args(["checklist", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let lists: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(lists[0]["test"], "ovi");
    assert_eq!(lists[1]["label"], "OBD");
    assert_eq!(lists[1]["items"].as_array().unwrap().len(), 4);

    ctc(temp.path())
        .args(["checklist", "emissions"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown test"));
}

#[test]
fn decode_explains_status_tags() {
    let temp = tempdir().unwrap();
    ctc(temp.path())
        .args(["decode", "non-compliance"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NON-COMPLIANCE"))
        .stdout(predicate::str::contains("missing current OBD/Smoke test"));

    let output = ctc(temp.path()).args(["decode", "--json"]).output().unwrap();
    let tags: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(tags.as_array().unwrap().len(), 3);
    assert_eq!(tags[2]["tag"], "INCONSISTENCY");

    ctc(temp.path())
        .args(["decode", "overdue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown status tag"));
}

#[test]
fn analyze_without_key_fails() {
    let temp = tempdir().unwrap();
    let clip = temp.path().join("dpf.mp4");
    fs::write(&clip, [0u8, 0, 0, 24]).unwrap();
    ctc(temp.path())
        .arg("analyze")
        .arg(&clip)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Analysis failed"));
}
