use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

#[allow(deprecated)]
fn wtsplit() -> Command {
    let mut cmd = Command::cargo_bin("wtsplit").expect("binary");
    cmd.env_remove("WTSPLIT_SERVICE_URL").env("RUST_LOG", "off");
    cmd
}

fn run_cli_raw(args: &[&str]) -> (bool, Value) {
    let output = wtsplit().args(args).output().expect("command run");
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    (output.status.success(), body)
}

fn run_cli(args: &[&str]) -> Value {
    let (ok, body) = run_cli_raw(args);
    assert!(ok, "stdout: {body}");
    assert_eq!(body["status"], "ok");
    body
}

const MATRIX: &str = r#"[
  {"code": "1", "bounds": [{"low": 0, "high": 10}]},
  {"code": "2", "bounds": [{"low": 10, "high": "inf"}]}
]"#;

const JOB: &str = r#"
labels = ["TP_thrL", "TP_thrH"]
fields = ["TP"]
path = "/data/pdt"
"#;

#[test]
fn check_values_reports_unordered_list() {
    let body = run_cli(&["check-values", "7, 3"]);
    assert_eq!(body["data"]["status"], "unordered");
    assert_eq!(body["data"]["ascending"], false);
    assert_eq!(body["data"]["parsed"], serde_json::json!([7.0, 3.0]));
}

#[test]
fn check_values_flags_invalid_entries() {
    let body = run_cli(&["check-values", "1, abc"]);
    assert_eq!(body["data"]["status"], "invalid");
    assert_eq!(body["data"]["shows_error"], true);
    assert!(body["data"]["problem"].as_str().unwrap().contains("abc"));

    let body = run_cli(&["check-values", ""]);
    assert_eq!(body["data"]["status"], "empty");
}

#[test]
fn bounds_below_first_value_is_open_ended() {
    let body = run_cli(&[
        "bounds",
        "--confirmed",
        "5, 2, 9",
        "--index",
        "0",
        "--direction",
        "below",
        "--field",
        "TP",
    ]);
    assert_eq!(body["data"]["lower"], "-inf");
    assert_eq!(body["data"]["upper"], 2.0);
    assert_eq!(body["data"]["label"], "-inf < TP < 2");
    assert_eq!(body["data"]["confirmed"], serde_json::json!([2.0, 5.0, 9.0]));
}

#[test]
fn bounds_index_out_of_range_is_an_error() {
    let (ok, body) = run_cli_raw(&[
        "bounds",
        "--confirmed",
        "2",
        "--index",
        "3",
        "--direction",
        "above",
    ]);
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "invalid_session_event");
}

#[test]
fn split_manual_values_locally() {
    let temp = tempdir().unwrap();
    let matrix_path = temp.path().join("matrix.json");
    let output_path = temp.path().join("out.json");
    fs::write(&matrix_path, MATRIX).unwrap();

    let body = run_cli(&[
        "split",
        "--matrix",
        matrix_path.to_str().unwrap(),
        "--row",
        "0",
        "--values",
        "7, 3",
        "--output",
        output_path.to_str().unwrap(),
    ]);

    assert_eq!(body["data"]["inserted"], 2);
    assert_eq!(body["data"]["affected"], serde_json::json!([0, 2]));
    let rows = body["data"]["matrix"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["bounds"][0]["high"], 3.0);
    assert_eq!(rows[1]["bounds"][0]["low"], 3.0);
    assert_eq!(rows[2]["bounds"][0]["low"], 7.0);
    assert!(rows[0]["code"].is_null());
    assert_eq!(rows[3]["code"], "2");
    assert_eq!(rows[3]["bounds"][0]["high"], "inf");

    let written: Value = serde_json::from_str(&fs::read_to_string(&output_path).unwrap()).unwrap();
    assert_eq!(written.as_array().unwrap().len(), 4);
}

#[test]
fn split_outside_bounds_fails_with_code() {
    let temp = tempdir().unwrap();
    let matrix_path = temp.path().join("matrix.json");
    fs::write(&matrix_path, MATRIX).unwrap();

    wtsplit()
        .args([
            "split",
            "--matrix",
            matrix_path.to_str().unwrap(),
            "--row",
            "0",
            "--values",
            "12",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""code":"invalid_split_value""#));
}

#[test]
fn split_outside_bounds_reports_the_row_interval() {
    let temp = tempdir().unwrap();
    let matrix_path = temp.path().join("matrix.json");
    fs::write(&matrix_path, MATRIX).unwrap();

    let (ok, body) = run_cli_raw(&[
        "split",
        "--matrix",
        matrix_path.to_str().unwrap(),
        "--row",
        "1",
        "--values",
        "4",
    ]);
    assert!(!ok);
    assert_eq!(
        body["error"]["details"],
        serde_json::json!({"value": 4.0, "low": 10.0, "high": "inf"})
    );
}

#[test]
fn split_rejects_missing_matrix_file() {
    let temp = tempdir().unwrap();
    let (ok, body) = run_cli_raw(&[
        "split",
        "--matrix",
        temp.path().join("nope.json").to_str().unwrap(),
        "--row",
        "0",
        "--values",
        "1",
    ]);
    assert!(!ok);
    assert_eq!(body["error"]["code"], "io_error");
}

#[test]
fn suggest_reports_unreachable_service() {
    let temp = tempdir().unwrap();
    let matrix_path = temp.path().join("matrix.json");
    let job_path = temp.path().join("job.toml");
    fs::write(&matrix_path, MATRIX).unwrap();
    fs::write(&job_path, JOB).unwrap();

    let (ok, body) = run_cli_raw(&[
        "--service-url",
        "http://127.0.0.1:9",
        "suggest",
        "--context",
        job_path.to_str().unwrap(),
        "--matrix",
        matrix_path.to_str().unwrap(),
        "--row",
        "0",
        "--count",
        "2",
    ]);
    assert!(!ok);
    assert_eq!(body["error"]["code"], "remote_failure");
    assert!(body["error"]["hint"].is_string());
}

#[test]
fn invalid_service_url_is_rejected_before_any_request() {
    let temp = tempdir().unwrap();
    let matrix_path = temp.path().join("matrix.json");
    let job_path = temp.path().join("job.toml");
    fs::write(&matrix_path, MATRIX).unwrap();
    fs::write(&job_path, JOB).unwrap();

    let (ok, body) = run_cli_raw(&[
        "--service-url",
        "ftp://nowhere",
        "suggest",
        "--context",
        job_path.to_str().unwrap(),
        "--matrix",
        matrix_path.to_str().unwrap(),
        "--row",
        "0",
    ]);
    assert!(!ok);
    assert_eq!(body["error"]["code"], "invalid_config");
}

#[test]
fn pretty_output_is_multiline() {
    wtsplit()
        .args(["--pretty", "check-values", "1, 2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"status\": \"ok\""));
}
