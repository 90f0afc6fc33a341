use assert_cmd::Command;
use httpmock::{Method::GET, MockServer};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const CALC_PATH: &str = "/api/shippingCalculator";

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("freight-quote-it-{}", uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn cmd(api_url: &str, dir: &Path) -> anyhow::Result<Command> {
    let mut cmd = Command::cargo_bin("freight-quote")?;
    cmd.env_remove("FREIGHT_QUOTE_CONFIG")
        .env_remove("FREIGHT_QUOTE_RATE_LIMIT_FILE")
        .env("XDG_CONFIG_HOME", dir)
        .env("FREIGHT_QUOTE_API_URL", api_url)
        .arg("--log-level")
        .arg("warn")
        .arg("--rate-limit-file")
        .arg(dir.join("rate-limit.json"));
    Ok(cmd)
}

fn stored_calls(dir: &Path) -> Vec<i64> {
    let text = fs::read_to_string(dir.join("rate-limit.json")).unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v["calls"].as_array().cloned())
        .unwrap_or_default()
        .iter()
        .filter_map(|v| v.as_i64())
        .collect()
}

fn seed_calls(dir: &Path, n: usize) {
    let now = chrono::Utc::now().timestamp_millis();
    let calls: Vec<i64> = (0..n as i64).map(|i| now - i * 1000).collect();
    fs::write(
        dir.join("rate-limit.json"),
        serde_json::json!({ "calls": calls }).to_string(),
    )
    .unwrap();
}

fn quote_args<'a>(command: &'a str) -> Vec<&'a str> {
    vec![
        command,
        "--origin",
        "CNNGB",
        "--destination",
        "GBSOU",
        "--loadtype",
        "container40HC",
        "--weight",
        "15000",
    ]
}

fn stdout_json(assert: &assert_cmd::assert::Assert) -> serde_json::Value {
    serde_json::from_slice(&assert.get_output().stdout).unwrap()
}

fn fcl_body() -> serde_json::Value {
    serde_json::json!({"response": {"estimatedFreightRates": {
        "numQuotes": 1,
        "mode": {
            "name": "FCL",
            "price": {
                "min": {"moneyAmount": {"amount": 2100, "currency": "USD"}},
                "max": {"moneyAmount": {"amount": 2900, "currency": "USD"}}
            },
            "transitTimes": {"unit": "days", "min": 28, "max": 35}
        }
    }}})
}

#[test]
fn get_quote_end_to_end() -> anyhow::Result<()> {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET)
            .path(CALC_PATH)
            .header("accept", "application/json")
            .query_param("origin", "CNNGB")
            .query_param("destination", "GBSOU")
            .query_param("loadtype", "container40HC")
            .query_param("weight", "15000")
            .query_param("format", "json");
        then.status(200).json_body(fcl_body());
    });
    let dir = scratch_dir();
    let assert = cmd(&server.url(CALC_PATH), &dir)?
        .args(quote_args("get-quote"))
        .assert()
        .success();
    let out = stdout_json(&assert);
    assert_eq!(out["num_quotes"], 1);
    assert_eq!(out["rates"][0]["mode"], "FCL");
    assert_eq!(out["rates"][0]["min_price"]["amount"], 2100.0);
    assert_eq!(out["rate_limit"]["count"], 1);
    assert_eq!(out["rate_limit"]["remaining"], 99);
    m.assert();
    assert_eq!(stored_calls(&dir).len(), 1);
    Ok(())
}

#[test]
fn zero_quotes_is_success() -> anyhow::Result<()> {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(GET).path(CALC_PATH);
        then.status(200).json_body(serde_json::json!({"response": {
            "estimatedFreightRates": {"numQuotes": 0}
        }}));
    });
    let dir = scratch_dir();
    let assert = cmd(&server.url(CALC_PATH), &dir)?
        .args(quote_args("get-quote"))
        .assert()
        .success();
    let out = stdout_json(&assert);
    assert_eq!(out["num_quotes"], 0);
    assert_eq!(out["rates"], serde_json::json!([]));
    assert!(out.get("errors").is_none());
    Ok(())
}

#[test]
fn exhausted_quota_skips_network() -> anyhow::Result<()> {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET).path(CALC_PATH);
        then.status(200).json_body(fcl_body());
    });
    let dir = scratch_dir();
    seed_calls(&dir, 100);
    let assert = cmd(&server.url(CALC_PATH), &dir)?
        .args(quote_args("get-quote"))
        .assert()
        .failure();
    let out = stdout_json(&assert);
    assert_eq!(out["error"]["code"], "quota_exceeded");
    assert!(out["errors"][0]
        .as_str()
        .unwrap()
        .starts_with("Rate limit exceeded"));
    assert_eq!(out["rate_limit"]["remaining"], 0);
    assert_eq!(m.hits(), 0);
    assert_eq!(stored_calls(&dir).len(), 100);
    Ok(())
}

#[test]
fn business_error_still_counts() -> anyhow::Result<()> {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(GET).path(CALC_PATH);
        then.status(200)
            .json_body(serde_json::json!({"response": {"errors": "bad route"}}));
    });
    let dir = scratch_dir();
    let assert = cmd(&server.url(CALC_PATH), &dir)?
        .args(quote_args("get-quote"))
        .assert()
        .failure();
    let out = stdout_json(&assert);
    assert_eq!(out["errors"], serde_json::json!(["bad route"]));
    assert_eq!(out["error"]["code"], "upstream_error");
    assert_eq!(out["rate_limit"]["count"], 1);
    assert_eq!(stored_calls(&dir).len(), 1);
    Ok(())
}

#[test]
fn http_failure_reports_status_and_counts() -> anyhow::Result<()> {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(GET).path(CALC_PATH);
        then.status(503).body("maintenance");
    });
    let dir = scratch_dir();
    seed_calls(&dir, 3);
    let assert = cmd(&server.url(CALC_PATH), &dir)?
        .args(quote_args("get-quote"))
        .assert()
        .failure()
        .stdout(predicate::str::contains("maintenance"));
    let out = stdout_json(&assert);
    assert_eq!(out["error"]["code"], "upstream_error");
    assert_eq!(out["error"]["retriable"], true);
    assert_eq!(stored_calls(&dir).len(), 4);
    Ok(())
}

#[test]
fn estimate_and_units_reach_upstream() -> anyhow::Result<()> {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET)
            .path(CALC_PATH)
            .query_param("weight", "500lb")
            .query_param("width", "120cm")
            .query_param("quantity", "3")
            .query_param("mode", "air")
            .query_param("estimate", "true")
            .query_param("format", "json");
        then.status(200).json_body(fcl_body());
    });
    let dir = scratch_dir();
    cmd(&server.url(CALC_PATH), &dir)?
        .args([
            "get-estimate",
            "--origin",
            "CNNGB",
            "--destination",
            "GBSOU",
            "--loadtype",
            "boxes",
            "--weight",
            "500",
            "--weight-unit",
            "lb",
            "--width",
            "120",
            "--dimension-unit",
            "cm",
            "--quantity",
            "3",
            "--mode",
            "air",
        ])
        .assert()
        .success();
    m.assert();
    Ok(())
}

#[test]
fn compare_rates_returns_every_mode() -> anyhow::Result<()> {
    let server = MockServer::start();
    let mode = fcl_body()["response"]["estimatedFreightRates"]["mode"].clone();
    let mut air = mode.clone();
    air["name"] = serde_json::json!("air");
    let _m = server.mock(|when, then| {
        when.method(GET).path(CALC_PATH).query_param("format", "json");
        then.status(200).json_body(serde_json::json!({"response": {"estimatedFreightRates": {
            "numQuotes": 2, "mode": [mode, air]
        }}}));
    });
    let dir = scratch_dir();
    let assert = cmd(&server.url(CALC_PATH), &dir)?
        .args(quote_args("compare-rates"))
        .assert()
        .success();
    let out = stdout_json(&assert);
    assert_eq!(out["num_quotes"], 2);
    assert_eq!(out["rates"][1]["mode"], "air");
    Ok(())
}

#[test]
fn corrupt_history_is_treated_as_empty() -> anyhow::Result<()> {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(GET).path(CALC_PATH);
        then.status(200).json_body(fcl_body());
    });
    let dir = scratch_dir();
    fs::write(dir.join("rate-limit.json"), "{{{ not json")?;
    cmd(&server.url(CALC_PATH), &dir)?
        .args(quote_args("get-quote"))
        .assert()
        .success();
    assert_eq!(stored_calls(&dir).len(), 1);
    Ok(())
}

#[test]
fn rate_limit_command_reports_warning() -> anyhow::Result<()> {
    let dir = scratch_dir();
    seed_calls(&dir, 85);
    let assert = cmd("http://127.0.0.1:9/unused", &dir)?
        .arg("rate-limit")
        .assert()
        .success();
    let out = stdout_json(&assert);
    assert_eq!(out["count"], 85);
    assert_eq!(out["remaining"], 15);
    assert_eq!(out["percent_used"], 85);
    assert!(out["warning"].as_str().unwrap().contains("Approaching"));
    // Reading status never touches the history.
    assert_eq!(stored_calls(&dir).len(), 85);
    Ok(())
}

#[test]
fn list_tools_names_every_command() -> anyhow::Result<()> {
    let dir = scratch_dir();
    cmd("http://127.0.0.1:9/unused", &dir)?
        .arg("list-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"get-quote\""))
        .stdout(predicate::str::contains("\"get-estimate\""))
        .stdout(predicate::str::contains("\"compare-rates\""))
        .stdout(predicate::str::contains("\"rate-limit\""));
    Ok(())
}

#[test]
fn invalid_weight_is_rejected_without_accounting() -> anyhow::Result<()> {
    let dir = scratch_dir();
    let assert = cmd("http://127.0.0.1:9/unused", &dir)?
        .args([
            "get-quote",
            "--origin",
            "A",
            "--destination",
            "B",
            "--loadtype",
            "boxes",
            "--weight",
            "0",
        ])
        .assert()
        .failure();
    let out = stdout_json(&assert);
    assert_eq!(out["error"]["code"], "invalid_request");
    assert_eq!(out["rate_limit"]["count"], 0);
    assert_eq!(out["rate_limit"]["remaining"], 100);
    assert!(stored_calls(&dir).is_empty());
    Ok(())
}

#[test]
fn missing_config_file_prints_failure_document() -> anyhow::Result<()> {
    let dir = scratch_dir();
    seed_calls(&dir, 4);
    let assert = cmd("http://127.0.0.1:9/unused", &dir)?
        .arg("--config")
        .arg(dir.join("no-such-config.json"))
        .args(quote_args("get-quote"))
        .assert()
        .failure();
    let out = stdout_json(&assert);
    assert_eq!(out["error"]["code"], "config_error");
    assert!(out["errors"][0]
        .as_str()
        .unwrap()
        .contains("no-such-config.json"));
    assert_eq!(out["rate_limit"]["count"], 4);
    assert_eq!(stored_calls(&dir).len(), 4);
    Ok(())
}

#[test]
fn rate_limit_command_reports_config_error() -> anyhow::Result<()> {
    let dir = scratch_dir();
    let assert = cmd("http://127.0.0.1:9/unused", &dir)?
        .env("FREIGHT_QUOTE_HTTP_TIMEOUT_SECS", "soon")
        .arg("rate-limit")
        .assert()
        .failure();
    let out = stdout_json(&assert);
    assert_eq!(out["error"]["code"], "config_error");
    assert_eq!(out["rate_limit"]["count"], 0);
    Ok(())
}
