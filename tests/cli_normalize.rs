use std::fs;

use predicates::prelude::*;

const LINE: &str = r#"{"payload_json":{"id":"123","address":"서울 노원구 월계동","rent":40,"deposit":1000,"area":33.06},"source_url":"https://x"}"#;

#[test]
fn normalize_writes_manifest_to_stdout() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("raw.jsonl");
    fs::write(&input, format!("{LINE}\n"))?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    let output = cmd
        .args(["normalize", "--platform", "generic", "--input"])
        .arg(&input)
        .output()?;
    assert!(output.status.success());

    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(manifest["metadata"]["platform_code"], "generic");
    assert_eq!(manifest["metadata"]["collection_mode"], "API");
    assert_eq!(manifest["items"][0]["rent_amount"], 40);
    assert_eq!(manifest["items"][0]["deposit_amount"], 1000);
    assert_eq!(manifest["items"][0]["area_claimed"], "estimated");
    assert_eq!(manifest["stats"]["raw_records"], 1);
    Ok(())
}

#[test]
fn normalize_writes_files_and_refuses_to_overwrite() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("raw.jsonl");
    let out = dir.path().join("out/manifest.json");
    let items = dir.path().join("out/items.jsonl");
    fs::write(&input, format!("{LINE}\n{LINE}\n"))?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    cmd.args(["normalize", "--platform", "generic", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .arg("--items-jsonl")
        .arg(&items)
        .assert()
        .success()
        .stdout("");

    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
    assert_eq!(manifest["stats"]["duplicates_dropped"], 1);
    let lines: Vec<String> = fs::read_to_string(&items)?
        .lines()
        .map(str::to_owned)
        .collect();
    assert_eq!(lines.len(), 1);

    let mut again = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    again
        .args(["normalize", "--platform", "generic", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("output already exists"));

    let mut forced = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    forced
        .args(["normalize", "--platform", "generic", "--force", "--input"])
        .arg(&input)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    Ok(())
}

#[test]
fn yaml_config_overrides_engine_settings() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("raw.jsonl");
    let config = dir.path().join("engine.yaml");
    fs::write(
        &input,
        r#"{"payload":{"id":"9","wolse":"55","images":["https://img.example.com/1.jpg","https://img.example.com/2.jpg"]}}"#,
    )?;
    fs::write(
        &config,
        "image_limit: 1\nmax_samples: 50\nfield_hints:\n  rent:\n    - wolse\n",
    )?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    let output = cmd
        .args(["normalize", "--platform", "generic", "--input"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .output()?;
    assert!(output.status.success());

    let manifest: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(manifest["metadata"]["image_limit"], 1);
    assert_eq!(manifest["metadata"]["max_samples"], 50);
    assert_eq!(manifest["items"][0]["rent_amount"], 55);
    assert_eq!(
        manifest["items"][0]["image_urls"],
        serde_json::json!(["https://img.example.com/1.jpg"])
    );
    Ok(())
}

#[test]
fn missing_input_fails_with_context() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    cmd.args([
        "normalize",
        "--platform",
        "generic",
        "--input",
        "/definitely/not/here.jsonl",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("open input jsonl"));
}

#[test]
fn unknown_platform_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join("raw.jsonl");
    fs::write(&input, format!("{LINE}\n"))?;

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    cmd.args(["normalize", "--platform", "nope", "--input"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown platform: nope"));
    Ok(())
}

#[test]
fn platforms_prints_registry_yaml() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    cmd.arg("platforms")
        .assert()
        .success()
        .stdout(predicate::str::contains("code: zigbang"))
        .stdout(predicate::str::contains("collection_mode: BLOCKED"));
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("listnorm");
    cmd.env("RUST_LOG", "debug")
        .arg("platforms")
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
}
