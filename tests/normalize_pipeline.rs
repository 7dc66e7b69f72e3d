use std::fs;
use std::path::{Path, PathBuf};

use listnorm::config::EngineConfig;
use listnorm::engine::{NormalizeOptions, Normalizer};
use listnorm::formats::{RunResult, SampleOutcome, ViolationCode};
use listnorm::registry::Registry;
use serde_json::json;

fn write_jsonl(dir: &Path, lines: &[String]) -> anyhow::Result<PathBuf> {
    let path = dir.join("raw.jsonl");
    fs::write(&path, lines.join("\n") + "\n")?;
    Ok(path)
}

fn run(platform: &str, path: &Path, options: &NormalizeOptions) -> anyhow::Result<RunResult> {
    let registry = Registry::builtin();
    let adapter = registry.require(platform)?;
    Normalizer::new(adapter, EngineConfig::for_adapter(adapter)).normalize(path, options)
}

#[test]
fn single_payload_json_line_yields_one_clean_listing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = write_jsonl(
        dir.path(),
        &[r#"{"payload_json":{"id":"123","address":"서울 노원구 월계동","rent":40,"deposit":1000,"area":33.06},"source_url":"https://x"}"#.to_owned()],
    )?;

    let result = run("generic", &path, &NormalizeOptions::default())?;

    assert_eq!(result.items.len(), 1);
    let item = &result.items[0];
    assert_eq!(item.platform_code, "generic");
    assert_eq!(item.rent_amount, Some(40));
    assert_eq!(item.deposit_amount, Some(1000));
    assert_eq!(item.area_exclusive_m2, Some(33.06));
    assert!(item.address_text.is_some());
    assert!(!item.has_violation(ViolationCode::PriceParseFail));
    assert!(!item.has_violation(ViolationCode::AreaParseFail));

    assert_eq!(result.stats.raw_records, 1);
    assert_eq!(result.stats.parsed_raw_records, 1);
    assert_eq!(result.metadata.normalized_items, 1);
    assert_eq!(result.samples[0].outcome, SampleOutcome::Normalized);
    Ok(())
}

#[test]
fn reruns_produce_identical_items() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let lines = vec![
        json!({
            "payload": {"result": {"items": [
                {"id": 1, "address": "서울 강남구 역삼동", "price": "월세 1000/50", "area": "10평",
                 "images": ["https://img.example.com/1.jpg"]},
                {"address": "서울 마포구 합정동", "price": "전세 2억 5천", "size": "59㎡"}
            ]}},
            "collected_at": "2024-05-01T00:00:00Z"
        })
        .to_string(),
        json!({"payload": {"list": [{"id": 1, "rent": 50}]}}).to_string(),
    ];
    let path = write_jsonl(dir.path(), &lines)?;

    let first = run("generic", &path, &NormalizeOptions::default())?;
    let second = run("generic", &path, &NormalizeOptions::default())?;
    assert_eq!(first.items, second.items);
    assert_eq!(first.stats, second.stats);

    let jeonse = first
        .items
        .iter()
        .find(|item| item.external_id.is_none())
        .expect("hash-keyed listing");
    assert_eq!(jeonse.deposit_amount, Some(25_000));
    assert_eq!(jeonse.rent_amount, None);
    Ok(())
}

#[test]
fn same_id_keeps_the_more_complete_listing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let lines = vec![
        json!({"payload": {"id": "A1", "rent": 40}}).to_string(),
        json!({"payload": {
            "id": "A1", "rent": 45, "deposit": 500, "address": "서울 노원구 월계동",
            "area": 20, "images": ["https://img.example.com/a1.jpg"]
        }})
        .to_string(),
        json!({"payload": {"id": "A1", "rent": 99}}).to_string(),
    ];
    let path = write_jsonl(dir.path(), &lines)?;

    let result = run("generic", &path, &NormalizeOptions::default())?;

    assert_eq!(result.items.len(), 1);
    assert_eq!(result.items[0].rent_amount, Some(45));
    assert_eq!(result.stats.normalized_before_dedup, 3);
    assert_eq!(result.stats.duplicates_dropped, 2);
    Ok(())
}

#[test]
fn same_detail_url_without_id_keeps_the_more_complete_listing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let lines = vec![
        json!({"payload": {"detail_url": "https://x.example.com/room/9", "rent": 40}}).to_string(),
        json!({"payload": {
            "detail_url": "https://x.example.com/room/9", "rent": 40, "deposit": 1000,
            "area": "전용 24.5㎡"
        }})
        .to_string(),
    ];
    let path = write_jsonl(dir.path(), &lines)?;

    let result = run("generic", &path, &NormalizeOptions::default())?;

    assert_eq!(result.items.len(), 1);
    let item = &result.items[0];
    assert_eq!(item.source_ref.as_deref(), Some("https://x.example.com/room/9"));
    assert_eq!(item.deposit_amount, Some(1000));
    assert_eq!(item.area_exclusive_m2, Some(24.5));
    assert_eq!(result.stats.duplicates_dropped, 1);
    Ok(())
}

#[test]
fn container_objects_do_not_become_listings() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let payload = json!({"payload": {
        "title": "검색 결과",
        "items": [
            {"id": 1, "rent": 40, "images": ["https://img.example.com/1.jpg"]},
            {"id": 2, "rent": 50, "images": ["https://img.example.com/2.jpg"]}
        ]
    }});
    let path = write_jsonl(dir.path(), &[payload.to_string()])?;

    let result = run("generic", &path, &NormalizeOptions::default())?;

    assert_eq!(result.items.len(), 2);
    assert!(result.items.iter().all(|item| item.external_id.is_some()));
    assert!(result.items.iter().all(|item| item.image_urls.len() == 1));
    assert_eq!(result.stats.candidates_dropped_empty, 1);
    Ok(())
}

#[test]
fn price_side_note_does_not_drop_amounts() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let line = json!({"payload": {"id": "P1", "price": "보증금 1000 월세 50 (관리비 문의)"}});
    let path = write_jsonl(dir.path(), &[line.to_string()])?;

    let result = run("generic", &path, &NormalizeOptions::default())?;

    let item = &result.items[0];
    assert_eq!(item.deposit_amount, Some(1000));
    assert_eq!(item.rent_amount, Some(50));
    assert!(!item.has_violation(ViolationCode::PriceParseFail));
    Ok(())
}

#[test]
fn bad_lines_are_counted_and_the_run_continues() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let lines = vec![
        "{not json".to_owned(),
        String::new(),
        "[1, 2, 3]".to_owned(),
        json!({"source_url": "https://x"}).to_string(),
        json!({"payload": "{\"items\": ["}).to_string(),
        json!({"payload": {"meta": {"page": 1}}}).to_string(),
        json!({"payload": {"id": 7, "rent": 30}}).to_string(),
    ];
    let path = write_jsonl(dir.path(), &lines)?;

    let result = run("generic", &path, &NormalizeOptions::default())?;
    let stats = &result.stats;

    assert_eq!(stats.raw_records, 6);
    assert_eq!(stats.parse_failure_from_json, 2);
    assert_eq!(stats.parsed_raw_records, 4);
    assert_eq!(
        stats.raw_records,
        stats.parsed_raw_records + stats.parse_failure_from_json
    );
    assert_eq!(stats.parse_failure, 2);
    assert_eq!(stats.unmapped_records, 1);
    assert_eq!(result.items.len(), 1);
    assert_eq!(
        stats.violation_code_counts.get(&ViolationCode::RecordParseFail),
        Some(&2)
    );
    assert_eq!(
        stats.violation_code_counts.get(&ViolationCode::NormalizeException),
        Some(&2)
    );
    assert_eq!(stats.failure_samples.len(), 4);
    assert_eq!(stats.failure_samples[0].line, 1);
    Ok(())
}

#[test]
fn blocked_payloads_are_reported_not_silently_empty() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let lines = vec![
        json!({"payload": {"status": 429, "message": "Too Many Requests"}, "source_url": "https://x"})
            .to_string(),
        json!({"body": "<html><body>자동입력 방지 문자를 입력하세요</body></html>"}).to_string(),
    ];
    let path = write_jsonl(dir.path(), &lines)?;

    let result = run("hogangnono", &path, &NormalizeOptions::default())?;

    assert!(result.items.is_empty());
    assert_eq!(result.stats.blocked_records, 2);
    assert_eq!(
        result
            .stats
            .violation_code_counts
            .get(&ViolationCode::SourceAccessBlocked),
        Some(&2)
    );
    assert!(
        result
            .samples
            .iter()
            .all(|sample| sample.outcome == SampleOutcome::Blocked)
    );
    assert!(result.metadata.threshold_breaches.is_empty());
    Ok(())
}

#[test]
fn max_items_truncates_and_is_reported() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let rows: Vec<_> = (0..5).map(|i| json!({"id": i, "rent": 40 + i})).collect();
    let path = write_jsonl(dir.path(), &[json!({"payload": {"items": rows}}).to_string()])?;

    let options = NormalizeOptions {
        max_items: Some(2),
        include_raw: true,
    };
    let result = run("generic", &path, &options)?;

    assert_eq!(result.items.len(), 2);
    assert!(result.metadata.items_truncated);
    assert_eq!(result.metadata.normalized_items, 2);
    assert!(result.items[0].raw_attrs.contains_key("raw"));
    assert_eq!(result.items[0].external_id.as_deref(), Some("0"));
    Ok(())
}

#[test]
fn huge_payload_is_truncated_not_failed() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let rows: Vec<_> = (0..50_000).map(|i| json!({"wrapper": {"n": i}})).collect();
    let path = write_jsonl(dir.path(), &[json!({"payload": {"rows": rows}}).to_string()])?;

    let result = run("generic", &path, &NormalizeOptions::default())?;

    assert_eq!(result.stats.discovery_truncated_records, 1);
    assert_eq!(result.stats.unmapped_records, 1);
    assert!(result.items.is_empty());
    Ok(())
}

#[test]
fn missing_input_is_fatal() {
    let registry = Registry::builtin();
    let adapter = registry.require("generic").expect("generic platform");
    let err = Normalizer::new(adapter, EngineConfig::for_adapter(adapter))
        .normalize(
            Path::new("/definitely/not/here.jsonl"),
            &NormalizeOptions::default(),
        )
        .expect_err("missing input must fail");
    assert!(format!("{err:#}").contains("open input jsonl"));
}
