use std::path::Path;

use serde_json::{Value, json};

use crate::block::detect_block;
use crate::config::EngineConfig;
use crate::discovery::Discoverer;
use crate::error::RecordError;
use crate::formats::{RawRecord, RunMetadata, RunResult, Sample, SampleOutcome};
use crate::listing::Promoter;
use crate::metrics::RunMetrics;
use crate::reader::{JsonlReader, RawLine, decode_embedded};
use crate::registry::{CollectionMode, PlatformAdapter};
use crate::scoring::{Deduper, Offer, dedup_key, score};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_items: Option<usize>,
    pub include_raw: bool,
}

pub struct Normalizer<'r> {
    adapter: &'r PlatformAdapter,
    config: EngineConfig,
}

struct Run {
    metrics: RunMetrics,
    deduper: Deduper,
    samples: Vec<Sample>,
    sample_cap: usize,
}

impl Run {
    fn sample(&mut self, sample: Sample) {
        if self.samples.len() < self.sample_cap {
            self.samples.push(sample);
        }
    }
}

struct RecordOutcome {
    candidates: usize,
    external_ids: Vec<String>,
    items: usize,
}

impl<'r> Normalizer<'r> {
    pub fn new(adapter: &'r PlatformAdapter, config: EngineConfig) -> Self {
        Self { adapter, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Normalize one JSONL capture. Fails only when the input cannot be opened.
    pub fn normalize(&self, path: &Path, options: &NormalizeOptions) -> anyhow::Result<RunResult> {
        let reader = JsonlReader::open(path)?;
        let platform = self.adapter.code.as_str();
        tracing::info!(platform, input = %path.display(), "normalize started");
        if self.adapter.collection_mode == CollectionMode::Blocked {
            tracing::info!(platform, "platform is marked BLOCKED; expecting block pages");
        }

        let discoverer = Discoverer::new(&self.config.field_hints, self.config.discovery);
        let promoter = Promoter::new(
            platform,
            &self.config,
            self.adapter.site_root.as_deref(),
            options.include_raw,
        );
        let mut run = Run {
            metrics: RunMetrics::default(),
            deduper: Deduper::new(),
            samples: Vec::new(),
            sample_cap: self.config.sample_cap(),
        };

        for raw_line in reader {
            run.metrics.raw_records += 1;
            match raw_line {
                RawLine::Malformed { line, error } => {
                    tracing::debug!(line, %error, "skipping malformed line");
                    run.metrics.parse_failure_from_json += 1;
                    run.metrics.record_failure(line, error.code(), error.to_string());
                    run.sample(failure_sample(line, SampleOutcome::ParseFailed, None, &error));
                }
                RawLine::Record { line, record } => {
                    run.metrics.parsed_raw_records += 1;
                    self.handle_record(&mut run, &discoverer, &promoter, line, &record);
                }
            }
        }

        let deduper = std::mem::take(&mut run.deduper);
        run.metrics.duplicates_dropped = deduper.duplicates_dropped();
        let mut items = deduper.into_items();
        let items_truncated = options.max_items.is_some_and(|max| items.len() > max);
        if let Some(max) = options.max_items {
            items.truncate(max);
        }

        run.metrics.finish(&items);
        let threshold_breaches = run.metrics.threshold_breaches(&self.config.thresholds);
        for breach in &threshold_breaches {
            tracing::warn!(platform, threshold = %breach, "quality threshold not met");
        }

        let metadata = RunMetadata {
            platform_code: self.adapter.code.clone(),
            platform_name: self.adapter.name.clone(),
            collection_mode: self.adapter.collection_mode,
            input_path: path.display().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            raw_records: run.metrics.raw_records,
            normalized_items: items.len(),
            max_items: options.max_items,
            items_truncated,
            include_raw: options.include_raw,
            image_limit: self.config.image_limit,
            max_samples: run.sample_cap,
            max_depth: self.config.discovery.max_depth,
            max_nodes: self.config.discovery.max_nodes,
            thresholds: self.config.thresholds,
            threshold_breaches,
        };

        tracing::info!(
            platform,
            raw_records = run.metrics.raw_records,
            items = items.len(),
            duplicates = run.metrics.duplicates_dropped,
            "normalize finished"
        );

        Ok(RunResult {
            metadata,
            stats: run.metrics,
            samples: run.samples,
            items,
        })
    }

    fn handle_record(
        &self,
        run: &mut Run,
        discoverer: &Discoverer<'_>,
        promoter: &Promoter<'_>,
        line: usize,
        record: &RawRecord,
    ) {
        if let Some(code) = record.platform_code.as_deref()
            && !code.eq_ignore_ascii_case(&self.adapter.code)
        {
            tracing::debug!(
                line,
                record_platform = code,
                "record platform differs from run platform"
            );
        }
        let source_url = record.origin_url().map(str::to_owned);

        match self.process_record(run, discoverer, promoter, line, record) {
            Ok(outcome) => {
                let outcome_kind = if outcome.items == 0 {
                    run.metrics.unmapped_records += 1;
                    tracing::debug!(
                        line,
                        candidates = outcome.candidates,
                        "record mapped to no listings"
                    );
                    SampleOutcome::Unmapped
                } else {
                    SampleOutcome::Normalized
                };
                run.sample(Sample {
                    line,
                    outcome: outcome_kind,
                    source_url,
                    candidates: outcome.candidates,
                    items: outcome.items,
                    external_ids: outcome.external_ids,
                    code: None,
                    message: None,
                });
            }
            Err(error) => {
                let outcome = match &error {
                    RecordError::Blocked { reason } => {
                        run.metrics.blocked_records += 1;
                        tracing::warn!(line, reason = %reason, "source access blocked");
                        SampleOutcome::Blocked
                    }
                    _ => {
                        run.metrics.parse_failure += 1;
                        tracing::debug!(line, %error, "record skipped");
                        SampleOutcome::Failed
                    }
                };
                run.metrics.record_failure(line, error.code(), error.to_string());
                run.sample(failure_sample(line, outcome, source_url, &error));
            }
        }
    }

    fn process_record(
        &self,
        run: &mut Run,
        discoverer: &Discoverer<'_>,
        promoter: &Promoter<'_>,
        line: usize,
        record: &RawRecord,
    ) -> Result<RecordOutcome, RecordError> {
        if record.payload.is_none() && record.list_data.is_none() {
            return Err(RecordError::MissingPayload);
        }
        let payload = record.payload.as_ref().map(decode_embedded).transpose()?;
        if let Some(reason) = payload.as_deref().and_then(detect_block) {
            return Err(RecordError::Blocked { reason });
        }
        let list_data = record.list_data.as_ref().map(decode_embedded).transpose()?;

        let roots: Vec<&Value> = payload
            .as_deref()
            .into_iter()
            .chain(list_data.as_deref())
            .collect();
        let discovery = discoverer.discover(&roots);
        if discovery.truncated {
            run.metrics.discovery_truncated_records += 1;
            tracing::debug!(line, visited = discovery.visited_nodes, "discovery truncated");
        }
        run.metrics.candidates_discovered += discovery.candidates.len();

        let mut outcome = RecordOutcome {
            candidates: discovery.candidates.len(),
            external_ids: Vec::new(),
            items: 0,
        };
        for candidate in discovery.candidates {
            let Some(mut listing) = promoter.promote(candidate, record) else {
                run.metrics.candidates_dropped_empty += 1;
                continue;
            };
            let key = dedup_key(&listing);
            let score = score(&listing);
            listing.raw_attrs.insert("score".to_owned(), json!(score));
            listing.raw_attrs.insert("dedup_key".to_owned(), json!(key));
            if let Some(id) = &listing.external_id {
                outcome.external_ids.push(id.clone());
            }
            run.metrics.normalized_before_dedup += 1;
            outcome.items += 1;
            match run.deduper.offer(key, listing, score) {
                Offer::Inserted => {}
                offer => tracing::debug!(line, score, ?offer, "duplicate listing"),
            }
        }
        Ok(outcome)
    }
}

fn failure_sample(
    line: usize,
    outcome: SampleOutcome,
    source_url: Option<String>,
    error: &RecordError,
) -> Sample {
    Sample {
        line,
        outcome,
        source_url,
        candidates: 0,
        items: 0,
        external_ids: Vec::new(),
        code: Some(error.code()),
        message: Some(error.to_string()),
    }
}
