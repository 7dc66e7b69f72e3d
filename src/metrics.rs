use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::MAX_FAILURE_SAMPLES;
use crate::formats::{FailureSample, NormalizedListing, ViolationCode};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub required_fields_rate: f64,
    pub image_valid_rate: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            required_fields_rate: 0.85,
            image_valid_rate: 0.9,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub raw_records: usize,
    pub parsed_raw_records: usize,
    pub parse_failure_from_json: usize,
    pub parse_failure: usize,
    pub unmapped_records: usize,
    pub blocked_records: usize,
    pub discovery_truncated_records: usize,
    pub candidates_discovered: usize,
    pub candidates_dropped_empty: usize,
    pub normalized_before_dedup: usize,
    pub duplicates_dropped: usize,
    pub normalized_items: usize,

    pub required_fields_rate: f64,
    pub address_rate: f64,
    pub price_rate: f64,
    pub area_rate: f64,
    pub image_presence_rate: f64,
    pub image_valid_rate: f64,

    pub violation_code_counts: BTreeMap<ViolationCode, usize>,
    pub failure_samples: Vec<FailureSample>,
}

impl RunMetrics {
    pub fn count_violation(&mut self, code: ViolationCode) {
        *self.violation_code_counts.entry(code).or_default() += 1;
    }

    /// Record a failed line. Samples beyond the cap are counted but not kept.
    pub fn record_failure(&mut self, line: usize, code: ViolationCode, message: impl Into<String>) {
        self.count_violation(code);
        if self.failure_samples.len() < MAX_FAILURE_SAMPLES {
            self.failure_samples.push(FailureSample {
                line,
                code,
                message: message.into(),
            });
        }
    }

    pub fn finish(&mut self, items: &[NormalizedListing]) {
        self.normalized_items = items.len();
        for item in items {
            for violation in &item.validation {
                self.count_violation(violation.code);
            }
        }

        self.required_fields_rate =
            share(items, |item| item.has_address() && item.has_price() && item.has_area());
        self.address_rate = share(items, NormalizedListing::has_address);
        self.price_rate = share(items, NormalizedListing::has_price);
        self.area_rate = share(items, NormalizedListing::has_area);
        self.image_presence_rate = share(items, |item| !item.image_urls.is_empty());
        self.image_valid_rate =
            share(items, |item| !item.has_violation(ViolationCode::ImageUrlInvalid));
    }

    /// Names of the thresholds this run falls below. Empty runs breach nothing.
    pub fn threshold_breaches(&self, thresholds: &Thresholds) -> Vec<String> {
        if self.normalized_items == 0 {
            return Vec::new();
        }
        let mut breaches = Vec::new();
        if self.required_fields_rate < thresholds.required_fields_rate {
            breaches.push("required_fields_rate".to_owned());
        }
        if self.image_valid_rate < thresholds.image_valid_rate {
            breaches.push("image_valid_rate".to_owned());
        }
        breaches
    }
}

fn share(items: &[NormalizedListing], pred: impl Fn(&NormalizedListing) -> bool) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    items.iter().filter(|&item| pred(item)).count() as f64 / items.len() as f64
}
