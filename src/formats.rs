use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::metrics::{RunMetrics, Thresholds};
use crate::registry::CollectionMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationCode {
    RecordParseFail,
    NormalizeException,
    ReqFieldMissing,
    AddressNormalizeFail,
    PriceParseFail,
    AreaParseFail,
    ImageUrlInvalid,
    SourceAccessBlocked,
}

impl ViolationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RecordParseFail => "RECORD_PARSE_FAIL",
            Self::NormalizeException => "NORMALIZE_EXCEPTION",
            Self::ReqFieldMissing => "REQ_FIELD_MISSING",
            Self::AddressNormalizeFail => "ADDRESS_NORMALIZE_FAIL",
            Self::PriceParseFail => "PRICE_PARSE_FAIL",
            Self::AreaParseFail => "AREA_PARSE_FAIL",
            Self::ImageUrlInvalid => "IMAGE_URL_INVALID",
            Self::SourceAccessBlocked => "SOURCE_ACCESS_BLOCKED",
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub level: Level,
    pub code: ViolationCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl Violation {
    pub fn warn(code: ViolationCode, message: impl Into<String>) -> Self {
        Self {
            level: Level::Warn,
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaClaimed {
    Exclusive,
    Gross,
    Range,
    Estimated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaseType {
    Monthly,
    Jeonse,
    Sale,
    ShortTerm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub platform_code: Option<String>,
    pub source_url: Option<String>,
    pub request_url: Option<String>,
    pub collected_at: Option<String>,
    pub payload: Option<Value>,
    pub list_data: Option<Value>,
}

impl RawRecord {
    pub fn origin_url(&self) -> Option<&str> {
        self.source_url
            .as_deref()
            .or(self.request_url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedListing {
    pub platform_code: String,
    pub source_ref: Option<String>,
    pub external_id: Option<String>,
    pub source_url: Option<String>,
    pub collected_at: Option<String>,

    pub address_text: Option<String>,
    pub address_code: Option<String>,
    pub address_city: Option<String>,
    pub address_district: Option<String>,
    pub address_neighborhood: Option<String>,

    pub lease_type: Option<LeaseType>,
    pub rent_amount: Option<i64>,
    pub deposit_amount: Option<i64>,

    pub area_exclusive_m2: Option<f64>,
    pub area_exclusive_m2_min: Option<f64>,
    pub area_exclusive_m2_max: Option<f64>,
    pub area_gross_m2: Option<f64>,
    pub area_gross_m2_min: Option<f64>,
    pub area_gross_m2_max: Option<f64>,
    pub area_claimed: Option<AreaClaimed>,

    pub room_count: Option<u32>,
    pub bathroom_count: Option<u32>,
    pub floor: Option<i32>,
    pub total_floor: Option<i32>,
    pub direction: Option<String>,
    pub building_use: Option<String>,
    pub building_name: Option<String>,

    pub image_urls: Vec<String>,
    pub raw_attrs: Map<String, Value>,
    pub validation: Vec<Violation>,
}

impl NormalizedListing {
    pub fn empty(platform_code: &str) -> Self {
        Self {
            platform_code: platform_code.to_owned(),
            source_ref: None,
            external_id: None,
            source_url: None,
            collected_at: None,
            address_text: None,
            address_code: None,
            address_city: None,
            address_district: None,
            address_neighborhood: None,
            lease_type: None,
            rent_amount: None,
            deposit_amount: None,
            area_exclusive_m2: None,
            area_exclusive_m2_min: None,
            area_exclusive_m2_max: None,
            area_gross_m2: None,
            area_gross_m2_min: None,
            area_gross_m2_max: None,
            area_claimed: None,
            room_count: None,
            bathroom_count: None,
            floor: None,
            total_floor: None,
            direction: None,
            building_use: None,
            building_name: None,
            image_urls: Vec::new(),
            raw_attrs: Map::new(),
            validation: Vec::new(),
        }
    }

    pub fn has_address(&self) -> bool {
        self.address_text
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty())
    }

    pub fn has_price(&self) -> bool {
        self.rent_amount.is_some() || self.deposit_amount.is_some()
    }

    pub fn has_area(&self) -> bool {
        self.area_exclusive_m2.is_some() || self.area_gross_m2.is_some()
    }

    pub fn has_violation(&self, code: ViolationCode) -> bool {
        self.validation.iter().any(|v| v.code == code)
    }

    /// Exclusive area when known, otherwise gross.
    pub fn primary_area(&self) -> Option<f64> {
        self.area_exclusive_m2.or(self.area_gross_m2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleOutcome {
    Normalized,
    Unmapped,
    Blocked,
    Failed,
    ParseFailed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub line: usize,
    pub outcome: SampleOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub candidates: usize,
    pub items: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ViolationCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureSample {
    pub line: usize,
    pub code: ViolationCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub platform_code: String,
    pub platform_name: String,
    pub collection_mode: CollectionMode,
    pub input_path: String,
    pub generated_at: String,
    pub raw_records: usize,
    pub normalized_items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    pub items_truncated: bool,
    pub include_raw: bool,
    pub image_limit: usize,
    pub max_samples: usize,
    pub max_depth: usize,
    pub max_nodes: usize,
    pub thresholds: Thresholds,
    pub threshold_breaches: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub metadata: RunMetadata,
    pub stats: RunMetrics,
    pub samples: Vec<Sample>,
    pub items: Vec<NormalizedListing>,
}
