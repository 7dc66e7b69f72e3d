use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PYEONG_TO_SQM: f64 = 3.3058;

const SQM_UNITS: &[&str] = &["㎡", "m²", "m2", "제곱미터", "sqm"];
const PYEONG_UNITS: &[&str] = &["평", "pyeong", "py"];
const EXCLUSIVE_MARKERS: &[&str] = &["전용", "실면적", "exclusive", "net"];
const GROSS_MARKERS: &[&str] = &["공급", "계약", "분양", "supply", "gross"];

fn area_re() -> &'static Regex {
    static AREA_RE: OnceLock<Regex> = OnceLock::new();
    AREA_RE.get_or_init(|| {
        Regex::new(
            r"(?i)(\d+(?:\.\d+)?)\s*(㎡|m²|m2|제곱미터|sqm|평|pyeong|py)?(?:\s*(?:~|〜|～|–|-)\s*(\d+(?:\.\d+)?)\s*(㎡|m²|m2|제곱미터|sqm|평|pyeong|py)?)?",
        )
        .expect("valid area regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    Sqm,
    Pyeong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaType {
    Exclusive,
    Gross,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AreaParse {
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// Unit written in the source; `None` when the text had no unit (read as m²).
    pub unit: Option<AreaUnit>,
    pub area_type: Option<AreaType>,
}

impl AreaParse {
    pub fn is_range(&self) -> bool {
        matches!((self.min, self.max), (Some(min), Some(max)) if max > min)
    }
}

fn unit_of(token: &str) -> Option<AreaUnit> {
    let lower = token.to_lowercase();
    if SQM_UNITS.iter().any(|u| lower == *u) {
        Some(AreaUnit::Sqm)
    } else if PYEONG_UNITS.iter().any(|u| lower == *u) {
        Some(AreaUnit::Pyeong)
    } else {
        None
    }
}

fn type_of(text: &str) -> Option<AreaType> {
    let lower = text.to_lowercase();
    if EXCLUSIVE_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(AreaType::Exclusive)
    } else if GROSS_MARKERS.iter().any(|m| lower.contains(m)) {
        Some(AreaType::Gross)
    } else {
        None
    }
}

fn to_sqm(value: f64, unit: Option<AreaUnit>) -> f64 {
    let sqm = match unit {
        Some(AreaUnit::Pyeong) => value * PYEONG_TO_SQM,
        Some(AreaUnit::Sqm) | None => value,
    };
    (sqm * 1000.0).round() / 1000.0
}

/// Parse `24.5㎡`, `10평`, `전용 24~26㎡` and similar. A range's `value` is its midpoint.
///
/// The first number written with an area unit wins; a bare number is used only
/// when no number in the text carries a unit.
pub fn parse_area(text: &str) -> AreaParse {
    let cleaned = text.replace(',', "");
    let matches: Vec<Captures<'_>> = area_re().captures_iter(&cleaned).collect();
    let has_unit = |caps: &&Captures<'_>| {
        caps.get(2)
            .or_else(|| caps.get(4))
            .and_then(|m| unit_of(m.as_str()))
            .is_some()
    };
    let Some(caps) = matches.iter().find(has_unit).or_else(|| matches.first()) else {
        return AreaParse::default();
    };
    let Some(first) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
        return AreaParse::default();
    };
    let second = caps.get(3).and_then(|m| m.as_str().parse::<f64>().ok());
    let unit = caps
        .get(2)
        .or_else(|| caps.get(4))
        .and_then(|m| unit_of(m.as_str()));
    let area_type = type_of(text);

    if first <= 0.0 {
        return AreaParse::default();
    }

    match second {
        Some(second) if second > 0.0 => {
            let (lo, hi) = if second >= first {
                (first, second)
            } else {
                (second, first)
            };
            let min = to_sqm(lo, unit);
            let max = to_sqm(hi, unit);
            AreaParse {
                value: Some(((min + max) / 2.0 * 1000.0).round() / 1000.0),
                min: Some(min),
                max: Some(max),
                unit,
                area_type,
            }
        }
        _ => {
            let value = to_sqm(first, unit);
            AreaParse {
                value: Some(value),
                min: Some(value),
                max: Some(value),
                unit,
                area_type,
            }
        }
    }
}

/// Bare numbers are square meters.
pub fn parse_area_value(value: &Value) -> AreaParse {
    match value {
        Value::Number(n) => match n.as_f64().filter(|n| n.is_finite() && *n > 0.0) {
            Some(n) => {
                let sqm = to_sqm(n, Some(AreaUnit::Sqm));
                AreaParse {
                    value: Some(sqm),
                    min: Some(sqm),
                    max: Some(sqm),
                    unit: Some(AreaUnit::Sqm),
                    area_type: None,
                }
            }
            None => AreaParse::default(),
        },
        Value::String(s) => parse_area(s),
        _ => AreaParse::default(),
    }
}
