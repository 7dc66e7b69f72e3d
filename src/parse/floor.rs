use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloorParse {
    /// Negative for basement floors.
    pub floor: Option<i32>,
    pub total: Option<i32>,
}

struct FloorRules {
    paired: Regex,
    basement: Regex,
    bare: Regex,
}

fn rules() -> &'static FloorRules {
    static RULES: OnceLock<FloorRules> = OnceLock::new();
    RULES.get_or_init(|| FloorRules {
        // `3/15`, `3층/15층`, `B1/5`, `지하1/5층`, `고/15`
        paired: Regex::new(r"^(?i)(지하|b)?\s*(\d+|[가-힣]+)\s*층?\s*/\s*(\d+)\s*층?$")
            .expect("valid paired floor regex"),
        basement: Regex::new(r"^(?i)(?:지하\s*(\d+)\s*층?|b\s*(\d+)\s*f?)$")
            .expect("valid basement floor regex"),
        bare: Regex::new(r"^(?i)(-?\d+)\s*(?:층|f|floor)?$").expect("valid bare floor regex"),
    })
}

fn signed(number: &str, basement: bool) -> Option<i32> {
    let n = number.parse::<i32>().ok()?;
    Some(if basement { -n } else { n })
}

/// Parse floor text. Relative words (`저층`, `옥탑`) yield `None` rather than a guess.
pub fn parse_floor(text: &str) -> FloorParse {
    let trimmed = text.trim().replace(' ', "");
    let rules = rules();

    if let Some(caps) = rules.paired.captures(&trimmed) {
        let basement = caps.get(1).is_some();
        let floor = caps
            .get(2)
            .and_then(|m| signed(m.as_str(), basement))
            .filter(|f| *f != 0);
        let total = caps
            .get(3)
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .filter(|t| *t > 0);
        return FloorParse { floor, total };
    }

    if let Some(caps) = rules.basement.captures(&trimmed) {
        let floor = caps
            .get(1)
            .or_else(|| caps.get(2))
            .and_then(|m| signed(m.as_str(), true))
            .filter(|f| *f != 0);
        return FloorParse { floor, total: None };
    }

    if let Some(caps) = rules.bare.captures(&trimmed) {
        let floor = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .filter(|f| *f != 0);
        return FloorParse { floor, total: None };
    }

    FloorParse::default()
}

pub fn parse_floor_value(value: &Value) -> FloorParse {
    match value {
        Value::Number(n) => FloorParse {
            floor: n
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .filter(|f| *f != 0),
            total: None,
        },
        Value::String(s) => parse_floor(s),
        _ => FloorParse::default(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn floor_rule_matrix() {
        let cases = [
            ("3/15층", Some(3), Some(15)),
            ("3층/15층", Some(3), Some(15)),
            ("3 / 15", Some(3), Some(15)),
            ("B1/5층", Some(-1), Some(5)),
            ("지하1/5", Some(-1), Some(5)),
            ("고/15", None, Some(15)),
            ("저/5층", None, Some(5)),
            ("지하1층", Some(-1), None),
            ("지하 2층", Some(-2), None),
            ("B2", Some(-2), None),
            ("b1f", Some(-1), None),
            ("3층", Some(3), None),
            ("12", Some(12), None),
            ("-1", Some(-1), None),
            ("5F", Some(5), None),
            ("옥탑", None, None),
            ("저층", None, None),
            ("반지하", None, None),
            ("", None, None),
        ];
        for (input, floor, total) in cases {
            assert_eq!(
                parse_floor(input),
                FloorParse { floor, total },
                "input={input}"
            );
        }
    }

    #[test]
    fn numeric_floor_values() {
        assert_eq!(parse_floor_value(&json!(7)).floor, Some(7));
        assert_eq!(parse_floor_value(&json!("7/20")).total, Some(20));
        assert_eq!(parse_floor_value(&json!(true)), FloorParse::default());
    }
}
