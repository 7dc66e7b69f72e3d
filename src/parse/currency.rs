use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::formats::LeaseType;
use crate::parse::text::normalize_lease_type;
use crate::registry::MoneyUnit;

const PLACEHOLDERS: &[&str] = &[
    "협의", "문의", "상담", "미정", "negotiable", "inquire", "contact",
];

const DEPOSIT_KEYWORDS: &[&str] = &["보증금", "전세금", "전세", "보증", "deposit"];
const RENT_KEYWORDS: &[&str] = &["월세", "월차임", "임대료", "rent", "monthly"];
const LEASE_LABELS: &[&str] = &["월세", "전세", "매매", "단기", "반전세"];

fn amount_token_re() -> &'static Regex {
    static AMOUNT_TOKEN_RE: OnceLock<Regex> = OnceLock::new();
    AMOUNT_TOKEN_RE.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s*(억|천\s*만|백\s*만|천|만\s*원|만|원)?")
            .expect("valid amount token regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Rent,
    Deposit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PricePair {
    pub rent: Option<i64>,
    pub deposit: Option<i64>,
    /// Lease kind named by the text itself (`전세 3억`, `월세 500/30`).
    pub lease_hint: Option<LeaseType>,
}

/// Text with no digits that reads as "ask the agent". Text carrying digits is
/// never a placeholder, so `보증금 1000 (관리비 문의)` still parses.
pub fn is_placeholder(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    if lower.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if lower.is_empty() || lower.chars().all(|c| matches!(c, '-' | '–' | '—' | '*' | '?')) {
        return true;
    }
    PLACEHOLDERS.iter().any(|p| lower.contains(p))
}

pub fn parse_manwon(text: &str) -> Option<i64> {
    if is_placeholder(text) {
        return None;
    }
    let cleaned = text.replace(',', "");

    let mut total = 0.0_f64;
    let mut saw_unit = false;
    let mut saw_eok = false;
    let mut bare: Option<f64> = None;
    let mut matched = false;

    for caps in amount_token_re().captures_iter(&cleaned) {
        let Some(number) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) else {
            continue;
        };
        let unit: String = caps
            .get(2)
            .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
            .unwrap_or_default();
        matched = true;

        match unit.as_str() {
            "억" => {
                total += number * 10_000.0;
                saw_eok = true;
                saw_unit = true;
            }
            "천만" => {
                total += number * 1_000.0;
                saw_unit = true;
            }
            "백만" => {
                total += number * 100.0;
                saw_unit = true;
            }
            "천" => {
                total += number * 1_000.0;
                saw_unit = true;
            }
            "만" | "만원" => {
                total += number;
                saw_unit = true;
            }
            "원" => {
                total += number / 10_000.0;
                saw_unit = true;
            }
            _ => {
                if saw_eok {
                    // remainder after 억, e.g. "1억 500"
                    total += number;
                } else if bare.is_none() && !saw_unit {
                    bare = Some(number);
                }
            }
        }
    }

    if !matched {
        return None;
    }
    let value = if saw_unit { total } else { bare? };
    Some(value.round() as i64)
}

/// Parse an amount from a JSON value. Bare numbers follow the platform's money unit.
pub fn parse_money_value(value: &Value, unit: MoneyUnit) -> Option<i64> {
    match value {
        Value::Number(n) => {
            let n = n.as_f64().filter(|n| n.is_finite())?;
            let manwon = match unit {
                MoneyUnit::Manwon => n,
                MoneyUnit::Won => n / 10_000.0,
            };
            Some(manwon.round() as i64)
        }
        Value::String(s) => {
            let trimmed = s.trim().replace(',', "");
            if unit == MoneyUnit::Won
                && let Ok(n) = trimmed.parse::<f64>()
            {
                return Some((n / 10_000.0).round() as i64);
            }
            parse_manwon(s)
        }
        _ => None,
    }
}

/// Split combined rent/deposit text into its two amounts.
///
/// Order of attempts: slash/pipe split, keyword anchors, then two bare numbers.
/// Which side is rent is decided by keywords next to each number first and by
/// `prefer_deposit_first` only when no keyword says otherwise.
pub fn parse_price_pair(text: &str, prefer_deposit_first: bool) -> PricePair {
    let mut pair = PricePair {
        lease_hint: lease_label(text),
        ..PricePair::default()
    };
    if is_placeholder(text) {
        return pair;
    }
    let body = strip_lease_label(text);

    if body.contains('/') || body.contains('|') {
        let parts: Vec<&str> = body
            .split(['/', '|'])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() >= 2 {
            let first = (keyword_role(parts[0]), parse_manwon(parts[0]));
            let second = (keyword_role(parts[1]), parse_manwon(parts[1]));
            assign_two(&mut pair, first, second, prefer_deposit_first);
            return pair;
        }
    }

    if let Some(anchored) = parse_anchored(body) {
        pair.rent = anchored.rent;
        pair.deposit = anchored.deposit;
        return pair;
    }

    let amounts = split_amounts(body);
    match amounts.as_slice() {
        [] => {}
        [single] => assign_single(&mut pair, *single),
        [first, second, ..] => {
            assign_two(
                &mut pair,
                (None, Some(*first)),
                (None, Some(*second)),
                prefer_deposit_first,
            );
        }
    }
    pair
}

fn assign_two(
    pair: &mut PricePair,
    first: (Option<Role>, Option<i64>),
    second: (Option<Role>, Option<i64>),
    prefer_deposit_first: bool,
) {
    let (first_role, second_role) = match (first.0, second.0) {
        (Some(a), Some(b)) if a != b => (a, b),
        (Some(a), _) => (a, other(a)),
        (None, Some(b)) => (other(b), b),
        (None, None) if prefer_deposit_first => (Role::Deposit, Role::Rent),
        (None, None) => (Role::Rent, Role::Deposit),
    };
    for (role, amount) in [(first_role, first.1), (second_role, second.1)] {
        match role {
            Role::Rent => pair.rent = pair.rent.or(amount),
            Role::Deposit => pair.deposit = pair.deposit.or(amount),
        }
    }
}

fn assign_single(pair: &mut PricePair, amount: i64) {
    match pair.lease_hint {
        Some(LeaseType::Monthly) => pair.rent = Some(amount),
        _ => pair.deposit = Some(amount),
    }
}

fn other(role: Role) -> Role {
    match role {
        Role::Rent => Role::Deposit,
        Role::Deposit => Role::Rent,
    }
}

fn keyword_role(text: &str) -> Option<Role> {
    let lower = text.to_lowercase();
    if DEPOSIT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(Role::Deposit);
    }
    if RENT_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(Role::Rent);
    }
    None
}

fn lease_label(text: &str) -> Option<LeaseType> {
    let trimmed = text.trim_start();
    LEASE_LABELS
        .iter()
        .find(|label| trimmed.starts_with(*label))
        .and_then(|label| normalize_lease_type(label))
        .or_else(|| {
            trimmed
                .contains("전세")
                .then_some(LeaseType::Jeonse)
                .filter(|_| !trimmed.contains("보증금"))
        })
}

/// Drop a leading lease label so `월세 1000/50` reads as a bare pair.
fn strip_lease_label(text: &str) -> &str {
    let trimmed = text.trim();
    for label in LEASE_LABELS {
        if let Some(rest) = trimmed.strip_prefix(label) {
            let rest = rest.trim_start();
            if rest.starts_with(|c: char| c.is_ascii_digit()) {
                return rest;
            }
        }
    }
    trimmed
}

/// `보증금 1000 월세 50`: each keyword owns the text up to the next keyword.
fn parse_anchored(text: &str) -> Option<PricePair> {
    let lower = text.to_lowercase();
    let mut anchors: Vec<(usize, usize, Role)> = Vec::new();
    for (keywords, role) in [(DEPOSIT_KEYWORDS, Role::Deposit), (RENT_KEYWORDS, Role::Rent)] {
        for keyword in keywords {
            for (start, matched) in lower.match_indices(keyword) {
                let end = start + matched.len();
                let overlaps = anchors.iter().any(|(s, e, _)| start < *e && end > *s);
                if !overlaps {
                    anchors.push((start, end, role));
                }
            }
        }
    }
    if anchors.is_empty() {
        return None;
    }
    anchors.sort_by_key(|(start, _, _)| *start);

    let mut pair = PricePair::default();
    for (idx, (_, end, role)) in anchors.iter().enumerate() {
        let stop = anchors
            .get(idx + 1)
            .map(|(next_start, _, _)| *next_start)
            .unwrap_or(lower.len());
        let segment = lower.get(*end..stop).unwrap_or_default();
        let segment = segment.split([',', '\n']).next().unwrap_or_default();
        let amount = parse_manwon(segment);
        match role {
            Role::Rent => pair.rent = pair.rent.or(amount),
            Role::Deposit => pair.deposit = pair.deposit.or(amount),
        }
    }
    (pair.rent.is_some() || pair.deposit.is_some()).then_some(pair)
}

/// Break free text into separate amounts. A token continues the previous
/// amount only while an `억` amount is still open (`1억 5천`, `1억 500`).
fn split_amounts(text: &str) -> Vec<i64> {
    let cleaned = text.replace(',', "");
    let mut amounts = Vec::new();
    let mut current = String::new();
    let mut open_eok = false;

    for caps in amount_token_re().captures_iter(&cleaned) {
        let token = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
        let unit: String = caps
            .get(2)
            .map(|m| m.as_str().chars().filter(|c| !c.is_whitespace()).collect())
            .unwrap_or_default();

        let continues = open_eok && unit != "억";
        if !continues && !current.is_empty() {
            amounts.extend(parse_manwon(&current));
            current.clear();
        }
        current.push_str(token);
        current.push(' ');
        open_eok = unit == "억" || (continues && matches!(unit.as_str(), "천" | "천만" | "백만"));
    }
    if !current.is_empty() {
        amounts.extend(parse_manwon(&current));
    }
    amounts
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_manwon_unit_table() {
        let cases = [
            ("1억 500", Some(10_500)),
            ("1억", Some(10_000)),
            ("2억 5천", Some(25_000)),
            ("3억5000만원", Some(35_000)),
            ("5천만", Some(5_000)),
            ("5천 만원", Some(5_000)),
            ("3백만", Some(300)),
            ("500만원", Some(500)),
            ("45만", Some(45)),
            ("1,000", Some(1_000)),
            ("1.5억", Some(15_000)),
            ("400,000원", Some(40)),
            ("협의", None),
            ("500 협의가능", Some(500)),
            ("가격 문의", None),
            ("Negotiable", None),
            ("-", None),
            ("", None),
            ("없음", None),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_manwon(input), expected, "input={input}");
        }
    }

    #[test]
    fn slash_pair_follows_platform_order_without_keywords() {
        let pair = parse_price_pair("1000/40", false);
        assert_eq!(pair.rent, Some(1000));
        assert_eq!(pair.deposit, Some(40));

        let pair = parse_price_pair("1000/40", true);
        assert_eq!(pair.deposit, Some(1000));
        assert_eq!(pair.rent, Some(40));
    }

    #[test]
    fn keywords_override_platform_order() {
        let pair = parse_price_pair("보증금 1000 / 월세 40", false);
        assert_eq!(pair.deposit, Some(1000));
        assert_eq!(pair.rent, Some(40));

        let pair = parse_price_pair("월세 40 | 보증금 1000", true);
        assert_eq!(pair.deposit, Some(1000));
        assert_eq!(pair.rent, Some(40));
    }

    #[test]
    fn one_keyword_fixes_the_other_side() {
        let pair = parse_price_pair("1000/월세 40", false);
        assert_eq!(pair.deposit, Some(1000));
        assert_eq!(pair.rent, Some(40));
    }

    #[test]
    fn leading_lease_label_is_not_a_keyword_anchor() {
        let pair = parse_price_pair("월세 1000/50", true);
        assert_eq!(pair.lease_hint, Some(LeaseType::Monthly));
        assert_eq!(pair.deposit, Some(1000));
        assert_eq!(pair.rent, Some(50));
    }

    #[test]
    fn anchored_amounts_without_separator() {
        let pair = parse_price_pair("보증금 2억 5천 월세 30만원", false);
        assert_eq!(pair.deposit, Some(25_000));
        assert_eq!(pair.rent, Some(30));
    }

    #[test]
    fn jeonse_single_amount_is_deposit() {
        let pair = parse_price_pair("전세 3억", false);
        assert_eq!(pair.lease_hint, Some(LeaseType::Jeonse));
        assert_eq!(pair.deposit, Some(30_000));
        assert_eq!(pair.rent, None);
    }

    #[test]
    fn positional_fallback_uses_two_bare_amounts() {
        let pair = parse_price_pair("1억 500 45", true);
        assert_eq!(pair.deposit, Some(10_500));
        assert_eq!(pair.rent, Some(45));
    }

    #[test]
    fn placeholder_pair_is_empty() {
        let pair = parse_price_pair("가격협의", false);
        assert_eq!(pair.rent, None);
        assert_eq!(pair.deposit, None);
    }

    #[test]
    fn side_notes_do_not_hide_amounts() {
        let cases = [
            ("보증금 1000 월세 50 (관리비 문의)", Some(1000), Some(50)),
            ("보증금 500 / 월세 45 협의가능", Some(500), Some(45)),
            ("전세 2억 (가격 협의)", Some(20_000), None),
            ("가격 문의", None, None),
        ];
        for (input, deposit, rent) in cases {
            let pair = parse_price_pair(input, false);
            assert_eq!(pair.deposit, deposit, "input={input}");
            assert_eq!(pair.rent, rent, "input={input}");
        }
    }

    #[test]
    fn money_values_follow_platform_unit() {
        assert_eq!(parse_money_value(&json!(40), MoneyUnit::Manwon), Some(40));
        assert_eq!(parse_money_value(&json!(400_000), MoneyUnit::Won), Some(40));
        assert_eq!(parse_money_value(&json!("5,000,000"), MoneyUnit::Won), Some(500));
        assert_eq!(parse_money_value(&json!("1억"), MoneyUnit::Won), Some(10_000));
        assert_eq!(parse_money_value(&json!(null), MoneyUnit::Manwon), None);
    }
}
