use crate::formats::LeaseType;

const DIRECTION_RULES: &[(&str, &str)] = &[
    ("남동", "SE"),
    ("동남", "SE"),
    ("남서", "SW"),
    ("서남", "SW"),
    ("북동", "NE"),
    ("동북", "NE"),
    ("북서", "NW"),
    ("서북", "NW"),
    ("south-east", "SE"),
    ("southeast", "SE"),
    ("south-west", "SW"),
    ("southwest", "SW"),
    ("north-east", "NE"),
    ("northeast", "NE"),
    ("north-west", "NW"),
    ("northwest", "NW"),
    ("남", "S"),
    ("북", "N"),
    ("동", "E"),
    ("서", "W"),
    ("south", "S"),
    ("north", "N"),
    ("east", "E"),
    ("west", "W"),
];

const DIRECTION_CODES: &[&str] = &["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

const BUILDING_USE_RULES: &[(&str, &str)] = &[
    ("오피스텔", "officetel"),
    ("officetel", "officetel"),
    ("아파트", "apartment"),
    ("apartment", "apartment"),
    ("apt", "apartment"),
    ("다세대", "villa"),
    ("연립", "villa"),
    ("빌라", "villa"),
    ("villa", "villa"),
    ("다가구", "house"),
    ("단독", "house"),
    ("주택", "house"),
    ("house", "house"),
    ("원룸", "one_room"),
    ("투룸", "one_room"),
    ("쓰리룸", "one_room"),
    ("one_room", "one_room"),
    ("oneroom", "one_room"),
    ("상가", "commercial"),
    ("사무실", "commercial"),
    ("근린", "commercial"),
    ("점포", "commercial"),
    ("office", "commercial"),
    ("store", "commercial"),
];

const LEASE_RULES: &[(&str, LeaseType)] = &[
    ("반전세", LeaseType::Monthly),
    ("단기", LeaseType::ShortTerm),
    ("short", LeaseType::ShortTerm),
    ("월세", LeaseType::Monthly),
    ("monthly", LeaseType::Monthly),
    ("rent", LeaseType::Monthly),
    ("전세", LeaseType::Jeonse),
    ("jeonse", LeaseType::Jeonse),
    ("charter", LeaseType::Jeonse),
    ("매매", LeaseType::Sale),
    ("sale", LeaseType::Sale),
    ("trade", LeaseType::Sale),
];

fn first_rule<'a, T: Copy>(text: &str, rules: &'a [(&'a str, T)]) -> Option<T> {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, out)| *out)
}

/// Compass direction as one of the eight codes; unmatched text passes through.
pub fn normalize_direction(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.to_ascii_uppercase();
    if DIRECTION_CODES.contains(&upper.as_str()) {
        return Some(upper);
    }
    Some(
        first_rule(trimmed, DIRECTION_RULES)
            .map(str::to_owned)
            .unwrap_or_else(|| trimmed.to_owned()),
    )
}

pub fn normalize_building_use(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(
        first_rule(trimmed, BUILDING_USE_RULES)
            .map(str::to_owned)
            .unwrap_or_else(|| trimmed.to_owned()),
    )
}

pub fn normalize_lease_type(text: &str) -> Option<LeaseType> {
    first_rule(text, LEASE_RULES)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
