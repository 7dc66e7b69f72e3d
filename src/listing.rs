use serde_json::{Map, Value, json};
use url::Url;

use crate::config::EngineConfig;
use crate::formats::{AreaClaimed, LeaseType, NormalizedListing, RawRecord};
use crate::hints::HintField;
use crate::json_path::{as_f64, scalar_text};
use crate::parse::area::{AreaParse, AreaType, parse_area_value};
use crate::parse::currency::{parse_money_value, parse_price_pair};
use crate::parse::floor::parse_floor_value;
use crate::parse::images::{ImageCollection, ImageCollector};
use crate::parse::text::{
    collapse_whitespace, normalize_building_use, normalize_direction, normalize_lease_type,
};
use crate::resolve::{ResolvedFields, resolve_fields};
use crate::validation::validate;

const METRO_SHORT_NAMES: &[&str] = &[
    "서울", "부산", "대구", "인천", "광주", "대전", "울산", "세종", "경기", "강원", "충북",
    "충남", "전북", "전남", "경북", "경남", "제주",
];

pub struct Promoter<'c> {
    platform_code: &'c str,
    config: &'c EngineConfig,
    site_root: Option<Url>,
    include_raw: bool,
}

impl<'c> Promoter<'c> {
    pub fn new(
        platform_code: &'c str,
        config: &'c EngineConfig,
        site_root: Option<&str>,
        include_raw: bool,
    ) -> Self {
        let site_root = site_root.and_then(|root| match Url::parse(root) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(platform = platform_code, root, %err, "ignoring invalid site root");
                None
            }
        });
        Self {
            platform_code,
            config,
            site_root,
            include_raw,
        }
    }

    fn collect_images(&self, candidate: &Value) -> ImageCollection {
        let hints = &self.config.field_hints;
        ImageCollector::new(self.config.image_limit, self.site_root.as_ref())
            .with_image_keys(hints.aliases(HintField::Images).iter().map(String::as_str))
            .with_text_keys(
                hints
                    .aliases(HintField::Description)
                    .iter()
                    .map(String::as_str),
            )
            .with_nested_listing_keys(hints.signal_keys())
            .collect(candidate)
    }

    /// `None` when the candidate carries no listing signal and no images.
    pub fn promote(&self, candidate: &Value, record: &RawRecord) -> Option<NormalizedListing> {
        let resolved = resolve_fields(candidate, &self.config.field_hints);
        let images = self.collect_images(candidate);
        if !resolved.has_signal() && images.urls.is_empty() {
            return None;
        }

        let mut listing = NormalizedListing::empty(self.platform_code);
        let mut raw_attrs = Map::new();

        self.fill_identity(&mut listing, &resolved, record);
        fill_address(&mut listing, &resolved);
        self.fill_money(&mut listing, &resolved, &mut raw_attrs);
        fill_area(&mut listing, &resolved, &mut raw_attrs);
        fill_structure(&mut listing, &resolved, &mut raw_attrs);

        listing.image_urls = images.urls.clone();
        if !images.rejected.is_empty() {
            raw_attrs.insert("image_rejected".to_owned(), json!(images.rejected.len()));
        }
        if resolved.is_address_composed() {
            raw_attrs.insert("address_composed".to_owned(), Value::Bool(true));
        }
        if self.include_raw {
            raw_attrs.insert("raw".to_owned(), candidate.clone());
        }
        listing.raw_attrs = raw_attrs;
        listing.validation = validate(&listing, &images);

        Some(listing)
    }

    fn fill_identity(
        &self,
        listing: &mut NormalizedListing,
        resolved: &ResolvedFields<'_>,
        record: &RawRecord,
    ) {
        listing.external_id = resolved.text(HintField::ExternalId);
        let detail_url = resolved
            .text(HintField::DetailUrl)
            .and_then(|raw| self.absolute_url(&raw));
        listing.source_ref = match &listing.external_id {
            Some(id) => Some(format!("{}:{id}", self.platform_code)),
            None => detail_url.clone(),
        };
        listing.source_url = detail_url.or_else(|| record.origin_url().map(str::to_owned));
        listing.collected_at = record.collected_at.clone();
    }

    fn absolute_url(&self, raw: &str) -> Option<String> {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
            Ok(_) => None,
            Err(_) => self
                .site_root
                .as_ref()
                .and_then(|base| base.join(raw).ok())
                .map(|url| url.to_string()),
        }
    }

    fn fill_money(
        &self,
        listing: &mut NormalizedListing,
        resolved: &ResolvedFields<'_>,
        raw_attrs: &mut Map<String, Value>,
    ) {
        let unit = self.config.money_unit;
        let mut rent = resolved
            .get(HintField::Rent)
            .and_then(|v| parse_money_value(v, unit));
        let mut deposit = resolved
            .get(HintField::Deposit)
            .and_then(|v| parse_money_value(v, unit));

        let lease_text = resolved.text(HintField::LeaseType);
        let mut lease_type = lease_text.as_deref().and_then(normalize_lease_type);
        if let Some(text) = &lease_text {
            raw_attrs.insert("lease_type_text".to_owned(), json!(text));
        }

        if let Some(price) = resolved.get(HintField::Price) {
            match price {
                Value::Number(_) => {
                    let amount = parse_money_value(price, unit);
                    if lease_type == Some(LeaseType::Monthly) && deposit.is_some() {
                        rent = rent.or(amount);
                    } else {
                        deposit = deposit.or(amount);
                    }
                }
                _ => {
                    if let Some(text) = scalar_text(price) {
                        let pair = parse_price_pair(&text, self.config.prefer_deposit_first);
                        rent = rent.or(pair.rent);
                        deposit = deposit.or(pair.deposit);
                        lease_type = lease_type.or(pair.lease_hint);
                        raw_attrs.insert("price_text".to_owned(), json!(text));
                    }
                }
            }
        }

        if lease_type.is_none() && rent.is_some_and(|r| r > 0) {
            lease_type = Some(LeaseType::Monthly);
        }
        listing.rent_amount = rent;
        listing.deposit_amount = deposit;
        listing.lease_type = lease_type;
    }
}

fn fill_address(listing: &mut NormalizedListing, resolved: &ResolvedFields<'_>) {
    listing.address_text = resolved.address_text();
    listing.address_code = resolved.text(HintField::AddressCode);

    let parts = listing
        .address_text
        .as_deref()
        .map(decompose_address)
        .unwrap_or_default();
    let component = |field: HintField| {
        resolved
            .text(field)
            .map(|text| collapse_whitespace(&text))
            .filter(|text| !text.is_empty())
    };
    listing.address_city = component(HintField::City).or(parts.city);
    listing.address_district = component(HintField::District).or(parts.district);
    listing.address_neighborhood = component(HintField::Neighborhood).or(parts.neighborhood);
}

#[derive(Debug, Default, PartialEq, Eq)]
struct AddressParts {
    city: Option<String>,
    district: Option<String>,
    neighborhood: Option<String>,
}

/// Split a Korean address on token suffixes. Stops at the first lot or road number.
fn decompose_address(address: &str) -> AddressParts {
    let mut parts = AddressParts::default();
    for token in address.split_whitespace() {
        let token = token.trim_matches(|c: char| matches!(c, ',' | '(' | ')'));
        if token.starts_with(|c: char| c.is_ascii_digit()) {
            break;
        }
        let is_city = METRO_SHORT_NAMES.contains(&token) || token.ends_with('도');
        if parts.city.is_none() && parts.district.is_none() && (is_city || token.ends_with('시'))
        {
            parts.city = Some(token.to_owned());
        } else if parts.neighborhood.is_none()
            && (token.ends_with('구') || token.ends_with('군') || token.ends_with('시'))
        {
            parts.district.get_or_insert_with(|| token.to_owned());
        } else if parts.neighborhood.is_none()
            && ['동', '읍', '면', '가', '리'].iter().any(|s| token.ends_with(*s))
        {
            parts.neighborhood = Some(token.to_owned());
        }
    }
    parts
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Exclusive,
    Gross,
}

fn fill_area(
    listing: &mut NormalizedListing,
    resolved: &ResolvedFields<'_>,
    raw_attrs: &mut Map<String, Value>,
) {
    let mut exclusive: Option<AreaParse> = None;
    let mut gross: Option<AreaParse> = None;
    let mut estimated = false;

    let parse = |field: HintField| {
        resolved
            .get(field)
            .map(parse_area_value)
            .filter(|parsed| parsed.value.is_some())
    };

    if let Some(parsed) = parse(HintField::AreaExclusive) {
        exclusive = Some(parsed);
    }
    if let Some(parsed) = parse(HintField::AreaGross) {
        gross = Some(parsed);
    }
    if let Some(parsed) = parse(HintField::Area) {
        let slot = match parsed.area_type {
            Some(AreaType::Gross) => Slot::Gross,
            _ => Slot::Exclusive,
        };
        match slot {
            Slot::Exclusive if exclusive.is_none() => {
                estimated = parsed.area_type.is_none();
                exclusive = Some(parsed);
            }
            Slot::Gross if gross.is_none() => gross = Some(parsed),
            _ => {}
        }
    }

    let area_text = [HintField::Area, HintField::AreaExclusive, HintField::AreaGross]
        .into_iter()
        .find_map(|field| resolved.text(field));
    if let Some(text) = area_text {
        raw_attrs.insert("area_text".to_owned(), json!(text));
    }

    if let Some(parsed) = &exclusive {
        listing.area_exclusive_m2 = parsed.value;
        if parsed.is_range() {
            listing.area_exclusive_m2_min = parsed.min;
            listing.area_exclusive_m2_max = parsed.max;
        }
    }
    if let Some(parsed) = &gross {
        listing.area_gross_m2 = parsed.value;
        if parsed.is_range() {
            listing.area_gross_m2_min = parsed.min;
            listing.area_gross_m2_max = parsed.max;
        }
    }

    let any_range = [&exclusive, &gross]
        .into_iter()
        .flatten()
        .any(AreaParse::is_range);
    listing.area_claimed = match (&exclusive, &gross) {
        (None, None) => None,
        _ if any_range => Some(AreaClaimed::Range),
        (Some(_), _) if estimated => Some(AreaClaimed::Estimated),
        (Some(_), _) => Some(AreaClaimed::Exclusive),
        (None, Some(_)) => Some(AreaClaimed::Gross),
    };
}

fn fill_structure(
    listing: &mut NormalizedListing,
    resolved: &ResolvedFields<'_>,
    raw_attrs: &mut Map<String, Value>,
) {
    if let Some(value) = resolved.get(HintField::Floor) {
        let parsed = parse_floor_value(value);
        listing.floor = parsed.floor;
        listing.total_floor = parsed.total;
        if let Some(text) = scalar_text(value) {
            raw_attrs.insert("floor_text".to_owned(), json!(text));
        }
    }
    if let Some(total) = resolved
        .get(HintField::TotalFloor)
        .and_then(|v| parse_floor_value(v).floor)
        .filter(|t| *t > 0)
    {
        listing.total_floor = Some(total);
    }

    listing.room_count = resolved.get(HintField::RoomCount).and_then(parse_count);
    listing.bathroom_count = resolved.get(HintField::BathroomCount).and_then(parse_count);

    if let Some(text) = resolved.text(HintField::Direction) {
        listing.direction = normalize_direction(&text);
        raw_attrs.insert("direction_text".to_owned(), json!(text));
    }
    if let Some(text) = resolved.text(HintField::BuildingUse) {
        listing.building_use = normalize_building_use(&text);
        raw_attrs.insert("building_use_text".to_owned(), json!(text));
    }
    listing.building_name = resolved
        .text(HintField::BuildingName)
        .map(|text| collapse_whitespace(&text))
        .filter(|text| !text.is_empty());
}

/// Room and bathroom counts: numbers, `2개`, `방 3`, or the 원룸/투룸/쓰리룸 words.
fn parse_count(value: &Value) -> Option<u32> {
    if let Value::String(text) = value {
        for (word, count) in [("쓰리룸", 3), ("투룸", 2), ("원룸", 1)] {
            if text.contains(word) {
                return Some(count);
            }
        }
        let digits: String = text
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(char::is_ascii_digit)
            .collect();
        return digits.parse().ok();
    }
    as_f64(value)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .and_then(|n| u32::try_from(n as i64).ok())
}
