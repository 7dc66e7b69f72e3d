use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::json_path::head_key;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintField {
    ExternalId,
    DetailUrl,
    Address,
    City,
    District,
    Neighborhood,
    AddressCode,
    LeaseType,
    Price,
    Rent,
    Deposit,
    Area,
    AreaExclusive,
    AreaGross,
    RoomCount,
    BathroomCount,
    Floor,
    TotalFloor,
    Direction,
    BuildingUse,
    BuildingName,
    Images,
    Description,
    Title,
}

impl HintField {
    pub const ALL: [HintField; 24] = [
        HintField::ExternalId,
        HintField::DetailUrl,
        HintField::Address,
        HintField::City,
        HintField::District,
        HintField::Neighborhood,
        HintField::AddressCode,
        HintField::LeaseType,
        HintField::Price,
        HintField::Rent,
        HintField::Deposit,
        HintField::Area,
        HintField::AreaExclusive,
        HintField::AreaGross,
        HintField::RoomCount,
        HintField::BathroomCount,
        HintField::Floor,
        HintField::TotalFloor,
        HintField::Direction,
        HintField::BuildingUse,
        HintField::BuildingName,
        HintField::Images,
        HintField::Description,
        HintField::Title,
    ];

    /// Fields whose presence marks a candidate as a listing rather than structural noise.
    pub const SIGNAL: [HintField; 13] = [
        HintField::ExternalId,
        HintField::Address,
        HintField::City,
        HintField::District,
        HintField::Neighborhood,
        HintField::Price,
        HintField::Rent,
        HintField::Deposit,
        HintField::Area,
        HintField::AreaExclusive,
        HintField::AreaGross,
        HintField::RoomCount,
        HintField::Floor,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldHintSchema {
    aliases: BTreeMap<HintField, Vec<String>>,
}

impl FieldHintSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generic() -> Self {
        use HintField::*;

        let table: &[(HintField, &[&str])] = &[
            (
                ExternalId,
                &[
                    "id", "item_id", "itemId", "listing_id", "listingId", "article_id",
                    "articleNo", "room_id", "roomId", "seq", "idx",
                ],
            ),
            (
                DetailUrl,
                &["detail_url", "detailUrl", "share_url", "shareUrl", "url", "link"],
            ),
            (
                Address,
                &[
                    "address_text", "address", "addr", "full_address", "fullAddress",
                    "roadAddress", "jibunAddress", "address.streetAddress", "address.full",
                    "location.address",
                ],
            ),
            (
                City,
                &["city", "sido", "address.city", "address.addressRegion", "region_1depth_name"],
            ),
            (
                District,
                &[
                    "district", "gu", "sigungu", "address.district", "address.addressLocality",
                    "region_2depth_name",
                ],
            ),
            (
                Neighborhood,
                &["neighborhood", "dong", "address.neighborhood", "region_3depth_name"],
            ),
            (
                AddressCode,
                &["address_code", "bjd_code", "bjdCode", "legal_dong_code", "region_code"],
            ),
            (
                LeaseType,
                &["lease_type", "sales_type", "salesType", "deal_type", "dealType", "trade_type"],
            ),
            (Price, &["price_text", "priceText", "price", "price_title", "priceTitle"]),
            (Rent, &["rent", "rent_amount", "monthly_rent", "monthlyRent", "rent_price"]),
            (Deposit, &["deposit", "deposit_amount", "warrant_price", "guarantee"]),
            (Area, &["area", "area_m2", "size", "space"]),
            (
                AreaExclusive,
                &["area_exclusive", "exclusive_area", "exclusiveArea", "private_area", "net_area"],
            ),
            (
                AreaGross,
                &["area_gross", "supply_area", "supplyArea", "gross_area", "contract_area"],
            ),
            (RoomCount, &["room_count", "roomCount", "rooms", "room_cnt", "bedrooms"]),
            (
                BathroomCount,
                &["bathroom_count", "bathroomCount", "bathrooms", "bath_cnt"],
            ),
            (Floor, &["floor", "floor_text", "floorInfo", "floor_info", "current_floor"]),
            (
                TotalFloor,
                &["total_floor", "totalFloor", "building_floor", "max_floor"],
            ),
            (Direction, &["direction", "direction_text", "directionName", "facing"]),
            (
                BuildingUse,
                &[
                    "building_use", "building_type", "buildingType", "room_type", "roomType",
                    "house_type",
                ],
            ),
            (
                BuildingName,
                &["building_name", "buildingName", "complex_name", "complexName", "apt_name"],
            ),
            (
                Images,
                &["images", "image_urls", "imageUrls", "photos", "image", "thumbnail", "img_url"],
            ),
            (Description, &["description", "desc", "content", "memo", "comment"]),
            (Title, &["title", "subject", "headline"]),
        ];

        let mut schema = Self::new();
        for (field, aliases) in table {
            schema.append(*field, aliases.iter().copied());
        }
        schema
    }

    pub fn aliases(&self, field: HintField) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Put aliases ahead of the existing ones. Already-known aliases move to the front.
    pub fn prepend<'a>(&mut self, field: HintField, aliases: impl IntoIterator<Item = &'a str>) {
        let entry = self.aliases.entry(field).or_default();
        let mut front: Vec<String> = Vec::new();
        for alias in aliases {
            if !front.iter().any(|a| a == alias) {
                front.push(alias.to_owned());
            }
        }
        entry.retain(|existing| !front.contains(existing));
        front.append(entry);
        *entry = front;
    }

    pub fn append<'a>(&mut self, field: HintField, aliases: impl IntoIterator<Item = &'a str>) {
        let entry = self.aliases.entry(field).or_default();
        for alias in aliases {
            if !entry.iter().any(|a| a == alias) {
                entry.push(alias.to_owned());
            }
        }
    }

    /// Platform-specific aliases first, then this schema's aliases.
    pub fn layered_under(&self, platform: &FieldHintSchema) -> FieldHintSchema {
        let mut out = self.clone();
        for (field, aliases) in &platform.aliases {
            out.prepend(*field, aliases.iter().map(String::as_str));
        }
        out
    }

    pub fn extend(&mut self, other: &FieldHintSchema) {
        for (field, aliases) in &other.aliases {
            self.append(*field, aliases.iter().map(String::as_str));
        }
    }

    /// Keys an object must own to look like a listing: the head segment of every alias.
    pub fn listing_keys(&self) -> BTreeSet<&str> {
        self.aliases
            .values()
            .flatten()
            .map(|alias| head_key(alias))
            .collect()
    }

    /// Head keys of the fields that make an object a listing on their own.
    pub fn signal_keys(&self) -> BTreeSet<&str> {
        HintField::SIGNAL
            .iter()
            .flat_map(|field| self.aliases(*field))
            .map(|alias| head_key(alias))
            .collect()
    }
}
