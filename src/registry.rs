use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hints::{FieldHintSchema, HintField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionMode {
    Api,
    StealthAutomation,
    Blocked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyUnit {
    #[default]
    Manwon,
    Won,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformAdapter {
    pub code: String,
    pub name: String,
    pub collection_mode: CollectionMode,
    pub notes: String,
    /// Free-text pairs like `1000/40` list the deposit first on this platform.
    pub prefer_deposit_first: bool,
    pub money_unit: MoneyUnit,
    /// Root that relative image paths are joined against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_root: Option<String>,
    pub field_hints: FieldHintSchema,
}

impl PlatformAdapter {
    fn new(code: &str, name: &str, collection_mode: CollectionMode, notes: &str) -> Self {
        Self {
            code: code.to_owned(),
            name: name.to_owned(),
            collection_mode,
            notes: notes.to_owned(),
            prefer_deposit_first: false,
            money_unit: MoneyUnit::Manwon,
            site_root: None,
            field_hints: FieldHintSchema::generic(),
        }
    }

    fn deposit_first(mut self) -> Self {
        self.prefer_deposit_first = true;
        self
    }

    fn money_in_won(mut self) -> Self {
        self.money_unit = MoneyUnit::Won;
        self
    }

    fn site_root(mut self, root: &str) -> Self {
        self.site_root = Some(root.to_owned());
        self
    }

    /// Platform aliases win over the generic ones.
    fn hints(mut self, table: &[(HintField, &[&str])]) -> Self {
        let mut platform = FieldHintSchema::new();
        for (field, aliases) in table {
            platform.append(*field, aliases.iter().copied());
        }
        self.field_hints = self.field_hints.layered_under(&platform);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    adapters: BTreeMap<String, PlatformAdapter>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        use CollectionMode::*;
        use HintField::*;

        let mut registry = Self::new();

        registry.register(PlatformAdapter::new(
            "generic",
            "Generic JSON capture",
            Api,
            "fallback alias set for unknown sources",
        ));

        registry.register(
            PlatformAdapter::new(
                "zigbang",
                "Zigbang",
                Api,
                "public item API; 보증금/월세 pairs in list cards",
            )
            .deposit_first()
            .site_root("https://www.zigbang.com")
            .hints(&[
                (ExternalId, &["item_id", "itemId"]),
                (Address, &["address1", "addressOrigin.fullText", "jibunAddress"]),
                (Neighborhood, &["local3", "addressOrigin.local3"]),
                (Area, &["size_m2", "전용면적"]),
                (AreaExclusive, &["전용면적_m2", "size_contract_m2_exclusive"]),
                (AreaGross, &["공급면적_m2", "size_contract_m2"]),
                (Floor, &["floor_string", "floor"]),
                (TotalFloor, &["building_floor"]),
                (BuildingUse, &["service_type", "room_type_title"]),
                (LeaseType, &["sales_type", "sales_title"]),
                (Images, &["images_thumbnail", "images"]),
            ]),
        );

        registry.register(
            PlatformAdapter::new(
                "dabang",
                "Dabang",
                Api,
                "room list API; price_title carries 보증금/월세 text",
            )
            .deposit_first()
            .site_root("https://www.dabangapp.com")
            .hints(&[
                (ExternalId, &["seq", "id"]),
                (Price, &["price_title", "priceTitle"]),
                (LeaseType, &["selling_type_str", "priceTypeName"]),
                (BuildingUse, &["room_type_str", "roomTypeName"]),
                (Area, &["room_size", "roomSize"]),
                (AreaGross, &["provision_size", "provisionSize"]),
                (Floor, &["floor_string", "roomFloorStr"]),
                (Images, &["img_urls", "imgUrlList", "img_url"]),
                (Description, &["title", "roomDesc"]),
            ]),
        );

        registry.register(
            PlatformAdapter::new(
                "naver",
                "Naver Real Estate",
                StealthAutomation,
                "article list API behind bot checks; flrInfo is floor/total",
            )
            .site_root("https://land.naver.com")
            .hints(&[
                (ExternalId, &["atclNo", "articleNo"]),
                (BuildingName, &["atclNm", "articleName"]),
                (BuildingUse, &["rletTpNm", "realEstateTypeName"]),
                (LeaseType, &["tradTpNm", "tradeTypeName"]),
                (Price, &["hanPrc", "dealOrWarrantPrc"]),
                (Deposit, &["prc", "warrantPrc"]),
                (Rent, &["rentPrc"]),
                (AreaGross, &["spc1", "area1"]),
                (AreaExclusive, &["spc2", "area2"]),
                (Floor, &["flrInfo", "floorInfo"]),
                (Direction, &["direction", "direcNm"]),
                (Images, &["repImgUrl", "representativeImgUrl"]),
                (AddressCode, &["cortarNo"]),
                (Description, &["atclFetrDesc", "articleFeatureDesc"]),
            ]),
        );

        registry.register(
            PlatformAdapter::new(
                "peterpanz",
                "Peterpanz",
                StealthAutomation,
                "house list rendered through browser automation",
            )
            .deposit_first()
            .site_root("https://www.peterpanz.com")
            .hints(&[
                (ExternalId, &["hidx"]),
                (Address, &["location.address.text", "info.address"]),
                (Rent, &["price.monthly_fee"]),
                (Deposit, &["price.deposit"]),
                (AreaExclusive, &["info.real_size"]),
                (AreaGross, &["info.supplied_size"]),
                (Floor, &["floor.target"]),
                (TotalFloor, &["floor.total"]),
                (BuildingUse, &["info.building_type"]),
                (Images, &["images.S", "images.M"]),
            ]),
        );

        registry.register(
            PlatformAdapter::new(
                "kbland",
                "KB Land",
                Api,
                "complex listing API with separate amount fields",
            )
            .hints(&[
                (ExternalId, &["propertyNo", "매물일련번호"]),
                (BuildingName, &["complexName", "단지명"]),
                (Deposit, &["depositAmt", "dealAmt", "보증금"]),
                (Rent, &["rentAmt", "월세"]),
                (AreaExclusive, &["exclusiveArea", "전용면적"]),
                (AreaGross, &["supplyArea", "공급면적"]),
                (LeaseType, &["dealTypeName", "거래구분"]),
            ]),
        );

        registry.register(
            PlatformAdapter::new(
                "daangn",
                "Daangn Realty",
                StealthAutomation,
                "amounts are reported in won",
            )
            .money_in_won()
            .site_root("https://www.daangn.com")
            .hints(&[
                (ExternalId, &["articleId", "id"]),
                (Address, &["region.fullName", "address"]),
                (Neighborhood, &["region.name"]),
                (Deposit, &["trades.0.deposit", "trades.0.price"]),
                (Rent, &["trades.0.monthlyPay"]),
                (LeaseType, &["trades.0.type"]),
                (Images, &["images", "thumbnailImage"]),
            ]),
        );

        registry.register(PlatformAdapter::new(
            "hogangnono",
            "Hogangnono",
            Blocked,
            "no viable access path; captures are block pages",
        ));
        registry.register(PlatformAdapter::new(
            "r114",
            "Real Estate 114",
            Blocked,
            "login wall on listing detail",
        ));

        registry
    }

    pub fn register(&mut self, adapter: PlatformAdapter) {
        self.adapters.insert(adapter.code.clone(), adapter);
    }

    pub fn get(&self, code: &str) -> Option<&PlatformAdapter> {
        self.adapters.get(&code.trim().to_ascii_lowercase())
    }

    pub fn require(&self, code: &str) -> anyhow::Result<&PlatformAdapter> {
        self.get(code).ok_or_else(|| {
            let known = self.adapters.keys().cloned().collect::<Vec<_>>().join(", ");
            anyhow::anyhow!("unknown platform: {code} (known: {known})")
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformAdapter> {
        self.adapters.values()
    }
}
