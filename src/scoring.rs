use std::collections::HashMap;

use sha2::{Digest as _, Sha256};

use crate::formats::NormalizedListing;

const ADDRESS_WEIGHT: u32 = 2;
const RENT_WEIGHT: u32 = 1;
const DEPOSIT_WEIGHT: u32 = 1;
const EXCLUSIVE_AREA_WEIGHT: u32 = 1;
const GROSS_AREA_WEIGHT: u32 = 1;
const FLOOR_WEIGHT: u32 = 1;
const IMAGE_WEIGHT: u32 = 3;

pub fn score(listing: &NormalizedListing) -> u32 {
    let weights = [
        (listing.has_address(), ADDRESS_WEIGHT),
        (listing.rent_amount.is_some(), RENT_WEIGHT),
        (listing.deposit_amount.is_some(), DEPOSIT_WEIGHT),
        (listing.area_exclusive_m2.is_some(), EXCLUSIVE_AREA_WEIGHT),
        (listing.area_gross_m2.is_some(), GROSS_AREA_WEIGHT),
        (listing.floor.is_some(), FLOOR_WEIGHT),
        (!listing.image_urls.is_empty(), IMAGE_WEIGHT),
    ];
    weights
        .into_iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum()
}

/// `platform:external_id`, then `platform:ref:source_ref`, then a sha256 over
/// the listing's content fields.
pub fn dedup_key(listing: &NormalizedListing) -> String {
    if let Some(id) = &listing.external_id {
        return format!("{}:{id}", listing.platform_code);
    }
    if let Some(source_ref) = &listing.source_ref {
        return format!("{}:ref:{source_ref}", listing.platform_code);
    }

    let fields = [
        listing.address_text.clone().unwrap_or_default(),
        listing.address_code.clone().unwrap_or_default(),
        listing.rent_amount.map(|v| v.to_string()).unwrap_or_default(),
        listing.deposit_amount.map(|v| v.to_string()).unwrap_or_default(),
        listing
            .primary_area()
            .map(|v| format!("{v:.3}"))
            .unwrap_or_default(),
    ];
    let mut hasher = Sha256::new();
    for field in &fields {
        hasher.update(field.as_bytes());
        hasher.update([0x1f_u8]);
    }
    format!("{}:h:{}", listing.platform_code, hex::encode(hasher.finalize()))
}

/// Keeps one listing per dedup key in first-seen order.
#[derive(Debug, Default)]
pub struct Deduper {
    slots: Vec<(NormalizedListing, u32)>,
    index: HashMap<String, usize>,
    dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    Inserted,
    Replaced,
    Dropped,
}

impl Deduper {
    pub fn new() -> Self {
        Self::default()
    }

    /// A later listing wins only with a strictly higher score.
    pub fn offer(&mut self, key: String, listing: NormalizedListing, score: u32) -> Offer {
        match self.index.get(&key) {
            Some(&slot) => {
                self.dropped += 1;
                if score > self.slots[slot].1 {
                    self.slots[slot] = (listing, score);
                    Offer::Replaced
                } else {
                    Offer::Dropped
                }
            }
            None => {
                self.index.insert(key, self.slots.len());
                self.slots.push((listing, score));
                Offer::Inserted
            }
        }
    }

    pub fn duplicates_dropped(&self) -> usize {
        self.dropped
    }

    pub fn into_items(self) -> Vec<NormalizedListing> {
        self.slots.into_iter().map(|(listing, _)| listing).collect()
    }
}
