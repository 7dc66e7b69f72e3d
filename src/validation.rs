use serde_json::json;

use crate::formats::{NormalizedListing, Violation, ViolationCode};
use crate::parse::images::ImageCollection;

/// Fixed per-record checks. Every finding is a warning; none blocks promotion.
pub fn validate(listing: &NormalizedListing, images: &ImageCollection) -> Vec<Violation> {
    let mut out = Vec::new();

    if !listing.has_address() {
        out.push(Violation::warn(
            ViolationCode::AddressNormalizeFail,
            "address missing or empty",
        ));
    }
    if !listing.has_price() {
        out.push(Violation::warn(
            ViolationCode::PriceParseFail,
            "neither rent nor deposit could be parsed",
        ));
    }
    if !listing.has_area() {
        out.push(Violation::warn(
            ViolationCode::AreaParseFail,
            "neither exclusive nor gross area could be parsed",
        ));
    }
    if listing.external_id.is_none() && listing.source_ref.is_none() {
        out.push(Violation::warn(
            ViolationCode::ReqFieldMissing,
            "no external id or source reference",
        ));
    }

    if listing.image_urls.is_empty() {
        out.push(Violation::warn(ViolationCode::ImageUrlInvalid, "no valid image urls"));
    } else if !images.rejected.is_empty() {
        out.push(
            Violation::warn(
                ViolationCode::ImageUrlInvalid,
                format!("{} image url(s) failed validation", images.rejected.len()),
            )
            .with_detail(json!({ "rejected": images.rejected })),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(violations: &[Violation]) -> Vec<ViolationCode> {
        violations.iter().map(|v| v.code).collect()
    }

    #[test]
    fn empty_listing_gets_every_warning() {
        let listing = NormalizedListing::empty("generic");
        let violations = validate(&listing, &ImageCollection::default());
        assert_eq!(
            codes(&violations),
            vec![
                ViolationCode::AddressNormalizeFail,
                ViolationCode::PriceParseFail,
                ViolationCode::AreaParseFail,
                ViolationCode::ReqFieldMissing,
                ViolationCode::ImageUrlInvalid,
            ]
        );
    }

    #[test]
    fn complete_listing_is_clean() {
        let mut listing = NormalizedListing::empty("generic");
        listing.external_id = Some("123".to_owned());
        listing.address_text = Some("서울 노원구 월계동".to_owned());
        listing.deposit_amount = Some(1000);
        listing.area_gross_m2 = Some(40.0);
        listing.image_urls = vec!["https://img.example.com/a.jpg".to_owned()];
        assert!(validate(&listing, &ImageCollection::default()).is_empty());
    }

    #[test]
    fn rejected_image_urls_are_reported_with_detail() {
        let mut listing = NormalizedListing::empty("generic");
        listing.source_ref = Some("generic:abc".to_owned());
        listing.image_urls = vec!["https://img.example.com/a.jpg".to_owned()];
        let images = ImageCollection {
            urls: listing.image_urls.clone(),
            rejected: vec!["ftp://img.example.com/b.jpg".to_owned()],
        };

        let violations = validate(&listing, &images);
        let image = violations
            .iter()
            .find(|v| v.code == ViolationCode::ImageUrlInvalid)
            .expect("image violation");
        assert_eq!(
            image.detail,
            Some(json!({"rejected": ["ftp://img.example.com/b.jpg"]}))
        );
        assert!(!codes(&violations).contains(&ViolationCode::ReqFieldMissing));
    }
}
