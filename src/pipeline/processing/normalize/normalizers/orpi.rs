use once_cell::sync::Lazy;
use regex::Regex;

use super::base::NormalizerUtils;
use crate::constants::ALREADY_RENTED;
use crate::pipeline::ingestion::OrpiRaw;
use crate::pipeline::processing::normalize::{DropReason, RowOutcome, SourceNormalizer};
use crate::types::Listing;

// Single-digit arrondissement, not followed by another digit
static SHORT_ARRONDISSEMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"PARIS (\d)(\D|$)").unwrap());
static BEDROOMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) chambres?").unwrap());

/// Marker of furnished listings in the feature badges
const FURNISHED_BADGE: &str = "Meublé";

/// Normalizer for Orpi listings
pub struct OrpiNormalizer;

impl OrpiNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn classify(prop_type: &str, descr: &str) -> Result<bool, DropReason> {
        let prop_type = prop_type.trim();
        if prop_type.starts_with("Maison") {
            Ok(true)
        } else if !prop_type.is_empty() {
            Ok(false)
        } else {
            NormalizerUtils::type_from_description(descr).ok_or(DropReason::UnclassifiableType)
        }
    }

    fn parse_price(text: Option<&str>) -> Result<i64, DropReason> {
        let text = text.ok_or(DropReason::UnparseablePrice)?;
        if text.split('€').next().unwrap_or_default().trim() == ALREADY_RENTED {
            return Err(DropReason::AlreadyRented);
        }
        NormalizerUtils::parse_price(Some(text))
    }

    /// `"3 pièces"` → 3
    fn parse_rooms(text: Option<&str>) -> Result<u32, DropReason> {
        text.and_then(|t| t.split("pièce").next())
            .and_then(|t| t.trim().parse().ok())
            .ok_or(DropReason::UnparseableFeatures)
    }

    /// `"65,5 m²"` → 65.5
    fn parse_surface(text: Option<&str>) -> Result<f64, DropReason> {
        text.and_then(|t| t.split_whitespace().next())
            .and_then(|t| t.replace(',', ".").parse().ok())
            .ok_or(DropReason::UnparseableFeatures)
    }

    fn parse_location(raw_city: &str, raw_dept: &str) -> Result<(String, u32), DropReason> {
        let mut city = raw_city.trim().to_uppercase();
        if NormalizerUtils::is_capital(&city) {
            city = SHORT_ARRONDISSEMENT
                .replace_all(&city, "PARIS 0${1}${2}")
                .into_owned();
            let dept = NormalizerUtils::capital_dept(raw_dept, &city)
                .ok_or(DropReason::UnparseableLocation)?;
            return Ok((city, dept));
        }
        let dept = raw_dept.trim().parse().map_err(|_| DropReason::UnparseableLocation)?;
        Ok((city, dept))
    }
}

impl SourceNormalizer for OrpiNormalizer {
    type Raw = OrpiRaw;

    fn normalize_row(&self, raw: &OrpiRaw) -> RowOutcome {
        let descr = raw.descr.clone().unwrap_or_default();
        let feats = raw.feats.as_deref().unwrap_or_default();

        let (city, dept) = Self::parse_location(
            raw.city.as_deref().unwrap_or_default(),
            raw.dept.as_deref().unwrap_or_default(),
        )?;
        let is_house = Self::classify(raw.prop_type.as_deref().unwrap_or_default(), &descr)?;
        let rooms = Self::parse_rooms(raw.rooms.as_deref())?;
        let surface = Self::parse_surface(raw.surface.as_deref())?;
        let furnished = feats.contains(FURNISHED_BADGE);
        let bedrooms = NormalizerUtils::capture_number(&BEDROOMS, feats).unwrap_or(0);
        let price = Self::parse_price(raw.price.as_deref())?;

        Ok(Listing {
            price,
            surface,
            rooms,
            bedrooms,
            is_house,
            furnished,
            city,
            dept,
            descr,
        })
    }

    fn name(&self) -> &str {
        "Orpi Normalizer"
    }
}

impl Default for OrpiNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(prop_type: &str, city: &str, dept: &str, price: &str, feats: &str) -> OrpiRaw {
        OrpiRaw {
            prop_type: Some(prop_type.to_string()),
            city: Some(city.to_string()),
            dept: Some(dept.to_string()),
            rooms: Some("3 pièces".to_string()),
            surface: Some("65,5 m²".to_string()),
            price: Some(price.to_string()),
            descr: Some("Lumineux".to_string()),
            feats: Some(feats.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_single_digit_arrondissement_is_padded() {
        let row = raw("Appartement", "Paris 8", "75", "1 800 €", "['Meublé', '2 chambres']");
        let listing = OrpiNormalizer::new().normalize_row(&row).unwrap();
        assert_eq!(listing.city, "PARIS 08");
        assert_eq!(listing.dept, 75008);
        assert_eq!(listing.surface, 65.5);
        assert_eq!(listing.rooms, 3);
        assert_eq!(listing.bedrooms, 2);
        assert!(listing.furnished);
        assert!(!listing.is_house);
        assert_eq!(listing.price, 1800);
    }

    #[test]
    fn test_two_digit_arrondissement_untouched() {
        let (city, dept) = OrpiNormalizer::parse_location("Paris 15", "75").unwrap();
        assert_eq!(city, "PARIS 15");
        assert_eq!(dept, 75015);
    }

    #[test]
    fn test_rented_listing_is_dropped() {
        let row = raw("Maison", "Vincennes", "94", "Loué", "[]");
        assert_eq!(OrpiNormalizer::new().normalize_row(&row), Err(DropReason::AlreadyRented));
    }

    #[test]
    fn test_unfurnished_house_defaults() {
        let row = raw("Maison de ville", "Saint-Maur-des-Fossés", "94", "2 100 €", "['Jardin']");
        let listing = OrpiNormalizer::new().normalize_row(&row).unwrap();
        assert!(listing.is_house);
        assert!(!listing.furnished);
        assert_eq!(listing.bedrooms, 0);
        assert_eq!(listing.city, "SAINT-MAUR-DES-FOSSÉS");
        assert_eq!(listing.dept, 94);
    }

    #[test]
    fn test_missing_type_uses_description() {
        let mut row = raw("", "Vincennes", "94", "1 000 €", "[]");
        row.descr = Some("Loft lumineux".to_string());
        assert_eq!(
            OrpiNormalizer::new().normalize_row(&row),
            Err(DropReason::UnclassifiableType)
        );
        row.descr = Some("Maison familiale".to_string());
        assert!(OrpiNormalizer::new().normalize_row(&row).unwrap().is_house);
    }
}
