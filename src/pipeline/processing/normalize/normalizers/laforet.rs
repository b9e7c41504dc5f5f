use once_cell::sync::Lazy;
use regex::Regex;

use super::base::NormalizerUtils;
use crate::constants::{CAPITAL_CITY, LAFORET_DEPT_CORRECTIONS, LAFORET_FURNISHED_FLAG};
use crate::pipeline::ingestion::LaforetRaw;
use crate::pipeline::processing::normalize::{DropReason, RowOutcome, SourceNormalizer};
use crate::types::Listing;

static SURFACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) m²").unwrap());
static ROOMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) pièce").unwrap());
static BEDROOMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+) chbre").unwrap());
// Titles read "Appartement T2 Paris 15" or "Maison près de Etampes"
static TITLE_CITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:Appartement|Maison)\s(?:\w\d)?(.+)").unwrap());

/// Normalizer for Laforêt listings
pub struct LaforetNormalizer;

impl LaforetNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn classify(title: &str) -> Result<bool, DropReason> {
        match title.split_whitespace().next() {
            Some("Maison") => Ok(true),
            Some("Appartement") => Ok(false),
            _ => Err(DropReason::UnclassifiableType),
        }
    }

    fn parse_feats(feats: &str) -> Result<(f64, u32, u32), DropReason> {
        let surface = NormalizerUtils::capture_number(&SURFACE, feats)
            .ok_or(DropReason::UnparseableFeatures)?;
        let rooms = NormalizerUtils::capture_number(&ROOMS, feats)
            .ok_or(DropReason::UnparseableFeatures)?;
        let bedrooms = NormalizerUtils::capture_number(&BEDROOMS, feats).unwrap_or(0);
        Ok((f64::from(surface), rooms, bedrooms))
    }

    fn parse_city(title: &str) -> Result<String, DropReason> {
        let captured = TITLE_CITY
            .captures(title)
            .and_then(|c| c.get(1))
            .ok_or(DropReason::UnparseableLocation)?;
        Ok(captured.as_str().replace("près de ", "").trim().to_uppercase())
    }

    /// Department for a listing, with capital rows widened to five digits.
    fn parse_dept(raw_dept: &str, city: &str) -> Result<u32, DropReason> {
        if !NormalizerUtils::is_capital(city) {
            return raw_dept.trim().parse().map_err(|_| DropReason::UnparseableLocation);
        }
        // A bare "PARIS" carries no arrondissement
        if city == CAPITAL_CITY {
            return Err(DropReason::UnparseableLocation);
        }
        let dept = NormalizerUtils::capital_dept(raw_dept, city)
            .ok_or(DropReason::UnparseableLocation)?;
        Ok(LAFORET_DEPT_CORRECTIONS
            .iter()
            .find(|(bad, _)| *bad == dept)
            .map(|(_, good)| *good)
            .unwrap_or(dept))
    }
}

impl SourceNormalizer for LaforetNormalizer {
    type Raw = LaforetRaw;

    fn normalize_row(&self, raw: &LaforetRaw) -> RowOutcome {
        let title = raw.title.as_deref().unwrap_or_default();

        let price = NormalizerUtils::parse_price(raw.price.as_deref())?;
        let (surface, rooms, bedrooms) = Self::parse_feats(raw.feats.as_deref().unwrap_or_default())?;
        let is_house = Self::classify(title)?;
        let city = Self::parse_city(title)?;
        let dept = Self::parse_dept(raw.dept.as_deref().unwrap_or_default(), &city)?;

        // The listing was scraped under a furnished/unfurnished filter, so the
        // flag is always defined.
        let furnished = raw.furnitures.as_deref() == Some(LAFORET_FURNISHED_FLAG);

        Ok(Listing {
            price,
            surface,
            rooms,
            bedrooms,
            is_house,
            furnished,
            city,
            dept,
            descr: raw.descr.clone().unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        "Laforêt Normalizer"
    }
}

impl Default for LaforetNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, price: &str, feats: &str, dept: &str, furnitures: &str) -> LaforetRaw {
        LaforetRaw {
            title: Some(title.to_string()),
            price: Some(price.to_string()),
            descr: Some("Description".to_string()),
            feats: Some(feats.to_string()),
            dept: Some(dept.to_string()),
            furnitures: Some(furnitures.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_paris_arrondissement_dept() {
        let row = raw("Appartement T2 Paris 08", "1450€", "42 m²#2 pièces#1 chbre", "75", "is_furnished");
        let listing = LaforetNormalizer::new().normalize_row(&row).unwrap();
        assert_eq!(listing.city, "PARIS 08");
        assert_eq!(listing.dept, 75008);
        assert_eq!(listing.surface, 42.0);
        assert_eq!(listing.rooms, 2);
        assert_eq!(listing.bedrooms, 1);
        assert!(listing.furnished);
        assert!(!listing.is_house);
    }

    #[test]
    fn test_department_corrections() {
        let row = raw("Appartement T3 Paris 13", "1 300 €", "60 m²#3 pièces", "94", "is_unfurnished");
        let listing = LaforetNormalizer::new().normalize_row(&row).unwrap();
        assert_eq!(listing.dept, 75013);
        assert!(!listing.furnished);
        assert_eq!(listing.bedrooms, 0);

        let row = raw("Appartement T1 Paris 16", "900 €", "20 m²#1 pièce", "92", "is_furnished");
        assert_eq!(LaforetNormalizer::new().normalize_row(&row).unwrap().dept, 75016);
    }

    #[test]
    fn test_bare_capital_is_dropped() {
        let row = raw("Appartement Paris", "900 €", "20 m²#1 pièce", "75", "is_furnished");
        assert_eq!(
            LaforetNormalizer::new().normalize_row(&row),
            Err(DropReason::UnparseableLocation)
        );
    }

    #[test]
    fn test_suburb_house() {
        let row = raw("Maison près de Etampes", "1 100 €", "95 m²#5 pièces#3 chbre", "91", "");
        let listing = LaforetNormalizer::new().normalize_row(&row).unwrap();
        assert!(listing.is_house);
        assert_eq!(listing.city, "ETAMPES");
        assert_eq!(listing.dept, 91);
    }

    #[test]
    fn test_missing_features_drop() {
        let row = raw("Maison Orsay", "1 100 €", "Jardin", "91", "");
        assert_eq!(
            LaforetNormalizer::new().normalize_row(&row),
            Err(DropReason::UnparseableFeatures)
        );
        let row = raw("Parking Orsay", "100 €", "12 m²#1 pièce", "91", "");
        assert_eq!(
            LaforetNormalizer::new().normalize_row(&row),
            Err(DropReason::UnclassifiableType)
        );
    }
}
