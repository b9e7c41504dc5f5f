use once_cell::sync::Lazy;
use regex::Regex;

use super::base::NormalizerUtils;
use crate::constants::{CAPITAL_CITY, EMPTY_CITY_DEFAULT, GUY_HOQUET_EXCLUDED_DEPT};
use crate::pipeline::ingestion::GuyHoquetRaw;
use crate::pipeline::processing::normalize::{DropReason, RowOutcome, SourceNormalizer};
use crate::types::Listing;

static TYPE_APARTMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Appartement|Studio|Duplex").unwrap());
static TYPE_HOUSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Maison").unwrap());
// Only matches items with a neighbour on both sides of the joined list
static BEDROOMS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|(\d+)\schambre\(s\)\|").unwrap());
static FURNISHED_FLAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\|(Meublé \w+)\|").unwrap());
static POSTAL_DEPT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d\d)\d\d\d").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Normalizer for Guy Hoquet listings
pub struct GuyHoquetNormalizer;

impl GuyHoquetNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn classify(prop_type: &str, descr: &str) -> Result<bool, DropReason> {
        if TYPE_HOUSE.is_match(prop_type) {
            return Ok(true);
        }
        if TYPE_APARTMENT.is_match(prop_type) {
            return Ok(false);
        }
        NormalizerUtils::type_from_description(descr).ok_or(DropReason::UnclassifiableType)
    }

    /// Surface, rooms and bedrooms from the main feature list.
    fn parse_feats(feats: Option<&str>) -> Result<(f64, u32, u32), DropReason> {
        let feats = feats
            .and_then(NormalizerUtils::parse_string_list)
            .ok_or(DropReason::UnparseableFeatures)?;

        let surface = feats
            .first()
            .and_then(|s| s.replace(" m²", "").trim().parse::<f64>().ok())
            .ok_or(DropReason::UnparseableFeatures)?;
        let rooms = feats
            .get(1)
            .and_then(|s| s.split_whitespace().next())
            .and_then(|s| s.parse::<u32>().ok())
            .ok_or(DropReason::UnparseableFeatures)?;
        let bedrooms = NormalizerUtils::capture_number(&BEDROOMS, &feats.join("|")).unwrap_or(0);

        Ok((surface, rooms, bedrooms))
    }

    /// Structured `Meublé Oui|Non` badge from the secondary feature list.
    fn furnished_flag(feats2: Option<&str>) -> Option<bool> {
        let feats2 = NormalizerUtils::parse_string_list(feats2?)?;
        let joined = feats2.join("|");
        let flag = FURNISHED_FLAG.captures(&joined)?.get(1)?.as_str().to_string();
        flag.split_whitespace().nth(1).map(|answer| answer == "Oui")
    }

    /// City and department from a combined string such as `Paris 75011`.
    fn parse_location(raw_city: &str) -> Result<(String, u32), DropReason> {
        let dept: u32 = NormalizerUtils::capture_number(&POSTAL_DEPT, raw_city)
            .ok_or(DropReason::UnparseableLocation)?;
        if dept == GUY_HOQUET_EXCLUDED_DEPT {
            return Err(DropReason::ExcludedDepartment);
        }
        let postcode = DIGITS
            .find(raw_city)
            .map(|m| m.as_str().to_string())
            .ok_or(DropReason::UnparseableLocation)?;

        let mut city = DIGITS.replace_all(raw_city, "").trim().to_uppercase();
        if city == CAPITAL_CITY {
            let arrondissement = &postcode[postcode.len().saturating_sub(2)..];
            city = format!("{} {}", CAPITAL_CITY, arrondissement);
        }
        if city.is_empty() {
            city = EMPTY_CITY_DEFAULT.to_string();
        }

        let dept = if NormalizerUtils::is_capital(&city) {
            postcode.parse().map_err(|_| DropReason::UnparseableLocation)?
        } else {
            dept
        };
        Ok((city, dept))
    }
}

impl SourceNormalizer for GuyHoquetNormalizer {
    type Raw = GuyHoquetRaw;

    fn normalize_row(&self, raw: &GuyHoquetRaw) -> RowOutcome {
        let descr = raw.descr.clone().unwrap_or_default();

        let is_house = Self::classify(raw.prop_type.as_deref().unwrap_or_default(), &descr)?;
        let price = NormalizerUtils::parse_price(raw.price.as_deref())?;
        let (surface, rooms, bedrooms) = Self::parse_feats(raw.feats.as_deref())?;

        // No structured flag: fall back on the description, and drop the row
        // when it says nothing either.
        let furnished = Self::furnished_flag(raw.feats2.as_deref())
            .or_else(|| NormalizerUtils::furnished_from_description(&descr))
            .ok_or(DropReason::UnknownFurnished)?;

        let (city, dept) =
            Self::parse_location(raw.city.as_deref().ok_or(DropReason::UnparseableLocation)?)?;

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
        "Guy Hoquet Normalizer"
    }
}

impl Default for GuyHoquetNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
