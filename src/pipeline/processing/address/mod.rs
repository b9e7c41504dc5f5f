//! Best-effort street address inference from listing descriptions.
//!
//! Strictly ordered per listing: street phrase in the transliterated
//! description, then (capital only) a metro station name, then (outside the
//! capital) the bare city. Capital rows without a street or station have no
//! address unless the arrondissement fallback is enabled.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::constants::{department_name, CAPITAL_CITY, COUNTRY};
use crate::error::Result;
use crate::types::Listing;

pub mod patterns;
pub mod stations;

pub use patterns::StreetMatcher;
pub use stations::StationList;

static LEADING_ZERO: Lazy<Regex> = Lazy::new(|| Regex::new(r"0(\d)").unwrap());

/// Which rule produced an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    Street,
    Metro,
    City,
    Arrondissement,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InferredAddress {
    pub query: String,
    pub source: AddressSource,
}

/// Address inference over read-only lookup tables built once per run.
#[derive(Debug, Clone)]
pub struct AddressInference {
    streets: StreetMatcher,
    metro: Option<Regex>,
    arrondissement_fallback: bool,
}

impl AddressInference {
    pub fn new(stations: &StationList) -> Result<Self> {
        Ok(Self {
            streets: StreetMatcher::new()?,
            metro: stations.to_pattern()?,
            arrondissement_fallback: false,
        })
    }

    pub fn with_arrondissement_fallback(mut self, enabled: bool) -> Self {
        self.arrondissement_fallback = enabled;
        self
    }

    /// Geocoding query for a listing, or `None` when nothing usable is found.
    pub fn infer(&self, listing: &Listing) -> Option<InferredAddress> {
        let inferred = self
            .street_address(listing)
            .map(|query| InferredAddress {
                query,
                source: AddressSource::Street,
            })
            .or_else(|| self.fallback_address(listing));
        if inferred.is_none() {
            debug!(city = %listing.city, "No address derivable");
        }
        inferred
    }

    fn fallback_address(&self, listing: &Listing) -> Option<InferredAddress> {
        if listing.is_capital() {
            if let Some(query) = self.metro_address(listing) {
                return Some(InferredAddress {
                    query,
                    source: AddressSource::Metro,
                });
            }
            if self.arrondissement_fallback {
                return Self::arrondissement_address(listing).map(|query| InferredAddress {
                    query,
                    source: AddressSource::Arrondissement,
                });
            }
            return None;
        }
        Some(InferredAddress {
            query: Self::city_address(listing),
            source: AddressSource::City,
        })
    }

    /// City as used in queries: the capital without its arrondissement.
    fn query_city(listing: &Listing) -> &str {
        if listing.is_capital() {
            CAPITAL_CITY
        } else {
            &listing.city
        }
    }

    fn street_address(&self, listing: &Listing) -> Option<String> {
        let descr = patterns::unhyphenate_saints(&deunicode(&listing.descr));
        let phrase = self.streets.find_street(&descr)?.trim().to_lowercase();
        let street = self.streets.truncate(&phrase);
        Some(
            format!(
                "{} {} {} {}",
                street,
                Self::query_city(listing),
                department_name(listing.dept),
                COUNTRY
            )
            .to_lowercase(),
        )
    }

    /// Station search runs on the original description, accents included.
    fn metro_address(&self, listing: &Listing) -> Option<String> {
        let station = self.metro.as_ref()?.captures(&listing.descr)?.get(1)?.as_str();
        Some(
            format!(
                "metro {} {} {} {}",
                station,
                Self::query_city(listing),
                department_name(listing.dept),
                COUNTRY
            )
            .to_lowercase(),
        )
    }

    fn city_address(listing: &Listing) -> String {
        format!(
            "{} {} {}",
            listing.city,
            department_name(listing.dept),
            COUNTRY
        )
        .to_lowercase()
    }

    /// `PARIS 08` → `paris 8e arrondissement france`, `PARIS 01` → `paris 1er ...`
    fn arrondissement_address(listing: &Listing) -> Option<String> {
        let number = listing.city.split_whitespace().nth(1)?;
        let number = LEADING_ZERO.replace(number, "${1}");
        let ordinal = if number == "1" {
            "1er arrondissement".to_string()
        } else {
            format!("{}e arrondissement", number)
        };
        Some(format!("paris {} {}", ordinal, COUNTRY).to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(city: &str, dept: u32, descr: &str) -> Listing {
        Listing {
            price: 1000,
            surface: 40.0,
            rooms: 2,
            bedrooms: 1,
            is_house: false,
            furnished: false,
            city: city.to_string(),
            dept,
            descr: descr.to_string(),
        }
    }

    fn inference() -> AddressInference {
        let stations = StationList::from_names(["Bastille", "Saint-Paul", "Commerce"]);
        AddressInference::new(&stations).unwrap()
    }

    #[test]
    fn test_street_address_in_capital() {
        let row = listing("PARIS 08", 75008, "Superbe appartement situé rue de Miromesnil, 3e étage");
        let address = inference().infer(&row).unwrap();
        assert_eq!(address.source, AddressSource::Street);
        assert_eq!(address.query, "rue de miromesnil paris  france");
        assert!(address.query.ends_with("france"));
    }

    #[test]
    fn test_street_address_is_transliterated_and_truncated() {
        let row = listing(
            "SAINT-MAUR-DES-FOSSÉS",
            94,
            "Maison rue de l'Église proche des commerces",
        );
        let address = inference().infer(&row).unwrap();
        assert_eq!(
            address.query,
            "rue de l'eglise saint-maur-des-fossés val-de-marne france"
        );
    }

    #[test]
    fn test_saint_prefix_joined() {
        let row = listing("VINCENNES", 94, "Au coin de la rue Saint-Louis.");
        assert_eq!(
            inference().infer(&row).unwrap().query,
            "rue saint louis vincennes val-de-marne france"
        );
    }

    #[test]
    fn test_calm_street_is_not_a_street() {
        let row = listing("PARIS 04", 75004, "Dans une rue calme, à deux pas du métro Bastille");
        let address = inference().infer(&row).unwrap();
        assert_eq!(address.source, AddressSource::Metro);
        assert_eq!(address.query, "metro bastille paris  france");
    }

    #[test]
    fn test_calm_qualifier_after_street_name_keeps_street() {
        // The exclusion only applies right after the keyword
        let row = listing("PARIS 02", 75002, "Bel appartement, rue de la Paix, calme, à Paris");
        let address = inference().infer(&row).unwrap();
        assert_eq!(address.source, AddressSource::Street);
        assert_eq!(address.query, "rue de la paix paris  france");

        let row = listing("PARIS 02", 75002, "Bel appartement dans une rue calme, à Paris");
        assert_eq!(inference().infer(&row), None);
    }

    #[test]
    fn test_capital_without_match_is_absent() {
        let row = listing("PARIS 11", 75011, "Studio lumineux, rue calme");
        assert_eq!(inference().infer(&row), None);
    }

    #[test]
    fn test_blocklisted_station_does_not_match() {
        let row = listing("PARIS 15", 75015, "Proche des commerces");
        assert_eq!(inference().infer(&row), None);
    }

    #[test]
    fn test_city_fallback_outside_capital() {
        let row = listing("ARGENTEUIL", 95, "Bel appartement lumineux");
        let address = inference().infer(&row).unwrap();
        assert_eq!(address.source, AddressSource::City);
        assert_eq!(address.query, "argenteuil val d'oise france");
    }

    #[test]
    fn test_unknown_department_renders_code() {
        let row = listing("CHARTRES", 28, "Maison");
        assert_eq!(inference().infer(&row).unwrap().query, "chartres 28 france");
    }

    #[test]
    fn test_arrondissement_fallback() {
        let inference = inference().with_arrondissement_fallback(true);
        let row = listing("PARIS 01", 75001, "Studio");
        assert_eq!(
            inference.infer(&row).unwrap().query,
            "paris 1er arrondissement france"
        );
        let row = listing("PARIS 08", 75008, "Studio");
        assert_eq!(
            inference.infer(&row).unwrap().query,
            "paris 8e arrondissement france"
        );
        let row = listing("PARIS 20", 75020, "Studio");
        assert_eq!(
            inference.infer(&row).unwrap().source,
            AddressSource::Arrondissement
        );
    }
}
