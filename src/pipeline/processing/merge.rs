use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::normalize::{NormalizedSet, CANONICAL_COLUMNS};
use crate::types::Listing;

// "ST" alone is masculine, "STE" feminine; both must end on a word boundary
static SAINT_ABBREVIATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bST\b").unwrap());
static SAINTE_ABBREVIATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bSTE\b").unwrap());

/// Expand "ST"/"STE" city-name abbreviations to "SAINT"/"SAINTE".
pub fn harmonize_city(city: &str) -> String {
    let city = SAINT_ABBREVIATION.replace_all(city, "SAINT");
    SAINTE_ABBREVIATION.replace_all(&city, "SAINTE").into_owned()
}

/// Concatenate the per-source sets in order and harmonize city vocabulary.
pub fn merge(sets: Vec<NormalizedSet>) -> Vec<Listing> {
    let mut merged = Vec::with_capacity(sets.iter().map(|s| s.listings.len()).sum());
    for set in sets {
        merged.extend(set.listings.into_iter().map(|mut listing| {
            listing.city = harmonize_city(&listing.city);
            listing
        }));
    }
    info!(rows = merged.len(), columns = CANONICAL_COLUMNS, "Merged table shape");
    merged
}
