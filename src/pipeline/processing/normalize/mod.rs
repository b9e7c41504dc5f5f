use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::metrics::NormalizeMetrics;
use crate::pipeline::ingestion::{self, RawTable};
use crate::types::Listing;

pub mod normalizers;
pub mod registry;

pub use registry::NormalizationRegistry;

/// Number of columns of the canonical listing table
pub const CANONICAL_COLUMNS: usize = 9;

/// Why a raw row did not make it into the canonical set.
///
/// None of these are errors: a dropped row only lowers the yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DropReason {
    UnclassifiableType,
    UnparseablePrice,
    AlreadyRented,
    UnparseableFeatures,
    UnknownFurnished,
    UnparseableLocation,
    ExcludedDepartment,
    /// The raw record itself could not be decoded
    UnreadableRow,
}

impl DropReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::UnclassifiableType => "unclassifiable_type",
            DropReason::UnparseablePrice => "unparseable_price",
            DropReason::AlreadyRented => "already_rented",
            DropReason::UnparseableFeatures => "unparseable_features",
            DropReason::UnknownFurnished => "unknown_furnished",
            DropReason::UnparseableLocation => "unparseable_location",
            DropReason::ExcludedDepartment => "excluded_department",
            DropReason::UnreadableRow => "unreadable_row",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type RowOutcome = std::result::Result<Listing, DropReason>;

/// Row accounting for one source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizationSummary {
    pub rows_in: usize,
    pub rows_kept: usize,
    pub duplicates_removed: usize,
    pub dropped: BTreeMap<DropReason, usize>,
}

impl NormalizationSummary {
    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// The canonical listings produced from one source's raw table
#[derive(Debug, Clone)]
pub struct NormalizedSet {
    pub source: &'static str,
    pub listings: Vec<Listing>,
    pub summary: NormalizationSummary,
}

/// Source-specific normalization of a raw table into canonical listings.
pub trait SourceNormalizer: Send + Sync {
    type Raw: RawTable;

    /// Normalize a single raw row, or say why it cannot be used.
    fn normalize_row(&self, raw: &Self::Raw) -> RowOutcome;

    /// Get the source ID this normalizer handles
    fn source_id(&self) -> &'static str {
        <Self::Raw as RawTable>::SOURCE
    }

    /// Get a human-readable name for this normalizer
    fn name(&self) -> &str;

    /// Normalize a whole table: drop unusable rows, then exact duplicates.
    fn normalize(&self, rows: &[Self::Raw]) -> NormalizedSet {
        let source = self.source_id();
        let mut summary = NormalizationSummary {
            rows_in: rows.len(),
            ..Default::default()
        };

        let mut listings = Vec::with_capacity(rows.len());
        for (index, raw) in rows.iter().enumerate() {
            match self.normalize_row(raw) {
                Ok(listing) => listings.push(listing),
                Err(reason) => {
                    debug!(source, row = index, %reason, "Dropping row");
                    NormalizeMetrics::record_dropped(source, reason.as_str(), 1);
                    *summary.dropped.entry(reason).or_insert(0) += 1;
                }
            }
        }

        let before = listings.len();
        let listings = dedup_listings(listings);
        summary.duplicates_removed = before - listings.len();
        summary.rows_kept = listings.len();

        NormalizeMetrics::record_duplicates(source, summary.duplicates_removed);
        NormalizeMetrics::record_kept(source, summary.rows_kept);
        info!(
            source,
            normalizer = self.name(),
            rows = summary.rows_kept,
            columns = CANONICAL_COLUMNS,
            dropped = summary.total_dropped(),
            duplicates = summary.duplicates_removed,
            "Normalized table shape"
        );

        NormalizedSet {
            source,
            listings,
            summary,
        }
    }
}

/// Object-safe view of a normalizer that also knows how to read its table.
pub trait TableNormalizer: Send + Sync {
    fn source(&self) -> &'static str;
    fn normalize_file(&self, path: &Path) -> Result<NormalizedSet>;
}

impl<N: SourceNormalizer> TableNormalizer for N {
    fn source(&self) -> &'static str {
        self.source_id()
    }

    fn normalize_file(&self, path: &Path) -> Result<NormalizedSet> {
        let table = ingestion::read_table::<N::Raw>(path)?;
        let mut set = self.normalize(&table.rows);
        if table.unreadable > 0 {
            let reason = DropReason::UnreadableRow;
            NormalizeMetrics::record_dropped(set.source, reason.as_str(), table.unreadable);
            set.summary.rows_in += table.unreadable;
            *set.summary.dropped.entry(reason).or_insert(0) += table.unreadable;
        }
        Ok(set)
    }
}

/// Remove listings identical on every normalized column, keeping the first.
pub fn dedup_listings(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::with_capacity(listings.len());
    listings
        .into_iter()
        .filter(|listing| seen.insert(listing.key()))
        .collect()
}
