//! Readers for the pipe-delimited tables delivered by the scrapers.
//!
//! Each source has its own raw row shape. Every field is optional: missing
//! values are a data-quality matter for the normalizers, while a missing
//! column is a structural failure that aborts the run.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use crate::constants::{GUY_HOQUET_SOURCE, LAFORET_SOURCE, ORPI_SOURCE};
use crate::error::{CleanerError, Result};

/// Field separator of every raw and output table
pub const FIELD_SEPARATOR: u8 = b'|';

/// A raw row type tied to one source's column contract.
pub trait RawTable: DeserializeOwned {
    const SOURCE: &'static str;
    const REQUIRED_COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GuyHoquetRaw {
    pub prop_type: Option<String>,
    pub city: Option<String>,
    pub price: Option<String>,
    pub descr: Option<String>,
    /// Serialized list, e.g. `['45 m²', '2 pièces', '1 chambre(s)']`
    pub feats: Option<String>,
    pub feats2: Option<String>,
    pub neighborhood: Option<String>,
}

impl RawTable for GuyHoquetRaw {
    const SOURCE: &'static str = GUY_HOQUET_SOURCE;
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["prop_type", "city", "price", "descr", "feats", "feats2"];
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LaforetRaw {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub title: Option<String>,
    pub price: Option<String>,
    pub descr: Option<String>,
    pub conso: Option<String>,
    pub emiss: Option<String>,
    /// `#`-joined feature badges
    pub feats: Option<String>,
    /// Coarse two-digit department the listing was scraped under
    pub dept: Option<String>,
    pub furnitures: Option<String>,
}

impl RawTable for LaforetRaw {
    const SOURCE: &'static str = LAFORET_SOURCE;
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["title", "price", "descr", "feats", "dept", "furnitures"];
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrpiRaw {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub prop_type: Option<String>,
    pub city: Option<String>,
    pub dept: Option<String>,
    pub rooms: Option<String>,
    pub surface: Option<String>,
    pub price: Option<String>,
    pub descr: Option<String>,
    pub conso: Option<String>,
    pub emiss: Option<String>,
    pub feats: Option<String>,
}

impl RawTable for OrpiRaw {
    const SOURCE: &'static str = ORPI_SOURCE;
    const REQUIRED_COLUMNS: &'static [&'static str] =
        &["prop_type", "city", "dept", "rooms", "surface", "price", "descr", "feats"];
}

/// Rows read from one raw table, with the count of records that could not
/// be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRows<T> {
    pub rows: Vec<T>,
    pub unreadable: usize,
}

/// Read a raw table from disk.
#[instrument(skip_all, fields(source = T::SOURCE, path = %path.display()))]
pub fn read_table<T: RawTable>(path: &Path) -> Result<RawRows<T>> {
    let file = File::open(path)?;
    let table = read_table_from_reader::<T, _>(file)?;
    info!(
        rows = table.rows.len(),
        unreadable = table.unreadable,
        "Loaded raw table"
    );
    Ok(table)
}

/// Read a raw table from any reader, checking the header against the
/// source's column contract first.
///
/// A record that cannot be decoded (bad UTF-8, wrong field count) is skipped
/// and counted; only header and I/O failures are returned as errors.
pub fn read_table_from_reader<T: RawTable, R: Read>(reader: R) -> Result<RawRows<T>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .has_headers(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in T::REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(CleanerError::MissingColumn {
                source_name: T::SOURCE.to_string(),
                column: column.to_string(),
            });
        }
    }
    debug!(columns = headers.len(), "Header accepted");

    let mut rows = Vec::new();
    let mut unreadable = 0;
    for result in reader.deserialize() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) if is_record_error(&e) => {
                warn!(
                    source = T::SOURCE,
                    line = e.position().map_or(0, |p| p.line()),
                    error = %e,
                    "Skipping unreadable row"
                );
                unreadable += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(RawRows { rows, unreadable })
}

/// Failures confined to a single record, as opposed to the underlying stream.
fn is_record_error(error: &csv::Error) -> bool {
    matches!(
        error.kind(),
        csv::ErrorKind::Utf8 { .. }
            | csv::ErrorKind::UnequalLengths { .. }
            | csv::ErrorKind::Deserialize { .. }
    )
}
