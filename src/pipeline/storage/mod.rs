//! Pipe-delimited table sinks for the final and intermediate outputs.

use chrono::{DateTime, Datelike, TimeZone};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::pipeline::ingestion::FIELD_SEPARATOR;
use crate::types::{AddressedListingRow, CleanListingRow, GeocodedListing};

/// `<data_folder>/locations_<year>_<month>_clean.csv`, month not zero-padded.
pub fn clean_table_path<Tz: TimeZone>(data_folder: &Path, now: &DateTime<Tz>) -> PathBuf {
    data_folder.join(format!("locations_{}_{}_clean.csv", now.year(), now.month()))
}

/// Serialize rows as a pipe-separated table. The header line is written
/// even when there are no rows.
pub fn write_table<W: Write, T: Serialize>(writer: W, header: &[&str], rows: &[T]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(FIELD_SEPARATOR)
        .terminator(csv::Terminator::Any(b'\n'))
        .has_headers(false)
        .from_writer(writer);
    writer.write_record(header)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the final table, creating the data folder if needed.
pub fn write_clean_table(path: &Path, rows: &[CleanListingRow]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_table(File::create(path)?, &CleanListingRow::HEADER, rows)?;
    info!(rows = rows.len(), path = %path.display(), "Wrote clean table");
    Ok(())
}

/// Write listings with their inferred address, before geocoding.
pub fn write_addressed_table(path: &Path, listings: &[GeocodedListing]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let rows: Vec<AddressedListingRow<'_>> = listings
        .iter()
        .map(|g| AddressedListingRow::new(&g.listing, g.address.as_deref()))
        .collect();
    write_table(File::create(path)?, &AddressedListingRow::HEADER, &rows)?;
    info!(rows = rows.len(), path = %path.display(), "Wrote addressed table");
    Ok(())
}
