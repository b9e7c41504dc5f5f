use serde::Serialize;
use tracing::info;

use crate::config::FilterConfig;
use crate::metrics::OutlierMetrics;
use crate::types::{CleanListingRow, Coordinates, GeocodedListing};

/// Plausible coordinates for the target region: `min_lat <= lat < max_lat`
/// and `lon < max_lon`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, coords: Coordinates) -> bool {
        coords.lat >= self.min_lat && coords.lat < self.max_lat && coords.lon < self.max_lon
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::from(&FilterConfig::default())
    }
}

impl From<&FilterConfig> for BoundingBox {
    fn from(config: &FilterConfig) -> Self {
        Self {
            min_lat: config.min_lat,
            max_lat: config.max_lat,
            max_lon: config.max_lon,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OutlierReport {
    pub total: usize,
    /// Geocoded, but outside the box
    pub outside_box: usize,
    /// Never geocoded
    pub missing_coords: usize,
    pub retained: usize,
}

impl OutlierReport {
    /// Share of rows rejected for implausible coordinates, in percent
    pub fn outside_box_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.outside_box as f64 * 100.0 / self.total as f64
        }
    }
}

/// Keep listings whose coordinates fall inside the box, dropping the
/// transient columns on the way out.
pub fn filter_outliers(
    listings: Vec<GeocodedListing>,
    bbox: &BoundingBox,
) -> (Vec<CleanListingRow>, OutlierReport) {
    let mut report = OutlierReport {
        total: listings.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(listings.len());

    for geocoded in listings {
        match geocoded.coords {
            Some(coords) if bbox.contains(coords) => {
                rows.push(CleanListingRow::new(&geocoded.listing, coords));
            }
            Some(_) => report.outside_box += 1,
            None => report.missing_coords += 1,
        }
    }
    report.retained = rows.len();

    OutlierMetrics::record_rejected(report.outside_box, report.missing_coords);
    info!(
        outside_box = report.outside_box,
        missing_coords = report.missing_coords,
        retained = report.retained,
        "At least {} addresses ({:.2}%) were wrongly geocoded and will be dropped.",
        report.outside_box,
        report.outside_box_percentage()
    );

    (rows, report)
}
