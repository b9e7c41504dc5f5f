use chrono::Local;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::{Config, StationsConfig};
use crate::constants::{GUY_HOQUET_SOURCE, LAFORET_SOURCE, ORPI_SOURCE};
use crate::error::Result;
use crate::pipeline::processing::address::{AddressInference, StationList};
use crate::pipeline::processing::geocode::{GeocodeStats, Geocoder, GeocodingAdapter};
use crate::pipeline::processing::merge;
use crate::pipeline::processing::normalize::{NormalizationRegistry, NormalizationSummary, NormalizedSet};
use crate::pipeline::processing::outlier::{self, BoundingBox, OutlierReport};
use crate::pipeline::storage;
use crate::types::{CleanListingRow, GeocodedListing, Listing};

/// Raw table locations, one per source
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub guy_hoquet: PathBuf,
    pub laforet: PathBuf,
    pub orpi: PathBuf,
}

impl SourcePaths {
    /// Sources in merge order
    fn entries(&self) -> [(&'static str, &Path); 3] {
        [
            (GUY_HOQUET_SOURCE, self.guy_hoquet.as_path()),
            (LAFORET_SOURCE, self.laforet.as_path()),
            (ORPI_SOURCE, self.orpi.as_path()),
        ]
    }
}

/// Result of a complete pipeline run
#[derive(Debug, Default, Serialize)]
pub struct PipelineResult {
    pub sources: Vec<(&'static str, NormalizationSummary)>,
    pub merged_rows: usize,
    pub addressed_rows: usize,
    pub geocode: GeocodeStats,
    pub outliers: OutlierReport,
    pub output_file: Option<String>,
}

/// Load the capital's station list: a local file wins over the web page.
pub fn load_stations(config: &StationsConfig, user_agent: &str, timeout: Duration) -> Result<StationList> {
    match &config.file {
        Some(path) => StationList::from_file(path),
        None => StationList::fetch(&config.url, user_agent, timeout),
    }
}

pub struct Pipeline {
    registry: NormalizationRegistry,
    inference: AddressInference,
    geocoder: GeocodingAdapter,
    bbox: BoundingBox,
}

impl Pipeline {
    pub fn new(inference: AddressInference, geocoder: Box<dyn Geocoder>, bbox: BoundingBox) -> Self {
        Self {
            registry: NormalizationRegistry::new(),
            inference,
            geocoder: GeocodingAdapter::new(geocoder),
            bbox,
        }
    }

    pub fn from_config(config: &Config, stations: &StationList, geocoder: Box<dyn Geocoder>) -> Result<Self> {
        let inference = AddressInference::new(stations)?
            .with_arrondissement_fallback(config.address.arrondissement_fallback);
        Ok(Self::new(inference, geocoder, BoundingBox::from(&config.filter)))
    }

    /// Read and normalize every source table.
    #[instrument(skip_all)]
    pub fn normalize_sources(&self, paths: &SourcePaths) -> Result<Vec<NormalizedSet>> {
        paths
            .entries()
            .into_iter()
            .map(|(source, path)| self.registry.normalize_file(source, path))
            .collect()
    }

    /// Attach an inferred address (or none) to each merged listing.
    #[instrument(skip_all, fields(rows = listings.len()))]
    pub fn infer_addresses(&self, listings: Vec<Listing>) -> Vec<GeocodedListing> {
        listings
            .into_iter()
            .map(|listing| {
                let address = self.inference.infer(&listing).map(|a| a.query);
                GeocodedListing {
                    listing,
                    address,
                    coords: None,
                }
            })
            .collect()
    }

    /// One lookup per listing; failures only leave that row without coordinates.
    #[instrument(skip_all, fields(rows = listings.len()))]
    pub fn geocode(&self, listings: &mut [GeocodedListing]) -> GeocodeStats {
        let mut stats = GeocodeStats::default();
        let total = listings.len();
        for (index, geocoded) in listings.iter_mut().enumerate() {
            let (coords, outcome) = self.geocoder.locate(geocoded.address.as_deref());
            geocoded.coords = coords;
            stats.record(outcome);
            if (index + 1) % 100 == 0 {
                info!(done = index + 1, total, "Geocoding progress");
            }
        }
        info!(
            found = stats.found,
            no_match = stats.no_match,
            timeout = stats.timeout,
            failed = stats.failed,
            skipped = stats.skipped,
            "Geocoding finished"
        );
        stats
    }

    /// Normalize, merge and infer addresses without geocoding.
    pub fn prepare(&self, paths: &SourcePaths, result: &mut PipelineResult) -> Result<Vec<GeocodedListing>> {
        let sets = self.normalize_sources(paths)?;
        result.sources = sets.iter().map(|s| (s.source, s.summary.clone())).collect();

        let merged = merge::merge(sets);
        result.merged_rows = merged.len();

        let addressed = self.infer_addresses(merged);
        result.addressed_rows = addressed.iter().filter(|g| g.address.is_some()).count();
        info!(
            rows = addressed.len(),
            with_address = result.addressed_rows,
            "Address inference finished"
        );
        Ok(addressed)
    }

    /// Full run in memory: the final rows and the run summary.
    pub fn run(&self, paths: &SourcePaths) -> Result<(Vec<CleanListingRow>, PipelineResult)> {
        let mut result = PipelineResult::default();
        let mut listings = self.prepare(paths, &mut result)?;
        result.geocode = self.geocode(&mut listings);
        let (rows, report) = outlier::filter_outliers(listings, &self.bbox);
        result.outliers = report;
        Ok((rows, result))
    }

    /// Full run, writing the clean table for the current year and month.
    pub fn run_to_disk(&self, paths: &SourcePaths, data_folder: &Path) -> Result<PipelineResult> {
        let (rows, mut result) = self.run(paths)?;
        let path = storage::clean_table_path(data_folder, &Local::now());
        storage::write_clean_table(&path, &rows)?;
        result.output_file = Some(path.display().to_string());
        Ok(result)
    }

    /// Normalization and address inference only, written for inspection.
    pub fn normalize_to_disk(&self, paths: &SourcePaths, output: &Path) -> Result<PipelineResult> {
        let mut result = PipelineResult::default();
        let listings = self.prepare(paths, &mut result)?;
        storage::write_addressed_table(output, &listings)?;
        result.output_file = Some(output.display().to_string());
        Ok(result)
    }
}
