use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use crate::config::GeocoderConfig;
use crate::error::Result;
use crate::metrics::GeocodeMetrics;
use crate::types::Coordinates;

/// External lookup from a free-text address to coordinates.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, address: &str) -> anyhow::Result<Option<(f64, f64)>>;
}

/// Geocoder backed by the French national address API (BAN).
pub struct BanGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct BanResponse {
    #[serde(default)]
    features: Vec<BanFeature>,
}

#[derive(Debug, Deserialize)]
struct BanFeature {
    geometry: BanGeometry,
}

#[derive(Debug, Deserialize)]
struct BanGeometry {
    /// GeoJSON order: longitude first
    coordinates: Vec<f64>,
}

impl BanResponse {
    fn first_point(&self) -> Option<(f64, f64)> {
        let coords = &self.features.first()?.geometry.coordinates;
        match coords.as_slice() {
            [lon, lat, ..] => Some((*lat, *lon)),
            _ => None,
        }
    }
}

impl BanGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

impl Geocoder for BanGeocoder {
    fn geocode(&self, address: &str) -> anyhow::Result<Option<(f64, f64)>> {
        let response: BanResponse = self
            .client
            .get(&self.base_url)
            .query(&[("q", address), ("limit", "1")])
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.first_point())
    }
}

/// Geocoder that never resolves anything, for offline runs.
pub struct NullGeocoder;

impl Geocoder for NullGeocoder {
    fn geocode(&self, _address: &str) -> anyhow::Result<Option<(f64, f64)>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodeOutcome {
    Found,
    NoMatch,
    Timeout,
    Failed,
    /// No address to look up
    Skipped,
}

impl GeocodeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeocodeOutcome::Found => "found",
            GeocodeOutcome::NoMatch => "no_match",
            GeocodeOutcome::Timeout => "timeout",
            GeocodeOutcome::Failed => "failed",
            GeocodeOutcome::Skipped => "skipped",
        }
    }
}

/// Per-run tally of geocoding outcomes
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct GeocodeStats {
    pub found: usize,
    pub no_match: usize,
    pub timeout: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl GeocodeStats {
    pub fn record(&mut self, outcome: GeocodeOutcome) {
        match outcome {
            GeocodeOutcome::Found => self.found += 1,
            GeocodeOutcome::NoMatch => self.no_match += 1,
            GeocodeOutcome::Timeout => self.timeout += 1,
            GeocodeOutcome::Failed => self.failed += 1,
            GeocodeOutcome::Skipped => self.skipped += 1,
        }
    }
}

/// Wraps a geocoder so that a failed lookup only costs that row its coordinates.
///
/// One independent call per address; no cache, no retry.
pub struct GeocodingAdapter {
    geocoder: Box<dyn Geocoder>,
}

impl GeocodingAdapter {
    pub fn new(geocoder: Box<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    #[instrument(skip(self))]
    pub fn locate(&self, address: Option<&str>) -> (Option<Coordinates>, GeocodeOutcome) {
        let Some(address) = address else {
            GeocodeMetrics::record_lookup(GeocodeOutcome::Skipped.as_str());
            return (None, GeocodeOutcome::Skipped);
        };

        let started = Instant::now();
        let result = self.geocoder.geocode(address);
        GeocodeMetrics::record_duration(started.elapsed().as_secs_f64());

        let (coords, outcome) = match result {
            Ok(Some((lat, lon))) => (Some(Coordinates::new(lat, lon)), GeocodeOutcome::Found),
            Ok(None) => {
                debug!("No geocoding match");
                (None, GeocodeOutcome::NoMatch)
            }
            Err(e) if is_timeout(&e) => {
                warn!(error = %e, "Geocoding timed out");
                (None, GeocodeOutcome::Timeout)
            }
            Err(e) => {
                warn!(error = %e, "Geocoding failed");
                (None, GeocodeOutcome::Failed)
            }
        };
        GeocodeMetrics::record_lookup(outcome.as_str());
        (coords, outcome)
    }
}

fn is_timeout(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
        .any(|e| e.is_timeout())
        || error
            .chain()
            .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
            .any(|e| e.kind() == std::io::ErrorKind::TimedOut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapGeocoder(HashMap<&'static str, (f64, f64)>);

    impl Geocoder for MapGeocoder {
        fn geocode(&self, address: &str) -> anyhow::Result<Option<(f64, f64)>> {
            if address == "slow" {
                return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline").into());
            }
            if address == "broken" {
                anyhow::bail!("service unavailable");
            }
            Ok(self.0.get(address).copied())
        }
    }

    fn adapter() -> GeocodingAdapter {
        let mut known = HashMap::new();
        known.insert("rue de rivoli paris  france", (48.8559, 2.3594));
        GeocodingAdapter::new(Box::new(MapGeocoder(known)))
    }

    #[test]
    fn test_found_and_no_match() {
        let adapter = adapter();
        let (coords, outcome) = adapter.locate(Some("rue de rivoli paris  france"));
        assert_eq!(outcome, GeocodeOutcome::Found);
        assert_eq!(coords, Some(Coordinates::new(48.8559, 2.3594)));

        let (coords, outcome) = adapter.locate(Some("nowhere"));
        assert_eq!(outcome, GeocodeOutcome::NoMatch);
        assert!(coords.is_none());
    }

    #[test]
    fn test_failures_yield_absent_coordinates() {
        let adapter = adapter();
        assert_eq!(adapter.locate(Some("slow")), (None, GeocodeOutcome::Timeout));
        assert_eq!(adapter.locate(Some("broken")), (None, GeocodeOutcome::Failed));
        assert_eq!(adapter.locate(None), (None, GeocodeOutcome::Skipped));
    }

    #[test]
    fn test_ban_response_is_lon_lat() {
        let body = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[2.3522,48.8566]},
             "properties":{"label":"Paris"}}]}"#;
        let response: BanResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.first_point(), Some((48.8566, 2.3522)));

        let empty: BanResponse = serde_json::from_str(r#"{"features":[]}"#).unwrap();
        assert_eq!(empty.first_point(), None);
    }

    #[test]
    fn test_stats_tally() {
        let mut stats = GeocodeStats::default();
        stats.record(GeocodeOutcome::Found);
        stats.record(GeocodeOutcome::Found);
        stats.record(GeocodeOutcome::Timeout);
        assert_eq!(stats.found, 2);
        assert_eq!(stats.timeout, 1);
    }
}
