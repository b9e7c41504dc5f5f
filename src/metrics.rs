//! Phase counters for the cleaning pipeline.
//!
//! Only the `metrics` facade is used here: without an installed recorder every
//! call is a no-op, so a host process decides where the numbers go.

/// Normalization phase metrics
pub struct NormalizeMetrics;

impl NormalizeMetrics {
    pub fn record_kept(source: &'static str, rows: usize) {
        ::metrics::counter!("cleaner_normalize_rows_kept_total", "source" => source)
            .increment(rows as u64);
    }

    pub fn record_dropped(source: &'static str, reason: &'static str, rows: usize) {
        ::metrics::counter!(
            "cleaner_normalize_rows_dropped_total",
            "source" => source,
            "reason" => reason
        )
        .increment(rows as u64);
    }

    pub fn record_duplicates(source: &'static str, rows: usize) {
        ::metrics::counter!("cleaner_normalize_duplicates_total", "source" => source)
            .increment(rows as u64);
    }
}

/// Geocoding phase metrics
pub struct GeocodeMetrics;

impl GeocodeMetrics {
    pub fn record_lookup(outcome: &'static str) {
        ::metrics::counter!("cleaner_geocode_lookups_total", "outcome" => outcome).increment(1);
    }

    pub fn record_duration(duration_secs: f64) {
        ::metrics::histogram!("cleaner_geocode_duration_seconds").record(duration_secs);
    }
}

/// Outlier filter metrics
pub struct OutlierMetrics;

impl OutlierMetrics {
    pub fn record_rejected(outside_box: usize, missing_coords: usize) {
        ::metrics::counter!("cleaner_outlier_rejected_total", "reason" => "outside_box")
            .increment(outside_box as u64);
        ::metrics::counter!("cleaner_outlier_rejected_total", "reason" => "missing_coords")
            .increment(missing_coords as u64);
    }
}
