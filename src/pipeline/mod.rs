// Listing pipeline: ingestion, processing, and storage

pub mod ingestion;
pub mod processing;
pub mod storage;
pub mod pipeline;

pub use pipeline::{load_stations, Pipeline, PipelineResult, SourcePaths};
