// Pipeline processing: normalization, merging, address inference, geocoding and filtering

pub mod address;
pub mod geocode;
pub mod merge;
pub mod normalize;
pub mod outlier;
