use std::collections::HashMap;
use std::path::Path;

use super::normalizers::{GuyHoquetNormalizer, LaforetNormalizer, OrpiNormalizer};
use super::{NormalizedSet, TableNormalizer};
use crate::error::{CleanerError, Result};

/// Registry for source-specific normalization strategies
pub struct NormalizationRegistry {
    normalizers: HashMap<&'static str, Box<dyn TableNormalizer>>,
}

impl NormalizationRegistry {
    /// Create a new normalization registry with the built-in normalizers
    pub fn new() -> Self {
        let mut registry = Self {
            normalizers: HashMap::new(),
        };
        registry.register(Box::new(GuyHoquetNormalizer::new()));
        registry.register(Box::new(LaforetNormalizer::new()));
        registry.register(Box::new(OrpiNormalizer::new()));
        registry
    }

    /// Register a normalizer under the source it handles
    pub fn register(&mut self, normalizer: Box<dyn TableNormalizer>) {
        self.normalizers.insert(normalizer.source(), normalizer);
    }

    /// Get the appropriate normalizer for a source
    pub fn get_normalizer(&self, source_id: &str) -> Option<&dyn TableNormalizer> {
        self.normalizers.get(source_id).map(|n| n.as_ref())
    }

    /// Read and normalize one source's table
    pub fn normalize_file(&self, source_id: &str, path: &Path) -> Result<NormalizedSet> {
        let normalizer = self.get_normalizer(source_id).ok_or_else(|| {
            CleanerError::Config(format!("No normalizer registered for source: {}", source_id))
        })?;
        normalizer.normalize_file(path)
    }

    /// List all registered source IDs
    pub fn list_sources(&self) -> Vec<&str> {
        self.normalizers.keys().copied().collect()
    }
}

impl Default for NormalizationRegistry {
    fn default() -> Self {
        Self::new()
    }
}
