// Shared parsing helpers for source-specific normalizers
pub mod base;

// Individual normalizer implementations
pub mod guy_hoquet;
pub mod laforet;
pub mod orpi;

// Re-export the main components
pub use base::NormalizerUtils;
pub use guy_hoquet::GuyHoquetNormalizer;
pub use laforet::LaforetNormalizer;
pub use orpi::OrpiNormalizer;
