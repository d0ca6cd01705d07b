//! Extraction of chapters from the feature service.

mod base;
pub mod feature_service;

pub use base::Source;
pub use feature_service::FeatureServiceSource;
