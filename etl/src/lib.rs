//! Extracts university chapters from an ArcGIS feature service, normalizes them and loads
//! them into BigQuery.
//!
//! A run is a single sequential pass driven by [`pipeline::Pipeline`]:
//! [`source::Source::fetch_all`] materializes every feature,
//! [`conversions::chapter::normalize_chapters`] turns them into [`types::ChapterRecord`]s, and
//! [`destination::Destination::load`] persists the batch.

pub mod clients;
pub mod conversions;
pub mod destination;
pub mod encryption;
pub mod error;
mod macros;
pub mod pipeline;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
