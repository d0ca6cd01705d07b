//! Destinations the normalized chapter records are loaded into.
//!
//! [`bigquery::BigQueryDestination`] is the production sink. [`memory::MemoryDestination`]
//! keeps the records in memory for dry runs and tests.

mod base;
pub mod bigquery;
pub mod memory;

pub use base::Destination;
