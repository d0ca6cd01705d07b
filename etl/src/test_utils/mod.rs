//! Helpers shared by unit and integration tests.
//!
//! - [`feature_service`] mocks the ArcGIS query endpoint and builds feature fixtures.
//! - [`bigquery`] mocks the Google token endpoint and the BigQuery REST API, and builds a
//!   [`crate::destination::bigquery::BigQueryDestination`] wired to them.

pub mod bigquery;
pub mod feature_service;
