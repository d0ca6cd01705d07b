//! Clients for the external services the pipeline talks to.

pub mod bigquery;
