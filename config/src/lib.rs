//! Configuration for the university chapters ETL.
//!
//! Holds the typed configuration structs shared by the library and the loader binary,
//! the runtime [`environment::Environment`] detection, and the layered [`load_config`]
//! function.

pub mod environment;
mod load;
pub mod shared;

pub use load::{Config, LoadConfigError, load_config, load_config_from};
