//! Conversions from extracted source values into destination records.

pub mod chapter;
