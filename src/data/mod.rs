//! Feature input.
//!
//! Rows are read into a row-major [`ndarray::Array2<f32>`], one row per
//! observation. Missing values are `f32::NAN` once loaded; the sentinel used by
//! the source file is replaced on read.

pub mod csv;

pub use self::csv::{parse_features, read_features, CsvOptions, DataError};
