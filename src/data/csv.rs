//! Comma-delimited feature files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};
use ndarray::Array2;

/// Errors from reading a feature file.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("line {line}, column {column}: cannot parse `{value}` as a number")]
    Parse {
        line: u64,
        column: usize,
        value: String,
    },

    #[error("line {line}: expected {expected} columns, found {actual}")]
    ColumnCount {
        line: u64,
        expected: usize,
        actual: usize,
    },

    #[error("expected {expected} rows, file has {actual}")]
    NotEnoughRows { expected: usize, actual: usize },
}

/// How to read a feature file.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvOptions {
    /// Values per row.
    pub num_cols: usize,
    /// Read exactly this many rows. `None` reads the whole file.
    pub num_rows: Option<usize>,
    /// Values equal to this are loaded as NaN.
    pub missing_value: Option<f32>,
    /// Skip the first line.
    pub has_header: bool,
    pub delimiter: u8,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            num_cols: 30,
            num_rows: None,
            missing_value: Some(-999.0),
            has_header: false,
            delimiter: b',',
        }
    }
}

/// Read a feature file from disk.
pub fn read_features(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Array2<f32>, DataError> {
    let path = path.as_ref();
    info!("reading features from {}", path.display());
    parse_features(File::open(path)?, options)
}

/// Read features from any reader.
///
/// Every row must have exactly `num_cols` fields. Empty fields and the words
/// accepted by `f32::from_str` (`NaN`, `inf`) parse as usual; anything else is
/// a [`DataError::Parse`].
pub fn parse_features<R: Read>(reader: R, options: &CsvOptions) -> Result<Array2<f32>, DataError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(::csv::Trim::All)
        .from_reader(reader);

    let num_cols = options.num_cols;
    let mut values: Vec<f32> = Vec::with_capacity(options.num_rows.unwrap_or(0) * num_cols);
    let mut num_rows = 0usize;
    let mut record = ::csv::StringRecord::new();

    while options.num_rows.map_or(true, |limit| num_rows < limit) && reader.read_record(&mut record)? {
        let line = record.position().map_or(0, |p| p.line());
        if record.len() != num_cols {
            return Err(DataError::ColumnCount {
                line,
                expected: num_cols,
                actual: record.len(),
            });
        }
        for (column, field) in record.iter().enumerate() {
            let value = if field.is_empty() {
                f32::NAN
            } else {
                field.parse::<f32>().map_err(|_| DataError::Parse {
                    line,
                    column,
                    value: field.to_string(),
                })?
            };
            values.push(match options.missing_value {
                Some(sentinel) if value == sentinel => f32::NAN,
                _ => value,
            });
        }
        num_rows += 1;
    }

    if let Some(expected) = options.num_rows {
        if num_rows < expected {
            return Err(DataError::NotEnoughRows {
                expected,
                actual: num_rows,
            });
        }
    }

    debug!("read {num_rows} rows x {num_cols} columns");
    Array2::from_shape_vec((num_rows, num_cols), values)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
}
