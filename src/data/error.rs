use thiserror::Error;

/// Everything that can go wrong while building the merged table.
///
/// All variants are fatal at startup: the dashboard has nothing to show
/// without both source tables.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("{table} table is missing column '{column}'")]
    MissingColumn { table: &'static str, column: String },

    #[error("{table} table, row {row}, column '{column}': {message}")]
    InvalidValue {
        table: &'static str,
        row: usize,
        column: String,
        message: String,
    },

    #[error("malformed input: {0}")]
    Malformed(String),
}
