use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClimateError {
    #[error("Climate payload has {found} lines, at least {required} are required")]
    MalformedInput { found: usize, required: usize },

    #[error("Climate payload has no column header line")]
    MissingHeader,

    #[error("Failed to read climate table")]
    Table(#[source] PolarsError),
}
