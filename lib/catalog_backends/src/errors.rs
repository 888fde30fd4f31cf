use catalog_core::errors::{FlagMaskError, QuantityInfoError, RegistryError, SchemaError};
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("`{0}` is not a valid file")]
    InvalidFile(PathBuf),
    #[error("md5 sum does not match for `{path}`: expected {expected}, found {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
    #[error("Malformed base filter `{0}`")]
    MalformedBaseFilter(String),
    #[error("Invalid table name `{0}`")]
    InvalidTableName(String),
    #[error("Invalid filename pattern: {0}")]
    InvalidFilenamePattern(#[from] regex::Error),
    #[error("Unknown native quantity `{0}`")]
    UnknownQuantity(String),
    #[error("Declared type `{declared}` of column `{column}` has no canonical dtype")]
    UnsupportedDeclaredType { column: String, declared: String },
    #[error(transparent)]
    RegistryError(#[from] RegistryError),
    #[error(transparent)]
    SchemaError(#[from] SchemaError),
    #[error(transparent)]
    QuantityInfoError(#[from] QuantityInfoError),
    #[error(transparent)]
    FlagMaskError(#[from] FlagMaskError),
    #[error(transparent)]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),
    #[error(transparent)]
    ReadFileError(#[from] std::io::Error),
    #[error(transparent)]
    ReadConfigError(#[from] serde_yaml::Error),
}
