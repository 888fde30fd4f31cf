use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("No usable schema could be resolved for `{0}`")]
    NoSchema(String),
    #[error("Schema file `{0}` already exists! Allow overwriting to replace it")]
    SchemaExists(PathBuf),
    #[error("Problem reading schema file `{path}`: {source}")]
    ReadSchemaError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Problem writing schema file `{path}`: {source}")]
    WriteSchemaError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    YAMLError(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("`{0}` is not a valid directory")]
    InvalidBaseDir(PathBuf),
    #[error("No catalogs were found in `{0}`")]
    NoDatasets(PathBuf),
    #[error("Cannot open dataset `{path}`: {reason}")]
    OpenError { path: PathBuf, reason: String },
    #[error(transparent)]
    ListDirError(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum QuantityInfoError {
    #[error("Problem reading quantity metadata `{path}`: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Malformed quantity metadata: {0}")]
    MalformedError(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum FlagMaskError {
    #[error("At least one flag array is required")]
    NoFlags,
    #[error("Flag `{name}` has length {actual}, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    PolarsError(#[from] PolarsError),
}
