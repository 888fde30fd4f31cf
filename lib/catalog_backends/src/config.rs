use crate::errors::CatalogError;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_FILENAME_PATTERN: &str = r"source_visit_\d+\.parquet$";
pub const DEFAULT_SCHEMA_FILENAME: &str = "schema.yaml";
pub const DEFAULT_TABLE_NAME: &str = "truth";

fn default_filename_pattern() -> String {
    DEFAULT_FILENAME_PATTERN.to_string()
}

fn default_schema_filename() -> PathBuf {
    PathBuf::from(DEFAULT_SCHEMA_FILENAME)
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
pub struct ParquetCatalogConfig {
    pub base_dir: PathBuf,
    #[serde(default = "default_filename_pattern")]
    pub filename_pattern: String,
    #[serde(default = "default_schema_filename")]
    pub schema_filename: PathBuf,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    #[serde(default)]
    pub is_dpdd: bool,
    #[serde(default)]
    pub meta_path: Option<PathBuf>,
}

impl ParquetCatalogConfig {
    pub fn new(base_dir: &Path) -> ParquetCatalogConfig {
        ParquetCatalogConfig {
            base_dir: base_dir.to_path_buf(),
            filename_pattern: default_filename_pattern(),
            schema_filename: default_schema_filename(),
            use_cache: true,
            is_dpdd: false,
            meta_path: None,
        }
    }

    /// Anchored at the start of the file name only.
    pub fn filename_regex(&self) -> Result<Regex, CatalogError> {
        Ok(Regex::new(&format!("^(?:{})", self.filename_pattern))?)
    }

    /// An absolute `schema_filename` is used as is.
    pub fn schema_path(&self) -> PathBuf {
        self.base_dir.join(&self.schema_filename)
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum BaseFilters {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize, Debug, Clone)]
pub struct SqliteCatalogConfig {
    pub filename: PathBuf,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default = "default_true")]
    pub is_static: bool,
    #[serde(default)]
    pub base_filters: Option<BaseFilters>,
    #[serde(default)]
    pub md5: Option<String>,
}

impl SqliteCatalogConfig {
    pub fn new(filename: &Path) -> SqliteCatalogConfig {
        SqliteCatalogConfig {
            filename: filename.to_path_buf(),
            table_name: default_table_name(),
            is_static: true,
            base_filters: None,
            md5: None,
        }
    }

    pub fn base_filters(&self) -> Result<Vec<String>, CatalogError> {
        let filters = match &self.base_filters {
            None => vec![],
            Some(BaseFilters::One(f)) => vec![f.clone()],
            Some(BaseFilters::Many(fs)) => fs.clone(),
        };
        for f in &filters {
            if f.trim().is_empty() {
                return Err(CatalogError::MalformedBaseFilter(f.clone()));
            }
        }
        Ok(filters)
    }

    pub fn validated_table_name(&self) -> Result<&str, CatalogError> {
        let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")?;
        if re.is_match(&self.table_name) {
            Ok(&self.table_name)
        } else {
            Err(CatalogError::InvalidTableName(self.table_name.clone()))
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CatalogConfig {
    Parquet(ParquetCatalogConfig),
    Sqlite(SqliteCatalogConfig),
}

impl CatalogConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<CatalogConfig, CatalogError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &Path) -> Result<CatalogConfig, CatalogError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}
