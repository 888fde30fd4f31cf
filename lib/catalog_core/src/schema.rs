use crate::errors::SchemaError;
use crate::registry::{Dataset, DatasetHandle, NativeField};
use log::warn;
use polars::prelude::DataType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const SCHEMA_BACKUP_SUFFIX: &str = ".bak";
const FLAG_SUFFIXES: [&str; 2] = ["_flag_bad", "_flag_noGoodPixels"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub dtype: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        rename = "in_GCRbase",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_gcr_base: Option<bool>,
    #[serde(default, rename = "in_DPDD", skip_serializing_if = "Option::is_none")]
    pub in_dpdd: Option<bool>,
}

impl ColumnSchema {
    pub fn from_dtype(dtype: &str) -> ColumnSchema {
        ColumnSchema {
            dtype: dtype.to_string(),
            default: None,
            description: None,
            in_gcr_base: None,
            in_dpdd: None,
        }
    }
}

/// Native column name to column record. Ordered so that written artifacts are stable.
pub type Schema = BTreeMap<String, ColumnSchema>;

pub fn dtype_name(dtype: &DataType) -> String {
    match dtype {
        DataType::Boolean => "bool".to_string(),
        DataType::UInt8 => "uint8".to_string(),
        DataType::UInt16 => "uint16".to_string(),
        DataType::UInt32 => "uint32".to_string(),
        DataType::UInt64 => "uint64".to_string(),
        DataType::Int8 => "int8".to_string(),
        DataType::Int16 => "int16".to_string(),
        DataType::Int32 => "int32".to_string(),
        DataType::Int64 => "int64".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::String => "str".to_string(),
        dt => dt.to_string(),
    }
}

/// Reads a declared schema. An empty document is reported and yields `None`.
pub fn read_schema_yaml(schema_path: &Path) -> Result<Option<Schema>, SchemaError> {
    let contents =
        fs::read_to_string(schema_path).map_err(|source| SchemaError::ReadSchemaError {
            path: schema_path.to_path_buf(),
            source,
        })?;
    let schema: Option<Schema> = serde_yaml::from_str(&contents)?;
    match schema {
        Some(schema) if !schema.is_empty() => Ok(Some(schema)),
        _ => {
            warn!(
                "No schema can be found in schema file {}",
                schema_path.display()
            );
            Ok(None)
        }
    }
}

pub fn schema_from_fields(fields: impl IntoIterator<Item = NativeField>) -> Schema {
    fields
        .into_iter()
        .map(|f| (f.name, ColumnSchema::from_dtype(&f.dtype)))
        .collect()
}

/// Schema of the first dataset with a non-empty field set, in registry order.
/// Later datasets are not consulted.
pub fn infer_schema<H: DatasetHandle>(datasets: &[Dataset<H>]) -> Schema {
    datasets
        .iter()
        .map(|d| d.handle().native_fields())
        .find(|fields| !fields.is_empty())
        .map(schema_from_fields)
        .unwrap_or_default()
}

/// Prefers the declared schema at `declared_path` when it exists and is non-empty,
/// otherwise infers one from `datasets`.
pub fn resolve_schema<H: DatasetHandle>(
    declared_path: Option<&Path>,
    datasets: &[Dataset<H>],
    location: &str,
) -> Result<Schema, SchemaError> {
    if let Some(path) = declared_path {
        if path.is_file() {
            if let Some(schema) = read_schema_yaml(path)? {
                return Ok(schema);
            }
        }
    }
    warn!("Falling back to reading data files for column names");
    let schema = infer_schema(datasets);
    if schema.is_empty() {
        return Err(SchemaError::NoSchema(location.to_string()));
    }
    Ok(schema)
}

/// Inferred schema with flag columns defaulting to `true`, so that rows lacking
/// a value read as flagged.
pub fn regenerate_schema<H: DatasetHandle>(datasets: &[Dataset<H>]) -> Schema {
    let mut schema = infer_schema(datasets);
    inject_flag_defaults(&mut schema);
    schema
}

pub fn inject_flag_defaults(schema: &mut Schema) {
    for (col, column_schema) in schema.iter_mut() {
        if column_schema.dtype == "bool" && FLAG_SUFFIXES.iter().any(|s| col.ends_with(s)) {
            column_schema.default = Some(serde_yaml::Value::Bool(true));
        }
    }
}

pub fn backup_path(schema_path: &Path) -> PathBuf {
    let mut os: OsString = schema_path.as_os_str().to_owned();
    os.push(SCHEMA_BACKUP_SUFFIX);
    PathBuf::from(os)
}

/// Writes `schema` to `schema_path`. An existing file is only replaced when
/// `overwrite` is set, and is copied to its backup path first.
pub fn write_schema_yaml(
    schema_path: &Path,
    schema: &Schema,
    overwrite: bool,
) -> Result<(), SchemaError> {
    if schema_path.is_file() {
        if !overwrite {
            return Err(SchemaError::SchemaExists(schema_path.to_path_buf()));
        }
        let backup = backup_path(schema_path);
        warn!(
            "Overwriting schema file `{}`, which is backed up at `{}`",
            schema_path.display(),
            backup.display()
        );
        fs::copy(schema_path, &backup).map_err(|source| SchemaError::WriteSchemaError {
            path: backup.clone(),
            source,
        })?;
    }
    let serialized = serde_yaml::to_string(schema)?;
    fs::write(schema_path, serialized).map_err(|source| SchemaError::WriteSchemaError {
        path: schema_path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_defaults_only_for_bool_flag_columns() {
        let mut schema = Schema::new();
        schema.insert("psFlux_flag_bad".into(), ColumnSchema::from_dtype("bool"));
        schema.insert(
            "base_PixelFlags_flag_noGoodPixels".into(),
            ColumnSchema::from_dtype("bool"),
        );
        schema.insert("psFlux_flag_bad_x".into(), ColumnSchema::from_dtype("bool"));
        schema.insert("ap_flag_bad".into(), ColumnSchema::from_dtype("int64"));
        inject_flag_defaults(&mut schema);

        let defaulted: Vec<_> = schema
            .iter()
            .filter(|(_, c)| c.default.is_some())
            .map(|(n, _)| n.as_str())
            .collect();
        assert_eq!(
            defaulted,
            vec!["base_PixelFlags_flag_noGoodPixels", "psFlux_flag_bad"]
        );
        assert_eq!(
            schema["psFlux_flag_bad"].default,
            Some(serde_yaml::Value::Bool(true))
        );
    }

    #[test]
    fn test_dtype_names() {
        assert_eq!(dtype_name(&DataType::Boolean), "bool");
        assert_eq!(dtype_name(&DataType::Int32), "int32");
        assert_eq!(dtype_name(&DataType::Float64), "float64");
        assert_eq!(dtype_name(&DataType::String), "str");
    }

    #[test]
    fn test_backup_path_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("/data/schema.yaml")),
            PathBuf::from("/data/schema.yaml.bak")
        );
    }

    #[test]
    fn test_declared_schema_parses_optional_fields() {
        let yaml = r#"
ra:
  dtype: float64
  description: Right ascension
psFlux_flag_bad:
  dtype: bool
  default: true
"#;
        let schema: Schema = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(schema["ra"].description.as_deref(), Some("Right ascension"));
        assert_eq!(schema["ra"].default, None);
        assert_eq!(
            schema["psFlux_flag_bad"].default,
            Some(serde_yaml::Value::Bool(true))
        );
    }
}
