use crate::config::SqliteCatalogConfig;
use crate::errors::CatalogError;
use crate::native::{NativeCatalog, NativeQuantityGetter};
use catalog_core::cursor::DatasetCursor;
use catalog_core::errors::{RegistryError, SchemaError};
use catalog_core::quantity_info::{QuantityInfo, QuantityInfoDict};
use catalog_core::registry::{Dataset, DatasetHandle, DatasetRegistry, NativeField};
use catalog_core::schema::{dtype_name, schema_from_fields, Schema};
use log::{debug, info, warn};
use md5::{Digest, Md5};
use polars::prelude::{DataFrame, DataType, NamedFrom, Series};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Maps a declared column type to the dtype its values are coerced to.
pub fn canonical_dtype(declared: &str) -> Option<DataType> {
    match declared.trim().to_ascii_uppercase().as_str() {
        "BIGINT" | "INTEGER" => Some(DataType::Int64),
        "INT" => Some(DataType::Int32),
        "FLOAT" => Some(DataType::Float32),
        "DOUBLE" | "REAL" => Some(DataType::Float64),
        "BOOLEAN" => Some(DataType::Boolean),
        "TEXT" | "VARCHAR" => Some(DataType::String),
        _ => None,
    }
}

pub fn build_where_clause(filters: &[String]) -> Option<String> {
    if filters.is_empty() {
        None
    } else {
        Some(format!("WHERE ({})", filters.join(") AND (")))
    }
}

pub fn build_query(quantities: &[String], table_name: &str, filters: &[String]) -> String {
    match build_where_clause(filters) {
        Some(where_clause) => format!(
            "SELECT {} FROM {} {};",
            quantities.join(", "),
            table_name,
            where_clause
        ),
        None => format!("SELECT {} FROM {};", quantities.join(", "), table_name),
    }
}

pub fn md5_hex(path: &Path) -> Result<String, CatalogError> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// A read-only connection to the database file.
pub struct SqliteHandle {
    conn: Connection,
}

impl SqliteHandle {
    fn connection(&self) -> &Connection {
        &self.conn
    }

    /// `(name, declared type)` pairs in table order.
    pub fn table_info(&self, table_name: &str) -> Result<Vec<(String, String)>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({});", table_name))?;
        let rows = stmt.query_map([], |row| Ok((row.get(1)?, row.get(2)?)))?;
        Ok(rows.collect::<Result<Vec<(String, String)>, _>>()?)
    }

    pub fn column_descriptions(&self) -> Result<HashMap<String, String>, CatalogError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, description FROM column_descriptions;")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<Result<HashMap<String, String>, _>>()?)
    }
}

impl DatasetHandle for SqliteHandle {
    fn open(path: &Path) -> Result<Self, RegistryError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(
            |e| RegistryError::OpenError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        )?;
        Ok(SqliteHandle { conn })
    }

    /// Fields are described per table, so the handle alone reports none.
    fn native_fields(&self) -> Vec<NativeField> {
        vec![]
    }

    fn clear_cache(&self) {
        self.conn.flush_prepared_statement_cache();
    }
}

fn mismatched_type(row: &Row<'_>, idx: usize, value: ValueRef<'_>) -> rusqlite::Error {
    let name = row
        .as_ref()
        .column_name(idx)
        .map(|n| n.to_string())
        .unwrap_or_default();
    rusqlite::Error::InvalidColumnType(idx, name, value.data_type())
}

/// Reals stored in an integer column are truncated toward zero.
fn integer_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<i64>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i)),
        ValueRef::Real(f) => Ok(Some(f as i64)),
        other => Err(mismatched_type(row, idx, other)),
    }
}

fn real_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<f64>> {
    match row.get_ref(idx)? {
        ValueRef::Null => Ok(None),
        ValueRef::Integer(i) => Ok(Some(i as f64)),
        ValueRef::Real(f) => Ok(Some(f)),
        other => Err(mismatched_type(row, idx, other)),
    }
}

enum ColumnBuffer {
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    String(Vec<Option<String>>),
}

impl ColumnBuffer {
    fn new(dtype: &DataType) -> Option<ColumnBuffer> {
        match dtype {
            DataType::Int32 => Some(ColumnBuffer::Int32(vec![])),
            DataType::Int64 => Some(ColumnBuffer::Int64(vec![])),
            DataType::Float32 => Some(ColumnBuffer::Float32(vec![])),
            DataType::Float64 => Some(ColumnBuffer::Float64(vec![])),
            DataType::Boolean => Some(ColumnBuffer::Boolean(vec![])),
            DataType::String => Some(ColumnBuffer::String(vec![])),
            _ => None,
        }
    }

    fn push(&mut self, row: &Row<'_>, idx: usize) -> rusqlite::Result<()> {
        match self {
            ColumnBuffer::Int32(v) => v.push(integer_at(row, idx)?.map(|x| x as i32)),
            ColumnBuffer::Int64(v) => v.push(integer_at(row, idx)?),
            ColumnBuffer::Float32(v) => v.push(real_at(row, idx)?.map(|x| x as f32)),
            ColumnBuffer::Float64(v) => v.push(real_at(row, idx)?),
            ColumnBuffer::Boolean(v) => v.push(row.get(idx)?),
            ColumnBuffer::String(v) => v.push(row.get(idx)?),
        }
        Ok(())
    }

    fn into_series(self, name: &str) -> Series {
        match self {
            ColumnBuffer::Int32(v) => Series::new(name, v),
            ColumnBuffer::Int64(v) => Series::new(name, v),
            ColumnBuffer::Float32(v) => Series::new(name, v),
            ColumnBuffer::Float64(v) => Series::new(name, v),
            ColumnBuffer::Boolean(v) => Series::new(name, v),
            ColumnBuffer::String(v) => Series::new(name, v),
        }
    }
}

pub struct SqliteCatalog {
    table_name: String,
    base_filters: Vec<String>,
    registry: DatasetRegistry<SqliteHandle>,
    datasets: Vec<Dataset<SqliteHandle>>,
    native_quantity_dtypes: Vec<(String, String)>,
    quantity_info: QuantityInfoDict,
    schema: Schema,
}

impl SqliteCatalog {
    pub fn new(config: SqliteCatalogConfig) -> Result<SqliteCatalog, CatalogError> {
        let table_name = config.validated_table_name()?.to_string();
        let base_filters = config.base_filters()?;

        if !config.filename.is_file() {
            return Err(CatalogError::InvalidFile(config.filename.clone()));
        }
        if let Some(expected) = &config.md5 {
            let actual = md5_hex(&config.filename)?;
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(CatalogError::ChecksumMismatch {
                    path: config.filename.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        let registry = DatasetRegistry::<SqliteHandle>::new();
        let datasets = registry.open_single(&config.filename)?;
        let handle = datasets[0].handle();

        let column_descriptions = if config.is_static {
            match handle.column_descriptions() {
                Ok(descriptions) => {
                    info!(
                        "Read {} column descriptions from {}",
                        descriptions.len(),
                        config.filename.display()
                    );
                    descriptions
                }
                Err(e) => {
                    warn!(
                        "No column descriptions available in {}: {}",
                        config.filename.display(),
                        e
                    );
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        let native_quantity_dtypes: Vec<(String, String)> = handle
            .table_info(&table_name)?
            .into_iter()
            .map(|(name, declared)| {
                let dtype = match canonical_dtype(&declared) {
                    Some(dt) => dtype_name(&dt),
                    None => declared,
                };
                (name, dtype)
            })
            .collect();
        let schema = schema_from_fields(
            native_quantity_dtypes
                .iter()
                .map(|(n, dt)| NativeField::new(n, dt)),
        );
        if schema.is_empty() {
            return Err(SchemaError::NoSchema(format!(
                "{}:{}",
                config.filename.display(),
                table_name
            ))
            .into());
        }

        Ok(SqliteCatalog {
            table_name,
            base_filters,
            registry,
            datasets,
            native_quantity_dtypes,
            quantity_info: QuantityInfoDict::default().with_descriptions(&column_descriptions),
            schema,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn base_filters(&self) -> &[String] {
        &self.base_filters
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn registry(&self) -> &DatasetRegistry<SqliteHandle> {
        &self.registry
    }

    pub fn native_quantity_dtype(&self, quantity: &str) -> Option<&str> {
        self.native_quantity_dtypes
            .iter()
            .find(|(n, _)| n == quantity)
            .map(|(_, dt)| dt.as_str())
    }

    /// Base filters followed by the filters of one iteration call.
    pub fn all_filters(&self, native_filters: Option<&[String]>) -> Vec<String> {
        let mut all_filters = self.base_filters.clone();
        if let Some(native_filters) = native_filters {
            all_filters.extend(native_filters.iter().cloned());
        }
        all_filters
    }

    pub fn select_statement(&self, quantities: &[String], filters: &[String]) -> String {
        build_query(quantities, &self.table_name, filters)
    }

    fn record_dtypes(&self, quantities: &[String]) -> Result<Vec<DataType>, CatalogError> {
        quantities
            .iter()
            .map(|q| {
                let declared = self
                    .native_quantity_dtype(q)
                    .ok_or_else(|| CatalogError::UnknownQuantity(q.clone()))?;
                dtype_from_name(declared).ok_or_else(|| CatalogError::UnsupportedDeclaredType {
                    column: q.clone(),
                    declared: declared.to_string(),
                })
            })
            .collect()
    }

    pub fn query(
        &self,
        handle: &SqliteHandle,
        quantities: &[String],
        filters: &[String],
    ) -> Result<DataFrame, CatalogError> {
        let dtypes = self.record_dtypes(quantities)?;
        let mut buffers = vec![];
        for (q, dt) in quantities.iter().zip(dtypes.iter()) {
            buffers.push(ColumnBuffer::new(dt).ok_or_else(|| {
                CatalogError::UnsupportedDeclaredType {
                    column: q.clone(),
                    declared: dtype_name(dt),
                }
            })?);
        }
        let query = self.select_statement(quantities, filters);
        debug!("SQL: {}", query);
        let mut stmt = handle.connection().prepare_cached(&query)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            for (i, buffer) in buffers.iter_mut().enumerate() {
                buffer.push(row, i)?;
            }
        }
        let series: Vec<Series> = buffers
            .into_iter()
            .zip(quantities.iter())
            .map(|(b, q)| b.into_series(q))
            .collect();
        Ok(DataFrame::new(series)?)
    }

    pub fn close_all_file_handles(&mut self) {
        self.datasets.clear();
        self.registry.close_all();
    }
}

fn dtype_from_name(name: &str) -> Option<DataType> {
    match name {
        "int32" => Some(DataType::Int32),
        "int64" => Some(DataType::Int64),
        "float32" => Some(DataType::Float32),
        "float64" => Some(DataType::Float64),
        "bool" => Some(DataType::Boolean),
        "str" => Some(DataType::String),
        _ => None,
    }
}

impl NativeCatalog for SqliteCatalog {
    fn native_quantities(&self) -> Vec<String> {
        self.native_quantity_dtypes
            .iter()
            .map(|(n, _)| n.clone())
            .collect()
    }

    fn native_filter_pushdown(&self) -> bool {
        true
    }

    fn quantity_info(&self, quantity: &str) -> Option<QuantityInfo> {
        self.quantity_info.get(quantity).cloned()
    }

    fn iter_native_datasets<'a>(
        &'a self,
        native_filters: Option<&[String]>,
    ) -> Box<dyn Iterator<Item = NativeQuantityGetter<'a>> + 'a> {
        let all_filters = self.all_filters(native_filters);
        let cursor = DatasetCursor::new(&self.datasets, true);
        Box::new(cursor.map(move |dataset| {
            let all_filters = all_filters.clone();
            NativeQuantityGetter::Batched(Box::new(move |quantities: &[String]| {
                self.query(dataset.handle(), quantities, &all_filters)
            }))
        }))
    }

    fn clear_cache(&self) {
        for dataset in &self.datasets {
            self.registry.clear_cache(dataset);
        }
    }

    fn close(&mut self) {
        self.close_all_file_handles();
    }
}
