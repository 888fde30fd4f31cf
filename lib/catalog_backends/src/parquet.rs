use crate::config::ParquetCatalogConfig;
use crate::errors::CatalogError;
use crate::native::{NativeCatalog, NativeQuantityGetter};
use catalog_core::cursor::DatasetCursor;
use catalog_core::errors::{RegistryError, SchemaError};
use catalog_core::homogenization::{
    build_modifiers, ModifierProvider, NoModifiers, QuantityModifiers, SchemaVersion,
};
use catalog_core::quantity_info::{QuantityInfo, QuantityInfoDict};
use catalog_core::registry::{Dataset, DatasetHandle, DatasetRegistry, NativeField};
use catalog_core::schema::{
    dtype_name, regenerate_schema, resolve_schema, write_schema_yaml, Schema,
};
use log::{debug, warn};
use parking_lot::Mutex;
use polars::prelude::{DataType, Field, ParquetReader, SerReader, Series};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

/// An opened Parquet file. Only the schema is read on open. Columns are read
/// on demand and kept until the content cache is cleared.
///
/// Every uncached column read opens the file again and parses its footer,
/// so the handle saves the schema read but not the footer read.
pub struct ParquetHandle {
    path: PathBuf,
    fields: Vec<(String, DataType)>,
    columns: Mutex<HashMap<String, Series>>,
}

impl ParquetHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn cached_columns(&self) -> usize {
        self.columns.lock().len()
    }

    /// Reads a single column. Concurrent first reads of one file are serialized.
    pub fn read_column(&self, name: &str) -> Result<Series, CatalogError> {
        if !self.has_column(name) {
            return Err(CatalogError::UnknownQuantity(name.to_string()));
        }
        let mut columns = self.columns.lock();
        if let Some(s) = columns.get(name) {
            return Ok(s.clone());
        }
        debug!("Reading column {} from {}", name, self.path.display());
        let df = ParquetReader::new(File::open(&self.path)?)
            .with_columns(Some(vec![name.to_string()]))
            .finish()?;
        let s = df.column(name)?.clone();
        columns.insert(name.to_string(), s.clone());
        Ok(s)
    }
}

impl DatasetHandle for ParquetHandle {
    fn open(path: &Path) -> Result<Self, RegistryError> {
        let open_error = |reason: String| RegistryError::OpenError {
            path: path.to_path_buf(),
            reason,
        };
        let file = File::open(path).map_err(|e| open_error(e.to_string()))?;
        let arrow_schema = ParquetReader::new(file)
            .schema()
            .map_err(|e| open_error(e.to_string()))?;
        let fields = arrow_schema
            .fields
            .iter()
            .map(|f| {
                let field = Field::from(f);
                (field.name().to_string(), field.data_type().clone())
            })
            .collect();
        Ok(ParquetHandle {
            path: path.to_path_buf(),
            fields,
            columns: Mutex::new(HashMap::new()),
        })
    }

    fn native_fields(&self) -> Vec<NativeField> {
        self.fields
            .iter()
            .map(|(n, dt)| NativeField::new(n, &dtype_name(dt)))
            .collect()
    }

    fn clear_cache(&self) {
        self.columns.lock().clear();
    }
}

pub struct ParquetCatalog {
    base_dir: PathBuf,
    schema_path: PathBuf,
    use_cache: bool,
    registry: DatasetRegistry<ParquetHandle>,
    datasets: Vec<Dataset<ParquetHandle>>,
    schema: Schema,
    schema_version: Option<SchemaVersion>,
    quantity_modifiers: QuantityModifiers,
    quantity_info: QuantityInfoDict,
    native_quantities: BTreeSet<String>,
}

impl ParquetCatalog {
    pub fn new(config: ParquetCatalogConfig) -> Result<ParquetCatalog, CatalogError> {
        Self::with_modifiers(config, &NoModifiers)
    }

    pub fn with_modifiers(
        config: ParquetCatalogConfig,
        modifier_provider: &dyn ModifierProvider,
    ) -> Result<ParquetCatalog, CatalogError> {
        if !config.base_dir.is_dir() {
            return Err(RegistryError::InvalidBaseDir(config.base_dir.clone()).into());
        }
        let filename_re = config.filename_regex()?;
        let schema_path = config.schema_path();

        let registry = DatasetRegistry::new();
        let datasets = registry.discover(&config.base_dir, &filename_re)?;
        let schema = resolve_schema(
            Some(&schema_path),
            &datasets,
            &config.base_dir.display().to_string(),
        )?;

        let (schema_version, quantity_modifiers) =
            build_modifiers(&schema, config.is_dpdd, modifier_provider);
        let quantity_info = match &config.meta_path {
            Some(meta_path) => QuantityInfoDict::from_path(meta_path)?,
            None => QuantityInfoDict::packaged()?,
        };
        let native_quantities = schema.keys().cloned().collect();

        Ok(ParquetCatalog {
            base_dir: config.base_dir,
            schema_path,
            use_cache: config.use_cache,
            registry,
            datasets,
            schema,
            schema_version,
            quantity_modifiers,
            quantity_info,
            native_quantities,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_version(&self) -> Option<SchemaVersion> {
        self.schema_version
    }

    pub fn quantity_modifiers(&self) -> &QuantityModifiers {
        &self.quantity_modifiers
    }

    pub fn datasets(&self) -> &[Dataset<ParquetHandle>] {
        &self.datasets
    }

    pub fn registry(&self) -> &DatasetRegistry<ParquetHandle> {
        &self.registry
    }

    /// Regenerates the schema from the data files and writes it to the catalog's
    /// schema location. The running catalog keeps the schema it was built with.
    pub fn generate_schema_yaml(&self, overwrite: bool) -> Result<(), CatalogError> {
        let schema = regenerate_schema(&self.datasets);
        if schema.is_empty() {
            return Err(SchemaError::NoSchema(self.base_dir.display().to_string()).into());
        }
        write_schema_yaml(&self.schema_path, &schema, overwrite)?;
        Ok(())
    }

    pub fn close_all_file_handles(&mut self) {
        self.datasets.clear();
        self.registry.close_all();
    }
}

impl NativeCatalog for ParquetCatalog {
    fn native_quantities(&self) -> Vec<String> {
        self.native_quantities.iter().cloned().collect()
    }

    fn native_filter_pushdown(&self) -> bool {
        false
    }

    fn quantity_info(&self, quantity: &str) -> Option<QuantityInfo> {
        self.quantity_info.get(quantity).cloned()
    }

    fn iter_native_datasets<'a>(
        &'a self,
        native_filters: Option<&[String]>,
    ) -> Box<dyn Iterator<Item = NativeQuantityGetter<'a>> + 'a> {
        if native_filters.is_some_and(|f| !f.is_empty()) {
            warn!("Native filters are not applied by the Parquet backend");
        }
        let cursor = DatasetCursor::new(&self.datasets, self.use_cache);
        Box::new(cursor.map(|dataset| {
            NativeQuantityGetter::Single(Box::new(move |native_quantity: &str| {
                dataset.handle().read_column(native_quantity)
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
