pub mod config;
pub mod errors;
pub mod native;
pub mod parquet;
pub mod sqlite;

use crate::config::CatalogConfig;
use crate::errors::CatalogError;
use crate::native::{NativeCatalog, NativeQuantityGetter};
use crate::parquet::ParquetCatalog;
use crate::sqlite::SqliteCatalog;
use catalog_core::quantity_info::QuantityInfo;

pub enum CatalogBackend {
    Parquet(ParquetCatalog),
    Sqlite(SqliteCatalog),
}

impl CatalogBackend {
    pub fn from_config(config: CatalogConfig) -> Result<CatalogBackend, CatalogError> {
        match config {
            CatalogConfig::Parquet(c) => Ok(CatalogBackend::Parquet(ParquetCatalog::new(c)?)),
            CatalogConfig::Sqlite(c) => Ok(CatalogBackend::Sqlite(SqliteCatalog::new(c)?)),
        }
    }
}

impl NativeCatalog for CatalogBackend {
    fn native_quantities(&self) -> Vec<String> {
        match self {
            CatalogBackend::Parquet(p) => p.native_quantities(),
            CatalogBackend::Sqlite(s) => s.native_quantities(),
        }
    }

    fn native_filter_pushdown(&self) -> bool {
        match self {
            CatalogBackend::Parquet(p) => p.native_filter_pushdown(),
            CatalogBackend::Sqlite(s) => s.native_filter_pushdown(),
        }
    }

    fn quantity_info(&self, quantity: &str) -> Option<QuantityInfo> {
        match self {
            CatalogBackend::Parquet(p) => p.quantity_info(quantity),
            CatalogBackend::Sqlite(s) => s.quantity_info(quantity),
        }
    }

    fn iter_native_datasets<'a>(
        &'a self,
        native_filters: Option<&[String]>,
    ) -> Box<dyn Iterator<Item = NativeQuantityGetter<'a>> + 'a> {
        match self {
            CatalogBackend::Parquet(p) => p.iter_native_datasets(native_filters),
            CatalogBackend::Sqlite(s) => s.iter_native_datasets(native_filters),
        }
    }

    fn clear_cache(&self) {
        match self {
            CatalogBackend::Parquet(p) => p.clear_cache(),
            CatalogBackend::Sqlite(s) => s.clear_cache(),
        }
    }

    fn close(&mut self) {
        match self {
            CatalogBackend::Parquet(p) => p.close(),
            CatalogBackend::Sqlite(s) => s.close(),
        }
    }
}
