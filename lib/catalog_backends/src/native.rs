use crate::errors::CatalogError;
use catalog_core::quantity_info::QuantityInfo;
use polars::prelude::{DataFrame, Series};
use std::collections::HashMap;

pub type SingleQuantityGetter<'a> = Box<dyn Fn(&str) -> Result<Series, CatalogError> + 'a>;
pub type BatchedQuantityGetter<'a> =
    Box<dyn Fn(&[String]) -> Result<DataFrame, CatalogError> + 'a>;

/// Getter bound to one dataset of an iteration call. No I/O happens until it is invoked.
pub enum NativeQuantityGetter<'a> {
    /// Reads one column per call.
    Single(SingleQuantityGetter<'a>),
    /// Fetches all requested columns with one query.
    Batched(BatchedQuantityGetter<'a>),
}

impl NativeQuantityGetter<'_> {
    pub fn obtain_native_data(
        &self,
        native_quantities: &[String],
    ) -> Result<HashMap<String, Series>, CatalogError> {
        match self {
            NativeQuantityGetter::Single(getter) => native_quantities
                .iter()
                .map(|q| Ok((q.clone(), getter(q)?)))
                .collect(),
            NativeQuantityGetter::Batched(getter) => {
                let df = getter(native_quantities)?;
                Ok(df
                    .get_columns()
                    .iter()
                    .map(|s| (s.name().to_string(), s.clone()))
                    .collect())
            }
        }
    }
}

/// The read surface a generic catalog layer consumes.
pub trait NativeCatalog {
    fn native_quantities(&self) -> Vec<String>;

    /// Whether filters given to [NativeCatalog::iter_native_datasets] are applied by the backend.
    fn native_filter_pushdown(&self) -> bool;

    fn quantity_info(&self, quantity: &str) -> Option<QuantityInfo>;

    /// Yields one getter per dataset. Each call starts over from the first dataset.
    fn iter_native_datasets<'a>(
        &'a self,
        native_filters: Option<&[String]>,
    ) -> Box<dyn Iterator<Item = NativeQuantityGetter<'a>> + 'a>;

    fn clear_cache(&self);

    /// Releases every handle. The catalog yields no datasets afterwards.
    fn close(&mut self);
}
