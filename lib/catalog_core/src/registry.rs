use crate::errors::RegistryError;
use log::{debug, warn};
use parking_lot::Mutex;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A storage name and the storage type it was observed with, as reported by a handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeField {
    pub name: String,
    pub dtype: String,
}

impl NativeField {
    pub fn new(name: &str, dtype: &str) -> NativeField {
        NativeField {
            name: name.to_string(),
            dtype: dtype.to_string(),
        }
    }
}

/// An open connection to one physical readable unit.
///
/// Opening is expected to be costly (file footers, connections), which is why
/// handles are shared through a [DatasetRegistry] instead of being reopened.
pub trait DatasetHandle: Sized {
    fn open(path: &Path) -> Result<Self, RegistryError>;

    /// Fields in storage order. May be empty for units without columns.
    fn native_fields(&self) -> Vec<NativeField>;

    /// Drops materialized content while keeping the handle usable.
    fn clear_cache(&self);
}

pub struct Dataset<H: DatasetHandle> {
    identifier: PathBuf,
    handle: Arc<H>,
}

impl<H: DatasetHandle> Dataset<H> {
    pub fn identifier(&self) -> &Path {
        &self.identifier
    }

    pub fn handle(&self) -> &H {
        &self.handle
    }

    pub fn clear_cache(&self) {
        self.handle.clear_cache();
    }
}

pub struct DatasetRegistry<H: DatasetHandle> {
    handles: Mutex<HashMap<PathBuf, Arc<H>>>,
}

impl<H: DatasetHandle> Default for DatasetRegistry<H> {
    fn default() -> Self {
        DatasetRegistry {
            handles: Mutex::new(HashMap::new()),
        }
    }
}

impl<H: DatasetHandle> DatasetRegistry<H> {
    pub fn new() -> DatasetRegistry<H> {
        Default::default()
    }

    /// Returns the cached handle for `path`, opening it on first use.
    pub fn open(&self, path: &Path) -> Result<Arc<H>, RegistryError> {
        let mut handles = self.handles.lock();
        if let Some(handle) = handles.get(path) {
            return Ok(handle.clone());
        }
        debug!("Opening dataset handle for {}", path.display());
        let handle = Arc::new(H::open(path)?);
        handles.insert(path.to_path_buf(), handle.clone());
        Ok(handle)
    }

    /// Lists `base_dir` in lexicographic order and opens every entry whose
    /// file name matches `filename_re`. Entries that cannot be opened are skipped.
    pub fn discover(
        &self,
        base_dir: &Path,
        filename_re: &Regex,
    ) -> Result<Vec<Dataset<H>>, RegistryError> {
        if !base_dir.is_dir() {
            return Err(RegistryError::InvalidBaseDir(base_dir.to_path_buf()));
        }
        let mut file_names = vec![];
        for entry in fs::read_dir(base_dir)? {
            file_names.push(entry?.file_name());
        }
        file_names.sort();

        let mut datasets = vec![];
        for file_name in file_names {
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !filename_re.is_match(name) {
                continue;
            }
            let file_path = base_dir.join(name);
            match self.open(&file_path) {
                Ok(handle) => datasets.push(Dataset {
                    identifier: file_path,
                    handle,
                }),
                Err(e) => {
                    warn!("Cannot access {}; skipped ({})", file_path.display(), e);
                }
            }
        }
        if datasets.is_empty() {
            return Err(RegistryError::NoDatasets(base_dir.to_path_buf()));
        }
        Ok(datasets)
    }

    /// A singleton dataset list for backends that model a whole store as one unit.
    pub fn open_single(&self, path: &Path) -> Result<Vec<Dataset<H>>, RegistryError> {
        let handle = self.open(path)?;
        Ok(vec![Dataset {
            identifier: path.to_path_buf(),
            handle,
        }])
    }

    pub fn clear_cache(&self, dataset: &Dataset<H>) {
        dataset.clear_cache();
    }

    pub fn is_open(&self, path: &Path) -> bool {
        self.handles.lock().contains_key(path)
    }

    /// Releases every cached handle. Datasets created earlier keep their own
    /// reference alive until they are dropped.
    pub fn close_all(&self) {
        let mut handles = self.handles.lock();
        debug!("Closing {} dataset handles", handles.len());
        handles.clear();
    }
}
