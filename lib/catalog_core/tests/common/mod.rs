use catalog_core::errors::RegistryError;
use catalog_core::registry::{DatasetHandle, NativeField};
use log::debug;
use parking_lot::Mutex;
use std::fs;
use std::path::Path;

/// Reads `name:dtype` lines. Files whose first line is `corrupt` fail to open.
pub struct FieldListHandle {
    fields: Vec<NativeField>,
    materialized: Mutex<Vec<String>>,
}

impl FieldListHandle {
    pub fn materialize(&self, name: &str) {
        self.materialized.lock().push(name.to_string());
    }

    pub fn cached(&self) -> usize {
        self.materialized.lock().len()
    }
}

impl DatasetHandle for FieldListHandle {
    fn open(path: &Path) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path).map_err(|e| RegistryError::OpenError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if contents.starts_with("corrupt") {
            return Err(RegistryError::OpenError {
                path: path.to_path_buf(),
                reason: "corrupt footer".to_string(),
            });
        }
        let fields = contents
            .lines()
            .filter_map(|l| l.split_once(':'))
            .map(|(n, t)| NativeField::new(n.trim(), t.trim()))
            .collect();
        Ok(FieldListHandle {
            fields,
            materialized: Mutex::new(vec![]),
        })
    }

    fn native_fields(&self) -> Vec<NativeField> {
        self.fields.clone()
    }

    fn clear_cache(&self) {
        self.materialized.lock().clear();
    }
}

pub fn write_dataset(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

pub fn init_logger() {
    if env_logger::builder().is_test(true).try_init().is_err() {
        debug!("Tried to initialize logger which is already initialized")
    }
}
