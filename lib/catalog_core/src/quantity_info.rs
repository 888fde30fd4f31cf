use crate::errors::QuantityInfoError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PACKAGED_META: &str = include_str!("../resources/dc2_source_meta.yaml");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityInfo {
    pub description: String,
    pub unit: Option<String>,
    pub in_gcr_base: Option<bool>,
    pub in_dpdd: Option<bool>,
}

impl QuantityInfo {
    /// Info carrying only a backend-provided column description.
    pub fn description_only(description: &str) -> QuantityInfo {
        QuantityInfo {
            description: description.to_string(),
            unit: None,
            in_gcr_base: None,
            in_dpdd: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QuantityInfoDict {
    entries: HashMap<String, QuantityInfo>,
}

impl QuantityInfoDict {
    pub fn packaged() -> Result<QuantityInfoDict, QuantityInfoError> {
        Self::from_yaml_str(PACKAGED_META)
    }

    pub fn from_path(meta_path: &Path) -> Result<QuantityInfoDict, QuantityInfoError> {
        let contents =
            fs::read_to_string(meta_path).map_err(|source| QuantityInfoError::ReadError {
                path: meta_path.to_path_buf(),
                source,
            })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<QuantityInfoDict, QuantityInfoError> {
        let raw: HashMap<String, (String, Option<String>, bool, bool)> =
            serde_yaml::from_str(yaml)?;
        let entries = raw
            .into_iter()
            .map(|(quantity, (description, unit, in_gcr_base, in_dpdd))| {
                (
                    quantity,
                    QuantityInfo {
                        description,
                        unit,
                        in_gcr_base: Some(in_gcr_base),
                        in_dpdd: Some(in_dpdd),
                    },
                )
            })
            .collect();
        Ok(QuantityInfoDict { entries })
    }

    /// Descriptions stored by a backend replace the dictionary entry for the
    /// quantities they name.
    pub fn with_descriptions(mut self, descriptions: &HashMap<String, String>) -> QuantityInfoDict {
        for (quantity, description) in descriptions {
            self.entries
                .insert(quantity.clone(), QuantityInfo::description_only(description));
        }
        self
    }

    pub fn get(&self, quantity: &str) -> Option<&QuantityInfo> {
        self.entries.get(quantity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
