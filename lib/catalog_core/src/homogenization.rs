use crate::schema::Schema;
use log::debug;
use polars::prelude::{PolarsError, PolarsResult, Series};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

const LEGACY_FLUX_ERR_SUFFIX: &str = "_fluxSigma";
const INTERMEDIATE_FLUX_ERR_SUFFIX: &str = "_fluxErr";

/// Naming dialect of flux-uncertainty columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaVersion {
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

/// Picks a version by sniffing column suffixes. If several dialects appear,
/// the oldest one wins; columns from other eras are mapped with it anyway.
pub fn detect_version(schema: &Schema) -> SchemaVersion {
    if schema.keys().any(|c| c.ends_with(LEGACY_FLUX_ERR_SUFFIX)) {
        SchemaVersion::V1
    } else if schema
        .keys()
        .any(|c| c.ends_with(INTERMEDIATE_FLUX_ERR_SUFFIX))
    {
        SchemaVersion::V2
    } else {
        SchemaVersion::V3
    }
}

pub type Transform = Arc<dyn Fn(&[Series]) -> PolarsResult<Series> + Send + Sync>;

#[derive(Clone)]
pub enum QuantityModifier {
    /// The homogenized name is already a native column.
    PassThrough,
    /// Renamed native column.
    Alias(String),
    Derived {
        native_quantities: Vec<String>,
        transform: Transform,
    },
}

impl Debug for QuantityModifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            QuantityModifier::PassThrough => write!(f, "PassThrough"),
            QuantityModifier::Alias(n) => write!(f, "Alias({})", n),
            QuantityModifier::Derived {
                native_quantities, ..
            } => write!(f, "Derived({})", native_quantities.join(", ")),
        }
    }
}

impl QuantityModifier {
    pub fn native_quantities(&self, homogenized: &str) -> Vec<String> {
        match self {
            QuantityModifier::PassThrough => vec![homogenized.to_string()],
            QuantityModifier::Alias(n) => vec![n.clone()],
            QuantityModifier::Derived {
                native_quantities, ..
            } => native_quantities.clone(),
        }
    }

    pub fn evaluate(
        &self,
        homogenized: &str,
        native_data: &HashMap<String, Series>,
    ) -> PolarsResult<Series> {
        let mut inputs = vec![];
        for q in self.native_quantities(homogenized) {
            let s = native_data
                .get(&q)
                .ok_or_else(|| PolarsError::ColumnNotFound(q.clone().into()))?;
            inputs.push(s.clone());
        }
        let mut out = match self {
            QuantityModifier::PassThrough | QuantityModifier::Alias(_) => inputs.remove(0),
            QuantityModifier::Derived { transform, .. } => transform(&inputs)?,
        };
        out.rename(homogenized);
        Ok(out)
    }
}

pub type QuantityModifiers = HashMap<String, QuantityModifier>;

/// Supplies the native to homogenized mapping of a concrete catalog variant.
pub trait ModifierProvider {
    fn generate_modifiers(&self, version: SchemaVersion) -> QuantityModifiers;
}

/// Base behaviour: no homogenized quantities beyond the native ones.
pub struct NoModifiers;

impl ModifierProvider for NoModifiers {
    fn generate_modifiers(&self, _version: SchemaVersion) -> QuantityModifiers {
        QuantityModifiers::new()
    }
}

pub fn identity_modifiers(schema: &Schema) -> QuantityModifiers {
    schema
        .keys()
        .map(|c| (c.clone(), QuantityModifier::PassThrough))
        .collect()
}

/// Data already in standardized-product form skips version detection.
pub fn build_modifiers(
    schema: &Schema,
    is_dpdd: bool,
    provider: &dyn ModifierProvider,
) -> (Option<SchemaVersion>, QuantityModifiers) {
    if is_dpdd {
        return (None, identity_modifiers(schema));
    }
    let version = detect_version(schema);
    debug!("Detected schema version {:?}", version);
    (Some(version), provider.generate_modifiers(version))
}
