//! Assets, particiones y eventos que el código de usuario puede emitir sobre
//! ellos (materializaciones y resultados de expectativas).
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::MetadataEntry;

/// Identificador jerárquico de un asset (`["warehouse", "orders"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetKey {
    pub path: Vec<String>,
}

impl AssetKey {
    pub fn new<I, S>(path: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { path: path.into_iter().map(Into::into).collect() }
    }
}

impl From<&str> for AssetKey {
    /// Interpreta `a/b/c` como la ruta `["a", "b", "c"]`.
    fn from(value: &str) -> Self {
        Self::new(value.split('/').filter(|s| !s.is_empty()))
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.join("/"))
    }
}

/// Un asset junto a un conjunto (sin orden) de particiones. Un conjunto vacío
/// significa "asset completo, sin particionar".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPartitions {
    pub asset_key: AssetKey,
    pub partitions: BTreeSet<String>,
}

impl AssetPartitions {
    pub fn new(asset_key: impl Into<AssetKey>) -> Self {
        Self { asset_key: asset_key.into(),
               partitions: BTreeSet::new() }
    }

    pub fn with_partitions<I, S>(asset_key: impl Into<AssetKey>, partitions: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { asset_key: asset_key.into(),
               partitions: partitions.into_iter().map(Into::into).collect() }
    }
}

/// Registro que afirma que un asset (opcionalmente una partición) fue
/// producido o actualizado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMaterialization {
    pub asset_key: AssetKey,
    pub partition: Option<String>,
    pub description: Option<String>,
    pub metadata_entries: Vec<MetadataEntry>,
}

impl AssetMaterialization {
    pub fn new(asset_key: impl Into<AssetKey>) -> Self {
        Self { asset_key: asset_key.into(),
               partition: None,
               description: None,
               metadata_entries: vec![] }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metadata(mut self, entries: Vec<MetadataEntry>) -> Self {
        self.metadata_entries = entries;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationResult {
    pub success: bool,
    pub label: Option<String>,
    pub description: Option<String>,
    pub metadata_entries: Vec<MetadataEntry>,
}

impl ExpectationResult {
    pub fn new(success: bool, label: impl Into<String>) -> Self {
        Self { success,
               label: Some(label.into()),
               description: None,
               metadata_entries: vec![] }
    }
}
