//! Entradas de metadata adjuntas a outputs, materializaciones y type checks.
//!
//! Una entrada puede ser "plana" (aplica a todas las particiones de un
//! output) o dirigida a una partición concreta (`PartitionMetadataEntry`).
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Valor tipado de una entrada de metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MetadataValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Json(Value),
    Path(String),
    Url(String),
    Markdown(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub label: String,
    pub description: Option<String>,
    pub value: MetadataValue,
}

impl MetadataEntry {
    pub fn new(label: impl Into<String>, value: MetadataValue) -> Self {
        Self { label: label.into(),
               description: None,
               value }
    }

    pub fn text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(label, MetadataValue::Text(text.into()))
    }

    pub fn int(label: impl Into<String>, value: i64) -> Self {
        Self::new(label, MetadataValue::Int(value))
    }

    pub fn json(label: impl Into<String>, value: Value) -> Self {
        Self::new(label, MetadataValue::Json(value))
    }

    pub fn path(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(label, MetadataValue::Path(path.into()))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Dirige esta entrada a una única partición.
    pub fn for_partition(self, partition: impl Into<String>) -> PartitionMetadataEntry {
        PartitionMetadataEntry { partition: partition.into(),
                                 entry: self }
    }
}

/// Entrada de metadata que sólo aplica a la partición `partition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionMetadataEntry {
    pub partition: String,
    pub entry: MetadataEntry,
}

/// Metadata declarada por el propio output (plana o dirigida).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutputMetadataEntry {
    Plain(MetadataEntry),
    Partitioned(PartitionMetadataEntry),
}

impl From<MetadataEntry> for OutputMetadataEntry {
    fn from(entry: MetadataEntry) -> Self {
        OutputMetadataEntry::Plain(entry)
    }
}

impl From<PartitionMetadataEntry> for OutputMetadataEntry {
    fn from(entry: PartitionMetadataEntry) -> Self {
        OutputMetadataEntry::Partitioned(entry)
    }
}
