//! Valores producidos por el código de usuario y la identidad de un output.
//!
//! `UserEvent` es la unión cerrada de todo lo que un compute, un backend de
//! almacenamiento o un materializer pueden devolver. Cada etapa del motor
//! valida qué variantes acepta; cualquier otra es una violación de contrato.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AssetMaterialization, ExpectationResult, MetadataEntry, OutputMetadataEntry, PartitionMetadataEntry};

/// Identidad de una ocurrencia física de output: (step, output, mapping key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StepOutputHandle {
    pub step_key: String,
    pub output_name: String,
    pub mapping_key: Option<String>,
}

impl StepOutputHandle {
    pub fn new(step_key: impl Into<String>, output_name: impl Into<String>) -> Self {
        Self { step_key: step_key.into(),
               output_name: output_name.into(),
               mapping_key: None }
    }

    pub fn dynamic(step_key: impl Into<String>, output_name: impl Into<String>, mapping_key: impl Into<String>) -> Self {
        Self { step_key: step_key.into(),
               output_name: output_name.into(),
               mapping_key: Some(mapping_key.into()) }
    }
}

impl fmt::Display for StepOutputHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mapping_key {
            Some(key) => write!(f, "{}.{}[{}]", self.step_key, self.output_name, key),
            None => write!(f, "{}.{}", self.step_key, self.output_name),
        }
    }
}

/// Output estático: a lo sumo uno por nombre y ejecución.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub output_name: String,
    pub value: Value,
    pub metadata_entries: Vec<OutputMetadataEntry>,
}

impl Output {
    pub fn new(output_name: impl Into<String>, value: Value) -> Self {
        Self { output_name: output_name.into(),
               value,
               metadata_entries: vec![] }
    }

    pub fn with_metadata(mut self, entry: impl Into<OutputMetadataEntry>) -> Self {
        self.metadata_entries.push(entry.into());
        self
    }
}

/// Output dinámico (fan-out): una rama por `mapping_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicOutput {
    pub output_name: String,
    pub mapping_key: String,
    pub value: Value,
    pub metadata_entries: Vec<OutputMetadataEntry>,
}

impl DynamicOutput {
    pub fn new(output_name: impl Into<String>, mapping_key: impl Into<String>, value: Value) -> Self {
        Self { output_name: output_name.into(),
               mapping_key: mapping_key.into(),
               value,
               metadata_entries: vec![] }
    }

    pub fn with_metadata(mut self, entry: impl Into<OutputMetadataEntry>) -> Self {
        self.metadata_entries.push(entry.into());
        self
    }
}

/// Variante etiquetada estático/dinámico que recorre el pipeline de outputs.
#[derive(Debug, Clone, PartialEq)]
pub enum SolidOutput {
    Static(Output),
    Dynamic(DynamicOutput),
}

impl SolidOutput {
    pub fn output_name(&self) -> &str {
        match self {
            SolidOutput::Static(o) => &o.output_name,
            SolidOutput::Dynamic(o) => &o.output_name,
        }
    }

    pub fn mapping_key(&self) -> Option<&str> {
        match self {
            SolidOutput::Static(_) => None,
            SolidOutput::Dynamic(o) => Some(&o.mapping_key),
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            SolidOutput::Static(o) => &o.value,
            SolidOutput::Dynamic(o) => &o.value,
        }
    }

    pub fn metadata_entries(&self) -> &[OutputMetadataEntry] {
        match self {
            SolidOutput::Static(o) => &o.metadata_entries,
            SolidOutput::Dynamic(o) => &o.metadata_entries,
        }
    }

    /// Sólo las entradas planas (las que viajan en el evento `StepOutput`).
    pub fn plain_metadata_entries(&self) -> Vec<MetadataEntry> {
        self.metadata_entries()
            .iter()
            .filter_map(|e| match e {
                OutputMetadataEntry::Plain(entry) => Some(entry.clone()),
                OutputMetadataEntry::Partitioned(_) => None,
            })
            .collect()
    }

    pub fn handle(&self, step_key: &str) -> StepOutputHandle {
        StepOutputHandle { step_key: step_key.to_string(),
                           output_name: self.output_name().to_string(),
                           mapping_key: self.mapping_key().map(str::to_string) }
    }
}

/// Todo lo que el código de usuario puede devolver al motor.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    Output(Output),
    DynamicOutput(DynamicOutput),
    AssetMaterialization(AssetMaterialization),
    ExpectationResult(ExpectationResult),
    Metadata(MetadataEntry),
    PartitionMetadata(PartitionMetadataEntry),
}

impl UserEvent {
    /// Nombre del tipo en tiempo de ejecución, usado en mensajes de error.
    pub fn type_name(&self) -> &'static str {
        match self {
            UserEvent::Output(_) => "Output",
            UserEvent::DynamicOutput(_) => "DynamicOutput",
            UserEvent::AssetMaterialization(_) => "AssetMaterialization",
            UserEvent::ExpectationResult(_) => "ExpectationResult",
            UserEvent::Metadata(_) => "MetadataEntry",
            UserEvent::PartitionMetadata(_) => "PartitionMetadataEntry",
        }
    }
}

impl From<Output> for UserEvent {
    fn from(value: Output) -> Self {
        UserEvent::Output(value)
    }
}

impl From<DynamicOutput> for UserEvent {
    fn from(value: DynamicOutput) -> Self {
        UserEvent::DynamicOutput(value)
    }
}

impl From<AssetMaterialization> for UserEvent {
    fn from(value: AssetMaterialization) -> Self {
        UserEvent::AssetMaterialization(value)
    }
}

impl From<ExpectationResult> for UserEvent {
    fn from(value: ExpectationResult) -> Self {
        UserEvent::ExpectationResult(value)
    }
}

impl From<MetadataEntry> for UserEvent {
    fn from(value: MetadataEntry) -> Self {
        UserEvent::Metadata(value)
    }
}

impl From<PartitionMetadataEntry> for UserEvent {
    fn from(value: PartitionMetadataEntry) -> Self {
        UserEvent::PartitionMetadata(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handle_display_includes_mapping_key_only_for_dynamic() {
        assert_eq!(StepOutputHandle::new("s", "out").to_string(), "s.out");
        assert_eq!(StepOutputHandle::dynamic("s", "item", "a").to_string(), "s.item[a]");
    }

    #[test]
    fn plain_metadata_skips_partition_targeted_entries() {
        let out = SolidOutput::Static(Output::new("result", json!(1)).with_metadata(MetadataEntry::int("rows", 3))
                                                                    .with_metadata(MetadataEntry::int("rows", 1).for_partition("p1")));
        let plain = out.plain_metadata_entries();
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].label, "rows");
    }
}
