//! Resultado de un type check y su forma serializada en eventos.
use serde::{Deserialize, Serialize};

use super::MetadataEntry;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCheck {
    pub success: bool,
    pub description: Option<String>,
    pub metadata_entries: Vec<MetadataEntry>,
}

impl TypeCheck {
    pub fn passed() -> Self {
        Self { success: true,
               description: None,
               metadata_entries: vec![] }
    }

    pub fn failed(description: impl Into<String>) -> Self {
        Self { success: false,
               description: Some(description.into()),
               metadata_entries: vec![] }
    }

    pub fn with_metadata(mut self, entries: Vec<MetadataEntry>) -> Self {
        self.metadata_entries = entries;
        self
    }
}

/// Lo que devuelve un type checker enchufable. El motor no asume que el
/// checker esté bien formado: `Malformed` describe un retorno inesperado y
/// se normaliza a un check fallido.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeCheckReturn {
    Check(TypeCheck),
    Bool(bool),
    Malformed { returned_type: String },
}

impl From<TypeCheck> for TypeCheckReturn {
    fn from(value: TypeCheck) -> Self {
        TypeCheckReturn::Check(value)
    }
}

impl From<bool> for TypeCheckReturn {
    fn from(value: bool) -> Self {
        TypeCheckReturn::Bool(value)
    }
}

/// Payload de type check adjunto a los eventos `StepInput`/`StepOutput`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeCheckData {
    pub success: bool,
    pub label: String,
    pub description: Option<String>,
    pub metadata_entries: Vec<MetadataEntry>,
}

impl TypeCheckData {
    pub fn from_check(label: impl Into<String>, check: &TypeCheck) -> Self {
        Self { success: check.success,
               label: label.into(),
               description: check.description.clone(),
               metadata_entries: check.metadata_entries.clone() }
    }
}
