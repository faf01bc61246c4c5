//! Errores del ejecutor de steps.
//!
//! - `Failure` y `RetryRequested` son señales de control: atraviesan sin
//!   cambios todas las fronteras de código de usuario que las admiten.
//! - `UserCodeError` es lo que devuelve (o provoca con un panic) el código de
//!   usuario: compute, backends, type checkers y materializers.
//! - `StepError` es el error terminal del step; cada frontera envuelve los
//!   errores de usuario en una variante con su contexto (step, solid, output).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MetadataEntry;

/// Error arbitrario de código de usuario.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Fallo declarado explícitamente por el usuario.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("step failed: {}", .description.as_deref().unwrap_or("no description"))]
pub struct Failure {
    pub description: Option<String>,
    pub metadata_entries: Vec<MetadataEntry>,
}

impl Failure {
    pub fn new(description: impl Into<String>) -> Self {
        Self { description: Some(description.into()),
               metadata_entries: vec![] }
    }
}

/// Petición de reintento del step. El motor no decide si/cuándo reintentar.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("retry requested (max_retries={max_retries})")]
pub struct RetryRequested {
    pub max_retries: u32,
    pub seconds_to_wait: Option<f64>,
}

impl RetryRequested {
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries,
               seconds_to_wait: None }
    }
}

#[derive(Debug, Error)]
pub enum UserCodeError {
    #[error(transparent)]
    Failure(#[from] Failure),
    #[error(transparent)]
    RetryRequested(#[from] RetryRequested),
    #[error("{0}")]
    Error(BoxError),
}

impl UserCodeError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        UserCodeError::Error(err.into())
    }

    /// Frontera con paso de señales de control: `Failure` y `RetryRequested`
    /// se propagan sin cambios, el resto se envuelve con `wrap`.
    pub fn escalate(self, wrap: impl FnOnce(BoxError) -> StepError) -> StepError {
        match self {
            UserCodeError::Failure(f) => StepError::Failure(f),
            UserCodeError::RetryRequested(r) => StepError::RetryRequested(r),
            UserCodeError::Error(e) => wrap(e),
        }
    }

    /// Frontera sin paso de señales: todo error queda envuelto.
    pub fn into_boxed(self) -> BoxError {
        match self {
            UserCodeError::Failure(f) => Box::new(f),
            UserCodeError::RetryRequested(r) => Box::new(r),
            UserCodeError::Error(e) => e,
        }
    }
}

/// Clasificación gruesa de `StepError`, usada por los eventos de fallo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    Classification,
    TypeCheck,
    BackendContract,
    UserCode,
    ControlFlow,
    Configuration,
    Internal,
}

#[derive(Debug, Error)]
pub enum StepError {
    // ---- clasificación de outputs ----
    #[error("compute for solid \"{solid}\" returned an output \"{output_name}\" that does not exist; the available outputs are {available:?}")]
    UndeclaredOutput { solid: String, output_name: String, available: Vec<String> },
    #[error("compute for solid \"{solid}\" returned an output \"{output_name}\" multiple times")]
    DuplicateOutput { solid: String, output_name: String },
    #[error("compute for solid \"{solid}\" for output \"{output_name}\" defined as dynamic must yield DynamicOutput, got Output")]
    ExpectedDynamicOutput { solid: String, output_name: String },
    #[error("compute for solid \"{solid}\" yielded a DynamicOutput for output \"{output_name}\", which is not declared as dynamic")]
    UnexpectedDynamicOutput { solid: String, output_name: String },
    #[error("compute for solid \"{solid}\" yielded a DynamicOutput with mapping_key \"{mapping_key}\" multiple times for output \"{output_name}\"")]
    DuplicateMappingKey { solid: String, output_name: String, mapping_key: String },
    #[error("core compute for solid \"{solid}\" did not return an output for non-optional output \"{output_name}\"")]
    OutputNotFound { solid: String, step_key: String, output_name: String },

    // ---- type checks ----
    #[error("{message}")]
    TypeCheck {
        message: String,
        #[source]
        source: BoxError,
    },
    #[error("{description}")]
    TypeCheckDidNotPass { description: String, type_name: String, metadata_entries: Vec<MetadataEntry> },

    // ---- almacenamiento de outputs ----
    #[error("error occurred while handling output \"{output_name}\" of step \"{step_key}\": {source}")]
    HandleOutput {
        step_key: String,
        output_name: String,
        #[source]
        source: BoxError,
    },
    #[error("IO manager on output \"{output_name}\" has returned value {value} of type \"{type_name}\"; the return type can only be one of AssetMaterialization, MetadataEntry, PartitionMetadataEntry")]
    BackendContractViolation { output_name: String, value: String, type_name: String },
    #[error("both the output definition and the IO manager of output \"{output_name}\" on solid \"{solid}\" associate it with asset partitions")]
    AssetClaimConflict { solid: String, output_name: String },
    #[error("output \"{output_name}\" associated a metadata entry ({label}) with the partition \"{partition}\", which is not one of the declared partition mappings ({declared:?})")]
    UndeclaredPartition { output_name: String, label: String, partition: String, declared: Vec<String> },
    #[error("IO manager \"{manager_key}\" required by output \"{output_name}\" of step \"{step_key}\" was not provided")]
    MissingIoManager { step_key: String, output_name: String, manager_key: String },

    // ---- materializers de tipo ----
    #[error("error occurred during output materialization: output \"{output_name}\", solid \"{solid}\", definition \"{solid_def}\": {source}")]
    TypeMaterialization {
        output_name: String,
        solid: String,
        solid_def: String,
        #[source]
        source: BoxError,
    },
    #[error("materialize_runtime_values on type {type_name} has returned value {value} of type \"{value_type}\"; you must return an AssetMaterialization")]
    InvalidTypeMaterialization { type_name: String, value: String, value_type: String },

    // ---- compute e inputs ----
    #[error("error occurred while executing solid \"{solid}\" (definition \"{solid_def}\", step \"{step_key}\"): {source}")]
    StepExecution {
        step_key: String,
        solid: String,
        solid_def: String,
        #[source]
        source: BoxError,
    },
    #[error("error occurred while loading input \"{input_name}\" of step \"{step_key}\": {source}")]
    LoadInput {
        step_key: String,
        input_name: String,
        #[source]
        source: BoxError,
    },

    // ---- señales de control ----
    #[error(transparent)]
    Failure(Failure),
    #[error(transparent)]
    RetryRequested(RetryRequested),

    #[error("invalid run config: {0}")]
    Config(String),
    #[error("invariant violation: {0}")]
    Invariant(String),
}

impl StepError {
    pub fn class(&self) -> ErrorClass {
        match self {
            StepError::UndeclaredOutput { .. }
            | StepError::DuplicateOutput { .. }
            | StepError::ExpectedDynamicOutput { .. }
            | StepError::UnexpectedDynamicOutput { .. }
            | StepError::DuplicateMappingKey { .. }
            | StepError::OutputNotFound { .. } => ErrorClass::Classification,
            StepError::TypeCheck { .. } | StepError::TypeCheckDidNotPass { .. } => ErrorClass::TypeCheck,
            StepError::BackendContractViolation { .. }
            | StepError::InvalidTypeMaterialization { .. }
            | StepError::UndeclaredPartition { .. } => ErrorClass::BackendContract,
            StepError::HandleOutput { .. }
            | StepError::TypeMaterialization { .. }
            | StepError::StepExecution { .. }
            | StepError::LoadInput { .. } => ErrorClass::UserCode,
            StepError::Failure(_) | StepError::RetryRequested(_) => ErrorClass::ControlFlow,
            StepError::AssetClaimConflict { .. } | StepError::MissingIoManager { .. } | StepError::Config(_) => {
                ErrorClass::Configuration
            }
            StepError::Invariant(_) => ErrorClass::Internal,
        }
    }

    pub fn is_control_flow(&self) -> bool {
        self.class() == ErrorClass::ControlFlow
    }
}

/// Snapshot serializable de un error y su cadena de `source()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub cause: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self { message: err.to_string(),
               cause: err.source().map(|s| Box::new(ErrorInfo::from_error(s))) }
    }
}
