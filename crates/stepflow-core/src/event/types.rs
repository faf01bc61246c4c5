//! Tipos de evento del ciclo de vida de un step y estructura `StepEvent`.
//!
//! Rol en el flujo:
//! - El ejecutor de un step produce una secuencia ordenada de `StepEvent`
//!   que el llamador vuelca a un `EventStore` append-only.
//! - El enum `StepEventKind` define el contrato observable y estable del
//!   motor: `StepStart`/`StepRestarted` siempre primero, `StepSuccess` siempre
//!   último en el camino sin fallo.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::StepExecutionContext;
use crate::errors::{ErrorClass, ErrorInfo, Failure, StepError};
use crate::model::{AssetMaterialization, AssetPartitions, ExpectationResult, MetadataEntry, StepOutputHandle, TypeCheckData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StepEventKind {
    /// Primer evento de una ejecución nueva del step.
    StepStart,
    /// Reemplaza a `StepStart` cuando hubo intentos previos.
    StepRestarted { previous_attempts: u32 },
    /// Un input fue cargado desde su backend de almacenamiento.
    LoadedInput {
        input_name: String,
        manager_key: String,
        upstream_step_key: Option<String>,
        upstream_output_name: Option<String>,
    },
    /// Resultado del type check de un input.
    StepInput { input_name: String, type_check: TypeCheckData },
    /// Resultado del type check de un output. Siempre precede a los eventos
    /// de almacenamiento de ese output.
    StepOutput {
        handle: StepOutputHandle,
        type_check: TypeCheckData,
        version: Option<String>,
        metadata_entries: Vec<MetadataEntry>,
    },
    AssetMaterialization { materialization: AssetMaterialization, input_assets: Vec<AssetPartitions> },
    StepExpectationResult { expectation: ExpectationResult },
    /// El backend terminó de almacenar un output.
    HandledOutput { output_name: String, manager_key: String, metadata_entries: Vec<MetadataEntry> },
    /// Evento terminal de éxito, con la duración de compute + almacenamiento.
    StepSuccess { duration_ms: f64 },
    /// Evento terminal de fallo (emitido por el llamador, no por el step).
    StepFailure { error: ErrorInfo, error_class: ErrorClass, user_failure: Option<Failure> },
    /// El step pidió un reintento (emitido por el llamador).
    StepUpForRetry { error: ErrorInfo, seconds_to_wait: Option<f64> },
}

impl StepEventKind {
    /// Código estable del tipo de evento.
    pub fn event_type(&self) -> &'static str {
        match self {
            StepEventKind::StepStart => "STEP_START",
            StepEventKind::StepRestarted { .. } => "STEP_RESTARTED",
            StepEventKind::LoadedInput { .. } => "LOADED_INPUT",
            StepEventKind::StepInput { .. } => "STEP_INPUT",
            StepEventKind::StepOutput { .. } => "STEP_OUTPUT",
            StepEventKind::AssetMaterialization { .. } => "ASSET_MATERIALIZATION",
            StepEventKind::StepExpectationResult { .. } => "STEP_EXPECTATION_RESULT",
            StepEventKind::HandledOutput { .. } => "HANDLED_OUTPUT",
            StepEventKind::StepSuccess { .. } => "STEP_SUCCESS",
            StepEventKind::StepFailure { .. } => "STEP_FAILURE",
            StepEventKind::StepUpForRetry { .. } => "STEP_UP_FOR_RETRY",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self,
                 StepEventKind::StepSuccess { .. } | StepEventKind::StepFailure { .. } | StepEventKind::StepUpForRetry { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepEvent {
    pub run_id: Uuid,
    pub step_key: String,
    pub solid_handle: String,
    pub message: String,
    pub kind: StepEventKind,
    pub ts: DateTime<Utc>, // metadato (no participa en comparaciones de contrato)
}

impl StepEvent {
    fn from_context(ctx: &StepExecutionContext, kind: StepEventKind, message: String) -> Self {
        Self { run_id: ctx.run_id(),
               step_key: ctx.step().key.clone(),
               solid_handle: ctx.step().solid_handle.to_string(),
               message,
               kind,
               ts: Utc::now() }
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    pub fn step_start(ctx: &StepExecutionContext) -> Self {
        let message = format!("Started execution of step \"{}\".", ctx.step().key);
        Self::from_context(ctx, StepEventKind::StepStart, message)
    }

    pub fn step_restarted(ctx: &StepExecutionContext, previous_attempts: u32) -> Self {
        let message = format!("Started re-execution (attempt # {}) of step \"{}\".",
                              previous_attempts + 1,
                              ctx.step().key);
        Self::from_context(ctx, StepEventKind::StepRestarted { previous_attempts }, message)
    }

    pub fn loaded_input(ctx: &StepExecutionContext,
                        input_name: &str,
                        manager_key: &str,
                        upstream: Option<&StepOutputHandle>)
                        -> Self {
        let message = match upstream {
            Some(h) => format!("Loaded input \"{input_name}\" using input manager \"{manager_key}\", from output \"{}\" of step \"{}\"",
                               h.output_name, h.step_key),
            None => format!("Loaded input \"{input_name}\" using input manager \"{manager_key}\""),
        };
        Self::from_context(ctx,
                           StepEventKind::LoadedInput { input_name: input_name.to_string(),
                                                        manager_key: manager_key.to_string(),
                                                        upstream_step_key: upstream.map(|h| h.step_key.clone()),
                                                        upstream_output_name: upstream.map(|h| h.output_name.clone()) },
                           message)
    }

    pub fn step_input(ctx: &StepExecutionContext, input_name: &str, type_check: TypeCheckData) -> Self {
        let message = if type_check.success {
            format!("Got input \"{input_name}\" of type \"{}\". (Type check passed).", type_check.label)
        } else {
            format!("Got input \"{input_name}\" of type \"{}\". (Type check failed).", type_check.label)
        };
        Self::from_context(ctx,
                           StepEventKind::StepInput { input_name: input_name.to_string(),
                                                      type_check },
                           message)
    }

    pub fn step_output(ctx: &StepExecutionContext,
                       handle: StepOutputHandle,
                       type_check: TypeCheckData,
                       version: Option<String>,
                       metadata_entries: Vec<MetadataEntry>)
                       -> Self {
        let status = if type_check.success { "passed" } else { "failed" };
        let message = match &handle.mapping_key {
            Some(key) => format!("Yielded output \"{}\" mapping key \"{key}\". (Type check {status}).", handle.output_name),
            None => format!("Yielded output \"{}\". (Type check {status}).", handle.output_name),
        };
        Self::from_context(ctx,
                           StepEventKind::StepOutput { handle,
                                                       type_check,
                                                       version,
                                                       metadata_entries },
                           message)
    }

    pub fn materialization(ctx: &StepExecutionContext,
                           materialization: AssetMaterialization,
                           input_assets: Vec<AssetPartitions>)
                           -> Self {
        let message = match &materialization.partition {
            Some(p) => format!("Materialized value {} (partition {p}).", materialization.asset_key),
            None => format!("Materialized value {}.", materialization.asset_key),
        };
        Self::from_context(ctx,
                           StepEventKind::AssetMaterialization { materialization,
                                                                 input_assets },
                           message)
    }

    pub fn expectation_result(ctx: &StepExecutionContext, expectation: ExpectationResult) -> Self {
        let label = expectation.label.clone().unwrap_or_default();
        let message = if expectation.success {
            format!("Expectation {label} passed.")
        } else {
            format!("Expectation {label} failed.")
        };
        Self::from_context(ctx, StepEventKind::StepExpectationResult { expectation }, message)
    }

    pub fn handled_output(ctx: &StepExecutionContext,
                          output_name: &str,
                          manager_key: &str,
                          metadata_entries: Vec<MetadataEntry>)
                          -> Self {
        let message = format!("Handled output \"{output_name}\" using IO manager \"{manager_key}\"");
        Self::from_context(ctx,
                           StepEventKind::HandledOutput { output_name: output_name.to_string(),
                                                          manager_key: manager_key.to_string(),
                                                          metadata_entries },
                           message)
    }

    pub fn step_success(ctx: &StepExecutionContext, duration_ms: f64) -> Self {
        let message = format!("Finished execution of step \"{}\" in {duration_ms:.2}ms.", ctx.step().key);
        Self::from_context(ctx, StepEventKind::StepSuccess { duration_ms }, message)
    }

    pub fn step_failure(ctx: &StepExecutionContext, error: &StepError) -> Self {
        let user_failure = match error {
            StepError::Failure(f) => Some(f.clone()),
            _ => None,
        };
        let message = format!("Execution of step \"{}\" failed.", ctx.step().key);
        Self::from_context(ctx,
                           StepEventKind::StepFailure { error: ErrorInfo::from_error(error),
                                                        error_class: error.class(),
                                                        user_failure },
                           message)
    }

    pub fn step_up_for_retry(ctx: &StepExecutionContext, error: &StepError, seconds_to_wait: Option<f64>) -> Self {
        let message = format!("Execution of step \"{}\" failed and has requested a retry.", ctx.step().key);
        Self::from_context(ctx,
                           StepEventKind::StepUpForRetry { error: ErrorInfo::from_error(error),
                                                           seconds_to_wait },
                           message)
    }
}
