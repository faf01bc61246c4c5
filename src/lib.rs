//! Stepflow
//!
//! Crate fachada del ejecutor de steps:
//! - Reexporta `stepflow_core` (motor, eventos, contratos) y
//!   `stepflow_adapters` (backends, tipos y fuentes de input builtin).
//! - Expone `config` con la configuración del proceso (`EngineSettings`).
//! - `RunResources` y `context_builder` arman contextos de ejecución
//!   coherentes para todos los steps de un mismo run.

pub mod config;

use std::sync::Arc;

use uuid::Uuid;

pub use config::{settings, EngineSettings, SettingsError};
pub use stepflow_adapters;
pub use stepflow_core;
pub use stepflow_core::{execute_step, run_step, ExecutionStep, RunConfig, SolidDefinition, StepError, StepEvent,
                        StepEventKind, StepExecutionContext, StepExecutionContextBuilder};

use stepflow_core::constants::DEFAULT_IO_MANAGER_KEY;
use stepflow_core::IoManager;

/// Recursos compartidos por todos los steps de un run.
#[derive(Debug, Clone)]
pub struct RunResources {
    pub run_id: Uuid,
    pub run_config: Arc<RunConfig>,
    /// Backend registrado bajo la clave por defecto.
    pub io_manager: Arc<dyn IoManager>,
}

impl RunResources {
    /// Run nuevo: carga la config del run y crea el backend por defecto.
    pub fn from_settings(settings: &EngineSettings) -> Result<Self, SettingsError> {
        Ok(Self { run_id: Uuid::new_v4(),
                  run_config: Arc::new(settings.load_run_config()?),
                  io_manager: settings.default_io_manager() })
    }
}

/// Builder de contexto con la configuración del proceso aplicada.
///
/// El llamador todavía puede registrar backends adicionales o tags antes de
/// `build()`.
pub fn context_builder(step: impl Into<Arc<ExecutionStep>>,
                       solid_def: impl Into<Arc<SolidDefinition>>,
                       settings: &EngineSettings,
                       resources: &RunResources)
                       -> StepExecutionContextBuilder {
    StepExecutionContext::builder(step, solid_def).run_id(resources.run_id)
                                                  .run_config(resources.run_config.clone())
                                                  .memoized(settings.memoize)
                                                  .capture_outputs(settings.capture_outputs)
                                                  .io_manager(DEFAULT_IO_MANAGER_KEY, resources.io_manager.clone())
}
