use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use uuid::Uuid;

use crate::config::{RunConfig, SolidConfig};
use crate::constants::MEMOIZED_RUN_TAG;
use crate::errors::StepError;
use crate::model::{SolidHandle, StepOutputHandle};
use crate::step::{ExecutionStep, OutputDefinition, SolidDefinition};
use crate::storage::{InputContext, IoManager, OutputContext};

/// Contexto de ejecución de un step.
///
/// Agrupa todo lo que las etapas necesitan leer: el step y su solid, la
/// config del run, los tags, los backends de almacenamiento disponibles y las
/// versiones precalculadas. El único estado mutable es la captura opcional de
/// outputs (ejecución en proceso / tests).
pub struct StepExecutionContext {
    run_id: Uuid,
    pipeline_name: String,
    step: Arc<ExecutionStep>,
    solid_def: Arc<SolidDefinition>,
    run_config: Arc<RunConfig>,
    run_tags: BTreeMap<String, String>,
    io_managers: HashMap<String, Arc<dyn IoManager>>,
    output_versions: HashMap<StepOutputHandle, String>,
    output_capture: Option<RefCell<IndexMap<StepOutputHandle, Value>>>,
}

impl StepExecutionContext {
    pub fn builder(step: impl Into<Arc<ExecutionStep>>, solid_def: impl Into<Arc<SolidDefinition>>) -> StepExecutionContextBuilder {
        StepExecutionContextBuilder { run_id: None,
                                      pipeline_name: String::new(),
                                      step: step.into(),
                                      solid_def: solid_def.into(),
                                      run_config: Arc::new(RunConfig::default()),
                                      run_tags: BTreeMap::new(),
                                      io_managers: HashMap::new(),
                                      output_versions: HashMap::new(),
                                      capture_outputs: false }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    pub fn step(&self) -> &ExecutionStep {
        &self.step
    }

    pub fn solid_def(&self) -> &SolidDefinition {
        &self.solid_def
    }

    pub fn run_config(&self) -> &RunConfig {
        &self.run_config
    }

    pub fn run_tags(&self) -> &BTreeMap<String, String> {
        &self.run_tags
    }

    pub fn is_memoized_run(&self) -> bool {
        self.run_tags.contains_key(MEMOIZED_RUN_TAG)
    }

    pub fn io_manager(&self, key: &str) -> Option<&dyn IoManager> {
        self.io_managers.get(key).map(|m| m.as_ref())
    }

    /// Backend del output; su ausencia es un error de configuración.
    pub fn io_manager_for(&self, output_def: &OutputDefinition) -> Result<&dyn IoManager, StepError> {
        self.io_manager(&output_def.io_manager_key)
            .ok_or_else(|| StepError::MissingIoManager { step_key: self.step.key.clone(),
                                                         output_name: output_def.name.clone(),
                                                         manager_key: output_def.io_manager_key.clone() })
    }

    pub fn solid_config(&self, handle: &SolidHandle) -> Option<&SolidConfig> {
        self.run_config.solid_config(handle)
    }

    pub fn output_context(&self, handle: &StepOutputHandle) -> OutputContext {
        OutputContext { run_id: self.run_id,
                        step_key: handle.step_key.clone(),
                        name: handle.output_name.clone(),
                        mapping_key: handle.mapping_key.clone(),
                        solid_def_name: Some(self.solid_def.name.clone()),
                        config: self.solid_config(&self.step.solid_handle).and_then(|c| c.config.clone()),
                        version: self.resolve_version(handle) }
    }

    pub fn input_context(&self, input_name: &str, upstream: Option<&StepOutputHandle>) -> InputContext {
        InputContext { run_id: self.run_id,
                       step_key: self.step.key.clone(),
                       name: input_name.to_string(),
                       upstream_output: upstream.map(|h| OutputContext::for_upstream(self.run_id, h)),
                       config: self.solid_config(&self.step.solid_handle)
                                   .and_then(|c| c.inputs.get(input_name).cloned()) }
    }

    /// Versión precalculada del output; sólo en runs memoizados.
    pub fn resolve_version(&self, handle: &StepOutputHandle) -> Option<String> {
        if !self.is_memoized_run() {
            return None;
        }
        self.output_versions.get(handle).cloned()
    }

    pub(crate) fn capture_output(&self, handle: &StepOutputHandle, value: &Value) {
        if let Some(capture) = &self.output_capture {
            capture.borrow_mut().insert(handle.clone(), value.clone());
        }
    }

    /// Outputs capturados, en orden de producción. `None` si la captura no
    /// está habilitada.
    pub fn captured_outputs(&self) -> Option<IndexMap<StepOutputHandle, Value>> {
        self.output_capture.as_ref().map(|c| c.borrow().clone())
    }
}

pub struct StepExecutionContextBuilder {
    run_id: Option<Uuid>,
    pipeline_name: String,
    step: Arc<ExecutionStep>,
    solid_def: Arc<SolidDefinition>,
    run_config: Arc<RunConfig>,
    run_tags: BTreeMap<String, String>,
    io_managers: HashMap<String, Arc<dyn IoManager>>,
    output_versions: HashMap<StepOutputHandle, String>,
    capture_outputs: bool,
}

impl StepExecutionContextBuilder {
    pub fn run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn pipeline_name(mut self, name: impl Into<String>) -> Self {
        self.pipeline_name = name.into();
        self
    }

    pub fn run_config(mut self, run_config: impl Into<Arc<RunConfig>>) -> Self {
        self.run_config = run_config.into();
        self
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.run_tags.insert(key.into(), value.into());
        self
    }

    /// Marca (o desmarca) el run como memoizado.
    pub fn memoized(mut self, memoized: bool) -> Self {
        if memoized {
            self.run_tags.insert(MEMOIZED_RUN_TAG.to_string(), "true".to_string());
        } else {
            self.run_tags.remove(MEMOIZED_RUN_TAG);
        }
        self
    }

    pub fn io_manager(mut self, key: impl Into<String>, manager: Arc<dyn IoManager>) -> Self {
        self.io_managers.insert(key.into(), manager);
        self
    }

    pub fn output_versions(mut self, versions: HashMap<StepOutputHandle, String>) -> Self {
        self.output_versions = versions;
        self
    }

    pub fn capture_outputs(mut self, capture: bool) -> Self {
        self.capture_outputs = capture;
        self
    }

    pub fn build(self) -> StepExecutionContext {
        StepExecutionContext { run_id: self.run_id.unwrap_or_else(Uuid::new_v4),
                               pipeline_name: self.pipeline_name,
                               step: self.step,
                               solid_def: self.solid_def,
                               run_config: self.run_config,
                               run_tags: self.run_tags,
                               io_managers: self.io_managers,
                               output_versions: self.output_versions,
                               output_capture: self.capture_outputs.then(|| RefCell::new(IndexMap::new())) }
    }
}
