//! Nodo del plan de ejecución y fuentes de sus inputs.
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::StepExecutionContext;
use crate::errors::StepError;
use crate::event::StepEvent;
use crate::model::{AssetPartitions, SolidHandle};

use super::SolidDefinition;

/// Lo que produce una fuente de input: eventos a reenviar o el valor resuelto.
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    Event(StepEvent),
    Value(Value),
}

pub type InputItemStream<'a> = Box<dyn Iterator<Item = Result<InputItem, StepError>> + 'a>;

/// Fuente polimórfica de un input (output upstream, config, default, ...).
///
/// Contrato: el stream produce cero o más eventos y exactamente un valor.
pub trait StepInputSource: Send + Sync + fmt::Debug {
    fn load_input_object<'a>(&'a self, ctx: &'a StepExecutionContext, input_name: &'a str) -> InputItemStream<'a>;

    /// Assets (y particiones) que toca este input.
    fn asset_partitions(&self, _ctx: &StepExecutionContext) -> Vec<AssetPartitions> {
        vec![]
    }
}

#[derive(Debug, Clone)]
pub struct StepInput {
    pub name: String,
    pub source: Arc<dyn StepInputSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutput {
    pub name: String,
    pub is_required: bool,
    pub is_dynamic: bool,
}

/// Nodo del plan. Inmutable durante la ejecución.
#[derive(Debug, Clone)]
pub struct ExecutionStep {
    pub key: String,
    pub solid_handle: SolidHandle,
    pub step_inputs: Vec<StepInput>,
    pub step_outputs: Vec<StepOutput>,
}

impl ExecutionStep {
    /// Construye el step de un solid; los outputs se derivan de su definición.
    pub fn for_solid(key: impl Into<String>, solid_handle: SolidHandle, solid_def: &SolidDefinition) -> Self {
        let step_outputs = solid_def.output_defs
                                    .iter()
                                    .map(|d| StepOutput { name: d.name.clone(),
                                                          is_required: d.is_required,
                                                          is_dynamic: d.is_dynamic })
                                    .collect();
        Self { key: key.into(),
               solid_handle,
               step_inputs: vec![],
               step_outputs }
    }

    pub fn with_input<S>(mut self, name: impl Into<String>, source: S) -> Self
        where S: StepInputSource + 'static
    {
        self.step_inputs.push(StepInput { name: name.into(),
                                          source: Arc::new(source) });
        self
    }

    pub fn has_step_output(&self, name: &str) -> bool {
        self.step_output_named(name).is_some()
    }

    pub fn step_output_named(&self, name: &str) -> Option<&StepOutput> {
        self.step_outputs.iter().find(|o| o.name == name)
    }

    pub fn step_input_named(&self, name: &str) -> Option<&StepInput> {
        self.step_inputs.iter().find(|i| i.name == name)
    }

    pub fn output_names(&self) -> Vec<String> {
        self.step_outputs.iter().map(|o| o.name.clone()).collect()
    }
}
