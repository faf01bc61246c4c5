//! Contrato de los backends de almacenamiento (IO managers).
//!
//! Un backend persiste el valor de un output y lo vuelve a cargar como input
//! de steps posteriores. El motor sólo interpreta lo que devuelve
//! `handle_output`; nunca toca el estado interno del backend.
use std::fmt;

use serde_json::Value;
use uuid::Uuid;

use crate::errors::UserCodeError;
use crate::model::{AssetPartitions, StepOutputHandle, UserEvent};

/// Describe el output que se está almacenando.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputContext {
    pub run_id: Uuid,
    pub step_key: String,
    pub name: String,
    pub mapping_key: Option<String>,
    pub solid_def_name: Option<String>,
    /// Config del solid que produce el output, si existe.
    pub config: Option<Value>,
    pub version: Option<String>,
}

impl OutputContext {
    /// Contexto mínimo de un output upstream (usado al cargar inputs).
    pub fn for_upstream(run_id: Uuid, handle: &StepOutputHandle) -> Self {
        Self { run_id,
               step_key: handle.step_key.clone(),
               name: handle.output_name.clone(),
               mapping_key: handle.mapping_key.clone(),
               solid_def_name: None,
               config: None,
               version: None }
    }

    pub fn handle(&self) -> StepOutputHandle {
        StepOutputHandle { step_key: self.step_key.clone(),
                           output_name: self.name.clone(),
                           mapping_key: self.mapping_key.clone() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputContext {
    pub run_id: Uuid,
    pub step_key: String,
    pub name: String,
    pub upstream_output: Option<OutputContext>,
    pub config: Option<Value>,
}

pub trait IoManager: Send + Sync + fmt::Debug {
    /// Persiste `value`. Puede devolver materializaciones y entradas de
    /// metadata (planas o dirigidas a una partición); cualquier otra variante
    /// es una violación de contrato.
    fn handle_output(&self, ctx: &OutputContext, value: &Value) -> Result<Vec<UserEvent>, UserCodeError>;

    fn load_input(&self, ctx: &InputContext) -> Result<Value, UserCodeError>;

    /// Claim de asset del backend para el output. No debe coincidir con un
    /// claim del propio `OutputDefinition`.
    fn output_asset_partitions(&self, _ctx: &OutputContext) -> Option<AssetPartitions> {
        None
    }
}
