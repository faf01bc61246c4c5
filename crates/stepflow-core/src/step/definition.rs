use std::fmt;
use std::sync::Arc;

use crate::constants::DEFAULT_IO_MANAGER_KEY;
use crate::model::AssetPartitions;
use crate::storage::OutputContext;

use super::{ComputeFn, RuntimeType};

/// Claim de asset declarado por un output (independiente del backend).
pub type AssetFn = Arc<dyn Fn(&OutputContext) -> Option<AssetPartitions> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct InputDefinition {
    pub name: String,
    pub runtime_type: Arc<dyn RuntimeType>,
}

impl InputDefinition {
    pub fn new(name: impl Into<String>, runtime_type: Arc<dyn RuntimeType>) -> Self {
        Self { name: name.into(),
               runtime_type }
    }
}

#[derive(Clone)]
pub struct OutputDefinition {
    pub name: String,
    pub runtime_type: Arc<dyn RuntimeType>,
    pub is_required: bool,
    pub is_dynamic: bool,
    pub io_manager_key: String,
    asset_fn: Option<AssetFn>,
}

impl OutputDefinition {
    /// Output estático, requerido, almacenado con el backend por defecto.
    pub fn new(name: impl Into<String>, runtime_type: Arc<dyn RuntimeType>) -> Self {
        Self { name: name.into(),
               runtime_type,
               is_required: true,
               is_dynamic: false,
               io_manager_key: DEFAULT_IO_MANAGER_KEY.to_string(),
               asset_fn: None }
    }

    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.is_dynamic = true;
        self
    }

    pub fn io_manager(mut self, key: impl Into<String>) -> Self {
        self.io_manager_key = key.into();
        self
    }

    pub fn asset_fn<F>(mut self, f: F) -> Self
        where F: Fn(&OutputContext) -> Option<AssetPartitions> + Send + Sync + 'static
    {
        self.asset_fn = Some(Arc::new(f));
        self
    }

    /// Atajo para un claim constante.
    pub fn asset_partitions(self, asset_partitions: AssetPartitions) -> Self {
        self.asset_fn(move |_| Some(asset_partitions.clone()))
    }

    pub fn asset_partitions_for(&self, ctx: &OutputContext) -> Option<AssetPartitions> {
        self.asset_fn.as_ref().and_then(|f| f(ctx))
    }
}

impl fmt::Debug for OutputDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputDefinition")
         .field("name", &self.name)
         .field("runtime_type", &self.runtime_type.key())
         .field("is_required", &self.is_required)
         .field("is_dynamic", &self.is_dynamic)
         .field("io_manager_key", &self.io_manager_key)
         .field("has_asset_fn", &self.asset_fn.is_some())
         .finish()
    }
}

/// Definición del nodo de cómputo (solid) que implementa un step.
#[derive(Clone)]
pub struct SolidDefinition {
    pub name: String,
    pub input_defs: Vec<InputDefinition>,
    pub output_defs: Vec<OutputDefinition>,
    pub compute_fn: Arc<dyn ComputeFn>,
    /// Versión de código; sólo participa en el cálculo de versiones memoizadas.
    pub version: Option<String>,
}

impl SolidDefinition {
    pub fn new(name: impl Into<String>, compute_fn: Arc<dyn ComputeFn>) -> Self {
        Self { name: name.into(),
               input_defs: vec![],
               output_defs: vec![],
               compute_fn,
               version: None }
    }

    pub fn input(mut self, def: InputDefinition) -> Self {
        self.input_defs.push(def);
        self
    }

    pub fn output(mut self, def: OutputDefinition) -> Self {
        self.output_defs.push(def);
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn input_def_named(&self, name: &str) -> Option<&InputDefinition> {
        self.input_defs.iter().find(|d| d.name == name)
    }

    pub fn output_def_named(&self, name: &str) -> Option<&OutputDefinition> {
        self.output_defs.iter().find(|d| d.name == name)
    }
}

impl fmt::Debug for SolidDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolidDefinition")
         .field("name", &self.name)
         .field("input_defs", &self.input_defs)
         .field("output_defs", &self.output_defs)
         .field("version", &self.version)
         .finish()
    }
}
