//! Fuentes de input builtin.
use std::iter;

use serde_json::Value;

use stepflow_core::constants::DEFAULT_IO_MANAGER_KEY;
use stepflow_core::engine::{guard, StepExecutionContext};
use stepflow_core::errors::StepError;
use stepflow_core::event::StepEvent;
use stepflow_core::model::{AssetPartitions, StepOutputHandle};
use stepflow_core::step::{InputItem, InputItemStream, OutputDefinition, StepInputSource};
use stepflow_core::storage::OutputContext;

/// Carga el input desde el output de un step upstream, a través del backend
/// que lo almacenó. Emite `LoadedInput` antes del valor.
///
/// Los assets del input son los que reclama el output upstream: el claim de
/// su definición (si se registró con `upstream_definition`) y el de su
/// backend, más los agregados explícitamente con `asset`.
#[derive(Debug, Clone)]
pub struct FromStepOutput {
    upstream: StepOutputHandle,
    manager_key: String,
    upstream_def: Option<OutputDefinition>,
    asset_partitions: Option<AssetPartitions>,
}

impl FromStepOutput {
    pub fn new(upstream: StepOutputHandle) -> Self {
        Self { upstream,
               manager_key: DEFAULT_IO_MANAGER_KEY.to_string(),
               upstream_def: None,
               asset_partitions: None }
    }

    pub fn io_manager(mut self, key: impl Into<String>) -> Self {
        self.manager_key = key.into();
        self
    }

    /// Definición del output upstream; su `asset_fn` aporta claims de input.
    pub fn upstream_definition(mut self, output_def: OutputDefinition) -> Self {
        self.upstream_def = Some(output_def);
        self
    }

    /// Asset (y particiones) adicional que el output upstream representa.
    pub fn asset(mut self, asset_partitions: AssetPartitions) -> Self {
        self.asset_partitions = Some(asset_partitions);
        self
    }

    fn load(&self, ctx: &StepExecutionContext, input_name: &str) -> Vec<Result<InputItem, StepError>> {
        let Some(manager) = ctx.io_manager(&self.manager_key) else {
            return vec![Err(StepError::Config(format!("IO manager \"{}\" required by input \"{input_name}\" of step \"{}\" was not provided",
                                                      self.manager_key,
                                                      ctx.step().key)))];
        };
        let input_context = ctx.input_context(input_name, Some(&self.upstream));
        let loaded = guard(|| manager.load_input(&input_context)).map_err(|e| {
                         e.escalate(|source| StepError::LoadInput { step_key: ctx.step().key.clone(),
                                                                    input_name: input_name.to_string(),
                                                                    source })
                     });
        match loaded {
            Ok(value) => {
                let event = StepEvent::loaded_input(ctx, input_name, &self.manager_key, Some(&self.upstream));
                vec![Ok(InputItem::Event(event)), Ok(InputItem::Value(value))]
            }
            Err(e) => vec![Err(e)],
        }
    }
}

impl StepInputSource for FromStepOutput {
    fn load_input_object<'a>(&'a self, ctx: &'a StepExecutionContext, input_name: &'a str) -> InputItemStream<'a> {
        Box::new(iter::once_with(move || self.load(ctx, input_name)).flatten())
    }

    fn asset_partitions(&self, ctx: &StepExecutionContext) -> Vec<AssetPartitions> {
        let upstream_context = OutputContext::for_upstream(ctx.run_id(), &self.upstream);
        let from_definition = self.upstream_def
                                  .as_ref()
                                  .and_then(|def| def.asset_partitions_for(&upstream_context));
        let from_manager = ctx.io_manager(&self.manager_key)
                              .and_then(|manager| manager.output_asset_partitions(&upstream_context));
        from_definition.into_iter()
                       .chain(from_manager)
                       .chain(self.asset_partitions.iter().cloned())
                       .collect()
    }
}

/// Toma el valor de `solids.<handle>.inputs.<input>` en la config del run.
#[derive(Debug, Clone, Copy, Default)]
pub struct FromConfig;

impl StepInputSource for FromConfig {
    fn load_input_object<'a>(&'a self, ctx: &'a StepExecutionContext, input_name: &'a str) -> InputItemStream<'a> {
        let item = ctx.solid_config(&ctx.step().solid_handle)
                      .and_then(|c| c.inputs.get(input_name).cloned())
                      .map(InputItem::Value)
                      .ok_or_else(|| {
                          StepError::Config(format!("missing config value for input \"{input_name}\" of solid \"{}\"",
                                                    ctx.step().solid_handle))
                      });
        Box::new(iter::once(item))
    }
}

#[derive(Debug, Clone)]
pub struct FromDefaultValue(pub Value);

impl StepInputSource for FromDefaultValue {
    fn load_input_object<'a>(&'a self, _ctx: &'a StepExecutionContext, _input_name: &'a str) -> InputItemStream<'a> {
        Box::new(iter::once(Ok(InputItem::Value(self.0.clone()))))
    }
}
