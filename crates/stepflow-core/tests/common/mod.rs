#![allow(dead_code)]

use std::sync::Arc;

use stepflow_adapters::InMemoryIoManager;
use stepflow_core::constants::DEFAULT_IO_MANAGER_KEY;
use stepflow_core::event::{StepEvent, StepEventKind};
use stepflow_core::model::{SolidHandle, TypeCheckData};
use stepflow_core::{execute_step, ExecutionStep, SolidDefinition, StepError, StepExecutionContext,
                    StepExecutionContextBuilder};

pub const STEP_KEY: &str = "step_one";

/// Contexto con el step `step_one` (solid `solid_one`) y un backend en
/// memoria como `io_manager`.
pub fn context(solid_def: SolidDefinition) -> StepExecutionContext {
    context_with(solid_def, |step| step, |builder| builder)
}

pub fn context_with<S, B>(solid_def: SolidDefinition, step: S, builder: B) -> StepExecutionContext
    where S: FnOnce(ExecutionStep) -> ExecutionStep,
          B: FnOnce(StepExecutionContextBuilder) -> StepExecutionContextBuilder
{
    let base = ExecutionStep::for_solid(STEP_KEY, SolidHandle::new("solid_one", None), &solid_def);
    let defaults = StepExecutionContext::builder(step(base), solid_def)
        .io_manager(DEFAULT_IO_MANAGER_KEY, Arc::new(InMemoryIoManager::new()));
    builder(defaults).build()
}

/// Consume la secuencia completa: eventos emitidos y el error terminal, si lo hubo.
pub fn run(ctx: &StepExecutionContext) -> (Vec<StepEvent>, Option<StepError>) {
    run_attempt(ctx, 0)
}

pub fn run_attempt(ctx: &StepExecutionContext, prior_attempts: u32) -> (Vec<StepEvent>, Option<StepError>) {
    let mut events = Vec::new();
    for item in execute_step(ctx, prior_attempts) {
        match item {
            Ok(event) => events.push(event),
            Err(err) => return (events, Some(err)),
        }
    }
    (events, None)
}

pub fn event_types(events: &[StepEvent]) -> Vec<&'static str> {
    events.iter().map(StepEvent::event_type).collect()
}

/// Type checks de los eventos `StepOutput`, en orden.
pub fn output_checks(events: &[StepEvent]) -> Vec<(String, Option<String>, TypeCheckData)> {
    events.iter()
          .filter_map(|e| match &e.kind {
              StepEventKind::StepOutput { handle, type_check, .. } => {
                  Some((handle.output_name.clone(), handle.mapping_key.clone(), type_check.clone()))
              }
              _ => None,
          })
          .collect()
}
