//! Contrato del cómputo de usuario.
//!
//! El cómputo devuelve un stream perezoso de `UserEvent`: el usuario puede
//! fallar tanto al construirlo como en cualquier `next()` posterior.
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::engine::StepExecutionContext;
use crate::errors::UserCodeError;
use crate::model::UserEvent;

/// Inputs resueltos, en orden de declaración.
pub type InputValues = IndexMap<String, Value>;

pub type UserEventStream<'a> = Box<dyn Iterator<Item = Result<UserEvent, UserCodeError>> + 'a>;

pub trait ComputeFn: Send + Sync {
    fn compute<'a>(&'a self, ctx: &'a StepExecutionContext, inputs: InputValues) -> UserEventStream<'a>;
}

struct FnCompute<F>(F);

impl<F> ComputeFn for FnCompute<F>
    where F: Fn(&StepExecutionContext, &InputValues) -> Result<Vec<UserEvent>, UserCodeError> + Send + Sync
{
    fn compute<'a>(&'a self, ctx: &'a StepExecutionContext, inputs: InputValues) -> UserEventStream<'a> {
        match (self.0)(ctx, &inputs) {
            Ok(events) => Box::new(events.into_iter().map(Ok)),
            Err(e) => Box::new(std::iter::once(Err(e))),
        }
    }
}

struct StreamCompute<F>(F);

impl<F> ComputeFn for StreamCompute<F>
    where F: Fn(&StepExecutionContext, InputValues) -> UserEventStream<'static> + Send + Sync
{
    fn compute<'a>(&'a self, ctx: &'a StepExecutionContext, inputs: InputValues) -> UserEventStream<'a> {
        (self.0)(ctx, inputs)
    }
}

/// Cómputo que produce todos sus eventos de una vez.
pub fn compute_fn<F>(f: F) -> Arc<dyn ComputeFn>
    where F: Fn(&StepExecutionContext, &InputValues) -> Result<Vec<UserEvent>, UserCodeError> + Send + Sync + 'static
{
    Arc::new(FnCompute(f))
}

/// Cómputo perezoso; el iterador devuelto se consume bajo la frontera de
/// errores del motor.
pub fn stream_compute_fn<F>(f: F) -> Arc<dyn ComputeFn>
    where F: Fn(&StepExecutionContext, InputValues) -> UserEventStream<'static> + Send + Sync + 'static
{
    Arc::new(StreamCompute(f))
}
