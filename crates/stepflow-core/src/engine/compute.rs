//! Invocación del compute de usuario.
use crate::errors::{StepError, UserCodeError};
use crate::model::UserEvent;
use crate::step::{InputValues, UserEventStream};

use super::{guard, StepExecutionContext};

/// Stream de eventos del compute, con la frontera de errores activa en la
/// llamada inicial y en cada `next()` posterior.
pub(crate) struct ComputeStream<'a> {
    ctx: &'a StepExecutionContext,
    inputs: Option<InputValues>,
    inner: Option<UserEventStream<'a>>,
    done: bool,
}

impl<'a> ComputeStream<'a> {
    pub(crate) fn new(ctx: &'a StepExecutionContext, inputs: InputValues) -> Self {
        Self { ctx,
               inputs: Some(inputs),
               inner: None,
               done: false }
    }

    fn wrap(&self, err: UserCodeError) -> StepError {
        let ctx = self.ctx;
        err.escalate(|source| StepError::StepExecution { step_key: ctx.step().key.clone(),
                                                         solid: ctx.step().solid_handle.to_string(),
                                                         solid_def: ctx.solid_def().name.clone(),
                                                         source })
    }

    fn accept(&self, event: UserEvent) -> Result<UserEvent, StepError> {
        match event {
            UserEvent::Output(_)
            | UserEvent::DynamicOutput(_)
            | UserEvent::AssetMaterialization(_)
            | UserEvent::ExpectationResult(_) => Ok(event),
            other => Err(StepError::Invariant(format!("compute for solid \"{}\" yielded a {}; only Output, DynamicOutput, AssetMaterialization and ExpectationResult are allowed",
                                                      self.ctx.step().solid_handle,
                                                      other.type_name()))),
        }
    }
}

impl Iterator for ComputeStream<'_> {
    type Item = Result<UserEvent, StepError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.inner.is_none() {
            let ctx = self.ctx;
            let inputs = self.inputs.take().unwrap_or_default();
            match guard(|| Ok(ctx.solid_def().compute_fn.compute(ctx, inputs))) {
                Ok(stream) => self.inner = Some(stream),
                Err(e) => {
                    self.done = true;
                    return Some(Err(self.wrap(e)));
                }
            }
        }
        let inner = self.inner.as_mut()?;
        let pulled = guard(|| Ok(inner.next()));
        let item = match pulled {
            Ok(None) => None,
            Ok(Some(Ok(event))) => Some(self.accept(event)),
            Ok(Some(Err(e))) | Err(e) => Some(Err(self.wrap(e))),
        };
        self.done = !matches!(item, Some(Ok(_)));
        item
    }
}
