//! Clasificación de los outputs producidos por el compute.
use std::collections::{HashMap, HashSet};

use log::info;
use serde_json::Value;

use crate::errors::StepError;
use crate::model::{Output, UserEvent};

use super::StepExecutionContext;

/// Valida forma y aridad de los outputs del compute.
///
/// Los eventos que no son outputs pasan sin cambios. Al agotarse la secuencia
/// subyacente, emite un `Output` vacío para cada output de tipo `Nothing`
/// (opcional o no) que no se produjo, o falla si falta cualquier otro
/// output requerido.
pub(crate) struct OutputValidator<'a, I> {
    ctx: &'a StepExecutionContext,
    inner: I,
    seen_outputs: HashSet<String>,
    seen_mapping_keys: HashMap<String, HashSet<String>>,
    trailing: Option<std::vec::IntoIter<Result<UserEvent, StepError>>>,
    done: bool,
}

impl<'a, I> OutputValidator<'a, I>
    where I: Iterator<Item = Result<UserEvent, StepError>>
{
    pub(crate) fn new(ctx: &'a StepExecutionContext, inner: I) -> Self {
        Self { ctx,
               inner,
               seen_outputs: HashSet::new(),
               seen_mapping_keys: HashMap::new(),
               trailing: None,
               done: false }
    }

    fn check(&mut self, event: UserEvent) -> Result<UserEvent, StepError> {
        let (output_name, mapping_key) = match &event {
            UserEvent::Output(o) => (o.output_name.clone(), None),
            UserEvent::DynamicOutput(o) => (o.output_name.clone(), Some(o.mapping_key.clone())),
            _ => return Ok(event),
        };
        let step = self.ctx.step();
        let solid = step.solid_handle.to_string();
        if !step.has_step_output(&output_name) {
            return Err(StepError::UndeclaredOutput { solid,
                                                     output_name,
                                                     available: step.output_names() });
        }
        let output_def = self.ctx
                             .solid_def()
                             .output_def_named(&output_name)
                             .ok_or_else(|| StepError::Invariant(format!("output \"{output_name}\" has no definition")))?;

        match mapping_key {
            None => {
                if self.seen_outputs.contains(&output_name) {
                    return Err(StepError::DuplicateOutput { solid, output_name });
                }
                if output_def.is_dynamic {
                    return Err(StepError::ExpectedDynamicOutput { solid, output_name });
                }
            }
            Some(mapping_key) => {
                if !output_def.is_dynamic {
                    return Err(StepError::UnexpectedDynamicOutput { solid, output_name });
                }
                let seen = self.seen_mapping_keys.entry(output_name.clone()).or_default();
                if !seen.insert(mapping_key.clone()) {
                    return Err(StepError::DuplicateMappingKey { solid,
                                                                output_name,
                                                                mapping_key });
                }
            }
        }
        self.seen_outputs.insert(output_name);
        Ok(event)
    }

    /// Outputs implícitos y faltantes, hasta el primer error inclusive.
    fn trailing_items(&self) -> Vec<Result<UserEvent, StepError>> {
        let step = self.ctx.step();
        let mut items = Vec::new();
        for step_output in &step.step_outputs {
            if self.seen_outputs.contains(&step_output.name) {
                continue;
            }
            let Some(output_def) = self.ctx.solid_def().output_def_named(&step_output.name) else {
                items.push(Err(StepError::Invariant(format!("output \"{}\" has no definition", step_output.name))));
                break;
            };
            if output_def.runtime_type.is_nothing() {
                info!("Emitting implicit Nothing for output \"{}\" on solid {}",
                      output_def.name, step.solid_handle);
                items.push(Ok(Output::new(&output_def.name, Value::Null).into()));
            } else if output_def.is_required {
                items.push(Err(StepError::OutputNotFound { solid: step.solid_handle.to_string(),
                                                           step_key: step.key.clone(),
                                                           output_name: output_def.name.clone() }));
                break;
            }
        }
        items
    }
}

impl<I> Iterator for OutputValidator<'_, I>
    where I: Iterator<Item = Result<UserEvent, StepError>>
{
    type Item = Result<UserEvent, StepError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.trailing.is_none() {
            match self.inner.next() {
                Some(Ok(event)) => {
                    let checked = self.check(event);
                    self.done = checked.is_err();
                    return Some(checked);
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => self.trailing = Some(self.trailing_items().into_iter()),
            }
        }
        let item = self.trailing.as_mut().and_then(Iterator::next);
        self.done = !matches!(item, Some(Ok(_)));
        item
    }
}
