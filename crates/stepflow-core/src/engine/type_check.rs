//! Adaptador de type checks para inputs y outputs.
//!
//! El checker es código de usuario: se ejecuta bajo `guard` y cualquier error
//! (incluidas las señales de control) se envuelve en `StepError::TypeCheck`.
//! Si el check no pasa, el evento con el resultado se emite antes del error.
use std::iter;

use serde_json::Value;

use crate::errors::{StepError, UserCodeError};
use crate::event::StepEvent;
use crate::model::{SolidOutput, StepOutputHandle, TypeCheck, TypeCheckData, TypeCheckReturn};
use crate::step::{runtime_type_name, RuntimeType};

use super::{guard, EventStream, StepExecutionContext};

/// Normaliza el retorno del checker a un `TypeCheck`.
pub(crate) fn do_type_check(ctx: &StepExecutionContext,
                            runtime_type: &dyn RuntimeType,
                            value: &Value)
                            -> Result<TypeCheck, UserCodeError> {
    let returned = guard(|| runtime_type.type_check(ctx, value))?;
    Ok(match returned {
        TypeCheckReturn::Check(check) => check,
        TypeCheckReturn::Bool(success) => TypeCheck { success,
                                                      description: None,
                                                      metadata_entries: vec![] },
        TypeCheckReturn::Malformed { returned_type } => TypeCheck::failed(format!(
            "Type checks must return TypeCheck. Type check for type {} returned value of type {returned_type} when checking runtime value of type {}.",
            runtime_type.display_name(),
            runtime_type_name(value)
        )),
    })
}

pub(crate) fn input_type_check<'a>(ctx: &'a StepExecutionContext, input_name: String, value: Value) -> EventStream<'a> {
    let Some(input_def) = ctx.solid_def().input_def_named(&input_name) else {
        return Box::new(iter::once(Err(StepError::Invariant(format!("input \"{input_name}\" has no definition")))));
    };
    let runtime_type = input_def.runtime_type.as_ref();
    let check = match do_type_check(ctx, runtime_type, &value) {
        Ok(check) => check,
        Err(e) => {
            let message = format!("Error occurred while type-checking input \"{input_name}\" of solid \"{}\", with runtime type {} and declared type {}",
                                  ctx.step().solid_handle,
                                  runtime_type_name(&value),
                                  runtime_type.display_name());
            return Box::new(iter::once(Err(StepError::TypeCheck { message,
                                                                  source: e.into_boxed() })));
        }
    };
    let event = StepEvent::step_input(ctx, &input_name, TypeCheckData::from_check(&input_name, &check));
    if check.success {
        return Box::new(iter::once(Ok(event)));
    }
    let description = format!("Type check failed for step input \"{input_name}\" - expected type \"{}\". Description: {}.",
                              runtime_type.display_name(),
                              check.description.as_deref().unwrap_or("none"));
    let err = StepError::TypeCheckDidNotPass { description,
                                               type_name: runtime_type.display_name(),
                                               metadata_entries: check.metadata_entries };
    Box::new([Ok(event), Err(err)].into_iter())
}

pub(crate) fn output_type_check<'a>(ctx: &'a StepExecutionContext,
                                    handle: StepOutputHandle,
                                    output: &SolidOutput,
                                    version: Option<String>)
                                    -> EventStream<'a> {
    let Some(output_def) = ctx.solid_def().output_def_named(output.output_name()) else {
        return Box::new(iter::once(Err(StepError::Invariant(format!("output \"{}\" has no definition",
                                                                    output.output_name())))));
    };
    let runtime_type = output_def.runtime_type.as_ref();
    let check = match do_type_check(ctx, runtime_type, output.value()) {
        Ok(check) => check,
        Err(e) => {
            let message = format!("Error occurred while type-checking output \"{}\" of solid \"{}\", with runtime type {} and declared type {}",
                                  output.output_name(),
                                  ctx.step().solid_handle,
                                  runtime_type_name(output.value()),
                                  runtime_type.display_name());
            return Box::new(iter::once(Err(StepError::TypeCheck { message,
                                                                  source: e.into_boxed() })));
        }
    };
    let data = TypeCheckData::from_check(&handle.output_name, &check);
    let description = format!("Type check failed for step output \"{}\" - expected type \"{}\".",
                              handle.output_name,
                              runtime_type.display_name());
    let event = StepEvent::step_output(ctx, handle, data, version, output.plain_metadata_entries());
    if check.success {
        return Box::new(iter::once(Ok(event)));
    }
    let err = StepError::TypeCheckDidNotPass { description,
                                               type_name: runtime_type.display_name(),
                                               metadata_entries: check.metadata_entries };
    Box::new([Ok(event), Err(err)].into_iter())
}
