//! Materializers de tipo guiados por la config del run.
//!
//! Se recorre el handle del solid hacia la raíz; en cada nivel con config se
//! buscan specs `{output: spec}` para el output y se invoca el materializer
//! del tipo declarado una vez por spec.
use std::collections::BTreeMap;
use std::iter;
use std::rc::Rc;

use log::debug;
use serde_json::Value;

use crate::errors::{BoxError, StepError};
use crate::event::StepEvent;
use crate::model::{SolidOutput, UserEvent};

use super::{guard, EventStream, StepExecutionContext};

pub(crate) fn type_materializations<'a>(ctx: &'a StepExecutionContext, output: Rc<SolidOutput>) -> EventStream<'a> {
    let specs = ctx.step()
                   .solid_handle
                   .ancestors()
                   .filter_map(move |handle| ctx.solid_config(handle))
                   .flat_map(|solid_config| solid_config.outputs.iter());
    Box::new(specs.flat_map(move |spec| materialize_spec(ctx, &output, spec)))
}

fn materialize_spec<'a>(ctx: &'a StepExecutionContext,
                        output: &SolidOutput,
                        spec: &'a BTreeMap<String, Value>)
                        -> EventStream<'a> {
    let mut entries = spec.iter();
    let (config_output_name, spec_value) = match (entries.next(), entries.next()) {
        (Some(entry), None) => entry,
        _ => {
            return Box::new(iter::once(Err(StepError::Invariant(format!("output materializer spec must have exactly one key, found {}",
                                                                        spec.len())))))
        }
    };
    if config_output_name != output.output_name() {
        return Box::new(iter::empty());
    }

    let output_name = output.output_name();
    let Some(output_def) = ctx.solid_def().output_def_named(output_name) else {
        return Box::new(iter::once(Err(StepError::Invariant(format!("output \"{output_name}\" has no definition")))));
    };
    let runtime_type = output_def.runtime_type.as_ref();
    let wrap = |source: BoxError| StepError::TypeMaterialization { output_name: output_name.to_string(),
                                                                   solid: ctx.step().solid_handle.to_string(),
                                                                   solid_def: ctx.solid_def().name.clone(),
                                                                   source };
    let Some(materializer) = runtime_type.materializer() else {
        let err = wrap(format!("type {} has no materializer", runtime_type.display_name()).into());
        return Box::new(iter::once(Err(err)));
    };

    debug!("materializing output \"{output_name}\" of step {} with spec {spec_value}", ctx.step().key);
    let returned = match guard(|| materializer.materialize_runtime_values(ctx, spec_value, output.value())) {
        Ok(returned) => returned,
        Err(e) => return Box::new(iter::once(Err(wrap(e.into_boxed())))),
    };

    let mut events = Vec::with_capacity(returned.len());
    for item in returned {
        match item {
            UserEvent::AssetMaterialization(m) => events.push(Ok(StepEvent::materialization(ctx, m, vec![]))),
            other => {
                events.push(Err(StepError::InvalidTypeMaterialization { type_name: runtime_type.display_name(),
                                                                        value: format!("{other:?}"),
                                                                        value_type: other.type_name().to_string() }));
                break;
            }
        }
    }
    Box::new(events.into_iter())
}
