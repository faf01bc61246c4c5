//! Demo: ejecuta un pipeline de dos steps (`load_numbers` → `sum_numbers`)
//! con la configuración del proceso e imprime los eventos como JSON.
use std::error::Error;

use serde_json::json;

use stepflow::stepflow_adapters::types::{int, list};
use stepflow::stepflow_adapters::{FromDefaultValue, FromStepOutput};
use stepflow::stepflow_core::event::{EventStore, InMemoryEventStore};
use stepflow::stepflow_core::{compute_fn, ExpectationResult, InputDefinition, Output, OutputDefinition, SolidHandle,
                              StepOutputHandle};
use stepflow::{context_builder, run_step, settings, ExecutionStep, RunResources, SolidDefinition};

fn load_numbers() -> SolidDefinition {
    SolidDefinition::new("load_numbers",
                         compute_fn(|_, inputs| {
                             let seed = inputs["seed"].as_i64().unwrap_or_default();
                             Ok(vec![Output::new("numbers", json!((seed..seed + 5).collect::<Vec<_>>())).into()])
                         })).input(InputDefinition::new("seed", int()))
                            .output(OutputDefinition::new("numbers", list(int())))
                            .version("1")
}

fn sum_numbers() -> SolidDefinition {
    SolidDefinition::new("sum_numbers",
                         compute_fn(|_, inputs| {
                             let total: i64 = inputs["numbers"].as_array()
                                                               .map(|items| items.iter().filter_map(|v| v.as_i64()).sum())
                                                               .unwrap_or_default();
                             Ok(vec![ExpectationResult::new(total > 0, "positive_total").into(),
                                     Output::new("total", json!(total)).into()])
                         })).input(InputDefinition::new("numbers", list(int())))
                            .output(OutputDefinition::new("total", int()))
                            .version("1")
}

fn main() -> Result<(), Box<dyn Error>> {
    let settings = settings().map_err(|e| e.to_string())?;
    let resources = RunResources::from_settings(settings)?;
    let mut store = InMemoryEventStore::default();

    let loader = load_numbers();
    let load_step = ExecutionStep::for_solid("load_numbers", SolidHandle::new("load_numbers", None), &loader)
        .with_input("seed", FromDefaultValue(json!(1)));
    let ctx = context_builder(load_step, loader, settings, &resources).pipeline_name("demo_sum").build();
    run_step(&ctx, 0, &mut store)?;

    let summer = sum_numbers();
    let sum_step = ExecutionStep::for_solid("sum_numbers", SolidHandle::new("sum_numbers", None), &summer)
        .with_input("numbers", FromStepOutput::new(StepOutputHandle::new("load_numbers", "numbers")));
    let ctx = context_builder(sum_step, summer, settings, &resources).pipeline_name("demo_sum").build();
    run_step(&ctx, 0, &mut store)?;

    for record in store.list(resources.run_id) {
        println!("{}", serde_json::to_string(&record.event)?);
    }
    Ok(())
}
