use std::fs;
use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use stepflow_adapters::types::{any, float, int, list, nothing, nullable, predicate, string, with_materializer,
                               JsonFileMaterializer};
use stepflow_adapters::{FromConfig, FromStepOutput, FsIoManager, InMemoryIoManager};
use stepflow_core::constants::DEFAULT_IO_MANAGER_KEY;
use stepflow_core::event::StepEventKind;
use stepflow_core::model::{AssetPartitions, MetadataValue, Output, SolidHandle, StepOutputHandle, TypeCheckReturn, UserEvent};
use stepflow_core::storage::{IoManager, OutputContext};
use stepflow_core::{compute_fn, execute_step, ExecutionStep, InputDefinition, OutputDefinition, RunConfig,
                    RuntimeType, SolidDefinition, StepError, StepExecutionContext};

fn scratch_dir() -> std::path::PathBuf {
    std::env::temp_dir().join(format!("stepflow-adapters-{}", Uuid::new_v4()))
}

fn bare_context() -> StepExecutionContext {
    let solid = SolidDefinition::new("noop", compute_fn(|_, _| Ok(vec![])));
    let step = ExecutionStep::for_solid("s", SolidHandle::new("noop", None), &solid);
    StepExecutionContext::builder(step, solid).build()
}

fn passes(runtime_type: &Arc<dyn RuntimeType>, ctx: &StepExecutionContext, value: Value) -> bool {
    match runtime_type.type_check(ctx, &value).expect("checker does not fail") {
        TypeCheckReturn::Check(check) => check.success,
        TypeCheckReturn::Bool(ok) => ok,
        TypeCheckReturn::Malformed { .. } => false,
    }
}

#[test]
fn builtin_types_check_json_values() {
    let ctx = bare_context();
    assert!(passes(&any(), &ctx, json!({"a": 1})));
    assert!(passes(&nothing(), &ctx, Value::Null));
    assert!(!passes(&nothing(), &ctx, json!(0)));
    assert!(passes(&int(), &ctx, json!(3)));
    assert!(!passes(&int(), &ctx, json!(3.5)));
    assert!(passes(&float(), &ctx, json!(3)));
    assert!(!passes(&string(), &ctx, json!(3)));
    assert!(passes(&list(int()), &ctx, json!([1, 2])));
    assert!(!passes(&list(int()), &ctx, json!([1, "2"])));
    assert!(passes(&nullable(string()), &ctx, Value::Null));
    assert!(!passes(&nullable(string()), &ctx, json!(false)));
    assert!(passes(&predicate("Positive", |v| v.as_f64().is_some_and(|n| n > 0.0)), &ctx, json!(2)));
    assert_eq!(list(nullable(int())).display_name(), "[Int?]");
}

#[test]
fn in_memory_manager_round_trips_between_steps() {
    let manager = Arc::new(InMemoryIoManager::with_asset_prefix("mem"));

    let producer = SolidDefinition::new("produce", compute_fn(|_, _| Ok(vec![Output::new("out", json!("hello")).into()])))
        .output(OutputDefinition::new("out", string()));
    let step = ExecutionStep::for_solid("producer", SolidHandle::new("produce", None), &producer);
    let ctx = StepExecutionContext::builder(step, producer).io_manager(DEFAULT_IO_MANAGER_KEY, manager.clone())
                                                           .build();
    let events: Vec<_> = execute_step(&ctx, 0).collect::<Result<_, _>>().expect("producer runs");
    let materialized = events.iter()
                             .find_map(|e| match &e.kind {
                                 StepEventKind::AssetMaterialization { materialization, .. } => {
                                     Some(materialization.asset_key.to_string())
                                 }
                                 _ => None,
                             })
                             .expect("backend claims an asset");
    assert_eq!(materialized, "mem/producer/out");

    let consumer = SolidDefinition::new("consume",
                                        compute_fn(|_, inputs| {
                                            let upper = inputs["text"].as_str().unwrap_or_default().to_uppercase();
                                            Ok(vec![Output::new("shout", json!(upper)).into()])
                                        })).input(InputDefinition::new("text", string()))
                                           .output(OutputDefinition::new("shout", string()));
    let step = ExecutionStep::for_solid("consumer", SolidHandle::new("consume", None), &consumer)
        .with_input("text", FromStepOutput::new(StepOutputHandle::new("producer", "out")));
    let ctx = StepExecutionContext::builder(step, consumer).io_manager(DEFAULT_IO_MANAGER_KEY, manager.clone())
                                                           .build();
    let events: Vec<_> = execute_step(&ctx, 0).collect::<Result<_, _>>().expect("consumer runs");
    assert_eq!(events[1].event_type(), "LOADED_INPUT");
    assert_eq!(manager.get(&StepOutputHandle::new("consumer", "shout")).expect("lock"), Some(json!("HELLO")));
}

#[test]
fn upstream_asset_claims_become_input_lineage() {
    let manager = Arc::new(InMemoryIoManager::with_asset_prefix("mem"));
    manager.put(StepOutputHandle::new("producer", "out"), json!("hello")).expect("put");

    let upstream_def = OutputDefinition::new("out", string()).asset_partitions(AssetPartitions::with_partitions("raw/greetings",
                                                                                                               ["2024-01-01"]));
    let consumer = SolidDefinition::new("consume",
                                        compute_fn(|_, _| Ok(vec![Output::new("shout", json!("HELLO")).into()])))
        .input(InputDefinition::new("text", string()))
        .output(OutputDefinition::new("shout", string()));
    let step = ExecutionStep::for_solid("consumer", SolidHandle::new("consume", None), &consumer)
        .with_input("text",
                    FromStepOutput::new(StepOutputHandle::new("producer", "out")).upstream_definition(upstream_def));
    let ctx = StepExecutionContext::builder(step, consumer).io_manager(DEFAULT_IO_MANAGER_KEY, manager)
                                                           .build();
    let events: Vec<_> = execute_step(&ctx, 0).collect::<Result<_, _>>().expect("consumer runs");
    let (asset_key, input_assets) = events.iter()
                                          .find_map(|e| match &e.kind {
                                              StepEventKind::AssetMaterialization { materialization,
                                                                                    input_assets } => {
                                                  Some((materialization.asset_key.to_string(), input_assets.clone()))
                                              }
                                              _ => None,
                                          })
                                          .expect("consumer output is materialized");
    assert_eq!(asset_key, "mem/consumer/shout");
    assert_eq!(input_assets,
               vec![AssetPartitions::with_partitions("raw/greetings", ["2024-01-01"]),
                    AssetPartitions::new("mem/producer/out")]);
}

#[test]
fn fs_manager_writes_json_and_reports_path() {
    let dir = scratch_dir();
    let manager = FsIoManager::new(&dir);
    let ctx = OutputContext { run_id: Uuid::new_v4(),
                              step_key: "s".into(),
                              name: "item".into(),
                              mapping_key: Some("k1".into()),
                              solid_def_name: None,
                              config: None,
                              version: None };
    let returned = manager.handle_output(&ctx, &json!({"n": 1})).expect("stored");
    let path = manager.path_for(&ctx);
    assert!(path.ends_with("s/item__k1.json"));
    let stored: Value = serde_json::from_slice(&fs::read(&path).expect("file")).expect("json");
    assert_eq!(stored, json!({"n": 1}));
    match &returned[0] {
        UserEvent::Metadata(entry) => assert_eq!(entry.value, MetadataValue::Path(path.display().to_string())),
        other => panic!("unexpected item {other:?}"),
    }
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn config_inputs_and_json_materializer() {
    let dir = scratch_dir();
    let target = dir.join("reports").join("sum.json");
    let run_config = RunConfig::from_value(json!({
        "solids": {
            "summer": {
                "inputs": { "n": 20 },
                "outputs": [ { "sum": { "path": target.display().to_string(), "asset_key": "reports/sum" } } ]
            }
        }
    })).expect("config");

    let solid = SolidDefinition::new("sum",
                                     compute_fn(|_, inputs| {
                                         let n = inputs["n"].as_i64().unwrap_or_default();
                                         Ok(vec![Output::new("sum", json!(n * (n + 1) / 2)).into()])
                                     })).input(InputDefinition::new("n", int()))
                                        .output(OutputDefinition::new("sum", with_materializer(int(), JsonFileMaterializer)));
    let step = ExecutionStep::for_solid("summer", SolidHandle::new("summer", None), &solid).with_input("n", FromConfig);
    let ctx = StepExecutionContext::builder(step, solid).run_config(run_config)
                                                        .io_manager(DEFAULT_IO_MANAGER_KEY,
                                                                    Arc::new(InMemoryIoManager::new()))
                                                        .build();
    let events: Vec<_> = execute_step(&ctx, 0).collect::<Result<_, _>>().expect("step runs");
    let types: Vec<&str> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(types,
               vec!["STEP_START", "STEP_INPUT", "STEP_OUTPUT", "HANDLED_OUTPUT", "ASSET_MATERIALIZATION", "STEP_SUCCESS"]);
    let written: Value = serde_json::from_slice(&fs::read(&target).expect("file")).expect("json");
    assert_eq!(written, json!(210));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn missing_config_input_is_a_config_error() {
    let solid = SolidDefinition::new("noop", compute_fn(|_, _| Ok(vec![]))).input(InputDefinition::new("n", int()));
    let step = ExecutionStep::for_solid("s", SolidHandle::new("noop", None), &solid).with_input("n", FromConfig);
    let ctx = StepExecutionContext::builder(step, solid).build();
    let err = execute_step(&ctx, 0).find_map(Result::err).expect("fails");
    assert!(matches!(err, StepError::Config(_)));
}
