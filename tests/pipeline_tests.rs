use std::fs;
use std::path::PathBuf;

use serde_json::{json, Value};
use uuid::Uuid;

use stepflow::stepflow_adapters::types::{int, list};
use stepflow::stepflow_adapters::{FromConfig, FromStepOutput};
use stepflow::stepflow_core::event::{EventStore, InMemoryEventStore};
use stepflow::stepflow_core::hashing::{output_version, step_output_versions};
use stepflow::stepflow_core::{compute_fn, InputDefinition, Output, OutputDefinition, SolidHandle, StepOutputHandle};
use stepflow::{context_builder, run_step, EngineSettings, ExecutionStep, RunResources, SettingsError, SolidDefinition,
               StepEventKind};

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("stepflow-pipeline-{}", Uuid::new_v4()))
}

fn settings_from(pairs: &[(&str, String)]) -> EngineSettings {
    EngineSettings::from_lookup(|key| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.clone())).expect("settings")
}

fn event_types(store: &InMemoryEventStore, run_id: Uuid) -> Vec<&'static str> {
    store.list(run_id).iter().map(|r| r.event.event_type()).collect()
}

#[test]
fn two_steps_share_filesystem_storage() {
    let dir = scratch_dir();
    let settings = settings_from(&[("STEPFLOW_STORAGE_DIR", dir.display().to_string()),
                                   ("STEPFLOW_CAPTURE_OUTPUTS", "true".to_string())]);
    let resources = RunResources::from_settings(&settings).expect("resources");
    let mut store = InMemoryEventStore::default();

    let make = SolidDefinition::new("make", compute_fn(|_, _| Ok(vec![Output::new("rows", json!([1, 2, 3])).into()])))
        .output(OutputDefinition::new("rows", list(int())));
    let step = ExecutionStep::for_solid("make", SolidHandle::new("make", None), &make);
    let ctx = context_builder(step, make, &settings, &resources).build();
    run_step(&ctx, 0, &mut store).expect("make runs");
    let captured = ctx.captured_outputs().expect("capture enabled");
    assert_eq!(captured.get(&StepOutputHandle::new("make", "rows")), Some(&json!([1, 2, 3])));

    let count = SolidDefinition::new("count",
                                     compute_fn(|_, inputs| {
                                         let n = inputs["rows"].as_array().map(Vec::len).unwrap_or_default();
                                         Ok(vec![Output::new("n", json!(n)).into()])
                                     })).input(InputDefinition::new("rows", list(int())))
                                        .output(OutputDefinition::new("n", int()));
    let step = ExecutionStep::for_solid("count", SolidHandle::new("count", None), &count)
        .with_input("rows", FromStepOutput::new(StepOutputHandle::new("make", "rows")));
    let ctx = context_builder(step, count, &settings, &resources).build();
    run_step(&ctx, 0, &mut store).expect("count runs");

    assert_eq!(event_types(&store, resources.run_id),
               vec!["STEP_START",
                    "STEP_OUTPUT",
                    "HANDLED_OUTPUT",
                    "STEP_SUCCESS",
                    "STEP_START",
                    "LOADED_INPUT",
                    "STEP_INPUT",
                    "STEP_OUTPUT",
                    "HANDLED_OUTPUT",
                    "STEP_SUCCESS"]);
    let handled_labels: Vec<String> = store.list(resources.run_id)
                                           .iter()
                                           .find_map(|r| match &r.event.kind {
                                               StepEventKind::HandledOutput { metadata_entries, .. } => {
                                                   Some(metadata_entries.iter().map(|e| e.label.clone()).collect())
                                               }
                                               _ => None,
                                           })
                                           .expect("handled output");
    assert_eq!(handled_labels, vec!["path", "bytes"]);

    let stored = dir.join(resources.run_id.to_string()).join("count").join("n.json");
    let value: Value = serde_json::from_slice(&fs::read(stored).expect("file")).expect("json");
    assert_eq!(value, json!(3));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn run_config_file_and_memoized_versions() {
    let dir = scratch_dir();
    fs::create_dir_all(&dir).expect("dir");
    let config_path = dir.join("run.json");
    fs::write(&config_path, r#"{"solids": {"scale": {"inputs": {"factor": 3}}}}"#).expect("write config");
    let settings = settings_from(&[("STEPFLOW_RUN_CONFIG", config_path.display().to_string()),
                                   ("STEPFLOW_MEMOIZE", "on".to_string())]);
    let resources = RunResources::from_settings(&settings).expect("resources");

    let scale = SolidDefinition::new("scale",
                                     compute_fn(|_, inputs| {
                                         let factor = inputs["factor"].as_i64().unwrap_or_default();
                                         Ok(vec![Output::new("scaled", json!(factor * 10)).into()])
                                     })).input(InputDefinition::new("factor", int()))
                                        .output(OutputDefinition::new("scaled", int()))
                                        .version("v2");
    let step = ExecutionStep::for_solid("scale", SolidHandle::new("scale", None), &scale).with_input("factor", FromConfig);
    let versions = step_output_versions(&step, &scale, &[]);
    let ctx = context_builder(step, scale, &settings, &resources).output_versions(versions).build();
    let mut store = InMemoryEventStore::default();
    run_step(&ctx, 0, &mut store).expect("scale runs");

    let version = store.list(resources.run_id)
                       .into_iter()
                       .find_map(|r| match r.event.kind {
                           StepEventKind::StepOutput { version, .. } => version,
                           _ => None,
                       })
                       .expect("versioned output");
    assert_eq!(version, output_version("v2", "scale", "scaled", &[]));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn invalid_run_config_file_is_a_settings_error() {
    let dir = scratch_dir();
    fs::create_dir_all(&dir).expect("dir");
    let config_path = dir.join("run.json");
    fs::write(&config_path, r#"{"solids": 7}"#).expect("write config");
    let settings = settings_from(&[("STEPFLOW_RUN_CONFIG", config_path.display().to_string())]);
    let err = RunResources::from_settings(&settings).expect_err("invalid config");
    assert!(matches!(err, SettingsError::RunConfig(_)));
    let _ = fs::remove_dir_all(dir);
}
