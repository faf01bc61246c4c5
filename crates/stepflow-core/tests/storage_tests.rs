mod common;

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use common::{context, context_with, event_types, run, STEP_KEY};
use stepflow_adapters::types::any;
use stepflow_core::constants::DEFAULT_IO_MANAGER_KEY;
use stepflow_core::event::{StepEvent, StepEventKind};
use stepflow_core::model::{AssetMaterialization, AssetPartitions, ExpectationResult, MetadataEntry, Output,
                           UserEvent};
use stepflow_core::storage::{InputContext, IoManager, OutputContext};
use stepflow_core::{compute_fn, ErrorClass, Failure, OutputDefinition, SolidDefinition, StepError, UserCodeError};

/// Backend que devuelve lo que se le indique y recuerda lo almacenado.
#[derive(Debug, Default)]
struct ScriptedManager {
    returns: Vec<UserEvent>,
    claim: Option<AssetPartitions>,
    fail_with: Option<fn() -> UserCodeError>,
    stored: Mutex<Vec<Value>>,
}

impl IoManager for ScriptedManager {
    fn handle_output(&self, _ctx: &OutputContext, value: &Value) -> Result<Vec<UserEvent>, UserCodeError> {
        if let Some(fail) = self.fail_with {
            return Err(fail());
        }
        self.stored.lock().expect("lock").push(value.clone());
        Ok(self.returns.clone())
    }

    fn load_input(&self, _ctx: &InputContext) -> Result<Value, UserCodeError> {
        Err(UserCodeError::other("not supported"))
    }

    fn output_asset_partitions(&self, _ctx: &OutputContext) -> Option<AssetPartitions> {
        self.claim.clone()
    }
}

fn emitting(output: Output, def: OutputDefinition) -> SolidDefinition {
    SolidDefinition::new("solid_def", compute_fn(move |_, _| Ok(vec![output.clone().into()]))).output(def)
}

fn with_manager(solid: SolidDefinition, manager: ScriptedManager) -> (Vec<StepEvent>, Option<StepError>) {
    let ctx = context_with(solid, |s| s, |b| b.io_manager(DEFAULT_IO_MANAGER_KEY, Arc::new(manager)));
    run(&ctx)
}

fn materializations(events: &[StepEvent]) -> Vec<AssetMaterialization> {
    events.iter()
          .filter_map(|e| match &e.kind {
              StepEventKind::AssetMaterialization { materialization, .. } => Some(materialization.clone()),
              _ => None,
          })
          .collect()
}

fn labels(m: &AssetMaterialization) -> Vec<&str> {
    m.metadata_entries.iter().map(|e| e.label.as_str()).collect()
}

#[test]
fn partition_targeted_metadata_only_reaches_its_partition() {
    let output = Output::new("result", json!(1)).with_metadata(MetadataEntry::int("rows", 10))
                                                .with_metadata(MetadataEntry::int("p1_rows", 4).for_partition("p1"));
    let def = OutputDefinition::new("result", any()).asset_partitions(AssetPartitions::with_partitions("t", ["p1", "p2"]));
    let manager = ScriptedManager { returns: vec![MetadataEntry::text("backend", "scripted").into(),
                                                  MetadataEntry::int("p2_rows", 6).for_partition("p2").into()],
                                    ..Default::default() };

    let (events, err) = with_manager(emitting(output, def), manager);
    assert!(err.is_none(), "{err:?}");
    let mats = materializations(&events);
    assert_eq!(mats.len(), 2);
    assert_eq!(mats[0].partition.as_deref(), Some("p1"));
    assert_eq!(labels(&mats[0]), vec!["rows", "p1_rows", "backend"]);
    assert_eq!(mats[1].partition.as_deref(), Some("p2"));
    assert_eq!(labels(&mats[1]), vec!["rows", "backend", "p2_rows"]);

    match &events.iter().find(|e| e.event_type() == "HANDLED_OUTPUT").expect("handled").kind {
        StepEventKind::HandledOutput { metadata_entries, manager_key, .. } => {
            assert_eq!(manager_key, DEFAULT_IO_MANAGER_KEY);
            let handled: Vec<&str> = metadata_entries.iter().map(|e| e.label.as_str()).collect();
            assert_eq!(handled, vec!["backend"]);
        }
        other => panic!("unexpected event {other:?}"),
    }

    match &events[1].kind {
        StepEventKind::StepOutput { metadata_entries, .. } => {
            assert_eq!(metadata_entries.iter().map(|e| e.label.as_str()).collect::<Vec<_>>(), vec!["rows"]);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn metadata_for_an_unknown_partition_fails() {
    let output = Output::new("result", json!(1)).with_metadata(MetadataEntry::int("rows", 1).for_partition("p9"));
    let def = OutputDefinition::new("result", any()).asset_partitions(AssetPartitions::with_partitions("t", ["p1"]));
    let (events, err) = with_manager(emitting(output, def), ScriptedManager::default());
    assert!(materializations(&events).is_empty());
    match err {
        Some(StepError::UndeclaredPartition { partition, declared, .. }) => {
            assert_eq!(partition, "p9");
            assert_eq!(declared, vec!["p1".to_string()]);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn backend_materializations_follow_partition_materializations() {
    let def = OutputDefinition::new("result", any()).asset_partitions(AssetPartitions::new("declared"));
    let manager = ScriptedManager { returns: vec![AssetMaterialization::new("from/backend").into()],
                                    ..Default::default() };
    let (events, err) = with_manager(emitting(Output::new("result", json!(1)), def), manager);
    assert!(err.is_none());
    assert_eq!(event_types(&events),
               vec!["STEP_START",
                    "STEP_OUTPUT",
                    "ASSET_MATERIALIZATION",
                    "ASSET_MATERIALIZATION",
                    "HANDLED_OUTPUT",
                    "STEP_SUCCESS"]);
    let keys: Vec<String> = materializations(&events).iter().map(|m| m.asset_key.to_string()).collect();
    assert_eq!(keys, vec!["declared", "from/backend"]);
}

#[test]
fn backend_claims_assets_when_definition_does_not() {
    let manager = ScriptedManager { claim: Some(AssetPartitions::new("backend/asset")),
                                    ..Default::default() };
    let (events, err) = with_manager(emitting(Output::new("result", json!(1)), OutputDefinition::new("result", any())),
                                     manager);
    assert!(err.is_none());
    assert_eq!(materializations(&events)[0].asset_key.to_string(), "backend/asset");
}

#[test]
fn backend_returning_other_items_violates_contract() {
    let manager = ScriptedManager { returns: vec![ExpectationResult::new(true, "nope").into()],
                                    ..Default::default() };
    let (events, err) = with_manager(emitting(Output::new("result", json!(1)), OutputDefinition::new("result", any())),
                                     manager);
    assert!(!event_types(&events).contains(&"HANDLED_OUTPUT"));
    match err {
        Some(err @ StepError::BackendContractViolation { .. }) => {
            assert_eq!(err.class(), ErrorClass::BackendContract);
            assert!(err.to_string().contains("ExpectationResult"));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn asset_claim_from_both_sides_is_a_configuration_error() {
    let manager = ScriptedManager { claim: Some(AssetPartitions::new("backend")),
                                    ..Default::default() };
    let def = OutputDefinition::new("result", any()).asset_partitions(AssetPartitions::new("declared"));
    let ctx_manager = Arc::new(manager);
    let ctx = context_with(emitting(Output::new("result", json!(1)), def),
                           |s| s,
                           |b| b.io_manager(DEFAULT_IO_MANAGER_KEY, ctx_manager.clone()));
    let (_, err) = run(&ctx);
    match err {
        Some(err @ StepError::AssetClaimConflict { .. }) => assert_eq!(err.class(), ErrorClass::Configuration),
        other => panic!("unexpected: {other:?}"),
    }
    assert!(ctx_manager.stored.lock().expect("lock").is_empty(), "conflict must surface before storage");
}

#[test]
fn handle_output_errors_wrap_everything_but_control_flow() {
    let failing = ScriptedManager { fail_with: Some(|| UserCodeError::other("disk full")),
                                    ..Default::default() };
    match with_manager(emitting(Output::new("result", json!(1)), OutputDefinition::new("result", any())), failing).1 {
        Some(StepError::HandleOutput { step_key, output_name, .. }) => {
            assert_eq!(step_key, STEP_KEY);
            assert_eq!(output_name, "result");
        }
        other => panic!("unexpected: {other:?}"),
    }

    let declared = ScriptedManager { fail_with: Some(|| Failure::new("quota").into()),
                                     ..Default::default() };
    let err = with_manager(emitting(Output::new("result", json!(1)), OutputDefinition::new("result", any())), declared).1;
    assert!(matches!(err, Some(StepError::Failure(_))));
}

#[test]
fn missing_io_manager_is_a_configuration_error() {
    let def = OutputDefinition::new("result", any()).io_manager("warehouse");
    let (_, err) = run(&context(emitting(Output::new("result", json!(1)), def)));
    match err {
        Some(StepError::MissingIoManager { manager_key, .. }) => assert_eq!(manager_key, "warehouse"),
        other => panic!("unexpected: {other:?}"),
    }
}
