mod common;

use serde_json::json;

use common::context;
use stepflow_adapters::types::int;
use stepflow_core::event::{EventStore, InMemoryEventStore, StepEventKind};
use stepflow_core::model::Output;
use stepflow_core::{compute_fn, run_step, ErrorClass, Failure, OutputDefinition, RetryRequested, SolidDefinition,
                    StepError, UserCodeError};

fn retrying(max_retries: u32) -> SolidDefinition {
    SolidDefinition::new("flaky",
                         compute_fn(move |_, _| {
                             Err(RetryRequested { max_retries,
                                                  seconds_to_wait: Some(1.5) }.into())
                         }))
}

#[test]
fn successful_steps_are_appended_in_order() {
    let solid = SolidDefinition::new("emit", compute_fn(|_, _| Ok(vec![Output::new("result", json!(1)).into()])))
        .output(OutputDefinition::new("result", int()));
    let ctx = context(solid);
    let mut store = InMemoryEventStore::default();

    run_step(&ctx, 0, &mut store).expect("step succeeds");
    let records = store.list(ctx.run_id());
    let seqs: Vec<u64> = records.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
    assert!(records.last().expect("records").event.kind.is_terminal());
}

#[test]
fn explicit_failures_are_recorded_with_user_failure() {
    let ctx = context(SolidDefinition::new("fails", compute_fn(|_, _| Err(Failure::new("bad rows").into()))));
    let mut store = InMemoryEventStore::default();

    let err = run_step(&ctx, 0, &mut store).expect_err("step fails");
    assert!(matches!(err, StepError::Failure(_)));
    let records = store.list(ctx.run_id());
    match &records.last().expect("records").event.kind {
        StepEventKind::StepFailure { error_class, user_failure, error } => {
            assert_eq!(*error_class, ErrorClass::ControlFlow);
            assert_eq!(user_failure.as_ref().and_then(|f| f.description.as_deref()), Some("bad rows"));
            assert_eq!(error.message, "step failed: bad rows");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn user_errors_record_the_cause_chain() {
    let ctx = context(SolidDefinition::new("fails", compute_fn(|_, _| Err(UserCodeError::other("timeout")))));
    let mut store = InMemoryEventStore::default();
    assert!(run_step(&ctx, 0, &mut store).is_err());
    match &store.list(ctx.run_id()).last().expect("records").event.kind {
        StepEventKind::StepFailure { error_class, error, user_failure } => {
            assert_eq!(*error_class, ErrorClass::UserCode);
            assert!(user_failure.is_none());
            assert_eq!(error.cause.as_ref().map(|c| c.message.as_str()), Some("timeout"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn retry_requests_are_honored_while_attempts_remain() {
    let ctx = context(retrying(2));
    let mut store = InMemoryEventStore::default();
    assert!(run_step(&ctx, 1, &mut store).is_err());
    let records = store.list(ctx.run_id());
    assert!(matches!(records[0].event.kind, StepEventKind::StepRestarted { previous_attempts: 1 }));
    match &records.last().expect("records").event.kind {
        StepEventKind::StepUpForRetry { seconds_to_wait, .. } => assert_eq!(*seconds_to_wait, Some(1.5)),
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn exhausted_retries_become_failures() {
    let ctx = context(retrying(2));
    let mut store = InMemoryEventStore::default();
    let err = run_step(&ctx, 2, &mut store).expect_err("step fails");
    assert!(err.is_control_flow());
    let last = store.list(ctx.run_id()).pop().expect("records");
    assert_eq!(last.event.event_type(), "STEP_FAILURE");
}
