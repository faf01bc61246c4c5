//! Orquestador del ciclo de vida de un step.
use std::iter;
use std::mem;
use std::rc::Rc;
use std::time::Instant;

use log::{debug, info};

use crate::errors::StepError;
use crate::event::StepEvent;
use crate::model::{AssetPartitions, SolidOutput, UserEvent};
use crate::step::{InputItem, InputItemStream, InputValues};

use super::compute::ComputeStream;
use super::materialize::type_materializations;
use super::outputs::OutputValidator;
use super::store::store_output;
use super::type_check::{input_type_check, output_type_check};
use super::{deferred, EventStream, StepExecutionContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    LoadInputs,
    CheckInputs,
    Compute,
    Dispatch,
    Success,
    Done,
}

/// Secuencia perezosa de eventos de un step. Termina tras `StepSuccess` o
/// tras el primer error; nunca emite eventos terminales de fallo.
pub struct StepEventSequence<'a> {
    ctx: &'a StepExecutionContext,
    prior_attempt_count: u32,
    phase: Phase,
    next_input: usize,
    loading: Option<(&'a str, InputItemStream<'a>)>,
    inputs: InputValues,
    input_assets: Vec<AssetPartitions>,
    deduped_assets: Rc<Vec<AssetPartitions>>,
    pending: Option<EventStream<'a>>,
    user_events: Option<OutputValidator<'a, ComputeStream<'a>>>,
    started: Option<Instant>,
}

/// Ejecuta un step. `prior_attempt_count > 0` emite `StepRestarted` en lugar
/// de `StepStart`.
pub fn execute_step(ctx: &StepExecutionContext, prior_attempt_count: u32) -> StepEventSequence<'_> {
    StepEventSequence { ctx,
                        prior_attempt_count,
                        phase: Phase::Start,
                        next_input: 0,
                        loading: None,
                        inputs: InputValues::new(),
                        input_assets: Vec::new(),
                        deduped_assets: Rc::new(Vec::new()),
                        pending: None,
                        user_events: None,
                        started: None }
}

impl<'a> StepEventSequence<'a> {
    fn fail(&mut self, err: StepError) -> Option<Result<StepEvent, StepError>> {
        self.phase = Phase::Done;
        self.pending = None;
        self.loading = None;
        self.user_events = None;
        Some(Err(err))
    }

    fn start_event(&self) -> StepEvent {
        let step_key = &self.ctx.step().key;
        if self.prior_attempt_count > 0 {
            debug!("restarting step {step_key} (previous attempts: {})", self.prior_attempt_count);
            StepEvent::step_restarted(self.ctx, self.prior_attempt_count)
        } else {
            debug!("starting step {step_key}");
            StepEvent::step_start(self.ctx)
        }
    }

    /// Próximo evento de la carga de inputs; `None` cuando todos los inputs
    /// quedaron resueltos.
    fn load_inputs(&mut self) -> Option<Result<StepEvent, StepError>> {
        let ctx = self.ctx;
        loop {
            if let Some((input_name, stream)) = self.loading.as_mut() {
                let input_name: &'a str = *input_name;
                match stream.next() {
                    Some(Ok(InputItem::Event(event))) => return Some(Ok(event)),
                    Some(Ok(InputItem::Value(value))) => {
                        if self.inputs.contains_key(input_name) {
                            return Some(Err(StepError::Invariant(format!("input source for \"{input_name}\" yielded more than one value"))));
                        }
                        self.inputs.insert(input_name.to_string(), value);
                    }
                    Some(Err(e)) => return Some(Err(e)),
                    None => {
                        if !self.inputs.contains_key(input_name) {
                            return Some(Err(StepError::Invariant(format!("input source for \"{input_name}\" yielded no value"))));
                        }
                        self.loading = None;
                    }
                }
                continue;
            }

            let step_input = ctx.step().step_inputs.get(self.next_input)?;
            self.next_input += 1;
            let Some(input_def) = ctx.solid_def().input_def_named(&step_input.name) else {
                return Some(Err(StepError::Invariant(format!("input \"{}\" has no definition", step_input.name))));
            };
            if input_def.runtime_type.is_nothing() {
                continue;
            }
            self.input_assets.extend(step_input.source.asset_partitions(ctx));
            self.loading = Some((step_input.name.as_str(), step_input.source.load_input_object(ctx, &step_input.name)));
        }
    }

    fn input_checks(&self) -> EventStream<'a> {
        let ctx = self.ctx;
        let inputs: Vec<_> = self.inputs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        Box::new(inputs.into_iter().flat_map(move |(name, value)| input_type_check(ctx, name, value)))
    }

    fn dispatch(&self, event: UserEvent) -> Result<EventStream<'a>, StepError> {
        let ctx = self.ctx;
        match event {
            UserEvent::Output(o) => Ok(output_pipeline(ctx, SolidOutput::Static(o), Rc::clone(&self.deduped_assets))),
            UserEvent::DynamicOutput(o) => {
                Ok(output_pipeline(ctx, SolidOutput::Dynamic(o), Rc::clone(&self.deduped_assets)))
            }
            UserEvent::AssetMaterialization(m) => {
                let input_assets = self.deduped_assets.to_vec();
                Ok(Box::new(iter::once(Ok(StepEvent::materialization(ctx, m, input_assets)))))
            }
            UserEvent::ExpectationResult(e) => Ok(Box::new(iter::once(Ok(StepEvent::expectation_result(ctx, e))))),
            other => Err(StepError::Invariant(format!("unexpected event {}, should have been caught earlier",
                                                      other.type_name()))),
        }
    }
}

/// Pipeline de un output: captura, type check, almacenamiento y
/// materializers de tipo.
fn output_pipeline<'a>(ctx: &'a StepExecutionContext,
                       output: SolidOutput,
                       input_assets: Rc<Vec<AssetPartitions>>)
                       -> EventStream<'a> {
    deferred(move || {
        let handle = output.handle(&ctx.step().key);
        ctx.capture_output(&handle, output.value());
        let version = ctx.resolve_version(&handle);
        let checked = output_type_check(ctx, handle.clone(), &output, version);
        let output = Rc::new(output);
        let for_materializers = Rc::clone(&output);
        Box::new(checked.chain(deferred(move || store_output(ctx, handle, output, input_assets)))
                        .chain(deferred(move || type_materializations(ctx, for_materializers))))
    })
}

impl Iterator for StepEventSequence<'_> {
    type Item = Result<StepEvent, StepError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(stream) = self.pending.as_mut() {
                match stream.next() {
                    Some(Ok(event)) => return Some(Ok(event)),
                    Some(Err(e)) => return self.fail(e),
                    None => self.pending = None,
                }
            }

            match self.phase {
                Phase::Start => {
                    self.phase = Phase::LoadInputs;
                    return Some(Ok(self.start_event()));
                }
                Phase::LoadInputs => match self.load_inputs() {
                    Some(Ok(event)) => return Some(Ok(event)),
                    Some(Err(e)) => return self.fail(e),
                    None => {
                        self.pending = Some(self.input_checks());
                        self.phase = Phase::CheckInputs;
                    }
                },
                Phase::CheckInputs => {
                    let input_assets = mem::take(&mut self.input_assets);
                    self.deduped_assets = Rc::new(super::dedup_asset_partitions(input_assets));
                    self.phase = Phase::Compute;
                }
                Phase::Compute => {
                    self.started = Some(Instant::now());
                    let inputs = mem::take(&mut self.inputs);
                    self.user_events = Some(OutputValidator::new(self.ctx, ComputeStream::new(self.ctx, inputs)));
                    self.phase = Phase::Dispatch;
                }
                Phase::Dispatch => match self.user_events.as_mut().and_then(Iterator::next) {
                    Some(Ok(event)) => match self.dispatch(event) {
                        Ok(stream) => self.pending = Some(stream),
                        Err(e) => return self.fail(e),
                    },
                    Some(Err(e)) => return self.fail(e),
                    None => {
                        self.user_events = None;
                        self.phase = Phase::Success;
                    }
                },
                Phase::Success => {
                    self.phase = Phase::Done;
                    let duration_ms = self.started
                                          .map(|t| t.elapsed().as_secs_f64() * 1000.0)
                                          .unwrap_or_default();
                    info!("step {} succeeded in {duration_ms:.2}ms", self.ctx.step().key);
                    return Some(Ok(StepEvent::step_success(self.ctx, duration_ms)));
                }
                Phase::Done => return None,
            }
        }
    }
}
