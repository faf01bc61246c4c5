//! stepflow-core: ejecutor de un único step de un plan de workflow.
//!
//! Dado un `ExecutionStep` y su `StepExecutionContext`, `execute_step`
//! resuelve inputs, invoca el compute de usuario, valida y almacena outputs
//! y produce una secuencia ordenada y perezosa de `StepEvent`.
//!
//! Los colaboradores (fuentes de input, backends de almacenamiento, tipos y
//! materializers) se definen sólo como contratos (traits); las
//! implementaciones concretas viven en `stepflow-adapters`.
pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod event;
pub mod hashing;
pub mod model;
pub mod step;
pub mod storage;

pub use config::{RunConfig, SolidConfig};
pub use engine::{execute_step, run_step, EventStream, StepEventSequence, StepExecutionContext,
                 StepExecutionContextBuilder};
pub use errors::{BoxError, ErrorClass, ErrorInfo, Failure, RetryRequested, StepError, UserCodeError};
pub use event::{EventRecord, EventStore, InMemoryEventStore, StepEvent, StepEventKind};
pub use model::{AssetKey, AssetMaterialization, AssetPartitions, DynamicOutput, ExpectationResult, MetadataEntry,
                MetadataValue, Output, SolidHandle, StepOutputHandle, TypeCheck, TypeCheckReturn, UserEvent};
pub use step::{compute_fn, stream_compute_fn, ExecutionStep, InputDefinition, OutputDefinition, RuntimeType,
               SolidDefinition, StepInputSource, TypeKind, TypeMaterializer};
pub use storage::{InputContext, IoManager, OutputContext};
