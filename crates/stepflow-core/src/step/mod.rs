//! Definiciones relacionadas a Steps.
//!
//! Un step del plan de ejecución envuelve un solid (nodo de cómputo). Este
//! módulo define:
//! - `SolidDefinition` con sus `InputDefinition`/`OutputDefinition`.
//! - `ComputeFn`: interfaz del cómputo de usuario y adaptadores para closures.
//! - `RuntimeType`/`TypeMaterializer`: contrato del sistema de tipos enchufable.
//! - `ExecutionStep` y `StepInputSource`: el nodo del plan y sus fuentes de input.

pub mod compute;
pub mod definition;
pub mod plan;
pub mod types;

pub use compute::{compute_fn, stream_compute_fn, ComputeFn, InputValues, UserEventStream};
pub use definition::{AssetFn, InputDefinition, OutputDefinition, SolidDefinition};
pub use plan::{ExecutionStep, InputItem, InputItemStream, StepInput, StepInputSource, StepOutput};
pub use types::{runtime_type_name, RuntimeType, TypeKind, TypeMaterializer};
