//! stepflow-adapters: colaboradores concretos para el ejecutor de steps.
//!
//! El core sólo define contratos. Este crate provee:
//! - Backends de almacenamiento: `InMemoryIoManager` y `FsIoManager` (JSON en disco).
//! - Tipos builtin (`Any`, `Nothing`, escalares, listas, nullables, predicados)
//!   y un materializer de tipo que escribe archivos JSON.
//! - Fuentes de input: desde un output upstream, desde config o valor por defecto.

pub mod errors;
pub mod io_managers;
pub mod sources;
pub mod types;

pub use errors::AdapterError;
pub use io_managers::{FsIoManager, InMemoryIoManager};
pub use sources::{FromConfig, FromDefaultValue, FromStepOutput};
