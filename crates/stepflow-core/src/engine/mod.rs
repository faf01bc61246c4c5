//! Ejecutor de un único step del plan.
//!
//! Todas las etapas se expresan como iteradores perezosos sobre
//! `Result<StepEvent, StepError>`: el consumidor tira de la secuencia y cada
//! etapa suspende al producir un evento. El primer `Err` termina el step; los
//! eventos ya producidos siguen siendo válidos.
//!
//! Orden de las etapas (ver `sequencer`):
//! start/restart → carga de inputs → type check de inputs → compute (cronometrado)
//! → clasificación de outputs → despacho por evento → success.
pub mod assets;
pub mod boundary;
mod compute;
mod context;
mod materialize;
mod outputs;
pub mod runner;
mod sequencer;
mod store;
mod type_check;

use crate::errors::StepError;
use crate::event::StepEvent;

pub use assets::{asset_partitions_for_output, dedup_asset_partitions, flatten_asset_partitions};
pub use boundary::{guard, UserCodePanic};
pub use context::{StepExecutionContext, StepExecutionContextBuilder};
pub use runner::run_step;
pub use sequencer::{execute_step, StepEventSequence};

/// Secuencia perezosa de eventos de una etapa.
pub type EventStream<'a> = Box<dyn Iterator<Item = Result<StepEvent, StepError>> + 'a>;

/// Pospone la construcción de una etapa hasta que se tire de ella.
pub(crate) fn deferred<'a, F>(f: F) -> EventStream<'a>
    where F: FnOnce() -> EventStream<'a> + 'a
{
    Box::new(std::iter::once_with(f).flatten())
}
