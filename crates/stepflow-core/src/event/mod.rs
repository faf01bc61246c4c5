//! Definiciones de eventos y trait EventStore.

mod store;
mod types;

pub use store::{EventRecord, EventStore, InMemoryEventStore};
pub use types::{StepEvent, StepEventKind};
