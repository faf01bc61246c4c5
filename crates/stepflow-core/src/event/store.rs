use std::collections::HashMap;

use uuid::Uuid;

use super::StepEvent;

/// Evento persistido con su posición en el log del run.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub seq: u64, // asignado por el store (orden append)
    pub event: StepEvent,
}

/// Almacenamiento de eventos append-only.
pub trait EventStore {
    /// Agrega un evento al log de su run y devuelve el registro (con seq).
    fn append(&mut self, event: StepEvent) -> EventRecord;
    /// Lista eventos de un run (orden ascendente por seq).
    fn list(&self, run_id: Uuid) -> Vec<EventRecord>;
}

#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    pub inner: HashMap<Uuid, Vec<EventRecord>>,
}

impl EventStore for InMemoryEventStore {
    fn append(&mut self, event: StepEvent) -> EventRecord {
        let vec = self.inner.entry(event.run_id).or_default();
        let record = EventRecord { seq: vec.len() as u64,
                                   event };
        vec.push(record.clone());
        record
    }

    fn list(&self, run_id: Uuid) -> Vec<EventRecord> {
        self.inner.get(&run_id).cloned().unwrap_or_default()
    }
}
