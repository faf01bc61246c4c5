use std::path::PathBuf;

use thiserror::Error;

use stepflow_core::model::StepOutputHandle;

/// Errores de los colaboradores builtin. Llegan al core como errores de
/// usuario y el ejecutor los envuelve con su contexto.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no value stored for output {0}")]
    NotFound(StepOutputHandle),
    #[error("input \"{0}\" has no upstream output")]
    NoUpstream(String),
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid materializer spec: {0}")]
    InvalidSpec(String),
    #[error("storage lock poisoned")]
    Poisoned,
}
