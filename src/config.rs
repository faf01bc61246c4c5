//! Configuración del proceso.
//! Carga variables de entorno (.env) y expone `EngineSettings`, que decide
//! cómo se construyen los contextos de ejecución de los steps.
//!
//! Variables reconocidas:
//! - `STEPFLOW_CAPTURE_OUTPUTS`: guarda en el contexto los valores de outputs.
//! - `STEPFLOW_MEMOIZE`: marca los runs como memoizados (resuelve versiones).
//! - `STEPFLOW_RUN_CONFIG`: ruta a un JSON con la config del run.
//! - `STEPFLOW_STORAGE_DIR`: si está definida, los outputs se persisten como
//!   JSON bajo ese directorio; si no, en memoria.
use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use dotenvy::dotenv;
use log::debug;
use once_cell::sync::Lazy;
use serde::Serialize;
use thiserror::Error;

use stepflow_adapters::{FsIoManager, InMemoryIoManager};
use stepflow_core::{IoManager, RunConfig, StepError};

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

static SETTINGS: Lazy<Result<EngineSettings, SettingsError>> = Lazy::new(EngineSettings::from_env);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("variable {key} must be a boolean, got \"{value}\"")]
    InvalidBool { key: String, value: String },
    #[error("cannot read run config {path}: {source}")]
    ReadRunConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    RunConfig(#[from] StepError),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineSettings {
    pub capture_outputs: bool,
    pub memoize: bool,
    pub run_config_path: Option<PathBuf>,
    pub storage_dir: Option<PathBuf>,
}

fn parse_bool(key: &str, raw: Option<String>) -> Result<bool, SettingsError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidBool { key: key.to_string(),
                                              value: raw }),
    }
}

impl EngineSettings {
    /// Lee la configuración del entorno del proceso (cargando `.env` antes).
    pub fn from_env() -> Result<Self, SettingsError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Lee la configuración desde una función de búsqueda arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
        where F: Fn(&str) -> Option<String>
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from);
        Ok(Self { capture_outputs: parse_bool("STEPFLOW_CAPTURE_OUTPUTS", lookup("STEPFLOW_CAPTURE_OUTPUTS"))?,
                  memoize: parse_bool("STEPFLOW_MEMOIZE", lookup("STEPFLOW_MEMOIZE"))?,
                  run_config_path: non_empty("STEPFLOW_RUN_CONFIG"),
                  storage_dir: non_empty("STEPFLOW_STORAGE_DIR") })
    }

    /// Config del run: el archivo configurado o una config vacía.
    pub fn load_run_config(&self) -> Result<RunConfig, SettingsError> {
        let Some(path) = &self.run_config_path else {
            return Ok(RunConfig::default());
        };
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::ReadRunConfig { path: path.clone(),
                                                                                             source })?;
        debug!("loaded run config from {}", path.display());
        Ok(RunConfig::from_json_str(&raw)?)
    }

    /// Backend de almacenamiento por defecto según `storage_dir`.
    pub fn default_io_manager(&self) -> Arc<dyn IoManager> {
        match &self.storage_dir {
            Some(dir) => Arc::new(FsIoManager::new(dir)),
            None => Arc::new(InMemoryIoManager::new()),
        }
    }
}

/// Configuración global del proceso, evaluada una sola vez.
pub fn settings() -> Result<&'static EngineSettings, &'static SettingsError> {
    SETTINGS.as_ref()
}
