//! Backends de almacenamiento builtin.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::debug;
use serde_json::Value;

use stepflow_core::errors::UserCodeError;
use stepflow_core::model::{AssetKey, AssetPartitions, MetadataEntry, StepOutputHandle, UserEvent};
use stepflow_core::storage::{InputContext, IoManager, OutputContext};

use crate::AdapterError;

fn upstream_handle(ctx: &InputContext) -> Result<StepOutputHandle, UserCodeError> {
    ctx.upstream_output
       .as_ref()
       .map(OutputContext::handle)
       .ok_or_else(|| UserCodeError::other(AdapterError::NoUpstream(ctx.name.clone())))
}

/// Guarda valores en memoria, indexados por output handle.
///
/// Con `with_asset_prefix` el backend reclama el asset
/// `<prefijo>/<step_key>/<output>` para cada output que almacena.
#[derive(Debug, Default)]
pub struct InMemoryIoManager {
    values: Mutex<HashMap<StepOutputHandle, Value>>,
    asset_prefix: Option<AssetKey>,
}

impl InMemoryIoManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset_prefix(prefix: impl Into<AssetKey>) -> Self {
        Self { values: Mutex::default(),
               asset_prefix: Some(prefix.into()) }
    }

    pub fn get(&self, handle: &StepOutputHandle) -> Result<Option<Value>, AdapterError> {
        Ok(self.values.lock().map_err(|_| AdapterError::Poisoned)?.get(handle).cloned())
    }

    /// Inserta un valor directamente (p. ej. para simular un step upstream).
    pub fn put(&self, handle: StepOutputHandle, value: Value) -> Result<(), AdapterError> {
        self.values.lock().map_err(|_| AdapterError::Poisoned)?.insert(handle, value);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, AdapterError> {
        Ok(self.values.lock().map_err(|_| AdapterError::Poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool, AdapterError> {
        Ok(self.len()? == 0)
    }
}

impl IoManager for InMemoryIoManager {
    fn handle_output(&self, ctx: &OutputContext, value: &Value) -> Result<Vec<UserEvent>, UserCodeError> {
        self.put(ctx.handle(), value.clone()).map_err(UserCodeError::other)?;
        Ok(vec![])
    }

    fn load_input(&self, ctx: &InputContext) -> Result<Value, UserCodeError> {
        let handle = upstream_handle(ctx)?;
        self.get(&handle)
            .map_err(UserCodeError::other)?
            .ok_or_else(|| UserCodeError::other(AdapterError::NotFound(handle)))
    }

    fn output_asset_partitions(&self, ctx: &OutputContext) -> Option<AssetPartitions> {
        let prefix = self.asset_prefix.as_ref()?;
        let mut path = prefix.path.clone();
        path.push(ctx.step_key.clone());
        path.push(ctx.name.clone());
        Some(AssetPartitions::new(AssetKey { path }))
    }
}

/// Persiste cada output como un archivo JSON bajo `base_dir`:
/// `<base_dir>/<run_id>/<step_key>/<output>[__<mapping_key>].json`.
#[derive(Debug, Clone)]
pub struct FsIoManager {
    base_dir: PathBuf,
}

impl FsIoManager {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path_for(&self, ctx: &OutputContext) -> PathBuf {
        let file_name = match &ctx.mapping_key {
            Some(key) => format!("{}__{key}.json", ctx.name),
            None => format!("{}.json", ctx.name),
        };
        self.base_dir
            .join(ctx.run_id.to_string())
            .join(&ctx.step_key)
            .join(file_name)
    }

    fn write(&self, path: &Path, value: &Value) -> Result<usize, AdapterError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| AdapterError::Io { path: parent.to_path_buf(),
                                                                           source })?;
        }
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(path, &bytes).map_err(|source| AdapterError::Io { path: path.to_path_buf(),
                                                                    source })?;
        Ok(bytes.len())
    }
}

impl IoManager for FsIoManager {
    fn handle_output(&self, ctx: &OutputContext, value: &Value) -> Result<Vec<UserEvent>, UserCodeError> {
        let path = self.path_for(ctx);
        let size = self.write(&path, value).map_err(UserCodeError::other)?;
        debug!("stored output {} at {}", ctx.handle(), path.display());
        Ok(vec![MetadataEntry::path("path", path.display().to_string()).into(),
                MetadataEntry::int("bytes", size as i64).into()])
    }

    fn load_input(&self, ctx: &InputContext) -> Result<Value, UserCodeError> {
        let upstream = ctx.upstream_output
                          .as_ref()
                          .ok_or_else(|| UserCodeError::other(AdapterError::NoUpstream(ctx.name.clone())))?;
        let path = self.path_for(upstream);
        let raw = fs::read(&path).map_err(|source| UserCodeError::other(AdapterError::Io { path: path.clone(),
                                                                                            source }))?;
        serde_json::from_slice(&raw).map_err(|e| UserCodeError::other(AdapterError::Json(e)))
    }
}
