//! Tipos builtin y materializer de tipo a archivos JSON.
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use stepflow_core::engine::StepExecutionContext;
use stepflow_core::errors::UserCodeError;
use stepflow_core::model::{AssetKey, AssetMaterialization, MetadataEntry, TypeCheck, TypeCheckReturn, UserEvent};
use stepflow_core::step::{runtime_type_name, RuntimeType, TypeKind, TypeMaterializer};

use crate::AdapterError;

fn mismatch(value: &Value, expected: &str) -> TypeCheckReturn {
    TypeCheck::failed(format!("Value {value} of runtime type {} is not a valid {expected}",
                              runtime_type_name(value))).into()
}

/// Acepta cualquier valor.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyType;

impl RuntimeType for AnyType {
    fn key(&self) -> &str {
        "Any"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Any
    }

    fn type_check(&self, _ctx: &StepExecutionContext, _value: &Value) -> Result<TypeCheckReturn, UserCodeError> {
        Ok(TypeCheck::passed().into())
    }
}

/// Tipo centinela sin valor (sólo `null`).
#[derive(Debug, Clone, Copy, Default)]
pub struct NothingType;

impl RuntimeType for NothingType {
    fn key(&self) -> &str {
        "Nothing"
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Nothing
    }

    fn type_check(&self, _ctx: &StepExecutionContext, value: &Value) -> Result<TypeCheckReturn, UserCodeError> {
        if value.is_null() {
            return Ok(TypeCheck::passed().into());
        }
        Ok(mismatch(value, "Nothing"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scalar {
    Bool,
    Int,
    Float,
    String,
}

#[derive(Debug, Clone, Copy)]
pub struct ScalarType(pub Scalar);

impl RuntimeType for ScalarType {
    fn key(&self) -> &str {
        match self.0 {
            Scalar::Bool => "Bool",
            Scalar::Int => "Int",
            Scalar::Float => "Float",
            Scalar::String => "String",
        }
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Scalar
    }

    fn type_check(&self, _ctx: &StepExecutionContext, value: &Value) -> Result<TypeCheckReturn, UserCodeError> {
        let ok = match self.0 {
            Scalar::Bool => value.is_boolean(),
            Scalar::Int => value.is_i64() || value.is_u64(),
            // un entero también es un Float válido
            Scalar::Float => value.is_number(),
            Scalar::String => value.is_string(),
        };
        if ok {
            return Ok(TypeCheck::passed().into());
        }
        Ok(mismatch(value, self.key()))
    }
}

/// Lista homogénea; cada elemento se chequea con el tipo interno.
#[derive(Debug, Clone)]
pub struct ListType {
    inner: Arc<dyn RuntimeType>,
    name: String,
}

impl RuntimeType for ListType {
    fn key(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TypeKind {
        TypeKind::List
    }

    fn type_check(&self, ctx: &StepExecutionContext, value: &Value) -> Result<TypeCheckReturn, UserCodeError> {
        let Some(items) = value.as_array() else {
            return Ok(mismatch(value, &self.name));
        };
        for (idx, item) in items.iter().enumerate() {
            let ok = match self.inner.type_check(ctx, item)? {
                TypeCheckReturn::Check(check) => check.success,
                TypeCheckReturn::Bool(ok) => ok,
                TypeCheckReturn::Malformed { .. } => false,
            };
            if !ok {
                return Ok(TypeCheck::failed(format!("Item at index {idx} of {} is not a valid {}",
                                                    self.name,
                                                    self.inner.display_name())).into());
            }
        }
        Ok(TypeCheck::passed().into())
    }
}

/// `null` o un valor del tipo interno.
#[derive(Debug, Clone)]
pub struct NullableType {
    inner: Arc<dyn RuntimeType>,
    name: String,
}

impl RuntimeType for NullableType {
    fn key(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Nullable
    }

    fn type_check(&self, ctx: &StepExecutionContext, value: &Value) -> Result<TypeCheckReturn, UserCodeError> {
        if value.is_null() {
            return Ok(TypeCheck::passed().into());
        }
        self.inner.type_check(ctx, value)
    }
}

type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Tipo definido por un predicado; devuelve un booleano crudo que el
/// ejecutor normaliza.
#[derive(Clone)]
pub struct PredicateType {
    name: String,
    predicate: Predicate,
}

impl fmt::Debug for PredicateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateType").field("name", &self.name).finish()
    }
}

impl RuntimeType for PredicateType {
    fn key(&self) -> &str {
        &self.name
    }

    fn type_check(&self, _ctx: &StepExecutionContext, value: &Value) -> Result<TypeCheckReturn, UserCodeError> {
        Ok((self.predicate)(value).into())
    }
}

/// Envuelve un tipo agregándole un materializer.
#[derive(Debug, Clone)]
pub struct MaterializedType {
    inner: Arc<dyn RuntimeType>,
    materializer: Arc<dyn TypeMaterializer>,
}

impl RuntimeType for MaterializedType {
    fn key(&self) -> &str {
        self.inner.key()
    }

    fn display_name(&self) -> String {
        self.inner.display_name()
    }

    fn kind(&self) -> TypeKind {
        self.inner.kind()
    }

    fn type_check(&self, ctx: &StepExecutionContext, value: &Value) -> Result<TypeCheckReturn, UserCodeError> {
        self.inner.type_check(ctx, value)
    }

    fn materializer(&self) -> Option<&dyn TypeMaterializer> {
        Some(self.materializer.as_ref())
    }
}

#[derive(Debug, Deserialize)]
struct JsonFileSpec {
    path: PathBuf,
    #[serde(default)]
    asset_key: Option<String>,
}

/// Escribe el valor en `spec.path` y reporta una materialización del asset
/// `spec.asset_key` (por defecto, la ruta del archivo).
///
/// Spec: `{"path": "out/result.json", "asset_key": "reports/result"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileMaterializer;

impl TypeMaterializer for JsonFileMaterializer {
    fn materialize_runtime_values(&self,
                                  _ctx: &StepExecutionContext,
                                  spec: &Value,
                                  value: &Value)
                                  -> Result<Vec<UserEvent>, UserCodeError> {
        let spec: JsonFileSpec = serde_json::from_value(spec.clone())
            .map_err(|e| UserCodeError::other(AdapterError::InvalidSpec(e.to_string())))?;
        if let Some(parent) = spec.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| {
                                          UserCodeError::other(AdapterError::Io { path: parent.to_path_buf(),
                                                                                  source })
                                      })?;
        }
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| UserCodeError::other(AdapterError::Json(e)))?;
        fs::write(&spec.path, bytes).map_err(|source| {
                                        UserCodeError::other(AdapterError::Io { path: spec.path.clone(),
                                                                                source })
                                    })?;
        let path = spec.path.display().to_string();
        let asset_key = spec.asset_key.as_deref().map(AssetKey::from).unwrap_or_else(|| AssetKey::new([path.clone()]));
        let materialization =
            AssetMaterialization::new(asset_key).with_description("json file")
                                                .with_metadata(vec![MetadataEntry::path("path", path)]);
        Ok(vec![materialization.into()])
    }
}

pub fn any() -> Arc<dyn RuntimeType> {
    Arc::new(AnyType)
}

pub fn nothing() -> Arc<dyn RuntimeType> {
    Arc::new(NothingType)
}

pub fn bool_type() -> Arc<dyn RuntimeType> {
    Arc::new(ScalarType(Scalar::Bool))
}

pub fn int() -> Arc<dyn RuntimeType> {
    Arc::new(ScalarType(Scalar::Int))
}

pub fn float() -> Arc<dyn RuntimeType> {
    Arc::new(ScalarType(Scalar::Float))
}

pub fn string() -> Arc<dyn RuntimeType> {
    Arc::new(ScalarType(Scalar::String))
}

pub fn list(inner: Arc<dyn RuntimeType>) -> Arc<dyn RuntimeType> {
    let name = format!("[{}]", inner.display_name());
    Arc::new(ListType { inner, name })
}

pub fn nullable(inner: Arc<dyn RuntimeType>) -> Arc<dyn RuntimeType> {
    let name = format!("{}?", inner.display_name());
    Arc::new(NullableType { inner, name })
}

pub fn predicate<F>(name: impl Into<String>, f: F) -> Arc<dyn RuntimeType>
    where F: Fn(&Value) -> bool + Send + Sync + 'static
{
    Arc::new(PredicateType { name: name.into(),
                             predicate: Arc::new(f) })
}

pub fn with_materializer(inner: Arc<dyn RuntimeType>, materializer: impl TypeMaterializer + 'static) -> Arc<dyn RuntimeType> {
    Arc::new(MaterializedType { inner,
                                materializer: Arc::new(materializer) })
}
