//! Contrato del sistema de tipos enchufable.
use std::fmt;

use serde_json::Value;

use crate::engine::StepExecutionContext;
use crate::errors::UserCodeError;
use crate::model::{TypeCheckReturn, UserEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Any,
    Scalar,
    List,
    Nullable,
    Regular,
    /// Tipo centinela: no transporta valor. Los inputs `Nothing` no se cargan y
    /// los outputs `Nothing` requeridos se emiten implícitamente.
    Nothing,
}

pub trait RuntimeType: Send + Sync + fmt::Debug {
    /// Identificador estable del tipo.
    fn key(&self) -> &str;

    fn display_name(&self) -> String {
        self.key().to_string()
    }

    fn kind(&self) -> TypeKind {
        TypeKind::Regular
    }

    /// No se asume libre de errores ni bien formado.
    fn type_check(&self, ctx: &StepExecutionContext, value: &Value) -> Result<TypeCheckReturn, UserCodeError>;

    fn materializer(&self) -> Option<&dyn TypeMaterializer> {
        None
    }

    fn is_nothing(&self) -> bool {
        self.kind() == TypeKind::Nothing
    }
}

/// Materialización secundaria de valores de un tipo, guiada por config.
pub trait TypeMaterializer: Send + Sync + fmt::Debug {
    fn materialize_runtime_values(&self,
                                  ctx: &StepExecutionContext,
                                  spec: &Value,
                                  value: &Value)
                                  -> Result<Vec<UserEvent>, UserCodeError>;
}

/// Nombre del tipo JSON de un valor en tiempo de ejecución.
pub fn runtime_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
