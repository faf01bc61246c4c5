//! Frontera de aislamiento del código de usuario.
//!
//! El código de usuario reporta errores vía `UserCodeError`, pero también
//! puede hacer panic. `guard` convierte un panic en un error ordinario (no de
//! control) para que cada frontera lo envuelva con su propio contexto.
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::errors::UserCodeError;

#[derive(Debug, Error)]
#[error("user code panicked: {0}")]
pub struct UserCodePanic(pub String);

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        return (*msg).to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}

/// Ejecuta `f` capturando panics.
pub fn guard<T>(f: impl FnOnce() -> Result<T, UserCodeError>) -> Result<T, UserCodeError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(UserCodeError::other(UserCodePanic(panic_message(payload)))),
    }
}
