//! Constantes del motor core.
//!
//! Agrupa valores estáticos que forman parte del contrato observable del
//! ejecutor (tags de run, claves de recursos por defecto) y del cálculo de
//! fingerprints de versión.

/// Versión lógica del motor. Se incluye en el input de
/// `hashing::output_version` para que un cambio de versión del engine
/// invalide determinísticamente las versiones de outputs memoizados.
pub const ENGINE_VERSION: &str = "S1.0";

/// Tag de run que activa la resolución de versiones de outputs.
pub const MEMOIZED_RUN_TAG: &str = "stepflow/is_memoized_run";

/// Clave de recurso usada por los `OutputDefinition` que no declaran backend.
pub const DEFAULT_IO_MANAGER_KEY: &str = "io_manager";
