//! Módulo de hashing, canonicalización JSON y versiones de outputs.

pub mod canonical_json;
pub mod hash;
pub mod version;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, hash_value};
pub use version::{output_version, step_output_versions};
