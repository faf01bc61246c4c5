//! Versiones (fingerprints) de outputs para runs memoizados.
//!
//! La versión de un output depende sólo de: versión del engine, versión del
//! solid, step key, nombre del output y versiones de los inputs (ordenadas).
//! El ejecutor sólo las consulta cuando el run lleva `MEMOIZED_RUN_TAG`.
use std::collections::HashMap;

use serde_json::json;

use super::hash_value;
use crate::constants::ENGINE_VERSION;
use crate::model::StepOutputHandle;
use crate::step::{ExecutionStep, SolidDefinition};

pub fn output_version(solid_version: &str, step_key: &str, output_name: &str, input_versions: &[String]) -> String {
    let mut sorted: Vec<&String> = input_versions.iter().collect();
    sorted.sort();
    hash_value(&json!({
        "engine_version": ENGINE_VERSION,
        "solid_version": solid_version,
        "step_key": step_key,
        "output_name": output_name,
        "input_versions": sorted,
    }))
}

/// Precalcula las versiones de todos los outputs estáticos de un step. Un
/// solid sin versión declarada no produce versiones.
pub fn step_output_versions(step: &ExecutionStep,
                            solid_def: &SolidDefinition,
                            input_versions: &[String])
                            -> HashMap<StepOutputHandle, String> {
    let Some(solid_version) = solid_def.version.as_deref() else {
        return HashMap::new();
    };
    step.step_outputs
        .iter()
        .filter(|o| !o.is_dynamic)
        .map(|o| {
            (StepOutputHandle::new(&step.key, &o.name),
             output_version(solid_version, &step.key, &o.name, input_versions))
        })
        .collect()
}
