//! Configuración del run (por solid), deserializable desde JSON.
//!
//! ```json
//! { "solids": { "outer.leaf": { "outputs": [ { "result": { "path": "/tmp/r.json" } } ] } } }
//! ```
//!
//! `outputs` es la lista de specs de materializer de tipo: cada elemento es un
//! mapa de una sola clave `{nombre_output: spec}`.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::StepError;
use crate::model::SolidHandle;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub solids: BTreeMap<String, SolidConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolidConfig {
    #[serde(default)]
    pub config: Option<Value>,
    #[serde(default)]
    pub inputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub outputs: Vec<BTreeMap<String, Value>>,
}

impl RunConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, StepError> {
        serde_json::from_str(raw).map_err(|e| StepError::Config(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, StepError> {
        serde_json::from_value(value).map_err(|e| StepError::Config(e.to_string()))
    }

    pub fn solid_config(&self, handle: &SolidHandle) -> Option<&SolidConfig> {
        self.solids.get(&handle.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_materializer_specs_by_handle_path() {
        let cfg = RunConfig::from_value(json!({
            "solids": { "outer.leaf": { "outputs": [ { "result": { "path": "r.json" } } ] } }
        })).expect("valid config");
        let handle = SolidHandle::from_path("outer.leaf").expect("handle");
        let solid = cfg.solid_config(&handle).expect("solid config");
        assert_eq!(solid.outputs[0]["result"], json!({"path": "r.json"}));
        assert!(solid.inputs.is_empty());
    }

    #[test]
    fn malformed_config_is_a_config_error() {
        let err = RunConfig::from_json_str("{\"solids\": 3}").expect_err("invalid");
        assert!(matches!(err, StepError::Config(_)));
    }
}
