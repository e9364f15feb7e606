use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Registry scope; lookups by short name get `scope::` prepended.
    #[serde(default)]
    pub scope: Option<String>,
    /// Options applied to every plugin type.
    #[serde(default)]
    pub defaults: Map<String, Value>,
    /// Per-type options, keyed by plugin type name.
    #[serde(default)]
    pub plugins: Map<String, Value>,
    /// Per-type settings (`disabled`, `skip_auto_initialization`, extensions).
    #[serde(default)]
    pub settings: BTreeMap<String, BTreeMap<String, Value>>,
}
