// src/auth.rs
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Runtime credentials for a connector as a flat string map.
///
/// Keys are connector-defined (see each connector's `config_schema`); the
/// youtube connector reads `api_key`. Values arrive through the MCP
/// `auth/<provider>/set` tool or the `secrets/set` JSON-RPC method.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthDetails(HashMap<String, String>);

impl AuthDetails {
    pub fn new() -> Self {
        AuthDetails(HashMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.as_str())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
