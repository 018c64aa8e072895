//! Jump signal: "navigate to this name" sent from the result view to the
//! search controller

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::EvolutionStub;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct JumpSignal {
    pub name: String,
}

impl JumpSignal {
    /// A signal for `name`, or None when the name is blank.
    pub fn new(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
        })
    }

    pub fn from_stub(stub: &EvolutionStub) -> Option<Self> {
        stub.name.as_deref().and_then(Self::new)
    }

    /// Accepts `{"name": "..."}` or a bare string; anything else is ignored.
    pub fn from_payload(payload: &serde_json::Value) -> Option<Self> {
        match payload {
            serde_json::Value::String(name) => Self::new(name),
            serde_json::Value::Object(map) => map
                .get("name")
                .and_then(serde_json::Value::as_str)
                .and_then(Self::new),
            _ => None,
        }
    }
}
