//! Controller identity and side lookup for rigs driven by the host.

pub mod mirror;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host node name of one animation controller, namespace included.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerId(String);

impl ControllerId {
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Name without any `ns:` prefix.
    pub fn short_name(&self) -> &str {
        self.0.rsplit(':').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for ControllerId {
    fn from(s: &str) -> Self { Self::new(s) }
}

impl From<String> for ControllerId {
    fn from(s: String) -> Self { Self(s) }
}
