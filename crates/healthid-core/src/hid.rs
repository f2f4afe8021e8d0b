use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque health identifier issued by the remote authority.
///
/// The allocation subsystem never inspects or generates identifier content;
/// format validation is the issuer's responsibility. Global uniqueness is
/// guaranteed by contract of the issuer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthId(String);

impl HealthId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for HealthId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for HealthId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for HealthId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}
