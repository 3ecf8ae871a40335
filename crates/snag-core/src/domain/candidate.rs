//! PlacementCandidate - create を試す候補（availability domain, zone など）

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque slot inside a placement scope where a create request can be tried.
///
/// The loop never interprets the name; it only passes it back to the allocator
/// that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlacementCandidate(String);

impl PlacementCandidate {
    /// allocator が返した名前をそのまま包む
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlacementCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlacementCandidate {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
