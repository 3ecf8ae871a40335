//! Resource - 取得したリソースの id と、作成後に割り当てられる属性

use std::fmt;

use serde::{Deserialize, Serialize};

/// ResourceId は vendor が払い出したリソース ID（OCI なら instance OCID）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attributes the allocator reports for a resource.
///
/// Both fields may be missing right after creation; the address in particular
/// is assigned asynchronously.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<String>,
}

impl ResourceAttributes {
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.public_address = Some(address.into());
        self
    }

    pub fn with_lifecycle_state(mut self, state: impl Into<String>) -> Self {
        self.lifecycle_state = Some(state.into());
        self
    }

    /// 空でない public address を持っているか
    pub fn has_address(&self) -> bool {
        self.public_address.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Overlay `newer` on top of `self`, keeping fields `newer` leaves empty.
    pub fn merge(self, newer: ResourceAttributes) -> Self {
        Self {
            public_address: newer.public_address.or(self.public_address),
            lifecycle_state: newer.lifecycle_state.or(self.lifecycle_state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_address_does_not_count() {
        let attrs = ResourceAttributes::default().with_address("");
        assert!(!attrs.has_address());
        assert!(ResourceAttributes::default().with_address("10.0.0.1").has_address());
    }

    #[test]
    fn merge_prefers_newer_fields() {
        let old = ResourceAttributes::default().with_lifecycle_state("PROVISIONING");
        let new = ResourceAttributes::default().with_address("203.0.113.7");

        let merged = old.merge(new);
        assert_eq!(merged.public_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(merged.lifecycle_state.as_deref(), Some("PROVISIONING"));
    }
}
