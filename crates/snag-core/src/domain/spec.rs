//! Spec - 何を、どこに、どれだけ粘って作るか

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// ResourceSpec は allocator に要求するリソース
///
/// Default は Always Free Ampere の最小構成。作成後に resize できる。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSpec {
    pub display_name: String,
    pub shape: String,
    pub ocpus: f32,
    pub memory_gb: f32,
    pub boot_volume_gb: u32,

    /// Image selection: newest image matching OS + version for `shape`.
    pub image_os: String,
    pub image_os_version: String,
}

impl Default for ResourceSpec {
    fn default() -> Self {
        Self {
            display_name: "portfolio-server".to_string(),
            shape: "VM.Standard.A1.Flex".to_string(),
            ocpus: 1.0,
            memory_gb: 6.0,
            boot_volume_gb: 50,
            image_os: "Canonical Ubuntu".to_string(),
            image_os_version: "22.04 Minimal aarch64".to_string(),
        }
    }
}

impl ResourceSpec {
    /// "1 OCPU, 6GB RAM"
    pub fn size_summary(&self) -> String {
        format!("{} OCPU, {}GB RAM", self.ocpus, self.memory_gb)
    }
}

/// PlacementScope は候補を列挙する範囲（region と compartment）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementScope {
    pub region: String,
    pub compartment_id: String,
}

impl Default for PlacementScope {
    fn default() -> Self {
        Self {
            // Always Free capacity only exists in the tenancy's home region.
            region: "ap-hyderabad-1".to_string(),
            compartment_id: String::new(),
        }
    }
}

/// Bounded polling for attributes assigned after creation (public address).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressPolling {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for AddressPolling {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_polls: 12,
        }
    }
}

/// LoopSettings は loop の停止条件と間隔
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopSettings {
    /// Cap on attempts, counted across restarts.
    pub max_attempts: u64,

    /// Fixed wait between attempts.
    pub retry_interval: Duration,

    /// Optional bound on one attempt (all candidates). Elapsing is transient.
    pub attempt_timeout: Option<Duration>,

    pub address_polling: AddressPolling,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_attempts: 50_000,
            retry_interval: Duration::from_secs(30),
            attempt_timeout: None,
            address_polling: AddressPolling::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_spec_defaults_to_small_free_shape() {
        let spec = ResourceSpec::default();
        assert_eq!(spec.shape, "VM.Standard.A1.Flex");
        assert_eq!(spec.size_summary(), "1 OCPU, 6GB RAM");
    }

    #[test]
    fn partial_resource_spec_fills_defaults() {
        let spec: ResourceSpec =
            serde_json::from_str(r#"{ "ocpus": 4, "memory_gb": 24 }"#).expect("deserialize");
        assert_eq!(spec.ocpus, 4.0);
        assert_eq!(spec.memory_gb, 24.0);
        assert_eq!(spec.boot_volume_gb, 50);
        assert_eq!(spec.display_name, "portfolio-server");
    }
}
