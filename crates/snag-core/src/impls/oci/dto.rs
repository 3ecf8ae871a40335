//! DTO - OCI CLI が出力する JSON の形
//!
//! key は kebab-case で、本体は必ず `data` に包まれています。

use serde::Deserialize;

/// `{"data": ...}` の外側
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AvailabilityDomainDto {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NamedResourceDto {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InstanceDto {
    pub id: String,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct VnicDto {
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub is_primary: Option<bool>,
}
