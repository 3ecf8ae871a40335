//! OciCliAllocator - `oci` CLI 経由の Allocator 実装
//!
//! # フロー
//! 1. `iam availability-domain list` で候補（AD）を列挙
//! 2. 初回の create で前提リソース（image, subnet, SSH 公開鍵）を解決して
//!    キャッシュ
//! 3. `compute instance launch` を AD ごとに実行
//! 4. `compute instance list-vnics` で public IP を取得
//!
//! エラーは CLI の ServiceError JSON を `classify` で `ReasonCode` に変換します。

mod classify;
mod dto;
mod runner;

pub use self::classify::classify_service_error;
pub use self::runner::{CommandOutput, CommandRunner, ProcessRunner};

use std::path::PathBuf;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::debug;

use self::dto::{AvailabilityDomainDto, Envelope, InstanceDto, NamedResourceDto, VnicDto};
use crate::domain::{
    AcquisitionResult, AllocatorError, PlacementCandidate, PlacementScope, ReasonCode,
    ResourceAttributes, ResourceId, ResourceSpec,
};
use crate::ports::Allocator;

/// Settings for driving the OCI CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OciSettings {
    /// CLI binary, looked up on PATH unless absolute.
    pub cli_path: String,
    pub config_file: Option<PathBuf>,
    pub profile: Option<String>,

    /// First VCN whose display name contains this (case-insensitive) is used.
    pub vcn_name_hint: String,
    /// First subnet whose display name contains any of these is used.
    pub subnet_name_hints: Vec<String>,

    /// Public key files, first existing one wins. `~/` expands to `$HOME`.
    pub ssh_public_key_candidates: Vec<String>,
}

impl Default for OciSettings {
    fn default() -> Self {
        Self {
            cli_path: "oci".to_string(),
            config_file: None,
            profile: None,
            vcn_name_hint: "portfolio".to_string(),
            subnet_name_hints: vec!["public".to_string(), "portfolio".to_string()],
            ssh_public_key_candidates: vec![
                "~/.ssh/oci_portfolio_key.pub".to_string(),
                "~/.ssh/id_rsa.pub".to_string(),
            ],
        }
    }
}

impl OciSettings {
    pub fn resolve_ssh_key(&self) -> Option<PathBuf> {
        self.ssh_public_key_candidates
            .iter()
            .map(|p| expand_home(p))
            .find(|p| p.is_file())
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(path),
    }
}

/// Resolved once, reused by every later create request.
#[derive(Debug, Clone)]
struct Prerequisites {
    image_id: String,
    subnet_id: String,
    ssh_key: PathBuf,
}

/// `snag check` の 1 行分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightCheck {
    /// 確認項目の名前
    pub name: &'static str,
    /// 成功なら見つかったもの、失敗なら理由
    pub result: Result<String, String>,
}

/// OciCliAllocator は `oci` CLI を子プロセスとして呼ぶ Allocator
///
/// # 設計原則
/// - 前提リソース（image, subnet, SSH 公開鍵）は最初の create で一度だけ解決する
/// - CLI の出力は DTO を通してからドメイン型に変換する
/// - `R` を差し替えれば実プロセス無しでテストできる
pub struct OciCliAllocator<R = ProcessRunner> {
    runner: R,
    settings: OciSettings,
    scope: PlacementScope,
    prerequisites: OnceCell<Prerequisites>,
}

impl OciCliAllocator<ProcessRunner> {
    /// 実プロセスを起動する allocator
    pub fn new(settings: OciSettings, scope: PlacementScope) -> Self {
        Self::with_runner(ProcessRunner, settings, scope)
    }
}

impl<R: CommandRunner> OciCliAllocator<R> {
    /// 任意の CommandRunner を使う（テスト用）
    pub fn with_runner(runner: R, settings: OciSettings, scope: PlacementScope) -> Self {
        Self {
            runner,
            settings,
            scope,
            prerequisites: OnceCell::new(),
        }
    }

    fn global_args(&self, region: &str) -> Vec<String> {
        let mut args = vec!["--region".to_string(), region.to_string()];
        if let Some(config_file) = &self.settings.config_file {
            args.push("--config-file".to_string());
            args.push(config_file.display().to_string());
        }
        if let Some(profile) = &self.settings.profile {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    /// Run one CLI command and decode its `data`. Empty output means no data.
    async fn run_json<T: DeserializeOwned>(
        &self,
        region: &str,
        command: &[&str],
    ) -> Result<Option<T>, AllocatorError> {
        let mut args = self.global_args(region);
        args.extend(command.iter().map(|s| s.to_string()));
        debug!(command = %command.iter().take(3).copied().collect::<Vec<_>>().join(" "), "oci cli");

        let output = self.runner.run(&self.settings.cli_path, &args).await?;
        if !output.success {
            let reason = classify_service_error(&output.stderr);
            return Err(AllocatorError::Service {
                code: reason.code,
                message: reason.message,
            });
        }
        if output.stdout.trim().is_empty() {
            return Ok(None);
        }
        let envelope: Envelope<T> = serde_json::from_str(&output.stdout)
            .map_err(|e| AllocatorError::Decode(format!("invalid oci cli json: {e}")))?;
        Ok(Some(envelope.data))
    }

    async fn availability_domains(
        &self,
        scope: &PlacementScope,
    ) -> Result<Vec<String>, AllocatorError> {
        let ads: Option<Vec<AvailabilityDomainDto>> = self
            .run_json(
                &scope.region,
                &[
                    "iam",
                    "availability-domain",
                    "list",
                    "--compartment-id",
                    &scope.compartment_id,
                ],
            )
            .await?;
        Ok(ads.unwrap_or_default().into_iter().map(|ad| ad.name).collect())
    }

    async fn latest_image(
        &self,
        spec: &ResourceSpec,
    ) -> Result<Option<NamedResourceDto>, AllocatorError> {
        let images: Option<Vec<NamedResourceDto>> = self
            .run_json(
                &self.scope.region,
                &[
                    "compute",
                    "image",
                    "list",
                    "--compartment-id",
                    &self.scope.compartment_id,
                    "--operating-system",
                    &spec.image_os,
                    "--operating-system-version",
                    &spec.image_os_version,
                    "--shape",
                    &spec.shape,
                    "--sort-by",
                    "TIMECREATED",
                    "--sort-order",
                    "DESC",
                    "--limit",
                    "1",
                ],
            )
            .await?;
        Ok(images.and_then(|v| v.into_iter().next()))
    }

    async fn vcns(&self) -> Result<Vec<NamedResourceDto>, AllocatorError> {
        let vcns: Option<Vec<NamedResourceDto>> = self
            .run_json(
                &self.scope.region,
                &[
                    "network",
                    "vcn",
                    "list",
                    "--compartment-id",
                    &self.scope.compartment_id,
                    "--all",
                ],
            )
            .await?;
        Ok(vcns.unwrap_or_default())
    }

    async fn subnets(&self, vcn_id: &str) -> Result<Vec<NamedResourceDto>, AllocatorError> {
        let subnets: Option<Vec<NamedResourceDto>> = self
            .run_json(
                &self.scope.region,
                &[
                    "network",
                    "subnet",
                    "list",
                    "--compartment-id",
                    &self.scope.compartment_id,
                    "--vcn-id",
                    vcn_id,
                    "--all",
                ],
            )
            .await?;
        Ok(subnets.unwrap_or_default())
    }

    async fn select_subnet(&self) -> Result<Option<NamedResourceDto>, AllocatorError> {
        let hint = self.settings.vcn_name_hint.to_lowercase();
        let Some(vcn) = self
            .vcns()
            .await?
            .into_iter()
            .find(|v| v.display_name.to_lowercase().contains(&hint))
        else {
            return Ok(None);
        };

        let hints: Vec<String> = self
            .settings
            .subnet_name_hints
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        Ok(self.subnets(&vcn.id).await?.into_iter().find(|s| {
            let name = s.display_name.to_lowercase();
            hints.iter().any(|h| name.contains(h))
        }))
    }

    async fn prerequisites(&self, spec: &ResourceSpec) -> Result<&Prerequisites, AllocatorError> {
        self.prerequisites
            .get_or_try_init(|| self.resolve_prerequisites(spec))
            .await
    }

    async fn resolve_prerequisites(
        &self,
        spec: &ResourceSpec,
    ) -> Result<Prerequisites, AllocatorError> {
        let image = self.latest_image(spec).await?;
        let subnet = self.select_subnet().await?;
        let ssh_key = self.settings.resolve_ssh_key();

        let mut missing = Vec::new();
        if image.is_none() {
            missing.push("image");
        }
        if subnet.is_none() {
            missing.push("subnet");
        }
        if ssh_key.is_none() {
            missing.push("ssh_key");
        }

        match (image, subnet, ssh_key) {
            (Some(image), Some(subnet), Some(ssh_key)) => {
                debug!(
                    image = %image.display_name,
                    subnet = %subnet.display_name,
                    "prerequisites resolved"
                );
                Ok(Prerequisites {
                    image_id: image.id,
                    subnet_id: subnet.id,
                    ssh_key,
                })
            }
            _ => Err(AllocatorError::Service {
                code: ReasonCode::PrerequisiteMissing,
                message: format!("missing: {}", missing.join(", ")),
            }),
        }
    }

    async fn launch(
        &self,
        candidate: &PlacementCandidate,
        spec: &ResourceSpec,
    ) -> Result<InstanceDto, AllocatorError> {
        let prereq = self.prerequisites(spec).await?;
        let shape_config = serde_json::json!({
            "ocpus": spec.ocpus,
            "memoryInGBs": spec.memory_gb,
        })
        .to_string();
        let boot_volume = spec.boot_volume_gb.to_string();
        let ssh_key = prereq.ssh_key.display().to_string();

        let instance: Option<InstanceDto> = self
            .run_json(
                &self.scope.region,
                &[
                    "compute",
                    "instance",
                    "launch",
                    "--compartment-id",
                    &self.scope.compartment_id,
                    "--availability-domain",
                    candidate.as_str(),
                    "--display-name",
                    &spec.display_name,
                    "--shape",
                    &spec.shape,
                    "--shape-config",
                    &shape_config,
                    "--image-id",
                    &prereq.image_id,
                    "--boot-volume-size-in-gbs",
                    &boot_volume,
                    "--subnet-id",
                    &prereq.subnet_id,
                    "--assign-public-ip",
                    "true",
                    "--ssh-authorized-keys-file",
                    &ssh_key,
                ],
            )
            .await?;
        instance.ok_or_else(|| AllocatorError::Decode("launch returned no instance".to_string()))
    }

    /// 接続確認。hunt が依存する lookup をそれぞれ独立に試す
    pub async fn preflight(&self, spec: &ResourceSpec) -> Vec<PreflightCheck> {
        let mut checks = Vec::new();

        checks.push(PreflightCheck {
            name: "availability domains",
            result: self
                .availability_domains(&self.scope)
                .await
                .map(|ads| ads.join(", "))
                .map_err(|e| e.to_string()),
        });

        checks.push(PreflightCheck {
            name: "image",
            result: match self.latest_image(spec).await {
                Ok(Some(image)) => Ok(format!("{} ({})", image.display_name, image.id)),
                Ok(None) => Err(format!(
                    "no {} {} image for {}",
                    spec.image_os, spec.image_os_version, spec.shape
                )),
                Err(e) => Err(e.to_string()),
            },
        });

        checks.push(PreflightCheck {
            name: "ssh key",
            result: self
                .settings
                .resolve_ssh_key()
                .map(|p| p.display().to_string())
                .ok_or_else(|| "NOT FOUND".to_string()),
        });

        checks.push(PreflightCheck {
            name: "vcns",
            result: self
                .vcns()
                .await
                .map(|v| v.into_iter().map(|v| v.display_name).collect::<Vec<_>>().join(", "))
                .map_err(|e| e.to_string()),
        });

        checks.push(PreflightCheck {
            name: "subnet",
            result: match self.select_subnet().await {
                Ok(Some(subnet)) => Ok(format!("{} ({})", subnet.display_name, subnet.id)),
                Ok(None) => Err(format!("no subnet matching {:?} in a vcn matching {:?}",
                    self.settings.subnet_name_hints, self.settings.vcn_name_hint)),
                Err(e) => Err(e.to_string()),
            },
        });

        checks
    }
}

#[async_trait]
impl<R: CommandRunner> Allocator for OciCliAllocator<R> {
    async fn list_placement_candidates(
        &self,
        scope: &PlacementScope,
    ) -> Result<Vec<PlacementCandidate>, AllocatorError> {
        Ok(self
            .availability_domains(scope)
            .await?
            .into_iter()
            .map(PlacementCandidate::new)
            .collect())
    }

    async fn create_resource(
        &self,
        candidate: &PlacementCandidate,
        spec: &ResourceSpec,
    ) -> AcquisitionResult {
        match self.launch(candidate, spec).await {
            Ok(instance) => {
                let mut attributes = ResourceAttributes::default();
                if let Some(state) = instance.lifecycle_state {
                    attributes = attributes.with_lifecycle_state(state);
                }
                AcquisitionResult::success(ResourceId::new(instance.id), attributes)
            }
            Err(e) => AcquisitionResult::failure(e.reason()),
        }
    }

    async fn describe_resource(
        &self,
        id: &ResourceId,
    ) -> Result<ResourceAttributes, AllocatorError> {
        let vnics: Option<Vec<VnicDto>> = self
            .run_json(
                &self.scope.region,
                &["compute", "instance", "list-vnics", "--instance-id", id.as_str()],
            )
            .await?;
        let vnics = vnics.unwrap_or_default();
        let vnic = vnics
            .iter()
            .find(|v| v.is_primary == Some(true))
            .or_else(|| vnics.first());

        let mut attributes = ResourceAttributes::default();
        if let Some(ip) = vnic.and_then(|v| v.public_ip.clone()) {
            attributes = attributes.with_address(ip);
        }
        Ok(attributes)
    }
}
