//! SnagConfig - 起動時に一度だけ読み込む設定
//!
//! JSON ファイル 1 つ。全フィールドに default があるので `{}` でも動きます。
//! グローバルな可変設定は持たず、読み込んだ値を各 constructor に渡します。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{AddressPolling, LoopSettings, PlacementScope, ResourceSpec};
use crate::impls::OciSettings;

/// ConfigError は起動時の設定エラー（CLI は exit 3）
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// address polling の設定（秒単位）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressPollingConfig {
    pub interval_secs: u64,
    pub max_polls: u32,
}

impl Default for AddressPollingConfig {
    fn default() -> Self {
        let d = AddressPolling::default();
        Self {
            interval_secs: d.interval.as_secs(),
            max_polls: d.max_polls,
        }
    }
}

/// Telegram 通知の設定
///
/// bot token はファイルに書かず、token を持つ環境変数の名前だけを持つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token_env: String,
    pub chat_id_env: String,
    /// `chat_id_env` が未設定の時に使う
    pub chat_id: Option<String>,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: "TELEGRAM_BOT_TOKEN".to_string(),
            chat_id_env: "TELEGRAM_CHAT_ID".to_string(),
            chat_id: None,
        }
    }
}

impl TelegramConfig {
    /// token と chat_id が両方そろっていれば `(token, chat_id)`
    pub fn credentials(&self) -> Option<(String, String)> {
        self.credentials_from(|name| std::env::var(name).ok())
    }

    fn credentials_from(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<(String, String)> {
        let token = lookup(&self.bot_token_env).filter(|t| !t.is_empty())?;
        let chat_id = lookup(&self.chat_id_env)
            .or_else(|| self.chat_id.clone())
            .filter(|c| !c.is_empty())?;
        Some((token, chat_id))
    }
}

/// SnagConfig は設定ファイル全体
///
/// # Default
/// - resource: VM.Standard.A1.Flex, 1 OCPU, 6GB
/// - scope.region: ap-hyderabad-1
/// - retry_interval_secs: 30, max_attempts: 50000
/// - state_file: snag_state.json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnagConfig {
    pub resource: ResourceSpec,
    pub scope: PlacementScope,
    pub retry_interval_secs: u64,
    pub max_attempts: u64,
    pub attempt_timeout_secs: Option<u64>,
    pub address_polling: AddressPollingConfig,
    pub state_file: PathBuf,
    pub oci: OciSettings,
    pub telegram: TelegramConfig,
}

impl Default for SnagConfig {
    fn default() -> Self {
        let loop_defaults = LoopSettings::default();
        Self {
            resource: ResourceSpec::default(),
            scope: PlacementScope::default(),
            retry_interval_secs: loop_defaults.retry_interval.as_secs(),
            max_attempts: loop_defaults.max_attempts,
            attempt_timeout_secs: None,
            address_polling: AddressPollingConfig::default(),
            state_file: PathBuf::from("snag_state.json"),
            oci: OciSettings::default(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl SnagConfig {
    /// JSON ファイルを読む。無いフィールドは default
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// ファイル自体が無ければ全部 default
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// 起動時検証（Fail-fast）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".to_string()));
        }
        if self.scope.compartment_id.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "scope.compartment_id is required (tenancy OCID works for the root compartment)"
                    .to_string(),
            ));
        }
        if self.scope.region.trim().is_empty() {
            return Err(ConfigError::Invalid("scope.region is required".to_string()));
        }
        if !(self.resource.ocpus > 0.0) || !(self.resource.memory_gb > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "resource size must be positive, got {}",
                self.resource.size_summary()
            )));
        }
        if self.resource.boot_volume_gb == 0 {
            return Err(ConfigError::Invalid(
                "resource.boot_volume_gb must be positive".to_string(),
            ));
        }
        if self.attempt_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("attempt_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// AcquisitionLoop に渡す LoopSettings に変換
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings {
            max_attempts: self.max_attempts,
            retry_interval: Duration::from_secs(self.retry_interval_secs),
            attempt_timeout: self.attempt_timeout_secs.map(Duration::from_secs),
            address_polling: AddressPolling {
                interval: Duration::from_secs(self.address_polling.interval_secs),
                max_polls: self.address_polling.max_polls,
            },
        }
    }
}
