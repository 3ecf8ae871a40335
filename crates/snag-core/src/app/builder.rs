//! LoopBuilder - AcquisitionLoop の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - allocator / state_store は必須。無ければ build() が BuildError を返す
//! - notifier / clock / id generator は省略可能（LogNotifier / SystemClock / ULID）
//! - max_attempts == 0 は起動時に弾く

use std::sync::Arc;

use tokio::sync::watch;

use super::acquisition_loop::AcquisitionLoop;
use crate::domain::{LoopSettings, PlacementScope, ResourceSpec};
use crate::impls::LogNotifier;
use crate::ports::{Allocator, Clock, IdGenerator, Notifier, StateStore, SystemClock, UlidGenerator};

/// # 使用例
/// ```ignore
/// let lp = LoopBuilder::new()
///     .allocator(Arc::new(allocator))
///     .state_store(Arc::new(JsonFileStateStore::new("snag_state.json")))
///     .settings(config.loop_settings())
///     .shutdown(rx)
///     .build()?;
/// let outcome = lp.run().await?;
/// ```
#[derive(Default)]
pub struct LoopBuilder {
    allocator: Option<Arc<dyn Allocator>>,
    store: Option<Arc<dyn StateStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    spec: ResourceSpec,
    scope: PlacementScope,
    settings: LoopSettings,
    shutdown: Option<watch::Receiver<bool>>,
}

/// BuildError は build 時の構成エラー（Fail-fast）
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("invalid loop settings: {0}")]
    InvalidSettings(String),
}

impl LoopBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocator(mut self, allocator: Arc<dyn Allocator>) -> Self {
        self.allocator = Some(allocator);
        self
    }

    pub fn state_store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn spec(mut self, spec: ResourceSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn scope(mut self, scope: PlacementScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn settings(mut self, settings: LoopSettings) -> Self {
        self.settings = settings;
        self
    }

    /// `true` が送られたら loop は状態を保存して Cancelled で抜ける
    pub fn shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn build(self) -> Result<AcquisitionLoop, BuildError> {
        let allocator = self
            .allocator
            .ok_or(BuildError::MissingCollaborator("allocator"))?;
        let store = self
            .store
            .ok_or(BuildError::MissingCollaborator("state_store"))?;

        if self.settings.max_attempts == 0 {
            return Err(BuildError::InvalidSettings(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        // sender を即 drop した receiver は shutdown を一度も通知しない
        let shutdown = self.shutdown.unwrap_or_else(|| watch::channel(false).1);

        Ok(AcquisitionLoop {
            allocator,
            store,
            notifier,
            clock,
            ids,
            spec: self.spec,
            scope: self.scope,
            settings: self.settings,
            shutdown,
        })
    }
}
