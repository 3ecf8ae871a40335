//! InMemoryStateStore - 開発・テスト用の StateStore
//!
//! `fail_next_saves(n)` で save の失敗を注入できます。

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{AttemptState, StoreError};
use crate::ports::StateStore;

/// InMemoryStateStore はプロセス内だけで状態を持つ
#[derive(Default)]
pub struct InMemoryStateStore {
    state: Mutex<Option<AttemptState>>,
    saves: AtomicUsize,
    failures_left: AtomicU32,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 既存のレコードを持った状態で始める
    pub fn with_state(state: AttemptState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            ..Self::default()
        }
    }

    /// 次の `n` 回の save を失敗させる（保存済みのレコードは変えない）
    pub fn fail_next_saves(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    /// 現在保存されているレコード
    pub async fn snapshot(&self) -> Option<AttemptState> {
        self.state.lock().await.clone()
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self) -> Result<Option<AttemptState>, StoreError> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &AttemptState) -> Result<(), StoreError> {
        let injected = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(StoreError::Other("injected save failure".to_string()));
        }
        *self.state.lock().await = Some(state.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
