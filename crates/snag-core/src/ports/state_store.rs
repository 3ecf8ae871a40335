//! StateStore port - attempt counter の永続化
//!
//! # 設計原則
//! - `load()` はレコードが無ければ `None`（エラーにしない）。ゼロ値は loop が作る
//! - `save()` が失敗しても以前に保存したレコードは壊さない

use async_trait::async_trait;

use crate::domain::{AttemptState, StoreError};

/// StateStore は AttemptState を 1 件だけ保存する
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self) -> Result<Option<AttemptState>, StoreError>;

    async fn save(&self, state: &AttemptState) -> Result<(), StoreError>;
}
