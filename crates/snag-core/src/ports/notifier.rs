//! Notifier port - 成功時の通知
//!
//! 失敗は呼び出し側（loop）でログに残して握りつぶします。

use async_trait::async_trait;

use crate::domain::NotifyError;

/// Notifier は best-effort の外部通知
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}
