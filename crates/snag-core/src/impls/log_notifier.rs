//! LogNotifier - 通知先が設定されていない時の Notifier（ログに出すだけ）

use async_trait::async_trait;
use tracing::info;

use crate::domain::NotifyError;
use crate::ports::Notifier;

/// LogNotifier は本文を info ログに出す
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        info!(target: "snag::notify", "{message}");
        Ok(())
    }
}
