//! Errors - エラー型と分類
//!
//! 各 port ごとにエラー型を分け、`ErrorKind` で運用上の扱いを決めます。

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::outcome::{FailureReason, ReasonCode};

/// ErrorKind は失敗の運用分類
///
/// - Transient: 一時的なエラー（リトライする）
/// - Fatal: 恒久的なエラー（リトライ無意味、ループを止める）
/// - Infrastructure: 周辺システムとの通信・シリアライズの失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Transient,
    Fatal,
    Infrastructure,
}

/// StateStore の失敗。loop は in-memory の状態を保持して次回に再保存する。
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state file io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state record is not valid json: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Notifier の失敗。ログに残して握りつぶす。
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification transport failed: {0}")]
    Transport(String),

    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Allocator との通信で起きた失敗。
#[derive(Debug, Error)]
pub enum AllocatorError {
    #[error("failed to run allocator command `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("allocator returned malformed output: {0}")]
    Decode(String),

    #[error("allocator service error ({code:?}): {message}")]
    Service { code: ReasonCode, message: String },
}

impl AllocatorError {
    /// loop が扱う FailureReason に変換する（Service 以外は Infrastructure）
    pub fn reason(&self) -> FailureReason {
        match self {
            AllocatorError::Service { code, message } => FailureReason::new(*code, message.clone()),
            other => FailureReason::new(ReasonCode::Infrastructure, other.to_string()),
        }
    }

    /// `reason()` の code から決まる運用分類
    pub fn kind(&self) -> ErrorKind {
        self.reason().code.kind()
    }
}
