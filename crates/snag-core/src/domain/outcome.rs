//! Outcome - 候補 1 件ごとの結果と loop の終端結果
//!
//! # 設計原則
//! - リトライ判断は `ReasonCode` だけで決まる
//! - vendor のエラー文言は adapter 側で code に変換する（ここでは文字列を見ない）

use std::fmt;

use serde::{Deserialize, Serialize};

use super::attempt::AttemptState;
use super::errors::ErrorKind;
use super::resource::{ResourceAttributes, ResourceId};

/// ReasonCode は create が失敗した理由
///
/// transient（リトライする）と fatal（loop を止める）の分類は `kind()` で決まる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// 候補に空き容量が無い
    OutOfCapacity,
    /// リクエスト過多（429）
    RateLimited,
    /// リクエスト、または attempt 全体が時間内に終わらなかった
    Timeout,
    /// allocator との通信・プロセス・シリアライズの失敗
    Infrastructure,
    /// 分類できない失敗（リトライする）
    Unknown,
    /// service limit / quota を使い切っている
    LimitExceeded,
    /// 認証・認可の失敗
    NotAuthorized,
    /// リクエスト内容が不正
    InvalidRequest,
    /// image や subnet などの前提リソースが無い
    PrerequisiteMissing,
}

impl ReasonCode {
    /// 運用上の分類
    pub fn kind(self) -> ErrorKind {
        match self {
            ReasonCode::OutOfCapacity
            | ReasonCode::RateLimited
            | ReasonCode::Timeout
            | ReasonCode::Unknown => ErrorKind::Transient,
            ReasonCode::Infrastructure => ErrorKind::Infrastructure,
            ReasonCode::LimitExceeded
            | ReasonCode::NotAuthorized
            | ReasonCode::InvalidRequest
            | ReasonCode::PrerequisiteMissing => ErrorKind::Fatal,
        }
    }

    /// true なら loop を止める
    pub fn is_fatal(self) -> bool {
        self.kind() == ErrorKind::Fatal
    }
}

/// FailureReason は分類済みの失敗理由（code + vendor の message）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub code: ReasonCode,
    pub message: String,
}

impl FailureReason {
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

/// AcquisitionResult は候補 1 件に対する create の結果
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionResult {
    Success {
        resource_id: ResourceId,
        attributes: ResourceAttributes,
    },
    TransientFailure(FailureReason),
    FatalFailure(FailureReason),
}

impl AcquisitionResult {
    /// 作成成功
    pub fn success(resource_id: ResourceId, attributes: ResourceAttributes) -> Self {
        AcquisitionResult::Success {
            resource_id,
            attributes,
        }
    }

    /// code に応じて TransientFailure / FatalFailure に振り分ける
    pub fn failure(reason: FailureReason) -> Self {
        if reason.code.is_fatal() {
            AcquisitionResult::FatalFailure(reason)
        } else {
            AcquisitionResult::TransientFailure(reason)
        }
    }
}

/// Outcome は acquisition loop の終端結果
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Acquired {
        resource_id: ResourceId,
        attributes: ResourceAttributes,
    },
    Aborted {
        reason: FailureReason,
    },
    ExhaustedAttempts {
        attempts: u64,
    },
    /// 外部から中断された
    ///
    /// `state` は最後に保存できたレコード。一度も保存できていなければ
    /// in-memory の値。
    Cancelled {
        state: AttemptState,
    },
}

impl Outcome {
    /// 取得成功と中断はどちらも正常終了扱い
    pub fn is_clean_exit(&self) -> bool {
        matches!(self, Outcome::Acquired { .. } | Outcome::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReasonCode::OutOfCapacity, false)]
    #[case(ReasonCode::RateLimited, false)]
    #[case(ReasonCode::Timeout, false)]
    #[case(ReasonCode::Infrastructure, false)]
    #[case(ReasonCode::Unknown, false)]
    #[case(ReasonCode::LimitExceeded, true)]
    #[case(ReasonCode::NotAuthorized, true)]
    #[case(ReasonCode::InvalidRequest, true)]
    #[case(ReasonCode::PrerequisiteMissing, true)]
    fn failure_is_tagged_by_code(#[case] code: ReasonCode, #[case] fatal: bool) {
        let result = AcquisitionResult::failure(FailureReason::new(code, "x"));
        assert_eq!(matches!(result, AcquisitionResult::FatalFailure(_)), fatal);
        assert_eq!(code.is_fatal(), fatal);
    }

    #[test]
    fn reason_code_serializes_screaming_snake() {
        let s = serde_json::to_string(&ReasonCode::OutOfCapacity).unwrap();
        assert_eq!(s, "\"OUT_OF_CAPACITY\"");
    }

    #[test]
    fn failure_reason_display_includes_code() {
        let r = FailureReason::new(ReasonCode::LimitExceeded, "already have one");
        assert_eq!(r.to_string(), "LimitExceeded: already have one");
    }
}
