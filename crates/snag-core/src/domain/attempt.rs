//! AttemptState - 永続化する attempt counter
//!
//! loop が保存するレコードはこれ 1 つだけです。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::FailureReason;
use super::resource::ResourceId;

/// AttemptState は loop が永続化する唯一のレコード
///
/// # 不変条件
/// - `attempts` は再起動をまたいでも減らない
/// - `succeeded` が true なら `resource_id` に作成済みのリソースがある
///
/// 古い state file の `success` / `instance_id` も読み込める。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
    #[serde(default)]
    pub attempts: u64,

    #[serde(default = "Utc::now")]
    pub started_at: DateTime<Utc>,

    #[serde(default, alias = "success")]
    pub succeeded: bool,

    #[serde(default, alias = "instance_id", skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<String>,
}

impl AttemptState {
    /// Zero-value record for a first run.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            attempts: 0,
            started_at,
            succeeded: false,
            resource_id: None,
            updated_at: None,
            last_failure: None,
        }
    }

    /// Count a new attempt and return its 1-indexed number.
    pub fn begin_attempt(&mut self, now: DateTime<Utc>) -> u64 {
        self.attempts = self.attempts.saturating_add(1);
        self.updated_at = Some(now);
        self.attempts
    }

    /// 直近の失敗理由を残す（attempts は変えない）
    pub fn record_failure(&mut self, now: DateTime<Utc>, reason: &FailureReason) {
        self.last_failure = Some(reason.to_string());
        self.updated_at = Some(now);
    }

    /// 成功を記録する。`last_failure` は消える
    pub fn mark_succeeded(&mut self, now: DateTime<Utc>, resource_id: &ResourceId) {
        self.succeeded = true;
        self.resource_id = Some(resource_id.as_str().to_string());
        self.last_failure = None;
        self.updated_at = Some(now);
    }

    /// `max_attempts` に到達したか
    pub fn is_exhausted(&self, max_attempts: u64) -> bool {
        self.attempts >= max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReasonCode;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn begin_attempt_is_one_indexed_and_monotonic() {
        let mut state = AttemptState::new(t0());
        assert_eq!(state.begin_attempt(t0()), 1);
        assert_eq!(state.begin_attempt(t0()), 2);
        assert_eq!(state.attempts, 2);
        assert!(state.is_exhausted(2));
        assert!(!state.is_exhausted(3));
    }

    #[test]
    fn success_clears_last_failure() {
        let mut state = AttemptState::new(t0());
        state.begin_attempt(t0());
        state.record_failure(t0(), &FailureReason::new(ReasonCode::OutOfCapacity, "full"));
        assert!(state.last_failure.is_some());

        state.mark_succeeded(t0(), &ResourceId::new("ocid1.instance.x"));
        assert!(state.succeeded);
        assert_eq!(state.resource_id.as_deref(), Some("ocid1.instance.x"));
        assert!(state.last_failure.is_none());
    }

    #[test]
    fn reads_legacy_field_names() {
        let json = r#"{
            "attempts": 12,
            "started_at": "2025-01-05T10:00:00Z",
            "success": true,
            "instance_id": "ocid1.instance.legacy"
        }"#;
        let state: AttemptState = serde_json::from_str(json).expect("deserialize");
        assert_eq!(state.attempts, 12);
        assert!(state.succeeded);
        assert_eq!(state.resource_id.as_deref(), Some("ocid1.instance.legacy"));
    }

    #[test]
    fn missing_fields_default() {
        let state: AttemptState =
            serde_json::from_str(r#"{ "attempts": 5 }"#).expect("deserialize");
        assert_eq!(state.attempts, 5);
        assert!(!state.succeeded);
        assert!(state.resource_id.is_none());
    }
}
