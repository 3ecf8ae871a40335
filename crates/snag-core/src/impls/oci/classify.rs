//! classify - OCI のエラー出力を `ReasonCode` に変換
//!
//! OCI の error code / message を読むのはここだけです。CLI は service error を
//! `ServiceError:` の後に JSON object で出力します。

use serde::Deserialize;

use crate::domain::{FailureReason, ReasonCode};

#[derive(Debug, Deserialize)]
struct ServiceErrorDto {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<u16>,
}

/// CLI の stderr を FailureReason に分類する（JSON が無ければ文言で判断）
pub fn classify_service_error(stderr: &str) -> FailureReason {
    match parse_service_error(stderr) {
        Some(dto) => {
            let code = reason_code(&dto);
            let message = if dto.message.is_empty() {
                dto.code
            } else {
                dto.message
            };
            FailureReason::new(code, message)
        }
        None => classify_plain_text(stderr.trim()),
    }
}

fn parse_service_error(stderr: &str) -> Option<ServiceErrorDto> {
    let start = stderr.find('{')?;
    let end = stderr.rfind('}')?;
    serde_json::from_str(stderr.get(start..=end)?).ok()
}

fn reason_code(dto: &ServiceErrorDto) -> ReasonCode {
    // Capacity shortage arrives as a 500 InternalError; only the message tells.
    if dto.message.to_ascii_lowercase().contains("out of host capacity") {
        return ReasonCode::OutOfCapacity;
    }
    match dto.code.as_str() {
        "LimitExceeded" | "QuotaExceeded" => ReasonCode::LimitExceeded,
        "NotAuthenticated" | "NotAuthorizedOrNotFound" | "NotAuthorized" => {
            ReasonCode::NotAuthorized
        }
        "TooManyRequests" => ReasonCode::RateLimited,
        "InvalidParameter" | "MissingParameter" | "CannotParseRequest" | "InvalidParameters" => {
            ReasonCode::InvalidRequest
        }
        "RequestException" => ReasonCode::Infrastructure,
        _ => match dto.status {
            Some(401) | Some(403) => ReasonCode::NotAuthorized,
            Some(429) => ReasonCode::RateLimited,
            Some(400) => ReasonCode::InvalidRequest,
            Some(s) if s >= 500 => ReasonCode::Infrastructure,
            _ => ReasonCode::Unknown,
        },
    }
}

fn classify_plain_text(text: &str) -> FailureReason {
    let lower = text.to_ascii_lowercase();
    let code = if lower.contains("timed out") || lower.contains("timeout") {
        ReasonCode::Timeout
    } else if lower.contains("config file") {
        // Missing or unreadable CLI config: retrying cannot fix it.
        ReasonCode::NotAuthorized
    } else {
        ReasonCode::Unknown
    };
    let message = if text.is_empty() {
        "command failed without output".to_string()
    } else {
        text.to_string()
    };
    FailureReason::new(code, message)
}
