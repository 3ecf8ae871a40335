//! observability - tracing の初期化
//!
//! `RUST_LOG` があればそれを優先し、無ければ `default_level` を使います。

use std::fmt;
use std::str::FromStr;

use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// ログの出力形式（`--log-format`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}` (expected text or json)")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Text => f.write_str("text"),
            LogFormat::Json => f.write_str("json"),
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Calling it twice only logs a warning.
pub fn init_tracing(default_level: &str, format: LogFormat) {
    let builder = tfmt().with_env_filter(env_filter(default_level)).with_target(false);
    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if let Err(e) = result {
        warn!(error = %e, "tracing init failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("text", LogFormat::Text)]
    #[case("JSON", LogFormat::Json)]
    #[case("pretty", LogFormat::Text)]
    fn parses_log_format(#[case] input: &str, #[case] expected: LogFormat) {
        assert_eq!(input.parse::<LogFormat>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_format() {
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn second_init_does_not_panic() {
        init_tracing("info", LogFormat::Text);
        init_tracing("debug", LogFormat::Json);
    }
}
