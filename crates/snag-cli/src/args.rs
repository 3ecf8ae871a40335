//! args - コマンドライン引数（clap derive）
//!
//! `///` は `--help` の文面になるので英語のままにしています。

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use snag_core::config::SnagConfig;
use snag_core::observability::LogFormat;

#[derive(Debug, Parser)]
#[command(
    name = "snag",
    version,
    about = "Keep asking the cloud for a free instance until it says yes"
)]
pub struct Cli {
    /// JSON config file. Missing file means all defaults.
    #[arg(long, short, global = true, default_value = "snag.json")]
    pub config: PathBuf,

    /// Fallback when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[arg(long, global = true, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the acquisition loop until an instance is created.
    Hunt(HuntArgs),
    /// Check connectivity and every prerequisite the hunt needs.
    Check,
    /// Print the persisted attempt state.
    Status(StateFileArg),
}

#[derive(Debug, Args)]
pub struct StateFileArg {
    #[arg(long)]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct HuntArgs {
    #[arg(long)]
    pub max_attempts: Option<u64>,

    /// Seconds between attempts.
    #[arg(long)]
    pub retry_interval: Option<u64>,

    #[arg(long)]
    pub region: Option<String>,

    #[command(flatten)]
    pub state: StateFileArg,
}

impl StateFileArg {
    // 指定があれば config を上書き
    pub fn apply(&self, config: &mut SnagConfig) {
        if let Some(path) = &self.state_file {
            config.state_file = path.clone();
        }
    }
}

impl HuntArgs {
    pub fn apply(&self, config: &mut SnagConfig) {
        if let Some(n) = self.max_attempts {
            config.max_attempts = n;
        }
        if let Some(secs) = self.retry_interval {
            config.retry_interval_secs = secs;
        }
        if let Some(region) = &self.region {
            config.scope.region = region.clone();
        }
        self.state.apply(config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hunt_overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "snag",
            "hunt",
            "--max-attempts",
            "3",
            "--retry-interval",
            "5",
            "--region",
            "eu-frankfurt-1",
            "--state-file",
            "/tmp/s.json",
        ])
        .unwrap();
        let Command::Hunt(args) = cli.command else {
            panic!("expected hunt");
        };

        let mut config = SnagConfig::default();
        args.apply(&mut config);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.retry_interval_secs, 5);
        assert_eq!(config.scope.region, "eu-frankfurt-1");
        assert_eq!(config.state_file, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn no_overrides_keep_config() {
        let cli = Cli::try_parse_from(["snag", "hunt"]).unwrap();
        let Command::Hunt(args) = cli.command else {
            panic!("expected hunt");
        };
        let mut config = SnagConfig::default();
        args.apply(&mut config);
        assert_eq!(config, SnagConfig::default());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["snag", "check", "--log-format", "json", "-c", "x.json"]).unwrap();
        assert!(matches!(cli.command, Command::Check));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.config, PathBuf::from("x.json"));
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert!(Cli::try_parse_from(["snag", "status", "--log-format", "xml"]).is_err());
    }
}
