//! snag - 空きが出るまで free tier instance の作成をリトライし続ける CLI
//!
//! # Exit code
//! - 0: 取得成功 / Ctrl-C による中断
//! - 1: fatal error で中断
//! - 2: max_attempts に到達
//! - 3: 起動時・設定のエラー

mod args;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use snag_core::app::LoopBuilder;
use snag_core::config::SnagConfig;
use snag_core::domain::Outcome;
use snag_core::impls::{JsonFileStateStore, LogNotifier, OciCliAllocator, TelegramNotifier};
use snag_core::observability::init_tracing;
use snag_core::ports::{Notifier, StateStore};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::args::{Cli, Command, HuntArgs, StateFileArg};

const EXIT_STARTUP: u8 = 3;

fn exit_code(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Acquired { .. } | Outcome::Cancelled { .. } => 0,
        Outcome::Aborted { .. } => 1,
        Outcome::ExhaustedAttempts { .. } => 2,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let mut config = match SnagConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load config");
            return ExitCode::from(EXIT_STARTUP);
        }
    };

    let code = match cli.command {
        Command::Hunt(args) => hunt(&mut config, &args).await,
        Command::Check => check(&config).await,
        Command::Status(args) => status(&mut config, &args).await,
    };
    ExitCode::from(code)
}

async fn hunt(config: &mut SnagConfig, args: &HuntArgs) -> u8 {
    args.apply(config);
    if let Err(e) = config.validate() {
        error!(error = %e, "refusing to start");
        return EXIT_STARTUP;
    }
    let Some(ssh_key) = config.oci.resolve_ssh_key() else {
        error!(
            candidates = ?config.oci.ssh_public_key_candidates,
            "no ssh public key found; generate one or set oci.ssh_public_key_candidates"
        );
        return EXIT_STARTUP;
    };
    info!(
        ssh_key = %ssh_key.display(),
        state_file = %config.state_file.display(),
        "configuration ok"
    );

    let notifier: Arc<dyn Notifier> = match config.telegram.credentials() {
        Some((token, chat_id)) => match TelegramNotifier::new(token, chat_id) {
            Ok(telegram) => Arc::new(telegram),
            Err(e) => {
                warn!(error = %e, "telegram client unavailable; logging notifications instead");
                Arc::new(LogNotifier)
            }
        },
        None => {
            warn!(
                env = %config.telegram.bot_token_env,
                "telegram not configured; logging notifications instead"
            );
            Arc::new(LogNotifier)
        }
    };

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received; finishing current step");
            let _ = tx.send(true);
        }
    });

    let built = LoopBuilder::new()
        .allocator(Arc::new(OciCliAllocator::new(config.oci.clone(), config.scope.clone())))
        .state_store(Arc::new(JsonFileStateStore::new(&config.state_file)))
        .notifier(notifier)
        .spec(config.resource.clone())
        .scope(config.scope.clone())
        .settings(config.loop_settings())
        .shutdown(rx)
        .build();
    let acquisition = match built {
        Ok(acquisition) => acquisition,
        Err(e) => {
            error!(error = %e, "failed to wire acquisition loop");
            return EXIT_STARTUP;
        }
    };

    match acquisition.run().await {
        Ok(outcome) => exit_code(&outcome),
        Err(e) => {
            error!(error = %e, "acquisition loop could not start");
            EXIT_STARTUP
        }
    }
}

async fn check(config: &SnagConfig) -> u8 {
    println!("region: {}", config.scope.region);
    println!("shape:  {} ({})", config.resource.shape, config.resource.size_summary());

    // 設定が壊れていれば oci は呼ばない
    if let Err(e) = config.validate() {
        println!("  FAIL  {:<22} {e}", "config");
        println!("config is invalid; skipping connectivity checks");
        return EXIT_STARTUP;
    }

    let allocator = OciCliAllocator::new(config.oci.clone(), config.scope.clone());
    let checks = allocator.preflight(&config.resource).await;
    let mut failed = 0;
    for check in &checks {
        match &check.result {
            Ok(detail) => println!("  ok    {:<22} {detail}", check.name),
            Err(detail) => {
                failed += 1;
                println!("  FAIL  {:<22} {detail}", check.name);
            }
        }
    }

    if failed == 0 {
        println!("all {} checks passed", checks.len());
        0
    } else {
        println!("{failed} check(s) failed");
        EXIT_STARTUP
    }
}

async fn status(config: &mut SnagConfig, args: &StateFileArg) -> u8 {
    args.apply(config);
    let store = JsonFileStateStore::new(&config.state_file);
    match store.load().await {
        Ok(Some(state)) => match serde_json::to_string_pretty(&state) {
            Ok(json) => {
                println!("{json}");
                0
            }
            Err(e) => {
                error!(error = %e, "failed to render state");
                EXIT_STARTUP
            }
        },
        Ok(None) => {
            println!("no state recorded at {}", config.state_file.display());
            0
        }
        Err(e) => {
            error!(error = %e, "failed to read state");
            EXIT_STARTUP
        }
    }
}
