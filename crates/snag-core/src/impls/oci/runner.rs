//! CommandRunner - vendor CLI の実行を抽象化
//!
//! - ProcessRunner: 本物の binary を起動する
//! - ScriptedRunner: テスト用。引数を記録し、用意した出力を順に返す

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::AllocatorError;

/// CLI 1 回分の実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// exit 0 で stdout を返した結果
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// 非 0 exit で stderr を返した結果
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// CommandRunner は program を args 付きで実行して出力を集める
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, AllocatorError>;
}

/// ProcessRunner は tokio::process で子プロセスを起動する
///
/// # シグナル
/// - unix では子を自分専用の process group に入れる。端末の Ctrl-C は前面の
///   process group 全体に届くので、そのままだと実行中の launch が殺される
/// - 中断は loop の shutdown channel だけで伝える
/// - future を drop した時（attempt timeout）は kill する
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, AllocatorError> {
        let mut command = Command::new(program);
        command.args(args).kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);

        let output = command
            .output()
            .await
            .map_err(|source| AllocatorError::Spawn {
                program: program.to_string(),
                source,
            })?;
        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
pub(crate) use scripted::ScriptedRunner;

#[cfg(test)]
mod scripted {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    pub(crate) struct ScriptedRunner {
        responses: Mutex<VecDeque<CommandOutput>>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl ScriptedRunner {
        pub(crate) fn new(responses: Vec<CommandOutput>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for ScriptedRunner {
        async fn run(
            &self,
            _program: &str,
            args: &[String],
        ) -> Result<CommandOutput, AllocatorError> {
            self.calls.lock().unwrap().push(args.to_vec());
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| CommandOutput::failed("no scripted response left")))
        }
    }
}
