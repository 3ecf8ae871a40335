//! TelegramNotifier - Telegram Bot API の sendMessage で通知
//!
//! ここは transport（form encoding, timeout, status の変換）だけを持ちます。
//! retry はしません。届かなかった通知は loop 側がログに残して先に進みます。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::NotifyError;
use crate::ports::Notifier;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// TelegramNotifier は 1 つの chat に Markdown で送る
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// 本番の API base と既定の timeout を使う
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        Self::with_api_base(DEFAULT_API_BASE, bot_token, chat_id, DEFAULT_TIMEOUT)
    }

    /// Point the notifier at a different Bot API host (self-hosted server, tests).
    pub fn with_api_base(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
        })
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.send_message_url())
            .form(&[
                ("chat_id", self.chat_id.as_str()),
                ("text", message),
                ("parse_mode", "Markdown"),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one request, answer with `status_line`, hand back the raw request.
    async fn one_shot_server(
        status_line: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            let body = "{\"ok\":false}";
            let response = format!(
                "{status_line}\r\ncontent-type: application/json\r\n\
                 content-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&raw).to_string()
        });
        (base, handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let content_length = head
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                k.eq_ignore_ascii_case("content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= content_length
    }

    #[tokio::test]
    async fn posts_form_to_send_message() {
        let (base, server) = one_shot_server("HTTP/1.1 200 OK").await;
        let notifier =
            TelegramNotifier::with_api_base(&base, "123:abc", "42", Duration::from_secs(5))
                .unwrap();

        notifier.notify("hello *world*").await.unwrap();

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /bot123:abc/sendMessage"));
        assert!(request.contains("chat_id=42"));
        assert!(request.contains("parse_mode=Markdown"));
        assert!(
            request.contains("text=hello+*world*") || request.contains("text=hello+%2Aworld%2A")
        );
    }

    #[tokio::test]
    async fn non_success_status_is_rejected() {
        let (base, server) = one_shot_server("HTTP/1.1 401 Unauthorized").await;
        let notifier =
            TelegramNotifier::with_api_base(&base, "bad", "42", Duration::from_secs(5)).unwrap();

        let err = notifier.notify("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Rejected { status: 401, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_host_is_a_transport_error() {
        // Bind then drop so the port is (almost certainly) closed.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let notifier = TelegramNotifier::with_api_base(
            format!("http://{addr}"),
            "t",
            "42",
            Duration::from_secs(2),
        )
        .unwrap();

        let err = notifier.notify("x").await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
    }
}
