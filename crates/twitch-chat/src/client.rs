//! Authenticated IRC-over-WebSocket chat client.
//!
//! One connection per session: a background task owns the WebSocket,
//! performs the IRC handshake, answers PING, decodes each line into a
//! [`ChatItem`] and reconnects with bounded exponential backoff. Callers
//! receive items over an mpsc channel and send chat messages (welcome
//! announcements) through another.

use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use tracing::{debug, error, info, warn};

use crate::decode::{ChatItem, decode_message};
use crate::error::{Result, TwitchChatError};
use crate::irc::IrcMessage;

/// Twitch WebSocket IRC server URL
const TWITCH_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Bot account credentials for the IRC handshake.
#[derive(Debug, Clone)]
pub struct ChatCredentials {
    pub username: String,
    pub access_token: String,
}

impl ChatCredentials {
    pub fn new(username: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            access_token: access_token.into(),
        }
    }

    fn pass_line(&self) -> String {
        let token = self.access_token.trim();
        if token.starts_with("oauth:") {
            format!("PASS {token}")
        } else {
            format!("PASS oauth:{token}")
        }
    }
}

/// Reconnect policy for the connection task.
#[derive(Debug, Clone, Copy)]
pub struct ClientConfig {
    pub max_reconnect_attempts: u32,
    pub base_reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_reconnect_attempts: 10,
            base_reconnect_delay_ms: 1000,
            max_reconnect_delay_ms: 60000,
        }
    }
}

/// Chat client factory; [`connect`](ChatClient::connect) yields a live
/// [`ChatConnection`].
#[derive(Debug)]
pub struct ChatClient {
    credentials: ChatCredentials,
    config: ClientConfig,
}

impl ChatClient {
    pub fn new(credentials: ChatCredentials) -> Self {
        Self {
            credentials,
            config: ClientConfig::default(),
        }
    }

    pub fn with_config(credentials: ChatCredentials, config: ClientConfig) -> Self {
        Self {
            credentials,
            config,
        }
    }

    /// Join one channel. The returned connection owns the background task;
    /// dropping it or calling `disconnect` tears the task down.
    pub async fn connect(&self, channel: &str) -> Result<ChatConnection> {
        let channel = channel.trim_start_matches('#').to_lowercase();
        let (item_tx, item_rx) = mpsc::channel(100);
        let (outbound_tx, outbound_rx) = mpsc::channel::<String>(100);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(run_connection(
            self.credentials.clone(),
            self.config,
            channel.clone(),
            item_tx,
            outbound_rx,
            shutdown_rx,
        ));

        Ok(ChatConnection {
            channel,
            item_rx,
            outbound_tx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

/// A live connection to one channel's chat.
#[derive(Debug)]
pub struct ChatConnection {
    channel: String,
    item_rx: mpsc::Receiver<ChatItem>,
    outbound_tx: mpsc::Sender<String>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChatConnection {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Receive the next decoded item. `None` means the connection task has
    /// stopped for good (shutdown or reconnect attempts exhausted).
    pub async fn recv(&mut self) -> Option<ChatItem> {
        self.item_rx.recv().await
    }

    /// Send one chat message to the joined channel.
    pub async fn send_message(&self, text: &str) -> Result<()> {
        let line = format!("PRIVMSG #{} :{}", self.channel, text);
        self.outbound_tx
            .send(line)
            .await
            .map_err(|_| TwitchChatError::connection("connection task stopped"))
    }

    /// Tear down the connection task.
    pub async fn disconnect(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ChatConnection {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn handshake_lines(credentials: &ChatCredentials, channel: &str) -> Vec<String> {
    vec![
        "CAP REQ :twitch.tv/tags twitch.tv/commands twitch.tv/membership".to_string(),
        credentials.pass_line(),
        format!("NICK {}", credentials.username.to_lowercase()),
        format!("JOIN #{channel}"),
    ]
}

/// Reconnect pacing shared by every retry path: connect failures,
/// handshake failures and connections dropped after the handshake.
#[derive(Debug)]
struct ReconnectBackoff {
    attempt: u32,
    delay_ms: u64,
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl ReconnectBackoff {
    fn new(config: &ClientConfig) -> Self {
        Self {
            attempt: 0,
            delay_ms: config.base_reconnect_delay_ms,
            max_attempts: config.max_reconnect_attempts,
            base_delay_ms: config.base_reconnect_delay_ms,
            max_delay_ms: config.max_reconnect_delay_ms,
        }
    }

    /// The next wait before retrying, or `None` once attempts are exhausted.
    fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.max_attempts {
            return None;
        }
        self.attempt += 1;
        let wait = Duration::from_millis(self.delay_ms);
        self.delay_ms = (self.delay_ms * 2).min(self.max_delay_ms);
        Some(wait)
    }

    /// Call once inbound traffic confirms the connection is healthy.
    fn reset(&mut self) {
        self.attempt = 0;
        self.delay_ms = self.base_delay_ms;
    }
}

async fn run_connection(
    credentials: ChatCredentials,
    config: ClientConfig,
    channel: String,
    item_tx: mpsc::Sender<ChatItem>,
    mut outbound_rx: mpsc::Receiver<String>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    let mut backoff = ReconnectBackoff::new(&config);

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match connect_async(TWITCH_WS_URL).await {
            Ok((mut stream, _)) => {
                info!(channel, "connected to chat");

                let mut handshake_ok = true;
                for line in handshake_lines(&credentials, &channel) {
                    if let Err(e) = stream.send(Message::Text(line.into())).await {
                        error!(channel, "handshake failed: {e}");
                        handshake_ok = false;
                        break;
                    }
                }

                if handshake_ok {
                    // Read/write loop; breaking out reconnects, returning
                    // stops for good.
                    loop {
                        tokio::select! {
                            Some(line) = outbound_rx.recv() => {
                                if let Err(e) = stream.send(Message::Text(line.into())).await {
                                    error!(channel, "failed to send message: {e}");
                                    break;
                                }
                            }

                            frame = stream.next() => {
                                match frame {
                                    Some(Ok(Message::Text(text))) => {
                                        backoff.reset();
                                        for line in text.lines() {
                                            let trimmed = line.trim();
                                            if trimmed.is_empty() {
                                                continue;
                                            }

                                            if let Some(rest) = trimmed.strip_prefix("PING") {
                                                let pong = format!("PONG{rest}");
                                                debug!(channel, "answering PING");
                                                if stream.send(Message::Text(pong.into())).await.is_err() {
                                                    break;
                                                }
                                                continue;
                                            }

                                            let Some(parsed) = IrcMessage::parse(trimmed) else {
                                                continue;
                                            };
                                            if let Some(item) = decode_message(&parsed)
                                                && item_tx.send(item).await.is_err()
                                            {
                                                // Receiver dropped; nobody left to serve.
                                                return;
                                            }
                                        }
                                    }
                                    Some(Ok(Message::Ping(data))) => {
                                        let _ = stream.send(Message::Pong(data)).await;
                                    }
                                    Some(Ok(_)) => {}
                                    Some(Err(e)) => {
                                        error!(channel, "websocket error: {e}");
                                        break;
                                    }
                                    None => {
                                        warn!(channel, "websocket stream closed");
                                        break;
                                    }
                                }
                            }

                            _ = shutdown_rx.recv() => {
                                let _ = stream.close(None).await;
                                return;
                            }
                        }
                    }
                    warn!(channel, "chat connection lost");
                }
            }
            Err(e) => warn!(channel, "chat connection failed: {e}"),
        }

        // A connection dropped right after the handshake waits here just
        // like one that never connected.
        let Some(wait) = backoff.next_delay() else {
            error!(channel, "reconnect attempts exhausted");
            break;
        };
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = shutdown_rx.recv() => break,
        }
    }
    debug!(channel, "chat connection task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_line_normalizes_token_prefix() {
        let bare = ChatCredentials::new("bot", "abc123");
        assert_eq!(bare.pass_line(), "PASS oauth:abc123");

        let prefixed = ChatCredentials::new("bot", "oauth:abc123");
        assert_eq!(prefixed.pass_line(), "PASS oauth:abc123");
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = ClientConfig {
            max_reconnect_attempts: 10,
            base_reconnect_delay_ms: 100,
            max_reconnect_delay_ms: 400,
        };
        let mut backoff = ReconnectBackoff::new(&config);

        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(400)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_backoff_exhausts_after_max_attempts() {
        let config = ClientConfig {
            max_reconnect_attempts: 3,
            ..ClientConfig::default()
        };
        let mut backoff = ReconnectBackoff::new(&config);

        for _ in 0..3 {
            assert!(backoff.next_delay().is_some());
        }
        assert_eq!(backoff.next_delay(), None);
    }

    // A connection that drops right after the handshake must wait for the
    // full backoff before reconnecting; the delay only rewinds once the
    // server actually delivers traffic.
    #[test]
    fn test_backoff_never_skips_the_wait_after_reset() {
        let config = ClientConfig::default();
        let mut backoff = ReconnectBackoff::new(&config);

        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();

        assert_eq!(
            backoff.next_delay(),
            Some(Duration::from_millis(config.base_reconnect_delay_ms))
        );
    }

    #[test]
    fn test_handshake_lines_order() {
        let credentials = ChatCredentials::new("Recap_Bot", "token");
        let lines = handshake_lines(&credentials, "main");
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("CAP REQ"));
        assert!(lines[1].starts_with("PASS oauth:"));
        assert_eq!(lines[2], "NICK recap_bot");
        assert_eq!(lines[3], "JOIN #main");
    }
}
