use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::fmt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Streaming connection configuration
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Dial timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Close the connection when no frame arrives for this long
    pub idle_timeout_ms: u64,
    /// Capacity of the per-subscription message channel
    pub message_buffer_size: usize,
    /// Upper bound for delivering the terminal message and the close frame
    pub shutdown_grace_ms: u64,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            idle_timeout_ms: 60_000,
            message_buffer_size: 1024,
            shutdown_grace_ms: 2_000,
        }
    }
}

/// Lifecycle of one subscription line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamState {
    Disconnected,
    Connecting,
    Streaming,
    Closed,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// What the receive loop hands to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamMessage {
    /// A data frame, verbatim
    Frame(String),
    /// Diagnostic for a dial or read failure; the stream is over after this
    Error(String),
    /// The stream was cancelled or closed by the peer
    Closed,
}

impl StreamMessage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Frame(_))
    }

    /// Decode a data frame with an exchange codec. Terminal messages yield `None`.
    pub fn decode<C: WsCodec>(&self, codec: &C) -> Option<Result<C::Message, ExchangeError>> {
        match self {
            Self::Frame(text) => codec.decode_message(text).transpose(),
            Self::Error(_) | Self::Closed => None,
        }
    }
}

/// Dials one WebSocket connection per subscription and relays its frames.
///
/// The manager holds no connection itself; each [`StreamSubscription`] owns a
/// background task that exclusively owns its socket.
#[derive(Debug, Clone)]
pub struct StreamManager {
    base_url: String,
    exchange_name: String,
    config: WsConfig,
}

impl StreamManager {
    /// # Arguments
    /// * `base_url` - WebSocket host; stream names are appended to its path
    /// * `exchange_name` - Name of the exchange for logging/tracing
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url,
            exchange_name,
            config: WsConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: WsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &WsConfig {
        &self.config
    }

    /// Full connection URL for a set of stream names.
    pub fn stream_url(&self, streams: &[impl AsRef<str>]) -> String {
        build_stream_url(&self.base_url, &join_streams(streams))
    }

    /// Start streaming. Returns immediately; dialing happens in the background.
    ///
    /// Cancelling `cancel` (or calling [`StreamSubscription::cancel`]) closes
    /// the socket right away, then a [`StreamMessage::Closed`] is delivered.
    /// There is no reconnect: once closed, subscribe again.
    ///
    /// Must be called from within a Tokio runtime.
    #[instrument(skip(self, streams, cancel), fields(exchange = %self.exchange_name, stream_count = streams.len()))]
    pub fn subscribe(
        &self,
        streams: &[impl AsRef<str>],
        cancel: &CancellationToken,
    ) -> StreamSubscription {
        let stream_name = join_streams(streams);
        let url = build_stream_url(&self.base_url, &stream_name);
        let (tx, rx) = mpsc::channel(self.config.message_buffer_size.max(1));
        let (state_tx, state_rx) = watch::channel(StreamState::Disconnected);
        let token = cancel.child_token();

        let worker = StreamWorker {
            url,
            exchange_name: self.exchange_name.clone(),
            config: self.config.clone(),
            cancel: token.clone(),
            tx,
            state: state_tx,
        };
        let has_streams = !streams.is_empty();
        let task = tokio::spawn(async move {
            if has_streams {
                worker.run().await;
            } else {
                worker
                    .finish(StreamMessage::Error("No stream names given".to_string()))
                    .await;
            }
        });

        StreamSubscription {
            stream_name,
            messages: rx,
            state: state_rx,
            cancel: token,
            task: Some(task),
        }
    }
}

/// Caller-side handle of one streaming connection.
///
/// Only the message channel is exposed; the socket stays inside the
/// background task. Dropping the handle cancels the stream.
#[derive(Debug)]
pub struct StreamSubscription {
    stream_name: String,
    messages: mpsc::Receiver<StreamMessage>,
    state: watch::Receiver<StreamState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl StreamSubscription {
    /// Comma-joined stream names this subscription carries
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    /// Next message, or `None` once the stream has ended and the channel drained.
    pub async fn recv(&mut self) -> Option<StreamMessage> {
        self.messages.recv().await
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    /// Wait until the stream reaches `state`. Returns `false` if the task
    /// ended without ever publishing it.
    pub async fn wait_for_state(&mut self, state: StreamState) -> bool {
        self.state.wait_for(|current| *current == state).await.is_ok()
    }

    /// Request cancellation of this subscription only.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the background receiver has terminated.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel, discard undelivered messages and wait for the receiver task to end.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        self.messages.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Stream task for {} ended abnormally: {}", self.stream_name, e);
            }
        }
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum Flow {
    Continue,
    Stop,
}

struct StreamWorker {
    url: String,
    exchange_name: String,
    config: WsConfig,
    cancel: CancellationToken,
    tx: mpsc::Sender<StreamMessage>,
    state: watch::Sender<StreamState>,
}

impl StreamWorker {
    async fn run(self) {
        self.state.send_replace(StreamState::Connecting);
        debug!(exchange = %self.exchange_name, url = %self.url, "Dialing stream");

        let connect_timeout = Duration::from_millis(self.config.connect_timeout_ms);
        let dialed = tokio::select! {
            () = self.cancel.cancelled() => {
                self.finish(StreamMessage::Closed).await;
                return;
            }
            dialed = timeout(connect_timeout, connect_async(self.url.as_str())) => dialed,
        };

        let socket = match dialed {
            Ok(Ok((socket, _response))) => socket,
            Ok(Err(e)) => {
                warn!(exchange = %self.exchange_name, "WebSocket dial failed: {}", e);
                self.finish(StreamMessage::Error(format!(
                    "Failed to connect to websocket: {}",
                    e
                )))
                .await;
                return;
            }
            Err(_) => {
                warn!(exchange = %self.exchange_name, "WebSocket dial timed out");
                self.finish(StreamMessage::Error(format!(
                    "Failed to connect to websocket: timed out after {}ms",
                    self.config.connect_timeout_ms
                )))
                .await;
                return;
            }
        };

        info!(exchange = %self.exchange_name, url = %self.url, "Stream connected");
        self.state.send_replace(StreamState::Streaming);

        let (mut write, mut read) = socket.split();
        let terminal = self.receive(&mut write, &mut read).await;
        self.close_socket(write, read).await;
        if let Some(message) = terminal {
            self.finish(message).await;
        } else {
            self.state.send_replace(StreamState::Closed);
        }
    }

    /// Pump frames until the stream ends. Returns the terminal message to
    /// deliver, or `None` when the consumer is gone.
    async fn receive(
        &self,
        write: &mut SplitSink<Socket, Message>,
        read: &mut SplitStream<Socket>,
    ) -> Option<StreamMessage> {
        let idle = Duration::from_millis(self.config.idle_timeout_ms);
        loop {
            let next = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!(exchange = %self.exchange_name, "Stream cancelled");
                    return Some(StreamMessage::Closed);
                }
                next = timeout(idle, read.next()) => next,
            };

            let flow = match next {
                Err(_) => {
                    return Some(StreamMessage::Error(format!(
                        "No message received from websocket within {}ms",
                        self.config.idle_timeout_ms
                    )));
                }
                Ok(None) => {
                    return Some(StreamMessage::Error(
                        "Websocket connection ended unexpectedly".to_string(),
                    ));
                }
                Ok(Some(Err(e))) => {
                    warn!(exchange = %self.exchange_name, "WebSocket read failed: {}", e);
                    return Some(StreamMessage::Error(format!(
                        "Error reading message from websocket: {}",
                        e
                    )));
                }
                Ok(Some(Ok(message))) => match message {
                    Message::Text(text) => self.forward(text).await,
                    Message::Binary(data) => match String::from_utf8(data) {
                        Ok(text) => self.forward(text).await,
                        Err(e) => {
                            warn!(exchange = %self.exchange_name, "Dropping non UTF-8 binary frame: {}", e);
                            Flow::Continue
                        }
                    },
                    Message::Ping(payload) => {
                        if let Err(e) = write.send(Message::Pong(payload)).await {
                            warn!("Failed to send pong response: {}", e);
                        }
                        Flow::Continue
                    }
                    Message::Close(frame) => {
                        debug!(exchange = %self.exchange_name, ?frame, "Peer closed stream");
                        return Some(StreamMessage::Closed);
                    }
                    Message::Pong(_) | Message::Frame(_) => Flow::Continue,
                },
            };

            if let Flow::Stop = flow {
                return if self.cancel.is_cancelled() {
                    Some(StreamMessage::Closed)
                } else {
                    None
                };
            }
        }
    }

    /// Deliver a frame without letting a stalled consumer block cancellation.
    async fn forward(&self, text: String) -> Flow {
        tokio::select! {
            () = self.cancel.cancelled() => Flow::Stop,
            sent = self.tx.send(StreamMessage::Frame(text)) => {
                if sent.is_ok() {
                    Flow::Continue
                } else {
                    debug!(exchange = %self.exchange_name, "Stream consumer dropped");
                    Flow::Stop
                }
            }
        }
    }

    async fn close_socket(&self, mut write: SplitSink<Socket, Message>, read: SplitStream<Socket>) {
        let grace = Duration::from_millis(self.config.shutdown_grace_ms);
        if timeout(grace, write.send(Message::Close(None))).await.is_err() {
            debug!(exchange = %self.exchange_name, "Close frame not acknowledged in time");
        }
        drop(read);
        drop(write);
    }

    /// Publish `Closed` and hand the consumer its last message.
    async fn finish(&self, message: StreamMessage) {
        self.state.send_replace(StreamState::Closed);
        let grace = Duration::from_millis(self.config.shutdown_grace_ms);
        if timeout(grace, self.tx.send(message)).await.is_err() {
            warn!(exchange = %self.exchange_name, "Terminal stream message not delivered");
        }
    }
}

fn join_streams(streams: &[impl AsRef<str>]) -> String {
    streams
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}

/// Append a comma-joined stream path to the WebSocket host.
pub fn build_stream_url(base_url: &str, stream_path: &str) -> String {
    if base_url.ends_with('/') {
        format!("{}{}", base_url, stream_path)
    } else {
        format!("{}/{}", base_url, stream_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_url_joins_names_with_commas() {
        let manager = StreamManager::new(
            "wss://api.bitkub.com/websocket-api/".to_string(),
            "bitkub".to_string(),
        );
        assert_eq!(
            manager.stream_url(&["market.ticker.thb_btc", "market.trade.thb_eth"]),
            "wss://api.bitkub.com/websocket-api/market.ticker.thb_btc,market.trade.thb_eth"
        );
    }

    #[test]
    fn stream_url_inserts_missing_slash() {
        assert_eq!(
            build_stream_url("ws://127.0.0.1:9000", "market.ticker.thb_btc"),
            "ws://127.0.0.1:9000/market.ticker.thb_btc"
        );
    }

    #[test]
    fn only_frames_are_non_terminal() {
        assert!(!StreamMessage::Frame("{}".to_string()).is_terminal());
        assert!(StreamMessage::Error("boom".to_string()).is_terminal());
        assert!(StreamMessage::Closed.is_terminal());
    }
}
