use crate::core::kernel::{RestClient, StreamManager, StreamSubscription};
use crate::exchanges::bitkub::codec::{ticker_stream, trade_stream};
use crate::exchanges::bitkub::rest::BitkubRest;
use tokio_util::sync::CancellationToken;

/// Bitkub connector: signed REST endpoints plus market data streams
#[derive(Debug, Clone)]
pub struct BitkubConnector<R: RestClient> {
    api: BitkubRest<R>,
    streams: StreamManager,
}

impl<R: RestClient> BitkubConnector<R> {
    pub fn new(rest: R, streams: StreamManager) -> Self {
        Self {
            api: BitkubRest::new(rest),
            streams,
        }
    }

    /// Signed endpoint client
    pub fn api(&self) -> &BitkubRest<R> {
        &self.api
    }

    pub fn streams(&self) -> &StreamManager {
        &self.streams
    }

    /// Open one connection carrying every named stream. Frames arrive
    /// undecoded; see [`BitkubCodec`](crate::exchanges::bitkub::BitkubCodec).
    pub fn subscribe(
        &self,
        streams: &[impl AsRef<str>],
        cancel: &CancellationToken,
    ) -> StreamSubscription {
        self.streams.subscribe(streams, cancel)
    }

    pub fn subscribe_tickers(
        &self,
        symbols: &[impl AsRef<str>],
        cancel: &CancellationToken,
    ) -> StreamSubscription {
        let streams: Vec<String> = symbols.iter().map(|s| ticker_stream(s.as_ref())).collect();
        self.subscribe(&streams, cancel)
    }

    pub fn subscribe_trades(
        &self,
        symbols: &[impl AsRef<str>],
        cancel: &CancellationToken,
    ) -> StreamSubscription {
        let streams: Vec<String> = symbols.iter().map(|s| trade_stream(s.as_ref())).collect();
        self.subscribe(&streams, cancel)
    }
}
