use crate::core::errors::ExchangeError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{instrument, trace};

/// Source of the timestamp that authenticated requests are signed with.
///
/// Exchanges reject timestamps outside their tolerance window, so the
/// authoritative source is the exchange itself rather than the local clock.
#[async_trait]
pub trait ClockSource: Send + Sync {
    async fn server_time_millis(&self) -> Result<u64, ExchangeError>;
}

/// Clock that asks an HTTP endpoint answering with bare epoch milliseconds.
#[derive(Debug, Clone)]
pub struct HttpClock {
    client: Client,
    url: String,
}

impl HttpClock {
    pub fn new(client: Client, url: String) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ClockSource for HttpClock {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn server_time_millis(&self) -> Result<u64, ExchangeError> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read server time body: {}", e))
        })?;

        if !status.is_success() {
            return Err(ExchangeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        trace!("Server time body: {}", body);
        parse_server_time(&body)
    }
}

/// Parse a server time body: an integer, optionally wrapped in whitespace.
pub fn parse_server_time(body: &str) -> Result<u64, ExchangeError> {
    body.trim()
        .parse::<u64>()
        .map_err(|e| ExchangeError::malformed(format!("Invalid server time: {}", e), body))
}
