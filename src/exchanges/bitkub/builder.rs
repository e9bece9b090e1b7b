use crate::core::config::ExchangeConfig;
use crate::core::errors::ExchangeError;
use crate::core::kernel::{
    ClockSource, ReqwestRest, RestClientBuilder, RestClientConfig, StreamManager, WsConfig,
};
use crate::exchanges::bitkub::connector::BitkubConnector;
use crate::exchanges::bitkub::rest::SERVER_TIME;
use crate::exchanges::bitkub::signer::BitkubSigner;
use std::sync::Arc;
use tracing::debug;

const EXCHANGE_NAME: &str = "bitkub";

/// Builder for Bitkub connectors
///
/// Without credentials the connector can still stream market data; signed
/// endpoints then fail with [`ExchangeError::AuthError`].
pub struct BitkubBuilder {
    config: ExchangeConfig,
    ws_config: WsConfig,
    user_agent: Option<String>,
    clock: Option<Arc<dyn ClockSource>>,
}

impl BitkubBuilder {
    pub fn new(config: ExchangeConfig) -> Self {
        Self {
            config,
            ws_config: WsConfig::default(),
            user_agent: None,
            clock: None,
        }
    }

    /// Tune streaming timeouts and buffering
    #[must_use]
    pub fn with_ws_config(mut self, ws_config: WsConfig) -> Self {
        self.ws_config = ws_config;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Replace the server-time endpoint as the signing clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<BitkubConnector<ReqwestRest>, ExchangeError> {
        self.config.validate()?;

        let mut rest_config =
            RestClientConfig::new(self.config.rest_url().to_string(), EXCHANGE_NAME.to_string())
                .with_timeout(self.config.timeout_seconds);
        if let Some(user_agent) = self.user_agent {
            rest_config = rest_config.with_user_agent(user_agent);
        }

        let mut rest_builder =
            RestClientBuilder::new(rest_config).with_server_time_endpoint(SERVER_TIME);
        if let Some(clock) = self.clock {
            rest_builder = rest_builder.with_clock(clock);
        }

        if self.config.has_credentials() {
            let signer = BitkubSigner::new(
                self.config.api_key.clone(),
                self.config.secret_key.clone(),
            )?;
            rest_builder = rest_builder.with_signer(Arc::new(signer));
        } else {
            debug!("No credentials configured, signed endpoints disabled");
        }

        let rest = rest_builder.build()?;
        let streams = StreamManager::new(
            self.config.stream_url().to_string(),
            EXCHANGE_NAME.to_string(),
        )
        .with_config(self.ws_config);

        Ok(BitkubConnector::new(rest, streams))
    }
}

/// Build a connector with default streaming settings.
pub fn build_connector(
    config: ExchangeConfig,
) -> Result<BitkubConnector<ReqwestRest>, ExchangeError> {
    BitkubBuilder::new(config).build()
}
