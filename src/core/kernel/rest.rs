use crate::core::errors::ExchangeError;
use crate::core::kernel::clock::{ClockSource, HttpClock};
use crate::core::kernel::signer::{canonical_query, HttpMethod, SignedRequest, Signer};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, trace};

/// A successful (2xx) HTTP reply, body untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// REST client trait for making HTTP requests
///
/// Implementations return the raw body so that envelope decoding stays with
/// the exchange binding. Non-2xx replies come back as
/// [`ExchangeError::HttpStatus`] with the body preserved.
#[async_trait]
pub trait RestClient: Send + Sync {
    /// Make a GET request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path, leading slash, no query string
    /// * `query_params` - Query parameters as key-value pairs
    /// * `authenticated` - Whether to sign the request
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<RawResponse, ExchangeError>;

    /// Make a POST request
    ///
    /// # Arguments
    /// * `endpoint` - The API endpoint path
    /// * `body` - Serialized JSON body; these exact bytes are signed and sent
    /// * `authenticated` - Whether to sign the request
    async fn post(
        &self,
        endpoint: &str,
        body: &str,
        authenticated: bool,
    ) -> Result<RawResponse, ExchangeError>;
}

/// Configuration for the REST client
#[derive(Clone, Debug)]
pub struct RestClientConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Exchange name for logging and tracing
    pub exchange_name: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl RestClientConfig {
    pub fn new(base_url: String, exchange_name: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            exchange_name,
            timeout_seconds: 30,
            user_agent: concat!("bitkub-connector/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating REST client instances
pub struct RestClientBuilder {
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Option<Arc<dyn ClockSource>>,
    server_time_endpoint: Option<String>,
}

impl RestClientBuilder {
    pub fn new(config: RestClientConfig) -> Self {
        Self {
            config,
            signer: None,
            clock: None,
            server_time_endpoint: None,
        }
    }

    /// Set the signer for authenticated requests
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Use an explicit clock for signing timestamps
    pub fn with_clock(mut self, clock: Arc<dyn ClockSource>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Read signing timestamps from an endpoint on the same host, sharing the
    /// HTTP connection pool. Ignored when an explicit clock is set.
    pub fn with_server_time_endpoint(mut self, endpoint: &str) -> Self {
        self.server_time_endpoint = Some(endpoint.to_string());
        self
    }

    pub fn build(self) -> Result<ReqwestRest, ExchangeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .user_agent(&self.config.user_agent)
            .build()
            .map_err(|e| {
                ExchangeError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?;

        let clock = match (self.clock, self.server_time_endpoint) {
            (Some(clock), _) => Some(clock),
            (None, Some(endpoint)) => Some(Arc::new(HttpClock::new(
                client.clone(),
                format!("{}{}", self.config.base_url, endpoint),
            )) as Arc<dyn ClockSource>),
            (None, None) => None,
        };

        Ok(ReqwestRest {
            client,
            config: self.config,
            signer: self.signer,
            clock,
        })
    }
}

/// Implementation of `RestClient` using reqwest
///
/// Cloning is cheap and shares the underlying connection pool.
#[derive(Clone)]
pub struct ReqwestRest {
    client: Client,
    config: RestClientConfig,
    signer: Option<Arc<dyn Signer>>,
    clock: Option<Arc<dyn ClockSource>>,
}

impl std::fmt::Debug for ReqwestRest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestRest")
            .field("config", &self.config)
            .field("has_signer", &self.signer.is_some())
            .field("has_clock", &self.clock.is_some())
            .finish_non_exhaustive()
    }
}

impl ReqwestRest {
    pub fn config(&self) -> &RestClientConfig {
        &self.config
    }

    pub fn can_authenticate(&self) -> bool {
        self.signer.is_some() && self.clock.is_some()
    }

    fn build_url(&self, endpoint: &str, query_string: &str) -> String {
        if query_string.is_empty() {
            format!("{}{}", self.config.base_url, endpoint)
        } else {
            format!("{}{}?{}", self.config.base_url, endpoint, query_string)
        }
    }

    #[instrument(skip(self, response), fields(exchange = %self.config.exchange_name, status = %response.status()))]
    async fn handle_response(&self, response: Response) -> Result<RawResponse, ExchangeError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ExchangeError::NetworkError(format!("Failed to read response body: {}", e))
        })?;

        trace!("Response body: {}", body);

        if status.is_success() {
            Ok(RawResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(ExchangeError::HttpStatus {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Headers for an authenticated call. The timestamp is fetched per call,
    /// so signatures are never reused.
    async fn authenticate(
        &self,
        method: HttpMethod,
        endpoint: &str,
        canonical_payload: &str,
    ) -> Result<Vec<(String, String)>, ExchangeError> {
        let signer = self.signer.as_ref().ok_or_else(|| {
            ExchangeError::AuthError("Authentication required but no signer provided".to_string())
        })?;
        let clock = self.clock.as_ref().ok_or_else(|| {
            ExchangeError::AuthError("Authentication required but no clock provided".to_string())
        })?;

        let timestamp_millis = clock.server_time_millis().await?;
        debug!(timestamp_millis, "Signing request");

        let headers = signer.sign_request(&SignedRequest {
            timestamp_millis,
            method,
            path: endpoint,
            canonical_payload,
        })?;
        Ok(headers.into_iter().collect())
    }

    #[instrument(skip(self, query_string, body), fields(exchange = %self.config.exchange_name, method = %method, endpoint = %endpoint))]
    async fn make_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        query_string: &str,
        body: Option<&str>,
        authenticated: bool,
    ) -> Result<RawResponse, ExchangeError> {
        let url = self.build_url(endpoint, query_string);
        let mut request = self.client.request(method.into(), &url);

        if authenticated {
            let canonical_payload = match method {
                HttpMethod::Get => format!("?{}", query_string),
                HttpMethod::Post => body.unwrap_or_default().to_string(),
            };
            for (key, value) in self.authenticate(method, endpoint, &canonical_payload).await? {
                request = request.header(key, value);
            }
        }

        if authenticated || body.is_some() {
            request = request.header(CONTENT_TYPE, "application/json");
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }
}

#[async_trait]
impl RestClient for ReqwestRest {
    #[instrument(skip(self, query_params), fields(exchange = %self.config.exchange_name, endpoint = %endpoint, param_count = query_params.len()))]
    async fn get(
        &self,
        endpoint: &str,
        query_params: &[(&str, &str)],
        authenticated: bool,
    ) -> Result<RawResponse, ExchangeError> {
        let query_string = canonical_query(query_params);
        self.make_request(HttpMethod::Get, endpoint, &query_string, None, authenticated)
            .await
    }

    #[instrument(skip(self, body), fields(exchange = %self.config.exchange_name, endpoint = %endpoint))]
    async fn post(
        &self,
        endpoint: &str,
        body: &str,
        authenticated: bool,
    ) -> Result<RawResponse, ExchangeError> {
        self.make_request(HttpMethod::Post, endpoint, "", Some(body), authenticated)
            .await
    }
}
