//! Exchange-agnostic transport kernel.
//!
//! - [`Signer`]: turns a [`SignedRequest`] into authentication headers
//! - [`ClockSource`]: authoritative timestamps for signing
//! - [`RestClient`] / [`ReqwestRest`]: signed and unsigned HTTP calls returning raw bodies
//! - [`StreamManager`]: one background receiver per WebSocket subscription
//! - [`WsCodec`]: caller-side decoding of relayed frames
//!
//! ```rust,no_run
//! use bitkub_connector::core::kernel::*;
//! use std::sync::Arc;
//!
//! # fn example(signer: Arc<dyn Signer>) -> Result<(), Box<dyn std::error::Error>> {
//! let rest_config = RestClientConfig::new("https://api.bitkub.com".to_string(), "bitkub".to_string());
//! let rest = RestClientBuilder::new(rest_config)
//!     .with_signer(signer)
//!     .with_server_time_endpoint("/api/v3/servertime")
//!     .build()?;
//! assert!(rest.can_authenticate());
//! # Ok(())
//! # }
//! ```
pub mod clock;
pub mod codec;
pub mod rest;
pub mod signer;
pub mod ws;

pub use clock::{ClockSource, HttpClock};
pub use codec::WsCodec;
pub use rest::{RawResponse, ReqwestRest, RestClient, RestClientBuilder, RestClientConfig};
pub use signer::{
    canonical_query, hmac_sha256_hex, HttpMethod, SignatureResult, SignedRequest, Signer,
};
pub use ws::{StreamManager, StreamMessage, StreamState, StreamSubscription, WsConfig};
