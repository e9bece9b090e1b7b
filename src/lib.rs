//! Bitkub exchange connector.
//!
//! [`core::kernel`] holds the exchange-agnostic transport: request signing,
//! the authenticated REST client and the WebSocket stream manager.
//! [`exchanges::bitkub`] binds it to Bitkub: `X-BTK-*` signatures, the
//! `{error, result}` envelope, the error-code table and market streams.
pub mod core;
pub mod exchanges;

pub use crate::core::config::ExchangeConfig;
pub use crate::core::errors::{ErrorKind, ExchangeError};
pub use exchanges::bitkub::{build_connector, BitkubConnector};
