pub mod codec;
pub mod envelope;
pub mod error_codes;
pub mod signer;
pub mod types;

pub mod builder;
pub mod connector;
pub mod rest;

pub use builder::{build_connector, BitkubBuilder};
pub use codec::{ticker_stream, trade_stream, BitkubCodec, BitkubMessage};
pub use connector::BitkubConnector;
pub use envelope::{
    decode_ack, decode_bare, decode_envelope, decode_paginated, Ack, Envelope, Paginated,
    Pagination,
};
pub use error_codes::{describe, BitkubErrorCode, ErrorCategory};
pub use rest::BitkubRest;
pub use signer::{sign, BitkubSigner};
pub use types::{
    Balance, Balances, OpenOrder, OrderHistoryEntry, OrderHistoryQuery, OrderInfo, OrderLookup,
    OrderSide, OrderType, PlaceOrderRequest, PlacedOrder, UserLimits, Wallet, WsTicker, WsTrade,
};
