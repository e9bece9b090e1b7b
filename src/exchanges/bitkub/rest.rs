use crate::core::errors::ExchangeError;
use crate::core::kernel::RestClient;
use crate::exchanges::bitkub::envelope::{decode_ack, decode_envelope, decode_paginated, Paginated};
use crate::exchanges::bitkub::types::{
    Balances, OpenOrder, OrderHistoryEntry, OrderHistoryQuery, OrderInfo, OrderLookup,
    PlaceOrderRequest, PlacedOrder, UserLimits, Wallet,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

pub const SERVER_TIME: &str = "/api/v3/servertime";
pub const MY_OPEN_ORDERS: &str = "/api/v3/market/my-open-orders";
pub const MY_ORDER_HISTORY: &str = "/api/v3/market/my-order-history";
pub const ORDER_INFO: &str = "/api/v3/market/order-info";
pub const WALLET: &str = "/api/v3/market/wallet";
pub const BALANCES: &str = "/api/v3/market/balances";
pub const PLACE_BID: &str = "/api/v3/market/place-bid";
pub const PLACE_ASK: &str = "/api/v3/market/place-ask";
pub const CANCEL_ORDER: &str = "/api/v3/market/cancel-order";
pub const WS_TOKEN: &str = "/api/v3/market/wstoken";
pub const TRADING_CREDITS: &str = "/api/v3/user/trading-credits";
pub const USER_LIMITS: &str = "/api/v3/user/limits";

/// Empty JSON object sent as the body of parameterless POSTs.
const EMPTY_BODY: &str = "{}";

/// Typed client for the signed Bitkub endpoints
#[derive(Debug, Clone)]
pub struct BitkubRest<R: RestClient> {
    rest_client: R,
}

impl<R: RestClient> BitkubRest<R> {
    pub fn new(rest_client: R) -> Self {
        Self { rest_client }
    }

    pub fn rest_client(&self) -> &R {
        &self.rest_client
    }

    async fn signed_get(
        &self,
        endpoint: &str,
        query: &[(&'static str, String)],
    ) -> Result<String, ExchangeError> {
        let params: Vec<(&str, &str)> = query.iter().map(|(k, v)| (*k, v.as_str())).collect();
        let response = self.rest_client.get(endpoint, &params, true).await?;
        Ok(response.body)
    }

    /// Serialize once; the same bytes are signed and sent.
    async fn signed_post<B: Serialize + Sync>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<String, ExchangeError> {
        let body = serde_json::to_string(body).map_err(|e| {
            ExchangeError::SerializationError(format!("Failed to encode body: {}", e))
        })?;
        self.signed_post_raw(endpoint, &body).await
    }

    async fn signed_post_raw(&self, endpoint: &str, body: &str) -> Result<String, ExchangeError> {
        let response = self.rest_client.post(endpoint, body, true).await?;
        Ok(response.body)
    }

    fn require_symbol(symbol: &str) -> Result<(), ExchangeError> {
        if symbol.trim().is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "Symbol must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Open orders for a symbol
    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn my_open_orders(&self, symbol: &str) -> Result<Vec<OpenOrder>, ExchangeError> {
        Self::require_symbol(symbol)?;
        let body = self
            .signed_get(MY_OPEN_ORDERS, &[("sym", symbol.to_string())])
            .await?;
        decode_envelope(&body)
    }

    /// One page of matched order history
    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn my_order_history(
        &self,
        query: &OrderHistoryQuery,
    ) -> Result<Paginated<OrderHistoryEntry>, ExchangeError> {
        Self::require_symbol(&query.symbol)?;
        let body = self.signed_get(MY_ORDER_HISTORY, &query.to_query()).await?;
        decode_paginated(&body)
    }

    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn order_info(&self, lookup: &OrderLookup) -> Result<OrderInfo, ExchangeError> {
        lookup.validate()?;
        let body = self.signed_get(ORDER_INFO, &lookup.to_query()).await?;
        decode_envelope(&body)
    }

    /// Available balance per currency
    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn wallet(&self) -> Result<Wallet, ExchangeError> {
        let body = self.signed_post_raw(WALLET, EMPTY_BODY).await?;
        decode_envelope(&body)
    }

    /// Available and reserved balance per currency
    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn balances(&self) -> Result<Balances, ExchangeError> {
        let body = self.signed_post_raw(BALANCES, EMPTY_BODY).await?;
        decode_envelope(&body)
    }

    /// Buy `amount` worth of quote currency at `rate`
    #[instrument(skip(self), fields(exchange = "bitkub", symbol = %order.symbol))]
    pub async fn place_bid(&self, order: &PlaceOrderRequest) -> Result<PlacedOrder, ExchangeError> {
        order.validate()?;
        let body = self.signed_post(PLACE_BID, order).await?;
        decode_envelope(&body)
    }

    /// Sell `amount` of base currency at `rate`
    #[instrument(skip(self), fields(exchange = "bitkub", symbol = %order.symbol))]
    pub async fn place_ask(&self, order: &PlaceOrderRequest) -> Result<PlacedOrder, ExchangeError> {
        order.validate()?;
        let body = self.signed_post(PLACE_ASK, order).await?;
        decode_envelope(&body)
    }

    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn cancel_order(&self, lookup: &OrderLookup) -> Result<(), ExchangeError> {
        lookup.validate()?;
        let body = self.signed_post(CANCEL_ORDER, lookup).await?;
        decode_ack(&body).map(|_| ())
    }

    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn trading_credits(&self) -> Result<Decimal, ExchangeError> {
        let body = self.signed_post_raw(TRADING_CREDITS, EMPTY_BODY).await?;
        decode_envelope(&body)
    }

    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn user_limits(&self) -> Result<UserLimits, ExchangeError> {
        let body = self.signed_post_raw(USER_LIMITS, EMPTY_BODY).await?;
        decode_envelope(&body)
    }

    /// Token for private WebSocket channels
    #[instrument(skip(self), fields(exchange = "bitkub"))]
    pub async fn ws_token(&self) -> Result<String, ExchangeError> {
        let body = self.signed_post_raw(WS_TOKEN, EMPTY_BODY).await?;
        decode_envelope(&body)
    }
}
