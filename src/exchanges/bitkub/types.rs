use crate::core::errors::ExchangeError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(ExchangeError::InvalidParameters(format!(
                "Order side must be buy or sell, got {:?}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

impl OrderType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::Market => "market",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "limit" => Ok(Self::Limit),
            "market" => Ok(Self::Market),
            other => Err(ExchangeError::InvalidParameters(format!(
                "Order type must be limit or market, got {:?}",
                other
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Write a decimal as a bare JSON number in its own digits: no float
/// round-trip, no exponent, no trailing zeros.
fn decimal_number<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
    let raw = RawValue::from_string(value.normalize().to_string())
        .map_err(serde::ser::Error::custom)?;
    raw.serialize(serializer)
}

/// Body of `place-bid` / `place-ask`. Amounts go out as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlaceOrderRequest {
    #[serde(rename = "sym")]
    pub symbol: String,
    /// Quote amount to spend on a bid, base amount to sell on an ask
    #[serde(rename = "amt", serialize_with = "decimal_number")]
    pub amount: Decimal,
    /// Zero for market orders
    #[serde(rename = "rat", serialize_with = "decimal_number")]
    pub rate: Decimal,
    #[serde(rename = "typ")]
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl PlaceOrderRequest {
    pub fn limit(symbol: impl Into<String>, amount: Decimal, rate: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
            rate,
            order_type: OrderType::Limit,
            client_id: None,
        }
    }

    pub fn market(symbol: impl Into<String>, amount: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            amount,
            rate: Decimal::ZERO,
            order_type: OrderType::Market,
            client_id: None,
        }
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        if self.symbol.trim().is_empty() {
            return Err(ExchangeError::InvalidParameters(
                "Order symbol must not be empty".to_string(),
            ));
        }
        if self.amount <= Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(format!(
                "Order amount must be positive, got {}",
                self.amount
            )));
        }
        if self.rate < Decimal::ZERO {
            return Err(ExchangeError::InvalidParameters(format!(
                "Order rate must not be negative, got {}",
                self.rate
            )));
        }
        Ok(())
    }
}

/// Identifies one order, either by `(sym, id, sd)` or by `hash`.
///
/// Used as the body of `cancel-order` and the query of `order-info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLookup {
    #[serde(rename = "sym", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "sd", skip_serializing_if = "Option::is_none")]
    pub side: Option<OrderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl OrderLookup {
    pub fn by_id(symbol: impl Into<String>, id: impl Into<String>, side: OrderSide) -> Self {
        Self {
            symbol: Some(symbol.into()),
            id: Some(id.into()),
            side: Some(side),
            hash: None,
        }
    }

    pub fn by_hash(hash: impl Into<String>) -> Self {
        Self {
            symbol: None,
            id: None,
            side: None,
            hash: Some(hash.into()),
        }
    }

    pub fn validate(&self) -> Result<(), ExchangeError> {
        let filled =
            |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());

        if filled(&self.hash) {
            return Ok(());
        }
        if filled(&self.symbol) && filled(&self.id) && self.side.is_some() {
            return Ok(());
        }
        Err(ExchangeError::InvalidParameters(
            "Order lookup needs a hash, or a symbol, id and side".to_string(),
        ))
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(symbol) = &self.symbol {
            query.push(("sym", symbol.clone()));
        }
        if let Some(id) = &self.id {
            query.push(("id", id.clone()));
        }
        if let Some(side) = self.side {
            query.push(("sd", side.as_str().to_string()));
        }
        if let Some(hash) = &self.hash {
            query.push(("hash", hash.clone()));
        }
        query
    }
}

/// Query for `my-order-history`; zero-valued optionals are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderHistoryQuery {
    pub symbol: String,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl OrderHistoryQuery {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn between(mut self, start: u64, end: u64) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("sym", self.symbol.clone())];
        let optional = [
            ("p", self.page.map(u64::from)),
            ("lmt", self.limit.map(u64::from)),
            ("start", self.start),
            ("end", self.end),
        ];
        for (key, value) in optional {
            if let Some(value) = value.filter(|v| *v != 0) {
                query.push((key, value.to_string()));
            }
        }
        query
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub id: String,
    #[serde(default)]
    pub hash: String,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub receive: Decimal,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub ts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistoryEntry {
    pub txn_id: String,
    pub order_id: String,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub parent_order_id: String,
    #[serde(default)]
    pub super_order_id: String,
    #[serde(default)]
    pub taken_by_me: bool,
    #[serde(default)]
    pub is_maker: bool,
    pub side: String,
    #[serde(rename = "type")]
    pub order_type: String,
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub ts: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFill {
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub hash: String,
    pub id: String,
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub txn_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderInfo {
    pub id: String,
    #[serde(default)]
    pub first: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub last: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub rate: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub credit: Decimal,
    #[serde(default)]
    pub filled: Decimal,
    #[serde(default)]
    pub total: Decimal,
    pub status: String,
    #[serde(default)]
    pub partial_filled: bool,
    #[serde(default)]
    pub remaining: Decimal,
    #[serde(default)]
    pub history: Vec<OrderFill>,
}

/// Result of `place-bid` / `place-ask`, in the exchange's abbreviated fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub id: String,
    #[serde(default)]
    pub hash: String,
    #[serde(rename = "typ")]
    pub order_type: String,
    #[serde(rename = "amt", default)]
    pub amount: Decimal,
    #[serde(rename = "rat", default)]
    pub rate: Decimal,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(rename = "cre", default)]
    pub credit: Decimal,
    #[serde(rename = "rec", default)]
    pub receive: Decimal,
    #[serde(default)]
    pub ts: u64,
    #[serde(rename = "ci", default)]
    pub client_id: String,
}

/// Available balance per currency.
pub type Wallet = HashMap<String, Decimal>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(default)]
    pub available: Decimal,
    #[serde(default)]
    pub reserved: Decimal,
}

pub type Balances = HashMap<String, Balance>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowLimit {
    #[serde(default)]
    pub deposit: Decimal,
    #[serde(default)]
    pub withdraw: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetLimits {
    #[serde(default)]
    pub crypto: FlowLimit,
    #[serde(default)]
    pub fiat: FlowLimit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowUsage {
    #[serde(default)]
    pub deposit: Decimal,
    #[serde(default)]
    pub withdraw: Decimal,
    #[serde(default)]
    pub deposit_percentage: Decimal,
    #[serde(default)]
    pub withdraw_percentage: Decimal,
    #[serde(default)]
    pub deposit_thb_equivalent: Option<Decimal>,
    #[serde(default)]
    pub withdraw_thb_equivalent: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUsage {
    #[serde(default)]
    pub crypto: FlowUsage,
    #[serde(default)]
    pub fiat: FlowUsage,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLimits {
    #[serde(default)]
    pub limits: AssetLimits,
    #[serde(default)]
    pub usage: AssetUsage,
    /// THB conversion rate used for the equivalents
    #[serde(default)]
    pub rate: Decimal,
}

// ---------------------------------------------------------------------------
// Stream payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WsTicker {
    pub stream: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub last: Decimal,
    #[serde(default)]
    pub lowest_ask: Decimal,
    #[serde(default)]
    pub lowest_ask_size: Decimal,
    #[serde(default)]
    pub highest_bid: Decimal,
    #[serde(default)]
    pub highest_bid_size: Decimal,
    #[serde(default)]
    pub change: Decimal,
    #[serde(default)]
    pub percent_change: Decimal,
    #[serde(default)]
    pub base_volume: Decimal,
    #[serde(default)]
    pub quote_volume: Decimal,
    #[serde(default)]
    pub is_frozen: u8,
    #[serde(rename = "high24hr", default)]
    pub high_24hr: Decimal,
    #[serde(rename = "low24hr", default)]
    pub low_24hr: Decimal,
    #[serde(default)]
    pub open: Decimal,
    #[serde(default)]
    pub close: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsTrade {
    pub stream: String,
    #[serde(rename = "sym")]
    pub symbol: String,
    #[serde(rename = "txn")]
    pub txn_id: String,
    #[serde(rename = "amt", default)]
    pub amount: Decimal,
    #[serde(rename = "rat", default)]
    pub rate: Decimal,
    /// Bid order id
    #[serde(default)]
    pub bid: String,
    /// Ask order id
    #[serde(default)]
    pub sid: String,
    #[serde(default)]
    pub ts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::HttpMethod;
    use crate::exchanges::bitkub::signer::sign;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    #[test]
    fn place_order_body_matches_the_signed_example() {
        let body = serde_json::to_string(&PlaceOrderRequest::limit(
            "thb_btc",
            dec!(1000),
            dec!(10),
        ))
        .unwrap();
        assert_eq!(body, r#"{"sym":"thb_btc","amt":1000,"rat":10,"typ":"limit"}"#);
        assert_eq!(
            sign(
                "s",
                1_699_376_552_354,
                HttpMethod::Post,
                "/api/v3/market/place-bid",
                &body
            ),
            "0ee3b9a0a08f8bf0f12dde8d94c1aaa8d37e9ff716a0be3022fa977a9acda60f"
        );
    }

    #[test]
    fn amounts_keep_their_exact_digits() {
        let body = serde_json::to_string(
            &PlaceOrderRequest::limit("thb_btc", dec!(0.00000001), dec!(2880000.50))
                .with_client_id("c1"),
        )
        .unwrap();
        assert_eq!(
            body,
            r#"{"sym":"thb_btc","amt":0.00000001,"rat":2880000.5,"typ":"limit","client_id":"c1"}"#
        );

        let precise = serde_json::to_string(&PlaceOrderRequest::market(
            "thb_btc",
            dec!(12345678901234.123456789),
        ))
        .unwrap();
        assert!(precise.contains(r#""amt":12345678901234.123456789,"rat":0,"#));

        let value: Value = serde_json::from_str(&precise).unwrap();
        assert!(value["amt"].is_number());
    }

    #[test]
    fn order_validation_rejects_bad_input() {
        assert!(PlaceOrderRequest::limit("", dec!(1), dec!(1)).validate().is_err());
        assert!(PlaceOrderRequest::limit("thb_btc", dec!(0), dec!(1)).validate().is_err());
        assert!(PlaceOrderRequest::limit("thb_btc", dec!(1), dec!(-1)).validate().is_err());
        assert!(PlaceOrderRequest::market("thb_btc", dec!(100)).validate().is_ok());
    }

    #[test]
    fn side_and_type_parse_strictly() {
        assert_eq!("BUY".parse::<OrderSide>().unwrap(), OrderSide::Buy);
        assert_eq!("market".parse::<OrderType>().unwrap(), OrderType::Market);
        assert!(matches!(
            "hold".parse::<OrderSide>(),
            Err(ExchangeError::InvalidParameters(_))
        ));
        assert!("stop".parse::<OrderType>().is_err());
    }

    #[test]
    fn lookup_requires_hash_or_full_triple() {
        assert!(OrderLookup::by_hash("fwQ6dnQWQPs4cbatF5Am2xCDP1J").validate().is_ok());
        assert!(OrderLookup::by_id("btc_thb", "1", OrderSide::Buy).validate().is_ok());

        let partial = OrderLookup {
            id: None,
            ..OrderLookup::by_id("btc_thb", "1", OrderSide::Sell)
        };
        assert!(partial.validate().is_err());
        assert!(OrderLookup::by_hash("  ").validate().is_err());
    }

    #[test]
    fn lookup_serializes_only_present_fields() {
        let body = serde_json::to_string(&OrderLookup::by_id("btc_thb", "42", OrderSide::Sell))
            .unwrap();
        assert_eq!(body, r#"{"sym":"btc_thb","id":"42","sd":"sell"}"#);
        assert_eq!(
            serde_json::to_string(&OrderLookup::by_hash("h")).unwrap(),
            r#"{"hash":"h"}"#
        );
    }

    #[test]
    fn history_query_omits_unset_and_zero_values() {
        let query = OrderHistoryQuery::new("btc_thb").limit(10).page(0).to_query();
        assert_eq!(
            query,
            vec![("sym", "btc_thb".to_string()), ("lmt", "10".to_string())]
        );
    }

    #[test]
    fn responses_accept_numbers_or_strings_for_amounts() {
        let entry: OrderHistoryEntry = serde_json::from_str(
            r#"{"txn_id":"ETHBUY0000000197","order_id":"240","hash":"x","side":"buy","type":"limit",
                "rate":"13900.00","fee":"0.35","credit":"0.35","amount":"0.00719424","ts":1529516287,
                "taken_by_me":true,"is_maker":false}"#,
        )
        .unwrap();
        assert_eq!(entry.rate, dec!(13900.00));
        assert!(entry.taken_by_me);

        let order: OpenOrder = serde_json::from_str(
            r#"{"id":"2","side":"sell","type":"limit","rate":15000,"fee":0.35,"amount":0.5,"ts":1533834844}"#,
        )
        .unwrap();
        assert_eq!(order.rate, dec!(15000));
        assert_eq!(order.amount, dec!(0.5));
    }

    #[test]
    fn ticker_uses_exchange_field_names() {
        let ticker: WsTicker = serde_json::from_str(
            r#"{"stream":"market.ticker.thb_btc","id":1,"last":2883194.4,"lowestAsk":2883194.45,
                "highestBid":2880000,"percentChange":-0.49,"high24hr":2920000,"low24hr":2850000,"isFrozen":0}"#,
        )
        .unwrap();
        assert_eq!(ticker.stream, "market.ticker.thb_btc");
        assert_eq!(ticker.highest_bid, dec!(2880000));
        assert_eq!(ticker.high_24hr, dec!(2920000));
    }
}
