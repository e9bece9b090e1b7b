use crate::core::errors::ExchangeError;
use crate::core::kernel::codec::WsCodec;
use crate::exchanges::bitkub::types::{WsTicker, WsTrade};
use serde_json::Value;

const TICKER_PREFIX: &str = "market.ticker.";
const TRADE_PREFIX: &str = "market.trade.";

/// Stream name for the ticker of `symbol`, e.g. `market.ticker.thb_btc`.
pub fn ticker_stream(symbol: &str) -> String {
    format!("{}{}", TICKER_PREFIX, symbol.to_lowercase())
}

/// Stream name for the trades of `symbol`, e.g. `market.trade.thb_btc`.
pub fn trade_stream(symbol: &str) -> String {
    format!("{}{}", TRADE_PREFIX, symbol.to_lowercase())
}

/// Bitkub stream messages, told apart by their `stream` field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitkubMessage {
    Ticker(WsTicker),
    Trade(WsTrade),
    /// Any other stream, kept as parsed JSON
    Unknown { stream: Option<String>, data: Value },
}

/// Decodes relayed frames on the consumer side.
#[derive(Debug, Clone, Copy, Default)]
pub struct BitkubCodec;

impl BitkubCodec {
    pub fn new() -> Self {
        Self
    }
}

impl WsCodec for BitkubCodec {
    type Message = BitkubMessage;

    fn decode_message(&self, frame: &str) -> Result<Option<Self::Message>, ExchangeError> {
        let trimmed = frame.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| ExchangeError::malformed(format!("Invalid stream frame: {}", e), frame))?;
        let stream = value.get("stream").and_then(Value::as_str).map(str::to_string);

        let message = match stream.as_deref() {
            Some(name) if name.starts_with(TICKER_PREFIX) => {
                BitkubMessage::Ticker(serde_json::from_value(value).map_err(|e| {
                    ExchangeError::malformed(format!("Invalid ticker frame: {}", e), frame)
                })?)
            }
            Some(name) if name.starts_with(TRADE_PREFIX) => {
                BitkubMessage::Trade(serde_json::from_value(value).map_err(|e| {
                    ExchangeError::malformed(format!("Invalid trade frame: {}", e), frame)
                })?)
            }
            _ => BitkubMessage::Unknown {
                stream,
                data: value,
            },
        };
        Ok(Some(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kernel::StreamMessage;
    use rust_decimal_macros::dec;

    #[test]
    fn stream_names_are_lowercased() {
        assert_eq!(ticker_stream("THB_BTC"), "market.ticker.thb_btc");
        assert_eq!(trade_stream("thb_eth"), "market.trade.thb_eth");
    }

    #[test]
    fn decodes_trade_frames() {
        let frame = r#"{"stream":"market.trade.thb_btc","sym":"THB_BTC","txn":"BTCSELL0021182107",
            "rat":"2880000","amt":0.0012,"bid":"48214537","sid":"48214538","ts":1707220534}"#;
        let message = BitkubCodec::new().decode_message(frame).unwrap().unwrap();
        match message {
            BitkubMessage::Trade(trade) => {
                assert_eq!(trade.symbol, "THB_BTC");
                assert_eq!(trade.rate, dec!(2880000));
                assert_eq!(trade.amount, dec!(0.0012));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn decodes_ticker_frames() {
        let frame = r#"{"stream":"market.ticker.thb_eth","id":2,"last":81000,"isFrozen":0}"#;
        assert!(matches!(
            BitkubCodec::new().decode_message(frame).unwrap(),
            Some(BitkubMessage::Ticker(_))
        ));
    }

    #[test]
    fn unknown_streams_are_kept() {
        let frame = r#"{"stream":"market.orderbook.thb_btc","data":[]}"#;
        match BitkubCodec::new().decode_message(frame).unwrap() {
            Some(BitkubMessage::Unknown { stream, .. }) => {
                assert_eq!(stream.as_deref(), Some("market.orderbook.thb_btc"));
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn blank_frames_are_skipped() {
        assert_eq!(BitkubCodec::new().decode_message(" \n").unwrap(), None);
    }

    #[test]
    fn garbage_is_malformed() {
        let err = BitkubCodec::new().decode_message("not json").unwrap_err();
        assert_eq!(err.raw_body(), Some("not json"));
    }

    #[test]
    fn stream_messages_decode_through_the_codec() {
        let codec = BitkubCodec::new();
        let frame = StreamMessage::Frame(r#"{"stream":"market.ticker.thb_btc"}"#.to_string());
        assert!(matches!(
            frame.decode(&codec),
            Some(Ok(BitkubMessage::Ticker(_)))
        ));
        assert!(StreamMessage::Closed.decode(&codec).is_none());
    }
}
