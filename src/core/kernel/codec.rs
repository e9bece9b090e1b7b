use crate::core::errors::ExchangeError;

/// Codec trait for turning raw stream frames into exchange-specific messages
///
/// The streaming transport relays frames verbatim because one connection may
/// multiplex several topics; consumers pick a codec and decode on their side.
pub trait WsCodec: Send + Sync + 'static {
    /// The type representing parsed messages from this exchange
    type Message: Send + Sync;

    /// Decode a raw text frame into a typed message
    ///
    /// # Returns
    /// - `Ok(Some(message))` - Successfully decoded message
    /// - `Ok(None)` - Frame was ignored/filtered by codec
    /// - `Err(error)` - Failed to decode frame
    fn decode_message(&self, frame: &str) -> Result<Option<Self::Message>, ExchangeError>;
}
