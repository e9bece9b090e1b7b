use crate::core::errors::ExchangeError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::fmt;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

/// Result type for signing operations: headers to attach to the request
pub type SignatureResult = Result<HashMap<String, String>, ExchangeError>;

/// HTTP verbs that can carry a signed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
        }
    }
}

/// Everything a signature binds, built fresh for every call.
///
/// `canonical_payload` must be byte-identical to what goes on the wire:
/// `?` + query string for GET, the JSON body for POST.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequest<'a> {
    pub timestamp_millis: u64,
    pub method: HttpMethod,
    pub path: &'a str,
    pub canonical_payload: &'a str,
}

impl SignedRequest<'_> {
    /// The message that gets MACed: timestamp, verb, path and payload with no separators.
    pub fn prehash(&self) -> String {
        format!(
            "{}{}{}{}",
            self.timestamp_millis,
            self.method.as_str(),
            self.path,
            self.canonical_payload
        )
    }
}

/// Signer trait for request authentication
///
/// Implementations turn a [`SignedRequest`] into the headers the exchange
/// expects on an authenticated call.
pub trait Signer: Send + Sync {
    fn sign_request(&self, request: &SignedRequest<'_>) -> SignatureResult;
}

/// Lowercase hex HMAC-SHA256 of `message` keyed with `secret`.
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Encode query parameters the way they are both signed and sent.
///
/// Keys are sorted; pairs sharing a key keep their relative order. Escaping is
/// `application/x-www-form-urlencoded`, so a space becomes `+`.
pub fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(sorted)
        .finish()
}
