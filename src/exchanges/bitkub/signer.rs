use crate::core::errors::ExchangeError;
use crate::core::kernel::{hmac_sha256_hex, HttpMethod, SignatureResult, SignedRequest, Signer};
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;

pub const HEADER_TIMESTAMP: &str = "X-BTK-TIMESTAMP";
pub const HEADER_API_KEY: &str = "X-BTK-APIKEY";
pub const HEADER_SIGNATURE: &str = "X-BTK-SIGN";

/// Signature over `timestamp + METHOD + path + payload`, lowercase hex.
///
/// `payload` is `?` + query for GET (just `?` when there is none) or the JSON
/// body for POST.
pub fn sign(
    secret: &str,
    timestamp_millis: u64,
    method: HttpMethod,
    path: &str,
    payload: &str,
) -> String {
    let request = SignedRequest {
        timestamp_millis,
        method,
        path,
        canonical_payload: payload,
    };
    hmac_sha256_hex(secret.as_bytes(), request.prehash().as_bytes())
}

/// HMAC-SHA256 signer producing the `X-BTK-*` headers.
pub struct BitkubSigner {
    api_key: Secret<String>,
    secret_key: Secret<String>,
}

impl BitkubSigner {
    pub fn new(api_key: Secret<String>, secret_key: Secret<String>) -> Result<Self, ExchangeError> {
        if api_key.expose_secret().is_empty() || secret_key.expose_secret().is_empty() {
            return Err(ExchangeError::AuthError(
                "API key and secret are required for signed requests".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            secret_key,
        })
    }
}

impl std::fmt::Debug for BitkubSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitkubSigner")
            .field("api_key", &"[REDACTED]")
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl Signer for BitkubSigner {
    fn sign_request(&self, request: &SignedRequest<'_>) -> SignatureResult {
        let signature = sign(
            self.secret_key.expose_secret(),
            request.timestamp_millis,
            request.method,
            request.path,
            request.canonical_payload,
        );

        let mut headers = HashMap::new();
        headers.insert(
            HEADER_TIMESTAMP.to_string(),
            request.timestamp_millis.to_string(),
        );
        headers.insert(
            HEADER_API_KEY.to_string(),
            self.api_key.expose_secret().clone(),
        );
        headers.insert(HEADER_SIGNATURE.to_string(), signature);
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLACE_BID_BODY: &str = r#"{"sym":"thb_btc","amt":1000,"rat":10,"typ":"limit"}"#;

    #[test]
    fn post_signature_matches_known_vector() {
        let signature = sign(
            "s",
            1_699_376_552_354,
            HttpMethod::Post,
            "/api/v3/market/place-bid",
            PLACE_BID_BODY,
        );
        assert_eq!(
            signature,
            "0ee3b9a0a08f8bf0f12dde8d94c1aaa8d37e9ff716a0be3022fa977a9acda60f"
        );
    }

    #[test]
    fn get_signature_matches_known_vector() {
        let signature = sign(
            "s",
            1_699_381_086_593,
            HttpMethod::Get,
            "/api/v3/market/my-order-history",
            "?lmt=1&sym=THB_BTC",
        );
        assert_eq!(
            signature,
            "535edbe22fe3dbde56e7fd79e6275030a525da508287c2e81334c4064702f237"
        );
    }

    #[test]
    fn empty_get_query_still_signs_question_mark() {
        let signature = sign(
            "s",
            1_699_381_086_593,
            HttpMethod::Get,
            "/api/v3/market/wallet",
            "?",
        );
        assert_eq!(
            signature,
            "23caeecbcc468f360337c497925782a1bf32c45407f61662d11e21e4a28d47ab"
        );
    }

    #[test]
    fn a_single_byte_changes_the_signature() {
        let body = format!("{} ", PLACE_BID_BODY);
        let signature = sign(
            "s",
            1_699_376_552_354,
            HttpMethod::Post,
            "/api/v3/market/place-bid",
            &body,
        );
        assert_eq!(
            signature,
            "de53fe830a94fa1eafd5c7e161739f7c312bbc05cce6af0e5ffb80d290207a18"
        );
    }

    #[test]
    fn signer_emits_exchange_headers() {
        let signer = BitkubSigner::new(
            Secret::new("key".to_string()),
            Secret::new("s".to_string()),
        )
        .unwrap();
        let headers = signer
            .sign_request(&SignedRequest {
                timestamp_millis: 1_699_376_552_354,
                method: HttpMethod::Post,
                path: "/api/v3/market/place-bid",
                canonical_payload: PLACE_BID_BODY,
            })
            .unwrap();

        assert_eq!(headers[HEADER_TIMESTAMP], "1699376552354");
        assert_eq!(headers[HEADER_API_KEY], "key");
        assert_eq!(
            headers[HEADER_SIGNATURE],
            "0ee3b9a0a08f8bf0f12dde8d94c1aaa8d37e9ff716a0be3022fa977a9acda60f"
        );
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let err = BitkubSigner::new(Secret::new(String::new()), Secret::new("s".to_string()))
            .unwrap_err();
        assert!(matches!(err, ExchangeError::AuthError(_)));
    }

    #[test]
    fn debug_hides_credentials() {
        let signer =
            BitkubSigner::new(Secret::new("key".to_string()), Secret::new("s3cr3t".to_string()))
                .unwrap();
        let rendered = format!("{:?}", signer);
        assert!(!rendered.contains("s3cr3t"));
    }
}
