//! Request signing for the JW Platform v1 API.
//!
//! Every call carries `api_format`, `api_nonce`, `api_timestamp` and `api_key`
//! plus an `api_signature`: the SHA-1 of the key-sorted `key=value&...` string
//! with the secret appended.

use std::collections::BTreeMap;

use rand::Rng;
use sha1::{Digest, Sha1};

const NONCE_MIN: u64 = 10_000_000;
const NONCE_MAX: u64 = 99_999_999;

/// Join parameters as `k1=v1&k2=v2`, ordered by key.
pub fn concat_query_parameters(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the lowercase hex signature for `params` under `secret_key`.
pub fn sign(secret_key: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha1::new();
    hasher.update(concat_query_parameters(params).as_bytes());
    hasher.update(secret_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// The full, signed query string of one request.
#[derive(Debug, Clone)]
pub struct SignedQuery {
    params: BTreeMap<String, String>,
    signature: String,
}

impl SignedQuery {
    /// Sign `extra` together with freshly generated nonce and timestamp.
    pub fn new(api_key: &str, secret_key: &str, extra: &[(&str, String)]) -> Self {
        let nonce = rand::thread_rng().gen_range(NONCE_MIN..=NONCE_MAX);
        Self::with_nonce(api_key, secret_key, extra, nonce, unix_timestamp())
    }

    pub(crate) fn with_nonce(
        api_key: &str,
        secret_key: &str,
        extra: &[(&str, String)],
        nonce: u64,
        timestamp: i64,
    ) -> Self {
        let mut params = BTreeMap::new();
        params.insert("api_format".to_string(), "json".to_string());
        params.insert("api_nonce".to_string(), nonce.to_string());
        params.insert("api_timestamp".to_string(), timestamp.to_string());
        params.insert("api_key".to_string(), api_key.to_string());
        // Caller parameters win over the generated ones.
        for (k, v) in extra {
            params.insert((*k).to_string(), v.clone());
        }

        let signature = sign(secret_key, &params);
        Self { params, signature }
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        if key == "api_signature" {
            return Some(&self.signature);
        }
        self.params.get(key).map(String::as_str)
    }

    /// All parameters, `api_signature` last, ready for `RequestBuilder::query`.
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once(("api_signature", self.signature.as_str())))
            .collect()
    }
}

/// Current UTC wall-clock time in whole seconds.
fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn concat_sorts_by_key() {
        let p = params(&[("b", "2"), ("a", "1"), ("c", "x=y")]);
        assert_eq!(concat_query_parameters(&p), "a=1&b=2&c=x=y");
    }

    #[test]
    fn concat_of_nothing_is_empty() {
        assert_eq!(concat_query_parameters(&BTreeMap::new()), "");
    }

    #[test]
    fn signature_ignores_input_order() {
        let ab = params(&[("a", "1"), ("b", "2")]);
        let ba = params(&[("b", "2"), ("a", "1")]);
        assert_eq!(sign("secret", &ab), sign("secret", &ba));
    }

    #[test]
    fn signature_is_sha1_of_query_and_secret() {
        // sha1("a=1&b=2secret")
        let mut hasher = Sha1::new();
        hasher.update(b"a=1&b=2secret");
        let expected = format!("{:x}", hasher.finalize());

        let sig = sign("secret", &params(&[("b", "2"), ("a", "1")]));
        assert_eq!(sig, expected);
        assert_eq!(sig.len(), 40);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn signature_depends_on_secret() {
        let p = params(&[("a", "1")]);
        assert_ne!(sign("one", &p), sign("two", &p));
    }

    #[test]
    fn signed_query_covers_generated_fields() {
        let q = SignedQuery::with_nonce(
            "key",
            "secret",
            &[("channel_key", "abc".to_string())],
            12_345_678,
            1_482_575_700,
        );

        assert_eq!(q.get("api_format"), Some("json"));
        assert_eq!(q.get("api_nonce"), Some("12345678"));
        assert_eq!(q.get("api_timestamp"), Some("1482575700"));
        assert_eq!(q.get("api_key"), Some("key"));
        assert_eq!(q.get("channel_key"), Some("abc"));

        let expected = sign(
            "secret",
            &params(&[
                ("api_format", "json"),
                ("api_key", "key"),
                ("api_nonce", "12345678"),
                ("api_timestamp", "1482575700"),
                ("channel_key", "abc"),
            ]),
        );
        assert_eq!(q.signature(), expected);

        let pairs = q.pairs();
        assert_eq!(pairs.last(), Some(&("api_signature", expected.as_str())));
        assert_eq!(pairs.len(), 6);
    }

    #[test]
    fn caller_parameters_override_generated_ones() {
        let q = SignedQuery::with_nonce("key", "secret", &[("api_format", "xml".to_string())], 1, 2);
        assert_eq!(q.get("api_format"), Some("xml"));
    }

    #[test]
    fn nonce_stays_in_range() {
        for _ in 0..100 {
            let q = SignedQuery::new("key", "secret", &[]);
            let nonce: u64 = q.get("api_nonce").unwrap().parse().unwrap();
            assert!((NONCE_MIN..=NONCE_MAX).contains(&nonce));
        }
    }
}
