//! OAuth 1.0 token-based authentication for RESTlet calls (HMAC-SHA256).

use crate::config::NetSuiteConfig;
use crate::error::{ReportError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::Sha256;

pub const SIGNATURE_METHOD: &str = "HMAC-SHA256";
pub const NONCE_LENGTH: usize = 11;

// RFC 3986 unreserved characters stay literal
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

pub fn generate_nonce() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

pub fn generate_timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

/// Builds the `Authorization` header value for one request.
pub fn authorization_header(
    config: &NetSuiteConfig,
    method: &str,
    url: &str,
    timestamp: &str,
    nonce: &str,
) -> Result<String> {
    let mut params = vec![
        ("oauth_consumer_key", config.consumer_key.clone()),
        ("oauth_nonce", nonce.to_string()),
        ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
        ("oauth_timestamp", timestamp.to_string()),
        ("oauth_token", config.token_id.clone()),
        ("oauth_version", "1.0".to_string()),
    ];
    params.sort();

    let signature = sign(config, method, url, &params)?;
    params.push(("oauth_signature", signature));
    params.sort();

    let mut header = format!("OAuth realm=\"{}\"", config.realm());
    for (key, value) in &params {
        header.push_str(&format!(", {}=\"{}\"", key, encode(value)));
    }
    Ok(header)
}

fn sign(
    config: &NetSuiteConfig,
    method: &str,
    url: &str,
    sorted_params: &[(&str, String)],
) -> Result<String> {
    let param_string = sorted_params
        .iter()
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_uppercase(),
        encode(url),
        encode(&param_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&config.consumer_secret),
        encode(&config.token_secret)
    );

    let mut mac = Hmac::<Sha256>::new_from_slice(signing_key.as_bytes())
        .map_err(|e| ReportError::Configuration(format!("Invalid signing key: {}", e)))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
