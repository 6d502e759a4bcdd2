use crate::error::ExchangeError;
use anyhow::{Context, Result};
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct Signer {
    api_secret: SecretString,
}

/// API key material for the OKX REST endpoints.
#[derive(Clone)]
pub struct OkxCredentials {
    pub api_key: String,
    pub passphrase: SecretString,
    pub signer: Signer,
}

/// `timestamp + method + path [+ body]`. The body must be the exact bytes sent.
pub fn prehash(timestamp: &str, method: &str, path: &str, body: Option<&str>) -> String {
    let mut out = String::with_capacity(
        timestamp.len() + method.len() + path.len() + body.map_or(0, str::len),
    );
    out.push_str(timestamp);
    out.push_str(method);
    out.push_str(path);
    if let Some(body) = body {
        out.push_str(body);
    }
    out
}

/// ISO-8601 UTC with millisecond precision, e.g. `2020-12-08T09:08:57.715Z`.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Signer {
    pub fn new(api_secret: SecretString) -> Self {
        Self { api_secret }
    }

    /// HMAC-SHA256 over the pre-hash, base64 encoded.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<String, ExchangeError> {
        let payload = prehash(timestamp, method, path, body);
        let mut mac = HmacSha256::new_from_slice(self.api_secret.expose_secret().as_bytes())
            .map_err(|e| ExchangeError::Signing(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl OkxCredentials {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OKX_API_KEY").context("OKX_API_KEY not set")?;
        let api_secret = std::env::var("OKX_API_SECRET").context("OKX_API_SECRET not set")?;
        let passphrase = std::env::var("OKX_PASSPHRASE").context("OKX_PASSPHRASE not set")?;

        if api_secret.is_empty() {
            anyhow::bail!("OKX_API_SECRET is empty");
        }

        Ok(Self {
            api_key,
            passphrase: SecretString::new(passphrase),
            signer: Signer::new(SecretString::new(api_secret)),
        })
    }
}
