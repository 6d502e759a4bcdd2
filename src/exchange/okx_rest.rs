use crate::config::OkxCfg;
use crate::error::ExchangeError;
use crate::exchange::models::{is_auth_code, AccountBalance, OkxEnvelope};
use crate::exchange::signer::{iso_timestamp, OkxCredentials};
use crate::exchange::Exchange;
use crate::types::{BalanceSnapshot, OrderRequest};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;

pub const BALANCE_PATH: &str = "/api/v5/account/balance";
pub const BATCH_ORDERS_PATH: &str = "/api/v5/trade/batch-orders";

#[derive(Clone)]
pub struct OkxRest {
    base_url: String, // e.g. https://www.okx.com
    credentials: OkxCredentials,
    simulated_trading: bool,
    client: Client,
}

impl OkxRest {
    pub fn new(cfg: &OkxCfg, credentials: OkxCredentials) -> Self {
        Self {
            base_url: cfg.rest_base_url.trim_end_matches('/').to_string(),
            credentials,
            simulated_trading: cfg.simulated_trading,
            client: Client::new(),
        }
    }

    /// Attaches the four auth headers. The timestamp is taken here, at call time.
    fn authed(
        &self,
        req: RequestBuilder,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<RequestBuilder, ExchangeError> {
        let timestamp = iso_timestamp();
        let sign = self.credentials.signer.sign(&timestamp, method, path, body)?;

        let mut req = req
            .header("OK-ACCESS-KEY", &self.credentials.api_key)
            .header("OK-ACCESS-SIGN", sign)
            .header("OK-ACCESS-TIMESTAMP", timestamp)
            .header("OK-ACCESS-PASSPHRASE", self.credentials.passphrase.expose_secret());
        if self.simulated_trading {
            req = req.header("x-simulated-trading", "1");
        }
        Ok(req)
    }

    pub async fn get_balance(&self) -> Result<BalanceSnapshot, ExchangeError> {
        let url = format!("{}{}", self.base_url, BALANCE_PATH);
        let resp = self
            .authed(self.client.get(url), "GET", BALANCE_PATH, None)?
            .send()
            .await?;

        let envelope: OkxEnvelope<AccountBalance> = read_envelope(resp).await?;
        let account = envelope
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Decode("balance response has no data".into()))?;
        account.into_snapshot()
    }

    /// POST /api/v5/trade/batch-orders. The body is serialized once and the same
    /// string is both signed and sent.
    pub async fn post_batch_orders(&self, orders: &[OrderRequest]) -> Result<(), ExchangeError> {
        let body = serde_json::to_string(orders)?;
        let url = format!("{}{}", self.base_url, BATCH_ORDERS_PATH);
        let req = self
            .client
            .post(url)
            .header("Content-Type", "application/json");
        let resp = self
            .authed(req, "POST", BATCH_ORDERS_PATH, Some(&body))?
            .body(body)
            .send()
            .await?;

        let _: OkxEnvelope<serde_json::Value> = read_envelope(resp).await?;
        Ok(())
    }
}

async fn read_envelope<T: DeserializeOwned>(resp: Response) -> Result<OkxEnvelope<T>, ExchangeError> {
    let status = resp.status();
    let body = resp.text().await?;
    classify(status, body)
}

/// Sorts a response into success or one of the error kinds. `body` is kept
/// verbatim in every error so rejections can be relayed to the user as-is.
pub fn classify<T: DeserializeOwned>(
    status: StatusCode,
    body: String,
) -> Result<OkxEnvelope<T>, ExchangeError> {
    if status == StatusCode::UNAUTHORIZED {
        return Err(ExchangeError::Auth { status: status.as_u16(), body });
    }

    // Error bodies still carry an envelope; look at its code before giving up on status.
    let envelope: OkxEnvelope<T> = match serde_json::from_str(&body) {
        Ok(env) => env,
        Err(e) if status.is_success() => {
            return Err(ExchangeError::Decode(format!("{}: {}", e, body)));
        }
        Err(_) => return Err(ExchangeError::Http { status: status.as_u16(), body }),
    };

    if is_auth_code(&envelope.code) {
        return Err(ExchangeError::Auth { status: status.as_u16(), body });
    }
    if envelope.code != "0" {
        return Err(ExchangeError::Rejected {
            code: envelope.code,
            msg: envelope.msg,
            body,
        });
    }
    if !status.is_success() {
        return Err(ExchangeError::Http { status: status.as_u16(), body });
    }
    Ok(envelope)
}

#[async_trait]
impl Exchange for OkxRest {
    async fn balance(&self) -> Result<BalanceSnapshot, ExchangeError> {
        self.get_balance().await
    }

    async fn place_batch(&self, orders: &[OrderRequest]) -> Result<(), ExchangeError> {
        self.post_batch_orders(orders).await
    }
}
