use thiserror::Error;

/// Failure talking to the exchange. Never retried.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("authentication rejected (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    #[error("exchange returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Non-zero `code` in the response envelope. `body` is the raw response.
    #[error("exchange rejected request (code {code}): {body}")]
    Rejected { code: String, msg: String, body: String },

    #[error("malformed exchange response: {0}")]
    Decode(String),

    #[error("failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Error)]
pub enum LiquidationError {
    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("no holding for {0} in the current balance")]
    HoldingMissing(String),
}
