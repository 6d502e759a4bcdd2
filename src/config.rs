use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OkxCfg {
    pub rest_base_url: String,
    /// Sends `x-simulated-trading: 1` so orders hit the demo account.
    pub simulated_trading: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramCfg {
    pub api_base_url: String,
    pub poll_timeout_sec: u64,
    pub retry_delay_ms: u64,
    /// A chat worker with no updates for this long exits; the next update starts a new one.
    #[serde(default = "default_worker_idle_sec")]
    pub worker_idle_sec: u64,
}

fn default_worker_idle_sec() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiquidationCfg {
    pub quote_currency: String,
    pub dust_threshold_usd: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityCfg {
    pub log_json: bool,
    /// EnvFilter directives used when `RUST_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub okx: OkxCfg,
    pub telegram: TelegramCfg,
    pub liquidation: LiquidationCfg,
    pub observability: ObservabilityCfg,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::File::with_name("config.example").required(false))
            .add_source(config::Environment::default().separator("__"));

        if let Ok(path) = std::env::var("BOT_CONFIG") {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let cfg: AppConfig = builder
            .build()
            .context("failed to build config")?
            .try_deserialize()
            .context("failed to deserialize config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.okx.rest_base_url.is_empty() {
            anyhow::bail!("okx.rest_base_url is empty");
        }
        if self.telegram.api_base_url.is_empty() {
            anyhow::bail!("telegram.api_base_url is empty");
        }
        if self.telegram.worker_idle_sec == 0 {
            anyhow::bail!("telegram.worker_idle_sec must be positive");
        }
        if self.liquidation.quote_currency.is_empty() {
            anyhow::bail!("liquidation.quote_currency is empty");
        }
        Ok(())
    }
}
