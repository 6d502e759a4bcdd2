use anyhow::{Context, Result};
use okx_liquidator::bot::flow::SellFlow;
use okx_liquidator::bot::session::InMemorySessions;
use okx_liquidator::config::AppConfig;
use okx_liquidator::exchange::okx_rest::OkxRest;
use okx_liquidator::exchange::signer::OkxCredentials;
use okx_liquidator::liquidation::filter::LiquidationRules;
use okx_liquidator::liquidation::Liquidator;
use okx_liquidator::observability::init_tracing;
use okx_liquidator::telegram::api::TelegramApi;
use okx_liquidator::telegram::poller::Poller;
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv::dotenv();
    let cfg = AppConfig::load()?;
    init_tracing(&cfg.observability)?;

    // Missing credentials are fatal: nothing below can work without them.
    let credentials = OkxCredentials::from_env()?;
    let token = TelegramApi::token_from_env()?;
    let rules = LiquidationRules::new(&cfg.liquidation).context("invalid liquidation config")?;

    let okx = Arc::new(OkxRest::new(&cfg.okx, credentials));
    let liquidator = Arc::new(Liquidator::new(okx, rules));
    let api = Arc::new(TelegramApi::new(&cfg.telegram, token));

    if let Err(e) = api.set_my_commands().await {
        tracing::warn!(error = ?e, "could not register bot commands");
    }

    let flow = Arc::new(SellFlow::new(
        liquidator,
        api.clone(),
        Arc::new(InMemorySessions::default()),
    ));
    let mut poller = Poller::new(api, flow, cfg.telegram.clone());

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::warn!("ctrl_c received; shutting down");
        }
        res = poller.run() => {
            if let Err(e) = res {
                tracing::error!(error = ?e, "polling loop terminated with error");
                return Err(e);
            }
        }
    }
    Ok(())
}
