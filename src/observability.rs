use crate::config::ObservabilityCfg;
use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,okx_liquidator=debug";

/// `RUST_LOG` wins over `observability.filter`, which wins over the built-in default.
pub fn init_tracing(cfg: &ObservabilityCfg) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(cfg.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    let res = if cfg.log_json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    res.map_err(|e| anyhow!("tracing init: {}", e))
}
