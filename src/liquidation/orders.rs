use crate::error::LiquidationError;
use crate::liquidation::fetcher::BalanceFetcher;
use crate::liquidation::filter::LiquidationRules;
use crate::types::{BalanceSnapshot, OrderRequest, Selection};
use futures::future::try_join_all;

/// One market sell per sellable holding, sized to its whole available balance.
pub fn full_liquidation(snapshot: &BalanceSnapshot, rules: &LiquidationRules) -> Vec<OrderRequest> {
    rules
        .sellable_holdings(snapshot)
        .into_iter()
        .filter(|h| !rules.is_quote(&h.currency))
        .map(|h| OrderRequest::market_sell(&h.currency, &rules.quote_currency, h.available_balance))
        .collect()
}

/// One market sell per selection, sized to `fraction` of a freshly fetched
/// available balance. Lookups run concurrently; if any of them fails the whole
/// construction fails and nothing is returned.
pub async fn scaled_liquidation(
    fetcher: &BalanceFetcher,
    rules: &LiquidationRules,
    selections: &[Selection],
) -> Result<Vec<OrderRequest>, LiquidationError> {
    let targets: Vec<&Selection> = selections
        .iter()
        .filter(|s| {
            let quote = rules.is_quote(&s.currency);
            if quote {
                tracing::debug!(currency = %s.currency, "skipping quote currency selection");
            }
            !quote
        })
        .collect();

    let holdings = try_join_all(targets.iter().map(|s| fetcher.holding_of(&s.currency))).await?;

    let mut orders = Vec::with_capacity(holdings.len());
    for (selection, holding) in targets.into_iter().zip(holdings) {
        if !rules.is_sellable(&holding) {
            tracing::info!(currency = %holding.currency, eq_usd = %holding.equity_usd, "selection fell under dust threshold; skipped");
            continue;
        }
        let size = selection.fraction.apply(holding.available_balance);
        if size.is_zero() {
            tracing::info!(currency = %holding.currency, "nothing available to sell; skipped");
            continue;
        }
        orders.push(OrderRequest::market_sell(&selection.currency, &rules.quote_currency, size));
    }
    Ok(orders)
}

/// True when the batch must not be sent: nothing to sell, or a lone
/// quote-against-quote order.
pub fn is_degenerate(orders: &[OrderRequest], rules: &LiquidationRules) -> bool {
    let quote_pair = format!("{0}-{0}", rules.quote_currency);
    match orders {
        [] => true,
        [only] => only.inst_id == quote_pair,
        _ => false,
    }
}
