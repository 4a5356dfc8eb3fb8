//! Constant-product price impact model.
//!
//! Estimates the slippage a standard-size trade would cause against a
//! pool's reserves, using the AMM invariant `base * quote = k`. The model
//! covers a base-token purchase funded by the standard USD size only;
//! sell-side impact is intentionally not modeled.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Default reference trade size: $10,000.
pub const STANDARD_TRADE_USD: Decimal = dec!(10000);

/// Estimate the price impact of buying base tokens worth `trade_usd`
/// against the given reserves.
///
/// Returns `None` — the "infinite impact" sentinel — when any precondition
/// is violated (non-positive price, reserves, or trade size) or the
/// arithmetic overflows, so callers can gate uniformly instead of
/// special-casing errors. A `None` pool never passes a price-impact gate.
pub fn price_impact(
    price: Decimal,
    base_reserves: Decimal,
    quote_reserves: Decimal,
    trade_usd: Decimal,
) -> Option<Decimal> {
    if price <= Decimal::ZERO
        || base_reserves <= Decimal::ZERO
        || quote_reserves <= Decimal::ZERO
        || trade_usd <= Decimal::ZERO
    {
        return None;
    }

    let base_amount = trade_usd.checked_div(price)?;

    // Constant product: x * y = k
    let k = base_reserves.checked_mul(quote_reserves)?;
    let new_base = base_reserves.checked_add(base_amount)?;
    let new_quote = k.checked_div(new_base)?;

    let price_after = new_quote.checked_div(new_base)?;
    let impact = (price_after - price).abs().checked_div(price)?;

    Some(impact)
}

/// Impact of the standard $10,000 reference trade.
pub fn standard_price_impact(
    price: Decimal,
    base_reserves: Decimal,
    quote_reserves: Decimal,
) -> Option<Decimal> {
    price_impact(price, base_reserves, quote_reserves, STANDARD_TRADE_USD)
}
