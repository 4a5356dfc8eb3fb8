//! Property-Based Tests — Domain Layer Invariants
//!
//! Uses `proptest` to verify that domain components maintain
//! mathematical invariants across random inputs.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use solana_dex_bot::domain::impact::{price_impact, standard_price_impact};
use solana_dex_bot::domain::pair::TokenPair;
use solana_dex_bot::domain::sizing::{PositionSizer, SizingParams};
use solana_dex_bot::domain::{GateLimits, LiquidityGate};

// ── Price Impact Properties ─────────────────────────────────

proptest! {
    /// Impact is defined and non-negative for any positive pool state.
    #[test]
    fn impact_defined_and_non_negative(
        price in 1u32..100_000,
        reserves in 1_000u64..1_000_000_000,
        trade in 1u32..1_000_000,
    ) {
        let impact = price_impact(
            Decimal::from(price),
            Decimal::from(reserves),
            Decimal::from(reserves),
            Decimal::from(trade),
        );
        let impact = impact.expect("positive inputs must produce an impact");
        prop_assert!(impact >= Decimal::ZERO, "impact must be >= 0, got {impact}");
    }

    /// Deeper reserves never increase the impact of the same trade.
    #[test]
    fn impact_shrinks_with_depth(
        reserves in 10_000u64..100_000_000,
        trade in 1u32..100_000,
    ) {
        let shallow = price_impact(
            Decimal::ONE,
            Decimal::from(reserves),
            Decimal::from(reserves),
            Decimal::from(trade),
        ).unwrap();
        let deep = price_impact(
            Decimal::ONE,
            Decimal::from(reserves * 10),
            Decimal::from(reserves * 10),
            Decimal::from(trade),
        ).unwrap();
        prop_assert!(
            deep <= shallow,
            "deeper pool must not raise impact: {deep} > {shallow}"
        );
    }

    /// Non-positive pool state always yields the undefined sentinel.
    #[test]
    fn impact_undefined_without_reserves(
        price in 1u32..100_000,
        trade in 1u32..1_000_000,
    ) {
        prop_assert!(price_impact(
            Decimal::from(price),
            Decimal::ZERO,
            Decimal::from(1_000_000u64),
            Decimal::from(trade),
        ).is_none());
        prop_assert!(price_impact(
            Decimal::from(price),
            Decimal::from(1_000_000u64),
            Decimal::ZERO,
            Decimal::from(trade),
        ).is_none());
        prop_assert!(standard_price_impact(
            Decimal::ZERO,
            Decimal::from(1_000_000u64),
            Decimal::from(1_000_000u64),
        ).is_none());
    }
}

// ── Liquidity Gate Properties ───────────────────────────────

proptest! {
    /// The undefined-impact sentinel never passes the impact gate,
    /// whatever the configured limit.
    #[test]
    fn undefined_impact_never_passes(limit_bps in 1u32..10_000) {
        let gate = LiquidityGate::new(GateLimits {
            max_price_impact: Decimal::from(limit_bps) / dec!(10000),
            ..GateLimits::default()
        });
        prop_assert!(gate.check_price_impact(None).is_err());
    }

    /// An impact at or below the limit always passes; above never does.
    #[test]
    fn impact_gate_is_a_threshold(
        observed_bps in 0u32..10_000,
        limit_bps in 1u32..10_000,
    ) {
        let gate = LiquidityGate::new(GateLimits {
            max_price_impact: Decimal::from(limit_bps) / dec!(10000),
            ..GateLimits::default()
        });
        let observed = Decimal::from(observed_bps) / dec!(10000);
        let result = gate.check_price_impact(Some(observed));
        prop_assert_eq!(result.is_ok(), observed_bps <= limit_bps);
    }
}

// ── Position Sizing Properties ──────────────────────────────

proptest! {
    /// The sized trade never exceeds the configured cap, whatever the
    /// risk factor and leverage.
    #[test]
    fn size_never_exceeds_cap(
        base in 1u32..1_000_000,
        risk_pct in 1u32..100,
        leverage in 1u32..5,
    ) {
        let params = SizingParams {
            base_size: Decimal::from(base),
            ..SizingParams::default()
        };
        let sizer = PositionSizer::new(params, dec!(100000), dec!(5));
        let sized = sizer.size(
            "SOL/USDC",
            dec!(25),
            Decimal::from(risk_pct) / dec!(100),
            Decimal::from(leverage),
        ).unwrap();
        let cap = dec!(100000) * dec!(0.2);
        prop_assert!(sized.total_size <= cap, "size {} above cap {cap}", sized.total_size);
        prop_assert!(sized.total_size > Decimal::ZERO);
    }

    /// Staged entries partition exactly the configured fractions of the
    /// total size.
    #[test]
    fn staged_entries_split_the_total(base in 100u32..10_000) {
        let params = SizingParams {
            base_size: Decimal::from(base),
            staged_entry: true,
            risk_based_sizing: false,
            volatility_adjustment: false,
            ..SizingParams::default()
        };
        let sizer = PositionSizer::new(params.clone(), dec!(100000), dec!(5));
        let sized = sizer.size("SOL/USDC", dec!(25), dec!(1), dec!(1)).unwrap();
        let stages = sized.stages.unwrap();
        for (stage, pct) in stages.iter().zip(&params.entry_stages) {
            prop_assert_eq!(stage.size, sized.total_size * *pct);
        }
    }
}

// ── Token Pair Properties ───────────────────────────────────

proptest! {
    /// Parsing then displaying a well-formed pair is lossless.
    #[test]
    fn pair_roundtrips(
        base in "[A-Z]{2,6}",
        quote in "[A-Z]{2,6}",
    ) {
        let symbol = format!("{base}/{quote}");
        let pair: TokenPair = symbol.parse().unwrap();
        prop_assert_eq!(pair.to_string(), symbol);
    }

    /// Anything without exactly one separator fails to parse.
    #[test]
    fn pair_rejects_missing_separator(token in "[A-Z]{1,12}") {
        prop_assert!(token.parse::<TokenPair>().is_err());
    }
}
