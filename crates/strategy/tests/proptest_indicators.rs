use proptest::collection::vec;
use proptest::prelude::*;

use common::SignalKind;
use strategy::indicators::{bollinger, ema, macd, rsi};
use strategy::{FeeSchedule, ResultBuilder};

proptest! {
    /// RSI stays inside [0, 100] for any positive price series and period.
    #[test]
    fn rsi_is_bounded(
        prices in vec(0.01f64..1_000_000.0f64, 0..200),
        period in 1usize..30,
    ) {
        let value = rsi(&prices, period);
        prop_assert!((0.0..=100.0).contains(&value), "RSI out of range: {value}");
    }

    /// Upper >= middle >= lower always holds since stddev >= 0.
    #[test]
    fn bollinger_bands_are_ordered(
        prices in vec(0.01f64..1_000_000.0f64, 1..200),
        period in 1usize..50,
        k in 0.5f64..4.0f64,
    ) {
        let bands = bollinger(&prices, period, k);
        prop_assert!(bands.upper >= bands.middle);
        prop_assert!(bands.middle >= bands.lower);
    }

    /// The histogram is exactly the MACD line minus the signal line.
    #[test]
    fn macd_histogram_identity(prices in vec(0.01f64..10_000.0f64, 30..150)) {
        let m = macd(&prices, 12, 26, 9);
        prop_assert_eq!(m.histogram, m.macd - m.signal);
    }

    /// EMA with period 1 reproduces the latest value of any sequence.
    #[test]
    fn ema_period_one_is_identity(prices in vec(0.01f64..1_000_000.0f64, 1..100)) {
        let last = *prices.last().unwrap();
        prop_assert!((ema(&prices, 1) - last).abs() <= last.abs() * 1e-12);
    }

    /// Builder projections never go negative and confidence stays clamped.
    #[test]
    fn builder_floors_projections(
        entry in 1.0f64..10_000.0f64,
        risk in 0.01f64..100.0f64,
        reward in 0.0f64..200.0f64,
        amount in 0.0f64..1_000_000.0f64,
        confidence in -50.0f64..200.0f64,
    ) {
        let result = ResultBuilder::new("prop")
            .signal(SignalKind::Buy)
            .confidence(confidence)
            .levels(entry, entry - risk, entry + reward)
            .amount(amount)
            .fee_schedule(FeeSchedule::default())
            .build()
            .unwrap();
        prop_assert!(result.potential_profit >= 0.0);
        prop_assert!(result.potential_loss >= 0.0);
        prop_assert!((0.0..=100.0).contains(&result.confidence));
        prop_assert!(result.risk_reward.starts_with("1:"));
    }
}
