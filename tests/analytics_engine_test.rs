//! Engine-level properties exercised through the public API.
//!
//! Covers:
//! - Tick-quantized and linear P&L settlement
//! - Zero/neutral defaults for empty and degenerate inputs
//! - Equity curve idempotence and input-order independence
//! - Drawdown and streak bounds
//! - The three-trade end-to-end scenario

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;
use tradebook::domain::{Decimal, Direction, InstrumentSpec, RawTrade, Trade};
use tradebook::engine::{
    Analyzer, EquityCurveBuilder, InstrumentRegistry, PnlCalculator, ProfitFactor,
    StatisticsEngine, TradeQuery,
};

fn d(s: &str) -> Decimal {
    Decimal::from_str_canonical(s).unwrap()
}

fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, n, 14, 0, 0).unwrap()
}

/// A one-unit LONG on an unregistered ticker whose net P&L is `pnl`.
fn linear_result(n: u32, pnl: &str) -> Trade {
    Trade::new("ACME", Direction::Long, d("500"), Some(d("500") + d(pnl)), Decimal::one(), day(n))
}

fn es_registry() -> InstrumentRegistry {
    InstrumentRegistry::new([("ES", InstrumentSpec::new(d("0.25"), d("12.50")))]).unwrap()
}

#[test]
fn test_tick_quantized_long_settles_in_whole_ticks() {
    let registry = es_registry();
    let calc = PnlCalculator::new(&registry);
    let trade = Trade::new("ES", Direction::Long, d("4500.00"), Some(d("4501.00")), d("2"), day(1))
        .with_commissions(d("5"));

    let pnl = calc.compute_pnl(&trade).unwrap();
    assert_eq!(pnl.ticks_moved, Some(d("4")));
    assert_eq!(pnl.gross, d("100"));
    assert_eq!(pnl.net, d("95"));
}

#[test]
fn test_linear_short_on_unknown_ticker() {
    let registry = es_registry();
    let calc = PnlCalculator::new(&registry);
    let trade = Trade::new("XYZ", Direction::Short, d("100"), Some(d("90")), d("3"), day(1))
        .with_commissions(d("2"));

    let pnl = calc.compute_pnl(&trade).unwrap();
    assert_eq!(pnl.gross, d("30"));
    assert_eq!(pnl.net, d("28"));
}

#[test]
fn test_flat_exit_nets_minus_commissions() {
    let registry = es_registry();
    let calc = PnlCalculator::new(&registry);
    for (ticker, commissions) in [("ES", "0"), ("ES", "4.2"), ("MSFT", "0"), ("MSFT", "1")] {
        let trade = Trade::new(ticker, Direction::Short, d("300"), Some(d("300")), d("5"), day(1))
            .with_commissions(d(commissions));
        let net = calc.net_pnl(&trade).unwrap();
        assert_eq!(net, -d(commissions));

        let stats = StatisticsEngine::new(calc).summarize(&[trade], Decimal::zero());
        assert_eq!(stats.break_even_trades == 1, commissions == "0");
    }
}

#[test]
fn test_empty_input_has_neutral_statistics() {
    let registry = InstrumentRegistry::with_defaults();
    let now = day(20);
    let report = Analyzer::new(&registry).analyze(&[], &TradeQuery::all(), d("1000"), now);

    assert_eq!(report.statistics.total_trades, 0);
    assert!(report.statistics.win_rate.is_zero());
    assert_eq!(report.statistics.profit_factor, ProfitFactor::Finite(Decimal::zero()));
    assert_eq!(report.equity_curve.len(), 1);
    assert_eq!(report.equity_curve[0].date, now);
    assert_eq!(report.equity_curve[0].balance, d("1000"));
    assert!(report.issues.is_empty());
}

#[test]
fn test_only_open_trades_counts_as_empty() {
    let registry = InstrumentRegistry::empty();
    let mut open = linear_result(3, "10");
    open.exit_price = None;

    let stats = StatisticsEngine::new(PnlCalculator::new(&registry)).summarize(&[open], d("100"));
    assert_eq!(stats.total_trades, 0);
    assert_eq!(stats.open_trades, 1);
    assert!(stats.win_rate.is_zero());
}

#[test]
fn test_profit_factor_unbounded_without_losers() {
    let registry = InstrumentRegistry::empty();
    let stats = StatisticsEngine::new(PnlCalculator::new(&registry))
        .summarize(&[linear_result(1, "10"), linear_result(2, "0")], Decimal::zero());

    assert!(stats.profit_factor.is_infinite());
    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["profitFactor"], "Infinity");
}

#[test]
fn test_curve_is_idempotent_and_order_independent() {
    let registry = InstrumentRegistry::empty();
    let builder = EquityCurveBuilder::new(PnlCalculator::new(&registry));
    let now = day(30);

    // Three trades share a timestamp and only differ in content.
    let trades = vec![
        linear_result(2, "15"),
        linear_result(1, "-5"),
        linear_result(2, "-7"),
        linear_result(2, "3"),
        linear_result(4, "1"),
    ];
    let first = builder.build_curve_at(&trades, d("250"), now);
    let second = builder.build_curve_at(&trades, d("250"), now);
    assert_eq!(first, second);

    let mut reversed = trades.clone();
    reversed.reverse();
    assert_eq!(builder.build_curve_at(&reversed, d("250"), now), first);

    let mut rotated = trades.clone();
    rotated.rotate_left(2);
    assert_eq!(builder.build_curve_at(&rotated, d("250"), now), first);

    let engine = StatisticsEngine::new(PnlCalculator::new(&registry));
    assert_eq!(
        engine.summarize(&trades, d("250")),
        engine.summarize(&reversed, d("250"))
    );
}

#[test]
fn test_drawdown_bounds() {
    let registry = InstrumentRegistry::empty();
    let engine = StatisticsEngine::new(PnlCalculator::new(&registry));

    let rising: Vec<_> = (1..=5).map(|n| linear_result(n, "10")).collect();
    assert!(engine.summarize(&rising, d("100")).max_drawdown.is_zero());

    let wipeout = vec![linear_result(1, "50"), linear_result(2, "-400")];
    let stats = engine.summarize(&wipeout, d("100"));
    assert_eq!(stats.max_drawdown, d("100"));
    assert_eq!(stats.max_drawdown_amount, d("400"));

    let choppy: Vec<_> = ["20", "-35", "10", "-5", "40", "-60"]
        .iter()
        .enumerate()
        .map(|(i, pnl)| linear_result(i as u32 + 1, pnl))
        .collect();
    let dd = engine.summarize(&choppy, d("100")).max_drawdown;
    assert!(dd >= Decimal::zero() && dd <= Decimal::hundred());
}

#[test]
fn test_break_even_at_most_recent_date_resets_streak() {
    let registry = InstrumentRegistry::empty();
    let engine = StatisticsEngine::new(PnlCalculator::new(&registry));

    let mut trades = vec![linear_result(1, "5"), linear_result(2, "-1"), linear_result(3, "-2")];
    assert_eq!(engine.summarize(&trades, Decimal::zero()).current_streak, -2);

    let mut flat = linear_result(3, "0");
    flat.trade_date = day(3) + Duration::hours(1);
    trades.push(flat);
    assert_eq!(engine.summarize(&trades, Decimal::zero()).current_streak, 0);
}

#[test]
fn test_three_trade_end_to_end() {
    let records: Vec<RawTrade> = [
        ("2024-05-01", "1050"),
        ("2024-05-02", "980"),
        ("2024-05-03", "1030"),
    ]
    .iter()
    .map(|(date, exit)| {
        serde_json::from_value(json!({
            "ticker": "acme",
            "direction": "LONG",
            "entryPrice": "1000",
            "exitPrice": exit,
            "quantity": 1,
            "tradeDate": date,
        }))
        .unwrap()
    })
    .rev()
    .collect();

    let registry = InstrumentRegistry::with_defaults();
    let report = Analyzer::new(&registry).analyze(&records, &TradeQuery::all(), d("1000"), day(10));

    let balances: Vec<_> = report.equity_curve.iter().map(|p| p.balance).collect();
    assert_eq!(balances, vec![d("1050"), d("1030"), d("1060")]);

    let stats = report.rounded().statistics;
    assert_eq!(stats.total_trades, 3);
    assert_eq!(stats.win_rate, d("0.6667"));
    assert_eq!(stats.profit_factor, ProfitFactor::Finite(d("4")));
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.total_profit_loss, d("60"));
    assert_eq!(stats.max_drawdown, d("1.90"));
}

#[test]
fn test_bad_record_does_not_abort_aggregation() {
    let records: Vec<RawTrade> = serde_json::from_value(json!([
        {
            "ticker": "ES", "direction": "SHORT", "entry_price": 4500, "exit_price": 4499.5,
            "quantity": 1, "trade_date": "2024-05-02"
        },
        {
            "ticker": "ES", "direction": "SHORT", "entry_price": "n/a", "quantity": 1,
            "trade_date": "2024-05-02"
        },
        {
            "ticker": "ES", "direction": "SHORT", "entry_price": 4500, "exit_price": 4501,
            "quantity": -1, "trade_date": "2024-05-02"
        },
        {
            "ticker": "ES", "direction": "SHORT", "entry_price": 4500, "exit_price": 4501,
            "quantity": 1
        },
    ]))
    .unwrap();

    let registry = InstrumentRegistry::with_defaults();
    let report =
        Analyzer::new(&registry).analyze(&records, &TradeQuery::all(), Decimal::zero(), day(10));

    assert_eq!(report.statistics.total_trades, 1);
    assert_eq!(report.statistics.total_profit_loss, d("25"));
    let codes: Vec<_> = report.issues.iter().map(|i| (i.index, i.kind.code())).collect();
    assert_eq!(
        codes,
        vec![(1, "invalid_number"), (2, "non_positive_quantity"), (3, "missing_field")]
    );
}
