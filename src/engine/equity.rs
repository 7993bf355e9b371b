use crate::domain::{sort_trades_chronological, Decimal, Trade};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::PnlCalculator;

/// Account balance after one closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityPoint {
    pub date: DateTime<Utc>,
    pub balance: Decimal,
}

/// Largest peak-to-trough decline along an equity curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawdown {
    /// Percentage of the peak, within `[0, 100]`.
    pub max_pct: Decimal,
    /// Currency amount of the deepest decline.
    pub max_amount: Decimal,
}

/// Rebuilds a running account balance from closed trades.
#[derive(Debug, Clone, Copy)]
pub struct EquityCurveBuilder<'a> {
    calculator: PnlCalculator<'a>,
}

impl<'a> EquityCurveBuilder<'a> {
    pub fn new(calculator: PnlCalculator<'a>) -> Self {
        Self { calculator }
    }

    /// Equity curve anchored at the current time for the empty case.
    pub fn build_curve(&self, trades: &[Trade], starting_balance: Decimal) -> Vec<EquityPoint> {
        self.build_curve_at(trades, starting_balance, Utc::now())
    }

    /// One point per closed trade in chronological order.
    ///
    /// The starting balance is the implicit point before the first trade.
    /// With no closed trades the curve is the single point
    /// `{ now, starting_balance }`, never empty.
    pub fn build_curve_at(
        &self,
        trades: &[Trade],
        starting_balance: Decimal,
        now: DateTime<Utc>,
    ) -> Vec<EquityPoint> {
        let mut balance = starting_balance;
        let mut curve: Vec<EquityPoint> = sort_trades_chronological(trades)
            .into_iter()
            .filter_map(|trade| {
                let net = self.calculator.net_pnl(trade)?;
                balance += net;
                Some(EquityPoint {
                    date: trade.trade_date,
                    balance,
                })
            })
            .collect();

        if curve.is_empty() {
            curve.push(EquityPoint {
                date: now,
                balance: starting_balance,
            });
        }
        curve
    }
}

/// Maximum drawdown of `curve`, with `starting_balance` as the first peak.
///
/// Percentages are only measured from positive peaks and are capped at
/// 100% when the balance falls below zero.
pub fn max_drawdown(starting_balance: Decimal, curve: &[EquityPoint]) -> Drawdown {
    let mut peak = starting_balance;
    let mut result = Drawdown::default();

    for point in curve {
        if point.balance > peak {
            peak = point.balance;
            continue;
        }

        let decline = peak - point.balance;
        if decline > result.max_amount {
            result.max_amount = decline;
        }

        if peak.is_positive() {
            let pct = decline
                .checked_div(peak)
                .and_then(|ratio| ratio.checked_mul(Decimal::hundred()))
                // peak is positive, so a failed quotient is a huge one
                .unwrap_or_else(Decimal::hundred)
                .min(Decimal::hundred());
            if pct > result.max_pct {
                result.max_pct = pct;
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use crate::engine::InstrumentRegistry;
    use chrono::TimeZone;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn closed(day: u32, entry: &str, exit: &str) -> Trade {
        Trade::new(
            "AAPL",
            Direction::Long,
            d(entry),
            Some(d(exit)),
            Decimal::one(),
            Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        )
    }

    fn point(balance: &str) -> EquityPoint {
        EquityPoint {
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            balance: d(balance),
        }
    }

    #[test]
    fn test_curve_orders_by_date_and_skips_open_trades() {
        let registry = InstrumentRegistry::empty();
        let builder = EquityCurveBuilder::new(PnlCalculator::new(&registry));

        let mut open = closed(2, "10", "10");
        open.exit_price = None;
        let trades = vec![
            closed(3, "100", "130"),
            open,
            closed(1, "100", "150"),
            closed(2, "100", "80"),
        ];

        let curve = builder.build_curve(&trades, d("1000"));
        let balances: Vec<_> = curve.iter().map(|p| p.balance).collect();
        assert_eq!(balances, vec![d("1050"), d("1030"), d("1060")]);
        assert!(curve.windows(2).all(|w| w[0].date <= w[1].date));
    }

    #[test]
    fn test_empty_curve_has_single_starting_point() {
        let registry = InstrumentRegistry::empty();
        let builder = EquityCurveBuilder::new(PnlCalculator::new(&registry));
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let curve = builder.build_curve_at(&[], d("2500"), now);
        assert_eq!(curve, vec![EquityPoint { date: now, balance: d("2500") }]);
    }

    #[test]
    fn test_drawdown_from_running_peak() {
        let dd = max_drawdown(d("1000"), &[point("1050"), point("1030"), point("1060")]);
        assert_eq!(dd.max_amount, d("20"));
        assert_eq!(dd.max_pct.round_dp(4), d("1.9048"));
    }

    #[test]
    fn test_starting_balance_is_first_peak() {
        let dd = max_drawdown(d("1000"), &[point("900"), point("950")]);
        assert_eq!(dd.max_pct, d("10"));
        assert_eq!(dd.max_amount, d("100"));
    }

    #[test]
    fn test_monotonic_curve_has_no_drawdown() {
        let dd = max_drawdown(d("100"), &[point("110"), point("120"), point("120"), point("200")]);
        assert_eq!(dd, Drawdown::default());
    }

    #[test]
    fn test_drawdown_is_capped_at_full_loss() {
        let dd = max_drawdown(d("100"), &[point("-50")]);
        assert_eq!(dd.max_pct, d("100"));
        assert_eq!(dd.max_amount, d("150"));
    }

    #[test]
    fn test_non_positive_peak_has_no_percentage() {
        let dd = max_drawdown(Decimal::zero(), &[point("-10"), point("-30")]);
        assert!(dd.max_pct.is_zero());
        assert_eq!(dd.max_amount, d("30"));
    }

    #[test]
    fn test_tiny_peak_large_decline_caps_without_overflow() {
        let dd = max_drawdown(
            d("0.0000000000000000000000000001"),
            &[point("-1000000000000000000")],
        );
        assert_eq!(dd.max_pct, d("100"));
    }
}
