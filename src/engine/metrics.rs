//! Per-trade derived metrics: return on notional, holding period,
//! risk/reward against the stop, and max favorable/adverse excursion.

use crate::domain::{Decimal, Direction, Trade};
use serde::Serialize;

use super::pnl::{favorable_movement, PnlCalculator, RealizedPnl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetrics {
    pub pnl: RealizedPnl,
    /// Net P&L as a percentage of `entry_price * quantity`.
    pub profit_loss_percent: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holding_period_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_reward_ratio: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_multiple: Option<Decimal>,
    /// Maximum favorable excursion, in currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfe: Option<Decimal>,
    /// Maximum adverse excursion, in currency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mae: Option<Decimal>,
}

impl TradeMetrics {
    /// Copy rounded for display; ratios keep `dp + 2` places.
    pub fn rounded(&self, dp: u32) -> Self {
        let money = |v: Option<Decimal>| v.map(|v| v.round_dp(dp));
        let ratio = |v: Option<Decimal>| v.map(|v| v.round_dp(dp + 2));
        Self {
            pnl: self.pnl.rounded(dp),
            profit_loss_percent: self.profit_loss_percent.round_dp(dp),
            holding_period_minutes: self.holding_period_minutes,
            risk_reward_ratio: ratio(self.risk_reward_ratio),
            r_multiple: ratio(self.r_multiple),
            mfe: money(self.mfe),
            mae: money(self.mae),
        }
    }
}

/// Metrics for a closed trade; `None` while the trade is open.
pub fn compute_metrics(calculator: &PnlCalculator<'_>, trade: &Trade) -> Option<TradeMetrics> {
    let pnl = calculator.compute_pnl(trade)?;
    let pricing = calculator.registry().pricing(&trade.ticker);

    let profit_loss_percent = trade
        .entry_price
        .checked_mul(trade.quantity)
        .and_then(|notional| pnl.net.checked_div(notional))
        .and_then(|r| r.checked_mul(Decimal::hundred()))
        .unwrap_or_default();

    let holding_period_minutes = match (trade.entry_time, trade.exit_time) {
        (Some(entry), Some(exit)) => Some((exit - entry).num_minutes()),
        _ => None,
    };

    // Per-unit distance from entry to the stop, on the losing side.
    let risk = trade
        .stop_loss
        .filter(|stop| stop.is_positive())
        .and_then(|stop| favorable_movement(trade.direction, trade.entry_price, stop))
        .map(|movement| -movement)
        .filter(|risk| risk.is_positive());
    let r_multiple = risk.and_then(|risk| pnl.price_movement.checked_div(risk));

    let (best, worst) = match trade.direction {
        Direction::Long => (trade.highest_price, trade.lowest_price),
        Direction::Short => (trade.lowest_price, trade.highest_price),
    };
    let excursion = |extreme: Decimal| {
        favorable_movement(trade.direction, trade.entry_price, extreme)
            .and_then(|movement| pricing.value_movement(movement, trade.quantity))
    };
    let mfe = best.and_then(|px| excursion(px)).map(|v| v.max(Decimal::zero()));
    let mae = worst.and_then(|px| excursion(px)).map(|v| (-v).max(Decimal::zero()));

    Some(TradeMetrics {
        pnl,
        profit_loss_percent,
        holding_period_minutes,
        risk_reward_ratio: r_multiple.map(|r| r.abs()),
        r_multiple,
        mfe,
        mae,
    })
}
