use crate::domain::{Decimal, Direction, Trade, TradeIssueKind};
use serde::Serialize;

use super::InstrumentRegistry;

/// Realized profit/loss of one closed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealizedPnl {
    /// Per-unit price movement in the trade's favor.
    pub price_movement: Decimal,
    /// Whole ticks moved (quantized instruments only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticks_moved: Option<Decimal>,
    pub gross: Decimal,
    pub commissions: Decimal,
    /// `gross - commissions`.
    pub net: Decimal,
}

impl RealizedPnl {
    pub fn outcome(&self) -> Outcome {
        Outcome::of(self.net)
    }

    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            price_movement: self.price_movement,
            ticks_moved: self.ticks_moved,
            gross: self.gross.round_dp(dp),
            commissions: self.commissions.round_dp(dp),
            net: self.net.round_dp(dp),
        }
    }
}

/// Classification of a realized result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Win,
    Loss,
    BreakEven,
}

impl Outcome {
    pub fn of(pnl: Decimal) -> Self {
        if pnl.is_positive() {
            Outcome::Win
        } else if pnl.is_negative() {
            Outcome::Loss
        } else {
            Outcome::BreakEven
        }
    }
}

/// Computes realized P&L per trade using the registry's tick semantics.
#[derive(Debug, Clone, Copy)]
pub struct PnlCalculator<'a> {
    registry: &'a InstrumentRegistry,
}

impl<'a> PnlCalculator<'a> {
    pub fn new(registry: &'a InstrumentRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a InstrumentRegistry {
        self.registry
    }

    /// Realized P&L of `trade`, or `None` while the trade is still open.
    ///
    /// A trade whose P&L is out of range also yields `None`; use
    /// [`PnlCalculator::checked_pnl`] to tell the two apart.
    pub fn compute_pnl(&self, trade: &Trade) -> Option<RealizedPnl> {
        self.checked_pnl(trade).ok().flatten()
    }

    /// Realized P&L with overflow reported instead of panicking.
    ///
    /// Gross, commissions and net must each stay within
    /// [`Decimal::within_amount_limit`] so any number of them can be summed.
    pub fn checked_pnl(&self, trade: &Trade) -> Result<Option<RealizedPnl>, TradeIssueKind> {
        let Some(exit_price) = trade.exit_price else {
            return Ok(None);
        };
        let out_of_range = || TradeIssueKind::OutOfRange("pnl");
        let pricing = self.registry.pricing(&trade.ticker);

        let price_movement = favorable_movement(trade.direction, trade.entry_price, exit_price)
            .ok_or_else(out_of_range)?;
        let gross = pricing
            .value_movement(price_movement, trade.quantity)
            .filter(Decimal::within_amount_limit)
            .ok_or_else(out_of_range)?;
        if !trade.commissions.within_amount_limit() {
            return Err(TradeIssueKind::OutOfRange("commissions"));
        }
        let net = gross
            .checked_sub(trade.commissions)
            .filter(Decimal::within_amount_limit)
            .ok_or_else(out_of_range)?;

        Ok(Some(RealizedPnl {
            price_movement,
            ticks_moved: pricing.ticks(price_movement),
            gross,
            commissions: trade.commissions,
            net,
        }))
    }

    /// Net P&L only; `None` for open trades.
    pub fn net_pnl(&self, trade: &Trade) -> Option<Decimal> {
        self.compute_pnl(trade).map(|pnl| pnl.net)
    }
}

/// Signed per-unit movement from `from` to `to` in the direction's favor.
pub(crate) fn favorable_movement(
    direction: Direction,
    from: Decimal,
    to: Decimal,
) -> Option<Decimal> {
    match direction {
        Direction::Long => to.checked_sub(from),
        Direction::Short => from.checked_sub(to),
    }
}
