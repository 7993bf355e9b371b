//! End-to-end analysis over raw journal records.
//!
//! Every entry point validates first: malformed records are set aside as
//! [`TradeIssue`]s and the remaining trades are still analyzed.

use crate::domain::{Decimal, RawTrade, Trade, TradeIssue};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::breakdown::{BreakdownBuilder, PerformanceBreakdown};
use super::equity::{EquityCurveBuilder, EquityPoint};
use super::filter::{filter_trades, TradeQuery};
use super::metrics::{compute_metrics, TradeMetrics};
use super::pnl::PnlCalculator;
use super::stats::{StatisticsEngine, StatisticsSnapshot};
use super::InstrumentRegistry;

/// Decimal places used for presentation rounding.
pub const DISPLAY_DP: u32 = 2;

/// Statistics and equity curve for a filtered trade set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub statistics: StatisticsSnapshot,
    pub equity_curve: Vec<EquityPoint>,
    pub issues: Vec<TradeIssue>,
}

impl AnalyticsReport {
    /// Copy rounded to [`DISPLAY_DP`] for output.
    pub fn rounded(&self) -> Self {
        Self {
            statistics: self.statistics.rounded(DISPLAY_DP),
            equity_curve: self
                .equity_curve
                .iter()
                .map(|p| EquityPoint {
                    date: p.date,
                    balance: p.balance.round_dp(DISPLAY_DP),
                })
                .collect(),
            issues: self.issues.clone(),
        }
    }
}

/// One validated trade with its realized figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeReport {
    /// Position of the record in the caller's input.
    pub index: usize,
    pub trade_key: String,
    pub trade: Trade,
    /// `None` while the trade is open.
    pub metrics: Option<TradeMetrics>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradesReport {
    pub trades: Vec<TradeReport>,
    pub issues: Vec<TradeIssue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownReport {
    pub breakdown: PerformanceBreakdown,
    pub issues: Vec<TradeIssue>,
}

/// Validated records paired with their input positions.
#[derive(Debug, Clone, Default)]
pub struct Validated {
    pub trades: Vec<(usize, Trade)>,
    pub issues: Vec<TradeIssue>,
}

impl Validated {
    pub fn into_trades(self) -> (Vec<Trade>, Vec<TradeIssue>) {
        let trades = self.trades.into_iter().map(|(_, trade)| trade).collect();
        (trades, self.issues)
    }
}

/// Split raw records into usable trades and issues.
pub fn validate_all(raw: &[RawTrade]) -> Validated {
    let mut validated = Validated::default();
    for (index, record) in raw.iter().enumerate() {
        match Trade::from_raw(index, record) {
            Ok(trade) => validated.trades.push((index, trade)),
            Err(issue) => {
                tracing::debug!(index, error = %issue.kind, "rejected trade record");
                validated.issues.push(issue);
            }
        }
    }
    if !validated.issues.is_empty() {
        tracing::warn!(
            rejected = validated.issues.len(),
            accepted = validated.trades.len(),
            "some trade records were rejected"
        );
    }
    validated
}

/// Runs validation, filtering and aggregation against one instrument table.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'a> {
    calculator: PnlCalculator<'a>,
}

impl<'a> Analyzer<'a> {
    pub fn new(registry: &'a InstrumentRegistry) -> Self {
        Self {
            calculator: PnlCalculator::new(registry),
        }
    }

    /// [`validate_all`], then set aside trades whose P&L cannot be
    /// represented so they are reported instead of counted.
    pub fn validate(&self, raw: &[RawTrade]) -> Validated {
        let Validated { trades, mut issues } = validate_all(raw);
        let mut accepted = Vec::with_capacity(trades.len());
        for (index, trade) in trades {
            match self.calculator.checked_pnl(&trade) {
                Ok(_) => accepted.push((index, trade)),
                Err(kind) => {
                    tracing::warn!(index, error = %kind, "rejected trade record");
                    issues.push(TradeIssue::new(index, trade.id, kind));
                }
            }
        }
        issues.sort_by_key(|issue| issue.index);
        Validated {
            trades: accepted,
            issues,
        }
    }

    /// Statistics and equity curve for the records selected by `query`.
    ///
    /// Values are unrounded; call [`AnalyticsReport::rounded`] for display.
    pub fn analyze(
        &self,
        raw: &[RawTrade],
        query: &TradeQuery,
        starting_balance: Decimal,
        now: DateTime<Utc>,
    ) -> AnalyticsReport {
        let (trades, issues) = self.validate(raw).into_trades();
        self.analyze_trades(&trades, query, starting_balance, now, issues)
    }

    /// Same as [`Analyzer::analyze`] for trades from [`Analyzer::validate`].
    ///
    /// A trade that skipped that step and has out-of-range P&L is counted
    /// as open.
    pub fn analyze_trades(
        &self,
        trades: &[Trade],
        query: &TradeQuery,
        starting_balance: Decimal,
        now: DateTime<Utc>,
        issues: Vec<TradeIssue>,
    ) -> AnalyticsReport {
        let selected = filter_trades(trades, query, now);
        tracing::debug!(
            input = trades.len(),
            selected = selected.len(),
            "applied trade query"
        );

        let equity_curve = EquityCurveBuilder::new(self.calculator).build_curve_at(
            &selected,
            starting_balance,
            now,
        );
        let statistics = StatisticsEngine::new(self.calculator).summarize_with_curve(
            &selected,
            starting_balance,
            &equity_curve,
        );

        AnalyticsReport {
            statistics,
            equity_curve,
            issues,
        }
    }

    /// Per-trade P&L and metrics, in input order.
    pub fn trade_reports(&self, raw: &[RawTrade]) -> TradesReport {
        let validated = self.validate(raw);
        let trades = validated
            .trades
            .into_iter()
            .map(|(index, trade)| TradeReport {
                index,
                trade_key: trade.trade_key(),
                metrics: compute_metrics(&self.calculator, &trade),
                trade,
            })
            .collect();
        TradesReport {
            trades,
            issues: validated.issues,
        }
    }

    /// Tag and time-of-week breakdowns for the records selected by `query`.
    pub fn breakdown(
        &self,
        raw: &[RawTrade],
        query: &TradeQuery,
        now: DateTime<Utc>,
    ) -> BreakdownReport {
        let (trades, issues) = self.validate(raw).into_trades();
        let selected = filter_trades(&trades, query, now);
        BreakdownReport {
            breakdown: BreakdownBuilder::new(self.calculator).build(&selected),
            issues,
        }
    }
}
