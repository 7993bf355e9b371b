use crate::domain::{sort_trades_chronological, Decimal, Trade};
use serde::{Serialize, Serializer};

use super::equity::{max_drawdown, EquityCurveBuilder, EquityPoint};
use super::pnl::{Outcome, PnlCalculator};

/// Gross profit over absolute gross loss.
///
/// With winners and no losers the ratio is unbounded; that case is kept
/// explicit instead of leaking a NaN or infinity float to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfitFactor {
    Finite(Decimal),
    Infinite,
}

impl ProfitFactor {
    pub fn from_sums(gross_profit: Decimal, gross_loss: Decimal) -> Self {
        let loss = gross_loss.abs();
        if loss.is_zero() {
            if gross_profit.is_positive() {
                ProfitFactor::Infinite
            } else {
                ProfitFactor::Finite(Decimal::zero())
            }
        } else {
            // a quotient past the decimal range is as good as unbounded
            gross_profit
                .checked_div(loss)
                .map(ProfitFactor::Finite)
                .unwrap_or(ProfitFactor::Infinite)
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, ProfitFactor::Infinite)
    }

    pub fn finite(&self) -> Option<Decimal> {
        match self {
            ProfitFactor::Finite(value) => Some(*value),
            ProfitFactor::Infinite => None,
        }
    }

    pub(crate) fn round_dp(self, dp: u32) -> Self {
        match self {
            ProfitFactor::Finite(value) => ProfitFactor::Finite(value.round_dp(dp)),
            ProfitFactor::Infinite => ProfitFactor::Infinite,
        }
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Finite(Decimal::zero())
    }
}

/// Finite values serialize as JSON numbers, the unbounded case as the
/// string `"Infinity"`.
impl Serialize for ProfitFactor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitFactor::Finite(value) => value.serialize(serializer),
            ProfitFactor::Infinite => serializer.serialize_str("Infinity"),
        }
    }
}

/// Aggregate performance over the closed trades of a set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSnapshot {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub break_even_trades: usize,
    /// Trades without an exit price; excluded from everything else.
    pub open_trades: usize,
    /// Fraction in `[0, 1]`.
    pub win_rate: Decimal,
    pub profit_factor: ProfitFactor,
    pub total_profit_loss: Decimal,
    pub gross_profit: Decimal,
    /// Absolute value of the summed losers.
    pub gross_loss: Decimal,
    pub total_commissions: Decimal,
    pub average_profit_loss: Decimal,
    pub average_winner: Decimal,
    /// Mean of the losers; zero or negative.
    pub average_loser: Decimal,
    pub largest_winner: Decimal,
    pub largest_loser: Decimal,
    /// Positive run of wins or negative run of losses ending at the most
    /// recent closed trade; 0 after a break-even.
    pub current_streak: i64,
    pub longest_win_streak: usize,
    pub longest_loss_streak: usize,
    /// Percent of peak, in `[0, 100]`.
    pub max_drawdown: Decimal,
    pub max_drawdown_amount: Decimal,
}

impl StatisticsSnapshot {
    /// Copy with every money/ratio field rounded for display.
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            win_rate: self.win_rate.round_dp(dp + 2),
            profit_factor: self.profit_factor.round_dp(dp),
            total_profit_loss: self.total_profit_loss.round_dp(dp),
            gross_profit: self.gross_profit.round_dp(dp),
            gross_loss: self.gross_loss.round_dp(dp),
            total_commissions: self.total_commissions.round_dp(dp),
            average_profit_loss: self.average_profit_loss.round_dp(dp),
            average_winner: self.average_winner.round_dp(dp),
            average_loser: self.average_loser.round_dp(dp),
            largest_winner: self.largest_winner.round_dp(dp),
            largest_loser: self.largest_loser.round_dp(dp),
            max_drawdown: self.max_drawdown.round_dp(dp),
            max_drawdown_amount: self.max_drawdown_amount.round_dp(dp),
            ..self.clone()
        }
    }
}

/// Folds per-trade P&L into a [`StatisticsSnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct StatisticsEngine<'a> {
    calculator: PnlCalculator<'a>,
}

impl<'a> StatisticsEngine<'a> {
    pub fn new(calculator: PnlCalculator<'a>) -> Self {
        Self { calculator }
    }

    /// Summarize `trades`, deriving drawdown from their equity curve.
    pub fn summarize(&self, trades: &[Trade], starting_balance: Decimal) -> StatisticsSnapshot {
        let curve = EquityCurveBuilder::new(self.calculator).build_curve(trades, starting_balance);
        self.summarize_with_curve(trades, starting_balance, &curve)
    }

    /// Summarize `trades` using an equity curve the caller already built
    /// from the same trades and starting balance.
    pub fn summarize_with_curve(
        &self,
        trades: &[Trade],
        starting_balance: Decimal,
        curve: &[EquityPoint],
    ) -> StatisticsSnapshot {
        let mut stats = StatisticsSnapshot::default();

        // Oldest first, open trades dropped.
        let realized: Vec<Decimal> = sort_trades_chronological(trades)
            .into_iter()
            .filter_map(|trade| match self.calculator.compute_pnl(trade) {
                Some(pnl) => {
                    stats.total_commissions += pnl.commissions;
                    Some(pnl.net)
                }
                None => {
                    stats.open_trades += 1;
                    None
                }
            })
            .collect();

        stats.total_trades = realized.len();
        if realized.is_empty() {
            tracing::debug!(open = stats.open_trades, "no closed trades to summarize");
            return stats;
        }

        for &pnl in &realized {
            stats.total_profit_loss += pnl;
            match Outcome::of(pnl) {
                Outcome::Win => {
                    stats.winning_trades += 1;
                    stats.gross_profit += pnl;
                    stats.largest_winner = stats.largest_winner.max(pnl);
                }
                Outcome::Loss => {
                    stats.losing_trades += 1;
                    stats.gross_loss += pnl.abs();
                    stats.largest_loser = stats.largest_loser.min(pnl);
                }
                Outcome::BreakEven => stats.break_even_trades += 1,
            }
        }

        stats.win_rate = ratio(stats.winning_trades, stats.total_trades);
        stats.profit_factor = ProfitFactor::from_sums(stats.gross_profit, stats.gross_loss);
        stats.average_profit_loss = mean(stats.total_profit_loss, stats.total_trades);
        stats.average_winner = mean(stats.gross_profit, stats.winning_trades);
        stats.average_loser = -mean(stats.gross_loss, stats.losing_trades);

        let streaks = Streaks::scan(&realized);
        stats.current_streak = streaks.current;
        stats.longest_win_streak = streaks.longest_win;
        stats.longest_loss_streak = streaks.longest_loss;

        let drawdown = max_drawdown(starting_balance, curve);
        stats.max_drawdown = drawdown.max_pct;
        stats.max_drawdown_amount = drawdown.max_amount;

        tracing::debug!(
            closed = stats.total_trades,
            open = stats.open_trades,
            total_pnl = %stats.total_profit_loss,
            "summarized trades"
        );

        stats
    }
}

fn ratio(part: usize, whole: usize) -> Decimal {
    Decimal::from_count(part)
        .checked_div(Decimal::from_count(whole))
        .unwrap_or_default()
}

fn mean(sum: Decimal, count: usize) -> Decimal {
    sum.checked_div(Decimal::from_count(count))
        .unwrap_or_default()
}

/// Win/loss runs over chronologically ordered results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Streaks {
    pub current: i64,
    pub longest_win: usize,
    pub longest_loss: usize,
}

impl Streaks {
    /// Scan oldest-to-newest results. Break-even resets both runs.
    pub fn scan(results: &[Decimal]) -> Self {
        let mut streaks = Streaks::default();
        let mut run: i64 = 0;

        for &pnl in results {
            run = match Outcome::of(pnl) {
                Outcome::Win if run > 0 => run + 1,
                Outcome::Win => 1,
                Outcome::Loss if run < 0 => run - 1,
                Outcome::Loss => -1,
                Outcome::BreakEven => 0,
            };
            if run > 0 {
                streaks.longest_win = streaks.longest_win.max(run as usize);
            } else if run < 0 {
                streaks.longest_loss = streaks.longest_loss.max(run.unsigned_abs() as usize);
            }
        }

        streaks.current = run;
        streaks
    }
}
