//! Performance grouped by tag, hour of day and weekday.

use crate::domain::{Decimal, TagId, Trade};
use chrono::{Datelike, Timelike, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

use super::pnl::{Outcome, PnlCalculator};
use super::stats::ProfitFactor;

/// Running totals for one bucket of closed trades.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    count: usize,
    wins: usize,
    total: Decimal,
    gross_profit: Decimal,
    gross_loss: Decimal,
}

impl Accumulator {
    fn push(&mut self, net: Decimal) {
        self.count += 1;
        self.total += net;
        match Outcome::of(net) {
            Outcome::Win => {
                self.wins += 1;
                self.gross_profit += net;
            }
            Outcome::Loss => self.gross_loss += net.abs(),
            Outcome::BreakEven => {}
        }
    }

    fn win_rate(&self) -> Decimal {
        Decimal::from_count(self.wins)
            .checked_div(Decimal::from_count(self.count))
            .unwrap_or_default()
    }

    fn bucket(&self) -> BucketStats {
        BucketStats {
            trade_count: self.count,
            total_pnl: self.total,
            win_rate: self.win_rate(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketStats {
    pub trade_count: usize,
    pub total_pnl: Decimal,
    pub win_rate: Decimal,
}

impl BucketStats {
    fn rounded(&self, dp: u32) -> Self {
        Self {
            trade_count: self.trade_count,
            total_pnl: self.total_pnl.round_dp(dp),
            win_rate: self.win_rate.round_dp(dp + 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPerformance {
    pub tag_id: TagId,
    #[serde(flatten)]
    pub stats: BucketStats,
    pub profit_factor: ProfitFactor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourPerformance {
    /// Hour of day in UTC, `0..=23`.
    pub hour: u32,
    #[serde(flatten)]
    pub stats: BucketStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayPerformance {
    pub weekday: Weekday,
    #[serde(flatten)]
    pub stats: BucketStats,
}

/// Breakdowns over the closed trades of a set. Buckets with no trades are
/// omitted; every list is sorted by its key (weekdays from Monday).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceBreakdown {
    pub by_tag: Vec<TagPerformance>,
    pub by_hour: Vec<HourPerformance>,
    pub by_weekday: Vec<WeekdayPerformance>,
}

impl PerformanceBreakdown {
    pub fn rounded(&self, dp: u32) -> Self {
        Self {
            by_tag: self
                .by_tag
                .iter()
                .map(|t| TagPerformance {
                    tag_id: t.tag_id.clone(),
                    stats: t.stats.rounded(dp),
                    profit_factor: t.profit_factor.round_dp(dp),
                })
                .collect(),
            by_hour: self
                .by_hour
                .iter()
                .map(|h| HourPerformance {
                    hour: h.hour,
                    stats: h.stats.rounded(dp),
                })
                .collect(),
            by_weekday: self
                .by_weekday
                .iter()
                .map(|w| WeekdayPerformance {
                    weekday: w.weekday,
                    stats: w.stats.rounded(dp),
                })
                .collect(),
        }
    }
}

/// Groups realized P&L into tag and time-of-week buckets.
#[derive(Debug, Clone, Copy)]
pub struct BreakdownBuilder<'a> {
    calculator: PnlCalculator<'a>,
}

impl<'a> BreakdownBuilder<'a> {
    pub fn new(calculator: PnlCalculator<'a>) -> Self {
        Self { calculator }
    }

    /// A trade with several tags counts once under each of them.
    pub fn build(&self, trades: &[Trade]) -> PerformanceBreakdown {
        let mut tags: BTreeMap<&TagId, Accumulator> = BTreeMap::new();
        let mut hours: BTreeMap<u32, Accumulator> = BTreeMap::new();
        let mut weekdays: BTreeMap<u32, (Weekday, Accumulator)> = BTreeMap::new();

        for trade in trades {
            let Some(net) = self.calculator.net_pnl(trade) else {
                continue;
            };
            for tag in &trade.tags {
                tags.entry(tag).or_default().push(net);
            }

            let at = trade.closed_at();
            hours.entry(at.hour()).or_default().push(net);
            let weekday = at.weekday();
            weekdays
                .entry(weekday.num_days_from_monday())
                .or_insert_with(|| (weekday, Accumulator::default()))
                .1
                .push(net);
        }

        PerformanceBreakdown {
            by_tag: tags
                .into_iter()
                .map(|(tag, acc)| TagPerformance {
                    tag_id: tag.clone(),
                    stats: acc.bucket(),
                    profit_factor: ProfitFactor::from_sums(acc.gross_profit, acc.gross_loss),
                })
                .collect(),
            by_hour: hours
                .into_iter()
                .map(|(hour, acc)| HourPerformance {
                    hour,
                    stats: acc.bucket(),
                })
                .collect(),
            by_weekday: weekdays
                .into_values()
                .map(|(weekday, acc)| WeekdayPerformance {
                    weekday,
                    stats: acc.bucket(),
                })
                .collect(),
        }
    }
}
