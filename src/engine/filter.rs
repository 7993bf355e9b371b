//! Pre-pass narrowing a trade set by date window and tag.

use crate::domain::{TagId, Trade};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named trailing windows, anchored at the moment of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateRange {
    #[default]
    #[serde(alias = "all_time", alias = "allTime")]
    All,
    Week,
    Month,
    Year,
}

impl DateRange {
    /// Inclusive `[start, end]` bounds, or `None` for all-time.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = match self {
            DateRange::All => return None,
            DateRange::Week => now.checked_sub_signed(Duration::days(7)),
            DateRange::Month => now.checked_sub_months(Months::new(1)),
            DateRange::Year => now.checked_sub_months(Months::new(12)),
        };
        Some((start.unwrap_or(DateTime::<Utc>::MIN_UTC), now))
    }
}

impl FromStr for DateRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "all_time" | "alltime" => Ok(DateRange::All),
            "week" => Ok(DateRange::Week),
            "month" => Ok(DateRange::Month),
            "year" => Ok(DateRange::Year),
            other => Err(format!("must be all, week, month, or year, got {}", other)),
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateRange::All => "all",
            DateRange::Week => "week",
            DateRange::Month => "month",
            DateRange::Year => "year",
        };
        write!(f, "{}", name)
    }
}

/// Optional date window and tag restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeQuery {
    #[serde(default, alias = "range")]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub tag_id: Option<TagId>,
}

impl TradeQuery {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag_id = Some(TagId::new(tag));
        self
    }

    /// Whether `trade` passes every active restriction.
    ///
    /// Each restriction is an independent predicate, so applying them in
    /// any order or one at a time selects the same trades.
    pub fn matches(&self, trade: &Trade, now: DateTime<Utc>) -> bool {
        let in_window = match self.date_range.and_then(|r| r.resolve(now)) {
            Some((start, end)) => trade.trade_date >= start && trade.trade_date <= end,
            None => true,
        };
        let has_tag = match &self.tag_id {
            Some(tag) => trade.has_tag(tag),
            None => true,
        };
        in_window && has_tag
    }
}

/// Trades matching `query`, in input order, unmodified.
pub fn filter_trades(trades: &[Trade], query: &TradeQuery, now: DateTime<Utc>) -> Vec<Trade> {
    trades
        .iter()
        .filter(|t| query.matches(t, now))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, Direction};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    fn trade_at(date: DateTime<Utc>, tag: Option<&str>) -> Trade {
        let trade = Trade::new(
            "AAPL",
            Direction::Long,
            Decimal::from(10),
            Some(Decimal::from(11)),
            Decimal::one(),
            date,
        );
        match tag {
            Some(tag) => trade.with_tag(tag),
            None => trade,
        }
    }

    #[test]
    fn test_resolve_windows() {
        assert_eq!(DateRange::All.resolve(now()), None);
        assert_eq!(
            DateRange::Week.resolve(now()),
            Some((Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap(), now()))
        );
        // 31 March minus one month clamps to the end of February
        assert_eq!(
            DateRange::Month.resolve(now()).map(|(s, _)| s),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap())
        );
        assert_eq!(
            DateRange::Year.resolve(now()).map(|(s, _)| s),
            Some(Utc.with_ymd_and_hms(2023, 3, 31, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let start = Utc.with_ymd_and_hms(2024, 3, 24, 12, 0, 0).unwrap();
        let query = TradeQuery::all().with_range(DateRange::Week);
        assert!(query.matches(&trade_at(start, None), now()));
        assert!(query.matches(&trade_at(now(), None), now()));
        assert!(!query.matches(&trade_at(start - Duration::seconds(1), None), now()));
        assert!(!query.matches(&trade_at(now() + Duration::seconds(1), None), now()));
    }

    #[test]
    fn test_tag_filter() {
        let trades = vec![
            trade_at(now(), Some("breakout")),
            trade_at(now(), Some("fade")),
            trade_at(now(), None),
        ];
        let kept = filter_trades(&trades, &TradeQuery::all().with_tag("breakout"), now());
        assert_eq!(kept, vec![trades[0].clone()]);
    }

    #[test]
    fn test_filters_compose_in_any_order() {
        let old = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let recent = Utc.with_ymd_and_hms(2024, 3, 30, 0, 0, 0).unwrap();
        let trades = vec![
            trade_at(old, Some("a")),
            trade_at(recent, Some("a")),
            trade_at(recent, Some("b")),
            trade_at(old, None),
        ];

        let by_date = TradeQuery::all().with_range(DateRange::Month);
        let by_tag = TradeQuery::all().with_tag("a");
        let both = TradeQuery::all().with_range(DateRange::Month).with_tag("a");

        let date_then_tag = filter_trades(&filter_trades(&trades, &by_date, now()), &by_tag, now());
        let tag_then_date = filter_trades(&filter_trades(&trades, &by_tag, now()), &by_date, now());
        let combined = filter_trades(&trades, &both, now());

        assert_eq!(date_then_tag, tag_then_date);
        assert_eq!(date_then_tag, combined);
        assert_eq!(combined, vec![trades[1].clone()]);
    }

    #[test]
    fn test_all_time_keeps_everything() {
        let trades = vec![
            trade_at(DateTime::<Utc>::MIN_UTC, None),
            trade_at(now() + Duration::days(400), None),
        ];
        assert_eq!(filter_trades(&trades, &TradeQuery::all(), now()).len(), 2);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!("Week".parse::<DateRange>(), Ok(DateRange::Week));
        assert_eq!("all".parse::<DateRange>(), Ok(DateRange::All));
        assert!("decade".parse::<DateRange>().is_err());
        let query: TradeQuery =
            serde_json::from_str(r#"{"range": "month", "tagId": "3"}"#).unwrap();
        assert_eq!(query, TradeQuery::all().with_range(DateRange::Month).with_tag("3"));
    }
}
