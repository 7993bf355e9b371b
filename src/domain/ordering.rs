//! Stable trade ordering for deterministic curve and streak computation.

use crate::domain::Trade;
use chrono::{DateTime, Utc};

/// Stable ordering key for trades.
///
/// Ensures deterministic ordering of trades that share a `trade_date`.
/// Ordering: trade_date -> id -> trade_key -> input index
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TradeOrderingKey {
    /// Trade date (primary sort).
    pub trade_date: DateTime<Utc>,
    /// Journal id (secondary sort, if present).
    pub id: Option<i64>,
    /// Content key (tertiary sort).
    pub trade_key: String,
    /// Position in the caller's input (fallback for identical trades).
    pub index: usize,
}

impl TradeOrderingKey {
    /// Create an ordering key for the trade at `index` in the input.
    pub fn from_trade(index: usize, trade: &Trade) -> Self {
        TradeOrderingKey {
            trade_date: trade.trade_date,
            id: trade.id,
            trade_key: trade.trade_key(),
            index,
        }
    }
}

/// Sort trades chronologically (oldest first), deterministically.
///
/// Returns borrowed trades; the input slice is left untouched.
pub fn sort_trades_chronological<'a, I>(trades: I) -> Vec<&'a Trade>
where
    I: IntoIterator<Item = &'a Trade>,
{
    let mut keyed: Vec<(TradeOrderingKey, &Trade)> = trades
        .into_iter()
        .enumerate()
        .map(|(i, t)| (TradeOrderingKey::from_trade(i, t), t))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, t)| t).collect()
}
