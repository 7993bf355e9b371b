//! Domain types for the trade analytics engine.
//!
//! This module provides:
//! - Lossless numeric handling via Decimal wrapper
//! - Domain primitives: Ticker, TagId, Direction
//! - Raw and validated trade records, plus per-trade validation issues
//! - Instrument tick semantics
//! - Stable trade ordering key helper for deterministic processing

pub mod decimal;
pub mod instrument;
pub mod issue;
pub mod ordering;
pub mod primitives;
pub mod trade;

pub use decimal::Decimal;
pub use instrument::{InstrumentSpec, Pricing};
pub use issue::{TradeIssue, TradeIssueKind};
pub use ordering::{sort_trades_chronological, TradeOrderingKey};
pub use primitives::{Direction, TagId, Ticker};
pub use trade::{parse_datetime, RawTrade, Trade};
