pub mod api;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod import;

pub use config::Config;
pub use domain::{Decimal, Direction, RawTrade, TagId, Ticker, Trade, TradeIssue, TradeIssueKind};
pub use engine::{Analyzer, AnalyticsReport, InstrumentRegistry, StatisticsSnapshot, TradeQuery};
pub use error::AppError;
pub use import::{dedupe_by_key, read_csv_trades, read_json_trades, read_trades_file, ImportError};
