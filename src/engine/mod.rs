//! Pure computation engine for trade analytics.
//!
//! Nothing here performs I/O or reads the clock implicitly except
//! [`EquityCurveBuilder::build_curve`] and [`StatisticsEngine::summarize`];
//! everything else takes `now` from the caller.

pub mod analyzer;
pub mod breakdown;
pub mod equity;
pub mod filter;
pub mod metrics;
pub mod pnl;
pub mod registry;
pub mod stats;

pub use analyzer::{
    validate_all, Analyzer, AnalyticsReport, BreakdownReport, TradeReport, TradesReport,
    Validated, DISPLAY_DP,
};
pub use breakdown::{
    BreakdownBuilder, BucketStats, HourPerformance, PerformanceBreakdown, TagPerformance,
    WeekdayPerformance,
};
pub use equity::{max_drawdown, Drawdown, EquityCurveBuilder, EquityPoint};
pub use filter::{filter_trades, DateRange, TradeQuery};
pub use metrics::{compute_metrics, TradeMetrics};
pub use pnl::{Outcome, PnlCalculator, RealizedPnl};
pub use registry::{InstrumentRegistry, RegistryError};
pub use stats::{ProfitFactor, StatisticsEngine, StatisticsSnapshot, Streaks};
