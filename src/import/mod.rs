//! Reading journal exports into [`RawTrade`] records.
//!
//! Import only checks framing. Field-level problems (bad numbers, unknown
//! directions) are left for [`Trade::from_raw`](crate::domain::Trade::from_raw)
//! so they surface as per-trade issues instead of aborting the whole file.

use crate::domain::{RawTrade, Trade};
use serde_json::Value;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv parse error: {0}")]
    Csv(String),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported file extension: {0}")]
    UnsupportedFormat(String),
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::Csv(err.to_string())
    }
}

/// Column a CSV header maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Ticker,
    Direction,
    EntryPrice,
    ExitPrice,
    Quantity,
    Commissions,
    TradeDate,
    EntryTime,
    ExitTime,
    StopLoss,
    TakeProfit,
    HighestPrice,
    LowestPrice,
    Tags,
}

impl Column {
    /// Case, underscores and spaces are ignored: `Entry Price`,
    /// `entry_price` and `entryPrice` all match.
    fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let column = match key.as_str() {
            "id" => Column::Id,
            "ticker" | "symbol" => Column::Ticker,
            "direction" | "side" => Column::Direction,
            "entryprice" => Column::EntryPrice,
            "exitprice" => Column::ExitPrice,
            "quantity" | "qty" => Column::Quantity,
            "commissions" | "commission" => Column::Commissions,
            "tradedate" | "date" => Column::TradeDate,
            "entrytime" => Column::EntryTime,
            "exittime" => Column::ExitTime,
            "stoploss" => Column::StopLoss,
            "takeprofit" => Column::TakeProfit,
            "highestprice" => Column::HighestPrice,
            "lowestprice" => Column::LowestPrice,
            "tags" => Column::Tags,
            _ => return None,
        };
        Some(column)
    }

    fn assign(self, raw: &mut RawTrade, cell: &str) {
        let text = || Some(Value::String(cell.to_string()));
        match self {
            Column::Id => raw.id = text(),
            Column::Ticker => raw.ticker = text(),
            Column::Direction => raw.direction = text(),
            Column::EntryPrice => raw.entry_price = text(),
            Column::ExitPrice => raw.exit_price = text(),
            Column::Quantity => raw.quantity = text(),
            Column::Commissions => raw.commissions = text(),
            Column::TradeDate => raw.trade_date = text(),
            Column::EntryTime => raw.entry_time = text(),
            Column::ExitTime => raw.exit_time = text(),
            Column::StopLoss => raw.stop_loss = text(),
            Column::TakeProfit => raw.take_profit = text(),
            Column::HighestPrice => raw.highest_price = text(),
            Column::LowestPrice => raw.lowest_price = text(),
            Column::Tags => {
                raw.tags = Some(
                    cell.split(';')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(|t| Value::String(t.to_string()))
                        .collect(),
                )
            }
        }
    }
}

/// Parse a CSV export with a header row.
///
/// Unknown columns are ignored and blank cells are treated as absent.
pub fn read_csv_trades<R: Read>(reader: R) -> Result<Vec<RawTrade>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: Vec<Option<Column>> = reader.headers()?.iter().map(Column::from_header).collect();
    let ignored = columns.iter().filter(|c| c.is_none()).count();
    if ignored > 0 {
        tracing::debug!(ignored, "skipping unrecognized csv columns");
    }

    let mut trades = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut raw = RawTrade::default();
        for (column, cell) in columns.iter().zip(record.iter()) {
            if let Some(column) = column {
                if !cell.is_empty() {
                    column.assign(&mut raw, cell);
                }
            }
        }
        trades.push(raw);
    }

    Ok(trades)
}

/// Parse a JSON array of trade objects.
pub fn read_json_trades<R: Read>(reader: R) -> Result<Vec<RawTrade>, ImportError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Read a `.csv` or `.json` file, chosen by extension.
pub fn read_trades_file(path: impl AsRef<Path>) -> Result<Vec<RawTrade>, ImportError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let file = std::fs::File::open(path)?;
    let trades = match extension.as_str() {
        "csv" => read_csv_trades(file)?,
        "json" => read_json_trades(file)?,
        other => return Err(ImportError::UnsupportedFormat(other.to_string())),
    };
    tracing::info!(path = %path.display(), records = trades.len(), "imported trade records");
    Ok(trades)
}

/// Drop records whose trade key was already seen, keeping the first.
///
/// Records without a journal id are keyed by content, so two separate trades
/// with identical fields and a date-only timestamp collapse into one. The
/// positions of dropped records are logged at `warn` for that reason.
///
/// Records that do not validate cannot be keyed and are kept as-is so the
/// caller still gets an issue for them.
pub fn dedupe_by_key(records: Vec<RawTrade>) -> Vec<RawTrade> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = Vec::new();
    for (index, raw) in records.into_iter().enumerate() {
        let first = match Trade::from_raw(index, &raw) {
            Ok(trade) => seen.insert(trade.trade_key()),
            Err(_) => true,
        };
        if first {
            kept.push(raw);
        } else {
            dropped.push(index);
        }
    }
    if !dropped.is_empty() {
        tracing::warn!(?dropped, "dropped duplicate trade records");
    }
    kept
}
