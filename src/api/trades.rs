use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{RawTrade, TradeIssue};
use crate::engine::{Analyzer, TradeMetrics, DISPLAY_DP};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct TradePnlRequest {
    #[serde(default)]
    pub trades: Vec<RawTrade>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradePnlEntry {
    pub index: usize,
    pub trade_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub ticker: String,
    pub is_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<TradeMetrics>,
}

#[derive(Debug, Serialize)]
pub struct TradePnlResponse {
    pub trades: Vec<TradePnlEntry>,
    pub issues: Vec<TradeIssue>,
}

/// Realized P&L and metrics per trade, in input order.
pub async fn post_trade_pnl(
    State(state): State<AppState>,
    payload: Result<Json<TradePnlRequest>, JsonRejection>,
) -> Result<Json<TradePnlResponse>, AppError> {
    let Json(request) = payload?;

    let report = Analyzer::new(state.registry()).trade_reports(&request.trades);
    let trades = report
        .trades
        .into_iter()
        .map(|entry| TradePnlEntry {
            index: entry.index,
            trade_key: entry.trade_key,
            id: entry.trade.id,
            ticker: entry.trade.ticker.to_string(),
            is_open: !entry.trade.is_closed(),
            metrics: entry.metrics.map(|m| m.rounded(DISPLAY_DP)),
        })
        .collect();

    Ok(Json(TradePnlResponse {
        trades,
        issues: report.issues,
    }))
}
