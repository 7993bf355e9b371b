use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::api::{parse_decimal_field, parse_query, AppState};
use crate::domain::{RawTrade, TagId};
use crate::engine::{Analyzer, AnalyticsReport};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsRequest {
    #[serde(default)]
    pub trades: Vec<RawTrade>,
    pub starting_balance: Option<serde_json::Value>,
    #[serde(alias = "dateRange")]
    pub range: Option<String>,
    pub tag_id: Option<TagId>,
}

/// Statistics and equity curve, rounded for display.
pub async fn post_statistics(
    State(state): State<AppState>,
    payload: Result<Json<StatisticsRequest>, JsonRejection>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let Json(request) = payload?;

    let query = parse_query(request.range.as_deref(), request.tag_id)?;
    let starting_balance = parse_decimal_field(
        request.starting_balance.as_ref(),
        "startingBalance",
        state.config.starting_balance,
    )?;

    let report = Analyzer::new(state.registry()).analyze(
        &request.trades,
        &query,
        starting_balance,
        Utc::now(),
    );
    tracing::info!(
        records = request.trades.len(),
        closed = report.statistics.total_trades,
        issues = report.issues.len(),
        "computed statistics"
    );

    Ok(Json(report.rounded()))
}
