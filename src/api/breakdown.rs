use axum::extract::{rejection::JsonRejection, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use crate::api::{parse_query, AppState};
use crate::domain::{RawTrade, TagId};
use crate::engine::{Analyzer, BreakdownReport, DISPLAY_DP};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRequest {
    #[serde(default)]
    pub trades: Vec<RawTrade>,
    #[serde(alias = "dateRange")]
    pub range: Option<String>,
    pub tag_id: Option<TagId>,
}

pub async fn post_breakdown(
    State(state): State<AppState>,
    payload: Result<Json<BreakdownRequest>, JsonRejection>,
) -> Result<Json<BreakdownReport>, AppError> {
    let Json(request) = payload?;
    let query = parse_query(request.range.as_deref(), request.tag_id)?;

    let report = Analyzer::new(state.registry()).breakdown(&request.trades, &query, Utc::now());

    Ok(Json(BreakdownReport {
        breakdown: report.breakdown.rounded(DISPLAY_DP),
        issues: report.issues,
    }))
}
