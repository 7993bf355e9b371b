pub mod breakdown;
pub mod health;
pub mod instruments;
pub mod statistics;
pub mod trades;

use crate::config::Config;
use crate::domain::{Decimal, TagId};
use crate::engine::{DateRange, InstrumentRegistry, TradeQuery};
use crate::error::AppError;
use axum::{
    http::Uri,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn registry(&self) -> &InstrumentRegistry {
        &self.config.instruments
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/instruments", get(instruments::get_instruments))
        .route("/v1/statistics", post(statistics::post_statistics))
        .route("/v1/trades/pnl", post(trades::post_trade_pnl))
        .route("/v1/breakdown", post(breakdown::post_breakdown))
        .fallback(not_found)
        .layer(cors)
        .with_state(state)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Build a [`TradeQuery`] from the optional `range`/`tagId` request fields.
pub(crate) fn parse_query(
    range: Option<&str>,
    tag_id: Option<TagId>,
) -> Result<TradeQuery, AppError> {
    let date_range = range
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<DateRange>())
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("Invalid range: {}", e)))?;
    let tag_id = tag_id.filter(|t| !t.as_str().trim().is_empty());
    Ok(TradeQuery { date_range, tag_id })
}

/// A JSON number or numeric string within the amount limit; `null`/absent
/// falls back to `default`.
pub(crate) fn parse_decimal_field(
    value: Option<&serde_json::Value>,
    field: &str,
    default: Decimal,
) -> Result<Decimal, AppError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(default),
        Some(v) => Decimal::from_json(v)
            .filter(Decimal::within_amount_limit)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid {}", field))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_query() {
        let query = parse_query(Some("week"), Some(TagId::new("7"))).unwrap();
        assert_eq!(query, TradeQuery::all().with_range(DateRange::Week).with_tag("7"));
        assert_eq!(parse_query(Some(" "), None).unwrap(), TradeQuery::all());
        assert!(matches!(parse_query(Some("decade"), None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_parse_decimal_field() {
        let fallback = Decimal::from(500);
        assert_eq!(parse_decimal_field(None, "x", fallback).unwrap(), fallback);
        assert_eq!(parse_decimal_field(Some(&json!(null)), "x", fallback).unwrap(), fallback);
        assert_eq!(
            parse_decimal_field(Some(&json!("1000.5")), "x", fallback)
                .unwrap()
                .to_canonical_string(),
            "1000.5"
        );
        assert!(parse_decimal_field(Some(&json!("abc")), "x", fallback).is_err());
        assert!(parse_decimal_field(Some(&json!(true)), "x", fallback).is_err());
        let huge = json!("79228162514264337593543950335");
        assert!(parse_decimal_field(Some(&huge), "x", fallback).is_err());
    }
}
