use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentEntry {
    pub symbol: String,
    pub tick_size: String,
    pub tick_value: String,
}

#[derive(Debug, Serialize)]
pub struct InstrumentsResponse {
    pub instruments: Vec<InstrumentEntry>,
}

pub async fn get_instruments(State(state): State<AppState>) -> Json<InstrumentsResponse> {
    let instruments = state
        .registry()
        .iter()
        .map(|(ticker, spec)| InstrumentEntry {
            symbol: ticker.to_string(),
            tick_size: spec.tick_size.to_canonical_string(),
            tick_value: spec.tick_value.to_canonical_string(),
        })
        .collect();

    Json(InstrumentsResponse { instruments })
}
