//! Request handlers.

use crate::error::{Result, ServeError};
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use fare_model::{FeatureValue, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// One trip to price. Every field is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Passengers on board
    pub passenger_count: f64,
    /// Street-hail or dispatch
    pub trip_type: f64,
    /// Congestion surcharge in dollars
    pub congestion_surcharge: f64,
    /// Mean distance of the route
    pub mean_distance: f64,
    /// Mean duration of the route in minutes
    pub mean_duration: f64,
    /// 1 inside rush hour
    pub rush_hour: f64,
    /// Vendor code, numeric or textual
    pub vendor_id: FeatureValue,
}

impl PredictRequest {
    /// Feature record keyed by column name.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("passenger_count".into(), self.passenger_count.into());
        record.insert("trip_type".into(), self.trip_type.into());
        record.insert("congestion_surcharge".into(), self.congestion_surcharge.into());
        record.insert("mean_distance".into(), self.mean_distance.into());
        record.insert("mean_duration".into(), self.mean_duration.into());
        record.insert("rush_hour".into(), self.rush_hour.into());
        record.insert("vendor_id".into(), self.vendor_id.clone());
        record
    }
}

/// Predicted fare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    /// Fare in dollars
    pub prediction: f64,
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "Hello": "Fare World" }))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let model = state.model_info().await;
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "model_loaded": model.is_some(),
        "model": model.map(|(name, version)| json!({ "name": name, "version": version })),
    }))
}

/// `POST /predict`
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>> {
    let record = request.to_record();
    let prediction = state
        .with_pipeline(|pipeline| pipeline.predict_one(&record))
        .await
        .ok_or(ServeError::ModelNotLoaded)??;

    if !prediction.is_finite() {
        return Err(ServeError::InvalidInput(format!(
            "prediction is not finite: {prediction}"
        )));
    }

    tracing::debug!(prediction, "Scored request");
    Ok(Json(PredictResponse { prediction }))
}
