//! HTTP surface: the HTML form, its POST target, and a JSON endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::{json, Value};

use crate::encoding::{Categorical, FuelType, SellerType, Transmission};
use crate::pipeline::PricePipeline;
use crate::types::{Outcome, VehicleInput, INVALID_INPUT};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<PricePipeline>,
    pub log_features: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(form_page).post(form_submit))
        .route("/predict", post(predict_json))
        .route("/health", get(health))
        .with_state(state)
}

fn evaluate(state: &AppState, fields: &HashMap<String, String>) -> Outcome {
    if state.log_features {
        log_feature_vectors(&state.pipeline, fields);
    }
    match state.pipeline.run_fields(fields) {
        Ok(r) => {
            tracing::debug!(
                raw = r.raw_price,
                price = r.clamped_price,
                confidence = r.confidence.percent(),
                "priced"
            );
            r.into()
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected input");
            Outcome::Invalid
        }
    }
}

// Debug signal for column-order problems
fn log_feature_vectors(pipeline: &PricePipeline, fields: &HashMap<String, String>) {
    let Ok(input) = VehicleInput::from_fields(fields) else {
        return;
    };
    let Ok(encoded) = pipeline.encode(&input) else {
        return;
    };
    let scaled = pipeline.scale(&encoded).map(|s| s.to_array());
    tracing::info!(
        brand = %input.brand,
        encoded = ?encoded.to_array(),
        scaled = ?scaled,
        "features"
    );
}

async fn form_page() -> Html<String> {
    Html(render_page(None))
}

async fn form_submit(
    State(state): State<AppState>,
    body: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Html<String> {
    let outcome = match body {
        Ok(Form(fields)) => evaluate(&state, &fields),
        Err(e) => {
            tracing::warn!(error = %e, "rejected form");
            Outcome::Invalid
        }
    };
    Html(render_page(Some(outcome)))
}

/// Always 200: a malformed body is just another invalid input.
async fn predict_json(
    State(state): State<AppState>,
    body: Result<Json<HashMap<String, Value>>, JsonRejection>,
) -> Json<Outcome> {
    let fields: HashMap<String, String> = match body {
        Ok(Json(map)) => map
            .into_iter()
            .filter_map(|(k, v)| match v {
                Value::String(s) => Some((k, s)),
                Value::Number(n) => Some((k, n.to_string())),
                // null, bools and nested values count as absent
                _ => None,
            })
            .collect(),
        Err(e) => {
            tracing::warn!(error = %e, "rejected body");
            return Json(Outcome::Invalid);
        }
    };
    Json(evaluate(&state, &fields))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn options<C: Categorical>() -> String {
    C::LABELS
        .iter()
        .map(|(label, _)| format!("<option value=\"{label}\">{label}</option>"))
        .collect()
}

fn render_page(outcome: Option<Outcome>) -> String {
    let result = match outcome {
        None => String::new(),
        Some(Outcome::Priced { price, confidence }) => format!(
            "<section class=\"result\"><p>Predicted price: {price:.2} Lakhs</p>\
             <p>Confidence: {}%</p></section>",
            confidence.percent()
        ),
        Some(Outcome::Invalid) => format!(
            "<section class=\"result error\"><p>{INVALID_INPUT}</p><p>Confidence: 0%</p></section>"
        ),
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Used Car Price Estimator</title></head>
<body>
<h1>Used Car Price Estimator</h1>
<form method="post" action="/">
  <label>Year <input name="Year" type="number" required></label>
  <label>Present Price (Lakhs) <input name="Present_Price" type="number" step="0.01" required></label>
  <label>Kms Driven <input name="Kms_Driven" type="number" min="0" required></label>
  <label>Owners <input name="Owner" type="number" min="0" required></label>
  <label>Fuel Type <select name="Fuel_Type">{fuel}</select></label>
  <label>Seller Type <select name="Seller_Type">{seller}</select></label>
  <label>Transmission <select name="Transmission">{transmission}</select></label>
  <label>Brand <input name="Brand" type="text" required></label>
  <button type="submit">Predict</button>
</form>
{result}
</body>
</html>
"#,
        fuel = options::<FuelType>(),
        seller = options::<SellerType>(),
        transmission = options::<Transmission>(),
    )
}
