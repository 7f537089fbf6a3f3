//! # Configuration Document Routes
//!
//! - `GET  /api/config`            — the whole document
//! - `POST /api/config/basic`      — `{network, wallet_name}`
//! - `POST /api/config/staking`    — any subset of the staking fields
//! - `POST /api/config/allocation` — `{allocation}`, replacing the section
//!
//! Each write validates only the section it touches. The file is left
//! untouched when validation fails.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value as JsonValue;
use serde_yaml::Value;

use dca_core::{validate_allocation, validate_network, validate_staking_params, validate_wallet};

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/config/basic", post(update_basic))
        .route("/api/config/staking", post(update_staking))
        .route("/api/config/allocation", post(update_allocation))
}

/// Body of every successful write.
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub status: &'static str,
}

impl UpdateResponse {
    fn success() -> Json<Self> {
        Json(Self { status: "success" })
    }
}

/// Unwrap a JSON body into an object, mapping every rejection to 400.
fn json_object(
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<serde_json::Map<String, JsonValue>, AppError> {
    let Json(value) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    match value {
        JsonValue::Object(map) if !map.is_empty() => Ok(map),
        JsonValue::Object(_) => Err(AppError::BadRequest("no data provided".into())),
        _ => Err(AppError::BadRequest("request body must be a JSON object".into())),
    }
}

fn to_yaml(value: &JsonValue) -> Result<Value, AppError> {
    serde_yaml::to_value(value).map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn get_config(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    Ok(Json(state.current()?.as_value().clone()))
}

async fn update_basic(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let fields = json_object(body)?;
    let (Some(network), Some(wallet_name)) = (fields.get("network"), fields.get("wallet_name")) else {
        return Err(AppError::BadRequest(
            "missing required fields: network, wallet_name".into(),
        ));
    };
    let network = network
        .as_str()
        .ok_or_else(|| AppError::BadRequest("network must be a string".into()))?;
    validate_network(network)?;
    let wallet_name = to_yaml(wallet_name)?;

    state.update(|config| {
        let wallet = config.section_mapping_mut("wallet");
        wallet.insert("name".into(), wallet_name);
        let wallet = Value::Mapping(wallet.clone());
        validate_wallet(&wallet)?;
        config.set_section("network", network.into());
        Ok(())
    })?;

    tracing::info!(network, "basic settings updated");
    Ok(UpdateResponse::success())
}

async fn update_staking(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let fields = json_object(body)?;
    let fields = fields
        .iter()
        .map(|(key, value)| Ok((Value::from(key.as_str()), to_yaml(value)?)))
        .collect::<Result<Vec<_>, AppError>>()?;

    state.update(|config| {
        let staking = config.section_mapping_mut("staking");
        staking.extend(fields);
        let staking = Value::Mapping(staking.clone());
        validate_staking_params(&staking)?;
        Ok(())
    })?;

    tracing::info!("staking settings updated");
    Ok(UpdateResponse::success())
}

async fn update_allocation(
    State(state): State<AppState>,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let fields = json_object(body)?;
    let allocation = fields
        .get("allocation")
        .ok_or_else(|| AppError::BadRequest("no allocation data provided".into()))?;

    // Numeric subnet keys arrive as JSON strings; the validated policy is
    // written back so they land in the file as integers.
    let policy = validate_allocation(&to_yaml(allocation)?)?;
    state.update(|config| {
        config.set_section("allocation", policy.to_value());
        Ok(())
    })?;

    tracing::info!(categories = policy.len(), "allocation updated");
    Ok(UpdateResponse::success())
}
