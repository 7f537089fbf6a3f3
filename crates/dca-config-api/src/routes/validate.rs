//! `GET /api/validate` — run every rule against the stored document.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use dca_core::collect_errors;

use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/validate", get(validate))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationReport {
    /// `"valid"` or `"invalid"`.
    pub status: String,
    /// One message per violated rule, in document order.
    pub errors: Vec<String>,
}

async fn validate(State(state): State<AppState>) -> Result<Json<ValidationReport>, AppError> {
    let errors: Vec<String> = collect_errors(&state.current()?)
        .iter()
        .map(ToString::to_string)
        .collect();
    let status = if errors.is_empty() { "valid" } else { "invalid" };
    Ok(Json(ValidationReport {
        status: status.into(),
        errors,
    }))
}
