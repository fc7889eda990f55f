// src/api.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analyze::additives::{additive_table, find_additive, AdditiveDefinition};
use crate::error::AnalysisError;
use crate::result::ClassificationResult;
use crate::session::AnalysisSession;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<AnalysisSession>,
}

impl AppState {
    pub fn new(session: AnalysisSession) -> Self {
        Self {
            session: Arc::new(session),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .route("/analysis/current", get(current_analysis))
        .route("/analysis/reset", post(reset_analysis))
        .route("/additives", get(list_additives))
        .route("/additives/{code}", get(get_additive))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeReq {
    #[serde(alias = "product_name", default)]
    product_name: String,
    #[serde(default)]
    ingredients: String,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, serde::Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// Maps session failures onto HTTP statuses.
pub struct ApiError(AnalysisError);

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::Busy => StatusCode::CONFLICT,
            AnalysisError::Critical(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.0.code(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeReq>,
) -> Result<Json<ClassificationResult>, ApiError> {
    let result = state
        .session
        .analyze_product_in(&body.product_name, &body.ingredients, body.category.as_deref())
        .await?;
    Ok(Json(result))
}

async fn current_analysis(State(state): State<AppState>) -> Json<Option<ClassificationResult>> {
    Json(state.session.current_analysis())
}

async fn reset_analysis(State(state): State<AppState>) -> StatusCode {
    state.session.reset();
    StatusCode::NO_CONTENT
}

async fn list_additives() -> Json<Vec<AdditiveDefinition>> {
    Json(additive_table().to_vec())
}

async fn get_additive(Path(code): Path<String>) -> Response {
    match find_additive(&code) {
        Some(def) => Json(*def).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "not_found",
                message: format!("unknown additive code {code}"),
            }),
        )
            .into_response(),
    }
}
