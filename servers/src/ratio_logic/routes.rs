//! # JSON API
//!
//! - `GET /api/countries`: every entity, ascending by latest estimated ratio.
//! - `GET /api/country/{slug}`: one entity's series, or 404.
//! - `GET /health`: liveness.
//!
//! An unreachable upstream is answered with 503 rather than a crash.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use lib_ratio::{CountrySeries, RatioError, RatioService};

/// Shared handler state.
pub type SharedService = Arc<RatioService>;

/// # Application Error
///
/// Failures a handler can answer with.
#[derive(Debug)]
pub enum AppError {
    /// The slug resolved to an entity with no data.
    NotFound(String),
    /// The pipeline could not load its rows.
    Unavailable(RatioError),
}

impl From<RatioError> for AppError {
    fn from(e: RatioError) -> Self {
        AppError::Unavailable(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFound(slug) => {
                info!(slug = %slug, "Country not found");
                (StatusCode::NOT_FOUND, json!({ "error": "Country not found" }))
            }
            AppError::Unavailable(e) => {
                error!(error = %e, "Data unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({ "error": "Data temporarily unavailable" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// One entry of the countries listing.
#[derive(Debug, Serialize)]
pub struct CountryListing {
    pub slug: String,
    #[serde(flatten)]
    pub country: CountrySeries,
}

pub fn router(service: SharedService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/countries", get(list_countries))
        .route("/api/country/{slug}", get(get_country))
        .with_state(service)
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn list_countries(
    State(service): State<SharedService>,
) -> Result<Json<Vec<CountryListing>>, AppError> {
    let countries = service.get_all_countries().await?;
    let listing = countries
        .into_iter()
        .map(|country| CountryListing {
            slug: service.entity_to_slug(&country.entity),
            country,
        })
        .collect();
    Ok(Json(listing))
}

pub async fn get_country(
    State(service): State<SharedService>,
    Path(slug): Path<String>,
) -> Result<Json<CountrySeries>, AppError> {
    match service.country_by_slug(&slug).await? {
        Some(country) => Ok(Json(country)),
        None => Err(AppError::NotFound(slug)),
    }
}
