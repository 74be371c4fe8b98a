//! Schema tool routes: `/api/schema/*`
//!
//! Stateless helpers for the schema editor and record forms. None of these
//! touch the record store.

use std::sync::Arc;

use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sharedesk_core::{CollectionSchema, FieldDefinition, build_collection_schema};

use crate::error::{AppError, JsonBody};
use crate::state::AppState;

/// Build the `/api/schema` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/validate", post(validate))
        .route("/build", post(build))
        .route("/example", post(example))
        .route("/blank", post(blank))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SchemaRequest {
    pub schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct BuildRequest {
    pub fields: Vec<FieldDefinition>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub success: bool,
    pub valid: bool,
    /// Record fields other than `_id`, in declaration order.
    pub fields: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BuildResponse {
    pub success: bool,
    pub schema: CollectionSchema,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub success: bool,
    pub record: Value,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Validate an uploaded collection schema document.
async fn validate(JsonBody(document): JsonBody<Value>) -> Result<Json<ValidateResponse>, AppError> {
    let schema = CollectionSchema::validate_upload(&document)?;
    Ok(Json(ValidateResponse {
        success: true,
        valid: true,
        fields: schema.fields().map(|(name, _)| name.to_owned()).collect(),
    }))
}

/// Build a collection schema from form field definitions.
async fn build(JsonBody(body): JsonBody<BuildRequest>) -> Result<Json<BuildResponse>, AppError> {
    let schema = build_collection_schema(&body.fields)?;
    Ok(Json(BuildResponse {
        success: true,
        schema,
    }))
}

/// Generate a sample record for a collection schema.
async fn example(JsonBody(body): JsonBody<SchemaRequest>) -> Result<Json<RecordResponse>, AppError> {
    let schema = CollectionSchema::validate_upload(&body.schema)?;
    Ok(Json(RecordResponse {
        success: true,
        record: schema.example_record(),
    }))
}

/// Produce a blank form value for a collection schema.
async fn blank(JsonBody(body): JsonBody<SchemaRequest>) -> Result<Json<RecordResponse>, AppError> {
    let schema = CollectionSchema::validate_upload(&body.schema)?;
    Ok(Json(RecordResponse {
        success: true,
        record: schema.blank_record(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{TestApp, people_schema};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn validate_lists_fields() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/schema/validate", people_schema()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fields"], json!(["name", "age", "secret"]));
    }

    #[tokio::test]
    async fn validate_reports_first_failure() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/schema/validate", json!({"type": "array"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["message"],
            "schema must have \"$schema\": \"http://json-schema.org/draft-07/schema#\""
        );
    }

    #[tokio::test]
    async fn example_and_blank_records() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/schema/example", json!({"schema": people_schema()})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["record"],
            json!({
                "name": "example name",
                "age": 60,
                "secret": {"%allot": "example secret (will be encrypted)"}
            })
        );

        let (_, body) = app.post("/api/schema/blank", json!({"schema": people_schema()})).await;
        assert_eq!(body["record"], json!({"name": "", "age": 0, "secret": ""}));
    }

    #[tokio::test]
    async fn build_from_fields() {
        let app = TestApp::new();
        let (status, body) = app
            .post(
                "/api/schema/build",
                json!({"fields": [
                    {"name": "_id", "type": "string", "required": true},
                    {"name": "pin", "type": "integer", "isSecret": true}
                ]}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["schema"]["items"]["properties"]["pin"],
            json!({"type": "object", "properties": {"%share": {"type": "integer"}}, "required": ["%share"]})
        );

        let (status, body) = app
            .post("/api/schema/build", json!({"fields": [{"name": "", "type": "string"}]}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "all fields must have a name");
    }
}
