//! Collection routes: `/api/collections/*`
//!
//! List, create, inspect, and delete collections.

use std::sync::Arc;

use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sharedesk_core::{Collection, CollectionService};
use sharedesk_store::{CollectionMetadata, CollectionSummary, CollectionType};

use crate::error::{AppError, JsonBody};
use crate::network::Connected;
use crate::state::AppState;

/// Build the `/api/collections` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_collections).post(create_collection))
        .route("/{id}", get(read_collection).delete(delete_collection))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CollectionEntry {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
}

impl From<CollectionSummary> for CollectionEntry {
    fn from(summary: CollectionSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            collection_type: summary.collection_type,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CollectionListResponse {
    pub success: bool,
    pub collections: Vec<CollectionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub collection_type: Option<CollectionType>,
    pub description: Option<String>,
    pub schema: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct CreateCollectionResponse {
    pub success: bool,
    pub collection: Collection,
}

#[derive(Debug, Serialize)]
pub struct CollectionInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub collection_type: Option<CollectionType>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDetailsResponse {
    pub success: bool,
    pub metadata: CollectionMetadata,
    pub schema: Value,
    pub collection_info: CollectionInfo,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// List every collection owned by the builder.
async fn list_collections(Connected(store): Connected) -> Result<Json<CollectionListResponse>, AppError> {
    let collections = CollectionService::new(store).list().await?;
    Ok(Json(CollectionListResponse {
        success: true,
        collections: collections.into_iter().map(CollectionEntry::from).collect(),
    }))
}

/// Create a collection from an uploaded or built schema.
async fn create_collection(
    Connected(store): Connected,
    JsonBody(body): JsonBody<CreateCollectionRequest>,
) -> Result<Json<CreateCollectionResponse>, AppError> {
    let (Some(name), Some(collection_type), Some(schema)) = (body.name, body.collection_type, body.schema) else {
        return Err(AppError::BadRequest(
            "Missing required fields: name, type, schema".to_owned(),
        ));
    };

    let collection = CollectionService::new(store)
        .create(&name, collection_type, body.description, &schema)
        .await?;

    Ok(Json(CreateCollectionResponse {
        success: true,
        collection,
    }))
}

/// Read collection metadata along with its name and type.
async fn read_collection(
    Connected(store): Connected,
    Path(id): Path<String>,
) -> Result<Json<CollectionDetailsResponse>, AppError> {
    let details = CollectionService::new(store).get(&id).await?;
    let (name, collection_type) = details
        .summary
        .map_or((None, None), |s| (Some(s.name), Some(s.collection_type)));

    Ok(Json(CollectionDetailsResponse {
        success: true,
        schema: details.metadata.schema.clone(),
        metadata: details.metadata,
        collection_info: CollectionInfo {
            name,
            collection_type,
        },
    }))
}

/// Delete a collection and its records.
async fn delete_collection(
    Connected(store): Connected,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    CollectionService::new(store).delete(&id).await?;
    Ok(Json(MessageResponse {
        success: true,
        message: "Collection deleted successfully".to_owned(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::test_support::{TestApp, people_schema};
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn create_list_read_delete() {
        let app = TestApp::new();

        let (status, body) = app
            .post("/api/collections", json!({"name": "people", "type": "standard", "schema": people_schema()}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["collection"]["name"], "people");
        let id = body["collection"]["_id"].as_str().unwrap().to_owned();

        let (status, body) = app.get("/api/collections").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collections"], json!([{"_id": id, "name": "people", "type": "standard"}]));

        let (status, body) = app.get(&format!("/api/collections/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["metadata"]["count"], 0);
        assert_eq!(body["schema"], people_schema());
        assert_eq!(body["collectionInfo"], json!({"name": "people", "type": "standard"}));

        let (status, body) = app.delete(&format!("/api/collections/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Collection deleted successfully");

        let (status, body) = app.get(&format!("/api/collections/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::new();
        let (status, body) = app.post("/api/collections", json!({"name": "people"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Missing required fields: name, type, schema");
    }

    #[tokio::test]
    async fn invalid_schema_is_rejected_with_reason() {
        let app = TestApp::new();
        let mut schema = people_schema();
        schema["items"]["required"] = json!([]);
        let (status, body) = app
            .post("/api/collections", json!({"name": "people", "type": "owned", "schema": schema}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("\"_id\" in required array"));
    }

    #[tokio::test]
    async fn malformed_json_body_uses_error_envelope() {
        let app = TestApp::new();
        let (status, body) = app.post_raw("/api/collections", "{oops").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
}
