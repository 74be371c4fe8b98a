//! Record routes: `/api/data/{collection_id}`
//!
//! Find, add, update, and delete records of one collection. Encrypted
//! fields arrive already encoded as `{"%allot": ...}` (or as
//! `{"isSecret": true, "value": ...}` markers) and are passed through.

use std::sync::Arc;

use axum::extract::Path;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sharedesk_core::{RecordService, UpdateOutcome};
use sharedesk_store::Filter;

use crate::error::{AppError, JsonBody, QueryParams};
use crate::network::Connected;
use crate::state::AppState;

/// Build the `/api/data` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/{collection_id}",
        get(find_records)
            .post(add_records)
            .put(update_records)
            .delete(delete_records),
    )
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FindQuery {
    /// JSON-encoded filter object.
    pub filter: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// JSON-encoded filter object.
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddRecordsRequest {
    /// A single record or an array of records.
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecordsRequest {
    pub filter: Option<Filter>,
    pub update: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: String,
    pub outcome: UpdateOutcome,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted: u64,
}

/// Parse a JSON-encoded filter from a query parameter.
fn parse_filter(raw: &str) -> Result<Filter, AppError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(filter)) => Ok(filter),
        Ok(_) => Err(AppError::BadRequest("filter must be a JSON object".to_owned())),
        Err(e) => Err(AppError::BadRequest(format!("invalid filter: {e}"))),
    }
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Find records, optionally filtered and limited.
async fn find_records(
    Connected(store): Connected,
    Path(collection_id): Path<String>,
    QueryParams(query): QueryParams<FindQuery>,
) -> Result<Json<RecordsResponse>, AppError> {
    let filter = match query.filter.as_deref() {
        Some(raw) => parse_filter(raw)?,
        None => Filter::new(),
    };
    let data = RecordService::new(store)
        .list(&collection_id, &filter, query.limit)
        .await?;
    Ok(Json(RecordsResponse {
        success: true,
        message: None,
        data,
    }))
}

/// Add one record or a batch of records.
async fn add_records(
    Connected(store): Connected,
    Path(collection_id): Path<String>,
    JsonBody(body): JsonBody<AddRecordsRequest>,
) -> Result<Json<RecordsResponse>, AppError> {
    let records = match body.data {
        None | Some(Value::Null) => return Err(AppError::BadRequest("Missing data field".to_owned())),
        Some(Value::Array(records)) => records,
        Some(record) => vec![record],
    };

    let data = RecordService::new(store).add(&collection_id, records).await?;
    Ok(Json(RecordsResponse {
        success: true,
        message: Some(format!("Added {} record(s)", data.len())),
        data,
    }))
}

/// Update the records matching a filter.
async fn update_records(
    Connected(store): Connected,
    Path(collection_id): Path<String>,
    JsonBody(body): JsonBody<UpdateRecordsRequest>,
) -> Result<Json<UpdateResponse>, AppError> {
    let (Some(filter), Some(update)) = (body.filter, body.update) else {
        return Err(AppError::BadRequest("Missing filter or update fields".to_owned()));
    };

    let outcome = RecordService::new(store)
        .update(&collection_id, &filter, &update)
        .await?;
    Ok(Json(UpdateResponse {
        success: true,
        message: "Data updated successfully".to_owned(),
        outcome,
    }))
}

/// Delete the records matching a filter. The filter is mandatory.
async fn delete_records(
    Connected(store): Connected,
    Path(collection_id): Path<String>,
    QueryParams(query): QueryParams<DeleteQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let Some(raw) = query.filter else {
        return Err(AppError::BadRequest("Missing filter parameter".to_owned()));
    };
    let filter = parse_filter(&raw)?;

    let deleted = RecordService::new(store).delete(&collection_id, &filter).await?;
    Ok(Json(DeleteResponse {
        success: true,
        message: "Data deleted successfully".to_owned(),
        deleted,
    }))
}
