//! Activity handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use std::sync::Arc;

use super::AppState;
use super::schemas::{ActivityListQuery, ActivityPayload, ActivityResponse};
use crate::db::ActivityRecord;
use crate::error::{ApiError, ApiResult};

impl From<ActivityRecord> for ActivityResponse {
    fn from(record: ActivityRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            parent_id: record.parent_id,
            level: record.level,
            children: Vec::new(),
        }
    }
}

/// `GET /api/v1/activities`
///
/// With `parent_id` returns that parent's children; with `level` the nodes at
/// that level; with neither, the roots. Children come nested either way.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActivityListQuery>,
) -> ApiResult<Json<Vec<ActivityResponse>>> {
    query.validate()?;
    let nodes = state
        .db
        .activities()
        .list(query.parent_id, query.level)
        .await?;
    Ok(Json(nodes.into_iter().map(Into::into).collect()))
}

/// `GET /api/v1/activities/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<i64>,
) -> ApiResult<Json<ActivityResponse>> {
    let node = state
        .db
        .activities()
        .find_node(activity_id)
        .await?
        .ok_or(ApiError::NotFound("Activity"))?;
    Ok(Json(node.into()))
}

/// `GET /api/v1/tree`
pub async fn tree(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ActivityResponse>>> {
    let roots = state.db.activities().tree().await?;
    Ok(Json(roots.into_iter().map(Into::into).collect()))
}

/// `POST /api/v1/activities`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ActivityPayload>,
) -> ApiResult<(StatusCode, Json<ActivityResponse>)> {
    payload.validate()?;
    let record = state
        .db
        .activities()
        .create(&payload.name, payload.parent_id)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// `PUT /api/v1/activities/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<i64>,
    Json(payload): Json<ActivityPayload>,
) -> ApiResult<Json<ActivityResponse>> {
    payload.validate()?;
    let record = state
        .db
        .activities()
        .update(activity_id, &payload.name, payload.parent_id)
        .await?
        .ok_or(ApiError::NotFound("Activity"))?;
    Ok(Json(record.into()))
}

/// `DELETE /api/v1/activities/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = state.db.activities().delete(activity_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Activity"));
    }
    Ok(StatusCode::NO_CONTENT)
}
