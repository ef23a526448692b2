//! Building handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use std::sync::Arc;

use super::AppState;
use super::schemas::{BuildingListQuery, BuildingPayload, BuildingResponse};
use crate::error::{ApiError, ApiResult};

/// `GET /api/v1/buildings`
///
/// Optional `address_query` narrows the list by address substring.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BuildingListQuery>,
) -> ApiResult<Json<Vec<BuildingResponse>>> {
    query.window().validate()?;
    let repo = state.db.buildings();
    let buildings = match query.address_query {
        Some(ref address_query) => {
            repo.search_by_address(address_query, query.skip, query.limit)
                .await?
        }
        None => repo.list(query.skip, query.limit).await?,
    };
    Ok(Json(buildings.into_iter().map(Into::into).collect()))
}

/// `GET /api/v1/buildings/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(building_id): Path<i64>,
) -> ApiResult<Json<BuildingResponse>> {
    let building = state
        .db
        .buildings()
        .find_by_id(building_id)
        .await?
        .ok_or(ApiError::NotFound("Building"))?;
    Ok(Json(building.into()))
}

/// `POST /api/v1/buildings`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BuildingPayload>,
) -> ApiResult<(StatusCode, Json<BuildingResponse>)> {
    payload.validate()?;
    let building = state
        .db
        .buildings()
        .create(&payload.address, payload.latitude, payload.longitude)
        .await?;
    Ok((StatusCode::CREATED, Json(building.into())))
}

/// `PUT /api/v1/buildings/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(building_id): Path<i64>,
    Json(payload): Json<BuildingPayload>,
) -> ApiResult<Json<BuildingResponse>> {
    payload.validate()?;
    let building = state
        .db
        .buildings()
        .update(
            building_id,
            &payload.address,
            payload.latitude,
            payload.longitude,
        )
        .await?
        .ok_or(ApiError::NotFound("Building"))?;
    Ok(Json(building.into()))
}

/// `DELETE /api/v1/buildings/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(building_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = state.db.buildings().delete(building_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Building"));
    }
    Ok(StatusCode::NO_CONTENT)
}
