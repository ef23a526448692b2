//! Organization handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use std::sync::Arc;

use super::AppState;
use super::schemas::{
    ByActivityQuery, GeoSearchKind, GeoSearchRequest, ListQuery, OrganizationPayload,
    OrganizationResponse, OrganizationSummary, OrganizationUpdatePayload, PageQuery,
    PaginatedOrganizations, SearchQuery, page_count,
};
use crate::db::{NewOrganization, OrganizationDetail, OrganizationUpdate};
use crate::error::{ApiError, ApiResult};

/// `GET /api/v1/organizations`
///
/// Paginated list. At most one filter applies per request, in priority order
/// building > activity > name; `include_child_activities` widens the activity
/// filter to the whole subtree.
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<PaginatedOrganizations>> {
    query.validate()?;

    let repo = state.db.organizations();
    let offset = query.offset();

    let (details, total) = if let Some(building_id) = query.building_id {
        (
            repo.by_building(building_id, offset, query.per_page).await?,
            repo.count_by_building(building_id).await?,
        )
    } else if let Some(activity_id) = query.activity_id {
        let activity_ids = if query.include_child_activities {
            state.db.activities().descendant_ids(activity_id).await?
        } else {
            vec![activity_id]
        };
        (
            repo.by_activities(&activity_ids, offset, query.per_page)
                .await?,
            repo.count_by_activities(&activity_ids).await?,
        )
    } else if let Some(ref name_query) = query.name_query {
        (
            repo.search_by_name(name_query, offset, query.per_page)
                .await?,
            repo.count_by_name(name_query).await?,
        )
    } else {
        (
            repo.list_all(offset, query.per_page).await?,
            repo.count_all().await?,
        )
    };

    Ok(Json(PaginatedOrganizations {
        items: details.into_iter().map(OrganizationSummary::from).collect(),
        total,
        page: query.page,
        per_page: query.per_page,
        pages: page_count(total, query.per_page),
    }))
}

/// `GET /api/v1/organizations/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
) -> ApiResult<Json<OrganizationResponse>> {
    let detail = state
        .db
        .organizations()
        .find_by_id(org_id)
        .await?
        .ok_or(ApiError::NotFound("Organization"))?;
    Ok(Json(detail.into()))
}

/// `GET /api/v1/organizations/by-building/{building_id}`
pub async fn by_building(
    State(state): State<Arc<AppState>>,
    Path(building_id): Path<i64>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    query.validate()?;
    let details = state
        .db
        .organizations()
        .by_building(building_id, query.skip, query.limit)
        .await?;
    Ok(Json(to_responses(details)))
}

/// `GET /api/v1/organizations/by-activity/{activity_id}`
pub async fn by_activity(
    State(state): State<Arc<AppState>>,
    Path(activity_id): Path<i64>,
    Query(query): Query<ByActivityQuery>,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    query.window().validate()?;

    let activity_ids = if query.include_children {
        state.db.activities().descendant_ids(activity_id).await?
    } else {
        vec![activity_id]
    };

    let details = state
        .db
        .organizations()
        .by_activities(&activity_ids, query.skip, query.limit)
        .await?;
    Ok(Json(to_responses(details)))
}

/// `GET /api/v1/search?q=`
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    query.window().validate()?;
    let details = state
        .db
        .organizations()
        .search_by_name(&query.q, query.skip, query.limit)
        .await?;
    Ok(Json(to_responses(details)))
}

/// `POST /api/v1/organizations/geo-search`
pub async fn geo_search(
    State(state): State<Arc<AppState>>,
    Query(window): Query<PageQuery>,
    Json(request): Json<GeoSearchRequest>,
) -> ApiResult<Json<Vec<OrganizationResponse>>> {
    window.validate()?;
    request.validate()?;

    let repo = state.db.organizations();
    let details = match request.search_type {
        GeoSearchKind::Radius => {
            let radius_km = request
                .radius_km
                .ok_or_else(|| ApiError::Validation("radius search requires radius_km".into()))?;
            repo.geo_radius(
                request.latitude,
                request.longitude,
                radius_km,
                window.skip,
                window.limit,
            )
            .await?
        }
        GeoSearchKind::Rectangle => {
            let (Some(north), Some(south), Some(east), Some(west)) = (
                request.north_lat,
                request.south_lat,
                request.east_lng,
                request.west_lng,
            ) else {
                return Err(ApiError::Validation(
                    "rectangle search requires north_lat, south_lat, east_lng and west_lng".into(),
                ));
            };
            repo.geo_rectangle(north, south, east, west, window.skip, window.limit)
                .await?
        }
    };

    Ok(Json(to_responses(details)))
}

/// `POST /api/v1/organizations`
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OrganizationPayload>,
) -> ApiResult<(StatusCode, Json<OrganizationResponse>)> {
    payload.validate()?;
    let detail = state
        .db
        .organizations()
        .create(&NewOrganization {
            name: payload.name,
            building_id: payload.building_id,
            phone_numbers: payload.phone_numbers,
            activity_ids: payload.activity_ids,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// `PUT /api/v1/organizations/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
    Json(payload): Json<OrganizationUpdatePayload>,
) -> ApiResult<Json<OrganizationResponse>> {
    payload.validate()?;
    let detail = state
        .db
        .organizations()
        .update(
            org_id,
            &OrganizationUpdate {
                name: payload.name,
                building_id: payload.building_id,
                phone_numbers: payload.phone_numbers,
                activity_ids: payload.activity_ids,
            },
        )
        .await?
        .ok_or(ApiError::NotFound("Organization"))?;
    Ok(Json(detail.into()))
}

/// `DELETE /api/v1/organizations/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = state.db.organizations().delete(org_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Organization"));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn to_responses(details: Vec<OrganizationDetail>) -> Vec<OrganizationResponse> {
    details.into_iter().map(OrganizationResponse::from).collect()
}
