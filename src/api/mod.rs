//! HTTP API: router assembly and the unversioned surface.
//!
//! The versioned routes live under `/api/v1` behind the API key middleware;
//! `/health`, `/docs`, and the root redirect stay open.

pub mod activities;
pub mod buildings;
pub mod organizations;
pub mod schemas;

use axum::extract::Request;
use axum::http::{StatusCode, Uri};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::auth::require_api_key;
use crate::config::{API_V1_PREFIX, Config, PROJECT_NAME, PROJECT_VERSION};
use crate::db::Database;
use schemas::HealthResponse;

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: Config,
}

/// Build the full application router.
pub fn router(state: Arc<AppState>) -> Router {
    let api_v1 = Router::new()
        .route(
            "/organizations",
            get(organizations::list).post(organizations::create),
        )
        .route("/organizations/geo-search", post(organizations::geo_search))
        .route(
            "/organizations/by-building/:building_id",
            get(organizations::by_building),
        )
        .route(
            "/organizations/by-activity/:activity_id",
            get(organizations::by_activity),
        )
        .route(
            "/organizations/:org_id",
            get(organizations::get)
                .put(organizations::update)
                .delete(organizations::delete),
        )
        .route("/search", get(organizations::search))
        .route("/buildings", get(buildings::list).post(buildings::create))
        .route(
            "/buildings/:building_id",
            get(buildings::get)
                .put(buildings::update)
                .delete(buildings::delete),
        )
        .route("/activities", get(activities::list).post(activities::create))
        .route(
            "/activities/:activity_id",
            get(activities::get)
                .put(activities::update)
                .delete(activities::delete),
        )
        .route("/tree", get(activities::tree))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/docs", get(docs))
        .nest(API_V1_PREFIX, api_v1)
        .fallback(not_found)
        .layer(middleware::from_fn(access_log))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// `GET /` - redirect to the documentation page.
async fn root() -> Redirect {
    Redirect::temporary("/docs")
}

/// `GET /health` - liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: format!("{PROJECT_NAME} is running"),
        version: PROJECT_VERSION,
    })
}

/// `GET /docs` - static endpoint index.
async fn docs() -> Html<&'static str> {
    Html(DOCS_PAGE)
}

/// Fallback for unknown paths.
async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "detail": "Endpoint not found",
            "path": uri.path(),
        })),
    )
        .into_response()
}

/// Log one line per request with method, path, and status.
async fn access_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(%method, path = %path, status = response.status().as_u16(), "request");
    response
}

const DOCS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Organization Directory API</title>
  <style>
    body { font-family: sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }
    code { background: #f0f0f0; padding: 0.1rem 0.3rem; border-radius: 3px; }
    td { padding: 0.2rem 0.8rem 0.2rem 0; vertical-align: top; }
  </style>
</head>
<body>
  <h1>Organization Directory API</h1>
  <p>REST directory of organizations, buildings, and activity classifications.
     All <code>/api/v1</code> requests require the <code>X-API-Key</code> header.</p>

  <h2>Organizations</h2>
  <table>
    <tr><td><code>GET /api/v1/organizations</code></td><td>paginated list; filters: <code>building_id</code>, <code>activity_id</code>, <code>name_query</code>, <code>include_child_activities</code></td></tr>
    <tr><td><code>GET /api/v1/organizations/{id}</code></td><td>full record</td></tr>
    <tr><td><code>GET /api/v1/organizations/by-building/{id}</code></td><td>organizations in a building</td></tr>
    <tr><td><code>GET /api/v1/organizations/by-activity/{id}</code></td><td>organizations by activity, optionally with descendants</td></tr>
    <tr><td><code>GET /api/v1/search?q=</code></td><td>name search</td></tr>
    <tr><td><code>POST /api/v1/organizations/geo-search</code></td><td>radius or rectangle search around coordinates</td></tr>
    <tr><td><code>POST /api/v1/organizations</code></td><td>create</td></tr>
    <tr><td><code>PUT /api/v1/organizations/{id}</code></td><td>partial update</td></tr>
    <tr><td><code>DELETE /api/v1/organizations/{id}</code></td><td>delete</td></tr>
  </table>

  <h2>Buildings</h2>
  <table>
    <tr><td><code>GET /api/v1/buildings</code></td><td>list</td></tr>
    <tr><td><code>GET /api/v1/buildings/{id}</code></td><td>single record</td></tr>
    <tr><td><code>POST /api/v1/buildings</code></td><td>create</td></tr>
    <tr><td><code>PUT /api/v1/buildings/{id}</code></td><td>update</td></tr>
    <tr><td><code>DELETE /api/v1/buildings/{id}</code></td><td>delete (refused while occupied)</td></tr>
  </table>

  <h2>Activities</h2>
  <table>
    <tr><td><code>GET /api/v1/activities</code></td><td>list; filters: <code>parent_id</code>, <code>level</code></td></tr>
    <tr><td><code>GET /api/v1/activities/{id}</code></td><td>subtree</td></tr>
    <tr><td><code>GET /api/v1/tree</code></td><td>full classification tree</td></tr>
    <tr><td><code>POST /api/v1/activities</code></td><td>create (max depth 3)</td></tr>
    <tr><td><code>PUT /api/v1/activities/{id}</code></td><td>rename / re-parent</td></tr>
    <tr><td><code>DELETE /api/v1/activities/{id}</code></td><td>delete (refused while referenced)</td></tr>
  </table>

  <h2>Service</h2>
  <table>
    <tr><td><code>GET /health</code></td><td>liveness probe (no key required)</td></tr>
  </table>
</body>
</html>
"#;
