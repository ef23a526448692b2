//! orgdir - Organization Directory REST API.
//!
//! A PostgreSQL-backed directory of organizations, the buildings they occupy,
//! and a three-level tree of activity classifications. Served over HTTP/JSON
//! with API-key authentication.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod geo;
pub mod seed;
