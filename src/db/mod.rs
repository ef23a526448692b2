//! Database module for persistent storage.
//!
//! Provides async PostgreSQL access using SQLx for:
//! - Buildings (addresses and coordinates)
//! - Activity classification tree (max 3 levels)
//! - Organizations, their phones, and activity links
//!
//! Repositories are cheap per-call views over the shared pool; migrations are
//! embedded and run at connect time.

mod activities;
mod buildings;
mod organizations;

pub use activities::{ActivityNode, ActivityRecord, ActivityRepository, MAX_ACTIVITY_DEPTH};
pub use buildings::{BuildingRecord, BuildingRepository};
pub use organizations::{
    NewOrganization, OrganizationDetail, OrganizationRecord, OrganizationRepository,
    OrganizationUpdate, PhoneRecord,
};

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Database errors.
///
/// Domain variants double as client-facing detail strings (they map to 400
/// responses); `Sqlx`/`Migration` are internal and never leak their text.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(sqlx::Error),
    #[error("migration error: {0}")]
    Migration(sqlx::migrate::MigrateError),
    #[error("Building not found")]
    BuildingNotFound(i64),
    #[error("Parent activity not found")]
    ParentActivityNotFound(i64),
    #[error("One or more activities not found")]
    ActivitiesNotFound,
    #[error("Activity {0:?} already exists at this level")]
    ActivityNameTaken(String),
    #[error("Maximum nesting depth (3 levels) reached")]
    ActivityDepthExceeded,
    #[error("Update would create a cycle in the activity tree")]
    ActivityCycle,
    #[error("Cannot delete an activity that has organizations attached")]
    ActivityInUse(i64),
    #[error("Cannot delete an activity that has child activities")]
    ActivityHasChildren(i64),
    #[error("Cannot delete a building that still houses organizations")]
    BuildingOccupied(i64),
    #[error("Invalid coordinates")]
    InvalidCoordinates,
}

impl DbError {
    /// Whether this error is internal (maps to a 500 and a log line) rather
    /// than a domain refusal.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Sqlx(_) | Self::Migration(_))
    }

    /// Static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlx(_) => "sqlx",
            Self::Migration(_) => "migration",
            Self::BuildingNotFound(_) => "building_not_found",
            Self::ParentActivityNotFound(_) => "parent_activity_not_found",
            Self::ActivitiesNotFound => "activities_not_found",
            Self::ActivityNameTaken(_) => "activity_name_taken",
            Self::ActivityDepthExceeded => "activity_depth_exceeded",
            Self::ActivityCycle => "activity_cycle",
            Self::ActivityInUse(_) => "activity_in_use",
            Self::ActivityHasChildren(_) => "activity_has_children",
            Self::BuildingOccupied(_) => "building_occupied",
            Self::InvalidCoordinates => "invalid_coordinates",
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        DbError::Sqlx(err)
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::Migration(err)
    }
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connection acquire timeout - prevents connection storms from blocking
    /// indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Pool size. The directory workload is read-heavy and small.
    const MAX_CONNECTIONS: u32 = 5;

    /// Connect to PostgreSQL and run embedded migrations.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(Self::MAX_CONNECTIONS)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .test_before_acquire(true)
            .connect(url)
            .await?;

        info!("Database connected");

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Build a handle without touching the network.
    ///
    /// The first query opens the connection. Used by tests that only exercise
    /// surface that never reaches the database.
    pub fn connect_lazy(url: &str) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(Self::MAX_CONNECTIONS)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_lazy(url)?;
        Ok(Self { pool })
    }

    /// Get reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run embedded migrations.
    async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .map_err(DbError::Migration)?;

        info!("Database migrations checked/applied");
        Ok(())
    }

    /// Get building repository.
    pub fn buildings(&self) -> BuildingRepository<'_> {
        BuildingRepository::new(&self.pool)
    }

    /// Get activity repository.
    pub fn activities(&self) -> ActivityRepository<'_> {
        ActivityRepository::new(&self.pool)
    }

    /// Get organization repository.
    pub fn organizations(&self) -> OrganizationRepository<'_> {
        OrganizationRepository::new(&self.pool)
    }
}
