//! Building repository.
//!
//! Buildings are street addresses with WGS84 coordinates; organizations
//! reference them and block their deletion.

use super::DbError;
use crate::geo;
use sqlx::PgPool;

/// A building row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BuildingRecord {
    pub id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Repository for building operations.
pub struct BuildingRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BuildingRepository<'a> {
    /// Create a new building repository.
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List buildings ordered by id.
    pub async fn list(&self, offset: i64, limit: i64) -> Result<Vec<BuildingRecord>, DbError> {
        let rows = sqlx::query_as::<_, BuildingRecord>(
            r#"
            SELECT id, address, latitude, longitude
            FROM buildings
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Find building by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<BuildingRecord>, DbError> {
        let row = sqlx::query_as::<_, BuildingRecord>(
            r#"
            SELECT id, address, latitude, longitude
            FROM buildings
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Case-insensitive substring search over addresses.
    pub async fn search_by_address(
        &self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<BuildingRecord>, DbError> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query_as::<_, BuildingRecord>(
            r#"
            SELECT id, address, latitude, longitude
            FROM buildings
            WHERE address ILIKE $1
            ORDER BY id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(pattern)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Create a new building.
    pub async fn create(
        &self,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<BuildingRecord, DbError> {
        if !geo::valid_coordinates(latitude, longitude) {
            return Err(DbError::InvalidCoordinates);
        }

        let row = sqlx::query_as::<_, BuildingRecord>(
            r#"
            INSERT INTO buildings (address, latitude, longitude)
            VALUES ($1, $2, $3)
            RETURNING id, address, latitude, longitude
            "#,
        )
        .bind(address)
        .bind(latitude)
        .bind(longitude)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Update a building. Returns `None` when the id does not exist.
    pub async fn update(
        &self,
        id: i64,
        address: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<BuildingRecord>, DbError> {
        if !geo::valid_coordinates(latitude, longitude) {
            return Err(DbError::InvalidCoordinates);
        }

        let row = sqlx::query_as::<_, BuildingRecord>(
            r#"
            UPDATE buildings
            SET address = $2, latitude = $3, longitude = $4
            WHERE id = $1
            RETURNING id, address, latitude, longitude
            "#,
        )
        .bind(id)
        .bind(address)
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Delete a building. Refused while organizations still reference it.
    /// Returns `false` when the id does not exist.
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let occupants = self.organization_count(id).await?;
        if occupants > 0 {
            return Err(DbError::BuildingOccupied(id));
        }

        let result = sqlx::query("DELETE FROM buildings WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of buildings.
    pub async fn count(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buildings")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of organizations housed in the building.
    pub async fn organization_count(&self, id: i64) -> Result<i64, DbError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE building_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }
}

/// Escape LIKE metacharacters so user input matches literally.
pub(crate) fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_neutralizes_wildcards() {
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("plain"), "plain");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
