//! Organization repository.
//!
//! Organizations reference one building, carry any number of phone numbers,
//! and link to activities through an association table. List queries return
//! details with relations attached in a fixed number of batch queries.

use super::DbError;
use super::activities::ActivityRecord;
use super::buildings::{BuildingRecord, escape_like};
use crate::geo;
use sqlx::PgPool;
use std::collections::HashMap;

/// An organization row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganizationRecord {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
}

/// A phone number attached to an organization.
#[derive(Debug, Clone)]
pub struct PhoneRecord {
    pub id: i64,
    pub phone_number: String,
}

/// An organization with building, phones, and activities attached.
#[derive(Debug, Clone)]
pub struct OrganizationDetail {
    pub id: i64,
    pub name: String,
    pub building_id: i64,
    pub building: Option<BuildingRecord>,
    pub phones: Vec<PhoneRecord>,
    pub activities: Vec<ActivityRecord>,
}

/// Input for creating an organization.
#[derive(Debug, Clone)]
pub struct NewOrganization {
    pub name: String,
    pub building_id: i64,
    pub phone_numbers: Vec<String>,
    pub activity_ids: Vec<i64>,
}

/// Partial update of an organization. `None` fields are left untouched;
/// `Some` phone/activity lists replace the existing sets wholesale.
#[derive(Debug, Clone, Default)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub building_id: Option<i64>,
    pub phone_numbers: Option<Vec<String>>,
    pub activity_ids: Option<Vec<i64>>,
}

/// Repository for organization operations.
pub struct OrganizationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrganizationRepository<'a> {
    /// Create a new organization repository.
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find organization by id with relations attached.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<OrganizationDetail>, DbError> {
        let row = sqlx::query_as::<_, OrganizationRecord>(
            r#"
            SELECT id, name, building_id
            FROM organizations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(record) => {
                let mut details = self.attach_relations(vec![record]).await?;
                Ok(details.pop())
            }
            None => Ok(None),
        }
    }

    /// List organizations ordered by id.
    pub async fn list_all(
        &self,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationDetail>, DbError> {
        let rows = sqlx::query_as::<_, OrganizationRecord>(
            r#"
            SELECT id, name, building_id
            FROM organizations
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_relations(rows).await
    }

    /// Organizations housed in a building.
    pub async fn by_building(
        &self,
        building_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationDetail>, DbError> {
        let rows = sqlx::query_as::<_, OrganizationRecord>(
            r#"
            SELECT id, name, building_id
            FROM organizations
            WHERE building_id = $1
            ORDER BY id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(building_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_relations(rows).await
    }

    /// Organizations linked to any of the given activities.
    pub async fn by_activities(
        &self,
        activity_ids: &[i64],
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationDetail>, DbError> {
        let rows = sqlx::query_as::<_, OrganizationRecord>(
            r#"
            SELECT DISTINCT o.id, o.name, o.building_id
            FROM organizations o
            JOIN organization_activities oa ON oa.organization_id = o.id
            WHERE oa.activity_id = ANY($1)
            ORDER BY o.id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(activity_ids)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_relations(rows).await
    }

    /// Case-insensitive substring search over organization names.
    pub async fn search_by_name(
        &self,
        query: &str,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationDetail>, DbError> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query_as::<_, OrganizationRecord>(
            r#"
            SELECT id, name, building_id
            FROM organizations
            WHERE name ILIKE $1
            ORDER BY id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(pattern)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_relations(rows).await
    }

    /// Organizations within `radius_km` of a point.
    ///
    /// A bounding-box predicate narrows candidates in SQL; the exact
    /// great-circle check runs on the fetched page, so a page may come back
    /// short when box corners fall outside the circle.
    pub async fn geo_radius(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationDetail>, DbError> {
        let (min_lat, max_lat, min_lon, max_lon) = geo::bounding_box(latitude, longitude, radius_km);

        let rows = sqlx::query_as::<_, OrganizationRecord>(
            r#"
            SELECT o.id, o.name, o.building_id
            FROM organizations o
            JOIN buildings b ON b.id = o.building_id
            WHERE b.latitude BETWEEN $1 AND $2
              AND b.longitude BETWEEN $3 AND $4
            ORDER BY o.id
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(min_lat)
        .bind(max_lat)
        .bind(min_lon)
        .bind(max_lon)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        let details = self.attach_relations(rows).await?;
        Ok(details
            .into_iter()
            .filter(|d| {
                d.building.as_ref().is_some_and(|b| {
                    geo::distance_km(latitude, longitude, b.latitude, b.longitude) <= radius_km
                })
            })
            .collect())
    }

    /// Organizations inside a rectangular area.
    pub async fn geo_rectangle(
        &self,
        north_lat: f64,
        south_lat: f64,
        east_lng: f64,
        west_lng: f64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<OrganizationDetail>, DbError> {
        let rows = sqlx::query_as::<_, OrganizationRecord>(
            r#"
            SELECT o.id, o.name, o.building_id
            FROM organizations o
            JOIN buildings b ON b.id = o.building_id
            WHERE b.latitude BETWEEN $1 AND $2
              AND b.longitude BETWEEN $3 AND $4
            ORDER BY o.id
            OFFSET $5 LIMIT $6
            "#,
        )
        .bind(south_lat)
        .bind(north_lat)
        .bind(west_lng)
        .bind(east_lng)
        .bind(offset)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        self.attach_relations(rows).await
    }

    /// Create an organization with phones and activity links, atomically.
    pub async fn create(&self, new: &NewOrganization) -> Result<OrganizationDetail, DbError> {
        let activity_ids = dedup(&new.activity_ids);

        let mut tx = self.pool.begin().await?;

        let building_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM buildings WHERE id = $1)")
                .bind(new.building_id)
                .fetch_one(&mut *tx)
                .await?;
        if !building_exists {
            return Err(DbError::BuildingNotFound(new.building_id));
        }

        let org_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO organizations (name, building_id)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(new.building_id)
        .fetch_one(&mut *tx)
        .await?;

        if !activity_ids.is_empty() {
            let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE id = ANY($1)")
                .bind(&activity_ids)
                .fetch_one(&mut *tx)
                .await?;
            if found != activity_ids.len() as i64 {
                return Err(DbError::ActivitiesNotFound);
            }

            for activity_id in &activity_ids {
                sqlx::query(
                    "INSERT INTO organization_activities (organization_id, activity_id) VALUES ($1, $2)",
                )
                .bind(org_id)
                .bind(activity_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        for phone in &new.phone_numbers {
            sqlx::query(
                "INSERT INTO organization_phones (organization_id, phone_number) VALUES ($1, $2)",
            )
            .bind(org_id)
            .bind(phone)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.find_by_id(org_id)
            .await?
            .ok_or_else(|| DbError::Sqlx(sqlx::Error::RowNotFound))
    }

    /// Apply a partial update. Returns `None` when the id does not exist.
    pub async fn update(
        &self,
        id: i64,
        update: &OrganizationUpdate,
    ) -> Result<Option<OrganizationDetail>, DbError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM organizations WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Ok(None);
        }

        if let Some(building_id) = update.building_id {
            let building_exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM buildings WHERE id = $1)")
                    .bind(building_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if !building_exists {
                return Err(DbError::BuildingNotFound(building_id));
            }
        }

        sqlx::query(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                building_id = COALESCE($3, building_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.building_id)
        .execute(&mut *tx)
        .await?;

        if let Some(ref activity_ids) = update.activity_ids {
            let activity_ids = dedup(activity_ids);

            sqlx::query("DELETE FROM organization_activities WHERE organization_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if !activity_ids.is_empty() {
                let found: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE id = ANY($1)")
                        .bind(&activity_ids)
                        .fetch_one(&mut *tx)
                        .await?;
                if found != activity_ids.len() as i64 {
                    return Err(DbError::ActivitiesNotFound);
                }

                for activity_id in &activity_ids {
                    sqlx::query(
                        "INSERT INTO organization_activities (organization_id, activity_id) VALUES ($1, $2)",
                    )
                    .bind(id)
                    .bind(activity_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        if let Some(ref phone_numbers) = update.phone_numbers {
            sqlx::query("DELETE FROM organization_phones WHERE organization_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            for phone in phone_numbers {
                sqlx::query(
                    "INSERT INTO organization_phones (organization_id, phone_number) VALUES ($1, $2)",
                )
                .bind(id)
                .bind(phone)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.find_by_id(id).await
    }

    /// Delete an organization. Phones and activity links cascade.
    /// Returns `false` when the id does not exist.
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of organizations.
    pub async fn count_all(&self) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organizations")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Number of organizations in a building.
    pub async fn count_by_building(&self, building_id: i64) -> Result<i64, DbError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE building_id = $1")
                .bind(building_id)
                .fetch_one(self.pool)
                .await?;
        Ok(count)
    }

    /// Number of organizations linked to any of the given activities.
    pub async fn count_by_activities(&self, activity_ids: &[i64]) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(DISTINCT organization_id)
            FROM organization_activities
            WHERE activity_id = ANY($1)
            "#,
        )
        .bind(activity_ids)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Number of organizations matching a name search.
    pub async fn count_by_name(&self, query: &str) -> Result<i64, DbError> {
        let pattern = format!("%{}%", escape_like(query));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organizations WHERE name ILIKE $1")
            .bind(pattern)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Attach buildings, phones, and activities to a page of organizations
    /// using one batch query per relation.
    async fn attach_relations(
        &self,
        records: Vec<OrganizationRecord>,
    ) -> Result<Vec<OrganizationDetail>, DbError> {
        if records.is_empty() {
            return Ok(Vec::new());
        }

        let org_ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let building_ids: Vec<i64> = {
            let mut ids: Vec<i64> = records.iter().map(|r| r.building_id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids
        };

        let buildings = sqlx::query_as::<_, BuildingRecord>(
            r#"
            SELECT id, address, latitude, longitude
            FROM buildings
            WHERE id = ANY($1)
            "#,
        )
        .bind(&building_ids)
        .fetch_all(self.pool)
        .await?;
        let buildings_by_id: HashMap<i64, BuildingRecord> =
            buildings.into_iter().map(|b| (b.id, b)).collect();

        let phone_rows: Vec<(i64, i64, String)> = sqlx::query_as(
            r#"
            SELECT id, organization_id, phone_number
            FROM organization_phones
            WHERE organization_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(&org_ids)
        .fetch_all(self.pool)
        .await?;
        let mut phones_by_org: HashMap<i64, Vec<PhoneRecord>> = HashMap::new();
        for (id, org_id, phone_number) in phone_rows {
            phones_by_org
                .entry(org_id)
                .or_default()
                .push(PhoneRecord { id, phone_number });
        }

        let activity_rows: Vec<(i64, i64, String, Option<i64>, i32)> = sqlx::query_as(
            r#"
            SELECT oa.organization_id, a.id, a.name, a.parent_id, a.level
            FROM organization_activities oa
            JOIN activities a ON a.id = oa.activity_id
            WHERE oa.organization_id = ANY($1)
            ORDER BY a.level, a.name
            "#,
        )
        .bind(&org_ids)
        .fetch_all(self.pool)
        .await?;
        let mut activities_by_org: HashMap<i64, Vec<ActivityRecord>> = HashMap::new();
        for (org_id, id, name, parent_id, level) in activity_rows {
            activities_by_org.entry(org_id).or_default().push(ActivityRecord {
                id,
                name,
                parent_id,
                level,
            });
        }

        Ok(records
            .into_iter()
            .map(|record| OrganizationDetail {
                id: record.id,
                name: record.name,
                building_id: record.building_id,
                building: buildings_by_id.get(&record.building_id).cloned(),
                phones: phones_by_org.remove(&record.id).unwrap_or_default(),
                activities: activities_by_org.remove(&record.id).unwrap_or_default(),
            })
            .collect())
    }
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_sorts_and_removes_duplicates() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![1, 2, 3]);
        assert!(dedup(&[]).is_empty());
    }
}
