//! Activity repository.
//!
//! Activities form a classification tree capped at three levels. Levels are
//! derived from the parent chain and kept consistent on re-parenting.

use super::DbError;
use sqlx::PgPool;
use std::collections::HashMap;

/// Maximum depth of the activity tree.
pub const MAX_ACTIVITY_DEPTH: i32 = 3;

/// An activity row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ActivityRecord {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub level: i32,
}

/// An activity with its nested children.
#[derive(Debug, Clone)]
pub struct ActivityNode {
    pub record: ActivityRecord,
    pub children: Vec<ActivityNode>,
}

/// Repository for activity operations.
pub struct ActivityRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ActivityRepository<'a> {
    /// Create a new activity repository.
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Find activity by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<ActivityRecord>, DbError> {
        let row = sqlx::query_as::<_, ActivityRecord>(
            r#"
            SELECT id, name, parent_id, level
            FROM activities
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// Find activity by id with children attached.
    pub async fn find_node(&self, id: i64) -> Result<Option<ActivityNode>, DbError> {
        let forest = self.load_forest().await?;
        Ok(forest.node(id))
    }

    /// List activities with children attached.
    ///
    /// With `parent_id` set, returns that parent's children; otherwise with
    /// `level` set, returns the nodes at that level; otherwise the roots.
    pub async fn list(
        &self,
        parent_id: Option<i64>,
        level: Option<i32>,
    ) -> Result<Vec<ActivityNode>, DbError> {
        let forest = self.load_forest().await?;

        let mut selected: Vec<ActivityNode> = if let Some(parent_id) = parent_id {
            forest
                .records
                .iter()
                .filter(|r| r.parent_id == Some(parent_id))
                .filter_map(|r| forest.node(r.id))
                .collect()
        } else if let Some(level) = level {
            forest
                .records
                .iter()
                .filter(|r| r.level == level)
                .filter_map(|r| forest.node(r.id))
                .collect()
        } else {
            forest.roots()
        };

        selected.sort_by(|a, b| {
            (a.record.level, a.record.name.as_str()).cmp(&(b.record.level, b.record.name.as_str()))
        });
        Ok(selected)
    }

    /// Full activity tree: roots with nested children, ordered by name.
    pub async fn tree(&self) -> Result<Vec<ActivityNode>, DbError> {
        let forest = self.load_forest().await?;
        Ok(forest.roots())
    }

    /// Create a new activity under an optional parent.
    pub async fn create(&self, name: &str, parent_id: Option<i64>) -> Result<ActivityRecord, DbError> {
        let level = match parent_id {
            Some(pid) => {
                let parent = self
                    .find_by_id(pid)
                    .await?
                    .ok_or(DbError::ParentActivityNotFound(pid))?;
                if parent.level >= MAX_ACTIVITY_DEPTH {
                    return Err(DbError::ActivityDepthExceeded);
                }
                parent.level + 1
            }
            None => 1,
        };

        if self.sibling_name_taken(name, parent_id, None).await? {
            return Err(DbError::ActivityNameTaken(name.to_string()));
        }

        let row = sqlx::query_as::<_, ActivityRecord>(
            r#"
            INSERT INTO activities (name, parent_id, level)
            VALUES ($1, $2, $3)
            RETURNING id, name, parent_id, level
            "#,
        )
        .bind(name)
        .bind(parent_id)
        .bind(level)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Update name and parent of an activity, re-leveling its subtree.
    ///
    /// Returns `None` when the id does not exist. Re-parenting is refused when
    /// it would create a cycle or push any descendant past the depth cap.
    pub async fn update(
        &self,
        id: i64,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Option<ActivityRecord>, DbError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(None);
        }

        let level = match parent_id {
            Some(pid) => {
                if self.is_in_subtree(id, pid).await? {
                    return Err(DbError::ActivityCycle);
                }
                let parent = self
                    .find_by_id(pid)
                    .await?
                    .ok_or(DbError::ParentActivityNotFound(pid))?;
                if parent.level >= MAX_ACTIVITY_DEPTH {
                    return Err(DbError::ActivityDepthExceeded);
                }
                parent.level + 1
            }
            None => 1,
        };

        if self.sibling_name_taken(name, parent_id, Some(id)).await? {
            return Err(DbError::ActivityNameTaken(name.to_string()));
        }

        // Depth of the deepest descendant relative to the node itself.
        let descendants = self.descendant_depths(id).await?;
        if let Some(max_depth) = descendants.iter().map(|(_, d)| *d).max()
            && level + max_depth > MAX_ACTIVITY_DEPTH
        {
            return Err(DbError::ActivityDepthExceeded);
        }

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ActivityRecord>(
            r#"
            UPDATE activities
            SET name = $2, parent_id = $3, level = $4
            WHERE id = $1
            RETURNING id, name, parent_id, level
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(parent_id)
        .bind(level)
        .fetch_one(&mut *tx)
        .await?;

        for (desc_id, depth) in &descendants {
            sqlx::query("UPDATE activities SET level = $2 WHERE id = $1")
                .bind(desc_id)
                .bind(level + depth)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(row))
    }

    /// Delete an activity. Refused while organizations reference it or
    /// children exist. Returns `false` when the id does not exist.
    pub async fn delete(&self, id: i64) -> Result<bool, DbError> {
        if self.find_by_id(id).await?.is_none() {
            return Ok(false);
        }

        let org_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM organization_activities WHERE activity_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        if org_count > 0 {
            return Err(DbError::ActivityInUse(id));
        }

        let child_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM activities WHERE parent_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        if child_count > 0 {
            return Err(DbError::ActivityHasChildren(id));
        }

        let result = sqlx::query("DELETE FROM activities WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Ids of the activity and all its descendants.
    pub async fn descendant_ids(&self, id: i64) -> Result<Vec<i64>, DbError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id FROM activities WHERE id = $1
                UNION ALL
                SELECT a.id FROM activities a
                JOIN subtree s ON a.parent_id = s.id
            )
            SELECT id FROM subtree
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Descendants of a node with their depth relative to it (1 = direct child).
    async fn descendant_depths(&self, id: i64) -> Result<Vec<(i64, i32)>, DbError> {
        let rows: Vec<(i64, i32)> = sqlx::query_as(
            r#"
            WITH RECURSIVE subtree AS (
                SELECT id, 1 AS depth FROM activities WHERE parent_id = $1
                UNION ALL
                SELECT a.id, s.depth + 1 FROM activities a
                JOIN subtree s ON a.parent_id = s.id
            )
            SELECT id, depth FROM subtree
            "#,
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Whether `candidate` is `root` itself or one of its descendants.
    async fn is_in_subtree(&self, root: i64, candidate: i64) -> Result<bool, DbError> {
        if root == candidate {
            return Ok(true);
        }
        let ids = self.descendant_ids(root).await?;
        Ok(ids.contains(&candidate))
    }

    /// Whether a sibling with this name already exists under the same parent.
    async fn sibling_name_taken(
        &self,
        name: &str,
        parent_id: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<bool, DbError> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM activities
                WHERE name = $1
                  AND parent_id IS NOT DISTINCT FROM $2
                  AND ($3::BIGINT IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(name)
        .bind(parent_id)
        .bind(exclude_id)
        .fetch_one(self.pool)
        .await?;

        Ok(taken)
    }

    /// Load every activity and index parent/child links.
    async fn load_forest(&self) -> Result<Forest, DbError> {
        let records = sqlx::query_as::<_, ActivityRecord>(
            r#"
            SELECT id, name, parent_id, level
            FROM activities
            ORDER BY level, name
            "#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(Forest::new(records))
    }
}

/// In-memory view of the whole activity table, for tree assembly.
///
/// The classification table is small (a directory taxonomy, not user data),
/// so loading it whole replaces the per-row child queries a lazy ORM would
/// issue.
struct Forest {
    records: Vec<ActivityRecord>,
    children_of: HashMap<Option<i64>, Vec<usize>>,
}

impl Forest {
    fn new(records: Vec<ActivityRecord>) -> Self {
        let mut children_of: HashMap<Option<i64>, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            children_of.entry(record.parent_id).or_default().push(idx);
        }
        Self {
            records,
            children_of,
        }
    }

    fn roots(&self) -> Vec<ActivityNode> {
        self.children_of
            .get(&None)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&idx| self.build(idx, MAX_ACTIVITY_DEPTH))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn node(&self, id: i64) -> Option<ActivityNode> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.build(idx, MAX_ACTIVITY_DEPTH))
    }

    fn build(&self, idx: usize, depth_budget: i32) -> ActivityNode {
        let record = self.records[idx].clone();
        let children = if depth_budget > 1 {
            self.children_of
                .get(&Some(record.id))
                .map(|indices| {
                    indices
                        .iter()
                        .map(|&child| self.build(child, depth_budget - 1))
                        .collect()
                })
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        ActivityNode { record, children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str, parent_id: Option<i64>, level: i32) -> ActivityRecord {
        ActivityRecord {
            id,
            name: name.to_string(),
            parent_id,
            level,
        }
    }

    #[test]
    fn forest_assembles_nested_children() {
        let forest = Forest::new(vec![
            record(1, "Food", None, 1),
            record(2, "Vehicles", None, 1),
            record(3, "Dairy products", Some(1), 2),
            record(4, "Cheese", Some(3), 3),
        ]);

        let roots = forest.roots();
        assert_eq!(roots.len(), 2);

        let food = roots.iter().find(|n| n.record.name == "Food").unwrap();
        assert_eq!(food.children.len(), 1);
        assert_eq!(food.children[0].record.name, "Dairy products");
        assert_eq!(food.children[0].children[0].record.name, "Cheese");
    }

    #[test]
    fn forest_node_returns_subtree() {
        let forest = Forest::new(vec![
            record(1, "Food", None, 1),
            record(2, "Dairy products", Some(1), 2),
        ]);

        let node = forest.node(2).unwrap();
        assert_eq!(node.record.name, "Dairy products");
        assert!(node.children.is_empty());

        assert!(forest.node(99).is_none());
    }

    #[test]
    fn forest_depth_budget_caps_recursion() {
        // A malformed chain deeper than the cap must not recurse past it.
        let forest = Forest::new(vec![
            record(1, "a", None, 1),
            record(2, "b", Some(1), 2),
            record(3, "c", Some(2), 3),
            record(4, "d", Some(3), 3),
        ]);

        let roots = forest.roots();
        let deepest = &roots[0].children[0].children[0];
        assert!(deepest.children.is_empty());
    }
}
