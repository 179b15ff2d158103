//! Repository pattern for database reads
//!
//! Read-only queries backing the recommendation engine's stores. Every
//! method goes to the read connection (replica when configured).

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::collections::HashMap;

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    // ========================================================================
    // Profile Operations
    // ========================================================================

    /// Find profile by ID
    pub async fn find_profile_by_id(&self, id: i32) -> Result<Option<Profile>> {
        ProfileEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find every profile whose id is in `ids`
    pub async fn find_profiles_by_ids(&self, ids: &[i32]) -> Result<Vec<Profile>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        ProfileEntity::find()
            .filter(ProfileColumn::Id.is_in(ids.iter().copied()))
            .order_by_asc(ProfileColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Load all profiles (full scan)
    pub async fn list_profiles(&self) -> Result<Vec<Profile>> {
        ProfileEntity::find()
            .order_by_asc(ProfileColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Check whether a profile exists
    pub async fn profile_exists(&self, id: i32) -> Result<bool> {
        let count = ProfileEntity::find_by_id(id)
            .count(self.read_conn())
            .await?;

        Ok(count > 0)
    }

    /// Skill names per profile, for the given profile ids
    pub async fn skill_names_for_profiles(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<String>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, String)> = ProfileSkillEntity::find()
            .select_only()
            .column(ProfileSkillColumn::ProfileId)
            .column(SkillColumn::Name)
            .inner_join(SkillEntity)
            .filter(ProfileSkillColumn::ProfileId.is_in(ids.iter().copied()))
            .into_tuple()
            .all(self.read_conn())
            .await?;

        Ok(group_pairs(rows))
    }

    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// One page of ids followed by `follower_id`, ordered by id so pages are stable
    pub async fn followed_ids_page(
        &self,
        follower_id: i32,
        page: u64,
        page_size: u64,
    ) -> Result<Vec<i32>> {
        FollowEntity::find()
            .select_only()
            .column(FollowColumn::FollowedId)
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .order_by_asc(FollowColumn::FollowedId)
            .offset(page * page_size)
            .limit(page_size)
            .into_tuple::<i32>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// All ids followed by `follower_id`
    pub async fn followed_ids(&self, follower_id: i32) -> Result<Vec<i32>> {
        FollowEntity::find()
            .select_only()
            .column(FollowColumn::FollowedId)
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .into_tuple::<i32>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// All ids following `followed_id`
    pub async fn follower_ids(&self, followed_id: i32) -> Result<Vec<i32>> {
        FollowEntity::find()
            .select_only()
            .column(FollowColumn::FollowerId)
            .filter(FollowColumn::FollowedId.eq(followed_id))
            .into_tuple::<i32>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Every `(follower_id, followed_id)` edge touching any of `ids`
    pub async fn follow_edges_for(&self, ids: &[i32]) -> Result<Vec<(i32, i32)>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        FollowEntity::find()
            .select_only()
            .column(FollowColumn::FollowerId)
            .column(FollowColumn::FollowedId)
            .filter(
                Condition::any()
                    .add(FollowColumn::FollowerId.is_in(ids.iter().copied()))
                    .add(FollowColumn::FollowedId.is_in(ids.iter().copied())),
            )
            .into_tuple::<(i32, i32)>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// The whole follow graph as `(follower_id, followed_id)` pairs
    pub async fn all_follow_edges(&self) -> Result<Vec<(i32, i32)>> {
        FollowEntity::find()
            .select_only()
            .column(FollowColumn::FollowerId)
            .column(FollowColumn::FollowedId)
            .into_tuple::<(i32, i32)>()
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Check for a directed follow edge
    pub async fn follow_exists(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let count = FollowEntity::find()
            .filter(FollowColumn::FollowerId.eq(follower_id))
            .filter(FollowColumn::FollowedId.eq(followed_id))
            .count(self.read_conn())
            .await?;

        Ok(count > 0)
    }

    // ========================================================================
    // Event Operations
    // ========================================================================

    /// Active events starting after `now`, earliest first
    pub async fn find_upcoming_active_events(&self, now: DateTime<Utc>) -> Result<Vec<Event>> {
        EventEntity::find()
            .filter(EventColumn::Active.eq(true))
            .filter(EventColumn::StartTime.gt(now))
            .order_by_asc(EventColumn::StartTime)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Job Operations
    // ========================================================================

    /// Jobs with no expiry or an expiry after `now`
    pub async fn find_active_jobs(&self, now: DateTime<Utc>) -> Result<Vec<Job>> {
        JobEntity::find()
            .filter(
                Condition::any()
                    .add(JobColumn::ExpiresAt.is_null())
                    .add(JobColumn::ExpiresAt.gt(now)),
            )
            .order_by_asc(JobColumn::Id)
            .all(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Required skill names per job, for the given job ids
    pub async fn skill_names_for_jobs(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<String>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, String)> = JobSkillEntity::find()
            .select_only()
            .column(JobSkillColumn::JobId)
            .column(SkillColumn::Name)
            .inner_join(SkillEntity)
            .filter(JobSkillColumn::JobId.is_in(ids.iter().copied()))
            .into_tuple()
            .all(self.read_conn())
            .await?;

        Ok(group_pairs(rows))
    }
}

/// Group `(owner_id, value)` rows by owner
fn group_pairs(rows: Vec<(i32, String)>) -> HashMap<i32, Vec<String>> {
    let mut grouped: HashMap<i32, Vec<String>> = HashMap::new();
    for (owner, value) in rows {
        grouped.entry(owner).or_default().push(value);
    }
    grouped
}
