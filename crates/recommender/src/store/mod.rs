//! Read interfaces the engine consumes
//!
//! The engine never writes. Implementations:
//! - [`InMemoryStore`]: snapshot built from plain values, used in tests
//! - [`SeaOrmStore`]: database-backed, over `alumnet_common::Repository`

mod database;
mod memory;

pub use self::database::SeaOrmStore;
pub use self::memory::InMemoryStore;

#[cfg(test)]
pub(crate) use self::memory::testing;

use crate::types::{EventCandidate, JobCandidate, ProfileFeatures, ProfileId};
use alumnet_common::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Feature snapshot for one profile, `None` when it does not exist
    async fn get_by_id(&self, id: ProfileId) -> Result<Option<ProfileFeatures>>;

    /// Every profile (full scan)
    async fn get_all(&self) -> Result<Vec<ProfileFeatures>>;

    async fn exists_by_id(&self, id: ProfileId) -> Result<bool>;

    /// Snapshots for a set of ids; unknown ids are skipped
    async fn get_many(&self, ids: &[ProfileId]) -> Result<Vec<ProfileFeatures>> {
        let mut profiles = Vec::with_capacity(ids.len());
        for &id in ids {
            if let Some(profile) = self.get_by_id(id).await? {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }
}

#[async_trait]
pub trait EventStore: Send + Sync {
    /// Active events starting after `now`
    async fn find_upcoming_active(&self, now: DateTime<Utc>) -> Result<Vec<EventCandidate>>;
}

#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs with no expiry or an expiry after `now`
    async fn find_active(&self, now: DateTime<Utc>) -> Result<Vec<JobCandidate>>;
}

#[async_trait]
pub trait FollowGraphStore: Send + Sync {
    async fn exists_edge(&self, follower_id: ProfileId, followed_id: ProfileId) -> Result<bool>;

    /// One page of ids followed by `follower_id`, in a stable order.
    ///
    /// A page shorter than `page_size` marks the end of the edge list.
    async fn page_of_followed_ids(
        &self,
        follower_id: ProfileId,
        page_index: u64,
        page_size: u64,
    ) -> Result<Vec<ProfileId>>;
}

/// Everything the engine needs from storage
pub trait RecommendationStore: ProfileStore + EventStore + JobStore + FollowGraphStore {}

impl<T> RecommendationStore for T where T: ProfileStore + EventStore + JobStore + FollowGraphStore {}
