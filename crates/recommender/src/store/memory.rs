//! In-memory store over plain values

use super::{EventStore, FollowGraphStore, JobStore, ProfileStore};
use crate::types::{EventCandidate, JobCandidate, ProfileFeatures, ProfileId};
use alumnet_common::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Immutable snapshot of profiles, events, jobs and follow edges.
///
/// Follow sets on returned profiles are derived from the edge list, so
/// profiles can be registered without them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    profiles: BTreeMap<ProfileId, ProfileFeatures>,
    events: Vec<EventCandidate>,
    jobs: Vec<JobCandidate>,
    /// follower → followed, sorted for stable paging
    edges: BTreeMap<ProfileId, BTreeSet<ProfileId>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: ProfileFeatures) -> Self {
        self.profiles.insert(profile.id, profile);
        self
    }

    pub fn with_event(mut self, event: EventCandidate) -> Self {
        self.events.push(event);
        self
    }

    pub fn with_job(mut self, job: JobCandidate) -> Self {
        self.jobs.push(job);
        self
    }

    /// Add a directed edge `follower → followed`
    pub fn with_follow(mut self, follower: ProfileId, followed: ProfileId) -> Self {
        self.edges.entry(follower).or_default().insert(followed);
        self
    }

    fn following_of(&self, id: ProfileId) -> HashSet<ProfileId> {
        self.edges
            .get(&id)
            .map(|followed| followed.iter().copied().collect())
            .unwrap_or_default()
    }

    fn followers_of(&self, id: ProfileId) -> HashSet<ProfileId> {
        self.edges
            .iter()
            .filter(|(_, followed)| followed.contains(&id))
            .map(|(&follower, _)| follower)
            .collect()
    }

    fn snapshot(&self, profile: &ProfileFeatures) -> ProfileFeatures {
        let mut snapshot = profile.clone();
        snapshot.following = self.following_of(profile.id);
        snapshot.followers = self.followers_of(profile.id);
        snapshot
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_by_id(&self, id: ProfileId) -> Result<Option<ProfileFeatures>> {
        Ok(self.profiles.get(&id).map(|profile| self.snapshot(profile)))
    }

    async fn get_all(&self) -> Result<Vec<ProfileFeatures>> {
        Ok(self.profiles.values().map(|profile| self.snapshot(profile)).collect())
    }

    async fn exists_by_id(&self, id: ProfileId) -> Result<bool> {
        Ok(self.profiles.contains_key(&id))
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn find_upcoming_active(&self, now: DateTime<Utc>) -> Result<Vec<EventCandidate>> {
        let mut upcoming: Vec<EventCandidate> = self
            .events
            .iter()
            .filter(|event| event.start_time > now)
            .cloned()
            .collect();
        upcoming.sort_by_key(|event| event.start_time);
        Ok(upcoming)
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn find_active(&self, now: DateTime<Utc>) -> Result<Vec<JobCandidate>> {
        Ok(self
            .jobs
            .iter()
            .filter(|job| job.is_active_at(now))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl FollowGraphStore for InMemoryStore {
    async fn exists_edge(&self, follower_id: ProfileId, followed_id: ProfileId) -> Result<bool> {
        Ok(self
            .edges
            .get(&follower_id)
            .is_some_and(|followed| followed.contains(&followed_id)))
    }

    async fn page_of_followed_ids(
        &self,
        follower_id: ProfileId,
        page_index: u64,
        page_size: u64,
    ) -> Result<Vec<ProfileId>> {
        let Some(followed) = self.edges.get(&follower_id) else {
            return Ok(Vec::new());
        };

        let skip = page_index.saturating_mul(page_size) as usize;
        Ok(followed
            .iter()
            .copied()
            .skip(skip)
            .take(page_size as usize)
            .collect())
    }
}

/// Store wrappers for fault injection and call accounting
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::cancellation::CancellationToken;
    use alumnet_common::AppError;
    use std::sync::{Mutex, RwLock};

    /// Delegates to an [`InMemoryStore`], recording page fetches and
    /// optionally failing, cancelling or growing the graph along the way.
    #[derive(Default)]
    pub struct ScriptedStore {
        inner: RwLock<InMemoryStore>,
        fail_pages_for: Option<ProfileId>,
        fail_reads: bool,
        cancel_after_pages: Option<(usize, CancellationToken)>,
        follow_after_pages: Option<(usize, ProfileId, ProfileId)>,
        pages: Mutex<Vec<(ProfileId, u64)>>,
    }

    impl ScriptedStore {
        pub fn new(inner: InMemoryStore) -> Self {
            Self {
                inner: RwLock::new(inner),
                ..Self::default()
            }
        }

        /// Page fetches for `follower` fail with a timeout
        pub fn failing_pages_for(mut self, follower: ProfileId) -> Self {
            self.fail_pages_for = Some(follower);
            self
        }

        /// Profile, event and job reads fail
        pub fn failing_reads(mut self) -> Self {
            self.fail_reads = true;
            self
        }

        /// Cancel `token` once `pages` page fetches have completed
        pub fn cancelling_after(mut self, pages: usize, token: CancellationToken) -> Self {
            self.cancel_after_pages = Some((pages, token));
            self
        }

        /// Insert the edge `follower → followed` once `pages` page fetches have completed
        pub fn following_after(
            mut self,
            pages: usize,
            follower: ProfileId,
            followed: ProfileId,
        ) -> Self {
            self.follow_after_pages = Some((pages, follower, followed));
            self
        }

        pub fn page_requests(&self) -> Vec<(ProfileId, u64)> {
            self.pages.lock().unwrap().clone()
        }

        fn timeout() -> AppError {
            AppError::DatabaseConnection {
                message: "store timeout".into(),
            }
        }

        /// Current contents; cloned so no lock is held across an await
        fn snapshot(&self) -> InMemoryStore {
            self.inner.read().unwrap().clone()
        }

        fn check_reads(&self) -> Result<()> {
            if self.fail_reads {
                return Err(Self::timeout());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ProfileStore for ScriptedStore {
        async fn get_by_id(&self, id: ProfileId) -> Result<Option<ProfileFeatures>> {
            self.check_reads()?;
            self.snapshot().get_by_id(id).await
        }

        async fn get_all(&self) -> Result<Vec<ProfileFeatures>> {
            self.check_reads()?;
            self.snapshot().get_all().await
        }

        async fn exists_by_id(&self, id: ProfileId) -> Result<bool> {
            self.check_reads()?;
            self.snapshot().exists_by_id(id).await
        }
    }

    #[async_trait]
    impl EventStore for ScriptedStore {
        async fn find_upcoming_active(&self, now: DateTime<Utc>) -> Result<Vec<EventCandidate>> {
            self.check_reads()?;
            self.snapshot().find_upcoming_active(now).await
        }
    }

    #[async_trait]
    impl JobStore for ScriptedStore {
        async fn find_active(&self, now: DateTime<Utc>) -> Result<Vec<JobCandidate>> {
            self.check_reads()?;
            self.snapshot().find_active(now).await
        }
    }

    #[async_trait]
    impl FollowGraphStore for ScriptedStore {
        async fn exists_edge(&self, follower_id: ProfileId, followed_id: ProfileId) -> Result<bool> {
            self.snapshot().exists_edge(follower_id, followed_id).await
        }

        async fn page_of_followed_ids(
            &self,
            follower_id: ProfileId,
            page_index: u64,
            page_size: u64,
        ) -> Result<Vec<ProfileId>> {
            if self.fail_pages_for == Some(follower_id) {
                return Err(Self::timeout());
            }

            let page = self
                .snapshot()
                .page_of_followed_ids(follower_id, page_index, page_size)
                .await?;

            let fetched = {
                let mut pages = self.pages.lock().unwrap();
                pages.push((follower_id, page_index));
                pages.len()
            };
            if let Some((after, token)) = &self.cancel_after_pages {
                if fetched >= *after {
                    token.cancel();
                }
            }
            if let Some((after, follower, followed)) = self.follow_after_pages {
                if fetched == after {
                    let mut inner = self.inner.write().unwrap();
                    let store = std::mem::take(&mut *inner);
                    *inner = store.with_follow(follower, followed);
                }
            }

            Ok(page)
        }
    }
}
