//! Database-backed store over the shared SeaORM repository

use super::{EventStore, FollowGraphStore, JobStore, ProfileStore};
use crate::types::{
    skill_set, EventCandidate, EventLocation, JobCandidate, Organizer, ProfileFeatures, ProfileId,
};
use alumnet_common::db::models::{Event, Job, Profile};
use alumnet_common::{Repository, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Assembles engine snapshots from relational rows.
///
/// Skill names are normalized here so everything downstream shares one
/// vocabulary. Blank text columns are read as missing.
#[derive(Clone)]
pub struct SeaOrmStore {
    repo: Repository,
}

impl SeaOrmStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Underlying repository (health checks)
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    async fn assemble_profiles(
        &self,
        rows: Vec<Profile>,
        edges: Vec<(i32, i32)>,
    ) -> Result<Vec<ProfileFeatures>> {
        let ids: Vec<i32> = rows.iter().map(|p| p.id).collect();
        let mut skills = self.repo.skill_names_for_profiles(&ids).await?;

        let mut following: HashMap<ProfileId, HashSet<ProfileId>> = HashMap::new();
        let mut followers: HashMap<ProfileId, HashSet<ProfileId>> = HashMap::new();
        for (follower, followed) in edges {
            following.entry(follower).or_default().insert(followed);
            followers.entry(followed).or_default().insert(follower);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                profile_features(
                    row,
                    skills.remove(&id).unwrap_or_default(),
                    following.remove(&id).unwrap_or_default(),
                    followers.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn profile_features(
    row: Profile,
    skills: Vec<String>,
    following: HashSet<ProfileId>,
    followers: HashSet<ProfileId>,
) -> ProfileFeatures {
    ProfileFeatures {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        skills: skill_set(skills),
        faculty: row.faculty,
        batch_year: row.batch_year,
        current_position: non_blank(row.current_position),
        address: non_blank(row.address),
        profile_image_url: row.profile_image_url,
        following,
        followers,
    }
}

fn event_candidate(row: Event, organizer_skills: HashSet<String>) -> EventCandidate {
    let address = non_blank(row.address);
    let online_link = non_blank(row.online_link);
    let location = (address.is_some() || online_link.is_some()).then_some(EventLocation {
        address,
        online_link,
    });

    EventCandidate {
        id: row.id,
        name: row.event_name,
        category: non_blank(row.category),
        start_time: row.start_time,
        location,
        organizer: Organizer {
            id: row.profile_id,
            skills: organizer_skills,
        },
    }
}

fn job_candidate(row: Job, required: Vec<String>) -> JobCandidate {
    JobCandidate {
        id: row.id,
        title: row.title,
        company_name: row.company_name,
        location: non_blank(row.location),
        posted_at: row.posted_at,
        expires_at: row.expires_at,
        required_skills: skill_set(required),
        posted_by: row.posted_by,
    }
}

#[async_trait]
impl ProfileStore for SeaOrmStore {
    async fn get_by_id(&self, id: ProfileId) -> Result<Option<ProfileFeatures>> {
        let Some(row) = self.repo.find_profile_by_id(id).await? else {
            return Ok(None);
        };

        let skills = self
            .repo
            .skill_names_for_profiles(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        let following = self.repo.followed_ids(id).await?.into_iter().collect();
        let followers = self.repo.follower_ids(id).await?.into_iter().collect();

        Ok(Some(profile_features(row, skills, following, followers)))
    }

    async fn get_all(&self) -> Result<Vec<ProfileFeatures>> {
        let rows = self.repo.list_profiles().await?;
        let edges = self.repo.all_follow_edges().await?;
        debug!(profiles = rows.len(), edges = edges.len(), "Loaded profile scan");

        self.assemble_profiles(rows, edges).await
    }

    async fn exists_by_id(&self, id: ProfileId) -> Result<bool> {
        self.repo.profile_exists(id).await
    }

    async fn get_many(&self, ids: &[ProfileId]) -> Result<Vec<ProfileFeatures>> {
        let rows = self.repo.find_profiles_by_ids(ids).await?;
        let edges = self.repo.follow_edges_for(ids).await?;

        self.assemble_profiles(rows, edges).await
    }
}

#[async_trait]
impl EventStore for SeaOrmStore {
    async fn find_upcoming_active(&self, now: DateTime<Utc>) -> Result<Vec<EventCandidate>> {
        let rows = self.repo.find_upcoming_active_events(now).await?;

        let mut organizer_ids: Vec<i32> = rows.iter().map(|e| e.profile_id).collect();
        organizer_ids.sort_unstable();
        organizer_ids.dedup();

        let organizer_skills: HashMap<i32, HashSet<String>> = self
            .repo
            .skill_names_for_profiles(&organizer_ids)
            .await?
            .into_iter()
            .map(|(id, names)| (id, skill_set(names)))
            .collect();

        Ok(rows
            .into_iter()
            .map(|row| {
                let skills = organizer_skills
                    .get(&row.profile_id)
                    .cloned()
                    .unwrap_or_default();
                event_candidate(row, skills)
            })
            .collect())
    }
}

#[async_trait]
impl JobStore for SeaOrmStore {
    async fn find_active(&self, now: DateTime<Utc>) -> Result<Vec<JobCandidate>> {
        let rows = self.repo.find_active_jobs(now).await?;
        let ids: Vec<i32> = rows.iter().map(|j| j.id).collect();
        let mut skills = self.repo.skill_names_for_jobs(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let required = skills.remove(&row.id).unwrap_or_default();
                job_candidate(row, required)
            })
            .collect())
    }
}

#[async_trait]
impl FollowGraphStore for SeaOrmStore {
    async fn exists_edge(&self, follower_id: ProfileId, followed_id: ProfileId) -> Result<bool> {
        self.repo.follow_exists(follower_id, followed_id).await
    }

    async fn page_of_followed_ids(
        &self,
        follower_id: ProfileId,
        page_index: u64,
        page_size: u64,
    ) -> Result<Vec<ProfileId>> {
        self.repo
            .followed_ids_page(follower_id, page_index, page_size)
            .await
    }
}
