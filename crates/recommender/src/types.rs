//! Read snapshots consumed by the engine and the ranked results it returns

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Profile identifier as issued by the profile store
pub type ProfileId = i32;

/// Canonical skill form: trimmed and lower-cased. Blank names are dropped.
pub fn normalize_skill(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Build a normalized skill set
pub fn skill_set<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| normalize_skill(name.as_ref()))
        .collect()
}

/// Sorted copy of a skill set, for stable output
pub(crate) fn sorted_skills(skills: &HashSet<String>) -> Vec<String> {
    let mut sorted: Vec<String> = skills.iter().cloned().collect();
    sorted.sort();
    sorted
}

/// Requester / candidate feature snapshot.
///
/// `following` and `followers` are independent: following B does not imply
/// B follows back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileFeatures {
    pub id: ProfileId,
    pub first_name: String,
    pub last_name: String,
    pub skills: HashSet<String>,
    pub faculty: String,
    pub batch_year: i32,
    pub current_position: Option<String>,
    pub address: Option<String>,
    pub profile_image_url: Option<String>,
    pub following: HashSet<ProfileId>,
    pub followers: HashSet<ProfileId>,
}

impl ProfileFeatures {
    pub fn new(id: ProfileId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_skills<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.skills = skill_set(names);
        self
    }

    pub fn with_faculty(mut self, faculty: impl Into<String>) -> Self {
        self.faculty = faculty.into();
        self
    }

    pub fn with_batch_year(mut self, batch_year: i32) -> Self {
        self.batch_year = batch_year;
        self
    }

    pub fn with_position(mut self, position: impl Into<String>) -> Self {
        self.current_position = Some(position.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = first.into();
        self.last_name = last.into();
        self
    }

    pub fn follows(&self, other: ProfileId) -> bool {
        self.following.contains(&other)
    }

    pub fn is_followed_by(&self, other: ProfileId) -> bool {
        self.followers.contains(&other)
    }
}

/// Where an event happens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLocation {
    pub address: Option<String>,
    pub online_link: Option<String>,
}

/// Event organizer as seen by the scorer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Organizer {
    pub id: ProfileId,
    pub skills: HashSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventCandidate {
    pub id: i32,
    pub name: String,
    pub category: Option<String>,
    pub start_time: DateTime<Utc>,
    pub location: Option<EventLocation>,
    pub organizer: Organizer,
}

impl EventCandidate {
    /// Physical address if present, else the online link, else empty
    pub fn display_location(&self) -> String {
        self.location
            .as_ref()
            .and_then(|loc| loc.address.clone().or_else(|| loc.online_link.clone()))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobCandidate {
    pub id: i32,
    pub title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub required_skills: HashSet<String>,
    pub posted_by: Option<ProfileId>,
}

impl JobCandidate {
    /// Active while unexpired; jobs without an expiry never lapse
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| expires > now)
    }
}

/// A candidate with its final score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult<T> {
    #[serde(flatten)]
    pub item: T,
    pub score: f64,
}

impl<T> RankedResult<T> {
    pub fn new(item: T, score: f64) -> Self {
        Self { item, score }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedEvent {
    pub event_id: i32,
    pub event_name: String,
    pub category: Option<String>,
    pub location: String,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPeer {
    pub profile_id: ProfileId,
    pub first_name: String,
    pub last_name: String,
    pub faculty: String,
    pub skills: Vec<String>,
    pub profile_image_url: Option<String>,
    pub current_position: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedJob {
    pub job_id: i32,
    pub title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub required_skills: Vec<String>,
}
