//! Job recommendations
//!
//! Ranks active jobs for a requester:
//! - IDF-weighted skill cosine against the active job corpus
//! - location affinity, company affinity through followed profiles
//! - freshness decay and experience level match
//!
//! The weighted sum is boosted when the requester follows the poster.

use crate::cancellation::CancellationToken;
use crate::clock::Clock;
use crate::errors::{RecommendError, Result};
use crate::idf::{IdfCache, IdfTable};
use crate::similarity::cosine_tfidf;
use crate::store::{JobStore, ProfileStore};
use crate::types::{
    sorted_skills, JobCandidate, ProfileFeatures, ProfileId, RankedResult, RecommendedJob,
};
use crate::weights::{JobWeights, ScoringWeights};
use chrono::{DateTime, Datelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

const COMPANY_MATCH: f64 = 1.0;
const COMPANY_NO_MATCH: f64 = 0.3;

const SENIOR_KEYWORDS: &[&str] = &["senior", "lead", "principal", "manager", "director"];
const JUNIOR_KEYWORDS: &[&str] = &["junior", "entry", "intern", "trainee", "fresh"];

/// Coarse seniority bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperienceLevel {
    Junior,
    Mid,
    Senior,
}

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

impl ExperienceLevel {
    /// Level implied by a job title
    pub fn of_title(title: &str) -> Self {
        let title = title.to_lowercase();
        if mentions_any(&title, SENIOR_KEYWORDS) {
            ExperienceLevel::Senior
        } else if mentions_any(&title, JUNIOR_KEYWORDS) {
            ExperienceLevel::Junior
        } else {
            ExperienceLevel::Mid
        }
    }

    /// Level implied by a profile's position text and graduation year
    pub fn of_profile(
        position: Option<&str>,
        batch_year: i32,
        current_year: i32,
        recent_graduate_years: i32,
    ) -> Self {
        let position = position.map(str::to_lowercase).unwrap_or_default();
        if mentions_any(&position, SENIOR_KEYWORDS) {
            ExperienceLevel::Senior
        } else if mentions_any(&position, JUNIOR_KEYWORDS)
            || batch_year >= current_year - recent_graduate_years
        {
            ExperienceLevel::Junior
        } else {
            ExperienceLevel::Mid
        }
    }
}

/// Per-job factor breakdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobScore {
    pub skill: f64,
    pub location: f64,
    pub company: f64,
    pub freshness: f64,
    pub experience: f64,
    /// Weighted sum before the connection boost
    pub base: f64,
    pub connection_boost: f64,
    pub total: f64,
}

/// Requester-side inputs shared by every job in one request
pub struct JobContext<'a> {
    pub requester: &'a ProfileFeatures,
    /// Profiles the requester follows
    pub followed: &'a [ProfileFeatures],
    pub idf: &'a IdfTable,
    pub now: DateTime<Utc>,
}

pub fn score_job(ctx: &JobContext<'_>, job: &JobCandidate, weights: &ScoringWeights) -> JobScore {
    let w = &weights.job;

    let skill = cosine_tfidf(&ctx.requester.skills, &job.required_skills, ctx.idf);
    let location = location_score(ctx.requester.address.as_deref(), job.location.as_deref(), w);
    let company = company_score(ctx.followed, &job.company_name);
    let freshness = w
        .freshness_steps
        .score(job.posted_at.map(|posted| (ctx.now - posted).num_days()));
    let experience = experience_score(ctx.requester, &job.title, ctx.now.year(), w);

    let base = w.skill * skill
        + w.location * location
        + w.company * company
        + w.freshness * freshness
        + w.experience * experience;

    let connection_boost = match job.posted_by {
        Some(poster) if ctx.requester.follows(poster) => w.connection_boost,
        _ => 0.0,
    };

    JobScore {
        skill,
        location,
        company,
        freshness,
        experience,
        base,
        connection_boost,
        total: weights.clamp_score(base * (1.0 + connection_boost)),
    }
}

/// Affinity between the requester's address and the job location
pub fn location_score(user: Option<&str>, job: Option<&str>, weights: &JobWeights) -> f64 {
    let scores = &weights.location_scores;

    let (Some(user), Some(job)) = (user, job) else {
        return scores.missing;
    };
    let user = user.trim().to_lowercase();
    let job = job.trim().to_lowercase();
    if user.is_empty() || job.is_empty() {
        return scores.missing;
    }

    if user.contains(&job) || job.contains(&user) {
        return scores.substring;
    }

    if user.contains("remote") && job.contains("remote") {
        return scores.both_remote;
    }

    let shares_common = weights
        .common_locations
        .iter()
        .any(|place| user.contains(place.as_str()) && job.contains(place.as_str()));
    if shares_common {
        return scores.shared_common;
    }

    scores.unrelated
}

/// 1.0 when a followed profile's position mentions the company
pub fn company_score(followed: &[ProfileFeatures], company: &str) -> f64 {
    let company = company.trim().to_lowercase();
    if company.is_empty() {
        return COMPANY_NO_MATCH;
    }

    let connected = followed.iter().any(|profile| {
        profile
            .current_position
            .as_deref()
            .is_some_and(|position| position.to_lowercase().contains(&company))
    });

    if connected {
        COMPANY_MATCH
    } else {
        COMPANY_NO_MATCH
    }
}

fn experience_score(
    requester: &ProfileFeatures,
    title: &str,
    current_year: i32,
    weights: &JobWeights,
) -> f64 {
    let scores = &weights.experience_scores;
    let job_level = ExperienceLevel::of_title(title);
    let user_level = ExperienceLevel::of_profile(
        requester.current_position.as_deref(),
        requester.batch_year,
        current_year,
        scores.recent_graduate_years,
    );

    match (user_level, job_level) {
        (user, job) if user == job => scores.exact,
        (ExperienceLevel::Senior, ExperienceLevel::Mid) => scores.senior_for_mid,
        (ExperienceLevel::Mid, ExperienceLevel::Junior) => scores.mid_for_junior,
        _ => scores.mismatch,
    }
}

/// Job ranking pipeline
pub struct JobRecommender {
    profiles: Arc<dyn ProfileStore>,
    jobs: Arc<dyn JobStore>,
    clock: Arc<dyn Clock>,
    weights: ScoringWeights,
    idf_cache: Option<IdfCache>,
}

impl JobRecommender {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        jobs: Arc<dyn JobStore>,
        clock: Arc<dyn Clock>,
        weights: ScoringWeights,
    ) -> Self {
        Self {
            profiles,
            jobs,
            clock,
            weights,
            idf_cache: None,
        }
    }

    /// Reuse IDF tables across requests for `cache`'s window
    pub fn with_idf_cache(mut self, cache: IdfCache) -> Self {
        self.idf_cache = Some(cache);
        self
    }

    async fn idf_table(&self, jobs: &[JobCandidate]) -> Arc<IdfTable> {
        match &self.idf_cache {
            Some(cache) => cache.get_or_build(jobs).await,
            None => Arc::new(IdfTable::from_jobs(jobs)),
        }
    }

    /// Top `limit` active jobs by descending score
    #[tracing::instrument(skip(self, cancel))]
    pub async fn recommend(
        &self,
        profile_id: ProfileId,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedResult<RecommendedJob>>> {
        debug!("Recommending jobs");
        cancel.ensure_active()?;

        let requester = self
            .profiles
            .get_by_id(profile_id)
            .await?
            .ok_or_else(|| RecommendError::profile_not_found(profile_id))?;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let candidates = self.jobs.find_active(now).await?;
        let idf = self.idf_table(&candidates).await;

        let mut followed_ids: Vec<ProfileId> = requester.following.iter().copied().collect();
        followed_ids.sort_unstable();
        let followed = self.profiles.get_many(&followed_ids).await?;

        let ctx = JobContext {
            requester: &requester,
            followed: &followed,
            idf: &idf,
            now,
        };

        let mut scored: Vec<(JobScore, JobCandidate)> = Vec::with_capacity(candidates.len());
        for job in candidates {
            if cancel.is_cancelled() {
                warn!("Job recommendation cancelled");
                return Err(RecommendError::Cancelled);
            }

            let score = score_job(&ctx, &job, &self.weights);
            trace!(job_id = job.id, ?score, "Scored job");
            scored.push((score, job));
        }

        scored.sort_by(|(a, _), (b, _)| b.total.total_cmp(&a.total));
        scored.truncate(limit);

        let results: Vec<RankedResult<RecommendedJob>> = scored
            .into_iter()
            .map(|(score, job)| {
                RankedResult::new(
                    RecommendedJob {
                        job_id: job.id,
                        required_skills: sorted_skills(&job.required_skills),
                        title: job.title,
                        company_name: job.company_name,
                        location: job.location,
                    },
                    score.total,
                )
            })
            .collect();

        info!(count = results.len(), idf_terms = idf.len(), "Job recommendations ready");
        Ok(results)
    }
}
