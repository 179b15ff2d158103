//! Scoring weights for the three recommenders
//!
//! Every factor weight, the score floor, the connection boost and the job
//! step-function constants live here. Recommenders receive a copy at
//! construction; the gateway loads overrides from `recommendation.weights`.

use serde::{Deserialize, Serialize};

/// Top-level weight configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Minimum score given to any ranked candidate
    pub score_floor: f64,
    pub event: EventWeights,
    pub peer: PeerWeights,
    pub job: JobWeights,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            score_floor: 0.05,
            event: EventWeights::default(),
            peer: PeerWeights::default(),
            job: JobWeights::default(),
        }
    }
}

impl ScoringWeights {
    /// Floor a raw weighted sum and cap it at 1.0
    pub fn clamp_score(&self, raw: f64) -> f64 {
        if raw.is_nan() {
            return self.score_floor;
        }
        raw.max(self.score_floor).min(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventWeights {
    pub skill: f64,
    pub category: f64,
    pub connection: f64,
    pub time: f64,
}

impl Default for EventWeights {
    fn default() -> Self {
        Self {
            skill: 0.5,
            category: 0.2,
            connection: 0.2,
            time: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerWeights {
    pub skill: f64,
    pub faculty: f64,
    pub batch: f64,
    pub connection: f64,
}

impl Default for PeerWeights {
    fn default() -> Self {
        Self {
            skill: 0.5,
            faculty: 0.2,
            batch: 0.2,
            connection: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobWeights {
    pub skill: f64,
    pub location: f64,
    pub company: f64,
    pub freshness: f64,
    pub experience: f64,
    /// Multiplier applied as `base * (1 + boost)` when the requester follows the poster
    pub connection_boost: f64,
    pub location_scores: LocationScores,
    pub freshness_steps: FreshnessSteps,
    pub experience_scores: ExperienceScores,
    /// Common location vocabulary used for the partial location match
    pub common_locations: Vec<String>,
}

impl Default for JobWeights {
    fn default() -> Self {
        Self {
            skill: 0.5,
            location: 0.2,
            company: 0.15,
            freshness: 0.1,
            experience: 0.05,
            connection_boost: 0.2,
            location_scores: LocationScores::default(),
            freshness_steps: FreshnessSteps::default(),
            experience_scores: ExperienceScores::default(),
            common_locations: ["remote", "kathmandu", "pokhara", "lalitpur", "bhaktapur"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationScores {
    pub substring: f64,
    pub both_remote: f64,
    pub shared_common: f64,
    pub missing: f64,
    pub unrelated: f64,
}

impl Default for LocationScores {
    fn default() -> Self {
        Self {
            substring: 1.0,
            both_remote: 0.9,
            shared_common: 0.7,
            missing: 0.3,
            unrelated: 0.2,
        }
    }
}

/// Job age step function: `(max_age_days, score)` pairs checked in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreshnessSteps {
    pub steps: Vec<(i64, f64)>,
    /// Older than every step
    pub stale: f64,
    /// No posted-at timestamp
    pub unknown: f64,
}

impl Default for FreshnessSteps {
    fn default() -> Self {
        Self {
            steps: vec![(1, 1.0), (7, 0.8), (30, 0.6), (90, 0.4)],
            stale: 0.2,
            unknown: 0.5,
        }
    }
}

impl FreshnessSteps {
    pub fn score(&self, age_days: Option<i64>) -> f64 {
        let Some(age) = age_days else {
            return self.unknown;
        };

        self.steps
            .iter()
            .find(|(max_age, _)| age <= *max_age)
            .map(|(_, score)| *score)
            .unwrap_or(self.stale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceScores {
    pub exact: f64,
    pub senior_for_mid: f64,
    pub mid_for_junior: f64,
    pub mismatch: f64,
    /// Batch years within this many years of now count as junior
    pub recent_graduate_years: i32,
}

impl Default for ExperienceScores {
    fn default() -> Self {
        Self {
            exact: 1.0,
            senior_for_mid: 0.8,
            mid_for_junior: 0.6,
            mismatch: 0.3,
            recent_graduate_years: 2,
        }
    }
}
