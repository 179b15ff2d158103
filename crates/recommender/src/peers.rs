//! Peer (profile) recommendations

use crate::cancellation::CancellationToken;
use crate::errors::{RecommendError, Result};
use crate::similarity::jaccard;
use crate::store::ProfileStore;
use crate::types::{sorted_skills, ProfileFeatures, ProfileId, RankedResult, RecommendedPeer};
use crate::weights::ScoringWeights;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Per-candidate factor breakdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerScore {
    pub skill: f64,
    pub faculty: f64,
    pub batch: f64,
    pub connection: f64,
    pub total: f64,
}

pub fn score_peer(
    requester: &ProfileFeatures,
    candidate: &ProfileFeatures,
    weights: &ScoringWeights,
) -> PeerScore {
    let w = &weights.peer;

    let skill = jaccard(&requester.skills, &candidate.skills);

    let faculty = if same_faculty(&requester.faculty, &candidate.faculty) {
        1.0
    } else {
        0.0
    };

    let year_gap = (requester.batch_year - candidate.batch_year).unsigned_abs();
    let batch = 1.0 / (1.0 + f64::from(year_gap));

    // Either direction counts
    let connection = if requester.follows(candidate.id) || requester.is_followed_by(candidate.id) {
        1.0
    } else {
        0.0
    };

    let raw = w.skill * skill + w.faculty * faculty + w.batch * batch + w.connection * connection;

    PeerScore {
        skill,
        faculty,
        batch,
        connection,
        total: weights.clamp_score(raw),
    }
}

fn same_faculty(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.is_empty() && a.to_lowercase() == b.to_lowercase()
}

/// Peer ranking over the full profile scan
pub struct PeerRecommender {
    profiles: Arc<dyn ProfileStore>,
    weights: ScoringWeights,
}

impl PeerRecommender {
    pub fn new(profiles: Arc<dyn ProfileStore>, weights: ScoringWeights) -> Self {
        Self { profiles, weights }
    }

    /// Top `limit` other profiles by descending score
    #[tracing::instrument(skip(self, cancel))]
    pub async fn recommend(
        &self,
        profile_id: ProfileId,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedResult<RecommendedPeer>>> {
        debug!("Recommending peers");
        cancel.ensure_active()?;

        let requester = self
            .profiles
            .get_by_id(profile_id)
            .await?
            .ok_or_else(|| RecommendError::profile_not_found(profile_id))?;

        if limit == 0 {
            return Ok(Vec::new());
        }

        let candidates = self.profiles.get_all().await?;

        let mut scored: Vec<(PeerScore, ProfileFeatures)> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if cancel.is_cancelled() {
                warn!("Peer recommendation cancelled");
                return Err(RecommendError::Cancelled);
            }

            // Self is excluded by identity, never by score
            if candidate.id == requester.id {
                continue;
            }

            let score = score_peer(&requester, &candidate, &self.weights);
            trace!(candidate_id = candidate.id, ?score, "Scored peer");
            if score.total > 0.0 {
                scored.push((score, candidate));
            }
        }

        scored.sort_by(|(a, _), (b, _)| b.total.total_cmp(&a.total));
        scored.truncate(limit);

        let results: Vec<RankedResult<RecommendedPeer>> = scored
            .into_iter()
            .map(|(score, peer)| {
                RankedResult::new(
                    RecommendedPeer {
                        profile_id: peer.id,
                        skills: sorted_skills(&peer.skills),
                        first_name: peer.first_name,
                        last_name: peer.last_name,
                        faculty: peer.faculty,
                        profile_image_url: peer.profile_image_url,
                        current_position: peer.current_position,
                    },
                    score.total,
                )
            })
            .collect();

        info!(count = results.len(), "Peer recommendations ready");
        Ok(results)
    }
}
