//! Event recommendations
//!
//! Ranks upcoming active events for a requester on four signals:
//! organizer skill overlap, category match, whether the requester follows
//! the organizer, and time until start.

use crate::cancellation::CancellationToken;
use crate::clock::Clock;
use crate::errors::{RecommendError, Result};
use crate::similarity::jaccard;
use crate::store::{EventStore, ProfileStore};
use crate::types::{
    normalize_skill, EventCandidate, ProfileFeatures, ProfileId, RankedResult, RecommendedEvent,
};
use crate::weights::ScoringWeights;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Per-event factor breakdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventScore {
    pub skill: f64,
    pub category: f64,
    pub connection: f64,
    pub time: f64,
    pub total: f64,
}

/// Score one event for `requester` at instant `now`
pub fn score_event(
    requester: &ProfileFeatures,
    event: &EventCandidate,
    now: DateTime<Utc>,
    weights: &ScoringWeights,
) -> EventScore {
    let w = &weights.event;

    let skill = jaccard(&requester.skills, &event.organizer.skills);

    // Categories are compared against the skill vocabulary
    let category = match event.category.as_deref().and_then(normalize_skill) {
        Some(category) if requester.skills.contains(&category) => 1.0,
        _ => 0.0,
    };

    let connection = if requester.follows(event.organizer.id) {
        1.0
    } else {
        0.0
    };

    let time = time_until_start_score(event.start_time, now);

    let raw = w.skill * skill + w.category * category + w.connection * connection + w.time * time;

    EventScore {
        skill,
        category,
        connection,
        time,
        total: weights.clamp_score(raw),
    }
}

/// `1 / (1 + hours)` for events still ahead, 0.0 once started
fn time_until_start_score(start: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let hours = (start - now).num_hours();
    if hours > 0 {
        1.0 / (1.0 + hours as f64)
    } else {
        0.0
    }
}

/// Event ranking pipeline
pub struct EventRecommender {
    profiles: Arc<dyn ProfileStore>,
    events: Arc<dyn EventStore>,
    clock: Arc<dyn Clock>,
    weights: ScoringWeights,
}

impl EventRecommender {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        events: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
        weights: ScoringWeights,
    ) -> Self {
        Self {
            profiles,
            events,
            clock,
            weights,
        }
    }

    /// Top `limit` upcoming events, best first; ties go to the earlier start
    #[tracing::instrument(skip(self, cancel))]
    pub async fn recommend(
        &self,
        profile_id: ProfileId,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedResult<RecommendedEvent>>> {
        debug!("Recommending events");
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
        let candidates = self.events.find_upcoming_active(now).await?;

        let mut scored: Vec<(EventScore, EventCandidate)> = Vec::with_capacity(candidates.len());
        for event in candidates {
            if cancel.is_cancelled() {
                warn!("Event recommendation cancelled");
                return Err(RecommendError::Cancelled);
            }

            let score = score_event(&requester, &event, now, &self.weights);
            trace!(event_id = event.id, ?score, "Scored event");
            scored.push((score, event));
        }

        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .total
                .total_cmp(&a_score.total)
                .then_with(|| a.start_time.cmp(&b.start_time))
        });
        scored.truncate(limit);

        let results: Vec<RankedResult<RecommendedEvent>> = scored
            .into_iter()
            .map(|(score, event)| {
                let location = event.display_location();
                RankedResult::new(
                    RecommendedEvent {
                        event_id: event.id,
                        event_name: event.name,
                        category: event.category,
                        location,
                        start_time: event.start_time,
                    },
                    score.total,
                )
            })
            .collect();

        info!(count = results.len(), "Event recommendations ready");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::testing::ScriptedStore;
    use crate::store::InMemoryStore;
    use crate::types::{skill_set, EventLocation, Organizer};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, 1, 12, 0, 0).unwrap()
    }

    fn event(id: i32, organizer: ProfileId, skills: &[&str], hours_ahead: i64) -> EventCandidate {
        EventCandidate {
            id,
            name: format!("Event {id}"),
            category: None,
            start_time: now() + Duration::hours(hours_ahead),
            location: None,
            organizer: Organizer {
                id: organizer,
                skills: skill_set(skills.iter().copied()),
            },
        }
    }

    fn recommender<S>(store: S) -> EventRecommender
    where
        S: ProfileStore + EventStore + 'static,
    {
        let store = Arc::new(store);
        EventRecommender::new(
            store.clone(),
            store,
            Arc::new(FixedClock(now())),
            ScoringWeights::default(),
        )
    }

    #[test]
    fn test_scenario_skill_and_category() {
        let requester = ProfileFeatures::new(1).with_skills(["go", "rust"]);
        let mut candidate = event(10, 2, &["go", "python"], 48);
        candidate.category = Some("go".into());

        let score = score_event(&requester, &candidate, now(), &ScoringWeights::default());

        assert_eq!(score.category, 1.0);
        assert!((score.skill - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(score.connection, 0.0);
        assert!((score.time - 1.0 / 49.0).abs() < 1e-9);
        let expected = 0.5 / 3.0 + 0.2 + 0.1 / 49.0;
        assert!((score.total - expected).abs() < 1e-9);
    }

    #[test]
    fn test_category_matches_skill_vocabulary_quirk() {
        // Known quirk: category strings are matched against skill names,
        // so a "Networking" event only matches a requester with that skill.
        let requester = ProfileFeatures::new(1).with_skills(["networking"]);
        let mut candidate = event(10, 2, &[], 5);
        candidate.category = Some("  NETWORKING ".into());

        let score = score_event(&requester, &candidate, now(), &ScoringWeights::default());
        assert_eq!(score.category, 1.0);

        let plain = ProfileFeatures::new(1).with_skills(["rust"]);
        let score = score_event(&plain, &candidate, now(), &ScoringWeights::default());
        assert_eq!(score.category, 0.0);
    }

    #[test]
    fn test_started_event_scores_zero_time_and_floor() {
        let requester = ProfileFeatures::new(1);
        let started = event(10, 2, &[], -1);

        let score = score_event(&requester, &started, now(), &ScoringWeights::default());
        assert_eq!(score.time, 0.0);
        assert_eq!(score.total, 0.05);
    }

    #[tokio::test]
    async fn test_ties_break_on_earlier_start() {
        // Zero time weight so both "go" events tie exactly
        let mut weights = ScoringWeights::default();
        weights.event.time = 0.0;

        let store = Arc::new(
            InMemoryStore::new()
                .with_profile(ProfileFeatures::new(1).with_skills(["go"]))
                .with_profile(ProfileFeatures::new(2))
                .with_event(event(20, 2, &["go"], 300))
                .with_event(event(21, 2, &["go"], 30))
                .with_event(event(22, 2, &["java"], 10)),
        );
        let rec = EventRecommender::new(
            store.clone(),
            store,
            Arc::new(FixedClock(now())),
            weights,
        );

        let results = rec.recommend(1, 10, &CancellationToken::new()).await.unwrap();
        let ids: Vec<i32> = results.iter().map(|r| r.item.event_id).collect();
        assert_eq!(ids, vec![21, 20, 22]);
        assert_eq!(results[0].score, results[1].score);
    }

    #[tokio::test]
    async fn test_ranking_and_truncation() {
        let store = InMemoryStore::new()
            .with_profile(ProfileFeatures::new(1).with_skills(["go", "rust"]))
            .with_profile(ProfileFeatures::new(2).with_skills(["go", "rust"]))
            .with_profile(ProfileFeatures::new(3))
            .with_follow(1, 2)
            .with_event(event(30, 3, &[], 2))
            .with_event(event(31, 2, &["go", "rust"], 72))
            .with_event(event(32, 3, &["go"], 24));

        let results = recommender(store)
            .recommend(1, 2, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].item.event_id, 31);
        assert_eq!(results[1].item.event_id, 32);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        for r in &results {
            assert!((0.05..=1.0).contains(&r.score));
        }
    }

    #[tokio::test]
    async fn test_location_resolution_in_results() {
        let mut candidate = event(40, 2, &[], 5);
        candidate.location = Some(EventLocation {
            address: None,
            online_link: Some("https://meet.example/40".into()),
        });
        let store = InMemoryStore::new()
            .with_profile(ProfileFeatures::new(1))
            .with_event(candidate);

        let results = recommender(store)
            .recommend(1, 5, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(results[0].item.location, "https://meet.example/40");
    }

    #[tokio::test]
    async fn test_not_found_and_empty_cases() {
        let store = InMemoryStore::new().with_profile(ProfileFeatures::new(1));
        let rec = recommender(store);
        let cancel = CancellationToken::new();

        let err = rec.recommend(99, 10, &cancel).await.unwrap_err();
        assert!(matches!(err, RecommendError::NotFound { id: 99, .. }));

        assert!(rec.recommend(1, 10, &cancel).await.unwrap().is_empty());
        assert!(rec.recommend(1, 0, &cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_and_store_failure() {
        let store = InMemoryStore::new()
            .with_profile(ProfileFeatures::new(1))
            .with_event(event(50, 2, &[], 5));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = recommender(store.clone()).recommend(1, 10, &cancel).await.unwrap_err();
        assert!(matches!(err, RecommendError::Cancelled));

        let failing = recommender(ScriptedStore::new(store).failing_reads());
        let err = failing
            .recommend(1, 10, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::Store(_)));
    }
}
