//! Engine facade wiring the recommenders and discovery to one store

use crate::cancellation::CancellationToken;
use crate::clock::{Clock, SystemClock};
use crate::discovery::{ConnectionDiscovery, DegreeMap, DEFAULT_BATCH_SIZE, MAX_DEGREE_LIMIT};
use crate::errors::Result;
use crate::events::EventRecommender;
use crate::idf::IdfCache;
use crate::jobs::JobRecommender;
use crate::peers::PeerRecommender;
use crate::store::RecommendationStore;
use crate::types::{ProfileId, RankedResult, RecommendedEvent, RecommendedJob, RecommendedPeer};
use crate::weights::ScoringWeights;
use alumnet_common::config::RecommendationConfig;
use alumnet_common::metrics::record_recommendation;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Engine limits and cache settings
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub default_limit: usize,
    pub max_limit: usize,
    pub bfs_batch_size: u64,
    pub max_degree: u32,
    pub idf_cache_ttl: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
            bfs_batch_size: DEFAULT_BATCH_SIZE,
            max_degree: MAX_DEGREE_LIMIT,
            idf_cache_ttl: None,
        }
    }
}

impl From<&RecommendationConfig> for EngineSettings {
    fn from(config: &RecommendationConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit,
            bfs_batch_size: config.bfs_batch_size,
            max_degree: u32::from(config.max_degree_cap).clamp(1, MAX_DEGREE_LIMIT),
            idf_cache_ttl: config.idf_cache_ttl(),
        }
    }
}

/// The four public operations over a single store
pub struct RecommendationEngine {
    events: EventRecommender,
    peers: PeerRecommender,
    jobs: JobRecommender,
    discovery: ConnectionDiscovery,
    settings: EngineSettings,
}

impl RecommendationEngine {
    pub fn new<S>(store: Arc<S>, weights: ScoringWeights, settings: EngineSettings) -> Self
    where
        S: RecommendationStore + 'static,
    {
        Self::with_clock(store, weights, settings, Arc::new(SystemClock))
    }

    pub fn with_clock<S>(
        store: Arc<S>,
        weights: ScoringWeights,
        settings: EngineSettings,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        S: RecommendationStore + 'static,
    {
        let events =
            EventRecommender::new(store.clone(), store.clone(), clock.clone(), weights.clone());
        let peers = PeerRecommender::new(store.clone(), weights.clone());

        let mut jobs = JobRecommender::new(store.clone(), store.clone(), clock, weights);
        if let Some(ttl) = settings.idf_cache_ttl {
            jobs = jobs.with_idf_cache(IdfCache::new(ttl));
        }

        let discovery = ConnectionDiscovery::new(store.clone(), store)
            .with_batch_size(settings.bfs_batch_size)
            .with_max_degree(settings.max_degree);

        Self {
            events,
            peers,
            jobs,
            discovery,
            settings,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub async fn recommend_events(
        &self,
        profile_id: ProfileId,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedResult<RecommendedEvent>>> {
        let started = Instant::now();
        let results = self.events.recommend(profile_id, limit, cancel).await?;
        record_recommendation("events", started.elapsed().as_secs_f64(), results.len());
        Ok(results)
    }

    pub async fn recommend_peers(
        &self,
        profile_id: ProfileId,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedResult<RecommendedPeer>>> {
        let started = Instant::now();
        let results = self.peers.recommend(profile_id, limit, cancel).await?;
        record_recommendation("peers", started.elapsed().as_secs_f64(), results.len());
        Ok(results)
    }

    pub async fn recommend_jobs(
        &self,
        profile_id: ProfileId,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<RankedResult<RecommendedJob>>> {
        let started = Instant::now();
        let results = self.jobs.recommend(profile_id, limit, cancel).await?;
        record_recommendation("jobs", started.elapsed().as_secs_f64(), results.len());
        Ok(results)
    }

    pub async fn discover_connections(
        &self,
        start_id: ProfileId,
        max_degree: u32,
        cancel: &CancellationToken,
    ) -> Result<DegreeMap> {
        self.discovery.discover(start_id, max_degree, cancel).await
    }
}
