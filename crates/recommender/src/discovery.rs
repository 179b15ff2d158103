//! Bounded-degree connection discovery
//!
//! Breadth-first search over the directed follow graph from a start
//! profile. Outgoing edges are read page by page so a profile with a huge
//! follow list never has to be loaded at once. The visited set guarantees
//! each profile gets its shortest hop count and is expanded at most once.
//!
//! The graph may change while a traversal runs; results reflect whatever
//! each page read returned, not a transactional snapshot.

use crate::cancellation::CancellationToken;
use crate::errors::{RecommendError, Result};
use crate::store::{FollowGraphStore, ProfileStore};
use crate::types::ProfileId;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Hard upper bound on the degree a caller may ask for
pub const MAX_DEGREE_LIMIT: u32 = 3;

/// Default page size for follow-edge reads
pub const DEFAULT_BATCH_SIZE: u64 = 100;

/// Profile id → shortest follow-degree from the start profile.
///
/// Never contains the start profile. Iterates in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DegreeMap(BTreeMap<ProfileId, u32>);

impl DegreeMap {
    pub fn get(&self, id: ProfileId) -> Option<u32> {
        self.0.get(&id).copied()
    }

    pub fn contains(&self, id: ProfileId) -> bool {
        self.0.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProfileId, u32)> + '_ {
        self.0.iter().map(|(&id, &degree)| (id, degree))
    }

    /// Number of profiles found at exactly `degree` hops
    pub fn count_at_degree(&self, degree: u32) -> usize {
        self.0.values().filter(|&&d| d == degree).count()
    }

    fn insert(&mut self, id: ProfileId, degree: u32) {
        self.0.insert(id, degree);
    }
}

/// Paginated BFS over the follow graph
pub struct ConnectionDiscovery {
    profiles: Arc<dyn ProfileStore>,
    graph: Arc<dyn FollowGraphStore>,
    batch_size: u64,
    max_degree: u32,
}

impl ConnectionDiscovery {
    pub fn new(profiles: Arc<dyn ProfileStore>, graph: Arc<dyn FollowGraphStore>) -> Self {
        Self {
            profiles,
            graph,
            batch_size: DEFAULT_BATCH_SIZE,
            max_degree: MAX_DEGREE_LIMIT,
        }
    }

    /// Page size for edge reads (at least 1)
    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Lower the accepted degree bound; never raised above [`MAX_DEGREE_LIMIT`]
    pub fn with_max_degree(mut self, max_degree: u32) -> Self {
        self.max_degree = max_degree.clamp(1, MAX_DEGREE_LIMIT);
        self
    }

    fn validate(&self, start_id: ProfileId, max_degree: u32) -> Result<()> {
        if start_id <= 0 {
            return Err(RecommendError::invalid(format!(
                "Start profile id must be positive, got {}",
                start_id
            )));
        }
        if max_degree < 1 || max_degree > self.max_degree {
            return Err(RecommendError::invalid(format!(
                "maxDegree must be between 1 and {}, got {}",
                self.max_degree, max_degree
            )));
        }
        Ok(())
    }

    /// Shortest follow-degree for every profile within `max_degree` hops.
    ///
    /// Either the complete map is returned or the call fails; store errors
    /// mid-traversal surface as `DiscoveryFailure` with the cause attached.
    #[tracing::instrument(skip(self, cancel))]
    pub async fn discover(
        &self,
        start_id: ProfileId,
        max_degree: u32,
        cancel: &CancellationToken,
    ) -> Result<DegreeMap> {
        self.validate(start_id, max_degree)?;
        cancel.ensure_active()?;
        debug!("Discovering connections");

        if !self.profiles.exists_by_id(start_id).await? {
            return Err(RecommendError::profile_not_found(start_id));
        }

        let started = Instant::now();
        let mut pages_fetched = 0u64;
        let outcome = self
            .traverse(start_id, max_degree, cancel, &mut pages_fetched)
            .await;
        let elapsed = started.elapsed().as_secs_f64();

        alumnet_common::metrics::record_discovery(elapsed, pages_fetched, outcome.is_ok());

        match &outcome {
            Ok(degrees) => info!(
                found = degrees.len(),
                pages = pages_fetched,
                "Connection discovery complete"
            ),
            Err(RecommendError::Cancelled) => warn!(pages = pages_fetched, "Connection discovery cancelled"),
            Err(e) => error!(error = %e, "Connection discovery failed"),
        }

        outcome
    }

    async fn traverse(
        &self,
        start_id: ProfileId,
        max_degree: u32,
        cancel: &CancellationToken,
        pages_fetched: &mut u64,
    ) -> Result<DegreeMap> {
        let mut degrees = DegreeMap::default();
        let mut visited: HashSet<ProfileId> = HashSet::from([start_id]);
        let mut queue: VecDeque<(ProfileId, u32)> = VecDeque::from([(start_id, 0)]);

        while let Some((current, degree)) = queue.pop_front() {
            if degree >= max_degree {
                continue;
            }

            let mut page_index = 0u64;
            loop {
                cancel.ensure_active()?;

                let page = self
                    .graph
                    .page_of_followed_ids(current, page_index, self.batch_size)
                    .await
                    .map_err(|source| RecommendError::DiscoveryFailure {
                        profile_id: start_id,
                        source,
                    })?;
                *pages_fetched += 1;

                let page_len = page.len() as u64;
                for neighbor in page {
                    if visited.insert(neighbor) {
                        degrees.insert(neighbor, degree + 1);
                        queue.push_back((neighbor, degree + 1));
                    }
                }

                if page_len < self.batch_size {
                    break;
                }
                page_index += 1;
            }
        }

        Ok(degrees)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::ScriptedStore;
    use crate::store::InMemoryStore;
    use crate::types::ProfileFeatures;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::error::Error as _;
    use tokio_test::{assert_err, assert_ok};

    fn graph(profiles: &[ProfileId], edges: &[(ProfileId, ProfileId)]) -> InMemoryStore {
        let mut store = InMemoryStore::new();
        for &id in profiles {
            store = store.with_profile(ProfileFeatures::new(id));
        }
        for &(from, to) in edges {
            store = store.with_follow(from, to);
        }
        store
    }

    fn discovery<S>(store: Arc<S>) -> ConnectionDiscovery
    where
        S: ProfileStore + FollowGraphStore + 'static,
    {
        ConnectionDiscovery::new(store.clone(), store)
    }

    #[tokio::test]
    async fn test_cycle_terminates_with_shortest_degrees() {
        let store = Arc::new(graph(&[1, 2, 3], &[(1, 2), (2, 3), (3, 1)]));
        let degrees = discovery(store)
            .discover(1, 3, &CancellationToken::new())
            .await
            .unwrap();

        let found: Vec<(ProfileId, u32)> = degrees.iter().collect();
        assert_eq!(found, vec![(2, 1), (3, 2)]);
        assert!(!degrees.contains(1));
    }

    #[tokio::test]
    async fn test_degree_bound_limits_depth() {
        let store = Arc::new(graph(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4), (1, 4)]));
        let service = discovery(store);
        let cancel = CancellationToken::new();

        let one = service.discover(1, 1, &cancel).await.unwrap();
        assert_eq!(one.len(), 2);
        assert_eq!(one.count_at_degree(1), 2);

        let two = service.discover(1, 2, &cancel).await.unwrap();
        assert_eq!(two.get(3), Some(2));
        // 4 is reachable in one hop and via 2 → 3 → 4; the shorter path wins
        assert_eq!(two.get(4), Some(1));
    }

    #[tokio::test]
    async fn test_invalid_arguments_fail_before_traversal() {
        let scripted = Arc::new(ScriptedStore::new(graph(&[1, 2], &[(1, 2)])));
        let service = discovery(scripted.clone());
        let cancel = CancellationToken::new();

        for bad in [0, 4] {
            let err = service.discover(1, bad, &cancel).await.unwrap_err();
            assert!(matches!(err, RecommendError::InvalidArgument { .. }));
        }
        let err = service.discover(0, 2, &cancel).await.unwrap_err();
        assert!(matches!(err, RecommendError::InvalidArgument { .. }));

        assert!(scripted.page_requests().is_empty());
    }

    #[tokio::test]
    async fn test_lowered_degree_cap() {
        let store = Arc::new(graph(&[1, 2], &[(1, 2)]));
        let service = discovery(store).with_max_degree(2);

        assert_err!(service.discover(1, 3, &CancellationToken::new()).await);
        assert_ok!(service.discover(1, 2, &CancellationToken::new()).await);
    }

    #[tokio::test]
    async fn test_missing_start_profile() {
        let store = Arc::new(graph(&[1], &[]));
        let err = discovery(store)
            .discover(5, 2, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::NotFound { id: 5, .. }));
    }

    #[tokio::test]
    async fn test_isolated_profile_yields_empty_map() {
        let store = Arc::new(graph(&[1, 2], &[(2, 1)]));
        let degrees = discovery(store)
            .discover(1, 3, &CancellationToken::new())
            .await
            .unwrap();
        assert!(degrees.is_empty());
    }

    #[tokio::test]
    async fn test_store_error_wraps_cause_and_discards_partial_map() {
        let store = graph(&[1, 2, 3], &[(1, 2), (2, 3)]);
        let scripted = Arc::new(ScriptedStore::new(store).failing_pages_for(2));

        let err = discovery(scripted)
            .discover(1, 3, &CancellationToken::new())
            .await
            .unwrap_err();

        match &err {
            RecommendError::DiscoveryFailure { profile_id, .. } => assert_eq!(*profile_id, 1),
            other => panic!("expected DiscoveryFailure, got {other:?}"),
        }
        let cause = err.source().expect("cause attached");
        assert!(cause.to_string().contains("store timeout"));
    }

    #[tokio::test]
    async fn test_full_page_triggers_one_more_fetch() {
        let followees: Vec<(ProfileId, ProfileId)> = (2..=4).map(|id| (1, id)).collect();
        let scripted = Arc::new(ScriptedStore::new(graph(&[1, 2, 3, 4], &followees)));

        let degrees = discovery(scripted.clone())
            .with_batch_size(3)
            .discover(1, 1, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(degrees.len(), 3);
        assert_eq!(scripted.page_requests(), vec![(1, 0), (1, 1)]);
    }

    #[tokio::test]
    async fn test_short_page_ends_the_list() {
        let followees: Vec<(ProfileId, ProfileId)> = (2..=6).map(|id| (1, id)).collect();
        let scripted = Arc::new(ScriptedStore::new(graph(&[1], &followees)));

        discovery(scripted.clone())
            .with_batch_size(3)
            .discover(1, 1, &CancellationToken::new())
            .await
            .unwrap();

        // 3 + 2: the second page is short
        assert_eq!(scripted.page_requests(), vec![(1, 0), (1, 1)]);
    }

    #[tokio::test]
    async fn test_cancellation_before_and_during_traversal() {
        let store = graph(&[1, 2, 3, 4], &[(1, 2), (2, 3), (3, 4)]);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = discovery(Arc::new(store.clone()))
            .discover(1, 3, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, RecommendError::Cancelled));

        let cancel = CancellationToken::new();
        let scripted = Arc::new(ScriptedStore::new(store).cancelling_after(1, cancel.clone()));
        let err = discovery(scripted.clone()).discover(1, 3, &cancel).await.unwrap_err();
        assert!(matches!(err, RecommendError::Cancelled));
        assert_eq!(scripted.page_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_view_sees_edges_added_mid_traversal() {
        let store = graph(&[1, 2, 3, 4], &[(1, 2), (2, 3)]);

        let before = discovery(Arc::new(store.clone()))
            .discover(1, 3, &CancellationToken::new())
            .await
            .unwrap();
        assert!(!before.contains(4));

        // 3 → 4 appears after profile 1's page was read, before 3 is expanded
        let scripted = Arc::new(ScriptedStore::new(store).following_after(1, 3, 4));
        let during = assert_ok!(
            discovery(scripted.clone())
                .discover(1, 3, &CancellationToken::new())
                .await
        );

        assert_eq!(during.get(2), Some(1));
        assert_eq!(during.get(3), Some(2));
        assert_eq!(during.get(4), Some(3));
        assert_eq!(scripted.page_requests(), vec![(1, 0), (2, 0), (3, 0)]);
    }

    /// Unbatched BFS over a full adjacency map
    fn reference_bfs(
        adjacency: &BTreeMap<ProfileId, Vec<ProfileId>>,
        start: ProfileId,
        max_degree: u32,
    ) -> BTreeMap<ProfileId, u32> {
        let mut degrees = BTreeMap::new();
        let mut visited = HashSet::from([start]);
        let mut queue = VecDeque::from([(start, 0u32)]);

        while let Some((id, degree)) = queue.pop_front() {
            if degree >= max_degree {
                continue;
            }
            for &next in adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[]) {
                if visited.insert(next) {
                    degrees.insert(next, degree + 1);
                    queue.push_back((next, degree + 1));
                }
            }
        }
        degrees
    }

    #[tokio::test]
    async fn test_paginated_matches_reference_on_random_graphs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..20 {
            let n: ProfileId = rng.gen_range(2..40);
            let edge_count = rng.gen_range(0..(n as usize * 3));

            let mut adjacency: BTreeMap<ProfileId, Vec<ProfileId>> = BTreeMap::new();
            let mut store = InMemoryStore::new();
            for id in 1..=n {
                store = store.with_profile(ProfileFeatures::new(id));
            }
            for _ in 0..edge_count {
                let from = rng.gen_range(1..=n);
                let to = rng.gen_range(1..=n);
                if from == to {
                    continue;
                }
                let out = adjacency.entry(from).or_default();
                if !out.contains(&to) {
                    out.push(to);
                    store = store.with_follow(from, to);
                }
            }

            let service = discovery(Arc::new(store)).with_batch_size(rng.gen_range(1..5));
            let start = rng.gen_range(1..=n);
            for max_degree in 1..=3 {
                let degrees = service
                    .discover(start, max_degree, &CancellationToken::new())
                    .await
                    .unwrap();
                let expected = reference_bfs(&adjacency, start, max_degree);

                assert_eq!(degrees.iter().collect::<BTreeMap<_, _>>(), expected);
                assert!(!degrees.contains(start));
                assert!(degrees.iter().all(|(_, d)| (1..=max_degree).contains(&d)));
            }
        }
    }

    #[test]
    fn test_degree_map_serializes_as_object() {
        let mut degrees = DegreeMap::default();
        degrees.insert(12, 2);
        degrees.insert(3, 1);

        let json = serde_json::to_string(&degrees).unwrap();
        assert_eq!(json, r#"{"3":1,"12":2}"#);
    }
}
