//! Inverse document frequency over the active job corpus
//!
//! `idf(term) = ln(total_jobs / (df + 1))`. A skill required by nearly every
//! job gets a negative weight; it still counts in cosine since both sides
//! share it. The table is rebuilt for every job recommendation unless an [`IdfCache`] window is
//! configured.

use crate::types::JobCandidate;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// Weight assumed for terms absent from the corpus
pub const NEUTRAL_IDF: f64 = 1.0;

/// Skill → IDF weight, keyed by normalized skill name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdfTable {
    weights: HashMap<String, f64>,
    document_count: usize,
}

impl IdfTable {
    /// Build from each active job's required-skill set
    pub fn from_jobs(jobs: &[JobCandidate]) -> Self {
        Self::from_documents(jobs.iter().map(|job| &job.required_skills))
    }

    /// Build from any collection of term sets (one set per document)
    pub fn from_documents<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a HashSet<String>>,
    {
        let mut frequency: HashMap<String, usize> = HashMap::new();
        let mut document_count = 0usize;

        for terms in documents {
            document_count += 1;
            for term in terms {
                *frequency.entry(term.clone()).or_insert(0) += 1;
            }
        }

        let total = document_count as f64;
        let weights = frequency
            .into_iter()
            .map(|(term, df)| {
                let idf = (total / (df as f64 + 1.0)).ln();
                (term, idf)
            })
            .collect();

        Self {
            weights,
            document_count,
        }
    }

    /// Table with explicit weights (tests, precomputed corpora)
    pub fn from_weights<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = (String, f64)>,
    {
        Self {
            weights: weights.into_iter().collect(),
            document_count: 0,
        }
    }

    pub fn get(&self, term: &str) -> Option<f64> {
        self.weights.get(term).copied()
    }

    /// Weight for `term`, falling back to [`NEUTRAL_IDF`]
    pub fn weight_or_neutral(&self, term: &str) -> f64 {
        self.get(term).unwrap_or(NEUTRAL_IDF)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Number of documents the table was built from
    pub fn document_count(&self) -> usize {
        self.document_count
    }
}

/// Reuses the last computed table for a fixed window.
///
/// A request always scores every candidate against a single table.
pub struct IdfCache {
    ttl: Duration,
    slot: RwLock<Option<(Instant, Arc<IdfTable>)>>,
}

impl IdfCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Cached table if still fresh, otherwise rebuild from `jobs`
    pub async fn get_or_build(&self, jobs: &[JobCandidate]) -> Arc<IdfTable> {
        {
            let slot = self.slot.read().await;
            if let Some((built_at, table)) = slot.as_ref() {
                if built_at.elapsed() < self.ttl {
                    alumnet_common::metrics::record_idf_cache(true);
                    return Arc::clone(table);
                }
            }
        }

        alumnet_common::metrics::record_idf_cache(false);
        let table = Arc::new(IdfTable::from_jobs(jobs));
        debug!(terms = table.len(), documents = table.document_count(), "IDF table rebuilt");

        let mut slot = self.slot.write().await;
        *slot = Some((Instant::now(), Arc::clone(&table)));
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_tfidf;
    use crate::types::skill_set;

    fn job(id: i32, skills: &[&str]) -> JobCandidate {
        JobCandidate {
            id,
            title: "Engineer".into(),
            company_name: "Acme".into(),
            location: None,
            posted_at: None,
            expires_at: None,
            required_skills: skill_set(skills.iter().copied()),
            posted_by: None,
        }
    }

    #[test]
    fn test_idf_formula() {
        let jobs = vec![
            job(1, &["rust", "sql"]),
            job(2, &["rust"]),
            job(3, &["go"]),
            job(4, &["python"]),
            job(5, &["java"]),
            job(6, &["java"]),
        ];
        let table = IdfTable::from_jobs(&jobs);

        assert_eq!(table.document_count(), 6);
        // sql: df = 1 → ln(6 / 2)
        assert!((table.get("sql").unwrap() - (3.0f64).ln()).abs() < 1e-12);
        // rust: df = 2 → ln(6 / 3)
        assert!((table.get("rust").unwrap() - (2.0f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_ubiquitous_skill_keeps_negative_weight() {
        let jobs = vec![job(1, &["sql"]), job(2, &["sql"]), job(3, &["sql", "go"])];
        let table = IdfTable::from_jobs(&jobs);

        // ln(3 / 4)
        assert!((table.get("sql").unwrap() - (0.75f64).ln()).abs() < 1e-12);
        assert!(table.get("sql").unwrap() < 0.0);
        // go: ln(3 / 2) > 0
        assert!(table.get("go").unwrap() > 0.0);
        assert!(table.get("rust").is_none());
        assert_eq!(table.weight_or_neutral("rust"), NEUTRAL_IDF);
    }

    #[test]
    fn test_single_job_corpus_perfect_match() {
        let jobs = vec![job(1, &["rust", "sql"])];
        let table = IdfTable::from_jobs(&jobs);

        // ln(1 / 2) for both skills
        assert!((table.get("rust").unwrap() - (0.5f64).ln()).abs() < 1e-12);

        let requester = skill_set(["rust", "sql"]);
        let score = cosine_tfidf(&requester, &jobs[0].required_skills, &table);
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_corpus() {
        let table = IdfTable::from_jobs(&[]);
        assert!(table.is_empty());
        assert_eq!(table.document_count(), 0);
    }

    #[tokio::test]
    async fn test_cache_reuses_within_window() {
        let cache = IdfCache::new(Duration::from_secs(3600));
        let first = cache.get_or_build(&[job(1, &["rust"])]).await;
        let second = cache.get_or_build(&[job(1, &["go"]), job(2, &["go"])]).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.get("go").is_none());
    }

    #[tokio::test]
    async fn test_cache_rebuilds_after_window() {
        let cache = IdfCache::new(Duration::from_millis(5));
        let first = cache.get_or_build(&[job(1, &["rust"])]).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = cache.get_or_build(&[job(1, &["go"])]).await;

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.get("go").is_some());
    }
}
