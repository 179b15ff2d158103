//! AlumNet Recommendation Engine
//!
//! Ranks events, peers and jobs for a profile and discovers follow-graph
//! connections up to a bounded degree.
//!
//! Everything reads through the traits in [`store`]; nothing is written.
//! Each request recomputes from fresh store reads.

pub mod cancellation;
pub mod clock;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod events;
pub mod idf;
pub mod jobs;
pub mod peers;
pub mod similarity;
pub mod store;
pub mod types;
pub mod weights;

pub use cancellation::CancellationToken;
pub use clock::{Clock, FixedClock, SystemClock};
pub use discovery::{ConnectionDiscovery, DegreeMap};
pub use engine::{EngineSettings, RecommendationEngine};
pub use errors::{RecommendError, Result};
pub use store::{InMemoryStore, SeaOrmStore};
pub use types::{
    ProfileId, RankedResult, RecommendedEvent, RecommendedJob, RecommendedPeer,
};
pub use weights::ScoringWeights;
