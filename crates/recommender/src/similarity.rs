//! Set and vector similarity primitives
//!
//! Pure functions with no state or I/O:
//! - Jaccard similarity and overlap count over sets
//! - Cosine similarity over raw vectors
//! - Cosine over binary set-membership vectors, plain or IDF-weighted

use crate::errors::{RecommendError, Result};
use crate::idf::IdfTable;
use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

/// `|A ∩ B| / |A ∪ B|`, or 0.0 when either set is empty
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    intersection as f64 / union as f64
}

/// Number of shared elements
pub fn overlap<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> usize {
    a.intersection(b).count()
}

/// Dot product over norms; 0.0 when either norm is zero.
///
/// Vectors of different lengths are a caller bug and fail with
/// `InvalidArgument`.
pub fn cosine(a: &[f64], b: &[f64]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(RecommendError::invalid(format!(
            "Vectors must have the same length ({} vs {})",
            a.len(),
            b.len()
        )));
    }

    Ok(cosine_aligned(a, b))
}

/// Cosine for vectors already known to share a basis
fn cosine_aligned(a: &[f64], b: &[f64]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Cosine over 1.0/0.0 membership vectors on the union of both sets
pub fn cosine_set_binary(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    weighted_set_cosine(a, b, |_| 1.0)
}

/// Cosine over membership vectors scaled by IDF.
///
/// Terms missing from the table get a neutral weight of 1.0 so skills unseen
/// in the job corpus still count.
pub fn cosine_tfidf(user: &HashSet<String>, candidate: &HashSet<String>, idf: &IdfTable) -> f64 {
    weighted_set_cosine(user, candidate, |term| idf.weight_or_neutral(term))
}

fn weighted_set_cosine<F>(a: &HashSet<String>, b: &HashSet<String>, weight: F) -> f64
where
    F: Fn(&str) -> f64,
{
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Sorted basis keeps float summation order stable across runs
    let basis: BTreeSet<&str> = a.iter().chain(b.iter()).map(String::as_str).collect();

    let mut va = Vec::with_capacity(basis.len());
    let mut vb = Vec::with_capacity(basis.len());
    for term in basis {
        let w = weight(term);
        va.push(if a.contains(term) { w } else { 0.0 });
        vb.push(if b.contains(term) { w } else { 0.0 });
    }

    cosine_aligned(&va, &vb)
}
