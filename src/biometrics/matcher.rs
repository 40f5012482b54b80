//! Portrait-to-selfie descriptor matching.

use crate::core::constants::{MATCH_DISTANCE_THRESHOLD, SIMILARITY_NORMALIZER};
use crate::core::errors::VerifyResult;
use crate::domain::biometrics::ensure_descriptor_len;
use crate::domain::MatchResult;

/// Euclidean distance between two equal-length vectors.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Compares two 128-float descriptors.
///
/// `is_match` holds iff the distance is below 0.6; the reported similarity
/// is `max(0, 1 − distance / 1.2)`. Either descriptor with the wrong length
/// raises `DescriptorInvalid`.
pub fn match_descriptors(reference: &[f32], probe: &[f32]) -> VerifyResult<MatchResult> {
    ensure_descriptor_len(reference)?;
    ensure_descriptor_len(probe)?;

    let distance = euclidean_distance(reference, probe);
    Ok(MatchResult {
        similarity: (1.0 - distance / SIMILARITY_NORMALIZER).max(0.0),
        distance,
        is_match: distance < MATCH_DISTANCE_THRESHOLD,
    })
}
