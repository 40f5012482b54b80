//! Liveness scoring: cross-pose consistency, the static-attack heuristic,
//! and score fusion.

use itertools::Itertools;

use crate::biometrics::matcher::euclidean_distance;
use crate::core::constants::{
    DESCRIPTOR_LEN, LIVENESS_THRESHOLD, STATIC_CONSISTENCY_CEILING, STATIC_FAST_GAP_MS,
    STATIC_QUALITY_VARIANCE_FLOOR, STATIC_TOTAL_WEIGHT,
};
use crate::domain::{
    AngleResult, ConsistencyResult, LivenessDetails, LivenessResult, PoseAnalysis, StaticCheck,
};

/// Measures whether the same identity appears in every pose.
///
/// The score is `1 − min(avg pairwise distance, 1)` over all valid
/// descriptors; fewer than two valid descriptors score 0.
pub fn cross_pose_consistency(descriptors: &[Option<Vec<f32>>]) -> ConsistencyResult {
    let valid: Vec<&Vec<f32>> = descriptors
        .iter()
        .flatten()
        .filter(|d| d.len() == DESCRIPTOR_LEN)
        .collect();

    if valid.len() < 2 {
        return ConsistencyResult {
            score: 0.0,
            average_distance: 0.0,
            valid_descriptors: valid.len(),
        };
    }

    let distances: Vec<f32> = valid
        .iter()
        .copied()
        .tuple_combinations()
        .map(|(a, b)| euclidean_distance(a, b))
        .collect();
    let average = distances.iter().sum::<f32>() / distances.len() as f32;

    ConsistencyResult {
        score: 1.0 - average.min(1.0),
        average_distance: average,
        valid_descriptors: valid.len(),
    }
}

/// Weighted indicators of a photographed or replayed face.
///
/// Suspicion fires when the triggered weight exceeds half the total weight
/// of 5.5: descriptors too consistent (2.0), pose angles implausibly exact
/// (1.5/1.0), captures too fast (1.0), no quality variance (1.0).
pub fn static_attack_check(
    analyses: &[PoseAnalysis],
    consistency: &ConsistencyResult,
) -> StaticCheck {
    let mut total = 0.0f32;
    let mut indicators = Vec::new();

    if consistency.score > STATIC_CONSISTENCY_CEILING {
        total += 2.0;
        indicators.push("descriptors too consistent".to_string());
    }

    let perfect = analyses
        .iter()
        .filter(|a| a.detected && (a.yaw_deg - a.pose.target_yaw()).abs() < 5.0)
        .count();
    let perfect_weight = match perfect {
        n if n >= 3 => 1.5,
        2 => 1.0,
        _ => 0.0,
    };
    if perfect_weight > 0.0 {
        total += perfect_weight;
        indicators.push(format!("{perfect} implausibly exact pose angles"));
    }

    let timestamps: Vec<u64> = analyses.iter().map(|a| a.timestamp_ms).collect();
    if timestamps.len() >= 2 {
        let gaps: Vec<f64> = timestamps
            .windows(2)
            .map(|w| w[1].saturating_sub(w[0]) as f64)
            .collect();
        let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;
        if mean_gap < STATIC_FAST_GAP_MS {
            total += 1.0;
            indicators.push("captures too fast".to_string());
        }
    }

    let qualities: Vec<f32> = analyses
        .iter()
        .filter(|a| a.detected)
        .map(|a| a.quality_score)
        .collect();
    if qualities.len() >= 2 {
        let mean = qualities.iter().sum::<f32>() / qualities.len() as f32;
        let variance = qualities.iter().map(|q| (q - mean).powi(2)).sum::<f32>()
            / qualities.len() as f32;
        if variance < STATIC_QUALITY_VARIANCE_FLOOR {
            total += 1.0;
            indicators.push("no quality variance across poses".to_string());
        }
    }

    StaticCheck {
        suspected: total / STATIC_TOTAL_WEIGHT > 0.5,
        total_weight: total,
        indicators,
    }
}

/// Fuses all liveness evidence into the final verdict.
///
/// `score = 0.3·detection + 0.2·quality + 0.1·confidence + 0.2·consistency
/// + 0.2·angles`, halved under static suspicion. Live requires the score to
/// reach 0.7 with no static suspicion.
pub fn fuse(
    analyses: Vec<PoseAnalysis>,
    angle_results: Vec<AngleResult>,
    consistency: ConsistencyResult,
    static_check: &StaticCheck,
) -> LivenessResult {
    let total = analyses.len().max(1) as f32;
    let detected: Vec<&PoseAnalysis> = analyses.iter().filter(|a| a.detected).collect();
    let detection_rate = detected.len() as f32 / total;

    let mean = |values: Vec<f32>| -> f32 {
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f32>() / values.len() as f32
        }
    };
    let mean_quality = mean(detected.iter().map(|a| a.quality_score).collect());
    let mean_confidence = mean(detected.iter().map(|a| a.confidence).collect());
    let angle_component = mean(
        angle_results
            .iter()
            .filter(|r| r.actual_yaw.is_some())
            .map(|r| r.score)
            .collect(),
    );

    let mut score = 0.3 * detection_rate
        + 0.2 * mean_quality
        + 0.1 * mean_confidence
        + 0.2 * consistency.score
        + 0.2 * angle_component;
    if static_check.suspected {
        score *= 0.5;
    }

    let is_live = score >= LIVENESS_THRESHOLD && !static_check.suspected;
    let reason = if static_check.suspected {
        format!(
            "static picture suspected ({})",
            static_check.indicators.join(", ")
        )
    } else if detected.is_empty() {
        "no face detected in any pose".to_string()
    } else if !is_live {
        format!("fused liveness score {score:.2} below threshold")
    } else {
        "all liveness checks passed".to_string()
    };

    tracing::debug!(
        score,
        detection_rate,
        mean_quality,
        mean_confidence,
        consistency = consistency.score,
        angle_component,
        static_suspected = static_check.suspected,
        "liveness fusion"
    );

    LivenessResult {
        is_live,
        score,
        reason,
        details: LivenessDetails {
            pose_analyses: analyses,
            consistency,
            angle_results,
            static_suspected: static_check.suspected,
        },
    }
}
