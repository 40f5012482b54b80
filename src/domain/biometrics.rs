//! Biometric value types: portrait, poses, liveness verdict, match result.

use serde::{Deserialize, Serialize};

use crate::core::constants::DESCRIPTOR_LEN;
use crate::core::errors::{VerifyError, VerifyResult};
use crate::domain::Frame;

/// A pose of the liveness challenge, with its target yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pose {
    Front,
    Left,
    Right,
}

impl Pose {
    /// The fixed challenge order.
    pub const CHALLENGE: [Pose; 3] = [Pose::Front, Pose::Left, Pose::Right];

    /// Target yaw in degrees; positive turns toward camera-right.
    pub fn target_yaw(&self) -> f32 {
        match self {
            Self::Front => 0.0,
            Self::Left => -20.0,
            Self::Right => 20.0,
        }
    }

    /// Instruction shown while this pose is captured.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::Front => "Look straight at the camera",
            Self::Left => "Turn your head to the left",
            Self::Right => "Turn your head to the right",
        }
    }
}

impl std::fmt::Display for Pose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Front => write!(f, "front"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Portrait extracted from the front of the document.
///
/// The descriptor is set once and never mutated; it is consumed by the match
/// step of phase 3.
#[derive(Debug, Clone)]
pub struct Portrait {
    /// Face crop including padding.
    pub crop: Frame,
    /// 128-float face embedding.
    pub descriptor: Vec<f32>,
}

impl Portrait {
    /// Builds a portrait, enforcing the descriptor length invariant.
    pub fn new(crop: Frame, descriptor: Vec<f32>) -> VerifyResult<Self> {
        ensure_descriptor_len(&descriptor)?;
        Ok(Self { crop, descriptor })
    }
}

/// Validates the 128-float descriptor invariant.
pub fn ensure_descriptor_len(descriptor: &[f32]) -> VerifyResult<()> {
    if descriptor.len() != DESCRIPTOR_LEN {
        return Err(VerifyError::DescriptorInvalid {
            expected: DESCRIPTOR_LEN,
            actual: descriptor.len(),
        });
    }
    Ok(())
}

/// Geometry extracted from one pose capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseAnalysis {
    /// Which challenge pose this capture answers.
    pub pose: Pose,
    /// Whether a usable face was found.
    pub detected: bool,
    /// Detector confidence (0 when not detected).
    pub confidence: f32,
    /// Estimated yaw in degrees, clipped to ±45.
    pub yaw_deg: f32,
    /// Pixel distance between the outer eye corners.
    pub eye_distance_px: f32,
    /// Face quality in 0..=1 (size, aspect, eye level).
    pub quality_score: f32,
    /// Capture timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Failure reason when the capture was unusable.
    pub error: Option<String>,
}

impl PoseAnalysis {
    /// An analysis marking a failed capture.
    pub fn failed(pose: Pose, timestamp_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            pose,
            detected: false,
            confidence: 0.0,
            yaw_deg: 0.0,
            eye_distance_px: 0.0,
            quality_score: 0.0,
            timestamp_ms,
            error: Some(reason.into()),
        }
    }
}

/// Per-pose angle score against the challenge target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AngleResult {
    pub pose: Pose,
    /// The pose's target yaw in degrees.
    pub target_yaw: f32,
    /// Measured yaw; `None` when the pose was not detected.
    pub actual_yaw: Option<f32>,
    /// Score in 0..=1.
    pub score: f32,
}

/// Cross-pose identity consistency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyResult {
    /// `1 − min(average_distance, 1)`; 0 when fewer than two descriptors.
    pub score: f32,
    /// Mean pairwise Euclidean distance between pose descriptors.
    pub average_distance: f32,
    /// How many valid descriptors entered the comparison.
    pub valid_descriptors: usize,
}

/// Outcome of the static-attack heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticCheck {
    /// Whether the weighted indicators exceeded the suspicion threshold.
    pub suspected: bool,
    /// Sum of triggered indicator weights.
    pub total_weight: f32,
    /// Names of the indicators that fired.
    pub indicators: Vec<String>,
}

/// Everything the fusion step looked at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessDetails {
    pub pose_analyses: Vec<PoseAnalysis>,
    pub consistency: ConsistencyResult,
    pub angle_results: Vec<AngleResult>,
    pub static_suspected: bool,
}

/// Verdict of the 3-pose liveness challenge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResult {
    /// `true` iff the fused score passes and no static attack is suspected.
    pub is_live: bool,
    /// Fused score in 0..=1.
    pub score: f32,
    /// Human-readable verdict reason.
    pub reason: String,
    /// Component breakdown.
    pub details: LivenessDetails,
}

/// Portrait-to-selfie comparison result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchResult {
    /// Display similarity: `max(0, 1 − distance / 1.2)`.
    pub similarity: f32,
    /// Euclidean distance between the descriptors.
    pub distance: f32,
    /// `true` iff `distance < 0.6`.
    pub is_match: bool,
}
