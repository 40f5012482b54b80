//! Constants used throughout the verification pipeline.
//!
//! This module defines thresholds and fixed parameters shared across the MRZ
//! engine, the biometric components, and the phase controller.

use std::time::Duration;

/// Length of a face descriptor vector.
pub const DESCRIPTOR_LEN: usize = 128;

/// Euclidean distance below which two descriptors are considered the same person.
pub const MATCH_DISTANCE_THRESHOLD: f32 = 0.6;

/// Divisor used to map a descriptor distance onto a displayed similarity.
pub const SIMILARITY_NORMALIZER: f32 = 1.2;

/// Line length of a TD1 document (3 lines).
pub const TD1_LINE_LEN: usize = 30;

/// Line length of a TD2 document (2 lines).
pub const TD2_LINE_LEN: usize = 36;

/// Line length of a TD3 document (2 lines).
pub const TD3_LINE_LEN: usize = 44;

/// Cleaned-character count at which an OCR strategy is accepted outright.
pub const MRZ_ACCEPT_LEN: usize = 60;

/// Cleaned-character count below which even the best strategy is rejected.
pub const MRZ_MIN_LEN: usize = 30;

/// Default fraction of frame height where the MRZ region crop begins.
pub const DEFAULT_CROP_START: f32 = 0.65;

/// Crop start used by the dedicated MRZ OCR strategies (bottom 40%).
pub const MRZ_CROP_START: f32 = 0.60;

/// DPI hint passed to the OCR collaborator.
pub const OCR_DPI: u32 = 300;

/// Minimum detector confidence for the accurate single-face pass.
pub const FACE_MIN_CONFIDENCE: f32 = 0.3;

/// Input size for the fast fallback detector.
pub const FAST_DETECTOR_INPUT_SIZE: u32 = 512;

/// Padding in pixels applied around a detected face box when cropping.
pub const PORTRAIT_PADDING_PX: u32 = 20;

/// Seconds of visible countdown before each pose frame is grabbed.
pub const COUNTDOWN_SECONDS: u32 = 3;

/// Pause between poses of the liveness challenge.
pub const INTER_POSE_PAUSE: Duration = Duration::from_secs(1);

/// Fused liveness score required for a live verdict.
pub const LIVENESS_THRESHOLD: f32 = 0.7;

/// Pixel eye distance below which pose geometry is unreliable.
pub const MIN_EYE_DISTANCE_PX: f32 = 10.0;

/// Consistency score above which poses are suspiciously identical.
pub const STATIC_CONSISTENCY_CEILING: f32 = 0.97;

/// Mean inter-pose gap under which capture is suspiciously fast.
pub const STATIC_FAST_GAP_MS: f64 = 800.0;

/// Quality-score variance under which poses are suspiciously uniform.
pub const STATIC_QUALITY_VARIANCE_FLOOR: f32 = 0.002;

/// Sum of all static-attack indicator weights.
pub const STATIC_TOTAL_WEIGHT: f32 = 5.5;

/// Default camera resolution requested on stream acquisition.
pub const DEFAULT_RESOLUTION: (u32, u32) = (1280, 720);

/// How long to wait for a freshly acquired stream to become ready.
pub const VIDEO_READY_TIMEOUT: Duration = Duration::from_secs(5);

/// Interval at which stream readiness is polled.
pub const VIDEO_READY_POLL: Duration = Duration::from_millis(100);
