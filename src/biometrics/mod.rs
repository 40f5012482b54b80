//! Biometric components: pose geometry, liveness scoring, portrait
//! extraction, and descriptor matching.

pub mod liveness;
pub mod matcher;
pub mod portrait;
pub mod pose;

pub use liveness::{cross_pose_consistency, fuse, static_attack_check};
pub use matcher::{euclidean_distance, match_descriptors};
pub use portrait::extract_portrait;
pub use pose::{analyze_pose, angle_score};
