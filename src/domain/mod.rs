//! Data model for the verification pipeline.
//!
//! * [`mrz`] - Parsed MRZ record, quality score, and checksum report
//! * [`biometrics`] - Portrait, poses, liveness verdict, and match result
//! * [`attestation`] - The final merged record

pub mod attestation;
pub mod biometrics;
pub mod mrz;

/// A raw camera bitmap: width, height, 8-bit RGBA pixels. Transient; produced
/// by the camera collaborator on demand and dropped when its phase completes.
pub type Frame = image::RgbaImage;

pub use attestation::{Attestation, BiometricSummary, VerificationStatus};
pub use biometrics::{
    AngleResult, ConsistencyResult, LivenessDetails, LivenessResult, MatchResult, Portrait, Pose,
    PoseAnalysis, StaticCheck,
};
pub use mrz::{ChecksumReport, DocumentType, Gender, MrzQuality, MrzRecord, QualityBand};
