//! The final attestation record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::mrz::{DocumentType, MrzRecord};

/// Overall verdict stored on the attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// Portrait matched and the subject was live.
    Verified,
}

/// Biometric summary merged into the attestation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiometricSummary {
    /// Portrait-to-selfie similarity in 0..=1.
    pub match_score: f32,
    /// Liveness verdict.
    pub is_live: bool,
    /// Fused liveness score in 0..=1.
    pub liveness_score: f32,
    /// Overall verdict.
    pub verification_status: VerificationStatus,
}

/// Structured output of a completed verification: identity fields, document
/// type, and the biometric verdict, stamped at submission time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attestation {
    /// Identity fields as parsed from the MRZ.
    pub identity: MrzRecord,
    /// Biometric verdict.
    pub biometrics: BiometricSummary,
    /// Document format, duplicated from the identity for flat consumers.
    pub document_type: DocumentType,
    /// Submission time (UTC).
    pub timestamp: DateTime<Utc>,
}
