//! Phase 4: attestation assembly.

use chrono::{DateTime, Utc};

use crate::core::errors::{VerifyError, VerifyResult};
use crate::domain::{
    Attestation, BiometricSummary, LivenessResult, MatchResult, MrzRecord, VerificationStatus,
};

/// Merges the MRZ record and the biometric verdicts into the attestation.
///
/// Refuses to assemble unless the portrait matched and the subject was live;
/// the controller gates on the same condition before reaching this point.
pub fn assemble(
    identity: MrzRecord,
    face_match: &MatchResult,
    liveness: &LivenessResult,
    timestamp_ms: u64,
) -> VerifyResult<Attestation> {
    if !face_match.is_match {
        return Err(VerifyError::FaceMismatch {
            distance: face_match.distance,
        });
    }
    if !liveness.is_live {
        return Err(VerifyError::LivenessFailed {
            reason: liveness.reason.clone(),
        });
    }

    let document_type = identity.document_type;
    Ok(Attestation {
        identity,
        biometrics: BiometricSummary {
            match_score: face_match.similarity,
            is_live: true,
            liveness_score: liveness.score,
            verification_status: VerificationStatus::Verified,
        },
        document_type,
        timestamp: DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
    })
}
