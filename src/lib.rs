//! # idverify
//!
//! End-to-end identity verification of a natural person against an ICAO 9303
//! machine-readable travel or identity document (TD1/TD2/TD3).
//!
//! The pipeline binds three evidences together:
//! - the document's MRZ fields, parsed from a capture of the back of the ID;
//! - the portrait photograph isolated from the front of the ID;
//! - a live selfie that matches the portrait and passes a 3-pose liveness
//!   challenge.
//!
//! The output is a structured [`Attestation`](domain::Attestation) carrying
//! identity fields, document type, a biometric match score, and a liveness
//! verdict.
//!
//! ## Modules
//!
//! * [`core`] - Error taxonomy, typed events, constants, and collaborator traits
//! * [`domain`] - Data model (MRZ record, biometrics, attestation)
//! * [`mrz`] - MRZ cleaning, checksum validation, parsing, and quality scoring
//! * [`processors`] - Image preprocessing for OCR and region cropping
//! * [`biometrics`] - Pose geometry, liveness fusion, portrait extraction, matching
//! * [`pipeline`] - The four-phase verification controller and its stages
//!
//! Camera acquisition, OCR, and face detection are external collaborators
//! behind traits in [`core::traits`]; the pipeline never touches device or
//! model APIs directly, so a headless harness can drive it with frames alone.

pub mod biometrics;
pub mod core;
pub mod domain;
pub mod mrz;
pub mod pipeline;
pub mod processors;

/// Prelude module for convenient imports.
pub mod prelude {
    // Error handling
    pub use crate::core::{ErrorKind, VerifyError, VerifyResult};

    // Collaborator seams
    pub use crate::core::traits::{
        CameraSource, Clock, DetectionMode, EventSink, Facing, FaceDetection, FaceScanner,
        OcrEngine, OcrOptions, OcrOutput, StreamId, SystemClock,
    };

    // Data model
    pub use crate::domain::{
        Attestation, DocumentType, Frame, Gender, LivenessResult, MatchResult, MrzQuality,
        MrzRecord, Portrait, Pose, PoseAnalysis, QualityBand,
    };

    // Events
    pub use crate::core::events::{NoopSink, PhasePayload, PipelineEvent};

    // Pipeline (high-level API)
    pub use crate::pipeline::{Phase, PipelineConfig, VerificationPipeline};
}
