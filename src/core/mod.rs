//! The core module of the verification pipeline.
//!
//! This module contains the cross-cutting pieces every stage depends on:
//! - Constants and thresholds
//! - The error taxonomy and retry mapping
//! - Typed events toward the UI collaborator
//! - Traits for the external collaborators (camera, OCR, face detector, clock)

pub mod constants;
pub mod errors;
pub mod events;
pub mod traits;

pub use constants::*;
pub use errors::{ErrorKind, RetryAction, UserMessage, VerifyError, VerifyResult};
pub use events::{EventSink, NoopSink, PhasePayload, PipelineEvent, RecordingSink};
pub use traits::{
    CameraSource, Clock, DetectionMode, FaceBox, FaceDetection, FaceScanner, Facing, OcrEngine,
    OcrOptions, OcrOutput, PageSegMode, StreamId, SystemClock,
};

/// Initializes the tracing subscriber for logging.
///
/// Typically called once at application start; library consumers that manage
/// their own subscriber should skip it.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}
