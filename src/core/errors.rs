//! Error types for the verification pipeline.
//!
//! Every failure a phase can produce is a variant of [`VerifyError`]. The
//! controller maps each variant to a user-actionable retry through
//! [`VerifyError::retry_action`] and to a display message through
//! [`VerifyError::user_message`]; the technical detail stays on the error
//! itself for logging.

use thiserror::Error;

/// Convenience result alias used across the crate.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Enum representing the errors that can occur during verification.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The user denied camera access.
    #[error("camera permission denied")]
    CameraPermissionDenied,

    /// No camera device matching the requested facing direction exists.
    #[error("no camera available")]
    NoCamera,

    /// A camera stream did not become ready within the timeout.
    #[error("video stream not ready after {timeout_ms} ms")]
    VideoTimeout {
        /// How long readiness was polled before giving up.
        timeout_ms: u64,
    },

    /// A detector or recognizer model failed to load.
    #[error("model load failed: {context}")]
    ModelLoadFailure {
        /// Which model and why.
        context: String,
    },

    /// The OCR collaborator is not installed or failed to initialize.
    #[error("OCR backend missing")]
    OcrBackendMissing,

    /// No OCR strategy produced enough MRZ-plausible characters.
    #[error("MRZ unreadable: {context}")]
    MrzUnreadable {
        /// Best cleaned length observed, strategy notes.
        context: String,
    },

    /// Cleaned text was recovered but no document format accepted it.
    #[error("MRZ unparseable: {context}")]
    MrzUnparseable {
        /// What the format parsers rejected.
        context: String,
    },

    /// Neither the accurate nor the fast detector found a face on the document.
    #[error("no face found on the document")]
    NoFaceOnDocument,

    /// A face descriptor did not have the expected length.
    #[error("descriptor length {actual}, expected {expected}")]
    DescriptorInvalid {
        /// The required descriptor length.
        expected: usize,
        /// The length that was produced.
        actual: usize,
    },

    /// The liveness challenge concluded the subject is not live.
    #[error("liveness check failed: {reason}")]
    LivenessFailed {
        /// Human-readable reason from the fusion step.
        reason: String,
    },

    /// The static-attack heuristic flagged the pose sequence.
    #[error("static picture suspected")]
    StaticAttackSuspected,

    /// The selfie does not match the document portrait.
    #[error("face mismatch at distance {distance:.3}")]
    FaceMismatch {
        /// Euclidean distance between the portrait and selfie descriptors.
        distance: f32,
    },

    /// A transient collaborator failure worth retrying as-is.
    #[error("transient failure")]
    Transient(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Fieldless mirror of [`VerifyError`] for typed event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    CameraPermissionDenied,
    NoCamera,
    VideoTimeout,
    ModelLoadFailure,
    OcrBackendMissing,
    MrzUnreadable,
    MrzUnparseable,
    NoFaceOnDocument,
    DescriptorInvalid,
    LivenessFailed,
    StaticAttackSuspected,
    FaceMismatch,
    Transient,
}

/// Retry trigger offered to the user after a phase failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAction {
    /// Re-capture the back of the document (MRZ phase).
    RecaptureBack,
    /// Re-capture the front of the document (portrait phase).
    RecaptureFront,
    /// Re-run the 3-pose liveness challenge.
    RerunChallenge,
    /// Nothing phase-local helps; restart the whole session.
    Refresh,
}

/// User-visible failure description: category, explanation, troubleshooting tips.
#[derive(Debug, Clone)]
pub struct UserMessage {
    /// Short category label.
    pub label: &'static str,
    /// One-sentence explanation.
    pub explanation: &'static str,
    /// Two to four troubleshooting tips.
    pub tips: &'static [&'static str],
}

impl VerifyError {
    /// Creates a transient error wrapping an arbitrary cause.
    pub fn transient(cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transient(Box::new(cause))
    }

    /// Creates a model-load error with context.
    pub fn model_load(context: impl Into<String>) -> Self {
        Self::ModelLoadFailure {
            context: context.into(),
        }
    }

    /// The fieldless kind of this error, for event payloads.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CameraPermissionDenied => ErrorKind::CameraPermissionDenied,
            Self::NoCamera => ErrorKind::NoCamera,
            Self::VideoTimeout { .. } => ErrorKind::VideoTimeout,
            Self::ModelLoadFailure { .. } => ErrorKind::ModelLoadFailure,
            Self::OcrBackendMissing => ErrorKind::OcrBackendMissing,
            Self::MrzUnreadable { .. } => ErrorKind::MrzUnreadable,
            Self::MrzUnparseable { .. } => ErrorKind::MrzUnparseable,
            Self::NoFaceOnDocument => ErrorKind::NoFaceOnDocument,
            Self::DescriptorInvalid { .. } => ErrorKind::DescriptorInvalid,
            Self::LivenessFailed { .. } => ErrorKind::LivenessFailed,
            Self::StaticAttackSuspected => ErrorKind::StaticAttackSuspected,
            Self::FaceMismatch { .. } => ErrorKind::FaceMismatch,
            Self::Transient(_) => ErrorKind::Transient,
        }
    }

    /// Whether the failure is recoverable by a phase-local retry.
    ///
    /// Model-load failures are the exception: they are logged, demoted, and
    /// reattempted on demand by the phase that needs the model.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ModelLoadFailure { .. })
    }

    /// Maps the error to the retry trigger the UI should offer.
    pub fn retry_action(&self) -> RetryAction {
        match self {
            Self::MrzUnreadable { .. } | Self::MrzUnparseable { .. } => RetryAction::RecaptureBack,
            Self::NoFaceOnDocument => RetryAction::RecaptureFront,
            Self::LivenessFailed { .. }
            | Self::StaticAttackSuspected
            | Self::FaceMismatch { .. }
            | Self::DescriptorInvalid { .. }
            | Self::Transient(_) => RetryAction::RerunChallenge,
            Self::CameraPermissionDenied
            | Self::NoCamera
            | Self::VideoTimeout { .. }
            | Self::ModelLoadFailure { .. }
            | Self::OcrBackendMissing => RetryAction::Refresh,
        }
    }

    /// The user-facing message for this error.
    pub fn user_message(&self) -> UserMessage {
        match self {
            Self::CameraPermissionDenied => UserMessage {
                label: "Camera access denied",
                explanation: "Verification needs the camera to capture your document and face.",
                tips: &[
                    "Allow camera access when prompted",
                    "Check browser or system camera permissions",
                    "Reload and try again",
                ],
            },
            Self::NoCamera => UserMessage {
                label: "No camera found",
                explanation: "No camera matching the required direction was detected.",
                tips: &[
                    "Connect or enable a camera",
                    "Close other applications using the camera",
                ],
            },
            Self::VideoTimeout { .. } => UserMessage {
                label: "Camera did not start",
                explanation: "The video stream never became ready.",
                tips: &[
                    "Close other applications using the camera",
                    "Reload and try again",
                ],
            },
            Self::ModelLoadFailure { .. } => UserMessage {
                label: "Models unavailable",
                explanation: "A recognition model could not be loaded; it will be retried.",
                tips: &["Check your network connection", "Try the step again"],
            },
            Self::OcrBackendMissing => UserMessage {
                label: "Text recognition unavailable",
                explanation: "The OCR engine could not be initialized.",
                tips: &["Reload the page", "Check your network connection"],
            },
            Self::MrzUnreadable { .. } | Self::MrzUnparseable { .. } => UserMessage {
                label: "Document not readable",
                explanation: "The machine-readable zone could not be read from the capture.",
                tips: &[
                    "Hold the document flat and steady",
                    "Avoid glare on the MRZ lines",
                    "Fill the frame with the back of the document",
                    "Use better lighting",
                ],
            },
            Self::NoFaceOnDocument => UserMessage {
                label: "Portrait not found",
                explanation: "No face was detected on the front of the document.",
                tips: &[
                    "Show the side of the document with the photo",
                    "Avoid glare over the portrait",
                    "Move the document closer to the camera",
                ],
            },
            Self::DescriptorInvalid { .. } => UserMessage {
                label: "Face capture failed",
                explanation: "The face reading was incomplete; please try again.",
                tips: &[
                    "Keep your face fully in frame",
                    "Try again with better lighting",
                ],
            },
            Self::LivenessFailed { .. } => UserMessage {
                label: "Liveness check failed",
                explanation: "The pose challenge did not confirm a live subject.",
                tips: &[
                    "Follow the turn instructions exactly",
                    "Keep your whole face visible",
                    "Remove hats or glasses that hide your eyes",
                ],
            },
            Self::StaticAttackSuspected => UserMessage {
                label: "Static picture suspected",
                explanation: "The captures look like a photograph rather than a live person.",
                tips: &[
                    "Verification must be done by the document holder in person",
                    "Do not hold a photo or screen up to the camera",
                ],
            },
            Self::FaceMismatch { .. } => UserMessage {
                label: "Face does not match",
                explanation: "Your selfie does not match the document portrait.",
                tips: &[
                    "Verify with your own document",
                    "Face the camera straight on",
                    "Use even, front-facing lighting",
                ],
            },
            Self::Transient(_) => UserMessage {
                label: "Temporary problem",
                explanation: "Something went wrong; the step can simply be retried.",
                tips: &["Try the step again", "Reload if the problem persists"],
            },
        }
    }
}
