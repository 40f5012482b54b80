//! Collaborator traits at the pipeline's outer seams.
//!
//! The core never touches camera, OCR, or detector APIs directly: it drives
//! the traits defined here. Production code plugs in device-backed
//! implementations; tests supply frames and canned detections directly.

use std::time::Duration;

use crate::core::errors::VerifyResult;
use crate::domain::Frame;

/// Which way the requested camera faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    /// Front (selfie) camera.
    User,
    /// Rear (document) camera.
    Environment,
}

/// Opaque handle to a live camera stream, issued by the camera collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u32);

/// Camera acquisition surface.
///
/// Only the phase controller calls these methods, and it guarantees that a
/// stream is released before the next phase's stream is acquired.
pub trait CameraSource {
    /// Opens a stream facing the given direction at the preferred resolution.
    fn acquire(&mut self, facing: Facing, resolution: (u32, u32)) -> VerifyResult<StreamId>;

    /// Stops the stream and frees the device.
    fn release(&mut self, id: StreamId);

    /// Whether the stream has produced its first decodable frame.
    fn is_ready(&mut self, id: StreamId) -> bool;

    /// Grabs the current frame from the stream.
    fn frame(&mut self, id: StreamId) -> VerifyResult<Frame>;

    /// Enables or disables frame delivery without releasing the device.
    ///
    /// Used while the application is hidden; a disabled stream stays acquired.
    fn set_enabled(&mut self, id: StreamId, enabled: bool);
}

/// Page segmentation hint for the OCR collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSegMode {
    /// Treat the image as a single uniform block of text.
    UniformBlock,
    /// Fully automatic segmentation.
    Auto,
}

/// Options for one OCR invocation.
#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Page segmentation mode.
    pub psm: PageSegMode,
    /// Restrict recognition to these characters, if set.
    pub whitelist: Option<String>,
    /// DPI hint for the engine.
    pub dpi: u32,
    /// Keep inter-word spaces in the output.
    pub preserve_spaces: bool,
}

/// Output of one OCR invocation.
#[derive(Debug, Clone)]
pub struct OcrOutput {
    /// Raw recognized text, line breaks preserved.
    pub text: String,
    /// Mean word confidence in 0..100, if the engine reports one.
    pub confidence: Option<f32>,
}

/// Text recognition surface.
pub trait OcrEngine {
    /// Recognizes text in the frame under the given options.
    fn recognize(&mut self, frame: &Frame, options: &OcrOptions) -> VerifyResult<OcrOutput>;
}

/// Detection mode for the face collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionMode {
    /// High-accuracy detector with a minimum confidence gate.
    Accurate {
        /// Detections below this confidence are discarded.
        min_confidence: f32,
    },
    /// Fast detector with a fixed input size.
    Fast {
        /// Side length the input is resized to before detection.
        input_size: u32,
        /// Score threshold for candidate boxes.
        score_threshold: f32,
    },
}

/// Axis-aligned face bounding box in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl FaceBox {
    /// Area of the box in square pixels.
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// A single detected face: box, 68 landmarks, and its descriptor.
///
/// The descriptor is an owned copy; implementations must not hand out
/// references into detector-owned buffers.
#[derive(Debug, Clone)]
pub struct FaceDetection {
    /// Bounding box of the face.
    pub face_box: FaceBox,
    /// The 68 facial landmarks as (x, y) frame coordinates.
    pub landmarks: Vec<(f32, f32)>,
    /// Face embedding; expected to hold 128 floats.
    pub descriptor: Vec<f32>,
    /// Detector confidence for this face.
    pub confidence: f32,
}

/// Face detection surface.
pub trait FaceScanner {
    /// Detects the single most prominent face, or `None` if no face passes
    /// the mode's threshold.
    fn detect(&mut self, frame: &Frame, mode: &DetectionMode)
        -> VerifyResult<Option<FaceDetection>>;
}

/// Time source for countdowns, pauses, readiness polling, and timestamps.
pub trait Clock {
    /// Milliseconds since an arbitrary fixed epoch.
    fn now_ms(&mut self) -> u64;

    /// Blocks for the given duration.
    fn sleep(&mut self, duration: Duration);
}

/// Wall-clock [`Clock`] backed by `std::time`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&mut self) -> u64 {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

pub use crate::core::events::EventSink;
