//! The verification pipeline: phase state machine and stage orchestration.
//!
//! * `controller` - The four-phase controller gating transitions and owning
//!   camera streams
//! * `mrz_stage` - Three-strategy OCR orchestration for phase 1
//! * `liveness_stage` - The 3-pose challenge for phase 3
//! * `attestation` - Final record assembly for phase 4

pub mod attestation;
pub mod controller;
pub mod liveness_stage;
pub mod mrz_stage;

pub use attestation::assemble;
pub use controller::{PipelineBuilder, PipelineConfig, VerificationPipeline};

use serde::{Deserialize, Serialize};

use crate::core::traits::Facing;

/// The linear phase machine. Forward transitions are gated on the previous
/// phase's output; backward transitions are always permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Phase 1: read the MRZ from the back of the document.
    AwaitMrz,
    /// Phase 2: isolate the portrait from the front of the document.
    AwaitPortrait,
    /// Phase 3: liveness challenge and portrait match.
    AwaitLiveness,
    /// Phase 4: review the merged result.
    Review,
    /// Terminal: attestation emitted.
    Submitted,
}

impl Phase {
    /// Monotone index used for ordering checks.
    pub fn index(&self) -> u8 {
        match self {
            Self::AwaitMrz => 1,
            Self::AwaitPortrait => 2,
            Self::AwaitLiveness => 3,
            Self::Review => 4,
            Self::Submitted => 5,
        }
    }

    /// Camera facing this phase needs, if any.
    pub fn facing(&self) -> Option<Facing> {
        match self {
            Self::AwaitMrz | Self::AwaitPortrait => Some(Facing::Environment),
            Self::AwaitLiveness => Some(Facing::User),
            Self::Review | Self::Submitted => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitMrz => write!(f, "mrz"),
            Self::AwaitPortrait => write!(f, "portrait"),
            Self::AwaitLiveness => write!(f, "liveness"),
            Self::Review => write!(f, "review"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}
