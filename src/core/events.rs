//! Typed events emitted toward the UI collaborator.
//!
//! The UI never reads pipeline internals; it renders what arrives here. The
//! variants mirror the four notifications of the verification flow: phase
//! entry, progress, phase success with a typed payload, and phase failure
//! with an error kind and display message.

use crate::core::errors::ErrorKind;
use crate::domain::{LivenessResult, MatchResult, MrzRecord};
use crate::pipeline::Phase;

/// Payload attached to a successful phase.
#[derive(Debug, Clone)]
pub enum PhasePayload {
    /// Phase 1: the parsed MRZ record.
    Mrz(MrzRecord),
    /// Phase 2: portrait extracted; descriptor is retained internally.
    PortraitCaptured,
    /// Phase 3: liveness verdict and portrait match.
    Biometrics {
        liveness: LivenessResult,
        face_match: MatchResult,
    },
    /// Phase 4: the attestation was assembled and emitted.
    Submitted,
}

/// Event stream consumed by the UI collaborator.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// The controller entered a phase.
    PhaseEntered { phase: Phase },
    /// Progress within the current phase.
    Progress { label: String, pct: u8 },
    /// The current phase completed.
    PhaseSucceeded { phase: Phase, payload: PhasePayload },
    /// The current phase failed; the controller stays on it for retry.
    PhaseFailed {
        phase: Phase,
        kind: ErrorKind,
        message: String,
    },
}

/// Receiver for [`PipelineEvent`]s.
pub trait EventSink {
    /// Delivers one event. Implementations must not call back into the pipeline.
    fn emit(&mut self, event: PipelineEvent);
}

/// An [`EventSink`] that drops everything.
#[derive(Debug, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&mut self, _event: PipelineEvent) {}
}

/// An [`EventSink`] that records events for inspection.
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Events in arrival order.
    pub events: Vec<PipelineEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: PipelineEvent) {
        self.events.push(event);
    }
}
