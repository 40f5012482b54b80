//! Phase 3: the 3-pose liveness challenge.
//!
//! Poses run in fixed order (front, left, right). Each pose shows its
//! instruction, counts down three seconds, and grabs one frame; poses are
//! separated by a one-second pause. Captured frames live only for the
//! duration of the challenge; after fusion only the front-pose face crop
//! survives as the selfie image.

use crate::biometrics::liveness::{cross_pose_consistency, fuse, static_attack_check};
use crate::biometrics::pose::{analyze_pose, angle_score};
use crate::core::constants::{
    COUNTDOWN_SECONDS, FACE_MIN_CONFIDENCE, INTER_POSE_PAUSE, PORTRAIT_PADDING_PX,
};
use crate::core::errors::VerifyResult;
use crate::core::events::{EventSink, PipelineEvent};
use crate::core::traits::{CameraSource, Clock, DetectionMode, FaceScanner, StreamId};
use crate::domain::{AngleResult, Frame, LivenessResult, Pose, PoseAnalysis};
use crate::processors::crop::crop_padded;

use std::time::Duration;

/// Everything phase 3 needs downstream of the challenge.
#[derive(Debug)]
pub struct ChallengeOutcome {
    /// The fused liveness verdict.
    pub liveness: LivenessResult,
    /// Descriptor of the front pose, if that capture was usable.
    pub front_descriptor: Option<Vec<f32>>,
    /// Padded face crop of the front pose.
    pub selfie_crop: Option<Frame>,
}

/// Runs the pose challenge against an already-ready selfie stream.
pub fn run_challenge(
    camera: &mut dyn CameraSource,
    scanner: &mut dyn FaceScanner,
    clock: &mut dyn Clock,
    events: &mut dyn EventSink,
    stream: StreamId,
) -> VerifyResult<ChallengeOutcome> {
    let total_steps = Pose::CHALLENGE.len() as u32 * COUNTDOWN_SECONDS;
    let mut analyses: Vec<PoseAnalysis> = Vec::with_capacity(Pose::CHALLENGE.len());
    let mut descriptors: Vec<Option<Vec<f32>>> = Vec::with_capacity(Pose::CHALLENGE.len());
    let mut front_descriptor = None;
    let mut selfie_crop = None;

    for (pose_idx, pose) in Pose::CHALLENGE.iter().enumerate() {
        events.emit(PipelineEvent::Progress {
            label: pose.instruction().to_string(),
            pct: (pose_idx as u32 * 100 / Pose::CHALLENGE.len() as u32) as u8,
        });

        for tick in 0..COUNTDOWN_SECONDS {
            clock.sleep(Duration::from_secs(1));
            let step = pose_idx as u32 * COUNTDOWN_SECONDS + tick + 1;
            events.emit(PipelineEvent::Progress {
                label: format!("{} ({})", pose.instruction(), COUNTDOWN_SECONDS - tick),
                pct: (step * 100 / total_steps) as u8,
            });
        }

        let frame = camera.frame(stream)?;
        let timestamp_ms = clock.now_ms();

        let detection = scanner.detect(
            &frame,
            &DetectionMode::Accurate {
                min_confidence: FACE_MIN_CONFIDENCE,
            },
        )?;

        match detection {
            Some(detection) => {
                let analysis =
                    analyze_pose(*pose, &detection, frame.dimensions(), timestamp_ms);
                if *pose == Pose::Front && analysis.detected {
                    let b = detection.face_box;
                    selfie_crop = Some(crop_padded(
                        &frame,
                        b.x,
                        b.y,
                        b.width,
                        b.height,
                        PORTRAIT_PADDING_PX,
                    ));
                    front_descriptor = Some(detection.descriptor.clone());
                }
                descriptors.push(analysis.detected.then(|| detection.descriptor));
                analyses.push(analysis);
            }
            None => {
                tracing::debug!(pose = %pose, "no face in pose capture");
                descriptors.push(None);
                analyses.push(PoseAnalysis::failed(*pose, timestamp_ms, "no face detected"));
            }
        }
        // Pose frame drops here; only the front crop is retained.

        if pose_idx + 1 < Pose::CHALLENGE.len() {
            clock.sleep(INTER_POSE_PAUSE);
        }
    }

    let consistency = cross_pose_consistency(&descriptors);
    let static_check = static_attack_check(&analyses, &consistency);
    let angle_results: Vec<AngleResult> = analyses.iter().map(angle_score).collect();
    let liveness = fuse(analyses, angle_results, consistency, &static_check);

    Ok(ChallengeOutcome {
        liveness,
        front_descriptor,
        selfie_crop,
    })
}
