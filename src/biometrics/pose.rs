//! Per-pose face geometry: yaw estimation, face quality, and angle scoring.
//!
//! Yaw comes from the horizontal offset of the nose tip against the outer
//! eye corners of the 68-landmark model. The sign convention is positive
//! toward camera-right.

use crate::core::constants::MIN_EYE_DISTANCE_PX;
use crate::core::traits::FaceDetection;
use crate::domain::{AngleResult, Pose, PoseAnalysis};

/// Outer corner of the left eye in the 68-landmark model.
pub const LEFT_EYE_OUTER: usize = 36;
/// Outer corner of the right eye.
pub const RIGHT_EYE_OUTER: usize = 45;
/// Nose tip.
pub const NOSE_TIP: usize = 30;

/// Analyzes one pose capture from its face detection.
///
/// `frame_dims` is the capture's (width, height); `timestamp_ms` the grab
/// time. A detection with degenerate eye geometry becomes a failed analysis
/// with an error flag.
pub fn analyze_pose(
    pose: Pose,
    detection: &FaceDetection,
    frame_dims: (u32, u32),
    timestamp_ms: u64,
) -> PoseAnalysis {
    if detection.landmarks.len() <= RIGHT_EYE_OUTER {
        return PoseAnalysis::failed(pose, timestamp_ms, "landmark model returned too few points");
    }

    let left_eye = detection.landmarks[LEFT_EYE_OUTER];
    let right_eye = detection.landmarks[RIGHT_EYE_OUTER];
    let nose = detection.landmarks[NOSE_TIP];

    let eye_distance = (right_eye.0 - left_eye.0).abs();
    if eye_distance < MIN_EYE_DISTANCE_PX {
        let mut poor = PoseAnalysis::failed(pose, timestamp_ms, "face too small: eyes too close");
        poor.eye_distance_px = eye_distance;
        return poor;
    }

    let eye_center_x = (left_eye.0 + right_eye.0) / 2.0;
    let nose_offset = nose.0 - eye_center_x;
    let yaw = (nose_offset / eye_distance * 45.0).clamp(-45.0, 45.0);

    PoseAnalysis {
        pose,
        detected: true,
        confidence: detection.confidence,
        yaw_deg: yaw,
        eye_distance_px: eye_distance,
        quality_score: face_quality(detection, frame_dims, left_eye, right_eye),
        timestamp_ms,
        error: None,
    }
}

/// Face quality in 0..=1: mean of size-ratio, aspect-ratio, and eye-level
/// sub-scores.
fn face_quality(
    detection: &FaceDetection,
    frame_dims: (u32, u32),
    left_eye: (f32, f32),
    right_eye: (f32, f32),
) -> f32 {
    let frame_area = (frame_dims.0 * frame_dims.1) as f32;
    let size_ratio = if frame_area > 0.0 {
        detection.face_box.area() / frame_area
    } else {
        0.0
    };
    let size_score = if (0.1..=0.4).contains(&size_ratio) {
        1.0
    } else {
        0.5
    };

    let aspect = if detection.face_box.height > 0.0 {
        detection.face_box.width / detection.face_box.height
    } else {
        0.0
    };
    let aspect_score = if (0.6..=1.0).contains(&aspect) { 1.0 } else { 0.5 };

    let eye_level_score = (1.0 - (left_eye.1 - right_eye.1).abs() / 20.0).max(0.0);

    (size_score + aspect_score + eye_level_score) / 3.0
}

/// Scores one pose's yaw against its challenge target.
pub fn angle_score(analysis: &PoseAnalysis) -> AngleResult {
    let target = analysis.pose.target_yaw();
    if !analysis.detected {
        return AngleResult {
            pose: analysis.pose,
            target_yaw: target,
            actual_yaw: None,
            score: 0.0,
        };
    }

    let yaw = analysis.yaw_deg;
    let diff = (yaw - target).abs();

    let score = if analysis.pose == Pose::Front {
        match diff {
            d if d <= 10.0 => 1.0,
            d if d <= 15.0 => 0.8,
            d if d <= 20.0 => 0.5,
            d if d <= 30.0 => 0.2,
            _ => 0.0,
        }
    } else if yaw.signum() == target.signum() && yaw != 0.0 {
        let band = match diff {
            d if d <= 10.0 => 1.0,
            d if d <= 15.0 => 0.8,
            d if d <= 25.0 => 0.6,
            d if d <= 35.0 => 0.3,
            _ => 0.1,
        };
        // Reward a committed turn.
        if yaw.abs() >= 15.0 {
            (band * 1.1f32).min(1.0)
        } else {
            band
        }
    } else {
        // Turned the wrong way.
        0.1
    };

    AngleResult {
        pose: analysis.pose,
        target_yaw: target,
        actual_yaw: Some(yaw),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::traits::FaceBox;

    fn detection_with_yaw_landmarks(
        left: (f32, f32),
        right: (f32, f32),
        nose: (f32, f32),
    ) -> FaceDetection {
        let mut landmarks = vec![(0.0, 0.0); 68];
        landmarks[LEFT_EYE_OUTER] = left;
        landmarks[RIGHT_EYE_OUTER] = right;
        landmarks[NOSE_TIP] = nose;
        FaceDetection {
            face_box: FaceBox {
                x: 100.0,
                y: 100.0,
                width: 240.0,
                height: 300.0,
            },
            landmarks,
            descriptor: vec![0.0; 128],
            confidence: 0.9,
        }
    }

    #[test]
    fn test_centered_nose_gives_zero_yaw() {
        let det = detection_with_yaw_landmarks((100.0, 50.0), (200.0, 50.0), (150.0, 90.0));
        let analysis = analyze_pose(Pose::Front, &det, (640, 480), 0);
        assert!(analysis.detected);
        assert!(analysis.yaw_deg.abs() < 1e-6);
        assert_eq!(analysis.eye_distance_px, 100.0);
    }

    #[test]
    fn test_offset_nose_gives_signed_yaw() {
        // Nose 1/3 of eye distance to the right: yaw = 15°.
        let det = detection_with_yaw_landmarks((100.0, 50.0), (220.0, 50.0), (200.0, 90.0));
        let analysis = analyze_pose(Pose::Right, &det, (640, 480), 0);
        assert!((analysis.yaw_deg - 15.0).abs() < 1e-3);

        let det = detection_with_yaw_landmarks((100.0, 50.0), (220.0, 50.0), (120.0, 90.0));
        let analysis = analyze_pose(Pose::Left, &det, (640, 480), 0);
        assert!((analysis.yaw_deg + 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_yaw_is_clipped() {
        let det = detection_with_yaw_landmarks((100.0, 50.0), (120.0, 50.0), (300.0, 90.0));
        let analysis = analyze_pose(Pose::Right, &det, (640, 480), 0);
        assert_eq!(analysis.yaw_deg, 45.0);
    }

    #[test]
    fn test_tiny_eye_distance_is_poor() {
        let det = detection_with_yaw_landmarks((100.0, 50.0), (105.0, 50.0), (102.0, 60.0));
        let analysis = analyze_pose(Pose::Front, &det, (640, 480), 7);
        assert!(!analysis.detected);
        assert!(analysis.error.as_deref().unwrap().contains("too small"));
        assert_eq!(analysis.timestamp_ms, 7);
    }

    #[test]
    fn test_face_quality_in_band() {
        // 240x300 box in 640x480 frame: ratio 0.234 in [0.1, 0.4], aspect
        // 0.8 in [0.6, 1.0], level eyes -> quality 1.0.
        let det = detection_with_yaw_landmarks((100.0, 50.0), (200.0, 50.0), (150.0, 90.0));
        let analysis = analyze_pose(Pose::Front, &det, (640, 480), 0);
        assert!((analysis.quality_score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_face_quality_penalizes_tilt_and_size() {
        let mut det = detection_with_yaw_landmarks((100.0, 30.0), (200.0, 70.0), (150.0, 90.0));
        det.face_box.width = 30.0;
        det.face_box.height = 30.0;
        let analysis = analyze_pose(Pose::Front, &det, (640, 480), 0);
        // size 0.5, aspect 0.5 (1.0 is within band -> recompute): eyes 40px
        // apart vertically floor the level score at 0.
        assert!(analysis.quality_score < 0.6);
    }

    fn analysis(pose: Pose, yaw: f32) -> PoseAnalysis {
        PoseAnalysis {
            pose,
            detected: true,
            confidence: 0.9,
            yaw_deg: yaw,
            eye_distance_px: 100.0,
            quality_score: 0.9,
            timestamp_ms: 0,
            error: None,
        }
    }

    #[test]
    fn test_angle_score_center_bands() {
        for (yaw, expected) in [(0.0, 1.0), (12.0, 0.8), (18.0, 0.5), (28.0, 0.2), (40.0, 0.0)] {
            let r = angle_score(&analysis(Pose::Front, yaw));
            assert_eq!(r.score, expected, "yaw={yaw}");
        }
    }

    #[test]
    fn test_angle_score_side_bands_with_bonus() {
        // -20 target, committed turn: band * 1.1 capped at 1.0.
        let r = angle_score(&analysis(Pose::Left, -22.0));
        assert_eq!(r.score, 1.0);
        // Half-hearted turn at -8: diff 12 -> 0.8, no bonus below 15.
        let r = angle_score(&analysis(Pose::Left, -8.0));
        assert_eq!(r.score, 0.8);
        // Overshoot at -50: diff 30 -> 0.3 with bonus 0.33.
        let r = angle_score(&analysis(Pose::Left, -50.0));
        assert!((r.score - 0.33).abs() < 1e-4);
    }

    #[test]
    fn test_angle_score_wrong_direction() {
        let r = angle_score(&analysis(Pose::Left, 22.0));
        assert_eq!(r.score, 0.1);
        let r = angle_score(&analysis(Pose::Right, -22.0));
        assert_eq!(r.score, 0.1);
    }

    #[test]
    fn test_angle_score_undetected_is_zero() {
        let failed = PoseAnalysis::failed(Pose::Left, 0, "no face");
        let r = angle_score(&failed);
        assert_eq!(r.score, 0.0);
        assert!(r.actual_yaw.is_none());
    }
}
