use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named body landmark, following the 33-point MediaPipe Pose vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    Nose,
    LeftEyeInner,
    LeftEye,
    LeftEyeOuter,
    RightEyeInner,
    RightEye,
    RightEyeOuter,
    LeftEar,
    RightEar,
    MouthLeft,
    MouthRight,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftPinky,
    RightPinky,
    LeftIndex,
    RightIndex,
    LeftThumb,
    RightThumb,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftFootIndex,
    RightFootIndex,
}

impl Joint {
    pub const ALL: [Joint; 33] = [
        Joint::Nose,
        Joint::LeftEyeInner,
        Joint::LeftEye,
        Joint::LeftEyeOuter,
        Joint::RightEyeInner,
        Joint::RightEye,
        Joint::RightEyeOuter,
        Joint::LeftEar,
        Joint::RightEar,
        Joint::MouthLeft,
        Joint::MouthRight,
        Joint::LeftShoulder,
        Joint::RightShoulder,
        Joint::LeftElbow,
        Joint::RightElbow,
        Joint::LeftWrist,
        Joint::RightWrist,
        Joint::LeftPinky,
        Joint::RightPinky,
        Joint::LeftIndex,
        Joint::RightIndex,
        Joint::LeftThumb,
        Joint::RightThumb,
        Joint::LeftHip,
        Joint::RightHip,
        Joint::LeftKnee,
        Joint::RightKnee,
        Joint::LeftAnkle,
        Joint::RightAnkle,
        Joint::LeftHeel,
        Joint::RightHeel,
        Joint::LeftFootIndex,
        Joint::RightFootIndex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Joint::Nose => "nose",
            Joint::LeftEyeInner => "left_eye_inner",
            Joint::LeftEye => "left_eye",
            Joint::LeftEyeOuter => "left_eye_outer",
            Joint::RightEyeInner => "right_eye_inner",
            Joint::RightEye => "right_eye",
            Joint::RightEyeOuter => "right_eye_outer",
            Joint::LeftEar => "left_ear",
            Joint::RightEar => "right_ear",
            Joint::MouthLeft => "mouth_left",
            Joint::MouthRight => "mouth_right",
            Joint::LeftShoulder => "left_shoulder",
            Joint::RightShoulder => "right_shoulder",
            Joint::LeftElbow => "left_elbow",
            Joint::RightElbow => "right_elbow",
            Joint::LeftWrist => "left_wrist",
            Joint::RightWrist => "right_wrist",
            Joint::LeftPinky => "left_pinky",
            Joint::RightPinky => "right_pinky",
            Joint::LeftIndex => "left_index",
            Joint::RightIndex => "right_index",
            Joint::LeftThumb => "left_thumb",
            Joint::RightThumb => "right_thumb",
            Joint::LeftHip => "left_hip",
            Joint::RightHip => "right_hip",
            Joint::LeftKnee => "left_knee",
            Joint::RightKnee => "right_knee",
            Joint::LeftAnkle => "left_ankle",
            Joint::RightAnkle => "right_ankle",
            Joint::LeftHeel => "left_heel",
            Joint::RightHeel => "right_heel",
            Joint::LeftFootIndex => "left_foot_index",
            Joint::RightFootIndex => "right_foot_index",
        }
    }
}

impl fmt::Display for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown joint name: {0}")]
pub struct UnknownJoint(pub String);

impl FromStr for Joint {
    type Err = UnknownJoint;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Joint::ALL
            .iter()
            .copied()
            .find(|j| j.as_str() == name)
            .ok_or_else(|| UnknownJoint(name.to_string()))
    }
}

/// 2-D point in pixel space. Midpoints and centroids are kept fractional.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(a: Point, b: Point) -> Point {
        Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Integer pixel position of one landmark as reported by the pose source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: i32,
    pub y: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<f64>,
}

impl Landmark {
    pub fn new(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            visibility: None,
        }
    }

    pub fn with_visibility(x: i32, y: i32, visibility: f64) -> Self {
        Self {
            x,
            y,
            visibility: Some(visibility),
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }

    /// Landmarks without a visibility score are always accepted.
    pub fn is_visible(&self, min_visibility: f64) -> bool {
        match self.visibility {
            Some(v) if v.is_finite() => v >= min_visibility,
            Some(_) => false,
            None => true,
        }
    }
}

/// One frame's worth of landmarks keyed by joint.
///
/// Serializes as a plain JSON object keyed by joint name. Names outside the
/// vocabulary are dropped on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "HashMap<String, Landmark>",
    into = "HashMap<String, Landmark>"
)]
pub struct JointMap {
    joints: HashMap<Joint, Landmark>,
}

impl JointMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_named<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Landmark)>,
        S: AsRef<str>,
    {
        let mut map = Self::new();
        for (name, landmark) in entries {
            match name.as_ref().parse::<Joint>() {
                Ok(joint) => {
                    map.joints.insert(joint, landmark);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring landmark outside joint vocabulary");
                }
            }
        }
        map
    }

    pub fn insert(&mut self, joint: Joint, landmark: Landmark) -> Option<Landmark> {
        self.joints.insert(joint, landmark)
    }

    /// Builder-style insert of a landmark without visibility.
    pub fn with(mut self, joint: Joint, x: i32, y: i32) -> Self {
        self.joints.insert(joint, Landmark::new(x, y));
        self
    }

    pub fn remove(&mut self, joint: Joint) -> Option<Landmark> {
        self.joints.remove(&joint)
    }

    pub fn get(&self, joint: Joint) -> Option<&Landmark> {
        self.joints.get(&joint)
    }

    pub fn position(&self, joint: Joint) -> Option<Point> {
        self.joints.get(&joint).map(Landmark::point)
    }

    pub fn contains(&self, joint: Joint) -> bool {
        self.joints.contains_key(&joint)
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Joint, &Landmark)> {
        self.joints.iter()
    }

    /// Copy of the map without landmarks whose reported visibility is below `min_visibility`.
    pub fn visible(&self, min_visibility: f64) -> JointMap {
        JointMap {
            joints: self
                .joints
                .iter()
                .filter(|(_, lm)| lm.is_visible(min_visibility))
                .map(|(j, lm)| (*j, *lm))
                .collect(),
        }
    }
}

impl From<HashMap<String, Landmark>> for JointMap {
    fn from(raw: HashMap<String, Landmark>) -> Self {
        JointMap::from_named(raw)
    }
}

impl From<JointMap> for HashMap<String, Landmark> {
    fn from(map: JointMap) -> Self {
        map.joints
            .into_iter()
            .map(|(j, lm)| (j.as_str().to_string(), lm))
            .collect()
    }
}

impl FromIterator<(Joint, Landmark)> for JointMap {
    fn from_iter<T: IntoIterator<Item = (Joint, Landmark)>>(iter: T) -> Self {
        JointMap {
            joints: iter.into_iter().collect(),
        }
    }
}

/// Per-frame posture features. Each field is absent when its joints are missing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureSet {
    pub torso_angle: Option<f64>,
    pub body_center: Option<Point>,
    pub head_height_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LegAngles {
    pub left: Option<f64>,
    pub right: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyAngles {
    pub torso: Option<f64>,
    pub shoulder: Option<f64>,
    pub hip: Option<f64>,
    pub left_leg: Option<f64>,
    pub right_leg: Option<f64>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    None,
    Mild,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "NONE",
            Severity::Mild => "MILD",
            Severity::Severe => "SEVERE",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upright reference posture captured during calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    pub head_height_ratio: f64,
    pub body_center: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AlertState {
    pub consecutive_detections: u32,
    /// `None` until the first alarm fires.
    pub last_alert_time: Option<f64>,
}

/// Outcome of one `evaluate` call. Field names are part of the logging format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub is_fall_detected: bool,
    pub severity: Severity,
    pub torso_angle: Option<f64>,
    pub body_center: Option<Point>,
    pub head_height_ratio: Option<f64>,
    pub center_shift: Option<f64>,
    pub trigger_reasons: Vec<String>,
    pub confidence: f64,
    pub timestamp: f64,
}

impl DetectionResult {
    /// Result for a frame in which no person was found.
    pub fn empty(timestamp: f64) -> Self {
        Self {
            is_fall_detected: false,
            severity: Severity::None,
            torso_angle: None,
            body_center: None,
            head_height_ratio: None,
            center_shift: None,
            trigger_reasons: Vec::new(),
            confidence: 0.0,
            timestamp,
        }
    }

    pub fn trigger_count(&self) -> usize {
        self.trigger_reasons.len()
    }
}

/// A single frame as delivered by the pose source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseFrame {
    /// Monotonic seconds. When absent the monitor's clock is used.
    #[serde(default)]
    pub timestamp: Option<f64>,
    pub frame_height: u32,
    /// `None` when no person was detected in the frame.
    #[serde(default)]
    pub joints: Option<JointMap>,
}
