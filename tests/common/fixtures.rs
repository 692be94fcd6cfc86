use fall_sentinel::detection::types::{Joint, JointMap, PoseFrame};
use fall_sentinel::detection::{DetectorConfig, FallDecisionEngine};

pub const FRAME_HEIGHT: u32 = 480;

/// Upright subject: vertical torso, nose near the top of the frame.
pub fn standing() -> JointMap {
    JointMap::new()
        .with(Joint::Nose, 150, 60)
        .with(Joint::LeftShoulder, 100, 100)
        .with(Joint::RightShoulder, 200, 100)
        .with(Joint::LeftHip, 100, 300)
        .with(Joint::RightHip, 200, 300)
}

/// Subject on the floor: shoulder-mid (100,130) to hip-mid (300,180), about 76° from vertical.
pub fn lying() -> JointMap {
    JointMap::new()
        .with(Joint::Nose, 80, 130)
        .with(Joint::LeftShoulder, 100, 100)
        .with(Joint::RightShoulder, 100, 160)
        .with(Joint::LeftHip, 300, 150)
        .with(Joint::RightHip, 300, 210)
}

/// Same pose with every landmark translated by `(dx, dy)`.
pub fn shifted(joints: &JointMap, dx: i32, dy: i32) -> JointMap {
    joints
        .iter()
        .map(|(joint, lm)| {
            let mut moved = *lm;
            moved.x += dx;
            moved.y += dy;
            (*joint, moved)
        })
        .collect()
}

pub fn with_nose_at(joints: &JointMap, y: i32) -> JointMap {
    let x = joints.get(Joint::Nose).map(|lm| lm.x).unwrap_or(150);
    joints.clone().with(Joint::Nose, x, y)
}

pub fn frame(joints: JointMap, timestamp: f64) -> PoseFrame {
    PoseFrame {
        timestamp: Some(timestamp),
        frame_height: FRAME_HEIGHT,
        joints: Some(joints),
    }
}

pub fn engine() -> FallDecisionEngine {
    FallDecisionEngine::new(DetectorConfig::default()).expect("default config is valid")
}

pub fn engine_with(config: DetectorConfig) -> FallDecisionEngine {
    FallDecisionEngine::new(config).expect("test config is valid")
}
