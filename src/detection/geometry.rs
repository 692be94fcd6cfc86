//! 身体姿态几何计算模块
//!
//! 将单帧关键点转换为姿态特征：
//! - 躯干倾斜角（肩部中点 → 髋部中点，相对垂直线）
//! - 肩线 / 髋线倾斜角（相对水平线）
//! - 左右腿倾斜角（髋 → 踝，相对垂直线）
//! - 身体中心（肩部中点、左髋、右髋三角形重心）
//! - 头部高度比例（鼻尖 y / 画面高度）
//!
//! 所有函数均为纯函数；缺少所需关键点时返回 `None`，不会 panic。

use crate::detection::types::{BodyAngles, FeatureSet, Joint, JointMap, LegAngles, Point};

/// 线段相对垂直线的夹角（度），范围 [0, 90]
///
/// 0° 表示竖直，90° 表示水平。取绝对值，因此不区分倾斜方向。
pub fn angle_from_vertical(p1: Point, p2: Point) -> f64 {
    let dx = (p2.x - p1.x).abs();
    let dy = (p2.y - p1.y).abs();
    dx.atan2(dy).to_degrees()
}

/// 线段相对水平线的夹角（度），范围 [0, 90]
pub fn angle_from_horizontal(p1: Point, p2: Point) -> f64 {
    let dx = (p2.x - p1.x).abs();
    let dy = (p2.y - p1.y).abs();
    dy.atan2(dx).to_degrees()
}

fn pair(joints: &JointMap, a: Joint, b: Joint) -> Option<(Point, Point)> {
    Some((joints.position(a)?, joints.position(b)?))
}

fn torso_midpoints(joints: &JointMap) -> Option<(Point, Point)> {
    let (ls, rs) = pair(joints, Joint::LeftShoulder, Joint::RightShoulder)?;
    let (lh, rh) = pair(joints, Joint::LeftHip, Joint::RightHip)?;
    Some((Point::midpoint(ls, rs), Point::midpoint(lh, rh)))
}

/// 躯干倾斜角：需要双肩和双髋
pub fn torso_angle(joints: &JointMap) -> Option<f64> {
    let (shoulder_mid, hip_mid) = torso_midpoints(joints)?;
    Some(angle_from_vertical(shoulder_mid, hip_mid))
}

/// 肩线相对水平线的倾斜角
pub fn shoulder_angle(joints: &JointMap) -> Option<f64> {
    let (left, right) = pair(joints, Joint::LeftShoulder, Joint::RightShoulder)?;
    Some(angle_from_horizontal(left, right))
}

/// 髋线相对水平线的倾斜角
pub fn hip_angle(joints: &JointMap) -> Option<f64> {
    let (left, right) = pair(joints, Joint::LeftHip, Joint::RightHip)?;
    Some(angle_from_horizontal(left, right))
}

/// 左右腿（髋 → 踝）相对垂直线的倾斜角，两侧独立计算
pub fn leg_angles(joints: &JointMap) -> LegAngles {
    let leg = |hip, ankle| pair(joints, hip, ankle).map(|(h, a)| angle_from_vertical(h, a));
    LegAngles {
        left: leg(Joint::LeftHip, Joint::LeftAnkle),
        right: leg(Joint::RightHip, Joint::RightAnkle),
    }
}

/// 身体中心：肩部中点、左髋、右髋三点的算术平均
pub fn body_center(joints: &JointMap) -> Option<Point> {
    let (ls, rs) = pair(joints, Joint::LeftShoulder, Joint::RightShoulder)?;
    let (lh, rh) = pair(joints, Joint::LeftHip, Joint::RightHip)?;
    let shoulder_mid = Point::midpoint(ls, rs);
    Some(Point::new(
        (shoulder_mid.x + lh.x + rh.x) / 3.0,
        (shoulder_mid.y + lh.y + rh.y) / 3.0,
    ))
}

/// 头部高度比例：0 为画面顶部，1 为底部
///
/// 画面高度为 0 时无法归一化，返回 `None`；画面外的鼻尖位置被截断到 [0, 1]。
pub fn head_height_ratio(joints: &JointMap, frame_height: u32) -> Option<f64> {
    if frame_height == 0 {
        return None;
    }
    let nose = joints.position(Joint::Nose)?;
    Some((nose.y / frame_height as f64).clamp(0.0, 1.0))
}

/// 两个中心点之间的欧氏距离（像素）
pub fn center_shift(current: Point, previous: Point) -> f64 {
    current.distance(&previous)
}

/// 汇总所有身体角度
pub fn body_angles(joints: &JointMap) -> BodyAngles {
    let legs = leg_angles(joints);
    BodyAngles {
        torso: torso_angle(joints),
        shoulder: shoulder_angle(joints),
        hip: hip_angle(joints),
        left_leg: legs.left,
        right_leg: legs.right,
    }
}

/// 提取决策引擎所需的三项特征
pub fn extract_features(joints: &JointMap, frame_height: u32) -> FeatureSet {
    FeatureSet {
        torso_angle: torso_angle(joints),
        body_center: body_center(joints),
        head_height_ratio: head_height_ratio(joints, frame_height),
    }
}
