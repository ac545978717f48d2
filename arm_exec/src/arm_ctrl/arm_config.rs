//! Arm Configuration structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// Internal
use super::{
    inverse_kinematics::PositionSolution, orientation::WristSolution, ELBOW, HAND, NUM_JOINTS,
    SHOULDER_ELEVATION, SHOULDER_ROTATION, WRIST_FLEX, WRIST_TWIST,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Stores an arm configuration, the angle of every joint relative to its
/// geometric zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArmConfig {
    /// Joint angles in joint index order.
    ///
    /// Units: radians
    pub joint_angles_rad: [f64; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmConfig {
    /// Assemble a configuration from the position and wrist solutions and
    /// the hand angle.
    pub fn from_solutions(
        position: &PositionSolution,
        wrist: &WristSolution,
        hand_rad: f64,
    ) -> Self {
        let mut joint_angles_rad = [0f64; NUM_JOINTS];

        joint_angles_rad[SHOULDER_ROTATION] = position.shoulder_rotation_rad;
        joint_angles_rad[SHOULDER_ELEVATION] = position.shoulder_elevation_rad;
        joint_angles_rad[ELBOW] = position.elbow_rad;
        joint_angles_rad[WRIST_TWIST] = wrist.wrist_twist_rad;
        joint_angles_rad[WRIST_FLEX] = wrist.wrist_flex_rad;
        joint_angles_rad[HAND] = hand_rad;

        Self { joint_angles_rad }
    }

    /// Recover the configuration that a set of servo angles drives the arm
    /// into, by removing each servo's zero offset.
    pub fn from_servo_angles(
        servo_angles_deg: &[f64; NUM_JOINTS],
        servo_zero_deg: &[f64; NUM_JOINTS],
    ) -> Self {
        let mut joint_angles_rad = [0f64; NUM_JOINTS];

        for i in 0..NUM_JOINTS {
            joint_angles_rad[i] = (servo_angles_deg[i] - servo_zero_deg[i]).to_radians();
        }

        Self { joint_angles_rad }
    }

    /// Angles the servos must be commanded to, before bounding, to reach
    /// this configuration.
    ///
    /// Units: radians
    pub fn servo_angles_rad(&self, servo_zero_deg: &[f64; NUM_JOINTS]) -> [f64; NUM_JOINTS] {
        let mut servo_rad = [0f64; NUM_JOINTS];

        for i in 0..NUM_JOINTS {
            servo_rad[i] = self.joint_angles_rad[i] + servo_zero_deg[i].to_radians();
        }

        servo_rad
    }
}
