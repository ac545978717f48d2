//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use super::{ArmCtrlError, HAND, NUM_JOINTS};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Height of the shoulder pivot above the arm base origin.
    ///
    /// Units: centimeters.
    pub shoulder_offset_cm: f64,

    /// Length of the upper arm, shoulder pivot to elbow pivot.
    ///
    /// Units: centimeters.
    pub upper_arm_length_cm: f64,

    /// Length of the forearm, elbow pivot to wrist.
    ///
    /// Units: centimeters.
    pub forearm_length_cm: f64,

    /// Height of the stacked wrist servos, measured perpendicular to the
    /// hand.
    ///
    /// Units: centimeters.
    pub wrist_stack_height_cm: f64,

    /// Length of the hand, wrist to fingertip.
    ///
    /// Units: centimeters.
    pub hand_length_cm: f64,

    // ---- CAPABILITIES ----
    /// Inclusive `[min, max]` servo angle of each joint.
    ///
    /// Units: degrees
    pub joint_bounds_deg: [[f64; 2]; NUM_JOINTS],

    /// Servo angle at which each joint is at its zero position.
    ///
    /// Units: degrees
    pub servo_zero_deg: [f64; NUM_JOINTS],

    // ---- HOME POSE ----
    /// Cursor position at startup, in the arm base frame. The home servo
    /// angles are solved from it.
    ///
    /// Units: centimeters
    pub home_cursor_cm: [f64; 3],

    /// End effector heading at startup. Normalised on load.
    pub home_heading: [f64; 3],

    /// Grip at startup.
    ///
    /// Units: percent (0 = closed, 100 = open)
    pub home_grip_pct: f64,
}

/// Fixed physical lengths of the arm, with the squares used by the solver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ArmGeometry {
    pub shoulder_offset_cm: f64,
    pub upper_arm_cm: f64,
    pub forearm_cm: f64,
    pub wrist_stack_cm: f64,
    pub hand_cm: f64,

    pub upper_arm_sq_cm2: f64,
    pub forearm_sq_cm2: f64,
}

/// Inclusive servo angle range of each joint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct JointBounds {
    bounds_deg: [[f64; 2]; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    /// Parameters of the reference arm.
    fn default() -> Self {
        Self {
            shoulder_offset_cm: 1.5,
            upper_arm_length_cm: 14.0,
            forearm_length_cm: 13.5,
            wrist_stack_height_cm: 4.0,
            hand_length_cm: 5.0,
            joint_bounds_deg: [
                [0.0, 180.0],
                [0.0, 180.0],
                [0.0, 180.0],
                [0.0, 180.0],
                [0.0, 180.0],
                [30.0, 100.0],
            ],
            servo_zero_deg: [90.0, 0.0, 0.0, 0.0, 90.0, 0.0],
            home_cursor_cm: [18.0, 0.0, 10.0],
            home_heading: [1.0, 0.0, 0.0],
            home_grip_pct: 50.0,
        }
    }
}

impl Params {
    /// Check the parameters are consistent, returning the geometry and
    /// bounds they describe.
    pub fn validate(&self) -> Result<(ArmGeometry, JointBounds), ArmCtrlError> {
        let geometry = ArmGeometry::new(self)?;
        let bounds = JointBounds::new(self.joint_bounds_deg)?;

        if self.servo_zero_deg.iter().any(|z| !z.is_finite()) {
            return Err(ArmCtrlError::InvalidGeometry(
                "servo zero angles must be finite".into(),
            ));
        }

        if self.home_cursor_cm.iter().any(|c| !c.is_finite()) {
            return Err(ArmCtrlError::InvalidHomePose(
                "cursor must be finite".into(),
            ));
        }

        if !(0.0..=100.0).contains(&self.home_grip_pct) {
            return Err(ArmCtrlError::InvalidHomePose(format!(
                "grip {} % is outside [0, 100]",
                self.home_grip_pct
            )));
        }

        Ok((geometry, bounds))
    }
}

impl ArmGeometry {
    /// Build the geometry from the parameters, checking all lengths are
    /// physical.
    pub fn new(params: &Params) -> Result<Self, ArmCtrlError> {
        let lengths = [
            ("shoulder offset", params.shoulder_offset_cm),
            ("upper arm length", params.upper_arm_length_cm),
            ("forearm length", params.forearm_length_cm),
            ("wrist stack height", params.wrist_stack_height_cm),
            ("hand length", params.hand_length_cm),
        ];

        for (name, length) in lengths.iter() {
            if !length.is_finite() || *length < 0.0 {
                return Err(ArmCtrlError::InvalidGeometry(format!(
                    "{} must be finite and non-negative, found {}",
                    name, length
                )));
            }
        }

        if params.upper_arm_length_cm <= 0.0 || params.forearm_length_cm <= 0.0 {
            return Err(ArmCtrlError::InvalidGeometry(
                "upper arm and forearm must have non-zero length".into(),
            ));
        }

        Ok(Self {
            shoulder_offset_cm: params.shoulder_offset_cm,
            upper_arm_cm: params.upper_arm_length_cm,
            forearm_cm: params.forearm_length_cm,
            wrist_stack_cm: params.wrist_stack_height_cm,
            hand_cm: params.hand_length_cm,
            upper_arm_sq_cm2: params.upper_arm_length_cm.powi(2),
            forearm_sq_cm2: params.forearm_length_cm.powi(2),
        })
    }

    /// Shortest distance from the shoulder the wrist can reach.
    pub fn min_reach_cm(&self) -> f64 {
        (self.upper_arm_cm - self.forearm_cm).abs()
    }

    /// Longest distance from the shoulder the wrist can reach.
    pub fn max_reach_cm(&self) -> f64 {
        self.upper_arm_cm + self.forearm_cm
    }
}

impl JointBounds {
    /// Create a new bounds table, rejecting any joint whose range is empty
    /// or non-finite.
    pub fn new(bounds_deg: [[f64; 2]; NUM_JOINTS]) -> Result<Self, ArmCtrlError> {
        for (joint, [min, max]) in bounds_deg.iter().enumerate() {
            if !min.is_finite() || !max.is_finite() || min > max {
                return Err(ArmCtrlError::InvalidBounds {
                    joint,
                    min: *min,
                    max: *max,
                });
            }
        }

        Ok(Self { bounds_deg })
    }

    /// Lower bound of the joint.
    pub fn min_deg(&self, joint: usize) -> f64 {
        self.bounds_deg[joint][0]
    }

    /// Upper bound of the joint.
    pub fn max_deg(&self, joint: usize) -> f64 {
        self.bounds_deg[joint][1]
    }

    /// Centre of the joint's range.
    pub fn midpoint_deg(&self, joint: usize) -> f64 {
        0.5 * (self.min_deg(joint) + self.max_deg(joint))
    }

    /// Check if the angle lies within the joint's range.
    pub fn contains(&self, joint: usize, angle_deg: f64) -> bool {
        angle_deg >= self.min_deg(joint) && angle_deg <= self.max_deg(joint)
    }

    /// Range of the hand joint, used to map the grip percentage.
    pub fn hand_range_deg(&self) -> (f64, f64) {
        (self.min_deg(HAND), self.max_deg(HAND))
    }
}
