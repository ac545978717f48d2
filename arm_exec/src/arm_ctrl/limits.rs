//! Joint bounds enforcement
//!
//! Every servo angle sent to the arm goes through [`JointBounds::clamp`], which is the only place
//! a non-finite or out of range angle can be corrected.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// Internal
use super::{JointBounds, NUM_JOINTS};
use util::maths::clamp;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Corrections smaller than this are rounding from the unit conversion and
/// are not reported.
const ROUNDING_TOLERANCE_DEG: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Correction applied to a single joint by the bounds enforcer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JointLimit {
    /// The angle was already within bounds.
    None,

    /// The angle was outside the bounds and has been clamped to the nearest
    /// one.
    Clamped,

    /// The angle was not finite and has been replaced by the midpoint of the
    /// bounds.
    Substituted,
}

impl Default for JointLimit {
    fn default() -> Self {
        JointLimit::None
    }
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of bounding a full set of joint angles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClampResult {
    /// Bounded servo angles, always finite.
    ///
    /// Units: degrees
    pub servo_angles_deg: [f64; NUM_JOINTS],

    /// True if no joint needed correcting.
    pub in_bounds: bool,

    /// The correction applied to each joint.
    pub limits: [JointLimit; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointBounds {
    /// Convert joint angles in radians to servo angles in degrees, bringing
    /// each one into its joint's range.
    pub fn clamp(&self, joint_angles_rad: &[f64; NUM_JOINTS]) -> ClampResult {
        let mut servo_angles_deg = [0f64; NUM_JOINTS];
        let mut limits = [JointLimit::None; NUM_JOINTS];

        for (i, angle_rad) in joint_angles_rad.iter().enumerate() {
            let angle_deg = angle_rad.to_degrees();

            if !angle_deg.is_finite() {
                servo_angles_deg[i] = self.midpoint_deg(i);
                limits[i] = JointLimit::Substituted;
                continue;
            }

            servo_angles_deg[i] = clamp(&angle_deg, &self.min_deg(i), &self.max_deg(i));

            if (servo_angles_deg[i] - angle_deg).abs() > ROUNDING_TOLERANCE_DEG {
                limits[i] = JointLimit::Clamped;
            }
        }

        ClampResult {
            servo_angles_deg,
            in_bounds: limits.iter().all(|l| *l == JointLimit::None),
            limits,
        }
    }
}

impl ClampResult {
    /// Index of the first joint whose angle had to be substituted.
    pub fn first_substituted(&self) -> Option<usize> {
        self.limits
            .iter()
            .position(|l| *l == JointLimit::Substituted)
    }
}
