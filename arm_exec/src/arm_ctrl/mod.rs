//! Arm control module
//!
//! Converts a demanded end effector position and heading into six bounded servo angles. The
//! processing chain for each demand is:
//!
//! 1. move the target from the base frame into the shoulder frame,
//! 2. correct the target for the hand and wrist stack (`orientation`),
//! 3. solve the shoulder and elbow joints (`inverse_kinematics`),
//! 4. solve the wrist flex and twist joints (`orientation`),
//! 5. map the joints onto the servos and enforce the joint bounds (`limits`).
//!
//! All geometric functions are pure, the only state held by [`ArmCtrl`] is the last good arm
//! configuration.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm_config;
pub mod forward_kinematics;
pub mod inverse_kinematics;
mod limits;
pub mod orientation;
mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use arm_config::*;
pub use limits::*;
pub use params::*;
pub use state::*;

pub use comms_if::eqpt::servo::NUM_JOINTS;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Index of the shoulder rotation (base yaw) joint.
pub const SHOULDER_ROTATION: usize = 0;

/// Index of the shoulder elevation joint.
pub const SHOULDER_ELEVATION: usize = 1;

/// Index of the elbow joint.
pub const ELBOW: usize = 2;

/// Index of the wrist twist joint.
pub const WRIST_TWIST: usize = 3;

/// Index of the wrist flex joint.
pub const WRIST_FLEX: usize = 4;

/// Index of the hand (grip) joint.
pub const HAND: usize = 5;

/// Vectors shorter than this are treated as zero length.
pub(crate) const EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArmCtrlError {
    #[error(
        "Target is out of reach: distance {distance_cm:.3} cm is outside [{min_cm:.3}, \
        {max_cm:.3}] cm"
    )]
    UnreachableTarget {
        distance_cm: f64,
        min_cm: f64,
        max_cm: f64,
    },

    #[error("Target lies on the shoulder pivot, elevation is undefined")]
    DegenerateRadial,

    #[error("Joint {joint} has a non-finite angle")]
    InvalidJointValue { joint: usize },

    #[error("Joint {joint} has invalid bounds [{min}, {max}] deg")]
    InvalidBounds { joint: usize, min: f64, max: f64 },

    #[error("Invalid arm geometry: {0}")]
    InvalidGeometry(String),

    #[error("Home pose is invalid: {0}")]
    InvalidHomePose(String),

    #[error("ArmCtrl has not been initialised")]
    NotInitialised,
}
