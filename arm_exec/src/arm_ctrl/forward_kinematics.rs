//! Arm forward kinematics
//!
//! Used to check inverse kinematics solutions and to estimate where the
//! fingertip actually is once the servo angles have been bounded.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use std::f64::consts::PI;

// Internal imports
use super::{ArmGeometry, ELBOW, SHOULDER_ELEVATION, SHOULDER_ROTATION, WRIST_FLEX, NUM_JOINTS};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Position of the wrist in the shoulder frame.
pub fn wrist_position(
    geometry: &ArmGeometry,
    shoulder_rotation_rad: f64,
    shoulder_elevation_rad: f64,
    elbow_rad: f64,
) -> Vector3<f64> {
    let forearm_elevation_rad = shoulder_elevation_rad + elbow_rad - PI;

    // Position in the reach plane
    let radial_cm = geometry.upper_arm_cm * shoulder_elevation_rad.cos()
        + geometry.forearm_cm * forearm_elevation_rad.cos();
    let height_cm = geometry.upper_arm_cm * shoulder_elevation_rad.sin()
        + geometry.forearm_cm * forearm_elevation_rad.sin();

    Vector3::new(
        radial_cm * shoulder_rotation_rad.cos(),
        radial_cm * shoulder_rotation_rad.sin(),
        height_cm,
    )
}

/// Position of the fingertip in the arm base frame.
///
/// The hand lies in the reach plane at the forearm elevation plus the wrist
/// flex, with the wrist stack perpendicular to it. Wrist twist does not move
/// the fingertip.
pub fn fingertip_position(geometry: &ArmGeometry, joint_angles_rad: &[f64; NUM_JOINTS]) -> Vector3<f64> {
    let rotation_rad = joint_angles_rad[SHOULDER_ROTATION];
    let elevation_rad = joint_angles_rad[SHOULDER_ELEVATION];
    let elbow_rad = joint_angles_rad[ELBOW];

    let wrist_cm = wrist_position(geometry, rotation_rad, elevation_rad, elbow_rad);

    // Outward horizontal and vertical axes of the reach plane
    let radial_axis = Vector3::new(rotation_rad.cos(), rotation_rad.sin(), 0.0);
    let vertical_axis = Vector3::z();

    let hand_elevation_rad = elevation_rad + elbow_rad - PI + joint_angles_rad[WRIST_FLEX];

    let hand_dir = radial_axis * hand_elevation_rad.cos() + vertical_axis * hand_elevation_rad.sin();
    let stack_dir = radial_axis * -hand_elevation_rad.sin() + vertical_axis * hand_elevation_rad.cos();

    wrist_cm
        + hand_dir * geometry.hand_cm
        + stack_dir * geometry.wrist_stack_cm
        + vertical_axis * geometry.shoulder_offset_cm
}

#[cfg(test)]
mod test {
    use super::super::Params;
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_straight_arm() {
        let geometry = ArmGeometry::new(&Params::default()).unwrap();

        // Straight out along +Y
        assert_relative_eq!(
            wrist_position(&geometry, PI / 2.0, 0.0, PI),
            Vector3::new(0.0, 27.5, 0.0),
            epsilon = 1e-12
        );

        // Straight up
        assert_relative_eq!(
            wrist_position(&geometry, 0.0, PI / 2.0, PI),
            Vector3::new(0.0, 0.0, 27.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_right_angle_elbow() {
        let geometry = ArmGeometry::new(&Params::default()).unwrap();

        // Upper arm vertical, forearm horizontal pointing along +X
        assert_relative_eq!(
            wrist_position(&geometry, 0.0, PI / 2.0, PI / 2.0),
            Vector3::new(13.5, 0.0, 14.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_fingertip_horizontal_hand() {
        let geometry = ArmGeometry::new(&Params::default()).unwrap();

        // Upper arm vertical, forearm and hand horizontal along +X, stack up
        let joints = [0.0, PI / 2.0, PI / 2.0, PI / 2.0, 0.0, 0.0];

        assert_relative_eq!(
            fingertip_position(&geometry, &joints),
            Vector3::new(13.5 + 5.0, 0.0, 14.0 + 4.0 + 1.5),
            epsilon = 1e-12
        );
    }
}
