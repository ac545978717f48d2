//! Arm inverse kinematics calculations

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;
use std::f64::consts::PI;

// Internal imports
use super::{ArmCtrlError, ArmGeometry, EPSILON};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Joint angles which place the wrist at a target position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionSolution {
    /// Rotation of the shoulder about the vertical axis, zero along +X.
    ///
    /// Units: radians
    pub shoulder_rotation_rad: f64,

    /// Elevation of the upper arm above horizontal.
    ///
    /// Units: radians
    pub shoulder_elevation_rad: f64,

    /// Internal angle between the upper arm and the forearm, `pi` when the
    /// arm is straight.
    ///
    /// Units: radians
    pub elbow_rad: f64,

    /// Signed elevation of the forearm above horizontal.
    ///
    /// Units: radians
    pub forearm_elevation_rad: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the shoulder and elbow joints placing the wrist at `target_cm`.
///
/// The target is given in the shoulder frame (origin on the shoulder pivot,
/// Z up). The upper arm and forearm form a triangle with the line from the
/// shoulder to the target, which is solved with the law of cosines in the
/// reach plane (the vertical plane containing the target). The elbow-up
/// solution is always returned.
///
/// # Errors
/// - `DegenerateRadial` if the target is on the shoulder pivot.
/// - `UnreachableTarget` if the target is closer than `|l1 - l2|` or further
///   than `l1 + l2` from the shoulder.
pub fn solve_position(
    geometry: &ArmGeometry,
    target_cm: &Vector3<f64>,
) -> Result<PositionSolution, ArmCtrlError> {
    // Radial distance in the horizontal plane
    let radial_cm = (target_cm.x.powi(2) + target_cm.y.powi(2)).sqrt();

    let shoulder_rotation_rad = target_cm.y.atan2(target_cm.x);

    // Distance from the shoulder to the target in the reach plane
    let reach_cm = (radial_cm.powi(2) + target_cm.z.powi(2)).sqrt();

    if reach_cm < EPSILON {
        return Err(ArmCtrlError::DegenerateRadial);
    }

    // Written so that a NaN reach is also rejected
    let min_cm = geometry.min_reach_cm();
    let max_cm = geometry.max_reach_cm();
    if !(reach_cm >= min_cm && reach_cm <= max_cm) {
        return Err(ArmCtrlError::UnreachableTarget {
            distance_cm: reach_cm,
            min_cm,
            max_cm,
        });
    }

    let l1 = geometry.upper_arm_cm;
    let l2 = geometry.forearm_cm;
    let l3_sq = reach_cm.powi(2);

    // Cosines are clamped to absorb rounding on the edge of the workspace
    let elbow_rad = ((geometry.upper_arm_sq_cm2 + geometry.forearm_sq_cm2 - l3_sq)
        / (2.0 * l1 * l2))
        .max(-1.0)
        .min(1.0)
        .acos();

    let shoulder_offset_rad = ((geometry.upper_arm_sq_cm2 - geometry.forearm_sq_cm2 + l3_sq)
        / (2.0 * l1 * reach_cm))
        .max(-1.0)
        .min(1.0)
        .acos();

    let vertical_elevation_rad = target_cm.z.atan2(radial_cm);

    let shoulder_elevation_rad = shoulder_offset_rad + vertical_elevation_rad;

    Ok(PositionSolution {
        shoulder_rotation_rad,
        shoulder_elevation_rad,
        elbow_rad,
        forearm_elevation_rad: shoulder_elevation_rad + elbow_rad - PI,
    })
}

#[cfg(test)]
mod test {
    use super::super::{forward_kinematics, Params};
    use super::*;
    use approx::assert_relative_eq;

    /// Geometry with equal upper arm and forearm.
    fn equal_links() -> ArmGeometry {
        let mut params = Params::default();
        params.upper_arm_length_cm = 14.0;
        params.forearm_length_cm = 14.0;
        ArmGeometry::new(&params).unwrap()
    }

    #[test]
    fn test_horizontal_target() {
        let sol = solve_position(&equal_links(), &Vector3::new(10.0, 0.0, 0.0)).unwrap();

        // Law of cosines for a 14-14-10 triangle
        assert_relative_eq!(sol.elbow_rad, (292.0f64 / 392.0).acos(), epsilon = 1e-12);
        assert_relative_eq!(sol.shoulder_rotation_rad, 0.0);

        // Isoceles triangle, upper arm and forearm mirror each other
        assert_relative_eq!(
            sol.shoulder_elevation_rad,
            (PI - sol.elbow_rad) / 2.0,
            epsilon = 1e-12
        );
        assert_relative_eq!(
            sol.forearm_elevation_rad,
            -sol.shoulder_elevation_rad,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_unreachable_target() {
        let err = solve_position(&equal_links(), &Vector3::new(100.0, 0.0, 0.0)).unwrap_err();

        assert_eq!(
            err,
            ArmCtrlError::UnreachableTarget {
                distance_cm: 100.0,
                min_cm: 0.0,
                max_cm: 28.0
            }
        );
    }

    #[test]
    fn test_too_close_target() {
        // Reference arm has a 0.5 cm dead zone around the shoulder
        let geometry = ArmGeometry::new(&Params::default()).unwrap();

        assert!(matches!(
            solve_position(&geometry, &Vector3::new(0.2, 0.1, 0.0)),
            Err(ArmCtrlError::UnreachableTarget { .. })
        ));
    }

    #[test]
    fn test_degenerate_target() {
        assert_eq!(
            solve_position(&equal_links(), &Vector3::zeros()),
            Err(ArmCtrlError::DegenerateRadial)
        );
    }

    #[test]
    fn test_non_finite_target() {
        assert!(matches!(
            solve_position(&equal_links(), &Vector3::new(f64::NAN, 0.0, 1.0)),
            Err(ArmCtrlError::UnreachableTarget { .. })
        ));
    }

    #[test]
    fn test_shoulder_rotation_quadrants() {
        let geometry = equal_links();

        let targets = [
            (10.0, 5.0),
            (-10.0, 5.0),
            (-10.0, -5.0),
            (10.0, -5.0),
            (0.0, 10.0),
            (0.0, -10.0),
            (-10.0, 0.0),
        ];

        for (x, y) in targets.iter() {
            let sol = solve_position(&geometry, &Vector3::new(*x, *y, 3.0)).unwrap();
            assert_relative_eq!(sol.shoulder_rotation_rad, y.atan2(*x));
        }
    }

    #[test]
    fn test_vertical_target() {
        // Directly above the shoulder the rotation is free, atan2 gives zero
        let sol = solve_position(&equal_links(), &Vector3::new(0.0, 0.0, 20.0)).unwrap();

        assert_eq!(sol.shoulder_rotation_rad, 0.0);
        assert!(sol.shoulder_elevation_rad > PI / 2.0);
    }

    #[test]
    fn test_edge_of_workspace() {
        let geometry = ArmGeometry::new(&Params::default()).unwrap();

        let sol = solve_position(&geometry, &Vector3::new(0.0, 27.5, 0.0)).unwrap();

        assert_relative_eq!(sol.elbow_rad, PI, epsilon = 1e-6);
        assert_relative_eq!(sol.shoulder_elevation_rad, 0.0, epsilon = 1e-6);
        assert_relative_eq!(sol.shoulder_rotation_rad, PI / 2.0);
    }

    #[test]
    fn test_forward_kinematics_reconstructs_target() {
        let geometry = ArmGeometry::new(&Params::default()).unwrap();

        // Sweep a grid of reachable targets in all quadrants, above and below
        // the shoulder
        for ix in -4..=4 {
            for iy in -4..=4 {
                for iz in -3..=4 {
                    let target = Vector3::new(ix as f64 * 4.5, iy as f64 * 4.5, iz as f64 * 4.0);
                    let reach = target.norm();
                    if reach < geometry.min_reach_cm() + 1e-3
                        || reach > geometry.max_reach_cm() - 1e-3
                    {
                        continue;
                    }

                    let sol = solve_position(&geometry, &target).unwrap();
                    let wrist = forward_kinematics::wrist_position(
                        &geometry,
                        sol.shoulder_rotation_rad,
                        sol.shoulder_elevation_rad,
                        sol.elbow_rad,
                    );

                    assert_relative_eq!(wrist, target, epsilon = 1e-9);
                }
            }
        }
    }
}
