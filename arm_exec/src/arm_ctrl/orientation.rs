//! End effector orientation calculations
//!
//! The wrist flex servo can only tilt the hand inside the reach plane (the
//! vertical plane containing the target) and the wrist twist servo rotates
//! the hand about the forearm. Both functions here work in the shoulder frame
//! and expect a normalised heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;
use std::f64::consts::PI;

// Internal imports
use super::{ArmGeometry, EPSILON};
use util::maths::wrap_pi;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Wrist joint angles achieving a heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WristSolution {
    /// Flex of the hand relative to the forearm, in (-pi, pi].
    ///
    /// Units: radians
    pub wrist_flex_rad: f64,

    /// Twist of the hand about the forearm, in [0, pi], `pi/2` when the
    /// heading lies in the reach plane.
    ///
    /// Units: radians
    pub wrist_twist_rad: f64,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Project `raw` onto the direction of `target`.
///
/// `target` must not be zero length.
pub fn project(raw: &Vector3<f64>, target: &Vector3<f64>) -> Vector3<f64> {
    let dir = target.normalize();
    dir * raw.dot(&dir)
}

/// Remove the component of `raw` along `normal`, squashing it onto the plane
/// with that normal.
pub fn squash(raw: &Vector3<f64>, normal: &Vector3<f64>) -> Vector3<f64> {
    raw - project(raw, normal)
}

/// Unsigned angle between two vectors, in [0, pi].
///
/// Returns zero if either vector has zero length.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let bot = a.norm() * b.norm();
    if bot < EPSILON {
        return 0.0;
    }

    (a.dot(b) / bot).max(-1.0).min(1.0).acos()
}

/// Unit normal of the reach plane containing `target`, the axis the wrist
/// flexes about.
///
/// This is `target x Z`. When the target lies on the vertical axis the plane
/// is undefined and `-Y` is used, giving the plane facing +X which matches
/// the zero shoulder rotation.
pub fn flex_axis(target: &Vector3<f64>) -> Vector3<f64> {
    target
        .cross(&Vector3::z())
        .try_normalize(EPSILON)
        .unwrap_or_else(|| -Vector3::y())
}

/// Calculate where the wrist has to be so that the fingertip lands on
/// `target_cm` with the hand pointing along `heading`.
///
/// The hand points along the heading squashed into the reach plane, and the
/// wrist stack sits perpendicular to the hand inside that plane:
///
/// `wrist = target - hand * hand_dir - stack * (flex_axis x hand_dir)`
///
/// If the heading is perpendicular to the reach plane the hand is taken to
/// be horizontal.
pub fn wrist_target(
    geometry: &ArmGeometry,
    heading: &Vector3<f64>,
    target_cm: &Vector3<f64>,
) -> Vector3<f64> {
    let flex = flex_axis(target_cm);

    // Outward horizontal axis of the reach plane
    let radial = Vector3::z().cross(&flex);

    let hand_dir = squash(heading, &flex)
        .try_normalize(EPSILON)
        .unwrap_or(radial);

    let stack_dir = flex.cross(&hand_dir);

    target_cm - hand_dir * geometry.hand_cm - stack_dir * geometry.wrist_stack_cm
}

/// Solve the wrist joints which point the hand along `heading` once the
/// forearm is at `forearm_elevation_rad`.
pub fn solve_wrist(
    target_cm: &Vector3<f64>,
    heading: &Vector3<f64>,
    forearm_elevation_rad: f64,
) -> WristSolution {
    let flex = flex_axis(target_cm);
    let radial = Vector3::z().cross(&flex);

    // Elevation of the heading inside the reach plane, measured from the
    // outward horizontal axis
    let in_plane = squash(heading, &flex);
    let hand_elevation_rad = if in_plane.norm() < EPSILON {
        0.0
    } else {
        in_plane.dot(&Vector3::z()).atan2(in_plane.dot(&radial))
    };

    WristSolution {
        wrist_flex_rad: wrap_pi(hand_elevation_rad - forearm_elevation_rad),
        wrist_twist_rad: PI - angle_between(heading, &flex),
    }
}

#[cfg(test)]
mod test {
    use super::super::Params;
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn geometry() -> ArmGeometry {
        ArmGeometry::new(&Params::default()).unwrap()
    }

    #[test]
    fn test_vector_helpers() {
        let x5 = Vector3::new(5.0, 0.0, 0.0);
        let h5 = Vector3::new(4.0, 0.0, 3.0);

        // 3-4-5 triangle
        assert_relative_eq!(project(&x5, &h5).norm(), 4.0, epsilon = 1e-12);
        assert_relative_eq!(
            squash(&h5, &Vector3::z()),
            Vector3::new(4.0, 0.0, 0.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(
            angle_between(&Vector3::new(2.0, 0.0, 0.0), &Vector3::new(-1.0, 0.0, 0.0)),
            PI
        );
        assert_eq!(angle_between(&Vector3::zeros(), &x5), 0.0);
    }

    #[test]
    fn test_flex_axis() {
        assert_relative_eq!(flex_axis(&Vector3::new(10.0, 0.0, 5.0)), -Vector3::y());
        assert_relative_eq!(flex_axis(&Vector3::new(0.0, 3.0, 0.0)), Vector3::x());

        // On the vertical axis the fallback is used
        assert_eq!(flex_axis(&Vector3::new(0.0, 0.0, 7.0)), -Vector3::y());
        assert_eq!(flex_axis(&Vector3::zeros()), -Vector3::y());
    }

    #[test]
    fn test_wrist_target_horizontal_heading() {
        let target = Vector3::new(18.0, 0.0, 8.5);

        // Hand points straight out, so the wrist is behind the fingertip and
        // below it by the stack height
        assert_relative_eq!(
            wrist_target(&geometry(), &Vector3::x(), &target),
            Vector3::new(13.0, 0.0, 4.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_wrist_target_downward_heading() {
        let target = Vector3::new(0.0, 15.0, 0.0);

        // Hand points down, the stack then points outwards along +Y
        assert_relative_eq!(
            wrist_target(&geometry(), &-Vector3::z(), &target),
            Vector3::new(0.0, 11.0, 5.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_wrist_target_ignores_out_of_plane_heading() {
        let target = Vector3::new(18.0, 0.0, 8.5);

        // Sideways heading is perpendicular to the reach plane, hand is taken
        // as horizontal
        assert_relative_eq!(
            wrist_target(&geometry(), &Vector3::y(), &target),
            wrist_target(&geometry(), &Vector3::x(), &target),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_wrist_target_offset_length() {
        let target = Vector3::new(-6.0, 9.0, 3.0);
        let heading = Vector3::new(-1.0, 1.0, -1.0).normalize();

        let wrist = wrist_target(&geometry(), &heading, &target);

        // Hand and stack are perpendicular so the offset is the hypotenuse
        assert_relative_eq!((target - wrist).norm(), 41.0f64.sqrt(), epsilon = 1e-12);

        // The offset stays in the reach plane
        assert_relative_eq!((target - wrist).dot(&flex_axis(&target)), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrist_target_on_vertical_axis() {
        let wrist = wrist_target(&geometry(), &Vector3::x(), &Vector3::new(0.0, 0.0, 20.0));

        assert!(wrist.iter().all(|c| c.is_finite()));
        assert_relative_eq!(wrist, Vector3::new(-5.0, 0.0, 16.0), epsilon = 1e-12);
    }

    #[test]
    fn test_solve_wrist_level_hand() {
        let target = Vector3::new(13.0, 0.0, 4.5);

        let sol = solve_wrist(&target, &Vector3::x(), -0.5);

        // Wrist counter-rotates the forearm, twist is neutral
        assert_relative_eq!(sol.wrist_flex_rad, 0.5, epsilon = 1e-12);
        assert_relative_eq!(sol.wrist_twist_rad, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_wrist_pointing_down() {
        let target = Vector3::new(0.0, 12.0, 2.0);

        let sol = solve_wrist(&target, &-Vector3::z(), 0.25);

        assert_relative_eq!(sol.wrist_flex_rad, -FRAC_PI_2 - 0.25, epsilon = 1e-12);
        assert_relative_eq!(sol.wrist_twist_rad, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_wrist_twist() {
        let target = Vector3::new(10.0, 0.0, 0.0);

        // Heading tilted sideways towards -Y, which is the flex axis here
        let heading = Vector3::new(1.0, -1.0, 0.0).normalize();
        let sol = solve_wrist(&target, &heading, 0.0);

        assert_relative_eq!(sol.wrist_twist_rad, 3.0 * PI / 4.0, epsilon = 1e-12);
        assert_relative_eq!(sol.wrist_flex_rad, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_wrist_flex_wraps() {
        let target = Vector3::new(10.0, 0.0, 0.0);

        // Hand pointing back towards the base with the forearm pointing down
        let sol = solve_wrist(&target, &-Vector3::x(), -FRAC_PI_2);

        assert_relative_eq!(sol.wrist_flex_rad, -FRAC_PI_2, epsilon = 1e-12);
    }
}
