//! # Servo Equipment Demands
//!
//! The arm servo controller board accepts a single line per update, made of one token per
//! joint:
//!
//! ```text
//! _0,90;_1,90;_2,145;_3,45;_4,107;_5,65;
//! ```
//!
//! Each token is `_<joint index>,<angle in whole degrees>;`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::fmt::Write;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of servo driven joints on the arm.
pub const NUM_JOINTS: usize = 6;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Demands that are sent to the servo controller.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
pub struct ServoDems {
    /// The demanded angle of each servo.
    ///
    /// Units: degrees
    pub servo_angles_deg: [f64; NUM_JOINTS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when parsing a servo frame.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FrameParseError {
    #[error("Token \"{0}\" does not start with '_'")]
    MissingPrefix(String),

    #[error("Token \"{0}\" is missing the ',' separator")]
    MissingSeparator(String),

    #[error("Token \"{0}\" has an invalid joint index")]
    InvalidIndex(String),

    #[error("Token \"{0}\" has an invalid angle")]
    InvalidAngle(String),

    #[error("Joint {0} appears more than once in the frame")]
    DuplicateJoint(usize),

    #[error("Joint {0} is missing from the frame")]
    MissingJoint(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ServoDems {
    /// Create a new set of demands from the given angles.
    pub fn new(servo_angles_deg: [f64; NUM_JOINTS]) -> Self {
        Self { servo_angles_deg }
    }

    /// Serialize the demands into the servo controller's wire frame.
    ///
    /// Angles are rounded to the nearest whole degree.
    pub fn to_frame(&self) -> String {
        let mut frame = String::with_capacity(NUM_JOINTS * 8);

        for (i, angle_deg) in self.servo_angles_deg.iter().enumerate() {
            // Writing into a String cannot fail
            write!(frame, "_{},{:.0};", i, angle_deg).ok();
        }

        frame
    }

    /// Parse demands from a servo controller wire frame.
    ///
    /// Whitespace around the frame and around each token is ignored. Every joint must appear
    /// exactly once, in any order.
    pub fn from_frame(frame: &str) -> Result<Self, FrameParseError> {
        let mut angles: [Option<f64>; NUM_JOINTS] = [None; NUM_JOINTS];

        for token in frame.trim().split(';') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }

            let body = token
                .strip_prefix('_')
                .ok_or_else(|| FrameParseError::MissingPrefix(token.to_string()))?;

            let (idx_str, angle_str) = body
                .split_once(',')
                .ok_or_else(|| FrameParseError::MissingSeparator(token.to_string()))?;

            let idx: usize = match idx_str.trim().parse() {
                Ok(i) if i < NUM_JOINTS => i,
                _ => return Err(FrameParseError::InvalidIndex(token.to_string())),
            };

            let angle_deg: f64 = match angle_str.trim().parse::<f64>() {
                Ok(a) if a.is_finite() => a,
                _ => return Err(FrameParseError::InvalidAngle(token.to_string())),
            };

            if angles[idx].replace(angle_deg).is_some() {
                return Err(FrameParseError::DuplicateJoint(idx));
            }
        }

        let mut servo_angles_deg = [0.0; NUM_JOINTS];
        for (i, angle) in angles.iter().enumerate() {
            servo_angles_deg[i] = angle.ok_or(FrameParseError::MissingJoint(i))?;
        }

        Ok(Self { servo_angles_deg })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_home_frame() {
        let dems = ServoDems::new([90.0, 90.0, 145.0, 45.0, 107.0, 65.0]);

        assert_eq!(dems.to_frame(), "_0,90;_1,90;_2,145;_3,45;_4,107;_5,65;");
    }

    #[test]
    fn test_frame_rounds_to_whole_degrees() {
        let dems = ServoDems::new([90.2, 89.8, 0.0, 180.0, 12.7, 64.1]);

        assert_eq!(dems.to_frame(), "_0,90;_1,90;_2,0;_3,180;_4,13;_5,64;");
    }

    #[test]
    fn test_parse_out_of_order() {
        let dems = ServoDems::from_frame(" _5,65; _4,107;_3,45;_2,145;_1,90;_0,90;\n").unwrap();

        assert_eq!(dems.servo_angles_deg, [90.0, 90.0, 145.0, 45.0, 107.0, 65.0]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            ServoDems::from_frame("0,90;"),
            Err(FrameParseError::MissingPrefix("0,90".into()))
        );
        assert_eq!(
            ServoDems::from_frame("_0 90;"),
            Err(FrameParseError::MissingSeparator("_0 90".into()))
        );
        assert_eq!(
            ServoDems::from_frame("_6,90;"),
            Err(FrameParseError::InvalidIndex("_6,90".into()))
        );
        assert_eq!(
            ServoDems::from_frame("_0,abc;"),
            Err(FrameParseError::InvalidAngle("_0,abc".into()))
        );
        assert_eq!(
            ServoDems::from_frame("_0,90;_0,91;"),
            Err(FrameParseError::DuplicateJoint(0))
        );
        assert_eq!(
            ServoDems::from_frame("_0,90;_1,90;_2,90;_3,90;_4,90;"),
            Err(FrameParseError::MissingJoint(5))
        );
    }
}
