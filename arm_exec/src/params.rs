//! # Arm Executable Parameters
//!
//! This module provides parameters for the arm executable and its control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArmExecParams {
    /// Target period of one control loop cycle.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// Longest time step integrated in one cycle, so a stalled loop does not
    /// jump the cursor.
    ///
    /// Units: seconds
    pub max_dt_s: f64,

    /// Speed of the cursor while a movement key is held.
    ///
    /// Units: centimeters/second
    pub linear_rate_cm_s: f64,

    /// Rate of change of the grip while a grip key is held.
    ///
    /// Units: percent/second
    pub grip_rate_pct_s: f64,

    /// Path of the device the servo frames are written to, for instance a serial port. If not
    /// set the executable writes frames to a file in the session directory.
    pub servo_device: Option<String>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ArmExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: 0.02,
            max_dt_s: 0.1,
            linear_rate_cm_s: 5.0,
            grip_rate_pct_s: 50.0,
            servo_device: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let params: ArmExecParams = toml::from_str("linear_rate_cm_s = 2.5").unwrap();

        assert_eq!(params.linear_rate_cm_s, 2.5);
        assert_eq!(params.cycle_period_s, 0.02);
        assert_eq!(params.servo_device, None);
    }
}
