//! # Arm library.
//!
//! This library allows other crates in the workspace, the tests and the benchmarks to access items
//! defined inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - converts a fingertip position and heading into bounded servo angles
pub mod arm_ctrl;

/// Control loop - integrates operator input into the arm pose and drives the servos
pub mod control_loop;

/// Operator input state shared between the input thread and the control loop
pub mod input;

/// Executable parameters
pub mod params;

/// Pose state shared between the control loop and its readers
pub mod pose;

/// Servo client - sends servo demands to the servo controller
pub mod servo_client;
