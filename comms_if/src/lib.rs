//! # Communications interface crate.
//!
//! Provides the interfaces shared between the arm executable and its collaborators: the key
//! events produced by the operator's input device and the servo demands sent to the actuators.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Operator input events (key codes, key down/up)
pub mod input;

/// Command definitions for equipment (like the arm servos)
pub mod eqpt;
