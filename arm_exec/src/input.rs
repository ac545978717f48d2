//! # Operator input state
//!
//! Keys held by the operator are tracked here by the input thread and sampled once per cycle by
//! the control loop.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use comms_if::input::KeyCode;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Keys currently held and any heading change not yet picked up by the loop.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    heading_request: Option<Vector3<f64>>,
}

/// The input state as seen by one control loop cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSample {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub grip_open: bool,
    pub grip_close: bool,

    /// Requested heading, not normalised.
    pub heading_request: Option<Vector3<f64>>,
}

/// Handle to the input state shared between the input thread and the loop.
#[derive(Debug, Clone, Default)]
pub struct SharedInput {
    inner: Arc<Mutex<InputState>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl InputState {
    fn sample(&self) -> InputSample {
        let held = |k: KeyCode| self.held.contains(&k);

        InputSample {
            forward: held(KeyCode::Forward),
            back: held(KeyCode::Back),
            left: held(KeyCode::Left),
            right: held(KeyCode::Right),
            up: held(KeyCode::Up),
            down: held(KeyCode::Down),
            grip_open: held(KeyCode::GripOpen),
            grip_close: held(KeyCode::GripClose),
            heading_request: self.heading_request,
        }
    }
}

impl InputSample {
    /// Unit direction the cursor should move in, or zero if no net movement key is held.
    ///
    /// Opposed keys cancel each other.
    pub fn displacement(&self) -> Vector3<f64> {
        let axis = |pos: bool, neg: bool| (pos as i8 - neg as i8) as f64;

        let raw = Vector3::new(
            axis(self.forward, self.back),
            axis(self.left, self.right),
            axis(self.up, self.down),
        );

        raw.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros)
    }

    /// Direction the grip should change in: +1 opening, -1 closing, 0 otherwise.
    pub fn grip_direction(&self) -> f64 {
        (self.grip_open as i8 - self.grip_close as i8) as f64
    }
}

impl SharedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a key as held.
    pub fn key_down(&self, key: KeyCode) {
        self.lock().held.insert(key);
    }

    /// Mark a key as released.
    pub fn key_up(&self, key: KeyCode) {
        self.lock().held.remove(&key);
    }

    /// Request a new hand heading, replacing any request not yet picked up.
    pub fn request_heading(&self, heading: Vector3<f64>) {
        self.lock().heading_request = Some(heading);
    }

    /// Sample the input state without consuming the heading request.
    pub fn sample(&self) -> InputSample {
        self.lock().sample()
    }

    /// Sample the input state, consuming the heading request.
    pub(crate) fn take_sample(&self) -> InputSample {
        let mut state = self.lock();
        let sample = state.sample();
        state.heading_request = None;
        sample
    }

    fn lock(&self) -> MutexGuard<'_, InputState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_opposed_keys_cancel() {
        let input = SharedInput::new();

        input.key_down(KeyCode::Forward);
        input.key_down(KeyCode::Back);

        assert_eq!(input.sample().displacement(), Vector3::zeros());

        input.key_up(KeyCode::Back);
        assert_eq!(input.sample().displacement(), Vector3::x());
    }

    #[test]
    fn test_diagonal_is_normalised() {
        let input = SharedInput::new();

        input.key_down(KeyCode::Forward);
        input.key_down(KeyCode::Right);
        input.key_down(KeyCode::Up);

        let d = input.sample().displacement();
        assert_relative_eq!(d.norm(), 1.0, epsilon = 1e-12);
        assert!(d.x > 0.0 && d.y < 0.0 && d.z > 0.0);
    }

    #[test]
    fn test_grip_direction() {
        let input = SharedInput::new();
        assert_eq!(input.sample().grip_direction(), 0.0);

        input.key_down(KeyCode::GripClose);
        assert_eq!(input.sample().grip_direction(), -1.0);

        input.key_down(KeyCode::GripOpen);
        assert_eq!(input.sample().grip_direction(), 0.0);
    }

    #[test]
    fn test_heading_request_consumed_once() {
        let input = SharedInput::new();
        input.request_heading(Vector3::new(0.0, 0.0, -2.0));

        assert!(input.sample().heading_request.is_some());
        assert_eq!(
            input.take_sample().heading_request,
            Some(Vector3::new(0.0, 0.0, -2.0))
        );
        assert_eq!(input.take_sample().heading_request, None);
    }

    #[test]
    fn test_released_key_not_held() {
        let input = SharedInput::new();

        // Releasing a key that was never pressed is harmless
        input.key_up(KeyCode::Left);
        input.key_down(KeyCode::Left);
        input.key_down(KeyCode::Left);
        input.key_up(KeyCode::Left);

        assert_eq!(input.sample(), InputSample::default());
    }
}
