//! # Shared pose state
//!
//! The pose is the record of where the arm has been told to go. It is written only by the control
//! loop thread and read by anyone holding a [`SharedPose`]. Every write happens in one locked
//! section so readers never see a half updated pose, and the lock is never held while solving or
//! talking to the servos.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::arm_ctrl::{ArmCtrl, ArmCtrlError, NUM_JOINTS};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Lifecycle of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LoopState {
    /// Created, not started yet.
    Idle,

    /// Started, cycling until a stop is requested.
    Running,

    /// A stop was requested and the loop has exited. Terminal.
    Stopped,
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Snapshot of the arm's commanded pose and the loop status.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PoseState {
    /// Last accepted fingertip target, in the arm base frame.
    ///
    /// Units: centimeters
    pub cursor_cm: Vector3<f64>,

    /// Last accepted hand heading, unit length.
    pub gimbal: Vector3<f64>,

    /// Last accepted grip.
    ///
    /// Units: percent (0 = closed, 100 = open)
    pub grip_pct: f64,

    /// Joint angles solved for the cursor, before bounding.
    ///
    /// Units: radians
    pub joint_angles_rad: [f64; NUM_JOINTS],

    /// Bounded servo angles sent to the arm.
    ///
    /// Units: degrees
    pub servo_angles_deg: [f64; NUM_JOINTS],

    /// True if the servo angles did not need bounding.
    pub in_bounds: bool,

    pub loop_state: LoopState,

    pub stop_requested: bool,

    /// Number of cycles run, including rejected ones.
    pub num_cycles: u64,

    /// Number of cycles whose candidate pose was rejected.
    pub num_rejected: u64,
}

/// Accepted result of one cycle, published in one go.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PoseUpdate {
    pub cursor_cm: Vector3<f64>,
    pub gimbal: Vector3<f64>,
    pub grip_pct: f64,
    pub joint_angles_rad: [f64; NUM_JOINTS],
    pub servo_angles_deg: [f64; NUM_JOINTS],
    pub in_bounds: bool,
}

/// Handle to the pose shared between the loop and its readers.
#[derive(Debug, Clone)]
pub struct SharedPose {
    inner: Arc<Mutex<PoseState>>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PoseState {
    /// The pose the arm starts in: the home cursor of the parameters with the
    /// servo angles `arm_ctrl` solved for it at initialisation.
    ///
    /// `arm_ctrl` must not have run a cycle yet.
    pub fn home(arm_ctrl: &ArmCtrl) -> Result<Self, ArmCtrlError> {
        let params = arm_ctrl.params();
        let home = arm_ctrl.last_output().ok_or(ArmCtrlError::NotInitialised)?;

        Ok(Self {
            cursor_cm: Vector3::from(params.home_cursor_cm),
            gimbal: arm_ctrl.heading().ok_or(ArmCtrlError::NotInitialised)?,
            grip_pct: params.home_grip_pct,
            joint_angles_rad: home.arm_config.joint_angles_rad,
            servo_angles_deg: home.servo_dems.servo_angles_deg,
            in_bounds: arm_ctrl.status_report().in_bounds,
            loop_state: LoopState::Idle,
            stop_requested: false,
            num_cycles: 0,
            num_rejected: 0,
        })
    }
}

impl SharedPose {
    pub fn new(initial: PoseState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    /// Get a copy of the current pose.
    pub fn snapshot(&self) -> PoseState {
        *self.lock()
    }

    /// Ask the loop to stop at the start of its next cycle.
    pub fn request_stop(&self) {
        self.lock().stop_requested = true;
    }

    /// Mark the loop as started. Has no effect once it has stopped.
    pub(crate) fn start(&self) {
        let mut pose = self.lock();

        if pose.loop_state == LoopState::Idle {
            pose.loop_state = LoopState::Running;
        }
    }

    /// Start a cycle, returning the pose to work from or `None` if the loop must stop.
    ///
    /// A pending stop request moves the loop into `Stopped`, which it never leaves.
    pub(crate) fn begin_cycle(&self) -> Option<PoseState> {
        let mut pose = self.lock();

        if pose.stop_requested || pose.loop_state == LoopState::Stopped {
            pose.loop_state = LoopState::Stopped;
            return None;
        }

        pose.loop_state = LoopState::Running;

        Some(*pose)
    }

    /// Publish an accepted cycle result, returning the new pose.
    pub(crate) fn publish(&self, update: &PoseUpdate) -> PoseState {
        let mut pose = self.lock();

        pose.cursor_cm = update.cursor_cm;
        pose.gimbal = update.gimbal;
        pose.grip_pct = update.grip_pct;
        pose.joint_angles_rad = update.joint_angles_rad;
        pose.servo_angles_deg = update.servo_angles_deg;
        pose.in_bounds = update.in_bounds;
        pose.num_cycles += 1;

        *pose
    }

    /// Count a cycle whose candidate was rejected, leaving the pose untouched.
    pub(crate) fn record_rejection(&self) -> PoseState {
        let mut pose = self.lock();

        pose.num_cycles += 1;
        pose.num_rejected += 1;

        *pose
    }

    /// Lock the pose, recovering it if a reader panicked while holding the lock.
    fn lock(&self) -> MutexGuard<'_, PoseState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
