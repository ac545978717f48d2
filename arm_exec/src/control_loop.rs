//! # Control loop
//!
//! The loop integrates the operator's held keys into a moving cursor, solves the arm for it and
//! sends the bounded servo angles to the servo transport. Each cycle:
//!
//! 1. start the cycle on the shared pose, exiting if a stop has been requested,
//! 2. sample the input state,
//! 3. integrate the held keys over the cycle's time step into a candidate cursor and grip,
//! 4. solve the candidate with [`ArmCtrl`], without holding any lock,
//! 5. publish the accepted pose, or keep the previous one if the candidate is rejected,
//! 6. post the servo demands to the servo sender.
//!
//! The loop runs on its own thread, see [`ControlLoop::spawn`]. The transport runs on a second
//! thread behind a [`ServoSender`], so a slow servo line never holds up a cycle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use std::{
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use comms_if::{eqpt::servo::ServoDems, input::InputEvent};
use nalgebra::Vector3;
use util::{maths::clamp, module::State};

use crate::{
    arm_ctrl::{self, ArmCtrl, ArmCtrlError},
    input::SharedInput,
    params::ArmExecParams,
    pose::{PoseState, PoseUpdate, SharedPose},
    servo_client::{ServoClientError, ServoSender, ServoTransport},
};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Hook notified of the outcome of every cycle.
pub trait LoopObserver: Send {
    /// A candidate pose was accepted and published.
    fn on_publish(&mut self, _pose: &PoseState) {}

    /// A candidate pose was rejected, the previous pose is held.
    fn on_reject(&mut self, _error: &ArmCtrlError) {}
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Observer which reports through the logger.
///
/// Out of bounds poses and rejected candidates are only warned about when they start, to keep a
/// held key from flooding the log.
#[derive(Debug)]
pub struct LogObserver {
    was_in_bounds: bool,

    /// Number of candidates rejected since the last accepted one.
    num_consecutive_rejections: u64,
}

/// The arm control loop, before it is started.
pub struct ControlLoop {
    params: ArmExecParams,

    arm_ctrl: ArmCtrl,

    pose: SharedPose,
    input: SharedInput,

    sender: ServoSender,
    observer: Box<dyn LoopObserver>,
}

/// Handle to a running control loop.
#[derive(Debug)]
pub struct LoopHandle {
    pose: SharedPose,
    input: SharedInput,
    jh: JoinHandle<PoseState>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of a single loop cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The candidate was accepted, contains the published pose.
    Published(PoseState),

    /// The candidate was rejected and the previous pose held.
    Rejected(ArmCtrlError),

    /// A stop was requested, nothing was done.
    Stopped,
}

#[derive(Debug, thiserror::Error)]
pub enum ControlLoopError {
    #[error("Could not initialise ArmCtrl: {0}")]
    ArmCtrlInitError(ArmCtrlError),

    #[error("Invalid loop parameter: {0}")]
    InvalidParams(String),

    #[error("Could not start the control loop thread: {0}")]
    SpawnError(std::io::Error),

    #[error("Could not start the servo sender: {0}")]
    ServoSenderError(ServoClientError),

    #[error("The control loop thread panicked")]
    LoopPanicked,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for LogObserver {
    fn default() -> Self {
        Self {
            was_in_bounds: true,
            num_consecutive_rejections: 0,
        }
    }
}

impl LoopObserver for LogObserver {
    fn on_publish(&mut self, pose: &PoseState) {
        trace!(
            "Cursor {:?} cm, servos {:?} deg",
            pose.cursor_cm.as_slice(),
            pose.servo_angles_deg
        );

        if !pose.in_bounds && self.was_in_bounds {
            warn!("Arm is at the limit of a joint, servo angles have been bounded");
        }
        if pose.in_bounds && !self.was_in_bounds {
            debug!("Arm back within joint bounds");
        }
        self.was_in_bounds = pose.in_bounds;

        if self.num_consecutive_rejections > 0 {
            info!(
                "Candidate pose accepted after {} rejected cycles",
                self.num_consecutive_rejections
            );
            self.num_consecutive_rejections = 0;
        }
    }

    fn on_reject(&mut self, error: &ArmCtrlError) {
        if self.num_consecutive_rejections == 0 {
            warn!("Candidate pose rejected, holding position: {}", error);
        } else {
            trace!("Candidate pose rejected: {}", error);
        }
        self.num_consecutive_rejections += 1;
    }
}

impl ControlLoop {
    /// Create a new loop in the home pose, starting the servo sender on `transport`.
    pub fn new(
        arm_params: arm_ctrl::Params,
        params: ArmExecParams,
        transport: Box<dyn ServoTransport>,
    ) -> Result<Self, ControlLoopError> {
        validate_params(&params)?;

        let arm_ctrl = ArmCtrl::new(arm_params).map_err(ControlLoopError::ArmCtrlInitError)?;
        let home = PoseState::home(&arm_ctrl).map_err(ControlLoopError::ArmCtrlInitError)?;

        let sender = ServoSender::spawn(transport).map_err(ControlLoopError::ServoSenderError)?;

        Ok(Self {
            params,
            arm_ctrl,
            pose: SharedPose::new(home),
            input: SharedInput::new(),
            sender,
            observer: Box::new(LogObserver::default()),
        })
    }

    /// Replace the default logging observer.
    pub fn with_observer(mut self, observer: Box<dyn LoopObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn pose(&self) -> SharedPose {
        self.pose.clone()
    }

    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }

    /// Run a single cycle integrating over `dt_s` seconds.
    ///
    /// Non-positive or non-finite steps integrate nothing, steps longer than `max_dt_s` are
    /// shortened to it.
    pub fn step(&mut self, dt_s: f64) -> StepOutcome {
        let current = match self.pose.begin_cycle() {
            Some(p) => p,
            None => return StepOutcome::Stopped,
        };

        let sample = self.input.take_sample();

        let dt_s = if dt_s.is_finite() && dt_s > 0.0 {
            dt_s.min(self.params.max_dt_s)
        } else {
            0.0
        };

        // Candidate pose
        let cursor_cm =
            current.cursor_cm + sample.displacement() * self.params.linear_rate_cm_s * dt_s;
        let grip_pct = clamp(
            &(current.grip_pct + sample.grip_direction() * self.params.grip_rate_pct_s * dt_s),
            &0.0,
            &100.0,
        );
        let gimbal = sample
            .heading_request
            .and_then(|h| h.try_normalize(f64::EPSILON))
            .unwrap_or(current.gimbal);

        let input = arm_ctrl::InputData {
            target_cm: cursor_cm,
            heading: gimbal,
            grip_pct,
        };

        match self.arm_ctrl.proc(&input) {
            Ok((output, report)) => {
                let pose = self.pose.publish(&PoseUpdate {
                    cursor_cm,
                    gimbal,
                    grip_pct,
                    joint_angles_rad: output.arm_config.joint_angles_rad,
                    servo_angles_deg: output.servo_dems.servo_angles_deg,
                    in_bounds: report.in_bounds,
                });

                self.observer.on_publish(&pose);
                self.send(&output.servo_dems);

                StepOutcome::Published(pose)
            }
            Err(e) => {
                self.pose.record_rejection();
                self.observer.on_reject(&e);

                // Hold the servos where they are
                let held = match self.arm_ctrl.last_output() {
                    Some(o) => o.servo_dems,
                    None => ServoDems::new(current.servo_angles_deg),
                };
                self.send(&held);

                StepOutcome::Rejected(e)
            }
        }
    }

    /// Run the loop on the current thread until a stop is requested, returning the final pose.
    pub fn run(mut self) -> PoseState {
        let cycle_period = Duration::from_secs_f64(self.params.cycle_period_s);

        info!(
            "Control loop running at {:.1} Hz",
            1.0 / self.params.cycle_period_s
        );

        let mut last_cycle_instant = Instant::now();

        loop {
            // Get cycle start time
            let cycle_start_instant = Instant::now();
            let dt_s = (cycle_start_instant - last_cycle_instant).as_secs_f64();
            last_cycle_instant = cycle_start_instant;

            if let StepOutcome::Stopped = self.step(dt_s) {
                break;
            }

            // ---- CYCLE MANAGEMENT ----

            let cycle_dur = Instant::now() - cycle_start_instant;

            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                ),
            }
        }

        let pose = self.pose.snapshot();

        info!(
            "Control loop stopped after {} cycles ({} rejected)",
            pose.num_cycles, pose.num_rejected
        );

        pose
    }

    /// Start the loop on a new thread. The loop is `Running` once this returns.
    pub fn spawn(self) -> Result<LoopHandle, ControlLoopError> {
        let pose = self.pose();
        let input = self.input();

        pose.start();

        let jh = thread::Builder::new()
            .name("control_loop".into())
            .spawn(move || self.run())
            .map_err(ControlLoopError::SpawnError)?;

        Ok(LoopHandle { pose, input, jh })
    }

    fn send(&self, dems: &ServoDems) {
        if self.sender.post(dems) {
            trace!("Servo transport busy, replaced unsent demands");
        }
    }
}

impl LoopHandle {
    pub fn pose(&self) -> SharedPose {
        self.pose.clone()
    }

    pub fn input(&self) -> SharedInput {
        self.input.clone()
    }

    /// Apply an operator input event to the running loop.
    pub fn apply(&self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(k) => self.input.key_down(*k),
            InputEvent::KeyUp(k) => self.input.key_up(*k),
            InputEvent::SetHeading(h) => self.input.request_heading(Vector3::from(*h)),
            InputEvent::Stop => self.stop(),
        }
    }

    /// Ask the loop to stop, it exits at the start of its next cycle.
    pub fn stop(&self) {
        self.pose.request_stop();
    }

    /// True once a stop has been requested.
    pub fn is_stopping(&self) -> bool {
        self.pose.snapshot().stop_requested
    }

    /// Wait for the loop to exit, returning its final pose.
    pub fn join(self) -> Result<PoseState, ControlLoopError> {
        self.jh.join().map_err(|_| ControlLoopError::LoopPanicked)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn validate_params(params: &ArmExecParams) -> Result<(), ControlLoopError> {
    let positive = [
        ("cycle_period_s", params.cycle_period_s),
        ("max_dt_s", params.max_dt_s),
    ];
    for (name, value) in positive.iter() {
        if !value.is_finite() || *value <= 0.0 {
            return Err(ControlLoopError::InvalidParams(format!(
                "{} must be positive, found {}",
                name, value
            )));
        }
    }

    let rates = [
        ("linear_rate_cm_s", params.linear_rate_cm_s),
        ("grip_rate_pct_s", params.grip_rate_pct_s),
    ];
    for (name, value) in rates.iter() {
        if !value.is_finite() || *value < 0.0 {
            return Err(ControlLoopError::InvalidParams(format!(
                "{} must be finite and non-negative, found {}",
                name, value
            )));
        }
    }

    Ok(())
}
