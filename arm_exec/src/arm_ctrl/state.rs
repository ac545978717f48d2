//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{
    forward_kinematics, inverse_kinematics, orientation, ArmConfig, ArmCtrlError, ArmGeometry,
    JointBounds, JointLimit, Params, EPSILON, HAND, NUM_JOINTS,
};
use comms_if::eqpt::servo::ServoDems;
use util::{maths::lin_map, module::State};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Default)]
pub struct ArmCtrl {
    params: Params,

    geometry: ArmGeometry,

    bounds: JointBounds,

    initialised: bool,

    /// Heading used by the last successful solve.
    heading: Option<Vector3<f64>>,

    /// Output of the last successful solve, starting with the home pose.
    last_good: Option<OutputData>,

    report: StatusReport,
}

/// Input data to Arm Control.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Demanded fingertip position in the arm base frame.
    ///
    /// Units: centimeters
    pub target_cm: Vector3<f64>,

    /// Demanded hand heading. Need not be normalised, a zero heading keeps
    /// the previous one.
    pub heading: Vector3<f64>,

    /// Demanded grip.
    ///
    /// Units: percent (0 = closed, 100 = open)
    pub grip_pct: f64,
}

/// Output of ArmCtrl that the servo transport must execute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutputData {
    /// Arm configuration solved for the demands, before bounding.
    pub arm_config: ArmConfig,

    /// Bounded servo demands.
    pub servo_dems: ServoDems,
}

/// Status report for ArmCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    /// True if no joint needed bounding.
    pub in_bounds: bool,

    /// The correction the bounds enforcer applied to each joint.
    pub joint_limits: [JointLimit; NUM_JOINTS],

    /// Wrist position the position solve aimed for, in the arm base frame.
    ///
    /// Units: centimeters
    pub wrist_cm: [f64; 3],

    /// Fingertip position reached by the bounded servo angles, in the arm
    /// base frame.
    ///
    /// Units: centimeters
    pub fingertip_cm: [f64; 3],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ArmCtrl {
    type InitData = Params;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = OutputData;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// Expected init data is the loaded parameters, which are validated here. The home pose is
    /// solved from the home cursor, heading and grip, so the first cycle starts exactly where the
    /// arm already is.
    fn init(&mut self, init_data: Self::InitData) -> Result<(), Self::InitError> {
        let (geometry, bounds) = init_data.validate()?;

        let home_heading = Vector3::from(init_data.home_heading)
            .try_normalize(EPSILON)
            .ok_or_else(|| ArmCtrlError::InvalidHomePose("heading has zero length".into()))?;

        let home_input = InputData {
            target_cm: Vector3::from(init_data.home_cursor_cm),
            heading: home_heading,
            grip_pct: init_data.home_grip_pct,
        };

        self.last_good = None;
        self.heading = Some(home_heading);
        self.geometry = geometry;
        self.bounds = bounds;
        self.params = init_data;
        self.initialised = true;

        if let Err(e) = self.proc(&home_input) {
            self.initialised = false;
            return Err(ArmCtrlError::InvalidHomePose(format!(
                "cursor cannot be solved: {}",
                e
            )));
        }

        Ok(())
    }

    /// Perform cyclic processing of Arm Control.
    ///
    /// On error the last good output is kept and nothing is published.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if !self.initialised {
            return Err(ArmCtrlError::NotInitialised);
        }

        // Clear the status report
        self.report = StatusReport::default();

        // A zero heading keeps the previous one
        let heading = match input_data.heading.try_normalize(EPSILON) {
            Some(h) => h,
            None => self.heading.unwrap_or_else(Vector3::x),
        };

        // Move into the shoulder frame
        let shoulder_offset = Vector3::z() * self.geometry.shoulder_offset_cm;
        let target_cm = input_data.target_cm - shoulder_offset;

        // Solve the chain
        let wrist_cm = orientation::wrist_target(&self.geometry, &heading, &target_cm);
        let position = inverse_kinematics::solve_position(&self.geometry, &wrist_cm)?;
        let wrist =
            orientation::solve_wrist(&wrist_cm, &heading, position.forearm_elevation_rad);

        let config = ArmConfig::from_solutions(&position, &wrist, self.hand_angle_rad(input_data.grip_pct));

        // Map onto the servos and bound
        let clamped = self
            .bounds
            .clamp(&config.servo_angles_rad(&self.params.servo_zero_deg));

        if let Some(joint) = clamped.first_substituted() {
            return Err(ArmCtrlError::InvalidJointValue { joint });
        }

        // Configuration actually driven by the bounded servos
        let driven =
            ArmConfig::from_servo_angles(&clamped.servo_angles_deg, &self.params.servo_zero_deg);
        let fingertip_cm = forward_kinematics::fingertip_position(&self.geometry, &driven.joint_angles_rad);

        self.report = StatusReport {
            in_bounds: clamped.in_bounds,
            joint_limits: clamped.limits,
            wrist_cm: (wrist_cm + shoulder_offset).into(),
            fingertip_cm: fingertip_cm.into(),
        };

        let output = OutputData {
            arm_config: config,
            servo_dems: ServoDems::new(clamped.servo_angles_deg),
        };

        self.heading = Some(heading);
        self.last_good = Some(output);

        Ok((output, self.report))
    }
}

impl ArmCtrl {
    /// Create and initialise a new ArmCtrl from the given parameters.
    pub fn new(params: Params) -> Result<Self, ArmCtrlError> {
        let mut arm_ctrl = Self::default();
        arm_ctrl.init(params)?;
        Ok(arm_ctrl)
    }

    /// Output of the last successful solve, or the home pose if there has
    /// not been a cycle yet.
    pub fn last_output(&self) -> Option<&OutputData> {
        self.last_good.as_ref()
    }

    /// Report of the last successful solve.
    pub fn status_report(&self) -> &StatusReport {
        &self.report
    }

    /// Normalised heading used by the last successful solve.
    pub fn heading(&self) -> Option<Vector3<f64>> {
        self.heading
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The arm geometry described by the parameters.
    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    /// Hand joint angle for a grip percentage.
    fn hand_angle_rad(&self, grip_pct: f64) -> f64 {
        let (min_deg, max_deg) = self.bounds.hand_range_deg();
        let zero_deg = self.params.servo_zero_deg[HAND];

        let grip_pct = util::maths::clamp(&grip_pct, &0.0, &100.0);

        // The range is in servo angles, the joint angle excludes the zero
        (lin_map((0.0, 100.0), (min_deg, max_deg), grip_pct) - zero_deg).to_radians()
    }
}
