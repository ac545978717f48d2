//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The executable is split over two threads:
//!
//!     - The control loop thread, which owns the arm control module and the servo client and
//!       cycles at a fixed rate (see `arm_lib::control_loop`).
//!     - The main thread, which feeds operator input to the loop, either from a timed script or
//!       from lines typed on stdin, and saves the final pose once the loop has stopped.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use std::{
    io::{self, BufRead},
    path::PathBuf,
    thread,
    time::Duration,
};
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl,
    control_loop::{ControlLoop, LoopHandle},
    params::ArmExecParams,
    servo_client::{FrameWriter, ServoTransport},
};
use comms_if::input::InputEvent;
use util::{
    logger::{logger_init, parse_level},
    script_interpreter::{PendingEvents, ScriptInterpreter},
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Period at which script events are checked.
const SCRIPT_POLL_PERIOD_S: f64 = 0.01;

/// Name of the file in the session directory frames are written to when no servo device is set.
const SESSION_FRAMES_FILE: &str = "servo_frames.txt";

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

/// Command line options.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Teleoperation executive for the robotic arm")]
struct Opt {
    /// Replay operator input from this script instead of reading stdin.
    #[structopt(short, long, parse(from_os_str))]
    script: Option<PathBuf>,

    /// Minimum level of log messages (trace, debug or info).
    #[structopt(short, long, default_value = "info")]
    log_level: String,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let log_level = parse_level(&opt.log_level)
        .ok_or_else(|| eyre!("Unknown log level \"{}\"", opt.log_level))?;
    logger_init(log_level, &session).wrap_err("Failed to initialise logging")?;

    info!("RoboArm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let arm_params: arm_ctrl::Params =
        util::params::load("arm_ctrl.toml").wrap_err("Could not load ArmCtrl params")?;

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE INPUT SOURCE ----

    let input_source = match opt.script {
        Some(ref path) => {
            info!("Loading script from {:?}", path);

            let si = ScriptInterpreter::new(path).wrap_err("Failed to load script")?;

            info!(
                "Loaded script lasts {:.02} s and contains {} events\n",
                si.get_duration(),
                si.get_num_events()
            );

            InputSource::Script(si)
        }
        None => {
            info!("No script provided, reading input events from stdin\n");
            InputSource::Stdin
        }
    };

    // ---- INITIALISE SERVO CLIENT ----

    let transport: Box<dyn ServoTransport> = match exec_params.servo_device {
        Some(ref device) => {
            info!("Writing servo frames to {}", device);
            Box::new(FrameWriter::open(device).wrap_err("Failed to open the servo device")?)
        }
        None => {
            let path = session.session_root.join(SESSION_FRAMES_FILE);
            info!("No servo device set, writing servo frames to {:?}", path);
            Box::new(FrameWriter::open(path).wrap_err("Failed to open the servo frames file")?)
        }
    };

    // ---- START CONTROL LOOP ----

    let handle = ControlLoop::new(arm_params, exec_params, transport)
        .wrap_err("Failed to initialise the control loop")?
        .spawn()
        .wrap_err("Failed to start the control loop")?;

    // ---- INPUT PROCESSING ----

    match input_source {
        InputSource::Script(si) => run_script(si, &handle),
        InputSource::Stdin => run_stdin(&handle).wrap_err("Failed to read stdin")?,
    }

    // ---- SHUTDOWN ----

    handle.stop();
    let final_pose = handle.join().wrap_err("Control loop failed")?;

    info!(
        "Final cursor {:?} cm, grip {:.1} %",
        final_pose.cursor_cm.as_slice(),
        final_pose.grip_pct
    );

    session
        .save_json("final_pose.json", &final_pose)
        .wrap_err("Failed to save the final pose")?;

    info!("End of execution");

    Ok(())
}

/// Apply script events at their scheduled times until the script ends or the loop stops.
fn run_script(mut si: ScriptInterpreter, handle: &LoopHandle) {
    let start_s = session::get_elapsed_seconds();

    while !handle.is_stopping() {
        match si.get_pending_events(session::get_elapsed_seconds() - start_s) {
            PendingEvents::None => (),
            PendingEvents::Some(events) => {
                for event in events.iter() {
                    debug!("Script event {:?}", event);
                    handle.apply(event);
                }
            }
            // Exit if end of script reached
            PendingEvents::EndOfScript => {
                info!("End of script reached, stopping");
                break;
            }
        }

        thread::sleep(Duration::from_secs_f64(SCRIPT_POLL_PERIOD_S));
    }
}

/// Apply events typed on stdin until `stop`, end of input, or the loop stops.
fn run_stdin(handle: &LoopHandle) -> io::Result<()> {
    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        match InputEvent::from_line(&line) {
            Ok(event) => handle.apply(&event),
            Err(e) => warn!("Ignoring input \"{}\": {}", line.trim(), e),
        }

        if handle.is_stopping() {
            break;
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Sources for the operator input events.
enum InputSource {
    Stdin,
    Script(ScriptInterpreter),
}
