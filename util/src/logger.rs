//! Logger set up for the arm executables
//!
//! Lines go to stdout, with coloured level tags, and to the session log file as plain text:
//!
//! ```text
//! [  12.345678 WRN control_loop] Candidate pose rejected, holding position: ...
//! [  12.365678 DBG servo_sender] servo_client: ...
//! ```
//!
//! The thread name tells the control loop, the servo sender and the input thread (`main`) apart.
//! Debug and trace lines also carry the module that logged them.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use colored::Colorize;
use log::{info, Level, Record};
use std::{fmt, thread};
use thiserror::Error;

use crate::session;

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError),
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
///
/// `min_level` must include `INFO`, so the session summary and loop start/stop messages are
/// always recorded. Must only be called once per process.
pub fn logger_init(
    min_level: LevelFilter,
    session: &session::Session,
) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    let stdout = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_line(record, message, true)))
        })
        .chain(std::io::stdout());

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("{}", format_line(record, message, false)))
        })
        .chain(log_file);

    fern::Dispatch::new()
        .level(min_level)
        .chain(stdout)
        .chain(file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", min_level);
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

/// Parse a log level from a command line string such as `info` or `TRACE`.
///
/// Returns `None` if the level is not recognised.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    level.parse().ok()
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn format_line(record: &Record, message: &fmt::Arguments, coloured: bool) -> String {
    let level = if coloured {
        level_tag(record.level()).to_string()
    } else {
        level_str(record.level()).to_string()
    };

    let current = thread::current();
    let thread_name = current.name().unwrap_or("unnamed");

    // Module paths only help when chasing a problem
    let target = if record.level() > Level::Info {
        Some(short_target(record.target()))
    } else {
        None
    };

    compose(
        session::get_elapsed_seconds(),
        &level,
        thread_name,
        target,
        message,
    )
}

fn compose(
    elapsed_s: f64,
    level: &str,
    thread_name: &str,
    target: Option<&str>,
    message: &dyn fmt::Display,
) -> String {
    match target {
        Some(t) => format!(
            "[{:11.6} {} {}] {}: {}",
            elapsed_s, level, thread_name, t, message
        ),
        None => format!("[{:11.6} {} {}] {}", elapsed_s, level, thread_name, message),
    }
}

/// Drop the crate name from a module path, `arm_lib::control_loop` becomes `control_loop`.
fn short_target(target: &str) -> &str {
    match target.find("::") {
        Some(i) => &target[i + 2..],
        None => target,
    }
}

fn level_str(level: Level) -> &'static str {
    match level {
        Level::Trace => "TRC",
        Level::Debug => "DBG",
        Level::Info => "INF",
        Level::Warn => "WRN",
        Level::Error => "ERR",
    }
}

fn level_tag(level: Level) -> colored::ColoredString {
    let tag = level_str(level);

    match level {
        Level::Trace => tag.dimmed().italic(),
        Level::Debug => tag.dimmed(),
        Level::Info => tag.normal(),
        Level::Warn => tag.yellow(),
        Level::Error => tag.red().bold(),
    }
}
