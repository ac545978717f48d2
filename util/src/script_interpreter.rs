//! # Arm input script interpreter module
//!
//! This module provides an interpreter for arm input scripts, allowing
//! operator input events to be replayed at fixed times. A script is a list
//! of `<time in seconds>: <JSON input event>;` entries, for example:
//!
//! ```text
//! 0.5: {"KeyDown": "W"};
//! 2.0: {"KeyUp": "W"};
//! 2.5: "Stop";
//! ```

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::input::{InputEvent, InputEventParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An input event which is scripted to occur at a specific time.
#[derive(Debug)]
struct Command {
    /// The time the event is supposed to occur at
    exec_time_s: f64,

    /// The event to apply
    event: InputEvent
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_events` to acquire the events that need applying.
#[derive(Debug)]
pub struct ScriptInterpreter {
    _script_path: PathBuf,
    cmds: VecDeque<Command>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script contains an invalid event at {0} s: {1}")]
    InvalidEvent(f64, InputEventParseError)
}

#[derive(Debug, PartialEq)]
pub enum PendingEvents {
    None,
    Some(Vec<InputEvent>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());

        // Check that the script file exists.
        if !path.exists() {
            return Err(
                ScriptError::ScriptNotFound(path.to_string_lossy().to_string()));
        }

        // Load the script into a string
        let script = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => return Err(ScriptError::ScriptLoadError(e))
        };

        let cmds = Self::parse(&script)?;

        Ok(ScriptInterpreter {
            _script_path: path,
            cmds
        })
    }

    /// Parse the contents of a script into a queue of commands.
    fn parse(script: &str) -> Result<VecDeque<Command>, ScriptError> {
        // Empty queue of commands
        let mut queue: VecDeque<Command> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Script regex is invalid");

        for cap in re.captures_iter(script) {
            // Both groups are mandatory in the regex so always present on a
            // match
            let time_str = cap.get(1).map_or("", |m| m.as_str());
            let event_str = cap.get(3).map_or("", |m| m.as_str());

            // Parse the exec time
            let exec_time_s: f64 = match time_str.parse() {
                Ok(t) => t,
                Err(e) => return Err(
                    ScriptError::InvalidTimestamp(format!("{}", e)))
            };

            // Parse the event from the payload. The scripts contain JSON only.
            let event = match InputEvent::from_json(event_str) {
                Ok(e) => e,
                Err(e) => return Err(ScriptError::InvalidEvent(
                    exec_time_s, e
                ))
            };

            queue.push_back(Command {
                exec_time_s,
                event
            });
        }

        if queue.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        // Keep the queue in time order so that pending events can be popped
        // from the front
        queue
            .make_contiguous()
            .sort_by(|a, b| a.exec_time_s.total_cmp(&b.exec_time_s));

        Ok(queue)
    }

    /// Return the events which should have occured by `elapsed_s`.
    pub fn get_pending_events(&mut self, elapsed_s: f64) -> PendingEvents {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.cmds.is_empty() {
            return PendingEvents::EndOfScript
        }

        let mut events: Vec<InputEvent> = vec![];

        // Pop items from the queue until the head's exec time is later than
        // the current time.
        while let Some(cmd) = self.cmds.front() {
            if cmd.exec_time_s > elapsed_s {
                break;
            }

            if let Some(cmd) = self.cmds.pop_front() {
                events.push(cmd.event);
            }
        }

        // If the vector is longer than 0 return Some, otherwise None
        if events.len() > 0 {
            PendingEvents::Some(events)
        }
        else {
            PendingEvents::None
        }
    }

    /// Get the number of events remaining in the script
    pub fn get_num_events(&self) -> usize {
        self.cmds.len()
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.cmds.back() {
            Some(c) => c.exec_time_s,
            None => 0f64
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::input::KeyCode;
    use std::io::Write;

    fn write_script(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        file
    }

    #[test]
    fn test_replay() {
        let file = write_script(
            "2.0: {\"KeyUp\": \"W\"};\n\
             0.5: {\"KeyDown\": \"W\"};\n\
             0.5: {\"KeyDown\": \"A\"};\n\
             3: \"Stop\";\n",
        );

        let mut si = ScriptInterpreter::new(file.path()).unwrap();

        assert_eq!(si.get_num_events(), 4);
        assert_eq!(si.get_duration(), 3.0);

        assert_eq!(si.get_pending_events(0.1), PendingEvents::None);
        assert_eq!(
            si.get_pending_events(0.6),
            PendingEvents::Some(vec![
                InputEvent::KeyDown(KeyCode::Forward),
                InputEvent::KeyDown(KeyCode::Left)
            ])
        );
        assert_eq!(si.get_pending_events(1.0), PendingEvents::None);
        assert_eq!(
            si.get_pending_events(10.0),
            PendingEvents::Some(vec![
                InputEvent::KeyUp(KeyCode::Forward),
                InputEvent::Stop
            ])
        );
        assert_eq!(si.get_pending_events(11.0), PendingEvents::EndOfScript);
    }

    #[test]
    fn test_script_errors() {
        assert!(matches!(
            ScriptInterpreter::new("/no/such/script.ras"),
            Err(ScriptError::ScriptNotFound(_))
        ));

        let empty = write_script("// nothing to see here\n");
        assert!(matches!(
            ScriptInterpreter::new(empty.path()),
            Err(ScriptError::ScriptEmpty)
        ));

        let bad_event = write_script("1.0: {\"KeyDown\": \"X\"};\n");
        assert!(matches!(
            ScriptInterpreter::new(bad_event.path()),
            Err(ScriptError::InvalidEvent(t, _)) if t == 1.0
        ));
    }
}
