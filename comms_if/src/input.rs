//! # Operator input events
//!
//! The operator's input device (a window capturing the keyboard, a script, or a terminal) turns
//! key presses into [`InputEvent`]s which the arm executable applies to its input state.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Keys the operator can hold to move the arm.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum KeyCode {
    /// Move the cursor along +X.
    #[serde(alias = "W")]
    Forward,

    /// Move the cursor along -X.
    #[serde(alias = "S")]
    Back,

    /// Move the cursor along +Y.
    #[serde(alias = "A")]
    Left,

    /// Move the cursor along -Y.
    #[serde(alias = "D")]
    Right,

    /// Move the cursor along +Z.
    #[serde(alias = "R")]
    Up,

    /// Move the cursor along -Z.
    #[serde(alias = "F")]
    Down,

    /// Open the hand.
    #[serde(alias = "E")]
    GripOpen,

    /// Close the hand.
    #[serde(alias = "Q")]
    GripClose,
}

/// An event produced by the operator's input device.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A key has been pressed.
    KeyDown(KeyCode),

    /// A key has been released.
    KeyUp(KeyCode),

    /// Request a new end effector heading. The vector does not need to be normalised.
    SetHeading([f64; 3]),

    /// Stop the arm control loop.
    Stop,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum InputEventParseError {
    #[error("Event contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("\"{0}\" is not a recognised key")]
    UnknownKey(String),

    #[error("Invalid heading \"{0}\", expected three numbers")]
    InvalidHeading(String),

    #[error("Empty event")]
    Empty,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl KeyCode {
    /// Get the key code bound to the given keyboard character, ignoring case.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'w' => Some(KeyCode::Forward),
            's' => Some(KeyCode::Back),
            'a' => Some(KeyCode::Left),
            'd' => Some(KeyCode::Right),
            'r' => Some(KeyCode::Up),
            'f' => Some(KeyCode::Down),
            'e' => Some(KeyCode::GripOpen),
            'q' => Some(KeyCode::GripClose),
            _ => None,
        }
    }
}

impl InputEvent {
    /// Parse a new event from a JSON string, for instance `{"KeyDown": "W"}`.
    pub fn from_json(json_str: &str) -> Result<Self, InputEventParseError> {
        serde_json::from_str(json_str).map_err(InputEventParseError::InvalidJson)
    }

    /// Parse a new event from a terse text command.
    ///
    /// - `w` presses the key bound to `w`, `-w` releases it,
    /// - `heading <x> <y> <z>` requests a new heading,
    /// - `stop` stops the loop.
    pub fn from_line(line: &str) -> Result<Self, InputEventParseError> {
        let line = line.trim();

        if line.is_empty() {
            return Err(InputEventParseError::Empty);
        }

        if line.eq_ignore_ascii_case("stop") {
            return Ok(InputEvent::Stop);
        }

        if let Some(rest) = line.strip_prefix("heading") {
            let components: Vec<f64> = rest
                .split_whitespace()
                .map(|s| s.parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| InputEventParseError::InvalidHeading(rest.trim().to_string()))?;

            return match components.as_slice() {
                [x, y, z] => Ok(InputEvent::SetHeading([*x, *y, *z])),
                _ => Err(InputEventParseError::InvalidHeading(rest.trim().to_string())),
            };
        }

        let (released, key_str) = match line.strip_prefix('-') {
            Some(k) => (true, k),
            None => (false, line),
        };

        let mut chars = key_str.chars();
        let key = match (chars.next(), chars.next()) {
            (Some(c), None) => KeyCode::from_char(c),
            _ => None,
        }
        .ok_or_else(|| InputEventParseError::UnknownKey(key_str.to_string()))?;

        if released {
            Ok(InputEvent::KeyUp(key))
        } else {
            Ok(InputEvent::KeyDown(key))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_char() {
        assert_eq!(KeyCode::from_char('w'), Some(KeyCode::Forward));
        assert_eq!(KeyCode::from_char('S'), Some(KeyCode::Back));
        assert_eq!(KeyCode::from_char('x'), None);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(
            InputEvent::from_json(r#"{"KeyDown": "W"}"#).unwrap(),
            InputEvent::KeyDown(KeyCode::Forward)
        );
        assert_eq!(
            InputEvent::from_json(r#"{"KeyUp": "Left"}"#).unwrap(),
            InputEvent::KeyUp(KeyCode::Left)
        );
        assert_eq!(
            InputEvent::from_json(r#"{"SetHeading": [0.0, 0.0, -1.0]}"#).unwrap(),
            InputEvent::SetHeading([0.0, 0.0, -1.0])
        );
        assert_eq!(InputEvent::from_json(r#""Stop""#).unwrap(), InputEvent::Stop);
        assert!(InputEvent::from_json(r#"{"KeyDown": "Z"}"#).is_err());
    }

    #[test]
    fn test_from_line() {
        assert_eq!(
            InputEvent::from_line("w").unwrap(),
            InputEvent::KeyDown(KeyCode::Forward)
        );
        assert_eq!(
            InputEvent::from_line(" -D ").unwrap(),
            InputEvent::KeyUp(KeyCode::Right)
        );
        assert_eq!(
            InputEvent::from_line("heading 1 0 -0.5").unwrap(),
            InputEvent::SetHeading([1.0, 0.0, -0.5])
        );
        assert_eq!(InputEvent::from_line("STOP").unwrap(), InputEvent::Stop);

        assert!(matches!(
            InputEvent::from_line("wd"),
            Err(InputEventParseError::UnknownKey(_))
        ));
        assert!(matches!(
            InputEvent::from_line("heading 1 2"),
            Err(InputEventParseError::InvalidHeading(_))
        ));
        assert!(matches!(
            InputEvent::from_line("   "),
            Err(InputEventParseError::Empty)
        ));
    }
}
