// Message types exchanged with the teleop clients

use serde::{Deserialize, Serialize};

/// Drive command from a client -> runtime
/// `hold` is optional: when absent the previous hold setting is kept
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriveCommand {
    pub speed: f32,
    pub turn: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hold: Option<bool>,
}

// Wire shape before validation. Extra fields (e.g. "type") are ignored.
#[derive(Debug, Deserialize)]
struct RawCommand {
    speed: Option<f32>,
    turn: Option<f32>,
    hold: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Malformed command: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Command is missing speed or turn")]
    Incomplete,
}

impl DriveCommand {
    pub fn new(speed: f32, turn: f32) -> Self {
        Self {
            speed,
            turn,
            hold: None,
        }
    }

    pub fn with_hold(mut self, hold: bool) -> Self {
        self.hold = Some(hold);
        self
    }

    /// Decode a JSON object payload. Both `speed` and `turn` must be present.
    pub fn decode(payload: &[u8]) -> Result<Self, CommandError> {
        // Only named fields: a bare array would otherwise fill the struct positionally
        let fields: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(payload)?;
        let raw: RawCommand = serde_json::from_value(serde_json::Value::Object(fields))?;
        match (raw.speed, raw.turn) {
            (Some(speed), Some(turn)) => Ok(Self {
                speed,
                turn,
                hold: raw.hold,
            }),
            _ => Err(CommandError::Incomplete),
        }
    }
}

/// Reply runtime -> client, sent after every accepted command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriveStatus {
    pub speed: f32,
    pub turn: f32,
    /// Milliseconds since runtime start when the last command was accepted
    #[serde(rename = "lastCommand")]
    pub last_command: u64,
}

/// Whether a nonzero command is currently in effect
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriveState {
    Active,
    Idle,
}
