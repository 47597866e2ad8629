// Command freshness monitor (watchdog)
// If the teleop client stops sending commands the last nonzero command must
// not keep the robot driving forever. Expiry forces an all-stop unless the
// client asked to hold its last command.
//
// Pure state machine: time is passed in, actuation is returned, nothing is applied here.

use std::time::{Duration, Instant};

use crate::messages::{DriveCommand, DriveState, DriveStatus};
use crate::motor::clamp_unit;

/// What the loop must do after a freshness transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriveRequest {
    pub speed: f32,
    pub turn: f32,
}

impl DriveRequest {
    pub const ALL_STOP: DriveRequest = DriveRequest {
        speed: 0.0,
        turn: 0.0,
    };
}

/// Single source of truth for what the robot is currently doing
#[derive(Debug, Clone)]
pub struct FreshnessMonitor {
    started_at: Instant,
    last_command_at: Instant,
    active_speed: f32,
    active_turn: f32,
    hold_enabled: bool,
    timeout: Duration,
}

impl FreshnessMonitor {
    pub fn new(now: Instant, timeout: Duration) -> Self {
        Self {
            started_at: now,
            last_command_at: now,
            active_speed: 0.0,
            active_turn: 0.0,
            hold_enabled: false,
            timeout,
        }
    }

    /// Record an accepted command; the caller drives the returned request immediately
    ///
    /// Speed and turn are stored clamped to [-1, 1], which is also what the
    /// status reply echoes.
    pub fn accept(&mut self, cmd: &DriveCommand, now: Instant) -> DriveRequest {
        self.last_command_at = now;
        self.active_speed = clamp_unit(cmd.speed);
        self.active_turn = clamp_unit(cmd.turn);
        if let Some(hold) = cmd.hold {
            self.hold_enabled = hold;
        }

        DriveRequest {
            speed: self.active_speed,
            turn: self.active_turn,
        }
    }

    /// Periodic expiry check, run every loop tick
    ///
    /// Returns the all-stop request when the active command just expired.
    pub fn check(&mut self, now: Instant) -> Option<DriveRequest> {
        if self.hold_enabled || self.state() == DriveState::Idle {
            return None;
        }
        if now.saturating_duration_since(self.last_command_at) <= self.timeout {
            return None;
        }

        self.active_speed = 0.0;
        self.active_turn = 0.0;
        Some(DriveRequest::ALL_STOP)
    }

    pub fn state(&self) -> DriveState {
        if self.active_speed != 0.0 || self.active_turn != 0.0 {
            DriveState::Active
        } else {
            DriveState::Idle
        }
    }

    /// Time since the last accepted command
    pub fn command_age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_command_at)
    }

    pub fn active_speed(&self) -> f32 {
        self.active_speed
    }

    pub fn active_turn(&self) -> f32 {
        self.active_turn
    }

    pub fn hold_enabled(&self) -> bool {
        self.hold_enabled
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Reply body echoing the active command
    pub fn status(&self) -> DriveStatus {
        let since_start = self.last_command_at.saturating_duration_since(self.started_at);
        DriveStatus {
            speed: self.active_speed,
            turn: self.active_turn,
            last_command: since_start.as_millis() as u64,
        }
    }
}
