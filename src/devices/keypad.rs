// MIT License - Copyright (c) 2026 Peter Wright
// Host-side keypad device

use chrono::{DateTime, Utc};

use crate::devices::status::ArmedStatus;
use crate::error::Result;

/// Timestamp format shown to the host for `last_status_update`.
pub const STATUS_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Derived status fields the host renders for a keypad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypadState {
    pub status: ArmedStatus,
    pub state: &'static str,
    pub state_display: &'static str,
    pub detail: &'static str,
    pub detail_display: &'static str,
    pub is_armed: bool,
    pub is_bypass: bool,
    pub last_status_update: DateTime<Utc>,
}

impl KeypadState {
    /// Build the state for a recognized status code.
    pub fn from_status(status: ArmedStatus, at: DateTime<Utc>) -> Result<Self> {
        let d = status.try_descriptor()?;
        Ok(Self {
            status,
            state: d.kind.as_str(),
            state_display: d.kind.as_str(),
            detail: d.detail,
            detail_display: d.detail,
            is_armed: d.armed,
            is_bypass: d.bypass,
            last_status_update: at,
        })
    }

    pub fn last_status_update_str(&self) -> String {
        self.last_status_update
            .format(STATUS_TIMESTAMP_FORMAT)
            .to_string()
    }
}

/// A keypad device tracked by the host, bound to one location.
#[derive(Debug, Clone)]
pub struct Keypad {
    pub name: String,
    pub location_name: String,
    pub state: Option<KeypadState>,
}

impl Keypad {
    pub fn new(name: impl Into<String>, location_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location_name: location_name.into(),
            state: None,
        }
    }

    pub fn status(&self) -> Option<ArmedStatus> {
        self.state.as_ref().map(|s| s.status)
    }

    pub fn last_status_update(&self) -> Option<DateTime<Utc>> {
        self.state.as_ref().map(|s| s.last_status_update)
    }

    /// Whether the poll loop should fetch a fresh status.
    ///
    /// Keypads never polled, polled longer than `refresh_interval` ago, or
    /// caught mid-transition (arming/disarming) are due.
    pub fn needs_refresh(&self, now: DateTime<Utc>, refresh_interval: chrono::Duration) -> bool {
        match &self.state {
            None => true,
            Some(state) => {
                state.status.is_pending() || now - state.last_status_update > refresh_interval
            }
        }
    }

    /// Record a freshly read status. Returns whether the state type changed.
    ///
    /// Unrecognized codes are rejected and leave the previous state intact.
    pub fn update_status(&mut self, status: ArmedStatus, now: DateTime<Utc>) -> Result<bool> {
        let new_state = KeypadState::from_status(status, now)?;
        let changed = self
            .state
            .as_ref()
            .is_none_or(|old| old.state != new_state.state);
        self.state = Some(new_state);
        Ok(changed)
    }
}
