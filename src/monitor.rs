// MIT License - Copyright (c) 2026 Peter Wright
// Keypad poll loop state

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::client::TotalConnectClient;
use crate::devices::keypad::{Keypad, KeypadState};
use crate::error::{Result, TotalConnectError};
use crate::event::{BridgeEvent, EventReceiver, EventSender, event_channel};
use crate::transport::Transport;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A user action targeted at one keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypadAction {
    Disarm,
    ArmAway,
    ArmStay,
    ArmStayNight,
    ArmStayInstant,
    ArmAwayInstant,
    RefreshStatus,
}

impl KeypadAction {
    fn describe(self) -> &'static str {
        match self {
            Self::Disarm => "disarming",
            Self::ArmAway => "away arming",
            Self::ArmStay => "stay arming",
            Self::ArmStayNight => "night arming",
            Self::ArmStayInstant => "instant stay arming",
            Self::ArmAwayInstant => "instant away arming",
            Self::RefreshStatus => "refreshing status",
        }
    }
}

/// Tracks the configured keypads and keeps their status current.
///
/// The host calls [`start`](Self::start) once, then [`tick`](Self::tick) on
/// a fixed period. Each tick pings keep-alive when the session is idle and
/// re-polls keypads whose status is older than the refresh interval or
/// caught mid-transition. A refresh interval of zero disables re-polling.
pub struct KeypadMonitor<T> {
    client: TotalConnectClient<T>,
    keypads: Vec<Keypad>,
    refresh_interval: Option<chrono::Duration>,
    event_tx: EventSender,
}

impl<T: Transport> KeypadMonitor<T> {
    pub fn new(
        client: TotalConnectClient<T>,
        keypads: Vec<Keypad>,
        refresh_interval_minutes: u32,
    ) -> Self {
        let (event_tx, _) = event_channel(EVENT_CHANNEL_CAPACITY);
        let refresh_interval = (refresh_interval_minutes > 0)
            .then(|| chrono::Duration::minutes(i64::from(refresh_interval_minutes)));
        Self {
            client,
            keypads,
            refresh_interval,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.event_tx.subscribe()
    }

    pub fn client(&self) -> &TotalConnectClient<T> {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut TotalConnectClient<T> {
        &mut self.client
    }

    pub fn keypads(&self) -> &[Keypad] {
        &self.keypads
    }

    pub fn keypad(&self, name: &str) -> Option<&Keypad> {
        self.keypads.iter().find(|k| k.name == name)
    }

    pub fn refresh_interval(&self) -> Option<chrono::Duration> {
        self.refresh_interval
    }

    fn emit(&self, event: BridgeEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Load location details, then read every keypad's status without
    /// triggering events. Returns whether the details were loaded.
    pub async fn start(&mut self) -> bool {
        let loaded = self.client.populate_details().await;
        if loaded {
            let names = self
                .client
                .location_names()
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>();
            debug!("Total Connect locations: {names:?}");
            self.emit(BridgeEvent::DetailsLoaded { locations: names });
        }

        let now = Utc::now();
        for idx in 0..self.keypads.len() {
            if let Err(e) = self.update_keypad(idx, false, now).await {
                warn!("Could not initialize keypad {}: {e}", self.keypads[idx].name);
            }
        }
        loaded
    }

    /// Start tracking another keypad and read its initial status.
    pub async fn add_keypad(&mut self, keypad: Keypad) -> Result<bool> {
        info!(
            "Tracking keypad {} at location {}",
            keypad.name, keypad.location_name
        );
        self.keypads.push(keypad);
        let idx = self.keypads.len() - 1;
        self.update_keypad(idx, false, Utc::now()).await
    }

    /// One pass of the poll loop at the current time.
    pub async fn tick(&mut self) {
        self.tick_at(Utc::now()).await;
    }

    /// One pass of the poll loop, judging keypad staleness against `now`.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) {
        debug!("Executing keypad poll tick");
        self.client.run_loop_tasks().await;

        let Some(interval) = self.refresh_interval else {
            return;
        };
        for idx in 0..self.keypads.len() {
            if !self.keypads[idx].needs_refresh(now, interval) {
                continue;
            }
            debug!("Updating status of {}", self.keypads[idx].name);
            if let Err(e) = self.update_keypad(idx, true, now).await {
                warn!("Could not update keypad {}: {e}", self.keypads[idx].name);
            }
        }
    }

    /// Run a user action against a keypad's location, then refresh it.
    ///
    /// Returns whether the action took effect (for `RefreshStatus`, whether
    /// a status was read).
    pub async fn perform(&mut self, action: KeypadAction, keypad_name: &str) -> Result<bool> {
        let idx = self
            .keypads
            .iter()
            .position(|k| k.name == keypad_name)
            .ok_or_else(|| TotalConnectError::UnknownKeypad {
                name: keypad_name.to_string(),
            })?;
        let location = self.keypads[idx].location_name.clone();
        let location = Some(location.as_str());

        info!("Security panel {keypad_name} {}.", action.describe());
        let done = match action {
            KeypadAction::Disarm => self.client.disarm(location).await?,
            KeypadAction::ArmAway => self.client.arm_away(location).await?,
            KeypadAction::ArmStay => self.client.arm_stay(location).await?,
            KeypadAction::ArmStayNight => self.client.arm_stay_night(location).await?,
            KeypadAction::ArmStayInstant => self.client.arm_stay_instant(location).await?,
            KeypadAction::ArmAwayInstant => self.client.arm_away_instant(location).await?,
            KeypadAction::RefreshStatus => {
                return self.update_keypad(idx, true, Utc::now()).await;
            }
        };
        self.update_keypad(idx, true, Utc::now()).await?;
        Ok(done)
    }

    /// Read and store one keypad's status. Returns whether a status was read.
    async fn update_keypad(
        &mut self,
        idx: usize,
        trigger_events: bool,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let location = self.keypads[idx].location_name.clone();
        let status = self.client.get_armed_status(Some(&location)).await?;

        let keypad = &mut self.keypads[idx];
        let changed = match keypad.update_status(status, now) {
            Ok(changed) => changed,
            Err(e) => {
                if !status.is_error() {
                    warn!("{}: {e}", keypad.name);
                }
                let event = BridgeEvent::StatusUnavailable {
                    keypad: keypad.name.clone(),
                    status,
                };
                self.emit(event);
                return Ok(false);
            }
        };

        let Some(state) = keypad.state.clone() else {
            return Ok(false);
        };
        if !trigger_events || changed {
            info!(
                "{} is {}; status last updated at {}",
                keypad.name,
                state.detail_display,
                state.last_status_update_str()
            );
        } else {
            debug!(
                "{} is {}; status last updated at {}",
                keypad.name,
                state.detail_display,
                state.last_status_update_str()
            );
        }
        let event = BridgeEvent::KeypadUpdated {
            keypad: keypad.name.clone(),
            location: keypad.location_name.clone(),
            state,
            changed,
            trigger_events,
        };
        self.emit(event);
        Ok(true)
    }

    /// Current state of every keypad that has been read at least once.
    pub fn states(&self) -> Vec<(&str, &KeypadState)> {
        self.keypads
            .iter()
            .filter_map(|k| k.state.as_ref().map(|s| (k.name.as_str(), s)))
            .collect()
    }

    pub async fn logout(&mut self) -> bool {
        self.client.logout().await
    }
}
