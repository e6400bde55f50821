// MIT License - Copyright (c) 2026 Peter Wright
// Panel command facade

use tracing::{debug, info, warn};

use crate::config::{ArmType, ClientConfig};
use crate::constants::NOT_AUTHENTICATED;
use crate::devices::location::{Location, find_location};
use crate::devices::status::ArmedStatus;
use crate::error::{Result, TotalConnectError};
use crate::protocol::RemoteResult;
use crate::session::SessionManager;
use crate::transport::{SoapTransport, Transport};

/// Which pass of the retry loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

/// One remote operation, replayable after re-authentication.
trait RemoteCall {
    type Output;

    fn name(&self) -> &'static str;

    async fn invoke<T: Transport>(
        &self,
        session: &SessionManager<T>,
        token: &str,
    ) -> Result<RemoteResult<Self::Output>>;
}

struct SessionDetails;

impl RemoteCall for SessionDetails {
    type Output = Vec<Location>;

    fn name(&self) -> &'static str {
        "GetSessionDetails"
    }

    async fn invoke<T: Transport>(
        &self,
        session: &SessionManager<T>,
        token: &str,
    ) -> Result<RemoteResult<Vec<Location>>> {
        session
            .transport()
            .get_session_details(
                token,
                session.application_id(),
                session.application_version(),
            )
            .await
    }
}

/// A resolved location and its security panel.
#[derive(Debug, PartialEq, Eq)]
struct PanelTarget {
    location_id: i64,
    location_name: String,
    device_id: i64,
}

struct Arm {
    location_id: i64,
    device_id: i64,
    arm_type: ArmType,
}

impl RemoteCall for Arm {
    type Output = ();

    fn name(&self) -> &'static str {
        "ArmSecuritySystem"
    }

    async fn invoke<T: Transport>(
        &self,
        session: &SessionManager<T>,
        token: &str,
    ) -> Result<RemoteResult<()>> {
        session
            .transport()
            .arm_security_system(token, self.location_id, self.device_id, self.arm_type)
            .await
    }
}

struct Disarm {
    location_id: i64,
    device_id: i64,
}

impl RemoteCall for Disarm {
    type Output = ();

    fn name(&self) -> &'static str {
        "DisarmSecuritySystem"
    }

    async fn invoke<T: Transport>(
        &self,
        session: &SessionManager<T>,
        token: &str,
    ) -> Result<RemoteResult<()>> {
        session
            .transport()
            .disarm_security_system(token, self.location_id, self.device_id)
            .await
    }
}

struct PanelStatus {
    location_id: i64,
}

impl RemoteCall for PanelStatus {
    type Output = ArmedStatus;

    fn name(&self) -> &'static str {
        "GetPanelMetaDataAndFullStatus"
    }

    async fn invoke<T: Transport>(
        &self,
        session: &SessionManager<T>,
        token: &str,
    ) -> Result<RemoteResult<ArmedStatus>> {
        session
            .transport()
            .get_panel_status(token, self.location_id)
            .await
    }
}

/// Named panel operations over a managed Total Connect session.
///
/// Every remote operation makes sure the session is fresh, calls the
/// service, and if the reply is anything but `Success` logs in again and
/// repeats the call exactly once. Transport errors are never retried.
///
/// Location and device resolution errors propagate to the caller. Remote
/// failures do not: arm/disarm report `Ok(false)` and status reads report
/// [`ArmedStatus::ERROR`].
pub struct TotalConnectClient<T> {
    session: SessionManager<T>,
    locations: Vec<Location>,
}

impl TotalConnectClient<SoapTransport> {
    /// Create a SOAP-backed client and log in.
    ///
    /// Only an invalid endpoint is fatal. A failed login is logged and
    /// retried by the next operation.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let transport = SoapTransport::new(&config.endpoint, config.request_timeout_ms)?;
        let mut client = Self::new(config, transport);
        client.session.ensure_session().await;
        Ok(client)
    }
}

impl<T: Transport> TotalConnectClient<T> {
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            session: SessionManager::new(config, transport),
            locations: Vec::new(),
        }
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut SessionManager<T> {
        &mut self.session
    }

    /// Run `call` with the session, re-authenticating and retrying once
    /// when the service reports anything but success.
    async fn call_with_session_retry<C: RemoteCall>(&mut self, call: &C) -> Result<C::Output> {
        let mut attempt = Attempt::First;
        loop {
            if attempt == Attempt::First {
                self.session.ensure_session().await;
            }

            let outcome = match self.session.token() {
                Some(token) => call.invoke(&self.session, token).await?,
                None => RemoteResult::Failure(NOT_AUTHENTICATED.to_string()),
            };

            match (outcome, attempt) {
                (RemoteResult::Success(value), _) => {
                    self.session.record_success();
                    return Ok(value);
                }
                (RemoteResult::Failure(reason), Attempt::First) => {
                    debug!("{} rejected: {reason}", call.name());
                    let _ = self.session.reestablish().await;
                    attempt = Attempt::Retry;
                }
                (RemoteResult::Failure(reason), Attempt::Retry) => {
                    return Err(TotalConnectError::SessionInvalid { reason });
                }
            }
        }
    }

    /// Fetch the location/device tree. Returns whether it was loaded.
    pub async fn populate_details(&mut self) -> bool {
        match self.call_with_session_retry(&SessionDetails).await {
            Ok(locations) => {
                debug!(
                    "Fetched configuration details from Total Connect: {} location(s)",
                    locations.len()
                );
                self.locations = locations;
                true
            }
            Err(e) => {
                warn!("Configuration details could not be loaded from Total Connect: {e}");
                false
            }
        }
    }

    /// Locations from the last successful `populate_details`.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location_names(&self) -> Vec<&str> {
        self.locations.iter().map(|l| l.name.as_str()).collect()
    }

    /// The named location, or the first one when `name` is `None`.
    pub fn get_location_by_name(&self, name: Option<&str>) -> Result<&Location> {
        find_location(&self.locations, name)
    }

    fn resolve_panel(&self, location_name: Option<&str>) -> Result<PanelTarget> {
        let location = self.get_location_by_name(location_name)?;
        let device_id = location.security_panel_id()?;
        debug!("Device ID {device_id} found for location {}", location.name);
        Ok(PanelTarget {
            location_id: location.id,
            location_name: location.name.clone(),
            device_id,
        })
    }

    /// Arm the security panel at a location.
    ///
    /// Returns `Ok(false)` when the service could not be reached or kept
    /// rejecting the request.
    pub async fn arm(&mut self, arm_type: ArmType, location_name: Option<&str>) -> Result<bool> {
        let target = self.resolve_panel(location_name)?;
        let call = Arm {
            location_id: target.location_id,
            device_id: target.device_id,
            arm_type,
        };
        match self.call_with_session_retry(&call).await {
            Ok(()) => {
                info!(
                    "Armed security panel ({}) at {} via Total Connect",
                    arm_type.as_str(),
                    target.location_name
                );
                Ok(true)
            }
            Err(e) => {
                warn!(
                    "Failed to arm security panel ({}) at {}; it may not be armed: {e}",
                    arm_type.as_str(),
                    target.location_name
                );
                Ok(false)
            }
        }
    }

    pub async fn arm_away(&mut self, location_name: Option<&str>) -> Result<bool> {
        self.arm(ArmType::Away, location_name).await
    }

    pub async fn arm_stay(&mut self, location_name: Option<&str>) -> Result<bool> {
        self.arm(ArmType::Stay, location_name).await
    }

    pub async fn arm_stay_instant(&mut self, location_name: Option<&str>) -> Result<bool> {
        self.arm(ArmType::StayInstant, location_name).await
    }

    pub async fn arm_away_instant(&mut self, location_name: Option<&str>) -> Result<bool> {
        self.arm(ArmType::AwayInstant, location_name).await
    }

    pub async fn arm_stay_night(&mut self, location_name: Option<&str>) -> Result<bool> {
        self.arm(ArmType::StayNight, location_name).await
    }

    /// Disarm the security panel at a location.
    pub async fn disarm(&mut self, location_name: Option<&str>) -> Result<bool> {
        let target = self.resolve_panel(location_name)?;
        let call = Disarm {
            location_id: target.location_id,
            device_id: target.device_id,
        };
        match self.call_with_session_retry(&call).await {
            Ok(()) => {
                info!(
                    "Disarmed security panel at {} via Total Connect",
                    target.location_name
                );
                Ok(true)
            }
            Err(e) => {
                warn!(
                    "Failed to disarm security panel at {}; it may not be disarmed: {e}",
                    target.location_name
                );
                Ok(false)
            }
        }
    }

    /// Read the arming state of the location's first partition.
    ///
    /// Returns [`ArmedStatus::ERROR`] when the status could not be read.
    pub async fn get_armed_status(&mut self, location_name: Option<&str>) -> Result<ArmedStatus> {
        let location = self.get_location_by_name(location_name)?;
        let (location_id, name) = (location.id, location.name.clone());
        match self
            .call_with_session_retry(&PanelStatus { location_id })
            .await
        {
            Ok(status) => {
                debug!("Retrieved armed status of {name}: {status}");
                Ok(status)
            }
            Err(e) => {
                warn!("Could not obtain armed status of {name}: {e}");
                Ok(ArmedStatus::ERROR)
            }
        }
    }

    /// Whether the panel is armed in any mode; `None` if the status is unknown.
    pub async fn is_armed(&mut self, location_name: Option<&str>) -> Result<Option<bool>> {
        Ok(self.get_armed_status(location_name).await?.is_armed())
    }

    pub async fn is_arming(&mut self, location_name: Option<&str>) -> Result<bool> {
        Ok(self.get_armed_status(location_name).await?.is_arming())
    }

    pub async fn is_disarming(&mut self, location_name: Option<&str>) -> Result<bool> {
        Ok(self.get_armed_status(location_name).await?.is_disarming())
    }

    pub async fn is_pending(&mut self, location_name: Option<&str>) -> Result<bool> {
        Ok(self.get_armed_status(location_name).await?.is_pending())
    }

    /// Periodic housekeeping: keep the session alive when idle.
    pub async fn run_loop_tasks(&mut self) {
        self.session.keep_alive_if_idle().await;
    }

    pub async fn logout(&mut self) -> bool {
        self.session.logout().await
    }
}
