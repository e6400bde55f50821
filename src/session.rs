// MIT License - Copyright (c) 2026 Peter Wright
// Session token lifecycle

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::error::{Result, TotalConnectError};
use crate::protocol::RemoteResult;
use crate::transport::Transport;

/// The in-memory session: a token and when it was last known good.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Option<String>,
    last_refreshed: Option<Instant>,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn last_refreshed(&self) -> Option<Instant> {
        self.last_refreshed
    }

    /// Time since the last successful remote call, `None` if never.
    pub fn idle_for(&self) -> Option<Duration> {
        self.last_refreshed.map(|t| t.elapsed())
    }

    fn clear(&mut self) {
        self.token = None;
        self.last_refreshed = None;
    }
}

/// Owns the transport, the stored credentials and the session token.
///
/// The server drops idle sessions after roughly four minutes. A token is
/// treated as fresh while the last successful call is within
/// `session_timeout`; `keep_alive_if_idle` pings the service once
/// `keep_alive_interval` has passed so that an otherwise quiet client never
/// reaches the timeout.
pub struct SessionManager<T> {
    transport: T,
    username: String,
    password: SecretString,
    application_id: String,
    application_version: String,
    session_timeout: Duration,
    keep_alive_interval: Duration,
    session: Session,
}

impl<T: Transport> SessionManager<T> {
    /// Create a manager with an empty session. No remote call is made.
    pub fn new(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            username: config.username,
            password: config.password,
            application_id: config.application_id,
            application_version: config.application_version,
            session_timeout: Duration::from_millis(config.session_timeout_ms),
            keep_alive_interval: Duration::from_millis(config.keep_alive_interval_ms),
            session: Session::default(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn token(&self) -> Option<&str> {
        self.session.token()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn application_version(&self) -> &str {
        &self.application_version
    }

    /// Log in with the stored credentials and keep the returned token.
    ///
    /// A failed login leaves any previous token in place; the next call
    /// made with it is rejected remotely and goes through the retry path.
    pub async fn authenticate(&mut self) -> Result<String> {
        let reply = self
            .transport
            .login(
                &self.username,
                self.password.expose_secret(),
                &self.application_id,
                &self.application_version,
            )
            .await;

        match reply {
            Ok(RemoteResult::Success(token)) => {
                self.session.token = Some(token.clone());
                self.record_success();
                info!("Logged in to Total Connect as user: {}", self.username);
                Ok(token)
            }
            Ok(RemoteResult::Failure(reason)) => {
                error!("Authentication error when connecting to Total Connect: {reason}");
                Err(TotalConnectError::Authentication { reason })
            }
            Err(e) => {
                error!("Total Connect authentication failed: {e}");
                Err(e)
            }
        }
    }

    /// Log in again after a call was rejected for a stale session.
    pub async fn reestablish(&mut self) -> Result<String> {
        info!("Last command failed due to invalid Total Connect session ID. Logging in again.");
        self.authenticate().await
    }

    /// Whether the current token can be used without logging in first.
    pub fn is_session_fresh(&self) -> bool {
        self.session.token.is_some()
            && self
                .session
                .idle_for()
                .is_some_and(|idle| idle <= self.session_timeout)
    }

    /// Authenticate if the session is missing or stale.
    ///
    /// Errors are already logged by `authenticate`; callers detect the
    /// outcome through `token()`.
    pub async fn ensure_session(&mut self) {
        if !self.is_session_fresh() {
            debug!("Total Connect session is not fresh, authenticating");
            let _ = self.authenticate().await;
        }
    }

    /// Whether the session has been idle long enough to warrant a ping.
    pub fn needs_keep_alive(&self) -> bool {
        self.session
            .idle_for()
            .is_none_or(|idle| idle > self.keep_alive_interval)
    }

    /// Ping the service. Returns whether the ping succeeded.
    pub async fn keep_alive(&mut self) -> bool {
        let Some(token) = self.session.token.as_deref() else {
            debug!("No Total Connect session to keep alive");
            return false;
        };
        match self.transport.keep_alive(token).await {
            Ok(RemoteResult::Success(())) => {
                debug!("Keep alive used to maintain connection to Total Connect.");
                self.record_success();
                true
            }
            Ok(RemoteResult::Failure(reason)) => {
                debug!("Total Connect keep alive rejected: {reason}");
                false
            }
            Err(e) => {
                warn!("The Total Connect connection could not be kept open: {e}");
                false
            }
        }
    }

    /// Ping only when idle past the keep-alive interval.
    pub async fn keep_alive_if_idle(&mut self) -> bool {
        if self.needs_keep_alive() {
            self.keep_alive().await
        } else {
            false
        }
    }

    /// End the session remotely. The local token is cleared only when the
    /// service confirms the logout.
    pub async fn logout(&mut self) -> bool {
        let Some(token) = self.session.token.as_deref() else {
            return false;
        };
        match self.transport.logout(token).await {
            Ok(RemoteResult::Success(())) => {
                self.session.clear();
                info!("Logged out of Total Connect.");
                true
            }
            Ok(RemoteResult::Failure(reason)) => {
                warn!("Error logging out of Total Connect: {reason}.");
                false
            }
            Err(e) => {
                warn!("Error when logging out of Total Connect: {e}");
                false
            }
        }
    }

    /// Reset the freshness timer after a successful remote call.
    pub fn record_success(&mut self) {
        self.session.last_refreshed = Some(Instant::now());
    }
}
