// MIT License - Copyright (c) 2026 Peter Wright
// Remote service abstraction

pub mod soap;

pub use soap::SoapTransport;

use crate::config::ArmType;
use crate::devices::location::Location;
use crate::devices::status::ArmedStatus;
use crate::error::Result;
use crate::protocol::RemoteResult;

/// The TC2 operations the client needs, one method per remote call.
///
/// `Err` is a transport-level failure (network, timeout, fault, malformed
/// reply). A reply whose `ResultData` is not `Success` comes back as
/// `Ok(RemoteResult::Failure(..))`; session recovery is decided by the
/// caller, never here.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync {
    async fn login(
        &self,
        username: &str,
        password: &str,
        application_id: &str,
        application_version: &str,
    ) -> Result<RemoteResult<String>>;

    async fn get_session_details(
        &self,
        token: &str,
        application_id: &str,
        application_version: &str,
    ) -> Result<RemoteResult<Vec<Location>>>;

    async fn arm_security_system(
        &self,
        token: &str,
        location_id: i64,
        device_id: i64,
        arm_type: ArmType,
    ) -> Result<RemoteResult<()>>;

    async fn disarm_security_system(
        &self,
        token: &str,
        location_id: i64,
        device_id: i64,
    ) -> Result<RemoteResult<()>>;

    async fn get_panel_status(
        &self,
        token: &str,
        location_id: i64,
    ) -> Result<RemoteResult<ArmedStatus>>;

    async fn keep_alive(&self, token: &str) -> Result<RemoteResult<()>>;

    async fn logout(&self, token: &str) -> Result<RemoteResult<()>>;
}

#[cfg(test)]
pub(crate) mod mock {
    //! Scripted in-memory transport for unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::devices::location::Device;
    use crate::error::TotalConnectError;

    /// Queue of scripted replies; falls back to a default once drained.
    pub(crate) struct Script<T> {
        queue: Mutex<VecDeque<Result<RemoteResult<T>>>>,
    }

    impl<T> Default for Script<T> {
        fn default() -> Self {
            Self {
                queue: Mutex::new(VecDeque::new()),
            }
        }
    }

    impl<T> Script<T> {
        pub(crate) fn push(&self, reply: Result<RemoteResult<T>>) {
            self.queue.lock().unwrap().push_back(reply);
        }

        pub(crate) fn fail(&self, reason: &str) {
            self.push(Ok(RemoteResult::Failure(reason.to_string())));
        }

        pub(crate) fn timeout(&self) {
            self.push(Err(TotalConnectError::Timeout { timeout_ms: 30_000 }));
        }

        fn next(&self, default: impl FnOnce() -> T) -> Result<RemoteResult<T>> {
            self.queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(RemoteResult::Success(default())))
        }
    }

    pub(crate) fn home_location() -> Location {
        Location::new(
            1001,
            "Home",
            vec![Device::new(3, "Automation"), Device::new(7, "Security Panel")],
        )
    }

    #[derive(Default)]
    pub(crate) struct MockTransport {
        pub login: Script<String>,
        pub session_details: Script<Vec<Location>>,
        pub arm: Script<()>,
        pub disarm: Script<()>,
        pub status: Script<ArmedStatus>,
        pub keep_alive: Script<()>,
        pub logout: Script<()>,
        calls: Mutex<Vec<String>>,
        logins: Mutex<u32>,
    }

    impl MockTransport {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        /// Number of recorded calls whose entry starts with `prefix`.
        pub(crate) fn count(&self, prefix: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.starts_with(prefix))
                .count()
        }
    }

    impl Transport for MockTransport {
        async fn login(
            &self,
            username: &str,
            _password: &str,
            _application_id: &str,
            _application_version: &str,
        ) -> Result<RemoteResult<String>> {
            self.record(format!("login:{username}"));
            let n = {
                let mut logins = self.logins.lock().unwrap();
                *logins += 1;
                *logins
            };
            self.login.next(|| format!("token-{n}"))
        }

        async fn get_session_details(
            &self,
            token: &str,
            _application_id: &str,
            _application_version: &str,
        ) -> Result<RemoteResult<Vec<Location>>> {
            self.record(format!("details:{token}"));
            self.session_details.next(|| vec![home_location()])
        }

        async fn arm_security_system(
            &self,
            token: &str,
            location_id: i64,
            device_id: i64,
            arm_type: ArmType,
        ) -> Result<RemoteResult<()>> {
            self.record(format!(
                "arm:{}:{token}:{location_id}:{device_id}",
                arm_type.as_str()
            ));
            self.arm.next(|| ())
        }

        async fn disarm_security_system(
            &self,
            token: &str,
            location_id: i64,
            device_id: i64,
        ) -> Result<RemoteResult<()>> {
            self.record(format!("disarm:{token}:{location_id}:{device_id}"));
            self.disarm.next(|| ())
        }

        async fn get_panel_status(
            &self,
            token: &str,
            location_id: i64,
        ) -> Result<RemoteResult<ArmedStatus>> {
            self.record(format!("status:{token}:{location_id}"));
            self.status.next(|| ArmedStatus::DISARMED)
        }

        async fn keep_alive(&self, token: &str) -> Result<RemoteResult<()>> {
            self.record(format!("keepalive:{token}"));
            self.keep_alive.next(|| ())
        }

        async fn logout(&self, token: &str) -> Result<RemoteResult<()>> {
            self.record(format!("logout:{token}"));
            self.logout.next(|| ())
        }
    }
}
