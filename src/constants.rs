// MIT License - Copyright (c) 2026 Peter Wright
// Total Connect 2.0 service constants

/// SOAP endpoint of the Total Connect 2.0 service.
pub const DEFAULT_ENDPOINT: &str = "https://rs.alarmnet.com/TC21api/tc2.asmx";

/// XML namespace of every TC2 operation; also the `SOAPAction` prefix.
pub const SOAP_NAMESPACE: &str = "https://services.alarmnet.com/TC2/";

/// Client identity sent with every login.
pub const APPLICATION_ID: &str = "14588";
pub const APPLICATION_VERSION: &str = "1.0.34";

/// The only `ResultData` value that denotes success.
pub const RESULT_SUCCESS: &str = "Success";

/// Reason recorded locally when an operation is attempted without a token.
pub const NOT_AUTHENTICATED: &str = "NotAuthenticated";

/// User code passed to arm/disarm; `-1` means "use the session's credentials".
pub const USER_CODE: &str = "-1";

/// Partition queried by the panel status call.
pub const STATUS_PARTITION_ID: u32 = 1;

/// Device names that identify the security panel within a location.
pub const SECURITY_PANEL_DEVICE_NAMES: [&str; 2] = ["Security Panel", "Security System"];

/// A token not refreshed for this long is treated as expired.
pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 4 * 60 * 1000;

/// Idle time after which a keep-alive ping is sent.
pub const DEFAULT_KEEP_ALIVE_INTERVAL_MS: u64 = 3 * 60 * 1000;

/// HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Cadence of the host poll loop.
pub const POLL_TICK_SECS: u64 = 30;
