// MIT License - Copyright (c) 2026 Peter Wright
// Error taxonomy for the Total Connect adapter

/// All errors that can occur while talking to Total Connect.
#[derive(Debug, thiserror::Error)]
pub enum TotalConnectError {
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("SOAP fault: {message}")]
    SoapFault { message: String },

    #[error("Invalid response: {details}")]
    InvalidResponse { details: String },

    #[error("Authentication failed: {reason}")]
    Authentication { reason: String },

    #[error("Session invalid after re-authentication: {reason}")]
    SessionInvalid { reason: String },

    #[error("Could not select location {}", display_location(.name))]
    LocationNotFound { name: Option<String> },

    #[error("No security panel found at location {location}")]
    DeviceNotFound { location: String },

    #[error("Unrecognized armed status code: {code}")]
    UnrecognizedStatusCode { code: i64 },

    #[error("Unknown keypad: {name}")]
    UnknownKeypad { name: String },
}

fn display_location(name: &Option<String>) -> String {
    match name {
        Some(name) => format!("'{name}'"),
        None => "(default)".to_string(),
    }
}

impl TotalConnectError {
    /// Whether this error came from the wire (connection, timeout, malformed
    /// reply) rather than from the service or from local configuration.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            TotalConnectError::Transport(_)
                | TotalConnectError::Timeout { .. }
                | TotalConnectError::InvalidUrl(_)
                | TotalConnectError::SoapFault { .. }
                | TotalConnectError::InvalidResponse { .. }
        )
    }

    /// Whether this error points at a configuration/data mismatch that no
    /// amount of retrying will fix.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TotalConnectError::LocationNotFound { .. }
                | TotalConnectError::DeviceNotFound { .. }
                | TotalConnectError::UnknownKeypad { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TotalConnectError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_classification() {
        assert!(TotalConnectError::Timeout { timeout_ms: 100 }.is_transport());
        assert!(TotalConnectError::InvalidResponse { details: "x".into() }.is_transport());
        assert!(!TotalConnectError::SessionInvalid { reason: "InvalidSessionID".into() }.is_transport());
        assert!(!TotalConnectError::LocationNotFound { name: None }.is_transport());
    }

    #[test]
    fn test_configuration_classification() {
        assert!(TotalConnectError::LocationNotFound { name: Some("Home".into()) }.is_configuration());
        assert!(TotalConnectError::DeviceNotFound { location: "Home".into() }.is_configuration());
        assert!(!TotalConnectError::Authentication { reason: "Failed".into() }.is_configuration());
    }

    #[test]
    fn test_location_not_found_message() {
        let named = TotalConnectError::LocationNotFound { name: Some("Cabin".into()) };
        assert_eq!(named.to_string(), "Could not select location 'Cabin'");
        let default = TotalConnectError::LocationNotFound { name: None };
        assert_eq!(default.to_string(), "Could not select location (default)");
    }
}
