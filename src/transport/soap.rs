// MIT License - Copyright (c) 2026 Peter Wright
// SOAP 1.1 over HTTPS

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};
use url::Url;

use super::Transport;
use crate::config::ArmType;
use crate::devices::location::Location;
use crate::devices::status::ArmedStatus;
use crate::error::{Result, TotalConnectError};
use crate::protocol::{
    Operation, RemoteResult, parse_arming_state, parse_locations, parse_result, parse_session_id,
};
use crate::xml::XmlNode;

/// HTTP transport posting SOAP envelopes to the TC2 endpoint.
#[derive(Debug, Clone)]
pub struct SoapTransport {
    http: reqwest::Client,
    endpoint: Url,
    timeout_ms: u64,
}

impl SoapTransport {
    /// Build a transport with its own HTTP client and a per-request timeout.
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
            timeout_ms,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn map_http_error(&self, e: reqwest::Error) -> TotalConnectError {
        if e.is_timeout() {
            TotalConnectError::Timeout {
                timeout_ms: self.timeout_ms,
            }
        } else {
            TotalConnectError::Transport(e)
        }
    }

    /// Post one operation and return the parsed reply document.
    async fn invoke(&self, op: &Operation<'_>) -> Result<XmlNode> {
        debug!("TC2 request: {}", op.action());
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", op.soap_action())
            .body(op.to_envelope())
            .send()
            .await
            .map_err(|e| self.map_http_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_http_error(e))?;
        trace!("TC2 reply to {} (HTTP {status}): {body}", op.action());

        let doc = match XmlNode::parse(&body) {
            Ok(doc) => doc,
            Err(e) if status.is_success() => return Err(e),
            Err(_) => {
                return Err(TotalConnectError::InvalidResponse {
                    details: format!("{} returned HTTP {status}", op.action()),
                });
            }
        };

        // Faults usually arrive with HTTP 500
        if let Some(fault) = doc.find("Fault") {
            let message = fault
                .find_text("faultstring")
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .unwrap_or("unspecified fault")
                .to_string();
            return Err(TotalConnectError::SoapFault { message });
        }
        if !status.is_success() {
            return Err(TotalConnectError::InvalidResponse {
                details: format!("{} returned HTTP {status}", op.action()),
            });
        }
        Ok(doc)
    }

    async fn invoke_unit(&self, op: Operation<'_>) -> Result<RemoteResult<()>> {
        let doc = self.invoke(&op).await?;
        Ok(parse_result(&doc, op.action())?.map(|_| ()))
    }
}

impl Transport for SoapTransport {
    async fn login(
        &self,
        username: &str,
        password: &str,
        application_id: &str,
        application_version: &str,
    ) -> Result<RemoteResult<String>> {
        let op = Operation::AuthenticateUserLogin {
            username,
            password,
            application_id,
            application_version,
        };
        let doc = self.invoke(&op).await?;
        parse_result(&doc, op.action())?.try_map(parse_session_id)
    }

    async fn get_session_details(
        &self,
        token: &str,
        application_id: &str,
        application_version: &str,
    ) -> Result<RemoteResult<Vec<Location>>> {
        let op = Operation::GetSessionDetails {
            session_id: token,
            application_id,
            application_version,
        };
        let doc = self.invoke(&op).await?;
        parse_result(&doc, op.action())?.try_map(parse_locations)
    }

    async fn arm_security_system(
        &self,
        token: &str,
        location_id: i64,
        device_id: i64,
        arm_type: ArmType,
    ) -> Result<RemoteResult<()>> {
        self.invoke_unit(Operation::ArmSecuritySystem {
            session_id: token,
            location_id,
            device_id,
            arm_type,
        })
        .await
    }

    async fn disarm_security_system(
        &self,
        token: &str,
        location_id: i64,
        device_id: i64,
    ) -> Result<RemoteResult<()>> {
        self.invoke_unit(Operation::DisarmSecuritySystem {
            session_id: token,
            location_id,
            device_id,
        })
        .await
    }

    async fn get_panel_status(
        &self,
        token: &str,
        location_id: i64,
    ) -> Result<RemoteResult<ArmedStatus>> {
        let op = Operation::GetPanelMetaDataAndFullStatus {
            session_id: token,
            location_id,
        };
        let doc = self.invoke(&op).await?;
        parse_result(&doc, op.action())?.try_map(parse_arming_state)
    }

    async fn keep_alive(&self, token: &str) -> Result<RemoteResult<()>> {
        self.invoke_unit(Operation::KeepAlive { session_id: token })
            .await
    }

    async fn logout(&self, token: &str) -> Result<RemoteResult<()>> {
        self.invoke_unit(Operation::Logout { session_id: token }).await
    }
}
