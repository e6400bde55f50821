// MIT License - Copyright (c) 2026 Peter Wright
// TC2 SOAP operations and reply decoding

use quick_xml::escape::escape;

use crate::config::ArmType;
use crate::constants::{RESULT_SUCCESS, SOAP_NAMESPACE, STATUS_PARTITION_ID, USER_CODE};
use crate::devices::location::{Device, Location};
use crate::devices::status::ArmedStatus;
use crate::error::{Result, TotalConnectError};
use crate::xml::XmlNode;

/// Outcome reported by the service in a reply's `ResultData`.
///
/// `Success` is the only success sentinel; every other value is a
/// business failure carrying the raw reason (e.g. `InvalidSessionID`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteResult<T> {
    Success(T),
    Failure(String),
}

impl<T> RemoteResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RemoteResult::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RemoteResult<U> {
        match self {
            RemoteResult::Success(v) => RemoteResult::Success(f(v)),
            RemoteResult::Failure(reason) => RemoteResult::Failure(reason),
        }
    }

    /// Map the success value with a fallible decoder.
    pub fn try_map<U>(self, f: impl FnOnce(T) -> Result<U>) -> Result<RemoteResult<U>> {
        match self {
            RemoteResult::Success(v) => Ok(RemoteResult::Success(f(v)?)),
            RemoteResult::Failure(reason) => Ok(RemoteResult::Failure(reason)),
        }
    }
}

/// Operations exposed by the TC2 service.
///
/// Every request is a SOAP 1.1 envelope posted to the service endpoint with
/// `SOAPAction: "https://services.alarmnet.com/TC2/<Operation>"`. Every reply
/// wraps a `<Operation>Result` element carrying `ResultCode` and
/// `ResultData`.
#[derive(Clone)]
pub enum Operation<'a> {
    /// `AuthenticateUserLogin`: returns `SessionID`.
    AuthenticateUserLogin {
        username: &'a str,
        password: &'a str,
        application_id: &'a str,
        application_version: &'a str,
    },
    /// `GetSessionDetails`: returns the location/device tree.
    GetSessionDetails {
        session_id: &'a str,
        application_id: &'a str,
        application_version: &'a str,
    },
    /// `ArmSecuritySystem`: `ArmType` is the raw opcode.
    ArmSecuritySystem {
        session_id: &'a str,
        location_id: i64,
        device_id: i64,
        arm_type: ArmType,
    },
    /// `DisarmSecuritySystem`.
    DisarmSecuritySystem {
        session_id: &'a str,
        location_id: i64,
        device_id: i64,
    },
    /// `GetPanelMetaDataAndFullStatus`: full status of one partition,
    /// never incremental (sequence number and timestamp are zero).
    GetPanelMetaDataAndFullStatus {
        session_id: &'a str,
        location_id: i64,
    },
    /// `KeepAlive`: refreshes the session on the server side.
    KeepAlive { session_id: &'a str },
    /// `Logout`: terminates the session.
    Logout { session_id: &'a str },
}

impl Operation<'_> {
    /// The SOAP operation name.
    pub fn action(&self) -> &'static str {
        match self {
            Self::AuthenticateUserLogin { .. } => "AuthenticateUserLogin",
            Self::GetSessionDetails { .. } => "GetSessionDetails",
            Self::ArmSecuritySystem { .. } => "ArmSecuritySystem",
            Self::DisarmSecuritySystem { .. } => "DisarmSecuritySystem",
            Self::GetPanelMetaDataAndFullStatus { .. } => "GetPanelMetaDataAndFullStatus",
            Self::KeepAlive { .. } => "KeepAlive",
            Self::Logout { .. } => "Logout",
        }
    }

    /// Value of the `SOAPAction` header (quoted, as SOAP 1.1 requires).
    pub fn soap_action(&self) -> String {
        format!("\"{SOAP_NAMESPACE}{}\"", self.action())
    }

    /// Ordered request parameters.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::AuthenticateUserLogin {
                username,
                password,
                application_id,
                application_version,
            } => vec![
                ("userName", username.to_string()),
                ("password", password.to_string()),
                ("ApplicationID", application_id.to_string()),
                ("ApplicationVersion", application_version.to_string()),
            ],
            Self::GetSessionDetails {
                session_id,
                application_id,
                application_version,
            } => vec![
                ("SessionID", session_id.to_string()),
                ("ApplicationID", application_id.to_string()),
                ("ApplicationVersion", application_version.to_string()),
            ],
            Self::ArmSecuritySystem {
                session_id,
                location_id,
                device_id,
                arm_type,
            } => vec![
                ("SessionID", session_id.to_string()),
                ("LocationID", location_id.to_string()),
                ("DeviceID", device_id.to_string()),
                ("ArmType", arm_type.opcode().to_string()),
                ("UserCode", USER_CODE.to_string()),
            ],
            Self::DisarmSecuritySystem {
                session_id,
                location_id,
                device_id,
            } => vec![
                ("SessionID", session_id.to_string()),
                ("LocationID", location_id.to_string()),
                ("DeviceID", device_id.to_string()),
                ("UserCode", USER_CODE.to_string()),
            ],
            Self::GetPanelMetaDataAndFullStatus {
                session_id,
                location_id,
            } => vec![
                ("SessionID", session_id.to_string()),
                ("LocationID", location_id.to_string()),
                ("LastSequenceNumber", "0".to_string()),
                ("LastUpdatedTimestampTicks", "0".to_string()),
                ("PartitionID", STATUS_PARTITION_ID.to_string()),
            ],
            Self::KeepAlive { session_id } | Self::Logout { session_id } => {
                vec![("SessionID", session_id.to_string())]
            }
        }
    }

    /// Serialize the request as a SOAP 1.1 envelope.
    pub fn to_envelope(&self) -> String {
        let action = self.action();
        let mut body = String::new();
        for (name, value) in self.params() {
            body.push_str(&format!("<{name}>{}</{name}>", escape(value.as_str())));
        }
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" "#,
                r#"xmlns:xsd="http://www.w3.org/2001/XMLSchema" "#,
                r#"xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">"#,
                r#"<soap:Body><{action} xmlns="{ns}">{body}</{action}></soap:Body>"#,
                r#"</soap:Envelope>"#,
            ),
            action = action,
            ns = SOAP_NAMESPACE,
            body = body,
        )
    }
}

/// Split a reply body into success (with the result element) or failure.
pub fn parse_result<'a>(body: &'a XmlNode, action: &str) -> Result<RemoteResult<&'a XmlNode>> {
    let result_name = format!("{action}Result");
    let result = body.find(&result_name).unwrap_or(body);
    let data = result
        .find_text("ResultData")
        .ok_or_else(|| TotalConnectError::InvalidResponse {
            details: format!("{action} reply has no ResultData"),
        })?
        .trim();
    if data == RESULT_SUCCESS {
        Ok(RemoteResult::Success(result))
    } else {
        Ok(RemoteResult::Failure(data.to_string()))
    }
}

/// `SessionID` from an `AuthenticateUserLogin` result.
pub fn parse_session_id(result: &XmlNode) -> Result<String> {
    match result.find_text("SessionID").map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(TotalConnectError::InvalidResponse {
            details: "login reply has no SessionID".to_string(),
        }),
    }
}

/// Location/device tree from a `GetSessionDetails` result.
pub fn parse_locations(result: &XmlNode) -> Result<Vec<Location>> {
    let Some(locations) = result.find("Locations") else {
        return Ok(Vec::new());
    };
    locations
        .children_named("LocationInfoBasic")
        .map(parse_location)
        .collect()
}

fn parse_location(node: &XmlNode) -> Result<Location> {
    let devices = match node.child("DeviceList") {
        Some(list) => list
            .children_named("DeviceInfoBasic")
            .map(parse_device)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(Location::new(
        node.child_i64("LocationID")?,
        node.child_text("LocationName")?.trim(),
        devices,
    ))
}

fn parse_device(node: &XmlNode) -> Result<Device> {
    Ok(Device {
        id: node.child_i64("DeviceID")?,
        name: node.child_text("DeviceName")?.trim().to_string(),
        class_id: node.child_i64("DeviceClassID").ok(),
    })
}

/// Arming state of the first partition from a
/// `GetPanelMetaDataAndFullStatus` result.
pub fn parse_arming_state(result: &XmlNode) -> Result<ArmedStatus> {
    let partition = result
        .find("Partitions")
        .and_then(|p| p.child("PartitionInfo"))
        .ok_or_else(|| TotalConnectError::InvalidResponse {
            details: "panel status reply has no partitions".to_string(),
        })?;
    Ok(ArmedStatus(partition.child_i64("ArmingState")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(inner: &str) -> XmlNode {
        XmlNode::parse(&format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body>{inner}</soap:Body>
            </soap:Envelope>"#
        ))
        .unwrap()
    }

    #[test]
    fn test_login_envelope() {
        let op = Operation::AuthenticateUserLogin {
            username: "alice",
            password: "p<&>ss",
            application_id: "14588",
            application_version: "1.0.34",
        };
        let xml = op.to_envelope();
        assert!(xml.contains(r#"<AuthenticateUserLogin xmlns="https://services.alarmnet.com/TC2/">"#));
        assert!(xml.contains("<userName>alice</userName>"));
        assert!(xml.contains("<password>p&lt;&amp;&gt;ss</password>"));
        assert!(xml.contains("<ApplicationID>14588</ApplicationID>"));
        assert_eq!(
            op.soap_action(),
            "\"https://services.alarmnet.com/TC2/AuthenticateUserLogin\""
        );

        // The envelope must round-trip through our own parser
        let parsed = XmlNode::parse(&xml).unwrap();
        assert_eq!(parsed.find_text("password"), Some("p<&>ss"));
    }

    #[test]
    fn test_arm_params_pass_opcode_through() {
        let op = Operation::ArmSecuritySystem {
            session_id: "tok",
            location_id: 1001,
            device_id: 2,
            arm_type: ArmType::StayNight,
        };
        let params = op.params();
        assert_eq!(
            params,
            vec![
                ("SessionID", "tok".to_string()),
                ("LocationID", "1001".to_string()),
                ("DeviceID", "2".to_string()),
                ("ArmType", "4".to_string()),
                ("UserCode", "-1".to_string()),
            ]
        );
    }

    #[test]
    fn test_status_params() {
        let op = Operation::GetPanelMetaDataAndFullStatus {
            session_id: "tok",
            location_id: 1001,
        };
        let xml = op.to_envelope();
        assert!(xml.contains("<LastSequenceNumber>0</LastSequenceNumber>"));
        assert!(xml.contains("<PartitionID>1</PartitionID>"));
    }

    #[test]
    fn test_parse_result_success() {
        let body = envelope(
            "<AuthenticateUserLoginResponse><AuthenticateUserLoginResult>\
             <ResultCode>0</ResultCode><ResultData>Success</ResultData>\
             <SessionID>ABC-123</SessionID>\
             </AuthenticateUserLoginResult></AuthenticateUserLoginResponse>",
        );
        let result = parse_result(&body, "AuthenticateUserLogin").unwrap();
        let RemoteResult::Success(node) = result else {
            panic!("expected success");
        };
        assert_eq!(parse_session_id(node).unwrap(), "ABC-123");
    }

    #[test]
    fn test_parse_result_failure() {
        let body = envelope(
            "<KeepAliveResponse><KeepAliveResult>\
             <ResultCode>-102</ResultCode><ResultData>InvalidSessionID</ResultData>\
             </KeepAliveResult></KeepAliveResponse>",
        );
        let result = parse_result(&body, "KeepAlive").unwrap();
        assert_eq!(result.map(|_| ()), RemoteResult::Failure("InvalidSessionID".to_string()));
    }

    #[test]
    fn test_parse_result_missing_data() {
        let body = envelope("<KeepAliveResponse><KeepAliveResult/></KeepAliveResponse>");
        assert!(matches!(
            parse_result(&body, "KeepAlive"),
            Err(TotalConnectError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_parse_locations() {
        let body = envelope(
            "<GetSessionDetailsResponse><GetSessionDetailsResult>\
             <ResultCode>0</ResultCode><ResultData>Success</ResultData>\
             <Locations>\
               <LocationInfoBasic><LocationID>1001</LocationID><LocationName>Home</LocationName>\
                 <DeviceList>\
                   <DeviceInfoBasic><DeviceID>7</DeviceID><DeviceName>Security Panel</DeviceName><DeviceClassID>1</DeviceClassID></DeviceInfoBasic>\
                   <DeviceInfoBasic><DeviceID>8</DeviceID><DeviceName>Automation</DeviceName></DeviceInfoBasic>\
                 </DeviceList>\
               </LocationInfoBasic>\
               <LocationInfoBasic><LocationID>1002</LocationID><LocationName>Cabin</LocationName></LocationInfoBasic>\
             </Locations>\
             </GetSessionDetailsResult></GetSessionDetailsResponse>",
        );
        let RemoteResult::Success(node) = parse_result(&body, "GetSessionDetails").unwrap() else {
            panic!("expected success");
        };
        let locations = parse_locations(node).unwrap();
        assert_eq!(locations.len(), 2);
        assert_eq!(locations[0].name, "Home");
        assert_eq!(locations[0].devices.len(), 2);
        assert_eq!(locations[0].devices[0].class_id, Some(1));
        assert_eq!(locations[0].devices[1].class_id, None);
        assert_eq!(locations[0].security_panel_id().unwrap(), 7);
        assert!(locations[1].devices.is_empty());
    }

    #[test]
    fn test_parse_arming_state() {
        let body = envelope(
            "<GetPanelMetaDataAndFullStatusResponse><GetPanelMetaDataAndFullStatusResult>\
             <ResultCode>0</ResultCode><ResultData>Success</ResultData>\
             <PanelMetadataAndStatus><Partitions>\
               <PartitionInfo><PartitionID>1</PartitionID><ArmingState>10203</ArmingState></PartitionInfo>\
               <PartitionInfo><PartitionID>2</PartitionID><ArmingState>10200</ArmingState></PartitionInfo>\
             </Partitions></PanelMetadataAndStatus>\
             </GetPanelMetaDataAndFullStatusResult></GetPanelMetaDataAndFullStatusResponse>",
        );
        let RemoteResult::Success(node) =
            parse_result(&body, "GetPanelMetaDataAndFullStatus").unwrap()
        else {
            panic!("expected success");
        };
        assert_eq!(parse_arming_state(node).unwrap(), ArmedStatus::ARMED_STAY);
    }

    #[test]
    fn test_parse_arming_state_without_partitions() {
        let node = XmlNode::parse("<Result><ResultData>Success</ResultData></Result>").unwrap();
        assert!(parse_arming_state(&node).is_err());
    }

    #[test]
    fn test_try_map_propagates_decode_errors() {
        let ok: RemoteResult<&str> = RemoteResult::Success("12");
        assert_eq!(
            ok.try_map(|s| s.parse::<i64>().map_err(|_| TotalConnectError::InvalidResponse {
                details: "nan".into()
            }))
            .unwrap(),
            RemoteResult::Success(12)
        );
        let failed: RemoteResult<&str> = RemoteResult::Failure("Nope".into());
        assert_eq!(
            failed.try_map(|_| Ok::<_, TotalConnectError>(0)).unwrap(),
            RemoteResult::Failure("Nope".into())
        );
    }
}
