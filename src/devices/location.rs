// MIT License - Copyright (c) 2026 Peter Wright
// Locations and the devices they contain

use tracing::warn;

use crate::constants::SECURITY_PANEL_DEVICE_NAMES;
use crate::error::{Result, TotalConnectError};

/// A device registered at a location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub id: i64,
    pub name: String,
    /// Remote device class, when reported.
    pub class_id: Option<i64>,
}

impl Device {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            class_id: None,
        }
    }

    /// Whether this device is the location's security panel.
    pub fn is_security_panel(&self) -> bool {
        SECURITY_PANEL_DEVICE_NAMES.contains(&self.name.as_str())
    }
}

/// A monitored site and its devices, as returned by `GetSessionDetails`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub devices: Vec<Device>,
}

impl Location {
    pub fn new(id: i64, name: impl Into<String>, devices: Vec<Device>) -> Self {
        Self {
            id,
            name: name.into(),
            devices,
        }
    }

    /// Find the device id of this location's security panel.
    pub fn security_panel_id(&self) -> Result<i64> {
        let mut panels = self.devices.iter().filter(|d| d.is_security_panel());
        let Some(panel) = panels.next() else {
            return Err(TotalConnectError::DeviceNotFound {
                location: self.name.clone(),
            });
        };
        if panels.next().is_some() {
            warn!(
                "Location {} has more than one security panel; using device {}",
                self.name, panel.id
            );
        }
        Ok(panel.id)
    }
}

/// Select a location by name, or the first location when no name is given.
pub fn find_location<'a>(locations: &'a [Location], name: Option<&str>) -> Result<&'a Location> {
    let found = match name {
        None => locations.first(),
        Some(name) => locations.iter().find(|l| l.name == name),
    };
    found.ok_or_else(|| TotalConnectError::LocationNotFound {
        name: name.map(str::to_string),
    })
}
