// MIT License - Copyright (c) 2026 Peter Wright
// Panel arming state codes

use std::fmt;

use crate::error::{Result, TotalConnectError};

/// Coarse arming state shared by several status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Disarmed,
    ArmedAway,
    ArmedStay,
    ArmedNight,
    Arming,
    Disarming,
}

impl StatusKind {
    /// The type string exposed to the host (e.g. `Armed-Away`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disarmed => "Disarmed",
            Self::ArmedAway => "Armed-Away",
            Self::ArmedStay => "Armed-Stay",
            Self::ArmedNight => "Armed-Night",
            Self::Arming => "Arming",
            Self::Disarming => "Disarming",
        }
    }
}

/// Everything derived from a known status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDescriptor {
    pub code: i64,
    pub detail: &'static str,
    pub kind: StatusKind,
    pub armed: bool,
    pub bypass: bool,
}

macro_rules! status {
    ($code:expr, $detail:expr, $kind:ident, $armed:expr, $bypass:expr) => {
        StatusDescriptor {
            code: $code,
            detail: $detail,
            kind: StatusKind::$kind,
            armed: $armed,
            bypass: $bypass,
        }
    };
}

/// Every arming state the panel is known to report.
///
/// Note `Disarming` counts as armed: the panel is still armed until the
/// transition completes.
pub static STATUS_TABLE: [StatusDescriptor; 13] = [
    status!(10200, "Disarmed", Disarmed, false, false),
    status!(10211, "Disarmed, Bypass", Disarmed, false, true),
    status!(10201, "Armed Away", ArmedAway, true, false),
    status!(10202, "Armed Away, Bypass", ArmedAway, true, true),
    status!(10205, "Armed Away, Instant", ArmedAway, true, false),
    status!(10206, "Armed Away, Instant Bypass", ArmedAway, true, true),
    status!(10203, "Armed Stay", ArmedStay, true, false),
    status!(10204, "Armed Stay, Bypass", ArmedStay, true, true),
    status!(10209, "Armed Stay, Instant", ArmedStay, true, false),
    status!(10210, "Armed Stay, Instant Bypass", ArmedStay, true, true),
    status!(10218, "Armed Night Stay", ArmedNight, true, false),
    status!(10307, "Arming", Arming, false, false),
    status!(10308, "Disarming", Disarming, true, false),
];

/// Raw `ArmingState` code reported by the panel.
///
/// Lookups go through [`STATUS_TABLE`]; any code not in the table
/// (including [`ArmedStatus::ERROR`]) yields `None` from every projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmedStatus(pub i64);

impl ArmedStatus {
    /// The status could not be determined.
    pub const ERROR: Self = Self(-1);
    pub const DISARMED: Self = Self(10200);
    pub const DISARMED_BYPASS: Self = Self(10211);
    pub const ARMED_AWAY: Self = Self(10201);
    pub const ARMED_AWAY_BYPASS: Self = Self(10202);
    pub const ARMED_AWAY_INSTANT: Self = Self(10205);
    pub const ARMED_AWAY_INSTANT_BYPASS: Self = Self(10206);
    pub const ARMED_STAY: Self = Self(10203);
    pub const ARMED_STAY_BYPASS: Self = Self(10204);
    pub const ARMED_STAY_INSTANT: Self = Self(10209);
    pub const ARMED_STAY_INSTANT_BYPASS: Self = Self(10210);
    pub const ARMED_STAY_NIGHT: Self = Self(10218);
    pub const ARMING: Self = Self(10307);
    pub const DISARMING: Self = Self(10308);

    pub fn code(self) -> i64 {
        self.0
    }

    pub fn is_error(self) -> bool {
        self == Self::ERROR
    }

    /// Look the code up in the status table.
    pub fn descriptor(self) -> Option<&'static StatusDescriptor> {
        STATUS_TABLE.iter().find(|d| d.code == self.0)
    }

    /// Like [`descriptor`](Self::descriptor) but reports an unknown code as an error.
    pub fn try_descriptor(self) -> Result<&'static StatusDescriptor> {
        self.descriptor()
            .ok_or(TotalConnectError::UnrecognizedStatusCode { code: self.0 })
    }

    pub fn is_recognized(self) -> bool {
        self.descriptor().is_some()
    }

    pub fn kind(self) -> Option<StatusKind> {
        self.descriptor().map(|d| d.kind)
    }

    /// Human-readable detail (e.g. `Armed Away, Instant`).
    pub fn detail_string(self) -> Option<&'static str> {
        self.descriptor().map(|d| d.detail)
    }

    /// Detail string for UI display. Currently identical to `detail_string`.
    pub fn detail_display_string(self) -> Option<&'static str> {
        self.descriptor().map(|d| d.detail)
    }

    /// Coarse type string (e.g. `Armed-Away`).
    pub fn type_string(self) -> Option<&'static str> {
        self.kind().map(StatusKind::as_str)
    }

    /// Type string for UI display. Currently identical to `type_string`.
    pub fn type_display_string(self) -> Option<&'static str> {
        self.kind().map(StatusKind::as_str)
    }

    pub fn is_armed(self) -> Option<bool> {
        self.descriptor().map(|d| d.armed)
    }

    pub fn is_bypass(self) -> Option<bool> {
        self.descriptor().map(|d| d.bypass)
    }

    pub fn is_arming(self) -> bool {
        self == Self::ARMING
    }

    pub fn is_disarming(self) -> bool {
        self == Self::DISARMING
    }

    /// Arming or disarming is in progress.
    pub fn is_pending(self) -> bool {
        self.is_arming() || self.is_disarming()
    }
}

impl fmt::Display for ArmedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.detail_string() {
            Some(detail) => write!(f, "{} ({})", detail, self.0),
            None if self.is_error() => write!(f, "Error ({})", self.0),
            None => write!(f, "Unknown ({})", self.0),
        }
    }
}
