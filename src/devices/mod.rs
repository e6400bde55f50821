// MIT License - Copyright (c) 2026 Peter Wright
// Panel data model

pub mod keypad;
pub mod location;
pub mod status;

pub use keypad::{Keypad, KeypadState};
pub use location::{Device, Location, find_location};
pub use status::{ArmedStatus, StatusDescriptor, StatusKind};
