// MIT License - Copyright (c) 2026 Peter Wright
// Total Connect 2.0 security panel adapter
//
//! # total-connect-bridge
//!
//! Control and poll a Honeywell Total Connect 2.0 security panel through
//! its SOAP web service.
//!
//! The adapter owns the session token lifecycle (login, freshness checks,
//! keep-alive, logout), applies one re-authenticate-and-retry policy to
//! every remote call, and maps the panel's numeric arming states to
//! semantic values.
//!
//! ## Quick Start
//!
//! ```no_run
//! use total_connect_bridge::{ArmType, ClientConfig, TotalConnectClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::builder()
//!         .username("user@example.com")
//!         .password("secret")
//!         .build();
//!
//!     let mut client = TotalConnectClient::connect(config).await?;
//!     client.populate_details().await;
//!
//!     let status = client.get_armed_status(Some("Home")).await?;
//!     println!("Home is {status}");
//!
//!     client.arm(ArmType::Stay, Some("Home")).await?;
//!     client.logout().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod devices;
pub mod error;
pub mod event;
pub mod monitor;
pub mod protocol;
pub mod session;
pub mod transport;
pub mod xml;

// Re-exports for convenience
pub use client::TotalConnectClient;
pub use config::{ArmType, ClientConfig, ClientConfigBuilder};
pub use devices::{ArmedStatus, Device, Keypad, KeypadState, Location, StatusKind};
pub use error::{Result, TotalConnectError};
pub use event::{BridgeEvent, EventReceiver};
pub use monitor::{KeypadAction, KeypadMonitor};
pub use protocol::RemoteResult;
pub use session::SessionManager;
pub use transport::{SoapTransport, Transport};
