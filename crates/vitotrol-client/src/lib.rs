//! Vitotrol Client Library
//!
//! A typed client for the Viessmann Vitodata™ SOAP web service, the one
//! the Vitotrol™ mobile application talks to. It handles authentication,
//! device discovery, reading and writing data points, weekly time
//! programs, error history and runtime type discovery.
//!
//! # Example
//!
//! ```rust,no_run
//! use vitotrol_client::{attributes, Session};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = Session::new()?;
//!     session.login("login", "password").await?;
//!     session.get_devices().await?;
//!
//!     let mut device = session.devices[0].clone();
//!     device
//!         .get_data(&session, &[attributes::OUTDOOR_TEMP])
//!         .await?;
//!     println!("{:?}", device.attributes[&attributes::OUTDOOR_TEMP]);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Writes are asynchronous
//!
//! `WriteData`, `RefreshData` and `WriteTimesheetData` only queue work on
//! the server. The `*_wait` methods return a [`PendingOperation`] that
//! resolves once the server reports completion:
//!
//! ```rust,ignore
//! let pending = device
//!     .write_data_wait(&session, attributes::HEAT_NORMAL_TEMP, "21")
//!     .await?;
//! pending.wait().await?;
//! ```
//!
//! # Testing
//!
//! The `testing` module provides an in-process mock of the Vitodata
//! endpoint:
//!
//! ```rust,ignore
//! use vitotrol_client::testing::MockVitodata;
//!
//! let server = MockVitodata::start().await?;
//! server.respond("Login", "<LoginResponse>...</LoginResponse>");
//! let mut session = server.session()?;
//! session.login("user", "pass").await?;
//! ```

pub mod attributes;
mod device;
mod error;
mod poll;
mod session;
pub mod testing;
pub mod timesheet;
mod types;
mod wire;

pub use attributes::{AttrAccess, AttrId, AttrRef, AttributeRegistry};
pub use device::{AttributeInfo, Device, ErrorHistoryEvent};
pub use error::{Result, VitotrolError};
pub use poll::{PendingOperation, PollParams};
pub use session::Session;
pub use timesheet::{Timesheet, TimesheetRef, Timeslot};
pub use types::{EnumType, NativeValue, Time, Value, VitodataType};

/// Production endpoint of the Vitodata web service.
pub use wire::DEFAULT_ENDPOINT;
