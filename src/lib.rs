// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `WeBack` Lib - A Rust library to control `WeBack` cloud-connected appliances.
//!
//! This library provides async APIs to the vendor cloud behind `WeBack`
//! robot vacuums and thermostats.
//!
//! # How it works
//!
//! - **Authentication**: the account login is exchanged for temporary
//!   cloud credentials, cached in a [`Session`] and renewed on expiry
//! - **Device state**: each device has a shadow document holding its last
//!   reported state
//! - **Commands**: desired-state deltas are published to the device's
//!   shadow update topic, fire-and-forget
//!
//! # Supported Devices
//!
//! - [`CleanRobot`]: robot vacuums (cleaning modes, fan, mop)
//! - [`Thermostat`]: heating thermostats (setpoint, weekly schedule)
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use weback_lib::{CleanRobot, Device, RobotState, WebackClient};
//!
//! #[tokio::main]
//! async fn main() -> weback_lib::Result<()> {
//!     let client = Arc::new(WebackClient::new("user@example.com", "password")?);
//!
//!     for summary in client.list_devices().await? {
//!         let mut robot = CleanRobot::new(Device::from_summary(&summary, Arc::clone(&client)));
//!         robot.update().await?;
//!
//!         if robot.state() == RobotState::Docked {
//!             robot.turn_on().await?;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Credentials from the environment
//!
//! ```no_run
//! use weback_lib::WebackClient;
//!
//! # fn example() -> weback_lib::Result<()> {
//! // Reads WEBACK_USERNAME, WEBACK_PASSWORD and WEBACK_COUNTRY_CODE
//! let client = WebackClient::builder().credentials_from_env().build()?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
mod client;
pub mod command;
pub mod device;
pub mod error;
pub mod gateway;
pub mod protocol;
pub mod shadow;

pub use auth::{CredentialBroker, Credentials, Session};
pub use client::{WebackClient, WebackClientBuilder};
pub use command::ShadowCommand;
pub use device::{
    CleanMode, CleanRobot, Device, FanSpeed, MopLevel, RobotState, Thermostat, WeeklySchedule,
    WorkMode,
};
pub use error::{Error, GatewayError, ParseError, ProtocolError, Result, ValueError};
pub use gateway::{DeviceDescription, DeviceGateway, DeviceSummary, PublishAck};
pub use protocol::ClientConfig;
pub use shadow::{Shadow, ShadowDocument};
