// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device façades.
//!
//! [`Device`] binds a device identifier to a [`WebackClient`] and caches
//! the last fetched shadow and registry description. The typed models
//! [`CleanRobot`] and [`Thermostat`] decode the raw shadow into semantic
//! state and validate outgoing commands.
//!
//! ```no_run
//! use std::sync::Arc;
//! use weback_lib::{CleanRobot, Device, WebackClient};
//!
//! # async fn example() -> weback_lib::Result<()> {
//! let client = Arc::new(WebackClient::new("user@example.com", "password")?);
//!
//! let mut robot = CleanRobot::new(Device::new("robot-01", Arc::clone(&client)));
//! robot.update().await?;
//! println!("{} is {}", robot.nickname(), robot.state());
//!
//! robot.set_fan("Strong").await?;
//! robot.turn_on().await?;
//! # Ok(())
//! # }
//! ```

mod thermostat;
mod vacuum;

pub use thermostat::{
    TEMP_DISPLAY_DIVIDER, TEMP_MULTIPLIER, Thermostat, ThermostatShadow, WeeklySchedule, WorkMode,
    schedule_field,
};
pub use vacuum::{CleanMode, CleanRobot, FanSpeed, MopLevel, RobotState, VacuumShadow};

use std::sync::Arc;

use serde_json::Value;

use crate::WebackClient;
use crate::command::ShadowCommand;
use crate::error::{Error, ValueError};
use crate::gateway::{DeviceDescription, DeviceSummary, PublishAck};
use crate::shadow::Shadow;

/// A device of the account, with its cached shadow and description.
#[derive(Debug, Clone)]
pub struct Device {
    name: String,
    nickname: String,
    client: Arc<WebackClient>,
    shadow: Shadow,
    description: Option<DeviceDescription>,
}

impl Device {
    /// Creates a façade for the device `name`. The shadow starts empty until
    /// [`update`](Self::update) or [`with_shadow`](Self::with_shadow).
    #[must_use]
    pub fn new(name: impl Into<String>, client: Arc<WebackClient>) -> Self {
        let name = name.into();
        Self {
            nickname: name.clone(),
            name,
            client,
            shadow: Shadow::new(),
            description: None,
        }
    }

    /// Creates a façade from a device list entry.
    #[must_use]
    pub fn from_summary(summary: &DeviceSummary, client: Arc<WebackClient>) -> Self {
        Self::new(summary.name(), client).with_nickname(summary.nickname())
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    /// Uses an already fetched shadow instead of starting empty.
    #[must_use]
    pub fn with_shadow(mut self, shadow: Shadow) -> Self {
        self.shadow = shadow;
        self
    }

    /// Uses an already fetched description, skipping the registry lookup.
    #[must_use]
    pub fn with_description(mut self, description: DeviceDescription) -> Self {
        self.description = Some(description);
        self
    }

    /// Vendor device identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name.
    #[must_use]
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    /// Last fetched shadow.
    #[must_use]
    pub fn shadow(&self) -> &Shadow {
        &self.shadow
    }

    /// Client used for every operation.
    #[must_use]
    pub fn client(&self) -> &Arc<WebackClient> {
        &self.client
    }

    /// Fetches the current shadow, replacing the cached one.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the device has no shadow.
    /// The cached shadow is left untouched on error.
    pub async fn update(&mut self) -> Result<&mut Self, Error> {
        self.shadow = self.client.shadow(&self.name).await?;
        tracing::debug!(device = %self.name, fields = self.shadow.len(), "Shadow updated");
        Ok(self)
    }

    /// Returns the registry description, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns error if the description is not cached and the lookup fails.
    pub async fn description(&mut self) -> Result<&DeviceDescription, Error> {
        let description = match self.description.take() {
            Some(description) => description,
            None => self.client.describe_device(&self.name).await?,
        };
        Ok(&*self.description.insert(description))
    }

    /// Drops the cached description so the next call fetches it again.
    pub fn invalidate_description(&mut self) {
        self.description = None;
    }

    /// Publishes a desired-state command to the device.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the publish is rejected.
    pub async fn publish(&self, command: &ShadowCommand) -> Result<PublishAck, Error> {
        self.client.publish(&self.name, command).await
    }

    /// Publishes a command changing a single attribute.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the publish is rejected.
    pub async fn publish_single(
        &self,
        attribute: &str,
        value: impl Into<Value>,
    ) -> Result<PublishAck, Error> {
        self.publish(&ShadowCommand::single(attribute, value)).await
    }

    /// Builds the error for a command value outside `allowed`.
    #[must_use]
    pub fn invalid_value(value: &str, allowed: &[&'static str]) -> Error {
        ValueError::not_allowed(value, allowed).into()
    }
}
