// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Robot vacuum model.
//!
//! The robot reports a single `working_status` field mixing cleaning modes,
//! charging modes and the error state. [`RobotState`] folds it into one
//! semantic state with a fixed priority order.

use std::fmt;
use std::str::FromStr;

use crate::device::Device;
use crate::error::{Error, ValueError};
use crate::gateway::{DeviceDescription, PublishAck};
use crate::shadow::Shadow;

const WORKING_STATUS: &str = "working_status";
const FAN_STATUS: &str = "fan_status";
const WATER_LEVEL: &str = "water_level";
const BATTERY_LEVEL: &str = "battery_level";
const CLEAN_TIME: &str = "clean_time";
const ERROR_INFO: &str = "error_info";
const CONNECTED: &str = "connected";

/// Raw `working_status` value.
///
/// # Examples
///
/// ```
/// use weback_lib::device::CleanMode;
///
/// let mode = CleanMode::from("PileCharging");
/// assert!(mode.is_charging());
/// assert!(mode.is_docked());
/// assert!(!mode.is_cleaning());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CleanMode {
    /// Automatic full cleaning.
    AutoClean,
    /// Cleaning along walls.
    EdgeClean,
    /// Cleaning a small area around the robot.
    SpotClean,
    /// Cleaning a single room.
    RoomClean,
    /// Stopped in place.
    Standby,
    /// Returning to the dock.
    BackCharging,
    /// Charging.
    Charging,
    /// Charging on the dock.
    PileCharging,
    /// Charging from a direct cable.
    DirCharging,
    /// Sleeping on the dock.
    Hibernating,
    /// Robot error.
    Malfunction,
    /// Any value this library does not know.
    Other(String),
}

impl CleanMode {
    /// Returns the raw shadow value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AutoClean => "AutoClean",
            Self::EdgeClean => "EdgeClean",
            Self::SpotClean => "SpotClean",
            Self::RoomClean => "RoomClean",
            Self::Standby => "Standby",
            Self::BackCharging => "BackCharging",
            Self::Charging => "Charging",
            Self::PileCharging => "PileCharging",
            Self::DirCharging => "DirCharging",
            Self::Hibernating => "Hibernating",
            Self::Malfunction => "Malfunction",
            Self::Other(raw) => raw,
        }
    }

    /// Auto, edge, spot or room cleaning.
    #[must_use]
    pub fn is_cleaning(&self) -> bool {
        matches!(
            self,
            Self::AutoClean | Self::EdgeClean | Self::SpotClean | Self::RoomClean
        )
    }

    /// Charging by any means.
    #[must_use]
    pub fn is_charging(&self) -> bool {
        matches!(self, Self::Charging | Self::PileCharging | Self::DirCharging)
    }

    /// Charging or hibernating.
    #[must_use]
    pub fn is_docked(&self) -> bool {
        self.is_charging() || *self == Self::Hibernating
    }
}

impl From<&str> for CleanMode {
    fn from(raw: &str) -> Self {
        match raw {
            "AutoClean" => Self::AutoClean,
            "EdgeClean" => Self::EdgeClean,
            "SpotClean" => Self::SpotClean,
            "RoomClean" => Self::RoomClean,
            "Standby" => Self::Standby,
            "BackCharging" => Self::BackCharging,
            "Charging" => Self::Charging,
            "PileCharging" => Self::PileCharging,
            "DirCharging" => Self::DirCharging,
            "Hibernating" => Self::Hibernating,
            "Malfunction" => Self::Malfunction,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CleanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic state of the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RobotState {
    /// No mode reported.
    Unknown,
    /// Robot reports a malfunction.
    Error,
    /// Cleaning in any mode.
    Cleaning,
    /// On the dock, charging or sleeping.
    Docked,
    /// Heading back to the dock.
    Returning,
    /// Stopped in place.
    Paused,
    /// None of the above.
    Idle,
}

impl RobotState {
    /// Resolves the state of a raw mode.
    ///
    /// Checked in order: unknown, error, cleaning, docked, returning,
    /// paused, then idle.
    #[must_use]
    pub fn from_mode(mode: Option<&CleanMode>) -> Self {
        let Some(mode) = mode else {
            return Self::Unknown;
        };
        if *mode == CleanMode::Malfunction {
            Self::Error
        } else if mode.is_cleaning() {
            Self::Cleaning
        } else if mode.is_docked() {
            Self::Docked
        } else if *mode == CleanMode::BackCharging {
            Self::Returning
        } else if *mode == CleanMode::Standby {
            Self::Paused
        } else {
            Self::Idle
        }
    }

    /// Returns the lowercase state name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Error => "error",
            Self::Cleaning => "cleaning",
            Self::Docked => "docked",
            Self::Returning => "returning",
            Self::Paused => "paused",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fan speed accepted by [`CleanRobot::set_fan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FanSpeed {
    /// Normal suction.
    Normal,
    /// Strong suction.
    Strong,
}

impl FanSpeed {
    /// Values accepted when setting the fan.
    pub const ALLOWED: [&'static str; 2] = ["Normal", "Strong"];
    /// Value reported while the fan is off. Cannot be set.
    pub const DISABLED: &'static str = "Pause";

    /// Returns the raw shadow value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Strong => "Strong",
        }
    }
}

impl FromStr for FanSpeed {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(Self::Normal),
            "Strong" => Ok(Self::Strong),
            _ => Err(ValueError::not_allowed(s, &Self::ALLOWED)),
        }
    }
}

/// Mop water level accepted by [`CleanRobot::set_mop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MopLevel {
    /// Low water flow.
    Low,
    /// Default water flow.
    Default,
    /// High water flow.
    High,
}

impl MopLevel {
    /// Values accepted when setting the mop.
    pub const ALLOWED: [&'static str; 3] = ["Low", "Default", "High"];
    /// Value reported while mopping is off. Cannot be set.
    pub const DISABLED: &'static str = "None";

    /// Returns the raw shadow value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Default => "Default",
            Self::High => "High",
        }
    }
}

impl FromStr for MopLevel {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(Self::Low),
            "Default" => Ok(Self::Default),
            "High" => Ok(Self::High),
            _ => Err(ValueError::not_allowed(s, &Self::ALLOWED)),
        }
    }
}

/// Typed view of a robot vacuum shadow.
///
/// Missing or unparsable fields decode to `None`, unknown fields are
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VacuumShadow {
    /// `working_status`.
    pub working_status: Option<CleanMode>,
    /// `fan_status`, raw.
    pub fan_status: Option<String>,
    /// `water_level`, raw.
    pub water_level: Option<String>,
    /// `battery_level`, percent.
    pub battery_level: Option<u8>,
    /// `clean_time`.
    pub clean_time: Option<u64>,
    /// `error_info`, raw.
    pub error_info: Option<String>,
    /// `connected`.
    pub connected: Option<bool>,
}

impl VacuumShadow {
    /// Decodes the robot fields of a raw shadow.
    #[must_use]
    pub fn from_shadow(shadow: &Shadow) -> Self {
        Self {
            working_status: shadow.get_str(WORKING_STATUS).map(CleanMode::from),
            fan_status: shadow.get_str(FAN_STATUS).map(str::to_string),
            water_level: shadow.get_str(WATER_LEVEL).map(str::to_string),
            battery_level: shadow
                .get_u64(BATTERY_LEVEL)
                .and_then(|v| u8::try_from(v).ok()),
            clean_time: shadow.get_u64(CLEAN_TIME),
            error_info: shadow.get_str(ERROR_INFO).map(str::to_string),
            connected: shadow.get_bool(CONNECTED),
        }
    }
}

/// A robot vacuum.
#[derive(Debug, Clone)]
pub struct CleanRobot {
    device: Device,
}

impl CleanRobot {
    /// Wraps a device façade.
    #[must_use]
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    /// Returns the underlying façade.
    #[must_use]
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Returns the underlying façade mutably.
    pub fn device_mut(&mut self) -> &mut Device {
        &mut self.device
    }

    /// Vendor device identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        self.device.name()
    }

    /// Display name.
    #[must_use]
    pub fn nickname(&self) -> &str {
        self.device.nickname()
    }

    /// Refreshes the cached shadow.
    ///
    /// # Errors
    ///
    /// Returns error if the shadow cannot be fetched.
    pub async fn update(&mut self) -> Result<&mut Self, Error> {
        self.device.update().await?;
        Ok(self)
    }

    /// Returns the registry description, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup fails.
    pub async fn description(&mut self) -> Result<&DeviceDescription, Error> {
        self.device.description().await
    }

    /// Decodes the cached shadow.
    #[must_use]
    pub fn status(&self) -> VacuumShadow {
        VacuumShadow::from_shadow(self.device.shadow())
    }

    /// Starts automatic cleaning.
    ///
    /// # Errors
    ///
    /// Returns error if the publish fails.
    pub async fn turn_on(&self) -> Result<PublishAck, Error> {
        self.publish_mode(&CleanMode::AutoClean).await
    }

    /// Sends the robot back to its dock.
    ///
    /// # Errors
    ///
    /// Returns error if the publish fails.
    pub async fn turn_off(&self) -> Result<PublishAck, Error> {
        self.publish_mode(&CleanMode::BackCharging).await
    }

    /// Sends the robot back to its dock.
    ///
    /// # Errors
    ///
    /// Returns error if the publish fails.
    pub async fn return_home(&self) -> Result<PublishAck, Error> {
        self.turn_off().await
    }

    /// Stops the robot in place.
    ///
    /// # Errors
    ///
    /// Returns error if the publish fails.
    pub async fn stop(&self) -> Result<PublishAck, Error> {
        self.publish_mode(&CleanMode::Standby).await
    }

    /// Sets the fan speed, one of [`FanSpeed::ALLOWED`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` without publishing if `mode` is not allowed.
    pub async fn set_fan(&self, mode: &str) -> Result<PublishAck, Error> {
        let speed: FanSpeed = mode.parse()?;
        self.device.publish_single(FAN_STATUS, speed.as_str()).await
    }

    /// Sets the mop water level, one of [`MopLevel::ALLOWED`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` without publishing if `mode` is not allowed.
    pub async fn set_mop(&self, mode: &str) -> Result<PublishAck, Error> {
        let level: MopLevel = mode.parse()?;
        self.device.publish_single(WATER_LEVEL, level.as_str()).await
    }

    async fn publish_mode(&self, mode: &CleanMode) -> Result<PublishAck, Error> {
        self.device.publish_single(WORKING_STATUS, mode.as_str()).await
    }

    /// Raw mode from the cached shadow.
    #[must_use]
    pub fn current_mode(&self) -> Option<CleanMode> {
        self.status().working_status
    }

    /// Semantic state from the cached shadow.
    #[must_use]
    pub fn state(&self) -> RobotState {
        RobotState::from_mode(self.current_mode().as_ref())
    }

    /// Battery level in percent.
    #[must_use]
    pub fn battery_level(&self) -> Option<u8> {
        self.status().battery_level
    }

    /// Duration of the current cleaning run.
    #[must_use]
    pub fn clean_time(&self) -> Option<u64> {
        self.status().clean_time
    }

    /// Raw `error_info` reported by the robot.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.status().error_info
    }

    /// Raw fan status, including [`FanSpeed::DISABLED`].
    #[must_use]
    pub fn fan_speed(&self) -> Option<String> {
        self.status().fan_status
    }

    /// Raw water level, including [`MopLevel::DISABLED`].
    #[must_use]
    pub fn mop_level(&self) -> Option<String> {
        self.status().water_level
    }

    /// Always `true`, whatever `connected` reports.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn is_available(&self) -> bool {
        true
    }

    /// Cleaning in any mode.
    #[must_use]
    pub fn is_cleaning(&self) -> bool {
        self.current_mode().is_some_and(|m| m.is_cleaning())
    }

    /// On the dock.
    #[must_use]
    pub fn is_docked(&self) -> bool {
        self.current_mode().is_some_and(|m| m.is_docked())
    }

    /// Stopped in place.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.current_mode() == Some(CleanMode::Standby)
    }

    /// Heading back to the dock.
    #[must_use]
    pub fn is_returning(&self) -> bool {
        self.current_mode() == Some(CleanMode::BackCharging)
    }

    /// Reporting a malfunction.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.current_mode() == Some(CleanMode::Malfunction)
    }

    /// None of the other predicates hold.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !(self.is_docked()
            || self.is_cleaning()
            || self.is_paused()
            || self.is_returning()
            || self.is_error())
    }
}

impl From<Device> for CleanRobot {
    fn from(device: Device) -> Self {
        Self::new(device)
    }
}
