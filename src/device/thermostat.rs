// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Thermostat model.
//!
//! Temperatures are scaled in the shadow: the measured temperature is
//! reported in tenths of a degree, the setpoint in half degrees.

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;

use crate::device::Device;
use crate::error::{Error, ValueError};
use crate::gateway::{DeviceDescription, PublishAck};
use crate::shadow::Shadow;

const CURRENT_TEMPERATURE: &str = "air_tem";
const GOAL_TEMPERATURE: &str = "set_tem";
const CONNECTED: &str = "connected";
const WORKMODE: &str = "workmode";
const WORKING_STATUS: &str = "working_status";
const HEATING: &str = "on";

/// Setpoint units per degree.
pub const TEMP_MULTIPLIER: f64 = 2.0;
/// Measured temperature units per degree.
pub const TEMP_DISPLAY_DIVIDER: f64 = 10.0;

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Returns the shadow field holding the schedule of `day`.
///
/// The device uses its own spelling for some days.
///
/// ```
/// use chrono::Weekday;
/// use weback_lib::device::schedule_field;
///
/// assert_eq!(schedule_field(Weekday::Tue), "Tues");
/// assert_eq!(schedule_field(Weekday::Thu), "Thur");
/// ```
#[must_use]
pub const fn schedule_field(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tues",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thur",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Thermostat working mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkMode {
    /// Follows the weekly schedule.
    Auto,
    /// Holds the manual setpoint.
    Manual,
}

impl WorkMode {
    /// Values accepted when setting the mode.
    pub const ALLOWED: [&'static str; 2] = ["auto", "hand"];

    /// Returns the raw shadow value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "hand",
        }
    }
}

impl FromStr for WorkMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "hand" => Ok(Self::Manual),
            _ => Err(ValueError::not_allowed(s, &Self::ALLOWED)),
        }
    }
}

impl fmt::Display for WorkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Weekly schedule of time/temperature tokens such as `"04:50_043C"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklySchedule {
    days: [Vec<String>; 7],
}

impl WeeklySchedule {
    /// Splits the per-day schedule strings of a shadow.
    ///
    /// A missing or empty day yields no entries.
    #[must_use]
    pub fn from_shadow(shadow: &Shadow) -> Self {
        let mut schedule = Self::default();
        for day in WEEK {
            if let Some(raw) = shadow.get_str(schedule_field(day)) {
                schedule.days[day.num_days_from_monday() as usize] = split_day(raw);
            }
        }
        schedule
    }

    /// Ordered entries of `day`.
    #[must_use]
    pub fn day(&self, day: Weekday) -> &[String] {
        &self.days[day.num_days_from_monday() as usize]
    }

    /// Iterates from Monday to Sunday.
    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &[String])> {
        WEEK.into_iter().map(|day| (day, self.day(day)))
    }
}

fn split_day(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Typed view of a thermostat shadow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThermostatShadow {
    /// `air_tem`, tenths of a degree.
    pub air_tem: Option<f64>,
    /// `set_tem`, half degrees.
    pub set_tem: Option<f64>,
    /// `workmode`, raw.
    pub workmode: Option<String>,
    /// `working_status`, raw.
    pub working_status: Option<String>,
    /// `connected`.
    pub connected: Option<bool>,
    /// Per-day schedule fields.
    pub schedule: WeeklySchedule,
}

impl ThermostatShadow {
    /// Decodes the thermostat fields of a raw shadow.
    #[must_use]
    pub fn from_shadow(shadow: &Shadow) -> Self {
        Self {
            air_tem: shadow.get_f64(CURRENT_TEMPERATURE),
            set_tem: shadow.get_f64(GOAL_TEMPERATURE),
            workmode: shadow.get_str(WORKMODE).map(str::to_string),
            working_status: shadow.get_str(WORKING_STATUS).map(str::to_string),
            connected: shadow.get_bool(CONNECTED),
            schedule: WeeklySchedule::from_shadow(shadow),
        }
    }
}

/// A heating thermostat.
#[derive(Debug, Clone)]
pub struct Thermostat {
    device: Device,
}

impl Thermostat {
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
    pub fn status(&self) -> ThermostatShadow {
        ThermostatShadow::from_shadow(self.device.shadow())
    }

    /// Sets the working mode, one of [`WorkMode::ALLOWED`].
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` without publishing if `mode` is not allowed.
    pub async fn set_mode(&self, mode: &str) -> Result<PublishAck, Error> {
        self.publish_mode(mode.parse()?).await
    }

    async fn publish_mode(&self, mode: WorkMode) -> Result<PublishAck, Error> {
        self.device.publish_single(WORKMODE, mode.as_str()).await
    }

    /// Switches to manual mode and sets the setpoint in degrees.
    ///
    /// Two commands are published: the mode first, then the setpoint. The
    /// setpoint is sent in half-degree steps, `temp * 2` rounded to the
    /// nearest integer, so 21.3 is published as 43 (21.5 degrees).
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` without publishing if `temp` is not finite.
    #[allow(clippy::cast_possible_truncation)]
    pub async fn set_temp(&self, temp: f64) -> Result<PublishAck, Error> {
        if !temp.is_finite() {
            return Err(ValueError::InvalidTemperature(temp).into());
        }
        self.publish_mode(WorkMode::Manual).await?;
        let raw = (temp * TEMP_MULTIPLIER).round() as i64;
        self.device.publish_single(GOAL_TEMPERATURE, raw).await
    }

    /// Raw working mode.
    #[must_use]
    pub fn mode(&self) -> Option<String> {
        self.status().workmode
    }

    /// Working mode, if it is a known one.
    #[must_use]
    pub fn work_mode(&self) -> Option<WorkMode> {
        self.mode().and_then(|m| m.parse().ok())
    }

    /// Measured temperature in degrees.
    #[must_use]
    pub fn temperature(&self) -> Option<f64> {
        self.status().air_tem.map(|t| t / TEMP_DISPLAY_DIVIDER)
    }

    /// Setpoint in degrees.
    #[must_use]
    pub fn goal_temperature(&self) -> Option<f64> {
        self.status().set_tem.map(|t| t / TEMP_MULTIPLIER)
    }

    /// `true` while the heater is running.
    #[must_use]
    pub fn is_heating(&self) -> bool {
        self.status().working_status.as_deref() == Some(HEATING)
    }

    /// Always `true`, whatever `connected` reports.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub fn is_available(&self) -> bool {
        true
    }

    /// Weekly schedule used in [`WorkMode::Auto`].
    #[must_use]
    pub fn auto_settings(&self) -> WeeklySchedule {
        WeeklySchedule::from_shadow(self.device.shadow())
    }
}

impl From<Device> for Thermostat {
    fn from(device: Device) -> Self {
        Self::new(device)
    }
}
