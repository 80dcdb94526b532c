// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device shadow documents.
//!
//! A shadow is the cloud mirror of a device's last reported state. Devices
//! report scalar fields whose JSON type is not stable: the same numeric
//! field may arrive as `235` or `"235"`, and booleans often arrive as
//! `"true"`/`"false"`. The typed accessors on [`Shadow`] accept both forms.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Last reported state of a device, as a field name to value mapping.
///
/// # Examples
///
/// ```
/// use weback_lib::shadow::Shadow;
///
/// let shadow: Shadow = serde_json::from_str(
///     r#"{"battery_level": "87", "air_tem": 235, "connected": "true"}"#,
/// ).unwrap();
///
/// assert_eq!(shadow.get_f64("battery_level"), Some(87.0));
/// assert_eq!(shadow.get_f64("air_tem"), Some(235.0));
/// assert_eq!(shadow.get_bool("connected"), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shadow(Map<String, Value>);

impl Shadow {
    /// Creates an empty shadow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    /// Returns a field as a string. Numbers and booleans are not converted.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Returns a field as a number, parsing numeric strings.
    #[must_use]
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns a field as an unsigned integer, parsing numeric strings.
    #[must_use]
    pub fn get_u64(&self, field: &str) -> Option<u64> {
        match self.get(field)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns a field as a boolean, accepting `"true"`/`"false"` strings.
    #[must_use]
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        match self.get(field)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" | "True" => Some(true),
                "false" | "False" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Sets a field, returning the previous value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Returns `true` if the field is present and not null.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Number of fields in the shadow.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the shadow has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the raw fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Consumes the shadow and returns the raw mapping.
    #[must_use]
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Shadow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Shadow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Full shadow document as stored by the cloud.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShadowDocument {
    /// Reported, desired and delta sections.
    #[serde(default)]
    pub state: ShadowState,

    /// Per-field update timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,

    /// Document version, incremented on every update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,

    /// Time the document was generated, in epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// State sections of a [`ShadowDocument`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShadowState {
    /// Last state reported by the device.
    #[serde(default)]
    pub reported: Shadow,

    /// Last state requested by a client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired: Option<Shadow>,

    /// Fields where desired and reported differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<Shadow>,
}

impl ShadowDocument {
    /// Returns the reported state.
    #[must_use]
    pub fn reported(&self) -> &Shadow {
        &self.state.reported
    }

    /// Consumes the document and returns the reported state.
    #[must_use]
    pub fn into_reported(self) -> Shadow {
        self.state.reported
    }
}
