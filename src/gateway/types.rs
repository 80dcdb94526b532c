// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device gateway response types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entry of the account's device list.
///
/// # Examples
///
/// ```
/// use weback_lib::gateway::DeviceSummary;
///
/// let json = r#"{"Thing_Name": "neato-01", "Thing_Nick_Name": "Kitchen", "Sub_type": "clean_robot"}"#;
/// let summary: DeviceSummary = serde_json::from_str(json).unwrap();
/// assert_eq!(summary.name(), "neato-01");
/// assert_eq!(summary.nickname(), "Kitchen");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DeviceSummary {
    #[serde(rename = "Thing_Name")]
    name: String,

    #[serde(rename = "Thing_Nick_Name", default, skip_serializing_if = "Option::is_none")]
    nickname: Option<String>,

    #[serde(rename = "Sub_type", default, skip_serializing_if = "Option::is_none")]
    sub_type: Option<String>,

    /// Vendor fields without a typed accessor.
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl DeviceSummary {
    /// Vendor device identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name, defaulting to the identifier.
    #[must_use]
    pub fn nickname(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.name)
    }

    /// Vendor product sub type.
    #[must_use]
    pub fn sub_type(&self) -> Option<&str> {
        self.sub_type.as_deref()
    }

    /// Any other field of the entry.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Registry metadata of a device.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescription {
    /// Device identifier.
    pub thing_name: String,
    /// Registry id.
    #[serde(default)]
    pub thing_id: Option<String>,
    /// Resource name.
    #[serde(default)]
    pub thing_arn: Option<String>,
    /// Product type registered for the device.
    #[serde(default)]
    pub thing_type_name: Option<String>,
    /// Registry attributes.
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    /// Registry version.
    #[serde(default)]
    pub version: Option<u64>,
}

/// Acknowledgment of a publish.
///
/// The transport only confirms receipt: the device may apply the change
/// later or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishAck {
    /// Topic the payload was published to.
    pub topic: String,
    /// Delivery quality of service (always at most once).
    pub qos: u8,
}
