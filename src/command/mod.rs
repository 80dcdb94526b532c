// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Desired-state commands.
//!
//! Devices are controlled by publishing a desired-state delta to their
//! shadow update topic. A command holds only the fields being changed and
//! is never merged with previously published commands.
//!
//! # Examples
//!
//! ```
//! use weback_lib::command::ShadowCommand;
//!
//! let cmd = ShadowCommand::single("working_status", "AutoClean");
//! assert_eq!(
//!     cmd.envelope(),
//!     serde_json::json!({"state": {"desired": {"working_status": "AutoClean"}}})
//! );
//! ```

use serde_json::{Map, Value, json};

/// A desired-state payload for one publish.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowCommand {
    desired: Map<String, Value>,
}

impl ShadowCommand {
    /// Creates an empty command.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a command changing a single attribute.
    #[must_use]
    pub fn single(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(attribute, value)
    }

    /// Adds an attribute to the command.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.desired.insert(attribute.into(), value.into());
        self
    }

    /// Returns the desired fields.
    #[must_use]
    pub fn desired(&self) -> &Map<String, Value> {
        &self.desired
    }

    /// Returns `true` if the command changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.desired.is_empty()
    }

    /// Builds the `{"state": {"desired": ...}}` update envelope.
    #[must_use]
    pub fn envelope(&self) -> Value {
        json!({ "state": { "desired": self.desired } })
    }
}

impl From<Map<String, Value>> for ShadowCommand {
    fn from(desired: Map<String, Value>) -> Self {
        Self { desired }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ShadowCommand {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |cmd, (k, v)| cmd.with(k, v))
    }
}
