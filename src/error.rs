// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `WeBack` library.
//!
//! This module provides the error hierarchy for the whole client: missing
//! or rejected credentials, device gateway failures, command value
//! validation, transport errors and response parsing.

use thiserror::Error;

/// The main error type for this library.
///
/// Every failure propagates to the immediate caller. Nothing is retried
/// internally and transport errors are surfaced unchanged.
#[derive(Debug, Error)]
pub enum Error {
    /// A login or password was required but not available.
    #[error("missing credentials: {0} is not provided via parameters or client constructor")]
    MissingCredentials(&'static str),

    /// The vendor login endpoint or the identity federation rejected the
    /// credentials.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Failure reason reported upstream.
        reason: String,
    },

    /// Error response from device management, registry or shadow operations.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// A command value is outside the domain accepted by the device.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during network communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Errors related to command value validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// The value is not one of the accepted choices.
    #[error("invalid value {value:?}, allowed values: {}", .allowed.join(", "))]
    NotAllowed {
        /// The rejected value.
        value: String,
        /// Every value the device accepts for this attribute.
        allowed: Vec<&'static str>,
    },

    /// A temperature setpoint is not a finite number.
    #[error("invalid temperature: {0}")]
    InvalidTemperature(f64),
}

impl ValueError {
    /// Rejects `value`, listing every accepted choice.
    #[must_use]
    pub fn not_allowed(value: &str, allowed: &[&'static str]) -> Self {
        Self::NotAllowed {
            value: value.to_string(),
            allowed: allowed.to_vec(),
        }
    }

    /// Returns the allowed set for a [`ValueError::NotAllowed`] error.
    #[must_use]
    pub fn allowed(&self) -> &[&'static str] {
        match self {
            Self::NotAllowed { allowed, .. } => allowed,
            Self::InvalidTemperature(_) => &[],
        }
    }
}

/// Errors returned by the device gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The device manager function failed while handling the request.
    #[error("function {function} failed: {message}")]
    FunctionError {
        /// Name of the invoked function.
        function: String,
        /// Error payload returned by the function.
        message: String,
    },

    /// The device manager answered with a non-success result.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The device has no shadow document.
    #[error("device {thing} has no shadow")]
    NoShadow {
        /// Device identifier.
        thing: String,
    },

    /// The service answered with an unexpected HTTP status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The response did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Errors related to network communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to a service failed with an unexpected status.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

/// Errors related to parsing service responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
