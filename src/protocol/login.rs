// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor login endpoint.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ParseError, ProtocolError};

/// Value of `Request_Result` on a successful login.
pub const LOGIN_SUCCESS: &str = "success";

/// Login request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    #[serde(rename = "App_Version")]
    pub app_version: &'a str,
    /// Hex MD5 digest of the password.
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "User_Account")]
    pub user_account: String,
}

/// Parsed response of the vendor login endpoint.
///
/// # Examples
///
/// ```
/// use weback_lib::protocol::login::AuthResult;
///
/// let json = r#"{
///     "Request_Result": "success",
///     "Region_Info": "eu-central-1",
///     "Identity_Id": "eu-central-1:1234",
///     "Token": "tok"
/// }"#;
/// let auth: AuthResult = serde_json::from_str(json).unwrap();
/// assert!(auth.is_success());
/// assert_eq!(auth.region().unwrap(), "eu-central-1");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResult {
    #[serde(rename = "Request_Result", default)]
    request_result: Option<String>,

    #[serde(rename = "Fail_Reason", default)]
    fail_reason: Option<String>,

    #[serde(rename = "Region_Info", default)]
    region_info: Option<String>,

    #[serde(rename = "Identity_Id", default)]
    identity_id: Option<String>,

    #[serde(rename = "Token", default)]
    token: Option<String>,

    /// Token lifetime in seconds, when reported.
    #[serde(rename = "Token_Duration", default)]
    token_duration: Option<u64>,
}

impl AuthResult {
    /// Returns `true` if the vendor accepted the credentials.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.request_result.as_deref() == Some(LOGIN_SUCCESS)
    }

    /// Failure reason reported by the vendor.
    #[must_use]
    pub fn fail_reason(&self) -> Option<&str> {
        self.fail_reason.as_deref()
    }

    /// Region the account lives in.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the response has no region.
    pub fn region(&self) -> Result<&str, ParseError> {
        required(self.region_info.as_deref(), "Region_Info")
    }

    /// Federated identity id.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the response has no identity.
    pub fn identity_id(&self) -> Result<&str, ParseError> {
        required(self.identity_id.as_deref(), "Identity_Id")
    }

    /// Login token to exchange for session credentials.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::MissingField` if the response has no token.
    pub fn token(&self) -> Result<&str, ParseError> {
        required(self.token.as_deref(), "Token")
    }

    /// Token lifetime in seconds.
    #[must_use]
    pub fn token_duration(&self) -> Option<u64> {
        self.token_duration
    }

    /// Turns a non-success response into an authentication error.
    pub(crate) fn into_checked(self) -> Result<Self, Error> {
        if self.is_success() {
            return Ok(self);
        }
        let reason = self
            .fail_reason
            .filter(|r| !r.is_empty())
            .or(self.request_result)
            .unwrap_or_else(|| "unknown failure".to_string());
        Err(Error::Authentication { reason })
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ParseError> {
    value.ok_or_else(|| ParseError::MissingField(field.to_string()))
}

/// Posts a login request and returns the parsed response, successful or not.
pub(crate) async fn send(
    http: &Client,
    url: &str,
    request: &LoginRequest<'_>,
) -> Result<AuthResult, Error> {
    tracing::debug!(url = %url, account = %request.user_account, "Sending login request");

    let response = http
        .post(url)
        .json(request)
        .send()
        .await
        .map_err(ProtocolError::Http)?;

    if !response.status().is_success() {
        return Err(ProtocolError::ConnectionFailed(format!(
            "HTTP {} - {}",
            response.status().as_u16(),
            response.status().canonical_reason().unwrap_or("Unknown")
        ))
        .into());
    }

    let body = response.text().await.map_err(ProtocolError::Http)?;
    let result: AuthResult = serde_json::from_str(&body).map_err(ParseError::Json)?;

    tracing::debug!(success = result.is_success(), "Received login response");

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_vendor_field_names() {
        let request = LoginRequest {
            app_version: "android_3.9.3",
            password: "5f4dcc3b5aa765d61d8327deb882cf99".to_string(),
            user_account: "+7-5551234".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "App_Version": "android_3.9.3",
                "Password": "5f4dcc3b5aa765d61d8327deb882cf99",
                "User_Account": "+7-5551234"
            })
        );
    }

    #[test]
    fn failed_login_carries_reason() {
        let json = r#"{"Request_Result": "fail", "Fail_Reason": "UserNotExist"}"#;
        let result: AuthResult = serde_json::from_str(json).unwrap();
        assert!(!result.is_success());

        let err = result.into_checked().unwrap_err();
        match err {
            Error::Authentication { reason } => assert_eq!(reason, "UserNotExist"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_fields_are_reported() {
        let json = r#"{"Request_Result": "success"}"#;
        let result: AuthResult = serde_json::from_str(json).unwrap();
        assert!(matches!(
            result.identity_id(),
            Err(ParseError::MissingField(f)) if f == "Identity_Id"
        ));
        assert!(result.token().is_err());
    }
}
