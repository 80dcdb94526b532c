// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity federation exchange.
//!
//! Converts the vendor-issued identity id and login token into temporary
//! cloud credentials with the `GetCredentialsForIdentity` operation. The
//! call itself is unsigned, the login token is the proof of identity.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, ParseError, ProtocolError};

/// Provider name the vendor token is registered under.
pub const LOGIN_PROVIDER: &str = "cognito-identity.amazonaws.com";

const TARGET: &str = "AWSCognitoIdentityService.GetCredentialsForIdentity";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Temporary credentials returned by the federation exchange.
#[derive(Clone, Deserialize)]
pub struct TemporaryCredentials {
    /// Access key id.
    #[serde(rename = "AccessKeyId")]
    pub access_key_id: String,
    /// Secret access key.
    #[serde(rename = "SecretKey")]
    pub secret_key: String,
    /// Session token.
    #[serde(rename = "SessionToken")]
    pub session_token: String,
    /// Expiration time of the credentials.
    #[serde(rename = "Expiration", default, deserialize_with = "epoch_seconds")]
    pub expiration: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for TemporaryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    #[serde(rename = "IdentityId")]
    identity_id: &'a str,
    #[serde(rename = "Logins")]
    logins: HashMap<&'static str, &'a str>,
}

#[derive(Deserialize)]
struct CredentialsResponse {
    #[serde(rename = "Credentials")]
    credentials: Option<TemporaryCredentials>,
}

#[derive(Deserialize)]
struct ServiceError {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

#[allow(clippy::cast_possible_truncation)]
fn epoch_seconds<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = Option::<f64>::deserialize(deserializer)?;
    Ok(secs.and_then(|s| DateTime::from_timestamp_millis((s * 1000.0).round() as i64)))
}

/// Requests temporary credentials for `identity_id` from `endpoint`.
///
/// # Errors
///
/// Returns `Error::Authentication` when the exchange rejects the token,
/// `Error::Protocol` on transport failures and `Error::Parse` on a
/// malformed response.
pub async fn get_credentials_for_identity(
    http: &Client,
    endpoint: &str,
    identity_id: &str,
    token: &str,
) -> Result<TemporaryCredentials, Error> {
    let request = CredentialsRequest {
        identity_id,
        logins: HashMap::from([(LOGIN_PROVIDER, token)]),
    };
    let body = serde_json::to_vec(&request).map_err(ParseError::Json)?;
    let url = format!("{endpoint}/");

    tracing::debug!(url = %url, identity_id = %identity_id, "Requesting session credentials");

    let response = http
        .post(&url)
        .header("x-amz-target", TARGET)
        .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
        .body(body)
        .send()
        .await
        .map_err(ProtocolError::Http)?;

    let status = response.status();
    let text = response.text().await.map_err(ProtocolError::Http)?;

    if !status.is_success() {
        let reason = match serde_json::from_str::<ServiceError>(&text) {
            Ok(ServiceError {
                kind: Some(kind),
                message,
            }) => format!("{kind}: {}", message.unwrap_or_default()),
            _ => format!("HTTP {} - {text}", status.as_u16()),
        };
        tracing::warn!(status = status.as_u16(), reason = %reason, "Session credentials rejected");
        return Err(Error::Authentication { reason });
    }

    let parsed: CredentialsResponse = serde_json::from_str(&text).map_err(ParseError::Json)?;
    parsed
        .credentials
        .ok_or_else(|| ParseError::MissingField("Credentials".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_shape() {
        let request = CredentialsRequest {
            identity_id: "eu-central-1:abc",
            logins: HashMap::from([(LOGIN_PROVIDER, "tok")]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "IdentityId": "eu-central-1:abc",
                "Logins": { "cognito-identity.amazonaws.com": "tok" }
            })
        );
    }

    #[test]
    fn parse_credentials_with_epoch_expiration() {
        let json = r#"{
            "IdentityId": "eu-central-1:abc",
            "Credentials": {
                "AccessKeyId": "ASIA123",
                "SecretKey": "secret",
                "SessionToken": "token",
                "Expiration": 1700000000.5
            }
        }"#;
        let parsed: CredentialsResponse = serde_json::from_str(json).unwrap();
        let creds = parsed.credentials.unwrap();
        assert_eq!(creds.access_key_id, "ASIA123");
        assert_eq!(
            creds.expiration,
            DateTime::from_timestamp_millis(1_700_000_000_500)
        );
    }

    #[test]
    fn parse_credentials_without_expiration() {
        let json = r#"{"Credentials": {"AccessKeyId": "a", "SecretKey": "b", "SessionToken": "c"}}"#;
        let parsed: CredentialsResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.credentials.unwrap().expiration.is_none());
    }

    #[test]
    fn debug_hides_secret() {
        let creds = TemporaryCredentials {
            access_key_id: "ASIA".to_string(),
            secret_key: "very-secret".to_string(),
            session_token: "tok".to_string(),
            expiration: None,
        };
        assert!(!format!("{creds:?}").contains("very-secret"));
    }
}
