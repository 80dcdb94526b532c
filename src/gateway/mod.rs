// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device gateway.
//!
//! The gateway performs every device operation on behalf of a [`Session`]:
//! device listing through the vendor's device manager function, registry
//! lookups, shadow reads and desired-state publishes on the data plane.
//!
//! Publishing is fire-and-forget. A successful [`DeviceGateway::publish`]
//! only means the transport accepted the payload.

mod types;

pub use types::{DeviceDescription, DeviceSummary, PublishAck};

use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::auth::Session;
use crate::command::ShadowCommand;
use crate::error::{Error, GatewayError, ParseError, ProtocolError};
use crate::protocol::ClientConfig;
use crate::protocol::aws::SignedRequest;
use crate::shadow::{Shadow, ShadowDocument};

const LAMBDA_SERVICE: &str = "lambda";
const IOT_SERVICE: &str = "iot";
const IOT_DATA_SERVICE: &str = "iotdata";
const DATA_ENDPOINT_TYPE: &str = "iot:Data-ATS";
const REQUEST_SUCCESS: &str = "success";

/// Delivery quality for publishes: at most once.
pub const PUBLISH_QOS: u8 = 0;

/// Returns the shadow update topic of a device.
///
/// # Examples
///
/// ```
/// assert_eq!(
///     weback_lib::gateway::update_topic("robot-1"),
///     "$aws/things/robot-1/shadow/update"
/// );
/// ```
#[must_use]
pub fn update_topic(thing: &str) -> String {
    format!("$aws/things/{thing}/shadow/update")
}

/// Performs device operations with an explicit session.
#[derive(Debug, Clone)]
pub struct DeviceGateway {
    http: Client,
    config: Arc<ClientConfig>,
}

#[derive(Deserialize)]
struct DeviceManagerResponse {
    #[serde(rename = "Request_Result", default)]
    request_result: Option<String>,
    #[serde(rename = "Fail_Reason", default)]
    fail_reason: Option<String>,
    #[serde(rename = "Request_Cotent", default)]
    request_content: Option<Vec<DeviceSummary>>,
}

#[derive(Deserialize)]
struct EndpointResponse {
    #[serde(rename = "endpointAddress")]
    endpoint_address: String,
}

impl DeviceGateway {
    /// Creates a gateway sharing an HTTP client and configuration.
    #[must_use]
    pub fn new(http: Client, config: Arc<ClientConfig>) -> Self {
        Self { http, config }
    }

    /// Lists the devices bound to the session's identity.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the device manager fails, rejects the query
    /// or answers without the device list.
    pub async fn list_devices(&self, session: &Session) -> Result<Vec<DeviceSummary>, Error> {
        let function = self.config.device_manager_function();
        let url = format!(
            "{}/2015-03-31/functions/{}/invocations",
            self.config.lambda_endpoint(session.region()),
            urlencoding::encode(function)
        );
        let payload = json!({
            "Device_Manager_Request": "query",
            "Identity_Id": session.identity_id(),
            "Region_Info": session.region(),
        });
        let body = serde_json::to_vec(&payload).map_err(ParseError::Json)?;

        let response = SignedRequest::post(LAMBDA_SERVICE, &url, body)
            .header("x-amz-invocation-type", "RequestResponse")
            .send(&self.http, session)
            .await?;

        let function_error = response
            .headers()
            .get("x-amz-function-error")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = success_body(response).await?;

        if function_error.is_some() {
            return Err(GatewayError::FunctionError {
                function: function.to_string(),
                message: text,
            }
            .into());
        }

        let parsed: DeviceManagerResponse = malformed(serde_json::from_str(&text))?;
        if let Some(result) = parsed.request_result
            && result != REQUEST_SUCCESS
        {
            let reason = parsed.fail_reason.filter(|r| !r.is_empty()).unwrap_or(result);
            tracing::warn!(reason = %reason, "Device list query rejected");
            return Err(GatewayError::Rejected(reason).into());
        }

        let devices = parsed.request_content.ok_or_else(|| {
            GatewayError::MalformedResponse("missing Request_Cotent".to_string())
        })?;
        tracing::debug!(count = devices.len(), "Listed devices");
        Ok(devices)
    }

    /// Fetches registry metadata for a device.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the registry answers with an error or a
    /// malformed document.
    pub async fn describe_device(
        &self,
        name: &str,
        session: &Session,
    ) -> Result<DeviceDescription, Error> {
        let url = format!(
            "{}/things/{}",
            self.config.iot_endpoint(session.region()),
            urlencoding::encode(name)
        );
        let response = SignedRequest::get(IOT_SERVICE, &url)
            .send(&self.http, session)
            .await?;
        parse_json(response).await
    }

    /// Resolves the data-plane endpoint for the session's region.
    ///
    /// The endpoint is looked up again on every call, as it depends on
    /// the session.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the registry answers with an error or a
    /// malformed document.
    pub async fn resolve_data_endpoint(&self, session: &Session) -> Result<String, Error> {
        let url = format!(
            "{}/endpoint?endpointType={}",
            self.config.iot_endpoint(session.region()),
            urlencoding::encode(DATA_ENDPOINT_TYPE)
        );
        let response = SignedRequest::get(IOT_SERVICE, &url)
            .send(&self.http, session)
            .await?;
        let endpoint: EndpointResponse = parse_json(response).await?;

        let address = endpoint.endpoint_address.trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            Ok(address.to_string())
        } else {
            Ok(format!("https://{address}"))
        }
    }

    /// Fetches the reported state of a device.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NoShadow` if the device has no shadow.
    pub async fn shadow(&self, name: &str, session: &Session) -> Result<Shadow, Error> {
        self.shadow_document(name, session)
            .await
            .map(ShadowDocument::into_reported)
    }

    /// Fetches the full shadow document of a device.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NoShadow` if the device has no shadow.
    pub async fn shadow_document(
        &self,
        name: &str,
        session: &Session,
    ) -> Result<ShadowDocument, Error> {
        let endpoint = self.resolve_data_endpoint(session).await?;
        let url = format!("{endpoint}/things/{}/shadow", urlencoding::encode(name));

        let response = SignedRequest::get(IOT_DATA_SERVICE, &url)
            .send(&self.http, session)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::NoShadow {
                thing: name.to_string(),
            }
            .into());
        }
        parse_json(response).await
    }

    /// Publishes a desired-state update to a device.
    ///
    /// Returns once the transport accepted the payload, without waiting for
    /// the device to apply it.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the data plane rejects the publish.
    pub async fn publish(
        &self,
        name: &str,
        command: &ShadowCommand,
        session: &Session,
    ) -> Result<PublishAck, Error> {
        let endpoint = self.resolve_data_endpoint(session).await?;
        let topic = update_topic(name);
        let url = format!(
            "{endpoint}/topics/{}?qos={PUBLISH_QOS}",
            urlencoding::encode(&topic)
        );
        let body = serde_json::to_vec(&command.envelope()).map_err(ParseError::Json)?;

        tracing::debug!(topic = %topic, desired = ?command.desired(), "Publishing desired state");

        let response = SignedRequest::post(IOT_DATA_SERVICE, &url, body)
            .send(&self.http, session)
            .await?;
        success_body(response).await?;

        Ok(PublishAck {
            topic,
            qos: PUBLISH_QOS,
        })
    }
}

async fn success_body(response: Response) -> Result<String, Error> {
    let status = response.status();
    let text = response.text().await.map_err(ProtocolError::Http)?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            message: text,
        }
        .into());
    }
    Ok(text)
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let text = success_body(response).await?;
    malformed(serde_json::from_str(&text))
}

fn malformed<T>(result: serde_json::Result<T>) -> Result<T, Error> {
    result.map_err(|e| GatewayError::MalformedResponse(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_pattern() {
        assert_eq!(update_topic("abc"), "$aws/things/abc/shadow/update");
    }

    #[test]
    fn device_manager_response_keeps_vendor_field_name() {
        let json = r#"{"Request_Result": "success", "Request_Cotent": [{"Thing_Name": "t-1"}]}"#;
        let parsed: DeviceManagerResponse = serde_json::from_str(json).unwrap();
        let devices = parsed.request_content.unwrap();
        assert_eq!(devices[0].name(), "t-1");
    }

    #[test]
    fn device_manager_response_rejects_corrected_field_name() {
        let json = r#"{"Request_Content": [{"Thing_Name": "t-1"}]}"#;
        let parsed: DeviceManagerResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.request_content.is_none());
    }
}
