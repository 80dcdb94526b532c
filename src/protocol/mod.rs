// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Network protocols used by the `WeBack` cloud.
//!
//! The client talks to three kinds of HTTPS services:
//!
//! - the vendor login endpoint ([`login`]), plain JSON
//! - the identity federation exchange ([`cognito`]), unsigned AWS JSON 1.1
//! - regional device services (device manager, registry, shadows), signed
//!   with the session's temporary keys ([`sigv4`])
//!
//! [`ClientConfig`] holds every endpoint so the whole flow can be pointed
//! at another host.

pub mod cognito;
pub mod login;
pub(crate) mod aws;
pub(crate) mod sigv4;

use std::time::Duration;

use reqwest::Client;

use crate::error::ProtocolError;

/// Placeholder substituted with the session region in endpoint templates.
pub const REGION_PLACEHOLDER: &str = "{region}";

/// Configuration of the endpoints and client parameters.
///
/// Endpoint templates may contain `{region}`, replaced with the session
/// region at call time.
///
/// # Examples
///
/// ```
/// use weback_lib::protocol::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_app_version("android_3.9.3")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(
///     config.lambda_endpoint("eu-central-1"),
///     "https://lambda.eu-central-1.amazonaws.com"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    login_url: String,
    app_version: String,
    identity_endpoint: String,
    lambda_endpoint: String,
    iot_endpoint: String,
    device_manager_function: String,
    timeout: Duration,
}

impl ClientConfig {
    /// Default vendor login endpoint.
    pub const DEFAULT_LOGIN_URL: &'static str =
        "https://www.weback-login.com/WeBack/WeBack_Login_Ats_V3";
    /// App version tag sent with every login.
    pub const DEFAULT_APP_VERSION: &'static str = "android_3.9.3";
    /// Default identity federation endpoint.
    pub const DEFAULT_IDENTITY_ENDPOINT: &'static str =
        "https://cognito-identity.{region}.amazonaws.com";
    /// Default function invocation endpoint.
    pub const DEFAULT_LAMBDA_ENDPOINT: &'static str = "https://lambda.{region}.amazonaws.com";
    /// Default device registry endpoint.
    pub const DEFAULT_IOT_ENDPOINT: &'static str = "https://iot.{region}.amazonaws.com";
    /// Remote function answering device list queries.
    pub const DEFAULT_DEVICE_MANAGER_FUNCTION: &'static str = "Device_Manager_V2";
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Sets the vendor login URL.
    #[must_use]
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into();
        self
    }

    /// Sets the app version tag sent at login.
    #[must_use]
    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Sets the identity federation endpoint template.
    #[must_use]
    pub fn with_identity_endpoint(mut self, template: impl Into<String>) -> Self {
        self.identity_endpoint = template.into();
        self
    }

    /// Sets the function invocation endpoint template.
    #[must_use]
    pub fn with_lambda_endpoint(mut self, template: impl Into<String>) -> Self {
        self.lambda_endpoint = template.into();
        self
    }

    /// Sets the device registry endpoint template.
    #[must_use]
    pub fn with_iot_endpoint(mut self, template: impl Into<String>) -> Self {
        self.iot_endpoint = template.into();
        self
    }

    /// Sets the name of the device manager function.
    #[must_use]
    pub fn with_device_manager_function(mut self, name: impl Into<String>) -> Self {
        self.device_manager_function = name.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the vendor login URL.
    #[must_use]
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Returns the app version tag.
    #[must_use]
    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    /// Returns the identity federation endpoint for `region`.
    #[must_use]
    pub fn identity_endpoint(&self, region: &str) -> String {
        regional(&self.identity_endpoint, region)
    }

    /// Returns the function invocation endpoint for `region`.
    #[must_use]
    pub fn lambda_endpoint(&self, region: &str) -> String {
        regional(&self.lambda_endpoint, region)
    }

    /// Returns the device registry endpoint for `region`.
    #[must_use]
    pub fn iot_endpoint(&self, region: &str) -> String {
        regional(&self.iot_endpoint, region)
    }

    /// Returns the device manager function name.
    #[must_use]
    pub fn device_manager_function(&self) -> &str {
        &self.device_manager_function
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Creates the HTTP client shared by every protocol.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn http_client(&self) -> Result<Client, ProtocolError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            login_url: Self::DEFAULT_LOGIN_URL.to_string(),
            app_version: Self::DEFAULT_APP_VERSION.to_string(),
            identity_endpoint: Self::DEFAULT_IDENTITY_ENDPOINT.to_string(),
            lambda_endpoint: Self::DEFAULT_LAMBDA_ENDPOINT.to_string(),
            iot_endpoint: Self::DEFAULT_IOT_ENDPOINT.to_string(),
            device_manager_function: Self::DEFAULT_DEVICE_MANAGER_FUNCTION.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

fn regional(template: &str, region: &str) -> String {
    template
        .replace(REGION_PLACEHOLDER, region)
        .trim_end_matches('/')
        .to_string()
}
