// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level client combining the credential broker and device gateway.

use std::sync::Arc;

use crate::auth::{CredentialBroker, Credentials, Session};
use crate::command::ShadowCommand;
use crate::error::Error;
use crate::gateway::{DeviceDescription, DeviceGateway, DeviceSummary, PublishAck};
use crate::protocol::ClientConfig;
use crate::shadow::{Shadow, ShadowDocument};

/// Client for the `WeBack` cloud.
///
/// Every operation obtains a session from the [`CredentialBroker`] first,
/// logging in on first use and again whenever the session expired.
///
/// # Examples
///
/// ```no_run
/// use weback_lib::WebackClient;
///
/// # async fn example() -> weback_lib::Result<()> {
/// let client = WebackClient::new("user@example.com", "password")?;
///
/// for device in client.list_devices().await? {
///     println!("{} ({})", device.nickname(), device.name());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WebackClient {
    broker: CredentialBroker,
    gateway: DeviceGateway,
}

impl WebackClient {
    /// Creates a client with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Result<Self, Error> {
        Self::builder()
            .credentials(Credentials::new(login, password))
            .build()
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> WebackClientBuilder {
        WebackClientBuilder::default()
    }

    /// Returns the credential broker.
    #[must_use]
    pub fn broker(&self) -> &CredentialBroker {
        &self.broker
    }

    /// Returns the device gateway.
    #[must_use]
    pub fn gateway(&self) -> &DeviceGateway {
        &self.gateway
    }

    /// Returns a valid session.
    ///
    /// # Errors
    ///
    /// Returns error if login or the federation exchange fails.
    pub async fn session(&self) -> Result<Arc<Session>, Error> {
        self.broker.session().await
    }

    /// Lists the account's devices.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the query fails.
    pub async fn list_devices(&self) -> Result<Vec<DeviceSummary>, Error> {
        let session = self.session().await?;
        self.gateway.list_devices(&session).await
    }

    /// Fetches registry metadata for a device.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the lookup fails.
    pub async fn describe_device(&self, name: &str) -> Result<DeviceDescription, Error> {
        let session = self.session().await?;
        self.gateway.describe_device(name, &session).await
    }

    /// Resolves the data-plane endpoint of the current session.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the lookup fails.
    pub async fn data_endpoint(&self) -> Result<String, Error> {
        let session = self.session().await?;
        self.gateway.resolve_data_endpoint(&session).await
    }

    /// Fetches the reported state of a device.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the device has no shadow.
    pub async fn shadow(&self, name: &str) -> Result<Shadow, Error> {
        let session = self.session().await?;
        self.gateway.shadow(name, &session).await
    }

    /// Fetches the full shadow document of a device.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the device has no shadow.
    pub async fn shadow_document(&self, name: &str) -> Result<ShadowDocument, Error> {
        let session = self.session().await?;
        self.gateway.shadow_document(name, &session).await
    }

    /// Publishes a desired-state update to a device.
    ///
    /// # Errors
    ///
    /// Returns error if no session can be obtained or the publish is rejected.
    pub async fn publish(&self, name: &str, command: &ShadowCommand) -> Result<PublishAck, Error> {
        let session = self.session().await?;
        self.gateway.publish(name, command, &session).await
    }
}

/// Builder for [`WebackClient`].
#[derive(Debug, Default)]
pub struct WebackClientBuilder {
    config: Option<ClientConfig>,
    credentials: Option<Credentials>,
    session: Option<Session>,
}

impl WebackClientBuilder {
    /// Sets the account credentials.
    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Reads the account credentials from the environment, if set.
    #[must_use]
    pub fn credentials_from_env(mut self) -> Self {
        self.credentials = Credentials::from_env().or(self.credentials);
        self
    }

    /// Sets the endpoint configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Starts with an existing session instead of logging in.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn build(self) -> Result<WebackClient, Error> {
        let config = Arc::new(self.config.unwrap_or_default());
        let http = config.http_client()?;

        let mut broker = CredentialBroker::new(http.clone(), Arc::clone(&config), self.credentials);
        if let Some(session) = self.session {
            broker = broker.with_session(session);
        }

        Ok(WebackClient {
            broker,
            gateway: DeviceGateway::new(http, config),
        })
    }
}
