// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Credential broker: vendor login, federation exchange and session cache.

use std::sync::Arc;

use reqwest::Client;
use tokio::sync::Mutex;

use crate::auth::credentials::{Credentials, password_digest};
use crate::auth::session::Session;
use crate::error::Error;
use crate::protocol::ClientConfig;
use crate::protocol::cognito::{self, TemporaryCredentials};
use crate::protocol::login::{self, AuthResult, LoginRequest};

/// Turns vendor account credentials into a cloud [`Session`].
///
/// The broker caches the session and hands out the same instance until it
/// expires. Renewal happens lazily in the call that finds the session
/// expired. The cache lock is held during renewal, so concurrent callers
/// wait for the new session instead of building their own.
#[derive(Debug)]
pub struct CredentialBroker {
    http: Client,
    config: Arc<ClientConfig>,
    credentials: Option<Credentials>,
    session: Mutex<Option<Arc<Session>>>,
}

impl CredentialBroker {
    /// Creates a broker. Without credentials, only explicit
    /// [`authenticate`](Self::authenticate) calls or a seeded session work.
    #[must_use]
    pub fn new(http: Client, config: Arc<ClientConfig>, credentials: Option<Credentials>) -> Self {
        Self {
            http,
            config,
            credentials,
            session: Mutex::new(None),
        }
    }

    /// Seeds the cache with an existing session.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Mutex::new(Some(Arc::new(session)));
        self
    }

    /// Logs in to the vendor endpoint.
    ///
    /// Explicit `login`/`password` take precedence over the credentials the
    /// broker was built with. An explicit login is sent as-is, a stored one
    /// carries its country code prefix.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingCredentials` before any network call when no
    /// login or password is available, and `Error::Authentication` when the
    /// vendor rejects them.
    pub async fn authenticate(
        &self,
        login: Option<&str>,
        password: Option<&str>,
    ) -> Result<AuthResult, Error> {
        let account = match (login, &self.credentials) {
            (Some(login), _) => login.to_string(),
            (None, Some(creds)) => creds.account(),
            (None, None) => return Err(Error::MissingCredentials("login")),
        };
        let password = password
            .or_else(|| self.credentials.as_ref().map(Credentials::password))
            .ok_or(Error::MissingCredentials("password"))?;

        let request = LoginRequest {
            app_version: self.config.app_version(),
            password: password_digest(password),
            user_account: account,
        };

        let result = login::send(&self.http, self.config.login_url(), &request).await?;
        if !result.is_success() {
            tracing::warn!(
                account = %request.user_account,
                reason = result.fail_reason().unwrap_or_default(),
                "Login rejected"
            );
        }
        result.into_checked()
    }

    /// Exchanges the vendor identity and token for temporary credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::Authentication` if the exchange rejects the token.
    pub async fn exchange_for_session_credentials(
        &self,
        region: &str,
        identity_id: &str,
        token: &str,
    ) -> Result<TemporaryCredentials, Error> {
        let endpoint = self.config.identity_endpoint(region);
        cognito::get_credentials_for_identity(&self.http, &endpoint, identity_id, token).await
    }

    /// Returns a valid session, logging in again if the cached one expired.
    ///
    /// Two calls within one validity window return the same `Arc`. A failed
    /// renewal leaves nothing cached.
    ///
    /// # Errors
    ///
    /// Returns any error of [`authenticate`](Self::authenticate) or
    /// [`exchange_for_session_credentials`](Self::exchange_for_session_credentials).
    pub async fn session(&self) -> Result<Arc<Session>, Error> {
        let mut cached = self.session.lock().await;

        if let Some(session) = cached.as_ref().filter(|s| s.is_valid()) {
            return Ok(Arc::clone(session));
        }
        if cached.take().is_some() {
            tracing::info!("Session expired, renewing");
        }

        let session = Arc::new(self.renew().await?);
        *cached = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Returns the cached session without validating or renewing it.
    pub async fn cached_session(&self) -> Option<Arc<Session>> {
        self.session.lock().await.clone()
    }

    async fn renew(&self) -> Result<Session, Error> {
        let auth = self.authenticate(None, None).await?;
        let region = auth.region()?;
        let identity_id = auth.identity_id()?;

        let creds = self
            .exchange_for_session_credentials(region, identity_id, auth.token()?)
            .await?;

        tracing::info!(
            region = %region,
            identity_id = %identity_id,
            expiration = ?creds.expiration,
            "Session established"
        );

        Ok(Session::new(
            region,
            identity_id,
            creds.access_key_id,
            creds.secret_key,
            creds.session_token,
            creds.expiration,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker(credentials: Option<Credentials>) -> CredentialBroker {
        let config = ClientConfig::default().with_login_url("http://127.0.0.1:9/unreachable");
        let http = config.http_client().unwrap();
        CredentialBroker::new(http, Arc::new(config), credentials)
    }

    #[tokio::test]
    async fn authenticate_without_login_fails_before_network() {
        let err = broker(None).authenticate(None, Some("pw")).await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentials("login")));
    }

    #[tokio::test]
    async fn authenticate_without_password_fails_before_network() {
        let err = broker(None)
            .authenticate(Some("user"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingCredentials("password")));
    }

    #[tokio::test]
    async fn session_without_credentials_fails() {
        let b = broker(None);
        assert!(matches!(
            b.session().await.unwrap_err(),
            Error::MissingCredentials(_)
        ));
        assert!(b.cached_session().await.is_none());
    }

    #[tokio::test]
    async fn seeded_session_is_returned() {
        let seeded = Session::new("eu-central-1", "id", "AKID", "secret", "tok", None);
        let b = broker(None).with_session(seeded.clone());
        let session = b.session().await.unwrap();
        assert_eq!(*session, seeded);
        assert!(Arc::ptr_eq(&session, &b.session().await.unwrap()));
    }
}
