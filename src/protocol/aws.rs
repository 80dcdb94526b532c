// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Signed requests to regional cloud services.

use chrono::Utc;
use reqwest::{Client, Method, Response, Url};

use crate::auth::Session;
use crate::error::{Error, ProtocolError};
use crate::protocol::sigv4::{self, SigningParams};

const JSON: &str = "application/json";

/// A request signed with the temporary keys of a [`Session`].
pub(crate) struct SignedRequest<'a> {
    method: Method,
    url: &'a str,
    service: &'static str,
    headers: Vec<(&'static str, String)>,
    body: Option<Vec<u8>>,
}

impl<'a> SignedRequest<'a> {
    pub fn get(service: &'static str, url: &'a str) -> Self {
        Self {
            method: Method::GET,
            url,
            service,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(service: &'static str, url: &'a str, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url,
            service,
            headers: vec![("content-type", JSON.to_string())],
            body: Some(body),
        }
    }

    #[must_use]
    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub async fn send(self, http: &Client, session: &Session) -> Result<Response, Error> {
        let url = Url::parse(self.url)
            .map_err(|e| ProtocolError::InvalidAddress(format!("{}: {e}", self.url)))?;
        let body = self.body.unwrap_or_default();

        let extra: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        let params = SigningParams {
            access_key: session.access_key(),
            secret_key: session.secret_key(),
            session_token: Some(session.session_token()),
            region: session.region(),
            service: self.service,
            time: Utc::now(),
        };
        let auth_headers = sigv4::sign(self.method.as_str(), &url, &extra, &body, &params);

        tracing::debug!(
            method = %self.method,
            url = %url,
            service = self.service,
            "Sending signed request"
        );

        let mut request = http.request(self.method, url);
        for (name, value) in self.headers.into_iter().chain(auth_headers) {
            request = request.header(name, value);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        request.send().await.map_err(|e| ProtocolError::Http(e).into())
    }
}
