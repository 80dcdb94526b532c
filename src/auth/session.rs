// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temporary cloud session.

use std::fmt;

use chrono::{DateTime, Utc};

/// Temporary credential bundle authorizing device operations.
///
/// A session is immutable. Once it expires the broker drops it and builds a
/// new one, it is never patched in place.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    region: String,
    identity_id: String,
    access_key: String,
    secret_key: String,
    session_token: String,
    expiration_time: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a session from temporary credentials.
    #[must_use]
    pub fn new(
        region: impl Into<String>,
        identity_id: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: impl Into<String>,
        expiration_time: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            region: region.into(),
            identity_id: identity_id.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token: session_token.into(),
            expiration_time,
        }
    }

    /// Cloud region the account lives in.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Federated identity id issued by the vendor.
    #[must_use]
    pub fn identity_id(&self) -> &str {
        &self.identity_id
    }

    /// Expiration of the temporary credentials, if known.
    #[must_use]
    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.expiration_time
    }

    /// Returns `true` when the session can be used at `now`.
    ///
    /// A session without expiration never expires.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expiration_time.is_none_or(|exp| exp > now)
    }

    /// Returns `true` when the session can be used right now.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    pub(crate) fn access_key(&self) -> &str {
        &self.access_key
    }

    pub(crate) fn secret_key(&self) -> &str {
        &self.secret_key
    }

    pub(crate) fn session_token(&self) -> &str {
        &self.session_token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("region", &self.region)
            .field("identity_id", &self.identity_id)
            .field("access_key", &self.access_key)
            .field("expiration_time", &self.expiration_time)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn session(expiration_time: Option<DateTime<Utc>>) -> Session {
        Session::new("eu-central-1", "id", "AKID", "secret", "token", expiration_time)
    }

    #[test]
    fn session_without_expiration_is_valid() {
        assert!(session(None).is_valid());
    }

    #[test]
    fn session_valid_before_expiration() {
        let now = Utc::now();
        let s = session(Some(now + TimeDelta::minutes(5)));
        assert!(s.is_valid_at(now));
    }

    #[test]
    fn session_invalid_at_and_after_expiration() {
        let now = Utc::now();
        let s = session(Some(now));
        assert!(!s.is_valid_at(now));
        assert!(!s.is_valid_at(now + TimeDelta::seconds(1)));
    }

    #[test]
    fn debug_hides_secrets() {
        let debug = format!("{:?}", session(None));
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("token"));
    }
}
