// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor account credentials.

use std::fmt;

/// Environment variable holding the account login.
pub const ENV_USERNAME: &str = "WEBACK_USERNAME";
/// Environment variable holding the account password.
pub const ENV_PASSWORD: &str = "WEBACK_PASSWORD";
/// Environment variable holding the optional phone country code.
pub const ENV_COUNTRY_CODE: &str = "WEBACK_COUNTRY_CODE";

/// Login and password for a `WeBack` account.
///
/// Accounts registered with a phone number need the country code, which is
/// prefixed onto the login as `+{code}-{login}`.
///
/// # Examples
///
/// ```
/// use weback_lib::auth::Credentials;
///
/// let creds = Credentials::new("5551234", "secret").with_country_code("7");
/// assert_eq!(creds.account(), "+7-5551234");
/// ```
#[derive(Clone)]
pub struct Credentials {
    login: String,
    password: String,
    country_code: Option<String>,
}

impl Credentials {
    /// Creates credentials from a login and a plaintext password.
    #[must_use]
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            country_code: None,
        }
    }

    /// Sets the phone country code prefixed onto the login.
    #[must_use]
    pub fn with_country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = Some(code.into());
        self
    }

    /// Reads credentials from `WEBACK_USERNAME`, `WEBACK_PASSWORD` and the
    /// optional `WEBACK_COUNTRY_CODE`.
    ///
    /// Returns `None` when the login or the password is not set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let login = std::env::var(ENV_USERNAME).ok()?;
        let password = std::env::var(ENV_PASSWORD).ok()?;
        let mut creds = Self::new(login, password);
        if let Ok(code) = std::env::var(ENV_COUNTRY_CODE)
            && !code.is_empty()
        {
            creds = creds.with_country_code(code);
        }
        Some(creds)
    }

    /// Returns the raw login, without country code.
    #[must_use]
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the account name sent to the login endpoint.
    #[must_use]
    pub fn account(&self) -> String {
        account_name(&self.login, self.country_code.as_deref())
    }

    pub(crate) fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .field("country_code", &self.country_code)
            .finish()
    }
}

pub(crate) fn account_name(login: &str, country_code: Option<&str>) -> String {
    match country_code {
        Some(code) => format!("+{code}-{login}"),
        None => login.to_string(),
    }
}

/// Hex MD5 digest of the UTF-8 password, the only form ever transmitted.
pub(crate) fn password_digest(password: &str) -> String {
    format!("{:x}", md5::compute(password.as_bytes()))
}
