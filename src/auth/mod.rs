// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authentication and session lifecycle.
//!
//! Getting a [`Session`] is a two-step federated flow:
//!
//! 1. the vendor login endpoint validates the account and returns a region,
//!    an identity id and a login token
//! 2. the identity federation exchange turns the token into temporary cloud
//!    credentials
//!
//! [`CredentialBroker`] runs the flow and caches the result until it
//! expires.

mod broker;
mod credentials;
mod session;

pub use broker::CredentialBroker;
pub use credentials::{Credentials, ENV_COUNTRY_CODE, ENV_PASSWORD, ENV_USERNAME};
pub use session::Session;
