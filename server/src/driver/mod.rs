// Snippets
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Business logic for the service.

use snippets_authn::driver::AuthnDriver;
use snippets_core::clocks::Clock;
use snippets_core::db::{Db, DbError};
use snippets_core::driver::DriverError;
use std::sync::Arc;

mod permissions;
mod snippet;
mod snippets;
#[cfg(test)]
pub(crate) mod testutils;
mod users;
pub(crate) use users::UserSnippets;

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot": they start and commit a
/// transaction, so it's incorrect for the caller to use two separate calls.  For this reason,
/// these operations consume the driver in an attempt to minimize the possibility of executing
/// two operations.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// The authentication driver, which owns users and sessions.
    authn: AuthnDriver,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        authn: AuthnDriver,
    ) -> Self {
        Self { db, clock, authn }
    }

    /// Gets the authentication driver to resolve the caller of a request.
    pub(crate) fn authn(&self) -> &AuthnDriver {
        &self.authn
    }
}

/// Converts a lookup failure into the error exposed to clients.
fn not_found(e: DbError) -> DriverError {
    match e {
        DbError::NotFound => DriverError::NotFound("Not found.".to_owned()),
        e => e.into(),
    }
}
