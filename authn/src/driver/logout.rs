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

//! Extends the driver with the `logout` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::AccessToken;
use log::info;
use snippets_core::db::DbError;
use snippets_core::driver::{DriverError, DriverResult};

impl AuthnDriver {
    /// Marks the session identified by `token` as logged out.
    pub(crate) async fn logout(self, token: AccessToken) -> DriverResult<()> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let session = match db::get_session(tx.ex(), &token).await {
            Ok(session) if session.logout_time().is_none() => session,
            Ok(_) | Err(DbError::NotFound) => {
                return Err(DriverError::NotFound("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };
        db::delete_session(tx.ex(), session.access_token(), now).await?;
        tx.commit().await?;

        self.evict_session(&token).await;
        info!("User {} logged out", session.username());
        Ok(())
    }
}
