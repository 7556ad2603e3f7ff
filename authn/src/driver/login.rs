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

//! Extends the driver with the `login` method.

use crate::db;
use crate::driver::AuthnDriver;
use crate::model::{AccessToken, Password, Session};
use log::{info, warn};
use snippets_core::driver::DriverResult;
use snippets_core::model::Username;

impl AuthnDriver {
    /// Logs a user with `username` and `password` in and returns the new session.
    pub(crate) async fn login(
        self,
        username: Username,
        password: Password,
    ) -> DriverResult<Session> {
        let mut tx = self.db.begin().await?;
        let now = self.clock.now_utc();

        let user = match self.check_credentials(tx.ex(), &username, password).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Rejected login for {}: {}", username, e);
                return Err(e);
            }
        };

        let session = Session::new(AccessToken::generate(), user.username().clone(), now);
        db::put_session(tx.ex(), &session).await?;
        db::update_user(tx.ex(), user.username(), now).await?;

        tx.commit().await?;
        info!("User {} logged in", username);
        Ok(session)
    }
}
