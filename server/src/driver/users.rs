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

//! Read-only operations on users.

use crate::db;
use crate::driver::{Driver, not_found};
use crate::model::SnippetId;
use derive_getters::Getters;
use derive_more::Constructor;
use snippets_authn::model::{User, UserId};
use snippets_core::driver::DriverResult;

/// A user together with the identifiers of the snippets they own, in creation order.
#[derive(Constructor, Debug, Getters, PartialEq)]
pub(crate) struct UserSnippets {
    /// The user.
    user: User,

    /// Snippets owned by the user.
    snippets: Vec<SnippetId>,
}

impl Driver {
    /// Gets a window of the users sorted by identifier plus the total number of users.
    pub(crate) async fn list_users(
        self,
        offset: u32,
        limit: Option<u32>,
    ) -> DriverResult<(Vec<UserSnippets>, u64)> {
        let mut tx = self.db.begin().await?;
        let count = snippets_authn::db::count_users(tx.ex()).await?;
        let users = snippets_authn::db::get_users(tx.ex(), offset, limit).await?;
        let mut result = Vec::with_capacity(users.len());
        for user in users {
            let snippets = db::get_snippet_ids_by_owner(tx.ex(), user.id()).await?;
            result.push(UserSnippets::new(user, snippets));
        }
        tx.commit().await?;
        Ok((result, count))
    }

    /// Gets the user identified by `id`.
    pub(crate) async fn get_user(self, id: UserId) -> DriverResult<UserSnippets> {
        let mut tx = self.db.begin().await?;
        let user = snippets_authn::db::get_user_by_id(tx.ex(), id).await.map_err(not_found)?;
        let snippets = db::get_snippet_ids_by_owner(tx.ex(), id).await?;
        tx.commit().await?;
        Ok(UserSnippets::new(user, snippets))
    }
}
