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

//! Operations on the collection of snippets.

use crate::db;
use crate::driver::Driver;
use crate::driver::permissions::{Access, SNIPPET_POLICY, check_permissions};
use crate::highlight::highlight;
use crate::model::{Snippet, SnippetContent, SnippetInput};
use log::info;
use serde_json::{Map, Value};
use snippets_authn::model::User;
use snippets_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Gets a window of the snippets sorted by creation time plus the total number of snippets.
    pub(crate) async fn list_snippets(
        self,
        whoami: Option<&User>,
        offset: u32,
        limit: Option<u32>,
    ) -> DriverResult<(Vec<Snippet>, u64)> {
        check_permissions(SNIPPET_POLICY, whoami, Access::Read, self.authn.realm())?;

        let mut tx = self.db.begin().await?;
        let count = db::count_snippets(tx.ex()).await?;
        let snippets = db::get_snippets(tx.ex(), offset, limit).await?;
        tx.commit().await?;
        Ok((snippets, count))
    }

    /// Creates a new snippet owned by `whoami` from the fields in `payload`.
    pub(crate) async fn create_snippet(
        self,
        whoami: Option<&User>,
        payload: &Map<String, Value>,
    ) -> DriverResult<Snippet> {
        let realm = self.authn.realm();
        check_permissions(SNIPPET_POLICY, whoami, Access::Write, realm)?;
        let owner = whoami.ok_or(DriverError::NotAuthenticated { realm })?;

        let content = SnippetInput::parse(payload, true)?.apply(SnippetContent::default());
        let highlighted = highlight(&content).map_err(DriverError::BackendError)?;

        let mut tx = self.db.begin().await?;
        let id =
            db::create_snippet(tx.ex(), owner.id(), self.clock.now_utc(), &content, &highlighted)
                .await?;
        let snippet = db::get_snippet(tx.ex(), id).await?;
        tx.commit().await?;

        info!("User {} created snippet {}", owner.username(), id);
        Ok(snippet)
    }
}
