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

//! Operations on one snippet.

use crate::db;
use crate::driver::permissions::{
    Access, SNIPPET_POLICY, check_object_permissions, check_permissions,
};
use crate::driver::{Driver, not_found};
use crate::highlight::highlight;
use crate::model::{Snippet, SnippetId, SnippetInput};
use log::info;
use serde_json::{Map, Value};
use snippets_authn::model::User;
use snippets_core::driver::{DriverError, DriverResult};

impl Driver {
    /// Gets the snippet identified by `id`.
    pub(crate) async fn get_snippet(
        self,
        whoami: Option<&User>,
        id: SnippetId,
    ) -> DriverResult<Snippet> {
        check_permissions(SNIPPET_POLICY, whoami, Access::Read, self.authn.realm())?;
        let snippet = db::get_snippet(&mut self.db.ex().await?, id).await.map_err(not_found)?;
        Ok(snippet)
    }

    /// Gets the pre-rendered HTML document of the snippet identified by `id`.
    pub(crate) async fn get_highlighted(
        self,
        whoami: Option<&User>,
        id: SnippetId,
    ) -> DriverResult<String> {
        let snippet = self.get_snippet(whoami, id).await?;
        let (_id, _created, _owner_id, _owner, _content, highlighted) = snippet.dissolve();
        Ok(highlighted)
    }

    /// Updates the snippet identified by `id` with the fields in `payload`.
    ///
    /// If `partial` is false, `payload` must contain every required field.  Optional fields that
    /// are missing keep their current values either way.
    pub(crate) async fn update_snippet(
        self,
        whoami: Option<&User>,
        id: SnippetId,
        payload: &Map<String, Value>,
        partial: bool,
    ) -> DriverResult<Snippet> {
        let realm = self.authn.realm();
        check_permissions(SNIPPET_POLICY, whoami, Access::Write, realm)?;

        let mut tx = self.db.begin().await?;
        let snippet = db::get_snippet(tx.ex(), id).await.map_err(not_found)?;
        let owner_id = *snippet.owner_id();
        check_object_permissions(SNIPPET_POLICY, whoami, Access::Write, owner_id, realm)?;

        let input = SnippetInput::parse(payload, !partial)?;
        let (_id, _created, _owner_id, owner, content, _highlighted) = snippet.dissolve();
        let content = input.apply(content);
        let highlighted = highlight(&content).map_err(DriverError::BackendError)?;

        db::update_snippet(tx.ex(), id, &content, &highlighted).await.map_err(not_found)?;
        let snippet = db::get_snippet(tx.ex(), id).await?;
        tx.commit().await?;

        info!("Updated snippet {} owned by {}", id, owner);
        Ok(snippet)
    }

    /// Deletes the snippet identified by `id`.
    pub(crate) async fn delete_snippet(
        self,
        whoami: Option<&User>,
        id: SnippetId,
    ) -> DriverResult<()> {
        let realm = self.authn.realm();
        check_permissions(SNIPPET_POLICY, whoami, Access::Write, realm)?;

        let mut tx = self.db.begin().await?;
        let snippet = db::get_snippet(tx.ex(), id).await.map_err(not_found)?;
        let owner_id = *snippet.owner_id();
        check_object_permissions(SNIPPET_POLICY, whoami, Access::Write, owner_id, realm)?;
        db::delete_snippet(tx.ex(), id).await.map_err(not_found)?;
        tx.commit().await?;

        info!("Deleted snippet {} owned by {}", id, snippet.owner());
        Ok(())
    }
}
