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

//! Database abstraction in terms of the operations needed by the server.

use crate::model::{Language, Snippet, SnippetContent, SnippetId, Style};
use snippets_authn::model::UserId;
use snippets_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use snippets_core::db::{DbError, DbResult, Executor};
use snippets_core::model::Username;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use std::str::FromStr;
use time::OffsetDateTime;


/// Initializes the database schema, including the schema of the authentication layer.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    snippets_authn::db::init_schema(ex).await?;
    match ex {
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

/// Columns to fetch to build a `Snippet` from a row.
const SNIPPET_COLUMNS: &str = "
    snippets.id, created_secs, created_nsecs, owner_id, users.username AS owner,
    title, code, linenos, language, style, highlighted";

impl TryFrom<SqliteRow> for Snippet {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let created_secs: i64 = row.try_get("created_secs").map_err(sqlite::map_sqlx_error)?;
        let created_nsecs: i64 = row.try_get("created_nsecs").map_err(sqlite::map_sqlx_error)?;
        let owner_id: i64 = row.try_get("owner_id").map_err(sqlite::map_sqlx_error)?;
        let owner: String = row.try_get("owner").map_err(sqlite::map_sqlx_error)?;
        let title: String = row.try_get("title").map_err(sqlite::map_sqlx_error)?;
        let code: String = row.try_get("code").map_err(sqlite::map_sqlx_error)?;
        let linenos: bool = row.try_get("linenos").map_err(sqlite::map_sqlx_error)?;
        let language: String = row.try_get("language").map_err(sqlite::map_sqlx_error)?;
        let style: String = row.try_get("style").map_err(sqlite::map_sqlx_error)?;
        let highlighted: String = row.try_get("highlighted").map_err(sqlite::map_sqlx_error)?;

        let content = SnippetContent::new(
            title,
            code,
            linenos,
            Language::from_str(&language)?,
            Style::from_str(&style)?,
        );
        Ok(Snippet::new(
            SnippetId::new(id),
            build_timestamp(created_secs, created_nsecs)?,
            UserId::new(owner_id),
            Username::new(owner)?,
            content,
            highlighted,
        ))
    }
}

/// Creates a new snippet owned by `owner` at time `created` and returns its identifier.
pub(crate) async fn create_snippet(
    ex: &mut Executor,
    owner: UserId,
    created: OffsetDateTime,
    content: &SnippetContent,
    highlighted: &str,
) -> DbResult<SnippetId> {
    let (created_secs, created_nsecs) = unpack_timestamp(created)?;

    let id = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO snippets (
                    created_secs, created_nsecs, owner_id,
                    title, code, linenos, language, style, highlighted)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(created_secs)
                .bind(created_nsecs)
                .bind(owner.as_i64())
                .bind(content.title().as_str())
                .bind(content.code().as_str())
                .bind(*content.linenos())
                .bind(content.language().as_str())
                .bind(content.style().as_str())
                .bind(highlighted)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            if done.rows_affected() != 1 {
                return Err(DbError::BackendError(
                    "Insertion affected more than one row".to_owned(),
                ));
            }
            done.last_insert_rowid()
        }
    };

    Ok(SnippetId::new(id))
}

/// Gets the snippet identified by `id`.
pub(crate) async fn get_snippet(ex: &mut Executor, id: SnippetId) -> DbResult<Snippet> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT {} FROM snippets JOIN users ON snippets.owner_id = users.id
                WHERE snippets.id = ?",
                SNIPPET_COLUMNS
            );
            let raw_snippet = sqlx::query(&query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Snippet::try_from(raw_snippet)
        }
    }
}

/// Gets a window of all snippets sorted by creation time.
///
/// Skips the first `offset` snippets and returns at most `limit` of them, or all remaining
/// snippets if `limit` is `None`.
pub(crate) async fn get_snippets(
    ex: &mut Executor,
    offset: u32,
    limit: Option<u32>,
) -> DbResult<Vec<Snippet>> {
    let limit = limit.map(i64::from).unwrap_or(-1);

    match ex {
        Executor::Sqlite(ex) => {
            let query_str = format!(
                "SELECT {} FROM snippets JOIN users ON snippets.owner_id = users.id
                ORDER BY created_secs, created_nsecs, snippets.id
                LIMIT ? OFFSET ?",
                SNIPPET_COLUMNS
            );
            let raw_snippets = sqlx::query(&query_str)
                .bind(limit)
                .bind(i64::from(offset))
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_snippets.into_iter().map(Snippet::try_from).collect()
        }
    }
}

/// Counts the number of existing snippets.
pub(crate) async fn count_snippets(ex: &mut Executor) -> DbResult<u64> {
    let count: i64 = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM snippets";
            let row = sqlx::query(query_str)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }
    };
    u64::try_from(count)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid snippet count {}: {}", count, e)))
}

/// Gets the identifiers of all snippets owned by `owner` sorted by creation time.
pub(crate) async fn get_snippet_ids_by_owner(
    ex: &mut Executor,
    owner: UserId,
) -> DbResult<Vec<SnippetId>> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT id FROM snippets WHERE owner_id = ?
                ORDER BY created_secs, created_nsecs, id";
            let rows = sqlx::query(query_str)
                .bind(owner.as_i64())
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            let mut ids = Vec::with_capacity(rows.len());
            for row in rows {
                let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
                ids.push(SnippetId::new(id));
            }
            Ok(ids)
        }
    }
}

/// Replaces the content of the snippet identified by `id`.
pub(crate) async fn update_snippet(
    ex: &mut Executor,
    id: SnippetId,
    content: &SnippetContent,
    highlighted: &str,
) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE snippets
                SET title = ?, code = ?, linenos = ?, language = ?, style = ?, highlighted = ?
                WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(content.title().as_str())
                .bind(content.code().as_str())
                .bind(*content.linenos())
                .bind(content.language().as_str())
                .bind(content.style().as_str())
                .bind(highlighted)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Update affected more than one row".to_owned())),
    }
}

/// Deletes the snippet identified by `id`.
pub(crate) async fn delete_snippet(ex: &mut Executor, id: SnippetId) -> DbResult<()> {
    let rows_affected = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "DELETE FROM snippets WHERE id = ?";
            let done = sqlx::query(query_str)
                .bind(id.as_i64())
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    match rows_affected {
        0 => Err(DbError::NotFound),
        1 => Ok(()),
        _ => Err(DbError::BackendError("Deletion affected more than one row".to_owned())),
    }
}
