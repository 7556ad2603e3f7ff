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

//! Database abstraction to manipulate users and authentication.

use crate::model::{AccessToken, HashedPassword, Session, User, UserId};
use snippets_core::db::sqlite::{self, build_timestamp, unpack_timestamp};
use snippets_core::db::{DbError, DbResult, Executor};
use snippets_core::model::Username;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use time::OffsetDateTime;


/// Initializes the database schema.
pub async fn init_schema(ex: &mut Executor) -> DbResult<()> {
    match ex {
        Executor::Sqlite(ex) => sqlite::run_schema(ex, include_str!("sqlite.sql")).await,
    }
}

impl TryFrom<SqliteRow> for Session {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let access_token: String = row.try_get("access_token").map_err(sqlite::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let login_time_secs: i64 =
            row.try_get("login_time_secs").map_err(sqlite::map_sqlx_error)?;
        let login_time_nsecs: i64 =
            row.try_get("login_time_nsecs").map_err(sqlite::map_sqlx_error)?;

        let logout_time_secs: Option<i64> =
            row.try_get("logout_time_secs").map_err(sqlite::map_sqlx_error)?;
        let logout_time_nsecs: Option<i64> =
            row.try_get("logout_time_nsecs").map_err(sqlite::map_sqlx_error)?;

        let access_token = AccessToken::new(access_token)?;
        let username = Username::new(username)?;
        let login_time = build_timestamp(login_time_secs, login_time_nsecs)?;
        let session = Session::new(access_token, username, login_time);

        match (logout_time_secs, logout_time_nsecs) {
            (Some(secs), Some(nsecs)) => {
                Ok(session.with_logout_time(build_timestamp(secs, nsecs)?))
            }
            (None, None) => Ok(session),
            (_, _) => Err(DbError::DataIntegrityError(
                "Inconsistent logout time in session".to_owned(),
            )),
        }
    }
}

impl TryFrom<SqliteRow> for User {
    type Error = DbError;

    fn try_from(row: SqliteRow) -> DbResult<Self> {
        let id: i64 = row.try_get("id").map_err(sqlite::map_sqlx_error)?;
        let username: String = row.try_get("username").map_err(sqlite::map_sqlx_error)?;
        let password: Option<String> = row.try_get("password").map_err(sqlite::map_sqlx_error)?;
        let last_login_secs: Option<i64> =
            row.try_get("last_login_secs").map_err(sqlite::map_sqlx_error)?;
        let last_login_nsecs: Option<i64> =
            row.try_get("last_login_nsecs").map_err(sqlite::map_sqlx_error)?;

        let mut user = User::new(UserId::new(id), Username::new(username)?);
        if let Some(password) = password {
            user = user.with_password(HashedPassword::new(password));
        }
        match (last_login_secs, last_login_nsecs) {
            (Some(secs), Some(nsecs)) => user = user.with_last_login(build_timestamp(secs, nsecs)?),
            (None, None) => (),
            (_, _) => {
                return Err(DbError::DataIntegrityError(
                    "Inconsistent values for last_login".to_owned(),
                ));
            }
        }
        Ok(user)
    }
}

/// Creates a new user named `username` with a `password` in hashed form.  The user is created as
/// not having logged in yet.
pub async fn create_user(
    ex: &mut Executor,
    username: Username,
    password: Option<HashedPassword>,
) -> DbResult<User> {
    let id = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "INSERT INTO users (username, password) VALUES (?, ?)";
            let done = sqlx::query(query_str)
                .bind(username.as_str())
                .bind(password.as_ref().map(HashedPassword::as_str))
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

    let mut user = User::new(UserId::new(id), username);
    if let Some(password) = password {
        user = user.with_password(password);
    }
    Ok(user)
}

/// Gets information about an existing user named `username`.
pub async fn get_user_by_username(ex: &mut Executor, username: &Username) -> DbResult<User> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users WHERE username = ?";
            let raw_user = sqlx::query(query_str)
                .bind(username.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(raw_user)
        }
    }
}

/// Gets information about an existing user with identifier `id`.
pub async fn get_user_by_id(ex: &mut Executor, id: UserId) -> DbResult<User> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users WHERE id = ?";
            let raw_user = sqlx::query(query_str)
                .bind(id.as_i64())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            User::try_from(raw_user)
        }
    }
}

/// Gets a window of the users known to the system sorted by their identifier.
///
/// Skips the first `offset` users and returns at most `limit` of them, or all remaining users if
/// `limit` is `None`.
pub async fn get_users(ex: &mut Executor, offset: u32, limit: Option<u32>) -> DbResult<Vec<User>> {
    let limit = limit.map(i64::from).unwrap_or(-1);

    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?";
            let raw_users = sqlx::query(query_str)
                .bind(limit)
                .bind(i64::from(offset))
                .fetch_all(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            raw_users.into_iter().map(User::try_from).collect()
        }
    }
}

/// Counts the number of users known to the system.
pub async fn count_users(ex: &mut Executor) -> DbResult<u64> {
    let count: i64 = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "SELECT COUNT(*) AS count FROM users";
            let row = sqlx::query(query_str)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            row.try_get("count").map_err(sqlite::map_sqlx_error)?
        }
    };
    u64::try_from(count)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid user count {}: {}", count, e)))
}

/// Updates an existing user `username` to have new `last_login` details.
pub(crate) async fn update_user(
    ex: &mut Executor,
    username: &Username,
    last_login: OffsetDateTime,
) -> DbResult<()> {
    let (last_login_secs, last_login_nsecs) = unpack_timestamp(last_login)?;

    let rows_affected = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE users SET last_login_secs = ?, last_login_nsecs = ?
                WHERE username = ?";
            let done = sqlx::query(query_str)
                .bind(last_login_secs)
                .bind(last_login_nsecs)
                .bind(username.as_str())
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

/// Gets a session from its access token, including sessions that have been logged out.
pub(crate) async fn get_session(
    ex: &mut Executor,
    access_token: &AccessToken,
) -> DbResult<Session> {
    match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                SELECT
                    access_token, username, login_time_secs, login_time_nsecs,
                    logout_time_secs, logout_time_nsecs
                FROM sessions
                WHERE access_token = ?";
            let raw_session = sqlx::query(query_str)
                .bind(access_token.as_str())
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            Session::try_from(raw_session)
        }
    }
}

/// Saves a session.
pub(crate) async fn put_session(ex: &mut Executor, session: &Session) -> DbResult<()> {
    let (login_time_secs, login_time_nsecs) = unpack_timestamp(session.login_time())?;

    let rows_affected = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                INSERT INTO sessions (access_token, username, login_time_secs, login_time_nsecs)
                VALUES (?, ?, ?, ?)";
            let done = sqlx::query(query_str)
                .bind(session.access_token().as_str())
                .bind(session.username().as_str())
                .bind(login_time_secs)
                .bind(login_time_nsecs)
                .execute(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error)?;
            done.rows_affected()
        }
    };

    if rows_affected != 1 {
        return Err(DbError::BackendError("Insertion affected more than one row".to_owned()));
    }
    Ok(())
}

/// Marks the active session identified by `access_token` as logged out at time `now`.
pub(crate) async fn delete_session(
    ex: &mut Executor,
    access_token: &AccessToken,
    now: OffsetDateTime,
) -> DbResult<()> {
    let (now_secs, now_nsecs) = unpack_timestamp(now)?;

    let rows_affected = match ex {
        Executor::Sqlite(ex) => {
            let query_str = "
                UPDATE sessions
                SET logout_time_secs = ?, logout_time_nsecs = ?
                WHERE access_token = ? AND logout_time_secs IS NULL";
            let done = sqlx::query(query_str)
                .bind(now_secs)
                .bind(now_nsecs)
                .bind(access_token.as_str())
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
