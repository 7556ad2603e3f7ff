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

//! Business logic for user authentication.

use crate::db;
use crate::model::{AccessToken, SessionStatus, User};
use futures::lock::Mutex;
use log::warn;
use lru_time_cache::LruCache;
use snippets_core::clocks::Clock;
use snippets_core::db::{Db, DbError, Executor};
use snippets_core::driver::{DriverError, DriverResult};
use snippets_core::env::get_optional_var;
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;

mod authenticate;
mod create_user;
mod login;
mod logout;
#[cfg(any(test, feature = "testutils"))]
pub mod testutils;

/// Default number of sessions to keep cached in memory.
const DEFAULT_SESSIONS_CACHE_CAPACITY: usize = 10000;

/// Default amount of time to keep cached sessions in memory.
const DEFAULT_SESSIONS_CACHE_TTL_SECONDS: u64 = 60;

/// Default value for the `SESSION_MAX_AGE` setting when not specified.
const DEFAULT_SESSION_MAX_AGE_SECONDS: u64 = 24 * 60 * 60;

/// Default value for the `SESSION_MAX_SKEW` setting when not specified.
const DEFAULT_SESSION_MAX_SKEW_SECONDS: u64 = 60 * 60;

/// Configuration options for the authentication driver.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthnOptions {
    /// The number of sessions to keep cached in memory.
    pub sessions_cache_capacity: usize,

    /// The amount of time to keep cached sessions in memory.
    pub sessions_cache_ttl: Duration,

    /// The amount of time we consider sessions valid for.
    pub session_max_age: Duration,

    /// The amount of time we tolerate in clock skew when validating sessions.
    pub session_max_skew: Duration,
}

impl Default for AuthnOptions {
    fn default() -> Self {
        Self {
            sessions_cache_capacity: DEFAULT_SESSIONS_CACHE_CAPACITY,
            sessions_cache_ttl: Duration::from_secs(DEFAULT_SESSIONS_CACHE_TTL_SECONDS),
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_SECONDS),
            session_max_skew: Duration::from_secs(DEFAULT_SESSION_MAX_SKEW_SECONDS),
        }
    }
}

impl AuthnOptions {
    /// Creates a new set of options from environment variables.
    pub fn from_env(prefix: &str) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            sessions_cache_capacity: get_optional_var::<usize>(prefix, "SESSIONS_CACHE_CAPACITY")?
                .unwrap_or(defaults.sessions_cache_capacity),
            sessions_cache_ttl: get_optional_var::<Duration>(prefix, "SESSIONS_CACHE_TTL")?
                .unwrap_or(defaults.sessions_cache_ttl),
            session_max_age: get_optional_var::<Duration>(prefix, "SESSION_MAX_AGE")?
                .unwrap_or(defaults.session_max_age),
            session_max_skew: get_optional_var::<Duration>(prefix, "SESSION_MAX_SKEW")?
                .unwrap_or(defaults.session_max_skew),
        })
    }
}

/// Business logic for accounts and sessions.
///
/// Operations that mutate state are "one shot": they start and commit their own transaction, so
/// they consume the driver in an attempt to prevent callers from composing two of them and
/// expecting atomicity.  Callers are expected to clone the driver, which is cheap.
#[derive(Clone)]
pub struct AuthnDriver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,

    /// Authentication realm to return to requests.
    realm: &'static str,

    /// Options for the authentication driver.
    opts: AuthnOptions,

    /// Cache of sessions, keyed by their access token.
    sessions_cache: Arc<Mutex<LruCache<AccessToken, DriverResult<Arc<User>>>>>,
}

impl AuthnDriver {
    /// Creates a new driver backed by the given dependencies.
    pub fn new(
        db: Arc<dyn Db + Send + Sync>,
        clock: Arc<dyn Clock + Send + Sync>,
        realm: &'static str,
        opts: AuthnOptions,
    ) -> Self {
        let sessions_cache = LruCache::with_expiry_duration_and_capacity(
            opts.sessions_cache_ttl,
            opts.sessions_cache_capacity,
        );
        let sessions_cache = Arc::new(Mutex::new(sessions_cache));

        Self { db, clock, realm, opts, sessions_cache }
    }

    /// Returns a reference to the authentication options provided at creation time.
    pub(crate) fn opts(&self) -> &AuthnOptions {
        &self.opts
    }

    /// Gets the authentication realm.
    pub fn realm(&self) -> &'static str {
        self.realm
    }

    /// Decodes the session in `token`, validates it and returns the user that owns the session.
    ///
    /// This is an internal helper for `get_session` that does not perform any caching.
    async fn get_session_uncached(
        &self,
        ex: &mut Executor,
        now: OffsetDateTime,
        token: &AccessToken,
    ) -> DriverResult<User> {
        let session = match db::get_session(ex, token).await {
            Ok(session) => session,
            Err(DbError::NotFound) => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            Err(e) => return Err(e.into()),
        };

        match session.status_at(now, self.opts.session_max_age, self.opts.session_max_skew) {
            SessionStatus::Active => (),
            SessionStatus::LoggedOut => {
                return Err(DriverError::Unauthorized("Invalid session".to_owned()));
            }
            SessionStatus::Expired | SessionStatus::Skewed => {
                return Err(DriverError::Unauthorized(
                    "Session expired; please log in again".to_owned(),
                ));
            }
        }

        let whoami = db::get_user_by_username(ex, session.username()).await?;
        Ok(whoami)
    }

    /// Decodes the session in `token`, validates it and returns the user that owns the session.
    ///
    /// Both OK and error results come from an internal cache, which should have been configured to
    /// evict entries relatively quickly.  Logging out evicts the session explicitly.
    pub async fn get_session(&self, token: &AccessToken) -> DriverResult<Arc<User>> {
        {
            let mut cache = self.sessions_cache.lock().await;
            if let Some(result) = cache.get(token) {
                return result.clone();
            }
        }

        let now = self.clock.now_utc();
        let mut ex = self.db.ex().await?;
        let result = self.get_session_uncached(&mut ex, now, token).await.map(Arc::new);

        let mut cache = self.sessions_cache.lock().await;
        if let Some(old_result) = cache.insert(token.clone(), result.clone()) {
            if old_result != result {
                warn!(
                    "Cache insertion race detected with inconsistent values: {:?} != {:?}",
                    old_result, result
                );
            }
        }

        result
    }

    /// Drops any cached validation result for the session identified by `token`.
    async fn evict_session(&self, token: &AccessToken) {
        let mut cache = self.sessions_cache.lock().await;
        let _previous = cache.remove(token);
    }
}
