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

//! REST service to store code snippets and to render them with syntax highlighting.
//!
//! Snippets are owned by the user that creates them.  Anyone can read them but only their owners
//! can modify or delete them.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use log::info;
use snippets_authn::driver::{AuthnDriver, AuthnOptions};
use snippets_authn::model::Password;
use snippets_core::clocks::SystemClock;
use snippets_core::db::Db;
use snippets_core::db::sqlite;
use snippets_core::env::get_optional_var;
use snippets_core::model::Username;
use snippets_core::rest::BaseUrls;
use std::error::Error;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

pub(crate) mod db;
mod driver;
use driver::Driver;
mod highlight;
pub(crate) mod model;
mod rest;
use rest::{RestOptions, app};

/// Prefix of all environment variables that configure the service.
const ENV_PREFIX: &str = "SNIPPETS";

/// Default database to use when none is configured.
const DEFAULT_DATABASE_URL: &str = "sqlite://snippets.sqlite3?mode=rwc";

/// Default authentication realm.
const DEFAULT_REALM: &str = "snippets";

/// Default port to listen on.
const DEFAULT_PORT: u16 = 8000;

/// Configuration of the persistent state, shared by all commands.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct StoreConfig {
    /// Connection string for the SQLite database.
    database_url: String,

    /// Authentication realm reported to unauthenticated clients.
    realm: &'static str,

    /// Options for the authentication layer.
    authn_opts: AuthnOptions,
}

impl StoreConfig {
    /// Creates the configuration from `SNIPPETS_*` environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = get_optional_var::<String>(ENV_PREFIX, "DATABASE_URL")?
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        let realm = match get_optional_var::<String>(ENV_PREFIX, "REALM")? {
            // Leaked once per process: the realm lives for the whole server lifetime.
            Some(realm) => Box::leak(realm.into_boxed_str()),
            None => DEFAULT_REALM,
        };
        let authn_opts = AuthnOptions::from_env(ENV_PREFIX)?;
        Ok(Self { database_url, realm, authn_opts })
    }

    /// Opens the database, initializes its schema and creates the business logic on top of it.
    async fn open(self) -> Result<(Arc<dyn Db + Send + Sync>, Driver), Box<dyn Error>> {
        let db = Arc::new(sqlite::connect(&self.database_url).await?);
        db::init_schema(&mut db.ex().await?).await?;

        let db: Arc<dyn Db + Send + Sync> = db;
        let clock = Arc::new(SystemClock::default());
        let authn = AuthnDriver::new(db.clone(), clock.clone(), self.realm, self.authn_opts);
        let driver = Driver::new(db.clone(), clock, authn);
        Ok((db, driver))
    }
}

/// Configuration of the HTTP service.
#[derive(Debug)]
#[cfg_attr(test, derive(PartialEq))]
pub struct Config {
    /// Configuration of the persistent state.
    store: StoreConfig,

    /// Address to listen on.
    bind_addr: SocketAddr,

    /// Public location of the service, used to build hyperlinks.
    base_urls: BaseUrls,

    /// Options that control how resources are represented.
    rest_opts: RestOptions,
}

impl Config {
    /// Creates the configuration from `SNIPPETS_*` environment variables.
    pub fn from_env() -> Result<Self, String> {
        let store = StoreConfig::from_env()?;
        let ip = get_optional_var::<IpAddr>(ENV_PREFIX, "BIND_ADDRESS")?
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let port = get_optional_var::<u16>(ENV_PREFIX, "PORT")?.unwrap_or(DEFAULT_PORT);
        let base_urls = BaseUrls::from_env(ENV_PREFIX)?;
        let rest_opts = RestOptions::from_env(ENV_PREFIX)?;
        Ok(Self { store, bind_addr: SocketAddr::new(ip, port), base_urls, rest_opts })
    }
}

/// Instantiates all resources to serve the application as described by `config`.
///
/// While it'd be nice to push this responsibility to `main`, doing so would force us to expose many
/// crate-internal types to the public, which in turn would make dead code detection harder.
pub async fn serve(config: Config) -> Result<(), Box<dyn Error>> {
    let (db, driver) = config.store.open().await?;
    let app = app(driver, Arc::new(config.base_urls), config.rest_opts);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);
    let result = axum::serve(listener, app).await;
    db.close().await;
    Ok(result?)
}

/// Provisions an account for `username` with `password` in the store described by `store`.
pub async fn create_user(
    store: StoreConfig,
    username: &str,
    password: String,
) -> Result<(), Box<dyn Error>> {
    let username = Username::new(username)?;
    let password = Password::new(password)?;

    let (db, driver) = store.open().await?;
    let result = driver.authn().clone().create_user(username, password).await;
    db.close().await;
    result?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Names of all environment variables that configure the service.
    const ALL_VARS: &[&str] = &[
        "SNIPPETS_BACKEND_BASE_URL",
        "SNIPPETS_BIND_ADDRESS",
        "SNIPPETS_DATABASE_URL",
        "SNIPPETS_PAGE_SIZE",
        "SNIPPETS_PORT",
        "SNIPPETS_REALM",
        "SNIPPETS_SESSION_MAX_AGE",
        "SNIPPETS_SESSION_MAX_SKEW",
        "SNIPPETS_SESSIONS_CACHE_CAPACITY",
        "SNIPPETS_SESSIONS_CACHE_TTL",
        "SNIPPETS_SNIPPET_RELATIONS",
        "SNIPPETS_USER_RELATIONS",
    ];

    /// Runs `f` with all configuration variables unset except for those in `overrides`.
    fn with_env<F: FnOnce()>(overrides: &[(&'static str, &'static str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = ALL_VARS
            .iter()
            .map(|name| {
                let value = overrides.iter().find(|(n, _)| n == name).map(|(_, v)| *v);
                (*name, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_config_from_env_defaults() {
        with_env(&[("SNIPPETS_BACKEND_BASE_URL", "http://example.com/")], || {
            let config = Config::from_env().unwrap();
            assert_eq!(
                Config {
                    store: StoreConfig {
                        database_url: DEFAULT_DATABASE_URL.to_owned(),
                        realm: "snippets",
                        authn_opts: AuthnOptions::default(),
                    },
                    bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8000),
                    base_urls: BaseUrls::from_strs("http://example.com/"),
                    rest_opts: RestOptions::default(),
                },
                config
            );
        });
    }

    #[test]
    fn test_config_from_env_all_present() {
        let overrides = [
            ("SNIPPETS_BACKEND_BASE_URL", "https://snippets.example.com/api/"),
            ("SNIPPETS_BIND_ADDRESS", "0.0.0.0"),
            ("SNIPPETS_DATABASE_URL", ":memory:"),
            ("SNIPPETS_PAGE_SIZE", "0"),
            ("SNIPPETS_PORT", "1234"),
            ("SNIPPETS_REALM", "my-realm"),
            ("SNIPPETS_SESSION_MAX_AGE", "2h"),
            ("SNIPPETS_USER_RELATIONS", "primary-key"),
        ];
        with_env(&overrides, || {
            let config = Config::from_env().unwrap();
            assert_eq!(":memory:", config.store.database_url);
            assert_eq!("my-realm", config.store.realm);
            assert_eq!(Duration::from_secs(2 * 60 * 60), config.store.authn_opts.session_max_age);
            assert_eq!(SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 1234), config.bind_addr);
            assert_eq!(BaseUrls::from_strs("https://snippets.example.com/api/"), config.base_urls);
            assert_eq!(0, config.rest_opts.page_size);
            assert_eq!(rest::Relations::PrimaryKey, config.rest_opts.user_relations);
            assert_eq!(rest::Relations::Hyperlinked, config.rest_opts.snippet_relations);
        });
    }

    #[test]
    fn test_config_from_env_missing_base_url() {
        with_env(&[], || {
            let err = Config::from_env().unwrap_err();
            assert!(err.contains("SNIPPETS_BACKEND_BASE_URL not present"));
        });
    }

    #[test]
    fn test_config_from_env_bad_port() {
        let overrides =
            [("SNIPPETS_BACKEND_BASE_URL", "http://example.com/"), ("SNIPPETS_PORT", "http")];
        with_env(&overrides, || {
            let err = Config::from_env().unwrap_err();
            assert!(err.contains("SNIPPETS_PORT"));
        });
    }

    #[tokio::test]
    async fn test_create_user() {
        let store = StoreConfig {
            database_url: ":memory:".to_owned(),
            realm: "test",
            authn_opts: AuthnOptions::default(),
        };
        create_user(store, "Someone", "long enough".to_owned()).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_user_bad_password() {
        let store = StoreConfig {
            database_url: ":memory:".to_owned(),
            realm: "test",
            authn_opts: AuthnOptions::default(),
        };
        let err = create_user(store, "someone", "short".to_owned()).await.unwrap_err();
        assert!(err.to_string().contains("too short"));
    }
}
