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

//! Access policies for the resources exposed by the service.
//!
//! A policy is a list of `Permission`s that are evaluated in order.  Request-level checks run
//! before the target object is loaded; object-level checks run once the object is known.  The
//! first check that fails decides the outcome: anonymous callers are asked to authenticate and
//! authenticated callers are denied.

use log::warn;
use snippets_authn::model::{User, UserId};
use snippets_core::driver::{DriverError, DriverResult};

/// Kind of access requested by an operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Access {
    /// The operation only reads data (safe HTTP methods).
    Read,

    /// The operation creates, modifies or deletes data.
    Write,
}

/// A single access check.
pub(crate) trait Permission {
    /// Checks whether `whoami` can perform an operation of kind `access` at all.
    fn has_permission(&self, _whoami: Option<&User>, _access: Access) -> bool {
        true
    }

    /// Checks whether `whoami` can perform an operation of kind `access` on an object that
    /// belongs to `owner`.
    fn has_object_permission(
        &self,
        _whoami: Option<&User>,
        _access: Access,
        _owner: UserId,
    ) -> bool {
        true
    }
}

/// Allows reads to anyone and writes only to authenticated users.
pub(crate) struct IsAuthenticatedOrReadOnly;

impl Permission for IsAuthenticatedOrReadOnly {
    fn has_permission(&self, whoami: Option<&User>, access: Access) -> bool {
        access == Access::Read || whoami.is_some()
    }
}

/// Allows reads to anyone and writes only to the owner of the object.
pub(crate) struct IsOwnerOrReadOnly;

impl Permission for IsOwnerOrReadOnly {
    fn has_object_permission(&self, whoami: Option<&User>, access: Access, owner: UserId) -> bool {
        access == Access::Read || whoami.map(|user| user.id() == owner).unwrap_or(false)
    }
}

/// Policy for snippets.
pub(crate) const SNIPPET_POLICY: &[&(dyn Permission + Sync)] =
    &[&IsAuthenticatedOrReadOnly, &IsOwnerOrReadOnly];

/// Builds the error to return when `whoami` fails a check.
fn deny(whoami: Option<&User>, access: Access, realm: &'static str) -> DriverError {
    match whoami {
        None => {
            warn!("Rejected {:?} access by anonymous user", access);
            DriverError::NotAuthenticated { realm }
        }
        Some(user) => {
            warn!("Rejected {:?} access by user {}", access, user.username());
            let message = "You do not have permission to perform this action";
            DriverError::Unauthorized(message.to_owned())
        }
    }
}

/// Evaluates the request-level checks in `policy`.
pub(crate) fn check_permissions(
    policy: &[&(dyn Permission + Sync)],
    whoami: Option<&User>,
    access: Access,
    realm: &'static str,
) -> DriverResult<()> {
    match policy.iter().all(|p| p.has_permission(whoami, access)) {
        true => Ok(()),
        false => Err(deny(whoami, access, realm)),
    }
}

/// Evaluates the object-level checks in `policy` against an object that belongs to `owner`.
pub(crate) fn check_object_permissions(
    policy: &[&(dyn Permission + Sync)],
    whoami: Option<&User>,
    access: Access,
    owner: UserId,
    realm: &'static str,
) -> DriverResult<()> {
    match policy.iter().all(|p| p.has_object_permission(whoami, access, owner)) {
        true => Ok(()),
        false => Err(deny(whoami, access, realm)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snippets_authn::driver::AuthnOptions;
    use snippets_authn::driver::testutils::TestContext;
    use snippets_core::model::Username;

    /// Creates a real user named `username`.
    async fn user(context: &TestContext, username: &'static str) -> User {
        context.create_user(Username::from(username)).await
    }

    #[tokio::test]
    async fn test_is_authenticated_or_read_only() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        let someone = user(&context, "someone").await;

        let p = IsAuthenticatedOrReadOnly;
        assert!(p.has_permission(None, Access::Read));
        assert!(p.has_permission(Some(&someone), Access::Read));
        assert!(!p.has_permission(None, Access::Write));
        assert!(p.has_permission(Some(&someone), Access::Write));
        assert!(p.has_object_permission(None, Access::Write, someone.id()));
    }

    #[tokio::test]
    async fn test_is_owner_or_read_only() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        let owner = user(&context, "owner").await;
        let other = user(&context, "other").await;

        let p = IsOwnerOrReadOnly;
        assert!(p.has_permission(None, Access::Write));
        assert!(p.has_object_permission(None, Access::Read, owner.id()));
        assert!(p.has_object_permission(Some(&other), Access::Read, owner.id()));
        assert!(!p.has_object_permission(None, Access::Write, owner.id()));
        assert!(!p.has_object_permission(Some(&other), Access::Write, owner.id()));
        assert!(p.has_object_permission(Some(&owner), Access::Write, owner.id()));
    }

    #[tokio::test]
    async fn test_check_permissions_errors() {
        let context = TestContext::setup(AuthnOptions::default()).await;
        let owner = user(&context, "owner").await;
        let other = user(&context, "other").await;

        check_permissions(SNIPPET_POLICY, None, Access::Read, "realm").unwrap();
        assert_eq!(
            DriverError::NotAuthenticated { realm: "realm" },
            check_permissions(SNIPPET_POLICY, None, Access::Write, "realm").unwrap_err()
        );
        check_permissions(SNIPPET_POLICY, Some(&other), Access::Write, "realm").unwrap();

        check_object_permissions(SNIPPET_POLICY, Some(&owner), Access::Write, owner.id(), "realm")
            .unwrap();
        assert_eq!(
            DriverError::Unauthorized(
                "You do not have permission to perform this action".to_owned()
            ),
            check_object_permissions(
                SNIPPET_POLICY,
                Some(&other),
                Access::Write,
                owner.id(),
                "realm"
            )
            .unwrap_err()
        );
        assert_eq!(
            DriverError::NotAuthenticated { realm: "realm" },
            check_object_permissions(SNIPPET_POLICY, None, Access::Write, owner.id(), "realm")
                .unwrap_err()
        );
    }
}
