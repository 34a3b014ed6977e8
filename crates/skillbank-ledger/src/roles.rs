//! Role lookup and the owner-only role assignment.

use skillbank_db::models::UserRow;
use skillbank_db::queries::notifications::enqueue_notification;
use skillbank_db::queries::users;
use skillbank_types::models::{Principal, Role};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{Ledger, LedgerError, Result, notify};

impl Ledger {
    /// Loads the user's current role set. Called once per request by the auth
    /// layer; the resulting principal is what every other operation checks.
    pub fn resolve_principal(&self, user_id: Uuid) -> Result<Principal> {
        let id = user_id.to_string();
        self.db.with_conn(|conn| {
            let user = users::user_by_id(conn, &id)?;
            let roles = users::roles_for_user(conn, &id)?;
            Ok((user, roles))
        })
        .map_err(LedgerError::from)
        .and_then(|(user, roles)| match user {
            Some(user) => Ok(Principal::new(user_id, user.username, roles)),
            None => Err(LedgerError::NotFound(format!("user {user_id}"))),
        })
    }

    /// Creates an account from an already-hashed password. `bootstrap_owner`
    /// grants `owner` in the same transaction, so the configured owner never
    /// exists without the role.
    pub fn register_user(
        &self,
        user_id: Uuid,
        username: &str,
        password_hash: &str,
        bootstrap_owner: bool,
    ) -> Result<Principal> {
        let id = user_id.to_string();
        let roles = self.db.with_tx(|tx| {
            if users::user_by_username(tx, username)?.is_some() {
                return Err(LedgerError::Duplicate("username is taken".into()));
            }
            users::insert_user(tx, &id, username, password_hash).map_err(|e| {
                match e.sqlite_error_code() {
                    Some(rusqlite::ErrorCode::ConstraintViolation) => {
                        LedgerError::Duplicate("username is taken".into())
                    }
                    _ => LedgerError::from(e),
                }
            })?;
            if bootstrap_owner {
                users::grant_role(tx, &id, Role::Owner, None)?;
            }
            Ok(users::roles_for_user(tx, &id)?)
        })?;

        if bootstrap_owner {
            warn!("Bootstrap owner role granted to {username} ({user_id})");
        }
        Ok(Principal::new(user_id, username.to_string(), roles))
    }

    /// Grants or revokes `admin`/`owner` on the named user. Owner only.
    pub fn assign_role(
        &self,
        principal: &Principal,
        target_username: &str,
        role: Role,
        grant: bool,
    ) -> Result<(UserRow, Vec<Role>)> {
        if !principal.is_owner() {
            return Err(LedgerError::Forbidden("owner role required"));
        }
        if role == Role::User {
            return Err(LedgerError::Validation(
                "the user role is implicit and cannot be assigned".into(),
            ));
        }

        let actor_id = principal.id_string();
        let (target, roles, changed) = self.db.with_tx(|tx| {
            let target = users::user_by_username(tx, target_username.trim())?
                .ok_or_else(|| LedgerError::NotFound(format!("user {target_username}")))?;
            if !grant && role == Role::Owner && target.id == actor_id {
                return Err(LedgerError::Validation(
                    "owners cannot revoke their own owner role".into(),
                ));
            }

            let changed = if grant {
                users::grant_role(tx, &target.id, role, Some(&actor_id))?
            } else {
                users::revoke_role(tx, &target.id, role)?
            };
            if changed {
                enqueue_notification(tx, &notify::role_changed(&target.id, role, grant))?;
            }
            let roles = users::roles_for_user(tx, &target.id)?;
            Ok::<_, LedgerError>((target, roles, changed))
        })?;

        if changed {
            info!(
                "Role {role} {} {} by {}",
                if grant { "granted to" } else { "revoked from" },
                target.username,
                principal.username
            );
        }
        Ok((target, roles))
    }
}
