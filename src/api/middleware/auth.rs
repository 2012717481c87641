use tower_sessions::Session;

use super::session::SESSION_KEY_IS_ADMIN;
use crate::error::AppError;
use crate::services::ledger::Permission;

/// Permission level of the session's owner. Sessions start as guests.
pub async fn caller_permission(session: &Session) -> Result<Permission, AppError> {
    let is_admin: Option<bool> = session.get(SESSION_KEY_IS_ADMIN).await?;

    Ok(match is_admin {
        Some(true) => Permission::Administrator,
        _ => Permission::Guest,
    })
}

/// Fails with `rejection` unless the session belongs to an administrator
pub async fn require_admin(session: &Session, rejection: AppError) -> Result<(), AppError> {
    if caller_permission(session).await?.is_admin() {
        Ok(())
    } else {
        Err(rejection)
    }
}
