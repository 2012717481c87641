use axum::extract::FromRef;
use sqlx::SqlitePool;
use tower_sessions::{cookie::SameSite, Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::Config;
use crate::services::admin_auth::{AdminAuthError, AdminGate};
use crate::services::ledger::SlotLedger;

/// Session keys used in the application
pub const SESSION_KEY_IS_ADMIN: &str = "is_admin";

/// Creates the SQLite-backed session store, creating its table if needed
pub async fn create_session_store(pool: SqlitePool) -> Result<SqliteStore, sqlx::Error> {
    let session_store = SqliteStore::new(pool);
    session_store.migrate().await?;
    Ok(session_store)
}

/// Creates a session layer for Axum
pub fn create_session_layer<S>(session_store: S, config: &Config) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(session_store)
        .with_secure(config.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            config.session_hours,
        )))
}

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub ledger: SlotLedger,
    pub admin_gate: AdminGate,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Result<Self, AdminAuthError> {
        let admin_gate = AdminGate::new(&config.admin_pass)?;
        let ledger = SlotLedger::new(pool.clone(), config.slot_digits);

        Ok(Self {
            pool,
            config,
            ledger,
            admin_gate,
        })
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> SqlitePool {
        state.pool.clone()
    }
}
