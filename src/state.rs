use std::sync::Arc;

use crate::{config::AppConfig, db::OrmConn};

/// Token signing settings shared by the login service and the auth extractors.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

// `DatabaseConnection` is not `Clone` once sea-orm's `mock` feature is on.
#[derive(Clone)]
pub struct AppState {
    pub orm: Arc<OrmConn>,
    pub auth: Arc<AuthSettings>,
}

impl AppState {
    pub fn new(orm: OrmConn, auth: AuthSettings) -> Self {
        Self {
            orm: Arc::new(orm),
            auth: Arc::new(auth),
        }
    }

    pub fn db(&self) -> &OrmConn {
        &self.orm
    }

    pub fn from_config(orm: OrmConn, config: &AppConfig) -> Self {
        Self::new(
            orm,
            AuthSettings {
                jwt_secret: config.jwt_secret.clone(),
                token_ttl_hours: config.jwt_ttl_hours,
            },
        )
    }
}
