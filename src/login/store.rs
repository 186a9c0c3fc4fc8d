//! Read-only access to the `Usuario` table

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::Result;
use crate::config::LoginConfig;
use crate::token::Subject;

/// A row of the `Usuario` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRecord {
    /// Internal id
    pub id: i64,
    /// Login identifier (unique)
    pub rut: String,
    /// Stored secret, a bcrypt hash or plaintext depending on the scheme
    pub contrasena: String,
    /// Role
    pub rol: String,
}

impl UserRecord {
    /// Token subject for this user
    #[must_use]
    pub fn subject(&self) -> Subject<'_> {
        Subject {
            id: self.id,
            rut: &self.rut,
            rol: &self.rol,
        }
    }
}

/// Lookup of users by login identifier
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user whose `RUT` equals `rut`
    async fn find_by_rut(&self, rut: &str) -> Result<Option<UserRecord>>;
}

const FIND_BY_RUT: &str = r"
    SELECT id::BIGINT AS id, rut, contrasena, rol
    FROM Usuario
    WHERE RUT = $1
";

/// Postgres-backed user store
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Wrap an existing pool
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a pool that connects on first use.
    ///
    /// Uses `database_url` when configured, otherwise the standard `PG*`
    /// environment variables.
    pub fn connect_lazy(config: &LoginConfig) -> Result<Self> {
        let options = match config.database_url.as_deref() {
            Some(url) => url.parse::<PgConnectOptions>()?,
            None => PgConnectOptions::new(),
        };
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_rut(&self, rut: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(FIND_BY_RUT)
            .bind(rut)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
