use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use domain::DomainError;
use tracing::info;

pub mod schema;
pub use schema::*;

pub type SqlitePool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// URL that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Applied to every pooled connection.
#[derive(Debug)]
struct SqlitePragmas;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute("PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;")
            .map_err(r2d2::Error::QueryError)
    }
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    ///
    /// Every SQLite connection to `:memory:` is its own database, so that URL
    /// gets a single connection that is never recycled.
    pub fn new(database_url: &str) -> Result<Self, DomainError> {
        let manager = ConnectionManager::<SqliteConnection>::new(database_url);
        let mut builder = r2d2::Pool::builder().connection_customizer(Box::new(SqlitePragmas));
        if database_url == IN_MEMORY {
            builder = builder
                .max_size(1)
                .min_idle(Some(1))
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = builder
            .build(manager)
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;

        let database = Database { pool };
        database.run_migrations()?;
        info!(database_url, "Database ready");
        Ok(database)
    }

    pub fn in_memory() -> Result<Self, DomainError> {
        Self::new(IN_MEMORY)
    }

    fn run_migrations(&self) -> Result<(), DomainError> {
        let mut pooled = self
            .pool
            .get()
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;
        let conn: &mut SqliteConnection = &mut pooled;

        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DomainError::RepositoryError(e.to_string()))?;
        for version in applied {
            info!(%version, "Applied migration");
        }
        Ok(())
    }

    pub fn get_pool(&self) -> &SqlitePool {
        &self.pool
    }
}
