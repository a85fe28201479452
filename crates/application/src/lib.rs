use config::Config;
use domain::*;
use infrastructure::*;
use std::sync::Arc;
use tracing::info;

/// User Application - wires persistence into the domain services
pub struct UserApp {
    pub user_service: UserService,
}

impl UserApp {
    pub fn new(database_url: &str, age_policy: AgePolicy) -> Result<Self, DomainError> {
        // Infrastructure layer - database setup
        let database = Database::new(database_url)?;
        let pool = database.get_pool().clone();

        // Create repository implementations
        let user_repository: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(pool));

        // Domain services
        let user_service = UserService::new(user_repository, age_policy);
        info!(
            minimum_age = age_policy.minimum_age(),
            "User service initialized"
        );

        Ok(Self { user_service })
    }

    pub fn from_config(config: &Config) -> Result<Self, DomainError> {
        Self::new(&config.database_url, AgePolicy::new(config.minimum_age))
    }

    /// Throwaway app backed by a private in-memory database.
    pub fn in_memory(age_policy: AgePolicy) -> Result<Self, DomainError> {
        Self::new(IN_MEMORY, age_policy)
    }
}
