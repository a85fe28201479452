use crate::entities::{DateRange, NewUser, Page, PageRequest, User};
use crate::errors::DomainError;
use async_trait::async_trait;

/// Repository trait - defines what we need from persistence layer
/// This is a PORT in hexagonal architecture
///
/// `insert` and `update` must report a unique-email violation as
/// `DomainError::EmailAlreadyExists`; that is the authoritative check.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError>;
    async fn insert(&self, user: &NewUser) -> Result<User, DomainError>;
    async fn update(&self, user: &User) -> Result<User, DomainError>;
    /// Returns false when no row had that id.
    async fn delete(&self, id: i32) -> Result<bool, DomainError>;
    async fn find_page(&self, request: PageRequest) -> Result<Page<User>, DomainError>;
    async fn find_by_birth_date_between(
        &self,
        range: DateRange,
        request: PageRequest,
    ) -> Result<Page<User>, DomainError>;
}
