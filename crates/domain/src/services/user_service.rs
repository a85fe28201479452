use crate::entities::{DateRange, Page, PageRequest, Patch, User, UserPatch, UserRequest};
use crate::errors::DomainError;
use crate::repositories::UserRepository;
use crate::validation::AgePolicy;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// User Service - Contains business logic
/// This is the APPLICATION LAYER in clean architecture
///
/// The email pre-checks here only short-circuit the common case. Concurrent
/// writers are settled by the repository's unique constraint.
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    age_policy: AgePolicy,
}

impl UserService {
    pub fn new(user_repository: Arc<dyn UserRepository>, age_policy: AgePolicy) -> Self {
        Self {
            user_repository,
            age_policy,
        }
    }

    pub fn age_policy(&self) -> AgePolicy {
        self.age_policy
    }

    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Create a new user with business validation
    pub async fn create_user(&self, request: UserRequest) -> Result<User, DomainError> {
        let new_user = request.validate(&self.age_policy, self.today())?;

        if self.user_repository.exists_by_email(&new_user.email).await? {
            return Err(DomainError::EmailAlreadyExists(new_user.email));
        }

        let user = self.user_repository.insert(&new_user).await?;
        info!(user_id = user.id, email = %user.email, "Created user");
        Ok(user)
    }

    /// Get user by ID
    pub async fn get_user(&self, id: i32) -> Result<User, DomainError> {
        match self.user_repository.find_by_id(id).await? {
            Some(user) => Ok(user),
            None => Err(DomainError::UserNotFound(id)),
        }
    }

    /// Overwrite every field of an existing user
    pub async fn replace_user(&self, id: i32, request: UserRequest) -> Result<User, DomainError> {
        let replacement = request.validate(&self.age_policy, self.today())?;
        let mut user = self.get_user(id).await?;

        self.ensure_email_available(&user, &replacement.email).await?;

        user.replace_with(replacement);
        let user = self.user_repository.update(&user).await?;
        info!(user_id = user.id, "Replaced user");
        Ok(user)
    }

    /// Merge the fields present in `patch` into an existing user
    pub async fn patch_user(&self, id: i32, patch: UserPatch) -> Result<User, DomainError> {
        let patch = patch.validate(&self.age_policy, self.today())?;
        let mut user = self.get_user(id).await?;

        if patch.is_empty() {
            debug!(user_id = id, "Empty patch, nothing to do");
            return Ok(user);
        }

        if let Patch::Value(email) = &patch.email {
            self.ensure_email_available(&user, email).await?;
        }

        user.apply_patch(patch);
        let user = self.user_repository.update(&user).await?;
        info!(user_id = user.id, "Patched user");
        Ok(user)
    }

    /// Delete user
    pub async fn delete_user(&self, id: i32) -> Result<(), DomainError> {
        if !self.user_repository.delete(id).await? {
            return Err(DomainError::UserNotFound(id));
        }
        info!(user_id = id, "Deleted user");
        Ok(())
    }

    /// Get all users, one page at a time
    pub async fn list_users(&self, request: PageRequest) -> Result<Page<User>, DomainError> {
        self.user_repository.find_page(request).await
    }

    /// Users born within `range`, both ends included
    pub async fn list_users_in_range(
        &self,
        range: DateRange,
        request: PageRequest,
    ) -> Result<Page<User>, DomainError> {
        debug!(from = %range.from(), to = %range.to(), "Listing users by birth date");
        self.user_repository
            .find_by_birth_date_between(range, request)
            .await
    }

    /// A user keeping their own email is not a conflict.
    async fn ensure_email_available(&self, user: &User, email: &str) -> Result<(), DomainError> {
        if user.email.eq_ignore_ascii_case(email) {
            return Ok(());
        }
        if let Some(existing) = self.user_repository.find_by_email(email).await? {
            if existing.id != user.id {
                return Err(DomainError::EmailAlreadyExists(email.to_string()));
            }
        }
        Ok(())
    }
}
