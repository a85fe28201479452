use crate::database::{users, SqlitePool};
use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use domain::{DateRange, DomainError, NewUser, Page, PageRequest, User, UserRepository};

// Database model - separate from domain entity
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
struct UserModel {
    id: i32,
    email: String,
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
    address: Option<String>,
    phone_number: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUserModel {
    email: String,
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
    address: Option<String>,
    phone_number: Option<String>,
}

/// Full-row changeset; `None` writes NULL rather than skipping the column.
#[derive(AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
struct UserChangeset {
    email: String,
    first_name: String,
    last_name: String,
    birth_date: NaiveDate,
    address: Option<String>,
    phone_number: Option<String>,
}

// Convert between domain and database models
impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: model.id,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            birth_date: model.birth_date,
            address: model.address,
            phone_number: model.phone_number,
        }
    }
}

impl From<&NewUser> for NewUserModel {
    fn from(user: &NewUser) -> Self {
        NewUserModel {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birth_date: user.birth_date,
            address: user.address.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

impl From<&User> for UserChangeset {
    fn from(user: &User) -> Self {
        UserChangeset {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            birth_date: user.birth_date,
            address: user.address.clone(),
            phone_number: user.phone_number.clone(),
        }
    }
}

fn repository_error(e: impl ToString) -> DomainError {
    DomainError::RepositoryError(e.to_string())
}

/// The UNIQUE constraint on `email` is the final word on duplicates.
fn write_error(e: DieselError, email: &str) -> DomainError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            DomainError::EmailAlreadyExists(email.to_string())
        }
        other => repository_error(other),
    }
}

fn to_page(rows: Vec<UserModel>, request: PageRequest, total: i64) -> Page<User> {
    let total = u64::try_from(total).unwrap_or(0);
    Page::new(rows.into_iter().map(User::from).collect(), request, total)
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Runs `f` on a pooled connection off the async runtime.
    async fn run<T, F>(&self, f: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, DomainError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(repository_error)?;
            f(&mut *conn)
        })
        .await
        .map_err(repository_error)?
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn find_by_id(&self, id: i32) -> Result<Option<User>, DomainError> {
        let result = self
            .run(move |conn| {
                users::table
                    .find(id)
                    .select(UserModel::as_select())
                    .first::<UserModel>(conn)
                    .optional()
                    .map_err(repository_error)
            })
            .await?;

        Ok(result.map(|model| model.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let email = email.to_string();
        let result = self
            .run(move |conn| {
                users::table
                    .filter(users::email.eq(email))
                    .select(UserModel::as_select())
                    .first::<UserModel>(conn)
                    .optional()
                    .map_err(repository_error)
            })
            .await?;

        Ok(result.map(|model| model.into()))
    }

    async fn exists_by_email(&self, email: &str) -> Result<bool, DomainError> {
        let email = email.to_string();
        self.run(move |conn| {
            diesel::select(diesel::dsl::exists(
                users::table.filter(users::email.eq(email)),
            ))
            .get_result::<bool>(conn)
            .map_err(repository_error)
        })
        .await
    }

    async fn insert(&self, user: &NewUser) -> Result<User, DomainError> {
        let new_user = NewUserModel::from(user);

        let result = self
            .run(move |conn| {
                conn.transaction::<UserModel, DieselError, _>(|conn| {
                    diesel::insert_into(users::table)
                        .values(&new_user)
                        .execute(conn)?;

                    // Read the row back through its unique email
                    users::table
                        .filter(users::email.eq(&new_user.email))
                        .select(UserModel::as_select())
                        .first::<UserModel>(conn)
                })
                .map_err(|e| write_error(e, &new_user.email))
            })
            .await?;

        Ok(result.into())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let user_id = user.id;
        let changes = UserChangeset::from(user);

        let result = self
            .run(move |conn| {
                conn.transaction::<UserModel, DieselError, _>(|conn| {
                    diesel::update(users::table.find(user_id))
                        .set(&changes)
                        .execute(conn)?;

                    // Fetch the updated user
                    users::table
                        .find(user_id)
                        .select(UserModel::as_select())
                        .first::<UserModel>(conn)
                })
                .map_err(|e| match e {
                    DieselError::NotFound => DomainError::UserNotFound(user_id),
                    other => write_error(other, &changes.email),
                })
            })
            .await?;

        Ok(result.into())
    }

    async fn delete(&self, id: i32) -> Result<bool, DomainError> {
        let deleted = self
            .run(move |conn| {
                diesel::delete(users::table.find(id))
                    .execute(conn)
                    .map_err(repository_error)
            })
            .await?;

        Ok(deleted > 0)
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<User>, DomainError> {
        self.run(move |conn| {
            let total = users::table
                .count()
                .get_result::<i64>(conn)
                .map_err(repository_error)?;

            let rows = users::table
                .order(users::id.asc())
                .limit(request.limit())
                .offset(request.offset())
                .select(UserModel::as_select())
                .load::<UserModel>(conn)
                .map_err(repository_error)?;

            Ok(to_page(rows, request, total))
        })
        .await
    }

    async fn find_by_birth_date_between(
        &self,
        range: DateRange,
        request: PageRequest,
    ) -> Result<Page<User>, DomainError> {
        let (from, to) = (range.from(), range.to());

        self.run(move |conn| {
            let total = users::table
                .filter(users::birth_date.between(from, to))
                .count()
                .get_result::<i64>(conn)
                .map_err(repository_error)?;

            let rows = users::table
                .filter(users::birth_date.between(from, to))
                .order(users::id.asc())
                .limit(request.limit())
                .offset(request.offset())
                .select(UserModel::as_select())
                .load::<UserModel>(conn)
                .map_err(repository_error)?;

            Ok(to_page(rows, request, total))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn repository() -> SqliteUserRepository {
        let database = Database::in_memory().unwrap();
        SqliteUserRepository::new(database.get_pool().clone())
    }

    fn new_user(email: &str, birth_date: NaiveDate) -> NewUser {
        NewUser {
            email: email.to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            birth_date,
            address: None,
            phone_number: Some("555-0100".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_round_trips() {
        let repo = repository();

        let a = repo.insert(&new_user("a@x.com", date(1990, 1, 1))).await.unwrap();
        let b = repo.insert(&new_user("b@x.com", date(1991, 2, 3))).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(repo.find_by_id(b.id).await.unwrap(), Some(b.clone()));
        assert_eq!(repo.find_by_email("a@x.com").await.unwrap(), Some(a));
        assert_eq!(b.birth_date, date(1991, 2, 3));
        assert_eq!(b.address, None);
    }

    #[tokio::test]
    async fn test_unique_constraint_surfaces_as_duplicate_email() {
        let repo = repository();
        repo.insert(&new_user("a@x.com", date(1990, 1, 1))).await.unwrap();

        let err = repo
            .insert(&new_user("a@x.com", date(1990, 1, 1)))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::EmailAlreadyExists(email) if email == "a@x.com"));
        assert_eq!(repo.find_page(PageRequest::default()).await.unwrap().total_elements, 1);
    }

    #[tokio::test]
    async fn test_update_conflicting_email_is_rejected() {
        let repo = repository();
        repo.insert(&new_user("a@x.com", date(1990, 1, 1))).await.unwrap();
        let mut b = repo.insert(&new_user("b@x.com", date(1990, 1, 1))).await.unwrap();

        b.email = "a@x.com".to_string();
        let err = repo.update(&b).await.unwrap_err();

        assert!(matches!(err, DomainError::EmailAlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_update_writes_nulls() {
        let repo = repository();
        let mut user = repo.insert(&new_user("a@x.com", date(1990, 1, 1))).await.unwrap();

        user.phone_number = None;
        user.address = Some("2 Side St".to_string());
        user.first_name = "Grace".to_string();
        let updated = repo.update(&user).await.unwrap();

        assert_eq!(updated, user);
        assert_eq!(repo.find_by_id(user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let repo = repository();
        let ghost = User {
            id: 404,
            email: "ghost@x.com".to_string(),
            first_name: "G".to_string(),
            last_name: "H".to_string(),
            birth_date: date(1990, 1, 1),
            address: None,
            phone_number: None,
        };

        assert!(matches!(
            repo.update(&ghost).await,
            Err(DomainError::UserNotFound(404))
        ));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_a_row_went_away() {
        let repo = repository();
        let user = repo.insert(&new_user("a@x.com", date(1990, 1, 1))).await.unwrap();

        assert!(!repo.delete(user.id + 1).await.unwrap());
        assert!(repo.exists_by_email("a@x.com").await.unwrap());

        assert!(repo.delete(user.id).await.unwrap());
        assert!(!repo.exists_by_email("a@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_pages_are_ordered_by_id() {
        let repo = repository();
        for i in 0..7 {
            repo.insert(&new_user(&format!("u{i}@x.com"), date(1990, 1, 1)))
                .await
                .unwrap();
        }

        let page = repo.find_page(PageRequest::new(Some(1), Some(3))).await.unwrap();
        let emails: Vec<_> = page.content.iter().map(|u| u.email.as_str()).collect();

        assert_eq!(emails, vec!["u3@x.com", "u4@x.com", "u5@x.com"]);
        assert_eq!(page.total_elements, 7);
        assert_eq!(page.total_pages, 3);

        let past_end = repo.find_page(PageRequest::new(Some(5), Some(3))).await.unwrap();
        assert!(past_end.content.is_empty());
        assert_eq!(past_end.total_elements, 7);
    }

    #[tokio::test]
    async fn test_birth_date_range_includes_both_bounds() {
        let repo = repository();
        repo.insert(&new_user("before@x.com", date(1989, 12, 31))).await.unwrap();
        repo.insert(&new_user("from@x.com", date(1990, 1, 1))).await.unwrap();
        repo.insert(&new_user("mid@x.com", date(1992, 7, 4))).await.unwrap();
        repo.insert(&new_user("to@x.com", date(1995, 1, 1))).await.unwrap();
        repo.insert(&new_user("after@x.com", date(1995, 1, 2))).await.unwrap();

        let range = DateRange::new(date(1990, 1, 1), date(1995, 1, 1)).unwrap();
        let page = repo
            .find_by_birth_date_between(range, PageRequest::default())
            .await
            .unwrap();

        let emails: Vec<_> = page.content.iter().map(|u| u.email.as_str()).collect();
        assert_eq!(emails, vec!["from@x.com", "mid@x.com", "to@x.com"]);
        assert_eq!(page.total_elements, 3);
    }
}
