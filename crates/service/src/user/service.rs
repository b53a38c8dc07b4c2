use std::sync::Arc;

use models::{CreateUserInput, UpdateUserInput, UpsertUserInput, User, UserData};
use tracing::{debug, info, instrument, warn};

use super::password::Argon2Hasher;
use crate::errors::{ErrorKind, ServiceResult, TaggedError};
use crate::repository::Repository;
use crate::service::CrudService;

/// User use cases: hashing on write, username lookup, credential checks.
pub struct UserService<Repo: Repository<UserData> + ?Sized = dyn Repository<UserData>> {
    crud: CrudService<UserData, Repo>,
    hasher: Argon2Hasher,
}

impl<Repo: Repository<UserData> + ?Sized> UserService<Repo> {
    pub fn new(repo: Arc<Repo>, hasher: Argon2Hasher) -> Self {
        Self { crud: CrudService::new(repo), hasher }
    }

    /// Create a user, storing only the password hash.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::{ActorId, CreateUserInput, User, UserData, UserStatus};
    /// use service::repository::{AuditedRepository, Repository};
    /// use service::storage::MemoryStorage;
    /// use service::user::{Argon2Hasher, PasswordConfig, UserService};
    ///
    /// let storage: Arc<MemoryStorage<User>> = Arc::new(MemoryStorage::new());
    /// let repo: Arc<dyn Repository<UserData>> =
    ///     Arc::new(AuditedRepository::new(storage, ActorId::new("docs").unwrap()));
    /// let hasher = Argon2Hasher::new(&PasswordConfig { memory_kib: 8, iterations: 1, parallelism: 1 }).unwrap();
    /// let svc = UserService::new(repo, hasher);
    /// let input = CreateUserInput {
    ///     first_name: "Grace".into(),
    ///     last_name: "Hopper".into(),
    ///     username: "grace".into(),
    ///     email: "grace@example.com".into(),
    ///     password: "Secret123".into(),
    ///     status: UserStatus { is_active: true, is_verified: true, is_locked: false },
    /// };
    /// let user = tokio_test::block_on(svc.create(input)).unwrap();
    /// assert_eq!(user.version, 1);
    /// assert_eq!(user.created_by, "docs");
    /// assert_ne!(user.data.password, "Secret123");
    /// ```
    #[instrument(skip(self, input), fields(username = %input.username))]
    pub async fn create(&self, input: CreateUserInput) -> ServiceResult<User> {
        let hash = self.hasher.hash(&input.password)?;
        let user = self.crud.create(input.into_user_data(hash)).await?;
        info!(user_id = %user.id, "user_created");
        Ok(user)
    }

    /// `UpdateNotProvided` when `input` sets nothing. A new password is hashed
    /// before it reaches storage.
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: &str, input: UpdateUserInput) -> ServiceResult<User> {
        let patch = self.prepare_patch(id, input)?;
        let user = self.crud.update(id, patch).await?;
        info!(user_id = %user.id, version = user.version, "user_updated");
        Ok(user)
    }

    #[instrument(skip(self, input))]
    pub async fn update_checked(
        &self,
        id: &str,
        expected_version: u64,
        input: UpdateUserInput,
    ) -> ServiceResult<User> {
        let patch = self.prepare_patch(id, input)?;
        let user = self.crud.update_checked(id, expected_version, patch).await?;
        info!(user_id = %user.id, version = user.version, "user_updated");
        Ok(user)
    }

    #[instrument(skip(self, input), fields(id = ?input.id, username = %input.user.username))]
    pub async fn upsert(&self, input: UpsertUserInput) -> ServiceResult<User> {
        let hash = self.hasher.hash(&input.user.password)?;
        let user = self.crud.upsert(input.into_upsert(hash)).await?;
        info!(user_id = %user.id, version = user.version, "user_upserted");
        Ok(user)
    }

    /// Linear scan over every stored user.
    pub async fn get_by_username(&self, username: &str) -> ServiceResult<User> {
        self.crud
            .get_all()
            .await?
            .into_iter()
            .find(|u| u.data.username == username)
            .ok_or_else(|| TaggedError::not_found(format!("User with username {username} not found.")))
    }

    /// Check credentials. Unknown usernames and wrong passwords produce the
    /// same error; locked or inactive accounts are rejected after the
    /// password matches.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<User> {
        let user = match self.get_by_username(username).await {
            Ok(user) => user,
            Err(e) if e.is(ErrorKind::NotFound) => {
                debug!("unknown username");
                return Err(invalid_credentials());
            }
            Err(e) => return Err(e),
        };
        if !self.hasher.verify(password, &user.data.password)? {
            warn!(user_id = %user.id, "password mismatch");
            return Err(invalid_credentials());
        }
        if user.data.status.is_locked {
            warn!(user_id = %user.id, "login on locked account");
            return Err(TaggedError::authentication(format!("Account {username} is locked.")));
        }
        if !user.data.status.is_active {
            warn!(user_id = %user.id, "login on inactive account");
            return Err(TaggedError::authentication(format!("Account {username} is inactive.")));
        }
        info!(user_id = %user.id, "user_authenticated");
        Ok(user)
    }

    pub async fn get_all(&self) -> ServiceResult<Vec<User>> { self.crud.get_all().await }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<User> { self.crud.get_by_id(id).await }

    pub async fn delete(&self, id: &str) -> ServiceResult<bool> {
        let deleted = self.crud.delete(id).await?;
        if deleted {
            info!(user_id = %id, "user_deleted");
        }
        Ok(deleted)
    }

    pub async fn clear(&self) -> ServiceResult<()> { self.crud.clear().await }

    pub async fn exists(&self, id: &str) -> ServiceResult<bool> { self.crud.exists(id).await }

    pub async fn count(&self) -> ServiceResult<usize> { self.crud.count().await }

    fn prepare_patch(&self, id: &str, input: UpdateUserInput) -> ServiceResult<models::UserPatch> {
        if input.is_empty() {
            return Err(TaggedError::update_not_provided(format!(
                "No fields provided to update User with ID {id}."
            )));
        }
        let hash = input.password.as_deref().map(|p| self.hasher.hash(p)).transpose()?;
        Ok(input.into_patch(hash))
    }
}

fn invalid_credentials() -> TaggedError {
    TaggedError::authentication("Invalid username or password.")
}
