//! User management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        role::Role,
        user::{CreateUser, UpdateUser, User},
    },
    repository::{
        users::{NewUser, UserChanges},
        Repository,
    },
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
}

impl UsersService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_users(&self) -> Vec<User> {
        self.repository.users.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Option<User> {
        self.repository.users.get_by_username(username).await
    }

    pub async fn count(&self) -> usize {
        self.repository.users.count().await
    }

    /// Create a new user; the role defaults to visitor
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        let created = self.repository.users.create(prepare(user)?).await?;

        tracing::info!("Created user {} ({}) as {}", created.id, created.username, created.role);
        Ok(created)
    }

    /// Create the first account of an empty store. Fails with an
    /// authorization error once any user exists.
    pub async fn create_first_user(&self, user: CreateUser) -> AppResult<User> {
        let created = self
            .repository
            .users
            .create_if_empty(prepare(user)?)
            .await?
            .ok_or_else(|| {
                AppError::Authorization(
                    "Only an administrator can create admin or teacher accounts".to_string(),
                )
            })?;

        tracing::info!("Bootstrapped user {} ({}) as {}", created.id, created.username, created.role);
        Ok(created)
    }

    pub async fn update_user(&self, id: i32, user: UpdateUser) -> AppResult<User> {
        user.validate()?;

        let password_hash = match user.password {
            Some(ref password) => Some(hash_password(password)?),
            None => None,
        };

        self.repository
            .users
            .update(
                id,
                UserChanges {
                    username: user.username,
                    password_hash,
                    role: user.role,
                    name: user.name,
                    email: user.email,
                },
            )
            .await
    }

    /// Delete a user. Outstanding loans do not block the deletion.
    pub async fn delete_user(&self, id: i32) -> AppResult<()> {
        let active = self.repository.loans.count_active_for_user(id).await;
        let user = self.repository.users.delete(id).await?;

        if active > 0 {
            tracing::warn!(
                "Deleted user {} ({}) who still has {} active loan(s)",
                user.id,
                user.username,
                active
            );
        } else {
            tracing::info!("Deleted user {} ({})", user.id, user.username);
        }
        Ok(())
    }

    /// Check a plain password against the stored hash
    pub fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&user.password)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn prepare(user: CreateUser) -> AppResult<NewUser> {
    user.validate()?;

    Ok(NewUser {
        password_hash: hash_password(&user.password)?,
        username: user.username,
        role: user.role.unwrap_or(Role::Visitor),
        name: user.name,
        email: user.email,
    })
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}
