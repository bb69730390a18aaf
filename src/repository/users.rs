//! Users repository

use crate::{
    error::{AppError, AppResult},
    models::{role::Role, user::User},
};

use super::{Db, Tables};

/// User record ready for insertion (password already hashed)
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub email: String,
}

/// Field changes for an existing user (password already hashed)
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct UsersRepository {
    db: Db,
}

impl UsersRepository {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Vec<User> {
        self.db.read().await.users.values().cloned().collect()
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.db
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by login name
    pub async fn get_by_username(&self, username: &str) -> Option<User> {
        self.db
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    pub async fn create(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.db.write().await;
        insert_user(&mut tables, user)
    }

    /// Create a user only if the table is still empty. Returns `None` when
    /// someone else got there first.
    pub async fn create_if_empty(&self, user: NewUser) -> AppResult<Option<User>> {
        let mut tables = self.db.write().await;
        if !tables.users.is_empty() {
            return Ok(None);
        }
        insert_user(&mut tables, user).map(Some)
    }

    pub async fn update(&self, id: i32, changes: UserChanges) -> AppResult<User> {
        let mut tables = self.db.write().await;

        if let Some(ref username) = changes.username {
            ensure_username_free(&tables, username, Some(id))?;
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))?;

        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }

        Ok(user.clone())
    }

    /// Delete a user. Their loans are left untouched.
    pub async fn delete(&self, id: i32) -> AppResult<User> {
        self.db
            .write()
            .await
            .users
            .remove(&id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    pub async fn count(&self) -> usize {
        self.db.read().await.users.len()
    }
}

fn insert_user(tables: &mut Tables, user: NewUser) -> AppResult<User> {
    ensure_username_free(tables, &user.username, None)?;

    let created = User {
        id: tables.next_user_id(),
        username: user.username,
        password: user.password_hash,
        role: user.role,
        name: user.name,
        email: user.email,
    };
    tables.users.insert(created.id, created.clone());
    Ok(created)
}

fn ensure_username_free(tables: &Tables, username: &str, except: Option<i32>) -> AppResult<()> {
    let taken = tables
        .users
        .values()
        .any(|u| u.username == username && Some(u.id) != except);

    if taken {
        return Err(AppError::Conflict(format!("Username {} is already taken", username)));
    }
    Ok(())
}
