//! Session authentication service

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use rand::Rng;
use tokio::sync::RwLock;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        role::Role,
        user::{CreateUser, User},
    },
    repository::Repository,
};

use super::users::UsersService;

/// Server-side session record
#[derive(Debug, Clone)]
struct Session {
    user_id: i32,
    expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    users: UsersService,
    config: AuthConfig,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl AuthService {
    pub fn new(repository: Repository, users: UsersService, config: AuthConfig) -> Self {
        Self {
            repository,
            users,
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Check credentials and open a session. Returns (session token, user).
    pub async fn login(&self, username: &str, password: &str) -> AppResult<(String, User)> {
        let user = self
            .users
            .get_by_username(username)
            .await
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !self.users.verify_password(&user, password)? {
            tracing::info!("Failed login for {}", username);
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        let token = self.open_session(user.id).await;
        tracing::info!("User {} logged in", user.username);
        Ok((token, user))
    }

    /// Self-registration. Admin and teacher roles can only be claimed while
    /// the store has no users yet.
    pub async fn register(&self, user: CreateUser) -> AppResult<(String, User)> {
        let created = if matches!(user.role, Some(Role::Admin | Role::Teacher)) {
            // Re-checked under the store lock once the password is hashed
            if self.users.count().await > 0 {
                return Err(AppError::Authorization(
                    "Only an administrator can create admin or teacher accounts".to_string(),
                ));
            }
            self.users.create_first_user(user).await?
        } else {
            self.users.create_user(user).await?
        };
        let token = self.open_session(created.id).await;
        Ok((token, created))
    }

    pub async fn logout(&self, token: &str) {
        if let Some(session) = self.sessions.write().await.remove(token) {
            tracing::debug!("Closed session for user {}", session.user_id);
        }
    }

    /// Resolve a session token to the current user
    pub async fn authenticate(&self, token: &str) -> AppResult<User> {
        let session = self
            .sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Authentication("Not logged in".to_string()))?;

        if session.expires_at <= Utc::now() {
            self.sessions.write().await.remove(token);
            return Err(AppError::Authentication("Session expired".to_string()));
        }

        // A deleted account invalidates its sessions
        match self.repository.users.get_by_id(session.user_id).await {
            Ok(user) => Ok(user),
            Err(AppError::NotFound(_)) => {
                self.sessions.write().await.remove(token);
                Err(AppError::Authentication("Not logged in".to_string()))
            }
            Err(e) => Err(e),
        }
    }

    /// Drop sessions past their expiry; returns how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.expires_at > now);
        before - sessions.len()
    }

    async fn open_session(&self, user_id: i32) -> String {
        let token = hex::encode(rand::thread_rng().gen::<[u8; 32]>());
        let session = Session {
            user_id,
            expires_at: Utc::now() + self.config.session_ttl(),
        };
        self.sessions.write().await.insert(token.clone(), session);
        token
    }
}
