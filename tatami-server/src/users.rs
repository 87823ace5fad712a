use async_trait::async_trait;
use dashmap::DashMap;
use thiserror::Error;
use crate::domain;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("User store unavailable: {0}")]
    Unavailable(String),
}

pub type UserResult<T> = Result<T, UserStoreError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// The user's email address.
    pub login: String,
    /// Id of the user's current avatar blob.
    pub avatar: Option<String>,
}

impl User {
    pub fn new(login: impl Into<String>) -> Self {
        Self { login: login.into(), avatar: None }
    }

    pub fn username(&self) -> Option<&str> {
        domain::username_from_email(&self.login)
    }

    pub fn domain(&self) -> &str {
        domain::domain_from_email(&self.login)
    }
}

/// Where user records live. Authentication happens upstream; this only resolves
/// an already authenticated login to its record.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_current(&self, login: &str) -> UserResult<Option<User>>;

    /// Replaces the stored record for `user.login`. Last write wins.
    async fn save(&self, user: User) -> UserResult<()>;
}

/// Users are owned by another system, so a login seen for the first time gets
/// an empty record instead of being rejected.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<String, User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get_current(&self, login: &str) -> UserResult<Option<User>> {
        let user = self
            .users
            .entry(login.to_string())
            .or_insert_with(|| User::new(login))
            .clone();
        Ok(Some(user))
    }

    async fn save(&self, user: User) -> UserResult<()> {
        self.users.insert(user.login.clone(), user);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_provisions_unknown_login() {
        let store = InMemoryUserStore::new();
        let user = store.get_current("jdoe@ippon.fr").await.unwrap().unwrap();

        assert_eq!(user, User::new("jdoe@ippon.fr"));
        assert_eq!(user.username(), Some("jdoe"));
        assert_eq!(user.domain(), "ippon.fr");
    }

    #[tokio::test]
    async fn test_save_replaces_avatar() {
        let store = InMemoryUserStore::new();
        let mut user = store.get_current("jdoe@ippon.fr").await.unwrap().unwrap();

        user.avatar = Some("first".to_string());
        store.save(user.clone()).await.unwrap();
        user.avatar = Some("second".to_string());
        store.save(user).await.unwrap();

        let stored = store.get_current("jdoe@ippon.fr").await.unwrap().unwrap();
        assert_eq!(stored.avatar.as_deref(), Some("second"));
    }
}
