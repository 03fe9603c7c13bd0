use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::data::user_repository::UserRepository;
use crate::domain::error::DomainError;
use crate::domain::user::User;

#[derive(Clone, Default)]
pub(crate) struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<i64, User>>>,
}

impl InMemoryUserRepository {
    pub(crate) fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let repo = Self::default();
        for user in users {
            repo.insert(user);
        }
        repo
    }

    pub(crate) fn insert(&self, user: User) {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .insert(user.id, user);
    }

    pub(crate) fn rename(&self, id: i64, name: &str) {
        if let Some(user) = self.users.lock().expect("users mutex poisoned").get_mut(&id) {
            user.name = name.to_string();
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        Ok(self
            .users
            .lock()
            .expect("users mutex poisoned")
            .get(&id)
            .cloned())
    }
}
