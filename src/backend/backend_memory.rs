use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use log::{debug, error, info};

use super::{Result, StoreError, UserStore, UserWhere};
use crate::user::{NewUser, User, UserId};

pub struct MemoryBackend {
    users: Mutex<Users>,
}

struct Users {
    list: Vec<User>,
    // ids are never reused, even though nothing deletes users (yet)
    next_id: i64,
}

impl MemoryBackend {
    /// Matches `SqlBackend::new`. Nothing touches the disk, users are
    /// seeded with the demo account and forgotten on exit.
    pub async fn new(data_dir: &Path) -> Self {
        info!(
            "keeping users in memory, ignoring data dir {}",
            data_dir.display()
        );

        Self::with_users(vec![User {
            id: UserId(1),
            username: "kody".into(),
            password: "twixrox".into(),
        }])
    }

    pub fn with_users(list: Vec<User>) -> Self {
        let next_id = list.iter().map(|u| u.id.0).max().unwrap_or(0) + 1;

        Self {
            users: Mutex::new(Users { list, next_id }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Users>> {
        self.users.lock().map_err(|e| {
            error!("user list poisoned: {e}");
            StoreError::Internal
        })
    }
}

impl UserStore for MemoryBackend {
    async fn create(&self, data: NewUser) -> Result<User> {
        let mut users = self.lock()?;

        let user = User {
            id: UserId(users.next_id),
            username: data.username,
            password: data.password,
        };
        users.next_id += 1;
        users.list.push(user.clone());

        debug!("created user {} with id {}", user.username, user.id);
        Ok(user)
    }

    async fn find_unique(&self, by: UserWhere<'_>) -> Result<Option<User>> {
        let users = self.lock()?;

        Ok(users.list.iter().find(|u| by.matches(u)).cloned())
    }
}
