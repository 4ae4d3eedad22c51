use std::future::Future;

use crate::user::{NewUser, User, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    Internal,
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Copy)]
pub enum UserWhere<'a> {
    Id(UserId),
    Username(&'a str),
}

/// Where users live. Callers only see this trait, the concrete
/// [`Backend`] is picked at compile time.
pub trait UserStore: Send + Sync + 'static {
    /// Append a user, assigning it a fresh id.
    fn create(&self, data: NewUser) -> impl Future<Output = Result<User>> + Send;

    /// First user matching `by`, in insertion order.
    fn find_unique(&self, by: UserWhere<'_>) -> impl Future<Output = Result<Option<User>>> + Send;
}

impl UserWhere<'_> {
    pub fn matches(&self, user: &User) -> bool {
        match *self {
            UserWhere::Id(id) => user.id == id,
            UserWhere::Username(name) => user.username == name,
        }
    }
}

mod backend_memory;
pub use backend_memory::MemoryBackend;

#[cfg(feature = "backend-sql")]
mod backend_sql;
#[cfg(feature = "backend-sql")]
pub use backend_sql::SqlBackend;

#[cfg(feature = "backend-sql")]
pub type Backend = SqlBackend;
#[cfg(not(feature = "backend-sql"))]
pub type Backend = MemoryBackend;
