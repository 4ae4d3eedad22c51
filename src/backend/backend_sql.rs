use std::path::{Path, PathBuf};

use sqlx::{migrate::MigrateDatabase, query, query_as, Pool, Sqlite, SqlitePool};

use log::{debug, error, info};

use super::{Result, StoreError, UserStore, UserWhere};
use crate::user::{NewUser, User, UserId};

pub struct SqlBackend(pub Pool<Sqlite>);

fn into_sql(path: &Path) -> PathBuf {
    path.join("users.sql")
}

impl SqlBackend {
    pub async fn new(data_dir: &Path) -> Self {
        let url = format!(
            "sqlite://{}",
            into_sql(data_dir).to_str().expect("non utf-8 data dir")
        );

        if !Sqlite::database_exists(&url).await.unwrap_or(false) {
            info!("creating {url}");
            Sqlite::create_database(&url)
                .await
                .unwrap_or_else(|e| panic!("error creating database: {e}"));
        }

        let pool = SqlitePool::connect(&url).await.expect("db connection");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("migration");

        info!("using {url}");
        Self(pool)
    }
}

impl UserStore for SqlBackend {
    async fn create(&self, data: NewUser) -> Result<User> {
        let id = query(
            "
            INSERT INTO users (username, password)
            VALUES (?, ?)
            ",
        )
        .bind(&data.username)
        .bind(&data.password)
        .execute(&self.0)
        .await
        .map_err(|e| {
            error!("couldn't create user {}: {e:?}", data.username);
            StoreError::Internal
        })?
        .last_insert_rowid();

        debug!("created user {} with id {id}", data.username);

        Ok(User {
            id: UserId(id),
            username: data.username,
            password: data.password,
        })
    }

    async fn find_unique(&self, by: UserWhere<'_>) -> Result<Option<User>> {
        let q = match by {
            UserWhere::Id(id) => query_as::<_, User>(
                "
                SELECT id, username, password
                FROM users
                WHERE id = ?
                ORDER BY id
                LIMIT 1
                ",
            )
            .bind(id),
            UserWhere::Username(username) => query_as::<_, User>(
                "
                SELECT id, username, password
                FROM users
                WHERE username = ?
                ORDER BY id
                LIMIT 1
                ",
            )
            .bind(username),
        };

        q.fetch_optional(&self.0).await.map_err(|e| {
            error!("couldn't look up user by {by:?}: {e:?}");
            StoreError::Internal
        })
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    use sqlx::sqlite::SqlitePoolOptions;

    pub async fn create_db() -> Pool<Sqlite> {
        // one connection, otherwise each gets its own empty in-memory db
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        sqlx::migrate!("./migrations").run(&db).await.unwrap();

        db
    }

    #[tokio::test]
    async fn create_then_find() {
        let backend = SqlBackend(create_db().await);

        let user = backend
            .create(NewUser {
                username: "alice".into(),
                password: "password1".into(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, UserId(2)); // after the seeded kody

        let by_name = backend
            .find_unique(UserWhere::Username("alice"))
            .await
            .unwrap();
        assert_eq!(by_name.as_ref(), Some(&user));

        let by_id = backend.find_unique(UserWhere::Id(user.id)).await.unwrap();
        assert_eq!(by_id, Some(user));
    }

    #[tokio::test]
    async fn seeded_with_demo_user() {
        let backend = SqlBackend(create_db().await);

        let kody = backend
            .find_unique(UserWhere::Username("kody"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(kody.id, UserId(1));
    }
}
