use log::{debug, info};

use crate::backend::{Result, UserStore, UserWhere};
use crate::session::{Redirect, SessionStorage};
use crate::user::{NewUser, User};

pub struct Credentials<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

pub async fn register(store: &impl UserStore, creds: Credentials<'_>) -> Result<User> {
    let user = store
        .create(NewUser {
            username: creds.username.into(),
            password: creds.password.into(),
        })
        .await?;

    info!("registered {} as user {}", user.username, user.id);
    Ok(user)
}

/// The user, if `creds` name one and the password matches.
pub async fn login(store: &impl UserStore, creds: Credentials<'_>) -> Result<Option<User>> {
    let Some(user) = store.find_unique(UserWhere::Username(creds.username)).await? else {
        info!("login: no user {}", creds.username);
        return Ok(None);
    };

    if user.password != creds.password {
        info!("login: wrong password for {}", creds.username);
        return Ok(None);
    }

    Ok(Some(user))
}

/// The user behind a request's session, if any.
pub async fn get_user(
    store: &impl UserStore,
    sessions: &SessionStorage,
    cookie_header: Option<&str>,
) -> std::result::Result<Option<User>, GetUserError> {
    let Some(id) = sessions.get_user_id(cookie_header).map_err(GetUserError::Redirect)? else {
        return Ok(None);
    };

    let user = store
        .find_unique(UserWhere::Id(id))
        .await
        .map_err(|_| GetUserError::Internal)?;

    if user.is_none() {
        debug!("session names unknown user {id}");
    }
    Ok(user)
}

#[derive(Debug)]
pub enum GetUserError {
    Redirect(Redirect),
    Internal,
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::*;
    use crate::backend::MemoryBackend;
    use crate::user::UserId;

    fn creds<'a>(username: &'a str, password: &'a str) -> Credentials<'a> {
        Credentials { username, password }
    }

    #[tokio::test]
    async fn register_then_find() {
        let store = MemoryBackend::new(Path::new(".")).await;

        register(&store, creds("alice", "hunter2")).await.unwrap();

        let found = store
            .find_unique(UserWhere::Username("alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found.password, "hunter2");
    }

    #[tokio::test]
    async fn login_checks_password() {
        let store = MemoryBackend::new(Path::new(".")).await;

        let kody = login(&store, creds("kody", "twixrox")).await.unwrap();
        assert_eq!(kody.map(|u| u.id), Some(UserId(1)));

        assert_eq!(login(&store, creds("kody", "wrong")).await.unwrap(), None);
        assert_eq!(login(&store, creds("nobody", "twixrox")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_user_from_session() {
        let store = MemoryBackend::new(Path::new(".")).await;
        let sessions = SessionStorage::new("hello", false);

        assert_eq!(get_user(&store, &sessions, None).await.unwrap(), None);

        let redirect = sessions.create_user_session(UserId(1), "/").unwrap();
        let set_cookie = redirect.set_cookie.unwrap();
        let header = cookie::Cookie::parse(set_cookie).unwrap().stripped().to_string();

        let user = get_user(&store, &sessions, Some(&header)).await.unwrap();
        assert_eq!(user.map(|u| u.username), Some("kody".to_string()));

        let redirect = sessions.create_user_session(UserId(99), "/").unwrap();
        let set_cookie = redirect.set_cookie.unwrap();
        let header = cookie::Cookie::parse(set_cookie).unwrap().stripped().to_string();
        assert_eq!(get_user(&store, &sessions, Some(&header)).await.unwrap(), None);
    }
}
