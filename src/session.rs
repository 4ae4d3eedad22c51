use base64_light::{base64_decode, base64_encode};
use cookie::{Cookie, CookieBuilder, CookieJar, Key, SameSite};
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use time::Duration;

use crate::user::UserId;

pub const SESSION_COOKIE: &str = "RJ_session";
const USER_ID: &str = "userId";
const MAX_AGE: Duration = Duration::days(30);

/// The key/value bag stored (signed) in the session cookie.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session(Map<String, Value>);

/// Where to send the browser next, possibly with a session change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub set_cookie: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    Encode,
    Decode,
    Sign,
}

pub struct SessionStorage {
    key: Key,
    secure: bool,
}

impl Session {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn encode(&self) -> Result<String, SessionError> {
        serde_json::to_string(&self.0)
            .map(|json| base64_encode(&json))
            .map_err(|e| {
                error!("couldn't encode session: {e:?}");
                SessionError::Encode
            })
    }

    fn decode(value: &str) -> Result<Self, SessionError> {
        serde_json::from_slice(&base64_decode(value))
            .map(Self)
            .map_err(|e| {
                warn!("couldn't decode session: {e:?}");
                SessionError::Decode
            })
    }
}

impl Redirect {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            set_cookie: None,
        }
    }

    pub fn with_cookie(mut self, set_cookie: String) -> Self {
        self.set_cookie = Some(set_cookie);
        self
    }
}

impl SessionStorage {
    /// `secure` marks the cookie `Secure`, which only works over https
    /// (Safari refuses it on plain-http localhost).
    pub fn new(secret: &str, secure: bool) -> Self {
        // 64 hex digits, exactly what a signing key needs
        let key = Key::from(sha256::digest(secret).as_bytes());

        Self { key, secure }
    }

    fn cookie(&self, value: String) -> CookieBuilder<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
    }

    /// The session carried by a request's `Cookie` header. Missing,
    /// forged or garbled cookies all read as an empty session.
    pub fn get_session(&self, cookie_header: Option<&str>) -> Session {
        let Some(header) = cookie_header else {
            return Session::default();
        };

        let mut jar = CookieJar::new();
        for cookie in Cookie::split_parse(header).filter_map(Result::ok) {
            if cookie.name() == SESSION_COOKIE {
                jar.add_original(cookie.into_owned());
            }
        }

        match jar.signed(&self.key).get(SESSION_COOKIE) {
            Some(cookie) => Session::decode(cookie.value()).unwrap_or_default(),
            None => {
                debug!("no verifiable session cookie");
                Session::default()
            }
        }
    }

    /// `Set-Cookie` value storing `session`.
    pub fn commit_session(&self, session: &Session) -> Result<String, SessionError> {
        let cookie = self.cookie(session.encode()?).max_age(MAX_AGE);

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);

        jar.get(SESSION_COOKIE)
            .map(|signed| signed.to_string())
            .ok_or_else(|| {
                error!("signed session cookie went missing");
                SessionError::Sign
            })
    }

    /// `Set-Cookie` value clearing the session.
    pub fn destroy_session(&self) -> String {
        let mut cookie = self.cookie(String::new()).build();
        cookie.make_removal();
        cookie.to_string()
    }

    /// `Ok(None)` when nobody is logged in. A session holding a string id
    /// which doesn't even start with a number is logged out.
    pub fn get_user_id(&self, cookie_header: Option<&str>) -> Result<Option<UserId>, Redirect> {
        let session = self.get_session(cookie_header);

        let id = match session.get(USER_ID) {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => match s.trim().parse() {
                Ok(id) => Some(id),
                Err(_) if has_int_prefix(s) => {
                    debug!("user id {s:?} in session isn't a whole number");
                    None
                }
                Err(_) => {
                    warn!("non-numeric user id {s:?} in session, logging out");
                    return Err(self.logout());
                }
            },
            _ => None,
        };

        Ok(id.filter(|&id| id != 0).map(UserId))
    }

    /// The logged in user's id, or a redirect to the login page which
    /// will send them back to `redirect_to` afterwards.
    pub fn require_user_id(
        &self,
        cookie_header: Option<&str>,
        redirect_to: &str,
    ) -> Result<UserId, Redirect> {
        match self.get_user_id(cookie_header)? {
            Some(id) => Ok(id),
            None => {
                let query = serde_urlencoded::to_string([("redirectTo", redirect_to)]).map_err(|e| {
                    error!("couldn't encode redirect {redirect_to:?}: {e:?}");
                    Redirect::to("/login")
                })?;

                debug!("no user, redirecting to login (then {redirect_to})");
                Err(Redirect::to(format!("/login?{query}")))
            }
        }
    }

    pub fn logout(&self) -> Redirect {
        info!("logout");
        Redirect::to("/login").with_cookie(self.destroy_session())
    }

    pub fn create_user_session(&self, user_id: UserId, redirect_to: &str) -> Result<Redirect, SessionError> {
        let mut session = Session::default();
        session.set(USER_ID, user_id.0);

        let set_cookie = self.commit_session(&session)?;

        info!("session created for user {user_id}, redirecting to {redirect_to}");
        Ok(Redirect::to(redirect_to).with_cookie(set_cookie))
    }
}

// "12abc" has one, "abc" and "" don't
fn has_int_prefix(s: &str) -> bool {
    let s = s.trim_start();
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    s.starts_with(|c: char| c.is_ascii_digit())
}
