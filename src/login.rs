use std::result;

use log::{error, info, trace};
use warp::http;

use crate::auth::{self, Credentials, GetUserError};
use crate::backend::{StoreError, UserStore, UserWhere};
use crate::form::{self, FormData, FormError, LoginFormFields, LoginType};
use crate::session::{Redirect, SessionError, SessionStorage};
use crate::user::User;

pub struct Login<S> {
    store: S,
    sessions: SessionStorage,
}

#[derive(Copy, Clone, Debug)]
pub enum Error {
    Internal,
    BadRequest,
}

pub type Result<T> = result::Result<T, Error>;

/// Why a form submission didn't log anyone in.
#[derive(Debug)]
pub enum SubmitError {
    Form(FormError),
    Internal(Error),
}

/// What a request for a protected page gets.
pub enum Access {
    Granted(User),
    Redirect(Redirect),
}

impl From<Error> for http::StatusCode {
    fn from(e: Error) -> Self {
        match e {
            Error::Internal => http::StatusCode::INTERNAL_SERVER_ERROR,
            Error::BadRequest => http::StatusCode::BAD_REQUEST,
        }
    }
}

impl From<StoreError> for Error {
    fn from(_: StoreError) -> Self {
        Error::Internal
    }
}

impl From<SessionError> for Error {
    fn from(_: SessionError) -> Self {
        Error::Internal
    }
}

impl warp::reject::Reject for Error {}

impl From<FormError> for SubmitError {
    fn from(e: FormError) -> Self {
        SubmitError::Form(e)
    }
}

impl From<Error> for SubmitError {
    fn from(e: Error) -> Self {
        SubmitError::Internal(e)
    }
}

impl<S: UserStore> Login<S> {
    pub fn new(store: S, sessions: SessionStorage) -> Self {
        Self { store, sessions }
    }

    /// Already logged in visitors have no business on the login page.
    pub async fn route_data(&self, cookie_header: Option<&str>) -> Result<Option<Redirect>> {
        match auth::get_user(&self.store, &self.sessions, cookie_header).await {
            Ok(Some(user)) => {
                trace!("{} already logged in", user.username);
                Ok(Some(Redirect::to("/")))
            }
            Ok(None) => Ok(None),
            Err(GetUserError::Redirect(r)) => Ok(Some(r)),
            Err(GetUserError::Internal) => Err(Error::Internal),
        }
    }

    pub async fn submit(
        &self,
        form: &FormData,
    ) -> result::Result<Redirect, SubmitError> {
        let form::Submission {
            fields,
            redirect_to,
        } = form::validate_submission(form)?;

        match fields.login_type {
            LoginType::Login => self.try_logging_in(fields, &redirect_to).await,
            LoginType::Register => self.try_registering(fields, &redirect_to).await,
        }
    }

    async fn try_logging_in(
        &self,
        fields: LoginFormFields,
        redirect_to: &str,
    ) -> result::Result<Redirect, SubmitError> {
        let user = auth::login(&self.store, credentials(&fields))
            .await
            .map_err(Error::from)?;

        let Some(user) = user else {
            return Err(
                FormError::new("Username/Password combination is incorrect")
                    .with_fields(fields)
                    .into(),
            );
        };

        self.create_session(&user, redirect_to)
    }

    async fn try_registering(
        &self,
        fields: LoginFormFields,
        redirect_to: &str,
    ) -> result::Result<Redirect, SubmitError> {
        let existing = self
            .store
            .find_unique(UserWhere::Username(&fields.username))
            .await
            .map_err(Error::from)?;

        if existing.is_some() {
            info!("register: {} already taken", fields.username);
            return Err(FormError::new(format!(
                "User with username {} already exists",
                fields.username
            ))
            .with_fields(fields)
            .into());
        }

        let user = match auth::register(&self.store, credentials(&fields)).await {
            Ok(user) => user,
            Err(e) => {
                error!("couldn't register {}: {e:?}", fields.username);
                return Err(
                    FormError::new("Something went wrong trying to create a new user.")
                        .with_fields(fields)
                        .into(),
                );
            }
        };

        self.create_session(&user, redirect_to)
    }

    fn create_session(
        &self,
        user: &User,
        redirect_to: &str,
    ) -> result::Result<Redirect, SubmitError> {
        let redirect = self
            .sessions
            .create_user_session(user.id, redirect_to)
            .map_err(Error::from)?;

        Ok(redirect)
    }

    /// The logged in user, or where to send a visitor who isn't one.
    pub async fn require_user(&self, cookie_header: Option<&str>, redirect_to: &str) -> Result<Access> {
        let id = match self.sessions.require_user_id(cookie_header, redirect_to) {
            Ok(id) => id,
            Err(redirect) => return Ok(Access::Redirect(redirect)),
        };

        match self.store.find_unique(UserWhere::Id(id)).await? {
            Some(user) => Ok(Access::Granted(user)),
            None => {
                // the session outlived its user (in-memory store restarted)
                info!("session for unknown user {id}");
                Ok(Access::Redirect(self.sessions.logout()))
            }
        }
    }

    pub fn logout(&self) -> Redirect {
        self.sessions.logout()
    }
}

fn credentials(fields: &LoginFormFields) -> Credentials<'_> {
    Credentials {
        username: &fields.username,
        password: &fields.password,
    }
}
