use std::convert::Infallible;
use std::sync::Arc;

use log::{debug, error, warn};
use serde::Deserialize;
use warp::http::{header, Response, StatusCode};
use warp::{reply, Filter, Rejection, Reply};

use crate::backend::UserStore;
use crate::login::{Access, Error, Login, SubmitError};
use crate::form;
use crate::page;
use crate::pointer::{self, ReplayRequest};
use crate::session::Redirect;

#[derive(Debug, Deserialize)]
struct LoginQuery {
    #[serde(rename = "redirectTo")]
    redirect_to: Option<String>,
}

pub fn routes<S: UserStore>(
    login: Arc<Login<S>>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let with_login = warp::any().map(move || Arc::clone(&login));
    let cookie = warp::header::optional::<String>("cookie");

    let login_page = warp::path!("login")
        .and(warp::get())
        .and(warp::query::<LoginQuery>())
        .and(cookie.clone())
        .and(with_login.clone())
        .and_then(login_page::<S>);

    let login_submit = warp::path!("login")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::form::<Vec<(String, String)>>())
        .and(with_login.clone())
        .and_then(login_submit::<S>);

    let index = warp::path::end()
        .and(warp::get())
        .and(cookie)
        .and(with_login.clone())
        .and_then(index::<S>);

    let logout = warp::path!("logout")
        .and(warp::post())
        .and(with_login)
        .and_then(|login: Arc<Login<S>>| async move { redirect(login.logout()) });

    let pointer = warp::path!("api" / "pointer")
        .and(warp::post())
        .and(warp::body::content_length_limit(64 * 1024))
        .and(warp::body::json::<ReplayRequest>())
        .and_then(pointer_replay);

    login_page
        .or(login_submit)
        .or(index)
        .or(logout)
        .or(pointer)
        .recover(handle_rejection)
        .with(warp::log("rjlogin"))
}

async fn login_page<S: UserStore>(
    query: LoginQuery,
    cookie: Option<String>,
    login: Arc<Login<S>>,
) -> Result<reply::Response, Rejection> {
    match login.route_data(cookie.as_deref()).await {
        Ok(Some(r)) => redirect(r),
        Ok(None) => {
            let redirect_to = query.redirect_to.as_deref().unwrap_or("/");
            Ok(html(StatusCode::OK, page::login(redirect_to, None)))
        }
        Err(e) => Err(warp::reject::custom(e)),
    }
}

async fn login_submit<S: UserStore>(
    body: Vec<(String, String)>,
    login: Arc<Login<S>>,
) -> Result<reply::Response, Rejection> {
    match login.submit(&body).await {
        Ok(r) => redirect(r),
        Err(SubmitError::Form(e)) => {
            debug!("login form rejected: {e}");
            let redirect_to = form::redirect_to(&body);
            Ok(html(StatusCode::BAD_REQUEST, page::login(redirect_to, Some(&e))))
        }
        Err(SubmitError::Internal(e)) => Err(warp::reject::custom(e)),
    }
}

async fn index<S: UserStore>(
    cookie: Option<String>,
    login: Arc<Login<S>>,
) -> Result<reply::Response, Rejection> {
    match login
        .require_user(cookie.as_deref(), "/")
        .await
        .map_err(warp::reject::custom)?
    {
        Access::Granted(user) => Ok(html(StatusCode::OK, page::index(&user))),
        Access::Redirect(r) => redirect(r),
    }
}

async fn pointer_replay(req: ReplayRequest) -> Result<reply::Response, Rejection> {
    pointer::replay(req)
        .map(|snapshot| reply::json(&snapshot).into_response())
        .map_err(|e| {
            warn!("pointer replay: {e}");
            warp::reject::custom(Error::BadRequest)
        })
}

fn html(status: StatusCode, body: String) -> reply::Response {
    reply::with_status(reply::html(body), status).into_response()
}

fn redirect(r: Redirect) -> Result<reply::Response, Rejection> {
    let mut builder = Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, &r.location);

    if let Some(ref set_cookie) = r.set_cookie {
        builder = builder.header(header::SET_COOKIE, set_cookie);
    }

    builder
        .body(String::new())
        .map(Reply::into_response)
        .map_err(|e| {
            error!("couldn't redirect to {:?}: {e:?}", r.location);
            warp::reject::custom(Error::BadRequest)
        })
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else if let Some(&e) = err.find::<Error>() {
        e.into()
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        StatusCode::METHOD_NOT_ALLOWED
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        debug!("unhandled rejection: {err:?}");
        StatusCode::BAD_REQUEST
    };

    Ok(reply::with_status(
        status.canonical_reason().unwrap_or(""),
        status,
    ))
}
