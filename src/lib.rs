pub mod args;
pub mod auth;
pub mod backend;
pub mod form;
pub mod login;
pub mod page;
pub mod pointer;
pub mod routes;
pub mod session;
pub mod user;
