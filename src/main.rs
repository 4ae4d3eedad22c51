use std::env;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};

use rjlogin::args::Args;
use rjlogin::backend::Backend;
use rjlogin::login::Login;
use rjlogin::routes::routes;
use rjlogin::session::SessionStorage;

#[tokio::main]
async fn main() {
    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&env::var("RUST_LOG").unwrap_or_else(|_| "rjlogin=info".into()))
        .init();

    let args = Args::parse();

    let addr = match args.addr() {
        Ok(addr) => addr,
        Err(e) => {
            error!("invalid address: {e}");
            std::process::exit(2);
        }
    };

    if args.using_dev_secret() {
        warn!("SESSION_SECRET not set, signing sessions with the development secret");
    }
    if !args.secure() {
        info!("session cookies won't be marked secure, pass --secure when serving over https");
    }

    let backend = Backend::new(args.data_dir()).await;
    let sessions = SessionStorage::new(args.session_secret(), args.secure());
    let login = Arc::new(Login::new(backend, sessions));

    info!("listening on {addr}");
    warp::serve(routes(login)).run(addr).await;
}
