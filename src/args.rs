use std::net::{AddrParseError, IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::Parser;

pub const DEV_SESSION_SECRET: &str = "hello";

#[derive(Parser, Debug)]
pub struct Args {
    /// Whether clients connect over https (i.e. production).
    /// If so, the session cookie is sent as a secure cookie.
    #[arg(short, long)]
    secure: bool,

    /// The address to listen on. By default just the IPv4 loopback.
    #[arg(short, long)]
    address: Option<String>,

    /// The port to listen on.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// Where the sqlite database lives, when built with `backend-sql`.
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Secret used to sign session cookies.
    #[arg(long, env = "SESSION_SECRET", default_value = DEV_SESSION_SECRET, hide_env_values = true)]
    session_secret: String,
}

impl Args {
    pub fn addr(&self) -> Result<SocketAddr, AddrParseError> {
        self.address
            .as_deref()
            .unwrap_or("127.0.0.1")
            .parse()
            .map(|addr: IpAddr| (addr, self.port).into())
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn session_secret(&self) -> &str {
        &self.session_secret
    }

    pub fn using_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}
