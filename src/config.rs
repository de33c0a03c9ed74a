//! Runtime configuration, read from the environment with defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_PATH: &str = "todo.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file, created on first start (`TODOS_DATABASE_PATH`)
    pub database_path: PathBuf,
    /// Listen address of the HTTP server (`TODOS_BIND_ADDR`)
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_path = lookup("TODOS_DATABASE_PATH")
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH), PathBuf::from);

        let bind_addr = lookup("TODOS_BIND_ADDR")
            .and_then(|value| match value.parse() {
                Ok(addr) => Some(addr),
                Err(_) => {
                    tracing::warn!(%value, "invalid TODOS_BIND_ADDR, using {DEFAULT_BIND_ADDR}");
                    None
                }
            })
            .unwrap_or_else(default_bind_addr);

        Self {
            database_path,
            bind_addr,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}
