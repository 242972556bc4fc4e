use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::identity::IdentityConfig;

pub const DEFAULT_LOG_FILTER: &str = "learntrack=info,axum=info,tower_http=info";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_filter: String,
    /// Absent means the process-local store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub seed_catalog: Option<PathBuf>,
    pub identity: IdentityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8081,
            log_filter: DEFAULT_LOG_FILTER.into(),
            database_url: None,
            db_max_connections: 5,
            seed_catalog: None,
            identity: IdentityConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            host: parsed("HOST").unwrap_or(d.host),
            port: parsed("PORT").unwrap_or(d.port),
            log_filter: env::var("RUST_LOG").unwrap_or(d.log_filter),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            db_max_connections: parsed("DB_MAX_CONNECTIONS").unwrap_or(d.db_max_connections),
            seed_catalog: env::var("SEED_CATALOG")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            identity: IdentityConfig {
                token_lifetime_minutes: parsed("TOKEN_LIFETIME_MINUTES")
                    .unwrap_or(d.identity.token_lifetime_minutes),
            },
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}
