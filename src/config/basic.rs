use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// HTTP server listen address (e.g., "0.0.0.0", "127.0.0.1").
    /// TOML: `basic.listen_addr`. Default: `0.0.0.0`.
    #[serde(default = "default_listen_ip")]
    pub listen_addr: IpAddr,

    /// HTTP server listen port.
    /// TOML: `basic.listen_port`. Default: `8188`.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Database URL for SQLite.
    /// TOML: `basic.database_url`. Default: `sqlite://promptdesk.db`.
    #[serde(default)]
    pub database_url: String,

    /// Log level for tracing subscriber initialization (e.g., "error", "warn", "info", "debug", "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default)]
    pub loglevel: String,

    /// Shared password for the login page (required, non-empty).
    /// TOML: `basic.login_password`. Must be provided.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub login_password: String,

    /// Drop the `Secure` flag from the session cookie (plain-HTTP deployments).
    /// TOML: `basic.insecure_cookie`. Default: `false`.
    #[serde(default)]
    pub insecure_cookie: bool,

    /// Session lifetime in hours.
    /// TOML: `basic.session_ttl_hours`. Default: `12`.
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,

    /// Login attempts accepted per minute across all clients.
    /// TOML: `basic.login_attempts_per_minute`. Default: `10`.
    #[serde(default = "default_login_attempts_per_minute")]
    pub login_attempts_per_minute: u32,

    /// Directory served as the web UI.
    /// TOML: `basic.static_dir`. Default: `public`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// Optional directory of `*.txt`/`*.md` files used to seed config entries on first boot.
    /// TOML: `basic.seed_dir`. Default: unset (skip seeding).
    #[serde(default)]
    pub seed_dir: Option<PathBuf>,

    /// Max number of templates kept in the read-through cache.
    /// TOML: `basic.template_cache_capacity`. Default: `256`.
    #[serde(default = "default_template_cache_capacity")]
    pub template_cache_capacity: u64,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_ip(),
            listen_port: default_listen_port(),
            database_url: "sqlite://promptdesk.db".to_string(),
            loglevel: "info".to_string(),
            // No insecure default. `Config::from_toml()` enforces non-empty.
            login_password: "".to_string(),
            insecure_cookie: false,
            session_ttl_hours: default_session_ttl_hours(),
            login_attempts_per_minute: default_login_attempts_per_minute(),
            static_dir: default_static_dir(),
            seed_dir: None,
            template_cache_capacity: default_template_cache_capacity(),
        }
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for basic.login_password",
        )),
    }
}

/// Default IP address for the HTTP server listen address.
fn default_listen_ip() -> IpAddr {
    Ipv4Addr::new(0, 0, 0, 0).into()
}

/// Default port for the HTTP server.
fn default_listen_port() -> u16 {
    8188
}

fn default_session_ttl_hours() -> u32 {
    12
}

fn default_login_attempts_per_minute() -> u32 {
    10
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_template_cache_capacity() -> u64 {
    256
}
