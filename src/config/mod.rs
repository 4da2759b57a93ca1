mod basic;
mod upstream;

pub use basic::BasicConfig;
pub use upstream::UpstreamConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Model API settings (see `upstream` table in config.toml).
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "PROMPTDESK_";

impl Config {
    /// Builds a Figment that merges defaults, an optional config TOML file and
    /// `PROMPTDESK_`-prefixed environment variables (`__` splits tables).
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Loads configuration and validates required fields.
    pub fn from_toml() -> Self {
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!(
                "failed to extract configuration from {} / {}*: {err}",
                DEFAULT_CONFIG_FILE, ENV_PREFIX
            )
        });
        if cfg.basic.login_password.trim().is_empty() {
            panic!("basic.login_password must be set and non-empty");
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::providers::{Format, Toml};

    #[test]
    fn defaults_fill_missing_tables() {
        let cfg: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(
                r#"
                [basic]
                login_password = 1234
                listen_port = 9000

                [upstream]
                model = "local-model"
                "#,
            ))
            .extract()
            .unwrap();

        assert_eq!(cfg.basic.login_password, "1234");
        assert_eq!(cfg.basic.listen_port, 9000);
        assert_eq!(cfg.basic.database_url, "sqlite://promptdesk.db");
        assert_eq!(cfg.upstream.model, "local-model");
        assert_eq!(cfg.upstream.idle_timeout_secs, 60);
        assert!(cfg.basic.seed_dir.is_none());
    }

    #[test]
    fn login_password_rejects_tables() {
        let res: Result<Config, _> = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string("[basic.login_password]\nnested = true\n"))
            .extract();
        assert!(res.is_err());
    }
}
