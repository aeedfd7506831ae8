//! Configuration loaded from environment variables (and `.env`, see [`crate::run`]).

use crate::error::CanteenError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file
    pub database_path: PathBuf,
    pub admin: AdminConfig,
    pub roster: RosterConfig,
    /// Default `tracing` filter when `RUST_LOG` is unset
    pub log_filter: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

/// Which students may log in and order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RosterConfig {
    pub department: String,
    pub years: Vec<u8>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            department: "IS".to_string(),
            years: vec![2, 3],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, CanteenError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Missing required keys are all
    /// reported together.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CanteenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = non_empty("ADMIN_USERNAME");
        let password = non_empty("ADMIN_PASSWORD");

        let missing: Vec<&str> = [("ADMIN_USERNAME", &username), ("ADMIN_PASSWORD", &password)]
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(CanteenError::Config(format!(
                "missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let defaults = RosterConfig::default();
        let years = match non_empty("CANTEEN_YEARS") {
            Some(raw) => parse_years(&raw)?,
            None => defaults.years,
        };

        Ok(Config {
            database_path: non_empty("CANTEEN_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("canteen.db")),
            admin: AdminConfig {
                username: username.unwrap_or_default(),
                password: password.unwrap_or_default(),
            },
            roster: RosterConfig {
                department: non_empty("CANTEEN_DEPARTMENT").unwrap_or(defaults.department),
                years,
            },
            log_filter: non_empty("CANTEEN_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

fn parse_years(raw: &str) -> Result<Vec<u8>, CanteenError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u8>()
                .map_err(|_| CanteenError::Config(format!("invalid CANTEEN_YEARS entry: {part}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            Config::from_lookup(lookup(&[("ADMIN_USERNAME", "admin"), ("ADMIN_PASSWORD", "pw")]))
                .unwrap();

        assert_eq!(config.database_path, PathBuf::from("canteen.db"));
        assert_eq!(config.roster, RosterConfig::default());
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.admin.username, "admin");
    }

    #[test]
    fn test_missing_credentials_listed_together() {
        let err = Config::from_lookup(lookup(&[("ADMIN_PASSWORD", "  ")])).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("ADMIN_USERNAME"));
        assert!(message.contains("ADMIN_PASSWORD"));
    }

    #[test]
    fn test_roster_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "pw"),
            ("CANTEEN_DEPARTMENT", "CS"),
            ("CANTEEN_YEARS", "1, 4"),
            ("CANTEEN_DB_PATH", "/tmp/x.db"),
        ]))
        .unwrap();

        assert_eq!(config.roster.department, "CS");
        assert_eq!(config.roster.years, vec![1, 4]);
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_bad_years_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "pw"),
            ("CANTEEN_YEARS", "2,three"),
        ]));
        assert!(matches!(result, Err(CanteenError::Config(_))));
    }
}
