use std::env;
use std::time::Duration;

use crate::error::{GovernanceError, Result};
use crate::voting::tally::UnanimityPolicy;

const DEFAULT_DATABASE_URL: &str = "sqlite:board_governance.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub deadline_check_interval: Duration,
    pub unanimity: UnanimityPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            deadline_check_interval: Duration::from_secs(DEFAULT_CHECK_INTERVAL_SECS),
            unanimity: UnanimityPolicy::default(),
        }
    }
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_positive(&raw, "DATABASE_MAX_CONNECTIONS")? as u32,
            None => defaults.max_connections,
        };

        let deadline_check_interval = match lookup("DEADLINE_CHECK_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(parse_positive(&raw, "DEADLINE_CHECK_INTERVAL_SECS")?),
            None => defaults.deadline_check_interval,
        };

        let unanimity = match lookup("UNANIMITY_POLICY") {
            Some(raw) => raw.parse()?,
            None => defaults.unanimity,
        };

        Ok(Self {
            database_url,
            max_connections,
            deadline_check_interval,
            unanimity,
        })
    }
}

fn parse_positive(raw: &str, key: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 && value <= u32::MAX as u64 => Ok(value),
        _ => Err(GovernanceError::Validation(format!(
            "{} must be a positive integer, got '{}'",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.deadline_check_interval, Duration::from_secs(60));
        assert_eq!(config.unanimity, UnanimityPolicy::AllApprove);
    }

    #[test]
    fn values_are_read_from_lookup() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "sqlite::memory:"),
            ("DATABASE_MAX_CONNECTIONS", "1"),
            ("DEADLINE_CHECK_INTERVAL_SECS", "15"),
            ("UNANIMITY_POLICY", "no_rejections"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.max_connections, 1);
        assert_eq!(config.deadline_check_interval, Duration::from_secs(15));
        assert_eq!(config.unanimity, UnanimityPolicy::NoRejections);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_MAX_CONNECTIONS", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DEADLINE_CHECK_INTERVAL_SECS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("UNANIMITY_POLICY", "majority")])).is_err());
    }
}
