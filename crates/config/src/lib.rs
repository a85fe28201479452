use std::env;
use thiserror::Error;

pub const DEFAULT_MINIMUM_AGE: u32 = 18;
const MINIMUM_AGE_RANGE: std::ops::RangeInclusive<u32> = 1..=99;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid API_PORT '{0}'")]
    InvalidPort(String),

    #[error("Age has to be >0 <=99, got '{0}'; valid age default is 18")]
    InvalidMinimumAge(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub minimum_age: u32,
}

impl Config {
    /// Load configuration from the environment, after merging a `.env` file
    /// if one exists.
    ///
    /// A bad `MINIMUM_AGE` does not stop startup: it is logged and replaced
    /// by the default.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let api_port = match env::var("API_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => 8080,
        };

        let minimum_age = parse_minimum_age(env::var("MINIMUM_AGE").ok().as_deref())
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Falling back to default minimum age");
                DEFAULT_MINIMUM_AGE
            });

        Ok(Config {
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "users.db".to_string()),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port,
            minimum_age,
        })
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

/// `None` selects the default; anything else must be an integer in 1..=99.
pub fn parse_minimum_age(raw: Option<&str>) -> Result<u32, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_MINIMUM_AGE);
    };
    match raw.trim().parse::<u32>() {
        Ok(age) if MINIMUM_AGE_RANGE.contains(&age) => Ok(age),
        _ => Err(ConfigError::InvalidMinimumAge(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimum_age_defaults_when_unset() {
        assert_eq!(parse_minimum_age(None), Ok(DEFAULT_MINIMUM_AGE));
    }

    #[test]
    fn test_minimum_age_accepts_range_bounds() {
        assert_eq!(parse_minimum_age(Some("1")), Ok(1));
        assert_eq!(parse_minimum_age(Some(" 21 ")), Ok(21));
        assert_eq!(parse_minimum_age(Some("99")), Ok(99));
    }

    #[test]
    fn test_minimum_age_rejects_out_of_range_and_garbage() {
        for raw in ["0", "100", "-5", "eighteen", ""] {
            assert_eq!(
                parse_minimum_age(Some(raw)),
                Err(ConfigError::InvalidMinimumAge(raw.to_string())),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_api_address() {
        let config = Config {
            database_url: "users.db".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: 3000,
            minimum_age: DEFAULT_MINIMUM_AGE,
        };
        assert_eq!(config.api_address(), "127.0.0.1:3000");
    }
}
