use std::fmt;

use crate::error::BrokerError;

pub const API_KEY_VAR: &str = "ALPACA_API_KEY";
pub const SECRET_KEY_VAR: &str = "ALPACA_SECRET_KEY";

/// Vendor key pair. Only ever sourced from the environment.
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn from_env() -> Result<Self, BrokerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, BrokerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| {
                    BrokerError::Config(format!("{var} environment variable is required"))
                })
        };

        Ok(Self {
            api_key: require(API_KEY_VAR)?,
            secret_key: require(SECRET_KEY_VAR)?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_both_keys() {
        let creds = Credentials::from_lookup(|key| match key {
            API_KEY_VAR => Some("PKTEST".to_string()),
            SECRET_KEY_VAR => Some("s3cret".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(creds.api_key, "PKTEST");
        assert_eq!(creds.secret_key, "s3cret");
    }

    #[test]
    fn missing_secret_is_a_config_error() {
        let err = Credentials::from_lookup(|key| match key {
            API_KEY_VAR => Some("PKTEST".to_string()),
            _ => None,
        })
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration error: ALPACA_SECRET_KEY environment variable is required"
        );
    }

    #[test]
    fn blank_key_counts_as_missing() {
        let err = Credentials::from_lookup(|_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, BrokerError::Config(_)));
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::new("PKTEST", "s3cret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("PKTEST"));
        assert!(!debug.contains("s3cret"));
    }
}
