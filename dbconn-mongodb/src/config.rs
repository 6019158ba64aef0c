//! Connection settings for [`MongoConnector`](crate::MongoConnector).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use dbconn_core::error::{DbError, DbResult};

/// Environment variable holding the MongoDB connection URL.
pub const URL_ENV_VAR: &str = "MONGO_CLIENT_ID";

/// Everything needed to connect to a MongoDB deployment.
///
/// Timeouts left unset fall back to the driver's defaults.
///
/// ```ignore
/// let config = MongoConfig::new("mongodb://localhost:27017", "app")
///     .app_name("billing")
///     .connect_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoConfig {
    pub url: String,
    pub database: String,
    pub app_name: Option<String>,
    pub connect_timeout: Option<Duration>,
    pub server_selection_timeout: Option<Duration>,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            app_name: None,
            connect_timeout: None,
            server_selection_timeout: None,
        }
    }

    /// Reads the connection URL from the `MONGO_CLIENT_ID` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Initialization`] if the variable is unset or empty.
    pub fn from_env(database: impl Into<String>) -> DbResult<Self> {
        Self::from_url_var(database, std::env::var(URL_ENV_VAR).ok())
    }

    fn from_url_var(database: impl Into<String>, url: Option<String>) -> DbResult<Self> {
        match url {
            Some(url) if !url.trim().is_empty() => Ok(Self::new(url, database)),
            _ => Err(DbError::Initialization(format!(
                "{URL_ENV_VAR} is not set"
            ))),
        }
    }

    /// Name reported to the server in the connection handshake.
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn setters_fill_optional_fields() {
        let config = MongoConfig::new("mongodb://localhost:27017", "app")
            .app_name("billing")
            .connect_timeout(Duration::from_secs(5))
            .server_selection_timeout(Duration::from_secs(2));

        assert_eq!(config.url, "mongodb://localhost:27017");
        assert_eq!(config.database, "app");
        assert_eq!(config.app_name.as_deref(), Some("billing"));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.server_selection_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn url_variable_becomes_the_connection_url() {
        let config = MongoConfig::from_url_var("app", Some("mongodb://db:27017".to_string())).unwrap();

        assert_eq!(config, MongoConfig::new("mongodb://db:27017", "app"));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some("   ".to_string()))]
    fn missing_url_variable_is_an_initialization_error(#[case] url: Option<String>) {
        let err = MongoConfig::from_url_var("app", url).unwrap_err();

        assert!(matches!(err, DbError::Initialization(_)));
    }
}
