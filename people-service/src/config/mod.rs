use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_DATABASE: &str = "people_db";
pub const DEFAULT_COLLECTION: &str = "people";

#[derive(Debug, Clone)]
pub struct PeopleConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Connection string; required for the mongo backend.
    pub uri: Option<String>,
    /// Overrides the database named in `uri`.
    pub database: Option<String>,
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreBackend {
    Mongo,
    Memory,
}

impl PeopleConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, configuration file and PORT)
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let backend: StoreBackend = get_env("STORE_BACKEND", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let uri = match backend {
            StoreBackend::Mongo => Some(get_env("DATABASE_URL", None, is_prod)?),
            StoreBackend::Memory => env::var("DATABASE_URL").ok(),
        };

        Ok(PeopleConfig {
            common: common_config,
            store: StoreConfig {
                backend,
                uri,
                database: env::var("DATABASE_NAME").ok().filter(|s| !s.is_empty()),
                collection: get_env("PEOPLE_COLLECTION", Some(DEFAULT_COLLECTION), is_prod)?,
            },
        })
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend() {
        assert_eq!("mongo".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!("MongoDB".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("postgres".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn get_env_uses_default_outside_prod() {
        let value = get_env("PEOPLE_SERVICE_TEST_UNSET_DEFAULT", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
    }

    #[test]
    fn get_env_requires_value_without_default() {
        let err = get_env("PEOPLE_SERVICE_TEST_UNSET_REQUIRED", None, false).unwrap_err();
        assert!(err.to_string().contains("PEOPLE_SERVICE_TEST_UNSET_REQUIRED is required"));
    }

    #[test]
    fn get_env_ignores_default_in_prod() {
        let err = get_env("PEOPLE_SERVICE_TEST_UNSET_PROD", Some("fallback"), true).unwrap_err();
        assert!(err.to_string().contains("required in production"));
    }

    #[test]
    fn get_env_reads_set_variable() {
        env::set_var("PEOPLE_SERVICE_TEST_SET", "value");
        assert_eq!(get_env("PEOPLE_SERVICE_TEST_SET", None, true).unwrap(), "value");
    }
}
