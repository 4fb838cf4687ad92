use serde::Deserialize;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has invalid value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub features: FeatureFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("expected pretty or json, got {other}")),
        }
    }
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
    pub log_format: LogFormat,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis: кеш статусов мест и временные удержания
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub seat_status_ttl_seconds: u64,
    pub seat_hold_ttl_seconds: u64,
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_auth: bool,
    pub enable_cache: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            app: AppConfig {
                host: optional("HOST", "0.0.0.0")?,
                port: optional("PORT", "8000")?,
                environment: optional("ENVIRONMENT", "development")?,
                rust_log: optional("RUST_LOG", "library_seats=debug,tower_http=debug")?,
                log_format: optional("LOG_FORMAT", "pretty")?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: optional("DB_POOL_SIZE", "20")?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
                seat_status_ttl_seconds: optional("SEAT_STATUS_TTL_SECONDS", "3600")?,
                seat_hold_ttl_seconds: optional("SEAT_HOLD_TTL_SECONDS", "300")?,
            },
            features: FeatureFlags {
                enable_auth: optional("ENABLE_AUTH", "true")?,
                enable_cache: optional("ENABLE_CACHE", "true")?,
            },
        })
    }
}

/// Строка подключения для логов: пароль заменяется на `***`.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);
    let Some((userinfo, host)) = authority.rsplit_once('@') else {
        return url.to_string();
    };
    match userinfo.split_once(':') {
        Some((user, _password)) => format!("{scheme}://{user}:***@{host}{tail}"),
        None => url.to_string(),
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn optional<T>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    parse(key, value)
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numbers_and_flags() {
        assert_eq!(parse::<u16>("PORT", "8080".into()).unwrap(), 8080);
        assert!(!parse::<bool>("ENABLE_AUTH", "false".into()).unwrap());
        assert_eq!(parse::<LogFormat>("LOG_FORMAT", "JSON".into()).unwrap(), LogFormat::Json);
    }

    #[test]
    fn reports_key_on_invalid_value() {
        let err = parse::<u16>("PORT", "eighty".into()).unwrap_err();
        assert!(err.to_string().starts_with("PORT has invalid value \"eighty\""));
    }

    #[test]
    fn hides_passwords_in_urls() {
        assert_eq!(
            redact_url("postgres://seats:hunter2@db:5432/library_seats"),
            "postgres://seats:***@db:5432/library_seats"
        );
        assert_eq!(redact_url("redis://:s3cret@cache:6379/0"), "redis://:***@cache:6379/0");
        // @ в пароле
        assert_eq!(redact_url("postgres://u:p@ss@db/x"), "postgres://u:***@db/x");
    }

    #[test]
    fn leaves_urls_without_password_alone() {
        assert_eq!(redact_url("redis://cache:6379"), "redis://cache:6379");
        assert_eq!(redact_url("postgres://seats@db/x"), "postgres://seats@db/x");
        assert_eq!(redact_url("not a url"), "not a url");
    }
}
