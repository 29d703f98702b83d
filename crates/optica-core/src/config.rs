use std::net::SocketAddr;

use crate::app_config::{ApiKey, AppConfig, Environment};
use crate::ConfigError;

/// Actor name given to bearer tokens configured without an `actor:` prefix.
pub const DEFAULT_API_ACTOR: &str = "api";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Does not read `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Parses configuration through `lookup`, so tests can feed a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let api_key_hash_salt = require("OPTICA_API_KEY_HASH_SALT")?;

    let env = parse_environment(&or_default("OPTICA_ENV", "development"));

    let bind_addr = or_default("OPTICA_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("OPTICA_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("OPTICA_LOG_LEVEL", "info");
    let api_keys = parse_api_keys(&or_default("OPTICA_API_KEYS", ""))
        .map_err(|reason| invalid("OPTICA_API_KEYS", reason))?;

    let db_max_connections = parse_u32("OPTICA_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("OPTICA_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "OPTICA_DB_MIN_CONNECTIONS",
            format!("must not exceed OPTICA_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("OPTICA_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let rate_limit_max_requests = or_default("OPTICA_RATE_LIMIT_MAX_REQUESTS", "120")
        .parse::<usize>()
        .map_err(|e| invalid("OPTICA_RATE_LIMIT_MAX_REQUESTS", e.to_string()))?;
    let rate_limit_window_secs = parse_u64("OPTICA_RATE_LIMIT_WINDOW_SECS", "60")?;
    if rate_limit_window_secs == 0 {
        return Err(invalid(
            "OPTICA_RATE_LIMIT_WINDOW_SECS",
            "must be greater than zero".to_string(),
        ));
    }

    let require_expected_version = parse_bool(&or_default(
        "OPTICA_REQUIRE_EXPECTED_VERSION",
        "false",
    ))
    .map_err(|reason| invalid("OPTICA_REQUIRE_EXPECTED_VERSION", reason))?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        api_key_hash_salt,
        api_keys,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        rate_limit_max_requests,
        rate_limit_window_secs,
        require_expected_version,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        other => Err(format!("expected true or false, got '{other}'")),
    }
}

/// Comma-separated `actor:token` entries. A bare token authenticates as
/// [`DEFAULT_API_ACTOR`].
fn parse_api_keys(raw: &str) -> Result<Vec<ApiKey>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (actor, token) = match entry.split_once(':') {
                Some((actor, token)) => (actor.trim(), token.trim()),
                None => (DEFAULT_API_ACTOR, entry),
            };
            if actor.is_empty() || token.is_empty() {
                return Err("entries must be 'actor:token' or 'token'".to_string());
            }
            Ok(ApiKey {
                actor: actor.to_string(),
                token: token.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
