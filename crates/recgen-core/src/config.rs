use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

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
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("RECGEN_ENV", "development"))?;
    let log_level = or_default("RECGEN_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("RECGEN_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("RECGEN_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RECGEN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let llm_base_url = or_default("RECGEN_LLM_BASE_URL", "https://api.openai.com/v1");
    let llm_api_key = lookup("RECGEN_LLM_API_KEY").ok().filter(|k| !k.is_empty());
    let llm_default_model = or_default("RECGEN_LLM_DEFAULT_MODEL", "gpt-4o-mini");
    let llm_fallback_model = or_default("RECGEN_LLM_FALLBACK_MODEL", "gpt-4o");
    let llm_fallback_base_url = or_default("RECGEN_LLM_FALLBACK_BASE_URL", &llm_base_url);
    let llm_light_timeout_secs = parse_u64("RECGEN_LLM_LIGHT_TIMEOUT_SECS", "90")?;
    let llm_heavy_timeout_secs = parse_u64("RECGEN_LLM_HEAVY_TIMEOUT_SECS", "180")?;

    let window_days = parse_u32("RECGEN_WINDOW_DAYS", "30")?;
    if window_days == 0 {
        return Err(invalid("RECGEN_WINDOW_DAYS", "must be at least 1".to_string()));
    }
    let top_sources = parse_u32("RECGEN_TOP_SOURCES", "20")?;
    let aggregation_batch_size = parse_usize("RECGEN_AGGREGATION_BATCH_SIZE", "5")?;
    if aggregation_batch_size == 0 {
        return Err(invalid(
            "RECGEN_AGGREGATION_BATCH_SIZE",
            "must be at least 1".to_string(),
        ));
    }
    let max_recommendations = parse_usize("RECGEN_MAX_RECOMMENDATIONS", "10")?;
    let allow_competitor_mentions = parse_bool("RECGEN_ALLOW_COMPETITOR_MENTIONS", "true")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        llm_base_url,
        llm_api_key,
        llm_default_model,
        llm_fallback_model,
        llm_fallback_base_url,
        llm_light_timeout_secs,
        llm_heavy_timeout_secs,
        window_days,
        top_sources,
        aggregation_batch_size,
        max_recommendations,
        allow_competitor_mentions,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "RECGEN_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
