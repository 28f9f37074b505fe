// src/config/mod.rs
// All runtime tuning comes from the environment. The binary loads .env
// before this is first read, so values there are picked up too.

use once_cell::sync::Lazy;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct GabaiConfig {
    // ── Server
    pub host: String,
    pub port: u16,
    pub cors_origin: String,

    // ── Generation
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,

    // ── Timeouts (in seconds)
    pub request_timeout: u64,
    pub first_fragment_timeout: u64,
    pub stream_deadline: u64,

    // ── Logging
    pub log_filter: String,
}

// Handles values with trailing comments and extra whitespace, which show
// up when people copy .env lines around.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl GabaiConfig {
    fn from_env() -> Self {
        Self {
            host: env_var_or("GABAI_HOST", "0.0.0.0".to_string()),
            port: env_var_or("GABAI_PORT", 8787),
            cors_origin: env_var_or("GABAI_CORS_ORIGIN", "*".to_string()),

            gemini_base_url: env_var_or(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta".to_string(),
            ),
            gemini_model: env_var_or("GEMINI_MODEL", "gemini-2.0-flash".to_string()),
            // Tax answers should be boring and repeatable, not creative
            temperature: env_var_or("GABAI_TEMPERATURE", 0.2),
            max_output_tokens: env_var_or("GABAI_MAX_OUTPUT_TOKENS", 1024),

            // request_timeout caps the whole upstream exchange and must
            // outlast the consumer-facing stream_deadline
            request_timeout: env_var_or("GABAI_REQUEST_TIMEOUT", 180),
            first_fragment_timeout: env_var_or("GABAI_FIRST_FRAGMENT_TIMEOUT", 30),
            stream_deadline: env_var_or("GABAI_STREAM_DEADLINE", 120),

            log_filter: env_var_or("GABAI_LOG", "gabai=info,tower_http=info".to_string()),
        }
    }
}

pub static CONFIG: Lazy<GabaiConfig> = Lazy::new(GabaiConfig::from_env);
