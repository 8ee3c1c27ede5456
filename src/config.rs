use std::time::Duration;

pub const DEFAULT_TRANSLATE_API_URL: &str = "https://libretranslate.de/translate";

#[derive(Debug, Clone)]
pub struct Config {
    // Translation service
    pub translate_api_url: String,
    pub translate_api_key: Option<String>,
    pub translate_timeout: Duration,
    pub translate_max_attempts: u32,

    // Storage
    pub database_path: String,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Every variable is optional: an unconfigured deployment talks to the
    /// public translation endpoint and a local `recipes.db`.
    pub fn from_env() -> Self {
        Self {
            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TRANSLATE_API_URL.to_string()),
            translate_api_key: std::env::var("TRANSLATE_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            translate_timeout: Duration::from_secs(
                std::env::var("TRANSLATE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            translate_max_attempts: std::env::var("TRANSLATE_MAX_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1u32)
                .max(1),

            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| "recipes.db".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            translate_api_url: DEFAULT_TRANSLATE_API_URL.to_string(),
            translate_api_key: None,
            translate_timeout: Duration::from_secs(10),
            translate_max_attempts: 1,
            database_path: "recipes.db".to_string(),
        }
    }
}
