use std::env;

/// Application configuration loaded from environment variables, per
/// spec.md §6. Required vars panic with a clear message on startup rather
/// than failing deep inside a worker; optional vars fall back to the
/// documented default.
#[derive(Debug, Clone)]
pub struct Config {
    pub redis_host: String,
    pub redis_port: u16,
    pub port: u16,

    pub data_dir: String,
    pub cookies_file: String,

    pub quality_threshold: i32,
    pub vision_model_host: String,
    pub vision_model_name: String,
    pub text_model_name: String,

    pub feed_poll_interval_minutes: u64,
    pub feed_url_rss: Option<String>,
    pub feed_url_api: Option<String>,

    pub asr_host: String,
    pub social_mirror_host: Option<String>,
    pub webhook_url: Option<String>,
    pub privacy_filter_terms: Vec<String>,

    pub fix_feature_enabled: bool,
    pub fix_feature_tool_path: Option<String>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Panics
    /// Panics if a required variable is missing or fails to parse — this is
    /// intentional: a misconfigured deployment should fail at startup, not
    /// mid-job.
    #[must_use]
    pub fn from_env() -> Self {
        let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let cookies_file =
            env::var("COOKIES_FILE").unwrap_or_else(|_| format!("{data_dir}/cookies.txt"));

        Self {
            redis_host: required_env("REDIS_HOST"),
            redis_port: required_env("REDIS_PORT")
                .parse()
                .expect("REDIS_PORT must be a number"),
            port: required_env("PORT").parse().expect("PORT must be a number"),
            data_dir,
            cookies_file,
            quality_threshold: env::var("QUALITY_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(50),
            vision_model_host: env::var("VISION_MODEL_HOST")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            vision_model_name: env::var("VISION_MODEL_NAME")
                .unwrap_or_else(|_| "llava".to_string()),
            text_model_name: env::var("TEXT_MODEL_NAME")
                .unwrap_or_else(|_| "llama3".to_string()),
            feed_poll_interval_minutes: env::var("FEED_POLL_INTERVAL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            feed_url_rss: env::var("FEED_URL_RSS").ok(),
            feed_url_api: env::var("FEED_URL_API").ok(),
            asr_host: env::var("ASR_HOST").unwrap_or_else(|_| "http://localhost:9000".to_string()),
            social_mirror_host: env::var("SOCIAL_MIRROR_HOST").ok(),
            webhook_url: env::var("WEBHOOK_URL").ok(),
            privacy_filter_terms: env::var("PRIVACY_FILTER_TERMS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
                .unwrap_or_default(),
            fix_feature_enabled: env::var("FIX_FEATURE_ENABLED")
                .ok()
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            fix_feature_tool_path: env::var("FIX_FEATURE_TOOL_PATH").ok(),
        }
    }

    /// A config populated with safe defaults for unit/integration tests that
    /// don't exercise the real Redis/filesystem paths.
    #[must_use]
    pub fn for_tests() -> Self {
        Self {
            redis_host: "127.0.0.1".to_string(),
            redis_port: 6379,
            port: 0,
            data_dir: "./data".to_string(),
            cookies_file: "./data/cookies.txt".to_string(),
            quality_threshold: 50,
            vision_model_host: "http://localhost:11434".to_string(),
            vision_model_name: "llava".to_string(),
            text_model_name: "llama3".to_string(),
            feed_poll_interval_minutes: 15,
            feed_url_rss: None,
            feed_url_api: None,
            asr_host: "http://localhost:9000".to_string(),
            social_mirror_host: None,
            webhook_url: None,
            privacy_filter_terms: Vec::new(),
            fix_feature_enabled: false,
            fix_feature_tool_path: None,
        }
    }

    #[must_use]
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }
}

fn required_env(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("missing required environment variable: {name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redis_url_assembles_host_and_port() {
        let cfg = Config::for_tests();
        assert_eq!(cfg.redis_url(), "redis://127.0.0.1:6379");
    }

    #[test]
    fn privacy_filter_terms_parses_csv_and_trims() {
        // Exercised indirectly via for_tests' empty default; direct parse logic
        // mirrors `from_env`'s split/trim/filter chain.
        let raw = "foo, bar ,, baz";
        let parsed: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(parsed, vec!["foo", "bar", "baz"]);
    }
}
