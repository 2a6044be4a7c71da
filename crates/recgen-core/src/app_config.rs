#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub llm_base_url: String,
    pub llm_api_key: Option<String>,
    pub llm_default_model: String,
    pub llm_fallback_model: String,
    pub llm_fallback_base_url: String,
    pub llm_light_timeout_secs: u64,
    pub llm_heavy_timeout_secs: u64,
    pub window_days: u32,
    pub top_sources: u32,
    pub aggregation_batch_size: usize,
    pub max_recommendations: usize,
    pub allow_competitor_mentions: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("llm_base_url", &self.llm_base_url)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_default_model", &self.llm_default_model)
            .field("llm_fallback_model", &self.llm_fallback_model)
            .field("llm_fallback_base_url", &self.llm_fallback_base_url)
            .field("llm_light_timeout_secs", &self.llm_light_timeout_secs)
            .field("llm_heavy_timeout_secs", &self.llm_heavy_timeout_secs)
            .field("window_days", &self.window_days)
            .field("top_sources", &self.top_sources)
            .field("aggregation_batch_size", &self.aggregation_batch_size)
            .field("max_recommendations", &self.max_recommendations)
            .field(
                "allow_competitor_mentions",
                &self.allow_competitor_mentions,
            )
            .finish()
    }
}
