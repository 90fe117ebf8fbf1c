use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub library_api_key: String,
    pub library_api_url: String,
    pub api_token: String,
    pub port: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub library_refresh_cron: String,
    pub default_owner_id: Option<String>,
    /// Imports left open longer than this are discarded by the cron job.
    pub session_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let library_api_url = env::var("LIBRARY_API_URL")?;
        let library_api_key = env::var("LIBRARY_API_KEY")?;
        let api_token = env::var("API_TOKEN")?;
        let port = env::var("PORT")?;
        let gemini_api_key = env::var("GEMINI_API_KEY")?;
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let library_refresh_cron =
            env::var("LIBRARY_REFRESH_CRON").unwrap_or_else(|_| "0 */15 * * * *".to_string());
        let default_owner_id = env::var("DEFAULT_OWNER_ID")
            .ok()
            .filter(|owner| !owner.trim().is_empty());
        let session_ttl_minutes = env::var("IMPORT_SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "120".to_string())
            .parse()?;

        Ok(Self {
            library_api_key,
            library_api_url,
            api_token,
            port,
            gemini_api_key,
            gemini_model,
            library_refresh_cron,
            default_owner_id,
            session_ttl_minutes,
        })
    }
}
