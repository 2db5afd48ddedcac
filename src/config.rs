use serde::Deserialize;

pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v19.0";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub facebook_access_token: String,
    /// When set, every Graph call carries an `appsecret_proof`.
    pub facebook_app_secret: Option<String>,
    pub facebook_graph_base_url: String,
    pub facebook_api_version: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DATABASE_URL")
                .or_else(|_| std::env::var("DB_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DATABASE_URL or DB_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DATABASE_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DATABASE_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            facebook_access_token: std::env::var("FACEBOOK_ACCESS_TOKEN")
                .map_err(|_| anyhow::anyhow!("FACEBOOK_ACCESS_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("FACEBOOK_ACCESS_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            facebook_app_secret: std::env::var("FACEBOOK_APP_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            facebook_graph_base_url: std::env::var("FACEBOOK_GRAPH_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_GRAPH_BASE_URL.to_string())
                .parse::<url::Url>()
                .map_err(|e| anyhow::anyhow!("FACEBOOK_GRAPH_BASE_URL is not a valid URL: {}", e))
                .and_then(|url| {
                    if !matches!(url.scheme(), "http" | "https") {
                        anyhow::bail!("FACEBOOK_GRAPH_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.as_str().trim_end_matches('/').to_string())
                })?,
            facebook_api_version: std::env::var("FACEBOOK_API_VERSION")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|version| version.trim().to_string())
                .unwrap_or_else(|| DEFAULT_GRAPH_API_VERSION.to_string()),
        };

        if !config.facebook_api_version.starts_with('v') {
            anyhow::bail!("FACEBOOK_API_VERSION must look like v19.0");
        }

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!(
            "Graph API: {}/{}",
            config.facebook_graph_base_url,
            config.facebook_api_version
        );
        if config.facebook_app_secret.is_some() {
            tracing::info!("App secret configured, appsecret_proof enabled");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
