use easel_runner::RunnerConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Public base URLs under which the blob store issues object URLs,
    /// comma-separated. Used to resolve URLs back to storage keys.
    pub storage_public_base_urls: Vec<String>,
    /// Maximum number of generations a single batch may request.
    pub max_batch_items: u16,
    /// Runner (worker runtime) connection settings.
    pub runner: RunnerConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                      |
    /// |----------------------------|------------------------------|
    /// | `HOST`                     | `0.0.0.0`                    |
    /// | `PORT`                     | `3000`                       |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                         |
    /// | `STORAGE_PUBLIC_BASE_URLS` | `http://localhost:9000/easel`|
    /// | `MAX_BATCH_ITEMS`          | `64`                         |
    /// | `RUNNER_BASE_URL`          | `http://localhost:8700`      |
    /// | `RUNNER_TOKEN_SECRET`      | (empty — must be set)        |
    /// | `RUNNER_TOKEN_TTL_SECS`    | `300`                        |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins = parse_list(
            &std::env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost:5173".into()),
        );

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let storage_public_base_urls = parse_list(
            &std::env::var("STORAGE_PUBLIC_BASE_URLS")
                .unwrap_or_else(|_| "http://localhost:9000/easel".into()),
        );

        let max_batch_items: u16 = std::env::var("MAX_BATCH_ITEMS")
            .unwrap_or_else(|_| "64".into())
            .parse()
            .expect("MAX_BATCH_ITEMS must be a valid u16");

        let runner = RunnerConfig {
            base_url: std::env::var("RUNNER_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8700".into()),
            token_secret: std::env::var("RUNNER_TOKEN_SECRET").unwrap_or_default(),
            token_ttl_secs: std::env::var("RUNNER_TOKEN_TTL_SECS")
                .unwrap_or_else(|_| "300".into())
                .parse()
                .expect("RUNNER_TOKEN_TTL_SECS must be a valid u64"),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            storage_public_base_urls,
            max_batch_items,
            runner,
        }
    }
}

/// Split a comma-separated env value into trimmed, non-empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_trims_and_drops_empties() {
        assert_eq!(
            parse_list(" https://a.test , ,https://b.test,"),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
    }
}
