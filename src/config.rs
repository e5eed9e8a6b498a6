use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Adzuna job-search credentials. Missing id/key leaves `/api/jobs` answering 500.
#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    pub base_url: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
    pub country: String,
    pub results_per_page: u32,
}

/// OpenAI-compatible completion endpoint used for resume/job matching.
#[derive(Debug, Clone, Deserialize)]
pub struct MatcherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub session: SessionConfig,
    pub storage: StorageConfig,
    pub jobs: JobsConfig,
    pub matcher: MatcherConfig,
    pub cors_origins: Vec<String>,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: env_or("SESSION_ISSUER", "jobassist"),
            audience: env_or("SESSION_AUDIENCE", "jobassist-users"),
            ttl_minutes: env_parse("SESSION_TTL_MINUTES", 60 * 24 * 7),
            cookie_name: env_or("SESSION_COOKIE_NAME", "session"),
            cookie_secure: env_parse("COOKIE_SECURE", false),
            cookie_domain: env_opt("COOKIE_DOMAIN"),
        };
        let storage = StorageConfig {
            endpoint: env_or("S3_ENDPOINT", "http://localhost:9000"),
            bucket: env_or("S3_BUCKET", "resumes"),
            access_key: env_or("S3_ACCESS_KEY", "minioadmin"),
            secret_key: env_or("S3_SECRET_KEY", "minioadmin"),
            region: env_or("S3_REGION", "us-east-1"),
        };
        let jobs = JobsConfig {
            base_url: env_or("ADZUNA_BASE_URL", "https://api.adzuna.com/v1/api/jobs"),
            app_id: env_opt("ADZUNA_APP_ID"),
            app_key: env_opt("ADZUNA_APP_KEY"),
            country: env_or("ADZUNA_COUNTRY", "us"),
            results_per_page: 20,
        };
        let matcher = MatcherConfig {
            api_key: env_opt("DEEPSEEK_API_KEY"),
            base_url: env_or("DEEPSEEK_API_BASE", "https://api.deepseek.com/v1"),
            model: env_or("DEEPSEEK_MODEL", "deepseek-chat"),
        };
        let cors_origins = parse_list(&std::env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default());

        Ok(Self {
            database_url,
            session,
            storage,
            jobs,
            matcher,
            cors_origins,
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", 30),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// Unset and blank values are both treated as absent.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_skips_blanks() {
        let origins = parse_list(" http://localhost:3000, ,https://app.example.com ");
        assert_eq!(origins, vec!["http://localhost:3000", "https://app.example.com"]);
        assert!(parse_list("").is_empty());
    }
}
