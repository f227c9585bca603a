use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Public directory completed audio files are served from
    pub download_dir: PathBuf,
    /// Scratch directory the extraction engine writes into
    pub temp_dir: PathBuf,
    pub ytdlp_path: PathBuf,
    pub socket_timeout: Duration,
    /// Unset means no limit on concurrently running jobs
    pub max_concurrent_jobs: Option<usize>,
    /// Unset means finished jobs are kept until the process exits
    pub job_retention: Option<Duration>,
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            download_dir: PathBuf::from("downloads"),
            temp_dir: PathBuf::from("temp"),
            ytdlp_path: PathBuf::from("yt-dlp"),
            socket_timeout: Duration::from_secs(30),
            max_concurrent_jobs: None,
            job_retention: None,
            shutdown_grace: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let defaults = Self::default();
        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_var("PORT")?.unwrap_or(defaults.port),
            download_dir: env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            temp_dir: env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.temp_dir),
            ytdlp_path: env::var("YTDLP_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.ytdlp_path),
            socket_timeout: parse_var("SOCKET_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.socket_timeout),
            max_concurrent_jobs: parse_var("MAX_CONCURRENT_JOBS")?.filter(|n: &usize| *n > 0),
            job_retention: parse_var("JOB_RETENTION_SECS")?.map(Duration::from_secs),
            shutdown_grace: parse_var("SHUTDOWN_GRACE_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_grace),
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Parse an optional variable; unset or empty is `None`, garbage is an error.
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a valid number", name)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.download_dir, PathBuf::from("downloads"));
        assert_eq!(config.temp_dir, PathBuf::from("temp"));
        assert_eq!(config.socket_timeout, Duration::from_secs(30));
        assert!(config.max_concurrent_jobs.is_none());
        assert!(config.job_retention.is_none());
        assert_eq!(config.listen_addr(), "0.0.0.0:5000");
    }

    #[test]
    fn test_parse_var_rejects_garbage() {
        env::set_var("FETCH_TEST_BAD_NUMBER", "twelve");
        assert!(parse_var::<u64>("FETCH_TEST_BAD_NUMBER").is_err());
        env::remove_var("FETCH_TEST_BAD_NUMBER");
    }

    #[test]
    fn test_parse_var_unset_is_none() {
        assert_eq!(parse_var::<u64>("FETCH_TEST_DEFINITELY_UNSET").unwrap(), None);
    }
}
