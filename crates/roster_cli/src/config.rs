use anyhow::{Context, Result};
use roster_core::{default_log_level, AgePolicy};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl StoreBackend {
    fn from_env(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(anyhow::anyhow!("ROSTER_STORE must be one of: sqlite, memory")),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub min_age: u32,
    pub store: StoreBackend,
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cwd = env::current_dir().context("failed to resolve working directory")?;

        let host = env::var("ROSTER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("ROSTER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("ROSTER_PORT must be a valid u16")?;

        let min_age = env::var("ROSTER_MIN_AGE")
            .unwrap_or_else(|_| AgePolicy::DEFAULT_MIN_AGE.to_string())
            .parse::<u32>()
            .context("ROSTER_MIN_AGE must be a valid u32")?;

        let store =
            StoreBackend::from_env(&env::var("ROSTER_STORE").unwrap_or_else(|_| "sqlite".to_string()))?;

        let db_path = env::var("ROSTER_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("roster.sqlite3"));

        let log_level =
            env::var("ROSTER_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());

        let log_dir = match env::var("ROSTER_LOG_DIR") {
            Ok(raw) if !raw.trim().is_empty() => cwd.join(raw.trim()),
            _ => cwd.join("logs"),
        };

        Ok(Self {
            host,
            port,
            min_age,
            store,
            db_path,
            log_level,
            log_dir,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn age_policy(&self) -> AgePolicy {
        AgePolicy::new(self.min_age)
    }
}
