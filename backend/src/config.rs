//! # Configuration
//!
//! Process configuration assembled once at startup from `LM_*` environment
//! variables and then passed explicitly to whatever needs it. Nothing here is
//! global or mutable after construction.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_USER: &str = "root";
pub const DEFAULT_DB_NAME: &str = "life_manager";
pub const DEFAULT_MODEL_NAME: &str = "distilgpt2";
pub const DEFAULT_MODEL_ENDPOINT: &str = "http://127.0.0.1:11434/api/generate";
pub const DEFAULT_PASSWORD_ITERATIONS: u32 = 200_000;

/// Which backend keeps goals, their progress log and their checklists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalStoreKind {
    Sqlite,
    Json,
}

impl GoalStoreKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "db" => Some(GoalStoreKind::Sqlite),
            "json" | "file" => Some(GoalStoreKind::Json),
            _ => None,
        }
    }
}

/// Database settings. The storage engine is embedded SQLite, so only the
/// database name selects anything; host and credentials are kept so that a
/// deployment carrying them is told they are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            name: DEFAULT_DB_NAME.to_string(),
        }
    }
}

impl DatabaseConfig {
    /// SQLite URL for the database file inside `data_dir`
    pub fn url(&self, data_dir: &std::path::Path) -> String {
        format!("sqlite:{}", data_dir.join(format!("{}.db", self.name)).display())
    }

    /// Names of the connection settings that were changed from their
    /// defaults but have no effect on an embedded database
    pub fn ignored_settings(&self) -> Vec<&'static str> {
        let mut ignored = Vec::new();
        if self.host != DEFAULT_DB_HOST {
            ignored.push("LM_DB_HOST");
        }
        if self.user != DEFAULT_DB_USER {
            ignored.push("LM_DB_USER");
        }
        if !self.password.is_empty() {
            ignored.push("LM_DB_PASSWORD");
        }
        ignored
    }
}

/// Settings for the generative fallback of the task planner
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub cache_dir: PathBuf,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_MODEL_NAME.to_string(),
            cache_dir: PathBuf::from("./model_cache"),
            endpoint: DEFAULT_MODEL_ENDPOINT.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl ModelConfig {
    /// `./model_cache/<model-name>`
    pub fn model_path(&self) -> PathBuf {
        self.cache_dir.join(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database: DatabaseConfig,
    pub goal_store: GoalStoreKind,
    pub model: ModelConfig,
    /// PBKDF2 rounds for newly hashed passwords
    pub password_iterations: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            database: DatabaseConfig::default(),
            goal_store: GoalStoreKind::Sqlite,
            model: ModelConfig::default(),
            password_iterations: DEFAULT_PASSWORD_ITERATIONS,
        }
    }
}

impl AppConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup; used by tests to avoid
    /// touching the real environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = AppConfig::default();

        let database = DatabaseConfig {
            host: get("LM_DB_HOST").unwrap_or(defaults.database.host),
            user: get("LM_DB_USER").unwrap_or(defaults.database.user),
            password: lookup("LM_DB_PASSWORD").unwrap_or_default(),
            name: get("LM_DB_NAME").unwrap_or(defaults.database.name),
        };

        let goal_store = match get("LM_GOAL_STORE") {
            Some(raw) => GoalStoreKind::parse(&raw).unwrap_or_else(|| {
                warn!("Unknown LM_GOAL_STORE value '{}', using sqlite", raw);
                GoalStoreKind::Sqlite
            }),
            None => defaults.goal_store,
        };

        let timeout = get("LM_MODEL_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.model.timeout);

        let model = ModelConfig {
            name: get("LM_MODEL_NAME").unwrap_or(defaults.model.name),
            cache_dir: get("LM_MODEL_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model.cache_dir),
            endpoint: get("LM_MODEL_ENDPOINT").unwrap_or(defaults.model.endpoint),
            timeout,
        };

        let password_iterations = match get("LM_PASSWORD_ITERATIONS") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    warn!("Invalid LM_PASSWORD_ITERATIONS value '{}', using {}", raw, defaults.password_iterations);
                    defaults.password_iterations
                }
            },
            None => defaults.password_iterations,
        };

        Self {
            data_dir: get("LM_DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            database,
            goal_store,
            model,
            password_iterations,
        }
    }

    pub fn database_url(&self) -> String {
        self.database.url(&self.data_dir)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join("settings.yaml")
    }

    pub fn goal_store_path(&self) -> PathBuf {
        self.data_dir.join("goals.json")
    }
}
