pub mod prompts;

use std::env;
use std::path::PathBuf;
use anyhow::Result;

use prompts::PromptStore;

pub const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub csv_path: PathBuf,
    pub table_name: String,
    /// When set, the working table is rebuilt inside this SQLite file on every
    /// query. When unset the engine runs fully in memory.
    pub scratch_db_path: Option<PathBuf>,
}

impl DatasetConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            csv_path: PathBuf::from(
                env::var("DATASET_CSV_PATH").unwrap_or_else(|_| "data/financials.csv".to_string()),
            ),
            table_name: env::var("DATASET_TABLE_NAME")
                .unwrap_or_else(|_| "finance_data".to_string()),
            scratch_db_path: env::var("SCRATCH_DB_PATH").ok().map(PathBuf::from),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: String,
    pub groq_api_url: String,
    pub dataset: DatasetConfig,
    pub prompts: PromptStore,
    pub server_host: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let prompt_dir =
            PathBuf::from(env::var("PROMPT_DIR").unwrap_or_else(|_| "prompts".to_string()));
        let prompts = PromptStore::load(&prompt_dir)?;

        Ok(Self {
            groq_api_key: env::var("GROQ_API_KEY")?,
            groq_api_url: env::var("GROQ_API_URL")
                .unwrap_or_else(|_| DEFAULT_GROQ_API_URL.to_string()),
            dataset: DatasetConfig::from_env()?,
            prompts,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            cors_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
