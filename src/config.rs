//! Configuration management
//!
//! Defaults suit the pilot deployment; every knob can be overridden through
//! the environment. The LLM key is the one value with no default — without
//! `DEEPSEEK_API_KEY` the server still runs, but /ask degrades to reporting
//! the missing configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::llm::chat_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::ratelimit::{DEFAULT_DAILY_LIMIT, DEFAULT_RETENTION_DAYS};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub llm: LlmSettings,
    pub data: DataSettings,
    pub quota: QuotaSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    /// From `DEEPSEEK_API_KEY`; `None` disables the LLM endpoints.
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataSettings {
    /// Preferred local directory holding the four source CSVs.
    pub dir: Option<PathBuf>,
    /// Release URL prefix used when no local copy exists.
    pub base_url: String,
    /// Directory for the user and usage store files.
    pub store_dir: PathBuf,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuotaSettings {
    pub consultas_por_dia: u32,
    pub retencion_dias: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            llm: LlmSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                api_key: None,
            },
            data: DataSettings {
                dir: None,
                base_url:
                    "https://github.com/Omartg04/PAPE-v3-agente/releases/download/data-v1/"
                        .to_string(),
                store_dir: PathBuf::from("datos"),
            },
            quota: QuotaSettings {
                consultas_por_dia: DEFAULT_DAILY_LIMIT,
                retencion_dias: DEFAULT_RETENTION_DAYS,
            },
        }
    }
}

impl Settings {
    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut s = Settings::default();
        if let Ok(host) = std::env::var("PAPE_HOST") {
            s.server.host = host;
        }
        if let Some(port) = env_parse("PAPE_PORT") {
            s.server.port = port;
        }
        if let Ok(url) = std::env::var("PAPE_LLM_URL") {
            s.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("PAPE_LLM_MODEL") {
            s.llm.model = model;
        }
        if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
            let key = key.trim().to_string();
            if !key.is_empty() {
                s.llm.api_key = Some(key);
            }
        }
        if let Ok(dir) = std::env::var("PAPE_DATA_DIR") {
            s.data.dir = Some(PathBuf::from(dir));
        }
        if let Ok(url) = std::env::var("PAPE_DATA_URL") {
            s.data.base_url = url;
        }
        if let Ok(dir) = std::env::var("PAPE_STORE_DIR") {
            s.data.store_dir = PathBuf::from(dir);
        }
        if let Some(limite) = env_parse("PAPE_LIMITE_DIARIO") {
            s.quota.consultas_por_dia = limite;
        }
        if let Some(dias) = env_parse("PAPE_RETENCION_DIAS") {
            s.quota.retencion_dias = dias;
        }
        s
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
