use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const BASE_URL: &str = "https://sic.cultura.gob.mx";
pub const LIST_PATH: &str = "/lista.php?table=museo&estado_id=9&municipio_id=-1";
pub const USER_AGENT: &str = "Mozilla/5.0";

pub const RAW_CSV: &str = "museos_cdmx_ia.csv";
pub const COORDINATES_CSV: &str = "museos_cdmx_con_coordenadas.csv";
pub const CATEGORIES_CSV: &str = "museos_cdmx_con_categorias.csv";

const PLACEHOLDERS: &[&str] = &["TU_API_KEY", "tu_clave_aqui", "your-api-key"];

/// Everything the `scrape` command needs: listing source, extraction service, pacing.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub list_path: String,
    pub api_key: String,
    pub api_base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub page_timeout: Duration,
    pub model_timeout: Duration,
    pub max_text_chars: usize,
    pub request_delay: Duration,
    pub output: PathBuf,
}

impl ScrapeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: BASE_URL.to_string(),
            list_path: LIST_PATH.to_string(),
            api_key: required_key("ANTHROPIC_API_KEY")?,
            api_base_url: env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| "https://api.anthropic.com".to_string()),
            model: env::var("MUSEOS_MODEL").unwrap_or_else(|_| "claude-3-haiku-20240307".to_string()),
            max_tokens: 1000,
            page_timeout: Duration::from_secs(10),
            model_timeout: Duration::from_secs(60),
            max_text_chars: 5000,
            request_delay: Duration::from_millis(500),
            output: PathBuf::from(RAW_CSV),
        })
    }
}

#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    pub api_key: String,
    pub api_base_url: String,
    /// Appended to every address so the service stays inside the city.
    pub address_suffix: String,
    pub timeout: Duration,
    pub request_delay: Duration,
}

impl GeocodeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: required_key("GOOGLE_MAPS_API_KEY")?,
            api_base_url: env::var("GOOGLE_MAPS_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com".to_string()),
            address_suffix: "CDMX, México".to_string(),
            timeout: Duration::from_secs(10),
            request_delay: Duration::from_millis(100),
        })
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub root: PathBuf,
    pub landing: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            root: PathBuf::from("."),
            landing: "visualizador.html".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Ok(port) = env::var("MUSEOS_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                var: "MUSEOS_PORT",
                value: port,
            })?;
        }
        if let Ok(root) = env::var("MUSEOS_ROOT") {
            config.root = PathBuf::from(root);
        }
        Ok(config)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required_key(var: &'static str) -> Result<String, ConfigError> {
    let value = env::var(var).unwrap_or_default();
    check_key(var, value.trim())
}

fn check_key(var: &'static str, value: &str) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::MissingKey { var });
    }
    if PLACEHOLDERS.iter().any(|p| value.contains(p)) {
        return Err(ConfigError::PlaceholderKey {
            var,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_missing() {
        let err = check_key("ANTHROPIC_API_KEY", "").unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey { var: "ANTHROPIC_API_KEY" }));
    }

    #[test]
    fn placeholder_key_is_rejected() {
        let err = check_key("GOOGLE_MAPS_API_KEY", "tu_clave_aqui").unwrap_err();
        assert!(matches!(err, ConfigError::PlaceholderKey { .. }));
        assert!(err.to_string().contains("GOOGLE_MAPS_API_KEY"));

        assert!(check_key("ANTHROPIC_API_KEY", "sk-TU_API_KEY-123").is_err());
    }

    #[test]
    fn real_key_passes() {
        assert_eq!(check_key("ANTHROPIC_API_KEY", "sk-ant-abc").unwrap(), "sk-ant-abc");
    }

    #[test]
    fn server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.landing, "visualizador.html");
        assert_eq!(config.addr(), "0.0.0.0:8000");
    }
}
