//! Configuração unificada via TOML.
//!
//! Um único `config.toml` ao lado do executável serve o watch e o dashboard.

use crate::geo::DEFAULT_NEARBY_RADIUS_M;
use crate::types::GeoPoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Erros ao gravar a configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao serializar configuração: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao gravar {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Limites aceitos para o timeout das requisições (segundos).
pub const MIN_REQUEST_TIMEOUT_SECS: f64 = 1.0;
pub const MAX_REQUEST_TIMEOUT_SECS: f64 = 120.0;
const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 15.0;

/// Acesso ao backend gerenciado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// URL do Realtime Database (ex: https://ldms-default-rtdb.firebaseio.com)
    pub database_url: String,
    /// Web API key do projeto
    pub api_key: String,
    /// Coleção dos nós sensores
    pub nodes_path: String,
    /// Timeout das requisições REST (segundos)
    pub request_timeout_secs: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            api_key: String::new(),
            nodes_path: "nodes".into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl BackendConfig {
    /// Timeout efetivo, dentro dos limites aceitos. `nan` usa o padrão.
    pub fn request_timeout(&self) -> Duration {
        let secs = if self.request_timeout_secs.is_nan() {
            DEFAULT_REQUEST_TIMEOUT_SECS
        } else {
            self.request_timeout_secs
                .clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS)
        };
        Duration::from_secs_f64(secs)
    }
}

/// Configuração do watch (emissor de push).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Modo de envio: "broadcast" ou "unicast"
    pub mode: String,
    /// IP de destino (255.255.255.255 para broadcast)
    pub dest_ip: String,
    /// Porta UDP
    pub port: u16,
    /// IP local para bind (vazio = auto)
    pub bind_ip: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            mode: "broadcast".into(),
            dest_ip: "255.255.255.255".into(),
            port: 5015,
            bind_ip: String::new(),
        }
    }
}

/// Configuração do dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Porta UDP onde chegam os pushes
    pub push_port: u16,
    /// IP do watch (vazio = aceita de qualquer origem)
    pub watch_ip: String,
    /// Tema: "dark" ou "light"
    pub theme: String,
    pub notifications_enabled: bool,
    /// Raio da tela "Nearby" (metros)
    pub nearby_radius_m: f64,
    /// Amostras de histórico por nó
    pub history_len: usize,
    pub map_center_lat: f64,
    pub map_center_lon: f64,
    /// Localização do usuário (opcional)
    pub user_lat: Option<f64>,
    pub user_lon: Option<f64>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            push_port: 5015,
            watch_ip: String::new(),
            theme: "dark".into(),
            notifications_enabled: true,
            nearby_radius_m: DEFAULT_NEARBY_RADIUS_M,
            history_len: crate::board::DEFAULT_HISTORY_LEN,
            map_center_lat: 7.29,
            map_center_lon: 80.63,
            user_lat: None,
            user_lon: None,
        }
    }
}

impl DashboardConfig {
    pub fn map_center(&self) -> GeoPoint {
        GeoPoint {
            lat: self.map_center_lat,
            lon: self.map_center_lon,
        }
    }

    /// Localização do usuário, se as duas coordenadas estiverem definidas.
    pub fn user_location(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.user_lat?,
            lon: self.user_lon?,
        })
    }
}

/// Configuração raiz do aplicativo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub watch: WatchConfig,
    pub dashboard: DashboardConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.display().to_string(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    ///
    /// Backend vazio não é erro aqui: os binários caem no modo demo.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let url = &self.backend.database_url;
        if !url.is_empty() && !url.starts_with("https://") && !url.starts_with("http://") {
            errors.push(format!("URL do banco inválida: {url}"));
        }
        if self.backend.nodes_path.trim_matches('/').is_empty() {
            errors.push("Caminho dos nós não pode ser vazio".into());
        }
        let timeout = self.backend.request_timeout_secs;
        if !(MIN_REQUEST_TIMEOUT_SECS..=MAX_REQUEST_TIMEOUT_SECS).contains(&timeout) {
            errors.push(format!(
                "Timeout do backend inválido: {timeout} ({MIN_REQUEST_TIMEOUT_SECS}–{MAX_REQUEST_TIMEOUT_SECS})"
            ));
        }
        if self.watch.port == 0 {
            errors.push("Porta do watch não pode ser 0".into());
        }
        if !matches!(self.watch.mode.as_str(), "broadcast" | "unicast") {
            errors.push(format!("Modo do watch inválido: {}", self.watch.mode));
        }
        if self.dashboard.push_port == 0 {
            errors.push("Porta de push do dashboard não pode ser 0".into());
        }
        if !crate::theme::theme_names().contains(&self.dashboard.theme.as_str()) {
            errors.push(format!("Tema desconhecido: {}", self.dashboard.theme));
        }
        if self.dashboard.nearby_radius_m <= 0.0 {
            errors.push(format!(
                "Raio de proximidade inválido: {}",
                self.dashboard.nearby_radius_m
            ));
        }
        if self.dashboard.history_len == 0 {
            errors.push("Histórico precisa de ao menos 1 amostra".into());
        }
        if self.dashboard.user_lat.is_some() != self.dashboard.user_lon.is_some() {
            errors.push("Localização do usuário incompleta (user_lat/user_lon)".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let mut config = AppConfig::default();
        config.dashboard.user_lat = Some(7.3);
        config.dashboard.user_lon = Some(80.6);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.backend, parsed.backend);
        assert_eq!(config.watch.port, parsed.watch.port);
        assert_eq!(parsed.dashboard.user_location(), Some(GeoPoint { lat: 7.3, lon: 80.6 }));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let partial = r#"
[watch]
port = 9999
"#;
        let config: AppConfig = toml::from_str(partial).unwrap();
        assert_eq!(config.watch.port, 9999);
        // Outros campos devem ter valor padrão
        assert_eq!(config.watch.mode, "broadcast");
        assert_eq!(config.backend.nodes_path, "nodes");
        assert_eq!(config.dashboard.push_port, 5015);
        assert_eq!(config.dashboard.nearby_radius_m, 1000.0);
        assert!(config.dashboard.user_location().is_none());
    }

    #[test]
    fn flags_bad_values() {
        let mut config = AppConfig::default();
        config.backend.database_url = "ftp://x".into();
        config.watch.mode = "multicast".into();
        config.dashboard.user_lat = Some(1.0);
        config.dashboard.history_len = 0;
        config.dashboard.theme = "neon".into();
        assert_eq!(config.validate().len(), 5);
    }

    #[test]
    fn request_timeout_is_clamped() {
        let mut backend = BackendConfig::default();
        assert_eq!(backend.request_timeout(), Duration::from_secs(15));

        backend.request_timeout_secs = f64::INFINITY;
        assert_eq!(backend.request_timeout(), Duration::from_secs(120));
        backend.request_timeout_secs = -3.0;
        assert_eq!(backend.request_timeout(), Duration::from_secs(1));
        backend.request_timeout_secs = f64::NAN;
        assert_eq!(backend.request_timeout(), Duration::from_secs(15));

        // `validate` aponta o mesmo valor
        let mut config = AppConfig::default();
        config.backend.request_timeout_secs = f64::INFINITY;
        assert_eq!(config.validate().len(), 1);
    }

    #[test]
    fn save_and_load() {
        let path = std::env::temp_dir().join(format!("ldms-config-{}.toml", std::process::id()));
        let mut config = AppConfig::default();
        config.dashboard.theme = "light".into();
        config.save(&path).unwrap();
        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.dashboard.theme, "light");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn broken_file_falls_back() {
        let path = std::env::temp_dir().join(format!("ldms-broken-{}.toml", std::process::id()));
        std::fs::write(&path, "[watch\nport = ").unwrap();
        let loaded = AppConfig::load(&path);
        assert_eq!(loaded.watch.port, 5015);
        let _ = std::fs::remove_file(&path);
    }
}
