//! # LDMS Core
//!
//! Crate compartilhada do sistema de monitoramento de deslizamentos:
//! modelo de dados dos nós, classificação de ameaça, agregação do painel,
//! repositórios do backend, notificações e configuração TOML.
//!
//! ## Módulos
//! - [`types`] – Leitura de nó sensor, coordenadas, identidade
//! - [`threat`] – Nível de ameaça e alertas por leitura
//! - [`board`] – Estado agregado do painel (resumo, filtros, histórico)
//! - [`favorites`] – Favoritos por usuário
//! - [`geo`] – Distância haversine e busca por raio
//! - [`repository`] – Traits de auth, nós e dados de usuário
//! - [`memory`] – Backend em memória (testes e `--demo`)
//! - [`firebase`] – Backend Firebase via REST
//! - [`demo`] – Simulação de nós para o modo demo
//! - [`notification`] – Push → notificação
//! - [`protocol`] – Frame binário do canal de push
//! - [`validator`] – Verificação do layout de dados no backend
//! - [`config`] – Configuração unificada via TOML
//! - [`theme`] – Temas claro e escuro

pub mod types;
pub mod threat;
pub mod board;
pub mod favorites;
pub mod geo;
pub mod repository;
pub mod memory;
pub mod firebase;
pub mod demo;
pub mod notification;
pub mod protocol;
pub mod validator;
pub mod config;
pub mod theme;

// Re-exports convenientes
pub use types::{GeoPoint, Identity, SensorData};
pub use threat::{ThreatFilter, ThreatLevel, classify};
pub use board::SensorBoard;
pub use repository::{Backend, BackendError, FeedEvent, Subscription};
pub use notification::{Notification, PushMessage};
pub use protocol::{PROTOCOL_VERSION, decode_push, encode_push};
pub use config::{AppConfig, BackendConfig, DashboardConfig, WatchConfig};
