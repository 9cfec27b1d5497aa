//! Repositórios do backend gerenciado.
//!
//! São repasses diretos: sem retry, sem backoff, sem cache, sem dedup.
//! Uma falha volta como [`BackendError`], cuja mensagem é a do backend.

use crate::favorites::Favorites;
use crate::types::{Identity, SensorData};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Prefixo das chaves de nós sensores no documento `nodes`.
pub const NODE_KEY_PREFIX: &str = "node_";

/// Erros do backend. `Display` repassa a mensagem original.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Http(String),

    #[error("Resposta inválida do backend: {0}")]
    Decode(String),

    #[error("Nenhum usuário autenticado")]
    NotSignedIn,

    #[error("{0}")]
    Cancelled(String),
}

// ──────────────────────────────────────────────
// Autenticação
// ──────────────────────────────────────────────

pub trait AuthRepository: Send + Sync {
    fn login(&self, email: &str, password: &str) -> Result<Identity, BackendError>;
    fn register(&self, email: &str, password: &str) -> Result<Identity, BackendError>;
    fn logout(&self);
    fn current_user(&self) -> Option<Identity>;
    /// Envia o e-mail de redefinição de senha.
    fn send_password_reset(&self, email: &str) -> Result<(), BackendError>;
    /// Altera o nome de exibição do usuário atual. `None` remove o nome.
    fn update_display_name(&self, name: Option<&str>) -> Result<Identity, BackendError>;
}

// ──────────────────────────────────────────────
// Nós sensores
// ──────────────────────────────────────────────

/// Evento entregue a um assinante da coleção `nodes`.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Snapshot completo
    Nodes(Vec<SensorData>),
    /// Assinatura encerrada pelo backend
    Cancelled(String),
}

pub type FeedCallback = Box<dyn Fn(FeedEvent) + Send + Sync>;

/// Assinatura ativa. Desliga em [`Subscription::unsubscribe`] ou no drop.
#[derive(Debug)]
pub struct Subscription {
    active: Arc<AtomicBool>,
}

impl Subscription {
    /// Cria a assinatura e a flag compartilhada com quem entrega os eventos.
    pub fn activate() -> (Self, Arc<AtomicBool>) {
        let active = Arc::new(AtomicBool::new(true));
        (
            Self {
                active: Arc::clone(&active),
            },
            active,
        )
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn unsubscribe(self) {
        // Drop faz o trabalho
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

pub trait SensorRepository: Send + Sync {
    /// Leitura única da coleção.
    fn fetch_nodes(&self) -> Result<Vec<SensorData>, BackendError>;
    /// Entrega um snapshot completo a cada mudança, até a assinatura cair.
    fn subscribe(&self, callback: FeedCallback) -> Result<Subscription, BackendError>;
}

// ──────────────────────────────────────────────
// Dados por usuário
// ──────────────────────────────────────────────

pub trait UserRepository: Send + Sync {
    fn favorites(&self, uid: &str) -> Result<Favorites, BackendError>;
    fn set_favorite(&self, uid: &str, name: &str, favorite: bool) -> Result<(), BackendError>;
    /// Nós atribuídos ao usuário. Vazio = sem restrição.
    fn assigned_sensors(&self, uid: &str) -> Result<Vec<String>, BackendError>;
}

/// Tudo que o dashboard e o watch precisam de um backend.
pub trait Backend: AuthRepository + SensorRepository + UserRepository {}

impl<T: AuthRepository + SensorRepository + UserRepository> Backend for T {}

// ──────────────────────────────────────────────
// Decodificação de documentos
// ──────────────────────────────────────────────

/// Decodifica o documento `nodes`. Só chaves `node_*` contam; filhos
/// inválidos são ignorados.
pub fn decode_nodes(doc: &Value) -> Vec<SensorData> {
    let Value::Object(children) = doc else {
        return Vec::new();
    };

    children
        .iter()
        .filter(|(key, _)| key.starts_with(NODE_KEY_PREFIX))
        .filter_map(|(key, child)| {
            match serde_json::from_value::<SensorData>(child.clone()) {
                Ok(node) => Some(node),
                Err(e) => {
                    debug!("Ignorando {key}: {e}");
                    None
                }
            }
        })
        .collect()
}

/// Decodifica `users/{uid}/assignedSensors`, que pode vir como lista ou mapa.
pub fn decode_assigned(doc: &Value) -> Vec<String> {
    let values: Vec<&Value> = match doc {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => return Vec::new(),
    };

    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}
