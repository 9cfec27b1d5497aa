//! Backend em memória.
//!
//! Mesmo layout de documentos do backend real (`nodes`, `users/{uid}/…`),
//! com contas locais. Serve aos testes e ao modo `--demo`.

use crate::favorites::Favorites;
use crate::repository::{
    AuthRepository, BackendError, FeedCallback, FeedEvent, SensorRepository, Subscription,
    UserRepository, decode_assigned, decode_nodes,
};
use crate::types::{Identity, SensorData};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    uid: String,
    password: String,
    display_name: Option<String>,
}

struct Listener {
    active: Arc<AtomicBool>,
    callback: Arc<FeedCallback>,
}

/// Backend completo em memória.
pub struct MemoryBackend {
    root: Mutex<Value>,
    accounts: Mutex<BTreeMap<String, Account>>,
    session: Mutex<Option<Identity>>,
    listeners: Mutex<Vec<Listener>>,
    reset_requests: Mutex<Vec<String>>,
    next_uid: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Lock que sobrevive a um panic em outra thread.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Garante que `v[key]` é um objeto e o retorna.
fn object_child<'a>(v: &'a mut Value, key: &str) -> &'a mut Value {
    if !v.is_object() {
        *v = Value::Object(Map::new());
    }
    let child = &mut v[key];
    if !child.is_object() {
        *child = Value::Object(Map::new());
    }
    child
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            root: Mutex::new(json!({ "nodes": {}, "users": {} })),
            accounts: Mutex::new(BTreeMap::new()),
            session: Mutex::new(None),
            listeners: Mutex::new(Vec::new()),
            reset_requests: Mutex::new(Vec::new()),
            next_uid: AtomicU64::new(1),
        }
    }

    /// Cópia do documento raiz.
    pub fn document(&self) -> Value {
        lock(&self.root).clone()
    }

    /// Grava (ou substitui) um nó e notifica os assinantes.
    pub fn put_node(&self, key: &str, node: &SensorData) {
        let value = serde_json::to_value(node).unwrap_or(Value::Null);
        {
            let mut root = lock(&self.root);
            if let Value::Object(nodes) = object_child(&mut root, "nodes") {
                nodes.insert(key.to_string(), value);
            }
        }
        self.notify();
    }

    /// Grava vários nós com uma única notificação.
    pub fn put_nodes<'a, I>(&self, nodes: I)
    where
        I: IntoIterator<Item = (&'a str, SensorData)>,
    {
        {
            let mut root = lock(&self.root);
            if let Value::Object(map) = object_child(&mut root, "nodes") {
                for (key, node) in nodes {
                    let value = serde_json::to_value(&node).unwrap_or(Value::Null);
                    map.insert(key.to_string(), value);
                }
            }
        }
        self.notify();
    }

    /// Grava um valor bruto na coleção `nodes`, sem validar.
    pub fn put_raw_node(&self, key: &str, value: Value) {
        {
            let mut root = lock(&self.root);
            if let Value::Object(nodes) = object_child(&mut root, "nodes") {
                nodes.insert(key.to_string(), value);
            }
        }
        self.notify();
    }

    pub fn remove_node(&self, key: &str) {
        let removed = {
            let mut root = lock(&self.root);
            match object_child(&mut root, "nodes") {
                Value::Object(nodes) => nodes.remove(key).is_some(),
                _ => false,
            }
        };
        if removed {
            self.notify();
        }
    }

    /// Define `users/{uid}/assignedSensors`.
    pub fn set_assigned(&self, uid: &str, names: &[&str]) {
        let mut root = lock(&self.root);
        let users = object_child(&mut root, "users");
        let user = object_child(users, uid);
        if let Value::Object(map) = user {
            map.insert("assignedSensors".into(), json!(names));
        }
    }

    /// E-mails para os quais uma redefinição de senha foi pedida.
    pub fn reset_requests(&self) -> Vec<String> {
        lock(&self.reset_requests).clone()
    }

    /// Encerra todas as assinaturas como o backend faria ao revogar acesso.
    pub fn cancel_subscriptions(&self, reason: &str) {
        let listeners: Vec<Listener> = lock(&self.listeners).drain(..).collect();
        for l in listeners {
            if l.active.load(Ordering::Acquire) {
                (l.callback)(FeedEvent::Cancelled(reason.to_string()));
            }
        }
    }

    /// Assinaturas ainda ativas.
    pub fn subscriber_count(&self) -> usize {
        let mut listeners = lock(&self.listeners);
        listeners.retain(|l| l.active.load(Ordering::Acquire));
        listeners.len()
    }

    fn snapshot(&self) -> Vec<SensorData> {
        let root = lock(&self.root);
        decode_nodes(&root["nodes"])
    }

    fn notify(&self) {
        let callbacks: Vec<Arc<FeedCallback>> = {
            let mut listeners = lock(&self.listeners);
            listeners.retain(|l| l.active.load(Ordering::Acquire));
            listeners.iter().map(|l| Arc::clone(&l.callback)).collect()
        };
        if callbacks.is_empty() {
            return;
        }

        let nodes = self.snapshot();
        debug!("Notificando {} assinantes ({} nós)", callbacks.len(), nodes.len());
        for cb in callbacks {
            cb(FeedEvent::Nodes(nodes.clone()));
        }
    }

    fn user_doc(&self, uid: &str, key: &str) -> Value {
        let root = lock(&self.root);
        root["users"][uid][key].clone()
    }

    fn sign_in(&self, email: &str, account: &Account) -> Identity {
        let identity = Identity {
            uid: account.uid.clone(),
            email: Some(email.to_string()),
            display_name: account.display_name.clone(),
        };
        *lock(&self.session) = Some(identity.clone());
        identity
    }
}

impl AuthRepository for MemoryBackend {
    fn login(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let account = lock(&self.accounts)
            .get(email)
            .cloned()
            .ok_or_else(|| BackendError::Auth("EMAIL_NOT_FOUND".into()))?;
        if account.password != password {
            return Err(BackendError::Auth("INVALID_PASSWORD".into()));
        }
        let identity = self.sign_in(email, &account);
        info!("Login: {email} ({})", identity.uid);
        Ok(identity)
    }

    fn register(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        if !email.contains('@') {
            return Err(BackendError::Auth("INVALID_EMAIL".into()));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(BackendError::Auth(format!(
                "WEAK_PASSWORD : Password should be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let account = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(email) {
                return Err(BackendError::Auth("EMAIL_EXISTS".into()));
            }
            let account = Account {
                uid: format!("uid-{}", self.next_uid.fetch_add(1, Ordering::Relaxed)),
                password: password.to_string(),
                display_name: None,
            };
            accounts.insert(email.to_string(), account.clone());
            account
        };
        let identity = self.sign_in(email, &account);
        info!("Usuário registrado: {}", identity.uid);
        Ok(identity)
    }

    fn logout(&self) {
        *lock(&self.session) = None;
    }

    fn current_user(&self) -> Option<Identity> {
        lock(&self.session).clone()
    }

    fn send_password_reset(&self, email: &str) -> Result<(), BackendError> {
        if !lock(&self.accounts).contains_key(email) {
            return Err(BackendError::Auth("EMAIL_NOT_FOUND".into()));
        }
        lock(&self.reset_requests).push(email.to_string());
        Ok(())
    }

    fn update_display_name(&self, name: Option<&str>) -> Result<Identity, BackendError> {
        let mut session = lock(&self.session);
        let identity = session.as_mut().ok_or(BackendError::NotSignedIn)?;
        let name = name.filter(|n| !n.is_empty()).map(str::to_string);

        if let Some(email) = &identity.email {
            if let Some(account) = lock(&self.accounts).get_mut(email) {
                account.display_name = name.clone();
            }
        }
        identity.display_name = name;
        Ok(identity.clone())
    }
}

impl SensorRepository for MemoryBackend {
    fn fetch_nodes(&self) -> Result<Vec<SensorData>, BackendError> {
        Ok(self.snapshot())
    }

    fn subscribe(&self, callback: FeedCallback) -> Result<Subscription, BackendError> {
        let (subscription, active) = Subscription::activate();
        let callback = Arc::new(callback);

        // Como no backend real, o primeiro evento é o estado atual
        callback(FeedEvent::Nodes(self.snapshot()));

        lock(&self.listeners).push(Listener { active, callback });
        Ok(subscription)
    }
}

impl UserRepository for MemoryBackend {
    fn favorites(&self, uid: &str) -> Result<Favorites, BackendError> {
        Ok(Favorites::from_document(&self.user_doc(uid, "favorites")))
    }

    fn set_favorite(&self, uid: &str, name: &str, favorite: bool) -> Result<(), BackendError> {
        let mut root = lock(&self.root);
        let users = object_child(&mut root, "users");
        let user = object_child(users, uid);
        let favorites = object_child(user, "favorites");
        if let Value::Object(map) = favorites {
            if favorite {
                map.insert(name.to_string(), Value::Bool(true));
            } else {
                map.remove(name);
            }
        }
        Ok(())
    }

    fn assigned_sensors(&self, uid: &str) -> Result<Vec<String>, BackendError> {
        Ok(decode_assigned(&self.user_doc(uid, "assignedSensors")))
    }
}
