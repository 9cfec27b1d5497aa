//! Backend Firebase via REST.
//!
//! - Auth: Identity Toolkit (`accounts:*`), autenticado pela API key
//! - Tokens: Secure Token (`/v1/token`), renovados perto de `expiresIn`
//! - Database: `GET/PUT/DELETE {db}/{path}.json?auth=<idToken>`
//! - Realtime: `GET {db}/nodes.json` com `Accept: text/event-stream`
//!
//! Nenhuma chamada é repetida: um erro volta com a mensagem do servidor.
//! Renovar o token não é retry. Só `auth_revoked` reabre o stream, já
//! com o token novo.

use crate::config::BackendConfig;
use crate::favorites::Favorites;
use crate::repository::{
    AuthRepository, BackendError, FeedCallback, FeedEvent, SensorRepository, Subscription,
    UserRepository, decode_assigned, decode_nodes,
};
use crate::types::{Identity, SensorData};
use reqwest::Url;
use reqwest::blocking::{Client, Response};
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::io::{BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const IDENTITY_BASE: &str = "https://identitytoolkit.googleapis.com/v1";
const SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1/token";

/// Antecedência com que o ID token é renovado.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);
/// Validade assumida quando a resposta não traz `expiresIn`.
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

// ──────────────────────────────────────────────
// Respostas
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    id_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<String>,
}

/// Resposta do Secure Token (campos em snake_case).
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
}

/// `expiresIn` vem como string de segundos.
fn token_ttl(expires_in: Option<&str>) -> Duration {
    expires_in
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_TOKEN_TTL)
}

#[derive(Debug, Clone)]
struct Session {
    identity: Identity,
    id_token: String,
    refresh_token: Option<String>,
    expires_at: Instant,
}

impl Session {
    fn expires_soon(&self, now: Instant) -> bool {
        now + TOKEN_REFRESH_MARGIN >= self.expires_at
    }

    fn renew(&mut self, id_token: String, refresh_token: Option<String>, ttl: Duration, now: Instant) {
        self.id_token = id_token;
        if refresh_token.is_some() {
            self.refresh_token = refresh_token;
        }
        self.expires_at = now + ttl;
    }
}

/// Extrai a mensagem de erro de um corpo de resposta.
///
/// Identity Toolkit usa `{"error":{"message":..}}`; o Realtime Database
/// usa `{"error":"..."}`.
pub fn error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    match &v["error"] {
        Value::String(msg) => Some(msg.clone()),
        Value::Object(obj) => obj.get("message")?.as_str().map(str::to_string),
        _ => None,
    }
}

fn http_error(e: reqwest::Error) -> BackendError {
    BackendError::Http(e.to_string())
}

fn decode_error(e: serde_json::Error) -> BackendError {
    BackendError::Decode(e.to_string())
}

// ──────────────────────────────────────────────
// URLs
// ──────────────────────────────────────────────

/// Monta a URL REST de um caminho do Realtime Database.
///
/// Cada segmento é codificado, então `/`, `?` e `#` num nome de nó não
/// mudam o destino.
pub fn db_url(database_url: &str, segments: &[&str], token: Option<&str>) -> Result<Url, BackendError> {
    let invalid = || BackendError::Http(format!("URL do banco inválida: {database_url}"));
    let mut url = Url::parse(database_url).map_err(|_| invalid())?;
    {
        let mut path = url.path_segments_mut().map_err(|_| invalid())?;
        path.pop_if_empty();
        match segments.split_last() {
            Some((last, parents)) => {
                path.extend(parents);
                path.push(&format!("{last}.json"));
            }
            None => {
                path.push(".json");
            }
        }
    }
    if let Some(token) = token {
        url.query_pairs_mut().append_pair("auth", token);
    }
    Ok(url)
}

/// Segmentos de um caminho da config (`"a/b"` → `["a", "b"]`).
fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

// ──────────────────────────────────────────────
// Cliente REST
// ──────────────────────────────────────────────

/// Parte sem estado do backend; clonável para a thread de streaming.
#[derive(Clone)]
struct Rest {
    http: Client,
    config: BackendConfig,
}

impl Rest {
    fn auth_url(&self, method: &str) -> String {
        format!("{IDENTITY_BASE}/accounts:{method}?key={}", self.config.api_key)
    }

    fn url(&self, segments: &[&str], token: Option<&str>) -> Result<Url, BackendError> {
        db_url(&self.config.database_url, segments, token)
    }

    fn nodes_segments(&self) -> Vec<&str> {
        path_segments(&self.config.nodes_path)
    }

    fn read_body(resp: Response) -> Result<(reqwest::StatusCode, String), BackendError> {
        let status = resp.status();
        let body = resp.text().map_err(http_error)?;
        Ok((status, body))
    }

    fn auth_reply<T: DeserializeOwned>(resp: Response) -> Result<T, BackendError> {
        let (status, text) = Self::read_body(resp)?;
        if !status.is_success() {
            let msg = error_message(&text).unwrap_or_else(|| status.to_string());
            return Err(BackendError::Auth(msg));
        }
        serde_json::from_str(&text).map_err(decode_error)
    }

    fn post_identity<T: DeserializeOwned>(&self, method: &str, body: &Value) -> Result<T, BackendError> {
        let resp = self
            .http
            .post(self.auth_url(method))
            .json(body)
            .send()
            .map_err(http_error)?;
        Self::auth_reply(resp)
    }

    fn refresh(&self, refresh_token: &str) -> Result<RefreshResponse, BackendError> {
        let resp = self
            .http
            .post(format!("{SECURE_TOKEN_URL}?key={}", self.config.api_key))
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .send()
            .map_err(http_error)?;
        Self::auth_reply(resp)
    }

    fn check(status: reqwest::StatusCode, text: &str) -> Result<(), BackendError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(BackendError::Http(
                error_message(text).unwrap_or_else(|| status.to_string()),
            ))
        }
    }

    fn get_document(&self, segments: &[&str], token: Option<&str>) -> Result<Value, BackendError> {
        let resp = self
            .http
            .get(self.url(segments, token)?)
            .send()
            .map_err(http_error)?;
        let (status, text) = Self::read_body(resp)?;
        Self::check(status, &text)?;
        serde_json::from_str(&text).map_err(decode_error)
    }

    fn put_document(&self, segments: &[&str], token: Option<&str>, value: &Value) -> Result<(), BackendError> {
        let resp = self
            .http
            .put(self.url(segments, token)?)
            .json(value)
            .send()
            .map_err(http_error)?;
        let (status, text) = Self::read_body(resp)?;
        Self::check(status, &text)
    }

    fn delete_document(&self, segments: &[&str], token: Option<&str>) -> Result<(), BackendError> {
        let resp = self
            .http
            .delete(self.url(segments, token)?)
            .send()
            .map_err(http_error)?;
        let (status, text) = Self::read_body(resp)?;
        Self::check(status, &text)
    }
}

// ──────────────────────────────────────────────
// Sessão
// ──────────────────────────────────────────────

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sessão compartilhada com a thread do stream.
#[derive(Clone)]
struct Tokens {
    rest: Rest,
    session: Arc<Mutex<Option<Session>>>,
}

impl Tokens {
    /// Token válido para a próxima chamada; `None` sem login.
    fn id_token(&self) -> Result<Option<String>, BackendError> {
        self.get(false)
    }

    /// Token trocado agora, mesmo que o atual ainda pareça válido.
    fn renewed(&self) -> Result<Option<String>, BackendError> {
        self.get(true)
    }

    fn get(&self, force: bool) -> Result<Option<String>, BackendError> {
        let mut guard = lock(&self.session);
        let Some(session) = guard.as_mut() else {
            return Ok(None);
        };
        let now = Instant::now();
        if force || session.expires_soon(now) {
            if let Some(refresh_token) = session.refresh_token.clone() {
                let fresh = self.rest.refresh(&refresh_token).inspect_err(|e| {
                    warn!("Falha ao renovar token de {}: {e}", session.identity.uid);
                })?;
                let ttl = token_ttl(Some(&fresh.expires_in));
                session.renew(fresh.id_token, Some(fresh.refresh_token), ttl, now);
                debug!("Token de {} renovado ({}s)", session.identity.uid, ttl.as_secs());
            }
        }
        Ok(Some(session.id_token.clone()))
    }
}

// ──────────────────────────────────────────────
// Server-sent events
// ──────────────────────────────────────────────

/// Um evento do stream realtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

/// Parser linha a linha de `text/event-stream`.
#[derive(Debug, Default)]
pub struct SseParser {
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    /// Consome uma linha (sem `\n`). Retorna o evento ao fim de um bloco.
    pub fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            let event = self.event.take()?;
            let data = std::mem::take(&mut self.data).join("\n");
            return Some(SseEvent { event, data });
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        let value = value.strip_prefix(' ').unwrap_or(value);
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }
}

/// O que fazer com um evento `put`/`patch`.
#[derive(Debug, PartialEq)]
enum StreamAction {
    /// O evento já traz a coleção inteira
    Snapshot(Value),
    /// Mudança parcial: buscar a coleção de novo
    Refetch,
}

fn stream_action(event: &SseEvent) -> StreamAction {
    if event.event == "put" {
        if let Ok(v) = serde_json::from_str::<Value>(&event.data) {
            if v["path"] == "/" {
                return StreamAction::Snapshot(v["data"].clone());
            }
        }
    }
    StreamAction::Refetch
}

/// Como um stream terminou.
#[derive(Debug, PartialEq, Eq)]
enum StreamEnd {
    /// Fim definitivo; o assinante já recebeu o que precisava
    Finished,
    /// O servidor recusou o token; `delivered` snapshots chegaram antes
    AuthRevoked { delivered: usize },
}

type Refetch<'a> = &'a dyn Fn() -> Result<Value, BackendError>;

fn stream_loop<R: BufRead>(
    reader: R,
    active: &AtomicBool,
    callback: &FeedCallback,
    refetch: Refetch<'_>,
) -> StreamEnd {
    let mut parser = SseParser::default();
    let mut delivered = 0;

    for line in reader.lines() {
        if !active.load(Ordering::Acquire) {
            debug!("Assinatura de nós encerrada pelo cliente");
            return StreamEnd::Finished;
        }
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!("Stream de nós interrompido: {e}");
                callback(FeedEvent::Cancelled(e.to_string()));
                return StreamEnd::Finished;
            }
        };
        let Some(event) = parser.feed_line(&line) else {
            continue;
        };

        match event.event.as_str() {
            "put" | "patch" => {
                let doc = match stream_action(&event) {
                    StreamAction::Snapshot(doc) => Ok(doc),
                    StreamAction::Refetch => refetch(),
                };
                match doc {
                    Ok(doc) => {
                        callback(FeedEvent::Nodes(decode_nodes(&doc)));
                        delivered += 1;
                    }
                    Err(e) => {
                        // Sem retry: a assinatura termina aqui
                        error!("Falha ao buscar nós: {e}");
                        callback(FeedEvent::Cancelled(e.to_string()));
                        return StreamEnd::Finished;
                    }
                }
            }
            "keep-alive" => {}
            "cancel" => {
                let reason = serde_json::from_str::<String>(&event.data)
                    .unwrap_or_else(|_| "Permission denied".into());
                callback(FeedEvent::Cancelled(reason));
                return StreamEnd::Finished;
            }
            "auth_revoked" => {
                info!("Token do stream expirou");
                return StreamEnd::AuthRevoked { delivered };
            }
            other => debug!("Evento ignorado: {other}"),
        }
    }

    if active.load(Ordering::Acquire) {
        callback(FeedEvent::Cancelled("Stream encerrado pelo servidor".into()));
    }
    StreamEnd::Finished
}

/// Segue o stream, reabrindo-o com token novo após `auth_revoked`.
///
/// Dois `auth_revoked` seguidos sem snapshot no meio encerram a assinatura.
fn follow_stream<R, O>(
    first: R,
    mut reopen: O,
    active: &AtomicBool,
    callback: &FeedCallback,
    refetch: Refetch<'_>,
) where
    R: BufRead,
    O: FnMut() -> Result<R, BackendError>,
{
    let mut reader = first;
    let mut revoked_idle = false;
    loop {
        let delivered = match stream_loop(reader, active, callback, refetch) {
            StreamEnd::Finished => return,
            StreamEnd::AuthRevoked { delivered } => delivered,
        };
        if !active.load(Ordering::Acquire) {
            return;
        }
        if delivered == 0 && revoked_idle {
            warn!("Token recusado logo após a renovação");
            callback(FeedEvent::Cancelled("auth_revoked".into()));
            return;
        }
        revoked_idle = delivered == 0;

        reader = match reopen() {
            Ok(r) => r,
            Err(e) => {
                error!("Falha ao reabrir o stream: {e}");
                callback(FeedEvent::Cancelled(e.to_string()));
                return;
            }
        };
    }
}

fn open_stream(http: &Client, url: Url) -> Result<BufReader<Response>, BackendError> {
    let resp = http
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .send()
        .map_err(http_error)?;
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().unwrap_or_default();
        return Err(BackendError::Http(
            error_message(&text).unwrap_or_else(|| status.to_string()),
        ));
    }
    Ok(BufReader::new(resp))
}

// ──────────────────────────────────────────────
// Backend
// ──────────────────────────────────────────────

/// Backend Firebase (Auth + Realtime Database).
pub struct FirebaseBackend {
    rest: Rest,
    stream_http: Client,
    tokens: Tokens,
}

impl FirebaseBackend {
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(http_error)?;
        // O stream fica aberto indefinidamente
        let stream_http = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(http_error)?;

        info!("Backend Firebase: {}", config.database_url);
        let rest = Rest { http, config };
        Ok(Self {
            tokens: Tokens {
                rest: rest.clone(),
                session: Arc::new(Mutex::new(None)),
            },
            rest,
            stream_http,
        })
    }

    fn start_session(&self, resp: AuthResponse, fallback_email: &str) -> Result<Identity, BackendError> {
        let id_token = resp
            .id_token
            .ok_or_else(|| BackendError::Decode("idToken ausente".into()))?;
        let identity = Identity {
            uid: resp.local_id,
            email: resp.email.or_else(|| Some(fallback_email.to_string())),
            display_name: resp.display_name.filter(|n| !n.is_empty()),
        };
        *lock(&self.tokens.session) = Some(Session {
            identity: identity.clone(),
            id_token,
            refresh_token: resp.refresh_token,
            expires_at: Instant::now() + token_ttl(resp.expires_in.as_deref()),
        });
        Ok(identity)
    }

    /// Documento bruto em `path` (vazio = raiz).
    pub fn fetch_document(&self, path: &str) -> Result<Value, BackendError> {
        let token = self.tokens.id_token()?;
        self.rest.get_document(&path_segments(path), token.as_deref())
    }
}

impl AuthRepository for FirebaseBackend {
    fn login(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let resp: AuthResponse = self.rest.post_identity("signInWithPassword", &body)?;
        let identity = self.start_session(resp, email)?;
        info!("Login: {email} ({})", identity.uid);
        Ok(identity)
    }

    fn register(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let body = json!({ "email": email, "password": password, "returnSecureToken": true });
        let resp: AuthResponse = self.rest.post_identity("signUp", &body).inspect_err(|e| {
            error!("Falha no registro: {e}");
        })?;
        let identity = self.start_session(resp, email)?;
        info!("Usuário registrado: {}", identity.uid);
        Ok(identity)
    }

    fn logout(&self) {
        *lock(&self.tokens.session) = None;
    }

    fn current_user(&self) -> Option<Identity> {
        lock(&self.tokens.session).as_ref().map(|s| s.identity.clone())
    }

    fn send_password_reset(&self, email: &str) -> Result<(), BackendError> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        let _: Value = self.rest.post_identity("sendOobCode", &body)?;
        Ok(())
    }

    fn update_display_name(&self, name: Option<&str>) -> Result<Identity, BackendError> {
        let token = self.tokens.id_token()?.ok_or(BackendError::NotSignedIn)?;
        let body = match name.filter(|n| !n.is_empty()) {
            Some(name) => json!({ "idToken": token, "displayName": name, "returnSecureToken": true }),
            None => json!({ "idToken": token, "deleteAttribute": ["DISPLAY_NAME"], "returnSecureToken": true }),
        };
        let resp: AuthResponse = self.rest.post_identity("update", &body)?;

        let mut session = lock(&self.tokens.session);
        let session = session.as_mut().ok_or(BackendError::NotSignedIn)?;
        session.identity.display_name = resp.display_name.filter(|n| !n.is_empty());
        if let Some(new_token) = resp.id_token {
            let ttl = token_ttl(resp.expires_in.as_deref());
            session.renew(new_token, resp.refresh_token, ttl, Instant::now());
        }
        Ok(session.identity.clone())
    }
}

impl SensorRepository for FirebaseBackend {
    fn fetch_nodes(&self) -> Result<Vec<SensorData>, BackendError> {
        let doc = self.fetch_document(&self.rest.config.nodes_path)?;
        Ok(decode_nodes(&doc))
    }

    fn subscribe(&self, callback: FeedCallback) -> Result<Subscription, BackendError> {
        let token = self.tokens.id_token()?;
        let url = self.rest.url(&self.rest.nodes_segments(), token.as_deref())?;
        let first = open_stream(&self.stream_http, url)?;

        let (subscription, active) = Subscription::activate();
        let rest = self.rest.clone();
        let tokens = self.tokens.clone();
        let http = self.stream_http.clone();

        std::thread::Builder::new()
            .name("nodes-stream".into())
            .spawn(move || {
                let refetch = || -> Result<Value, BackendError> {
                    let token = tokens.id_token()?;
                    rest.get_document(&rest.nodes_segments(), token.as_deref())
                };
                let reopen = || -> Result<BufReader<Response>, BackendError> {
                    let token = tokens.renewed()?;
                    open_stream(&http, rest.url(&rest.nodes_segments(), token.as_deref())?)
                };
                follow_stream(first, reopen, &active, &callback, &refetch);
            })
            .map_err(|e| BackendError::Http(e.to_string()))?;

        info!("Assinatura realtime de /{} ativa", self.rest.config.nodes_path);
        Ok(subscription)
    }
}

impl UserRepository for FirebaseBackend {
    fn favorites(&self, uid: &str) -> Result<Favorites, BackendError> {
        let token = self.tokens.id_token()?;
        let doc = self
            .rest
            .get_document(&["users", uid, "favorites"], token.as_deref())?;
        Ok(Favorites::from_document(&doc))
    }

    fn set_favorite(&self, uid: &str, name: &str, favorite: bool) -> Result<(), BackendError> {
        let segments = ["users", uid, "favorites", name];
        let token = self.tokens.id_token()?;
        if favorite {
            self.rest.put_document(&segments, token.as_deref(), &Value::Bool(true))
        } else {
            self.rest.delete_document(&segments, token.as_deref())
        }
    }

    fn assigned_sensors(&self, uid: &str) -> Result<Vec<String>, BackendError> {
        let token = self.tokens.id_token()?;
        let doc = self
            .rest
            .get_document(&["users", uid, "assignedSensors"], token.as_deref())?;
        Ok(decode_assigned(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor, Read};

    fn url(segments: &[&str], token: Option<&str>) -> String {
        db_url("https://ldms.firebaseio.com/", segments, token)
            .unwrap()
            .to_string()
    }

    #[test]
    fn db_urls() {
        assert_eq!(url(&["nodes"], None), "https://ldms.firebaseio.com/nodes.json");
        assert_eq!(
            url(&["users", "u1", "favorites", "node_1"], Some("tok")),
            "https://ldms.firebaseio.com/users/u1/favorites/node_1.json?auth=tok"
        );
        assert_eq!(
            db_url("https://x.io", &[], None).unwrap().to_string(),
            "https://x.io/.json"
        );
        assert_eq!(path_segments("/users//u1/"), vec!["users", "u1"]);
        assert!(db_url("not a url", &["nodes"], None).is_err());
    }

    #[test]
    fn node_names_cannot_escape_their_segment() {
        assert_eq!(
            url(&["users", "u1", "favorites", "a/b?x#y"], Some("t&k=1")),
            "https://ldms.firebaseio.com/users/u1/favorites/a%2Fb%3Fx%23y.json?auth=t%26k%3D1"
        );
        assert_eq!(
            url(&["users", "u1", "favorites", ".."], None),
            "https://ldms.firebaseio.com/users/u1/favorites/...json"
        );
    }

    #[test]
    fn error_messages_from_both_apis() {
        let identity = r#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND","errors":[]}}"#;
        assert_eq!(error_message(identity).as_deref(), Some("EMAIL_NOT_FOUND"));

        let database = r#"{"error":"Permission denied"}"#;
        assert_eq!(error_message(database).as_deref(), Some("Permission denied"));

        let refresh = r#"{"error":{"code":400,"message":"TOKEN_EXPIRED","status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(error_message(refresh).as_deref(), Some("TOKEN_EXPIRED"));

        assert!(error_message("<html>502</html>").is_none());
        assert!(error_message(r#"{"ok":true}"#).is_none());
    }

    // ── Sessão ──

    fn identity() -> Identity {
        Identity {
            uid: "abc".into(),
            email: Some("a@b.c".into()),
            display_name: None,
        }
    }

    #[test]
    fn auth_response_decodes() {
        let body = r#"{"kind":"x","localId":"abc","email":"a@b.c","idToken":"t","refreshToken":"r","expiresIn":"3600"}"#;
        let resp: AuthResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.local_id, "abc");
        assert_eq!(resp.id_token.as_deref(), Some("t"));
        assert_eq!(resp.refresh_token.as_deref(), Some("r"));
        assert_eq!(token_ttl(resp.expires_in.as_deref()), Duration::from_secs(3600));
        assert!(resp.display_name.is_none());
    }

    #[test]
    fn refresh_response_decodes() {
        let body = r#"{"expires_in":"3600","token_type":"Bearer","refresh_token":"r2","id_token":"t2","user_id":"abc","project_id":"1234"}"#;
        let resp: RefreshResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.id_token, "t2");
        assert_eq!(resp.refresh_token, "r2");
        assert_eq!(token_ttl(Some(&resp.expires_in)), Duration::from_secs(3600));
    }

    #[test]
    fn token_ttl_defaults_to_one_hour() {
        assert_eq!(token_ttl(None), DEFAULT_TOKEN_TTL);
        assert_eq!(token_ttl(Some("soon")), DEFAULT_TOKEN_TTL);
        assert_eq!(token_ttl(Some(" 120 ")), Duration::from_secs(120));
    }

    #[test]
    fn session_renews_near_expiry() {
        let start = Instant::now();
        let mut session = Session {
            identity: identity(),
            id_token: "t1".into(),
            refresh_token: Some("r1".into()),
            expires_at: start + Duration::from_secs(3600),
        };
        assert!(!session.expires_soon(start));
        assert!(!session.expires_soon(start + Duration::from_secs(3299)));
        assert!(session.expires_soon(start + Duration::from_secs(3300)));
        assert!(session.expires_soon(start + Duration::from_secs(4000)));

        // sem refresh token novo, o anterior continua valendo
        let later = start + Duration::from_secs(3400);
        session.renew("t2".into(), None, Duration::from_secs(3600), later);
        assert_eq!(session.id_token, "t2");
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));
        assert!(!session.expires_soon(later));
    }

    #[test]
    fn valid_token_is_used_without_refresh() {
        let rest = Rest {
            http: Client::new(),
            config: BackendConfig::default(),
        };
        let tokens = Tokens {
            rest,
            session: Arc::new(Mutex::new(None)),
        };
        assert_eq!(tokens.id_token().unwrap(), None);
        // sem login não há o que renovar
        assert_eq!(tokens.renewed().unwrap(), None);

        *lock(&tokens.session) = Some(Session {
            identity: identity(),
            id_token: "t1".into(),
            refresh_token: Some("r1".into()),
            expires_at: Instant::now() + Duration::from_secs(3600),
        });
        assert_eq!(tokens.id_token().unwrap().as_deref(), Some("t1"));

        // sem refresh token, um token vencido segue até o servidor recusar
        if let Some(s) = lock(&tokens.session).as_mut() {
            s.refresh_token = None;
            s.expires_at = Instant::now();
        }
        assert_eq!(tokens.renewed().unwrap().as_deref(), Some("t1"));
    }

    // ── Server-sent events ──

    #[test]
    fn sse_parser_emits_on_blank_line() {
        let mut p = SseParser::default();
        assert!(p.feed_line("event: put").is_none());
        assert!(p.feed_line(r#"data: {"path":"/","data":null}"#).is_none());
        let ev = p.feed_line("").unwrap();
        assert_eq!(ev.event, "put");
        assert_eq!(ev.data, r#"{"path":"/","data":null}"#);

        // comentário e linha em branco sem evento
        assert!(p.feed_line(": ping").is_none());
        assert!(p.feed_line("").is_none());
    }

    #[test]
    fn sse_parser_handles_crlf_and_keep_alive() {
        let mut p = SseParser::default();
        p.feed_line("event: keep-alive\r");
        p.feed_line("data: null\r");
        let ev = p.feed_line("\r").unwrap();
        assert_eq!(ev, SseEvent { event: "keep-alive".into(), data: "null".into() });
    }

    #[test]
    fn root_put_is_a_snapshot() {
        let ev = SseEvent {
            event: "put".into(),
            data: r#"{"path":"/","data":{"node_1":{"nodeName":"node_1","tilt":20}}}"#.into(),
        };
        match stream_action(&ev) {
            StreamAction::Snapshot(doc) => {
                let nodes = decode_nodes(&doc);
                assert_eq!(nodes.len(), 1);
                assert_eq!(nodes[0].tilt, Some(20.0));
            }
            other => panic!("esperado snapshot, veio {other:?}"),
        }
    }

    #[test]
    fn partial_changes_refetch() {
        let put_child = SseEvent {
            event: "put".into(),
            data: r#"{"path":"/node_1/tilt","data":3}"#.into(),
        };
        assert_eq!(stream_action(&put_child), StreamAction::Refetch);

        let patch = SseEvent {
            event: "patch".into(),
            data: r#"{"path":"/","data":{"node_2":{}}}"#.into(),
        };
        assert_eq!(stream_action(&patch), StreamAction::Refetch);
    }

    // ── Stream ──

    fn sse(events: &[(&str, &str)]) -> Cursor<Vec<u8>> {
        let mut text = String::new();
        for (event, data) in events {
            text.push_str(&format!("event: {event}\ndata: {data}\n\n"));
        }
        Cursor::new(text.into_bytes())
    }

    const ONE_NODE: &str = r#"{"path":"/","data":{"node_1":{"nodeName":"node_1","tilt":5}}}"#;

    fn recorder() -> (FeedCallback, Arc<Mutex<Vec<FeedEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        (Box::new(move |e| lock(&sink).push(e)), events)
    }

    fn names(event: &FeedEvent) -> Vec<String> {
        match event {
            FeedEvent::Nodes(nodes) => nodes.iter().map(|n| n.name_or("?").to_string()).collect(),
            FeedEvent::Cancelled(reason) => panic!("esperado Nodes, veio Cancelled({reason})"),
        }
    }

    fn two_nodes() -> Result<Value, BackendError> {
        Ok(json!({
            "node_1": { "nodeName": "node_1" },
            "node_2": { "nodeName": "node_2" },
        }))
    }

    #[test]
    fn stream_dispatches_snapshots_and_refetches() {
        let refetches = std::sync::atomic::AtomicUsize::new(0);
        let refetch = || -> Result<Value, BackendError> {
            refetches.fetch_add(1, Ordering::Relaxed);
            two_nodes()
        };
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let stream = sse(&[
            ("put", ONE_NODE),
            ("keep-alive", "null"),
            ("put", r#"{"path":"/node_2","data":{"nodeName":"node_2"}}"#),
            ("patch", r#"{"path":"/node_1","data":{"tilt":9}}"#),
            ("rules_debug", "null"),
        ]);

        assert_eq!(stream_loop(stream, &active, &callback, &refetch), StreamEnd::Finished);
        assert_eq!(refetches.load(Ordering::Relaxed), 2);

        let events = lock(&events);
        assert_eq!(events.len(), 4);
        assert_eq!(names(&events[0]), vec!["node_1"]);
        assert_eq!(names(&events[1]), vec!["node_1", "node_2"]);
        assert_eq!(names(&events[2]), vec!["node_1", "node_2"]);
        // o servidor fechou com a assinatura ativa
        assert!(matches!(&events[3], FeedEvent::Cancelled(r) if r == "Stream encerrado pelo servidor"));
    }

    #[test]
    fn cancel_ends_with_the_server_reason() {
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let stream = sse(&[
            ("put", ONE_NODE),
            ("cancel", r#""Permission denied""#),
            ("put", ONE_NODE),
        ]);

        assert_eq!(stream_loop(stream, &active, &callback, &two_nodes), StreamEnd::Finished);
        let events = lock(&events);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], FeedEvent::Cancelled(r) if r == "Permission denied"));
    }

    #[test]
    fn failed_refetch_cancels_once() {
        let refetch = || -> Result<Value, BackendError> { Err(BackendError::Http("401 Unauthorized".into())) };
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let stream = sse(&[("patch", r#"{"path":"/node_1","data":{}}"#), ("put", ONE_NODE)]);

        assert_eq!(stream_loop(stream, &active, &callback, &refetch), StreamEnd::Finished);
        let events = lock(&events);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], FeedEvent::Cancelled(r) if r.contains("401")));
    }

    struct Reset;

    impl Read for Reset {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "conexão perdida"))
        }
    }

    #[test]
    fn broken_stream_cancels_once() {
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let stream = BufReader::new(sse(&[("put", ONE_NODE)]).chain(Reset));

        assert_eq!(stream_loop(stream, &active, &callback, &two_nodes), StreamEnd::Finished);
        let events = lock(&events);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], FeedEvent::Cancelled(r) if r == "conexão perdida"));
    }

    #[test]
    fn stream_after_unsubscribe_stays_silent() {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        // o cliente cancela ao receber o primeiro snapshot
        let callback: FeedCallback = Box::new(move |e| {
            flag.store(false, Ordering::Release);
            lock(&sink).push(e);
        });
        let stream = sse(&[("put", ONE_NODE), ("put", ONE_NODE)]);

        assert_eq!(stream_loop(stream, &active, &callback, &two_nodes), StreamEnd::Finished);
        assert_eq!(lock(&events).len(), 1);

        // fim do stream com a assinatura já inativa
        let (callback, events) = recorder();
        let stream = sse(&[("keep-alive", "null")]);
        assert_eq!(stream_loop(stream, &active, &callback, &two_nodes), StreamEnd::Finished);
        assert!(lock(&events).is_empty());
    }

    #[test]
    fn auth_revoked_is_returned_to_the_caller() {
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let stream = sse(&[("put", ONE_NODE), ("auth_revoked", r#""credential is no longer valid""#)]);

        assert_eq!(
            stream_loop(stream, &active, &callback, &two_nodes),
            StreamEnd::AuthRevoked { delivered: 1 }
        );
        assert_eq!(lock(&events).len(), 1);
    }

    #[test]
    fn revoked_stream_reopens_with_a_new_token() {
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let mut reopened = 0;
        let reopen = || -> Result<Cursor<Vec<u8>>, BackendError> {
            reopened += 1;
            Ok(sse(&[(
                "put",
                r#"{"path":"/","data":{"node_1":{"nodeName":"node_1"},"node_2":{"nodeName":"node_2"}}}"#,
            )]))
        };
        let first = sse(&[("put", ONE_NODE), ("auth_revoked", "null")]);

        follow_stream(first, reopen, &active, &callback, &two_nodes);
        assert_eq!(reopened, 1);

        let events = lock(&events);
        assert_eq!(events.len(), 3);
        assert_eq!(names(&events[0]), vec!["node_1"]);
        assert_eq!(names(&events[1]), vec!["node_1", "node_2"]);
        assert!(matches!(&events[2], FeedEvent::Cancelled(_)));
    }

    #[test]
    fn revoked_stream_gives_up_when_reopen_fails() {
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let reopen = || -> Result<Cursor<Vec<u8>>, BackendError> {
            Err(BackendError::Auth("TOKEN_EXPIRED".into()))
        };
        let first = sse(&[("put", ONE_NODE), ("auth_revoked", "null")]);

        follow_stream(first, reopen, &active, &callback, &two_nodes);
        let events = lock(&events);
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], FeedEvent::Cancelled(r) if r.contains("TOKEN_EXPIRED")));
    }

    #[test]
    fn repeated_revoke_without_data_cancels() {
        let (callback, events) = recorder();
        let active = AtomicBool::new(true);
        let mut reopened = 0;
        let reopen = || -> Result<Cursor<Vec<u8>>, BackendError> {
            reopened += 1;
            Ok(sse(&[("auth_revoked", "null")]))
        };
        let first = sse(&[("auth_revoked", "null")]);

        follow_stream(first, reopen, &active, &callback, &two_nodes);
        assert_eq!(reopened, 1);
        let events = lock(&events);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], FeedEvent::Cancelled(r) if r == "auth_revoked"));
    }
}
