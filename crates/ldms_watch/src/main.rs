//! # LDMS Watch
//!
//! Acompanha a coleção `nodes` do backend e envia um push via UDP para os
//! dashboards sempre que um nó passa para o nível `High`.
//!
//! ## Uso
//! ```bash
//! LDMS_EMAIL=... LDMS_PASSWORD=... ldms_watch   # Backend Firebase do config.toml
//! ldms_watch --demo                             # Backend em memória com simulação
//! ldms_watch --validate                         # Verifica o layout dos dados e sai
//! ```

mod watcher;

use crossbeam_channel::RecvTimeoutError;
use ldms_core::config::{AppConfig, WatchConfig};
use ldms_core::demo;
use ldms_core::firebase::FirebaseBackend;
use ldms_core::memory::MemoryBackend;
use ldms_core::notification::{LogNotifier, Notifier};
use ldms_core::repository::{
    AuthRepository, Backend, BackendError, FeedEvent, SensorRepository, UserRepository,
};
use ldms_core::validator::validate_database;
use serde_json::Value;
use std::net::UdpSocket;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use watcher::{NodeWatcher, forward_feed};

/// Intervalo entre passos da simulação no modo demo.
const DEMO_TICK: Duration = Duration::from_secs(2);

/// De onde vêm os dados.
enum Source {
    Demo(Arc<MemoryBackend>),
    Firebase(Arc<FirebaseBackend>),
}

impl Source {
    fn backend(&self) -> Arc<dyn Backend> {
        match self {
            Source::Demo(m) => m.clone(),
            Source::Firebase(fb) => fb.clone(),
        }
    }

    fn root_document(&self) -> Result<Value, BackendError> {
        match self {
            Source::Demo(m) => Ok(m.document()),
            Source::Firebase(fb) => fb.fetch_document(""),
        }
    }

    /// Avança a simulação quando em modo demo.
    fn tick(&self, tick: u64) {
        if let Source::Demo(m) = self {
            demo::step(m, tick);
        }
    }

    fn is_demo(&self) -> bool {
        matches!(self, Source::Demo(_))
    }
}

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let validate_only = args.iter().any(|a| a == "--validate");

    // ── Carregar config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }
    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    // ── Backend ──
    let source = if args.iter().any(|a| a == "--demo") || config.backend.database_url.is_empty() {
        let memory = MemoryBackend::new();
        demo::seed(&memory);
        Source::Demo(Arc::new(memory))
    } else {
        match FirebaseBackend::new(config.backend.clone()) {
            Ok(fb) => Source::Firebase(Arc::new(fb)),
            Err(e) => {
                error!("Falha ao criar cliente HTTP: {e}");
                std::process::exit(1);
            }
        }
    };
    let backend = source.backend();

    // ── Login ──
    let (email, password) = if source.is_demo() {
        (demo::DEMO_EMAIL.to_string(), demo::DEMO_PASSWORD.to_string())
    } else {
        match (std::env::var("LDMS_EMAIL"), std::env::var("LDMS_PASSWORD")) {
            (Ok(e), Ok(p)) => (e, p),
            _ => {
                error!("Defina LDMS_EMAIL e LDMS_PASSWORD");
                std::process::exit(1);
            }
        }
    };
    let identity = match backend.login(&email, &password) {
        Ok(id) => id,
        Err(e) => {
            error!("Falha no login de {email}: {e}");
            std::process::exit(1);
        }
    };

    if validate_only {
        std::process::exit(run_validation(&source, &config.backend.nodes_path));
    }

    let mut watcher = NodeWatcher::new();
    match backend.assigned_sensors(&identity.uid) {
        Ok(names) => watcher.set_assigned(names),
        Err(e) => warn!("Sem lista de nós atribuídos ({e}); monitorando todos"),
    }

    // ── Socket UDP ──
    let sock = match open_socket(&config.watch) {
        Ok(s) => s,
        Err(e) => {
            error!("Falha ao criar socket UDP: {e}");
            std::process::exit(1);
        }
    };
    let dest_addr = format!("{}:{}", config.watch.dest_ip, config.watch.port);

    // ── Assinatura ──
    let (tx, rx) = crossbeam_channel::bounded::<FeedEvent>(16);
    let subscription = backend.subscribe(Box::new(move |event| forward_feed(&tx, event)));
    let subscription = match subscription {
        Ok(s) => s,
        Err(e) => {
            error!("Falha ao assinar /{}: {e}", config.backend.nodes_path);
            std::process::exit(1);
        }
    };

    // ── Banner ──
    let backend_label = if source.is_demo() {
        "demo (memória)"
    } else {
        config.backend.database_url.as_str()
    };
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⛰  LDMS WATCH – ATIVO");
    println!("══════════════════════════════════════════════");
    println!("  Usuário:   {}", identity.email.as_deref().unwrap_or(identity.uid.as_str()));
    println!("  Backend:   {backend_label}");
    println!("  Destino:   {dest_addr}");
    println!("  Protocolo: bincode v{}", ldms_core::PROTOCOL_VERSION);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    let mut tick = 1u64;
    let mut last_tick = Instant::now();
    let mut notifier = LogNotifier::default();

    loop {
        match rx.recv_timeout(DEMO_TICK) {
            Ok(FeedEvent::Nodes(nodes)) => {
                for (notification, frame) in watcher.frames(nodes) {
                    let name = notification.sensor().unwrap_or("-");
                    match frame {
                        Ok(frame) => match sock.send_to(&frame, &dest_addr) {
                            Ok(sent) => {
                                info!("→ {sent} bytes para {dest_addr} | {name} em HIGH");
                                notifier.post(&notification);
                            }
                            Err(e) => error!("Erro ao enviar UDP: {e}"),
                        },
                        Err(e) => error!("Erro ao serializar push de {name}: {e}"),
                    }
                }
            }
            Ok(FeedEvent::Cancelled(reason)) => {
                error!("Assinatura encerrada pelo backend: {reason}");
                break;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Canal de snapshots fechado");
                break;
            }
        }

        if last_tick.elapsed() >= DEMO_TICK {
            source.tick(tick);
            tick += 1;
            last_tick = Instant::now();
        }
    }

    let s = watcher.summary();
    info!(
        "Encerrando após {} snapshots ({} nós, {} em HIGH, {} pushes enviados)",
        watcher.snapshots(),
        s.total,
        s.high,
        notifier.posted
    );
    subscription.unsubscribe();
    std::process::exit(1);
}

fn open_socket(cfg: &WatchConfig) -> std::io::Result<UdpSocket> {
    let bind_addr = if cfg.bind_ip.is_empty() {
        "0.0.0.0:0".to_string()
    } else {
        format!("{}:0", cfg.bind_ip)
    };
    let sock = UdpSocket::bind(bind_addr)?;

    if cfg.mode == "broadcast" || cfg.dest_ip == "255.255.255.255" {
        sock.set_broadcast(true)?;
        info!("Modo BROADCAST ativado");
    } else {
        info!("Modo UNICAST → {}", cfg.dest_ip);
    }
    Ok(sock)
}

/// Imprime o relatório de verificação. Retorna o exit code.
fn run_validation(source: &Source, nodes_path: &str) -> i32 {
    match source.root_document() {
        Ok(root) => {
            let report = validate_database(&root, nodes_path);
            println!("{report}");
            if report.passed() { 0 } else { 1 }
        }
        Err(e) => {
            error!("Falha ao ler o banco: {e}");
            2
        }
    }
}
