//! # LDMS Dashboard
//!
//! Cliente de monitoramento de deslizamentos com GUI acelerada por GPU
//! via eframe/egui.
//!
//! Assina a coleção `nodes` do backend, mostra mapa, lista e detalhes dos
//! nós e recebe via UDP os alertas de risco alto enviados pelo `ldms_watch`.
//!
//! ## Uso
//! - `ldms_dashboard`: backend do `config.toml`
//! - `ldms_dashboard --demo`: backend em memória com dados simulados
//!
//! ## Atalhos
//! - `F` / `F11`: Fullscreen
//! - `T`: Alternar tema
//! - `Esc`: Fechar notificações

mod dashboard;
mod panels;
mod push_listener;
mod theme_egui;
mod tray;
mod worker;

use dashboard::LdmsDashboard;
use ldms_core::config::AppConfig;
use ldms_core::demo::{self, DEMO_EMAIL, DEMO_PASSWORD};
use ldms_core::firebase::FirebaseBackend;
use ldms_core::memory::MemoryBackend;
use ldms_core::repository::Backend;
use std::sync::Arc;
use tracing::{error, info, warn};

fn main() -> eframe::Result<()> {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Config ──
    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path);

    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("{e}");
        }
    }
    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    // ── Backend ──
    let demo_flag = std::env::args().skip(1).any(|a| a == "--demo");
    let firebase = if demo_flag || config.backend.database_url.is_empty() {
        None
    } else {
        match FirebaseBackend::new(config.backend.clone()) {
            Ok(fb) => Some(fb),
            Err(e) => {
                error!("Falha ao criar cliente do backend: {e}. Usando modo demo.");
                None
            }
        }
    };

    let (backend, simulation): (Arc<dyn Backend>, Option<Arc<MemoryBackend>>) = match firebase {
        Some(fb) => {
            info!("Backend: {}", config.backend.database_url);
            (Arc::new(fb), None)
        }
        None => {
            let memory = Arc::new(MemoryBackend::new());
            demo::seed(&memory);
            (memory.clone(), Some(memory))
        }
    };
    let demo_login = simulation.is_some().then_some((DEMO_EMAIL, DEMO_PASSWORD));

    // ── Threads ──
    let worker = match worker::spawn_worker(backend, simulation) {
        Ok(w) => w,
        Err(e) => {
            error!("Falha ao iniciar worker do backend: {e}");
            return Ok(());
        }
    };

    let pushes = match push_listener::spawn_push_listener(
        config.dashboard.push_port,
        config.dashboard.watch_ip.clone(),
    ) {
        Ok(rx) => Some(rx),
        Err(e) => {
            warn!("Sem escuta de pushes: {e}");
            None
        }
    };

    // ── Janela eframe ──
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("⛰ LDMS Dashboard")
            .with_inner_size([1366.0, 768.0])
            .with_min_inner_size([1024.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "LDMS Dashboard",
        options,
        Box::new(move |cc| {
            Ok(Box::new(LdmsDashboard::new(
                cc,
                config,
                config_path,
                worker,
                pushes,
                demo_login,
            )))
        }),
    )
}
