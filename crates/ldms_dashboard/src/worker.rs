//! Thread do backend.
//!
//! Todas as chamadas bloqueantes (auth, favoritos, assinatura) rodam aqui.
//! A UI envia [`Command`]s e drena [`Reply`]s a cada frame.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use ldms_core::demo;
use ldms_core::favorites::{FavoriteChange, Favorites};
use ldms_core::memory::MemoryBackend;
use ldms_core::repository::{
    AuthRepository, Backend, BackendError, FeedEvent, SensorRepository, Subscription,
    UserRepository,
};
use ldms_core::types::{Identity, SensorData};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Passo da simulação no modo demo.
const DEMO_TICK: Duration = Duration::from_secs(2);

/// Pedido da UI.
#[derive(Debug)]
pub enum Command {
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    SendPasswordReset { email: String },
    UpdateDisplayName(Option<String>),
    SetFavorite(FavoriteChange),
    /// Assina `nodes` de novo após um cancelamento
    Resubscribe,
}

/// Resposta para a UI.
#[derive(Debug)]
pub enum Reply {
    SignedIn(Identity),
    AuthFailed(String),
    UserData {
        favorites: Favorites,
        assigned: Vec<String>,
    },
    Nodes(Vec<SensorData>),
    FeedCancelled(String),
    ResetSent(String),
    ProfileUpdated(Identity),
    FavoriteSaved(FavoriteChange),
    Failed(String),
}

/// Pontas da UI.
pub struct WorkerHandle {
    pub commands: Sender<Command>,
    pub replies: Receiver<Reply>,
}

impl WorkerHandle {
    pub fn send(&self, cmd: Command) {
        if let Err(e) = self.commands.send(cmd) {
            error!("Worker do backend indisponível: {e}");
        }
    }
}

struct Worker {
    backend: Arc<dyn Backend>,
    demo: Option<Arc<MemoryBackend>>,
    replies: Sender<Reply>,
    subscription: Option<Subscription>,
    user: Option<Identity>,
}

/// Inicia a thread do backend.
pub fn spawn_worker(
    backend: Arc<dyn Backend>,
    demo: Option<Arc<MemoryBackend>>,
) -> std::io::Result<WorkerHandle> {
    let (cmd_tx, cmd_rx) = bounded::<Command>(32);
    let (reply_tx, reply_rx) = bounded::<Reply>(64);

    let worker = Worker {
        backend,
        demo,
        replies: reply_tx,
        subscription: None,
        user: None,
    };

    std::thread::Builder::new()
        .name("backend-worker".into())
        .spawn(move || worker.run(&cmd_rx))?;

    Ok(WorkerHandle {
        commands: cmd_tx,
        replies: reply_rx,
    })
}

/// Repassa um evento da assinatura para a UI.
///
/// Com a fila cheia só snapshots são descartados; o cancelamento espera
/// a UI drenar para que o status não fique "Ao vivo".
fn feed_reply(tx: &Sender<Reply>, event: FeedEvent) {
    match event {
        FeedEvent::Nodes(nodes) => {
            if let Err(TrySendError::Full(_)) = tx.try_send(Reply::Nodes(nodes)) {
                debug!("Fila da UI cheia, descartando snapshot");
            }
        }
        FeedEvent::Cancelled(reason) => {
            if tx.send(Reply::FeedCancelled(reason)).is_err() {
                debug!("UI encerrada, cancelamento descartado");
            }
        }
    }
}

impl Worker {
    fn run(mut self, commands: &Receiver<Command>) {
        let mut tick = 1u64;
        let mut last_tick = Instant::now();

        loop {
            match commands.recv_timeout(DEMO_TICK) {
                Ok(cmd) => self.handle(cmd),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if let Some(demo) = &self.demo {
                if last_tick.elapsed() >= DEMO_TICK {
                    demo::step(demo, tick);
                    tick += 1;
                    last_tick = Instant::now();
                }
            }
        }
        info!("Worker do backend encerrado");
    }

    fn reply(&self, reply: Reply) {
        if self.replies.send(reply).is_err() {
            debug!("UI encerrada, resposta descartada");
        }
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Login { email, password } => {
                let result = self.backend.login(&email, &password);
                self.finish_auth(result);
            }
            Command::Register { email, password } => {
                let result = self.backend.register(&email, &password);
                self.finish_auth(result);
            }
            Command::Logout => {
                self.subscription = None;
                self.user = None;
                self.backend.logout();
                info!("Sessão encerrada");
            }
            Command::SendPasswordReset { email } => match self.backend.send_password_reset(&email) {
                Ok(()) => self.reply(Reply::ResetSent(email)),
                Err(e) => {
                    warn!("Falha ao enviar redefinição para {email}: {e}");
                    self.reply(Reply::Failed(e.to_string()));
                }
            },
            Command::UpdateDisplayName(name) => {
                match self.backend.update_display_name(name.as_deref()) {
                    Ok(identity) => {
                        self.user = Some(identity.clone());
                        self.reply(Reply::ProfileUpdated(identity));
                    }
                    Err(e) => {
                        warn!("Falha ao salvar perfil: {e}");
                        self.reply(Reply::Failed(e.to_string()));
                    }
                }
            }
            Command::SetFavorite(change) => self.set_favorite(change),
            Command::Resubscribe => {
                if self.user.is_some() {
                    self.subscribe();
                }
            }
        }
    }

    fn finish_auth(&mut self, result: Result<Identity, BackendError>) {
        let identity = match result {
            Ok(id) => id,
            Err(e) => {
                warn!("Autenticação falhou: {e}");
                self.reply(Reply::AuthFailed(e.to_string()));
                return;
            }
        };

        self.user = Some(identity.clone());
        let uid = identity.uid.clone();
        self.reply(Reply::SignedIn(identity));

        // Dados do usuário antes do primeiro snapshot
        let favorites = self.backend.favorites(&uid).unwrap_or_else(|e| {
            warn!("Falha ao ler favoritos: {e}");
            Favorites::new()
        });
        let assigned = self.backend.assigned_sensors(&uid).unwrap_or_else(|e| {
            warn!("Falha ao ler nós atribuídos: {e}");
            Vec::new()
        });
        self.reply(Reply::UserData {
            favorites,
            assigned,
        });

        self.subscribe();
    }

    fn subscribe(&mut self) {
        // Solta a assinatura anterior antes de abrir outra
        self.subscription = None;

        let tx = self.replies.clone();
        let callback = Box::new(move |event: FeedEvent| feed_reply(&tx, event));

        match self.backend.subscribe(callback) {
            Ok(sub) => self.subscription = Some(sub),
            Err(e) => {
                error!("Falha ao assinar nós: {e}");
                self.reply(Reply::FeedCancelled(e.to_string()));
            }
        }
    }

    fn set_favorite(&mut self, change: FavoriteChange) {
        let Some(uid) = self.user.as_ref().map(|u| u.uid.clone()) else {
            self.reply(Reply::Failed(BackendError::NotSignedIn.to_string()));
            return;
        };
        let (name, favorite) = match &change {
            FavoriteChange::Add(name) => (name.as_str(), true),
            FavoriteChange::Remove(name) => (name.as_str(), false),
        };
        match self.backend.set_favorite(&uid, name, favorite) {
            Ok(()) => self.reply(Reply::FavoriteSaved(change)),
            Err(e) => {
                warn!("Falha ao gravar favorito {name}: {e}");
                self.reply(Reply::Failed(e.to_string()));
            }
        }
    }
}
