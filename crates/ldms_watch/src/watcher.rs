//! Acompanha os snapshots e decide quais pushes enviar.

use crossbeam_channel::{Sender, TrySendError};
use ldms_core::board::{SensorBoard, Summary};
use ldms_core::notification::{Notification, PushMessage};
use ldms_core::protocol::{ProtocolError, encode_push};
use ldms_core::repository::FeedEvent;
use ldms_core::types::SensorData;
use tracing::{debug, info, warn};

/// Encaminha um evento da assinatura para o loop principal.
///
/// Com a fila cheia um snapshot é descartado, já que o próximo traz a
/// coleção inteira. O cancelamento espera por espaço.
pub fn forward_feed(tx: &Sender<FeedEvent>, event: FeedEvent) {
    match event {
        FeedEvent::Nodes(_) => {
            if let Err(TrySendError::Full(_)) = tx.try_send(event) {
                warn!("Fila de snapshots cheia, descartando");
            }
        }
        FeedEvent::Cancelled(_) => {
            if tx.send(event).is_err() {
                debug!("Loop principal já encerrado");
            }
        }
    }
}

/// Diferença de nível entre snapshots consecutivos.
pub struct NodeWatcher {
    board: SensorBoard,
    snapshots: u64,
}

impl Default for NodeWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeWatcher {
    pub fn new() -> Self {
        Self {
            // Só o nível atual importa aqui
            board: SensorBoard::new(1),
            snapshots: 0,
        }
    }

    /// Restringe aos nós atribuídos ao usuário. Vazio = todos.
    pub fn set_assigned(&mut self, names: Vec<String>) {
        if !names.is_empty() {
            info!("Monitorando {} nós atribuídos", names.len());
        }
        self.board.set_assigned(names);
    }

    /// Aplica um snapshot e retorna um push por nó que passou a `High`.
    pub fn on_snapshot(&mut self, nodes: Vec<SensorData>) -> Vec<PushMessage> {
        let update = self.board.apply(nodes);
        self.snapshots += 1;

        let s = self.board.summary();
        debug!(
            "Snapshot #{}: {} nós | {} alto | {} alertas ativos",
            self.snapshots, s.total, s.high, s.active_alerts
        );

        update
            .newly_high
            .iter()
            .map(|name| PushMessage::high_risk(name))
            .collect()
    }

    /// Igual a [`Self::on_snapshot`], já em frames prontos para o UDP,
    /// cada um com a notificação que o dashboard vai exibir.
    pub fn frames(
        &mut self,
        nodes: Vec<SensorData>,
    ) -> Vec<(Notification, Result<Vec<u8>, ProtocolError>)> {
        self.on_snapshot(nodes)
            .into_iter()
            .map(|push| (Notification::from_push(&push), encode_push(&push)))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        self.board.summary()
    }

    pub fn snapshots(&self) -> u64 {
        self.snapshots
    }
}
