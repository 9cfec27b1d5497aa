//! Bandeja de notificações dentro do app.

use crate::push_listener::PushEvent;
use ldms_core::notification::{DeepLink, Notification, Notifier};
use std::collections::VecDeque;
use std::time::Instant;
use tracing::warn;

/// Quantas notificações a bandeja guarda.
const TRAY_CAPACITY: usize = 50;

#[derive(Debug, Clone)]
pub struct TrayEntry {
    pub notification: Notification,
    pub source: Option<String>,
    pub received: Instant,
    pub read: bool,
}

/// Notificações recebidas, da mais recente para a mais antiga.
#[derive(Debug, Default)]
pub struct NotificationTray {
    entries: VecDeque<TrayEntry>,
}

impl NotificationTray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn receive(&mut self, event: PushEvent) {
        self.push(event.notification, Some(event.source_addr));
    }

    fn push(&mut self, notification: Notification, source: Option<String>) {
        warn!(
            "🔔 {} – {} (sensor: {})",
            notification.title,
            notification.body,
            notification.sensor().unwrap_or("-")
        );
        if self.entries.len() >= TRAY_CAPACITY {
            self.entries.pop_back();
        }
        self.entries.push_front(TrayEntry {
            notification,
            source,
            received: Instant::now(),
            read: false,
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &TrayEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unread(&self) -> usize {
        self.entries.iter().filter(|e| !e.read).count()
    }

    /// Marca como lida e retorna o destino do deep link.
    pub fn open(&mut self, index: usize) -> Option<DeepLink> {
        let entry = self.entries.get_mut(index)?;
        entry.read = true;
        Some(entry.notification.deep_link.clone())
    }

    pub fn mark_all_read(&mut self) {
        for e in &mut self.entries {
            e.read = true;
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Notifier for NotificationTray {
    fn post(&mut self, notification: &Notification) {
        self.push(notification.clone(), None);
    }
}
