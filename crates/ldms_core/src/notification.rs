//! Notificações de push.
//!
//! Um push chega como um mapa de dados (`title`, `body`, `sensorName`) e/ou
//! uma notificação nativa com título e corpo. Cada push gera exatamente uma
//! notificação local, que abre o dashboard no sensor indicado.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

pub const DEFAULT_TITLE: &str = "LDMS Alert";
pub const DEFAULT_BODY: &str = "High-risk sensor detected";
/// Canal das notificações de alerta.
pub const ALERT_CHANNEL: &str = "ldms_alerts";

pub const KEY_TITLE: &str = "title";
pub const KEY_BODY: &str = "body";
pub const KEY_SENSOR: &str = "sensorName";

// ──────────────────────────────────────────────
// Payload recebido
// ──────────────────────────────────────────────

/// Notificação nativa embutida no push.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeNotification {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Push como entregue pelo transporte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub data: BTreeMap<String, String>,
    pub notification: Option<NativeNotification>,
}

impl PushMessage {
    /// Push de alerta para um nó que acabou de entrar em `High`.
    pub fn high_risk(sensor_name: &str) -> Self {
        let mut data = BTreeMap::new();
        data.insert(KEY_TITLE.into(), DEFAULT_TITLE.into());
        data.insert(
            KEY_BODY.into(),
            format!("Sensor {sensor_name} reached HIGH threat level"),
        );
        data.insert(KEY_SENSOR.into(), sensor_name.into());
        Self {
            data,
            notification: None,
        }
    }
}

// ──────────────────────────────────────────────
// Notificação local
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Default,
    High,
}

/// Destino ao abrir a notificação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeepLink {
    Dashboard { sensor: Option<String> },
}

/// Notificação pronta para exibição.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub channel: &'static str,
    pub priority: Priority,
    pub deep_link: DeepLink,
}

impl Notification {
    /// Extrai a notificação de um push.
    ///
    /// O mapa de dados tem precedência. Sem dados, usa a notificação nativa.
    /// Sem nenhum dos dois, usa os textos padrão.
    pub fn from_push(push: &PushMessage) -> Self {
        let (title, body, sensor) = if !push.data.is_empty() {
            (
                push.data.get(KEY_TITLE).cloned(),
                push.data.get(KEY_BODY).cloned(),
                push.data.get(KEY_SENSOR).cloned().unwrap_or_default(),
            )
        } else if let Some(native) = &push.notification {
            (native.title.clone(), native.body.clone(), String::new())
        } else {
            (None, None, String::new())
        };

        Self {
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: body.unwrap_or_else(|| DEFAULT_BODY.to_string()),
            channel: ALERT_CHANNEL,
            priority: Priority::High,
            deep_link: DeepLink::Dashboard {
                sensor: (!sensor.is_empty()).then_some(sensor),
            },
        }
    }

    /// Sensor alvo do deep link, se houver.
    pub fn sensor(&self) -> Option<&str> {
        match &self.deep_link {
            DeepLink::Dashboard { sensor } => sensor.as_deref(),
        }
    }
}

/// Destino das notificações locais.
pub trait Notifier: Send {
    fn post(&mut self, notification: &Notification);
}

/// Notifier que só registra no log.
#[derive(Debug, Default)]
pub struct LogNotifier {
    pub posted: usize,
}

impl Notifier for LogNotifier {
    fn post(&mut self, n: &Notification) {
        self.posted += 1;
        match n.priority {
            Priority::High => warn!(
                "🔔 [{}] {} – {} (sensor: {})",
                n.channel,
                n.title,
                n.body,
                n.sensor().unwrap_or("-")
            ),
            Priority::Default => info!("🔔 [{}] {} – {}", n.channel, n.title, n.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn data_payload_is_used() {
        let push = PushMessage {
            data: data(&[
                ("title", "Slope alert"),
                ("body", "node_4 is moving"),
                ("sensorName", "node_4"),
            ]),
            notification: None,
        };
        let n = Notification::from_push(&push);
        assert_eq!(n.title, "Slope alert");
        assert_eq!(n.body, "node_4 is moving");
        assert_eq!(n.sensor(), Some("node_4"));
        assert_eq!(n.channel, ALERT_CHANNEL);
        assert_eq!(n.priority, Priority::High);
    }

    #[test]
    fn missing_data_keys_fall_back_to_defaults() {
        let push = PushMessage {
            data: data(&[("sensorName", "node_9")]),
            notification: None,
        };
        let n = Notification::from_push(&push);
        assert_eq!(n.title, DEFAULT_TITLE);
        assert_eq!(n.body, DEFAULT_BODY);
        assert_eq!(n.sensor(), Some("node_9"));
    }

    #[test]
    fn data_wins_over_native_notification() {
        let push = PushMessage {
            data: data(&[("title", "from data")]),
            notification: Some(NativeNotification {
                title: Some("from native".into()),
                body: None,
            }),
        };
        assert_eq!(Notification::from_push(&push).title, "from data");
    }

    #[test]
    fn native_notification_without_data() {
        let push = PushMessage {
            data: BTreeMap::new(),
            notification: Some(NativeNotification {
                title: Some("Native".into()),
                body: None,
            }),
        };
        let n = Notification::from_push(&push);
        assert_eq!(n.title, "Native");
        assert_eq!(n.body, DEFAULT_BODY);
        assert_eq!(n.sensor(), None);
    }

    #[test]
    fn empty_push_still_posts_defaults() {
        let n = Notification::from_push(&PushMessage::default());
        assert_eq!(n.title, DEFAULT_TITLE);
        assert_eq!(n.body, DEFAULT_BODY);
        assert_eq!(n.deep_link, DeepLink::Dashboard { sensor: None });
    }

    #[test]
    fn empty_sensor_name_has_no_target() {
        let push = PushMessage {
            data: data(&[("sensorName", "")]),
            notification: None,
        };
        assert_eq!(Notification::from_push(&push).sensor(), None);
    }

    #[test]
    fn high_risk_push_targets_sensor() {
        let n = Notification::from_push(&PushMessage::high_risk("node_2"));
        assert_eq!(n.sensor(), Some("node_2"));
        assert!(n.body.contains("node_2"));
    }

    #[test]
    fn log_notifier_counts_posts() {
        let mut notifier = LogNotifier::default();
        let n = Notification::from_push(&PushMessage::default());
        notifier.post(&n);
        notifier.post(&n);
        assert_eq!(notifier.posted, 2);
    }
}
