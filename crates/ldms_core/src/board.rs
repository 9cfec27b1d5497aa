//! Estado agregado dos nós, alimentado pela assinatura realtime.
//!
//! A lista é substituída por inteiro a cada snapshot. O histórico por nó
//! fica só em memória e alimenta os gráficos da tela de detalhes.

use crate::threat::{ThreatFilter, ThreatLevel};
use crate::types::{GeoPoint, SensorData};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Histórico padrão por nó (amostras).
pub const DEFAULT_HISTORY_LEN: usize = 120;

/// Contadores do cartão de resumo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub high: usize,
    /// Nós em `High` ou `Medium`
    pub active_alerts: usize,
}

/// Resultado de aplicar um snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardUpdate {
    /// Nós que passaram a `High` neste snapshot
    pub newly_high: Vec<String>,
    pub total: usize,
}

/// Um nó posicionado, pronto para o mapa.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub name: String,
    pub position: GeoPoint,
    pub level: ThreatLevel,
}

/// Séries recentes de um nó.
#[derive(Debug, Clone)]
pub struct NodeHistory {
    pub tilt: VecDeque<f64>,
    pub soil: VecDeque<f64>,
    pub rain: VecDeque<f64>,
    capacity: usize,
}

impl NodeHistory {
    fn new(capacity: usize) -> Self {
        Self {
            tilt: VecDeque::with_capacity(capacity),
            soil: VecDeque::with_capacity(capacity),
            rain: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, s: &SensorData) {
        Self::push_deque(&mut self.tilt, s.tilt_or_zero(), self.capacity);
        Self::push_deque(&mut self.soil, s.soil_or_zero(), self.capacity);
        Self::push_deque(&mut self.rain, s.rain_or_zero(), self.capacity);
    }

    fn push_deque(deque: &mut VecDeque<f64>, val: f64, capacity: usize) {
        if deque.len() >= capacity {
            deque.pop_front();
        }
        deque.push_back(val);
    }

    pub fn len(&self) -> usize {
        self.tilt.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tilt.is_empty()
    }
}

/// Lista corrente de nós e tudo que é derivado dela.
#[derive(Debug, Clone)]
pub struct SensorBoard {
    sensors: Vec<SensorData>,
    assigned: BTreeSet<String>,
    history: HashMap<String, NodeHistory>,
    history_len: usize,
    selected: Option<String>,
}

impl Default for SensorBoard {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LEN)
    }
}

impl SensorBoard {
    pub fn new(history_len: usize) -> Self {
        Self {
            sensors: Vec::new(),
            assigned: BTreeSet::new(),
            history: HashMap::new(),
            history_len: history_len.max(1),
            selected: None,
        }
    }

    /// Restringe o board aos nós atribuídos ao usuário. Vazio = todos.
    ///
    /// Vale a partir do próximo snapshot.
    pub fn set_assigned<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned = names.into_iter().map(Into::into).collect();
    }

    pub fn assigned(&self) -> impl Iterator<Item = &str> {
        self.assigned.iter().map(String::as_str)
    }

    fn is_visible(&self, sensor: &SensorData) -> bool {
        if self.assigned.is_empty() {
            return true;
        }
        sensor
            .node_name
            .as_ref()
            .is_some_and(|name| self.assigned.contains(name))
    }

    /// Substitui a lista pelo snapshot e retorna os nós que viraram `High`.
    pub fn apply(&mut self, nodes: Vec<SensorData>) -> BoardUpdate {
        let previous_high: BTreeSet<Option<String>> = self
            .sensors
            .iter()
            .filter(|s| ThreatLevel::of(s) == ThreatLevel::High)
            .map(|s| s.node_name.clone())
            .collect();

        let visible: Vec<SensorData> = nodes.into_iter().filter(|s| self.is_visible(s)).collect();

        for sensor in &visible {
            if let Some(name) = &sensor.node_name {
                let len = self.history_len;
                self.history
                    .entry(name.clone())
                    .or_insert_with(|| NodeHistory::new(len))
                    .push(sensor);
            }
        }

        let newly_high = visible
            .iter()
            .filter(|s| ThreatLevel::of(s) == ThreatLevel::High)
            .filter(|s| !previous_high.contains(&s.node_name))
            .filter_map(|s| s.node_name.clone())
            .collect();

        self.sensors = visible;

        BoardUpdate {
            newly_high,
            total: self.sensors.len(),
        }
    }

    pub fn sensors(&self) -> &[SensorData] {
        &self.sensors
    }

    pub fn find(&self, name: &str) -> Option<&SensorData> {
        self.sensors
            .iter()
            .find(|s| s.node_name.as_deref() == Some(name))
    }

    pub fn filtered(&self, filter: ThreatFilter) -> Vec<&SensorData> {
        self.sensors.iter().filter(|s| filter.matches(s)).collect()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.sensors.len(),
            ..Default::default()
        };
        for sensor in &self.sensors {
            match ThreatLevel::of(sensor) {
                ThreatLevel::High => {
                    summary.high += 1;
                    summary.active_alerts += 1;
                }
                ThreatLevel::Medium => summary.active_alerts += 1,
                ThreatLevel::Low => {}
            }
        }
        summary
    }

    /// Nós com posição que passam no filtro.
    pub fn markers(&self, filter: ThreatFilter) -> Vec<Marker> {
        self.sensors
            .iter()
            .filter(|s| filter.matches(s))
            .filter_map(|s| {
                Some(Marker {
                    name: s.name_or("Sensor").to_string(),
                    position: s.position()?,
                    level: ThreatLevel::of(s),
                })
            })
            .collect()
    }

    pub fn history(&self, name: &str) -> Option<&NodeHistory> {
        self.history.get(name)
    }

    pub fn select(&mut self, name: Option<String>) {
        self.selected = name;
    }

    /// Leitura atual do nó selecionado. Segue o nó pelo nome entre snapshots.
    pub fn selected(&self) -> Option<&SensorData> {
        self.selected.as_deref().and_then(|name| self.find(name))
    }

    pub fn selected_name(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}
