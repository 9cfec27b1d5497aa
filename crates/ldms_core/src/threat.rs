//! Classificação de risco e alertas de leitura.
//!
//! O nível de risco depende só de inclinação e umidade do solo, com
//! comparação estrita (`>`) em todos os limiares.

use crate::types::SensorData;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inclinação acima da qual o nó é `High` (°).
pub const TILT_HIGH: f64 = 15.0;
/// Inclinação acima da qual o nó é `Medium` (°).
pub const TILT_MEDIUM: f64 = 10.0;
/// Umidade do solo acima da qual o nó é `High` (%).
pub const SOIL_HIGH: f64 = 70.0;
/// Umidade do solo acima da qual o nó é `Medium` (%).
pub const SOIL_MEDIUM: f64 = 50.0;
/// Chuva considerada forte (mm). Só gera alerta, não altera o nível.
pub const RAIN_HEAVY: f64 = 50.0;

/// Nível de risco de um nó.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
}

impl ThreatLevel {
    /// Nível de risco de uma leitura.
    pub fn of(sensor: &SensorData) -> Self {
        classify(sensor.tilt, sensor.soil_moisture)
    }

    pub fn label(self) -> &'static str {
        match self {
            ThreatLevel::Low => "Low",
            ThreatLevel::Medium => "Medium",
            ThreatLevel::High => "High",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ThreatLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(ThreatLevel::Low),
            "medium" => Ok(ThreatLevel::Medium),
            "high" => Ok(ThreatLevel::High),
            other => Err(format!("nível de risco desconhecido: {other}")),
        }
    }
}

/// Classifica inclinação (°) e umidade do solo (%). Valores ausentes valem 0.
pub fn classify(tilt: Option<f64>, soil: Option<f64>) -> ThreatLevel {
    let tilt = tilt.unwrap_or(0.0);
    let soil = soil.unwrap_or(0.0);

    if tilt > TILT_HIGH || soil > SOIL_HIGH {
        ThreatLevel::High
    } else if tilt > TILT_MEDIUM || soil > SOIL_MEDIUM {
        ThreatLevel::Medium
    } else {
        ThreatLevel::Low
    }
}

// ──────────────────────────────────────────────
// Filtro do dashboard
// ──────────────────────────────────────────────

/// Filtro de nós por nível de risco.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThreatFilter {
    #[default]
    All,
    Only(ThreatLevel),
}

/// Filtros na ordem em que aparecem na UI.
pub const ALL_FILTERS: [ThreatFilter; 4] = [
    ThreatFilter::All,
    ThreatFilter::Only(ThreatLevel::Low),
    ThreatFilter::Only(ThreatLevel::Medium),
    ThreatFilter::Only(ThreatLevel::High),
];

impl ThreatFilter {
    pub fn matches(self, sensor: &SensorData) -> bool {
        match self {
            ThreatFilter::All => true,
            ThreatFilter::Only(level) => ThreatLevel::of(sensor) == level,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ThreatFilter::All => "All",
            ThreatFilter::Only(level) => level.label(),
        }
    }
}

// ──────────────────────────────────────────────
// Alertas de leitura (tela de detalhes)
// ──────────────────────────────────────────────

/// Um limiar de leitura ultrapassado.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingAlert {
    pub metric: &'static str,
    pub value: f64,
    pub threshold: f64,
    pub unit: &'static str,
    pub message: String,
}

/// Avalia uma leitura e retorna os limiares críticos ultrapassados.
pub fn reading_alerts(sensor: &SensorData) -> Vec<ReadingAlert> {
    let mut alerts = Vec::new();

    check(
        &mut alerts,
        "tilt",
        sensor.tilt_or_zero(),
        TILT_HIGH,
        "°",
        format!("Tilt angle exceeds safe threshold ({TILT_HIGH:.0}°)"),
    );
    check(
        &mut alerts,
        "soil_moisture",
        sensor.soil_or_zero(),
        SOIL_HIGH,
        "%",
        format!("Soil moisture exceeds critical level ({SOIL_HIGH:.0}%)"),
    );
    check(
        &mut alerts,
        "rain",
        sensor.rain_or_zero(),
        RAIN_HEAVY,
        "mm",
        format!("Heavy rainfall detected (>{RAIN_HEAVY:.0}mm)"),
    );

    alerts
}

fn check(
    alerts: &mut Vec<ReadingAlert>,
    metric: &'static str,
    value: f64,
    threshold: f64,
    unit: &'static str,
    message: String,
) {
    if value > threshold {
        alerts.push(ReadingAlert {
            metric,
            value,
            threshold,
            unit,
            message,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(tilt: Option<f64>, soil: Option<f64>) -> SensorData {
        SensorData {
            tilt,
            soil_moisture: soil,
            ..Default::default()
        }
    }

    #[test]
    fn classification_table() {
        assert_eq!(classify(Some(20.0), Some(0.0)), ThreatLevel::High);
        assert_eq!(classify(Some(0.0), Some(80.0)), ThreatLevel::High);
        assert_eq!(classify(Some(12.0), Some(0.0)), ThreatLevel::Medium);
        assert_eq!(classify(Some(0.0), Some(60.0)), ThreatLevel::Medium);
        assert_eq!(classify(Some(5.0), Some(10.0)), ThreatLevel::Low);
    }

    #[test]
    fn absent_values_count_as_zero() {
        assert_eq!(classify(None, None), ThreatLevel::Low);
        assert_eq!(classify(None, Some(71.0)), ThreatLevel::High);
        assert_eq!(classify(Some(11.0), None), ThreatLevel::Medium);
    }

    #[test]
    fn thresholds_are_strict() {
        assert_eq!(classify(Some(15.0), None), ThreatLevel::Medium);
        assert_eq!(classify(Some(10.0), None), ThreatLevel::Low);
        assert_eq!(classify(None, Some(70.0)), ThreatLevel::Medium);
        assert_eq!(classify(None, Some(50.0)), ThreatLevel::Low);
        assert_eq!(classify(Some(15.000_1), None), ThreatLevel::High);
    }

    #[test]
    fn either_metric_escalates() {
        assert_eq!(classify(Some(3.0), Some(75.0)), ThreatLevel::High);
        assert_eq!(classify(Some(16.0), Some(10.0)), ThreatLevel::High);
    }

    #[test]
    fn level_of_sensor_uses_same_rules() {
        assert_eq!(ThreatLevel::of(&reading(Some(15.0), Some(70.0))), ThreatLevel::Medium);
        assert_eq!(ThreatLevel::of(&SensorData::default()), ThreatLevel::Low);
    }

    #[test]
    fn levels_are_ordered_and_parse() {
        assert!(ThreatLevel::Low < ThreatLevel::Medium);
        assert!(ThreatLevel::Medium < ThreatLevel::High);
        assert_eq!("HIGH".parse::<ThreatLevel>(), Ok(ThreatLevel::High));
        assert!("critical".parse::<ThreatLevel>().is_err());
        assert_eq!(ThreatLevel::Medium.to_string(), "Medium");
    }

    #[test]
    fn filter_matches_by_level() {
        let high = reading(Some(30.0), None);
        let low = reading(Some(1.0), Some(1.0));
        assert!(ThreatFilter::All.matches(&high));
        assert!(ThreatFilter::Only(ThreatLevel::High).matches(&high));
        assert!(!ThreatFilter::Only(ThreatLevel::High).matches(&low));
        assert_eq!(ALL_FILTERS.map(|f| f.label()), ["All", "Low", "Medium", "High"]);
    }

    #[test]
    fn no_alerts_for_normal_reading() {
        let s = SensorData {
            tilt: Some(5.0),
            soil_moisture: Some(40.0),
            rain: Some(12.0),
            ..Default::default()
        };
        assert!(reading_alerts(&s).is_empty());
    }

    #[test]
    fn reading_alerts_cover_each_threshold() {
        let s = SensorData {
            tilt: Some(18.0),
            soil_moisture: Some(72.0),
            rain: Some(51.0),
            ..Default::default()
        };
        let alerts = reading_alerts(&s);
        let metrics: Vec<_> = alerts.iter().map(|a| a.metric).collect();
        assert_eq!(metrics, ["tilt", "soil_moisture", "rain"]);
        assert!(alerts[2].message.contains("rainfall"));
    }

    #[test]
    fn rain_alert_is_strict() {
        let s = SensorData {
            rain: Some(50.0),
            ..Default::default()
        };
        assert!(reading_alerts(&s).is_empty());
    }
}
