//! Modelo de dados dos nós sensores.
//!
//! Cada nó reporta sua última leitura como um documento da coleção `nodes`.
//! Todos os campos são opcionais: o backend não garante nenhum deles.

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Leitura de um nó
// ──────────────────────────────────────────────

/// Última leitura de um nó sensor, com os nomes de campo do backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SensorData {
    /// Nome do nó (ex: "node_1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,

    // Acelerômetro (m/s²)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accel_z: Option<f64>,

    // Giroscópio (°/s)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyro_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyro_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gyro_z: Option<f64>,

    // Magnetômetro (µT)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mag_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mag_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mag_z: Option<f64>,

    /// Ângulo de inclinação (°)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<f64>,
    /// Chuva acumulada (mm)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rain: Option<f64>,
    /// Umidade do solo (0–100%)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
    /// Luminosidade
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    /// Timestamp como enviado pelo nó (formato livre)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl SensorData {
    /// Posição do nó, se latitude e longitude estiverem presentes.
    pub fn position(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint { lat, lon }),
            _ => None,
        }
    }

    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.node_name.as_deref().unwrap_or(fallback)
    }

    pub fn tilt_or_zero(&self) -> f64 {
        self.tilt.unwrap_or(0.0)
    }

    pub fn soil_or_zero(&self) -> f64 {
        self.soil_moisture.unwrap_or(0.0)
    }

    pub fn rain_or_zero(&self) -> f64 {
        self.rain.unwrap_or(0.0)
    }
}

// ──────────────────────────────────────────────
// Geo
// ──────────────────────────────────────────────

/// Coordenada em graus decimais (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

// ──────────────────────────────────────────────
// Usuário
// ──────────────────────────────────────────────

/// Usuário autenticado no backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reading_is_empty() {
        let s = SensorData::default();
        assert!(s.node_name.is_none());
        assert!(s.position().is_none());
        assert_eq!(s.tilt_or_zero(), 0.0);
        assert_eq!(s.soil_or_zero(), 0.0);
    }

    #[test]
    fn decodes_backend_field_names() {
        let json = r#"{
            "nodeName": "node_1",
            "accelX": 0.12, "accelY": -0.4, "accelZ": 9.81,
            "tilt": 12.5,
            "rain": 3.0,
            "soilMoisture": 64.0,
            "latitude": 7.29,
            "longitude": 80.63,
            "timestamp": "2025-01-04 10:22:01",
            "battery": 88
        }"#;
        let s: SensorData = serde_json::from_str(json).unwrap();
        assert_eq!(s.node_name.as_deref(), Some("node_1"));
        assert_eq!(s.accel_z, Some(9.81));
        assert_eq!(s.soil_moisture, Some(64.0));
        assert_eq!(s.position(), Some(GeoPoint { lat: 7.29, lon: 80.63 }));
        assert!(s.gyro_x.is_none());
    }

    #[test]
    fn position_requires_both_coordinates() {
        let s = SensorData {
            latitude: Some(7.0),
            ..Default::default()
        };
        assert!(s.position().is_none());
    }

    #[test]
    fn absent_fields_are_not_serialized() {
        let s = SensorData {
            node_name: Some("node_2".into()),
            tilt: Some(4.0),
            ..Default::default()
        };
        let v = serde_json::to_value(&s).unwrap();
        let obj = v.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["nodeName"], "node_2");
    }
}
