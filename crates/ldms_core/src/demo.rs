//! Dados de demonstração para rodar sem backend (`--demo`).
//!
//! Os nós ficam ao redor do centro padrão do mapa e oscilam de forma
//! determinística, cruzando os limiares de tempos em tempos.

use crate::memory::MemoryBackend;
use crate::repository::AuthRepository;
use crate::types::SensorData;
use tracing::info;

pub const DEMO_EMAIL: &str = "demo@ldms.local";
pub const DEMO_PASSWORD: &str = "demo1234";

/// (chave, lat, lon, inclinação base, umidade base, chuva base)
const DEMO_NODES: [(&str, f64, f64, f64, f64, f64); 8] = [
    ("node_1", 7.2906, 80.6337, 4.0, 35.0, 5.0),
    ("node_2", 7.2950, 80.6300, 9.0, 48.0, 12.0),
    ("node_3", 7.2860, 80.6410, 13.5, 55.0, 22.0),
    ("node_4", 7.3010, 80.6220, 2.0, 20.0, 0.0),
    ("node_5", 7.2700, 80.6000, 14.0, 66.0, 45.0),
    ("node_6", 7.3200, 80.6550, 6.0, 42.0, 8.0),
    ("node_7", 7.2550, 80.5900, 11.0, 30.0, 15.0),
    ("node_8", 7.3400, 80.7000, 1.0, 10.0, 1.0),
];

/// Cria a conta demo e grava as leituras iniciais.
pub fn seed(backend: &MemoryBackend) {
    if backend.register(DEMO_EMAIL, DEMO_PASSWORD).is_ok() {
        backend.logout();
    }
    backend.put_nodes((0..DEMO_NODES.len()).map(|i| reading(i, 0)));
    info!("Backend demo com {} nós ({DEMO_EMAIL})", DEMO_NODES.len());
}

/// Avança a simulação de um passo e regrava todos os nós.
pub fn step(backend: &MemoryBackend, tick: u64) {
    backend.put_nodes((0..DEMO_NODES.len()).map(|i| reading(i, tick)));
}

fn reading(index: usize, tick: u64) -> (&'static str, SensorData) {
    let (key, lat, lon, tilt, soil, rain) = DEMO_NODES[index];
    // Fase diferente por nó para não subirem todos juntos
    let phase = tick as f64 * 0.15 + index as f64 * 0.9;
    let wave = phase.sin();

    let node = SensorData {
        node_name: Some(key.to_string()),
        accel_x: Some(0.02 * wave),
        accel_y: Some(-0.01 * wave),
        accel_z: Some(9.81),
        gyro_x: Some(0.0),
        gyro_y: Some(0.0),
        gyro_z: Some(0.0),
        tilt: Some((tilt + 4.0 * wave).max(0.0)),
        rain: Some((rain + 10.0 * (phase * 0.5).cos()).max(0.0)),
        soil_moisture: Some((soil + 8.0 * wave).clamp(0.0, 100.0)),
        light: Some(400.0 + 50.0 * wave),
        latitude: Some(lat),
        longitude: Some(lon),
        timestamp: Some(format!("t+{tick}")),
        status: Some("online".into()),
        ..Default::default()
    };
    (key, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SensorRepository;
    use crate::threat::ThreatLevel;

    #[test]
    fn seed_creates_account_and_nodes() {
        let backend = MemoryBackend::new();
        seed(&backend);
        assert!(backend.current_user().is_none());
        assert!(backend.login(DEMO_EMAIL, DEMO_PASSWORD).is_ok());
        assert_eq!(backend.fetch_nodes().unwrap().len(), DEMO_NODES.len());
    }

    #[test]
    fn simulation_crosses_levels() {
        let backend = MemoryBackend::new();
        seed(&backend);
        let mut seen_high = false;
        let mut seen_low = false;
        for tick in 0..60 {
            step(&backend, tick);
            for node in backend.fetch_nodes().unwrap() {
                match ThreatLevel::of(&node) {
                    ThreatLevel::High => seen_high = true,
                    ThreatLevel::Low => seen_low = true,
                    ThreatLevel::Medium => {}
                }
            }
        }
        assert!(seen_high && seen_low);
    }
}
