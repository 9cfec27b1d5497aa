//! Temas visuais do dashboard (chave "modo escuro" nas configurações).

use crate::threat::ThreatLevel;
use serde::{Deserialize, Serialize};

/// Cor em formato hex string (ex: "#2e7d32").
/// A conversão para `egui::Color32` é feita no dashboard.
pub type Color32Hex = String;

/// Definição completa de um tema de cores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    // Fundo
    pub bg: Color32Hex,
    pub panel: Color32Hex,
    pub border: Color32Hex,
    // Texto
    pub text: Color32Hex,
    pub dim: Color32Hex,
    pub title: Color32Hex,
    pub accent: Color32Hex,
    // Níveis de ameaça
    pub low: Color32Hex,
    pub medium: Color32Hex,
    pub high: Color32Hex,
}

impl Theme {
    pub fn threat_color(&self, level: ThreatLevel) -> &str {
        match level {
            ThreatLevel::Low => &self.low,
            ThreatLevel::Medium => &self.medium,
            ThreatLevel::High => &self.high,
        }
    }
}

/// Converte uma string hex "#RRGGBB" para tupla (r, g, b).
pub fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return (255, 255, 255); // fallback branco
    }
    let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(255);
    let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(255);
    let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(255);
    (r, g, b)
}

/// Tema Escuro (padrão).
pub fn dark_theme() -> Theme {
    Theme {
        name: "dark".into(),
        bg: "#121212".into(),
        panel: "#1e1e1e".into(),
        border: "#333333".into(),
        text: "#f1f1f1".into(),
        dim: "#8a8a8a".into(),
        title: "#80cbc4".into(),
        accent: "#4db6ac".into(),
        low: "#4caf50".into(),
        medium: "#ff9800".into(),
        high: "#f44336".into(),
    }
}

/// Tema Claro.
pub fn light_theme() -> Theme {
    Theme {
        name: "light".into(),
        bg: "#f5f5f5".into(),
        panel: "#ffffff".into(),
        border: "#d0d0d0".into(),
        text: "#212121".into(),
        dim: "#757575".into(),
        title: "#00695c".into(),
        accent: "#00897b".into(),
        low: "#2e7d32".into(),
        medium: "#ef6c00".into(),
        high: "#c62828".into(),
    }
}

/// Retorna tema pelo nome.
pub fn get_theme(name: &str) -> Theme {
    match name.to_lowercase().as_str() {
        "light" => light_theme(),
        _ => dark_theme(),
    }
}

/// Nomes de temas disponíveis.
pub fn theme_names() -> Vec<&'static str> {
    vec!["dark", "light"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_to_rgb_valid() {
        assert_eq!(hex_to_rgb("#f44336"), (244, 67, 54));
        assert_eq!(hex_to_rgb("4caf50"), (76, 175, 80));
        assert_eq!(hex_to_rgb("#xyz"), (255, 255, 255));
    }

    #[test]
    fn all_themes_load() {
        for name in theme_names() {
            let t = get_theme(name);
            assert_eq!(t.name, name);
        }
        assert_eq!(get_theme("nonexistent").name, "dark");
        assert_eq!(get_theme("LIGHT").name, "light");
    }

    #[test]
    fn threat_colors_are_green_orange_red() {
        for name in theme_names() {
            let t = get_theme(name);
            let (r, g, _) = hex_to_rgb(t.threat_color(ThreatLevel::Low));
            assert!(g > r, "{name}: baixo deveria ser verde");
            let (r, g, b) = hex_to_rgb(t.threat_color(ThreatLevel::Medium));
            assert!(r > g && g > b, "{name}: médio deveria ser laranja");
            let (r, g, b) = hex_to_rgb(t.threat_color(ThreatLevel::High));
            assert!(r > g && r > b, "{name}: alto deveria ser vermelho");
        }
    }
}
