//! Conversão de temas para `egui::Color32`.

use egui::Color32;
use ldms_core::theme::{self, Theme};
use ldms_core::threat::ThreatLevel;

/// Tema convertido para tipos egui.
#[derive(Clone)]
pub struct EguiTheme {
    pub name: String,
    pub bg: Color32,
    pub panel: Color32,
    pub border: Color32,
    pub text: Color32,
    pub dim: Color32,
    pub title: Color32,
    pub accent: Color32,
    pub low: Color32,
    pub medium: Color32,
    pub high: Color32,
}

impl EguiTheme {
    /// Converte um [`Theme`] do core para [`EguiTheme`].
    pub fn from_core(t: &Theme) -> Self {
        Self {
            name: t.name.clone(),
            bg: hex_color(&t.bg),
            panel: hex_color(&t.panel),
            border: hex_color(&t.border),
            text: hex_color(&t.text),
            dim: hex_color(&t.dim),
            title: hex_color(&t.title),
            accent: hex_color(&t.accent),
            low: hex_color(&t.low),
            medium: hex_color(&t.medium),
            high: hex_color(&t.high),
        }
    }

    pub fn named(name: &str) -> Self {
        Self::from_core(&theme::get_theme(name))
    }

    pub fn is_dark(&self) -> bool {
        self.name != "light"
    }

    pub fn threat_color(&self, level: ThreatLevel) -> Color32 {
        match level {
            ThreatLevel::Low => self.low,
            ThreatLevel::Medium => self.medium,
            ThreatLevel::High => self.high,
        }
    }

    /// Cor de um valor contra um limiar crítico.
    pub fn value_color(&self, value: f64, critical: f64) -> Color32 {
        if value > critical { self.high } else { self.text }
    }

    /// Aplica fundo e texto do tema ao contexto egui.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut visuals = if self.is_dark() {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        visuals.panel_fill = self.bg;
        visuals.window_fill = self.panel;
        visuals.override_text_color = Some(self.text);
        ctx.set_visuals(visuals);
    }
}

fn hex_color(hex: &str) -> Color32 {
    let (r, g, b) = theme::hex_to_rgb(hex);
    Color32::from_rgb(r, g, b)
}
