//! Painéis do dashboard renderizados com egui.
//!
//! Cada função desenha e devolve a ação do usuário, se houver; quem aplica
//! a ação é o app.

use crate::theme_egui::EguiTheme;
use egui::{Color32, RichText, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoint, PlotPoints, Points};
use ldms_core::board::{Marker, Summary};
use ldms_core::favorites::Favorites;
use ldms_core::threat::{
    ALL_FILTERS, RAIN_HEAVY, ReadingAlert, SOIL_HIGH, TILT_HIGH, ThreatFilter, ThreatLevel,
};
use ldms_core::types::{GeoPoint, SensorData};
use std::collections::VecDeque;

/// Ação disparada por um painel.
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Select(Option<String>),
    OpenDetail(String),
    ToggleFavorite(String),
    SetFilter(ThreatFilter),
}

/// Raio de clique em um marcador do mapa (pixels).
const MARKER_HIT_RADIUS: f32 = 12.0;

// ──────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────

pub fn metric_row(ui: &mut Ui, label: &str, value: Option<f64>, unit: &str, color: Color32, dim: Color32) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(format!("{label}:")).color(dim).monospace());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            let text = match value {
                Some(v) => format_value(v, unit),
                None => "—".to_string(),
            };
            ui.label(RichText::new(text).color(color).monospace().strong());
        });
    });
}

pub fn metric_row_string(ui: &mut Ui, label: &str, value: &str, color: Color32, dim: Color32) {
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(format!("{label}:")).color(dim).monospace());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            ui.label(RichText::new(value).color(color).monospace().strong());
        });
    });
}

pub fn format_value(value: f64, unit: &str) -> String {
    match unit {
        "°" | "%" | " mm" | "mm" => format!("{value:.1}{unit}"),
        " m/s²" | " °/s" | " µT" => format!("{value:.3}{unit}"),
        " lx" => format!("{value:.0}{unit}"),
        "lat" | "lon" => format!("{value:.5}"),
        " m" => {
            if value >= 1000.0 {
                format!("{:.2} km", value / 1000.0)
            } else {
                format!("{value:.0} m")
            }
        }
        _ => format!("{value:.2}{unit}"),
    }
}

pub fn panel_frame(
    ui: &mut Ui,
    title: &str,
    accent: Color32,
    theme: &EguiTheme,
    add_body: impl FnOnce(&mut Ui),
) {
    egui::Frame::new()
        .fill(theme.panel)
        .stroke(egui::Stroke::new(2.0, accent))
        .corner_radius(4.0)
        .inner_margin(8.0)
        .show(ui, |ui: &mut Ui| {
            ui.vertical_centered(|ui: &mut Ui| {
                ui.label(
                    RichText::new(format!("── {title} ──"))
                        .color(accent)
                        .strong()
                        .monospace()
                        .size(13.0),
                );
            });
            ui.add_space(4.0);
            add_body(ui);
        });
}

pub fn level_badge(ui: &mut Ui, level: ThreatLevel, theme: &EguiTheme) {
    ui.label(
        RichText::new(format!("● {}", level.label()))
            .color(theme.threat_color(level))
            .monospace()
            .strong(),
    );
}

// ──────────────────────────────────────────
// Resumo e filtro
// ──────────────────────────────────────────

pub fn render_summary(ui: &mut Ui, summary: Summary, theme: &EguiTheme) {
    panel_frame(ui, "RESUMO", theme.accent, theme, |ui: &mut Ui| {
        ui.columns(3, |cols| {
            summary_cell(&mut cols[0], "Sensores", summary.total, theme.text, theme);
            summary_cell(&mut cols[1], "Alto risco", summary.high, theme.high, theme);
            summary_cell(&mut cols[2], "Alertas ativos", summary.active_alerts, theme.medium, theme);
        });
    });
}

fn summary_cell(ui: &mut Ui, label: &str, value: usize, color: Color32, theme: &EguiTheme) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.label(RichText::new(value.to_string()).color(color).size(24.0).strong().monospace());
        ui.label(RichText::new(label).color(theme.dim).monospace().size(11.0));
    });
}

/// Barra de filtro por nível. `favorites_only` é alterado no lugar.
pub fn render_filter_bar(
    ui: &mut Ui,
    current: ThreatFilter,
    favorites_only: &mut bool,
    theme: &EguiTheme,
) -> Option<UiAction> {
    let mut action = None;
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new("Filtro:").color(theme.dim).monospace());
        for filter in ALL_FILTERS {
            let text = match filter {
                ThreatFilter::All => RichText::new(filter.label()),
                ThreatFilter::Only(level) => RichText::new(filter.label()).color(theme.threat_color(level)),
            };
            if ui.selectable_label(current == filter, text).clicked() {
                action = Some(UiAction::SetFilter(filter));
            }
        }
        ui.separator();
        ui.checkbox(favorites_only, "★ Só favoritos");
    });
    action
}

// ──────────────────────────────────────────
// Mapa
// ──────────────────────────────────────────

/// Marcador mais próximo do ponto clicado, dentro de `max_dist`.
pub fn pick_marker<'a>(
    markers: &'a [Marker],
    distance: impl Fn(&Marker) -> f32,
    max_dist: f32,
) -> Option<&'a Marker> {
    markers
        .iter()
        .map(|m| (m, distance(m)))
        .filter(|(_, d)| *d <= max_dist)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(m, _)| m)
}

/// Mapa lat/lon dos nós, coloridos por nível. Clique seleciona.
pub fn render_map(
    ui: &mut Ui,
    markers: &[Marker],
    center: GeoPoint,
    selected: Option<&str>,
    theme: &EguiTheme,
) -> Option<UiAction> {
    let plot = Plot::new("sensor_map")
        .legend(Legend::default())
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .include_x(center.lon - 0.05)
        .include_x(center.lon + 0.05)
        .include_y(center.lat - 0.05)
        .include_y(center.lat + 0.05)
        .allow_boxed_zoom(false);

    let resp = plot.show(ui, |plot_ui| {
        for level in [ThreatLevel::Low, ThreatLevel::Medium, ThreatLevel::High] {
            let points: PlotPoints = markers
                .iter()
                .filter(|m| m.level == level)
                .map(|m| [m.position.lon, m.position.lat])
                .collect();
            plot_ui.points(
                Points::new(points)
                    .name(level.label())
                    .color(theme.threat_color(level))
                    .radius(6.0),
            );
        }

        if let Some(m) = selected.and_then(|name| markers.iter().find(|m| m.name == name)) {
            plot_ui.points(
                Points::new(vec![[m.position.lon, m.position.lat]])
                    .color(theme.title)
                    .radius(10.0)
                    .filled(false),
            );
        }
    });

    if !resp.response.clicked() {
        return None;
    }
    let pointer = resp.response.interact_pointer_pos()?;
    let hit = pick_marker(
        markers,
        |m| {
            resp.transform
                .position_from_point(&PlotPoint::new(m.position.lon, m.position.lat))
                .distance(pointer)
        },
        MARKER_HIT_RADIUS,
    );
    Some(UiAction::Select(hit.map(|m| m.name.clone())))
}

// ──────────────────────────────────────────
// Listas
// ──────────────────────────────────────────

pub fn render_node_list(
    ui: &mut Ui,
    nodes: &[&SensorData],
    favorites: &Favorites,
    selected: Option<&str>,
    theme: &EguiTheme,
) -> Option<UiAction> {
    let mut action = None;

    if nodes.is_empty() {
        ui.label(RichText::new("Nenhum sensor").color(theme.dim).monospace());
        return None;
    }

    egui::ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        for node in nodes {
            let Some(name) = node.node_name.as_deref() else {
                continue;
            };
            let level = ThreatLevel::of(node);

            ui.horizontal(|ui: &mut Ui| {
                let star = if favorites.contains(name) { "★" } else { "☆" };
                if ui.button(RichText::new(star).color(theme.medium)).clicked() {
                    action = Some(UiAction::ToggleFavorite(name.to_string()));
                }

                let label = RichText::new(name)
                    .color(theme.threat_color(level))
                    .monospace();
                if ui.selectable_label(selected == Some(name), label).clicked() {
                    action = Some(UiAction::Select(Some(name.to_string())));
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
                    ui.label(
                        RichText::new(format!(
                            "{:.1}° | {:.0}%",
                            node.tilt_or_zero(),
                            node.soil_or_zero()
                        ))
                        .color(theme.dim)
                        .monospace()
                        .size(11.0),
                    );
                });
            });
        }
    });

    action
}

pub fn render_nearby(
    ui: &mut Ui,
    rows: &[(&SensorData, f64)],
    radius_m: f64,
    theme: &EguiTheme,
) -> Option<UiAction> {
    let mut action = None;

    if rows.is_empty() {
        ui.label(
            RichText::new(format!(
                "Nenhum sensor em {}",
                format_value(radius_m, " m")
            ))
            .color(theme.dim)
            .monospace(),
        );
        return None;
    }

    egui::Grid::new("nearby_grid")
        .striped(true)
        .num_columns(5)
        .show(ui, |ui: &mut Ui| {
            for header in ["Sensor", "Distância", "Inclinação", "Umidade", ""] {
                ui.label(RichText::new(header).color(theme.dim).monospace());
            }
            ui.end_row();

            for (node, dist) in rows {
                let name = node.name_or("Sensor");
                let level = ThreatLevel::of(node);
                ui.label(RichText::new(name).color(theme.threat_color(level)).monospace());
                ui.label(RichText::new(format_value(*dist, " m")).monospace());
                ui.label(RichText::new(format_value(node.tilt_or_zero(), "°")).monospace());
                ui.label(RichText::new(format_value(node.soil_or_zero(), "%")).monospace());
                if ui.button("Detalhes").clicked() {
                    action = Some(UiAction::OpenDetail(name.to_string()));
                }
                ui.end_row();
            }
        });

    action
}

// ──────────────────────────────────────────
// Nó selecionado e detalhes
// ──────────────────────────────────────────

/// Cartão do nó selecionado (parte de baixo do dashboard).
pub fn render_selection(
    ui: &mut Ui,
    node: &SensorData,
    is_favorite: bool,
    theme: &EguiTheme,
) -> Option<UiAction> {
    let mut action = None;
    let name = node.name_or("Sensor").to_string();
    let level = ThreatLevel::of(node);

    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(&name).color(theme.title).strong().size(16.0));
        level_badge(ui, level, theme);
        ui.separator();
        metric_row(ui, "Inclinação", node.tilt, "°", theme.value_color(node.tilt_or_zero(), TILT_HIGH), theme.dim);
        ui.separator();
        metric_row(ui, "Umidade", node.soil_moisture, "%", theme.value_color(node.soil_or_zero(), SOIL_HIGH), theme.dim);

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut Ui| {
            if ui.button("✕").clicked() {
                action = Some(UiAction::Select(None));
            }
            if ui.button("Ver detalhes").clicked() {
                action = Some(UiAction::OpenDetail(name.clone()));
            }
            let star = if is_favorite { "★ Favorito" } else { "☆ Favoritar" };
            if ui.button(star).clicked() {
                action = Some(UiAction::ToggleFavorite(name.clone()));
            }
        });
    });

    action
}

/// Todas as leituras de um nó.
pub fn render_readings(ui: &mut Ui, node: &SensorData, theme: &EguiTheme) {
    ui.columns(3, |cols| {
        panel_frame(&mut cols[0], "AMBIENTE", theme.accent, theme, |ui: &mut Ui| {
            metric_row(ui, "Inclinação", node.tilt, "°", theme.value_color(node.tilt_or_zero(), TILT_HIGH), theme.dim);
            metric_row(ui, "Umidade solo", node.soil_moisture, "%", theme.value_color(node.soil_or_zero(), SOIL_HIGH), theme.dim);
            metric_row(ui, "Chuva", node.rain, " mm", theme.value_color(node.rain_or_zero(), RAIN_HEAVY), theme.dim);
            metric_row(ui, "Luz", node.light, " lx", theme.text, theme.dim);
        });
        panel_frame(&mut cols[1], "MOVIMENTO", theme.accent, theme, |ui: &mut Ui| {
            metric_row(ui, "Accel X", node.accel_x, " m/s²", theme.text, theme.dim);
            metric_row(ui, "Accel Y", node.accel_y, " m/s²", theme.text, theme.dim);
            metric_row(ui, "Accel Z", node.accel_z, " m/s²", theme.text, theme.dim);
            metric_row(ui, "Gyro X", node.gyro_x, " °/s", theme.text, theme.dim);
            metric_row(ui, "Gyro Y", node.gyro_y, " °/s", theme.text, theme.dim);
            metric_row(ui, "Gyro Z", node.gyro_z, " °/s", theme.text, theme.dim);
            metric_row(ui, "Mag X", node.mag_x, " µT", theme.text, theme.dim);
            metric_row(ui, "Mag Y", node.mag_y, " µT", theme.text, theme.dim);
            metric_row(ui, "Mag Z", node.mag_z, " µT", theme.text, theme.dim);
        });
        panel_frame(&mut cols[2], "NÓ", theme.accent, theme, |ui: &mut Ui| {
            metric_row(ui, "Latitude", node.latitude, "lat", theme.text, theme.dim);
            metric_row(ui, "Longitude", node.longitude, "lon", theme.text, theme.dim);
            metric_row_string(ui, "Status", node.status.as_deref().unwrap_or("—"), theme.text, theme.dim);
            metric_row_string(ui, "Leitura", node.timestamp.as_deref().unwrap_or("—"), theme.text, theme.dim);
        });
    });
}

pub fn render_alerts(ui: &mut Ui, alerts: &[ReadingAlert], theme: &EguiTheme) {
    panel_frame(ui, "ALERTAS", theme.high, theme, |ui: &mut Ui| {
        if alerts.is_empty() {
            ui.label(RichText::new("✓ Todas as leituras dentro dos limites").color(theme.low).monospace());
        }
        for alert in alerts {
            ui.label(
                RichText::new(format!(
                    "⚠ {} ({})",
                    alert.message,
                    format_value(alert.value, alert.unit)
                ))
                .color(theme.high)
                .monospace(),
            );
        }
    });
}

pub fn history_plot(
    ui: &mut Ui,
    label: &str,
    data: &VecDeque<f64>,
    color: Color32,
    height: f32,
    threshold: Option<f64>,
) {
    ui.label(RichText::new(label).color(color).monospace().size(11.0));

    let points: PlotPoints = data
        .iter()
        .enumerate()
        .map(|(i, &v)| [i as f64, v])
        .collect();

    let line = Line::new(points).color(color).width(1.5);

    Plot::new(format!("plot_{label}"))
        .height(height)
        .show_axes([false, true])
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .include_y(0.0)
        .show(ui, |plot_ui| {
            plot_ui.line(line);
            if let Some(limit) = threshold {
                let n = data.len().max(2) as f64;
                plot_ui.line(
                    Line::new(PlotPoints::from(vec![[0.0, limit], [n - 1.0, limit]]))
                        .color(Color32::from_rgba_unmultiplied(244, 67, 54, 140))
                        .style(egui_plot::LineStyle::dashed_loose()),
                );
            }
        });
}
