//! Dashboard principal – App eframe/egui.

use crate::panels::{self, UiAction};
use crate::push_listener::PushEvent;
use crate::theme_egui::EguiTheme;
use crate::tray::NotificationTray;
use crate::worker::{Command, Reply, WorkerHandle};
use crossbeam_channel::Receiver;
use egui::RichText;
use ldms_core::board::SensorBoard;
use ldms_core::config::AppConfig;
use ldms_core::favorites::Favorites;
use ldms_core::geo;
use ldms_core::notification::{DeepLink, Notification, Notifier, PushMessage};
use ldms_core::threat::{self, SOIL_HIGH, TILT_HIGH, ThreatFilter};
use ldms_core::types::Identity;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Telas do app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Register,
    Dashboard,
    Nearby,
    Detail,
    Settings,
    Profile,
}

impl Screen {
    /// Abas da barra superior (usuário autenticado).
    const TABS: [Screen; 4] = [Screen::Dashboard, Screen::Nearby, Screen::Settings, Screen::Profile];

    fn label(self) -> &'static str {
        match self {
            Screen::Login => "Login",
            Screen::Register => "Cadastro",
            Screen::Dashboard => "🗺 Dashboard",
            Screen::Nearby => "📍 Próximos",
            Screen::Detail => "Detalhes",
            Screen::Settings => "⚙ Configurações",
            Screen::Profile => "👤 Perfil",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FeedStatus {
    Connecting,
    Live,
    Cancelled(String),
}

#[derive(Debug, Default)]
struct AuthForm {
    email: String,
    password: String,
    confirm: String,
    busy: bool,
    error: Option<String>,
}

#[derive(Debug, Default)]
struct ProfileForm {
    display_name: String,
    busy: bool,
    message: Option<String>,
}

/// Validação local dos formulários de login e cadastro.
///
/// `confirm` só é passado no cadastro.
pub fn check_credentials(email: &str, password: &str, confirm: Option<&str>) -> Result<(), &'static str> {
    if email.trim().is_empty() || password.is_empty() {
        return Err("Informe e-mail e senha");
    }
    if let Some(confirm) = confirm {
        if confirm.is_empty() {
            return Err("Confirme a senha");
        }
        if confirm != password {
            return Err("As senhas não coincidem");
        }
    }
    Ok(())
}

/// Estado do dashboard.
pub struct LdmsDashboard {
    config: AppConfig,
    config_path: PathBuf,
    theme: EguiTheme,
    demo: bool,

    // Threads
    worker: WorkerHandle,
    pushes: Option<Receiver<PushEvent>>,

    // Sessão e dados
    user: Option<Identity>,
    board: SensorBoard,
    favorites: Favorites,
    feed: FeedStatus,

    // UI state
    screen: Screen,
    filter: ThreatFilter,
    favorites_only: bool,
    detail: Option<String>,
    pending_link: Option<String>,
    tray: NotificationTray,
    show_tray: bool,
    auth: AuthForm,
    profile: ProfileForm,
    status: Option<String>,
    is_fullscreen: bool,
}

impl LdmsDashboard {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        config_path: PathBuf,
        worker: WorkerHandle,
        pushes: Option<Receiver<PushEvent>>,
        demo_login: Option<(&str, &str)>,
    ) -> Self {
        let theme = EguiTheme::named(&config.dashboard.theme);
        let board = SensorBoard::new(config.dashboard.history_len);

        let mut auth = AuthForm::default();
        if let Some((email, password)) = demo_login {
            auth.email = email.to_string();
            auth.password = password.to_string();
        }

        Self {
            config,
            config_path,
            theme,
            demo: demo_login.is_some(),
            worker,
            pushes,
            user: None,
            board,
            favorites: Favorites::new(),
            feed: FeedStatus::Connecting,
            screen: Screen::Login,
            filter: ThreatFilter::All,
            favorites_only: false,
            detail: None,
            pending_link: None,
            tray: NotificationTray::new(),
            show_tray: false,
            auth,
            profile: ProfileForm::default(),
            status: None,
            is_fullscreen: false,
        }
    }

    // ──────────────────────────────────────────
    // Canais
    // ──────────────────────────────────────────

    /// Processa respostas pendentes do worker.
    fn poll_worker(&mut self) {
        while let Ok(reply) = self.worker.replies.try_recv() {
            match reply {
                Reply::SignedIn(identity) => {
                    info!("Autenticado como {}", identity.email.as_deref().unwrap_or(&identity.uid));
                    self.profile.display_name = identity.display_name.clone().unwrap_or_default();
                    self.user = Some(identity);
                    self.board = SensorBoard::new(self.config.dashboard.history_len);
                    self.feed = FeedStatus::Connecting;
                    self.auth = AuthForm {
                        email: std::mem::take(&mut self.auth.email),
                        ..Default::default()
                    };
                    self.screen = Screen::Dashboard;
                    if let Some(sensor) = self.pending_link.take() {
                        self.board.select(Some(sensor));
                    }
                }
                Reply::AuthFailed(message) => {
                    self.auth.busy = false;
                    self.auth.error = Some(message);
                }
                Reply::UserData { favorites, assigned } => {
                    self.favorites = favorites;
                    if !assigned.is_empty() {
                        info!("{} nós atribuídos ao usuário", assigned.len());
                    }
                    self.board.set_assigned(assigned);
                }
                Reply::Nodes(nodes) => {
                    if self.user.is_none() {
                        continue;
                    }
                    self.feed = FeedStatus::Live;
                    let update = self.board.apply(nodes);
                    for name in update.newly_high {
                        warn!("⚠ Nó {name} em risco ALTO");
                        if self.demo && self.config.dashboard.notifications_enabled {
                            self.tray
                                .post(&Notification::from_push(&PushMessage::high_risk(&name)));
                        }
                    }
                }
                Reply::FeedCancelled(reason) => {
                    warn!("Assinatura dos nós cancelada: {reason}");
                    self.feed = FeedStatus::Cancelled(reason);
                }
                Reply::ResetSent(email) => {
                    self.profile.busy = false;
                    self.profile.message = Some(format!("E-mail de redefinição enviado para {email}"));
                }
                Reply::ProfileUpdated(identity) => {
                    self.profile.busy = false;
                    self.profile.display_name = identity.display_name.clone().unwrap_or_default();
                    self.profile.message = Some("Perfil atualizado".into());
                    self.user = Some(identity);
                }
                Reply::FavoriteSaved(change) => self.favorites.apply(&change),
                Reply::Failed(message) => {
                    self.auth.busy = false;
                    self.profile.busy = false;
                    self.status = Some(message);
                }
            }
        }
    }

    /// Drena os pushes do watch para a bandeja.
    fn poll_pushes(&mut self) {
        let Some(rx) = &self.pushes else {
            return;
        };
        while let Ok(event) = rx.try_recv() {
            if self.config.dashboard.notifications_enabled {
                self.tray.receive(event);
            }
        }
    }

    fn open_link(&mut self, link: DeepLink) {
        let DeepLink::Dashboard { sensor } = link;
        self.show_tray = false;
        if self.user.is_none() {
            // Aplica depois do login
            self.pending_link = sensor;
            return;
        }
        self.screen = Screen::Dashboard;
        if sensor.is_some() {
            self.board.select(sensor);
        }
    }

    fn apply_action(&mut self, action: UiAction) {
        match action {
            UiAction::Select(name) => self.board.select(name),
            UiAction::OpenDetail(name) => {
                self.board.select(Some(name.clone()));
                self.detail = Some(name);
                self.screen = Screen::Detail;
            }
            UiAction::ToggleFavorite(name) => {
                let change = self.favorites.toggle(&name);
                self.worker.send(Command::SetFavorite(change));
            }
            UiAction::SetFilter(filter) => self.filter = filter,
        }
    }

    fn save_config(&mut self) {
        if let Err(e) = self.config.save(&self.config_path) {
            warn!("{e}");
            self.status = Some(e.to_string());
        }
    }

    fn toggle_theme(&mut self) {
        let next = if self.theme.is_dark() { "light" } else { "dark" };
        self.config.dashboard.theme = next.to_string();
        self.theme = EguiTheme::named(next);
        info!("Tema: {}", self.theme.name);
        self.save_config();
    }

    fn logout(&mut self) {
        self.worker.send(Command::Logout);
        self.user = None;
        self.board = SensorBoard::new(self.config.dashboard.history_len);
        self.favorites = Favorites::new();
        self.feed = FeedStatus::Connecting;
        self.detail = None;
        self.profile = ProfileForm::default();
        self.screen = Screen::Login;
    }

    // ──────────────────────────────────────────
    // Telas
    // ──────────────────────────────────────────

    fn render_auth(&mut self, ui: &mut egui::Ui) {
        let registering = self.screen == Screen::Register;
        let mut submit = false;
        let mut switch = false;

        ui.vertical_centered(|ui: &mut egui::Ui| {
            ui.add_space(60.0);
            ui.label(
                RichText::new("⛰ LDMS")
                    .color(self.theme.title)
                    .size(30.0)
                    .strong()
                    .monospace(),
            );
            ui.label(
                RichText::new("Monitoramento de deslizamentos")
                    .color(self.theme.dim)
                    .monospace(),
            );
            ui.add_space(20.0);

            ui.allocate_ui(egui::vec2(320.0, 260.0), |ui: &mut egui::Ui| {
                panels::panel_frame(
                    ui,
                    if registering { "CADASTRO" } else { "LOGIN" },
                    self.theme.accent,
                    &self.theme,
                    |ui: &mut egui::Ui| {
                        ui.label("E-mail");
                        ui.text_edit_singleline(&mut self.auth.email);
                        ui.label("Senha");
                        let pw = ui.add(egui::TextEdit::singleline(&mut self.auth.password).password(true));
                        submit = !registering
                            && pw.lost_focus()
                            && ui.input(|i| i.key_pressed(egui::Key::Enter));
                        if registering {
                            ui.label("Confirmar senha");
                            ui.add(egui::TextEdit::singleline(&mut self.auth.confirm).password(true));
                        }
                        ui.add_space(8.0);

                        if let Some(err) = &self.auth.error {
                            ui.label(RichText::new(err).color(self.theme.high).monospace());
                        }

                        ui.horizontal(|ui: &mut egui::Ui| {
                            let label = if registering { "Criar conta" } else { "Entrar" };
                            if ui.add_enabled(!self.auth.busy, egui::Button::new(label)).clicked() {
                                submit = true;
                            }
                            if self.auth.busy {
                                ui.spinner();
                            }
                        });

                        ui.separator();
                        let other = if registering {
                            "Já tem conta? Entrar"
                        } else {
                            "Não tem conta? Cadastre-se"
                        };
                        switch = ui.link(other).clicked();
                    },
                );
            });
        });

        if submit {
            self.submit_auth(registering);
        }
        if switch {
            self.auth.error = None;
            self.auth.confirm.clear();
            self.screen = if registering { Screen::Login } else { Screen::Register };
        }
    }

    fn submit_auth(&mut self, registering: bool) {
        let confirm = registering.then_some(self.auth.confirm.as_str());
        if let Err(msg) = check_credentials(&self.auth.email, &self.auth.password, confirm) {
            self.auth.error = Some(msg.to_string());
            return;
        }

        self.auth.error = None;
        self.auth.busy = true;
        let email = self.auth.email.trim().to_string();
        let password = self.auth.password.clone();
        self.worker.send(if registering {
            Command::Register { email, password }
        } else {
            Command::Login { email, password }
        });
    }

    fn render_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui: &mut egui::Ui| {
            ui.horizontal(|ui: &mut egui::Ui| {
                ui.label(
                    RichText::new("⛰ LDMS")
                        .color(self.theme.title)
                        .size(18.0)
                        .strong()
                        .monospace(),
                );
                ui.separator();
                for tab in Screen::TABS {
                    if ui.selectable_label(self.screen == tab, tab.label()).clicked() {
                        self.screen = tab;
                    }
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui: &mut egui::Ui| {
                    let unread = self.tray.unread();
                    let bell = if unread > 0 { format!("🔔 {unread}") } else { "🔔".to_string() };
                    if ui.selectable_label(self.show_tray, bell).clicked() {
                        self.show_tray = !self.show_tray;
                    }

                    let (text, color) = match &self.feed {
                        FeedStatus::Connecting => ("○ Conectando...".to_string(), self.theme.dim),
                        FeedStatus::Live => ("● Ao vivo".to_string(), self.theme.low),
                        FeedStatus::Cancelled(reason) => (format!("✕ {reason}"), self.theme.high),
                    };
                    ui.label(RichText::new(text).color(color).monospace());
                    if matches!(self.feed, FeedStatus::Cancelled(_)) && ui.button("Reconectar").clicked() {
                        self.feed = FeedStatus::Connecting;
                        self.worker.send(Command::Resubscribe);
                    }
                });
            });
        });
    }

    fn render_dashboard(&mut self, ctx: &egui::Context) -> Vec<UiAction> {
        let mut actions = Vec::new();

        // ── Nó selecionado (fundo) ──
        if let Some(node) = self.board.selected() {
            let is_favorite = node
                .node_name
                .as_deref()
                .is_some_and(|n| self.favorites.contains(n));
            egui::TopBottomPanel::bottom("selection").show(ctx, |ui: &mut egui::Ui| {
                ui.add_space(4.0);
                actions.extend(panels::render_selection(ui, node, is_favorite, &self.theme));
                ui.add_space(4.0);
            });
        }

        egui::CentralPanel::default().show(ctx, |ui: &mut egui::Ui| {
            panels::render_summary(ui, self.board.summary(), &self.theme);
            ui.add_space(6.0);
            actions.extend(panels::render_filter_bar(
                ui,
                self.filter,
                &mut self.favorites_only,
                &self.theme,
            ));
            ui.add_space(6.0);

            let favorites_only = self.favorites_only;
            let favorites = &self.favorites;
            let shown = |name: &str| !favorites_only || favorites.contains(name);

            let mut markers = self.board.markers(self.filter);
            markers.retain(|m| shown(&m.name));
            let nodes: Vec<_> = self
                .board
                .filtered(self.filter)
                .into_iter()
                .filter(|s| s.node_name.as_deref().is_some_and(|n| shown(n)))
                .collect();
            let center = self.config.dashboard.map_center();
            let selected = self.board.selected_name();

            ui.columns(2, |cols| {
                actions.extend(panels::render_map(&mut cols[0], &markers, center, selected, &self.theme));
                panels::panel_frame(&mut cols[1], "SENSORES", self.theme.accent, &self.theme, |ui: &mut egui::Ui| {
                    actions.extend(panels::render_node_list(ui, &nodes, favorites, selected, &self.theme));
                });
            });
        });

        actions
    }

    fn render_nearby(&self, ui: &mut egui::Ui) -> Option<UiAction> {
        let dash = &self.config.dashboard;
        let (center, origin) = match dash.user_location() {
            Some(p) => (p, "sua localização"),
            None => (dash.map_center(), "centro do mapa"),
        };
        let rows = geo::nearest_first(center, self.board.sensors(), dash.nearby_radius_m);

        ui.label(
            RichText::new(format!(
                "Sensores a até {} de {origin} ({:.4}, {:.4})",
                panels::format_value(dash.nearby_radius_m, " m"),
                center.lat,
                center.lon
            ))
            .color(self.theme.dim)
            .monospace(),
        );
        ui.add_space(6.0);
        panels::render_nearby(ui, &rows, dash.nearby_radius_m, &self.theme)
    }

    fn render_detail(&mut self, ui: &mut egui::Ui) -> Option<UiAction> {
        let mut action = None;

        // O nó continua selecionado ao voltar
        if ui.button("← Voltar").clicked() {
            self.screen = Screen::Dashboard;
            return None;
        }

        let Some(name) = self.detail.as_deref() else {
            return action;
        };
        let Some(node) = self.board.find(name) else {
            ui.label(
                RichText::new(format!("Sem leitura para {name}"))
                    .color(self.theme.dim)
                    .monospace(),
            );
            return action;
        };

        ui.horizontal(|ui: &mut egui::Ui| {
            ui.label(RichText::new(name).color(self.theme.title).size(20.0).strong());
            panels::level_badge(ui, threat::ThreatLevel::of(node), &self.theme);
            let star = if self.favorites.contains(name) { "★" } else { "☆" };
            if ui.button(star).clicked() {
                action = Some(UiAction::ToggleFavorite(name.to_string()));
            }
        });
        ui.add_space(6.0);

        panels::render_readings(ui, node, &self.theme);
        ui.add_space(6.0);
        panels::render_alerts(ui, &threat::reading_alerts(node), &self.theme);
        ui.add_space(6.0);

        if let Some(history) = self.board.history(name) {
            ui.label(
                RichText::new(format!("Histórico ({} amostras)", history.len()))
                    .color(self.theme.dim)
                    .monospace(),
            );
            ui.columns(3, |cols| {
                panels::history_plot(&mut cols[0], "Inclinação °", &history.tilt, self.theme.accent, 140.0, Some(TILT_HIGH));
                panels::history_plot(&mut cols[1], "Umidade %", &history.soil, self.theme.medium, 140.0, Some(SOIL_HIGH));
                panels::history_plot(&mut cols[2], "Chuva mm", &history.rain, self.theme.low, 140.0, Some(threat::RAIN_HEAVY));
            });
        }

        action
    }

    fn render_settings(&mut self, ui: &mut egui::Ui) {
        let mut changed = false;
        let mut toggle_theme = false;

        panels::panel_frame(ui, "CONFIGURAÇÕES", self.theme.accent, &self.theme, |ui: &mut egui::Ui| {
            changed |= ui
                .checkbox(&mut self.config.dashboard.notifications_enabled, "Notificações")
                .changed();
            let mut dark = self.theme.is_dark();
            if ui.checkbox(&mut dark, "Modo escuro").changed() {
                toggle_theme = true;
            }
            ui.add_space(6.0);
            panels::metric_row_string(
                ui,
                "Porta de push",
                &self.config.dashboard.push_port.to_string(),
                self.theme.text,
                self.theme.dim,
            );
            panels::metric_row_string(
                ui,
                "Backend",
                if self.demo { "demo (memória)" } else { self.config.backend.database_url.as_str() },
                self.theme.text,
                self.theme.dim,
            );
            panels::metric_row_string(
                ui,
                "Arquivo",
                &self.config_path.display().to_string(),
                self.theme.dim,
                self.theme.dim,
            );
        });

        if toggle_theme {
            self.toggle_theme();
        } else if changed {
            info!(
                "Notificações {}",
                if self.config.dashboard.notifications_enabled { "ativadas" } else { "desativadas" }
            );
            self.save_config();
        }
    }

    fn render_profile(&mut self, ui: &mut egui::Ui) {
        let email = self
            .user
            .as_ref()
            .and_then(|u| u.email.clone())
            .unwrap_or_default();
        let mut logout = false;

        panels::panel_frame(ui, "PERFIL", self.theme.accent, &self.theme, |ui: &mut egui::Ui| {
            panels::metric_row_string(ui, "E-mail", &email, self.theme.text, self.theme.dim);
            ui.add_space(6.0);

            ui.label("Nome de exibição");
            ui.horizontal(|ui: &mut egui::Ui| {
                ui.text_edit_singleline(&mut self.profile.display_name);
                if ui.add_enabled(!self.profile.busy, egui::Button::new("Salvar")).clicked() {
                    let name = self.profile.display_name.trim();
                    let name = (!name.is_empty()).then(|| name.to_string());
                    self.profile.busy = true;
                    self.profile.message = None;
                    self.worker.send(Command::UpdateDisplayName(name));
                }
            });
            ui.add_space(6.0);

            ui.horizontal(|ui: &mut egui::Ui| {
                let can_reset = !self.profile.busy && !email.is_empty();
                if ui.add_enabled(can_reset, egui::Button::new("Redefinir senha")).clicked() {
                    self.profile.busy = true;
                    self.profile.message = None;
                    self.worker.send(Command::SendPasswordReset { email: email.clone() });
                }
                if self.profile.busy {
                    ui.spinner();
                }
            });

            if let Some(msg) = &self.profile.message {
                ui.label(RichText::new(msg).color(self.theme.low).monospace());
            }

            ui.separator();
            if ui.button("Sair").clicked() {
                logout = true;
            }
        });

        if logout {
            self.logout();
        }
    }

    fn render_tray(&mut self, ctx: &egui::Context) {
        let mut open = self.show_tray;
        let mut opened = None;
        let mut clear = false;

        egui::Window::new("🔔 Notificações")
            .open(&mut open)
            .default_width(360.0)
            .resizable(true)
            .show(ctx, |ui: &mut egui::Ui| {
                if self.tray.is_empty() {
                    ui.label(RichText::new("Nenhuma notificação").color(self.theme.dim).monospace());
                    return;
                }
                ui.horizontal(|ui: &mut egui::Ui| {
                    if ui.button("Marcar como lidas").clicked() {
                        self.tray.mark_all_read();
                    }
                    if ui.button("Limpar").clicked() {
                        clear = true;
                    }
                });
                ui.separator();

                egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui: &mut egui::Ui| {
                    for (i, entry) in self.tray.entries().enumerate() {
                        let color = if entry.read { self.theme.dim } else { self.theme.high };
                        let ago = entry.received.elapsed().as_secs();
                        let title = RichText::new(format!("{} ({ago}s)", entry.notification.title))
                            .color(color)
                            .strong();
                        if ui.link(title).clicked() {
                            opened = Some(i);
                        }
                        ui.label(RichText::new(&entry.notification.body).color(self.theme.text));
                        if let Some(src) = &entry.source {
                            ui.label(RichText::new(format!("via {src}")).color(self.theme.dim).size(10.0));
                        }
                        ui.separator();
                    }
                });
            });

        self.show_tray = open;
        if clear {
            self.tray.clear();
        }
        if let Some(link) = opened.and_then(|i| self.tray.open(i)) {
            self.open_link(link);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (fullscreen, theme, escape) = ctx.input(|i: &egui::InputState| {
            (
                i.key_pressed(egui::Key::F) || i.key_pressed(egui::Key::F11),
                i.key_pressed(egui::Key::T),
                i.key_pressed(egui::Key::Escape),
            )
        });
        if fullscreen {
            self.is_fullscreen = !self.is_fullscreen;
            ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(self.is_fullscreen));
        }
        if theme {
            self.toggle_theme();
        }
        if escape {
            self.show_tray = false;
        }
    }
}

impl eframe::App for LdmsDashboard {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ── Poll canais ──
        self.poll_worker();
        self.poll_pushes();

        ctx.request_repaint_after(Duration::from_millis(100));
        self.theme.apply(ctx);
        self.handle_shortcuts(ctx);

        if self.show_tray {
            self.render_tray(ctx);
        }

        if self.user.is_none() {
            egui::CentralPanel::default().show(ctx, |ui: &mut egui::Ui| self.render_auth(ui));
            return;
        }

        self.render_top_bar(ctx);

        if let Some(msg) = self.status.clone() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui: &mut egui::Ui| {
                ui.horizontal(|ui: &mut egui::Ui| {
                    ui.label(RichText::new(format!("⚠ {msg}")).color(self.theme.high).monospace());
                    if ui.small_button("✕").clicked() {
                        self.status = None;
                    }
                });
            });
        }

        let mut actions = Vec::new();
        match self.screen {
            Screen::Dashboard => actions = self.render_dashboard(ctx),
            screen => {
                egui::CentralPanel::default().show(ctx, |ui: &mut egui::Ui| match screen {
                    Screen::Nearby => actions.extend(self.render_nearby(ui)),
                    Screen::Detail => actions.extend(self.render_detail(ui)),
                    Screen::Settings => self.render_settings(ui),
                    Screen::Profile => self.render_profile(ui),
                    Screen::Login | Screen::Register | Screen::Dashboard => {}
                });
            }
        }

        for action in actions {
            self.apply_action(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        assert!(check_credentials("ana@example.com", "secret1", None).is_ok());
        assert_eq!(check_credentials("  ", "secret1", None), Err("Informe e-mail e senha"));
        assert_eq!(check_credentials("ana@example.com", "", None), Err("Informe e-mail e senha"));
    }

    #[test]
    fn register_checks_confirmation() {
        assert!(check_credentials("ana@example.com", "secret1", Some("secret1")).is_ok());
        assert_eq!(check_credentials("ana@example.com", "secret1", Some("")), Err("Confirme a senha"));
        assert_eq!(
            check_credentials("ana@example.com", "secret1", Some("secret2")),
            Err("As senhas não coincidem")
        );
    }

    #[test]
    fn tabs_do_not_include_auth_screens() {
        assert!(!Screen::TABS.contains(&Screen::Login));
        assert!(!Screen::TABS.contains(&Screen::Detail));
    }
}
