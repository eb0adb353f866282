//! Stride tracker window - egui/eframe application.
//!
//! # Architecture
//!
//! [`TrackerApp`] is the top-level [`eframe::App`]. It owns:
//!
//! * `state`      - the [`SharedState`] snapshot written by the session runner.
//! * `command_tx` - sends [`SessionCommand`]s to the runner.
//! * `renderer`   - the [`MapRenderer`] with its tile cache of GPU textures.
//! * `tile_rx`    - receives fetched tiles from tasks spawned on the runtime.
//! * `config`     - the loaded settings; the settings panel edits and saves it.
//!
//! The map is painted through [`EguiCanvas`], which adapts an
//! [`egui::Painter`] to [`MapCanvas`].

use std::time::Duration;

use eframe::egui;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::config::{AppConfig, CoachSettings, TARGET_PACE_RANGE};
use crate::geo::Coordinate;
use crate::map::{
    Frame as MapFrame, MapCanvas, MapRenderer, Point, Rect, Rgba, TileError, TileFetcher,
    TileImage, TileKey,
};
use crate::pipeline::{SessionCommand, SharedState, TrackerState};
use crate::track::{format_elapsed, SessionState};

type TileResult = (TileKey, Result<TileImage, TileError>);

// ---------------------------------------------------------------------------
// EguiCanvas
// ---------------------------------------------------------------------------

/// [`MapCanvas`] over an egui painter clipped to the map area.
pub struct EguiCanvas<'a> {
    painter: &'a egui::Painter,
    origin: egui::Pos2,
    backing_px: (u32, u32),
}

impl<'a> EguiCanvas<'a> {
    pub fn new(painter: &'a egui::Painter, origin: egui::Pos2) -> Self {
        Self {
            painter,
            origin,
            backing_px: (0, 0),
        }
    }

    fn pos(&self, p: Point) -> egui::Pos2 {
        self.origin + egui::vec2(p.x as f32, p.y as f32)
    }

    fn rect(&self, r: Rect) -> egui::Rect {
        egui::Rect::from_min_size(
            self.pos(Point::new(r.x, r.y)),
            egui::vec2(r.width as f32, r.height as f32),
        )
    }
}

fn color(c: Rgba) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(c.0, c.1, c.2, c.3)
}

impl MapCanvas for EguiCanvas<'_> {
    type Tile = egui::TextureHandle;

    fn resize(&mut self, width_px: u32, height_px: u32, _scale: f32) {
        // egui applies pixels_per_point itself; only remember the size.
        self.backing_px = (width_px, height_px);
    }

    fn fill_rect(&mut self, rect: Rect, c: Rgba) {
        self.painter.rect_filled(self.rect(rect), 0.0, color(c));
    }

    fn draw_line(&mut self, from: Point, to: Point, width: f32, c: Rgba) {
        self.painter
            .line_segment([self.pos(from), self.pos(to)], egui::Stroke::new(width, color(c)));
    }

    fn draw_tile(&mut self, tile: &Self::Tile, rect: Rect) {
        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        self.painter
            .image(tile.id(), self.rect(rect), uv, egui::Color32::WHITE);
    }

    fn stroke_polyline(&mut self, points: &[Point], width: f32, c: Rgba) {
        let points: Vec<egui::Pos2> = points.iter().map(|p| self.pos(*p)).collect();
        self.painter
            .add(egui::Shape::line(points, egui::Stroke::new(width, color(c))));
    }

    fn fill_circle(&mut self, center: Point, radius: f64, c: Rgba) {
        self.painter
            .circle_filled(self.pos(center), radius as f32, color(c));
    }

    fn stroke_circle(&mut self, center: Point, radius: f64, width: f32, c: Rgba) {
        self.painter.circle_stroke(
            self.pos(center),
            radius as f32,
            egui::Stroke::new(width, color(c)),
        );
    }
}

// ---------------------------------------------------------------------------
// TrackerApp
// ---------------------------------------------------------------------------

pub struct TrackerApp {
    state: SharedState,
    command_tx: mpsc::Sender<SessionCommand>,

    // ── Map ──────────────────────────────────────────────────────────────
    renderer: MapRenderer<egui::TextureHandle>,
    fetcher: TileFetcher,
    runtime: Handle,
    tile_tx: mpsc::UnboundedSender<TileResult>,
    tile_rx: mpsc::UnboundedReceiver<TileResult>,

    // ── Settings ─────────────────────────────────────────────────────────
    config: AppConfig,
    show_settings: bool,
    draft: SettingsDraft,
}

/// Text fields of the settings panel, applied only on Save.
#[derive(Debug, Clone, Default)]
struct SettingsDraft {
    advisor_key: String,
    voice_key: String,
    target_pace: f64,
}

impl SettingsDraft {
    fn from_config(config: &AppConfig) -> Self {
        let settings = config.coach_settings();
        Self {
            advisor_key: settings.advisor_key.unwrap_or_default(),
            voice_key: settings.voice_key.unwrap_or_default(),
            target_pace: settings.target_pace,
        }
    }

    fn to_settings(&self) -> CoachSettings {
        CoachSettings {
            target_pace: self.target_pace,
            advisor_key: Some(self.advisor_key.clone()),
            voice_key: Some(self.voice_key.clone()),
        }
    }
}

impl TrackerApp {
    /// * `state`      - snapshot written by the session runner.
    /// * `command_tx` - sender end of the runner's command channel.
    /// * `runtime`    - where tile downloads are spawned.
    pub fn new(
        state: SharedState,
        command_tx: mpsc::Sender<SessionCommand>,
        runtime: Handle,
        config: AppConfig,
    ) -> Self {
        let renderer = MapRenderer::new(
            Coordinate::from(config.map.default_center),
            config.map.zoom,
            config.map.online_tiles,
        );
        let (tile_tx, tile_rx) = mpsc::unbounded_channel();
        Self {
            state,
            command_tx,
            renderer,
            fetcher: TileFetcher::from_config(&config.map),
            runtime,
            tile_tx,
            tile_rx,
            draft: SettingsDraft::from_config(&config),
            show_settings: false,
            config,
        }
    }

    fn send(&self, command: SessionCommand) {
        if let Err(e) = self.command_tx.try_send(command) {
            log::warn!("ui: could not send command: {e}");
        }
    }

    /// Store the draft in the config, persist it and hand it to the runner.
    fn save_settings(&mut self) {
        let stored = self.config.apply_coach_settings(self.draft.to_settings());
        if let Err(e) = self.config.save() {
            log::warn!("ui: failed to save settings: {e}");
        }
        self.draft = SettingsDraft::from_config(&self.config);
        self.send(SessionCommand::UpdateSettings(stored));
        self.show_settings = false;
    }

    // ── Tiles ────────────────────────────────────────────────────────────

    /// Apply finished downloads to the renderer (non-blocking).
    fn poll_tiles(&mut self, ctx: &egui::Context) {
        while let Ok((key, result)) = self.tile_rx.try_recv() {
            match result {
                Ok(tile) => {
                    let image = egui::ColorImage::from_rgba_unmultiplied(
                        [tile.width as usize, tile.height as usize],
                        &tile.rgba,
                    );
                    let texture = ctx.load_texture(
                        format!("tile-{}-{}-{}", key.z, key.x, key.y),
                        image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.renderer.tile_loaded(key, texture);
                }
                Err(e) => {
                    log::warn!("map: tile {}/{}/{}: {e}", key.z, key.x, key.y);
                    self.renderer.tile_failed(key);
                }
            }
        }
    }

    fn request_tiles(&self, ctx: &egui::Context, keys: Vec<TileKey>) {
        for key in keys {
            let fetcher = self.fetcher.clone();
            let tx = self.tile_tx.clone();
            let ctx = ctx.clone();
            self.runtime.spawn(async move {
                let result = fetcher.fetch(key).await;
                let _ = tx.send((key, result));
                ctx.request_repaint();
            });
        }
    }

    // ── Panels ───────────────────────────────────────────────────────────

    fn draw_map(&mut self, ui: &mut egui::Ui, snapshot: &TrackerState) {
        let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
        let painter = ui.painter_at(rect);

        let frame = MapFrame {
            width: f64::from(rect.width()),
            height: f64::from(rect.height()),
            pixel_ratio: ui.ctx().pixels_per_point(),
            route: &snapshot.route,
            current: snapshot.current,
            tracking: snapshot.session == SessionState::Tracking,
            time_secs: ui.input(|i| i.time),
        };
        let mut canvas = EguiCanvas::new(&painter, rect.min);
        let requests = self.renderer.render(&mut canvas, &frame);
        self.request_tiles(ui.ctx(), requests);

        self.draw_overlay(&painter, rect, snapshot);
    }

    /// Mode badge, GPS accuracy and point count in the map corners.
    fn draw_overlay(&self, painter: &egui::Painter, rect: egui::Rect, snapshot: &TrackerState) {
        let font = egui::FontId::monospace(11.0);
        let text = egui::Color32::from_rgb(160, 160, 160);
        let badge = egui::Color32::from_rgba_unmultiplied(0, 0, 0, 180);

        let pill = |anchor: egui::Align2, at: egui::Pos2, label: String| {
            let galley = painter.layout_no_wrap(label, font.clone(), text);
            let size = galley.size() + egui::vec2(16.0, 6.0);
            let pill = anchor.anchor_size(at, size);
            painter.rect_filled(pill, 10.0, badge);
            painter.galley(pill.min + egui::vec2(8.0, 3.0), galley, text);
            pill
        };

        let fix_ok = snapshot.current.is_some() && snapshot.gps_error.is_none();
        let mode = pill(
            egui::Align2::LEFT_TOP,
            rect.left_top() + egui::vec2(28.0, 12.0),
            self.renderer.mode_label().to_string(),
        );
        let dot = if fix_ok {
            egui::Color32::from_rgb(74, 222, 128)
        } else {
            egui::Color32::from_rgb(248, 113, 113)
        };
        painter.circle_filled(mode.left_center() - egui::vec2(8.0, 0.0), 4.0, dot);

        if let Some(accuracy) = snapshot.accuracy {
            pill(
                egui::Align2::RIGHT_TOP,
                rect.right_top() + egui::vec2(-12.0, 12.0),
                format!("±{}m", accuracy.round()),
            );
        }
        if !snapshot.route.is_empty() {
            pill(
                egui::Align2::RIGHT_BOTTOM,
                rect.right_bottom() + egui::vec2(-12.0, -12.0),
                format!("{} POINTS", snapshot.route.len()),
            );
        }
    }

    fn draw_stats(&self, ui: &mut egui::Ui, snapshot: &TrackerState) {
        let accent = match snapshot.session {
            SessionState::Idle => egui::Color32::from_rgb(150, 150, 150),
            SessionState::Tracking => egui::Color32::from_rgb(80, 200, 120),
            SessionState::Paused => egui::Color32::from_rgb(255, 180, 68),
        };
        ui.label(
            egui::RichText::new(snapshot.session.label().to_uppercase())
                .color(accent)
                .size(12.0),
        );
        ui.add_space(4.0);
        ui.label(
            egui::RichText::new(snapshot.elapsed_label())
                .color(egui::Color32::WHITE)
                .size(36.0)
                .monospace(),
        );

        egui::Grid::new("stats").num_columns(2).spacing([16.0, 6.0]).show(ui, |ui| {
            stat(ui, "DISTANCE", format!("{:.2} km", snapshot.distance_km));
            stat(ui, "PACE", format!("{} /km", snapshot.pace_label()));
            stat(ui, "SPEED", format!("{:.1} km/h", snapshot.current_speed_kmh));
            stat(ui, "CALORIES", format!("{}", snapshot.calories));
        });

        if let Some(error) = &snapshot.gps_error {
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(format!("GPS: {error}"))
                    .color(egui::Color32::from_rgb(255, 136, 68))
                    .size(11.0),
            );
        }
    }

    fn draw_controls(&self, ui: &mut egui::Ui, session: SessionState) {
        ui.horizontal(|ui| {
            let button = |ui: &mut egui::Ui, label: &str| {
                ui.add(egui::Button::new(egui::RichText::new(label).size(14.0)))
                    .clicked()
            };
            match session {
                SessionState::Idle => {
                    if button(ui, "Start") {
                        self.send(SessionCommand::Start);
                    }
                }
                SessionState::Tracking => {
                    if button(ui, "Pause") {
                        self.send(SessionCommand::Pause);
                    }
                    if button(ui, "Stop") {
                        self.send(SessionCommand::Stop);
                    }
                }
                SessionState::Paused => {
                    if button(ui, "Resume") {
                        self.send(SessionCommand::Resume);
                    }
                    if button(ui, "Stop") {
                        self.send(SessionCommand::Stop);
                    }
                }
            }
            if button(ui, "Reset") {
                self.send(SessionCommand::Reset);
            }
        });
    }

    /// Service keys and target pace.
    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        panel_frame().show(ui, |ui| {
            ui.label(
                egui::RichText::new("AI SETTINGS")
                    .color(egui::Color32::from_rgb(96, 165, 250))
                    .size(10.0),
            );
            ui.add_space(4.0);

            key_field(ui, "Gemini API key", &mut self.draft.advisor_key);
            key_field(ui, "VAPI API key", &mut self.draft.voice_key);

            ui.label(
                egui::RichText::new("Target pace (min/km)")
                    .color(egui::Color32::from_rgb(160, 160, 160))
                    .size(11.0),
            );
            ui.add(
                egui::DragValue::new(&mut self.draft.target_pace)
                    .range(TARGET_PACE_RANGE)
                    .speed(0.05)
                    .fixed_decimals(2),
            );
            ui.add_space(6.0);

            ui.horizontal(|ui| {
                if ui.button("Save").clicked() {
                    self.save_settings();
                }
                if ui.button("Cancel").clicked() {
                    self.draft = SettingsDraft::from_config(&self.config);
                    self.show_settings = false;
                }
            });
        });
    }

    fn draw_coaching(&self, ui: &mut egui::Ui, snapshot: &TrackerState) {
        let Some(message) = &snapshot.coaching else {
            return;
        };
        if snapshot.session != SessionState::Tracking {
            return;
        }
        panel_frame().show(ui, |ui| {
            ui.label(
                egui::RichText::new("AI COACH")
                    .color(egui::Color32::from_rgb(96, 165, 250))
                    .size(10.0),
            );
            ui.label(egui::RichText::new(message).color(egui::Color32::WHITE));
        });
    }

    fn draw_feedback(&self, ui: &mut egui::Ui, snapshot: &TrackerState) {
        if let Some(run) = &snapshot.last_run {
            ui.label(
                egui::RichText::new(format!(
                    "Last run: {} · {:.2} km · {} /km · {} kcal",
                    format_elapsed(run.duration_secs),
                    run.distance_km,
                    run.pace_label(),
                    run.calories
                ))
                .color(egui::Color32::from_rgb(160, 160, 160))
                .size(11.0),
            );
        }

        if snapshot.analyzing {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Analyzing your run...");
            });
            return;
        }

        let Some(feedback) = &snapshot.feedback else {
            return;
        };
        panel_frame().show(ui, |ui| {
            section(ui, "Summary", &feedback.summary);
            section(ui, "Performance", &feedback.performance);
            ui.label(
                egui::RichText::new("Suggestions")
                    .color(egui::Color32::from_rgb(160, 160, 160))
                    .size(11.0),
            );
            for suggestion in &feedback.suggestions {
                ui.label(format!("• {suggestion}"));
            }
            ui.add_space(4.0);
            ui.label(
                egui::RichText::new(&feedback.motivation)
                    .color(egui::Color32::from_rgb(147, 197, 253))
                    .strong(),
            );
            if ui.button("Dismiss").clicked() {
                self.send(SessionCommand::DismissFeedback);
            }
        });
    }
}

fn panel_frame() -> egui::Frame {
    egui::Frame::new()
        .fill(egui::Color32::from_rgba_premultiplied(30, 30, 30, 220))
        .corner_radius(egui::CornerRadius::same(8))
        .inner_margin(egui::Margin::same(8))
}

fn key_field(ui: &mut egui::Ui, name: &str, value: &mut String) {
    ui.label(
        egui::RichText::new(name)
            .color(egui::Color32::from_rgb(160, 160, 160))
            .size(11.0),
    );
    ui.add(
        egui::TextEdit::singleline(value)
            .password(true)
            .hint_text("not set"),
    );
    ui.add_space(4.0);
}

fn stat(ui: &mut egui::Ui, name: &str, value: String) {
    ui.label(
        egui::RichText::new(name)
            .color(egui::Color32::from_rgb(120, 120, 120))
            .size(10.0),
    );
    ui.label(egui::RichText::new(value).color(egui::Color32::WHITE).size(16.0));
    ui.end_row();
}

fn section(ui: &mut egui::Ui, title: &str, body: &str) {
    ui.label(
        egui::RichText::new(title)
            .color(egui::Color32::from_rgb(160, 160, 160))
            .size(11.0),
    );
    ui.label(egui::RichText::new(body).color(egui::Color32::WHITE));
    ui.add_space(4.0);
}

// ---------------------------------------------------------------------------
// eframe::App impl
// ---------------------------------------------------------------------------

impl eframe::App for TrackerApp {
    /// Called every frame by eframe. Applies fetched tiles, copies the
    /// runner snapshot, then renders the window.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_tiles(ctx);
        let snapshot = self.state.lock().unwrap().clone();

        // --- Schedule repaints -------------------------------------------
        match snapshot.session {
            // ~30 fps for the pulsing position halo
            SessionState::Tracking => ctx.request_repaint_after(Duration::from_millis(33)),
            _ => ctx.request_repaint_after(Duration::from_millis(500)),
        }

        egui::SidePanel::right("stats")
            .resizable(false)
            .exact_width(300.0)
            .frame(panel_frame())
            .show(ctx, |ui| {
                self.draw_stats(ui, &snapshot);
                ui.separator();
                self.draw_controls(ui, snapshot.session);
                ui.add_space(4.0);
                let label = if self.show_settings { "Hide settings" } else { "AI settings" };
                if ui.small_button(label).clicked() {
                    self.show_settings = !self.show_settings;
                }
                ui.add_space(8.0);
                egui::ScrollArea::vertical().show(ui, |ui| {
                    if self.show_settings {
                        self.draw_settings(ui);
                        ui.add_space(8.0);
                    }
                    self.draw_coaching(ui, &snapshot);
                    ui.add_space(8.0);
                    self.draw_feedback(ui, &snapshot);
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::new())
            .show(ctx, |ui| self.draw_map(ui, &snapshot));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        log::info!(
            "tracker window closing ({} tiles cached, target pace {:.1})",
            self.renderer.tiles().ready_count(),
            self.config.tracking.target_pace
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_draft_round_trips_through_config() {
        let mut config = AppConfig::default();
        config.advisor.api_key = Some("gm".into());

        let mut draft = SettingsDraft::from_config(&config);
        assert_eq!(draft.advisor_key, "gm");
        assert_eq!(draft.voice_key, "");
        assert_eq!(draft.target_pace, 6.0);

        draft.voice_key = " vk ".into();
        draft.advisor_key.clear();
        draft.target_pace = 5.5;
        let stored = config.apply_coach_settings(draft.to_settings());

        assert!(stored.advisor_key.is_none());
        assert_eq!(stored.voice_key.as_deref(), Some("vk"));
        assert_eq!(config.tracking.target_pace, 5.5);
        assert_eq!(SettingsDraft::from_config(&config).voice_key, "vk");
    }
}
