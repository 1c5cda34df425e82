//! Native GUI viewer using egui
//!
//! Isometric city on a painter canvas with hover/select, middle-drag pan and
//! wheel zoom. The side panel carries the layout selector, color toggles,
//! details, statistics and legend.

use chrono::Utc;
use eframe::egui;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::color::Hsl;
use crate::config::Config;
use crate::interaction::{InputEvent, Phase, PointerButton, Response};
use crate::layout::LayoutStrategy;
use crate::loader::{self, DataSource, LoadError};
use crate::log_error;
use crate::model::CityData;
use crate::panels::{legend, BuildingDetails, CityStats};
use crate::projection::ScreenPoint;
use crate::render::{Outline, Scene, OUTLINE_COLOR};
use crate::session::Session;
use crate::view::CanvasSize;

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(24, 27, 34);
/// Raw scroll delta that counts as one wheel notch
const SCROLL_STEP: f32 = 50.0;
const GLOW_RINGS: u32 = 3;
const GLOW_ALPHA: u32 = 120;
const BUTTONS: [(egui::PointerButton, PointerButton); 3] = [
    (egui::PointerButton::Primary, PointerButton::Primary),
    (egui::PointerButton::Middle, PointerButton::Middle),
    (egui::PointerButton::Secondary, PointerButton::Secondary),
];

/// Run the native GUI viewer
pub fn run_viewer(config: Config, initial: Result<(CityData, DataSource), LoadError>) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_title("Code City"),
        ..Default::default()
    };

    eframe::run_native(
        "Code City",
        options,
        Box::new(|_cc| Ok(Box::new(CityApp::new(config, initial)))),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}

struct CityApp {
    session: Session,
    source: Option<String>,
    stats: CityStats,
    details: Option<BuildingDetails>,
    /// Shown instead of the canvas until a dataset loads
    load_error: Option<String>,
    path_input: String,
    pointer_inside: bool,
}

impl CityApp {
    fn new(config: Config, initial: Result<(CityData, DataSource), LoadError>) -> Self {
        let recent_days = config.render.recent_days;
        let mut app = Self {
            session: Session::new(config),
            source: None,
            stats: CityStats::compute(&CityData::default(), recent_days, Utc::now()),
            details: None,
            load_error: None,
            path_input: "city-data.json".to_string(),
            pointer_inside: false,
        };
        match initial {
            Ok((data, source)) => app.set_data(data, source.to_string()),
            Err(e) => {
                log_error!(e, stage = "startup load");
                app.load_error = Some(e.to_string());
            }
        }
        app
    }

    fn set_data(&mut self, data: CityData, source: String) {
        info!("Viewing {}", source);
        self.session.load(data);
        self.stats = self.session.stats(Utc::now());
        self.source = Some(source);
        self.load_error = None;
        self.refresh_details();
    }

    fn refresh_details(&mut self) {
        self.details = self.session.details(Utc::now());
    }

    fn open_file(&mut self) {
        let path = PathBuf::from(self.path_input.trim());
        match loader::read_file(&path) {
            Ok(data) => self.set_data(data, path.display().to_string()),
            Err(e) => {
                log_error!(e, path = %path.display());
                self.load_error = Some(e.to_string());
            }
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Code City");
        if let Some(source) = &self.source {
            ui.label(egui::RichText::new(source).small());
        }
        ui.separator();

        let mut strategy = self.session.strategy();
        ui.horizontal(|ui| {
            ui.label("Layout:");
            egui::ComboBox::from_id_salt("strategy")
                .selected_text(strategy.as_str())
                .show_ui(ui, |ui| {
                    for option in LayoutStrategy::ALL {
                        ui.selectable_value(&mut strategy, option, option.as_str());
                    }
                });
        });
        if strategy != self.session.strategy() {
            self.session.set_strategy(strategy);
            self.refresh_details();
        }

        let mut options = self.session.options();
        ui.checkbox(&mut options.colors.frequency, "Frequency coloring");
        ui.checkbox(&mut options.colors.age, "Age coloring");
        ui.checkbox(&mut options.glow, "Recency glow");
        ui.checkbox(&mut options.colors.color_blind, "Color-blind palette");
        if options != self.session.options() {
            debug!("Render options changed: {:?}", options);
            self.session.set_options(options);
        }

        if ui.button("Fit view").clicked() {
            self.session.fit();
        }
        ui.separator();

        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.collapsing("Details", |ui| match &self.details {
                Some(details) => {
                    for line in details.lines() {
                        ui.label(line);
                    }
                }
                None => {
                    ui.label("Hover or click a building");
                }
            });
            ui.collapsing("Statistics", |ui| {
                for line in self.stats.lines() {
                    ui.label(line);
                }
            });
            ui.collapsing("Legend", |ui| {
                for line in legend(self.session.options().colors) {
                    ui.label(line);
                }
            });
        });
    }

    fn load_prompt(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.heading("Could not load city data");
            if let Some(error) = &self.load_error {
                ui.label(egui::RichText::new(error).color(egui::Color32::LIGHT_RED));
            }
            ui.add_space(12.0);
            ui.horizontal(|ui| {
                ui.label("JSON file:");
                let edit = ui.text_edit_singleline(&mut self.path_input);
                let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if ui.button("Open").clicked() || submitted {
                    self.open_file();
                }
            });
        });
    }

    /// Translate this frame's pointer input into session events
    fn handle_input(&mut self, ui: &egui::Ui, rect: egui::Rect, response: &egui::Response) -> Response {
        let (hover, scroll, home) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.raw_scroll_delta.y,
                i.key_pressed(egui::Key::Home),
            )
        });
        let buttons = BUTTONS.map(|(raw, button)| {
            ui.input(|i| (button, i.pointer.button_pressed(raw), i.pointer.button_released(raw)))
        });
        let local = |p: egui::Pos2| ScreenPoint::new((p.x - rect.min.x) as f64, (p.y - rect.min.y) as f64);

        let mut events = Vec::new();
        let inside = hover.filter(|p| rect.contains(*p));
        match inside {
            Some(p) => {
                for (button, pressed, _) in buttons {
                    if pressed {
                        events.push(InputEvent::ButtonPressed { button, at: local(p) });
                    }
                }
                events.push(InputEvent::PointerMoved(local(p)));
                if scroll.abs() > f32::EPSILON {
                    events.push(InputEvent::Wheel {
                        at: local(p),
                        steps: (scroll / SCROLL_STEP) as f64,
                    });
                }
                if response.clicked_by(egui::PointerButton::Primary) {
                    events.push(InputEvent::Clicked(local(p)));
                }
            }
            None if self.pointer_inside => events.push(InputEvent::PointerLeft),
            None => {}
        }
        for (button, _, released) in buttons {
            if released {
                events.push(InputEvent::ButtonReleased { button });
            }
        }
        self.pointer_inside = inside.is_some();

        let mut outcome = Response::default();
        for event in events {
            let r = self.session.handle(event);
            outcome.redraw |= r.redraw;
            outcome.details_changed |= r.details_changed;
        }
        if home {
            outcome.redraw |= self.session.fit();
        }
        outcome
    }

    fn canvas(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(format!(
                "{} packages | {} classes | zoom {:.0}% | ",
                self.stats.packages,
                self.stats.classes,
                self.session.view().scale * 100.0
            ));
            ui.label("Click: select | Middle-drag: pan | Scroll: zoom | Home: fit");
        });

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
        self.session
            .resize(CanvasSize::new(rect.width() as f64, rect.height() as f64));

        let outcome = self.handle_input(ui, rect, &response);
        if outcome.details_changed {
            self.refresh_details();
        }
        if outcome.redraw {
            ui.ctx().request_repaint();
        }

        match self.session.interaction().phase() {
            Phase::Hovering(_) => ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand),
            Phase::Panning => ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing),
            Phase::Idle | Phase::Selected(_) => {}
        }

        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, BACKGROUND);
        paint_scene(&painter, rect.min, self.session.render_at(Utc::now()));
    }
}

fn color32(color: Hsl) -> egui::Color32 {
    let [r, g, b] = color.to_rgb();
    egui::Color32::from_rgb(r, g, b)
}

/// Paint items in order: glow, faces, outline
fn paint_scene(painter: &egui::Painter, origin: egui::Pos2, scene: &Scene) {
    let to_pos = |p: &ScreenPoint| egui::pos2(origin.x + p.x as f32, origin.y + p.y as f32);
    let outline = egui::Stroke::new(1.0, color32(OUTLINE_COLOR));

    for item in &scene.items {
        let silhouette: Vec<egui::Pos2> = item.silhouette.iter().map(to_pos).collect();

        if let Some(glow) = item.glow {
            let [r, g, b] = glow.to_rgb();
            // Widest and faintest first
            for ring in (1..=GLOW_RINGS).rev() {
                let color = egui::Color32::from_rgba_unmultiplied(r, g, b, (GLOW_ALPHA / ring) as u8);
                painter.add(egui::Shape::closed_line(
                    silhouette.clone(),
                    egui::Stroke::new(ring as f32 * 4.0, color),
                ));
            }
        }

        for face in &item.faces {
            painter.add(egui::Shape::convex_polygon(
                face.points.iter().map(to_pos).collect(),
                color32(face.fill),
                egui::Stroke::NONE,
            ));
        }

        match item.outline {
            Outline::Solid => {
                painter.add(egui::Shape::closed_line(silhouette, outline));
            }
            Outline::Dashed => {
                let mut path = silhouette;
                if let Some(first) = path.first().copied() {
                    path.push(first);
                }
                painter.extend(egui::Shape::dashed_line(&path, outline, 4.0, 3.0));
            }
        }
    }
}

impl eframe::App for CityApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("city_panel").min_width(260.0).show(ctx, |ui| {
            self.side_panel(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if self.load_error.is_some() && !self.session.has_data() {
                self.load_prompt(ui);
            } else {
                self.canvas(ui);
            }
        });
    }
}
