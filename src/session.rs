//! Visualization session - single owner of all viewer state
//!
//! Holds the dataset, the color mapper built from it, the current layout,
//! the view transform, toggles, interaction state and the last rendered
//! scene. Every surface (egui, HTTP, CLI) drives one of these.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::color::ColorMapper;
use crate::config::Config;
use crate::interaction::{InputEvent, InteractionState, Response};
use crate::layout::{CityLayout, LayoutStrategy};
use crate::model::{CityData, ClassRef};
use crate::panels::{BuildingDetails, CityStats};
use crate::render::{render, RenderInput, RenderOptions, Scene};
use crate::view::{CanvasSize, ViewTransform};

pub struct Session {
    config: Config,
    data: Arc<CityData>,
    mapper: ColorMapper,
    strategy: LayoutStrategy,
    layout: CityLayout,
    options: RenderOptions,
    view: ViewTransform,
    canvas: CanvasSize,
    interaction: InteractionState,
    scene: Scene,
}

impl Session {
    /// Empty session using the configured defaults
    pub fn new(config: Config) -> Self {
        let strategy = config.render.strategy;
        let options = config.render.options();
        Self {
            config,
            data: Arc::new(CityData::default()),
            mapper: ColorMapper::default(),
            strategy,
            layout: CityLayout {
                strategy,
                packages: Vec::new(),
            },
            options,
            view: ViewTransform::default(),
            canvas: CanvasSize::default(),
            interaction: InteractionState::default(),
            scene: Scene::default(),
        }
    }

    /// Replace the dataset: new bounds, new layout, cleared selection, re-fit
    pub fn load(&mut self, data: impl Into<Arc<CityData>>) {
        self.data = data.into();
        self.mapper = ColorMapper::from_data(&self.data);
        tracing::info!(
            "Dataset loaded: {} packages, {} classes, max commits {}",
            self.data.packages.len(),
            self.data.class_count(),
            self.mapper.bounds().max_commits
        );
        self.relayout();
    }

    pub fn set_strategy(&mut self, strategy: LayoutStrategy) {
        if strategy == self.strategy {
            return;
        }
        tracing::info!("Layout strategy changed: {} -> {}", self.strategy, strategy);
        self.strategy = strategy;
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout = CityLayout::compute(&self.data, self.strategy, &self.config.layout);
        self.interaction.reset();
        self.scene = Scene::default();
        self.fit();
    }

    /// Track the canvas size; re-fits when it changes
    pub fn resize(&mut self, canvas: CanvasSize) {
        if canvas == self.canvas {
            return;
        }
        tracing::debug!("Canvas resized to {}x{}", canvas.width, canvas.height);
        self.canvas = canvas;
        self.fit();
    }

    /// Auto-fit the whole city; returns false when there was nothing to fit
    pub fn fit(&mut self) -> bool {
        self.view.fit(self.layout.bounds().as_ref(), self.canvas, &self.config.view)
    }

    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
    }

    pub fn handle(&mut self, event: InputEvent) -> Response {
        self.interaction
            .handle(event, &self.scene.hit_boxes, &mut self.view, &self.config.view)
    }

    /// Rebuild the scene for the current state and keep it for hit-testing
    pub fn render_at(&mut self, now: DateTime<Utc>) -> &Scene {
        self.scene = render(&RenderInput {
            data: &self.data,
            layout: &self.layout,
            mapper: &self.mapper,
            view: &self.view,
            options: self.options,
            hovered: self.interaction.hovered(),
            selected: self.interaction.selected,
            now,
        });
        &self.scene
    }

    pub fn render(&mut self) -> &Scene {
        self.render_at(Utc::now())
    }

    /// Details for the hovered building, else the selected one
    pub fn details(&self, now: DateTime<Utc>) -> Option<BuildingDetails> {
        let focus: ClassRef = self.interaction.focus()?;
        BuildingDetails::for_class(&self.data, &self.layout, focus, self.options.recent_days, now)
    }

    pub fn stats(&self, now: DateTime<Utc>) -> CityStats {
        CityStats::compute(&self.data, self.options.recent_days, now)
    }

    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }

    pub fn layout(&self) -> &CityLayout {
        &self.layout
    }

    pub fn strategy(&self) -> LayoutStrategy {
        self.strategy
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn view(&self) -> &ViewTransform {
        &self.view
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interaction::Phase;
    use crate::model::parse_timestamp;

    fn now() -> DateTime<Utc> {
        parse_timestamp("2025-06-15T12:00:00Z").unwrap()
    }

    fn data() -> CityData {
        CityData::from_json_str(
            r#"{"packages":[
                {"name":"a.b","classes":[{"name":"X","linesOfCode":150},{"name":"Y","linesOfCode":85}]},
                {"name":"c","classes":[{"name":"Z","linesOfCode":40}]}
            ]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_session_renders_nothing() {
        let mut session = Session::new(Config::default());
        session.resize(CanvasSize::new(800.0, 600.0));
        assert_eq!(*session.view(), ViewTransform::default());
        assert!(session.render_at(now()).items.is_empty());
        assert!(!session.has_data());
    }

    #[test]
    fn test_load_fits_and_renders() {
        let mut session = Session::new(Config::default());
        session.resize(CanvasSize::new(800.0, 600.0));
        session.load(data());

        assert_ne!(*session.view(), ViewTransform::default());
        let scene = session.render_at(now());
        assert_eq!(scene.items.len(), 5);
        assert_eq!(scene.hit_boxes.len(), 3);
    }

    #[test]
    fn test_hover_select_and_reset_on_strategy_change() {
        let mut session = Session::new(Config::default());
        session.resize(CanvasSize::new(800.0, 600.0));
        session.load(data());
        let target = session.render_at(now()).hit_boxes[0];
        let at = target.bounds.center();
        session.handle(InputEvent::Clicked(at));
        let selected = session.interaction().selected.unwrap();
        assert!(session.details(now()).is_some());

        let item = session
            .render_at(now())
            .items
            .iter()
            .find(|i| i.kind == crate::render::ItemKind::Building { class: selected })
            .unwrap();
        assert_eq!(item.faces[1].fill, crate::render::SELECTED_COLOR);

        session.set_strategy(LayoutStrategy::Grid);
        assert_eq!(session.interaction().phase(), Phase::Idle);
        assert!(session.details(now()).is_none());
    }

    #[test]
    fn test_manual_zoom_survives_until_resize() {
        let mut session = Session::new(Config::default());
        session.resize(CanvasSize::new(800.0, 600.0));
        session.load(data());
        let fitted = *session.view();

        session.handle(InputEvent::Wheel {
            at: crate::projection::ScreenPoint::new(400.0, 300.0),
            steps: 2.0,
        });
        assert!(session.view().scale > fitted.scale);

        // Same size: no re-fit
        session.resize(CanvasSize::new(800.0, 600.0));
        assert!(session.view().scale > fitted.scale);

        let bigger = CanvasSize::new(1024.0, 768.0);
        session.resize(bigger);
        let mut expected = ViewTransform::default();
        expected.fit(session.layout().bounds().as_ref(), bigger, &crate::config::ViewConfig::default());
        assert_eq!(*session.view(), expected);
    }

    #[test]
    fn test_reload_clears_selection() {
        let mut session = Session::new(Config::default());
        session.resize(CanvasSize::new(800.0, 600.0));
        session.load(data());
        let at = session.render_at(now()).hit_boxes[0].bounds.center();
        session.handle(InputEvent::Clicked(at));
        assert!(session.interaction().selected.is_some());

        session.load(data());
        assert!(session.interaction().selected.is_none());
    }
}
