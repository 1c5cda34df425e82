//! Scene builder - turns placements into a depth-sorted draw list
//!
//! `render` is pure: it reads the session state and returns a `Scene`
//! (paint-ordered items plus screen-space hit boxes). Surfaces (egui, SVG)
//! only translate the scene into their own primitives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::color::{is_recent, shades_of, ColorMapper, ColorOptions, Hsl, Shades, DEFAULT_RECENT_DAYS};
use crate::layout::CityLayout;
use crate::model::{CityData, ClassRef};
use crate::projection::{project_box, Box3, ScreenPoint, ScreenRect};
use crate::view::ViewTransform;

pub const SELECTED_COLOR: Hsl = Hsl::new(50.0, 100.0, 50.0);
pub const HOVERED_COLOR: Hsl = Hsl::new(180.0, 100.0, 45.0);
pub const PLATFORM_COLOR: Hsl = Hsl::new(220.0, 10.0, 35.0);
pub const GLOW_COLOR: Hsl = Hsl::new(55.0, 100.0, 70.0);
pub const OUTLINE_COLOR: Hsl = Hsl::new(0.0, 0.0, 10.0);

/// Class names containing any of these are drawn with a dashed outline
pub const DEPRECATED_KEYWORDS: [&str; 4] = ["Deprecated", "Legacy", "Obsolete", "Old"];

/// Case-sensitive keyword match on the class name
pub fn is_deprecated(name: &str) -> bool {
    DEPRECATED_KEYWORDS.iter().any(|k| name.contains(k))
}

/// Viewer toggles that affect drawing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub colors: ColorOptions,
    pub glow: bool,
    pub recent_days: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            colors: ColorOptions::default(),
            glow: true,
            recent_days: DEFAULT_RECENT_DAYS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ItemKind {
    Platform { package: usize },
    Building { class: ClassRef },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outline {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Face {
    pub points: [ScreenPoint; 4],
    pub fill: Hsl,
}

/// One box ready to paint: faces in top, right, left order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawItem {
    pub kind: ItemKind,
    pub label: String,
    pub depth_key: f64,
    pub faces: [Face; 3],
    pub silhouette: [ScreenPoint; 6],
    pub outline: Outline,
    pub glow: Option<Hsl>,
    pub bounds: ScreenRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HitBox {
    pub class: ClassRef,
    pub bounds: ScreenRect,
    pub depth_key: f64,
}

/// Paint-ordered draw list plus hit boxes for the buildings in it
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Scene {
    pub items: Vec<DrawItem>,
    pub hit_boxes: Vec<HitBox>,
}

/// Nearest building whose screen bounding box contains `p`.
///
/// This tests rectangles, not the drawn hexagon, so clicks just outside a
/// building's corners can still select it. Largest depth key wins; among
/// equal keys the later (drawn on top) wins.
pub fn hit_test(boxes: &[HitBox], p: ScreenPoint) -> Option<ClassRef> {
    let mut best: Option<&HitBox> = None;
    for hit in boxes.iter().filter(|h| h.bounds.contains(p)) {
        if best.map_or(true, |b| hit.depth_key >= b.depth_key) {
            best = Some(hit);
        }
    }
    best.map(|h| h.class)
}

/// Everything `render` reads
pub struct RenderInput<'a> {
    pub data: &'a CityData,
    pub layout: &'a CityLayout,
    pub mapper: &'a ColorMapper,
    pub view: &'a ViewTransform,
    pub options: RenderOptions,
    pub hovered: Option<ClassRef>,
    pub selected: Option<ClassRef>,
    pub now: DateTime<Utc>,
}

struct Pending {
    kind: ItemKind,
    label: String,
    shape: Box3,
    shades: Shades,
    outline: Outline,
    glow: Option<Hsl>,
}

/// Build the draw list for the current state
pub fn render(input: &RenderInput<'_>) -> Scene {
    let mut pending = Vec::with_capacity(input.layout.packages.len() + input.layout.building_count());

    for package in &input.layout.packages {
        pending.push(Pending {
            kind: ItemKind::Platform { package: package.package },
            label: package.name.clone(),
            shape: package.as_box(),
            shades: shades_of(PLATFORM_COLOR),
            outline: Outline::Solid,
            glow: None,
        });

        for building in &package.buildings {
            let Some((_, class)) = input.data.class(building.class) else {
                tracing::warn!("Placement references missing class {:?}", building.class);
                continue;
            };
            let meta = class.git_metadata.as_ref();

            let base = if input.selected == Some(building.class) {
                SELECTED_COLOR
            } else if input.hovered == Some(building.class) {
                HOVERED_COLOR
            } else {
                input.mapper.color_for(meta, input.options.colors, input.now)
            };

            let glow = (input.options.glow && is_recent(meta, input.options.recent_days, input.now))
                .then_some(GLOW_COLOR);

            pending.push(Pending {
                kind: ItemKind::Building { class: building.class },
                label: format!("{}.{}", package.name, class.name),
                shape: building.as_box(),
                shades: shades_of(base),
                outline: if is_deprecated(&class.name) { Outline::Dashed } else { Outline::Solid },
                glow,
            });
        }
    }

    // Stable: equal keys keep insertion order (platform before its buildings)
    pending.sort_by(|a, b| a.shape.depth_key().total_cmp(&b.shape.depth_key()));

    let mut scene = Scene {
        items: Vec::with_capacity(pending.len()),
        hit_boxes: Vec::new(),
    };

    for item in pending {
        let projected = project_box(&item.shape, input.view);
        let bounds = projected.bounds();
        let depth_key = item.shape.depth_key();

        if let ItemKind::Building { class } = item.kind {
            scene.hit_boxes.push(HitBox { class, bounds, depth_key });
        }

        scene.items.push(DrawItem {
            kind: item.kind,
            label: item.label,
            depth_key,
            faces: [
                Face { points: projected.top(), fill: item.shades.top },
                Face { points: projected.right(), fill: item.shades.right },
                Face { points: projected.left(), fill: item.shades.left },
            ],
            silhouette: projected.silhouette(),
            outline: item.outline,
            glow: item.glow,
            bounds,
        });
    }

    scene
}
