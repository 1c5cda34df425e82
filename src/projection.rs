//! Isometric projection
//!
//! Fixed oblique projection, no perspective:
//! - screenX = (x - y) * cos(30°) * scale + offsetX
//! - screenY = ((x + y) * sin(30°) - z) * scale + offsetY
//!
//! z only moves points vertically on screen. Objects with a larger `x + y`
//! are closer to the viewer.

use serde::Serialize;

use crate::view::ViewTransform;

const COS_30: f64 = 0.866_025_403_784_438_6;
const SIN_30: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in screen space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenRect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ScreenRect {
    /// Bounding rectangle of a point set; `None` when empty
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = ScreenPoint>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Self {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(r) => Self {
                    min_x: r.min_x.min(p.x),
                    min_y: r.min_y.min(p.y),
                    max_x: r.max_x.max(p.x),
                    max_y: r.max_y.max(p.y),
                },
            })
        })
    }

    pub fn contains(&self, p: ScreenPoint) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// World-space box: origin at its back-bottom corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Box3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl Box3 {
    /// Corners 0-3 on the bottom, 4-7 on top, both counter-clockwise from the origin
    pub fn corners(&self) -> [Point3; 8] {
        let (x0, y0, z0) = (self.x, self.y, self.z);
        let (x1, y1, z1) = (self.x + self.width, self.y + self.depth, self.z + self.height);
        [
            Point3::new(x0, y0, z0),
            Point3::new(x1, y0, z0),
            Point3::new(x1, y1, z0),
            Point3::new(x0, y1, z0),
            Point3::new(x0, y0, z1),
            Point3::new(x1, y0, z1),
            Point3::new(x1, y1, z1),
            Point3::new(x0, y1, z1),
        ]
    }

    /// Painter's-algorithm sort key
    pub fn depth_key(&self) -> f64 {
        self.x + self.y
    }
}

/// Projected corners of a box, in `Box3::corners` order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedBox {
    pub corners: [ScreenPoint; 8],
}

impl ProjectedBox {
    pub fn top(&self) -> [ScreenPoint; 4] {
        let c = &self.corners;
        [c[4], c[5], c[6], c[7]]
    }

    /// Face at x + width
    pub fn right(&self) -> [ScreenPoint; 4] {
        let c = &self.corners;
        [c[1], c[2], c[6], c[5]]
    }

    /// Face at y + depth
    pub fn left(&self) -> [ScreenPoint; 4] {
        let c = &self.corners;
        [c[3], c[2], c[6], c[7]]
    }

    /// Visible outline of the box
    pub fn silhouette(&self) -> [ScreenPoint; 6] {
        let c = &self.corners;
        [c[4], c[5], c[1], c[2], c[3], c[7]]
    }

    pub fn bounds(&self) -> ScreenRect {
        let c = self.corners;
        // Eight points always yield a rectangle
        ScreenRect::from_points(c).unwrap_or(ScreenRect {
            min_x: c[0].x,
            min_y: c[0].y,
            max_x: c[0].x,
            max_y: c[0].y,
        })
    }
}

/// Project one world point to the screen
pub fn project(p: Point3, view: &ViewTransform) -> ScreenPoint {
    ScreenPoint {
        x: (p.x - p.y) * COS_30 * view.scale + view.offset_x,
        y: ((p.x + p.y) * SIN_30 - p.z) * view.scale + view.offset_y,
    }
}

pub fn project_box(b: &Box3, view: &ViewTransform) -> ProjectedBox {
    ProjectedBox {
        corners: b.corners().map(|c| project(c, view)),
    }
}
