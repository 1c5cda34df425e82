//! View transform: auto-fit, zoom about a point, pan

use serde::Serialize;

use crate::config::ViewConfig;
use crate::projection::{project_box, Box3, ScreenPoint};

/// Scale and screen offset applied after projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// Drawable area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

impl ViewTransform {
    /// Fit the whole city (all 8 corners of its 3D bounds) inside the canvas.
    ///
    /// Returns `false` and leaves the transform untouched when there is no
    /// content or either the content or the canvas has zero size.
    pub fn fit(&mut self, bounds: Option<&Box3>, canvas: CanvasSize, cfg: &ViewConfig) -> bool {
        let Some(bounds) = bounds else {
            return false;
        };

        let rect = project_box(bounds, &ViewTransform::default()).bounds();
        let available_w = canvas.width - 2.0 * cfg.fit_padding;
        let available_h = canvas.height - 2.0 * cfg.fit_padding;

        if rect.width() <= 0.0 || rect.height() <= 0.0 || available_w <= 0.0 || available_h <= 0.0 {
            tracing::debug!(
                "Skipping auto-fit: content {}x{}, canvas {}x{}",
                rect.width(),
                rect.height(),
                canvas.width,
                canvas.height
            );
            return false;
        }

        let scale = (available_w / rect.width())
            .min(available_h / rect.height())
            .min(cfg.max_fit_scale);
        let center = rect.center();

        self.scale = scale;
        self.offset_x = canvas.width / 2.0 - center.x * scale;
        self.offset_y = canvas.height / 2.0 - center.y * scale;
        tracing::debug!(
            "Auto-fit: scale={:.3} offset=({:.1}, {:.1})",
            self.scale,
            self.offset_x,
            self.offset_y
        );
        true
    }

    /// Exponential zoom keeping the world point under `pointer` fixed.
    /// Positive `steps` zoom in.
    pub fn zoom_at(&mut self, pointer: ScreenPoint, steps: f64, cfg: &ViewConfig) {
        let old = self.scale;
        let new = (old * cfg.zoom_step.powf(steps)).clamp(cfg.min_scale, cfg.max_scale);
        if new == old {
            return;
        }
        let ratio = new / old;
        self.offset_x = pointer.x - (pointer.x - self.offset_x) * ratio;
        self.offset_y = pointer.y - (pointer.y - self.offset_y) * ratio;
        self.scale = new;
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::{project, Point3};

    fn cube(size: f64) -> Box3 {
        Box3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            width: size,
            depth: size,
            height: size,
        }
    }

    #[test]
    fn test_fit_without_content_is_noop() {
        let mut view = ViewTransform {
            scale: 2.0,
            offset_x: 3.0,
            offset_y: 4.0,
        };
        let before = view;
        assert!(!view.fit(None, CanvasSize::new(800.0, 600.0), &ViewConfig::default()));
        assert_eq!(view, before);

        // Zero-size canvas
        assert!(!view.fit(Some(&cube(10.0)), CanvasSize::new(0.0, 0.0), &ViewConfig::default()));
        assert_eq!(view, before);

        // Flat, zero-width content
        let flat = Box3 { width: 0.0, depth: 0.0, height: 0.0, ..cube(0.0) };
        assert!(!view.fit(Some(&flat), CanvasSize::new(800.0, 600.0), &ViewConfig::default()));
        assert_eq!(view, before);
    }

    #[test]
    fn test_fit_centers_and_stays_inside_padding() {
        let cfg = ViewConfig::default();
        let canvas = CanvasSize::new(800.0, 600.0);
        let b = cube(1000.0);
        let mut view = ViewTransform::default();
        assert!(view.fit(Some(&b), canvas, &cfg));

        let rect = crate::projection::project_box(&b, &view).bounds();
        assert!(rect.min_x >= cfg.fit_padding - 1e-6);
        assert!(rect.min_y >= cfg.fit_padding - 1e-6);
        assert!(rect.max_x <= canvas.width - cfg.fit_padding + 1e-6);
        assert!(rect.max_y <= canvas.height - cfg.fit_padding + 1e-6);
        let center = rect.center();
        assert!((center.x - 400.0).abs() < 1e-6);
        assert!((center.y - 300.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_caps_scale_for_tiny_cities() {
        let mut view = ViewTransform::default();
        assert!(view.fit(Some(&cube(5.0)), CanvasSize::new(800.0, 600.0), &ViewConfig::default()));
        assert_eq!(view.scale, 1.5);
    }

    #[test]
    fn test_zoom_keeps_pointer_anchor() {
        let cfg = ViewConfig::default();
        let mut view = ViewTransform {
            scale: 1.0,
            offset_x: 50.0,
            offset_y: 20.0,
        };
        let world = Point3::new(40.0, 10.0, 0.0);
        let pointer = project(world, &view);

        view.zoom_at(pointer, 3.0, &cfg);
        assert!((view.scale - 1.1f64.powi(3)).abs() < 1e-9);
        let after = project(world, &view);
        assert!((after.x - pointer.x).abs() < 1e-9);
        assert!((after.y - pointer.y).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let cfg = ViewConfig::default();
        let mut view = ViewTransform::default();
        view.zoom_at(ScreenPoint::new(0.0, 0.0), 500.0, &cfg);
        assert_eq!(view.scale, 5.0);
        view.zoom_at(ScreenPoint::new(0.0, 0.0), -500.0, &cfg);
        assert_eq!(view.scale, 0.1);
    }

    #[test]
    fn test_pan() {
        let mut view = ViewTransform::default();
        view.pan(5.0, -3.0);
        assert_eq!((view.offset_x, view.offset_y), (5.0, -3.0));
    }
}
