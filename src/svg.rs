//! Static SVG export of a rendered scene

use std::fmt::Write;

use crate::color::Hsl;
use crate::projection::ScreenPoint;
use crate::render::{ItemKind, Outline, Scene, OUTLINE_COLOR};
use crate::view::CanvasSize;

const BACKGROUND: Hsl = Hsl::new(220.0, 20.0, 12.0);

fn points_attr(points: &[ScreenPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialize `scene` in paint order. Buildings carry a `<title>` tooltip.
pub fn to_svg(scene: &Scene, canvas: CanvasSize) -> String {
    let mut svg = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = canvas.width,
        h = canvas.height
    );
    let _ = writeln!(
        svg,
        r#"<defs><filter id="glow" x="-50%" y="-50%" width="200%" height="200%"><feGaussianBlur stdDeviation="6"/></filter></defs>"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="{}"/>"#, BACKGROUND);

    for item in &scene.items {
        let class = match item.kind {
            ItemKind::Platform { .. } => "platform",
            ItemKind::Building { .. } => "building",
        };
        let _ = writeln!(svg, r#"<g class="{}">"#, class);
        if matches!(item.kind, ItemKind::Building { .. }) {
            let _ = writeln!(svg, "<title>{}</title>", escape_xml(&item.label));
        }

        if let Some(glow) = item.glow {
            let _ = writeln!(
                svg,
                r#"<polygon points="{}" fill="{}" opacity="0.6" filter="url(#glow)"/>"#,
                points_attr(&item.silhouette),
                glow
            );
        }

        for face in &item.faces {
            let _ = writeln!(
                svg,
                r#"<polygon points="{}" fill="{}"/>"#,
                points_attr(&face.points),
                face.fill
            );
        }

        let dash = match item.outline {
            Outline::Solid => "",
            Outline::Dashed => r#" stroke-dasharray="4 3""#,
        };
        let _ = writeln!(
            svg,
            r#"<polygon points="{}" fill="none" stroke="{}" stroke-width="1"{}/>"#,
            points_attr(&item.silhouette),
            OUTLINE_COLOR,
            dash
        );
        svg.push_str("</g>\n");
    }

    svg.push_str("</svg>\n");
    svg
}
