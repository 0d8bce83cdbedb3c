//! Boundary rendering using tiny-skia
//!
//! Draws the located code's outline onto an RgbaImage.

use image::{Rgba, RgbaImage};
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PremultipliedColorU8, Stroke,
    Transform,
};

use crate::config::{QrPeekConfig, ShapeColor};
use crate::domain::Corners;

/// How the boundary around a detected code is drawn
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryStyle {
    pub color: ShapeColor,
    pub line_width: f32,
    pub corner_radius: f32,
}

impl Default for BoundaryStyle {
    fn default() -> Self {
        Self {
            color: ShapeColor::default(),
            line_width: 4.0,
            corner_radius: 8.0,
        }
    }
}

impl From<&QrPeekConfig> for BoundaryStyle {
    fn from(config: &QrPeekConfig) -> Self {
        Self {
            color: config.boundary_color,
            line_width: config.boundary_width,
            corner_radius: config.corner_radius,
        }
    }
}

/// Draw onto a transparent overlay, then composite it over the image
///
/// tiny-skia works on premultiplied pixels while `RgbaImage` is straight
/// alpha, so the image is never handed to it directly. Pixels the overlay
/// does not touch stay byte-identical.
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let Some(mut overlay) = Pixmap::new(img.width(), img.height()) else {
        return;
    };

    f(&mut overlay);

    for (dst, src) in img.pixels_mut().zip(overlay.pixels()) {
        if src.alpha() != 0 {
            *dst = source_over(*dst, *src);
        }
    }
}

/// Premultiplied `src` over straight-alpha `dst`, returned straight
fn source_over(dst: Rgba<u8>, src: PremultipliedColorU8) -> Rgba<u8> {
    let sa = src.alpha() as f32 / 255.0;
    let da = dst[3] as f32 / 255.0;
    let dst_weight = da * (1.0 - sa);
    let out_a = sa + dst_weight;
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let channel = |s: u8, d: u8| {
        let c = (s as f32 / 255.0 + d as f32 / 255.0 * dst_weight) / out_a;
        (c * 255.0).round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        channel(src.red(), dst[0]),
        channel(src.green(), dst[1]),
        channel(src.blue(), dst[2]),
        (out_a * 255.0).round() as u8,
    ])
}

/// Closed outline TL → TR → BR → BL → TL
fn build_boundary_path(corners: &Corners) -> Option<tiny_skia::Path> {
    let [first, rest @ ..] = corners.points();
    let mut pb = PathBuilder::new();
    pb.move_to(first.x as f32, first.y as f32);
    for p in rest {
        pb.line_to(p.x as f32, p.y as f32);
    }
    pb.close();
    pb.finish()
}

/// Draw the four-sided boundary and a marker on each corner
pub fn draw_boundary_on_image(img: &mut RgbaImage, corners: &Corners, style: &BoundaryStyle) {
    let [r, g, b, a] = style.color.to_rgba_u8();

    with_pixmap(img, |pixmap| {
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;

        if let Some(path) = build_boundary_path(corners) {
            let stroke = Stroke {
                width: style.line_width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Miter,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }

        for p in corners.points() {
            if let Some(dot) = PathBuilder::from_circle(p.x as f32, p.y as f32, style.corner_radius)
            {
                pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
    });
}
