//! CPU compositing of a [`Document`] into an RGBA bitmap.
//!
//! Used both for the on-screen texture and for export, so what you see is
//! what gets saved. Nodes are drawn in paint order onto a `tiny-skia`
//! pixmap; erase strokes use `destination-out`, so they remove coverage
//! from everything painted before them, images included.

use egui::{Color32, Vec2};
use image::{Rgba, RgbaImage};
use tiny_skia::{
    BlendMode, Color, ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, PathBuilder, Pixmap, PixmapPaint,
    Stroke, Transform,
};

use crate::asset::AssetCache;
use crate::document::Document;
use crate::element::{CompositeMode, ImageNode, Node, StrokeNode};

/// Grey shown for images whose pixels are not available.
const PLACEHOLDER: Color32 = Color32::from_gray(200);

/// Maps canvas coordinates to output pixels: `out = canvas * scale + translation`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterTransform {
    pub scale: f32,
    pub translation: Vec2,
}

impl Default for RasterTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translation: Vec2::ZERO,
        }
    }
}

impl RasterTransform {
    fn to_skia(self) -> Transform {
        Transform::from_scale(self.scale, self.scale).post_translate(self.translation.x, self.translation.y)
    }
}

/// Composite every node in paint order.
///
/// The result is transparent where nothing was painted, unless a
/// `background` is given: then the finished layer goes on top of it, so
/// erased areas show the background rather than holes.
pub fn rasterize(
    document: &Document,
    assets: &AssetCache,
    width: u32,
    height: u32,
    transform: RasterTransform,
    background: Option<Color32>,
) -> RgbaImage {
    let Some(mut layer) = Pixmap::new(width, height) else {
        log::warn!("Cannot allocate a {width}x{height} pixmap");
        return RgbaImage::new(width, height);
    };

    let transform = transform.to_skia();
    for node in document.nodes() {
        match node {
            Node::Stroke(stroke) => draw_stroke(&mut layer, stroke, transform),
            Node::Image(image) => draw_image(&mut layer, image, assets, transform),
        }
    }

    match background {
        Some(background) => to_rgba_image(&flatten(&layer, background)),
        None => to_rgba_image(&layer),
    }
}

fn draw_stroke(pixmap: &mut Pixmap, stroke: &StrokeNode, transform: Transform) {
    let style = stroke.style();
    let [r, g, b, a] = style.color.to_srgba_unmultiplied();

    let mut paint = Paint::default();
    match style.composite {
        CompositeMode::Paint => {
            paint.set_color_rgba8(r, g, b, unit_to_u8(style.opacity * a as f32 / 255.0));
        }
        CompositeMode::Erase => {
            // Only the alpha matters for destination-out.
            paint.set_color_rgba8(0, 0, 0, unit_to_u8(style.opacity));
            paint.blend_mode = BlendMode::DestinationOut;
        }
    }

    let Some((&first, rest)) = stroke.points().split_first() else {
        return;
    };
    if rest.iter().all(|p| *p == first) {
        // Dots and strokes that never moved render as a filled disc.
        let Some(disc) = PathBuilder::from_circle(first.x, first.y, style.width / 2.0) else {
            return;
        };
        pixmap.fill_path(&disc, &paint, FillRule::Winding, transform, None);
        return;
    }

    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    let Some(path) = builder.finish() else {
        return;
    };
    let outline = Stroke {
        width: style.width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(&path, &paint, &outline, transform, None);
}

fn draw_image(pixmap: &mut Pixmap, image: &ImageNode, assets: &AssetCache, transform: Transform) {
    let position = image.position();
    let size = image.size();
    if size.x <= 0.0 || size.y <= 0.0 {
        return;
    }

    let source = assets.get(image.source()).and_then(|pixels| to_pixmap(&pixels));
    let Some(source) = source else {
        log::debug!("No pixels for {}, drawing placeholder", image.source());
        let Some(rect) = tiny_skia::Rect::from_xywh(position.x, position.y, size.x, size.y) else {
            return;
        };
        let mut paint = Paint::default();
        let [r, g, b, a] = PLACEHOLDER.to_srgba_unmultiplied();
        paint.set_color_rgba8(r, g, b, a);
        pixmap.fill_rect(rect, &paint, transform, None);
        return;
    };

    let fit = transform
        .pre_translate(position.x, position.y)
        .pre_scale(size.x / source.width() as f32, size.y / source.height() as f32);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, source.as_ref(), &paint, fit, None);
}

/// Put the finished layer on an opaque background.
fn flatten(layer: &Pixmap, background: Color32) -> Pixmap {
    let [r, g, b, _] = background.to_srgba_unmultiplied();
    let mut flat = layer.clone();
    flat.fill(Color::from_rgba8(r, g, b, u8::MAX));
    flat.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
    flat
}

/// `tiny-skia` works in premultiplied alpha; decoded assets are straight.
fn to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(image.width(), image.height())?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Some(pixmap)
}

fn to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in out.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    out
}

fn unit_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use egui::Pos2;

    use super::*;
    use crate::asset::AssetRef;
    use crate::element::{NodeId, StrokeStyle};

    fn stroke(points: Vec<Pos2>, color: Color32, width: f32, opacity: f32, composite: CompositeMode) -> StrokeNode {
        StrokeNode::from_points(
            NodeId::new(),
            points,
            StrokeStyle {
                color,
                width,
                opacity,
                composite,
            },
        )
        .unwrap()
    }

    fn render(doc: &Document, assets: &AssetCache, side: u32) -> RgbaImage {
        rasterize(doc, assets, side, side, RasterTransform::default(), None)
    }

    /// Blue bar along y = 10, cut by a full eraser at x = 5 and wax at x = 15.
    fn resisted_bar() -> Document {
        let mut doc = Document::new();
        doc.add_node(stroke(
            vec![Pos2::new(0.0, 10.0), Pos2::new(20.0, 10.0)],
            Color32::BLUE,
            10.0,
            1.0,
            CompositeMode::Paint,
        ));
        doc.add_node(stroke(
            vec![Pos2::new(5.0, 0.0), Pos2::new(5.0, 20.0)],
            Color32::WHITE,
            4.0,
            1.0,
            CompositeMode::Erase,
        ));
        doc.add_node(stroke(
            vec![Pos2::new(15.0, 0.0), Pos2::new(15.0, 20.0)],
            Color32::WHITE,
            4.0,
            0.6,
            CompositeMode::Erase,
        ));
        doc
    }

    #[test]
    fn dot_paints_a_disc() {
        let mut doc = Document::new();
        doc.add_node(stroke(vec![Pos2::new(10.0, 10.0)], Color32::RED, 6.0, 1.0, CompositeMode::Paint));

        let out = render(&doc, &AssetCache::new(), 20);
        assert_eq!(*out.get_pixel(10, 10), Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(10, 16)[3], 0);
    }

    #[test]
    fn stroke_that_never_moved_is_a_dot() {
        let mut doc = Document::new();
        let at = Pos2::new(8.0, 8.0);
        doc.add_node(stroke(vec![at, at, at], Color32::BLACK, 6.0, 1.0, CompositeMode::Paint));

        let out = render(&doc, &AssetCache::new(), 16);
        assert_eq!(out.get_pixel(8, 8)[3], 255);
    }

    #[test]
    fn eraser_removes_paint_and_wax_removes_part() {
        let out = render(&resisted_bar(), &AssetCache::new(), 20);
        assert_eq!(out.get_pixel(5, 10)[3], 0);
        let waxed = out.get_pixel(15, 10)[3];
        assert!((100..=104).contains(&waxed), "wax left alpha {waxed}");
        assert_eq!(*out.get_pixel(10, 10), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn transform_scales_geometry() {
        let mut doc = Document::new();
        doc.add_node(stroke(vec![Pos2::new(5.0, 5.0)], Color32::BLACK, 2.0, 1.0, CompositeMode::Paint));

        let transform = RasterTransform {
            scale: 2.0,
            translation: Vec2::new(1.0, 1.0),
        };
        let out = rasterize(&doc, &AssetCache::new(), 20, 20, transform, None);
        assert_eq!(out.get_pixel(11, 11)[3], 255);
        assert_eq!(out.get_pixel(5, 5)[3], 0);
    }

    #[test]
    fn image_is_scaled_into_its_rect() {
        let source = AssetRef::new("red.png");
        let assets = AssetCache::new();
        assets.insert(source.clone(), Arc::new(RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]))));

        let mut doc = Document::new();
        doc.add_node(ImageNode::new(NodeId::new(), Pos2::new(4.0, 4.0), Vec2::splat(8.0), source, true).unwrap());
        let out = render(&doc, &assets, 16);
        assert_eq!(*out.get_pixel(8, 8), Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(1, 1)[3], 0);
        assert_eq!(out.get_pixel(14, 14)[3], 0);
    }

    #[test]
    fn missing_asset_draws_placeholder() {
        let mut doc = Document::new();
        doc.add_node(
            ImageNode::new(
                NodeId::new(),
                Pos2::new(2.0, 2.0),
                Vec2::splat(4.0),
                AssetRef::new("missing.png"),
                true,
            )
            .unwrap(),
        );
        let out = render(&doc, &AssetCache::new(), 10);
        assert_eq!(*out.get_pixel(3, 3), Rgba([200, 200, 200, 255]));
        assert_eq!(out.get_pixel(7, 7)[3], 0);
    }

    #[test]
    fn background_shows_through_erased_areas() {
        let out = rasterize(
            &resisted_bar(),
            &AssetCache::new(),
            20,
            20,
            RasterTransform::default(),
            Some(Color32::WHITE),
        );
        assert!(out.pixels().all(|p| p[3] == 255));
        assert_eq!(*out.get_pixel(5, 10), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(*out.get_pixel(10, 10), Rgba([0, 0, 255, 255]));
    }
}
