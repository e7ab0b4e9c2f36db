use egui::{Color32, ColorImage, Painter, Pos2, Rect, Stroke, TextureHandle, TextureOptions, Vec2};

use crate::editor::Editor;
use crate::guides::GUIDE_COLOR;
use crate::raster::{self, RasterTransform};

/// Everything that changes the rasterized canvas. A new texture is only
/// uploaded when one of these differs from the previous frame.
#[derive(Clone, Copy, Debug, PartialEq)]
struct CanvasKey {
    revision: u64,
    scale: f32,
    offset: Vec2,
    size: [usize; 2],
}

/// Draws the editor's stage: background, composited content and the guide
/// overlay on top.
pub struct Renderer {
    ctx: egui::Context,
    canvas: Option<(CanvasKey, TextureHandle)>,
    uploads: u64,
}

impl Renderer {
    pub fn new(ctx: &egui::Context) -> Self {
        Self {
            ctx: ctx.clone(),
            canvas: None,
            uploads: 0,
        }
    }

    /// How many times the canvas texture was rebuilt.
    pub fn uploads(&self) -> u64 {
        self.uploads
    }

    /// Drop the cached texture so the next frame rebuilds it.
    pub fn invalidate(&mut self) {
        self.canvas = None;
    }

    /// Paint the stage with its top-left corner at `origin`. Returns the
    /// stage rectangle in screen space.
    pub fn render(&mut self, painter: &Painter, origin: Pos2, editor: &Editor) -> Rect {
        let size = editor.canvas_size();
        let stage = Rect::from_min_size(origin, size);
        let painter = painter.with_clip_rect(stage.intersect(painter.clip_rect()));

        painter.rect_filled(stage, 0.0, Color32::WHITE);

        let texture = self.canvas_texture(editor);
        painter.image(
            texture,
            stage,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        let viewport = editor.viewport();
        let guide_stroke = Stroke::new(1.0, GUIDE_COLOR);
        for line in editor.guides().lines() {
            let from = viewport.to_screen(line.from) + origin.to_vec2();
            let to = viewport.to_screen(line.to) + origin.to_vec2();
            painter.line_segment([from, to], guide_stroke);
        }

        stage
    }

    fn canvas_texture(&mut self, editor: &Editor) -> egui::TextureId {
        let key = canvas_key(editor);
        if let Some((cached, handle)) = &self.canvas {
            if *cached == key {
                return handle.id();
            }
        }

        let image = canvas_image(editor);
        let handle = match self.canvas.take() {
            Some((_, mut handle)) => {
                handle.set(image, TextureOptions::LINEAR);
                handle
            }
            None => self.ctx.load_texture("batik_canvas", image, TextureOptions::LINEAR),
        };
        self.uploads += 1;
        log::trace!("Canvas texture rebuilt for revision {}", key.revision);

        let id = handle.id();
        self.canvas = Some((key, handle));
        id
    }
}

fn canvas_key(editor: &Editor) -> CanvasKey {
    let size = editor.canvas_size();
    CanvasKey {
        revision: editor.document().revision(),
        scale: editor.viewport().scale(),
        offset: editor.viewport().offset(),
        size: [size.x.round().max(1.0) as usize, size.y.round().max(1.0) as usize],
    }
}

/// Rasterize the document as it appears on the stage (viewport applied).
pub fn canvas_image(editor: &Editor) -> ColorImage {
    let [width, height] = canvas_key(editor).size;
    let viewport = editor.viewport();
    let transform = RasterTransform {
        scale: viewport.scale(),
        translation: viewport.offset(),
    };
    let pixels = raster::rasterize(
        editor.document(),
        editor.assets(),
        width as u32,
        height as u32,
        transform,
        None,
    );
    ColorImage::from_rgba_unmultiplied([width, height], pixels.as_raw())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;

    fn small_editor() -> Editor {
        let config = EditorConfig {
            canvas_size: Vec2::new(40.0, 30.0),
            ..Default::default()
        };
        Editor::new(config)
    }

    #[test]
    fn canvas_image_matches_stage_size() {
        let image = canvas_image(&small_editor());
        assert_eq!(image.size, [40, 30]);
    }

    #[test]
    fn texture_is_reused_until_the_document_changes() {
        let ctx = egui::Context::default();
        let mut renderer = Renderer::new(&ctx);
        let mut editor = small_editor();
        let painter = Painter::new(ctx.clone(), egui::LayerId::background(), Rect::EVERYTHING);

        renderer.render(&painter, Pos2::ZERO, &editor);
        renderer.render(&painter, Pos2::ZERO, &editor);
        assert_eq!(renderer.uploads(), 1);

        editor.pointer_down(Pos2::new(5.0, 5.0));
        editor.pointer_up();
        renderer.render(&painter, Pos2::ZERO, &editor);
        assert_eq!(renderer.uploads(), 2);

        editor.zoom_in();
        renderer.render(&painter, Pos2::ZERO, &editor);
        assert_eq!(renderer.uploads(), 3);
    }
}
