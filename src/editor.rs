//! The editor core: owns the document, history, tools, viewport and guides,
//! and sequences every mutation so history stays consistent.

use std::task::Context;

use egui::{Pos2, Vec2};

use crate::asset::{AssetCache, AssetLoader, AssetRef, ImageAssetLoader};
use crate::config::{EditorConfig, MAX_CANVAS_EDGE, canvas_size_in_range};
use crate::document::Document;
use crate::element::NodeId;
use crate::error::{EditorError, EditorResult};
use crate::export::{self, ExportOptions, ExportPreset, ExportSource, ExportedImage};
use crate::guides::GuideOverlay;
use crate::history::History;
use crate::tools::{
    Placement, PlacementOutcome, StampPlacer, ToolContext, ToolController, ToolKind, ToolLimits, ToolParameter,
    ToolState, apply_outcome,
};
use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A non-fatal message for the user. Drained by the host with
/// [`Editor::take_notifications`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

pub struct Editor {
    config: EditorConfig,
    document: Document,
    history: History,
    tools: ToolController,
    placer: StampPlacer,
    assets: AssetCache,
    viewport: Viewport,
    guides: GuideOverlay,
    canvas_size: Vec2,
    notifications: Vec<Notification>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    /// An editor using the default file and data-URI loader, which decodes
    /// straight into the editor's asset cache.
    pub fn new(config: EditorConfig) -> Self {
        let assets = AssetCache::new();
        let loader = ImageAssetLoader::with_cache(assets.clone());
        Self::with_parts(config, Box::new(loader), assets)
    }

    pub fn with_loader(config: EditorConfig, loader: Box<dyn AssetLoader>) -> Self {
        Self::with_parts(config, loader, AssetCache::new())
    }

    fn with_parts(config: EditorConfig, loader: Box<dyn AssetLoader>, assets: AssetCache) -> Self {
        let tools = ToolController::new(ToolState::from_config(&config), ToolLimits::from(&config));
        Self {
            document: Document::new(),
            history: History::new(),
            tools,
            placer: StampPlacer::new(loader),
            assets,
            viewport: Viewport::new(),
            guides: GuideOverlay::new(config.guide_step),
            canvas_size: config.canvas_size,
            notifications: Vec::new(),
            config,
        }
    }

    /// Replace the tool state, e.g. with one restored from storage. A state
    /// that breaks the tool limits is replaced by the config defaults.
    pub fn with_tool_state(mut self, state: ToolState) -> Self {
        let limits = ToolLimits::from(&self.config);
        let state = match state.validate(&limits) {
            Ok(()) => state,
            Err(err) => {
                log::warn!("Stored tool state rejected ({err}); using defaults");
                ToolState::from_config(&self.config)
            }
        };
        self.tools = ToolController::new(state, limits);
        self
    }

    // --- accessors ---

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    pub fn tool_state(&self) -> &ToolState {
        self.tools.state()
    }

    pub fn assets(&self) -> &AssetCache {
        &self.assets
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn guides(&self) -> &GuideOverlay {
        &self.guides
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_size
    }

    pub fn pending_placements(&self) -> usize {
        self.placer.pending_count()
    }

    pub fn node_labels(&self) -> Vec<String> {
        self.document.node_labels()
    }

    pub fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // --- tools ---

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.tools.set_tool(kind);
    }

    pub fn set_tool_by_name(&mut self, name: &str) {
        self.tools.set_tool_by_name(name);
    }

    pub fn set_parameter(&mut self, parameter: ToolParameter) -> EditorResult<()> {
        self.tools
            .set_parameter(parameter)
            .inspect_err(|err| self.notifications.push(Notification::warning(err.to_string())))
    }

    pub fn increase_stamp_size(&mut self) {
        self.tools.increase_stamp_size();
    }

    pub fn decrease_stamp_size(&mut self) {
        self.tools.decrease_stamp_size();
    }

    // --- pointer input, canvas coordinates ---

    pub fn pointer_down(&mut self, point: Pos2) {
        let mut ctx = ToolContext {
            document: &mut self.document,
            history: &mut self.history,
            placer: &mut self.placer,
        };
        if let Err(err) = self.tools.on_pointer_down(point, &mut ctx) {
            self.notifications.push(Notification::error(err.to_string()));
        }
    }

    pub fn pointer_move(&mut self, point: Pos2) {
        let mut ctx = ToolContext {
            document: &mut self.document,
            history: &mut self.history,
            placer: &mut self.placer,
        };
        if let Err(err) = self.tools.on_pointer_move(point, &mut ctx) {
            self.notifications.push(Notification::error(err.to_string()));
        }
    }

    pub fn pointer_up(&mut self) {
        self.tools.on_pointer_up();
    }

    // --- asynchronous placement ---

    /// Stamp `asset` centered on `point`, whatever tool is active.
    pub fn place_stamp(&mut self, asset: AssetRef, point: Pos2) {
        self.placer.request(asset, Placement::Stamp { center: point });
    }

    /// Insert an image at its natural size at the configured upload position.
    pub fn import_image(&mut self, asset: AssetRef) {
        self.placer.request(
            asset,
            Placement::Upload {
                top_left: self.config.upload_position,
            },
        );
    }

    /// Apply every placement whose load has completed. Returns the new nodes.
    pub fn poll_placements(&mut self, cx: &mut Context<'_>) -> Vec<NodeId> {
        let done = self.placer.poll_completed(cx);
        self.apply_placements(done)
    }

    /// Block until all pending loads finish and apply them.
    pub fn flush_placements(&mut self) -> Vec<NodeId> {
        let done = self.placer.wait_all();
        self.apply_placements(done)
    }

    fn apply_placements(&mut self, outcomes: Vec<PlacementOutcome>) -> Vec<NodeId> {
        let mut placed = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let asset = outcome.asset.clone();
            match apply_outcome(
                outcome,
                self.tools.state().stamp_size(),
                &mut self.document,
                &mut self.history,
                &self.assets,
            ) {
                Ok(id) => placed.push(id),
                Err(err) => self
                    .notifications
                    .push(Notification::error(format!("Could not place {asset}: {err}"))),
            }
        }
        placed
    }

    // --- history ---

    /// Returns `Ok(false)` when there was nothing to undo.
    pub fn undo(&mut self) -> EditorResult<bool> {
        self.tools.finish_gesture();
        self.history
            .undo(&mut self.document)
            .inspect_err(|err| self.notifications.push(Notification::error(err.to_string())))
    }

    /// Returns `Ok(false)` when there was nothing to redo.
    pub fn redo(&mut self) -> EditorResult<bool> {
        self.tools.finish_gesture();
        self.history
            .redo(&mut self.document)
            .inspect_err(|err| self.notifications.push(Notification::error(err.to_string())))
    }

    /// Empty the document and both history stacks. Not undoable, so the
    /// cached asset pixels go too.
    pub fn clear(&mut self) {
        self.tools.finish_gesture();
        self.document.remove_all();
        self.history.clear();
        self.assets.clear();
        log::info!("Canvas cleared");
    }

    // --- view ---

    pub fn zoom(&mut self, factor: f32) -> EditorResult<()> {
        self.viewport.zoom(factor)
    }

    pub fn zoom_in(&mut self) {
        self.zoom_clamped(self.config.zoom_in_factor);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_clamped(self.config.zoom_out_factor);
    }

    fn zoom_clamped(&mut self, factor: f32) {
        let scale = (self.viewport.scale() * factor).clamp(self.config.min_zoom, self.config.max_zoom);
        if let Err(err) = self.viewport.set_scale(scale) {
            log::warn!("Zoom rejected: {err}");
        } else {
            log::debug!("Zoom {scale:.2}");
        }
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.viewport.pan(dx, dy);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn toggle_guides(&mut self) {
        self.guides.toggle(self.canvas_size);
    }

    pub fn resize(&mut self, size: Vec2) -> EditorResult<()> {
        if !canvas_size_in_range(size) {
            return Err(EditorError::invalid(
                "canvas size",
                format!("{size:?} is outside 1..={MAX_CANVAS_EDGE} pixels"),
            ));
        }
        self.canvas_size = size;
        self.guides.resize(size);
        Ok(())
    }

    // --- export ---

    pub fn export(&mut self, preset: ExportPreset, options: &ExportOptions) -> EditorResult<ExportedImage> {
        let source = ExportSource {
            document: &self.document,
            assets: &self.assets,
            viewport: &self.viewport,
            canvas_size: self.canvas_size,
            jpeg_quality: self.config.jpeg_quality,
        };
        export::export(source, preset, options)
            .inspect_err(|err| self.notifications.push(Notification::error(err.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::CompositeMode;
    use crate::error::AssetLoadError;
    use crate::asset::LoadedAsset;
    use futures::FutureExt as _;
    use futures::future::LocalBoxFuture;

    struct SquareLoader;

    impl AssetLoader for SquareLoader {
        fn load(&self, asset: &AssetRef) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetLoadError>> {
            let result = if asset.as_str() == "broken" {
                Err(AssetLoadError::Undecodable {
                    asset: asset.clone(),
                    reason: "bad header".to_owned(),
                })
            } else {
                Ok(LoadedAsset::from_image(image::RgbaImage::new(40, 20)))
            };
            futures::future::ready(result).boxed_local()
        }
    }

    fn editor() -> Editor {
        Editor::with_loader(EditorConfig::default(), Box::new(SquareLoader))
    }

    #[test]
    fn eraser_stroke_is_erase_mode() {
        let mut ed = editor();
        ed.set_tool(ToolKind::Eraser);
        ed.pointer_down(Pos2::new(1.0, 1.0));
        ed.pointer_move(Pos2::new(2.0, 2.0));
        ed.pointer_up();

        let stroke = ed.document().nodes()[0].as_stroke().unwrap();
        assert_eq!(stroke.style().composite, CompositeMode::Erase);
        assert_eq!(stroke.points().len(), 2);
    }

    #[test]
    fn undo_mid_gesture_finishes_the_stroke_first() {
        let mut ed = editor();
        ed.pointer_down(Pos2::ZERO);
        assert!(ed.tools().is_drawing());
        assert!(ed.undo().unwrap());
        assert!(!ed.tools().is_drawing());
        assert!(ed.document().is_empty());

        ed.pointer_move(Pos2::new(5.0, 5.0));
        assert!(ed.document().is_empty());
    }

    #[test]
    fn rejected_parameter_notifies_and_keeps_value() {
        let mut ed = editor();
        assert!(ed.set_parameter(ToolParameter::BrushOpacity(1.5)).is_err());
        assert_eq!(ed.tool_state().brush_opacity(), 1.0);
        let notes = ed.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Warning);
        assert!(ed.take_notifications().is_empty());
    }

    #[test]
    fn failed_placement_notifies() {
        let mut ed = editor();
        ed.place_stamp(AssetRef::new("broken"), Pos2::new(10.0, 10.0));
        assert!(ed.flush_placements().is_empty());
        assert!(ed.document().is_empty());
        assert!(!ed.history().can_undo());
        assert_eq!(ed.take_notifications()[0].level, NotificationLevel::Error);
    }

    #[test]
    fn import_uses_natural_size_at_upload_position() {
        let mut ed = editor();
        ed.import_image(AssetRef::new("photo.png"));
        let placed = ed.flush_placements();
        assert_eq!(placed.len(), 1);

        let image = ed.document().find(placed[0]).unwrap().as_image().unwrap();
        assert_eq!(image.position(), Pos2::new(50.0, 50.0));
        assert_eq!(image.size(), Vec2::new(40.0, 20.0));
    }

    #[test]
    fn stamp_tool_uses_size_at_completion() {
        let mut ed = editor();
        ed.set_tool(ToolKind::Stamp);
        ed.set_parameter(ToolParameter::StampAsset(Some(AssetRef::new("leaf.png"))))
            .unwrap();
        ed.pointer_down(Pos2::new(300.0, 300.0));
        ed.pointer_up();
        ed.increase_stamp_size();
        ed.flush_placements();

        let image = ed.document().nodes()[0].as_image().unwrap();
        assert_eq!(image.size(), Vec2::splat(170.0));
    }

    #[test]
    fn zoom_steps_are_clamped() {
        let mut ed = editor();
        for _ in 0..10 {
            ed.zoom_in();
        }
        assert_eq!(ed.viewport().scale(), 2.0);
        for _ in 0..10 {
            ed.zoom_out();
        }
        assert_eq!(ed.viewport().scale(), 0.5);
        ed.reset_view();
        assert_eq!(ed.viewport().scale(), 1.0);
    }

    #[test]
    fn resize_regenerates_visible_guides() {
        let mut ed = editor();
        ed.toggle_guides();
        let before = ed.guides().lines().len();
        ed.resize(Vec2::new(1600.0, 1200.0)).unwrap();
        assert!(ed.guides().lines().len() > before);
        assert!(ed.resize(Vec2::new(0.0, 10.0)).is_err());
    }

    #[test]
    fn repeated_imports_share_cached_pixels_until_clear() {
        let mut bytes = Vec::new();
        image::RgbaImage::new(6, 4)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        let asset = AssetRef::new(crate::asset::encode_data_uri("image/png", &bytes));

        let mut ed = Editor::new(EditorConfig::default());
        ed.import_image(asset.clone());
        assert_eq!(ed.flush_placements().len(), 1);
        ed.import_image(asset.clone());
        assert_eq!(ed.flush_placements().len(), 1);
        assert_eq!(ed.document().len(), 2);
        assert_eq!(ed.assets().len(), 1);

        ed.clear();
        assert!(ed.assets().is_empty());
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let mut ed = editor();
        assert!(matches!(
            ed.resize(Vec2::splat(1e6)),
            Err(EditorError::InvalidParameter { .. })
        ));
        assert!(ed.resize(Vec2::new(MAX_CANVAS_EDGE + 1.0, 10.0)).is_err());
        assert!(ed.resize(Vec2::new(f32::NAN, 10.0)).is_err());
        assert_eq!(ed.canvas_size(), EditorConfig::default().canvas_size);

        ed.resize(Vec2::new(MAX_CANVAS_EDGE, 10.0)).unwrap();
        assert_eq!(ed.canvas_size(), Vec2::new(MAX_CANVAS_EDGE, 10.0));
    }
}
