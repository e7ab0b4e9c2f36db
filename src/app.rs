use std::sync::Arc;
use std::task::{Context, Waker};

use futures::task::ArcWake;

use crate::config::EditorConfig;
use crate::editor::{Editor, Notification};
use crate::export::{ExportOptions, ExportPreset, ExportedImage};
use crate::panels::{central_panel, tools_panel};
use crate::renderer::Renderer;
use crate::tools::ToolState;

/// How many notifications the side panel keeps around.
const MAX_NOTIFICATIONS: usize = 6;

/// What survives a restart. Drawings are not persisted.
#[derive(serde::Deserialize, serde::Serialize, Debug, Default)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct PersistedState {
    pub config: EditorConfig,
    pub tools: ToolState,
}

/// Wakes the UI when an asset load completes.
struct RepaintWaker(egui::Context);

impl ArcWake for RepaintWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.0.request_repaint();
    }
}

pub struct PaintApp {
    editor: Editor,
    renderer: Renderer,
    waker: Waker,
    /// A pointer gesture started on the canvas and has not ended yet.
    gesture_active: bool,
    pub(crate) stamp_path: String,
    pub(crate) import_path: String,
    pub(crate) messages: Vec<Notification>,
}

impl PaintApp {
    /// Called once before the first frame. An explicit `config` wins over
    /// the stored one; the stored tool state is kept either way.
    pub fn new(cc: &eframe::CreationContext<'_>, config: Option<EditorConfig>) -> Self {
        let mut persisted: PersistedState = cc
            .storage
            .and_then(|storage| eframe::get_value(storage, eframe::APP_KEY))
            .unwrap_or_default();
        if let Some(config) = config {
            persisted.config = config;
        }
        Self::from_state(&cc.egui_ctx, persisted)
    }

    pub fn from_state(ctx: &egui::Context, persisted: PersistedState) -> Self {
        let PersistedState { config, tools } = persisted;
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("Stored config rejected ({err}); using defaults");
                EditorConfig::default()
            }
        };
        let editor = Editor::new(config).with_tool_state(tools);
        let stamp_path = editor
            .tool_state()
            .stamp_asset()
            .map(|a| a.as_str().to_owned())
            .unwrap_or_default();

        Self {
            editor,
            renderer: Renderer::new(ctx),
            waker: futures::task::waker(Arc::new(RepaintWaker(ctx.clone()))),
            gesture_active: false,
            stamp_path,
            import_path: String::new(),
            messages: Vec::new(),
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub(crate) fn render_stage(&mut self, painter: &egui::Painter, origin: egui::Pos2) -> egui::Rect {
        self.renderer.render(painter, origin, &self.editor)
    }

    pub(crate) fn export_and_save(&mut self, preset: ExportPreset) {
        // Failures are queued as notifications by the editor.
        if let Ok(image) = self.editor.export(preset, &ExportOptions::default()) {
            match save_export(&image) {
                Ok(location) => self.editor.notify(Notification::info(format!("Saved {location}"))),
                Err(err) => {
                    log::error!("Could not save {}: {err}", image.file_name);
                    self.editor
                        .notify(Notification::error(format!("Could not save {}: {err}", image.file_name)));
                }
            }
        }
    }

    /// Route raw pointer input on the stage to the editor, in canvas space.
    pub(crate) fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, stage: egui::Rect) {
        let (pressed, down, released, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });
        let viewport = *self.editor.viewport();
        let to_canvas = |screen: egui::Pos2| viewport.to_canvas(screen - stage.min.to_vec2());

        if pressed {
            if let Some(pos) = pos.filter(|p| stage.contains(*p) && response.hovered()) {
                self.gesture_active = true;
                self.editor.pointer_down(to_canvas(pos));
            }
        } else if self.gesture_active {
            match pos {
                // Leaving the stage ends the gesture like a release does.
                Some(pos) if down && stage.contains(pos) => self.editor.pointer_move(to_canvas(pos)),
                _ => {
                    self.gesture_active = false;
                    self.editor.pointer_up();
                }
            }
        }
        if released && self.gesture_active {
            self.gesture_active = false;
            self.editor.pointer_up();
        }

        if response.dragged_by(egui::PointerButton::Secondary) {
            let delta = response.drag_delta();
            self.editor.pan(delta.x, delta.y);
        }
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::{Key, KeyboardShortcut, Modifiers};
        let redo = KeyboardShortcut::new(Modifiers::COMMAND | Modifiers::SHIFT, Key::Z);
        let undo = KeyboardShortcut::new(Modifiers::COMMAND, Key::Z);
        // Check redo first: it is the more specific shortcut.
        if ctx.input_mut(|i| i.consume_shortcut(&redo)) {
            let _ = self.editor.redo();
        } else if ctx.input_mut(|i| i.consume_shortcut(&undo)) {
            let _ = self.editor.undo();
        }
    }

    fn poll_placements(&mut self) {
        let mut cx = Context::from_waker(&self.waker);
        let placed = self.editor.poll_placements(&mut cx);
        if !placed.is_empty() {
            log::debug!("{} placements applied this frame", placed.len());
        }
    }

    fn collect_notifications(&mut self) {
        for note in self.editor.take_notifications() {
            log::debug!("Notification: {}", note.message);
            self.messages.push(note);
        }
        let excess = self.messages.len().saturating_sub(MAX_NOTIFICATIONS);
        self.messages.drain(..excess);
    }
}

impl eframe::App for PaintApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        let state = PersistedState {
            config: self.editor.config().clone(),
            tools: self.editor.tool_state().clone(),
        };
        eframe::set_value(storage, eframe::APP_KEY, &state);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_placements();
        self.handle_shortcuts(ctx);

        tools_panel(self, ctx);
        central_panel(self, ctx);

        self.collect_notifications();
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn save_export(image: &ExportedImage) -> std::io::Result<String> {
    let path = std::env::current_dir()?.join(image.file_name);
    std::fs::write(&path, &image.bytes)?;
    log::info!("Wrote {}", path.display());
    Ok(path.display().to_string())
}

#[cfg(target_arch = "wasm32")]
fn save_export(image: &ExportedImage) -> std::io::Result<String> {
    // No file system here; the host page picks up the data URI.
    let uri = image.to_data_uri();
    log::info!("{} ready as data URI ({} chars)", image.file_name, uri.len());
    Ok(image.file_name.to_owned())
}
