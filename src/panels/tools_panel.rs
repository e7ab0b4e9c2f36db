use egui::Slider;

use crate::PaintApp;
use crate::asset::AssetRef;
use crate::editor::NotificationLevel;
use crate::export::ExportPreset;
use crate::tools::{ToolKind, ToolParameter};

pub fn tools_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::SidePanel::left("tools_panel")
        .resizable(true)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                tool_buttons(app, ui);
                ui.separator();
                tool_options(app, ui);
                ui.separator();
                history_section(app, ui);
                ui.separator();
                view_section(app, ui);
                ui.separator();
                export_section(app, ui);
                ui.separator();
                layer_list(app, ui);
                notifications(app, ui);
            });
        });
}

fn tool_buttons(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.heading("Tools");

    let active = app.editor().tool_state().active_tool();
    ui.horizontal_wrapped(|ui| {
        for kind in ToolKind::ALL {
            if ui.selectable_label(active == Some(kind), kind.name()).clicked() {
                log::info!("Tool selected from UI: {}", kind.name());
                app.editor_mut().set_tool(kind);
            }
        }
    });
    ui.label(format!("(State: {})", app.editor().tools().current_state_name()));
}

fn tool_options(app: &mut PaintApp, ui: &mut egui::Ui) {
    let state = app.editor().tool_state().clone();
    let palette = app.editor().config().palette.clone();

    ui.heading("Tool Options");

    let mut size = state.brush_size();
    ui.horizontal(|ui| {
        ui.label("Size:");
        ui.add(Slider::new(&mut size, 1.0..=100.0));
    });
    if size != state.brush_size() {
        let _ = app.editor_mut().set_parameter(ToolParameter::BrushSize(size));
    }

    let mut opacity = state.brush_opacity();
    ui.horizontal(|ui| {
        ui.label("Opacity:");
        ui.add(Slider::new(&mut opacity, 0.0..=1.0));
    });
    if opacity != state.brush_opacity() {
        let _ = app.editor_mut().set_parameter(ToolParameter::BrushOpacity(opacity));
    }

    let mut color = state.color();
    ui.horizontal(|ui| {
        ui.label("Color:");
        egui::color_picker::color_edit_button_srgba(ui, &mut color, egui::color_picker::Alpha::Opaque);
    });
    ui.horizontal_wrapped(|ui| {
        for swatch in palette {
            let button = egui::Button::new("    ").fill(swatch);
            if ui.add(button).clicked() {
                color = swatch;
            }
        }
    });
    if color != state.color() {
        let _ = app.editor_mut().set_parameter(ToolParameter::Color(color));
    }

    ui.horizontal(|ui| {
        ui.label(format!("Stamp size: {:.0}", state.stamp_size()));
        if ui.button("-").clicked() {
            app.editor_mut().decrease_stamp_size();
        }
        if ui.button("+").clicked() {
            app.editor_mut().increase_stamp_size();
        }
    });

    ui.horizontal(|ui| {
        ui.label("Stamp:");
        ui.text_edit_singleline(&mut app.stamp_path);
    });
    if ui.button("Use as stamp").clicked() {
        let path = app.stamp_path.trim().to_owned();
        let asset = (!path.is_empty()).then(|| AssetRef::new(path));
        let _ = app.editor_mut().set_parameter(ToolParameter::StampAsset(asset));
    }

    ui.horizontal(|ui| {
        ui.label("Image:");
        ui.text_edit_singleline(&mut app.import_path);
    });
    if ui
        .add_enabled(!app.import_path.trim().is_empty(), egui::Button::new("Upload image"))
        .clicked()
    {
        let asset = AssetRef::new(app.import_path.trim());
        app.editor_mut().import_image(asset);
    }
    let pending = app.editor().pending_placements();
    if pending > 0 {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Loading {pending} image(s)"));
        });
    }
}

fn history_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        let can_undo = app.editor().history().can_undo();
        let can_redo = app.editor().history().can_redo();

        if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
            let _ = app.editor_mut().undo();
        }
        if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
            let _ = app.editor_mut().redo();
        }
        if ui.button("Clear").clicked() {
            app.editor_mut().clear();
        }
    });

    let history = app.editor().history();
    ui.horizontal(|ui| {
        ui.label(format!("Undo stack size: {}", history.undo_depth()));
        ui.label(format!("Redo stack size: {}", history.redo_depth()));
    });
}

fn view_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        if ui.button("Zoom in").clicked() {
            app.editor_mut().zoom_in();
        }
        if ui.button("Zoom out").clicked() {
            app.editor_mut().zoom_out();
        }
        if ui.button("Reset").clicked() {
            app.editor_mut().reset_view();
        }
    });
    ui.label(format!("Zoom: {:.0}%", app.editor().viewport().scale() * 100.0));

    let mut guides = app.editor().guides().is_visible();
    if ui.checkbox(&mut guides, "Guides").changed() {
        app.editor_mut().toggle_guides();
    }
}

fn export_section(app: &mut PaintApp, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.label("Export:");
        for preset in ExportPreset::ALL {
            if ui.button(preset.label()).on_hover_text(preset.file_name()).clicked() {
                app.export_and_save(preset);
            }
        }
    });
}

fn layer_list(app: &PaintApp, ui: &mut egui::Ui) {
    egui::CollapsingHeader::new("Layers")
        .default_open(true)
        .show(ui, |ui| {
            let labels = app.editor().node_labels();
            if labels.is_empty() {
                ui.weak("Empty canvas");
            }
            // Topmost first.
            for label in labels.iter().rev() {
                ui.label(label);
            }
        });
}

fn notifications(app: &mut PaintApp, ui: &mut egui::Ui) {
    if app.messages.is_empty() {
        return;
    }
    ui.separator();
    for note in &app.messages {
        let color = match note.level {
            NotificationLevel::Info => ui.visuals().text_color(),
            NotificationLevel::Warning => ui.visuals().warn_fg_color,
            NotificationLevel::Error => ui.visuals().error_fg_color,
        };
        ui.colored_label(color, &note.message);
    }
    if ui.small_button("Dismiss").clicked() {
        app.messages.clear();
    }
}
