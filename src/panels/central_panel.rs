use crate::PaintApp;

pub fn central_panel(app: &mut PaintApp, ctx: &egui::Context) {
    egui::CentralPanel::default()
        .frame(egui::Frame::central_panel(&ctx.style()).fill(egui::Color32::from_gray(230)))
        .show(ctx, |ui| {
            let canvas_size = app.editor().canvas_size();
            egui::ScrollArea::both().show(ui, |ui| {
                // The stage keeps its canvas size; zoom and pan happen inside it.
                let (response, painter) = ui.allocate_painter(canvas_size, egui::Sense::click_and_drag());

                app.handle_pointer(ui, &response, response.rect);
                app.render_stage(&painter, response.rect.min);

                if response.hovered() && app.editor().tools().is_drawing() {
                    ctx.set_cursor_icon(egui::CursorIcon::Crosshair);
                }
            });
        });
}
