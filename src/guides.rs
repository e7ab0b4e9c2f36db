use egui::{Color32, Pos2, Vec2};

/// Guide line colour (`#ddd`).
pub const GUIDE_COLOR: Color32 = Color32::from_rgb(0xdd, 0xdd, 0xdd);

/// One straight guide line in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GuideLine {
    pub from: Pos2,
    pub to: Pos2,
}

/// Optional grid drawn above content. Never exported, never part of the document.
#[derive(Clone, Debug)]
pub struct GuideOverlay {
    step: f32,
    lines: Option<Vec<GuideLine>>,
}

impl GuideOverlay {
    pub fn new(step: f32) -> Self {
        Self { step, lines: None }
    }

    pub fn is_visible(&self) -> bool {
        self.lines.is_some()
    }

    pub fn lines(&self) -> &[GuideLine] {
        self.lines.as_deref().unwrap_or_default()
    }

    /// Show a freshly generated grid, or hide the current one.
    pub fn toggle(&mut self, canvas_size: Vec2) {
        if self.lines.take().is_none() {
            self.lines = Some(self.generate(canvas_size));
        }
        log::debug!("Guides visible: {}", self.is_visible());
    }

    /// Regenerate for new canvas dimensions if shown.
    pub fn resize(&mut self, canvas_size: Vec2) {
        if self.lines.is_some() {
            self.lines = Some(self.generate(canvas_size));
        }
    }

    fn generate(&self, size: Vec2) -> Vec<GuideLine> {
        let mut lines = Vec::new();
        if self.step <= 0.0 {
            return lines;
        }

        let mut x = 0.0;
        while x < size.x {
            lines.push(GuideLine {
                from: Pos2::new(x, 0.0),
                to: Pos2::new(x, size.y),
            });
            x += self.step;
        }
        let mut y = 0.0;
        while y < size.y {
            lines.push(GuideLine {
                from: Pos2::new(0.0, y),
                to: Pos2::new(size.x, y),
            });
            y += self.step;
        }
        lines
    }
}
