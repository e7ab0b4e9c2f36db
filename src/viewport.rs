use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{EditorError, EditorResult};

/// Zoom and pan applied at display time. Node coordinates never change.
///
/// `screen = canvas * scale + offset`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    scale: f32,
    offset: Vec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Multiply the scale by `factor`. Any positive result is accepted;
    /// clamping to a zoom range is up to the caller.
    pub fn zoom(&mut self, factor: f32) -> EditorResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EditorError::invalid("zoom factor", format!("{factor} is not positive")));
        }
        let scale = self.scale * factor;
        if !scale.is_normal() {
            return Err(EditorError::invalid("zoom factor", format!("scale {scale} out of range")));
        }
        self.scale = scale;
        Ok(())
    }

    /// Set the scale directly.
    pub fn set_scale(&mut self, scale: f32) -> EditorResult<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(EditorError::invalid("scale", format!("{scale} is not positive")));
        }
        self.scale = scale;
        Ok(())
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset += Vec2::new(dx, dy);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn to_screen(&self, canvas: Pos2) -> Pos2 {
        (canvas.to_vec2() * self.scale + self.offset).to_pos2()
    }

    pub fn to_canvas(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.offset) / self.scale).to_pos2()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_in_then_out_is_exact() {
        let mut viewport = Viewport::new();
        viewport.zoom(2.0).unwrap();
        viewport.zoom(0.5).unwrap();
        assert_eq!(viewport.scale(), 1.0);
    }

    #[test]
    fn non_positive_zoom_is_rejected() {
        let mut viewport = Viewport::new();
        assert!(viewport.zoom(0.0).is_err());
        assert!(viewport.zoom(-2.0).is_err());
        assert!(viewport.zoom(f32::NAN).is_err());
        assert_eq!(viewport.scale(), 1.0);
    }

    #[test]
    fn screen_and_canvas_round_trip() {
        let mut viewport = Viewport::new();
        viewport.zoom(2.0).unwrap();
        viewport.pan(10.0, -4.0);
        let canvas = Pos2::new(3.0, 7.0);
        let screen = viewport.to_screen(canvas);
        assert_eq!(screen, Pos2::new(16.0, 10.0));
        assert_eq!(viewport.to_canvas(screen), canvas);
    }

    #[test]
    fn reset_restores_identity() {
        let mut viewport = Viewport::new();
        viewport.zoom(1.2).unwrap();
        viewport.pan(5.0, 5.0);
        viewport.reset();
        assert_eq!(viewport, Viewport::default());
    }
}
