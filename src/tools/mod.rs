use egui::{Color32, Pos2};
use serde::{Deserialize, Serialize};

use crate::asset::AssetRef;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::element::{CompositeMode, StrokeStyle};
use crate::error::{EditorError, EditorResult};
use crate::history::History;

mod draw_stroke_tool;
pub use draw_stroke_tool::DrawingSession;

mod stamp_tool;
pub use stamp_tool::{Placement, PlacementOutcome, StampPlacer, apply_outcome};

mod select_tool;
pub use select_tool::SelectDrag;

/// Every tool the editor knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Brush,
    Pencil,
    Eraser,
    Wax,
    Stamp,
    Select,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Brush,
        ToolKind::Pencil,
        ToolKind::Eraser,
        ToolKind::Wax,
        ToolKind::Stamp,
        ToolKind::Select,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Brush => "brush",
            ToolKind::Pencil => "pencil",
            ToolKind::Eraser => "eraser",
            ToolKind::Wax => "wax",
            ToolKind::Stamp => "stamp",
            ToolKind::Select => "select",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Tools driven by the drawing session.
    pub fn is_drawing(self) -> bool {
        matches!(self, ToolKind::Brush | ToolKind::Pencil | ToolKind::Eraser | ToolKind::Wax)
    }
}

/// A validated change to the tool state.
#[derive(Clone, Debug, PartialEq)]
pub enum ToolParameter {
    BrushSize(f32),
    BrushOpacity(f32),
    Color(Color32),
    StampSize(f32),
    StampAsset(Option<AssetRef>),
}

/// Limits the tool state is validated against, taken from config.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolLimits {
    pub min_stamp_size: f32,
    pub stamp_size_step: f32,
    pub wax_opacity: f32,
}

impl From<&EditorConfig> for ToolLimits {
    fn from(config: &EditorConfig) -> Self {
        Self {
            min_stamp_size: config.min_stamp_size,
            stamp_size_step: config.stamp_size_step,
            wax_opacity: config.wax_opacity,
        }
    }
}

/// Current tool and its parameters, for the whole editor session.
///
/// Only changed through [`ToolState::apply`] (or [`ToolController`]), never implicitly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolState {
    /// `None` when the host selected something unknown; pointer events are then ignored.
    active_tool: Option<ToolKind>,
    brush_size: f32,
    brush_opacity: f32,
    #[serde(with = "crate::config::hex_color")]
    color: Color32,
    stamp_size: f32,
    stamp_asset: Option<AssetRef>,
}

impl Default for ToolState {
    fn default() -> Self {
        Self::from_config(&EditorConfig::default())
    }
}

impl ToolState {
    pub fn from_config(config: &EditorConfig) -> Self {
        Self {
            active_tool: Some(ToolKind::Brush),
            brush_size: config.brush_size,
            brush_opacity: config.brush_opacity,
            color: config.color,
            stamp_size: config.stamp_size,
            stamp_asset: None,
        }
    }

    pub fn active_tool(&self) -> Option<ToolKind> {
        self.active_tool
    }

    pub fn brush_size(&self) -> f32 {
        self.brush_size
    }

    pub fn brush_opacity(&self) -> f32 {
        self.brush_opacity
    }

    pub fn color(&self) -> Color32 {
        self.color
    }

    pub fn stamp_size(&self) -> f32 {
        self.stamp_size
    }

    pub fn stamp_asset(&self) -> Option<&AssetRef> {
        self.stamp_asset.as_ref()
    }

    /// Apply a parameter change. Out-of-range values are rejected and the
    /// previous value kept.
    pub fn apply(&mut self, parameter: ToolParameter, limits: &ToolLimits) -> EditorResult<()> {
        match parameter {
            ToolParameter::BrushSize(size) => {
                if !size.is_finite() || size <= 0.0 {
                    return Err(EditorError::invalid("brush size", format!("{size} must be positive")));
                }
                self.brush_size = size;
            }
            ToolParameter::BrushOpacity(opacity) => {
                if !(0.0..=1.0).contains(&opacity) {
                    return Err(EditorError::invalid("brush opacity", format!("{opacity} is outside 0..=1")));
                }
                self.brush_opacity = opacity;
            }
            ToolParameter::Color(color) => self.color = color,
            ToolParameter::StampSize(size) => {
                if !size.is_finite() || size < limits.min_stamp_size {
                    return Err(EditorError::invalid(
                        "stamp size",
                        format!("{size} is below the minimum {}", limits.min_stamp_size),
                    ));
                }
                self.stamp_size = size;
            }
            ToolParameter::StampAsset(asset) => self.stamp_asset = asset,
        }
        Ok(())
    }

    /// Check a state that did not come through [`ToolState::apply`], such as
    /// one restored from storage, against the same rules.
    pub fn validate(&self, limits: &ToolLimits) -> EditorResult<()> {
        let mut check = self.clone();
        check.apply(ToolParameter::BrushSize(self.brush_size), limits)?;
        check.apply(ToolParameter::BrushOpacity(self.brush_opacity), limits)?;
        check.apply(ToolParameter::StampSize(self.stamp_size), limits)
    }

    /// Style snapshot for a new stroke with the active tool, if it draws.
    pub fn stroke_style(&self, limits: &ToolLimits) -> Option<StrokeStyle> {
        let style = match self.active_tool? {
            ToolKind::Brush | ToolKind::Pencil => StrokeStyle {
                color: self.color,
                width: self.brush_size,
                opacity: self.brush_opacity,
                composite: CompositeMode::Paint,
            },
            ToolKind::Eraser => StrokeStyle {
                color: Color32::WHITE,
                width: self.brush_size,
                opacity: self.brush_opacity,
                composite: CompositeMode::Erase,
            },
            // Resist: erases like the eraser, but only partially.
            ToolKind::Wax => StrokeStyle {
                color: Color32::WHITE,
                width: self.brush_size,
                opacity: limits.wax_opacity,
                composite: CompositeMode::Erase,
            },
            ToolKind::Stamp | ToolKind::Select => return None,
        };
        Some(style)
    }
}

/// Everything a tool may touch while handling a pointer event.
pub struct ToolContext<'a> {
    pub document: &'a mut Document,
    pub history: &'a mut History,
    pub placer: &'a mut StampPlacer,
}

/// Holds the tool state and routes pointer events to the active tool.
#[derive(Debug)]
pub struct ToolController {
    state: ToolState,
    limits: ToolLimits,
    session: DrawingSession,
    select: SelectDrag,
}

impl ToolController {
    pub fn new(state: ToolState, limits: ToolLimits) -> Self {
        Self {
            state,
            limits,
            session: DrawingSession::default(),
            select: SelectDrag::default(),
        }
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn limits(&self) -> &ToolLimits {
        &self.limits
    }

    pub fn is_drawing(&self) -> bool {
        self.session.is_active()
    }

    pub fn current_state_name(&self) -> &'static str {
        match self.state.active_tool {
            Some(ToolKind::Select) => self.select.current_state_name(),
            _ => self.session.current_state_name(),
        }
    }

    pub fn set_tool(&mut self, kind: ToolKind) {
        self.finish_gesture();
        if self.state.active_tool != Some(kind) {
            log::info!("Tool selected: {}", kind.name());
        }
        self.state.active_tool = Some(kind);
    }

    /// Select a tool by name. Unknown names leave no tool active.
    pub fn set_tool_by_name(&mut self, name: &str) {
        match ToolKind::from_name(name) {
            Some(kind) => self.set_tool(kind),
            None => {
                self.finish_gesture();
                log::warn!("Unknown tool {name:?}; pointer input will be ignored");
                self.state.active_tool = None;
            }
        }
    }

    pub fn set_parameter(&mut self, parameter: ToolParameter) -> EditorResult<()> {
        self.state
            .apply(parameter, &self.limits)
            .inspect_err(|err| log::warn!("Rejected tool parameter: {err}"))
    }

    pub fn increase_stamp_size(&mut self) {
        self.state.stamp_size += self.limits.stamp_size_step;
    }

    pub fn decrease_stamp_size(&mut self) {
        self.state.stamp_size = (self.state.stamp_size - self.limits.stamp_size_step).max(self.limits.min_stamp_size);
    }

    /// Errors mean the action was not started; the document is unchanged.
    pub fn on_pointer_down(&mut self, point: Pos2, ctx: &mut ToolContext<'_>) -> EditorResult<()> {
        if !is_finite(point) {
            log::warn!("Ignoring non-finite pointer position {point:?}");
            return Ok(());
        }
        let Some(kind) = self.state.active_tool else {
            return Ok(());
        };

        match kind {
            ToolKind::Brush | ToolKind::Pencil | ToolKind::Eraser | ToolKind::Wax => {
                if let Some(style) = self.state.stroke_style(&self.limits) {
                    self.session.begin(point, style, ctx.document, ctx.history)?;
                }
            }
            ToolKind::Stamp => match &self.state.stamp_asset {
                Some(asset) => ctx.placer.request(asset.clone(), Placement::Stamp { center: point }),
                None => log::debug!("Stamp tool has no asset selected"),
            },
            ToolKind::Select => {
                self.select.begin(point, ctx.document);
            }
        }
        Ok(())
    }

    pub fn on_pointer_move(&mut self, point: Pos2, ctx: &mut ToolContext<'_>) -> EditorResult<()> {
        if !is_finite(point) {
            return Ok(());
        }
        match self.state.active_tool {
            Some(kind) if kind.is_drawing() => {
                self.session.extend(point, ctx.document);
            }
            Some(ToolKind::Select) => self.select.drag(point, ctx.document, ctx.history)?,
            _ => {}
        }
        Ok(())
    }

    /// Also used when the pointer leaves the canvas mid-gesture.
    pub fn on_pointer_up(&mut self) {
        self.finish_gesture();
    }

    /// End any gesture in progress, keeping whatever it produced.
    pub fn finish_gesture(&mut self) {
        self.session.finish();
        self.select.end();
    }
}

fn is_finite(point: Pos2) -> bool {
    point.x.is_finite() && point.y.is_finite()
}
