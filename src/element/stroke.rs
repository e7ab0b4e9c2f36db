use egui::{Color32, Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::NodeId;
use crate::element::common;

/// How a node's pixels combine with what is already on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    /// Source-over painting.
    #[default]
    Paint,
    /// Destination-out: removes coverage from everything below.
    Erase,
}

/// Style fixed for the whole life of a stroke.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeStyle {
    pub color: Color32,
    pub width: f32,
    /// For erase strokes this is the erase strength.
    pub opacity: f32,
    pub composite: CompositeMode,
}

/// A freehand stroke. Always holds at least one point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrokeNode {
    id: NodeId,
    points: Vec<Pos2>,
    style: StrokeStyle,
}

impl StrokeNode {
    /// Start a stroke from its first point.
    pub fn new(id: NodeId, start: Pos2, style: StrokeStyle) -> Self {
        Self {
            id,
            points: vec![start],
            style,
        }
    }

    /// Build a finished stroke. Returns `None` for an empty point list.
    pub fn from_points(id: NodeId, points: Vec<Pos2>, style: StrokeStyle) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        Some(Self { id, points, style })
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn style(&self) -> &StrokeStyle {
        &self.style
    }

    /// A stroke with a single point renders as a dot.
    pub fn is_dot(&self) -> bool {
        self.points.len() == 1
    }

    pub(crate) fn push_point(&mut self, point: Pos2) {
        self.points.push(point);
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    /// Bounding box including half the stroke width.
    pub fn rect(&self) -> Rect {
        common::calculate_bounds(&self.points, self.style.width / 2.0)
    }

    pub fn hit_test(&self, pos: Pos2) -> bool {
        common::distance_to_polyline(pos, &self.points) <= self.style.width / 2.0
    }

    pub(crate) fn is_valid(&self) -> bool {
        !self.points.is_empty()
            && self.style.width.is_finite()
            && self.style.width > 0.0
            && (0.0..=1.0).contains(&self.style.opacity)
    }
}
