use egui::Pos2;

use crate::document::Document;
use crate::element::{NodeId, StrokeNode, StrokeStyle};
use crate::error::EditorResult;
use crate::history::History;

/// Per-gesture state machine turning pointer down/move/up into one stroke.
///
/// The stroke is appended to the document on pointer-down so it shows while
/// being drawn; later points grow it in place without new history entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawingSession {
    #[default]
    Idle,
    Active {
        stroke: NodeId,
    },
}

impl DrawingSession {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }

    pub fn current_state_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Active { .. } => "Drawing",
        }
    }

    /// Start a stroke at `point`. Records one history entry before the stroke
    /// is added; if that fails the session stays idle.
    pub fn begin(
        &mut self,
        point: Pos2,
        style: StrokeStyle,
        document: &mut Document,
        history: &mut History,
    ) -> EditorResult<NodeId> {
        if let Self::Active { stroke } = *self {
            log::warn!("Pointer down while stroke {stroke} still active; finishing it");
            self.finish();
        }

        let id = NodeId::new();
        history.record_before_action(document)?;
        document.add_node(StrokeNode::new(id, point, style));
        *self = Self::Active { stroke: id };
        log::debug!("Stroke {id} started at {point:?}");
        Ok(id)
    }

    /// Grow the active stroke. Does nothing when idle.
    pub fn extend(&mut self, point: Pos2, document: &mut Document) -> bool {
        let Self::Active { stroke } = *self else {
            return false;
        };
        if document.extend_stroke(stroke, point) {
            log::trace!("Stroke {stroke} += {point:?}");
            true
        } else {
            // The stroke was swapped out from under us (e.g. by a snapshot restore).
            *self = Self::Idle;
            false
        }
    }

    /// End the gesture. The stroke keeps whatever points it has, even just one.
    pub fn finish(&mut self) -> Option<NodeId> {
        match std::mem::take(self) {
            Self::Active { stroke } => {
                log::debug!("Stroke {stroke} finished");
                Some(stroke)
            }
            Self::Idle => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::CompositeMode;
    use egui::Color32;

    fn style() -> StrokeStyle {
        StrokeStyle {
            color: Color32::RED,
            width: 12.0,
            opacity: 1.0,
            composite: CompositeMode::Paint,
        }
    }

    #[test]
    fn down_up_without_moves_yields_single_point() {
        let mut doc = Document::new();
        let mut history = History::new();
        let mut session = DrawingSession::default();

        let id = session.begin(Pos2::new(4.0, 4.0), style(), &mut doc, &mut history).unwrap();
        assert_eq!(session.finish(), Some(id));

        assert_eq!(doc.len(), 1);
        assert_eq!(doc.nodes()[0].as_stroke().unwrap().points(), &[Pos2::new(4.0, 4.0)]);
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn moves_do_not_add_history() {
        let mut doc = Document::new();
        let mut history = History::new();
        let mut session = DrawingSession::default();

        session.begin(Pos2::ZERO, style(), &mut doc, &mut history).unwrap();
        for i in 1..5 {
            assert!(session.extend(Pos2::new(i as f32, 0.0), &mut doc));
        }
        session.finish();

        assert_eq!(history.undo_depth(), 1);
        assert_eq!(doc.nodes()[0].as_stroke().unwrap().points().len(), 5);
    }

    #[test]
    fn failed_history_record_adds_nothing() {
        let mut doc = Document::new();
        let mut history = History::new();
        let mut session = DrawingSession::default();
        doc.add_node(StrokeNode::new(NodeId::new(), Pos2::ZERO, StrokeStyle { width: -1.0, ..style() }));

        assert!(session.begin(Pos2::new(3.0, 3.0), style(), &mut doc, &mut history).is_err());
        assert_eq!(session, DrawingSession::Idle);
        assert_eq!(doc.len(), 1);
        assert!(!history.can_undo());
    }

    #[test]
    fn stray_events_are_ignored() {
        let mut doc = Document::new();
        let mut session = DrawingSession::default();
        assert!(!session.extend(Pos2::ZERO, &mut doc));
        assert_eq!(session.finish(), None);
        assert!(doc.is_empty());
    }

    #[test]
    fn points_after_finish_are_ignored() {
        let mut doc = Document::new();
        let mut history = History::new();
        let mut session = DrawingSession::default();
        session.begin(Pos2::ZERO, style(), &mut doc, &mut history).unwrap();
        session.finish();

        assert!(!session.extend(Pos2::new(1.0, 1.0), &mut doc));
        assert_eq!(doc.nodes()[0].as_stroke().unwrap().points().len(), 1);
    }
}
