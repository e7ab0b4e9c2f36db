use egui::{Pos2, Vec2};

use crate::document::Document;
use crate::element::NodeId;
use crate::error::EditorResult;
use crate::history::History;

/// Drags draggable images around.
///
/// A drag is one undoable action: history is recorded on the first actual
/// movement, so a plain click leaves no entry behind.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum SelectDrag {
    #[default]
    Idle,
    Dragging {
        node: NodeId,
        last: Pos2,
        recorded: bool,
    },
}

impl SelectDrag {
    pub fn current_state_name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Dragging { .. } => "Dragging",
        }
    }

    pub fn begin(&mut self, point: Pos2, document: &Document) -> Option<NodeId> {
        let node = document.draggable_image_at(point)?;
        log::debug!("Picked image {node}");
        *self = Self::Dragging {
            node,
            last: point,
            recorded: false,
        };
        Some(node)
    }

    /// Move the picked image by the pointer delta. A node that has gone
    /// away (e.g. through undo) ends the drag without touching history.
    pub fn drag(&mut self, point: Pos2, document: &mut Document, history: &mut History) -> EditorResult<()> {
        let Self::Dragging { node, last, recorded } = self else {
            return Ok(());
        };
        let delta = point - *last;
        if delta == Vec2::ZERO {
            return Ok(());
        }
        if document.find(*node).is_none() {
            log::debug!("Dragged image {node} is gone; ending drag");
            *self = Self::Idle;
            return Ok(());
        }
        if !*recorded {
            if let Err(err) = history.record_before_action(document) {
                *self = Self::Idle;
                return Err(err);
            }
            *recorded = true;
        }
        if document.translate_node(*node, delta) {
            *last = point;
        } else {
            *self = Self::Idle;
        }
        Ok(())
    }

    pub fn end(&mut self) {
        *self = Self::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetRef;
    use crate::element::ImageNode;

    fn doc_with_image() -> (Document, NodeId) {
        let mut doc = Document::new();
        let image = ImageNode::centered(NodeId::new(), Pos2::new(100.0, 100.0), Vec2::splat(50.0), AssetRef::new("s.png"))
            .unwrap();
        let id = image.id();
        doc.add_node(image);
        (doc, id)
    }

    #[test]
    fn drag_moves_image_with_one_history_entry() {
        let (mut doc, id) = doc_with_image();
        let mut history = History::new();
        let mut drag = SelectDrag::default();

        assert_eq!(drag.begin(Pos2::new(100.0, 100.0), &doc), Some(id));
        drag.drag(Pos2::new(110.0, 100.0), &mut doc, &mut history).unwrap();
        drag.drag(Pos2::new(120.0, 105.0), &mut doc, &mut history).unwrap();
        drag.end();

        let image = doc.find(id).unwrap().as_image().unwrap();
        assert_eq!(image.position(), Pos2::new(95.0, 80.0));
        assert_eq!(history.undo_depth(), 1);
    }

    #[test]
    fn click_without_motion_records_nothing() {
        let (mut doc, _) = doc_with_image();
        let mut history = History::new();
        let mut drag = SelectDrag::default();
        drag.begin(Pos2::new(100.0, 100.0), &doc);
        drag.drag(Pos2::new(100.0, 100.0), &mut doc, &mut history).unwrap();
        drag.end();
        assert!(!history.can_undo());
    }

    #[test]
    fn vanished_image_ends_drag_without_history() {
        let (mut doc, id) = doc_with_image();
        let mut history = History::new();
        let mut drag = SelectDrag::default();
        assert_eq!(drag.begin(Pos2::new(100.0, 100.0), &doc), Some(id));

        doc.remove_all();
        drag.drag(Pos2::new(130.0, 100.0), &mut doc, &mut history).unwrap();

        assert!(!history.can_undo());
        assert_eq!(drag, SelectDrag::Idle);
    }

    #[test]
    fn empty_space_picks_nothing() {
        let (doc, _) = doc_with_image();
        let mut drag = SelectDrag::default();
        assert_eq!(drag.begin(Pos2::new(0.0, 0.0), &doc), None);
        assert_eq!(drag, SelectDrag::Idle);
    }
}
