use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use super::NodeId;
use crate::asset::AssetRef;
use crate::element::common::MIN_ELEMENT_SIZE;

/// A placed bitmap: stamp or uploaded picture.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageNode {
    id: NodeId,
    /// Top-left corner in canvas coordinates.
    position: Pos2,
    size: Vec2,
    source: AssetRef,
    draggable: bool,
}

impl ImageNode {
    /// Returns `None` unless both dimensions are positive.
    pub fn new(id: NodeId, position: Pos2, size: Vec2, source: AssetRef, draggable: bool) -> Option<Self> {
        let node = Self {
            id,
            position,
            size,
            source,
            draggable,
        };
        node.is_valid().then_some(node)
    }

    /// An image of `size` centered on `center`.
    pub fn centered(id: NodeId, center: Pos2, size: Vec2, source: AssetRef) -> Option<Self> {
        Self::new(id, center - size / 2.0, size, source, true)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Pos2 {
        self.position
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn source(&self) -> &AssetRef {
        &self.source
    }

    pub fn draggable(&self) -> bool {
        self.draggable
    }

    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    pub fn hit_test(&self, pos: Pos2) -> bool {
        self.rect().contains(pos)
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.size.x.is_finite()
            && self.size.y.is_finite()
            && self.size.x >= MIN_ELEMENT_SIZE
            && self.size.y >= MIN_ELEMENT_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_image_is_offset_by_half_size() {
        let node = ImageNode::centered(
            NodeId::new(),
            Pos2::new(100.0, 100.0),
            Vec2::splat(150.0),
            AssetRef::new("stamps/kawung.png"),
        )
        .unwrap();
        assert_eq!(node.position(), Pos2::new(25.0, 25.0));
        assert!(node.hit_test(Pos2::new(100.0, 100.0)));
    }

    #[test]
    fn zero_size_is_rejected() {
        let node = ImageNode::new(
            NodeId::new(),
            Pos2::ZERO,
            Vec2::new(0.0, 10.0),
            AssetRef::new("stamps/parang.png"),
            true,
        );
        assert!(node.is_none());
    }
}
