use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

mod common;
pub(crate) mod image;
pub(crate) mod stroke;

pub use common::MIN_ELEMENT_SIZE;
pub use image::ImageNode;
pub use stroke::{CompositeMode, StrokeNode, StrokeStyle};

/// Identity of a node inside a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(uuid::Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A drawable unit of the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Stroke(StrokeNode),
    Image(ImageNode),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Node::Stroke(s) => s.id(),
            Node::Image(i) => i.id(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Stroke(_) => "Stroke",
            Node::Image(_) => "Image",
        }
    }

    pub fn rect(&self) -> Rect {
        match self {
            Node::Stroke(s) => s.rect(),
            Node::Image(i) => i.rect(),
        }
    }

    pub fn hit_test(&self, pos: Pos2) -> bool {
        match self {
            Node::Stroke(s) => s.hit_test(pos),
            Node::Image(i) => i.hit_test(pos),
        }
    }

    pub fn as_stroke(&self) -> Option<&StrokeNode> {
        match self {
            Node::Stroke(s) => Some(s),
            Node::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageNode> {
        match self {
            Node::Image(i) => Some(i),
            Node::Stroke(_) => None,
        }
    }

    pub(crate) fn translate(&mut self, delta: Vec2) {
        match self {
            Node::Stroke(s) => s.translate(delta),
            Node::Image(i) => i.translate(delta),
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        match self {
            Node::Stroke(s) => s.is_valid(),
            Node::Image(i) => i.is_valid(),
        }
    }
}

impl From<StrokeNode> for Node {
    fn from(stroke: StrokeNode) -> Self {
        Node::Stroke(stroke)
    }
}

impl From<ImageNode> for Node {
    fn from(image: ImageNode) -> Self {
        Node::Image(image)
    }
}
