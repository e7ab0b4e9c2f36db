use std::collections::HashSet;

use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::element::{Node, NodeId};
use crate::error::{EditorError, EditorResult};

const SNAPSHOT_VERSION: u32 = 1;

/// Self-contained, immutable serialization of a [`Document`].
///
/// Holds a JSON string rather than node values, so mutating the live
/// document can never reach back into a stored snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Snapshot(String);

impl Snapshot {
    /// Wrap raw snapshot data, e.g. received from outside the editor.
    pub fn from_raw(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    nodes: &'a [Node],
}

#[derive(Deserialize)]
struct SnapshotData {
    version: u32,
    nodes: Vec<Node>,
}

/// The scene model: drawable nodes in paint order (last is on top).
#[derive(Debug, Default)]
pub struct Document {
    nodes: Vec<Node>,
    /// Bumped on every mutation; render caches key off it.
    revision: u64,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn find(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id() == id)
    }

    /// Append a node on top of everything else.
    pub fn add_node(&mut self, node: impl Into<Node>) {
        let node = node.into();
        debug_assert!(self.find(node.id()).is_none(), "duplicate node id {}", node.id());
        log::debug!("Adding {} {}", node.kind_name(), node.id());
        self.nodes.push(node);
        self.touch();
    }

    pub fn remove_all(&mut self) {
        self.nodes.clear();
        self.touch();
    }

    /// Append a point to an in-progress stroke. Returns false if the stroke is gone.
    pub(crate) fn extend_stroke(&mut self, id: NodeId, point: Pos2) -> bool {
        let stroke = self.nodes.iter_mut().find_map(|node| match node {
            Node::Stroke(stroke) if stroke.id() == id => Some(stroke),
            _ => None,
        });
        match stroke {
            Some(stroke) => {
                stroke.push_point(point);
                self.touch();
                true
            }
            None => false,
        }
    }

    pub(crate) fn translate_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        match self.nodes.iter_mut().find(|node| node.id() == id) {
            Some(node) => {
                node.translate(delta);
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Topmost draggable image under `pos`.
    pub fn draggable_image_at(&self, pos: Pos2) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .filter_map(Node::as_image)
            .find(|image| image.draggable() && image.hit_test(pos))
            .map(|image| image.id())
    }

    /// One label per node in paint order, e.g. `"Stroke #0"`.
    pub fn node_labels(&self) -> Vec<String> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| format!("{} #{}", node.kind_name(), i))
            .collect()
    }

    /// Capture the document as a snapshot.
    ///
    /// Fails rather than produce a snapshot that [`Document::restore`] would reject.
    pub fn serialize(&self) -> EditorResult<Snapshot> {
        if let Some((index, node)) = self.nodes.iter().enumerate().find(|(_, node)| !node.is_valid()) {
            let reason = format!("{} #{index} violates its invariants", node.kind_name());
            log::error!("Refusing to snapshot document: {reason}");
            return Err(EditorError::Serialize(reason));
        }

        let data = SnapshotRef {
            version: SNAPSHOT_VERSION,
            nodes: &self.nodes,
        };
        let json = serde_json::to_string(&data).map_err(|err| {
            log::error!("Failed to serialize document: {err}");
            EditorError::Serialize(err.to_string())
        })?;
        Ok(Snapshot(json))
    }

    /// Replace every node with the snapshot's contents.
    ///
    /// All-or-nothing: on error the document is left exactly as it was.
    pub fn restore(&mut self, snapshot: &Snapshot) -> EditorResult<()> {
        let nodes = Self::decode(snapshot)?;
        self.nodes = nodes;
        self.touch();
        Ok(())
    }

    fn decode(snapshot: &Snapshot) -> EditorResult<Vec<Node>> {
        let data: SnapshotData = serde_json::from_str(snapshot.as_str())
            .map_err(|err| EditorError::MalformedSnapshot(err.to_string()))?;

        if data.version != SNAPSHOT_VERSION {
            return Err(EditorError::MalformedSnapshot(format!(
                "unsupported snapshot version {}",
                data.version
            )));
        }

        let mut seen = HashSet::with_capacity(data.nodes.len());
        for (index, node) in data.nodes.iter().enumerate() {
            if !node.is_valid() {
                return Err(EditorError::MalformedSnapshot(format!(
                    "{} #{index} violates its invariants",
                    node.kind_name()
                )));
            }
            if !seen.insert(node.id()) {
                return Err(EditorError::MalformedSnapshot(format!(
                    "duplicate node id {}",
                    node.id()
                )));
            }
        }

        Ok(data.nodes)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}
