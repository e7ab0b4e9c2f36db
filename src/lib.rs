#![warn(clippy::all, rust_2018_idioms)]

pub mod app;
pub mod asset;
pub mod config;
pub mod document;
pub mod editor;
pub mod element;
pub mod error;
pub mod export;
pub mod guides;
pub mod history;
pub mod panels;
pub mod raster;
pub mod renderer;
pub mod tools;
pub mod viewport;

pub use app::PaintApp;
pub use asset::{AssetLoader, AssetRef, ImageAssetLoader, LoadedAsset};
pub use config::EditorConfig;
pub use document::{Document, Snapshot};
pub use editor::{Editor, Notification, NotificationLevel};
pub use element::{CompositeMode, ImageNode, Node, NodeId, StrokeNode, StrokeStyle};
pub use error::{AssetLoadError, EditorError, EditorResult};
pub use export::{ExportOptions, ExportPreset, ExportedImage};
pub use history::History;
pub use renderer::Renderer;
pub use tools::{ToolKind, ToolParameter, ToolState};
pub use viewport::Viewport;
