use std::task::{Context, Poll};

use egui::{Pos2, Vec2};
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt as _, StreamExt as _};

use crate::asset::{AssetCache, AssetLoader, AssetRef, LoadedAsset};
use crate::document::Document;
use crate::element::{ImageNode, NodeId};
use crate::error::{AssetLoadError, EditorError, EditorResult};
use crate::history::History;

/// Where a resolved image goes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    /// Square of the current stamp size, centered on the point.
    Stamp { center: Pos2 },
    /// Natural pixel size, top-left corner at the point.
    Upload { top_left: Pos2 },
}

/// A finished asset load waiting to be applied to the document.
#[derive(Debug)]
pub struct PlacementOutcome {
    pub asset: AssetRef,
    pub placement: Placement,
    pub result: Result<LoadedAsset, AssetLoadError>,
}

/// Starts asset loads and hands back the ones that completed.
///
/// Loads are independent; outcomes arrive in completion order, not request
/// order. Dropping the placer drops every in-flight load with it.
pub struct StampPlacer {
    loader: Box<dyn AssetLoader>,
    pending: FuturesUnordered<LocalBoxFuture<'static, PlacementOutcome>>,
}

impl StampPlacer {
    pub fn new(loader: Box<dyn AssetLoader>) -> Self {
        Self {
            loader,
            pending: FuturesUnordered::new(),
        }
    }

    pub fn request(&mut self, asset: AssetRef, placement: Placement) {
        log::info!("Requesting {asset} for {placement:?}");
        let load = self.loader.load(&asset);
        self.pending.push(
            async move {
                PlacementOutcome {
                    result: load.await,
                    asset,
                    placement,
                }
            }
            .boxed_local(),
        );
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Collect every load that is ready right now without blocking.
    pub fn poll_completed(&mut self, cx: &mut Context<'_>) -> Vec<PlacementOutcome> {
        let mut done = Vec::new();
        while let Poll::Ready(Some(outcome)) = self.pending.poll_next_unpin(cx) {
            done.push(outcome);
        }
        done
    }

    /// Block until every pending load has finished.
    pub fn wait_all(&mut self) -> Vec<PlacementOutcome> {
        futures::executor::block_on(async {
            let mut done = Vec::with_capacity(self.pending.len());
            while let Some(outcome) = self.pending.next().await {
                done.push(outcome);
            }
            done
        })
    }

    /// Forget in-flight loads; their results will never be applied.
    pub fn discard_pending(&mut self) {
        if !self.pending.is_empty() {
            log::info!("Discarding {} pending asset loads", self.pending.len());
        }
        self.pending = FuturesUnordered::new();
    }
}

/// Insert a completed load into the document.
///
/// Applies on top of whatever the document holds now, recording a history
/// entry right before insertion. A failed load changes nothing.
pub fn apply_outcome(
    outcome: PlacementOutcome,
    stamp_size: f32,
    document: &mut Document,
    history: &mut History,
    assets: &AssetCache,
) -> EditorResult<NodeId> {
    let PlacementOutcome {
        asset,
        placement,
        result,
    } = outcome;

    let loaded = result.inspect_err(|err| log::warn!("Placement of {asset} failed: {err}"))?;

    let id = NodeId::new();
    let node = match placement {
        Placement::Stamp { center } => ImageNode::centered(id, center, Vec2::splat(stamp_size), asset.clone()),
        Placement::Upload { top_left } => ImageNode::new(
            id,
            top_left,
            Vec2::new(loaded.width as f32, loaded.height as f32),
            asset.clone(),
            true,
        ),
    }
    .ok_or_else(|| EditorError::invalid("image size", format!("{asset} resolved to an empty image")))?;

    history.record_before_action(document)?;
    assets.insert(asset, loaded.pixels);
    document.add_node(node);
    log::info!("Placed image {id}");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    struct FixedLoader {
        width: u32,
        height: u32,
    }

    impl AssetLoader for FixedLoader {
        fn load(&self, _asset: &AssetRef) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetLoadError>> {
            let loaded = LoadedAsset::from_image(RgbaImage::new(self.width, self.height));
            futures::future::ready(Ok(loaded)).boxed_local()
        }
    }

    struct FailingLoader;

    impl AssetLoader for FailingLoader {
        fn load(&self, asset: &AssetRef) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetLoadError>> {
            futures::future::ready(Err(AssetLoadError::Unreachable {
                asset: asset.clone(),
                reason: "offline".to_owned(),
            }))
            .boxed_local()
        }
    }

    #[test]
    fn stamp_ignores_source_aspect_ratio() {
        let mut placer = StampPlacer::new(Box::new(FixedLoader { width: 300, height: 40 }));
        placer.request(AssetRef::new("wide.png"), Placement::Stamp { center: Pos2::new(200.0, 200.0) });

        let mut doc = Document::new();
        let mut history = History::new();
        let assets = AssetCache::new();
        for outcome in placer.wait_all() {
            apply_outcome(outcome, 150.0, &mut doc, &mut history, &assets).unwrap();
        }

        let image = doc.nodes()[0].as_image().unwrap();
        assert_eq!(image.size(), Vec2::splat(150.0));
        assert_eq!(image.position(), Pos2::new(125.0, 125.0));
        assert!(image.draggable());
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(assets.len(), 1);
    }

    #[test]
    fn upload_keeps_natural_size() {
        let mut placer = StampPlacer::new(Box::new(FixedLoader { width: 64, height: 32 }));
        placer.request(AssetRef::new("photo.png"), Placement::Upload { top_left: Pos2::new(50.0, 50.0) });

        let mut doc = Document::new();
        let mut history = History::new();
        let assets = AssetCache::new();
        for outcome in placer.wait_all() {
            apply_outcome(outcome, 150.0, &mut doc, &mut history, &assets).unwrap();
        }

        let image = doc.nodes()[0].as_image().unwrap();
        assert_eq!(image.size(), Vec2::new(64.0, 32.0));
        assert_eq!(image.position(), Pos2::new(50.0, 50.0));
    }

    #[test]
    fn failed_load_leaves_document_and_history_alone() {
        let mut placer = StampPlacer::new(Box::new(FailingLoader));
        placer.request(AssetRef::new("gone.png"), Placement::Stamp { center: Pos2::ZERO });

        let mut doc = Document::new();
        let mut history = History::new();
        let assets = AssetCache::new();
        let outcome = placer.wait_all().pop().unwrap();
        let err = apply_outcome(outcome, 150.0, &mut doc, &mut history, &assets).unwrap_err();

        assert!(matches!(err, EditorError::AssetLoad(AssetLoadError::Unreachable { .. })));
        assert!(doc.is_empty());
        assert!(!history.can_undo());
        assert!(assets.is_empty());
    }

    #[test]
    fn discarded_loads_never_complete() {
        let mut placer = StampPlacer::new(Box::new(FixedLoader { width: 8, height: 8 }));
        placer.request(AssetRef::new("a.png"), Placement::Stamp { center: Pos2::ZERO });
        assert_eq!(placer.pending_count(), 1);
        placer.discard_pending();
        assert!(placer.wait_all().is_empty());
    }
}
