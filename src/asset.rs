//! Resolving stamp and upload references into pixels.
//!
//! The editor only ever sees the [`AssetLoader`] trait. The default
//! [`ImageAssetLoader`] understands base64 `data:` URIs and local file paths;
//! file reads happen on a worker thread and come back through a oneshot
//! channel, so the UI thread never blocks on disk. Decoded pixels land in
//! the same [`AssetCache`] the renderer reads from.

use std::collections::HashMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::FutureExt as _;
use futures::future::LocalBoxFuture;
use image::RgbaImage;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::AssetLoadError;

/// Opaque reference to image data: a path, URL or `data:` URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetRef(String);

impl AssetRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl std::fmt::Display for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Data URIs can be megabytes long.
        match self.0.char_indices().nth(48) {
            Some((cut, _)) if self.is_data_uri() => write!(f, "{}…", &self.0[..cut]),
            _ => f.write_str(&self.0),
        }
    }
}

/// Decoded pixels plus their natural size.
#[derive(Clone)]
pub struct LoadedAsset {
    pub width: u32,
    pub height: u32,
    pub pixels: Arc<RgbaImage>,
}

// Custom Debug implementation so logs don't dump pixel data
impl std::fmt::Debug for LoadedAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedAsset")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl LoadedAsset {
    pub fn from_image(pixels: RgbaImage) -> Self {
        Self::from_shared(Arc::new(pixels))
    }

    pub fn from_shared(pixels: Arc<RgbaImage>) -> Self {
        Self {
            width: pixels.width(),
            height: pixels.height(),
            pixels,
        }
    }
}

/// Asynchronously resolves an [`AssetRef`] into pixels.
///
/// Futures are polled on the UI thread, so they need not be `Send`.
pub trait AssetLoader {
    fn load(&self, asset: &AssetRef) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetLoadError>>;
}

/// Default loader for `data:` URIs and local files.
///
/// Decodes into an [`AssetCache`], which its worker threads write to as
/// well; a repeated load of the same reference reuses those pixels.
#[derive(Clone, Default)]
pub struct ImageAssetLoader {
    cache: AssetCache,
}

impl ImageAssetLoader {
    /// A loader with a cache of its own.
    pub fn new() -> Self {
        Self::default()
    }

    /// A loader decoding into `cache`, usually the editor's.
    pub fn with_cache(cache: AssetCache) -> Self {
        Self { cache }
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

impl AssetLoader for ImageAssetLoader {
    fn load(&self, asset: &AssetRef) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetLoadError>> {
        if let Some(hit) = self.cache.get(asset) {
            log::debug!("Asset cache hit: {asset}");
            return futures::future::ready(Ok(LoadedAsset::from_shared(hit))).boxed_local();
        }

        let asset = asset.clone();
        let cache = self.cache.clone();

        if asset.is_data_uri() {
            return async move {
                let bytes = decode_data_uri(&asset)?;
                let loaded = decode_bytes(&asset, &bytes)?;
                cache.insert(asset, Arc::clone(&loaded.pixels));
                Ok(loaded)
            }
            .boxed_local();
        }

        let scheme = asset.as_str().split_once("://").map(|(scheme, _)| scheme);
        match scheme {
            None | Some("file") => load_file(asset, cache),
            Some(_) => futures::future::ready(Err(AssetLoadError::Unsupported(asset))).boxed_local(),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn load_file(asset: AssetRef, cache: AssetCache) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetLoadError>> {
    let (tx, rx) = futures::channel::oneshot::channel();
    let worker_asset = asset.clone();

    std::thread::spawn(move || {
        let path = worker_asset
            .as_str()
            .strip_prefix("file://")
            .unwrap_or(worker_asset.as_str());
        let result = std::fs::read(path)
            .map_err(|err| AssetLoadError::Unreachable {
                asset: worker_asset.clone(),
                reason: err.to_string(),
            })
            .and_then(|bytes| decode_bytes(&worker_asset, &bytes));
        if let Ok(loaded) = &result {
            cache.insert(worker_asset.clone(), Arc::clone(&loaded.pixels));
        }
        // Receiver is gone if the editor was torn down; the result is simply dropped.
        let _ = tx.send(result);
    });

    async move {
        match rx.await {
            Ok(result) => result,
            Err(_canceled) => {
                log::warn!("Worker for {asset} exited without a result");
                Err(AssetLoadError::Cancelled)
            }
        }
    }
    .boxed_local()
}

#[cfg(target_arch = "wasm32")]
fn load_file(asset: AssetRef, _cache: AssetCache) -> LocalBoxFuture<'static, Result<LoadedAsset, AssetLoadError>> {
    futures::future::ready(Err(AssetLoadError::Unsupported(asset))).boxed_local()
}

/// Extract the payload of a base64 `data:` URI.
pub fn decode_data_uri(asset: &AssetRef) -> Result<Vec<u8>, AssetLoadError> {
    let undecodable = |reason: &str| AssetLoadError::Undecodable {
        asset: asset.clone(),
        reason: reason.to_owned(),
    };

    let rest = asset
        .as_str()
        .strip_prefix("data:")
        .ok_or_else(|| undecodable("not a data URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| undecodable("missing ',' separator"))?;
    if !header.ends_with(";base64") {
        return Err(undecodable("only base64 data URIs are supported"));
    }

    STANDARD
        .decode(payload.trim())
        .map_err(|err| undecodable(&err.to_string()))
}

/// Build a base64 `data:` URI.
pub fn encode_data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

fn decode_bytes(asset: &AssetRef, bytes: &[u8]) -> Result<LoadedAsset, AssetLoadError> {
    let image = image::load_from_memory(bytes).map_err(|err| AssetLoadError::Undecodable {
        asset: asset.clone(),
        reason: err.to_string(),
    })?;
    let loaded = LoadedAsset::from_image(image.to_rgba8());
    if loaded.width == 0 || loaded.height == 0 {
        return Err(AssetLoadError::Undecodable {
            asset: asset.clone(),
            reason: "image has no pixels".to_owned(),
        });
    }
    log::info!("Decoded asset {asset}: {}x{}", loaded.width, loaded.height);
    Ok(loaded)
}

/// Decoded pixels keyed by reference.
///
/// Clones are handles to the same map, so the loader, its worker threads
/// and the renderer all see one copy of each image. Entries stay until
/// [`AssetCache::clear`]: undo can bring back any node placed before that.
#[derive(Clone, Default)]
pub struct AssetCache {
    pixels: Arc<Mutex<HashMap<AssetRef, Arc<RgbaImage>>>>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, asset: AssetRef, pixels: Arc<RgbaImage>) {
        self.pixels.lock().insert(asset, pixels);
    }

    pub fn get(&self, asset: &AssetRef) -> Option<Arc<RgbaImage>> {
        self.pixels.lock().get(asset).cloned()
    }

    pub fn len(&self) -> usize {
        self.pixels.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.lock().is_empty()
    }

    /// Drop every entry. Only safe once no node or snapshot refers to them.
    pub fn clear(&self) {
        let mut pixels = self.pixels.lock();
        if !pixels.is_empty() {
            log::info!("Evicting {} cached assets", pixels.len());
        }
        pixels.clear();
    }
}

impl std::fmt::Debug for AssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetCache").field("len", &self.len()).finish()
    }
}
