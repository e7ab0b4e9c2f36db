//! Export pipeline: composite the document and encode it as PNG or JPEG.
//!
//! Export reads state only. The guide overlay is never included.

use std::io::Cursor;

use egui::{Color32, Pos2, Rect, Vec2};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

use crate::asset::{AssetCache, encode_data_uri};
use crate::config::MAX_CANVAS_EDGE;
use crate::document::Document;
use crate::error::{EditorError, EditorResult};
use crate::raster::{self, RasterTransform};
use crate::viewport::Viewport;

/// Largest output edge we are willing to allocate.
const MAX_EXPORT_EDGE: u32 = MAX_CANVAS_EDGE as u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
        }
    }
}

/// The fixed export presets offered by the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportPreset {
    /// Full canvas, lossless.
    Png,
    /// Full canvas, lossy with the configured quality.
    Jpeg,
    /// Top-left quadrant at double density, for seamless-tile previews.
    Tile,
}

impl ExportPreset {
    pub const ALL: [ExportPreset; 3] = [Self::Png, Self::Jpeg, Self::Tile];

    pub fn format(self) -> ExportFormat {
        match self {
            Self::Png | Self::Tile => ExportFormat::Png,
            Self::Jpeg => ExportFormat::Jpeg,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Png => "batik.png",
            Self::Jpeg => "batik.jpg",
            Self::Tile => "batik-tile.png",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Tile => "Tile",
        }
    }

    fn pixel_ratio(self) -> f32 {
        match self {
            Self::Tile => 2.0,
            Self::Png | Self::Jpeg => 1.0,
        }
    }

    fn crop(self, canvas_size: Vec2) -> Rect {
        match self {
            Self::Tile => Rect::from_min_size(Pos2::ZERO, canvas_size / 2.0),
            Self::Png | Self::Jpeg => Rect::from_min_size(Pos2::ZERO, canvas_size),
        }
    }
}

/// Overrides for a preset. `crop` is in stage coordinates, i.e. after the
/// viewport transform, exactly like the visible canvas area.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExportOptions {
    pub crop: Option<Rect>,
    pub pixel_ratio: Option<f32>,
    /// Opaque background to flatten onto. JPEG always gets one (white by default).
    pub background: Option<Color32>,
}

/// Everything the pipeline reads.
#[derive(Clone, Copy)]
pub struct ExportSource<'a> {
    pub document: &'a Document,
    pub assets: &'a AssetCache,
    pub viewport: &'a Viewport,
    pub canvas_size: Vec2,
    pub jpeg_quality: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ExportFormat,
    pub file_name: &'static str,
}

impl ExportedImage {
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    pub fn to_data_uri(&self) -> String {
        encode_data_uri(self.mime(), &self.bytes)
    }
}

pub fn export(source: ExportSource<'_>, preset: ExportPreset, options: &ExportOptions) -> EditorResult<ExportedImage> {
    let format = preset.format();
    let crop = options.crop.unwrap_or_else(|| preset.crop(source.canvas_size));
    let ratio = options.pixel_ratio.unwrap_or_else(|| preset.pixel_ratio());

    if !(ratio.is_finite() && ratio > 0.0) {
        return Err(EditorError::invalid("pixel ratio", format!("{ratio} is not a positive number")));
    }
    if !(crop.is_finite() && crop.width() > 0.0 && crop.height() > 0.0) {
        return Err(EditorError::invalid("crop", format!("{crop:?} is empty")));
    }

    let width = (crop.width() * ratio).round() as u32;
    let height = (crop.height() * ratio).round() as u32;
    if width == 0 || height == 0 || width > MAX_EXPORT_EDGE || height > MAX_EXPORT_EDGE {
        return Err(export_error(format, format!("output size {width}x{height} is out of range")));
    }

    let transform = RasterTransform {
        scale: source.viewport.scale() * ratio,
        translation: (source.viewport.offset() - crop.min.to_vec2()) * ratio,
    };
    // JPEG has no alpha channel.
    let background = match format {
        ExportFormat::Png => options.background,
        ExportFormat::Jpeg => Some(options.background.unwrap_or(Color32::WHITE)),
    };
    let canvas = raster::rasterize(source.document, source.assets, width, height, transform, background);

    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            canvas
                .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
                .map_err(|e| export_error(format, e.to_string()))?;
        }
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(canvas).to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut bytes, source.jpeg_quality);
            rgb.write_with_encoder(encoder)
                .map_err(|e| export_error(format, e.to_string()))?;
        }
    }

    log::info!(
        "Exported {} ({width}x{height}, {} bytes)",
        preset.file_name(),
        bytes.len()
    );
    Ok(ExportedImage {
        bytes,
        width,
        height,
        format,
        file_name: preset.file_name(),
    })
}

fn export_error(format: ExportFormat, reason: String) -> EditorError {
    EditorError::Export {
        format: format.name(),
        reason,
    }
}
