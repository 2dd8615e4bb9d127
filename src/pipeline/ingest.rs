//! Photo ingestion: raw captured bytes → bounded, re-encoded [`PhotoBlob`].
//!
//! ## Why compress before storing?
//!
//! Photos are stored inline in the persisted checklist document, so an
//! uncompressed 12 MP capture would blow the local store up by tens of
//! megabytes per item. Bounding the long edge to `max_side` and
//! re-encoding as JPEG keeps each blob in the hundreds-of-kilobytes range
//! while staying perfectly readable in a 70 mm report cell.
//!
//! ## Why JPEG?
//!
//! Evidence photos are continuous-tone camera output; JPEG at quality 85
//! is visually indistinguishable from the source at a fraction of PNG's
//! size. Alpha is irrelevant for photos, so everything is flattened to RGB
//! before encoding.
//!
//! ## Batch semantics
//!
//! A batch never aborts on a bad file: non-image media types and decode
//! failures are recorded per-file in [`IngestReport::skipped`] while the
//! rest of the batch continues. The whole batch runs sequentially inside
//! one `spawn_blocking` task so the caller's task is never stalled by
//! codec work.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use tracing::{debug, warn};

use crate::config::ReportConfig;
use crate::error::{BarcheckError, PhotoError};
use crate::model::PhotoBlob;

/// One file handed over by the capture surface (camera or picker).
#[derive(Debug, Clone)]
pub struct CapturedFile {
    /// Display name, used only in skip diagnostics.
    pub name: String,
    /// Declared media type, e.g. `image/jpeg`. Non-`image/*` files are
    /// skipped without being decoded.
    pub media_type: String,
    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Outcome of one ingestion batch: compressed photos plus an explicit
/// record of everything that was skipped and why.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub photos: Vec<PhotoBlob>,
    pub skipped: Vec<PhotoError>,
}

/// Compress a single image: decode, bound the long edge to `max_side`,
/// re-encode as RGB JPEG at `quality`.
///
/// Images already within the bound keep their dimensions; larger ones are
/// scaled by `max_side / max(width, height)` with both dimensions rounded
/// to the nearest pixel, preserving aspect ratio. The returned blob is
/// self-contained and independent of the input buffer's lifetime.
///
/// # Errors
/// [`PhotoError::DecodeFailed`] for corrupt or unsupported input,
/// [`PhotoError::EncodeFailed`] if the JPEG encoder rejects the raster.
pub fn compress(
    name: &str,
    bytes: &[u8],
    max_side: u32,
    quality: u8,
) -> Result<PhotoBlob, PhotoError> {
    let img = image::load_from_memory(bytes).map_err(|e| PhotoError::DecodeFailed {
        name: name.to_string(),
        detail: e.to_string(),
    })?;

    let (w, h) = (img.width(), img.height());
    let long_edge = w.max(h);

    let img = if long_edge > max_side {
        let scale = f64::from(max_side) / f64::from(long_edge);
        let new_w = (f64::from(w) * scale).round().max(1.0) as u32;
        let new_h = (f64::from(h) * scale).round().max(1.0) as u32;
        debug!("downsampling '{}': {}x{} -> {}x{}", name, w, h, new_w, new_h);
        img.resize_exact(new_w, new_h, FilterType::Triangle)
    } else {
        img
    };

    // JPEG has no alpha channel; flatten everything to RGB first.
    let rgb = img.to_rgb8();

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| PhotoError::EncodeFailed {
            name: name.to_string(),
            detail: e.to_string(),
        })?;

    debug!("compressed '{}' to {} bytes", name, buf.len());
    Ok(PhotoBlob::jpeg(buf))
}

/// Ingest a batch of captured files.
///
/// Filters to `image/*` media types, compresses each survivor, and keeps
/// going past individual failures. Runs the sequential batch inside
/// `spawn_blocking`; the only fatal error is the worker task itself dying.
pub async fn ingest_batch(
    files: Vec<CapturedFile>,
    config: &ReportConfig,
) -> Result<IngestReport, BarcheckError> {
    let max_side = config.max_side;
    let quality = config.jpeg_quality;

    tokio::task::spawn_blocking(move || ingest_batch_blocking(files, max_side, quality))
        .await
        .map_err(|e| BarcheckError::Internal(format!("ingest task panicked: {e}")))
}

/// Blocking implementation of batch ingestion.
fn ingest_batch_blocking(files: Vec<CapturedFile>, max_side: u32, quality: u8) -> IngestReport {
    let mut report = IngestReport::default();

    for file in files {
        if !file.media_type.starts_with("image/") {
            warn!(
                "skipping '{}': media type '{}' is not an image",
                file.name, file.media_type
            );
            report.skipped.push(PhotoError::NotAnImage {
                name: file.name,
                media_type: file.media_type,
            });
            continue;
        }

        match compress(&file.name, &file.bytes, max_side, quality) {
            Ok(blob) => report.photos.push(blob),
            Err(e) => {
                warn!("skipping '{}': {}", file.name, e);
                report.skipped.push(e);
            }
        }
    }

    report
}
