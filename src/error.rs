//! Error types for the barcheck library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`BarcheckError`] — **Fatal**: report generation cannot proceed at all
//!   (font missing or unparseable, a second generation already in flight,
//!   unknown item or history entry). Returned as `Err(BarcheckError)` from
//!   the top-level session and report functions.
//!
//! * [`PhotoError`] — **Non-fatal**: a single photo failed (not an image,
//!   corrupt data, encode glitch) but the rest of the batch or report is
//!   fine. Stored inside [`crate::pipeline::ingest::IngestReport`] and
//!   [`crate::report::ReportDocument`] so callers can inspect partial
//!   success rather than losing a whole report to one bad photo.
//!
//! * [`StoreError`] — persistence boundary. The session logs these and
//!   keeps going; the in-memory state stays authoritative for the session.
//!
//! The separation lets callers decide their own tolerance: surface every
//! skipped photo, log and continue, or ignore the skip lists entirely.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the barcheck library.
///
/// Photo-level failures use [`PhotoError`] and are stored next to the
/// successful results rather than propagated here.
#[derive(Debug, Error)]
pub enum BarcheckError {
    // ── Font errors ───────────────────────────────────────────────────────
    /// The report font could not be read from disk.
    #[error("Report font not found or unreadable: '{path}': {detail}\nPlace a TTF with non-Latin coverage there, or set a different font via ReportConfig.")]
    FontLoadFailed { path: PathBuf, detail: String },

    /// The font bytes were read but are not a parseable TTF.
    #[error("Report font could not be parsed: {detail}\nThe report has no fallback font; nothing was generated.")]
    FontParseFailed { detail: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// A report generation was requested while another is still running.
    #[error("A report is already being generated; try again when it finishes")]
    GenerationInFlight,

    // ── Checklist errors ──────────────────────────────────────────────────
    /// No item with the given id exists on the current checklist.
    #[error("No checklist item with id '{id}'")]
    ItemNotFound { id: String },

    /// No item occupies the given 1-based position.
    #[error("No checklist item at position {order} (checklist has {total} items)")]
    OrderOutOfRange { order: u32, total: usize },

    /// No photo occupies the given slot on the item.
    #[error("Item {order} has no photo at slot {slot}")]
    PhotoSlotOutOfRange { order: u32, slot: usize },

    /// No history entry at the given index.
    #[error("No history entry at index {index} (history has {total} entries)")]
    HistoryEntryNotFound { index: usize, total: usize },

    /// A checklist template must contain at least one line.
    #[error("A checklist template needs at least one item line")]
    EmptyTemplate,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not write the produced report to disk.
    #[error("Failed to write report file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single photo.
///
/// Recorded in [`crate::pipeline::ingest::IngestReport::skipped`] during
/// ingestion and in [`crate::report::ReportDocument::skipped_photos`]
/// during rendering. The surrounding batch or report always continues.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PhotoError {
    /// The file's declared media type is not `image/*`.
    #[error("'{name}': not an image (media type '{media_type}')")]
    NotAnImage { name: String, media_type: String },

    /// The image bytes could not be decoded.
    #[error("'{name}': image decode failed: {detail}")]
    DecodeFailed { name: String, detail: String },

    /// Re-encoding the downsampled raster failed.
    #[error("'{name}': JPEG encode failed: {detail}")]
    EncodeFailed { name: String, detail: String },

    /// A stored photo could not be embedded into the report page.
    #[error("Item {item_order} photo {slot}: embed failed: {detail}")]
    EmbedFailed {
        item_order: u32,
        slot: usize,
        detail: String,
    },
}

/// Persistence-boundary errors.
///
/// The session treats these as soft: reads fall back to defaults, writes
/// are logged and dropped. They exist as a type so that decision is made
/// deliberately at one place instead of by a swallow-all handler.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying storage I/O failed.
    #[error("store I/O failed for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A persisted payload is not valid JSON for its schema.
    #[error("corrupt payload under key '{key}': {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A payload could not be serialized for writing.
    #[error("failed to serialize payload for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}
