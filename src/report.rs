//! Report generation entry points: checklist snapshot → named PDF blob.
//!
//! ## Why spawn_blocking?
//!
//! Image decoding and PDF serialization are CPU-bound; running them on the
//! async runtime's worker threads would stall unrelated tasks for the
//! duration of a large report. The async entry point moves the strictly
//! sequential body onto the blocking pool, matching how ingestion handles
//! its codec work. There is no parallelism inside one generation — photos
//! are probed, embedded and drawn one after another.
//!
//! ## Failure model
//!
//! The font is the only hard dependency: if it cannot be loaded or parsed
//! there is no report (non-Latin titles would be unreadable with any
//! substitute). Individual photos are soft: a blob that fails to decode or
//! embed costs its grid cell and lands in
//! [`ReportDocument::skipped_photos`], never the whole document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::config::ReportConfig;
use crate::error::{BarcheckError, PhotoError};
use crate::model::ChecklistItem;
use crate::pipeline::layout::{self, ProbedPhoto};
use crate::pipeline::pdf::{EmbeddedPhoto, PdfWriter};

/// A finished report, ready for delivery (share sheet, download, file).
#[derive(Debug, Clone)]
pub struct ReportDocument {
    /// Suggested delivery name, `BarChecklist_Report_<YYYY-MM-DD>.pdf`.
    pub file_name: String,
    /// The complete PDF.
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Photos whose grid cells were skipped, with reasons.
    pub skipped_photos: Vec<PhotoError>,
}

/// Generate the PDF report for a checklist snapshot.
///
/// `items` may come from the live checklist or an archived history entry;
/// the renderer only needs the id and the item list.
///
/// # Errors
/// Fatal only: font load/parse failure or the worker task dying. Photo
/// problems are reported per-cell in the returned document.
pub async fn generate(
    checklist_id: &str,
    items: &[ChecklistItem],
    config: &ReportConfig,
) -> Result<ReportDocument, BarcheckError> {
    let id = checklist_id.to_string();
    let items = items.to_vec();
    let config = config.clone();

    tokio::task::spawn_blocking(move || generate_blocking(&id, &items, &config))
        .await
        .map_err(|e| BarcheckError::Internal(format!("report task panicked: {e}")))?
}

/// Blocking implementation of report generation.
pub fn generate_blocking(
    checklist_id: &str,
    items: &[ChecklistItem],
    config: &ReportConfig,
) -> Result<ReportDocument, BarcheckError> {
    let started = Instant::now();
    info!("generating report for checklist {checklist_id} ({} items)", items.len());

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_start(items.len());
    }

    // ── Step 1: Font (fatal on failure) ──────────────────────────────────
    let font_bytes = config.font.load()?;

    // ── Step 2: Probe photos for natural dimensions ──────────────────────
    let mut skipped: Vec<PhotoError> = Vec::new();
    let mut probes: Vec<ProbedPhoto> = Vec::new();
    let mut photo_bytes: Vec<&[u8]> = Vec::new();

    for item in items {
        for (slot, photo) in item.photos.iter().enumerate() {
            match image::load_from_memory(&photo.data) {
                Ok(img) => {
                    probes.push(ProbedPhoto {
                        index: photo_bytes.len(),
                        item_order: item.order,
                        slot,
                        px_w: img.width(),
                        px_h: img.height(),
                    });
                    photo_bytes.push(&photo.data);
                }
                Err(e) => {
                    warn!("item {} photo {}: decode failed: {}", item.order, slot, e);
                    if let Some(ref cb) = config.progress_callback {
                        cb.on_photo_skipped(item.order, slot, &e.to_string());
                    }
                    skipped.push(PhotoError::EmbedFailed {
                        item_order: item.order,
                        slot,
                        detail: e.to_string(),
                    });
                }
            }
        }
    }
    debug!("probed {} photos, {} skipped", probes.len(), skipped.len());

    // ── Step 3: Layout ───────────────────────────────────────────────────
    let meta_lines = vec![
        format!("Дата/время: {}", Local::now().format("%Y-%m-%d %H:%M")),
        format!("Чек-лист: {checklist_id}"),
    ];
    let pages = layout::layout_report(
        &config.report_title,
        &meta_lines,
        items,
        &probes,
        config.progress_callback.as_deref(),
    );

    // ── Step 4: Assemble the PDF ─────────────────────────────────────────
    let mut writer = PdfWriter::new(&config.report_title, &font_bytes)?;

    let mut embedded: HashMap<usize, EmbeddedPhoto> = HashMap::new();
    for probe in &probes {
        match writer.embed_photo(photo_bytes[probe.index]) {
            Ok(handle) => {
                embedded.insert(probe.index, handle);
            }
            Err(detail) => {
                warn!(
                    "item {} photo {}: embed failed: {}",
                    probe.item_order, probe.slot, detail
                );
                if let Some(ref cb) = config.progress_callback {
                    cb.on_photo_skipped(probe.item_order, probe.slot, &detail);
                }
                skipped.push(PhotoError::EmbedFailed {
                    item_order: probe.item_order,
                    slot: probe.slot,
                    detail,
                });
            }
        }
    }

    for page in &pages {
        writer.push_page(page, &embedded);
    }
    let bytes = writer.finish();

    // ── Step 5: Name and return ──────────────────────────────────────────
    let file_name = format!("BarChecklist_Report_{}.pdf", Local::now().format("%Y-%m-%d"));

    if let Some(ref cb) = config.progress_callback {
        cb.on_generation_complete(pages.len(), bytes.len());
    }
    info!(
        "report ready: {} pages, {} bytes, {} photos skipped, {}ms",
        pages.len(),
        bytes.len(),
        skipped.len(),
        started.elapsed().as_millis()
    );

    Ok(ReportDocument {
        file_name,
        bytes,
        page_count: pages.len(),
        skipped_photos: skipped,
    })
}

/// Write a produced report into `dir`, atomically (temp file + rename).
///
/// Returns the full path of the written file.
pub async fn write_to_dir(
    doc: &ReportDocument,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, BarcheckError> {
    let dir = dir.as_ref();
    let path = dir.join(&doc.file_name);
    let write_failed = |source: std::io::Error| BarcheckError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &doc.bytes)
        .await
        .map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_failed)?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;

    #[tokio::test]
    async fn unparseable_font_is_fatal_before_any_page() {
        let config = ReportConfig::builder()
            .font_bytes(b"garbage".to_vec())
            .build()
            .unwrap();
        let err = generate("abc123", &[], &config).await.unwrap_err();
        assert!(matches!(err, BarcheckError::FontParseFailed { .. }));
    }

    #[tokio::test]
    async fn missing_font_file_is_fatal() {
        let config = ReportConfig::builder()
            .font_path("/nonexistent/font.ttf")
            .build()
            .unwrap();
        let err = generate("abc123", &[], &config).await.unwrap_err();
        assert!(matches!(err, BarcheckError::FontLoadFailed { .. }));
    }

    #[test]
    fn report_file_name_is_dated() {
        let name = format!("BarChecklist_Report_{}.pdf", Local::now().format("%Y-%m-%d"));
        assert!(name.starts_with("BarChecklist_Report_"));
        assert!(name.ends_with(".pdf"));
        // `YYYY-MM-DD` between prefix and extension.
        let date = &name["BarChecklist_Report_".len()..name.len() - ".pdf".len()];
        assert_eq!(date.len(), 10);
    }
}
