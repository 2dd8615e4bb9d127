//! Integration tests for the reporting pipeline: ingestion dimension
//! bounds, layout pagination through the public API, and end-to-end PDF
//! generation.
//!
//! The PDF tests need a real TTF with Cyrillic coverage. They are gated on
//! one being present so the suite stays green on machines without the
//! asset.
//!
//! Run the full suite with:
//!   BARCHECK_FONT=/path/to/Roboto-Regular.ttf cargo test --test report

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use barcheck::pipeline::ingest::compress;
use barcheck::{
    generate, BarcheckError, ChecklistTemplate, MemoryStore, ReportConfig, Session,
};
use image::{DynamicImage, Rgba, RgbaImage};

// ── Test helpers ─────────────────────────────────────────────────────────

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([80, 80, 200, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    buf
}

/// Locate a usable report font: `BARCHECK_FONT` first, then the bundled
/// asset path.
fn font_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("BARCHECK_FONT") {
        let p = PathBuf::from(p);
        if p.exists() {
            return Some(p);
        }
    }
    let bundled =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts/Roboto-Regular.ttf");
    bundled.exists().then_some(bundled)
}

/// Skip this test unless a report font is available.
macro_rules! skip_unless_font {
    () => {{
        match font_path() {
            Some(p) => p,
            None => {
                println!("SKIP — no report font found; set BARCHECK_FONT or add assets/fonts/Roboto-Regular.ttf");
                return;
            }
        }
    }};
}

// ── Ingestion dimension properties ───────────────────────────────────────

#[test]
fn long_edge_is_bounded_to_max_side() {
    let blob = compress("wide.png", &png_bytes(512, 256), 128, 85).unwrap();
    let img = image::load_from_memory(&blob.data).unwrap();
    assert_eq!(img.width().max(img.height()), 128);
    let ratio = f64::from(img.width()) / f64::from(img.height());
    assert!((ratio - 2.0).abs() < 0.05, "aspect drifted to {ratio}");
}

#[test]
fn images_within_the_bound_are_untouched() {
    let blob = compress("small.png", &png_bytes(100, 60), 1280, 85).unwrap();
    let img = image::load_from_memory(&blob.data).unwrap();
    assert_eq!((img.width(), img.height()), (100, 60));
}

// ── Fatal font failures ──────────────────────────────────────────────────

#[tokio::test]
async fn generation_without_a_loadable_font_produces_nothing() {
    let config = ReportConfig::builder()
        .font_path("/no/such/font.ttf")
        .build()
        .unwrap();
    let err = generate("id", &[], &config).await.unwrap_err();
    assert!(matches!(err, BarcheckError::FontLoadFailed { .. }));
}

// ── End-to-end PDF generation (needs a real font) ────────────────────────

#[tokio::test]
async fn finalize_produces_a_pdf_and_resets_the_checklist() {
    let font = skip_unless_font!();

    let template = ChecklistTemplate::default();
    let config = ReportConfig::builder().font_path(font).build().unwrap();
    let mut session = Session::open(Arc::new(MemoryStore::new()), template, config);

    let id = session.current().id_at_order(1).unwrap();
    session.set_done(&id, true).unwrap();
    session.set_note(&id, "журнал заполнен в 09:40").unwrap();
    session
        .add_photos(
            &id,
            vec![barcheck::CapturedFile {
                name: "fridge.png".into(),
                media_type: "image/png".into(),
                bytes: png_bytes(640, 480),
            }],
        )
        .await
        .unwrap();

    let before_total = session.current().total_count();
    let outcome = session.finalize().await.expect("finalize should succeed");

    assert!(outcome.report.bytes.starts_with(b"%PDF"), "not a PDF blob");
    assert!(outcome.report.page_count >= 1);
    assert!(outcome.report.file_name.starts_with("BarChecklist_Report_"));
    assert!(outcome.report.file_name.ends_with(".pdf"));
    assert_eq!(outcome.completed, 1);
    assert_eq!(outcome.total, before_total);
    assert!(outcome.report.skipped_photos.is_empty());

    // Successful finalization starts a fresh checklist and archives one entry.
    assert!(session.current().items.iter().all(|i| !i.done));
    assert_eq!(session.history().len(), 1);
}

#[tokio::test]
async fn overflowing_checklist_spills_onto_multiple_pages() {
    let font = skip_unless_font!();

    let template = ChecklistTemplate::with_lines(
        (1..=40).map(|i| format!("long opening task number {i} with enough words to wrap")),
    )
    .unwrap();
    let config = ReportConfig::builder().font_path(font).build().unwrap();
    let mut session = Session::open(Arc::new(MemoryStore::new()), template, config);

    let outcome = session.finalize().await.expect("finalize should succeed");
    assert!(
        outcome.report.page_count > 1,
        "40 items must not fit one page, got {}",
        outcome.report.page_count
    );
}

#[tokio::test]
async fn corrupt_stored_photo_skips_its_cell_not_the_report() {
    let font = skip_unless_font!();

    let config = ReportConfig::builder().font_path(font).build().unwrap();
    let template = ChecklistTemplate::with_lines(["single task"]).unwrap();
    let mut session = Session::open(Arc::new(MemoryStore::new()), template, config);

    // One good photo through the normal path.
    let id = session.current().id_at_order(1).unwrap();
    session
        .add_photos(
            &id,
            vec![barcheck::CapturedFile {
                name: "ok.png".into(),
                media_type: "image/png".into(),
                bytes: png_bytes(64, 64),
            }],
        )
        .await
        .unwrap();

    // And one rotten blob smuggled into the snapshot.
    let mut items = session.current().items.clone();
    items[0]
        .photos
        .push(barcheck::PhotoBlob::jpeg(vec![0xDE, 0xAD, 0xBE, 0xEF]));

    let config = ReportConfig::builder()
        .font_path(font_path().unwrap())
        .build()
        .unwrap();
    let report = generate(&session.current().id, &items, &config)
        .await
        .expect("one bad photo must not abort the report");

    assert!(report.bytes.starts_with(b"%PDF"));
    assert_eq!(report.skipped_photos.len(), 1);
}
