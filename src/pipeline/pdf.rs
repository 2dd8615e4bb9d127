//! PDF assembly: placed layout elements → printpdf ops → document bytes.
//!
//! The deliberately dumb end of the pipeline. All decisions about where
//! things go were made in [`crate::pipeline::layout`]; this stage only
//! converts millimetre top-left coordinates into PDF's bottom-left point
//! space and emits the corresponding ops.
//!
//! One font is embedded for the whole document. There is no fallback: the
//! checklist's item titles are non-Latin, and silently substituting a
//! Latin-only builtin would produce an unreadable report, so an
//! unparseable font aborts generation before any page is written.

use std::collections::HashMap;
use std::io::Cursor;

use printpdf::font::ParsedFont;
use printpdf::graphics::{LinePoint, PaintMode, Point, Polygon, PolygonRing, WindingOrder};
use printpdf::image::RawImage;
use printpdf::matrix::TextMatrix;
use printpdf::ops::Op;
use printpdf::text::TextItem;
use printpdf::xobject::{XObject, XObjectTransform};
use printpdf::{FontId, Layer, Mm, PdfDocument, PdfPage, PdfSaveOptions, Pt, Rgb, XObjectId};
use tracing::warn;

use crate::error::BarcheckError;
use crate::pipeline::layout::{Page, PAGE_H_MM, PAGE_W_MM};

/// An embedded photo: XObject handle plus natural pixel dimensions, which
/// the scale transform is computed against (one px renders as one pt at
/// 72 dpi before scaling).
pub type EmbeddedPhoto = (XObjectId, (u32, u32));

/// Incremental PDF document writer over the laid-out pages.
#[derive(Debug)]
pub struct PdfWriter {
    document: PdfDocument,
    font: FontId,
}

impl PdfWriter {
    /// Start a document and register the report font.
    ///
    /// # Errors
    /// [`BarcheckError::FontParseFailed`] when the bytes are not a usable
    /// TrueType font.
    pub fn new(doc_title: &str, font_bytes: &[u8]) -> Result<Self, BarcheckError> {
        let mut document = PdfDocument::new(doc_title);

        let mut warnings = Vec::new();
        let parsed = ParsedFont::from_bytes(font_bytes, 0, &mut warnings).ok_or_else(|| {
            BarcheckError::FontParseFailed {
                detail: "not a parseable TrueType font".to_string(),
            }
        })?;
        let font = document.add_font(&parsed);

        Ok(Self { document, font })
    }

    /// Decode a stored photo and register it as an image XObject.
    ///
    /// Failures are returned as plain strings; the caller records them as
    /// per-photo skips rather than aborting the document.
    pub fn embed_photo(&mut self, bytes: &[u8]) -> Result<EmbeddedPhoto, String> {
        let mut warnings = Vec::new();
        let raw = RawImage::decode_from_bytes(bytes, &mut warnings).map_err(|e| e.to_string())?;
        let dims = (raw.width as u32, raw.height as u32);
        let xobj_id = XObjectId::new();
        self.document
            .resources
            .xobjects
            .map
            .insert(xobj_id.clone(), XObject::Image(raw));
        Ok((xobj_id, dims))
    }

    /// Append one laid-out page to the document.
    ///
    /// `photos` maps probe indices to embedded XObjects; a cell whose
    /// photo is missing from the map (embed failed) is skipped.
    pub fn push_page(&mut self, page: &Page, photos: &HashMap<usize, EmbeddedPhoto>) {
        let mut ops = Vec::new();

        let page_num = self.document.pages.len() + 1;
        let layer_name = format!("Page {page_num} Layer 1");
        let layer = Layer::new(&*layer_name);
        let layer_id = self.document.add_layer(&layer);
        ops.push(Op::BeginLayer { layer_id });

        // ── Text ─────────────────────────────────────────────────────────
        if !page.texts.is_empty() {
            ops.push(Op::StartTextSection);
            ops.push(Op::SetFillColor {
                col: printpdf::color::Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
            });
            let mut current_size: Option<f32> = None;
            for line in &page.texts {
                if current_size != Some(line.size_pt) {
                    ops.push(Op::SetFontSize {
                        size: Pt(line.size_pt),
                        font: self.font.clone(),
                    });
                    current_size = Some(line.size_pt);
                }
                let x = Mm(line.x_mm).into_pt();
                let y = Mm(PAGE_H_MM - line.y_mm).into_pt();
                ops.push(Op::SetTextMatrix {
                    matrix: TextMatrix::Translate(x, y),
                });
                ops.push(Op::WriteText {
                    items: vec![TextItem::Text(line.text.clone())],
                    font: self.font.clone(),
                });
            }
            ops.push(Op::EndTextSection);
        }

        // ── Separator rules (thin filled rectangles) ─────────────────────
        for rule in &page.rules {
            ops.push(Op::SetFillColor {
                col: printpdf::color::Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)),
            });
            ops.push(Op::DrawPolygon {
                polygon: filled_rect(rule.x_mm, rule.y_mm, rule.w_mm, rule.h_mm),
            });
        }

        // ── Photos ───────────────────────────────────────────────────────
        for cell in &page.photos {
            let Some((xobj_id, (px_w, px_h))) = photos.get(&cell.photo) else {
                warn!("photo {} missing from embed cache, leaving cell empty", cell.photo);
                continue;
            };
            let w_pt = Mm(cell.w_mm).into_pt().0;
            let h_pt = Mm(cell.h_mm).into_pt().0;
            let transform = XObjectTransform {
                translate_x: Some(Mm(cell.x_mm).into_pt()),
                translate_y: Some(Mm(PAGE_H_MM - (cell.y_mm + cell.h_mm)).into_pt()),
                scale_x: Some(w_pt / *px_w as f32),
                scale_y: Some(h_pt / *px_h as f32),
                rotate: None,
                dpi: Some(72.0),
            };
            ops.push(Op::UseXobject {
                id: xobj_id.clone(),
                transform,
            });
        }

        let pdf_page = PdfPage::new(Mm(PAGE_W_MM), Mm(PAGE_H_MM), ops);
        self.document.pages.push(pdf_page);
    }

    /// Serialize the accumulated pages into the final byte blob.
    pub fn finish(mut self) -> Vec<u8> {
        let mut warnings = Vec::new();
        let mut cursor = Cursor::new(Vec::new());
        self.document
            .save_writer(&mut cursor, &PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            warn!("pdf writer reported {} warnings", warnings.len());
        }
        cursor.into_inner()
    }
}

/// Axis-aligned filled rectangle from top-left mm coordinates, converted
/// to PDF's bottom-left origin.
fn filled_rect(x_mm: f32, y_mm: f32, w_mm: f32, h_mm: f32) -> Polygon {
    let x0 = Mm(x_mm).into_pt().0;
    let x1 = Mm(x_mm + w_mm).into_pt().0;
    let y0 = Mm(PAGE_H_MM - (y_mm + h_mm)).into_pt().0;
    let y1 = Mm(PAGE_H_MM - y_mm).into_pt().0;
    let corner = |x: f32, y: f32| LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    };
    Polygon {
        rings: vec![PolygonRing {
            points: vec![
                corner(x0, y0),
                corner(x1, y0),
                corner(x1, y1),
                corner(x0, y1),
            ],
        }],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::EvenOdd,
    }
}
