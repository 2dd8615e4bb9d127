//! Pure report layout: paginate a checklist snapshot over A4 pages.
//!
//! This stage knows nothing about fonts or PDF objects. It walks the
//! snapshot with a single vertical cursor, word-wraps item text to the
//! printable width, flows the photo grid, and emits placed elements in
//! millimetre page coordinates (origin top-left). The PDF stage then maps
//! those onto drawing ops. Keeping layout free of the PDF backend means
//! every pagination guarantee — nothing clipped, every item exactly once,
//! original order preserved — is an ordinary unit test.
//!
//! Text measurement is an approximation: a fixed per-glyph advance scaled
//! from the font size. That over-estimates narrow Latin text and slightly
//! under-estimates wide glyphs, which errs toward wrapping early — lines
//! never overrun the printable width in practice.

use crate::model::ChecklistItem;
use crate::progress::ReportProgressCallback;

// A4 portrait geometry, all in millimetres.
pub const PAGE_W_MM: f32 = 210.0;
pub const PAGE_H_MM: f32 = 297.0;
pub const MARGIN_MM: f32 = 12.0;

// Photo grid: two columns of fixed-height cells.
pub const GRID_COLS: usize = 2;
pub const GRID_GAP_MM: f32 = 4.0;
pub const CELL_H_MM: f32 = 70.0;
pub const CELL_W_MM: f32 = (PAGE_W_MM - MARGIN_MM * 2.0 - GRID_GAP_MM) / 2.0;

// Type sizes (points) and vertical rhythm (millimetres).
pub const TITLE_SIZE_PT: f32 = 16.0;
pub const META_SIZE_PT: f32 = 11.0;
pub const BODY_SIZE_PT: f32 = 12.0;
const TITLE_STEP_MM: f32 = 8.0;
const META_STEP_MM: f32 = 6.0;
const LINE_STEP_MM: f32 = 6.0;
const RULE_STEP_MM: f32 = 4.0;
const RULE_THICKNESS_MM: f32 = 0.2;
const NO_PHOTO_STEP_MM: f32 = 2.0;
const PARTIAL_ROW_STEP_MM: f32 = 2.0;

const PT_TO_MM: f32 = 0.352_778;

/// A line of text placed at a baseline position.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub x_mm: f32,
    /// Baseline y, measured from the page top.
    pub y_mm: f32,
    pub size_pt: f32,
    pub text: String,
}

/// A photo scaled into its grid cell. `photo` indexes the probe list the
/// caller supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoCell {
    pub photo: usize,
    pub x_mm: f32,
    /// Top edge of the drawn image, from the page top.
    pub y_mm: f32,
    pub w_mm: f32,
    pub h_mm: f32,
}

/// A horizontal separator rule, drawn as a thin filled rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub x_mm: f32,
    pub y_mm: f32,
    pub w_mm: f32,
    pub h_mm: f32,
}

/// One laid-out page.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub texts: Vec<TextLine>,
    pub photos: Vec<PhotoCell>,
    pub rules: Vec<Rule>,
}

/// Natural pixel dimensions of a stored photo, discovered by decoding it
/// before layout. Photos that fail to decode never reach this list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbedPhoto {
    /// Index into the caller's photo table; echoed back via [`PhotoCell::photo`].
    pub index: usize,
    /// Owning item's 1-based position.
    pub item_order: u32,
    /// 0-based slot within the item.
    pub slot: usize,
    pub px_w: u32,
    pub px_h: u32,
}

/// Scale `(w, h)` to fit within `(max_w, max_h)` preserving aspect ratio.
fn fit_within(w: f32, h: f32, max_w: f32, max_h: f32) -> (f32, f32) {
    let k = (max_w / w).min(max_h / h);
    (w * k, h * k)
}

fn approx_glyph_advance_mm(size_pt: f32) -> f32 {
    size_pt * PT_TO_MM * 0.55
}

/// Greedy word wrap against the approximate glyph advance.
///
/// Paragraph breaks (`\n`) are honoured; a word longer than the width gets
/// a line of its own rather than being split mid-word.
pub fn wrap_text(text: &str, size_pt: f32, max_w_mm: f32) -> Vec<String> {
    let glyph_w = approx_glyph_advance_mm(size_pt);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        if paragraph.trim().is_empty() {
            continue;
        }
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            let width = candidate.chars().count() as f32 * glyph_w;
            if width > max_w_mm && !current.is_empty() {
                lines.push(current);
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

/// Cursor-driven page builder.
struct PageCursor {
    pages: Vec<Page>,
    y_mm: f32,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            y_mm: MARGIN_MM,
        }
    }

    fn page(&mut self) -> &mut Page {
        self.pages.last_mut().expect("at least one page")
    }

    fn break_page(&mut self) {
        self.pages.push(Page::default());
        self.y_mm = MARGIN_MM;
    }

    /// Bottom boundary: content may sit at the margin line, not below it.
    fn past_bottom(&self) -> bool {
        self.y_mm > PAGE_H_MM - MARGIN_MM
    }

    fn text(&mut self, x_mm: f32, size_pt: f32, text: String) {
        let y_mm = self.y_mm;
        self.page().texts.push(TextLine {
            x_mm,
            y_mm,
            size_pt,
            text,
        });
    }
}

/// Lay out the full report: header, one block per item in ascending
/// `order`, photo grids, separator rules.
///
/// `meta_lines` follow the title (timestamp, checklist id). `photos`
/// carries the probed dimensions of every decodable stored photo.
pub fn layout_report(
    title: &str,
    meta_lines: &[String],
    items: &[ChecklistItem],
    photos: &[ProbedPhoto],
    progress: Option<&dyn ReportProgressCallback>,
) -> Vec<Page> {
    let mut cursor = PageCursor::new();
    let printable_w = PAGE_W_MM - MARGIN_MM * 2.0;

    // ── Header ───────────────────────────────────────────────────────────
    cursor.text(MARGIN_MM, TITLE_SIZE_PT, title.to_string());
    cursor.y_mm += TITLE_STEP_MM;

    for (i, line) in meta_lines.iter().enumerate() {
        cursor.text(MARGIN_MM, META_SIZE_PT, line.clone());
        cursor.y_mm += if i + 1 == meta_lines.len() {
            TITLE_STEP_MM
        } else {
            META_STEP_MM
        };
    }

    // ── Items, ascending order ───────────────────────────────────────────
    let mut ordered: Vec<&ChecklistItem> = items.iter().collect();
    ordered.sort_by_key(|i| i.order);
    let total = ordered.len();

    for item in ordered {
        let status = if item.done { "Done" } else { "Not done" };
        let mut composed = format!("{}. {} [{}]", item.order, item.title, status);
        if !item.note.is_empty() {
            composed.push('\n');
            composed.push_str("Заметка: ");
            composed.push_str(&item.note);
        }

        for line in wrap_text(&composed, BODY_SIZE_PT, printable_w) {
            if cursor.past_bottom() {
                cursor.break_page();
            }
            cursor.text(MARGIN_MM, BODY_SIZE_PT, line);
            cursor.y_mm += LINE_STEP_MM;
        }

        // ── Photo grid ───────────────────────────────────────────────────
        let mut cells: Vec<&ProbedPhoto> =
            photos.iter().filter(|p| p.item_order == item.order).collect();
        cells.sort_by_key(|p| p.slot);

        if cells.is_empty() {
            cursor.y_mm += NO_PHOTO_STEP_MM;
        } else {
            let mut col = 0usize;
            for probe in cells {
                if cursor.y_mm + CELL_H_MM > PAGE_H_MM - MARGIN_MM {
                    cursor.break_page();
                    col = 0;
                }
                let (w, h) =
                    fit_within(probe.px_w as f32, probe.px_h as f32, CELL_W_MM, CELL_H_MM);
                let cell_x = MARGIN_MM + col as f32 * (CELL_W_MM + GRID_GAP_MM);
                let centred_x = cell_x + (CELL_W_MM - w) / 2.0;
                let y_mm = cursor.y_mm;
                cursor.page().photos.push(PhotoCell {
                    photo: probe.index,
                    x_mm: centred_x,
                    y_mm,
                    w_mm: w,
                    h_mm: h,
                });

                col += 1;
                if col >= GRID_COLS {
                    col = 0;
                    cursor.y_mm += CELL_H_MM + GRID_GAP_MM;
                }
            }
            if col != 0 {
                cursor.y_mm += CELL_H_MM + PARTIAL_ROW_STEP_MM;
            }
        }

        // ── Separator rule ───────────────────────────────────────────────
        if cursor.past_bottom() {
            cursor.break_page();
        }
        let y_mm = cursor.y_mm;
        cursor.page().rules.push(Rule {
            x_mm: MARGIN_MM,
            y_mm,
            w_mm: printable_w,
            h_mm: RULE_THICKNESS_MM,
        });
        cursor.y_mm += RULE_STEP_MM;

        if let Some(cb) = progress {
            cb.on_item_rendered(item.order, total);
        }
    }

    cursor.pages
}
