//! # barcheck
//!
//! The core of a client-side bar-opening checklist app: an ordered task
//! list with photo evidence and notes per task, finalized into a paginated
//! A4 PDF report, with state mirrored to a local key-value store.
//!
//! ## Why this crate?
//!
//! Checklist CRUD is easy; the part worth a library is the reporting
//! pipeline — compressing camera photos to a bounded size before they are
//! stored inline, and laying text plus a photo grid out across paginated
//! pages with an embedded font that can render non-Latin task titles.
//! Everything around it (UI, navigation, share sheet, file picker) stays
//! outside: the crate takes bytes in and hands a named byte blob back.
//!
//! ## Pipeline Overview
//!
//! ```text
//! photo bytes
//!  │
//!  ├─ 1. Ingest    decode, bound long edge to 1280 px, JPEG re-encode
//!  └─ 2. Store     PhotoBlob on a ChecklistItem (≤ 4 per item)
//!
//! finalize
//!  │
//!  ├─ 3. Archive   snapshot → history (≤ 5 entries, oldest evicted)
//!  ├─ 4. Layout    cursor-driven A4 pagination (pure, CPU only)
//!  ├─ 5. Assemble  printpdf ops, one embedded TTF, photo XObjects
//!  └─ 6. Output    ReportDocument { "BarChecklist_Report_<date>.pdf", bytes }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use barcheck::{ChecklistTemplate, MemoryStore, ReportConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = Session::open(
//!         Arc::new(MemoryStore::new()),
//!         ChecklistTemplate::default(),
//!         ReportConfig::default(),
//!     );
//!
//!     let id = session.current().id_at_order(1)?;
//!     session.set_done(&id, true)?;
//!
//!     let outcome = session.finalize().await?;
//!     println!(
//!         "{}: {} pages, {}/{} done",
//!         outcome.report.file_name,
//!         outcome.report.page_count,
//!         outcome.completed,
//!         outcome.total
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `barcheck` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! barcheck = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod session;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{FontSource, ReportConfig, ReportConfigBuilder};
pub use error::{BarcheckError, PhotoError, StoreError};
pub use model::{
    Checklist, ChecklistItem, ChecklistTemplate, HistoryEntry, PhotoBlob, HISTORY_CAP,
    MAX_PHOTOS_PER_ITEM,
};
pub use pipeline::ingest::{CapturedFile, IngestReport};
pub use progress::{NoopProgressCallback, ProgressCallback, ReportProgressCallback};
pub use report::{generate, write_to_dir, ReportDocument};
pub use session::{AddPhotosOutcome, FinalizeOutcome, GenerationState, Session};
pub use store::{DirStore, MemoryStore, StateStore, CURRENT_KEY, HISTORY_KEY};
