//! Pipeline stages for photo ingestion and report rendering.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch the PDF backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! captured file ──▶ ingest ──▶ PhotoBlob (stored on a checklist item)
//!  (bytes+mime)    (shrink+jpeg)
//!
//! snapshot ──▶ layout ──▶ pdf
//!  (items)     (pages)    (blob)
//! ```
//!
//! 1. [`ingest`] — decode, downsample to a bounded long edge, JPEG
//!    re-encode; runs under `spawn_blocking` because image codecs are
//!    CPU-bound
//! 2. [`layout`] — pure pagination: cursor-driven text flow and the photo
//!    grid over fixed A4 geometry; no font or PDF types involved, so every
//!    pagination property is unit-testable
//! 3. [`pdf`]    — the dumb end of the pipe: turn placed elements into
//!    printpdf ops with one embedded TTF and serialize

pub mod ingest;
pub mod layout;
pub mod pdf;
