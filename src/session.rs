//! The checklist session: singleton current checklist, bounded history,
//! store synchronisation and the single-in-flight generation guard.
//!
//! ## Persistence model
//!
//! The session reads both store keys once at startup and writes the
//! affected key after every mutation. Reads that fail or deserialize to
//! garbage fall back to defaults; writes that fail are logged and dropped.
//! Either way the in-memory state is the source of truth for the session —
//! the store is a best-effort mirror, exactly the durability the local
//! device store offers and no more.
//!
//! ## Generation guard
//!
//! Report generation is guarded by an explicit two-state machine instead
//! of a boolean: [`GenerationState::Idle`] ⇄ [`GenerationState::Generating`].
//! A second request while `Generating` is rejected with
//! [`BarcheckError::GenerationInFlight`] (never queued). The transition
//! back to `Idle` rides an RAII token, so every exit path — success, font
//! failure, worker panic unwind — releases the guard.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::ReportConfig;
use crate::error::{BarcheckError, PhotoError, StoreError};
use crate::model::{
    push_history, Checklist, ChecklistTemplate, HistoryEntry,
};
use crate::pipeline::ingest::{self, CapturedFile};
use crate::report::{self, ReportDocument};
use crate::store::{StateStore, CURRENT_KEY, HISTORY_KEY};

// ── Generation guard ─────────────────────────────────────────────────────

/// Where report generation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationState {
    Idle,
    Generating,
}

#[derive(Debug)]
struct GenerationGuard {
    state: Mutex<GenerationState>,
}

impl GenerationGuard {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(GenerationState::Idle),
        })
    }

    fn state(&self) -> GenerationState {
        *self.state.lock().expect("generation guard mutex")
    }

    /// Move `Idle` → `Generating`, or reject if already generating.
    fn try_begin(self: Arc<Self>) -> Result<GenerationToken, BarcheckError> {
        {
            let mut state = self.state.lock().expect("generation guard mutex");
            match *state {
                GenerationState::Generating => return Err(BarcheckError::GenerationInFlight),
                GenerationState::Idle => *state = GenerationState::Generating,
            }
        }
        Ok(GenerationToken { guard: self })
    }
}

/// RAII token holding the guard in `Generating`; dropping it returns the
/// machine to `Idle` on every exit path.
struct GenerationToken {
    guard: Arc<GenerationGuard>,
}

impl Drop for GenerationToken {
    fn drop(&mut self) {
        *self.guard.state.lock().expect("generation guard mutex") = GenerationState::Idle;
    }
}

// ── Outcomes ─────────────────────────────────────────────────────────────

/// Result of adding a photo batch to an item.
#[derive(Debug)]
pub struct AddPhotosOutcome {
    /// Photos stored on the item.
    pub added: usize,
    /// Compressed fine but dropped because the item was at the cap.
    pub dropped_over_cap: usize,
    /// Files that never became photos, with reasons.
    pub skipped: Vec<PhotoError>,
}

/// Result of finalizing the current checklist.
#[derive(Debug)]
pub struct FinalizeOutcome {
    pub report: ReportDocument,
    pub completed: usize,
    pub total: usize,
}

// ── Session ──────────────────────────────────────────────────────────────

/// Process-wide checklist state: one current checklist, one history list.
pub struct Session {
    store: Arc<dyn StateStore>,
    template: ChecklistTemplate,
    config: ReportConfig,
    current: Checklist,
    history: Vec<HistoryEntry>,
    generation: Arc<GenerationGuard>,
}

impl Session {
    /// Open a session against the store, falling back to a fresh checklist
    /// and empty history when keys are absent or corrupt.
    pub fn open(
        store: Arc<dyn StateStore>,
        template: ChecklistTemplate,
        config: ReportConfig,
    ) -> Self {
        let current = match load_json::<Checklist>(store.as_ref(), CURRENT_KEY) {
            Some(checklist) => checklist,
            None => {
                info!("no usable checklist in store, starting fresh from template");
                Checklist::from_template(&template)
            }
        };
        let history = load_json::<Vec<HistoryEntry>>(store.as_ref(), HISTORY_KEY)
            .unwrap_or_default();

        let session = Self {
            store,
            template,
            config,
            current,
            history,
            generation: GenerationGuard::new(),
        };
        // Mirror whatever we ended up with, so a fresh checklist survives
        // an immediate restart.
        session.persist_current();
        session
    }

    pub fn current(&self) -> &Checklist {
        &self.current
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn template(&self) -> &ChecklistTemplate {
        &self.template
    }

    pub fn generation_state(&self) -> GenerationState {
        self.generation.state()
    }

    /// Replace the template used for future checklists. The current
    /// checklist is deliberately left untouched.
    pub fn set_template(&mut self, template: ChecklistTemplate) {
        self.template = template;
    }

    // ── Mutations ────────────────────────────────────────────────────────

    /// Throw away the current checklist and start fresh from the template.
    pub fn reset(&mut self) {
        if let Err(e) = self.store.remove(CURRENT_KEY) {
            warn!("store remove failed for '{CURRENT_KEY}': {e}");
        }
        self.current = Checklist::from_template(&self.template);
        self.persist_current();
    }

    /// Append a custom item; returns its id.
    pub fn add_item(&mut self, title: impl Into<String>) -> String {
        let id = self.current.add_item(title).id.clone();
        self.persist_current();
        id
    }

    pub fn remove_item(&mut self, id: &str) -> Result<(), BarcheckError> {
        self.current.remove_item(id)?;
        self.persist_current();
        Ok(())
    }

    pub fn set_done(&mut self, id: &str, done: bool) -> Result<(), BarcheckError> {
        self.current.set_done(id, done)?;
        self.persist_current();
        Ok(())
    }

    pub fn set_note(&mut self, id: &str, note: impl Into<String>) -> Result<(), BarcheckError> {
        self.current.set_note(id, note)?;
        self.persist_current();
        Ok(())
    }

    pub fn remove_photo(&mut self, id: &str, slot: usize) -> Result<(), BarcheckError> {
        self.current.remove_photo(id, slot)?;
        self.persist_current();
        Ok(())
    }

    /// Ingest a batch of captured files and attach the survivors to an
    /// item. Per-file failures are reported, not fatal.
    pub async fn add_photos(
        &mut self,
        id: &str,
        files: Vec<CapturedFile>,
    ) -> Result<AddPhotosOutcome, BarcheckError> {
        // Validate the target before paying for compression.
        if !self.current.items.iter().any(|i| i.id == id) {
            return Err(BarcheckError::ItemNotFound { id: id.to_string() });
        }

        let ingested = ingest::ingest_batch(files, &self.config).await?;
        let addition = self.current.add_photos(id, ingested.photos)?;
        if addition.added > 0 {
            self.persist_current();
        }

        Ok(AddPhotosOutcome {
            added: addition.added,
            dropped_over_cap: addition.dropped_over_cap,
            skipped: ingested.skipped,
        })
    }

    // ── Finalize and history ─────────────────────────────────────────────

    /// Archive the current checklist, generate its report, and on success
    /// start a fresh checklist from the template.
    ///
    /// On generation failure the archived entry is kept (the snapshot was
    /// real), the current checklist survives untouched, and the guard is
    /// released for the next attempt.
    pub async fn finalize(&mut self) -> Result<FinalizeOutcome, BarcheckError> {
        let _token = Arc::clone(&self.generation).try_begin()?;

        let entry = HistoryEntry::from_checklist(&self.current, Utc::now());
        let (completed, total) = (entry.completed, entry.total);
        info!(
            "finalizing checklist {}: {completed}/{total} done",
            entry.id
        );

        push_history(&mut self.history, entry);
        self.persist_history();

        let snapshot = self.history[0].clone();
        let report = report::generate(&snapshot.id, &snapshot.items, &self.config).await?;

        self.current = Checklist::from_template(&self.template);
        self.persist_current();

        Ok(FinalizeOutcome {
            report,
            completed,
            total,
        })
    }

    /// Regenerate the PDF for an archived entry (most recent first).
    pub async fn render_history_entry(
        &self,
        index: usize,
    ) -> Result<ReportDocument, BarcheckError> {
        let _token = Arc::clone(&self.generation).try_begin()?;

        let entry = self
            .history
            .get(index)
            .ok_or(BarcheckError::HistoryEntryNotFound {
                index,
                total: self.history.len(),
            })?;
        report::generate(&entry.id, &entry.items, &self.config).await
    }

    /// Reopen an archived entry as the current checklist. Item ids are
    /// regenerated; everything else is preserved verbatim.
    pub fn restore(&mut self, index: usize) -> Result<(), BarcheckError> {
        let entry = self
            .history
            .get(index)
            .ok_or(BarcheckError::HistoryEntryNotFound {
                index,
                total: self.history.len(),
            })?;
        self.current = entry.restore();
        self.persist_current();
        Ok(())
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        self.persist_history();
    }

    // ── Store mirroring ──────────────────────────────────────────────────

    fn persist_current(&self) {
        save_json(self.store.as_ref(), CURRENT_KEY, &self.current);
    }

    fn persist_history(&self) {
        save_json(self.store.as_ref(), HISTORY_KEY, &self.history);
    }
}

/// Read and deserialize a key; any failure becomes `None` with a log line.
fn load_json<T: serde::de::DeserializeOwned>(store: &dyn StateStore, key: &str) -> Option<T> {
    let bytes = match store.get(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            warn!("store read failed, using defaults: {e}");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            let e = StoreError::Corrupt {
                key: key.to_string(),
                source: e,
            };
            warn!("{e}; using defaults");
            None
        }
    }
}

/// Serialize and write a key; failures are logged, never propagated.
fn save_json<T: serde::Serialize>(store: &dyn StateStore, key: &str, value: &T) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            let e = StoreError::Serialize {
                key: key.to_string(),
                source: e,
            };
            warn!("{e}; state not persisted");
            return;
        }
    };
    match store.put(key, &bytes) {
        Ok(()) => debug!("persisted '{key}' ({} bytes)", bytes.len()),
        Err(e) => warn!("store write failed for '{key}', keeping in-memory state: {e}"),
    }
}
