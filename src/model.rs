//! Checklist data model: items, the active checklist, archived history
//! entries and the template used to seed new checklists.
//!
//! Everything here is plain serde-serializable data plus the small set of
//! mutations the editing surface needs. Photo bytes are held inline as
//! [`PhotoBlob`]s (base64 in the JSON form) so a persisted checklist is a
//! single self-contained document with no references to files that may
//! have disappeared by the next launch.
//!
//! Invariants maintained by the mutation methods:
//! * `order` values within a checklist are exactly `1..=N`, renumbered on
//!   every removal.
//! * An item never stores more than [`MAX_PHOTOS_PER_ITEM`] photos; extra
//!   additions are dropped, keeping the first four in insertion order.
//! * Restoring an archived entry regenerates item ids while preserving
//!   titles, notes, photos and order verbatim.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BarcheckError;

/// Hard cap on stored photos per checklist item.
pub const MAX_PHOTOS_PER_ITEM: usize = 4;

/// Hard cap on archived history entries; the oldest is evicted beyond it.
pub const HISTORY_CAP: usize = 5;

/// Default bar-opening task list, used when no custom template is set.
pub const DEFAULT_TEMPLATE_LINES: [&str; 10] = [
    "Оборудование включено и исправно; журнал температур заполнен",
    "Чистота стойки, раковин и поверхностей; мусор вынесен",
    "Стекло/посуда доведены до пар-уровней",
    "Станция укомплектована: трубочки/салфетки/гарниры/сиропы",
    "Заготовки и полуфабрикаты дозатарены по пар-уровням",
    "Кофе прогрет и откалиброван; молоко/сливки свежие",
    "Лёд ≥ 70% бункера; резервные вёдра заполнены",
    "Стоп-лист обновлён; заказ по бару отправлен",
    "Касса/терминал проверены; лента и зип-пакеты есть",
    "Бар готов за 10 минут до открытия: свет/музыка/форма",
];

/// Generate an opaque random identifier (16 alphanumeric chars).
pub(crate) fn new_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

// ── Photo blob ───────────────────────────────────────────────────────────

/// A compressed, self-contained photo attached to a checklist item.
///
/// Produced by [`crate::pipeline::ingest::compress`]; independent of the
/// original file's lifetime. Serializes its bytes as base64 so persisted
/// checklists remain valid JSON documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoBlob {
    /// MIME type of `data`, `image/jpeg` for everything the ingestion
    /// pipeline produces.
    pub mime: String,
    /// Encoded image bytes.
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

impl PhotoBlob {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            mime: "image/jpeg".to_string(),
            data,
        }
    }
}

/// Serde adapter: `Vec<u8>` ⇄ base64 string.
mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s.as_bytes()).map_err(serde::de::Error::custom)
    }
}

// ── Checklist item ───────────────────────────────────────────────────────

/// One task on the checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub title: String,
    pub done: bool,
    pub note: String,
    pub photos: Vec<PhotoBlob>,
    /// 1-based position; contiguous within a checklist.
    pub order: u32,
}

impl ChecklistItem {
    pub fn new(title: impl Into<String>, order: u32) -> Self {
        Self {
            id: new_id(),
            title: title.into(),
            done: false,
            note: String::new(),
            photos: Vec::new(),
            order,
        }
    }
}

// ── Template ─────────────────────────────────────────────────────────────

/// The item list a fresh checklist is created from.
///
/// An explicit value passed into checklist creation; updating it produces
/// a new template rather than mutating shared state, so the active
/// checklist is never changed retroactively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistTemplate {
    lines: Vec<String>,
}

impl Default for ChecklistTemplate {
    fn default() -> Self {
        Self {
            lines: DEFAULT_TEMPLATE_LINES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ChecklistTemplate {
    /// Build a template from raw lines; blank lines are dropped.
    ///
    /// # Errors
    /// [`BarcheckError::EmptyTemplate`] when no non-blank line remains.
    pub fn with_lines<I, S>(lines: I) -> Result<Self, BarcheckError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(BarcheckError::EmptyTemplate);
        }
        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

// ── Checklist ────────────────────────────────────────────────────────────

/// The active, editable set of ordered tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ChecklistItem>,
}

/// Outcome of adding a batch of photos to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoAddition {
    /// Photos actually stored on the item.
    pub added: usize,
    /// Photos dropped because the item was already at the cap.
    pub dropped_over_cap: usize,
}

impl Checklist {
    /// A fresh checklist seeded from the template, all items unchecked.
    pub fn from_template(template: &ChecklistTemplate) -> Self {
        Self {
            id: new_id(),
            created_at: Utc::now(),
            items: template
                .lines()
                .iter()
                .enumerate()
                .map(|(idx, title)| ChecklistItem::new(title, idx as u32 + 1))
                .collect(),
        }
    }

    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|i| i.done).count()
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    /// Resolve a 1-based position to the item's id.
    pub fn id_at_order(&self, order: u32) -> Result<String, BarcheckError> {
        self.items
            .iter()
            .find(|i| i.order == order)
            .map(|i| i.id.clone())
            .ok_or(BarcheckError::OrderOutOfRange {
                order,
                total: self.items.len(),
            })
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut ChecklistItem, BarcheckError> {
        self.items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| BarcheckError::ItemNotFound { id: id.to_string() })
    }

    /// Append a custom item at the end of the list.
    pub fn add_item(&mut self, title: impl Into<String>) -> &ChecklistItem {
        let order = self.items.len() as u32 + 1;
        self.items.push(ChecklistItem::new(title, order));
        self.items.last().expect("just pushed")
    }

    /// Remove an item and renumber the remainder to `1..=N-1`.
    pub fn remove_item(&mut self, id: &str) -> Result<(), BarcheckError> {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() == before {
            return Err(BarcheckError::ItemNotFound { id: id.to_string() });
        }
        for (idx, item) in self.items.iter_mut().enumerate() {
            item.order = idx as u32 + 1;
        }
        Ok(())
    }

    pub fn set_done(&mut self, id: &str, done: bool) -> Result<(), BarcheckError> {
        self.item_mut(id)?.done = done;
        Ok(())
    }

    pub fn set_note(&mut self, id: &str, note: impl Into<String>) -> Result<(), BarcheckError> {
        self.item_mut(id)?.note = note.into();
        Ok(())
    }

    /// Attach photos to an item, keeping at most the first
    /// [`MAX_PHOTOS_PER_ITEM`] in insertion order. Storing at least one
    /// photo also marks the item done (photo evidence implies completion).
    pub fn add_photos(
        &mut self,
        id: &str,
        photos: Vec<PhotoBlob>,
    ) -> Result<PhotoAddition, BarcheckError> {
        let item = self.item_mut(id)?;
        let room = MAX_PHOTOS_PER_ITEM.saturating_sub(item.photos.len());
        let added = photos.len().min(room);
        let dropped_over_cap = photos.len() - added;
        item.photos.extend(photos.into_iter().take(added));
        if added > 0 {
            item.done = true;
        }
        Ok(PhotoAddition {
            added,
            dropped_over_cap,
        })
    }

    pub fn remove_photo(&mut self, id: &str, slot: usize) -> Result<(), BarcheckError> {
        let item = self.item_mut(id)?;
        if slot >= item.photos.len() {
            return Err(BarcheckError::PhotoSlotOutOfRange {
                order: item.order,
                slot,
            });
        }
        item.photos.remove(slot);
        Ok(())
    }
}

// ── History ──────────────────────────────────────────────────────────────

/// An immutable archived snapshot of a finalized checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub finalized_at: DateTime<Utc>,
    pub items: Vec<ChecklistItem>,
    pub completed: usize,
    pub total: usize,
}

impl HistoryEntry {
    /// Snapshot the checklist at finalization time.
    pub fn from_checklist(checklist: &Checklist, finalized_at: DateTime<Utc>) -> Self {
        Self {
            id: checklist.id.clone(),
            created_at: checklist.created_at,
            finalized_at,
            items: checklist.items.clone(),
            completed: checklist.completed_count(),
            total: checklist.total_count(),
        }
    }

    /// Reopen the archived snapshot as the active checklist.
    ///
    /// Item ids are regenerated so the restored items can never collide
    /// with ids handed out since; everything else is preserved verbatim.
    pub fn restore(&self) -> Checklist {
        Checklist {
            id: self.id.clone(),
            created_at: self.created_at,
            items: self
                .items
                .iter()
                .map(|item| ChecklistItem {
                    id: new_id(),
                    ..item.clone()
                })
                .collect(),
        }
    }
}

/// Push an entry onto the front of the history, evicting past the cap.
pub fn push_history(history: &mut Vec<HistoryEntry>, entry: HistoryEntry) {
    history.insert(0, entry);
    history.truncate(HISTORY_CAP);
}
