//! Per-card style store — durable key-value persistence for dashboard cards.
//!
//! Each card on the dashboard can be customized (colors, font size, content
//! offset). Records are stored one per card under a namespaced string key and
//! written back in full after every field change. The backend is an injectable
//! capability so the store logic is testable without a real database.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key namespace prefix for card style records.
const KEY_PREFIX: &str = "finboard-card";

/// Current schema version for stored [`CardStyle`] records.
/// Records with a different version are discarded and replaced by defaults.
pub const STYLE_SCHEMA: u32 = 1;

/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE: u32 = 16;

const MIN_FONT_SIZE: u32 = 8;
const MAX_FONT_SIZE: u32 = 96;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// Visual customization for one dashboard card.
///
/// Offsets are percentages of the card size in [-100, 100]. Color fields are
/// CSS-style strings left opaque to the core; `None` means "use the theme".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStyle {
    #[serde(default)]
    pub background: Option<String>,

    #[serde(default)]
    pub text_color: Option<String>,

    #[serde(default = "default_font_size")]
    pub font_size_px: u32,

    #[serde(default)]
    pub offset_x_pct: i32,

    #[serde(default)]
    pub offset_y_pct: i32,

    #[serde(default)]
    pub schema: u32,
}

fn default_font_size() -> u32 {
    DEFAULT_FONT_SIZE
}

impl Default for CardStyle {
    fn default() -> Self {
        CardStyle {
            background: None,
            text_color: None,
            font_size_px: DEFAULT_FONT_SIZE,
            offset_x_pct: 0,
            offset_y_pct: 0,
            schema: STYLE_SCHEMA,
        }
    }
}

impl CardStyle {
    /// Range-check a stored record. Deserialized data is not trusted.
    fn is_valid(&self) -> bool {
        self.schema == STYLE_SCHEMA
            && (MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size_px)
            && (-100..=100).contains(&self.offset_x_pct)
            && (-100..=100).contains(&self.offset_y_pct)
    }
}

/// A single field change to a card's style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleField {
    Background(Option<String>),
    TextColor(Option<String>),
    FontSize(u32),
    OffsetX(i32),
    OffsetY(i32),
}

impl StyleField {
    fn validate(&self) -> Result<(), StoreError> {
        match self {
            StyleField::FontSize(px) if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(px) => {
                Err(StoreError::InvalidValue {
                    field: "font_size_px",
                    reason: format!("{} outside {}..={}", px, MIN_FONT_SIZE, MAX_FONT_SIZE),
                })
            }
            StyleField::OffsetX(pct) if !(-100..=100).contains(pct) => {
                Err(StoreError::InvalidValue {
                    field: "offset_x_pct",
                    reason: format!("{} outside -100..=100", pct),
                })
            }
            StyleField::OffsetY(pct) if !(-100..=100).contains(pct) => {
                Err(StoreError::InvalidValue {
                    field: "offset_y_pct",
                    reason: format!("{} outside -100..=100", pct),
                })
            }
            _ => Ok(()),
        }
    }

    fn apply(self, style: &mut CardStyle) {
        match self {
            StyleField::Background(c) => style.background = c,
            StyleField::TextColor(c) => style.text_color = c,
            StyleField::FontSize(px) => style.font_size_px = px,
            StyleField::OffsetX(pct) => style.offset_x_pct = pct,
            StyleField::OffsetY(pct) => style.offset_y_pct = pct,
        }
    }
}

// ============================================================================
// Storage backend
// ============================================================================

/// Generic get/set/remove over string keys and string values.
///
/// The service uses a sled-backed implementation; tests use the in-memory
/// double. Single-key reads and writes are atomic; nothing spans keys.
pub trait KvBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Durable backend over a sled tree.
#[derive(Debug, Clone)]
pub struct SledBackend {
    db: sled::Db,
}

impl SledBackend {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        Ok(SledBackend { db })
    }
}

impl KvBackend for SledBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self.db.get(key.as_bytes())? {
            Some(raw) => match String::from_utf8(raw.to_vec()) {
                Ok(value) => Ok(Some(value)),
                Err(_) => {
                    log::warn!("⚠ Non-UTF8 value under {}, discarding", key);
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.db.insert(key.as_bytes(), value.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.db.remove(key.as_bytes())?;
        self.db.flush()?;
        Ok(())
    }
}

/// In-memory backend for tests and degraded startup.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The map holds plain strings, so a panic mid-write cannot leave it
    /// torn — a poisoned guard is safe to recover.
    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.map.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KvBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.map().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.map().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.map().remove(key);
        Ok(())
    }
}

// ============================================================================
// Card store
// ============================================================================

/// Style records keyed by card identifier.
pub struct CardStore {
    backend: std::sync::Arc<dyn KvBackend>,
}

fn style_key(card_id: &str) -> String {
    format!("{}-{}", KEY_PREFIX, card_id)
}

impl CardStore {
    pub fn new(backend: std::sync::Arc<dyn KvBackend>) -> Self {
        CardStore { backend }
    }

    /// Load the style for a card, or the default record if none is stored.
    ///
    /// Malformed, out-of-range, or wrong-schema records are discarded with a
    /// warning rather than trusted.
    pub fn load(&self, card_id: &str) -> Result<CardStyle, StoreError> {
        let key = style_key(card_id);
        match self.backend.get(&key)? {
            Some(raw) => match serde_json::from_str::<CardStyle>(&raw) {
                Ok(style) if style.is_valid() => Ok(style),
                Ok(_) => {
                    log::warn!("⚠ Stored style for {} failed validation, using defaults", card_id);
                    Ok(CardStyle::default())
                }
                Err(e) => {
                    log::warn!("⚠ Corrupt style record for {}: {} — using defaults", card_id, e);
                    Ok(CardStyle::default())
                }
            },
            None => Ok(CardStyle::default()),
        }
    }

    /// Merge one field into the card's record and persist it.
    ///
    /// Exactly one write per call, last-write-wins. Returns the updated record.
    pub fn update(&self, card_id: &str, field: StyleField) -> Result<CardStyle, StoreError> {
        field.validate()?;
        let mut style = self.load(card_id)?;
        field.apply(&mut style);
        self.persist(card_id, &style)?;
        Ok(style)
    }

    /// Write the default record back. Idempotent.
    pub fn reset(&self, card_id: &str) -> Result<CardStyle, StoreError> {
        let style = CardStyle::default();
        self.persist(card_id, &style)?;
        Ok(style)
    }

    fn persist(&self, card_id: &str, style: &CardStyle) -> Result<(), StoreError> {
        let raw = serde_json::to_string(style)?;
        self.backend.set(&style_key(card_id), &raw)
    }
}
