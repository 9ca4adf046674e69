//! finboard — headless core for a personal-finance dashboard.
//!
//! The crate is split the same way the app is: a background service task
//! ([`service::run`]) owns all persistence, timers, and network I/O, and
//! talks to the render loop exclusively through [`events::UiEvent`] /
//! [`events::ServiceEvent`] channels. [`state::AppState`] folds service
//! events into plain render-ready data.
//!
//! Core pieces:
//! - [`cards`] — per-card style records over an injectable key-value backend
//! - [`pin`] — the PIN confirmation dialog state machine
//! - [`credential`] — Argon2-backed PIN enrollment and verification
//! - [`gesture`] — single-tap / double-tap disambiguation
//! - [`rates`] — exchange-rate fetch with hardcoded fallback

pub mod cards;
pub mod config;
pub mod credential;
pub mod events;
pub mod gesture;
pub mod pin;
pub mod rates;
pub mod service;
pub mod state;

pub use cards::{CardStore, CardStyle, KvBackend, MemoryBackend, SledBackend, StyleField};
pub use config::{CardRoute, Config};
pub use credential::{PinCredential, SecurePin};
pub use events::{Screen, ServiceEvent, UiEvent};
pub use gesture::{TapAction, TapTracker};
pub use pin::{CredentialCheck, PinDialog, PinState};
pub use rates::ExchangeRate;
pub use state::AppState;
