//! Event types for communication between the UI and the service task.
//!
//! These two enums are the *only* interface between the render loop and the
//! asynchronous service task. No shared state, no Arc, no Mutex.

use serde::{Deserialize, Serialize};

use crate::cards::{CardStyle, StyleField};
use crate::rates::ExchangeRate;

// ============================================================================
// UI → Service
// ============================================================================

/// Commands sent from the UI thread to the background service task.
#[derive(Debug)]
pub enum UiEvent {
    /// The user tapped a dashboard card. One tap peeks, two taps commit.
    CardTapped { card_id: String },

    /// A card component mounted and needs its persisted style.
    LoadCardStyle { card_id: String },

    /// Change one style field of a card and persist the record.
    UpdateCardStyle { card_id: String, field: StyleField },

    /// Restore a card's style to the defaults.
    ResetCardStyle { card_id: String },

    /// Open the PIN confirmation dialog with no pending action.
    OpenPinDialog,

    /// Digits typed into the PIN dialog.
    PinInput { digits: String },

    /// Dismiss the PIN dialog, abandoning any pending action and timer.
    ClosePinDialog,

    /// Enroll (or replace) the PIN credential.
    SetPin { pin: String },

    /// Contribute to a savings goal. Guarded by the PIN dialog.
    RequestContribution { goal_id: String, amount_cents: u64 },

    /// Re-fetch the exchange rate. `manual` distinguishes pull-to-refresh
    /// from the scheduled hourly fetch.
    RefreshRate { manual: bool },

    /// Clean shutdown.
    Shutdown,
}

/// Screens the dashboard can navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Screen {
    #[default]
    Dashboard,
    Goals,
    Loans,
    Mortgage,
}

// ============================================================================
// Service → UI
// ============================================================================

/// Events sent from the service task back to the UI thread.
#[derive(Debug)]
pub enum ServiceEvent {
    /// A single tap resolved — toggle the card's flipped state.
    CardFlipped { card_id: String },

    /// A double tap resolved on an unguarded route — navigate.
    Navigate(Screen),

    /// A card's style record (persisted or default).
    CardStyleLoaded { card_id: String, style: CardStyle },

    /// The PIN dialog opened and is accepting digits.
    PinDialogOpened,

    /// Credential accepted — show the success indicator.
    PinSucceeded,

    /// Credential rejected — show the transient error indicator.
    PinRejected,

    /// The success delay elapsed; fires exactly once per accepted entry,
    /// always immediately before [`ServiceEvent::PinDialogClosed`].
    PinConfirmed,

    /// The PIN dialog closed (confirmed, dismissed, or torn down).
    PinDialogClosed,

    /// A new PIN credential was enrolled.
    PinSet,

    /// A PIN-confirmed goal contribution.
    ContributionConfirmed { goal_id: String, amount_cents: u64 },

    /// A rate fetch started. `manual` picks which loading indicator to show.
    RateRefreshStarted { manual: bool },

    /// A new rate (live or fallback). Replaces the previous one wholesale.
    RateUpdated(ExchangeRate),

    /// The rate source was unreachable; the fallback rate was substituted.
    RateFailed(String),

    /// Non-fatal error to display in the UI.
    Error(String),
}
