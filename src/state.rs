//! Application state — plain data, no async, no Arc.
//!
//! `AppState` holds everything a front end needs to render. The service task
//! sends [`ServiceEvent`]s which are applied via [`AppState::apply`]; the UI
//! reads fields directly.

use std::collections::{HashMap, HashSet};

use crate::cards::CardStyle;
use crate::events::{Screen, ServiceEvent};
use crate::rates::ExchangeRate;

/// All dashboard state needed for rendering.
#[derive(Debug, Default)]
pub struct AppState {
    // -- Navigation --
    pub screen: Screen,

    // -- Cards --
    /// Cards currently showing their back face.
    pub flipped: HashSet<String>,
    pub styles: HashMap<String, CardStyle>,

    // -- PIN dialog --
    pub pin_open: bool,
    pub pin_error: bool,
    pub pin_success: bool,

    // -- Exchange rate --
    pub rate: Option<ExchangeRate>,
    /// Initial/scheduled fetch in progress.
    pub rate_loading: bool,
    /// Manual refresh in progress.
    pub rate_refreshing: bool,
    pub rate_error: Option<String>,

    // -- Misc --
    pub last_contribution: Option<(String, u64)>,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one service event into the state.
    pub fn apply(&mut self, event: ServiceEvent) {
        match event {
            ServiceEvent::CardFlipped { card_id } => {
                if !self.flipped.remove(&card_id) {
                    self.flipped.insert(card_id);
                }
            }

            ServiceEvent::Navigate(screen) => {
                self.screen = screen;
            }

            ServiceEvent::CardStyleLoaded { card_id, style } => {
                self.styles.insert(card_id, style);
            }

            ServiceEvent::PinDialogOpened => {
                self.pin_open = true;
                self.pin_error = false;
                self.pin_success = false;
            }

            ServiceEvent::PinSucceeded => {
                self.pin_success = true;
                self.pin_error = false;
            }

            ServiceEvent::PinRejected => {
                self.pin_error = true;
            }

            ServiceEvent::PinConfirmed => {}

            ServiceEvent::PinDialogClosed => {
                self.pin_open = false;
                self.pin_error = false;
                self.pin_success = false;
            }

            ServiceEvent::PinSet => {}

            ServiceEvent::ContributionConfirmed { goal_id, amount_cents } => {
                self.last_contribution = Some((goal_id, amount_cents));
            }

            ServiceEvent::RateRefreshStarted { manual } => {
                if manual {
                    self.rate_refreshing = true;
                } else {
                    self.rate_loading = true;
                }
            }

            ServiceEvent::RateUpdated(rate) => {
                self.rate = Some(rate);
                self.rate_loading = false;
                self.rate_refreshing = false;
                self.rate_error = None;
            }

            ServiceEvent::RateFailed(message) => {
                self.rate_loading = false;
                self.rate_refreshing = false;
                self.rate_error = Some(message);
            }

            ServiceEvent::Error(message) => {
                self.last_error = Some(message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::fallback_rate;

    #[test]
    fn test_flip_toggles() {
        let mut state = AppState::new();
        state.apply(ServiceEvent::CardFlipped { card_id: "goals".into() });
        assert!(state.flipped.contains("goals"));
        state.apply(ServiceEvent::CardFlipped { card_id: "goals".into() });
        assert!(!state.flipped.contains("goals"));
    }

    #[test]
    fn test_pin_flags_lifecycle() {
        let mut state = AppState::new();
        state.apply(ServiceEvent::PinDialogOpened);
        assert!(state.pin_open);

        state.apply(ServiceEvent::PinRejected);
        assert!(state.pin_error);

        // Reopening clears the error indicator
        state.apply(ServiceEvent::PinDialogOpened);
        assert!(!state.pin_error);

        state.apply(ServiceEvent::PinSucceeded);
        assert!(state.pin_success);

        state.apply(ServiceEvent::PinDialogClosed);
        assert!(!state.pin_open);
        assert!(!state.pin_success);
    }

    #[test]
    fn test_rate_fallback_clears_loading_and_sets_error() {
        let mut state = AppState::new();
        state.apply(ServiceEvent::RateRefreshStarted { manual: false });
        assert!(state.rate_loading);

        state.apply(ServiceEvent::RateUpdated(fallback_rate()));
        state.apply(ServiceEvent::RateFailed("connection refused".into()));

        assert!(!state.rate_loading);
        assert!(!state.rate_refreshing);
        assert_eq!(state.rate.as_ref().unwrap().buy, 3.70);
        assert_eq!(state.rate.as_ref().unwrap().sell, 3.72);
        assert!(state.rate_error.is_some());
    }

    #[test]
    fn test_manual_refresh_uses_other_indicator() {
        let mut state = AppState::new();
        state.apply(ServiceEvent::RateRefreshStarted { manual: true });
        assert!(state.rate_refreshing);
        assert!(!state.rate_loading);
    }
}
