//! PIN confirmation dialog state machine.
//!
//! Gates a sensitive action behind a 4-digit credential check. Digits
//! accumulate in a buffer; reaching four triggers a synchronous check against
//! an external [`CredentialCheck`] capability. Acceptance shows a success
//! indicator and arms a short deadline, after which the dialog reports
//! success-then-closed exactly once. Rejection clears the buffer and flags an
//! error, leaving the dialog open for another attempt.
//!
//! Timers are explicit deadline handles polled by the owner; closing the
//! dialog cancels them, so a rapid open/close never fires stale callbacks.

use std::time::{Duration, Instant};

/// Number of digits in a complete PIN entry.
pub const PIN_LENGTH: usize = 4;

/// Delay between a successful check and the dialog reporting success/close.
pub const SUCCESS_CLOSE_DELAY: Duration = Duration::from_millis(600);

/// External credential check. The dialog never stores or hashes PINs itself.
pub trait CredentialCheck {
    fn check(&self, candidate: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// Dialog open, accepting digits.
    Idle,
    /// Credential accepted, waiting out the success delay.
    Success,
    /// Dialog closed.
    Closed,
}

/// Outcome of feeding digits to the dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinInputOutcome {
    /// Input discarded at the boundary (dialog closed, buffer full, or
    /// non-numeric input). Never reaches validation.
    Ignored,
    /// Digits accepted, buffer still short of four.
    Pending,
    /// Credential accepted; the success deadline is armed.
    Accepted,
    /// Credential rejected; buffer cleared, error flag set.
    Rejected,
}

#[derive(Debug)]
pub struct PinDialog {
    buffer: String,
    state: PinState,
    error: bool,
    close_deadline: Option<Instant>,
}

impl Default for PinDialog {
    fn default() -> Self {
        Self::new()
    }
}

impl PinDialog {
    /// A dialog starts closed; [`open`](Self::open) it before feeding input.
    pub fn new() -> Self {
        PinDialog {
            buffer: String::new(),
            state: PinState::Closed,
            error: false,
            close_deadline: None,
        }
    }

    /// Open (or reopen) the dialog. Always resets to `Idle`, dropping any
    /// pending success deadline from a prior run.
    pub fn open(&mut self) {
        self.buffer.clear();
        self.state = PinState::Idle;
        self.error = false;
        self.close_deadline = None;
    }

    /// Close the dialog from any state, abandoning the pending deadline.
    pub fn close(&mut self) {
        self.buffer.clear();
        self.state = PinState::Closed;
        self.error = false;
        self.close_deadline = None;
    }

    pub fn state(&self) -> PinState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != PinState::Closed
    }

    /// True while the transient error indicator should be shown.
    pub fn error_shown(&self) -> bool {
        self.error
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a string of decimal digits into the buffer.
    ///
    /// Validation runs exactly once, when the buffer reaches four digits.
    /// Input while the dialog is closed or in its success delay, containing
    /// non-digits, or overflowing the four-digit buffer, is ignored whole —
    /// invalid input never reaches validation.
    pub fn input(
        &mut self,
        digits: &str,
        checker: &dyn CredentialCheck,
        now: Instant,
    ) -> PinInputOutcome {
        if self.state != PinState::Idle {
            return PinInputOutcome::Ignored;
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return PinInputOutcome::Ignored;
        }
        if self.buffer.len() + digits.len() > PIN_LENGTH {
            return PinInputOutcome::Ignored;
        }

        self.error = false;
        self.buffer.push_str(digits);

        if self.buffer.len() < PIN_LENGTH {
            return PinInputOutcome::Pending;
        }

        if checker.check(&self.buffer) {
            self.state = PinState::Success;
            self.close_deadline = Some(now + SUCCESS_CLOSE_DELAY);
            PinInputOutcome::Accepted
        } else {
            self.buffer.clear();
            self.error = true;
            PinInputOutcome::Rejected
        }
    }

    /// Advance the success timer. Returns true exactly once per accepted
    /// entry, when the deadline has passed; the dialog is then closed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.close_deadline {
            Some(deadline) if self.state == PinState::Success && now >= deadline => {
                self.close();
                true
            }
            _ => false,
        }
    }

    /// Earliest instant at which [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.close_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPin(&'static str);

    impl CredentialCheck for FixedPin {
        fn check(&self, candidate: &str) -> bool {
            candidate == self.0
        }
    }

    /// Counts how often validation actually runs.
    struct CountingCheck {
        calls: std::cell::Cell<u32>,
    }

    impl CredentialCheck for CountingCheck {
        fn check(&self, _candidate: &str) -> bool {
            self.calls.set(self.calls.get() + 1);
            false
        }
    }

    fn open_dialog() -> PinDialog {
        let mut dialog = PinDialog::new();
        dialog.open();
        dialog
    }

    #[test]
    fn test_validation_fires_once_at_four_digits() {
        let checker = CountingCheck {
            calls: std::cell::Cell::new(0),
        };
        let mut dialog = open_dialog();
        let now = Instant::now();

        for digit in ["1", "2", "3"] {
            assert_eq!(dialog.input(digit, &checker, now), PinInputOutcome::Pending);
            assert_eq!(checker.calls.get(), 0, "validated before four digits");
        }
        dialog.input("4", &checker, now);
        assert_eq!(checker.calls.get(), 1);
    }

    #[test]
    fn test_accept_path_fires_success_after_delay() {
        let checker = FixedPin("1234");
        let mut dialog = open_dialog();
        let now = Instant::now();

        for digit in ["1", "2", "3"] {
            dialog.input(digit, &checker, now);
        }
        assert_eq!(dialog.input("4", &checker, now), PinInputOutcome::Accepted);
        assert_eq!(dialog.state(), PinState::Success);

        // Not yet — the delay has not elapsed
        assert!(!dialog.poll(now));
        assert!(!dialog.poll(now + Duration::from_millis(599)));

        assert!(dialog.poll(now + SUCCESS_CLOSE_DELAY));
        assert_eq!(dialog.state(), PinState::Closed);

        // Exactly once
        assert!(!dialog.poll(now + Duration::from_secs(5)));

        // Buffer is empty on reopen
        dialog.open();
        assert_eq!(dialog.buffer_len(), 0);
        assert!(!dialog.error_shown());
    }

    #[test]
    fn test_reject_path_clears_buffer_and_flags_error() {
        let checker = FixedPin("1234");
        let mut dialog = open_dialog();
        let now = Instant::now();

        for digit in ["0", "0", "0"] {
            dialog.input(digit, &checker, now);
        }
        assert_eq!(dialog.input("0", &checker, now), PinInputOutcome::Rejected);
        assert!(dialog.error_shown());
        assert_eq!(dialog.buffer_len(), 0);
        assert_eq!(dialog.state(), PinState::Idle);
        assert_eq!(dialog.next_deadline(), None);
        assert!(!dialog.poll(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_retry_after_rejection_succeeds() {
        let checker = FixedPin("1234");
        let mut dialog = open_dialog();
        let now = Instant::now();

        dialog.input("0000", &checker, now);
        assert!(dialog.error_shown());

        // Error flag clears as soon as the user types again
        dialog.input("1", &checker, now);
        assert!(!dialog.error_shown());
        assert_eq!(dialog.input("234", &checker, now), PinInputOutcome::Accepted);
    }

    #[test]
    fn test_non_numeric_input_never_reaches_validation() {
        let checker = CountingCheck {
            calls: std::cell::Cell::new(0),
        };
        let mut dialog = open_dialog();
        let now = Instant::now();

        assert_eq!(dialog.input("12a4", &checker, now), PinInputOutcome::Ignored);
        assert_eq!(dialog.input("", &checker, now), PinInputOutcome::Ignored);
        assert_eq!(dialog.buffer_len(), 0);
        assert_eq!(checker.calls.get(), 0);
    }

    #[test]
    fn test_overlong_input_never_reaches_validation() {
        let checker = CountingCheck {
            calls: std::cell::Cell::new(0),
        };
        let mut dialog = open_dialog();
        let now = Instant::now();

        // Five digits at once overflow the buffer: ignored whole, not truncated
        assert_eq!(dialog.input("12345", &checker, now), PinInputOutcome::Ignored);
        assert_eq!(dialog.buffer_len(), 0);
        assert_eq!(checker.calls.get(), 0);

        // Same once the buffer is partially filled
        dialog.input("12", &checker, now);
        assert_eq!(dialog.input("345", &checker, now), PinInputOutcome::Ignored);
        assert_eq!(dialog.buffer_len(), 2);
        assert_eq!(checker.calls.get(), 0);
    }

    #[test]
    fn test_input_ignored_while_success_pending() {
        let checker = FixedPin("1234");
        let mut dialog = open_dialog();
        let now = Instant::now();

        dialog.input("1234", &checker, now);
        assert_eq!(dialog.state(), PinState::Success);
        assert_eq!(dialog.input("9", &checker, now), PinInputOutcome::Ignored);
    }

    #[test]
    fn test_close_cancels_pending_success_timer() {
        let checker = FixedPin("1234");
        let mut dialog = open_dialog();
        let now = Instant::now();

        dialog.input("1234", &checker, now);
        dialog.close();

        // The deadline was abandoned — no stale callback
        assert!(!dialog.poll(now + Duration::from_secs(1)));
        assert_eq!(dialog.next_deadline(), None);
    }

    #[test]
    fn test_reopen_resets_regardless_of_prior_state() {
        let checker = FixedPin("1234");
        let mut dialog = open_dialog();
        let now = Instant::now();

        dialog.input("1234", &checker, now);
        dialog.open();

        assert_eq!(dialog.state(), PinState::Idle);
        assert_eq!(dialog.buffer_len(), 0);
        assert!(!dialog.poll(now + Duration::from_secs(1)));
    }

    #[test]
    fn test_input_while_closed_is_ignored() {
        let checker = FixedPin("1234");
        let mut dialog = PinDialog::new();
        assert_eq!(
            dialog.input("1", &checker, Instant::now()),
            PinInputOutcome::Ignored
        );
    }
}
