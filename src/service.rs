//! Background service task — single `select!` loop, no locks.
//!
//! The service owns the card store, the PIN dialog, the per-card tap
//! trackers, and the in-flight rate fetch. It receives [`UiEvent`]s from the
//! UI thread and sends [`ServiceEvent`]s back. Delayed work (the PIN success
//! timer, tap reset windows, the hourly rate refresh) runs off deadlines
//! owned here, so cancelling the token tears every timer down with the loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::cards::{CardStore, CardStyle, KvBackend, MemoryBackend, SledBackend};
use crate::config::Config;
use crate::credential::{self, PinCredential, SecurePin};
use crate::events::{Screen, ServiceEvent, UiEvent};
use crate::gesture::{TapAction, TapTracker};
use crate::pin::{CredentialCheck, PinDialog, PinInputOutcome};
use crate::rates::{self, ExchangeRate, RateError};

type FetchHandle = tokio::task::JoinHandle<Result<ExchangeRate, RateError>>;

/// A sensitive action parked behind the PIN dialog.
#[derive(Debug, Clone)]
enum PendingAction {
    Navigate(Screen),
    Contribute { goal_id: String, amount_cents: u64 },
}

/// Stand-in checker while no PIN is enrolled: every entry is rejected.
struct NoCredential;

impl CredentialCheck for NoCredential {
    fn check(&self, _candidate: &str) -> bool {
        false
    }
}

/// Run the service loop until the cancellation token fires.
///
/// This is the only `tokio::spawn`ed task in the application.
pub async fn run(
    token: CancellationToken,
    mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
    svc_tx: mpsc::UnboundedSender<ServiceEvent>,
    config: Config,
) {
    // Open the durable keyspace; fall back to memory rather than dying.
    let backend: Arc<dyn KvBackend> = match SledBackend::open(config.db_path()) {
        Ok(db) => {
            log::info!("📂 Dashboard database opened at: {}", config.db_path().display());
            Arc::new(db)
        }
        Err(e) => {
            log::warn!("⚠ Could not open database ({}), styles will not persist", e);
            let _ = svc_tx.send(ServiceEvent::Error(format!(
                "Local storage unavailable: {}",
                e
            )));
            Arc::new(MemoryBackend::new())
        }
    };

    let credential = load_or_seed_credential(&*backend, &config);

    let mut state = ServiceState {
        svc_tx,
        store: CardStore::new(backend.clone()),
        backend,
        credential,
        pin: PinDialog::new(),
        taps: HashMap::new(),
        pending: None,
        config,
    };

    let mut rate_handle: Option<FetchHandle> = None;
    let mut rate_interval = tokio::time::interval(state.config.rate_refresh());
    rate_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    log::info!("🚀 Dashboard service started");

    loop {
        let next_deadline = state.earliest_deadline();

        tokio::select! {
            _ = token.cancelled() => {
                log::info!("🛑 Dashboard service shutting down");
                break;
            }

            // Scheduled rate refresh. The first tick fires immediately, which
            // doubles as the fetch-on-mount. Skipped while a fetch is in
            // flight — single-flight, no racing retrievals.
            _ = rate_interval.tick(), if rate_handle.is_none() => {
                let _ = state.svc_tx.send(ServiceEvent::RateRefreshStarted { manual: false });
                let url = state.config.rate_url.clone();
                rate_handle = Some(tokio::spawn(async move { rates::fetch_rate(&url).await }));
            }

            // Rate fetch completes in the background
            Some(result) = async {
                if let Some(ref mut handle) = rate_handle {
                    Some(handle.await)
                } else {
                    std::future::pending().await
                }
            } => {
                rate_handle = None;
                state.finish_rate_fetch(result);
            }

            // The earliest pending deadline (PIN success timer or a tap
            // window) comes due
            _ = async {
                match next_deadline {
                    Some(deadline) => {
                        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
                    }
                    None => std::future::pending().await,
                }
            } => {
                state.on_deadline(Instant::now());
            }

            Some(event) = ui_rx.recv() => {
                match event {
                    UiEvent::Shutdown => break,

                    UiEvent::RefreshRate { manual } => {
                        if rate_handle.is_some() {
                            log::debug!("Rate fetch already in flight — ignoring trigger");
                        } else {
                            let _ = state.svc_tx.send(ServiceEvent::RateRefreshStarted { manual });
                            let url = state.config.rate_url.clone();
                            rate_handle =
                                Some(tokio::spawn(async move { rates::fetch_rate(&url).await }));
                        }
                    }

                    other => state.handle_ui(other),
                }
            }
        }
    }

    log::info!("👋 Dashboard service exited");
}

/// Mutable state owned by the service loop.
struct ServiceState {
    svc_tx: mpsc::UnboundedSender<ServiceEvent>,
    store: CardStore,
    backend: Arc<dyn KvBackend>,
    credential: Option<PinCredential>,
    pin: PinDialog,
    taps: HashMap<String, TapTracker>,
    pending: Option<PendingAction>,
    config: Config,
}

impl ServiceState {
    fn handle_ui(&mut self, event: UiEvent) {
        match event {
            UiEvent::CardTapped { card_id } => self.on_card_tapped(card_id),

            UiEvent::LoadCardStyle { card_id } => {
                let style = self.load_style(&card_id);
                let _ = self.svc_tx.send(ServiceEvent::CardStyleLoaded { card_id, style });
            }

            UiEvent::UpdateCardStyle { card_id, field } => {
                match self.store.update(&card_id, field) {
                    Ok(style) => {
                        let _ = self
                            .svc_tx
                            .send(ServiceEvent::CardStyleLoaded { card_id, style });
                    }
                    Err(e) => {
                        log::warn!("⚠ Style update for {} failed: {}", card_id, e);
                        let _ = self.svc_tx.send(ServiceEvent::Error(e.to_string()));
                    }
                }
            }

            UiEvent::ResetCardStyle { card_id } => match self.store.reset(&card_id) {
                Ok(style) => {
                    let _ = self
                        .svc_tx
                        .send(ServiceEvent::CardStyleLoaded { card_id, style });
                }
                Err(e) => {
                    log::warn!("⚠ Style reset for {} failed: {}", card_id, e);
                    let _ = self.svc_tx.send(ServiceEvent::Error(e.to_string()));
                }
            },

            UiEvent::OpenPinDialog => self.open_pin_dialog(None),

            UiEvent::ClosePinDialog => {
                self.pin.close();
                self.pending = None;
                let _ = self.svc_tx.send(ServiceEvent::PinDialogClosed);
            }

            UiEvent::PinInput { digits } => self.on_pin_input(&digits),

            UiEvent::SetPin { pin } => self.on_set_pin(pin),

            UiEvent::RequestContribution { goal_id, amount_cents } => {
                self.open_pin_dialog(Some(PendingAction::Contribute { goal_id, amount_cents }));
            }

            // Handled in the select loop
            UiEvent::RefreshRate { .. } | UiEvent::Shutdown => {}
        }
    }

    fn on_card_tapped(&mut self, card_id: String) {
        let now = Instant::now();
        let tracker = self.taps.entry(card_id.clone()).or_default();

        match tracker.tap(now) {
            TapAction::Peek => {
                let _ = self.svc_tx.send(ServiceEvent::CardFlipped { card_id });
            }
            TapAction::Commit => match self.config.route(&card_id) {
                Some(route) if route.requires_pin => {
                    self.open_pin_dialog(Some(PendingAction::Navigate(route.screen)));
                }
                Some(route) => {
                    let _ = self.svc_tx.send(ServiceEvent::Navigate(route.screen));
                }
                None => {
                    log::debug!("Card {} has no navigation target", card_id);
                }
            },
        }
    }

    fn open_pin_dialog(&mut self, pending: Option<PendingAction>) {
        self.pending = pending;
        self.pin.open();
        let _ = self.svc_tx.send(ServiceEvent::PinDialogOpened);
    }

    fn on_pin_input(&mut self, digits: &str) {
        let outcome = match self.credential {
            Some(ref cred) => self.pin.input(digits, cred, Instant::now()),
            None => self.pin.input(digits, &NoCredential, Instant::now()),
        };

        match outcome {
            PinInputOutcome::Accepted => {
                let _ = self.svc_tx.send(ServiceEvent::PinSucceeded);
            }
            PinInputOutcome::Rejected => {
                if self.credential.is_none() {
                    log::warn!("⚠ PIN entry with no credential enrolled");
                }
                let _ = self.svc_tx.send(ServiceEvent::PinRejected);
            }
            PinInputOutcome::Pending => {}
            PinInputOutcome::Ignored => {
                log::debug!("Ignored PIN input");
            }
        }
    }

    fn on_set_pin(&mut self, pin: String) {
        let secure = match SecurePin::new(pin) {
            Ok(p) => p,
            Err(e) => {
                let _ = self.svc_tx.send(ServiceEvent::Error(e.to_string()));
                return;
            }
        };
        if credential::is_weak_pin(&secure) {
            log::warn!("⚠ Enrolling a weak PIN");
        }
        match PinCredential::create(&secure).and_then(|cred| {
            cred.save(&*self.backend)?;
            Ok(cred)
        }) {
            Ok(cred) => {
                self.credential = Some(cred);
                let _ = self.svc_tx.send(ServiceEvent::PinSet);
            }
            Err(e) => {
                let _ = self.svc_tx.send(ServiceEvent::Error(e.to_string()));
            }
        }
    }

    /// Fire due deadlines: the PIN success pair (exactly once, success before
    /// close) followed by any parked action, then expired tap windows.
    fn on_deadline(&mut self, now: Instant) {
        if self.pin.poll(now) {
            let _ = self.svc_tx.send(ServiceEvent::PinConfirmed);
            let _ = self.svc_tx.send(ServiceEvent::PinDialogClosed);
            if let Some(action) = self.pending.take() {
                self.dispatch(action);
            }
        }
        for tracker in self.taps.values_mut() {
            tracker.poll(now);
        }
        // Trackers without a live window hold no state worth keeping
        self.taps.retain(|_, tracker| tracker.next_deadline().is_some());
    }

    fn dispatch(&mut self, action: PendingAction) {
        match action {
            PendingAction::Navigate(screen) => {
                let _ = self.svc_tx.send(ServiceEvent::Navigate(screen));
            }
            PendingAction::Contribute { goal_id, amount_cents } => {
                let _ = self
                    .svc_tx
                    .send(ServiceEvent::ContributionConfirmed { goal_id, amount_cents });
            }
        }
    }

    fn finish_rate_fetch(
        &mut self,
        result: Result<Result<ExchangeRate, RateError>, tokio::task::JoinError>,
    ) {
        match result {
            Ok(Ok(rate)) => {
                let _ = self.svc_tx.send(ServiceEvent::RateUpdated(rate));
            }
            Ok(Err(e)) => {
                log::warn!("⚠ Rate fetch failed: {} — using fallback", e);
                let _ = self.svc_tx.send(ServiceEvent::RateUpdated(rates::fallback_rate()));
                let _ = self.svc_tx.send(ServiceEvent::RateFailed(e.to_string()));
            }
            Err(e) => {
                log::warn!("⚠ Rate fetch task failed: {} — using fallback", e);
                let _ = self.svc_tx.send(ServiceEvent::RateUpdated(rates::fallback_rate()));
                let _ = self.svc_tx.send(ServiceEvent::RateFailed(e.to_string()));
            }
        }
    }

    fn load_style(&self, card_id: &str) -> CardStyle {
        match self.store.load(card_id) {
            Ok(style) => style,
            Err(e) => {
                log::warn!("⚠ Style load for {} failed: {} — using defaults", card_id, e);
                CardStyle::default()
            }
        }
    }

    /// Earliest instant any owned timer needs servicing.
    fn earliest_deadline(&self) -> Option<Instant> {
        let taps = self.taps.values().filter_map(|t| t.next_deadline());
        self.pin.next_deadline().into_iter().chain(taps).min()
    }
}

fn load_or_seed_credential(backend: &dyn KvBackend, config: &Config) -> Option<PinCredential> {
    match PinCredential::load(backend) {
        Ok(Some(cred)) => Some(cred),
        Ok(None) => {
            let pin = config.initial_pin.as_ref()?;
            let secure = match SecurePin::new(pin.clone()) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("⚠ Configured initial PIN is invalid: {}", e);
                    return None;
                }
            };
            match PinCredential::create(&secure) {
                Ok(cred) => {
                    if let Err(e) = cred.save(backend) {
                        log::warn!("⚠ Could not persist initial PIN: {}", e);
                    }
                    log::warn!("🔑 Enrolled initial PIN from config — change it");
                    Some(cred)
                }
                Err(e) => {
                    log::warn!("⚠ Could not hash initial PIN: {}", e);
                    None
                }
            }
        }
        Err(e) => {
            log::warn!("⚠ Could not load PIN credential: {}", e);
            None
        }
    }
}
