//! Headless runner: starts the dashboard service and logs its events until
//! Ctrl-C. A front end would do the same thing, but render instead of log.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use finboard::config::Config;
use finboard::events::UiEvent;
use finboard::service;
use finboard::state::AppState;

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("⚠ Could not load config ({}), using defaults", e);
            Config::default()
        }
    };

    let (ui_tx, ui_rx) = mpsc::unbounded_channel();
    let (svc_tx, mut svc_rx) = mpsc::unbounded_channel();
    let token = CancellationToken::new();

    let service_handle = tokio::spawn(service::run(token.clone(), ui_rx, svc_tx, config.clone()));

    // Prime the card styles the way mounting card components would
    for card in &config.cards {
        let _ = ui_tx.send(UiEvent::LoadCardStyle {
            card_id: card.id.clone(),
        });
    }

    let mut state = AppState::new();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Ctrl-C — shutting down");
                token.cancel();
                break;
            }

            event = svc_rx.recv() => {
                match event {
                    Some(event) => {
                        log::info!("event: {:?}", event);
                        state.apply(event);
                    }
                    None => break,
                }
            }
        }
    }

    let _ = service_handle.await;
}
