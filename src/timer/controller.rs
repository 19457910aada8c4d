use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use chrono::Utc;
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;

use crate::{
    settings::SettingsStore,
    window::{WindowCoordinator, WindowLayout},
};

use super::{TickTransition, TimerPhase, TimerState};

use tauri::{AppHandle, Emitter};

const EVENT_TICK: &str = "timer-tick";
const EVENT_STATE_CHANGED: &str = "timer-state-changed";

/// How long the warning overlay stays up before it auto-dismisses.
const WARNING_DISMISS_WINDOW: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub state: TimerState,
    pub remaining_seconds: i64,
    pub minutes: i64,
    pub seconds: i64,
}

/// Owns the countdown lifecycle: the 1 s ticker task, the warning
/// auto-dismiss callback, and the window-geometry side effects of every
/// phase transition.
#[derive(Clone)]
pub struct TimerController {
    state: Arc<Mutex<TimerState>>,
    app_handle: AppHandle,
    store: SettingsStore,
    window: WindowCoordinator,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    dismiss: Arc<Mutex<Option<CancellationToken>>>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new(app_handle: AppHandle, store: SettingsStore, window: WindowCoordinator) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState::new())),
            app_handle,
            store,
            window,
            ticker: Arc::new(Mutex::new(None)),
            dismiss: Arc::new(Mutex::new(None)),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        let mut guard = self.state.lock().await;
        guard.refresh_remaining(Utc::now());
        snapshot_of(&guard)
    }

    pub async fn start_timer(&self, minutes: f64) -> Result<TimerSnapshot> {
        let total_seconds = super::state::minutes_to_seconds(minutes)
            .ok_or_else(|| anyhow!("minutes must be a positive number"))?;

        {
            let state = self.state.lock().await;
            if state.phase != TimerPhase::Idle {
                return Err(anyhow!("timer already active"));
            }
        }

        // A dismiss callback from a previous session must never reach the
        // new one; the generation check is the second line of defense.
        cancel_pending_dismiss(&self.dismiss).await;

        let warning_threshold_seconds = i64::from(self.store.settings().warning_minutes) * 60;
        {
            let mut state = self.state.lock().await;
            state.begin_session(total_seconds, warning_threshold_seconds, Utc::now());
        }

        self.window.apply(WindowLayout::CompactTimer);
        self.spawn_ticker().await;

        let snapshot = self.get_snapshot().await;
        emit_timer_event(&self.app_handle, EVENT_STATE_CHANGED, &snapshot);
        Ok(snapshot)
    }

    /// Unconditional stop: used for the confirmed mid-session stop and the
    /// finish-screen acknowledgment alike. The confirmation prompt itself
    /// lives in the frontend.
    pub async fn stop_timer(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            if state.phase == TimerPhase::Idle {
                return Ok(());
            }
            state.reset();
        }

        self.cancel_ticker().await;
        cancel_pending_dismiss(&self.dismiss).await;
        self.window.apply(WindowLayout::Home);

        let snapshot = self.get_snapshot().await;
        emit_timer_event(&self.app_handle, EVENT_STATE_CHANGED, &snapshot);
        Ok(())
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let state = self.state.clone();
        let app_handle = self.app_handle.clone();
        let window = self.window.clone();
        let dismiss = self.dismiss.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            // First tick one interval after start, matching the cadence the
            // countdown is displayed at.
            let mut interval =
                time::interval_at(time::Instant::now() + tick_interval, tick_interval);
            loop {
                interval.tick().await;

                let (snapshot, transition) = {
                    let mut guard = state.lock().await;
                    if !guard.is_counting() {
                        break;
                    }
                    let transition = guard.tick(Utc::now());
                    (snapshot_of(&guard), transition)
                };

                match transition {
                    TickTransition::EnteredWarning => {
                        window.set_fullscreen(true);
                        schedule_warning_dismiss(
                            state.clone(),
                            app_handle.clone(),
                            window.clone(),
                            dismiss.clone(),
                            snapshot.state.generation,
                        )
                        .await;
                        emit_timer_event(&app_handle, EVENT_STATE_CHANGED, &snapshot);
                    }
                    TickTransition::Finished => {
                        cancel_pending_dismiss(&dismiss).await;
                        window.set_fullscreen(true);
                        emit_timer_event(&app_handle, EVENT_STATE_CHANGED, &snapshot);
                        emit_timer_event(&app_handle, EVENT_TICK, &snapshot);
                        break;
                    }
                    TickTransition::None => {}
                }

                emit_timer_event(&app_handle, EVENT_TICK, &snapshot);
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}

fn snapshot_of(state: &TimerState) -> TimerSnapshot {
    TimerSnapshot {
        remaining_seconds: state.remaining_seconds,
        minutes: state.minutes(),
        seconds: state.seconds(),
        state: state.clone(),
    }
}

fn emit_timer_event(app_handle: &AppHandle, event: &str, snapshot: &TimerSnapshot) {
    let _ = app_handle.emit(event, snapshot);
}

async fn cancel_pending_dismiss(slot: &Mutex<Option<CancellationToken>>) {
    if let Some(token) = slot.lock().await.take() {
        token.cancel();
    }
}

/// Arms the warning auto-dismiss: after the display window elapses the
/// overlay reverts `Warning → Running` and full-screen is released. The
/// callback is cancelled on stop and finish, and checks the session
/// generation before mutating state, so it can never touch a session other
/// than the one that armed it.
async fn schedule_warning_dismiss(
    state: Arc<Mutex<TimerState>>,
    app_handle: AppHandle,
    window: WindowCoordinator,
    slot: Arc<Mutex<Option<CancellationToken>>>,
    generation: u64,
) {
    let token = CancellationToken::new();
    {
        let mut guard = slot.lock().await;
        if let Some(previous) = guard.replace(token.clone()) {
            previous.cancel();
        }
    }

    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = time::sleep(WARNING_DISMISS_WINDOW) => {
                let snapshot = {
                    let mut guard = state.lock().await;
                    if guard.generation != generation || !guard.dismiss_warning() {
                        return;
                    }
                    snapshot_of(&guard)
                };
                window.set_fullscreen(false);
                emit_timer_event(&app_handle, EVENT_STATE_CHANGED, &snapshot);
            }
        }
    });
}
