//! Periodic refresh of the live-bets view.
//!
//! The poll task lives exactly as long as its `PollHandle`: the controller
//! takes one when the live view opens and drops it on leave, logout or
//! quit.

use crate::api::LiveBetSource;
use crate::engine::pace::{project_all, StatusThresholds};
use crate::tui::state::{AppState, View};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One fetch. Success swaps in the new collection; failure raises the live
/// banner and keeps whatever was shown before.
pub async fn poll_once(
    source: &dyn LiveBetSource,
    user_id: Option<&str>,
    thresholds: &StatusThresholds,
    state_tx: &watch::Sender<AppState>,
) -> bool {
    match source.fetch_live(user_id).await {
        Ok(bets) => {
            let views = project_all(bets, thresholds);
            tracing::debug!(count = views.len(), "live bets refreshed");
            state_tx.send_modify(|s| {
                s.live = views;
                s.live_updated = Some(chrono::Local::now());
                s.clear_error(View::Live);
            });
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "live poll failed");
            let message = e.user_message();
            state_tx.send_modify(|s| {
                s.set_error(View::Live, message);
                s.push_log("WARN", format!("live poll failed: {}", e));
            });
            false
        }
    }
}

/// Start polling. The first fetch happens immediately, then every `period`.
/// No retry or backoff beyond the fixed schedule.
pub fn spawn_live_poller(
    source: Arc<dyn LiveBetSource>,
    user_id: Option<String>,
    period: Duration,
    thresholds: StatusThresholds,
    state_tx: watch::Sender<AppState>,
) -> PollHandle {
    tracing::info!(period_s = period.as_secs(), "live poller started");
    state_tx.send_modify(|s| s.live_polling = true);

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            poll_once(source.as_ref(), user_id.as_deref(), &thresholds, &state_tx).await;
        }
    });

    PollHandle { task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::LiveBetRecord;
    use crate::api::{ApiError, Endpoint};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds with `bets` until `fail_from` calls have been made.
    struct FakeSource {
        calls: AtomicUsize,
        fail_from: usize,
        bets: Vec<LiveBetRecord>,
    }

    #[async_trait]
    impl LiveBetSource for FakeSource {
        async fn fetch_live(&self, _user_id: Option<&str>) -> Result<Vec<LiveBetRecord>, ApiError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.fail_from {
                Err(ApiError::Parse {
                    endpoint: Endpoint::LiveBets,
                    reason: "boom".to_string(),
                })
            } else {
                Ok(self.bets.clone())
            }
        }
    }

    fn live(player: &str) -> LiveBetRecord {
        LiveBetRecord {
            player_name: player.to_string(),
            category: "Points".to_string(),
            game: "DEN x PHX".to_string(),
            target: 25.0,
            current_value: 20.0,
            remaining_minutes: 5.0,
            odds: 1.8,
            stake: 10.0,
            status: None,
            potential_profit: None,
        }
    }

    fn source(fail_from: usize) -> FakeSource {
        FakeSource {
            calls: AtomicUsize::new(0),
            fail_from,
            bets: vec![live("Nikola Jokić"), live("Devin Booker")],
        }
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_collection() {
        let (tx, rx) = watch::channel(AppState::new());
        let src = source(1);
        let t = StatusThresholds::default();

        assert!(poll_once(&src, Some("u-1"), &t, &tx).await);
        assert_eq!(rx.borrow().live.len(), 2);
        assert!(rx.borrow().error_for(View::Live).is_none());

        assert!(!poll_once(&src, Some("u-1"), &t, &tx).await);
        let state = rx.borrow();
        assert_eq!(state.live.len(), 2);
        assert_eq!(state.live[0].metrics.remaining_value, 5.0);
        assert_eq!(state.error_for(View::Live), Some("Erro ao buscar apostas em tempo real"));
    }

    #[tokio::test]
    async fn test_success_clears_banner() {
        let (tx, rx) = watch::channel(AppState::new());
        tx.send_modify(|s| s.set_error(View::Live, "old".to_string()));
        poll_once(&source(10), None, &StatusThresholds::default(), &tx).await;
        assert!(rx.borrow().error_for(View::Live).is_none());
        assert!(rx.borrow().live_updated.is_some());
    }

    #[tokio::test]
    async fn test_first_poll_is_immediate_and_drop_stops_polling() {
        let (tx, mut rx) = watch::channel(AppState::new());
        let src = Arc::new(source(usize::MAX));
        let handle = spawn_live_poller(
            src.clone(),
            None,
            Duration::from_secs(3600),
            StatusThresholds::default(),
            tx,
        );

        tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| s.live.len() == 2))
            .await
            .expect("first poll did not run")
            .unwrap();
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);

        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(src.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_poller_repeats_on_interval_until_dropped() {
        let (tx, _rx) = watch::channel(AppState::new());
        let src = Arc::new(source(usize::MAX));
        let handle = spawn_live_poller(
            src.clone(),
            None,
            Duration::from_millis(10),
            StatusThresholds::default(),
            tx,
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(src.calls.load(Ordering::SeqCst) >= 3);

        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let after_drop = src.calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(src.calls.load(Ordering::SeqCst), after_drop);
    }
}
