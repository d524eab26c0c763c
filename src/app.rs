//! Controller between the TUI and the backend.
//!
//! Owns the session, the live poller and the notification socket. Every
//! `TuiCommand` is handled here and its outcome is published through the
//! `AppState` watch channel.

use crate::api::ws::{NotificationEvent, NotificationWs};
use crate::api::{ApiError, BetApi, LiveBetSource};
use crate::config::Config;
use crate::engine::pace::StatusThresholds;
use crate::forms::AddBetForm;
use crate::poller::{spawn_live_poller, PollHandle};
use crate::session::SessionContext;
use crate::tui::state::{AppState, View};
use crate::tui::TuiCommand;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Socket reader plus the task that folds its events into `AppState`.
/// Both stop when this is dropped.
struct NotificationTask {
    socket: JoinHandle<()>,
    forward: JoinHandle<()>,
}

impl Drop for NotificationTask {
    fn drop(&mut self) {
        self.socket.abort();
        self.forward.abort();
    }
}

fn spawn_notifications(ws_url: &str, user_id: String, state_tx: watch::Sender<AppState>) -> NotificationTask {
    let (tx, mut rx) = mpsc::channel(64);
    let ws = NotificationWs::new(ws_url);

    let socket = tokio::spawn(async move {
        if let Err(e) = ws.run(&user_id, tx).await {
            tracing::debug!(error = %e, "notification socket stopped");
        }
    });
    let forward = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            state_tx.send_modify(|s| apply_notification_event(s, event));
        }
    });

    NotificationTask { socket, forward }
}

/// Fold one socket event into the UI state.
pub fn apply_notification_event(state: &mut AppState, event: NotificationEvent) {
    match event {
        NotificationEvent::Connected => {
            state.notifications.set_connected(true);
            state.push_log("INFO", "notificações conectadas".to_string());
        }
        NotificationEvent::Notification(n) => {
            let text = match &n.title {
                Some(title) => format!("{}: {}", title, n.message),
                None => n.message.clone(),
            };
            state.push_log("NOTIF", text);
            state.notify(n);
        }
        NotificationEvent::Disconnected(reason) => {
            state.notifications.set_connected(false);
            state.push_log("WARN", format!("notificações desconectadas: {}", reason));
        }
    }
}

pub struct App {
    api: Arc<BetApi>,
    session: SessionContext,
    thresholds: StatusThresholds,
    poll_interval: Duration,
    ws_url: String,
    state_tx: watch::Sender<AppState>,
    live_poll: Option<PollHandle>,
    notifications: Option<NotificationTask>,
}

impl App {
    pub fn new(
        config: &Config,
        api: Arc<BetApi>,
        session: SessionContext,
        state_tx: watch::Sender<AppState>,
    ) -> Self {
        Self {
            api,
            session,
            thresholds: StatusThresholds::from(&config.live),
            poll_interval: config.live.poll_interval(),
            ws_url: config.api.notifications_url(),
            state_tx,
            live_poll: None,
            notifications: None,
        }
    }

    /// Handle commands until the TUI quits or hangs up.
    pub async fn run(mut self, mut cmd_rx: mpsc::Receiver<TuiCommand>) {
        let user = self.session.user().cloned();
        self.state_tx.send_modify(|s| {
            s.user = user;
            s.push_log("INFO", "BasketBet Pro iniciado".to_string());
        });
        self.start_notifications();
        self.load_view(View::Dashboard).await;

        while let Some(cmd) = cmd_rx.recv().await {
            if cmd == TuiCommand::Quit {
                break;
            }
            self.handle(cmd).await;
        }

        self.live_poll = None;
        self.notifications = None;
        tracing::info!("controller stopped");
    }

    async fn handle(&mut self, cmd: TuiCommand) {
        tracing::debug!(?cmd, "command");
        let today = chrono::Local::now().date_naive();
        match cmd {
            TuiCommand::Quit => {}
            TuiCommand::SwitchView(view) => {
                let current = self.state_tx.borrow().view;
                if current == view {
                    return;
                }
                if current == View::Live {
                    self.stop_live();
                }
                self.state_tx.send_modify(|s| s.switch_view(view));
                self.load_view(view).await;
            }
            TuiCommand::Refresh => {
                let view = self.state_tx.borrow().view;
                if view == View::Live {
                    self.stop_live();
                }
                self.load_view(view).await;
            }
            TuiCommand::CycleDatePreset => {
                let view = self.state_tx.borrow().view;
                self.state_tx.send_modify(|s| {
                    let next = s.date_preset.next();
                    s.set_date_preset(next, today);
                    s.selected = 0;
                });
                self.load_view(view).await;
            }
            TuiCommand::CycleCategory => {
                self.state_tx.send_modify(|s| s.cycle_category());
                let view = self.history_view();
                self.load_view(view).await;
            }
            TuiCommand::SetSearch(term) => {
                self.state_tx.send_modify(|s| {
                    s.history_filter.search_term = term;
                    s.selected = 0;
                });
                let view = self.history_view();
                self.load_view(view).await;
            }
            TuiCommand::CycleReportMode => self.state_tx.send_modify(|s| {
                s.report_mode = s.report_mode.next();
                s.selected = 0;
            }),
            TuiCommand::SetReportPlayer(player) => self.state_tx.send_modify(|s| {
                s.report_player = player;
                s.selected = 0;
            }),
            TuiCommand::SortReport(field) => self.state_tx.send_modify(|s| s.sort_report(field)),
            TuiCommand::CycleBetStatus => self.state_tx.send_modify(|s| s.cycle_my_bets_status()),
            TuiCommand::AddBet(form) => {
                if let Err(e) = self.add_bet(form).await {
                    self.fail(View::History, &e);
                }
            }
            TuiCommand::MarkSelectedRead => self.state_tx.send_modify(|s| {
                if let Some(id) = s.selected_notification_id() {
                    s.notifications.mark_read(&id);
                }
            }),
            TuiCommand::MarkAllRead => self.state_tx.send_modify(|s| s.notifications.mark_all_read()),
            TuiCommand::Logout => self.logout().await,
            TuiCommand::DismissError => self.state_tx.send_modify(|s| {
                let view = s.view;
                s.clear_error(view);
            }),
            TuiCommand::ToggleLogs => self.state_tx.send_modify(|s| {
                s.log_focus = !s.log_focus;
                s.log_scroll_offset = 0;
            }),
            TuiCommand::Scroll(delta) => self.state_tx.send_modify(|s| s.scroll(delta)),
        }
    }

    async fn load_view(&mut self, view: View) {
        let result = match view {
            View::Dashboard => self.load_dashboard().await,
            View::Live => {
                self.start_live();
                Ok(())
            }
            View::History | View::Report => self.load_history(view).await,
            View::MyBets => self.load_my_bets().await,
            View::Notifications => Ok(()),
        };
        if let Err(e) = result {
            self.fail(view, &e);
        }
    }

    /// The history-backed view whose banner a history fetch reports to.
    fn history_view(&self) -> View {
        match self.state_tx.borrow().view {
            View::Report => View::Report,
            _ => View::History,
        }
    }

    fn set_loading(&self, loading: bool) {
        self.state_tx.send_modify(|s| s.loading = loading);
    }

    /// Banner plus log line for a failed request. A 401 while logged in
    /// means the token is no longer accepted, so the session is dropped.
    fn fail(&mut self, view: View, e: &ApiError) {
        tracing::warn!(?view, error = %e, "request failed");
        let message = e.user_message();
        self.state_tx.send_modify(|s| {
            s.loading = false;
            s.push_log("ERROR", format!("{}: {}", message, e));
            s.set_error(view, message);
        });
        if e.is_unauthorized() && self.session.is_authenticated() {
            self.expire_session();
        }
    }

    fn expire_session(&mut self) {
        tracing::warn!("session rejected by the server");
        self.live_poll = None;
        self.notifications = None;
        if let Err(e) = self.session.logout() {
            tracing::warn!(error = %e, "failed to remove session file");
        }
        self.state_tx.send_modify(|s| {
            s.clear_user();
            s.push_log("WARN", "sessão expirada, faça login novamente".to_string());
        });
    }

    async fn load_dashboard(&self) -> Result<(), ApiError> {
        let (start, end) = {
            let s = self.state_tx.borrow();
            (s.history_filter.start_date, s.history_filter.end_date)
        };
        self.set_loading(true);
        let data = self.api.dashboard(start, end).await?;
        self.state_tx.send_modify(|s| {
            s.dashboard = Some(data);
            s.loading = false;
            s.clear_error(View::Dashboard);
        });
        Ok(())
    }

    /// History and report share one fetch; the report is derived locally.
    async fn load_history(&self, view: View) -> Result<(), ApiError> {
        let criteria = self.state_tx.borrow().history_filter.clone();
        if criteria.has_inverted_range() {
            self.state_tx.send_modify(|s| s.history.clear());
            return Ok(());
        }
        self.set_loading(true);
        let bets = self.api.history(&criteria).await?;
        tracing::info!(count = bets.len(), "history loaded");
        self.state_tx.send_modify(|s| {
            s.history = bets;
            s.loading = false;
            s.clear_error(view);
        });
        Ok(())
    }

    async fn load_my_bets(&self) -> Result<(), ApiError> {
        let session = self.session.require()?;
        let (start, end) = {
            let s = self.state_tx.borrow();
            (s.history_filter.start_date, s.history_filter.end_date)
        };
        self.set_loading(true);

        let resp = self.api.user_bets(session, start, end).await?;
        self.state_tx.send_modify(|s| {
            s.my_bets = resp.bets;
            s.clear_error(View::MyBets);
        });
        let report = self.api.performance(session).await?;
        self.state_tx.send_modify(|s| {
            s.performance = Some(report);
            s.loading = false;
        });
        Ok(())
    }

    fn start_live(&mut self) {
        if self.live_poll.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }
        let source: Arc<dyn LiveBetSource> = self.api.clone();
        let user_id = self.session.user().map(|u| u.id.clone());
        self.live_poll = Some(spawn_live_poller(
            source,
            user_id,
            self.poll_interval,
            self.thresholds.clone(),
            self.state_tx.clone(),
        ));
    }

    fn stop_live(&mut self) {
        if self.live_poll.take().is_some() {
            tracing::info!("live poller stopped");
        }
        self.state_tx.send_modify(|s| s.live_polling = false);
    }

    fn start_notifications(&mut self) {
        let Some(user) = self.session.user() else {
            return;
        };
        self.notifications = Some(spawn_notifications(&self.ws_url, user.id.clone(), self.state_tx.clone()));
    }

    async fn add_bet(&self, form: AddBetForm) -> Result<(), ApiError> {
        let session = self.session.require()?;
        let request = form
            .into_request(&session.user, chrono::Utc::now())
            .map_err(ApiError::Validation)?;
        self.api.add_user_bet(session, &request).await?;
        tracing::info!(bet_id = %request.bet_id, "bet added");
        self.state_tx.send_modify(|s| {
            s.push_log("INFO", format!("Aposta adicionada: {}", request.bet_title));
            s.clear_error(View::History);
        });
        Ok(())
    }

    async fn logout(&mut self) {
        self.live_poll = None;
        self.notifications = None;
        if let Err(e) = self.session.logout() {
            tracing::warn!(error = %e, "failed to remove session file");
        }
        self.state_tx.send_modify(|s| {
            s.clear_user();
            s.switch_view(View::Dashboard);
            s.push_log("INFO", "sessão encerrada".to_string());
        });
        self.load_view(View::Dashboard).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::AuthResponse;
    use crate::notifications::parse_notification;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    /// Answers every request with 401.
    async fn rejecting_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = sock.read(&mut buf).await;
                let _ = sock
                    .write_all(b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                    .await;
            }
        });
        format!("http://{}", addr)
    }

    fn logged_in(default_stake: Option<f64>) -> SessionContext {
        let mut ctx = SessionContext::in_memory();
        let token = format!("h.{}.s", URL_SAFE_NO_PAD.encode(r#"{"sub":"u-1"}"#));
        ctx.establish(AuthResponse {
            auth_token: token,
            message: None,
            full_name: "Bruno Lima".to_string(),
            email: "bruno@example.com".to_string(),
            default_stake,
            balance: 300.0,
        })
        .unwrap();
        ctx
    }

    async fn app_against_rejecting_backend(session: SessionContext) -> (App, watch::Receiver<AppState>) {
        let api = Arc::new(BetApi::new(&rejecting_backend().await, Duration::from_secs(2)).unwrap());
        let (tx, rx) = watch::channel(AppState::new());
        tx.send_modify(|s| s.user = session.user().cloned());
        (App::new(&Config::default(), api, session, tx), rx)
    }

    fn form(stake: Option<f64>) -> AddBetForm {
        AddBetForm {
            bet_id: "b-7".to_string(),
            player_name: "Ja Morant".to_string(),
            category: "Assists".to_string(),
            odd: 1.9,
            stake,
            meta: 8.5,
        }
    }

    #[tokio::test]
    async fn test_rejected_token_logs_out() {
        let (mut app, rx) = app_against_rejecting_backend(logged_in(Some(20.0))).await;

        app.handle(TuiCommand::SwitchView(View::MyBets)).await;
        assert!(!app.session.is_authenticated());
        let state = rx.borrow();
        assert!(state.user.is_none());
        assert!(state.error_for(View::MyBets).is_some());
        assert_eq!(state.logs.back().unwrap().message, "sessão expirada, faça login novamente");
    }

    #[tokio::test]
    async fn test_add_bet_uses_edited_stake() {
        let (mut app, rx) = app_against_rejecting_backend(logged_in(None)).await;

        // No default stake and none typed: rejected locally, session kept.
        app.handle(TuiCommand::AddBet(form(None))).await;
        assert_eq!(rx.borrow().error_for(View::History), Some("A stake deve ser maior que zero"));
        assert!(app.session.is_authenticated());

        // A typed stake validates and reaches the backend, which answers 401.
        app.handle(TuiCommand::AddBet(form(Some(10.0)))).await;
        assert!(!app.session.is_authenticated());
        assert!(rx.borrow().user.is_none());
    }

    #[test]
    fn test_connection_events_toggle_flag() {
        let mut state = AppState::new();
        apply_notification_event(&mut state, NotificationEvent::Connected);
        assert!(state.notifications.is_connected());

        apply_notification_event(&mut state, NotificationEvent::Disconnected("closed".to_string()));
        assert!(!state.notifications.is_connected());
        assert_eq!(state.logs.back().unwrap().level, "WARN");
    }

    #[test]
    fn test_notification_raises_toast_and_counts_unread() {
        let mut state = AppState::new();
        let n = parse_notification(r#"{"title":"Meta batida","message":"Jokić 10 assistências"}"#, chrono::Utc::now())
            .unwrap();
        apply_notification_event(&mut state, NotificationEvent::Notification(n));

        assert_eq!(state.notifications.unread_count(), 1);
        let toast = state.visible_toast().unwrap();
        assert_eq!(toast.notification.title.as_deref(), Some("Meta batida"));
        assert_eq!(state.logs.back().unwrap().message, "Meta batida: Jokić 10 assistências");
    }

    #[tokio::test]
    async fn test_logged_out_my_bets_shows_banner() {
        let (tx, rx) = watch::channel(AppState::new());
        let api = Arc::new(BetApi::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap());
        let mut app = App::new(&Config::default(), api, SessionContext::in_memory(), tx);

        app.handle(TuiCommand::SwitchView(View::MyBets)).await;
        let state = rx.borrow();
        assert_eq!(state.view, View::MyBets);
        assert_eq!(state.error_for(View::MyBets), Some("Usuário não autenticado"));
    }

    #[tokio::test]
    async fn test_leaving_live_stops_poller() {
        let (tx, rx) = watch::channel(AppState::new());
        let api = Arc::new(BetApi::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap());
        let mut app = App::new(&Config::default(), api, SessionContext::in_memory(), tx);

        app.handle(TuiCommand::SwitchView(View::Live)).await;
        assert!(app.live_poll.is_some());
        assert!(rx.borrow().live_polling);

        app.handle(TuiCommand::SwitchView(View::Notifications)).await;
        assert!(app.live_poll.is_none());
        assert!(!rx.borrow().live_polling);
    }
}
