use crate::api::types::{BetRecord, BetStatus, Category, DashboardData, PerformanceReport, User};
use crate::engine::filter::{self, FilterCriteria};
use crate::engine::pace::LiveBetView;
use crate::engine::report::{self, AggregateRow, ReportMode, SortField, SortState};
use crate::engine::summary::{self, BetSummary};
use crate::notifications::{Notification, NotificationCenter};
use chrono::{Datelike, Duration as ChronoDuration, NaiveDate};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const MAX_LOGS: usize = 200;
pub const TOAST_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum View {
    #[default]
    Dashboard,
    Live,
    History,
    Report,
    MyBets,
    Notifications,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Dashboard,
        View::Live,
        View::History,
        View::Report,
        View::MyBets,
        View::Notifications,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Live => "Tempo Real",
            View::History => "Histórico",
            View::Report => "Relatório",
            View::MyBets => "Minhas Apostas",
            View::Notifications => "Notificações",
        }
    }

    pub fn index(&self) -> usize {
        View::ALL.iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn next(&self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn empty_message(&self) -> &'static str {
        match self {
            View::Dashboard => "Nenhum dado disponível para o período",
            View::Live => "Nenhuma aposta ao vivo no momento",
            View::History => "Nenhuma aposta encontrada",
            View::Report => "Nenhum dado para o relatório",
            View::MyBets => "Você ainda não adicionou apostas",
            View::Notifications => "Nenhuma notificação",
        }
    }
}

/// Quick date ranges, relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatePreset {
    #[default]
    All,
    Today,
    Last7Days,
    Last30Days,
    ThisMonth,
}

impl DatePreset {
    pub fn label(&self) -> &'static str {
        match self {
            DatePreset::All => "Todo o período",
            DatePreset::Today => "Hoje",
            DatePreset::Last7Days => "Últimos 7 dias",
            DatePreset::Last30Days => "Últimos 30 dias",
            DatePreset::ThisMonth => "Este mês",
        }
    }

    pub fn next(&self) -> DatePreset {
        match self {
            DatePreset::All => DatePreset::Today,
            DatePreset::Today => DatePreset::Last7Days,
            DatePreset::Last7Days => DatePreset::Last30Days,
            DatePreset::Last30Days => DatePreset::ThisMonth,
            DatePreset::ThisMonth => DatePreset::All,
        }
    }

    pub fn range(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            DatePreset::All => (None, None),
            DatePreset::Today => (Some(today), Some(today)),
            DatePreset::Last7Days => (Some(today - ChronoDuration::days(6)), Some(today)),
            DatePreset::Last30Days => (Some(today - ChronoDuration::days(29)), Some(today)),
            DatePreset::ThisMonth => (today.with_day(1), Some(today)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

impl Toast {
    pub fn is_visible(&self) -> bool {
        self.shown_at.elapsed() < TOAST_DURATION
    }
}

/// Page-level error, shown only on the view that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub view: View,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    pub start_time: Instant,
    pub user: Option<User>,
    pub loading: bool,
    pub banner: Option<Banner>,

    pub date_preset: DatePreset,
    pub dashboard: Option<DashboardData>,

    pub live: Vec<LiveBetView>,
    pub live_updated: Option<chrono::DateTime<chrono::Local>>,
    pub live_polling: bool,

    pub history: Vec<BetRecord>,
    pub history_filter: FilterCriteria,

    pub report_mode: ReportMode,
    pub report_sort: SortState,
    pub report_player: Option<String>,

    pub my_bets: Vec<BetRecord>,
    pub my_bets_status: Option<BetStatus>,
    pub performance: Option<PerformanceReport>,

    pub notifications: NotificationCenter,
    pub toast: Option<Toast>,

    pub logs: VecDeque<LogEntry>,
    pub log_focus: bool,
    pub log_scroll_offset: usize,
    pub selected: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            view: View::Dashboard,
            start_time: Instant::now(),
            user: None,
            loading: false,
            banner: None,
            date_preset: DatePreset::All,
            dashboard: None,
            live: Vec::new(),
            live_updated: None,
            live_polling: false,
            history: Vec::new(),
            history_filter: FilterCriteria::default(),
            report_mode: ReportMode::Category,
            report_sort: SortState::default(),
            report_player: None,
            my_bets: Vec::new(),
            my_bets_status: None,
            performance: None,
            notifications: NotificationCenter::new(),
            toast: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            log_focus: false,
            log_scroll_offset: 0,
            selected: 0,
        }
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let time = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        if self.logs.len() >= MAX_LOGS {
            self.logs.pop_front();
        }
        self.logs.push_back(LogEntry {
            time,
            level: level.to_string(),
            message,
        });
    }

    pub fn set_error(&mut self, view: View, message: String) {
        self.banner = Some(Banner { view, message });
    }

    pub fn clear_error(&mut self, view: View) {
        if self.banner.as_ref().is_some_and(|b| b.view == view) {
            self.banner = None;
        }
    }

    pub fn error_for(&self, view: View) -> Option<&str> {
        self.banner
            .as_ref()
            .filter(|b| b.view == view)
            .map(|b| b.message.as_str())
    }

    pub fn switch_view(&mut self, view: View) {
        if self.view != view {
            self.view = view;
            self.selected = 0;
        }
    }

    /// Store a pushed notification and raise it as the toast.
    pub fn notify(&mut self, notification: Notification) {
        self.toast = Some(Toast {
            notification: notification.clone(),
            shown_at: Instant::now(),
        });
        self.notifications.push(notification);
    }

    pub fn visible_toast(&self) -> Option<&Toast> {
        self.toast.as_ref().filter(|t| t.is_visible())
    }

    /// Apply the current date preset to the history criteria.
    pub fn set_date_preset(&mut self, preset: DatePreset, today: NaiveDate) {
        let (start, end) = preset.range(today);
        self.date_preset = preset;
        self.history_filter.start_date = start;
        self.history_filter.end_date = end;
    }

    pub fn cycle_category(&mut self) {
        let current = self
            .history_filter
            .category
            .as_deref()
            .and_then(Category::from_tag);
        self.history_filter.category = Category::cycle(current).map(|c| c.tag().to_string());
        self.selected = 0;
    }

    pub fn cycle_my_bets_status(&mut self) {
        self.my_bets_status = match &self.my_bets_status {
            None => Some(BetStatus::Pending),
            Some(BetStatus::Loss) => None,
            Some(status) => Some(status.next_filter()),
        };
        self.selected = 0;
    }

    pub fn filtered_history(&self) -> Vec<BetRecord> {
        filter::apply(&self.history, &self.history_filter)
    }

    pub fn report_rows(&self) -> Vec<AggregateRow> {
        report::build_report(
            &self.filtered_history(),
            self.report_mode,
            self.report_player.as_deref(),
            &self.report_sort,
        )
    }

    pub fn sort_report(&mut self, field: SortField) {
        self.report_sort.toggle(field);
    }

    pub fn filtered_my_bets(&self) -> Vec<BetRecord> {
        let criteria = FilterCriteria {
            status: self.my_bets_status.clone(),
            ..Default::default()
        };
        filter::apply(&self.my_bets, &criteria)
    }

    pub fn my_bets_summary(&self) -> BetSummary {
        summary::summarize(&self.my_bets)
    }

    /// Row count of the table on the current view, for scrolling.
    pub fn row_count(&self) -> usize {
        match self.view {
            View::Dashboard => self.dashboard.as_ref().map_or(0, |d| d.monthly_profits.len()),
            View::Live => self.live.len(),
            View::History => self.filtered_history().len(),
            View::Report => self.report_rows().len(),
            View::MyBets => self.filtered_my_bets().len(),
            View::Notifications => self.notifications.len(),
        }
    }

    pub fn scroll(&mut self, delta: isize) {
        if self.log_focus {
            self.log_scroll_offset = self.log_scroll_offset.saturating_add_signed(-delta);
            return;
        }
        let max = self.row_count().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(max);
    }

    pub fn selected_history_bet(&self) -> Option<BetRecord> {
        self.filtered_history().into_iter().nth(self.selected)
    }

    pub fn selected_notification_id(&self) -> Option<String> {
        self.notifications
            .iter_recent()
            .nth(self.selected)
            .map(|n| n.id.clone())
    }

    /// Drop everything tied to the logged-in user.
    pub fn clear_user(&mut self) {
        self.user = None;
        self.my_bets.clear();
        self.performance = None;
        self.notifications.clear();
        self.toast = None;
        self.live.clear();
        self.live_updated = None;
        self.live_polling = false;
    }

    pub fn uptime(&self) -> String {
        let secs = self.start_time.elapsed().as_secs();
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        format!("{}h {:02}m", h, m)
    }
}
