pub mod render;
pub mod state;

use crate::engine::report::SortField;
use crate::forms::AddBetForm;
use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use state::{AppState, View};
use std::io::stdout;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Commands the TUI sends back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum TuiCommand {
    Quit,
    SwitchView(View),
    Refresh,
    CycleDatePreset,
    CycleCategory,
    SetSearch(Option<String>),
    CycleReportMode,
    SetReportPlayer(Option<String>),
    SortReport(SortField),
    CycleBetStatus,
    AddBet(AddBetForm),
    MarkSelectedRead,
    MarkAllRead,
    Logout,
    DismissError,
    ToggleLogs,
    Scroll(isize),
}

/// What a line of typed text will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTarget {
    Search,
    ReportPlayer,
    BetOdd,
    BetStake,
    BetMeta,
}

impl InputTarget {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputTarget::Search => "Buscar jogador ou time",
            InputTarget::ReportPlayer => "Filtrar jogador",
            InputTarget::BetOdd => "Odd",
            InputTarget::BetStake => "Stake (vazio = padrão)",
            InputTarget::BetMeta => "Meta",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputLine {
    pub target: InputTarget,
    pub buffer: String,
    /// Add-bet form being filled in, one field per prompt.
    pub draft: Option<AddBetForm>,
}

fn parse_amount(text: &str) -> Option<f64> {
    text.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

fn format_amount(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl InputLine {
    pub fn new(target: InputTarget, buffer: impl Into<String>) -> Self {
        Self {
            target,
            buffer: buffer.into(),
            draft: None,
        }
    }

    /// Odd, then stake, then meta, each prefilled from the form.
    pub fn add_bet(form: AddBetForm) -> Self {
        Self {
            target: InputTarget::BetOdd,
            buffer: format_amount(Some(form.odd)),
            draft: Some(form),
        }
    }

    fn submit(self, state: &AppState) -> KeyOutcome {
        let InputLine { target, buffer, draft } = self;
        let value = Some(buffer.trim().to_string()).filter(|v| !v.is_empty());
        let mut form = match (target, draft) {
            (InputTarget::Search, _) => return KeyOutcome::Command(TuiCommand::SetSearch(value)),
            (InputTarget::ReportPlayer, _) => return KeyOutcome::Command(TuiCommand::SetReportPlayer(value)),
            (_, Some(form)) => form,
            (_, None) => return KeyOutcome::Input(None),
        };
        // Unparseable text keeps the prompt open.
        let amount = match value.as_deref().map(parse_amount) {
            Some(None) => return KeyOutcome::Ignored,
            Some(Some(v)) => Some(v),
            None => None,
        };

        match target {
            InputTarget::BetOdd => {
                let Some(odd) = amount else {
                    return KeyOutcome::Ignored;
                };
                form.odd = odd;
                let default_stake = state.user.as_ref().and_then(|u| u.default_stake);
                KeyOutcome::Input(Some(InputLine {
                    target: InputTarget::BetStake,
                    buffer: format_amount(form.stake.or(default_stake)),
                    draft: Some(form),
                }))
            }
            InputTarget::BetStake => {
                form.stake = amount;
                KeyOutcome::Input(Some(InputLine {
                    target: InputTarget::BetMeta,
                    buffer: format_amount(Some(form.meta)),
                    draft: Some(form),
                }))
            }
            InputTarget::BetMeta => {
                let Some(meta) = amount else {
                    return KeyOutcome::Ignored;
                };
                form.meta = meta;
                KeyOutcome::Command(TuiCommand::AddBet(form))
            }
            InputTarget::Search | InputTarget::ReportPlayer => KeyOutcome::Input(None),
        }
    }
}

/// Result of one key press: a command for the controller, a change to the
/// local input line, or nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Command(TuiCommand),
    Input(Option<InputLine>),
    Ignored,
}

/// Map a key press to its effect, given the current view and any open
/// input line.
pub fn handle_key(key: KeyEvent, state: &AppState, input: Option<&InputLine>) -> KeyOutcome {
    if let Some(line) = input {
        let mut line = line.clone();
        return match key.code {
            KeyCode::Esc => KeyOutcome::Input(None),
            KeyCode::Enter => line.submit(state),
            KeyCode::Backspace => {
                line.buffer.pop();
                KeyOutcome::Input(Some(line))
            }
            KeyCode::Char(c) => {
                line.buffer.push(c);
                KeyOutcome::Input(Some(line))
            }
            _ => KeyOutcome::Ignored,
        };
    }

    let cmd = match (key.code, state.view) {
        (KeyCode::Char('q'), _) => TuiCommand::Quit,
        (KeyCode::Tab, _) => TuiCommand::SwitchView(state.view.next()),
        (KeyCode::Char(c @ '1'..='6'), _) => {
            let idx = c as usize - '1' as usize;
            TuiCommand::SwitchView(View::ALL[idx])
        }
        (KeyCode::Char('r'), _) => TuiCommand::Refresh,
        (KeyCode::Char('l'), _) => TuiCommand::ToggleLogs,
        (KeyCode::Esc, _) if state.log_focus => TuiCommand::ToggleLogs,
        (KeyCode::Esc, _) => TuiCommand::DismissError,
        (KeyCode::Char('j') | KeyCode::Down, _) => TuiCommand::Scroll(1),
        (KeyCode::Char('k') | KeyCode::Up, _) => TuiCommand::Scroll(-1),
        (KeyCode::PageDown, _) => TuiCommand::Scroll(10),
        (KeyCode::PageUp, _) => TuiCommand::Scroll(-10),
        (KeyCode::Char('x'), _) => TuiCommand::Logout,
        (KeyCode::Char('d'), View::Dashboard | View::History | View::Report | View::MyBets) => {
            TuiCommand::CycleDatePreset
        }

        (KeyCode::Char('/'), View::History) => {
            return KeyOutcome::Input(Some(InputLine::new(
                InputTarget::Search,
                state.history_filter.search_term.clone().unwrap_or_default(),
            )))
        }
        (KeyCode::Char('c'), View::History) => TuiCommand::CycleCategory,
        (KeyCode::Char('a'), View::History) => {
            let Some(bet) = state.selected_history_bet() else {
                return KeyOutcome::Ignored;
            };
            let form = AddBetForm::for_bet(&bet);
            // Logged out: let the controller raise the banner right away.
            if state.user.is_none() {
                return KeyOutcome::Command(TuiCommand::AddBet(form));
            }
            return KeyOutcome::Input(Some(InputLine::add_bet(form)));
        }

        (KeyCode::Char('/'), View::Report) => {
            return KeyOutcome::Input(Some(InputLine::new(
                InputTarget::ReportPlayer,
                state.report_player.clone().unwrap_or_default(),
            )))
        }
        (KeyCode::Char('m'), View::Report) => TuiCommand::CycleReportMode,
        (KeyCode::Char('t'), View::Report) => TuiCommand::SortReport(SortField::Total),
        (KeyCode::Char('s'), View::Report) => TuiCommand::SortReport(SortField::StakeTotal),
        (KeyCode::Char('p'), View::Report) => TuiCommand::SortReport(SortField::ProfitTotal),
        (KeyCode::Char('w'), View::Report) => TuiCommand::SortReport(SortField::Wins),
        (KeyCode::Char('c'), View::Report) => TuiCommand::SortReport(SortField::Category),
        (KeyCode::Char('n'), View::Report) => TuiCommand::SortReport(SortField::Player),

        (KeyCode::Char('f'), View::MyBets) => TuiCommand::CycleBetStatus,

        (KeyCode::Enter, View::Notifications) => TuiCommand::MarkSelectedRead,
        (KeyCode::Char('a'), View::Notifications) => TuiCommand::MarkAllRead,

        _ => return KeyOutcome::Ignored,
    };
    KeyOutcome::Command(cmd)
}

/// Run the TUI. Reads state from `state_rx`, sends commands on `cmd_tx`.
pub async fn run_tui(state_rx: watch::Receiver<AppState>, cmd_tx: mpsc::Sender<TuiCommand>) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = tui_loop(&mut terminal, state_rx, cmd_tx).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    mut state_rx: watch::Receiver<AppState>,
    cmd_tx: mpsc::Sender<TuiCommand>,
) -> Result<()> {
    let mut events = EventStream::new();
    // Redraw tick so the toast expires without new state.
    let mut tick = tokio::time::interval(Duration::from_millis(250));
    let mut input: Option<InputLine> = None;

    loop {
        let state = state_rx.borrow().clone();
        terminal.draw(|f| render::draw(f, &state, input.as_ref()))?;

        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else { return Ok(()) };
                if let Event::Key(key) = event? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    match handle_key(key, &state, input.as_ref()) {
                        KeyOutcome::Command(TuiCommand::Quit) => {
                            dispatch(&cmd_tx, TuiCommand::Quit);
                            return Ok(());
                        }
                        KeyOutcome::Command(cmd) => {
                            input = None;
                            dispatch(&cmd_tx, cmd);
                        }
                        KeyOutcome::Input(next) => input = next,
                        KeyOutcome::Ignored => {}
                    }
                }
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    // Controller is gone.
                    return Ok(());
                }
            }
            _ = tick.tick() => {}
        }
    }
}

/// Hand a command to the controller without waiting on it, so a slow
/// request never stalls drawing. Returns false when the command was dropped.
fn dispatch(cmd_tx: &mpsc::Sender<TuiCommand>, cmd: TuiCommand) -> bool {
    match cmd_tx.try_send(cmd) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(cmd)) => {
            tracing::warn!(?cmd, "controller busy, command dropped");
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::debug!("controller gone");
            false
        }
    }
}
