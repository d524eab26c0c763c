use std::borrow::Cow;

use super::state::{AppState, View};
use super::InputLine;
use crate::api::types::{BetRecord, BetStatus, Category};
use crate::engine::filter::player_suggestions;
use crate::engine::pace::LiveStatus;
use crate::engine::report::{format_success_rate, ReportMode, SortField};
use crate::notifications::Priority;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs},
    Frame,
};

const LOG_PANEL_HEIGHT: u16 = 6;

pub fn draw(f: &mut Frame, state: &AppState, input: Option<&InputLine>) {
    let banner = state.error_for(state.view);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(if banner.is_some() { 1 } else { 0 }),
            Constraint::Min(5),
            Constraint::Length(if state.log_focus { 0 } else { LOG_PANEL_HEIGHT }),
            Constraint::Length(if input.is_some() { 1 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, state, chunks[0]);
    draw_tabs(f, state, chunks[1]);
    if let Some(message) = banner {
        draw_banner(f, message, chunks[2]);
    }

    if state.log_focus {
        draw_logs(f, state, chunks[3]);
    } else {
        match state.view {
            View::Dashboard => draw_dashboard(f, state, chunks[3]),
            View::Live => draw_live(f, state, chunks[3]),
            View::History => draw_history(f, state, chunks[3]),
            View::Report => draw_report(f, state, chunks[3]),
            View::MyBets => draw_my_bets(f, state, chunks[3]),
            View::Notifications => draw_notifications(f, state, chunks[3]),
        }
        draw_logs(f, state, chunks[4]);
    }

    if let Some(line) = input {
        draw_input(f, state, line, chunks[5]);
    }
    draw_footer(f, state, chunks[6]);
    draw_toast(f, state);
}

fn draw_header(f: &mut Frame, state: &AppState, area: Rect) {
    let user = match &state.user {
        Some(u) => Span::styled(u.full_name.clone(), Style::default().fg(Color::Green)),
        None => Span::styled("não autenticado", Style::default().fg(Color::DarkGray)),
    };
    let balance = state
        .user
        .as_ref()
        .map(|u| format_money(u.balance))
        .unwrap_or_else(|| "-".to_string());

    let ws = if state.notifications.is_connected() {
        Span::styled("OK", Style::default().fg(Color::Green))
    } else {
        Span::styled("OFF", Style::default().fg(Color::Red))
    };

    let unread = state.notifications.unread_count();
    let bell = if unread > 0 {
        Span::styled(
            format!(" {} nova(s)", unread),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" 0", Style::default().fg(Color::DarkGray))
    };

    let mut spans = vec![
        Span::raw(" "),
        user,
        Span::styled("  Saldo: ", Style::default().fg(Color::DarkGray)),
        Span::raw(balance),
        Span::styled("  |  WS: ", Style::default().fg(Color::DarkGray)),
        ws,
        Span::styled("  |  Notif:", Style::default().fg(Color::DarkGray)),
        bell,
        Span::styled("  |  Up: ", Style::default().fg(Color::DarkGray)),
        Span::raw(state.uptime()),
    ];
    if state.loading {
        spans.push(Span::styled("  carregando...", Style::default().fg(Color::Cyan)));
    }

    let block = Block::default()
        .title(" BasketBet Pro ")
        .borders(Borders::ALL);
    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn draw_tabs(f: &mut Frame, state: &AppState, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.view.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        .divider("|");
    f.render_widget(tabs, area);
}

fn draw_banner(f: &mut Frame, message: &str, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" ! ", Style::default().fg(Color::Black).bg(Color::Red)),
        Span::styled(format!(" {}", message), Style::default().fg(Color::Red)),
        Span::styled("  [Esc] fechar", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Centered placeholder used by every view with nothing to show.
fn draw_empty(f: &mut Frame, state: &AppState, area: Rect, title: &str, subtitle: Option<String>) {
    let message = if state.loading {
        "Carregando..."
    } else {
        state.view.empty_message()
    };
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            message,
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(sub) = subtitle {
        lines.push(Line::from(Span::styled(sub, Style::default().fg(Color::DarkGray))));
    }
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).alignment(Alignment::Center).block(block), area);
}

fn draw_dashboard(f: &mut Frame, state: &AppState, area: Rect) {
    let title = format!(" Dashboard ({}) ", state.date_preset.label());
    let Some(data) = &state.dashboard else {
        draw_empty(f, state, area, &title, None);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let stats = Line::from(vec![
        Span::styled(" Lucro do mês: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format_money(data.monthly_profit), Style::default().fg(money_color(data.monthly_profit))),
        Span::styled("  Lucro total: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format_money(data.total_profit), Style::default().fg(money_color(data.total_profit))),
        Span::styled("  Taxa de acerto: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_success_rate(data.success_rate, data.total_bets)),
        Span::styled("  Apostas: ", Style::default().fg(Color::DarkGray)),
        Span::raw(data.total_bets.to_string()),
        Span::styled("  ROI: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("{:.2}%", data.roi), Style::default().fg(money_color(data.roi))),
    ]);
    f.render_widget(
        Paragraph::new(stats).block(Block::default().title(title).borders(Borders::ALL)),
        chunks[0],
    );

    if data.monthly_profits.is_empty() {
        draw_empty(f, state, chunks[1], " Lucro mensal ", None);
        return;
    }

    let header = Row::new(vec!["Mês", "Lucro", "Apostas", "Taxa"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows: Vec<Row> = data
        .monthly_profits
        .iter()
        .map(|m| {
            Row::new(vec![
                Cell::from(m.month.clone()),
                Cell::from(format_money(m.profit)).style(Style::default().fg(money_color(m.profit))),
                Cell::from(m.total_bets.to_string()),
                Cell::from(format_success_rate(m.success_rate, m.total_bets)),
            ])
        })
        .collect();
    let rows = window(rows, state.selected, chunks[1]);
    let table = Table::new(
        rows,
        [
            Constraint::Min(10),
            Constraint::Length(14),
            Constraint::Length(9),
            Constraint::Length(9),
        ],
    )
    .header(header)
    .block(Block::default().title(" Lucro mensal ").borders(Borders::ALL));
    f.render_widget(table, chunks[1]);
}

fn draw_live(f: &mut Frame, state: &AppState, area: Rect) {
    let updated = state
        .live_updated
        .map(|t| format!("atualizado {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "aguardando primeira atualização".to_string());
    let title = format!(" Apostas ao vivo [{}] ", updated);

    if state.live.is_empty() {
        draw_empty(f, state, area, &title, None);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let fixed = 10 + 12 + 7 + 6 + 7 + 6 + 20 + 10;
    let player_w = inner_width.saturating_sub(fixed).max(8);

    let header = Row::new(vec![
        "Jogador", "Categoria", "Atual/Meta", "Falta", "Ritmo", "Min", "%", "Status", "Lucro pot.",
    ])
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = state
        .live
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let pace = if v.metrics.required_pace_per_minute.is_infinite() {
                "∞".to_string()
            } else {
                format!("{:.2}", v.metrics.required_pace_per_minute)
            };
            let player = truncate_with_ellipsis(&v.bet.player_name, player_w).into_owned();
            let row = Row::new(vec![
                Cell::from(player),
                Cell::from(category_label(&v.bet.category)),
                Cell::from(format!("{}/{}", v.bet.current_value, v.bet.target)),
                Cell::from(format!("{}", v.metrics.remaining_value)),
                Cell::from(pace),
                Cell::from(format!("{}", v.bet.remaining_minutes)),
                Cell::from(format!("{:.0}%", v.metrics.completion_percentage)),
                Cell::from(v.status.label().to_string()).style(Style::default().fg(live_status_color(&v.status))),
                Cell::from(format_money(v.potential_profit)),
            ]);
            let row = if v.status.is_settled() {
                row.style(Style::default().add_modifier(Modifier::DIM))
            } else {
                row
            };
            selectable(row, i == state.selected)
        })
        .collect();
    let rows = window(rows, state.selected, area);

    let table = Table::new(
        rows,
        [
            Constraint::Length(player_w as u16),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(20),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(table, area);
}

fn filter_summary(state: &AppState) -> String {
    let category = state
        .history_filter
        .category
        .as_deref()
        .map(category_label)
        .unwrap_or_else(|| "Todas".to_string());
    let search = state
        .history_filter
        .search_term
        .as_deref()
        .unwrap_or("-");
    format!(
        "Período: {}  Categoria: {}  Busca: {}",
        state.date_preset.label(),
        category,
        search
    )
}

fn bet_rows<'a>(bets: &'a [BetRecord], selected: usize, player_w: usize) -> Vec<Row<'a>> {
    bets.iter()
        .enumerate()
        .map(|(i, b)| {
            let row = Row::new(vec![
                Cell::from(b.date.format("%d/%m/%Y").to_string()),
                Cell::from(truncate_with_ellipsis(&b.player_name, player_w).into_owned()),
                Cell::from(category_label(&b.category)),
                Cell::from(format!("{}", b.target)),
                Cell::from(b.result.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string())),
                Cell::from(format!("{:.2}", b.odds)),
                Cell::from(format_money(b.stake)),
                Cell::from(format_money(b.profit)).style(Style::default().fg(money_color(b.profit))),
                Cell::from(b.status.label().to_string()).style(Style::default().fg(bet_status_color(&b.status))),
            ]);
            selectable(row, i == selected)
        })
        .collect()
}

const BET_HEADERS: [&str; 9] = ["Data", "Jogador", "Categoria", "Meta", "Result.", "Odd", "Stake", "Lucro", "Status"];

fn bet_constraints(player_w: usize) -> [Constraint; 9] {
    [
        Constraint::Length(10),
        Constraint::Length(player_w as u16),
        Constraint::Length(12),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Length(5),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Length(9),
    ]
}

fn player_width(area: Rect) -> usize {
    let fixed = 10 + 12 + 6 + 7 + 5 + 11 + 11 + 9 + 9;
    (area.width.saturating_sub(2) as usize).saturating_sub(fixed).max(8)
}

fn draw_history(f: &mut Frame, state: &AppState, area: Rect) {
    let bets = state.filtered_history();
    let title = format!(" Histórico [{}] {} ", bets.len(), filter_summary(state));

    if bets.is_empty() {
        let sub = state
            .history_filter
            .has_inverted_range()
            .then(|| "Data inicial maior que a final".to_string());
        draw_empty(f, state, area, &title, sub);
        return;
    }

    let player_w = player_width(area);
    let header = Row::new(BET_HEADERS.to_vec()).style(Style::default().add_modifier(Modifier::BOLD));
    let rows = window(bet_rows(&bets, state.selected, player_w), state.selected, area);
    let table = Table::new(rows, bet_constraints(player_w))
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(table, area);
}

fn draw_report(f: &mut Frame, state: &AppState, area: Rect) {
    let rows = state.report_rows();
    let scope = match (state.report_mode, state.report_player.as_deref()) {
        (ReportMode::Player, Some(p)) => format!(" Jogador: {}", p),
        _ => String::new(),
    };
    let title = format!(
        " Relatório: {} [{}]{} {} ",
        state.report_mode.label(),
        state.date_preset.label(),
        scope,
        filter_summary(state)
    );

    if rows.is_empty() {
        draw_empty(f, state, area, &title, None);
        return;
    }

    let columns: Vec<SortField> = SortField::ALL
        .into_iter()
        .filter(|field| match state.report_mode {
            ReportMode::Category => *field != SortField::Player,
            ReportMode::Player => true,
            ReportMode::Ranking => *field != SortField::Category,
        })
        .collect();

    let mut headers: Vec<String> = columns
        .iter()
        .map(|field| {
            if *field == state.report_sort.field {
                format!("{} {}", field.header(), state.report_sort.direction.arrow())
            } else {
                field.header().to_string()
            }
        })
        .collect();
    headers.push("Taxa".to_string());
    let header = Row::new(headers).style(Style::default().add_modifier(Modifier::BOLD));

    let table_rows: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut cells: Vec<Cell> = columns
                .iter()
                .map(|field| match field {
                    SortField::Category => Cell::from(r.category.as_deref().map(category_label).unwrap_or_default()),
                    SortField::Player => Cell::from(r.player.clone().unwrap_or_default()),
                    SortField::Total => Cell::from(r.total.to_string()),
                    SortField::Wins => Cell::from(r.wins.to_string()),
                    SortField::StakeTotal => Cell::from(format_money(r.stake_total)),
                    SortField::ProfitTotal => Cell::from(format_money(r.profit_total))
                        .style(Style::default().fg(money_color(r.profit_total))),
                })
                .collect();
            cells.push(Cell::from(format_success_rate(r.success_rate(), r.total)));
            selectable(Row::new(cells), i == state.selected)
        })
        .collect();
    let table_rows = window(table_rows, state.selected, area);

    let mut constraints: Vec<Constraint> = columns
        .iter()
        .map(|field| match field {
            SortField::Category => Constraint::Length(14),
            SortField::Player => Constraint::Min(16),
            SortField::Total | SortField::Wins => Constraint::Length(10),
            SortField::StakeTotal | SortField::ProfitTotal => Constraint::Length(13),
        })
        .collect();
    constraints.push(Constraint::Length(9));

    let table = Table::new(table_rows, constraints)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));
    f.render_widget(table, area);
}

fn draw_my_bets(f: &mut Frame, state: &AppState, area: Rect) {
    if state.user.is_none() {
        draw_empty(
            f,
            state,
            area,
            " Minhas Apostas ",
            Some("Faça login com `basketbet login` para ver suas apostas".to_string()),
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let summary = state.my_bets_summary();
    let balance = state
        .performance
        .as_ref()
        .map(|p| p.balance)
        .or_else(|| state.user.as_ref().map(|u| u.balance))
        .unwrap_or(0.0);
    let stats = Line::from(vec![
        Span::styled(" Saldo: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_money(balance)),
        Span::styled("  Apostas: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(
            "{} ({}G/{}P/{} pend.)",
            summary.total, summary.wins, summary.losses, summary.pending
        )),
        Span::styled("  Stake: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_money(summary.stake_total)),
        Span::styled("  Lucro: ", Style::default().fg(Color::DarkGray)),
        Span::styled(format_money(summary.profit_total), Style::default().fg(money_color(summary.profit_total))),
        Span::styled("  Acerto: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format_success_rate(summary.success_rate, summary.total)),
        Span::styled("  ROI: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{:.2}%", summary.roi)),
    ]);
    let status = state
        .my_bets_status
        .as_ref()
        .map(|s| s.label().to_string())
        .unwrap_or_else(|| "Todos".to_string());
    let title = format!(" Minhas Apostas [{}] Status: {} ", state.date_preset.label(), status);
    f.render_widget(
        Paragraph::new(stats).block(Block::default().title(title).borders(Borders::ALL)),
        chunks[0],
    );

    let bets = state.filtered_my_bets();
    if bets.is_empty() {
        draw_empty(f, state, chunks[1], " Apostas ", None);
        return;
    }
    let player_w = player_width(chunks[1]);
    let header = Row::new(BET_HEADERS.to_vec()).style(Style::default().add_modifier(Modifier::BOLD));
    let rows = window(bet_rows(&bets, state.selected, player_w), state.selected, chunks[1]);
    let table = Table::new(rows, bet_constraints(player_w))
        .header(header)
        .block(Block::default().title(" Apostas ").borders(Borders::ALL));
    f.render_widget(table, chunks[1]);
}

fn draw_notifications(f: &mut Frame, state: &AppState, area: Rect) {
    let title = format!(
        " Notificações [{} não lidas / {}] ",
        state.notifications.unread_count(),
        state.notifications.len()
    );
    if state.notifications.is_empty() {
        draw_empty(f, state, area, &title, None);
        return;
    }

    let max_width = area.width.saturating_sub(2) as usize;
    let visible = area.height.saturating_sub(2) as usize;
    let offset = state.selected.saturating_sub(visible.saturating_sub(1));

    let lines: Vec<Line> = state
        .notifications
        .iter_recent()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, n)| {
            let marker = if n.read { "  " } else { "● " };
            let prefix = format!(" {}{} ", marker, n.timestamp.with_timezone(&chrono::Local).format("%d/%m %H:%M"));
            let text = match &n.title {
                Some(t) if !n.message.is_empty() => format!("{}: {}", t, n.message),
                Some(t) => t.clone(),
                None => n.message.clone(),
            };
            let text = truncate_with_ellipsis(&text, max_width.saturating_sub(prefix.chars().count())).into_owned();
            let mut style = Style::default().fg(priority_color(n.priority));
            if i == state.selected {
                style = style.add_modifier(Modifier::REVERSED);
            }
            if !n.read {
                style = style.add_modifier(Modifier::BOLD);
            }
            Line::from(vec![Span::styled(prefix, style), Span::styled(text, style)])
        })
        .collect();

    f.render_widget(
        Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL)),
        area,
    );
}

fn draw_logs(f: &mut Frame, state: &AppState, area: Rect) {
    if area.height == 0 {
        return;
    }
    let max_width = area.width.saturating_sub(2) as usize;
    let visible_lines = area.height.saturating_sub(2) as usize;

    let total = state.logs.len();
    let offset = if state.log_focus {
        state.log_scroll_offset.min(total.saturating_sub(visible_lines))
    } else {
        0
    };

    let lines: Vec<Line> = state
        .logs
        .iter()
        .rev()
        .skip(offset)
        .take(visible_lines)
        .map(|l| {
            let color = match l.level.as_str() {
                "ERROR" => Color::Red,
                "WARN" => Color::Yellow,
                "NOTIF" => Color::Cyan,
                _ => Color::DarkGray,
            };
            let prefix = format!(" {} [{}] ", l.time, l.level);
            let msg_max = max_width.saturating_sub(prefix.len());
            let msg = truncate_with_ellipsis(&l.message, msg_max);
            Line::from(vec![
                Span::styled(prefix, Style::default().fg(color)),
                Span::raw(msg.into_owned()),
            ])
        })
        .collect();

    let title = if state.log_focus {
        format!(" Log [{}/{} linhas] ", offset + visible_lines.min(total), total)
    } else {
        " Log ".to_string()
    };

    let block = Block::default().title(title).borders(Borders::ALL);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_input(f: &mut Frame, state: &AppState, line: &InputLine, area: Rect) {
    let mut spans = vec![
        Span::styled(format!(" {}: ", line.target.prompt()), Style::default().fg(Color::Yellow)),
        Span::raw(line.buffer.clone()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
    ];
    if let Some(draft) = &line.draft {
        spans.push(Span::styled(
            format!("   {} - {}", draft.player_name, draft.category),
            Style::default().fg(Color::DarkGray),
        ));
    } else {
        let suggestions = player_suggestions(&state.history, &line.buffer, 4);
        if !line.buffer.trim().is_empty() && !suggestions.is_empty() {
            spans.push(Span::styled(
                format!("   {}", suggestions.join(" | ")),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_hint(key: &str, label: &str) -> [Span<'static>; 2] {
    [
        Span::styled(format!("[{}]", key), Style::default().fg(Color::Yellow)),
        Span::raw(format!(" {}  ", label)),
    ]
}

fn draw_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let mut hints: Vec<(&str, &str)> = vec![("q", "sair"), ("Tab/1-6", "telas"), ("r", "atualizar"), ("l", "log")];
    if state.log_focus {
        hints = vec![("Esc", "voltar"), ("j/k", "rolar")];
    } else {
        match state.view {
            View::Dashboard => hints.push(("d", "período")),
            View::Live => {}
            View::History => hints.extend([("/", "buscar"), ("c", "categoria"), ("d", "período"), ("a", "adicionar")]),
            View::Report => hints.extend([
                ("m", "modo"),
                ("/", "jogador"),
                ("t/s/p/w/c/n", "ordenar"),
                ("d", "período"),
            ]),
            View::MyBets => hints.extend([("f", "status"), ("d", "período")]),
            View::Notifications => hints.extend([("Enter", "lida"), ("a", "todas lidas")]),
        }
        if state.user.is_some() {
            hints.push(("x", "logout"));
        }
    }

    let mut spans = vec![Span::raw(" ")];
    for (key, label) in hints {
        spans.extend(key_hint(key, label));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_toast(f: &mut Frame, state: &AppState) {
    let Some(toast) = state.visible_toast() else {
        return;
    };
    let area = f.area();
    let width = area.width.min(50);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + 1,
        width,
        height: 4,
    }
    .intersection(area);
    if rect.is_empty() {
        return;
    }

    let n = &toast.notification;
    let color = priority_color(n.priority);
    let title = n.title.clone().unwrap_or_else(|| "Notificação".to_string());
    let body = truncate_with_ellipsis(&n.message, width.saturating_sub(4) as usize).into_owned();
    let para = Paragraph::new(vec![Line::from(Span::raw(body))]).block(
        Block::default()
            .title(format!(" {} ", title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(para, rect);
}

/// Keep `selected` inside the visible slice of a bordered table.
fn window(rows: Vec<Row<'_>>, selected: usize, area: Rect) -> Vec<Row<'_>> {
    let visible = area.height.saturating_sub(3) as usize;
    let offset = selected.saturating_sub(visible.saturating_sub(1));
    rows.into_iter().skip(offset).take(visible).collect()
}

fn selectable(row: Row<'_>, selected: bool) -> Row<'_> {
    if selected {
        row.style(Style::default().add_modifier(Modifier::REVERSED))
    } else {
        row
    }
}

fn category_label(tag: &str) -> String {
    Category::from_tag(tag)
        .map(|c| c.label().to_string())
        .unwrap_or_else(|| tag.to_string())
}

pub fn format_money(value: f64) -> String {
    if value < 0.0 {
        format!("-R$ {:.2}", value.abs())
    } else {
        format!("R$ {:.2}", value)
    }
}

fn money_color(value: f64) -> Color {
    if value > 0.0 {
        Color::Green
    } else if value < 0.0 {
        Color::Red
    } else {
        Color::Gray
    }
}

fn bet_status_color(status: &BetStatus) -> Color {
    match status {
        BetStatus::Win => Color::Green,
        BetStatus::Loss => Color::Red,
        BetStatus::Pending => Color::Yellow,
        BetStatus::Unknown(_) => Color::Gray,
    }
}

fn live_status_color(status: &LiveStatus) -> Color {
    match status {
        LiveStatus::TargetReached => Color::Green,
        LiveStatus::VeryLikely => Color::LightGreen,
        LiveStatus::Likely => Color::Cyan,
        LiveStatus::Possible => Color::Yellow,
        LiveStatus::AtRisk => Color::LightRed,
        LiveStatus::TargetMissed => Color::Red,
        LiveStatus::Other(_) => Color::Gray,
    }
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Critical => Color::Red,
        Priority::High => Color::LightRed,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Cyan,
        Priority::Normal => Color::Gray,
    }
}

fn truncate_with_ellipsis(s: &str, max_width: usize) -> Cow<'_, str> {
    let char_count = s.chars().count();
    if char_count <= max_width {
        Cow::Borrowed(s)
    } else if max_width <= 3 {
        Cow::Owned(".".repeat(max_width))
    } else {
        let end = s
            .char_indices()
            .nth(max_width - 3)
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        Cow::Owned(format!("{}...", &s[..end]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn rendered(state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| draw(f, state, None)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer.content().iter().map(|c| c.symbol()).collect()
    }

    fn with_toast() -> AppState {
        let mut state = AppState::new();
        let n = crate::notifications::parse_notification(
            r#"{"title":"Meta batida","message":"Jokić 10 assistências"}"#,
            chrono::Utc::now(),
        )
        .unwrap();
        state.notify(n);
        state
    }

    #[test]
    fn test_toast_clipped_to_short_terminal() {
        let state = with_toast();
        let mut terminal = Terminal::new(TestBackend::new(30, 3)).unwrap();
        terminal.draw(|f| draw_toast(f, &state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let row: String = buffer.content()[30..60].iter().map(|c| c.symbol()).collect();
        assert!(row.contains("Meta batida"), "row: {}", row);

        let mut terminal = Terminal::new(TestBackend::new(60, 1)).unwrap();
        terminal.draw(|f| draw_toast(f, &state)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        assert!(buffer.content().iter().all(|c| c.symbol() == " "));
    }

    #[test]
    fn test_add_bet_prompt_names_the_bet() {
        let state = AppState::new();
        let form = crate::forms::AddBetForm {
            bet_id: "b-1".to_string(),
            player_name: "Ja Morant".to_string(),
            category: "Assists".to_string(),
            odd: 1.9,
            stake: None,
            meta: 8.5,
        };
        let line = InputLine::add_bet(form);
        let mut terminal = Terminal::new(TestBackend::new(140, 40)).unwrap();
        terminal.draw(|f| draw(f, &state, Some(&line))).unwrap();
        let text: String = terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Odd: 1.9"));
        assert!(text.contains("Ja Morant - Assists"));
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(12.5), "R$ 12.50");
        assert_eq!(format_money(-3.0), "-R$ 3.00");
    }

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("Giannis", 10), "Giannis");
        assert_eq!(truncate_with_ellipsis("Giannis Antetokounmpo", 10), "Giannis...");
        assert_eq!(truncate_with_ellipsis("Luka Dončić", 2), "..");
    }

    #[test]
    fn test_empty_views_show_placeholder() {
        let mut state = AppState::new();
        for view in View::ALL {
            state.switch_view(view);
            assert!(rendered(&state).contains(view.empty_message()), "view {:?}", view);
        }
    }

    #[test]
    fn test_banner_is_rendered() {
        let mut state = AppState::new();
        state.switch_view(View::History);
        state.set_error(View::History, "Erro ao buscar histórico de apostas".to_string());
        assert!(rendered(&state).contains("Erro ao buscar histórico de apostas"));
    }
}
