//! TUI描画関連の関数。

use chrono::Local;
use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Row, Table, TableState, Wrap},
};

use crate::{
    backend::models::{TransactionKind, TransactionStatus},
    earnings::{self, QUICK_AMOUNTS},
    events::Screen,
    history, input, layout,
    shortcuts::Shortcuts,
    trip::stepper::{StepState, TripStatus},
};

use super::App;

/// 画面全体のレイアウトを描画する。
pub fn draw(f: &mut Frame, app: &App) {
    // ウィザード画面は専用描画で処理する。
    if app.ui.screen == Screen::InitialSetup {
        draw_wizard_screen(f, app);
        if let Some(input_state) = &app.input_box {
            input::render_input_box(f, input_state);
        }
        return;
    }

    let main_layout = layout::create_main_layout(f.area());

    match app.ui.screen {
        Screen::Home => draw_home(f, app, main_layout.body),
        Screen::Request => draw_request(f, app, main_layout.body),
        Screen::ActiveTrip => draw_active_trip(f, app, main_layout.body),
        Screen::TripComplete => draw_summary(f, app, main_layout.body),
        Screen::Trips => draw_history(f, app, main_layout.body),
        Screen::Earnings => draw_earnings(f, app, main_layout.body),
        Screen::Settings => draw_settings(f, app, main_layout.body),
        Screen::InitialSetup => {}
    }

    // HELPバー（画面ごとのショートカット）を描画する。
    let help_text = get_help_text(app.ui.screen, &app.shortcuts);
    let help_bar = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("HELP"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_bar, main_layout.help_bar);

    f.render_widget(build_status_bar(app), main_layout.status_bar);

    if app.ui.confirm_online {
        draw_confirm_online(f);
    }
    if let Some(input_state) = &app.input_box {
        input::render_input_box(f, input_state);
    }
}

/// 通知とログを右側パネルに描画する。
fn draw_side_panel(f: &mut Frame, app: &App, area: Rect) {
    let mut lines: Vec<Line> = vec![];
    if let Some(n) = &app.ui.notice {
        lines.push(Line::from(n.message.clone()).style(Style::default().fg(Color::Yellow).bold()));
        lines.push(Line::default());
    }
    lines.push(Line::from("Log:"));
    let tail = app.ui.log.len().saturating_sub(8);
    lines.extend(app.ui.log[tail..].iter().map(|s| Line::from(s.clone())));

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("INFO"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}

fn draw_home(f: &mut Frame, app: &App, area: Rect) {
    let body = layout::create_body_layout(area);
    let profile = &app.session.profile;
    let stats = history::stats(&app.trips, Local::now());

    let (state, color) = if profile.is_online {
        ("ONLINE", Color::Green)
    } else {
        ("OFFLINE", Color::DarkGray)
    };
    let mut lines = vec![
        Line::from(format!("Hello, {}", profile.full_name)).bold(),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(state, Style::default().fg(color).bold()),
        ]),
        Line::from(format!("Rating: {:.1}", profile.rating)),
        Line::default(),
        Line::from(format!("Today's earnings: GH₵ {:.2}", stats.today_earnings)),
        Line::from(format!("Today's trips:    {}", stats.today_trips)),
        Line::from(format!("This week:        GH₵ {:.2}", stats.weekly_earnings)),
        Line::default(),
    ];
    if profile.is_online {
        lines.push(Line::from("Waiting for pickup requests..."));
    }
    if app.cfg.is_demo() {
        lines.push(
            Line::from("Demo data (no backend configured)")
                .style(Style::default().fg(Color::DarkGray)),
        );
    }

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("HOME"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, body.content);
    draw_side_panel(f, app, body.side_panel);
}

fn draw_request(f: &mut Frame, app: &App, area: Rect) {
    let Some(gate) = &app.gate else {
        return;
    };
    let areas = layout::create_request_layout(area);
    let req = gate.request();

    // 残り時間が少なくなったら赤で強調する。
    let color = if gate.seconds_remaining() <= 5 {
        Color::Red
    } else {
        Color::Rgb(255, 140, 0)
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("NEW REQUEST"))
        .gauge_style(Style::default().fg(color))
        .ratio(gate.progress().clamp(0.0, 1.0))
        .label(format!(
            "{}s left of {}s",
            gate.seconds_remaining(),
            gate.total_secs()
        ));
    f.render_widget(gauge, areas.countdown);

    let details = vec![
        Line::from(req.customer_name.clone()).bold(),
        Line::from(format!("Pickup:   {}", req.pickup_address)),
        Line::from(format!("Waste:    {}", req.waste_type)),
        Line::from(format!("Distance: {:.1} km", req.distance_km)),
        Line::from(format!("Fare:     GH₵ {:.2}", req.estimated_fare)),
        Line::from(format!("Trip ID:  {}", req.trip_id))
            .style(Style::default().fg(Color::DarkGray)),
    ];
    let panel = Paragraph::new(details)
        .block(Block::default().borders(Borders::ALL).title("DETAILS"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, areas.details);

    let actions = Paragraph::new(format!(
        "[{}] Accept    [{}] Decline",
        format_keys(&app.shortcuts.request.accept),
        format_keys(&app.shortcuts.request.decline)
    ))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(actions, areas.actions);
}

fn draw_active_trip(f: &mut Frame, app: &App, area: Rect) {
    let Some(active) = &app.active else {
        return;
    };
    let body = layout::create_body_layout(area);
    let stepper = active.stepper();
    let req = &active.trip().request;

    let mut lines = vec![
        Line::from(format!("{} · {}", req.customer_name, req.waste_type)).bold(),
        Line::from(format!("Rider: {}", active.rider_name())),
        Line::from(format!("Status: {}", stepper.current_label())),
        Line::default(),
    ];
    // 各段階の状態は現在位置から導出する。
    for (i, status) in TripStatus::ALL.iter().enumerate() {
        let (marker, style) = match stepper.step_state(i) {
            StepState::Completed => ("[✓]", Style::default().fg(Color::Green)),
            StepState::Current => ("[▶]", Style::default().fg(Color::Yellow).bold()),
            StepState::Pending => ("[ ]", Style::default().fg(Color::DarkGray)),
        };
        lines.push(Line::from(format!("{marker} {}", status.label())).style(style));
    }
    lines.push(Line::default());
    lines.push(Line::from(format!("Destination: {}", active.destination_label())));
    lines.push(
        Line::from(format!(
            "[{}] {}",
            format_keys(&app.shortcuts.trip.advance),
            stepper.action_label()
        ))
        .style(Style::default().bg(Color::Rgb(255, 140, 0)).fg(Color::Black).bold()),
    );

    if stepper.current().allows_disposal_selection() {
        lines.push(Line::default());
        lines.push(Line::from("Disposal sites:"));
        let selected = active.disposal().selected().map(|s| s.name.as_str());
        for (i, site) in active.disposal().sites().iter().enumerate() {
            let mark = if selected == Some(site.name.as_str()) { "*" } else { " " };
            lines.push(Line::from(format!(
                "{mark} {}. {} ({:.1} km) - {}",
                i + 1,
                site.name,
                site.distance_km,
                site.address
            )));
        }
    }

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("TRIP {}", req.trip_id)),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(panel, body.content);
    draw_side_panel(f, app, body.side_panel);
}

fn draw_summary(f: &mut Frame, app: &App, area: Rect) {
    let Some(s) = &app.summary else {
        return;
    };
    let lines = vec![
        Line::from("Trip Completed!").style(Style::default().fg(Color::Green).bold()),
        Line::default(),
        Line::from(format!("Customer:  {}", s.customer_name)),
        Line::from(format!("Pickup:    {}", s.pickup_address)),
        Line::from(format!("Drop-off:  {}", s.drop_off_label())),
        Line::from(format!("Waste:     {}", s.waste_type)),
        Line::from(format!("Distance:  {:.1} km", s.distance_km)),
        Line::from(format!("Duration:  {}", s.duration_label())),
        Line::from(format!("Completed: {}", s.completed_at.format("%H:%M"))),
        Line::default(),
        Line::from(format!("You earned GH₵ {:.2}", s.fare)).bold(),
    ];
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(format!("TRIP {}", s.trip_id)))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}

fn draw_history(f: &mut Frame, app: &App, area: Rect) {
    let today = Local::now().date_naive();
    let trips = history::filter_trips(&app.trips, app.trip_filter, &app.trip_query, today);
    let (header_area, table_area) = layout::split_header(area, 3);

    let query = if app.trip_query.is_empty() {
        "-".to_string()
    } else {
        app.trip_query.clone()
    };
    let header = Paragraph::new(format!(
        "Filter: {} | Search: {} | {} trips | Total: GH₵ {:.2}",
        app.trip_filter.label(),
        query,
        trips.len(),
        history::total_fare(&trips)
    ))
    .block(Block::default().borders(Borders::ALL).title("TRIP HISTORY"));
    f.render_widget(header, header_area);

    let rows = trips.iter().map(|t| {
        Row::new(vec![
            history::format_day(t.date(), today),
            t.created_at.format("%H:%M").to_string(),
            t.customer_name.clone(),
            t.pickup_location.clone(),
            t.waste_type.clone(),
            format!("{:.2}", t.fare),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(16),
            Constraint::Min(12),
            Constraint::Length(14),
            Constraint::Length(8),
        ],
    )
    .block(Block::default().borders(Borders::ALL))
    .header(Row::new(vec!["date", "time", "customer", "pickup", "waste", "GH₵"]).bold())
    .row_highlight_style(
        Style::default()
            .bg(Color::Rgb(255, 140, 0))
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    if !trips.is_empty() {
        state.select(Some(app.ui.selected.min(trips.len() - 1)));
    }
    f.render_stateful_widget(table, table_area, &mut state);
}

fn draw_earnings(f: &mut Frame, app: &App, area: Rect) {
    let today = Local::now().date_naive();
    let txs = earnings::filter_transactions(&app.txs, app.tx_filter, today);
    let (header_area, table_area) = layout::split_header(area, 4);

    let quick = QUICK_AMOUNTS
        .iter()
        .zip(&app.shortcuts.earnings.quick_amounts)
        .map(|(amount, key)| format!("[{key}] {amount}"))
        .collect::<Vec<_>>()
        .join("  ");
    let header = Paragraph::new(vec![
        Line::from(format!(
            "Available balance: GH₵ {:.2}",
            earnings::available_balance(&app.txs)
        ))
        .bold(),
        Line::from(format!("Filter: {} | Quick withdraw: {}", app.tx_filter.label(), quick)),
    ])
    .block(Block::default().borders(Borders::ALL).title("EARNINGS"));
    f.render_widget(header, header_area);

    let rows = txs.iter().map(|t| {
        let sign = if t.kind == TransactionKind::Withdrawal { "-" } else { "+" };
        let status = match t.status {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Failed => "failed",
        };
        Row::new(vec![
            history::format_day(t.created_at.date_naive(), today),
            earnings::kind_label(t.kind).to_string(),
            t.description.clone(),
            format!("{sign}{:.2}", t.amount),
            status.to_string(),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Min(16),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .block(Block::default().borders(Borders::ALL).title("TRANSACTIONS"))
    .header(Row::new(vec!["date", "type", "description", "GH₵", "status"]).bold());
    f.render_widget(table, table_area);
}

fn draw_settings(f: &mut Frame, app: &App, area: Rect) {
    let d = &app.draft;
    let sc = &app.shortcuts.settings;
    let text = format!(
        "[{}] Backend URL:  {}\n[{}] Anon key:     {}\n[{}] Access token: {}\n[{}] Rider ID:     {}\n[{}] Full name:    {}\n[{}] MoMo number:  {}\n\nCountdown: {}s | Poll every {}s | Disposal sites: {}",
        format_keys(&sc.backend_url),
        or_unset(&d.backend_url),
        format_keys(&sc.anon_key),
        mask(&d.anon_key),
        format_keys(&sc.access_token),
        mask(&d.access_token),
        format_keys(&sc.rider_id),
        or_unset(&d.rider_id),
        format_keys(&sc.name),
        or_unset(&d.full_name),
        format_keys(&sc.momo_number),
        or_unset(&d.momo_number),
        app.cfg.dispatch.countdown_secs,
        app.cfg.dispatch.poll_interval_secs,
        app.cfg.disposal_sites.len(),
    );
    let panel = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("SETTINGS"))
        .wrap(Wrap { trim: true });
    f.render_widget(panel, area);
}

fn or_unset(s: &str) -> &str {
    if s.is_empty() { "(not set)" } else { s }
}

/// キー類は先頭だけ表示する。
fn mask(s: &str) -> String {
    if s.is_empty() {
        return "(not set)".into();
    }
    let head: String = s.chars().take(4).collect();
    format!("{head}…")
}

fn draw_confirm_online(f: &mut Frame) {
    let popup = input::centered_popup(f.area(), 50, 5);
    f.render_widget(Clear, popup);
    let p = Paragraph::new("Go online and start receiving requests?\n\n(y) Yes    (n) No")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Go Online"))
        .style(Style::default().bg(Color::DarkGray));
    f.render_widget(p, popup);
}

/// ステータスバーを構築する。
fn build_status_bar(app: &App) -> Paragraph<'static> {
    let online = if app.session.profile.is_online {
        "online"
    } else {
        "offline"
    };
    let status_text = if let Some(err) = &app.ui.error {
        format!("[{}] {} | ERROR: {}", app.ui.screen.name(), online, err)
    } else {
        format!("[{}] {} | {}", app.ui.screen.name(), online, app.ui.status)
    };

    let mut status_bar = Paragraph::new(status_text)
        .block(Block::default().borders(Borders::ALL).title("STATUS"))
        .wrap(Wrap { trim: true });

    // エラー時は赤色で強調表示する。
    if app.ui.error.is_some() {
        status_bar = status_bar.style(Style::default().fg(Color::Red));
    }
    status_bar
}

/// ウィザード画面を描画する。
fn draw_wizard_screen(f: &mut Frame, app: &App) {
    let outer_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Min(10),
            Constraint::Percentage(20),
        ])
        .split(f.area());

    let content_text = format!(
        "=== Initial Setup Wizard ===\n\nStep {}/{}\n\n{}\n\nPress Enter to proceed, Esc to skip.",
        app.wizard_state.get_step_number(),
        app.wizard_state.total_steps,
        app.wizard_state.get_prompt()
    );
    let content = Paragraph::new(content_text)
        .block(Block::default().borders(Borders::ALL).title("Setup"))
        .wrap(Wrap { trim: true });
    f.render_widget(content, outer_layout[1]);

    if let Some(err) = &app.ui.error {
        let error_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(f.area());
        let error_text = Paragraph::new(format!("ERROR: {err}"))
            .block(Block::default().borders(Borders::ALL).title("Error"))
            .style(Style::default().fg(Color::Red))
            .wrap(Wrap { trim: true });
        f.render_widget(error_text, error_layout[1]);
    }
}

/// 現在画面に応じたヘルプ文字列を返す。
fn get_help_text(screen: Screen, sc: &Shortcuts) -> String {
    match screen {
        Screen::Home => format!(
            "{}: online/offline | {}: trips | {}: earnings | {}: settings | {}: quit",
            format_keys(&sc.home.toggle_online),
            format_keys(&sc.home.trips),
            format_keys(&sc.home.earnings),
            format_keys(&sc.home.settings),
            format_keys(&sc.home.quit)
        ),
        Screen::Request => format!(
            "{}: accept | {}: decline",
            format_keys(&sc.request.accept),
            format_keys(&sc.request.decline)
        ),
        Screen::ActiveTrip => format!(
            "{}: next step | {}: navigate | 1-{}: disposal site",
            format_keys(&sc.trip.advance),
            format_keys(&sc.trip.navigate),
            sc.trip.sites.len()
        ),
        Screen::TripComplete => format!(
            "{}: home | {}: earnings",
            format_keys(&sc.complete.home),
            format_keys(&sc.complete.earnings)
        ),
        Screen::Trips => format!(
            "{}: filter | {}: search | {}: refresh | {}/{}: navigate | {}: back",
            format_keys(&sc.history.filter),
            format_keys(&sc.history.search),
            format_keys(&sc.history.refresh),
            format_keys(&sc.history.up),
            format_keys(&sc.history.down),
            format_keys(&sc.history.back)
        ),
        Screen::Earnings => format!(
            "{}: withdraw | {}: quick amount | {}: filter | {}: refresh | {}: back",
            format_keys(&sc.earnings.withdraw),
            format_keys(&sc.earnings.quick_amounts),
            format_keys(&sc.earnings.filter),
            format_keys(&sc.earnings.refresh),
            format_keys(&sc.earnings.back)
        ),
        Screen::Settings => format!(
            "{}: save | {}: cancel",
            format_keys(&sc.settings.save),
            format_keys(&sc.settings.cancel)
        ),
        Screen::InitialSetup => format!(
            "Follow wizard steps | {}: proceed | {}: skip step",
            format_keys(&sc.wizard.proceed),
            format_keys(&sc.wizard.skip)
        ),
    }
}

/// ショートカットキーの配列を表示用文字列に変換する。
fn format_keys(keys: &[String]) -> String {
    keys.join("/")
}
