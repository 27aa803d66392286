use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};
use readalong::{HighlightRole, TickOutcome};

use crate::App;

const DEBUG_PANEL_WIDTH: u16 = 32;
const INDICATOR: &str = "▶ ";

pub fn render(frame: &mut Frame, app: &App) {
    let [header_area, body_area, timeline_area, hint_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let [document_area, debug_area] =
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(DEBUG_PANEL_WIDTH)])
            .areas(body_area);

    render_header(frame, app, header_area);
    render_document(frame, app, document_area);
    render_debug(frame, app, debug_area);
    render_timeline(frame, app, timeline_area);
    render_hints(frame, hint_area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let status = if app.ended {
        "■ ENDED"
    } else if app.paused {
        "⏸ PAUSED"
    } else {
        "▶ PLAYING"
    };
    let text = format!(
        " {} | {} | {}ms/tick ",
        app.source_name, status, app.speed_ms
    );
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn role_style(role: Option<HighlightRole>) -> Style {
    match role {
        Some(HighlightRole::Primary) => Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        Some(HighlightRole::Secondary) => Style::default().fg(Color::Black).bg(Color::LightYellow),
        Some(HighlightRole::Container) | None => Style::default(),
    }
}

fn render_document(frame: &mut Frame, app: &App, area: Rect) {
    let surface = &app.surface;
    let mut lines: Vec<Line> = Vec::new();
    let mut primary_line = None;

    for block in app.session.blocks().blocks() {
        let nested = block
            .parent
            .is_some_and(|p| surface.role_of(p) == Some(HighlightRole::Container));
        let gutter = match (block.parent, nested) {
            (None, _) => "  ",
            (Some(_), true) => "┃ ",
            (Some(_), false) => "│ ",
        };

        let mut spans = vec![Span::styled(gutter, Style::default().fg(Color::DarkGray))];
        if surface.indicator() == Some(block.id) {
            primary_line = Some(lines.len());
            spans.push(Span::styled(INDICATOR, Style::default().fg(Color::Yellow)));
        }
        spans.push(Span::styled(
            block.raw_text.replace('\n', " "),
            role_style(surface.role_of(block.id)),
        ));

        lines.push(Line::from(spans));
        lines.push(Line::raw(""));
    }

    // Keep the primary block at the configured fraction of the viewport.
    let scroll = match (primary_line, app.session.scroll_target()) {
        (Some(line), Some(target)) => {
            let offset = (area.height as f64 * target.viewport_fraction) as usize;
            line.saturating_sub(offset) as u16
        }
        _ => 0,
    };

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default())
            .scroll((scroll, 0)),
        area,
    );
}

fn render_debug(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::LEFT)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(" resolver ", Style::default().fg(Color::DarkGray)));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let state = app.session.state();
    let label = |name: &'static str| Span::styled(name, Style::default().fg(Color::DarkGray));
    let or_dash = |value: Option<usize>| value.map_or("-".to_string(), |v| v.to_string());

    let outcome = match app.last_outcome {
        None => "-".to_string(),
        Some(TickOutcome::Inactive(reason)) => format!("inactive {reason:?}"),
        Some(TickOutcome::Gap) => "gap".to_string(),
        Some(TickOutcome::Unchanged) => "unchanged".to_string(),
        Some(TickOutcome::Highlighted { segment_index }) => format!("hit #{segment_index}"),
        Some(TickOutcome::Missed { segment_index }) => format!("miss #{segment_index}"),
    };

    let mut lines = vec![
        Line::from(vec![label("segment "), Span::raw(or_dash(state.active_segment))]),
        Line::from(vec![label("anchor  "), Span::raw(or_dash(state.anchor_block))]),
        Line::from(vec![label("outcome "), Span::raw(outcome)]),
        Line::raw(""),
    ];

    let active = state
        .active_segment
        .and_then(|i| app.session.segments().get(i));
    if let Some(segment) = active {
        let offsets = segment
            .offsets()
            .map_or("none".to_string(), |r| format!("{}..{}", r.start, r.end));
        lines.push(Line::from(vec![label("offsets "), Span::raw(offsets)]));
        lines.push(Line::from(Span::styled(
            segment.text.clone(),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
        lines.push(Line::raw(""));
    }

    if let Some(set) = app.session.highlight() {
        lines.push(Line::from(Span::styled(
            "highlight",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::UNDERLINED),
        )));
        for block in &set.blocks {
            lines.push(Line::from(vec![
                Span::raw(format!("#{:<4}", block.order_index)),
                Span::styled(
                    format!("{:.2}", block.score),
                    Style::default().fg(if block.score >= 1.0 {
                        Color::Yellow
                    } else {
                        Color::DarkGray
                    }),
                ),
            ]));
        }
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_timeline(frame: &mut Frame, app: &App, area: Rect) {
    let ratio = if app.duration_ms <= 0.0 {
        0.0
    } else {
        (app.clock_ms / app.duration_ms).clamp(0.0, 1.0)
    };
    let label = format!("{} / {}", clock(app.clock_ms), clock(app.duration_ms));
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::White).bg(Color::DarkGray))
        .ratio(ratio)
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_hints(frame: &mut Frame, area: Rect) {
    frame.render_widget(
        Paragraph::new(
            " [Space] pause/resume  [←/→] seek 10s  [↑/↓] speed  [Home] restart  [q] quit ",
        )
        .style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn clock(ms: f64) -> String {
    let secs = (ms / 1000.0) as u64;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
