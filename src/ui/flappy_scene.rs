//! Terminal rendering of a game snapshot.

use crate::game::{Phase, Pipe, Snapshot};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const INFO_PANEL_WIDTH: u16 = 24;
const STATUS_ROWS: u16 = 2;
const GAME_OVER_WIDTH: u16 = 40;

/// Where each part of the screen goes.
///
/// ```text
/// ┌─ Flappy Bird - Score: N ───────────┬─ Info ───────┐
/// │  sky, pipes, bird                  │ Score, Best, │
/// │                                    │ Distance ... │
/// │  status line / key hints           │              │
/// └────────────────────────────────────┴──────────────┘
/// ```
struct Screen {
    sky: Rect,
    status: Rect,
    info: Rect,
}

fn split_screen(frame: &mut Frame, area: Rect, score: u32) -> Screen {
    frame.render_widget(Clear, area);
    let outer = Block::default()
        .title(format!(" Flappy Bird - Score: {score} "))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(INFO_PANEL_WIDTH)])
        .split(inner);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(STATUS_ROWS)])
        .split(columns[0]);
    let (sky, status, info) = (rows[0], rows[1], columns[1]);

    Screen { sky, status, info }
}

/// Render the whole game screen for one frame.
pub fn render_game(frame: &mut Frame, area: Rect, snap: &Snapshot, keyboard_mode: bool) {
    let screen = split_screen(frame, area, snap.score);

    render_play_area(frame, screen.sky, snap);
    render_status(frame, screen.status, snap, keyboard_mode);
    render_info_panel(frame, screen.info, snap);

    if matches!(snap.phase, Phase::GameOver | Phase::Terminated) {
        render_game_over(frame, screen.sky, snap);
    }
}

/// World-space centre of a display cell.
fn cell_to_world(col: usize, row: usize, area: Rect, snap: &Snapshot) -> (f64, f64) {
    let wx = (col as f64 + 0.5) * snap.world_width / area.width as f64;
    let wy = (row as f64 + 0.5) * snap.world_height / area.height as f64;
    (wx, wy)
}

fn pipe_cell(pipes: &[Pipe], wx: f64, wy: f64) -> Option<&Pipe> {
    pipes
        .iter()
        .find(|p| wx >= p.x && wx < p.right_edge() && (wy < p.gap_top || wy > p.gap_bottom()))
}

/// Render the play field with bird and pipes.
fn render_play_area(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    let width = area.width as usize;
    let height = area.height as usize;

    if width == 0 || height == 0 {
        return;
    }

    let to_col = |wx: f64| (wx / snap.world_width * width as f64).floor();
    let to_row = |wy: f64| (wy / snap.world_height * height as f64).floor();
    let bird_col = to_col(snap.bird.x);
    let bird_row = to_row(snap.bird.y);

    let bird_char = if snap.bird.velocity < -1.0 {
        "▲" // Flapping up
    } else if snap.bird.velocity > 6.0 {
        "▼" // Falling fast
    } else {
        "►"
    };

    let mut lines = Vec::with_capacity(height);
    for row in 0..height {
        let mut spans = Vec::with_capacity(width);
        for col in 0..width {
            if col as f64 == bird_col && row as f64 == bird_row {
                spans.push(Span::styled(
                    bird_char,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ));
                continue;
            }

            let (wx, wy) = cell_to_world(col, row, area, snap);
            if pipe_cell(&snap.pipes, wx, wy).is_some() {
                spans.push(Span::styled("█", Style::default().fg(Color::Green)));
            } else {
                spans.push(Span::raw(" "));
            }
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

/// Two rows: what's happening, then the keys that do something right now.
fn render_status(frame: &mut Frame, area: Rect, snap: &Snapshot, keyboard_mode: bool) {
    let (message, color, keys) = match snap.phase {
        Phase::Playing | Phase::Restarting if keyboard_mode => (
            "Tap Space to flap!".to_string(),
            Color::Yellow,
            vec![("[Space]", "Flap"), ("[Q]", "Quit")],
        ),
        Phase::Playing | Phase::Restarting => (
            "Wave a hand over the sensor to flap!".to_string(),
            Color::Yellow,
            vec![("[Q]", "Quit")],
        ),
        Phase::GameOver | Phase::Terminated => (
            format!("Crashed with {} points", snap.score),
            Color::Red,
            vec![("[R]", "Restart"), ("[Q]", "Quit")],
        ),
    };

    let hints = keys.iter().enumerate().flat_map(|(i, (key, action))| {
        let gap = if i == 0 { "" } else { "  " };
        [
            Span::raw(gap),
            Span::styled(*key, Style::default().fg(Color::White)),
            Span::styled(format!(" {action}"), Style::default().fg(Color::DarkGray)),
        ]
    });
    let rows = vec![
        Line::styled(message, Style::default().fg(color)),
        Line::from(hints.collect::<Vec<_>>()),
    ];
    frame.render_widget(Paragraph::new(rows).alignment(Alignment::Center), area);
}

/// A " Label: value" row for the info panel.
fn info_line(label: &str, value: String, value_color: Color) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label}: "), Style::default().fg(Color::DarkGray)),
        Span::styled(
            value,
            Style::default()
                .fg(value_color)
                .add_modifier(Modifier::BOLD),
        ),
    ])
}

fn render_info_panel(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    let block = Block::default()
        .title(" Info ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 2 || inner.width < 4 {
        return;
    }

    let distance = if snap.distance > 0.0 {
        format!("{:.1} cm", snap.distance)
    } else {
        "--".to_string()
    };
    let high_score = snap
        .high_score
        .map_or_else(|| "?".to_string(), |s| s.to_string());

    let lines = vec![
        info_line("Score", snap.score.to_string(), Color::Red),
        info_line("Best", high_score, Color::Yellow),
        Line::from(""),
        info_line("Distance", distance, Color::Blue),
        Line::from(""),
        info_line("Flaps", snap.stats.flaps.to_string(), Color::White),
        info_line("Cooldown", snap.stats.suppressed_flaps.to_string(), Color::DarkGray),
        info_line("Dropouts", snap.stats.sensor_dropouts.to_string(), Color::DarkGray),
        info_line("Pipes", snap.pipes.len().to_string(), Color::Green),
    ];

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_game_over(frame: &mut Frame, area: Rect, snap: &Snapshot) {
    let best = snap.high_score.unwrap_or(snap.score);
    let bold = Modifier::BOLD;
    let mut lines = vec![
        Line::styled("GAME OVER", Style::default().fg(Color::Red).add_modifier(bold)),
        Line::from(""),
        Line::styled(format!("Score: {}", snap.score), Style::default().fg(Color::LightCyan)),
        Line::styled(format!("High Score: {best}"), Style::default().fg(Color::Green)),
    ];
    if snap.new_record {
        lines.push(Line::styled(
            "New record!",
            Style::default().fg(Color::Yellow).add_modifier(bold),
        ));
    }
    let hint_color = if snap.can_restart {
        Color::White
    } else {
        Color::DarkGray
    };
    lines.push(Line::from(""));
    lines.push(Line::styled("[R] Restart  [Q] Quit", Style::default().fg(hint_color)));

    // Centred box sized to its text, drawn over the play field.
    let width = GAME_OVER_WIDTH.min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let modal = Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    );
    frame.render_widget(Clear, modal);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        ),
        modal,
    );
}
