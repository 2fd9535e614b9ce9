//! Terminal UI rendering with ratatui

use crate::grid::{COLS, Cell, Gravity, ROWS};
use crate::session::{GameSession, SessionState};
use crate::settings::Settings;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

const BLOCK: &str = "██";
const BOMB_BLOCK: &str = "()";
const EMPTY: &str = "  ";

/// Board (2 chars per cell + borders) and sidebar
const BOARD_WIDTH: u16 = COLS as u16 * 2 + 2;
const BOARD_HEIGHT: u16 = ROWS as u16 + 2;
const SIDEBAR_WIDTH: u16 = 18;
const GAME_WIDTH: u16 = BOARD_WIDTH + SIDEBAR_WIDTH;

pub fn render(
    frame: &mut Frame,
    session: &GameSession,
    settings: &Settings,
    gravity_warning: bool,
) {
    let area = center_rect(frame.area(), GAME_WIDTH, BOARD_HEIGHT);
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(BOARD_WIDTH),
            Constraint::Length(SIDEBAR_WIDTH),
        ])
        .split(area);

    render_board(frame, session, layout[0]);
    render_sidebar(frame, session, settings, gravity_warning, layout[1]);

    match session.state {
        SessionState::Paused => render_overlay(frame, area, "PAUSED", &["p to resume"]),
        SessionState::GameOver => {
            let score = format!("Score: {}", session.score.points);
            let level = format!("Level: {}", session.score.level);
            render_overlay(frame, area, "GAME OVER", &[&score, &level, "r to restart"]);
        }
        SessionState::Playing => {}
    }
}

fn render_board(frame: &mut Frame, session: &GameSession, area: Rect) {
    let flash = session.clear.flash();
    let piece_cells: Vec<(i32, i32)> = session
        .current
        .as_ref()
        .map(|piece| piece.cells().collect())
        .unwrap_or_default();
    let piece_color = session.current.as_ref().map(|piece| piece.color);

    let mut lines = Vec::with_capacity(ROWS);
    for row in 0..ROWS {
        let mut spans = Vec::with_capacity(COLS);
        for col in 0..COLS {
            let flashing = flash.is_some_and(|f| {
                f.highlight_on && (f.rows.contains(&row) || f.cols.contains(&col))
            });
            let span = if flashing {
                Span::styled(BLOCK, Style::default().fg(Color::White))
            } else if piece_cells.contains(&(row as i32, col as i32)) {
                Span::styled(
                    BLOCK,
                    Style::default().fg(piece_color.unwrap_or(Color::White)),
                )
            } else {
                match session.grid.get(row as i32, col as i32) {
                    Some(Cell::Filled { color, kind }) => {
                        let glyph = if kind == crate::grid::BlockKind::Bomb {
                            BOMB_BLOCK
                        } else {
                            BLOCK
                        };
                        Span::styled(glyph, Style::default().fg(color))
                    }
                    _ => Span::styled(EMPTY, Style::default()),
                }
            };
            spans.push(span);
        }
        lines.push(Line::from(spans));
    }

    let board = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray)),
    );
    frame.render_widget(board, area);
}

fn render_sidebar(
    frame: &mut Frame,
    session: &GameSession,
    settings: &Settings,
    gravity_warning: bool,
    area: Rect,
) {
    let mut lines = vec![
        Line::styled("GRAVITRIS", Style::default().fg(Color::Cyan).bold()),
        Line::raw(""),
        Line::raw(format!("Score {}", session.score.points)),
        Line::raw(format!("High  {}", settings.high_score)),
        Line::raw(format!("Level {}", session.score.level)),
        Line::raw(format!("Lines {}", session.score.lines)),
        Line::raw(""),
    ];

    let arrow = match session.gravity_direction() {
        Gravity::Down => "↓",
        Gravity::Up => "↑",
    };
    if gravity_warning {
        lines.push(Line::styled(
            format!("Gravity {} FLIP!", arrow),
            Style::default().fg(Color::Red).bold(),
        ));
    } else {
        lines.push(Line::raw(format!("Gravity {}", arrow)));
    }
    lines.push(Line::raw(""));

    lines.push(Line::raw("Next"));
    for row in &session.next.shape {
        let spans: Vec<Span> = row
            .iter()
            .map(|&bit| {
                if bit != 0 {
                    Span::styled(BLOCK, Style::default().fg(session.next.color))
                } else {
                    Span::raw(EMPTY)
                }
            })
            .collect();
        lines.push(Line::from(spans));
    }
    if session.next.has_bomb {
        lines.push(Line::styled("bomb!", Style::default().fg(Color::Red)));
    }
    lines.push(Line::raw(""));

    let toggle = |on: bool| if on { "on" } else { "off" };
    lines.push(Line::styled(
        format!(
            "snd {}  bgm {}",
            toggle(settings.sound_enabled),
            toggle(settings.music_enabled)
        ),
        Style::default().fg(Color::DarkGray),
    ));
    lines.push(Line::styled(
        "p pause  q quit",
        Style::default().fg(Color::DarkGray),
    ));

    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Gray)),
    );
    frame.render_widget(sidebar, area);
}

fn render_overlay(frame: &mut Frame, area: Rect, title: &str, body: &[&str]) {
    let height = body.len() as u16 + 4;
    let overlay = center_rect(area, 24, height);
    frame.render_widget(Clear, overlay);

    let mut lines = vec![
        Line::styled(title, Style::default().fg(Color::Yellow).bold()),
        Line::raw(""),
    ];
    for text in body {
        lines.push(Line::raw(*text));
    }
    let paragraph = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(paragraph, overlay);
}

/// Center a fixed-size rect inside an area, clamped to fit
fn center_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
