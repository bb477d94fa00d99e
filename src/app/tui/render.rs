use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, Cell, Clear, Padding, Paragraph, Row, Table, TableState, Wrap,
};

use crate::db::RegistryEntry;

use super::super::sequencer::Sequencer;

#[allow(clippy::too_many_arguments)]
pub(super) fn draw_tui(
    frame: &mut Frame,
    entries: &[RegistryEntry],
    table_state: &mut TableState,
    sequencer: &Sequencer,
    playing: bool,
    load_in_flight: bool,
    status: &str,
    prompt: Option<&str>,
) {
    let bg = Block::default().style(Style::default().bg(Color::Black));
    frame.render_widget(bg, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let queue_text = if sequencer.is_empty() {
        "queue empty".to_string()
    } else {
        format!("{}/{} in queue", sequencer.position() + 1, sequencer.len())
    };
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "TUBESHUFFLE",
            Style::default()
                .fg(Color::Rgb(110, 170, 255))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(
            format!("{} playlists", entries.len()),
            Style::default().fg(Color::Rgb(185, 195, 210)),
        ),
        Span::styled("   ", Style::default()),
        Span::styled(queue_text, Style::default().fg(Color::Rgb(185, 195, 210))),
        Span::styled("   ", Style::default()),
        Span::styled(
            playback_badge(sequencer, playing, load_in_flight),
            Style::default().fg(Color::Yellow),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(panel_block("Dashboard"));
    frame.render_widget(header, chunks[0]);

    let body_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);

    let rows: Vec<Row> = entries
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(truncate(&entry.title, 44)),
                Cell::from(truncate(&entry.playlist_id, 36)),
            ])
        })
        .collect();

    let table = Table::new(rows, [Constraint::Percentage(55), Constraint::Percentage(45)])
        .header(
            Row::new(vec!["Playlist", "Id"]).style(
                Style::default()
                    .fg(Color::Rgb(110, 170, 255))
                    .add_modifier(Modifier::BOLD),
            ),
        )
        .block(panel_block("Playlists"))
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(110, 170, 255))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(table, body_chunks[0], table_state);

    let now_playing_text = match sequencer.current() {
        Some(item) => format!(
            "Title\n{}\n\nVideo\n{}\n\nQueue\n{} of {}\n\nState\n{}",
            truncate(&item.title, 40),
            truncate(&item.id, 24),
            sequencer.position() + 1,
            sequencer.len(),
            playback_badge(sequencer, playing, load_in_flight),
        ),
        None => {
            "Nothing playing.\n\nPress Enter to play the selected playlist\nor `o` to open a new one."
                .to_string()
        }
    };
    let now_playing = Paragraph::new(now_playing_text)
        .style(Style::default().fg(Color::Rgb(230, 230, 230)))
        .block(panel_block("Now Playing"))
        .alignment(Alignment::Left);
    frame.render_widget(now_playing, body_chunks[1]);

    let key_bar = Paragraph::new(Line::from(Span::styled(
        "↑/↓ select  Enter play  o open  r refresh  n/→ next  p/← prev  Space pause  d remove  q quit",
        Style::default().fg(Color::Rgb(185, 195, 210)),
    )))
    .alignment(Alignment::Center)
    .block(panel_block("Controls"));
    frame.render_widget(key_bar, chunks[2]);

    let status_widget = Paragraph::new(status.to_string())
        .style(status_style(status))
        .block(panel_block("Status"));
    frame.render_widget(status_widget, chunks[3]);

    if let Some(buffer) = prompt {
        let popup_text = format!("Playlist URL or id:\n\n{buffer}▏\n\n[Enter] Load   [Esc] Cancel");
        let popup_area = popup_rect(frame.area());
        frame.render_widget(Clear, popup_area);
        let popup = Paragraph::new(popup_text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(modal_block("Open Playlist"));
        frame.render_widget(popup, popup_area);
    }
}

fn playback_badge(sequencer: &Sequencer, playing: bool, load_in_flight: bool) -> &'static str {
    if load_in_flight {
        "FETCHING"
    } else if sequencer.is_empty() {
        "IDLE"
    } else if !sequencer.player_ready() {
        "WAITING FOR PLAYER"
    } else if playing {
        "PLAYING"
    } else {
        "PAUSED"
    }
}

fn panel_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(125, 135, 150)))
        .title(title)
}

fn modal_block(title: &'static str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(
            Style::default()
                .fg(Color::Rgb(160, 190, 235))
                .add_modifier(Modifier::BOLD),
        )
        .title(title)
        .padding(Padding::new(2, 2, 1, 1))
}

fn status_style(status: &str) -> Style {
    if status.starts_with("ERROR:") {
        Style::default()
            .fg(Color::Rgb(255, 145, 120))
            .add_modifier(Modifier::BOLD)
    } else if status.starts_with("INFO:") {
        Style::default().fg(Color::Rgb(205, 165, 255))
    } else {
        Style::default().fg(Color::Rgb(230, 235, 242))
    }
}

fn popup_rect(area: Rect) -> Rect {
    let width = 62.min(area.width.saturating_sub(2).max(1));
    let height = 9.min(area.height.saturating_sub(2).max(1));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn truncate(raw: &str, max_chars: usize) -> String {
    if raw.chars().count() <= max_chars {
        return raw.to_string();
    }
    let mut out: String = raw.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}
