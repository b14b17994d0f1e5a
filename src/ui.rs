use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use crate::app::{App, Bubble, InputMode, Role};

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, transcript, input, footer
    let [header_area, transcript_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_transcript(app, frame, transcript_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" chatterm ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(
            format!("model: {} ", app.model),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        Role::Bot => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    }
}

/// Lay a bubble out as lines: "You: <text>" with the prefix styled, extra
/// content lines below it. Must stay in step with
/// `App::transcript_line_count`.
fn bubble_lines(bubble: &Bubble) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut content_lines = bubble.content.lines();

    let first = content_lines.next().unwrap_or("");
    lines.push(Line::from(vec![
        Span::styled(bubble.label(), role_style(bubble.role)),
        Span::raw(" "),
        Span::raw(first),
    ]));

    for line in content_lines {
        lines.push(Line::from(line));
    }

    lines.push(Line::default());
    lines
}

fn render_transcript(app: &mut App, frame: &mut Frame, area: Rect) {
    // Store dimensions for scroll calculations (inner size minus borders)
    app.transcript_height = area.height.saturating_sub(2);
    app.transcript_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let text = if app.transcript.is_empty() && app.pending == 0 {
        Text::from(Span::styled(
            "Type a message and press Enter...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut lines: Vec<Line> = Vec::new();

        for bubble in &app.transcript {
            lines.extend(bubble_lines(bubble));
        }

        if app.pending > 0 {
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(vec![
                Span::styled("Bot:", role_style(Role::Bot)),
                Span::styled(
                    format!(" Thinking{}", dots),
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                ),
            ]));
        }

        Text::from(lines)
    };

    let transcript = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.transcript_scroll, 0));

    frame.render_widget(transcript, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = match app.input_mode {
        InputMode::Editing => Color::Yellow,
        InputMode::Normal => Color::DarkGray,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Horizontal scroll so the cursor stays visible in a long input
    let inner_width = area.width.saturating_sub(2) as usize;
    let scroll_offset = if inner_width == 0 {
        0
    } else if app.cursor >= inner_width {
        app.cursor - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (app.cursor - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.input_mode {
        InputMode::Normal => " SCROLL ",
        InputMode::Editing => " CHAT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match app.input_mode {
        InputMode::Editing => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" Ctrl-c ", key_style),
            Span::styled(" quit ", label_style),
        ],
        InputMode::Normal => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/bottom ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::{backend::TestBackend, Terminal};

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let mut text = String::new();
        for (i, cell) in buffer.content.iter().enumerate() {
            text.push_str(cell.symbol());
            if (i + 1) % width == 0 {
                text.push('\n');
            }
        }
        text
    }

    #[test]
    fn transcript_shows_prefixed_bubbles() {
        let mut app = App::new(&Config::default());
        app.transcript.push(Bubble::user("Hello"));
        app.transcript.push(Bubble::bot("Hi there"));

        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("You: Hello"));
        assert!(text.contains("Bot: Hi there"));
    }

    #[test]
    fn pending_request_shows_thinking_indicator() {
        let mut app = App::new(&Config::default());
        app.transcript.push(Bubble::user("Hello"));
        app.pending = 1;
        app.animation_frame = 2;

        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Bot: Thinking..."));
    }

    #[test]
    fn empty_transcript_shows_placeholder() {
        let mut app = App::new(&Config::default());

        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("Type a message and press Enter..."));
    }

    #[test]
    fn render_records_transcript_dimensions() {
        let mut app = App::new(&Config::default());

        let backend = TestBackend::new(40, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        // 12 rows minus header, input box, footer, transcript borders
        assert_eq!(app.transcript_height, 12 - 1 - 3 - 1 - 2);
        assert_eq!(app.transcript_width, 40 - 2);
    }
}
