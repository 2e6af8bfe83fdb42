//! Drawing

use super::App;
use crate::markup::{self, Block as DocBlock, Document, Inline};
use crate::runtime::{AssistantClient, CatalogClient};
use crate::session::{ErrorKind, Message, Role};
use crate::view::{StatusBanner, ViewState};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

const HELP: &str = "Enter send · Tab poem · F2 full text · F3 questions · PgUp/PgDn scroll · Esc quit";

pub fn draw<A, C>(frame: &mut Frame<'_>, app: &App<A, C>)
where
    A: AssistantClient + 'static,
    C: CatalogClient + 'static,
{
    let view = app.runtime().view();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    frame.render_widget(topic_bar(&view), chunks[0]);
    frame.render_widget(Paragraph::new(status_line(&view.status_banner)), chunks[1]);
    draw_history(frame, &view, app.scroll(), chunks[2]);

    let feedback = app.feedback().map_or_else(Line::default, |msg| {
        Line::from(Span::styled(cell_text(msg), Style::default().fg(Color::Red)))
    });
    frame.render_widget(Paragraph::new(feedback), chunks[3]);

    draw_input(frame, &view, app.input(), chunks[4]);
}

fn topic_bar(view: &ViewState) -> Paragraph<'static> {
    let mut spans = Vec::new();
    if view.topics.is_empty() {
        spans.push(Span::styled(
            "No poems available",
            Style::default().fg(Color::DarkGray),
        ));
    }
    for topic in &view.topics {
        let style = if view.selected_topic.as_ref() == Some(topic) {
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else if view.can_select_topic {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", cell_text(topic.as_str())), style));
        spans.push(Span::raw(" "));
    }
    Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" Poems "))
}

fn status_line(banner: &StatusBanner) -> Line<'static> {
    match banner {
        StatusBanner::Idle => Line::from(Span::styled(HELP, Style::default().fg(Color::DarkGray))),
        StatusBanner::LoadingTopics => Line::from(Span::styled(
            "Loading poems...",
            Style::default().fg(Color::Yellow),
        )),
        StatusBanner::AwaitingReply => Line::from(Span::styled(
            "Waiting for a reply...",
            Style::default().fg(Color::Yellow),
        )),
        StatusBanner::Error(info) => {
            let hint = if info.kind == ErrorKind::CatalogLoad {
                " (F5 to retry)"
            } else {
                ""
            };
            Line::from(Span::styled(
                format!("{}{hint}", cell_text(&info.to_string())),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
        }
    }
}

fn draw_history(frame: &mut Frame<'_>, view: &ViewState, scroll: u16, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Conversation ");
    let inner = block.inner(area);

    let lines = if view.visible_history.is_empty() {
        vec![Line::from(Span::styled(
            "Start a conversation about the selected poem!",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        history_lines(&view.visible_history)
    };

    // Stick to the bottom unless the user scrolled up
    let total = wrapped_height(&lines, inner.width);
    let offset = total
        .saturating_sub(usize::from(inner.height))
        .saturating_sub(usize::from(scroll));
    let offset = u16::try_from(offset).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((offset, 0));
    frame.render_widget(paragraph, area);
}

fn draw_input(frame: &mut Frame<'_>, view: &ViewState, input: &str, area: Rect) {
    let title = match &view.selected_topic {
        Some(topic) => format!(" Ask about {} ", cell_text(topic.as_str())),
        None => " Ask about the poem ".to_string(),
    };
    let style = if view.can_submit {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    let shown = cell_text(input);
    let width = u16::try_from(shown.chars().count()).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(shown).style(style).block(block), area);

    let x = inner.x.saturating_add(width).min(inner.right().saturating_sub(1));
    frame.set_cursor_position((x, inner.y));
}

/// Text for one row of cells: tabs expanded and control characters made
/// visible, so nothing reaches the terminal as an escape sequence
fn cell_text(text: &str) -> String {
    markup::single_line(&text.replace('\t', "    "))
}

/// Rough height after wrapping; good enough to keep the latest turn in view
fn wrapped_height(lines: &[Line<'_>], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum()
}

pub(super) fn history_lines(messages: &[Message]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in messages {
        if !lines.is_empty() {
            lines.push(Line::default());
        }
        match message.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.extend(message.body.lines().map(|l| Line::from(cell_text(l))));
            }
            Role::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Assistant",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )));
                lines.extend(document_lines(&markup::render(&message.body)));
            }
        }
    }
    lines
}

// ============================================================================
// Document -> Lines
// ============================================================================

pub(super) fn document_lines(doc: &Document) -> Vec<Line<'static>> {
    block_lines(&doc.blocks)
}

fn block_lines(blocks: &[DocBlock]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        match block {
            DocBlock::Paragraph(content) => lines.extend(inline_lines(content, Style::default())),
            DocBlock::Heading { content, .. } => lines.extend(inline_lines(
                content,
                Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            )),
            DocBlock::CodeBlock { code, .. } => {
                let style = Style::default().fg(Color::Yellow);
                lines.extend(
                    code.lines()
                        .map(|l| Line::from(vec![Span::raw("  "), Span::styled(cell_text(l), style)])),
                );
            }
            DocBlock::Quote(children) => {
                let style = Style::default().fg(Color::DarkGray);
                lines.extend(prefixed(block_lines(children), "│ ", "│ ", style));
            }
            DocBlock::Rule => lines.push(Line::from(Span::styled(
                "─".repeat(24),
                Style::default().fg(Color::DarkGray),
            ))),
            DocBlock::List { start, items } => {
                for (n, item) in items.iter().enumerate() {
                    let marker = match start {
                        Some(first) => format!("{}. ", first + n as u64),
                        None => "• ".to_string(),
                    };
                    let indent = " ".repeat(marker.chars().count());
                    lines.extend(prefixed(block_lines(item), &marker, &indent, Style::default()));
                }
            }
        }
    }
    lines
}

fn prefixed(lines: Vec<Line<'static>>, first: &str, rest: &str, style: Style) -> Vec<Line<'static>> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, mut line)| {
            let prefix = if i == 0 { first } else { rest };
            line.spans.insert(0, Span::styled(prefix.to_string(), style));
            line
        })
        .collect()
}

struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
}

impl LineBuilder {
    fn push_text(&mut self, text: &str, style: Style) {
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.break_line();
            }
            if !part.is_empty() {
                self.current.push(Span::styled(cell_text(part), style));
            }
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
    }

    fn inlines(&mut self, content: &[Inline], style: Style) {
        for inline in content {
            match inline {
                Inline::Text(text) => self.push_text(text, style),
                Inline::Code(code) => self.push_text(code, style.fg(Color::Yellow)),
                Inline::Emphasis(children) => {
                    self.inlines(children, style.add_modifier(Modifier::ITALIC));
                }
                Inline::Strong(children) => {
                    self.inlines(children, style.add_modifier(Modifier::BOLD));
                }
                Inline::Strikethrough(children) => {
                    self.inlines(children, style.add_modifier(Modifier::CROSSED_OUT));
                }
                Inline::Link { label, url } => {
                    self.inlines(label, style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED));
                    self.push_text(&format!(" ({url})"), style.fg(Color::DarkGray));
                }
                Inline::LineBreak => self.break_line(),
            }
        }
    }
}

fn inline_lines(content: &[Inline], style: Style) -> Vec<Line<'static>> {
    let mut builder = LineBuilder {
        lines: Vec::new(),
        current: Vec::new(),
    };
    builder.inlines(content, style);
    if !builder.current.is_empty() || builder.lines.is_empty() {
        builder.break_line();
    }
    builder.lines
}
