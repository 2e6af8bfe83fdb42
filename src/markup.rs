//! Safe rendering of assistant replies
//!
//! Replies are untrusted Markdown. [`render`] turns them into a small
//! [`Document`] tree that front ends draw themselves; nothing in the tree is
//! ever interpreted as markup. Raw HTML survives only as literal text, links
//! with active schemes lose their target, and images collapse to their alt
//! text.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use std::fmt::Write as _;

/// Link schemes that could run code if a front end followed them
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Inline>),
    Heading {
        level: u8,
        content: Vec<Inline>,
    },
    /// `start` is set for ordered lists
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Quote(Vec<Block>),
    Rule,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Code(String),
    Link { label: Vec<Inline>, url: String },
    LineBreak,
}

/// Render untrusted Markdown. Never fails: anything unrecognized comes out
/// as literal text.
pub fn render(text: &str) -> Document {
    let mut builder = Builder::new();
    for event in Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH) {
        builder.event(event);
    }
    builder.finish()
}

// ============================================================================
// Tree builder
// ============================================================================

enum BlockFrame {
    Root(Vec<Block>),
    Quote(Vec<Block>),
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Item(Vec<Block>),
}

enum InlineKind {
    Paragraph,
    Heading(u8),
    Emphasis,
    Strong,
    Strikethrough,
    Link(String),
    /// Children are spliced into the parent (image alt text, unsafe links)
    Transparent,
}

struct InlineFrame {
    kind: InlineKind,
    content: Vec<Inline>,
}

struct Builder {
    blocks: Vec<BlockFrame>,
    /// Open inline containers; the bottom one is always a leaf block
    inlines: Vec<InlineFrame>,
    code: Option<(Option<String>, String)>,
}

impl Builder {
    fn new() -> Self {
        Self {
            blocks: vec![BlockFrame::Root(Vec::new())],
            inlines: Vec::new(),
            code: None,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            // Raw HTML is shown, never interpreted
            Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let text = neutralize_controls(&text);
                match &mut self.code {
                    Some((_, code)) => code.push_str(&text),
                    None => self.push_inline(Inline::Text(text)),
                }
            }
            Event::Code(code) => self.push_inline(Inline::Code(neutralize_controls(&code))),
            // Poems rely on their line breaks
            Event::SoftBreak | Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => {
                self.finish_leaf();
                self.push_block(Block::Rule);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::HtmlBlock => self.open_leaf(InlineKind::Paragraph),
            Tag::Heading { level, .. } => self.open_leaf(InlineKind::Heading(level as u8)),
            Tag::BlockQuote(_) => {
                self.finish_leaf();
                self.blocks.push(BlockFrame::Quote(Vec::new()));
            }
            Tag::List(start) => {
                self.finish_leaf();
                self.blocks.push(BlockFrame::List {
                    start,
                    items: Vec::new(),
                });
            }
            Tag::Item => {
                self.finish_leaf();
                self.blocks.push(BlockFrame::Item(Vec::new()));
            }
            Tag::CodeBlock(kind) => {
                self.finish_leaf();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.trim().is_empty() => {
                        Some(neutralize_controls(lang.trim()))
                    }
                    _ => None,
                };
                self.code = Some((language, String::new()));
            }
            Tag::Emphasis => self.open_inline(InlineKind::Emphasis),
            Tag::Strong => self.open_inline(InlineKind::Strong),
            Tag::Strikethrough => self.open_inline(InlineKind::Strikethrough),
            Tag::Link { dest_url, .. } => match safe_url(&dest_url) {
                Some(url) => self.open_inline(InlineKind::Link(url)),
                None => self.open_inline(InlineKind::Transparent),
            },
            Tag::Image { .. } => self.open_inline(InlineKind::Transparent),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::HtmlBlock => self.finish_leaf(),
            TagEnd::BlockQuote(_) | TagEnd::List(_) | TagEnd::Item => {
                self.finish_leaf();
                self.close_block();
            }
            TagEnd::CodeBlock => {
                if let Some((language, mut code)) = self.code.take() {
                    if code.ends_with('\n') {
                        code.pop();
                    }
                    self.push_block(Block::CodeBlock { language, code });
                }
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => {
                if self.inlines.len() > 1 {
                    self.close_inline();
                }
            }
            _ => {}
        }
    }

    fn open_leaf(&mut self, kind: InlineKind) {
        self.finish_leaf();
        self.inlines.push(InlineFrame {
            kind,
            content: Vec::new(),
        });
    }

    fn open_inline(&mut self, kind: InlineKind) {
        if self.inlines.is_empty() {
            self.open_leaf(InlineKind::Paragraph);
        }
        self.inlines.push(InlineFrame {
            kind,
            content: Vec::new(),
        });
    }

    /// Append to the innermost open container, opening an implicit
    /// paragraph for tight list items
    fn push_inline(&mut self, inline: Inline) {
        if self.inlines.is_empty() {
            self.open_leaf(InlineKind::Paragraph);
        }
        if let Some(frame) = self.inlines.last_mut() {
            append_merged(&mut frame.content, inline);
        }
    }

    fn close_inline(&mut self) {
        let Some(frame) = self.inlines.pop() else {
            return;
        };
        let content = frame.content;
        match frame.kind {
            InlineKind::Paragraph => {
                if !content.is_empty() {
                    self.push_block(Block::Paragraph(content));
                }
            }
            InlineKind::Heading(level) => self.push_block(Block::Heading { level, content }),
            InlineKind::Emphasis => self.push_inline(Inline::Emphasis(content)),
            InlineKind::Strong => self.push_inline(Inline::Strong(content)),
            InlineKind::Strikethrough => self.push_inline(Inline::Strikethrough(content)),
            InlineKind::Link(url) => self.push_inline(Inline::Link {
                label: content,
                url,
            }),
            InlineKind::Transparent => {
                for inline in content {
                    self.push_inline(inline);
                }
            }
        }
    }

    fn finish_leaf(&mut self) {
        while !self.inlines.is_empty() {
            self.close_inline();
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.blocks.last_mut() {
            Some(BlockFrame::Root(children) | BlockFrame::Quote(children) | BlockFrame::Item(children)) => {
                children.push(block);
            }
            Some(BlockFrame::List { items, .. }) => items.push(vec![block]),
            None => self.blocks.push(BlockFrame::Root(vec![block])),
        }
    }

    fn close_block(&mut self) {
        if self.blocks.len() <= 1 {
            return;
        }
        match self.blocks.pop() {
            Some(BlockFrame::Quote(children)) => self.push_block(Block::Quote(children)),
            Some(BlockFrame::List { start, items }) => self.push_block(Block::List { start, items }),
            Some(BlockFrame::Item(children)) => match self.blocks.last_mut() {
                Some(BlockFrame::List { items, .. }) => items.push(children),
                _ => {
                    for block in children {
                        self.push_block(block);
                    }
                }
            },
            Some(BlockFrame::Root(children)) => {
                for block in children {
                    self.push_block(block);
                }
            }
            None => {}
        }
    }

    fn finish(mut self) -> Document {
        self.finish_leaf();
        if let Some((language, code)) = self.code.take() {
            self.push_block(Block::CodeBlock { language, code });
        }
        while self.blocks.len() > 1 {
            self.close_block();
        }
        match self.blocks.pop() {
            Some(BlockFrame::Root(blocks)) => Document { blocks },
            _ => Document::default(),
        }
    }
}

fn append_merged(content: &mut Vec<Inline>, inline: Inline) {
    if let (Some(Inline::Text(last)), Inline::Text(next)) = (content.last_mut(), &inline) {
        last.push_str(next);
        return;
    }
    content.push(inline);
}

/// Returns the destination if it is safe to keep
fn safe_url(dest: &str) -> Option<String> {
    let dest = dest.trim();
    if dest.is_empty() {
        return None;
    }
    // Browsers ignore embedded whitespace and controls when reading a scheme
    let squashed: String = dest
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|s| squashed.starts_with(s)) {
        None
    } else {
        Some(neutralize_controls(dest))
    }
}

/// Replace control characters other than newline and tab with visible
/// stand-ins, so untrusted text can never reach a terminal as an escape
/// sequence. C0 controls and DEL become Unicode control pictures.
pub fn neutralize_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' | '\t' => out.push(c),
            '\u{0}'..='\u{1f}' => {
                let picture = char::from_u32(0x2400 + u32::from(c));
                out.push(picture.unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            '\u{7f}' => out.push('\u{2421}'),
            c if c.is_control() => out.extend(c.escape_default()),
            c => out.push(c),
        }
    }
    out
}

/// [`neutralize_controls`] for text that must stay on one line
pub fn single_line(text: &str) -> String {
    neutralize_controls(text)
        .chars()
        .map(|c| if c == '\n' || c == '\t' { ' ' } else { c })
        .collect()
}

// ============================================================================
// Output
// ============================================================================

#[allow(dead_code)]
impl Document {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Plain text with light structure (bullets, quote markers)
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        plain_blocks(&self.blocks, "", &mut out);
        out.truncate(out.trim_end().len());
        out
    }

    /// HTML in which every text node and attribute is escaped
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            html_block(block, &mut out);
        }
        out
    }
}

pub fn inline_text(content: &[Inline]) -> String {
    let mut out = String::new();
    plain_inlines(content, &mut out);
    out
}

fn plain_inlines(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Text(text) | Inline::Code(text) => out.push_str(text),
            Inline::Emphasis(children)
            | Inline::Strong(children)
            | Inline::Strikethrough(children)
            | Inline::Link {
                label: children, ..
            } => plain_inlines(children, out),
            Inline::LineBreak => out.push('\n'),
        }
    }
}

fn push_prefixed(text: &str, prefix: &str, out: &mut String) {
    for line in text.lines() {
        out.push_str(prefix);
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
}

fn plain_blocks(blocks: &[Block], prefix: &str, out: &mut String) {
    for block in blocks {
        match block {
            Block::Paragraph(content) | Block::Heading { content, .. } => {
                push_prefixed(&inline_text(content), prefix, out);
            }
            Block::CodeBlock { code, .. } => push_prefixed(code, prefix, out),
            Block::Quote(children) => plain_blocks(children, &format!("{prefix}> "), out),
            Block::Rule => push_prefixed("---", prefix, out),
            Block::List { start, items } => {
                for (index, item) in items.iter().enumerate() {
                    let marker = match start {
                        Some(n) => format!("{}. ", n + index as u64),
                        None => "- ".to_string(),
                    };
                    let mut body = String::new();
                    plain_blocks(item, "", &mut body);
                    let body = body.trim_end();
                    let indent = " ".repeat(marker.len());
                    for (line_no, line) in body.lines().enumerate() {
                        out.push_str(prefix);
                        out.push_str(if line_no == 0 { &marker } else { &indent });
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                out.push('\n');
            }
        }
    }
}

fn escape_html(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

fn html_block(block: &Block, out: &mut String) {
    match block {
        Block::Paragraph(content) => {
            out.push_str("<p>");
            html_inlines(content, out);
            out.push_str("</p>\n");
        }
        Block::Heading { level, content } => {
            let level = (*level).clamp(1, 6);
            let _ = write!(out, "<h{level}>");
            html_inlines(content, out);
            let _ = writeln!(out, "</h{level}>");
        }
        Block::List { start, items } => {
            let tag = match start {
                Some(1) => {
                    out.push_str("<ol>\n");
                    "ol"
                }
                Some(n) => {
                    let _ = writeln!(out, "<ol start=\"{n}\">");
                    "ol"
                }
                None => {
                    out.push_str("<ul>\n");
                    "ul"
                }
            };
            for item in items {
                out.push_str("<li>");
                for child in item {
                    html_block(child, out);
                }
                out.push_str("</li>\n");
            }
            let _ = writeln!(out, "</{tag}>");
        }
        Block::CodeBlock { language, code } => {
            match language {
                Some(lang) => {
                    out.push_str("<pre><code class=\"language-");
                    escape_html(lang, out);
                    out.push_str("\">");
                }
                None => out.push_str("<pre><code>"),
            }
            escape_html(code, out);
            out.push_str("</code></pre>\n");
        }
        Block::Quote(children) => {
            out.push_str("<blockquote>\n");
            for child in children {
                html_block(child, out);
            }
            out.push_str("</blockquote>\n");
        }
        Block::Rule => out.push_str("<hr />\n"),
    }
}

fn html_inlines(content: &[Inline], out: &mut String) {
    for inline in content {
        match inline {
            Inline::Text(text) => escape_html(text, out),
            Inline::Code(code) => {
                out.push_str("<code>");
                escape_html(code, out);
                out.push_str("</code>");
            }
            Inline::Emphasis(children) => wrap_html("em", children, out),
            Inline::Strong(children) => wrap_html("strong", children, out),
            Inline::Strikethrough(children) => wrap_html("del", children, out),
            Inline::Link { label, url } => {
                out.push_str("<a href=\"");
                escape_html(url, out);
                out.push_str("\" rel=\"nofollow noopener\">");
                html_inlines(label, out);
                out.push_str("</a>");
            }
            Inline::LineBreak => out.push_str("<br />\n"),
        }
    }
}

fn wrap_html(tag: &str, children: &[Inline], out: &mut String) {
    let _ = write!(out, "<{tag}>");
    html_inlines(children, out);
    let _ = write!(out, "</{tag}>");
}
