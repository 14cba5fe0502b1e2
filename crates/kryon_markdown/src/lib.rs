//! Kryon markdown frontend
//!
//! Lowers a CommonMark+GFM event stream into IR components: headings,
//! paragraphs, block quotes, code blocks, lists (including task lists),
//! tables, links, images, and the inline variants. The lowering keeps a
//! stack of open containers driven by Start/End tags; text lands on the
//! innermost open node, or in ordered Span children once inline markup
//! has split the run.

use pulldown_cmark::{
    Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};

use kryon_core::{
    ComponentKind, ComponentTree, CustomData, IrContext, ListKind, NodeKey, TextAlign,
    TextDecoration,
};

/// The markdown → IR lowering pass.
pub struct MarkdownFrontend {
    options: Options,
}

impl Default for MarkdownFrontend {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownFrontend {
    /// GFM tables, strikethrough, and task lists enabled.
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }

    /// Lower markdown text into a detached Markdown component owning the
    /// lowered blocks. The caller attaches it (or installs it as root).
    pub fn parse(&self, ctx: &mut IrContext, text: &str) -> NodeKey {
        let root = ctx.tree.create(ComponentKind::Markdown);
        let mut lowering = Lowering {
            tree: &mut ctx.tree,
            stack: vec![root],
            code_buffer: None,
            table_alignments: Vec::new(),
            table_cell_index: 0,
            in_table_head: false,
        };
        for event in Parser::new_ext(text, self.options) {
            lowering.event(event);
        }
        root
    }
}

struct Lowering<'a> {
    tree: &'a mut ComponentTree,
    stack: Vec<NodeKey>,
    /// Collects text while a code block is open.
    code_buffer: Option<(Option<String>, String)>,
    table_alignments: Vec<Alignment>,
    table_cell_index: usize,
    in_table_head: bool,
}

impl Lowering<'_> {
    fn top(&self) -> NodeKey {
        *self.stack.last().expect("lowering stack never empties")
    }

    fn open(&mut self, kind: ComponentKind) -> NodeKey {
        let node = self.tree.create(kind);
        let parent = self.top();
        self.tree.add_child(parent, node);
        self.stack.push(node);
        node
    }

    fn close(&mut self) {
        if self.stack.len() > 1 {
            self.stack.pop();
        }
    }

    fn append_text(&mut self, text: &str) {
        if let Some((_, buffer)) = &mut self.code_buffer {
            buffer.push_str(text);
            return;
        }
        let top = self.top();
        let Some(node) = self.tree.get_mut(top) else {
            return;
        };
        if node.children.is_empty() {
            match &mut node.text_content {
                Some(existing) => existing.push_str(text),
                None => node.text_content = Some(text.to_string()),
            }
        } else {
            // Inline markup already split the run; keep order with spans.
            let span = self.tree.create(ComponentKind::Span);
            self.tree.get_mut(span).expect("fresh node").text_content =
                Some(text.to_string());
            self.tree.add_child(top, span);
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.append_text(&text),
            Event::Code(code) => {
                let node = self.open(ComponentKind::CodeInline);
                self.tree.get_mut(node).expect("fresh node").text_content =
                    Some(code.to_string());
                self.close();
            }
            Event::SoftBreak => self.append_text(" "),
            Event::HardBreak => self.append_text("\n"),
            Event::Rule => {
                self.open(ComponentKind::HorizontalRule);
                self.close();
            }
            Event::TaskListMarker(checked) => {
                let top = self.top();
                if let Some(node) = self.tree.get_mut(top) {
                    node.custom_data = Some(CustomData::ListItem {
                        value: None,
                        checked: Some(checked),
                    });
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                // Raw HTML is preserved as literal text.
                self.append_text(&html);
            }
            Event::FootnoteReference(_) => {
                tracing::debug!("footnote references are not lowered");
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                self.open(ComponentKind::Paragraph);
            }
            Tag::Heading { level, id, .. } => {
                let node = self.open(ComponentKind::Heading);
                let level = match level {
                    HeadingLevel::H1 => 1,
                    HeadingLevel::H2 => 2,
                    HeadingLevel::H3 => 3,
                    HeadingLevel::H4 => 4,
                    HeadingLevel::H5 => 5,
                    HeadingLevel::H6 => 6,
                };
                self.tree.get_mut(node).expect("fresh node").custom_data =
                    Some(CustomData::Heading {
                        level,
                        anchor: id.map(|s| s.to_string()),
                    });
            }
            Tag::BlockQuote => {
                self.open(ComponentKind::Blockquote);
            }
            Tag::CodeBlock(kind) => {
                self.open(ComponentKind::CodeBlock);
                let language = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        Some(info.split_whitespace().next().unwrap_or("").to_string())
                    }
                    _ => None,
                };
                self.code_buffer = Some((language, String::new()));
            }
            Tag::List(start) => {
                let node = self.open(ComponentKind::List);
                let data = match start {
                    Some(start) => CustomData::List {
                        kind: ListKind::Ordered,
                        start: Some(start as u32),
                    },
                    None => CustomData::List {
                        kind: ListKind::Unordered,
                        start: None,
                    },
                };
                self.tree.get_mut(node).expect("fresh node").custom_data = Some(data);
            }
            Tag::Item => {
                self.open(ComponentKind::ListItem);
            }
            Tag::Table(alignments) => {
                self.open(ComponentKind::Table);
                self.table_alignments = alignments;
            }
            Tag::TableHead => {
                self.in_table_head = true;
                self.open(ComponentKind::TableHead);
                self.open(ComponentKind::TableRow);
                self.table_cell_index = 0;
            }
            Tag::TableRow => {
                self.open(ComponentKind::TableRow);
                self.table_cell_index = 0;
            }
            Tag::TableCell => {
                let kind = if self.in_table_head {
                    ComponentKind::TableHeaderCell
                } else {
                    ComponentKind::TableCell
                };
                let node = self.open(kind);
                let align = match self.table_alignments.get(self.table_cell_index) {
                    Some(Alignment::Left) => Some(TextAlign::Left),
                    Some(Alignment::Center) => Some(TextAlign::Center),
                    Some(Alignment::Right) => Some(TextAlign::Right),
                    _ => None,
                };
                self.table_cell_index += 1;
                if align.is_some() {
                    self.tree.get_mut(node).expect("fresh node").custom_data =
                        Some(CustomData::TableCell {
                            colspan: 1,
                            rowspan: 1,
                            align,
                        });
                }
            }
            Tag::Emphasis => {
                self.open(ComponentKind::Em);
            }
            Tag::Strong => {
                self.open(ComponentKind::Strong);
            }
            Tag::Strikethrough => {
                let node = self.open(ComponentKind::Span);
                if let Some(n) = self.tree.get_mut(node) {
                    n.style_mut().typography.decoration |= TextDecoration::LINE_THROUGH;
                }
            }
            Tag::Link { dest_url, title, .. } => {
                let node = self.open(ComponentKind::Link);
                self.tree.get_mut(node).expect("fresh node").custom_data =
                    Some(CustomData::Link {
                        url: dest_url.to_string(),
                        title: if title.is_empty() {
                            None
                        } else {
                            Some(title.to_string())
                        },
                    });
            }
            Tag::Image { dest_url, title, .. } => {
                let node = self.open(ComponentKind::Image);
                self.tree.get_mut(node).expect("fresh node").custom_data =
                    Some(CustomData::Image {
                        src: dest_url.to_string(),
                        alt: if title.is_empty() {
                            None
                        } else {
                            Some(title.to_string())
                        },
                    });
            }
            other => {
                tracing::debug!(?other, "markdown tag not lowered, children inlined");
            }
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => {
                if let Some((language, source)) = self.code_buffer.take() {
                    let top = self.top();
                    if let Some(node) = self.tree.get_mut(top) {
                        node.custom_data = Some(CustomData::CodeBlock { language, source });
                    }
                }
                self.close();
            }
            TagEnd::TableHead => {
                // Pop the implicit header row, then the head itself.
                self.close();
                self.close();
                self.in_table_head = false;
            }
            TagEnd::Image => {
                // Alt text accumulated as inner text; move it into place.
                let top = self.top();
                if let Some(node) = self.tree.get_mut(top) {
                    let text = node.text_content.take();
                    if let Some(CustomData::Image { alt, .. }) = &mut node.custom_data {
                        if alt.is_none() {
                            *alt = text;
                        }
                    }
                }
                self.close();
            }
            TagEnd::Paragraph
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::Table
            | TagEnd::TableRow
            | TagEnd::TableCell
            | TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link => self.close(),
            _ => {}
        }
    }
}

/// Convenience: lower markdown into a fresh context as the document root.
pub fn markdown_to_document(text: &str) -> IrContext {
    let mut ctx = IrContext::new();
    let frontend = MarkdownFrontend::new();
    let root = frontend.parse(&mut ctx, text);
    ctx.tree.set_root(root);
    ctx
}
