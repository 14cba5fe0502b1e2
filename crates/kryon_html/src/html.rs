//! HTML emission: one element per component, semantic overrides per
//! variant, and inline event wiring.

use html_escape::{encode_double_quoted_attribute, encode_text};

use kryon_core::{
    Component, ComponentKind, ComponentTree, CustomData, EventKind, ListKind, NodeKey,
};

/// Elements with no closing tag.
fn is_void(tag: &str) -> bool {
    matches!(tag, "img" | "input" | "hr" | "br")
}

/// The HTML element a variant renders as. Headings and lists refine this
/// from their custom data.
fn base_tag(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Text => "span",
        ComponentKind::Button | ComponentKind::Tab => "button",
        ComponentKind::Input | ComponentKind::Checkbox => "input",
        ComponentKind::Dropdown => "select",
        ComponentKind::TextArea => "textarea",
        ComponentKind::Image => "img",
        ComponentKind::Canvas => "canvas",
        ComponentKind::Paragraph => "p",
        ComponentKind::Blockquote => "blockquote",
        ComponentKind::CodeBlock => "pre",
        ComponentKind::HorizontalRule => "hr",
        ComponentKind::ListItem => "li",
        ComponentKind::Link => "a",
        ComponentKind::Span => "span",
        ComponentKind::Strong => "strong",
        ComponentKind::Em => "em",
        ComponentKind::CodeInline => "code",
        ComponentKind::Small => "small",
        ComponentKind::Mark => "mark",
        ComponentKind::Table => "table",
        ComponentKind::TableHead => "thead",
        ComponentKind::TableBody => "tbody",
        ComponentKind::TableRow => "tr",
        ComponentKind::TableCell => "td",
        ComponentKind::TableHeaderCell => "th",
        _ => "div",
    }
}

/// Canonical per-variant CSS class: `kryon-` plus the kebab-cased
/// variant name.
pub fn css_class(kind: ComponentKind) -> String {
    let name = kind.canonical_name();
    let mut out = String::with_capacity(name.len() + 8);
    out.push_str("kryon-");
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn element_tag(node: &Component) -> String {
    match (&node.kind, &node.custom_data) {
        (ComponentKind::Heading, Some(CustomData::Heading { level, .. })) => {
            format!("h{}", (*level).clamp(1, 6))
        }
        (ComponentKind::Heading, _) => "h1".to_string(),
        (ComponentKind::List, Some(CustomData::List { kind, .. })) => match kind {
            ListKind::Ordered => "ol".to_string(),
            ListKind::Unordered => "ul".to_string(),
        },
        (ComponentKind::List, _) => "ul".to_string(),
        _ => base_tag(node.kind).to_string(),
    }
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&encode_double_quoted_attribute(value));
    out.push('"');
}

fn variant_attributes(node: &Component, out: &mut String) {
    match (&node.kind, &node.custom_data) {
        (ComponentKind::Link, Some(CustomData::Link { url, title })) => {
            push_attr(out, "href", url);
            if let Some(title) = title {
                push_attr(out, "title", title);
            }
        }
        (ComponentKind::Image, Some(CustomData::Image { src, alt })) => {
            push_attr(out, "src", src);
            if let Some(alt) = alt {
                push_attr(out, "alt", alt);
            }
        }
        (
            ComponentKind::TableCell | ComponentKind::TableHeaderCell,
            Some(CustomData::TableCell {
                colspan,
                rowspan,
                align,
            }),
        ) => {
            if *colspan > 1 {
                push_attr(out, "colspan", &colspan.to_string());
            }
            if *rowspan > 1 {
                push_attr(out, "rowspan", &rowspan.to_string());
            }
            if let Some(align) = align {
                push_attr(out, "style", &format!("text-align: {}", align.css_name()));
            }
        }
        (ComponentKind::List, Some(CustomData::List { start: Some(start), .. })) => {
            if *start != 1 {
                push_attr(out, "start", &start.to_string());
            }
        }
        (ComponentKind::ListItem, Some(CustomData::ListItem { value, checked })) => {
            if let Some(value) = value {
                push_attr(out, "value", &value.to_string());
            }
            if let Some(checked) = checked {
                push_attr(out, "data-checked", if *checked { "true" } else { "false" });
            }
        }
        (ComponentKind::Checkbox, _) => {
            push_attr(out, "type", "checkbox");
        }
        (ComponentKind::Input, _) => {
            push_attr(out, "type", "text");
            if let Some(text) = &node.text_content {
                push_attr(out, "value", text);
            }
        }
        _ => {}
    }
}

fn event_attributes(node: &Component, out: &mut String) {
    let id = node.id.0;
    for event in &node.events {
        let logic = &event.logic;
        match event.kind {
            EventKind::Click => {
                push_attr(out, "onclick", &format!("kryon_handle_click({id}, '{logic}')"));
            }
            EventKind::Hover => {
                push_attr(
                    out,
                    "onmouseover",
                    &format!("kryon_handle_hover({id}, '{logic}', true)"),
                );
                push_attr(
                    out,
                    "onmouseout",
                    &format!("kryon_handle_hover({id}, '{logic}', false)"),
                );
            }
            EventKind::Focus | EventKind::Blur => {
                push_attr(out, "onfocus", &format!("kryon_handle_focus({id}, '{logic}', true)"));
                push_attr(out, "onblur", &format!("kryon_handle_focus({id}, '{logic}', false)"));
            }
            other => {
                tracing::debug!(kind = other.name(), "event type has no inline wiring");
            }
        }
    }
}

/// Emit the element (and subtree) for one component.
pub fn emit_component(tree: &ComponentTree, key: NodeKey, out: &mut String) {
    let Some(node) = tree.get(key) else {
        tracing::warn!("skipping dangling node during html emission");
        return;
    };
    let tag = element_tag(node);

    out.push('<');
    out.push_str(&tag);
    push_attr(out, "id", &format!("kryon-{}", node.id.0));
    let mut class = css_class(node.kind);
    if let Some(extra) = &node.tag {
        class.push(' ');
        class.push_str(extra);
    }
    push_attr(out, "class", &class);
    variant_attributes(node, out);
    event_attributes(node, out);
    out.push('>');

    if is_void(tag.as_str()) {
        return;
    }

    // CodeBlock wraps its source in a language-tagged <code>.
    if node.kind == ComponentKind::CodeBlock {
        let (language, source) = match &node.custom_data {
            Some(CustomData::CodeBlock { language, source }) => {
                (language.as_deref(), source.as_str())
            }
            _ => (None, node.text_content.as_deref().unwrap_or("")),
        };
        out.push_str("<code");
        if let Some(language) = language {
            push_attr(out, "class", &format!("language-{language}"));
        }
        out.push('>');
        out.push_str(&encode_text(source));
        out.push_str("</code>");
    } else if let Some(text) = &node.text_content {
        out.push_str(&encode_text(text));
    }

    // Dropdown options come from custom data, not child components.
    if let (ComponentKind::Dropdown, Some(CustomData::Dropdown { options, selected })) =
        (&node.kind, &node.custom_data)
    {
        for (i, option) in options.iter().enumerate() {
            out.push_str("<option");
            if Some(i) == *selected {
                out.push_str(" selected");
            }
            out.push('>');
            out.push_str(&encode_text(option));
            out.push_str("</option>");
        }
    }

    for &child in &node.children {
        emit_component(tree, child, out);
    }

    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{ComponentTree, EventBinding};

    fn emit(tree: &ComponentTree, key: NodeKey) -> String {
        let mut out = String::new();
        emit_component(tree, key, &mut out);
        out
    }

    #[test]
    fn ids_and_classes_are_canonical() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::TableHeaderCell);
        let html = emit(&tree, key);
        assert!(html.contains("id=\"kryon-1\""));
        assert!(html.contains("class=\"kryon-table-header-cell\""));
        assert!(html.starts_with("<th"));
    }

    #[test]
    fn heading_level_selects_element() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Heading);
        tree.get_mut(key).unwrap().custom_data = Some(CustomData::Heading {
            level: 3,
            anchor: None,
        });
        tree.get_mut(key).unwrap().text_content = Some("Section".into());
        let html = emit(&tree, key);
        assert!(html.starts_with("<h3"));
        assert!(html.ends_with("</h3>"));
    }

    #[test]
    fn ordered_list_with_start() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::List);
        tree.get_mut(key).unwrap().custom_data = Some(CustomData::List {
            kind: ListKind::Ordered,
            start: Some(4),
        });
        let html = emit(&tree, key);
        assert!(html.starts_with("<ol"));
        assert!(html.contains("start=\"4\""));
    }

    #[test]
    fn link_escapes_attributes() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Link);
        {
            let node = tree.get_mut(key).unwrap();
            node.custom_data = Some(CustomData::Link {
                url: "https://example.com/?a=1&b=\"2\"".into(),
                title: Some("A <quoted> title".into()),
            });
            node.text_content = Some("x < y".into());
        }
        let html = emit(&tree, key);
        assert!(html.contains("href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\""));
        assert!(html.contains("x &lt; y"));
        assert!(!html.contains("<quoted>"));
    }

    #[test]
    fn code_block_wraps_language_class() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::CodeBlock);
        tree.get_mut(key).unwrap().custom_data = Some(CustomData::CodeBlock {
            language: Some("rust".into()),
            source: "fn main() { 1 < 2; }".into(),
        });
        let html = emit(&tree, key);
        assert!(html.contains("<code class=\"language-rust\">"));
        assert!(html.contains("1 &lt; 2"));
    }

    #[test]
    fn table_cell_spans_and_alignment() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::TableCell);
        tree.get_mut(key).unwrap().custom_data = Some(CustomData::TableCell {
            colspan: 2,
            rowspan: 1,
            align: Some(kryon_core::TextAlign::Center),
        });
        let html = emit(&tree, key);
        assert!(html.contains("colspan=\"2\""));
        assert!(!html.contains("rowspan"));
        assert!(html.contains("text-align: center"));
    }

    #[test]
    fn click_event_wiring() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Button);
        tree.get_mut(key).unwrap().events.push(EventBinding {
            kind: EventKind::Click,
            logic: "increment".into(),
            inline: None,
        });
        let html = emit(&tree, key);
        assert!(html.contains("onclick=\"kryon_handle_click(1, 'increment')\""));
    }

    #[test]
    fn hover_wires_both_directions() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Container);
        tree.get_mut(key).unwrap().events.push(EventBinding {
            kind: EventKind::Hover,
            logic: "peek".into(),
            inline: None,
        });
        let html = emit(&tree, key);
        assert!(html.contains("onmouseover"));
        assert!(html.contains("onmouseout"));
    }

    #[test]
    fn dropdown_renders_options() {
        let mut tree = ComponentTree::new();
        let key = tree.create(ComponentKind::Dropdown);
        tree.get_mut(key).unwrap().custom_data = Some(CustomData::Dropdown {
            options: vec!["One".into(), "Two".into()],
            selected: Some(1),
        });
        let html = emit(&tree, key);
        assert!(html.contains("<option>One</option>"));
        assert!(html.contains("<option selected>Two</option>"));
    }

    #[test]
    fn void_elements_do_not_close() {
        let mut tree = ComponentTree::new();
        let hr = tree.create(ComponentKind::HorizontalRule);
        let html = emit(&tree, hr);
        assert!(html.starts_with("<hr"));
        assert!(!html.contains("</hr>"));
    }
}
