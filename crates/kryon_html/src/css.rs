//! CSS emission: per-id rules derived from style and layout records,
//! pseudo-class overrides, and the authored stylesheet passthrough.

use kryon_core::{
    ColorValue, ComponentTree, Dimension, GradientKind, GridTrack, LayoutMode, NodeKey,
    PositionMode, Stylesheet, Style, TextDecoration,
};

fn dim_css(dim: &Dimension) -> Option<String> {
    Some(match dim {
        Dimension::Px(v) => format!("{v}px"),
        Dimension::Percent(v) => format!("{v}%"),
        Dimension::Auto => "auto".to_string(),
        Dimension::Flex(_) => return None,
        Dimension::Vw(v) => format!("{v}vw"),
        Dimension::Vh(v) => format!("{v}vh"),
        Dimension::Vmin(v) => format!("{v}vmin"),
        Dimension::Vmax(v) => format!("{v}vmax"),
        Dimension::Rem(v) => format!("{v}rem"),
        Dimension::Em(v) => format!("{v}em"),
    })
}

fn color_css(color: &ColorValue) -> String {
    match color {
        ColorValue::Transparent => "transparent".to_string(),
        ColorValue::Solid(c) => c.to_hex(),
        ColorValue::Variable(id) => format!("var(--kryon-var-{id})"),
        ColorValue::Gradient(g) => {
            let stops: Vec<String> = g
                .stops
                .iter()
                .map(|s| format!("{} {}%", s.color.to_hex(), s.offset * 100.0))
                .collect();
            let stops = stops.join(", ");
            match g.kind {
                GradientKind::Linear => format!("linear-gradient({}deg, {stops})", g.angle),
                GradientKind::Radial => format!(
                    "radial-gradient(circle at {}% {}%, {stops})",
                    g.center_x * 100.0,
                    g.center_y * 100.0
                ),
                GradientKind::Conic => format!(
                    "conic-gradient(from {}deg at {}% {}%, {stops})",
                    g.angle,
                    g.center_x * 100.0,
                    g.center_y * 100.0
                ),
            }
        }
    }
}

fn push_decl(out: &mut Vec<String>, property: &str, value: impl AsRef<str>) {
    out.push(format!("{property}: {}", value.as_ref()));
}

fn style_declarations(style: &Style) -> Vec<String> {
    let default = Style::default();
    let mut decls = Vec::new();

    if style.width != default.width {
        if let Some(v) = dim_css(&style.width) {
            push_decl(&mut decls, "width", v);
        }
    }
    if style.height != default.height {
        if let Some(v) = dim_css(&style.height) {
            push_decl(&mut decls, "height", v);
        }
    }
    if style.background != default.background {
        let property = if matches!(style.background, ColorValue::Gradient(_)) {
            "background"
        } else {
            "background-color"
        };
        push_decl(&mut decls, property, color_css(&style.background));
    }
    if style.border_width > 0.0 {
        push_decl(
            &mut decls,
            "border",
            format!(
                "{}px solid {}",
                style.border_width,
                color_css(&style.border_color)
            ),
        );
    }
    if style.border_radius > 0.0 {
        push_decl(&mut decls, "border-radius", format!("{}px", style.border_radius));
    }
    if style.margin != default.margin {
        push_decl(
            &mut decls,
            "margin",
            format!(
                "{}px {}px {}px {}px",
                style.margin.top, style.margin.right, style.margin.bottom, style.margin.left
            ),
        );
    }
    if style.padding != default.padding {
        push_decl(
            &mut decls,
            "padding",
            format!(
                "{}px {}px {}px {}px",
                style.padding.top, style.padding.right, style.padding.bottom, style.padding.left
            ),
        );
    }

    let t = &style.typography;
    let td = &default.typography;
    if t.size != td.size {
        push_decl(&mut decls, "font-size", format!("{}px", t.size));
    }
    if t.color != td.color {
        push_decl(&mut decls, "color", color_css(&t.color));
    }
    if t.effective_weight() != td.effective_weight() {
        push_decl(&mut decls, "font-weight", t.effective_weight().to_string());
    }
    if t.italic {
        push_decl(&mut decls, "font-style", "italic");
    }
    if let Some(family) = &t.family {
        push_decl(&mut decls, "font-family", family);
    }
    if t.line_height > 0.0 {
        push_decl(&mut decls, "line-height", t.line_height.to_string());
    }
    if t.letter_spacing != 0.0 {
        push_decl(&mut decls, "letter-spacing", format!("{}px", t.letter_spacing));
    }
    if t.word_spacing != 0.0 {
        push_decl(&mut decls, "word-spacing", format!("{}px", t.word_spacing));
    }
    if t.align != td.align {
        push_decl(&mut decls, "text-align", t.align.css_name());
    }
    if !t.decoration.is_empty() {
        let mut lines = Vec::new();
        if t.decoration.contains(TextDecoration::UNDERLINE) {
            lines.push("underline");
        }
        if t.decoration.contains(TextDecoration::OVERLINE) {
            lines.push("overline");
        }
        if t.decoration.contains(TextDecoration::LINE_THROUGH) {
            lines.push("line-through");
        }
        push_decl(&mut decls, "text-decoration", lines.join(" "));
    }

    if let Some(transform) = &style.transform {
        if !transform.is_identity() {
            let mut parts = Vec::new();
            if transform.translate_x != 0.0 || transform.translate_y != 0.0 {
                parts.push(format!(
                    "translate({}px, {}px)",
                    transform.translate_x, transform.translate_y
                ));
            }
            if transform.scale_x != 1.0 || transform.scale_y != 1.0 {
                parts.push(format!("scale({}, {})", transform.scale_x, transform.scale_y));
            }
            if transform.rotate != 0.0 {
                parts.push(format!("rotate({}deg)", transform.rotate));
            }
            push_decl(&mut decls, "transform", parts.join(" "));
        }
    }
    if style.opacity != default.opacity {
        push_decl(&mut decls, "opacity", style.opacity.to_string());
    }
    if !style.visible {
        push_decl(&mut decls, "visibility", "hidden");
    }
    if style.z_index != default.z_index {
        push_decl(&mut decls, "z-index", style.z_index.to_string());
    }
    if style.position != PositionMode::Relative {
        push_decl(&mut decls, "position", style.position.css_name());
        push_decl(&mut decls, "left", format!("{}px", style.absolute_x));
        push_decl(&mut decls, "top", format!("{}px", style.absolute_y));
    }
    if style.overflow_x != default.overflow_x {
        push_decl(&mut decls, "overflow-x", style.overflow_x.css_name());
    }
    if style.overflow_y != default.overflow_y {
        push_decl(&mut decls, "overflow-y", style.overflow_y.css_name());
    }
    if let Some(shadow) = &style.shadow {
        push_decl(
            &mut decls,
            "box-shadow",
            format!(
                "{}{}px {}px {}px {}px {}",
                if shadow.inset { "inset " } else { "" },
                shadow.offset_x,
                shadow.offset_y,
                shadow.blur,
                shadow.spread,
                shadow.color.to_hex()
            ),
        );
    }
    if !style.filters.is_empty() {
        let filters: Vec<String> = style
            .filters
            .iter()
            .map(|f| match f.css_name() {
                "blur" => format!("blur({}px)", f.value()),
                "hue-rotate" => format!("hue-rotate({}deg)", f.value()),
                name => format!("{name}({})", f.value()),
            })
            .collect();
        push_decl(&mut decls, "filter", filters.join(" "));
    }

    decls
}

fn track_css(track: &GridTrack) -> String {
    match track {
        GridTrack::Px(v) => format!("{v}px"),
        GridTrack::Percent(v) => format!("{v}%"),
        GridTrack::Fr(v) => format!("{v}fr"),
        GridTrack::Auto => "auto".to_string(),
        GridTrack::MinContent => "min-content".to_string(),
        GridTrack::MaxContent => "max-content".to_string(),
    }
}

fn layout_declarations(layout: &kryon_core::LayoutSpec) -> Vec<String> {
    let mut decls = Vec::new();
    match layout.mode {
        LayoutMode::Flex => {
            push_decl(&mut decls, "display", "flex");
            push_decl(&mut decls, "flex-direction", layout.flex.direction.name());
            if layout.flex.wrap {
                push_decl(&mut decls, "flex-wrap", "wrap");
            }
            if layout.flex.gap > 0.0 {
                push_decl(&mut decls, "gap", format!("{}px", layout.flex.gap));
            }
        }
        LayoutMode::Grid => {
            push_decl(&mut decls, "display", "grid");
            if !layout.grid.columns.is_empty() {
                let tracks: Vec<String> = layout.grid.columns.iter().map(track_css).collect();
                push_decl(&mut decls, "grid-template-columns", tracks.join(" "));
            }
            if !layout.grid.rows.is_empty() {
                let tracks: Vec<String> = layout.grid.rows.iter().map(track_css).collect();
                push_decl(&mut decls, "grid-template-rows", tracks.join(" "));
            }
            if layout.grid.column_gap > 0.0 || layout.grid.row_gap > 0.0 {
                push_decl(
                    &mut decls,
                    "gap",
                    format!("{}px {}px", layout.grid.row_gap, layout.grid.column_gap),
                );
            }
        }
        LayoutMode::Block => push_decl(&mut decls, "display", "block"),
    }
    if layout.flex.grow > 0.0 {
        push_decl(&mut decls, "flex-grow", layout.flex.grow.to_string());
    }
    if layout.grid_item.column_start >= 0 {
        let start = layout.grid_item.column_start + 1;
        let end = if layout.grid_item.column_end > layout.grid_item.column_start {
            layout.grid_item.column_end + 1
        } else {
            start + 1
        };
        push_decl(&mut decls, "grid-column", format!("{start} / {end}"));
    }
    if layout.grid_item.row_start >= 0 {
        let start = layout.grid_item.row_start + 1;
        let end = if layout.grid_item.row_end > layout.grid_item.row_start {
            layout.grid_item.row_end + 1
        } else {
            start + 1
        };
        push_decl(&mut decls, "grid-row", format!("{start} / {end}"));
    }
    if layout.aspect_ratio > 0.0 {
        push_decl(&mut decls, "aspect-ratio", layout.aspect_ratio.to_string());
    }
    if layout.margin != kryon_core::Spacing::ZERO {
        push_decl(
            &mut decls,
            "margin",
            format!(
                "{}px {}px {}px {}px",
                layout.margin.top, layout.margin.right, layout.margin.bottom, layout.margin.left
            ),
        );
    }
    if layout.padding != kryon_core::Spacing::ZERO {
        push_decl(
            &mut decls,
            "padding",
            format!(
                "{}px {}px {}px {}px",
                layout.padding.top,
                layout.padding.right,
                layout.padding.bottom,
                layout.padding.left
            ),
        );
    }
    decls
}

fn write_rule(out: &mut String, selector: &str, decls: &[String]) {
    if decls.is_empty() {
        return;
    }
    out.push_str(selector);
    out.push_str(" {\n");
    for decl in decls {
        out.push_str("  ");
        out.push_str(decl);
        out.push_str(";\n");
    }
    out.push_str("}\n");
}

/// Emit CSS for a whole tree plus the authored stylesheet.
pub fn emit_css(tree: &ComponentTree, stylesheet: &Stylesheet) -> String {
    let mut out = String::new();

    // Style variables become custom properties.
    if !stylesheet.variables.is_empty() {
        let decls: Vec<String> = stylesheet
            .variables
            .iter()
            .map(|v| format!("--kryon-var-{}: {}", v.id, v.color.to_hex()))
            .collect();
        write_rule(&mut out, ":root", &decls);
    }

    if let Some(root) = tree.root() {
        emit_component_css(tree, root, &mut out);
    }

    // Authored rules pass through behind the generated ones.
    for rule in &stylesheet.rules {
        let decls: Vec<String> = rule
            .declarations
            .iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect();
        write_rule(&mut out, &rule.selector, &decls);
    }
    for mq in &stylesheet.media_queries {
        out.push_str(&format!("@media {} {{\n", mq.condition));
        for rule in &mq.rules {
            let decls: Vec<String> = rule
                .declarations
                .iter()
                .map(|(p, v)| format!("{p}: {v}"))
                .collect();
            write_rule(&mut out, &rule.selector, &decls);
        }
        out.push_str("}\n");
    }

    out
}

fn emit_component_css(tree: &ComponentTree, key: NodeKey, out: &mut String) {
    let Some(node) = tree.get(key) else {
        return;
    };
    let selector = format!("#kryon-{}", node.id.0);

    let mut decls = Vec::new();
    if let Some(layout) = node.layout.as_deref() {
        decls.extend(layout_declarations(layout));
    }
    if let Some(style) = node.style.as_deref() {
        decls.extend(style_declarations(style));
    }
    write_rule(out, &selector, &decls);

    // Pseudo-class overrides get their own rules.
    if let Some(style) = node.style.as_deref() {
        for pseudo in &style.pseudo {
            let mut pd = Vec::new();
            if let Some(bg) = &pseudo.background {
                push_decl(&mut pd, "background-color", color_css(bg));
            }
            if let Some(bc) = &pseudo.border_color {
                push_decl(&mut pd, "border-color", color_css(bc));
            }
            if let Some(tc) = &pseudo.text_color {
                push_decl(&mut pd, "color", color_css(tc));
            }
            if let Some(opacity) = pseudo.opacity {
                push_decl(&mut pd, "opacity", opacity.to_string());
            }
            write_rule(
                out,
                &format!("{selector}:{}", pseudo.class.css_name()),
                &pd,
            );
        }
    }

    for &child in &node.children {
        emit_component_css(tree, child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{
        Color, ComponentKind, Dimension, Gradient, PseudoClass, PseudoStyle,
    };

    #[test]
    fn per_id_rule_with_style_and_layout() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Row);
        tree.set_root(root);
        {
            let node = tree.get_mut(root).unwrap();
            node.style_mut().width = Dimension::Px(640.0);
            node.style_mut().background = ColorValue::Solid(Color::rgb(0, 0, 0));
            node.layout_mut().flex.direction = kryon_core::FlexDirection::Row;
            node.layout_mut().flex.gap = 10.0;
        }
        let css = emit_css(&tree, &Stylesheet::new());
        assert!(css.contains("#kryon-1 {"));
        assert!(css.contains("display: flex;"));
        assert!(css.contains("flex-direction: row;"));
        assert!(css.contains("gap: 10px;"));
        assert!(css.contains("width: 640px;"));
        assert!(css.contains("background-color: #000000;"));
    }

    #[test]
    fn pseudo_rule_emitted_separately() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Button);
        tree.set_root(root);
        let mut hover = PseudoStyle::new(PseudoClass::Hover);
        hover.background = Some(ColorValue::Solid(Color::rgb(200, 0, 0)));
        tree.get_mut(root).unwrap().style_mut().push_pseudo(hover);
        let css = emit_css(&tree, &Stylesheet::new());
        assert!(css.contains("#kryon-1:hover {"));
        assert!(css.contains("background-color: #C80000;"));
    }

    #[test]
    fn gradient_background() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        tree.get_mut(root).unwrap().style_mut().background = ColorValue::Gradient(Box::new(
            Gradient::linear(90.0, Color::RED, Color::BLUE),
        ));
        let css = emit_css(&tree, &Stylesheet::new());
        assert!(css.contains("background: linear-gradient(90deg, #FF0000 0%, #0000FF 100%);"));
    }

    #[test]
    fn variable_reference_uses_custom_property() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        let mut sheet = Stylesheet::new();
        let id = sheet.add_variable("accent", Color::rgb(10, 20, 30));
        tree.get_mut(root).unwrap().style_mut().background = ColorValue::Variable(id);
        let css = emit_css(&tree, &sheet);
        assert!(css.contains(&format!("--kryon-var-{id}: #0A141E")));
        assert!(css.contains(&format!("background-color: var(--kryon-var-{id})")));
    }

    #[test]
    fn grid_layout_declarations() {
        let mut tree = ComponentTree::new();
        let root = tree.create(ComponentKind::Container);
        tree.set_root(root);
        {
            let layout = tree.get_mut(root).unwrap().layout_mut();
            layout.mode = LayoutMode::Grid;
            layout.grid.push_column(GridTrack::Fr(1.0));
            layout.grid.push_column(GridTrack::Px(200.0));
            layout.grid.row_gap = 4.0;
            layout.grid.column_gap = 8.0;
        }
        let css = emit_css(&tree, &Stylesheet::new());
        assert!(css.contains("display: grid;"));
        assert!(css.contains("grid-template-columns: 1fr 200px;"));
        assert!(css.contains("gap: 4px 8px;"));
    }

    #[test]
    fn authored_rules_pass_through() {
        let tree = ComponentTree::new();
        let mut sheet = Stylesheet::new();
        sheet.rules.push(kryon_core::CssRule {
            selector: ".fancy".into(),
            declarations: vec![("color".into(), "red".into())],
        });
        sheet.media_queries.push(kryon_core::MediaQuery {
            condition: "(max-width: 600px)".into(),
            rules: vec![kryon_core::CssRule {
                selector: ".fancy".into(),
                declarations: vec![("display".into(), "none".into())],
            }],
        });
        let css = emit_css(&tree, &sheet);
        assert!(css.contains(".fancy {\n  color: red;\n}"));
        assert!(css.contains("@media (max-width: 600px) {"));
    }
}
