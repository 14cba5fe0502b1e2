//! JSON encoding of style and layout records.
//!
//! Emission is minimal-canonical: fields equal to their defaults are
//! elided, so a default record encodes as nothing at all. Decoding fills
//! defaults back in, which makes the two directions inverse on every
//! field.

use serde_json::{json, Map, Value as Json};

use kryon_core::{
    Breakpoint, BoxShadow, Color, ColorValue, ContainerContext, CrossAxisAlignment, Dimension,
    Filter, FlexDirection, FlexLayout, Gradient, GradientKind, GradientStop, GridAutoFlow,
    GridItem, GridLayout, GridTrack, ItemAlignment, LayoutMode, LayoutSpec, MainAxisAlignment,
    Overflow, PositionMode, PseudoClass, PseudoStyle, Spacing, Style, TextAlign, TextDecoration,
    Transform, Typography,
};

use crate::error::{KirError, Result};

/// Reject NaN and infinities; KIR numbers are finite-float only.
pub fn finite(value: f32, field: &'static str) -> Result<f64> {
    if value.is_finite() {
        Ok(value as f64)
    } else {
        Err(KirError::NonFinite(field))
    }
}

fn num(value: f32, field: &'static str) -> Result<Json> {
    Ok(json!(finite(value, field)?))
}

fn f32_of(value: &Json, field: &'static str) -> Result<f32> {
    value
        .as_f64()
        .map(|v| v as f32)
        .ok_or(KirError::InvalidField {
            field,
            reason: "expected number".into(),
        })
}

// ---------------------------------------------------------------------
// Dimensions and spacing
// ---------------------------------------------------------------------

pub fn dim_to_json(dim: &Dimension) -> Result<Json> {
    Ok(json!({
        "unit": dim.unit_name(),
        "value": finite(dim.value(), "dimension")?,
    }))
}

pub fn dim_from_json(value: &Json) -> Result<Dimension> {
    let unit = value
        .get("unit")
        .and_then(Json::as_str)
        .ok_or(KirError::MissingField("dimension.unit"))?;
    let v = value.get("value").and_then(Json::as_f64).unwrap_or(0.0) as f32;
    Dimension::from_unit(unit, v).ok_or(KirError::InvalidField {
        field: "dimension.unit",
        reason: format!("unknown unit '{unit}'"),
    })
}

pub fn spacing_to_json(spacing: &Spacing) -> Result<Json> {
    Ok(json!([
        finite(spacing.top, "spacing")?,
        finite(spacing.right, "spacing")?,
        finite(spacing.bottom, "spacing")?,
        finite(spacing.left, "spacing")?,
    ]))
}

pub fn spacing_from_json(value: &Json) -> Result<Spacing> {
    let parts = value.as_array().ok_or(KirError::InvalidField {
        field: "spacing",
        reason: "expected [top, right, bottom, left]".into(),
    })?;
    if parts.len() != 4 {
        return Err(KirError::InvalidField {
            field: "spacing",
            reason: format!("expected 4 entries, got {}", parts.len()),
        });
    }
    Ok(Spacing::new(
        f32_of(&parts[0], "spacing")?,
        f32_of(&parts[1], "spacing")?,
        f32_of(&parts[2], "spacing")?,
        f32_of(&parts[3], "spacing")?,
    ))
}

// ---------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------

pub fn color_value_to_json(color: &ColorValue) -> Result<Json> {
    Ok(match color {
        ColorValue::Transparent => json!("transparent"),
        ColorValue::Solid(c) => json!(c.to_hex()),
        ColorValue::Variable(id) => json!({ "var": id }),
        ColorValue::Gradient(g) => {
            let stops: Vec<Json> = g
                .stops
                .iter()
                .map(|s| {
                    Ok(json!({
                        "offset": finite(s.offset, "gradient.stop")?,
                        "color": s.color.to_hex(),
                    }))
                })
                .collect::<Result<_>>()?;
            let kind = match g.kind {
                GradientKind::Linear => "linear",
                GradientKind::Radial => "radial",
                GradientKind::Conic => "conic",
            };
            json!({
                "gradient": {
                    "kind": kind,
                    "stops": stops,
                    "angle": finite(g.angle, "gradient.angle")?,
                    "center": [
                        finite(g.center_x, "gradient.center")?,
                        finite(g.center_y, "gradient.center")?,
                    ],
                }
            })
        }
    })
}

pub fn color_value_from_json(value: &Json) -> Result<ColorValue> {
    if let Some(s) = value.as_str() {
        if s == "transparent" {
            return Ok(ColorValue::Transparent);
        }
        return Color::from_hex(s)
            .map(ColorValue::Solid)
            .ok_or(KirError::InvalidField {
                field: "color",
                reason: format!("bad hex '{s}'"),
            });
    }
    if let Some(id) = value.get("var").and_then(Json::as_u64) {
        return Ok(ColorValue::Variable(id as u16));
    }
    if let Some(g) = value.get("gradient") {
        let kind = match g.get("kind").and_then(Json::as_str) {
            Some("radial") => GradientKind::Radial,
            Some("conic") => GradientKind::Conic,
            _ => GradientKind::Linear,
        };
        let mut gradient = Gradient {
            kind,
            stops: Default::default(),
            angle: g.get("angle").and_then(Json::as_f64).unwrap_or(0.0) as f32,
            center_x: 0.5,
            center_y: 0.5,
        };
        if let Some(center) = g.get("center").and_then(Json::as_array) {
            if center.len() == 2 {
                gradient.center_x = center[0].as_f64().unwrap_or(0.5) as f32;
                gradient.center_y = center[1].as_f64().unwrap_or(0.5) as f32;
            }
        }
        for stop in g.get("stops").and_then(Json::as_array).into_iter().flatten() {
            let offset = stop.get("offset").and_then(Json::as_f64).unwrap_or(0.0) as f32;
            let color = stop
                .get("color")
                .and_then(Json::as_str)
                .and_then(Color::from_hex)
                .unwrap_or(Color::BLACK);
            gradient.push_stop(GradientStop::new(offset, color));
        }
        return Ok(ColorValue::Gradient(Box::new(gradient)));
    }
    Err(KirError::InvalidField {
        field: "color",
        reason: "expected hex string, var reference, or gradient".into(),
    })
}

// ---------------------------------------------------------------------
// Style
// ---------------------------------------------------------------------

fn typography_to_json(t: &Typography) -> Result<Option<Json>> {
    let default = Typography::default();
    if *t == default {
        return Ok(None);
    }
    let mut map = Map::new();
    if t.size != default.size {
        map.insert("size".into(), num(t.size, "typography.size")?);
    }
    if t.color != default.color {
        map.insert("color".into(), color_value_to_json(&t.color)?);
    }
    if t.bold {
        map.insert("bold".into(), json!(true));
    }
    if t.italic {
        map.insert("italic".into(), json!(true));
    }
    if let Some(family) = &t.family {
        map.insert("family".into(), json!(family));
    }
    if t.weight != default.weight {
        map.insert("weight".into(), json!(t.weight));
    }
    if t.line_height != default.line_height {
        map.insert("line_height".into(), num(t.line_height, "typography.line_height")?);
    }
    if t.letter_spacing != default.letter_spacing {
        map.insert(
            "letter_spacing".into(),
            num(t.letter_spacing, "typography.letter_spacing")?,
        );
    }
    if t.word_spacing != default.word_spacing {
        map.insert(
            "word_spacing".into(),
            num(t.word_spacing, "typography.word_spacing")?,
        );
    }
    if t.align != default.align {
        map.insert("align".into(), json!(t.align.css_name()));
    }
    if !t.decoration.is_empty() {
        map.insert("decoration".into(), json!(t.decoration.bits()));
    }
    Ok(Some(Json::Object(map)))
}

fn typography_from_json(value: &Json) -> Result<Typography> {
    let mut t = Typography::default();
    if let Some(v) = value.get("size") {
        t.size = f32_of(v, "typography.size")?;
    }
    if let Some(v) = value.get("color") {
        t.color = color_value_from_json(v)?;
    }
    t.bold = value.get("bold").and_then(Json::as_bool).unwrap_or(false);
    t.italic = value.get("italic").and_then(Json::as_bool).unwrap_or(false);
    t.family = value
        .get("family")
        .and_then(Json::as_str)
        .map(str::to_string);
    if let Some(w) = value.get("weight").and_then(Json::as_u64) {
        t.set_weight(w as u16);
    }
    if let Some(v) = value.get("line_height") {
        t.line_height = f32_of(v, "typography.line_height")?;
    }
    if let Some(v) = value.get("letter_spacing") {
        t.letter_spacing = f32_of(v, "typography.letter_spacing")?;
    }
    if let Some(v) = value.get("word_spacing") {
        t.word_spacing = f32_of(v, "typography.word_spacing")?;
    }
    if let Some(a) = value.get("align").and_then(Json::as_str) {
        t.align = TextAlign::from_name(a).unwrap_or_default();
    }
    if let Some(bits) = value.get("decoration").and_then(Json::as_u64) {
        t.decoration = TextDecoration::from_bits_truncate(bits as u8);
    }
    Ok(t)
}

fn transform_to_json(t: &Transform) -> Result<Json> {
    Ok(json!({
        "translate": [finite(t.translate_x, "transform")?, finite(t.translate_y, "transform")?],
        "scale": [finite(t.scale_x, "transform")?, finite(t.scale_y, "transform")?],
        "rotate": finite(t.rotate, "transform")?,
    }))
}

fn transform_from_json(value: &Json) -> Result<Transform> {
    let mut t = Transform::default();
    if let Some(pair) = value.get("translate").and_then(Json::as_array) {
        if pair.len() == 2 {
            t.translate_x = f32_of(&pair[0], "transform.translate")?;
            t.translate_y = f32_of(&pair[1], "transform.translate")?;
        }
    }
    if let Some(pair) = value.get("scale").and_then(Json::as_array) {
        if pair.len() == 2 {
            t.scale_x = f32_of(&pair[0], "transform.scale")?;
            t.scale_y = f32_of(&pair[1], "transform.scale")?;
        }
    }
    if let Some(v) = value.get("rotate") {
        t.rotate = f32_of(v, "transform.rotate")?;
    }
    Ok(t)
}

fn shadow_to_json(s: &BoxShadow) -> Result<Json> {
    Ok(json!({
        "offset": [finite(s.offset_x, "shadow")?, finite(s.offset_y, "shadow")?],
        "blur": finite(s.blur, "shadow.blur")?,
        "spread": finite(s.spread, "shadow.spread")?,
        "color": s.color.to_hex(),
        "inset": s.inset,
    }))
}

fn shadow_from_json(value: &Json) -> Result<BoxShadow> {
    let mut s = BoxShadow::default();
    if let Some(pair) = value.get("offset").and_then(Json::as_array) {
        if pair.len() == 2 {
            s.offset_x = f32_of(&pair[0], "shadow.offset")?;
            s.offset_y = f32_of(&pair[1], "shadow.offset")?;
        }
    }
    if let Some(v) = value.get("blur") {
        s.blur = f32_of(v, "shadow.blur")?;
    }
    if let Some(v) = value.get("spread") {
        s.spread = f32_of(v, "shadow.spread")?;
    }
    s.color = value
        .get("color")
        .and_then(Json::as_str)
        .and_then(Color::from_hex)
        .unwrap_or_default();
    s.inset = value.get("inset").and_then(Json::as_bool).unwrap_or(false);
    Ok(s)
}

fn pseudo_to_json(p: &PseudoStyle) -> Result<Json> {
    let mut map = Map::new();
    map.insert("class".into(), json!(p.class.css_name()));
    if let Some(bg) = &p.background {
        map.insert("background".into(), color_value_to_json(bg)?);
    }
    if let Some(bc) = &p.border_color {
        map.insert("border_color".into(), color_value_to_json(bc)?);
    }
    if let Some(tc) = &p.text_color {
        map.insert("text_color".into(), color_value_to_json(tc)?);
    }
    if let Some(o) = p.opacity {
        map.insert("opacity".into(), num(o, "pseudo.opacity")?);
    }
    if let Some(t) = &p.transform {
        map.insert("transform".into(), transform_to_json(t)?);
    }
    Ok(Json::Object(map))
}

fn pseudo_from_json(value: &Json) -> Result<PseudoStyle> {
    let class = value
        .get("class")
        .and_then(Json::as_str)
        .and_then(PseudoClass::from_name)
        .ok_or(KirError::MissingField("pseudo.class"))?;
    let mut p = PseudoStyle::new(class);
    if let Some(bg) = value.get("background") {
        p.background = Some(color_value_from_json(bg)?);
    }
    if let Some(bc) = value.get("border_color") {
        p.border_color = Some(color_value_from_json(bc)?);
    }
    if let Some(tc) = value.get("text_color") {
        p.text_color = Some(color_value_from_json(tc)?);
    }
    if let Some(o) = value.get("opacity") {
        p.opacity = Some(f32_of(o, "pseudo.opacity")?);
    }
    if let Some(t) = value.get("transform") {
        p.transform = Some(transform_from_json(t)?);
    }
    Ok(p)
}

fn breakpoint_to_json(bp: &Breakpoint) -> Result<Json> {
    let mut map = Map::new();
    if let Some(v) = bp.min_width {
        map.insert("min_width".into(), num(v, "breakpoint")?);
    }
    if let Some(v) = bp.max_width {
        map.insert("max_width".into(), num(v, "breakpoint")?);
    }
    if let Some(v) = bp.min_height {
        map.insert("min_height".into(), num(v, "breakpoint")?);
    }
    if let Some(v) = bp.max_height {
        map.insert("max_height".into(), num(v, "breakpoint")?);
    }
    if !bp.declarations.is_empty() {
        let decls: Vec<Json> = bp
            .declarations
            .iter()
            .map(|(k, v)| json!([k, v]))
            .collect();
        map.insert("declarations".into(), Json::Array(decls));
    }
    Ok(Json::Object(map))
}

fn breakpoint_from_json(value: &Json) -> Result<Breakpoint> {
    let mut bp = Breakpoint::default();
    for (field, slot) in [
        ("min_width", &mut bp.min_width),
        ("max_width", &mut bp.max_width),
        ("min_height", &mut bp.min_height),
        ("max_height", &mut bp.max_height),
    ] {
        if let Some(v) = value.get(field).and_then(Json::as_f64) {
            *slot = Some(v as f32);
        }
    }
    for decl in value
        .get("declarations")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        if let Some(pair) = decl.as_array() {
            if pair.len() == 2 {
                if let (Some(k), Some(v)) = (pair[0].as_str(), pair[1].as_str()) {
                    bp.declarations.push((k.to_string(), v.to_string()));
                }
            }
        }
    }
    Ok(bp)
}

/// Encode a style record, eliding default fields. A fully default style
/// encodes to `None`.
pub fn style_to_json(style: &Style) -> Result<Option<Json>> {
    let default = Style::default();
    let mut map = Map::new();

    if style.width != default.width {
        map.insert("width".into(), dim_to_json(&style.width)?);
    }
    if style.height != default.height {
        map.insert("height".into(), dim_to_json(&style.height)?);
    }
    if style.background != default.background {
        map.insert("background".into(), color_value_to_json(&style.background)?);
    }
    if style.border_color != default.border_color {
        map.insert(
            "border_color".into(),
            color_value_to_json(&style.border_color)?,
        );
    }
    if style.border_width != default.border_width {
        map.insert("border_width".into(), num(style.border_width, "border_width")?);
    }
    if style.border_radius != default.border_radius {
        map.insert(
            "border_radius".into(),
            num(style.border_radius, "border_radius")?,
        );
    }
    if style.margin != default.margin {
        map.insert("margin".into(), spacing_to_json(&style.margin)?);
    }
    if style.padding != default.padding {
        map.insert("padding".into(), spacing_to_json(&style.padding)?);
    }
    if let Some(t) = typography_to_json(&style.typography)? {
        map.insert("typography".into(), t);
    }
    if let Some(t) = &style.transform {
        map.insert("transform".into(), transform_to_json(t)?);
    }
    if style.opacity != default.opacity {
        map.insert("opacity".into(), num(style.opacity, "opacity")?);
    }
    if !style.visible {
        map.insert("visible".into(), json!(false));
    }
    if style.z_index != default.z_index {
        map.insert("z_index".into(), json!(style.z_index));
    }
    if style.position != default.position {
        map.insert("position".into(), json!(style.position.css_name()));
    }
    if style.absolute_x != default.absolute_x {
        map.insert("absolute_x".into(), num(style.absolute_x, "absolute_x")?);
    }
    if style.absolute_y != default.absolute_y {
        map.insert("absolute_y".into(), num(style.absolute_y, "absolute_y")?);
    }
    if style.overflow_x != default.overflow_x {
        map.insert("overflow_x".into(), json!(style.overflow_x.css_name()));
    }
    if style.overflow_y != default.overflow_y {
        map.insert("overflow_y".into(), json!(style.overflow_y.css_name()));
    }
    if let Some(shadow) = &style.shadow {
        map.insert("shadow".into(), shadow_to_json(shadow)?);
    }
    if !style.filters.is_empty() {
        let filters: Vec<Json> = style
            .filters
            .iter()
            .map(|f| Ok(json!({ "name": f.css_name(), "value": finite(f.value(), "filter")? })))
            .collect::<Result<_>>()?;
        map.insert("filters".into(), Json::Array(filters));
    }
    if !style.pseudo.is_empty() {
        let pseudo: Vec<Json> = style.pseudo.iter().map(pseudo_to_json).collect::<Result<_>>()?;
        map.insert("pseudo".into(), Json::Array(pseudo));
    }
    if !style.breakpoints.is_empty() {
        let bps: Vec<Json> = style
            .breakpoints
            .iter()
            .map(breakpoint_to_json)
            .collect::<Result<_>>()?;
        map.insert("breakpoints".into(), Json::Array(bps));
    }
    if let Some(container) = &style.container {
        let mut c = Map::new();
        if let Some(name) = &container.name {
            c.insert("name".into(), json!(name));
        }
        c.insert("inline_size".into(), json!(container.inline_size));
        c.insert("block_size".into(), json!(container.block_size));
        map.insert("container".into(), Json::Object(c));
    }

    if map.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Json::Object(map)))
    }
}

pub fn style_from_json(value: &Json) -> Result<Style> {
    let mut style = Style::default();
    if let Some(v) = value.get("width") {
        style.width = dim_from_json(v)?;
    }
    if let Some(v) = value.get("height") {
        style.height = dim_from_json(v)?;
    }
    if let Some(v) = value.get("background") {
        style.background = color_value_from_json(v)?;
    }
    if let Some(v) = value.get("border_color") {
        style.border_color = color_value_from_json(v)?;
    }
    if let Some(v) = value.get("border_width") {
        style.border_width = f32_of(v, "border_width")?;
    }
    if let Some(v) = value.get("border_radius") {
        style.border_radius = f32_of(v, "border_radius")?;
    }
    if let Some(v) = value.get("margin") {
        style.margin = spacing_from_json(v)?;
    }
    if let Some(v) = value.get("padding") {
        style.padding = spacing_from_json(v)?;
    }
    if let Some(v) = value.get("typography") {
        style.typography = typography_from_json(v)?;
    }
    if let Some(v) = value.get("transform") {
        style.transform = Some(transform_from_json(v)?);
    }
    if let Some(v) = value.get("opacity") {
        style.opacity = f32_of(v, "opacity")?;
    }
    if let Some(v) = value.get("visible").and_then(Json::as_bool) {
        style.visible = v;
    }
    if let Some(v) = value.get("z_index").and_then(Json::as_i64) {
        style.z_index = v as i32;
    }
    if let Some(v) = value.get("position").and_then(Json::as_str) {
        style.position = PositionMode::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("absolute_x") {
        style.absolute_x = f32_of(v, "absolute_x")?;
    }
    if let Some(v) = value.get("absolute_y") {
        style.absolute_y = f32_of(v, "absolute_y")?;
    }
    if let Some(v) = value.get("overflow_x").and_then(Json::as_str) {
        style.overflow_x = Overflow::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("overflow_y").and_then(Json::as_str) {
        style.overflow_y = Overflow::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("shadow") {
        style.shadow = Some(shadow_from_json(v)?);
    }
    for f in value.get("filters").and_then(Json::as_array).into_iter().flatten() {
        let name = f.get("name").and_then(Json::as_str).unwrap_or("");
        let v = f.get("value").and_then(Json::as_f64).unwrap_or(0.0) as f32;
        match Filter::from_name(name, v) {
            Some(filter) => {
                style.push_filter(filter);
            }
            None => tracing::warn!(name, "unknown filter dropped during deserialization"),
        }
    }
    for p in value.get("pseudo").and_then(Json::as_array).into_iter().flatten() {
        style.push_pseudo(pseudo_from_json(p)?);
    }
    for bp in value
        .get("breakpoints")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        style.push_breakpoint(breakpoint_from_json(bp)?);
    }
    if let Some(c) = value.get("container") {
        style.container = Some(ContainerContext {
            name: c.get("name").and_then(Json::as_str).map(str::to_string),
            inline_size: c.get("inline_size").and_then(Json::as_bool).unwrap_or(false),
            block_size: c.get("block_size").and_then(Json::as_bool).unwrap_or(false),
        });
    }
    Ok(style)
}

// ---------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------

fn flex_to_json(flex: &FlexLayout) -> Result<Option<Json>> {
    let default = FlexLayout::default();
    if *flex == default {
        return Ok(None);
    }
    let mut map = Map::new();
    if flex.direction != default.direction {
        map.insert("direction".into(), json!(flex.direction.name()));
    }
    if flex.wrap {
        map.insert("wrap".into(), json!(true));
    }
    if flex.gap != default.gap {
        map.insert("gap".into(), num(flex.gap, "flex.gap")?);
    }
    if flex.main_axis != default.main_axis {
        map.insert("main_axis".into(), json!(flex.main_axis.name()));
    }
    if flex.cross_axis != default.cross_axis {
        map.insert("cross_axis".into(), json!(flex.cross_axis.name()));
    }
    if flex.justify_content != default.justify_content {
        map.insert("justify_content".into(), json!(flex.justify_content.name()));
    }
    if flex.grow != default.grow {
        map.insert("grow".into(), num(flex.grow, "flex.grow")?);
    }
    if flex.shrink != default.shrink {
        map.insert("shrink".into(), num(flex.shrink, "flex.shrink")?);
    }
    Ok(Some(Json::Object(map)))
}

fn flex_from_json(value: &Json) -> Result<FlexLayout> {
    let mut flex = FlexLayout::default();
    if let Some(d) = value.get("direction").and_then(Json::as_str) {
        flex.direction = FlexDirection::from_name(d).unwrap_or_default();
    }
    flex.wrap = value.get("wrap").and_then(Json::as_bool).unwrap_or(false);
    if let Some(v) = value.get("gap") {
        flex.gap = f32_of(v, "flex.gap")?;
    }
    if let Some(v) = value.get("main_axis").and_then(Json::as_str) {
        flex.main_axis = MainAxisAlignment::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("cross_axis").and_then(Json::as_str) {
        flex.cross_axis = CrossAxisAlignment::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("justify_content").and_then(Json::as_str) {
        flex.justify_content = MainAxisAlignment::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("grow") {
        flex.grow = f32_of(v, "flex.grow")?;
    }
    if let Some(v) = value.get("shrink") {
        flex.shrink = f32_of(v, "flex.shrink")?;
    }
    Ok(flex)
}

fn track_to_json(track: &GridTrack) -> Result<Json> {
    Ok(json!({
        "unit": track.unit_name(),
        "value": finite(track.value(), "grid.track")?,
    }))
}

fn track_from_json(value: &Json) -> Result<GridTrack> {
    let unit = value
        .get("unit")
        .and_then(Json::as_str)
        .ok_or(KirError::MissingField("grid.track.unit"))?;
    let v = value.get("value").and_then(Json::as_f64).unwrap_or(0.0) as f32;
    GridTrack::from_unit(unit, v).ok_or(KirError::InvalidField {
        field: "grid.track.unit",
        reason: format!("unknown unit '{unit}'"),
    })
}

fn grid_to_json(grid: &GridLayout) -> Result<Option<Json>> {
    let default = GridLayout::default();
    if *grid == default {
        return Ok(None);
    }
    let mut map = Map::new();
    if !grid.rows.is_empty() {
        let rows: Vec<Json> = grid.rows.iter().map(track_to_json).collect::<Result<_>>()?;
        map.insert("rows".into(), Json::Array(rows));
    }
    if !grid.columns.is_empty() {
        let cols: Vec<Json> = grid
            .columns
            .iter()
            .map(track_to_json)
            .collect::<Result<_>>()?;
        map.insert("columns".into(), Json::Array(cols));
    }
    if grid.row_gap != default.row_gap {
        map.insert("row_gap".into(), num(grid.row_gap, "grid.row_gap")?);
    }
    if grid.column_gap != default.column_gap {
        map.insert("column_gap".into(), num(grid.column_gap, "grid.column_gap")?);
    }
    if grid.justify_items != default.justify_items {
        map.insert("justify_items".into(), json!(grid.justify_items.name()));
    }
    if grid.align_items != default.align_items {
        map.insert("align_items".into(), json!(grid.align_items.name()));
    }
    if grid.justify_content != default.justify_content {
        map.insert("justify_content".into(), json!(grid.justify_content.name()));
    }
    if grid.align_content != default.align_content {
        map.insert("align_content".into(), json!(grid.align_content.name()));
    }
    if grid.auto_flow != default.auto_flow {
        map.insert("auto_flow".into(), json!(grid.auto_flow.name()));
    }
    if grid.auto_flow_dense {
        map.insert("dense".into(), json!(true));
    }
    Ok(Some(Json::Object(map)))
}

fn grid_from_json(value: &Json) -> Result<GridLayout> {
    let mut grid = GridLayout::default();
    for row in value.get("rows").and_then(Json::as_array).into_iter().flatten() {
        grid.push_row(track_from_json(row)?);
    }
    for col in value
        .get("columns")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        grid.push_column(track_from_json(col)?);
    }
    if let Some(v) = value.get("row_gap") {
        grid.row_gap = f32_of(v, "grid.row_gap")?;
    }
    if let Some(v) = value.get("column_gap") {
        grid.column_gap = f32_of(v, "grid.column_gap")?;
    }
    if let Some(v) = value.get("justify_items").and_then(Json::as_str) {
        grid.justify_items = ItemAlignment::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("align_items").and_then(Json::as_str) {
        grid.align_items = ItemAlignment::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("justify_content").and_then(Json::as_str) {
        grid.justify_content = MainAxisAlignment::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("align_content").and_then(Json::as_str) {
        grid.align_content = MainAxisAlignment::from_name(v).unwrap_or_default();
    }
    if let Some(v) = value.get("auto_flow").and_then(Json::as_str) {
        grid.auto_flow = GridAutoFlow::from_name(v).unwrap_or_default();
    }
    grid.auto_flow_dense = value.get("dense").and_then(Json::as_bool).unwrap_or(false);
    Ok(grid)
}

/// Encode a layout spec, eliding default fields; a default spec encodes
/// to `None`.
pub fn layout_to_json(layout: &LayoutSpec) -> Result<Option<Json>> {
    let default = LayoutSpec::default();
    let mut map = Map::new();
    if layout.mode != default.mode {
        map.insert("mode".into(), json!(layout.mode.name()));
    }
    if layout.min_width != default.min_width {
        map.insert("min_width".into(), dim_to_json(&layout.min_width)?);
    }
    if layout.max_width != default.max_width {
        map.insert("max_width".into(), dim_to_json(&layout.max_width)?);
    }
    if layout.min_height != default.min_height {
        map.insert("min_height".into(), dim_to_json(&layout.min_height)?);
    }
    if layout.max_height != default.max_height {
        map.insert("max_height".into(), dim_to_json(&layout.max_height)?);
    }
    if layout.margin != default.margin {
        map.insert("margin".into(), spacing_to_json(&layout.margin)?);
    }
    if layout.padding != default.padding {
        map.insert("padding".into(), spacing_to_json(&layout.padding)?);
    }
    if layout.aspect_ratio != default.aspect_ratio {
        map.insert("aspect_ratio".into(), num(layout.aspect_ratio, "aspect_ratio")?);
    }
    if let Some(flex) = flex_to_json(&layout.flex)? {
        map.insert("flex".into(), flex);
    }
    if let Some(grid) = grid_to_json(&layout.grid)? {
        map.insert("grid".into(), grid);
    }
    if layout.grid_item != default.grid_item {
        map.insert(
            "grid_item".into(),
            json!({
                "row_start": layout.grid_item.row_start,
                "row_end": layout.grid_item.row_end,
                "column_start": layout.grid_item.column_start,
                "column_end": layout.grid_item.column_end,
            }),
        );
    }
    if let Some(j) = layout.justify_self {
        map.insert("justify_self".into(), json!(j.name()));
    }
    if let Some(a) = layout.align_self {
        map.insert("align_self".into(), json!(a.name()));
    }
    if map.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Json::Object(map)))
    }
}

pub fn layout_from_json(value: &Json) -> Result<LayoutSpec> {
    let mut layout = LayoutSpec::default();
    if let Some(m) = value.get("mode").and_then(Json::as_str) {
        layout.mode = LayoutMode::from_name(m).unwrap_or_default();
    }
    if let Some(v) = value.get("min_width") {
        layout.min_width = dim_from_json(v)?;
    }
    if let Some(v) = value.get("max_width") {
        layout.max_width = dim_from_json(v)?;
    }
    if let Some(v) = value.get("min_height") {
        layout.min_height = dim_from_json(v)?;
    }
    if let Some(v) = value.get("max_height") {
        layout.max_height = dim_from_json(v)?;
    }
    if let Some(v) = value.get("margin") {
        layout.margin = spacing_from_json(v)?;
    }
    if let Some(v) = value.get("padding") {
        layout.padding = spacing_from_json(v)?;
    }
    if let Some(v) = value.get("aspect_ratio") {
        layout.aspect_ratio = f32_of(v, "aspect_ratio")?;
    }
    if let Some(v) = value.get("flex") {
        layout.flex = flex_from_json(v)?;
    }
    if let Some(v) = value.get("grid") {
        layout.grid = grid_from_json(v)?;
    }
    if let Some(v) = value.get("grid_item") {
        let field = |name: &str| v.get(name).and_then(Json::as_i64).unwrap_or(-1) as i32;
        layout.grid_item = GridItem {
            row_start: field("row_start"),
            row_end: field("row_end"),
            column_start: field("column_start"),
            column_end: field("column_end"),
        };
    }
    if let Some(v) = value.get("justify_self").and_then(Json::as_str) {
        layout.justify_self = ItemAlignment::from_name(v);
    }
    if let Some(v) = value.get("align_self").and_then(Json::as_str) {
        layout.align_self = ItemAlignment::from_name(v);
    }
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::Dimension;

    #[test]
    fn default_style_elides_to_none() {
        assert!(style_to_json(&Style::default()).unwrap().is_none());
        assert!(layout_to_json(&LayoutSpec::default()).unwrap().is_none());
    }

    #[test]
    fn style_round_trip() {
        let mut style = Style::default();
        style.width = Dimension::Px(320.0);
        style.height = Dimension::Percent(50.0);
        style.background = ColorValue::Solid(Color::rgb(30, 40, 50));
        style.border_width = 2.0;
        style.margin = Spacing::all(8.0);
        style.typography.size = 18.0;
        style.typography.bold = true;
        style.typography.align = TextAlign::Center;
        style.opacity = 0.75;
        style.position = PositionMode::Absolute;
        style.absolute_x = 12.0;
        style.push_filter(Filter::Blur(4.0));
        let mut hover = PseudoStyle::new(PseudoClass::Hover);
        hover.opacity = Some(0.5);
        style.push_pseudo(hover);

        let json = style_to_json(&style).unwrap().unwrap();
        let back = style_from_json(&json).unwrap();
        assert_eq!(back, style);
    }

    #[test]
    fn layout_round_trip() {
        let mut layout = LayoutSpec::default();
        layout.mode = LayoutMode::Grid;
        layout.padding = Spacing::all(4.0);
        layout.aspect_ratio = 1.5;
        layout.flex.direction = FlexDirection::Row;
        layout.flex.gap = 10.0;
        layout.flex.grow = 1.0;
        layout.grid.push_column(GridTrack::Fr(1.0));
        layout.grid.push_column(GridTrack::Px(100.0));
        layout.grid.push_row(GridTrack::Auto);
        layout.grid.column_gap = 6.0;
        layout.grid.auto_flow = GridAutoFlow::Column;
        layout.grid_item.row_start = 1;
        layout.grid_item.column_start = 0;
        layout.justify_self = Some(ItemAlignment::Center);

        let json = layout_to_json(&layout).unwrap().unwrap();
        let back = layout_from_json(&json).unwrap();
        assert_eq!(back, layout);
    }

    #[test]
    fn gradient_round_trip() {
        let mut gradient = Gradient::linear(45.0, Color::RED, Color::BLUE);
        gradient.push_stop(GradientStop::new(0.5, Color::GREEN));
        let color = ColorValue::Gradient(Box::new(gradient));
        let json = color_value_to_json(&color).unwrap();
        assert_eq!(color_value_from_json(&json).unwrap(), color);
    }

    #[test]
    fn variable_reference_round_trip() {
        let color = ColorValue::Variable(7);
        let json = color_value_to_json(&color).unwrap();
        assert_eq!(color_value_from_json(&json).unwrap(), color);
    }

    #[test]
    fn non_finite_rejected() {
        let mut style = Style::default();
        style.opacity = f32::NAN;
        assert!(matches!(
            style_to_json(&style),
            Err(KirError::NonFinite(_))
        ));
    }
}
