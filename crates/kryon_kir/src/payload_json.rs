//! JSON encoding of variant payloads and event bindings.

use serde_json::{json, Map, Value as Json};

use kryon_core::{
    ComponentKind, CustomData, EventBinding, EventKind, ForEachData, HandlerLanguage,
    InlineHandler, ListKind, TemplateBinding, TextAlign,
};

use crate::error::{KirError, Result};

pub fn custom_data_to_json(data: &CustomData) -> Json {
    match data {
        CustomData::Heading { level, anchor } => {
            let mut map = Map::new();
            map.insert("level".into(), json!(level));
            if let Some(anchor) = anchor {
                map.insert("anchor".into(), json!(anchor));
            }
            Json::Object(map)
        }
        CustomData::CodeBlock { language, source } => {
            let mut map = Map::new();
            if let Some(language) = language {
                map.insert("language".into(), json!(language));
            }
            map.insert("source".into(), json!(source));
            Json::Object(map)
        }
        CustomData::Link { url, title } => {
            let mut map = Map::new();
            map.insert("url".into(), json!(url));
            if let Some(title) = title {
                map.insert("title".into(), json!(title));
            }
            Json::Object(map)
        }
        CustomData::TableCell {
            colspan,
            rowspan,
            align,
        } => {
            let mut map = Map::new();
            if *colspan != 1 {
                map.insert("colspan".into(), json!(colspan));
            }
            if *rowspan != 1 {
                map.insert("rowspan".into(), json!(rowspan));
            }
            if let Some(align) = align {
                map.insert("align".into(), json!(align.css_name()));
            }
            Json::Object(map)
        }
        CustomData::Dropdown { options, selected } => {
            let mut map = Map::new();
            map.insert("options".into(), json!(options));
            if let Some(selected) = selected {
                map.insert("selected".into(), json!(selected));
            }
            Json::Object(map)
        }
        CustomData::List { kind, start } => {
            let mut map = Map::new();
            map.insert("type".into(), json!(kind.name()));
            if let Some(start) = start {
                map.insert("start".into(), json!(start));
            }
            Json::Object(map)
        }
        CustomData::ListItem { value, checked } => {
            let mut map = Map::new();
            if let Some(value) = value {
                map.insert("value".into(), json!(value));
            }
            if let Some(checked) = checked {
                map.insert("checked".into(), json!(checked));
            }
            Json::Object(map)
        }
        CustomData::Image { src, alt } => {
            let mut map = Map::new();
            map.insert("src".into(), json!(src));
            if let Some(alt) = alt {
                map.insert("alt".into(), json!(alt));
            }
            Json::Object(map)
        }
        CustomData::ForEach(data) => {
            let mut map = Map::new();
            map.insert("item_name".into(), json!(data.item_name));
            if let Some(index_name) = &data.index_name {
                map.insert("index_name".into(), json!(index_name));
            }
            if let Some(source) = &data.each_source {
                map.insert("each_source".into(), json!(source));
            }
            if !data.bindings.is_empty() {
                let bindings: Vec<Json> = data
                    .bindings
                    .iter()
                    .map(|b| json!({ "target": b.target, "expr": b.expr }))
                    .collect();
                map.insert("bindings".into(), Json::Array(bindings));
            }
            Json::Object(map)
        }
        CustomData::Json(value) => value.clone(),
    }
}

/// Decode a payload for a known component kind. Shapes that do not match
/// the variant are preserved verbatim.
pub fn custom_data_from_json(kind: ComponentKind, value: &Json) -> CustomData {
    let parsed = match kind {
        ComponentKind::Heading => value.get("level").and_then(Json::as_u64).map(|level| {
            CustomData::Heading {
                level: level as u8,
                anchor: value.get("anchor").and_then(Json::as_str).map(str::to_string),
            }
        }),
        ComponentKind::CodeBlock => {
            value
                .get("source")
                .and_then(Json::as_str)
                .map(|source| CustomData::CodeBlock {
                    language: value
                        .get("language")
                        .and_then(Json::as_str)
                        .map(str::to_string),
                    source: source.to_string(),
                })
        }
        ComponentKind::Link => value.get("url").and_then(Json::as_str).map(|url| {
            CustomData::Link {
                url: url.to_string(),
                title: value.get("title").and_then(Json::as_str).map(str::to_string),
            }
        }),
        ComponentKind::TableCell | ComponentKind::TableHeaderCell => {
            if value.is_object() {
                Some(CustomData::TableCell {
                    colspan: value.get("colspan").and_then(Json::as_u64).unwrap_or(1) as u32,
                    rowspan: value.get("rowspan").and_then(Json::as_u64).unwrap_or(1) as u32,
                    align: value
                        .get("align")
                        .and_then(Json::as_str)
                        .and_then(TextAlign::from_name),
                })
            } else {
                None
            }
        }
        ComponentKind::Dropdown => value.get("options").and_then(Json::as_array).map(|options| {
            CustomData::Dropdown {
                options: options
                    .iter()
                    .filter_map(Json::as_str)
                    .map(str::to_string)
                    .collect(),
                selected: value
                    .get("selected")
                    .and_then(Json::as_u64)
                    .map(|v| v as usize),
            }
        }),
        ComponentKind::List => value
            .get("type")
            .and_then(Json::as_str)
            .and_then(ListKind::from_name)
            .map(|list_kind| CustomData::List {
                kind: list_kind,
                start: value.get("start").and_then(Json::as_u64).map(|v| v as u32),
            }),
        ComponentKind::ListItem => {
            if value.is_object() {
                Some(CustomData::ListItem {
                    value: value.get("value").and_then(Json::as_u64).map(|v| v as u32),
                    checked: value.get("checked").and_then(Json::as_bool),
                })
            } else {
                None
            }
        }
        ComponentKind::Image => value.get("src").and_then(Json::as_str).map(|src| {
            CustomData::Image {
                src: src.to_string(),
                alt: value.get("alt").and_then(Json::as_str).map(str::to_string),
            }
        }),
        ComponentKind::ForEach => {
            value
                .get("item_name")
                .and_then(Json::as_str)
                .map(|item_name| {
                    let bindings = value
                        .get("bindings")
                        .and_then(Json::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(|b| {
                            Some(TemplateBinding {
                                target: b.get("target")?.as_str()?.to_string(),
                                expr: b.get("expr")?.as_str()?.to_string(),
                            })
                        })
                        .collect();
                    CustomData::ForEach(ForEachData {
                        item_name: item_name.to_string(),
                        index_name: value
                            .get("index_name")
                            .and_then(Json::as_str)
                            .map(str::to_string),
                        each_source: value
                            .get("each_source")
                            .and_then(Json::as_str)
                            .map(str::to_string),
                        bindings,
                    })
                })
        }
        _ => None,
    };
    parsed.unwrap_or_else(|| CustomData::Json(value.clone()))
}

pub fn events_to_json(events: &[EventBinding]) -> Json {
    let list: Vec<Json> = events
        .iter()
        .map(|e| {
            let mut map = Map::new();
            map.insert("type".into(), json!(e.kind.name()));
            map.insert("logic".into(), json!(e.logic));
            if let Some(inline) = &e.inline {
                let mut h = Map::new();
                h.insert("language".into(), json!(inline.language.name()));
                h.insert("code".into(), json!(inline.code));
                if !inline.captures.is_empty() {
                    h.insert("captures".into(), json!(inline.captures));
                }
                map.insert("handler".into(), Json::Object(h));
            }
            Json::Object(map)
        })
        .collect();
    Json::Array(list)
}

pub fn events_from_json(value: &Json) -> Result<Vec<EventBinding>> {
    let list = value.as_array().ok_or(KirError::InvalidField {
        field: "events",
        reason: "expected array".into(),
    })?;
    let mut out = Vec::with_capacity(list.len());
    for entry in list {
        let kind_name = entry
            .get("type")
            .and_then(Json::as_str)
            .ok_or(KirError::MissingField("event.type"))?;
        let Some(kind) = EventKind::from_name(kind_name) else {
            tracing::warn!(kind = kind_name, "unknown event type skipped");
            continue;
        };
        let logic = entry
            .get("logic")
            .and_then(Json::as_str)
            .unwrap_or_default()
            .to_string();
        let inline = entry.get("handler").map(|h| InlineHandler {
            language: h
                .get("language")
                .and_then(Json::as_str)
                .and_then(HandlerLanguage::from_name)
                .unwrap_or(HandlerLanguage::Native),
            code: h
                .get("code")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            captures: h
                .get("captures")
                .and_then(Json::as_array)
                .into_iter()
                .flatten()
                .filter_map(Json::as_str)
                .map(str::to_string)
                .collect(),
        });
        out.push(EventBinding { kind, logic, inline });
    }
    Ok(out)
}
