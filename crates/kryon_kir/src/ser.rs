//! KIR emission: component tree plus manifest, stylesheet, and logic
//! block into the canonical JSON wrapper.

use serde_json::{json, Map, Value as Json};

use kryon_core::{ComponentTree, NodeKey};

use crate::document::KirDocument;
use crate::error::{KirError, Result};
use crate::logic_json::{logic_to_json, var_value_to_json};
use crate::payload_json::{custom_data_to_json, events_to_json};
use crate::style_json::{finite, layout_to_json, style_to_json};

/// Encode one component subtree.
pub fn component_to_json(tree: &ComponentTree, key: NodeKey) -> Result<Json> {
    let node = tree.get(key).ok_or(KirError::InvalidField {
        field: "component",
        reason: "dangling node key".into(),
    })?;

    let mut map = Map::new();
    map.insert("type".into(), json!(node.kind.canonical_name()));
    map.insert("id".into(), json!(node.id.0));
    if let Some(tag) = &node.tag {
        map.insert("tag".into(), json!(tag));
    }
    if let Some(text) = &node.text_content {
        map.insert("text_content".into(), json!(text));
    }
    if let Some(data) = &node.custom_data {
        map.insert("custom_data".into(), custom_data_to_json(data));
    }
    if let Some(style) = node.style.as_deref() {
        if let Some(encoded) = style_to_json(style)? {
            map.insert("style".into(), encoded);
        }
    }
    if let Some(layout) = node.layout.as_deref() {
        if let Some(encoded) = layout_to_json(layout)? {
            map.insert("layout".into(), encoded);
        }
    }
    if !node.events.is_empty() {
        map.insert("events".into(), events_to_json(&node.events));
    }
    if !node.children.is_empty() {
        let children: Vec<Json> = node
            .children
            .iter()
            .map(|&child| component_to_json(tree, child))
            .collect::<Result<_>>()?;
        map.insert("children".into(), Json::Array(children));
    }
    Ok(Json::Object(map))
}

fn manifest_to_json(doc: &KirDocument) -> Result<Json> {
    let manifest = &doc.manifest;
    let variables: Vec<Json> = manifest
        .variables
        .iter()
        .map(|v| {
            let mut map = Map::new();
            map.insert("id".into(), json!(v.id));
            map.insert("name".into(), json!(v.name));
            map.insert("type".into(), json!(v.ty.name()));
            map.insert("value".into(), var_value_to_json(&v.value)?);
            map.insert("version".into(), json!(v.version));
            if let Some(ts) = &v.type_string {
                map.insert("type_string".into(), json!(ts));
            }
            if let Some(ivj) = &v.initial_value_json {
                map.insert("initial_value_json".into(), json!(ivj));
            }
            if let Some(scope) = &v.scope {
                map.insert("scope".into(), json!(scope));
            }
            Ok(Json::Object(map))
        })
        .collect::<Result<_>>()?;

    let bindings: Vec<Json> = manifest
        .bindings
        .iter()
        .map(|b| {
            json!({
                "component_id": b.component_id.0,
                "var_id": b.var_id,
                "type": b.binding_type.name(),
                "expression": b.expression,
            })
        })
        .collect();

    let conditionals: Vec<Json> = manifest
        .conditionals
        .iter()
        .map(|c| {
            json!({
                "component_id": c.component_id.0,
                "condition": c.condition,
                "dependent_var_ids": c.dependent_var_ids,
                "last_eval_result": c.last_eval_result,
                "suspended": c.suspended,
                "then_children": c.then_children.iter().map(|id| id.0).collect::<Vec<_>>(),
                "else_children": c.else_children.iter().map(|id| id.0).collect::<Vec<_>>(),
            })
        })
        .collect();

    let for_loops: Vec<Json> = manifest
        .for_loops
        .iter()
        .map(|fl| {
            let mut map = Map::new();
            map.insert("parent_component_id".into(), json!(fl.parent_component_id.0));
            map.insert("collection_expr".into(), json!(fl.collection_expr));
            map.insert("collection_var_id".into(), json!(fl.collection_var_id));
            map.insert(
                "child_component_ids".into(),
                json!(fl.child_component_ids.iter().map(|id| id.0).collect::<Vec<_>>()),
            );
            if let Some(template) = fl.item_template {
                map.insert(
                    "template".into(),
                    component_to_json(&doc.context.tree, template)?,
                );
            }
            Ok(Json::Object(map))
        })
        .collect::<Result<_>>()?;

    Ok(json!({
        "variables": variables,
        "bindings": bindings,
        "conditionals": conditionals,
        "for_loops": for_loops,
        "sources": sources_to_json(doc),
    }))
}

fn sources_to_json(doc: &KirDocument) -> Json {
    let list: Vec<Json> = doc
        .manifest
        .sources
        .iter()
        .map(|(lang, code)| json!({ "lang": lang, "code": code }))
        .collect();
    Json::Array(list)
}

fn component_definitions_to_json(doc: &KirDocument) -> Result<Json> {
    let defs: Vec<Json> = doc
        .manifest
        .component_defs
        .iter()
        .map(|def| {
            let props: Vec<Json> = def
                .props
                .iter()
                .map(|p| {
                    let mut map = Map::new();
                    map.insert("name".into(), json!(p.name));
                    map.insert("type".into(), json!(p.ty));
                    if let Some(default) = &p.default {
                        map.insert("default".into(), json!(default));
                    }
                    Json::Object(map)
                })
                .collect();
            let state_vars: Vec<Json> = def
                .state_vars
                .iter()
                .map(|s| {
                    let mut map = Map::new();
                    map.insert("name".into(), json!(s.name));
                    map.insert("type".into(), json!(s.ty));
                    if let Some(initial) = &s.initial_expr {
                        map.insert("initial".into(), json!(initial));
                    }
                    Json::Object(map)
                })
                .collect();
            let mut map = Map::new();
            map.insert("name".into(), json!(def.name));
            map.insert("props".into(), Json::Array(props));
            map.insert("state_vars".into(), Json::Array(state_vars));
            if let Some(template) = def.template {
                map.insert(
                    "template".into(),
                    component_to_json(&doc.context.tree, template)?,
                );
            }
            Ok(Json::Object(map))
        })
        .collect::<Result<_>>()?;
    Ok(Json::Array(defs))
}

fn stylesheet_to_json(doc: &KirDocument) -> Json {
    let sheet = &doc.context.stylesheet;
    let rule = |r: &kryon_core::CssRule| {
        json!({
            "selector": r.selector,
            "declarations": r.declarations.iter().map(|(p, v)| json!([p, v])).collect::<Vec<_>>(),
        })
    };
    json!({
        "rules": sheet.rules.iter().map(rule).collect::<Vec<_>>(),
        "variables": sheet
            .variables
            .iter()
            .map(|v| json!({ "id": v.id, "name": v.name, "color": v.color.to_hex() }))
            .collect::<Vec<_>>(),
        "media_queries": sheet
            .media_queries
            .iter()
            .map(|mq| {
                json!({
                    "condition": mq.condition,
                    "rules": mq.rules.iter().map(rule).collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>(),
    })
}

/// Encode a whole document into the KIR wrapper object.
pub fn document_to_json(doc: &KirDocument) -> Result<Json> {
    let mut map = Map::new();
    map.insert("format".into(), json!("kir"));

    let mut metadata = match &doc.context.metadata.extra {
        Some(Json::Object(extra)) => extra.clone(),
        _ => Map::new(),
    };
    if let Some(lang) = &doc.context.metadata.source_language {
        metadata.insert("source_language".into(), json!(lang));
    }
    if let Some(module) = &doc.context.metadata.module_name {
        metadata.insert("module_name".into(), json!(module));
    }
    if !metadata.is_empty() {
        map.insert("metadata".into(), Json::Object(metadata));
    }

    map.insert(
        "app".into(),
        json!({
            "windowTitle": doc.context.app.window_title,
            "windowWidth": finite(doc.context.app.window_width, "app.windowWidth")?,
            "windowHeight": finite(doc.context.app.window_height, "app.windowHeight")?,
        }),
    );

    map.insert(
        "component_definitions".into(),
        component_definitions_to_json(doc)?,
    );
    map.insert("reactive_manifest".into(), manifest_to_json(doc)?);
    map.insert("stylesheet".into(), stylesheet_to_json(doc));
    if let Some(structures) = &doc.context.source_structures {
        map.insert("source_structures".into(), structures.clone());
    }
    if let Some(c_meta) = &doc.context.c_metadata {
        map.insert("c_metadata".into(), c_meta.clone());
    }
    map.insert("logic_block".into(), logic_to_json(&doc.logic)?);
    if let Some(root) = doc.context.tree.root() {
        map.insert("root".into(), component_to_json(&doc.context.tree, root)?);
    }
    map.insert("sources".into(), sources_to_json(doc));

    Ok(Json::Object(map))
}

/// Encode to a compact JSON string.
pub fn to_string(doc: &KirDocument) -> Result<String> {
    Ok(serde_json::to_string(&document_to_json(doc)?)?)
}

/// Encode to a human-readable JSON string.
pub fn to_string_pretty(doc: &KirDocument) -> Result<String> {
    Ok(serde_json::to_string_pretty(&document_to_json(doc)?)?)
}
