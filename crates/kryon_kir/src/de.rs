//! KIR parsing: the canonical JSON wrapper back into a document.
//!
//! Component definitions resolve before the tree so that references
//! within it can expand templates. Unknown component variants decode as
//! Container.

use serde_json::Value as Json;

use kryon_core::{
    AppMetadata, Color, ComponentId, ComponentKind, ComponentTree, CssRule, MediaQuery,
    NodeKey, StyleVariable,
};
use kryon_reactive::{
    BindingType, ComponentDef, PropDef, ReactiveVariable, StateVarDef, VarType,
};

use crate::document::KirDocument;
use crate::error::{KirError, Result};
use crate::logic_json::{logic_from_json, var_value_from_json};
use crate::payload_json::{custom_data_from_json, events_from_json};
use crate::style_json::{layout_from_json, style_from_json};

/// Decode one component subtree into the tree arena. The node is created
/// detached; callers attach it or install it as root.
pub fn component_from_json(tree: &mut ComponentTree, value: &Json) -> Result<NodeKey> {
    let obj = value.as_object().ok_or(KirError::InvalidField {
        field: "component",
        reason: "expected object".into(),
    })?;

    let kind = match obj.get("type").and_then(Json::as_str) {
        Some(name) => ComponentKind::from_name(name).unwrap_or_else(|| {
            tracing::warn!(variant = name, "unknown component variant, using Container");
            ComponentKind::Container
        }),
        None => return Err(KirError::MissingField("component.type")),
    };

    let key = match obj.get("id").and_then(Json::as_u64) {
        Some(id) => tree
            .create_with_id(kind, ComponentId(id as u32))
            .unwrap_or_else(|| {
                // Duplicate ids keep the first claimant; the clash gets a
                // fresh id so the subtree still loads.
                tracing::warn!(id, "duplicate component id, allocating a fresh one");
                tree.create(kind)
            }),
        None => tree.create(kind),
    };

    {
        let node = tree.get_mut(key).ok_or(KirError::InvalidField {
            field: "component",
            reason: "arena insert failed".into(),
        })?;
        node.tag = obj.get("tag").and_then(Json::as_str).map(str::to_string);
        node.text_content = obj
            .get("text_content")
            .and_then(Json::as_str)
            .map(str::to_string);
        if let Some(data) = obj.get("custom_data") {
            node.custom_data = Some(custom_data_from_json(kind, data));
        }
        if let Some(style) = obj.get("style") {
            node.style = Some(Box::new(style_from_json(style)?));
        }
        if let Some(layout) = obj.get("layout") {
            node.layout = Some(Box::new(layout_from_json(layout)?));
        }
        if let Some(events) = obj.get("events") {
            node.events = events_from_json(events)?.into();
        }
    }

    for child in obj.get("children").and_then(Json::as_array).into_iter().flatten() {
        let child_key = component_from_json(tree, child)?;
        if !tree.add_child(key, child_key) {
            tracing::warn!("dropping child that could not be attached");
            tree.destroy(child_key);
        }
    }
    Ok(key)
}

fn component_ids(value: Option<&Json>) -> Vec<ComponentId> {
    value
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
        .filter_map(Json::as_u64)
        .map(|id| ComponentId(id as u32))
        .collect()
}

fn manifest_from_json(doc: &mut KirDocument, value: &Json) -> Result<()> {
    for v in value
        .get("variables")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let ty = v
            .get("type")
            .and_then(Json::as_str)
            .and_then(VarType::from_name)
            .unwrap_or_default();
        let raw = v.get("value").unwrap_or(&Json::Null);
        doc.manifest.restore_var(ReactiveVariable {
            id: v.get("id").and_then(Json::as_u64).unwrap_or(0) as u32,
            name: v
                .get("name")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            ty,
            value: var_value_from_json(ty, raw),
            version: v.get("version").and_then(Json::as_u64).unwrap_or(0),
            type_string: v
                .get("type_string")
                .and_then(Json::as_str)
                .map(str::to_string),
            initial_value_json: v
                .get("initial_value_json")
                .and_then(Json::as_str)
                .map(str::to_string),
            scope: v.get("scope").and_then(Json::as_str).map(str::to_string),
        });
    }

    for b in value
        .get("bindings")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let component_id =
            ComponentId(b.get("component_id").and_then(Json::as_u64).unwrap_or(0) as u32);
        let var_id = b.get("var_id").and_then(Json::as_u64).unwrap_or(0) as u32;
        let binding_type = b
            .get("type")
            .and_then(Json::as_str)
            .and_then(BindingType::from_name)
            .unwrap_or_default();
        let expression = b.get("expression").and_then(Json::as_str).unwrap_or_default();
        doc.manifest
            .add_binding(component_id, var_id, binding_type, expression);
    }

    for c in value
        .get("conditionals")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let component_id =
            ComponentId(c.get("component_id").and_then(Json::as_u64).unwrap_or(0) as u32);
        let condition = c.get("condition").and_then(Json::as_str).unwrap_or_default();
        let deps: Vec<u32> = c
            .get("dependent_var_ids")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
            .filter_map(Json::as_u64)
            .map(|id| id as u32)
            .collect();
        doc.manifest.add_conditional(component_id, condition, deps);
        doc.manifest.set_conditional_branches(
            component_id,
            component_ids(c.get("then_children")),
            component_ids(c.get("else_children")),
        );
        if let Some(cond) = doc
            .manifest
            .conditionals
            .iter_mut()
            .rev()
            .find(|entry| entry.component_id == component_id)
        {
            cond.last_eval_result = c
                .get("last_eval_result")
                .and_then(Json::as_bool)
                .unwrap_or(false);
            cond.suspended = c.get("suspended").and_then(Json::as_bool).unwrap_or(false);
        }
    }

    for fl in value
        .get("for_loops")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let parent =
            ComponentId(fl.get("parent_component_id").and_then(Json::as_u64).unwrap_or(0) as u32);
        let expr = fl
            .get("collection_expr")
            .and_then(Json::as_str)
            .unwrap_or_default();
        let var_id = fl
            .get("collection_var_id")
            .and_then(Json::as_u64)
            .unwrap_or(0) as u32;
        doc.manifest.add_for_loop(parent, expr, var_id);
        if let Some(entry) = doc.manifest.for_loops.last_mut() {
            entry.child_component_ids = component_ids(fl.get("child_component_ids"));
        }
        if let Some(template) = fl.get("template") {
            let template_key = component_from_json(&mut doc.context.tree, template)?;
            if let Some(entry) = doc.manifest.for_loops.last_mut() {
                entry.item_template = Some(template_key);
            }
        }
    }

    sources_from_json(doc, value.get("sources"));
    Ok(())
}

fn sources_from_json(doc: &mut KirDocument, value: Option<&Json>) {
    for entry in value.and_then(Json::as_array).into_iter().flatten() {
        if let (Some(lang), Some(code)) = (
            entry.get("lang").and_then(Json::as_str),
            entry.get("code").and_then(Json::as_str),
        ) {
            doc.manifest.add_source(lang, code);
        }
    }
}

fn component_definitions_from_json(doc: &mut KirDocument, value: &Json) -> Result<()> {
    for def in value.as_array().into_iter().flatten() {
        let Some(name) = def.get("name").and_then(Json::as_str) else {
            tracing::warn!("component definition without a name skipped");
            continue;
        };
        let props = def
            .get("props")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
            .filter_map(|p| {
                Some(PropDef {
                    name: p.get("name")?.as_str()?.to_string(),
                    ty: p
                        .get("type")
                        .and_then(Json::as_str)
                        .unwrap_or("string")
                        .to_string(),
                    default: p.get("default").and_then(Json::as_str).map(str::to_string),
                })
            })
            .collect();
        let state_vars = def
            .get("state_vars")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
            .filter_map(|s| {
                Some(StateVarDef {
                    name: s.get("name")?.as_str()?.to_string(),
                    ty: s
                        .get("type")
                        .and_then(Json::as_str)
                        .unwrap_or("string")
                        .to_string(),
                    initial_expr: s.get("initial").and_then(Json::as_str).map(str::to_string),
                })
            })
            .collect();
        let template = match def.get("template") {
            Some(t) => Some(component_from_json(&mut doc.context.tree, t)?),
            None => None,
        };
        doc.manifest.add_component_def(ComponentDef {
            name: name.to_string(),
            props,
            state_vars,
            template,
        });
    }
    Ok(())
}

fn stylesheet_from_json(doc: &mut KirDocument, value: &Json) {
    let rule_from = |r: &Json| -> Option<CssRule> {
        Some(CssRule {
            selector: r.get("selector")?.as_str()?.to_string(),
            declarations: r
                .get("declarations")
                .and_then(Json::as_array)
                .into_iter()
                .flatten()
                .filter_map(|pair| {
                    let pair = pair.as_array()?;
                    Some((pair.first()?.as_str()?.to_string(), pair.get(1)?.as_str()?.to_string()))
                })
                .collect(),
        })
    };
    for r in value.get("rules").and_then(Json::as_array).into_iter().flatten() {
        if let Some(rule) = rule_from(r) {
            doc.context.stylesheet.rules.push(rule);
        }
    }
    for v in value
        .get("variables")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let (Some(id), Some(name)) = (
            v.get("id").and_then(Json::as_u64),
            v.get("name").and_then(Json::as_str),
        ) else {
            continue;
        };
        let color = v
            .get("color")
            .and_then(Json::as_str)
            .and_then(Color::from_hex)
            .unwrap_or_default();
        doc.context.stylesheet.restore_variable(StyleVariable {
            id: id as u16,
            name: name.to_string(),
            color,
        });
    }
    for mq in value
        .get("media_queries")
        .and_then(Json::as_array)
        .into_iter()
        .flatten()
    {
        let condition = mq
            .get("condition")
            .and_then(Json::as_str)
            .unwrap_or_default()
            .to_string();
        let rules = mq
            .get("rules")
            .and_then(Json::as_array)
            .into_iter()
            .flatten()
            .filter_map(rule_from)
            .collect();
        doc.context
            .stylesheet
            .media_queries
            .push(MediaQuery { condition, rules });
    }
}

/// Decode a whole KIR document.
pub fn document_from_json(value: &Json) -> Result<KirDocument> {
    let obj = value.as_object().ok_or(KirError::InvalidField {
        field: "document",
        reason: "expected top-level object".into(),
    })?;
    if let Some(format) = obj.get("format").and_then(Json::as_str) {
        if format != "kir" {
            return Err(KirError::InvalidField {
                field: "format",
                reason: format!("expected \"kir\", got \"{format}\""),
            });
        }
    }

    let mut doc = KirDocument::new();

    if let Some(metadata) = obj.get("metadata") {
        doc.context.metadata.source_language = metadata
            .get("source_language")
            .and_then(Json::as_str)
            .map(str::to_string);
        doc.context.metadata.module_name = metadata
            .get("module_name")
            .and_then(Json::as_str)
            .map(str::to_string);
        if let Some(extra) = metadata.as_object() {
            let mut rest = extra.clone();
            rest.remove("source_language");
            rest.remove("module_name");
            if !rest.is_empty() {
                doc.context.metadata.extra = Some(Json::Object(rest));
            }
        }
    }

    if let Some(app) = obj.get("app") {
        doc.context.app = AppMetadata {
            window_title: app
                .get("windowTitle")
                .and_then(Json::as_str)
                .unwrap_or_default()
                .to_string(),
            window_width: app
                .get("windowWidth")
                .and_then(Json::as_f64)
                .unwrap_or(800.0) as f32,
            window_height: app
                .get("windowHeight")
                .and_then(Json::as_f64)
                .unwrap_or(600.0) as f32,
        };
    }

    if let Some(sheet) = obj.get("stylesheet") {
        stylesheet_from_json(&mut doc, sheet);
    }

    // Definitions first, so tree references can expand templates.
    if let Some(defs) = obj.get("component_definitions") {
        component_definitions_from_json(&mut doc, defs)?;
    }
    if let Some(manifest) = obj.get("reactive_manifest") {
        manifest_from_json(&mut doc, manifest)?;
    }
    if let Some(logic) = obj.get("logic_block") {
        doc.logic = logic_from_json(logic)?;
    }
    doc.context.source_structures = obj.get("source_structures").cloned();
    doc.context.c_metadata = obj.get("c_metadata").cloned();

    if let Some(root) = obj.get("root").or_else(|| obj.get("component")) {
        let root_key = component_from_json(&mut doc.context.tree, root)?;
        doc.context.tree.set_root(root_key);
    }

    // Top-level sources win over any archived inside the manifest block.
    sources_from_json(&mut doc, obj.get("sources"));

    Ok(doc)
}

/// Decode from JSON text.
pub fn from_str(text: &str) -> Result<KirDocument> {
    let value: Json = serde_json::from_str(text)?;
    document_from_json(&value)
}
