//! ForEach expansion: materialize template instances from a data source
//! and apply bindings to each copy.

use serde_json::Value as Json;

use kryon_core::{
    Color, ColorValue, ComponentKind, ComponentTree, CustomData, ForEachData, NodeKey,
};

/// Marker meaning "the source arrives at runtime; do not expand now".
pub const RUNTIME_SOURCE: &str = "__runtime__";

/// Print a JSON scalar the way bindings expect: integer-exact numbers
/// without a fractional part, strings without quotes.
pub(crate) fn scalar_to_string(value: &Json) -> String {
    match value {
        Json::String(s) => s.clone(),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                if f.fract() == 0.0 && f.is_finite() && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    format!("{f}")
                }
            } else {
                n.to_string()
            }
        }
        Json::Bool(b) => b.to_string(),
        Json::Null => String::new(),
        other => other.to_string(),
    }
}

/// Recursive field lookup into an array element.
fn lookup<'a>(element: &'a Json, path: &[&str]) -> Option<&'a Json> {
    let mut cur = element;
    for segment in path {
        cur = cur.get(segment)?;
    }
    Some(cur)
}

/// Resolve one binding expression against the current element and index.
fn resolve_binding(data: &ForEachData, expr: &str, element: &Json, index: usize) -> Option<String> {
    if data.index_name.as_deref() == Some(expr) {
        return Some(index.to_string());
    }
    if expr == data.item_name {
        return Some(scalar_to_string(element));
    }
    let mut parts = expr.split('.');
    if parts.next() == Some(data.item_name.as_str()) {
        let path: Vec<&str> = parts.collect();
        if !path.is_empty() {
            return lookup(element, &path).map(scalar_to_string);
        }
    }
    None
}

/// Apply a resolved value to a property path on the copy.
fn apply_binding(tree: &mut ComponentTree, copy: NodeKey, target: &str, value: &str, raw: &Json) {
    let Some(node) = tree.get_mut(copy) else {
        return;
    };
    match target {
        "text_content" => node.text_content = Some(value.to_string()),
        "style.opacity" => match value.parse::<f32>() {
            Ok(opacity) => node.style_mut().opacity = opacity,
            Err(_) => tracing::warn!(value, "opacity binding is not a number, skipped"),
        },
        "style.background" => match Color::from_hex(value) {
            Some(color) => node.style_mut().background = ColorValue::Solid(color),
            None => tracing::warn!(value, "background binding is not a hex color, skipped"),
        },
        "custom_data" => node.custom_data = Some(CustomData::Json(raw.clone())),
        other => {
            tracing::warn!(target = other, "unsupported binding target, skipped");
        }
    }
}

/// Expand one ForEach component in place.
///
/// With a resolvable inline source the node is replaced in its parent by
/// the materialized copies and destroyed; a root-level ForEach keeps the
/// copies as a transparent wrapper. A `"__runtime__"` or absent source
/// defers: the node is left untouched.
pub fn expand_foreach(tree: &mut ComponentTree, key: NodeKey) {
    let Some(node) = tree.get(key) else {
        return;
    };
    if node.kind != ComponentKind::ForEach {
        return;
    }
    let Some(CustomData::ForEach(data)) = node.custom_data.clone() else {
        tracing::warn!("ForEach without loop data, left unexpanded");
        return;
    };

    let source_text = match data.each_source.as_deref() {
        None | Some(RUNTIME_SOURCE) => return,
        Some(text) => text,
    };
    let elements = match serde_json::from_str::<Json>(source_text) {
        Ok(Json::Array(elements)) => elements,
        Ok(_) => {
            tracing::warn!("ForEach source is not a JSON array, left unexpanded");
            return;
        }
        Err(e) => {
            tracing::warn!("ForEach source is not valid JSON ({e}), left unexpanded");
            return;
        }
    };

    expand_with_elements(tree, key, &data, &elements);
}

/// Expansion with an already resolved element array. Used directly by
/// runtime re-expansion, where the source comes from a variable.
pub fn expand_with_elements(
    tree: &mut ComponentTree,
    key: NodeKey,
    data: &ForEachData,
    elements: &[Json],
) {
    let template = match tree.get(key).map(|n| n.children.as_slice()) {
        Some([template]) => *template,
        Some(_) => {
            tracing::warn!("ForEach needs exactly one template child, left unexpanded");
            return;
        }
        None => return,
    };

    let mut expanded = Vec::with_capacity(elements.len());
    for (index, element) in elements.iter().enumerate() {
        let Some(copy) = tree.deep_copy(template) else {
            tracing::warn!("template copy failed, instance skipped");
            continue;
        };
        if let Some(node) = tree.get_mut(copy) {
            node.iteration_index = Some(index as u32);
        }
        for binding in &data.bindings {
            match resolve_binding(data, &binding.expr, element, index) {
                Some(value) => {
                    let raw = lookup_raw(data, &binding.expr, element);
                    apply_binding(tree, copy, &binding.target, &value, raw.unwrap_or(element));
                }
                None => {
                    tracing::warn!(
                        expr = %binding.expr,
                        "binding could not be resolved, skipped"
                    );
                }
            }
        }
        expand_nested(tree, copy, data, element);
        expanded.push(copy);
    }

    match tree.get(key).and_then(|n| n.parent) {
        Some(parent) => {
            tree.replace_child_with(parent, key, &expanded);
            tree.destroy(key);
            tree.invalidate_subtree(parent);
        }
        None => {
            // Root-level ForEach keeps its instances as a transparent
            // wrapper.
            tree.remove_child(key, template);
            tree.destroy(template);
            for &copy in &expanded {
                tree.add_child(key, copy);
            }
            tree.invalidate_subtree(key);
        }
    }
}

fn lookup_raw<'a>(data: &ForEachData, expr: &str, element: &'a Json) -> Option<&'a Json> {
    if expr == data.item_name {
        return Some(element);
    }
    let mut parts = expr.split('.');
    if parts.next() == Some(data.item_name.as_str()) {
        let path: Vec<&str> = parts.collect();
        return lookup(element, &path);
    }
    None
}

/// Expand nested ForEach nodes inside a freshly made copy. A nested loop
/// whose source names a field of the current element draws its array
/// from there.
fn expand_nested(tree: &mut ComponentTree, copy: NodeKey, outer: &ForEachData, element: &Json) {
    let nested: Vec<NodeKey> = tree
        .descendants(copy)
        .into_iter()
        .filter(|&k| k != copy)
        .filter(|&k| tree.get(k).map_or(false, |n| n.kind == ComponentKind::ForEach))
        .collect();
    for key in nested {
        let Some(CustomData::ForEach(inner)) =
            tree.get(key).and_then(|n| n.custom_data.clone())
        else {
            continue;
        };
        let from_element = inner
            .each_source
            .as_deref()
            .and_then(|source| lookup_raw(outer, source, element))
            .and_then(Json::as_array)
            .cloned();
        match from_element {
            Some(elements) => expand_with_elements(tree, key, &inner, &elements),
            None => expand_foreach(tree, key),
        }
    }
}

/// Expand every ForEach in a subtree. Nested loops inside templates are
/// handled during their parent's expansion, so one sweep over the
/// current nodes is complete.
pub fn expand_all(tree: &mut ComponentTree, root: NodeKey) {
    let keys: Vec<NodeKey> = tree
        .descendants(root)
        .into_iter()
        .filter(|&k| tree.get(k).map_or(false, |n| n.kind == ComponentKind::ForEach))
        .collect();
    for key in keys {
        // Earlier expansions may have consumed this node already.
        if tree.get(key).is_some() {
            expand_foreach(tree, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kryon_core::{ComponentId, TemplateBinding};

    fn foreach_tree(source: &str, bindings: Vec<TemplateBinding>) -> (ComponentTree, NodeKey, NodeKey) {
        let mut tree = ComponentTree::new();
        let parent = tree.create(ComponentKind::Container);
        tree.set_root(parent);
        let foreach = tree.create(ComponentKind::ForEach);
        tree.get_mut(foreach).unwrap().custom_data = Some(CustomData::ForEach(ForEachData {
            item_name: "day".into(),
            index_name: Some("i".into()),
            each_source: Some(source.to_string()),
            bindings,
        }));
        tree.add_child(parent, foreach);
        let template = tree.create(ComponentKind::Button);
        tree.add_child(foreach, template);
        (tree, parent, foreach)
    }

    #[test]
    fn inline_source_replaces_foreach_with_instances() {
        let (mut tree, parent, foreach) = foreach_tree(
            r#"[{"dayNumber":1,"isCompleted":true},{"dayNumber":2,"isCompleted":false}]"#,
            vec![TemplateBinding {
                target: "text_content".into(),
                expr: "day.dayNumber".into(),
            }],
        );
        let foreach_id = tree.get(foreach).unwrap().id;
        expand_foreach(&mut tree, foreach);

        let children = tree.get(parent).unwrap().children.clone();
        assert_eq!(children.len(), 2);
        let texts: Vec<Option<String>> = children
            .iter()
            .map(|&k| tree.get(k).unwrap().text_content.clone())
            .collect();
        assert_eq!(texts, vec![Some("1".into()), Some("2".into())]);
        for (i, &k) in children.iter().enumerate() {
            let node = tree.get(k).unwrap();
            assert_eq!(node.kind, ComponentKind::Button);
            assert_eq!(node.iteration_index, Some(i as u32));
            assert_eq!(node.parent, Some(parent));
        }
        // The ForEach node itself is gone.
        assert!(tree.find_by_id(foreach_id).is_none());
    }

    #[test]
    fn index_binding_uses_position() {
        let (mut tree, parent, foreach) = foreach_tree(
            r#"["a","b","c"]"#,
            vec![TemplateBinding {
                target: "text_content".into(),
                expr: "i".into(),
            }],
        );
        expand_foreach(&mut tree, foreach);
        let children = tree.get(parent).unwrap().children.clone();
        let texts: Vec<Option<String>> = children
            .iter()
            .map(|&k| tree.get(k).unwrap().text_content.clone())
            .collect();
        assert_eq!(texts, vec![Some("0".into()), Some("1".into()), Some("2".into())]);
    }

    #[test]
    fn direct_item_reference_stringifies() {
        let (mut tree, parent, foreach) = foreach_tree(
            r#"[10, 2.5, "x"]"#,
            vec![TemplateBinding {
                target: "text_content".into(),
                expr: "day".into(),
            }],
        );
        expand_foreach(&mut tree, foreach);
        let children = tree.get(parent).unwrap().children.clone();
        let texts: Vec<Option<String>> = children
            .iter()
            .map(|&k| tree.get(k).unwrap().text_content.clone())
            .collect();
        assert_eq!(
            texts,
            vec![Some("10".into()), Some("2.5".into()), Some("x".into())]
        );
    }

    #[test]
    fn style_bindings_apply() {
        let (mut tree, parent, foreach) = foreach_tree(
            r##"[{"color":"#FF0000","alpha":0.5}]"##,
            vec![
                TemplateBinding {
                    target: "style.background".into(),
                    expr: "day.color".into(),
                },
                TemplateBinding {
                    target: "style.opacity".into(),
                    expr: "day.alpha".into(),
                },
            ],
        );
        expand_foreach(&mut tree, foreach);
        let child = tree.get(parent).unwrap().children[0];
        let style = tree.get(child).unwrap().style.as_deref().unwrap().clone();
        assert_eq!(
            style.background,
            ColorValue::Solid(Color::rgb(255, 0, 0))
        );
        assert_eq!(style.opacity, 0.5);
    }

    #[test]
    fn runtime_marker_defers() {
        let (mut tree, parent, foreach) = foreach_tree(RUNTIME_SOURCE, Vec::new());
        expand_foreach(&mut tree, foreach);
        assert_eq!(tree.get(parent).unwrap().children, vec![foreach]);
        assert_eq!(tree.get(foreach).unwrap().children.len(), 1);
    }

    #[test]
    fn empty_array_removes_foreach() {
        let (mut tree, parent, foreach) = foreach_tree("[]", Vec::new());
        expand_foreach(&mut tree, foreach);
        assert!(tree.get(parent).unwrap().children.is_empty());
        assert!(tree.get(foreach).is_none());
    }

    #[test]
    fn root_level_foreach_becomes_wrapper() {
        let mut tree = ComponentTree::new();
        let foreach = tree.create(ComponentKind::ForEach);
        tree.set_root(foreach);
        tree.get_mut(foreach).unwrap().custom_data = Some(CustomData::ForEach(ForEachData {
            item_name: "n".into(),
            index_name: None,
            each_source: Some("[1,2]".into()),
            bindings: vec![TemplateBinding {
                target: "text_content".into(),
                expr: "n".into(),
            }],
        }));
        let template = tree.create(ComponentKind::Text);
        tree.add_child(foreach, template);

        expand_foreach(&mut tree, foreach);
        let node = tree.get(foreach).unwrap();
        assert_eq!(node.children.len(), 2);
        let first = tree.get(node.children[0]).unwrap();
        assert_eq!(first.kind, ComponentKind::Text);
        assert_eq!(first.text_content.as_deref(), Some("1"));
    }

    #[test]
    fn nested_foreach_draws_from_element_field() {
        let mut tree = ComponentTree::new();
        let parent = tree.create(ComponentKind::Container);
        tree.set_root(parent);
        let outer = tree.create(ComponentKind::ForEach);
        tree.get_mut(outer).unwrap().custom_data = Some(CustomData::ForEach(ForEachData {
            item_name: "week".into(),
            index_name: None,
            each_source: Some(r#"[{"days":[1,2]},{"days":[3]}]"#.into()),
            bindings: Vec::new(),
        }));
        tree.add_child(parent, outer);

        let week_tmpl = tree.create(ComponentKind::Column);
        tree.add_child(outer, week_tmpl);
        let inner = tree.create(ComponentKind::ForEach);
        tree.get_mut(inner).unwrap().custom_data = Some(CustomData::ForEach(ForEachData {
            item_name: "day".into(),
            index_name: None,
            each_source: Some("week.days".into()),
            bindings: vec![TemplateBinding {
                target: "text_content".into(),
                expr: "day".into(),
            }],
        }));
        tree.add_child(week_tmpl, inner);
        let day_tmpl = tree.create(ComponentKind::Text);
        tree.add_child(inner, day_tmpl);

        expand_foreach(&mut tree, outer);

        let weeks = tree.get(parent).unwrap().children.clone();
        assert_eq!(weeks.len(), 2);
        let first_week_days: Vec<String> = tree
            .get(weeks[0])
            .unwrap()
            .children
            .iter()
            .filter_map(|&k| tree.get(k).unwrap().text_content.clone())
            .collect();
        assert_eq!(first_week_days, vec!["1", "2"]);
        let second_week_days: Vec<String> = tree
            .get(weeks[1])
            .unwrap()
            .children
            .iter()
            .filter_map(|&k| tree.get(k).unwrap().text_content.clone())
            .collect();
        assert_eq!(second_week_days, vec!["3"]);
    }
}
