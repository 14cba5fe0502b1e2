//! End-to-end pipeline: KIR text → tree → ForEach expansion → layout →
//! HTML emission.

use kryon_core::{ComponentKind, Size};
use kryon_html::emit_page;
use kryon_layout::LayoutEngine;
use kryon_runtime::Runtime;

const CHECKLIST_KIR: &str = r#"{
    "format": "kir",
    "app": { "windowTitle": "Checklist", "windowWidth": 400, "windowHeight": 300 },
    "root": {
        "type": "Column",
        "id": 1,
        "layout": { "flex": { "gap": 4 } },
        "children": [{
            "type": "ForEach",
            "id": 2,
            "custom_data": {
                "item_name": "day",
                "index_name": "i",
                "each_source": "[{\"dayNumber\":1,\"isCompleted\":true},{\"dayNumber\":2,\"isCompleted\":false}]",
                "bindings": [
                    { "target": "text_content", "expr": "day.dayNumber" }
                ]
            },
            "children": [{ "type": "Button", "id": 3 }]
        }]
    }
}"#;

#[test]
fn kir_to_html_with_expansion_and_layout() {
    let doc = kryon_kir::from_str(CHECKLIST_KIR).expect("valid kir");
    let mut runtime = Runtime::from_document(doc);
    runtime.expand_templates();

    // The ForEach replaced itself with two buttons.
    let root = runtime.context.root().expect("root");
    let children = runtime.context.tree.get(root).unwrap().children.clone();
    assert_eq!(children.len(), 2);
    for (i, &child) in children.iter().enumerate() {
        let node = runtime.context.tree.get(child).unwrap();
        assert_eq!(node.kind, ComponentKind::Button);
        assert_eq!(
            node.text_content.as_deref(),
            Some((i + 1).to_string().as_str())
        );
    }

    // Layout annotates every live node.
    let engine = LayoutEngine::new(Size::new(400.0, 300.0));
    engine.compute_root(&mut runtime.context.tree);
    for &child in &children {
        let bounds = runtime.context.tree.get(child).unwrap().bounds;
        assert!(bounds.valid);
        assert!(bounds.height > 0.0);
    }
    // The second button sits below the first plus the 4px gap.
    let first = runtime.context.tree.get(children[0]).unwrap().bounds;
    let second = runtime.context.tree.get(children[1]).unwrap().bounds;
    assert_eq!(second.y, first.y + first.height + 4.0);

    // The page carries both expanded instances.
    let page = emit_page(&runtime.context);
    assert!(page.contains("<title>Checklist</title>"));
    assert!(page.matches("kryon-button").count() >= 2);
    assert!(page.contains(">1</button>"));
    assert!(page.contains(">2</button>"));
}

#[test]
fn tick_after_expansion_relayouts_dirty_subtrees() {
    let doc = kryon_kir::from_str(CHECKLIST_KIR).expect("valid kir");
    let mut runtime = Runtime::from_document(doc);
    runtime.expand_templates();
    let engine = LayoutEngine::new(Size::new(400.0, 300.0));
    engine.compute_root(&mut runtime.context.tree);

    let root = runtime.context.root().unwrap();
    let first_child = runtime.context.tree.get(root).unwrap().children[0];
    let first_id = runtime.context.tree.get(first_child).unwrap().id;

    runtime
        .state
        .queue_mark_dirty(first_id, kryon_core::DirtyFlags::LAYOUT, false);
    let result = runtime.tick();
    assert_eq!(result.components_affected, 1);
    assert_eq!(result.layout_recomputations, 1);

    // Dirt propagated to the root, so a recompute runs end to end.
    assert!(runtime
        .context
        .tree
        .get(root)
        .unwrap()
        .dirty
        .contains(kryon_core::DirtyFlags::SUBTREE));
    engine.compute_root(&mut runtime.context.tree);
    assert!(!runtime
        .context
        .tree
        .get(root)
        .unwrap()
        .dirty
        .intersects(kryon_core::DirtyFlags::LAYOUT | kryon_core::DirtyFlags::SUBTREE));
}
