//! Whole-page assembly: document metadata, generated CSS, and the body
//! tree.

use html_escape::encode_text;

use kryon_core::IrContext;

use crate::css::emit_css;
use crate::html::emit_component;

/// Render a full standalone HTML page for a document.
pub fn emit_page(ctx: &IrContext) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    let title = if ctx.app.window_title.is_empty() {
        "Kryon App"
    } else {
        ctx.app.window_title.as_str()
    };
    out.push_str("<title>");
    out.push_str(&encode_text(title));
    out.push_str("</title>\n<style>\n");
    out.push_str(&emit_css(&ctx.tree, &ctx.stylesheet));
    out.push_str("</style>\n</head>\n<body>\n");
    if let Some(root) = ctx.tree.root() {
        emit_component(&ctx.tree, root, &mut out);
        out.push('\n');
    }
    out.push_str("</body>\n</html>\n");
    out
}
