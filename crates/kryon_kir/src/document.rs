//! The deserialized document: tree context, reactive manifest, and logic
//! block travel together.

use kryon_core::IrContext;
use kryon_reactive::{BytecodeMetadata, ReactiveManifest};

/// Everything a KIR file decodes into.
#[derive(Default)]
pub struct KirDocument {
    pub context: IrContext,
    pub manifest: ReactiveManifest,
    pub logic: BytecodeMetadata,
}

impl KirDocument {
    pub fn new() -> Self {
        Self {
            context: IrContext::new(),
            manifest: ReactiveManifest::new(),
            logic: BytecodeMetadata::new(),
        }
    }
}
