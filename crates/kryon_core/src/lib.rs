//! Kryon IR core
//!
//! This crate provides the data model shared by every Kryon frontend and
//! backend:
//!
//! - **Component tree**: an arena-backed, parent-linked tree of typed nodes
//! - **Style model**: dimensions, colors, gradients, typography, effects
//! - **Layout spec**: flexbox, CSS-grid, and block parameters
//! - **Handler registry**: per-variant serializer/measurer/validator hooks
//!
//! # Example
//!
//! ```rust
//! use kryon_core::{ComponentKind, IrContext};
//!
//! let mut ctx = IrContext::new();
//! let root = ctx.create_root(ComponentKind::Container);
//! let button = ctx.tree.create(ComponentKind::Button);
//! ctx.tree.get_mut(button).unwrap().text_content = Some("Click".into());
//! assert!(ctx.tree.add_child(root, button));
//! ```

pub mod color;
pub mod component;
pub mod context;
pub mod dimension;
pub mod effects;
pub mod error;
pub mod geometry;
pub mod layout_spec;
pub mod registry;
pub mod style;
pub mod stylesheet;
pub mod tree;
pub mod typography;

pub use color::{Color, ColorValue, Gradient, GradientKind, GradientStop, MAX_GRADIENT_STOPS};
pub use component::{
    Component, ComponentId, ComponentKind, CustomData, DirtyFlags, EventBinding, EventKind,
    ForEachData, HandlerLanguage, InlineHandler, LayoutCache, ListKind, RenderedBounds,
    TemplateBinding, INTRINSIC_UNCACHED,
};
pub use context::{AppMetadata, DocumentMetadata, IrContext};
pub use dimension::{Dimension, ResolveContext};
pub use effects::{BoxShadow, Filter, Transform, MAX_FILTERS};
pub use error::{CoreError, Result};
pub use geometry::{Point, Rect, Size, Spacing};
pub use layout_spec::{
    CrossAxisAlignment, FlexDirection, FlexLayout, GridAutoFlow, GridItem, GridLayout, GridTrack,
    ItemAlignment, LayoutMode, LayoutSpec, MainAxisAlignment, MAX_GRID_TRACKS,
};
pub use registry::{ComponentHandler, HandlerRegistry};
pub use style::{
    Breakpoint, ContainerContext, Overflow, PositionMode, PseudoClass, PseudoStyle, Style,
    MAX_BREAKPOINTS, MAX_PSEUDO_STYLES,
};
pub use stylesheet::{CssRule, MediaQuery, StyleVariable, Stylesheet};
pub use tree::{ComponentTree, NodeKey};
pub use typography::{TextAlign, TextDecoration, Typography};
