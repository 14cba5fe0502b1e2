//! The component node: variant, payloads, events, and per-node layout state.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::layout_spec::LayoutSpec;
use crate::style::Style;
use crate::tree::NodeKey;
use crate::typography::TextAlign;

/// Unique component identity within a document, monotonically assigned by
/// the context. Survives serialization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub u32);

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed set of component variants. The variant determines default
/// measurement, the emitted HTML element, and permitted children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    #[default]
    Container,
    Text,
    Button,
    Input,
    Checkbox,
    Dropdown,
    TextArea,
    Row,
    Column,
    Center,
    Image,
    Canvas,
    Markdown,
    Sprite,
    TabGroup,
    TabBar,
    Tab,
    TabContent,
    TabPanel,
    Modal,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableCell,
    TableHeaderCell,
    Heading,
    Paragraph,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    List,
    ListItem,
    Link,
    Span,
    Strong,
    Em,
    CodeInline,
    Small,
    Mark,
    Custom,
    StaticBlock,
    ForLoop,
    ForEach,
    VarDecl,
    Placeholder,
    Flowchart,
    FlowchartNode,
    FlowchartEdge,
}

impl ComponentKind {
    /// Canonical PascalCase name used in KIR.
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ComponentKind::Container => "Container",
            ComponentKind::Text => "Text",
            ComponentKind::Button => "Button",
            ComponentKind::Input => "Input",
            ComponentKind::Checkbox => "Checkbox",
            ComponentKind::Dropdown => "Dropdown",
            ComponentKind::TextArea => "TextArea",
            ComponentKind::Row => "Row",
            ComponentKind::Column => "Column",
            ComponentKind::Center => "Center",
            ComponentKind::Image => "Image",
            ComponentKind::Canvas => "Canvas",
            ComponentKind::Markdown => "Markdown",
            ComponentKind::Sprite => "Sprite",
            ComponentKind::TabGroup => "TabGroup",
            ComponentKind::TabBar => "TabBar",
            ComponentKind::Tab => "Tab",
            ComponentKind::TabContent => "TabContent",
            ComponentKind::TabPanel => "TabPanel",
            ComponentKind::Modal => "Modal",
            ComponentKind::Table => "Table",
            ComponentKind::TableHead => "TableHead",
            ComponentKind::TableBody => "TableBody",
            ComponentKind::TableRow => "TableRow",
            ComponentKind::TableCell => "TableCell",
            ComponentKind::TableHeaderCell => "TableHeaderCell",
            ComponentKind::Heading => "Heading",
            ComponentKind::Paragraph => "Paragraph",
            ComponentKind::Blockquote => "Blockquote",
            ComponentKind::CodeBlock => "CodeBlock",
            ComponentKind::HorizontalRule => "HorizontalRule",
            ComponentKind::List => "List",
            ComponentKind::ListItem => "ListItem",
            ComponentKind::Link => "Link",
            ComponentKind::Span => "Span",
            ComponentKind::Strong => "Strong",
            ComponentKind::Em => "Em",
            ComponentKind::CodeInline => "CodeInline",
            ComponentKind::Small => "Small",
            ComponentKind::Mark => "Mark",
            ComponentKind::Custom => "Custom",
            ComponentKind::StaticBlock => "StaticBlock",
            ComponentKind::ForLoop => "ForLoop",
            ComponentKind::ForEach => "ForEach",
            ComponentKind::VarDecl => "VarDecl",
            ComponentKind::Placeholder => "Placeholder",
            ComponentKind::Flowchart => "Flowchart",
            ComponentKind::FlowchartNode => "FlowchartNode",
            ComponentKind::FlowchartEdge => "FlowchartEdge",
        }
    }

    /// Reverse of [`canonical_name`]. Unknown names return `None`; the KIR
    /// reader maps those to `Container`.
    ///
    /// [`canonical_name`]: Self::canonical_name
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "Container" => ComponentKind::Container,
            "Text" => ComponentKind::Text,
            "Button" => ComponentKind::Button,
            "Input" => ComponentKind::Input,
            "Checkbox" => ComponentKind::Checkbox,
            "Dropdown" => ComponentKind::Dropdown,
            "TextArea" => ComponentKind::TextArea,
            "Row" => ComponentKind::Row,
            "Column" => ComponentKind::Column,
            "Center" => ComponentKind::Center,
            "Image" => ComponentKind::Image,
            "Canvas" => ComponentKind::Canvas,
            "Markdown" => ComponentKind::Markdown,
            "Sprite" => ComponentKind::Sprite,
            "TabGroup" => ComponentKind::TabGroup,
            "TabBar" => ComponentKind::TabBar,
            "Tab" => ComponentKind::Tab,
            "TabContent" => ComponentKind::TabContent,
            "TabPanel" => ComponentKind::TabPanel,
            "Modal" => ComponentKind::Modal,
            "Table" => ComponentKind::Table,
            "TableHead" => ComponentKind::TableHead,
            "TableBody" => ComponentKind::TableBody,
            "TableRow" => ComponentKind::TableRow,
            "TableCell" => ComponentKind::TableCell,
            "TableHeaderCell" => ComponentKind::TableHeaderCell,
            "Heading" => ComponentKind::Heading,
            "Paragraph" => ComponentKind::Paragraph,
            "Blockquote" => ComponentKind::Blockquote,
            "CodeBlock" => ComponentKind::CodeBlock,
            "HorizontalRule" => ComponentKind::HorizontalRule,
            "List" => ComponentKind::List,
            "ListItem" => ComponentKind::ListItem,
            "Link" => ComponentKind::Link,
            "Span" => ComponentKind::Span,
            "Strong" => ComponentKind::Strong,
            "Em" => ComponentKind::Em,
            "CodeInline" => ComponentKind::CodeInline,
            "Small" => ComponentKind::Small,
            "Mark" => ComponentKind::Mark,
            "Custom" => ComponentKind::Custom,
            "StaticBlock" => ComponentKind::StaticBlock,
            "ForLoop" => ComponentKind::ForLoop,
            "ForEach" => ComponentKind::ForEach,
            "VarDecl" => ComponentKind::VarDecl,
            "Placeholder" => ComponentKind::Placeholder,
            "Flowchart" => ComponentKind::Flowchart,
            "FlowchartNode" => ComponentKind::FlowchartNode,
            "FlowchartEdge" => ComponentKind::FlowchartEdge,
            _ => return None,
        })
    }

    /// Inline (phrasing) content variants.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            ComponentKind::Span
                | ComponentKind::Strong
                | ComponentKind::Em
                | ComponentKind::CodeInline
                | ComponentKind::Small
                | ComponentKind::Mark
                | ComponentKind::Link
        )
    }

    /// Authoring-time constructs with no rendered box of their own.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ComponentKind::StaticBlock
                | ComponentKind::ForLoop
                | ComponentKind::ForEach
                | ComponentKind::VarDecl
                | ComponentKind::Placeholder
        )
    }
}

/// List flavor for `List` custom data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    #[default]
    Unordered,
}

impl ListKind {
    pub fn name(&self) -> &'static str {
        match self {
            ListKind::Ordered => "ordered",
            ListKind::Unordered => "unordered",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "ordered" => ListKind::Ordered,
            "unordered" => ListKind::Unordered,
            _ => return None,
        })
    }
}

/// ForEach source and binding descriptor carried in custom data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForEachData {
    /// Loop variable name for the current element.
    pub item_name: String,
    /// Optional loop variable name for the index.
    pub index_name: Option<String>,
    /// Inline JSON array text, the runtime-defer marker `"__runtime__"`,
    /// or absent when the source is a definition reference.
    pub each_source: Option<String>,
    /// Template bindings: property path ← expression over the loop variables.
    pub bindings: Vec<TemplateBinding>,
}

/// A single template binding inside a ForEach definition.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateBinding {
    /// Target property path on the copy (`text_content`, `style.opacity`,
    /// `style.background`, `custom_data`, ...).
    pub target: String,
    /// Expression: the index name, `item`, or `item.field.subfield`.
    pub expr: String,
}

/// Variant-specific payload.
#[derive(Clone, Debug, PartialEq)]
pub enum CustomData {
    Heading {
        /// 1-6.
        level: u8,
        anchor: Option<String>,
    },
    CodeBlock {
        language: Option<String>,
        source: String,
    },
    Link {
        url: String,
        title: Option<String>,
    },
    TableCell {
        colspan: u32,
        rowspan: u32,
        align: Option<TextAlign>,
    },
    Dropdown {
        options: Vec<String>,
        selected: Option<usize>,
    },
    List {
        kind: ListKind,
        start: Option<u32>,
    },
    ListItem {
        value: Option<u32>,
        checked: Option<bool>,
    },
    Image {
        src: String,
        alt: Option<String>,
    },
    ForEach(ForEachData),
    /// Opaque payload preserved verbatim for round-trip.
    Json(serde_json::Value),
}

/// Event types a component may bind handlers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Hover,
    Focus,
    Blur,
    Key,
    Scroll,
    Timer,
    Custom,
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Click => "click",
            EventKind::Hover => "hover",
            EventKind::Focus => "focus",
            EventKind::Blur => "blur",
            EventKind::Key => "key",
            EventKind::Scroll => "scroll",
            EventKind::Timer => "timer",
            EventKind::Custom => "custom",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "click" => EventKind::Click,
            "hover" => EventKind::Hover,
            "focus" => EventKind::Focus,
            "blur" => EventKind::Blur,
            "key" => EventKind::Key,
            "scroll" => EventKind::Scroll,
            "timer" => EventKind::Timer,
            "custom" => EventKind::Custom,
            _ => return None,
        })
    }
}

/// Source language of an inline handler blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerLanguage {
    Nim,
    C,
    Lua,
    Wasm,
    Native,
}

impl HandlerLanguage {
    pub fn name(&self) -> &'static str {
        match self {
            HandlerLanguage::Nim => "nim",
            HandlerLanguage::C => "c",
            HandlerLanguage::Lua => "lua",
            HandlerLanguage::Wasm => "wasm",
            HandlerLanguage::Native => "native",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "nim" => HandlerLanguage::Nim,
            "c" => HandlerLanguage::C,
            "lua" => HandlerLanguage::Lua,
            "wasm" => HandlerLanguage::Wasm,
            "native" => HandlerLanguage::Native,
            _ => return None,
        })
    }
}

/// Verbatim handler source carried for round-trip; execution is external.
#[derive(Clone, Debug, PartialEq)]
pub struct InlineHandler {
    pub language: HandlerLanguage,
    pub code: String,
    /// Captured variable names, if the authoring language declares them.
    pub captures: Vec<String>,
}

/// A single event binding.
#[derive(Clone, Debug, PartialEq)]
pub struct EventBinding {
    pub kind: EventKind,
    /// Logic identifier resolved against compiled handlers at dispatch time.
    pub logic: String,
    pub inline: Option<InlineHandler>,
}

bitflags! {
    /// Per-phase recomputation markers.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct DirtyFlags: u8 {
        const STYLE = 1 << 0;
        const LAYOUT = 1 << 1;
        const CHILDREN = 1 << 2;
        const CONTENT = 1 << 3;
        /// Some descendant needs layout.
        const SUBTREE = 1 << 4;
        /// Visual-only change; does not propagate upward.
        const RENDER = 1 << 5;
    }
}

/// Sentinel marking an intrinsic dimension as not cached.
pub const INTRINSIC_UNCACHED: f32 = -1.0;

/// Cached intrinsic measurements. A negative cached value means
/// "not cached"; zero is a valid cached measurement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutCache {
    pub intrinsic_width: f32,
    pub intrinsic_height: f32,
    pub dirty: bool,
    pub generation: u32,
}

impl Default for LayoutCache {
    fn default() -> Self {
        Self {
            intrinsic_width: INTRINSIC_UNCACHED,
            intrinsic_height: INTRINSIC_UNCACHED,
            dirty: true,
            generation: 0,
        }
    }
}

impl LayoutCache {
    /// Drop both cached dimensions and mark the cache dirty.
    pub fn invalidate(&mut self) {
        self.dirty = true;
        self.intrinsic_width = INTRINSIC_UNCACHED;
        self.intrinsic_height = INTRINSIC_UNCACHED;
    }
}

/// Pixel bounds produced by the layout engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RenderedBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub valid: bool,
}

/// A node in the UI tree. Owned by the tree arena; related nodes are
/// addressed by [`NodeKey`] handles, never by references.
#[derive(Clone, Debug)]
pub struct Component {
    pub id: ComponentId,
    pub kind: ComponentKind,
    /// Authoring tag / CSS class hook.
    pub tag: Option<String>,
    pub text_content: Option<String>,
    pub custom_data: Option<CustomData>,
    pub style: Option<Box<Style>>,
    pub layout: Option<Box<LayoutSpec>>,
    pub events: SmallVec<[EventBinding; 2]>,
    pub children: Vec<NodeKey>,
    /// Back-reference for traversal only; the arena owns the node.
    pub parent: Option<NodeKey>,
    pub bounds: RenderedBounds,
    pub layout_cache: LayoutCache,
    pub dirty: DirtyFlags,
    /// Pruning hint for animation traversal.
    pub has_active_animations: bool,
    /// Set on template copies produced by ForEach expansion.
    pub iteration_index: Option<u32>,
}

impl Component {
    pub fn new(id: ComponentId, kind: ComponentKind) -> Self {
        Self {
            id,
            kind,
            tag: None,
            text_content: None,
            custom_data: None,
            style: None,
            layout: None,
            events: SmallVec::new(),
            children: Vec::new(),
            parent: None,
            bounds: RenderedBounds::default(),
            layout_cache: LayoutCache::default(),
            dirty: DirtyFlags::LAYOUT,
            has_active_animations: false,
            iteration_index: None,
        }
    }

    /// Style record, default when absent.
    pub fn style_or_default(&self) -> Style {
        self.style.as_deref().cloned().unwrap_or_default()
    }

    /// Ensure a style record exists and return it mutably.
    pub fn style_mut(&mut self) -> &mut Style {
        self.style.get_or_insert_with(Default::default)
    }

    /// Ensure a layout spec exists and return it mutably.
    pub fn layout_mut(&mut self) -> &mut LayoutSpec {
        self.layout.get_or_insert_with(Default::default)
    }

    /// Whether this component participates in layout. Hidden components
    /// are skipped by the solvers.
    pub fn is_visible(&self) -> bool {
        self.style.as_ref().map_or(true, |s| s.visible)
    }

    /// Font size in effect, from typography or the 16px default.
    pub fn font_size(&self) -> f32 {
        self.style.as_ref().map_or(16.0, |s| s.typography.size)
    }
}
