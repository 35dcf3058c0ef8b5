//! Extension variants and the link edges between them.
//!
//! Every item type pairs with one extension variant. A variant declares:
//!
//! - a whitelist of scalar fields a publish payload may patch,
//! - optionally a unique key used to match an existing item on publish,
//! - its outgoing **direct links** (a field holding another extension's id),
//! - its outgoing **child links** (a child table whose rows each hold another
//!   extension's id plus row-local attributes).
//!
//! The link declarations double as the edge schema of the dependency graph:
//! [`edges_from`] drives forward traversal and [`edges_into`] drives reverse
//! (parent) lookups, so the shape of the graph is written down exactly once.

use serde_json::{Map, Value};

use crate::item::ItemType;

/// Table holding catalog items.
pub const ITEM_TABLE: &str = "registry_item";
/// Side table holding `(item, tag)` rows.
pub const TAG_TABLE: &str = "registry_tag";

/// Item field holding the paired extension id.
pub const EXTENSION_REF_FIELD: &str = "extension_ref";
/// Extension field holding the owning item id. Tag rows use it too.
pub const OWNER_FIELD: &str = "item";
/// Tag row field holding the tag text.
pub const TAG_FIELD: &str = "tag";
/// Child row field holding the owning extension id.
pub const PARENT_FIELD: &str = "parent";
/// Child row field naming the extension field the row belongs to.
pub const PARENT_FIELD_NAME: &str = "parent_field";
/// Child row position within its parent field.
pub const IDX_FIELD: &str = "idx";

/// Bookkeeping stripped from extension records before they leave the core.
pub const RECORD_BOOKKEEPING: &[&str] = &["id", "created", "modified", OWNER_FIELD];
/// Bookkeeping stripped from child rows before they leave the core.
pub const ROW_BOOKKEEPING: &[&str] = &[
    "id",
    "created",
    "modified",
    PARENT_FIELD,
    PARENT_FIELD_NAME,
    IDX_FIELD,
];

/// A scalar field holding the id of another extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectLink {
    /// Field on the source extension
    pub field: &'static str,
    /// Payload key carrying the target's public slug on publish
    pub slug_key: &'static str,
    /// Variant the link points at
    pub target: ItemType,
}

/// Default value for a row attribute absent from the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeDefault {
    Bool(bool),
    Str(&'static str),
}

impl AttributeDefault {
    pub fn to_value(self) -> Value {
        match self {
            AttributeDefault::Bool(b) => Value::Bool(b),
            AttributeDefault::Str(s) => Value::String(s.to_string()),
        }
    }
}

/// A row-local attribute of a child link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowAttribute {
    pub name: &'static str,
    pub default: AttributeDefault,
}

/// A child table whose rows each link to another extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildLink {
    /// Field on the source extension exposing the rows
    pub field: &'static str,
    /// Table holding the rows
    pub table: &'static str,
    /// Row field holding the target extension id
    pub link: &'static str,
    /// Row payload key carrying the target's public slug on publish
    pub slug_key: &'static str,
    /// Variant the rows point at
    pub target: ItemType,
    /// Row-local attributes copied from the payload
    pub attributes: &'static [RowAttribute],
}

/// How an edge is stored on its source extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkShape {
    Direct(&'static DirectLink),
    Child(&'static ChildLink),
}

/// One edge kind of the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub source: ItemType,
    pub shape: LinkShape,
}

impl Edge {
    pub fn target(&self) -> ItemType {
        match self.shape {
            LinkShape::Direct(link) => link.target,
            LinkShape::Child(link) => link.target,
        }
    }
}

/// Per-type extension schema.
pub trait ExtensionVariant: Send + Sync {
    /// The item type this variant belongs to.
    fn item_type(&self) -> ItemType;

    /// Table holding records of this variant.
    fn table(&self) -> &'static str;

    /// Scalar fields a publish payload may set.
    fn scalar_fields(&self) -> &'static [&'static str];

    /// Field whose value identifies an existing extension on publish.
    fn unique_key(&self) -> Option<&'static str> {
        None
    }

    fn direct_links(&self) -> &'static [DirectLink] {
        &[]
    }

    fn child_links(&self) -> &'static [ChildLink] {
        &[]
    }

    /// The whitelisted scalars present (and non-null) in `payload`.
    ///
    /// Absent fields are left out, so applying the patch leaves them
    /// untouched on the stored record.
    fn scalar_patch(&self, payload: &Map<String, Value>) -> Map<String, Value> {
        self.scalar_fields()
            .iter()
            .filter_map(|field| {
                payload
                    .get(*field)
                    .filter(|v| !v.is_null())
                    .map(|v| (field.to_string(), v.clone()))
            })
            .collect()
    }
}

struct AgentExtension;
struct ToolExtension;
struct SkillExtension;
struct UiExtension;
struct LogicExtension;

static AGENT_DIRECT_LINKS: [DirectLink; 2] = [
    DirectLink {
        field: "ui",
        slug_key: "ui_slug",
        target: ItemType::Ui,
    },
    DirectLink {
        field: "logic",
        slug_key: "logic_slug",
        target: ItemType::Logic,
    },
];

static AGENT_CHILD_LINKS: [ChildLink; 2] = [
    ChildLink {
        field: "agent_tools",
        table: "agent_tool",
        link: "tool",
        slug_key: "tool_slug",
        target: ItemType::Tool,
        attributes: &[RowAttribute {
            name: "enabled",
            default: AttributeDefault::Bool(true),
        }],
    },
    ChildLink {
        field: "agent_skills",
        table: "agent_skill",
        link: "skill",
        slug_key: "skill_slug",
        target: ItemType::Skill,
        attributes: &[
            RowAttribute {
                name: "activation",
                default: AttributeDefault::Str("core"),
            },
            RowAttribute {
                name: "enabled",
                default: AttributeDefault::Bool(true),
            },
        ],
    },
];

impl ExtensionVariant for AgentExtension {
    fn item_type(&self) -> ItemType {
        ItemType::Agent
    }

    fn table(&self) -> &'static str {
        "agent_extension"
    }

    fn scalar_fields(&self) -> &'static [&'static str] {
        &[
            "is_system",
            "model",
            "selectable_models",
            "failover_chain",
            "temperature",
            "max_turns",
            "thinking_mode",
            "thinking_budget",
        ]
    }

    fn direct_links(&self) -> &'static [DirectLink] {
        &AGENT_DIRECT_LINKS
    }

    fn child_links(&self) -> &'static [ChildLink] {
        &AGENT_CHILD_LINKS
    }
}

impl ExtensionVariant for ToolExtension {
    fn item_type(&self) -> ItemType {
        ItemType::Tool
    }

    fn table(&self) -> &'static str {
        "tool_extension"
    }

    fn scalar_fields(&self) -> &'static [&'static str] {
        &[
            "tool_name",
            "tool_class",
            "description",
            "instructions",
            "handler_path",
            "handler_source",
            "parameters_schema",
            "requires_config",
        ]
    }

    fn unique_key(&self) -> Option<&'static str> {
        Some("tool_name")
    }
}

impl ExtensionVariant for SkillExtension {
    fn item_type(&self) -> ItemType {
        ItemType::Skill
    }

    fn table(&self) -> &'static str {
        "skill_extension"
    }

    fn scalar_fields(&self) -> &'static [&'static str] {
        &["skill_type", "skill_content"]
    }
}

impl ExtensionVariant for UiExtension {
    fn item_type(&self) -> ItemType {
        ItemType::Ui
    }

    fn table(&self) -> &'static str {
        "ui_extension"
    }

    fn scalar_fields(&self) -> &'static [&'static str] {
        &[
            "ui_mode",
            "framework",
            "route",
            "source_path",
            "source_url",
            "source_ref",
        ]
    }
}

impl ExtensionVariant for LogicExtension {
    fn item_type(&self) -> ItemType {
        ItemType::Logic
    }

    fn table(&self) -> &'static str {
        "logic_extension"
    }

    fn scalar_fields(&self) -> &'static [&'static str] {
        &[
            "module_name",
            "tier",
            "logic_doctypes",
            "source_path",
            "source_url",
            "source_ref",
        ]
    }
}

static AGENT: AgentExtension = AgentExtension;
static TOOL: ToolExtension = ToolExtension;
static SKILL: SkillExtension = SkillExtension;
static UI: UiExtension = UiExtension;
static LOGIC: LogicExtension = LogicExtension;

/// The extension variant paired with an item type.
pub fn variant(item_type: ItemType) -> &'static dyn ExtensionVariant {
    match item_type {
        ItemType::Agent => &AGENT,
        ItemType::Tool => &TOOL,
        ItemType::Skill => &SKILL,
        ItemType::Ui => &UI,
        ItemType::Logic => &LOGIC,
    }
}

/// Outgoing edges of one variant: direct links first, then child links.
pub fn edges_from(source: ItemType) -> impl Iterator<Item = Edge> {
    let v = variant(source);
    let direct = v
        .direct_links()
        .iter()
        .map(move |link| Edge {
            source,
            shape: LinkShape::Direct(link),
        });
    let child = v.child_links().iter().map(move |link| Edge {
        source,
        shape: LinkShape::Child(link),
    });
    direct.chain(child)
}

/// Every edge kind in the schema.
pub fn edges() -> impl Iterator<Item = Edge> {
    ItemType::ALL.into_iter().flat_map(edges_from)
}

/// Edge kinds pointing at `target`.
pub fn edges_into(target: ItemType) -> Vec<Edge> {
    edges().filter(|e| e.target() == target).collect()
}
