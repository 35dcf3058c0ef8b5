//! Install package assembly
//!
//! A package is the root item plus its dependency closure, each with its
//! extension rendered in slug form, sorted so dependencies install before
//! the items that use them.

use registry_meta::schema::{LinkShape, RECORD_BOOKKEEPING, ROW_BOOKKEEPING, edges_from};
use registry_meta::{ItemType, TrustStatus};
use registry_store::{EntityStore, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::extension::{self, ExtensionDoc, link_value};
use crate::{Error, Result, catalog, dependency, reference};

/// One item of an install package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageItem {
    pub item_type: ItemType,
    pub title: String,
    pub slug: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<Record>,
}

/// Items to install, in install order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstallPackage {
    pub items: Vec<PackageItem>,
}

impl InstallPackage {
    pub fn slugs(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.slug.as_str()).collect()
    }
}

/// Assemble the install package for the item with `slug`.
///
/// # Errors
///
/// - `Validation` for an empty slug
/// - `NotFound` for an unknown slug
/// - `Conflict` when the root item is not approved
pub fn build_install_package(store: &dyn EntityStore, slug: &str) -> Result<InstallPackage> {
    let root = catalog::require_by_slug(store, slug)?;
    if root.trust_status != TrustStatus::Approved {
        return Err(Error::Conflict(format!(
            "Registry item '{slug}' is not approved for installation"
        )));
    }

    let graph = dependency::collect_dependencies(store, &root.id)?;

    let mut items = Vec::with_capacity(graph.node_count());
    for node in graph.nodes() {
        let Some(item) = catalog::lookup_item(store, &node.id)? else {
            continue;
        };
        let extension = match item.extension_ref.as_deref() {
            Some(extension_id) => extension::load(store, item.item_type, extension_id)?
                .map(|doc| package_extension(store, &doc))
                .transpose()?,
            None => None,
        };
        items.push(PackageItem {
            item_type: item.item_type,
            title: item.title,
            slug: item.slug,
            description: item.description,
            extension,
        });
    }

    // Stable: items of equal priority keep first-visit order.
    items.sort_by_key(|i| i.item_type.install_priority());

    tracing::debug!(slug, items = items.len(), "Assembled install package");
    Ok(InstallPackage { items })
}

/// Extension payload with links rewritten to slugs.
///
/// Unresolved links keep their raw value.
fn package_extension(store: &dyn EntityStore, doc: &ExtensionDoc) -> Result<Record> {
    let mut out = extension::strip(&doc.fields, RECORD_BOOKKEEPING);

    for edge in edges_from(doc.item_type) {
        match edge.shape {
            LinkShape::Direct(link) => {
                if let Some(slug) = slug_for(store, link.target, link_value(&out, link.field))? {
                    out.insert(link.field.to_string(), Value::String(slug));
                }
            }
            LinkShape::Child(link) => {
                let mut rows = Vec::new();
                for row in doc.rows(link) {
                    let mut row = extension::strip(row, ROW_BOOKKEEPING);
                    if let Some(slug) = slug_for(store, link.target, link_value(&row, link.link))? {
                        row.insert(link.link.to_string(), Value::String(slug));
                    }
                    rows.push(Value::Object(row));
                }
                out.insert(link.field.to_string(), Value::Array(rows));
            }
        }
    }

    Ok(out)
}

fn slug_for(store: &dyn EntityStore, target: ItemType, id: Option<&str>) -> Result<Option<String>> {
    match id {
        Some(id) => reference::to_slug(store, target, id),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NewItem, create_item, delete_item};
    use crate::populate::populate_extension;
    use pretty_assertions::assert_eq;
    use registry_store::MemoryStore;
    use serde_json::json;

    fn approved(store: &MemoryStore, title: &str, item_type: ItemType) -> registry_meta::Item {
        create_item(
            store,
            NewItem::new(title, item_type).with_trust_status(TrustStatus::Approved),
        )
        .unwrap()
    }

    fn populate(store: &MemoryStore, item: &registry_meta::Item, payload: Value) {
        let Value::Object(map) = payload else {
            unreachable!()
        };
        populate_extension(
            store,
            item.item_type,
            item.extension_ref.as_deref().unwrap(),
            &map,
        )
        .unwrap();
    }

    #[test]
    fn test_pending_root_is_a_conflict() {
        let store = MemoryStore::new();
        create_item(&store, NewItem::new("Draft", ItemType::Tool)).unwrap();

        let err = build_install_package(&store, "draft").unwrap_err();
        assert!(matches!(err, Error::Conflict(ref m) if m.contains("not approved")));
    }

    #[test]
    fn test_unknown_slug_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            build_install_package(&store, "ghost"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_links_render_as_slugs_and_agent_sorts_last() {
        let store = MemoryStore::new();
        let tool = approved(&store, "Gmail", ItemType::Tool);
        populate(&store, &tool, json!({"tool_name": "gmail"}));
        approved(&store, "Inbox", ItemType::Ui);
        approved(&store, "Triage", ItemType::Skill);
        let agent = approved(&store, "Gmail Agent", ItemType::Agent);
        populate(
            &store,
            &agent,
            json!({
                "model": "large",
                "ui_slug": "inbox",
                "agent_tools": [{"tool_slug": "gmail"}],
                "agent_skills": [{"skill_slug": "triage"}]
            }),
        );

        let package = build_install_package(&store, "gmail-agent").unwrap();
        assert_eq!(package.slugs(), vec!["triage", "gmail", "inbox", "gmail-agent"]);

        let ext = package.items[3].extension.as_ref().unwrap();
        assert_eq!(ext["ui"], json!("inbox"));
        assert_eq!(ext["agent_tools"], json!([{"tool": "gmail", "enabled": true}]));
        assert_eq!(
            ext["agent_skills"],
            json!([{"skill": "triage", "activation": "core", "enabled": true}])
        );
        assert!(!ext.contains_key("item"));
        assert!(!ext.contains_key("id"));

        let tool_ext = package.items[1].extension.as_ref().unwrap();
        assert_eq!(tool_ext["tool_name"], json!("gmail"));
    }

    #[test]
    fn test_dangling_link_keeps_raw_value() {
        let store = MemoryStore::new();
        let ui = approved(&store, "Inbox", ItemType::Ui);
        let agent = approved(&store, "Agent", ItemType::Agent);
        populate(&store, &agent, json!({"ui_slug": "inbox"}));
        let ui_ext = ui.extension_ref.clone().unwrap();
        delete_item(&store, &ui.id).unwrap();

        let package = build_install_package(&store, "agent").unwrap();
        assert_eq!(package.slugs(), vec!["agent"]);
        let ext = package.items[0].extension.as_ref().unwrap();
        assert_eq!(ext["ui"], json!(ui_ext));
    }
}
