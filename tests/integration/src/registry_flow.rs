//! End-to-end flow across the workspace
//!
//! Exercises config loading -> seeding -> publishing -> install -> snapshot
//! persistence -> cascade delete.

use pretty_assertions::assert_eq;
use registry_core::{Error, PublishAction, PublishRequest, Registry, SearchQuery};
use registry_meta::{ItemType, TrustStatus, load_config};
use registry_store::{EntityStore, Filter};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn write_config(temp: &TempDir, trust: &str) -> std::path::PathBuf {
    let snapshot = temp.path().join("data").join("registry.json");
    let path = temp.path().join("registry.toml");
    fs::write(
        &path,
        format!(
            r#"
[publish]
default_trust_status = "{trust}"

[search]
default_limit = 5

[store]
snapshot_path = "{}"
"#,
            snapshot.display().to_string().replace('\\', "/")
        ),
    )
    .unwrap();
    path
}

fn mail_agent() -> PublishRequest {
    PublishRequest::new("Agent", "Mail Assistant")
        .with_description("Reads and answers mail")
        .with_extension(json!({
            "model": "large",
            "agent_tools": [
                {"tool_slug": "gmail"},
                {"tool_slug": "google-calendar", "enabled": false},
                {"tool_slug": "not-seeded"}
            ]
        }))
}

#[test]
fn test_seed_publish_install_persist() {
    let temp = TempDir::new().unwrap();
    let config = load_config(&write_config(&temp, "approved")).unwrap();
    let registry = Registry::open(config.clone()).unwrap();

    let report = registry.seed_external_tools().unwrap();
    assert_eq!(report.created, 20);

    let outcome = registry.publish(mail_agent()).unwrap();
    assert_eq!(outcome.action, PublishAction::Created);
    assert_eq!(outcome.slug, "mail-assistant");

    let package = registry.build_install_package("mail-assistant").unwrap();
    assert_eq!(
        package.slugs(),
        vec!["gmail", "google-calendar", "mail-assistant"]
    );
    let agent_ext = package.items[2].extension.as_ref().unwrap();
    assert_eq!(agent_ext["agent_tools"][1]["enabled"], json!(false));

    let page = registry.search(&SearchQuery::new()).unwrap();
    assert_eq!(page.limit, 5);
    assert_eq!(page.total, 21);
    assert_eq!(page.items.len(), 5);

    assert!(registry.persist().unwrap());

    let reopened = Registry::open(config).unwrap();
    let detail = reopened.get_item_detail("gmail").unwrap();
    assert_eq!(detail.registry.author.as_deref(), Some("Composio"));
    assert_eq!(detail.parents.unwrap()[0].slug, "mail-assistant");
    assert_eq!(reopened.seed_external_tools().unwrap().created, 0);
}

#[test]
fn test_configured_pending_status_blocks_install() {
    let temp = TempDir::new().unwrap();
    let config = load_config(&write_config(&temp, "pending")).unwrap();
    let registry = Registry::open(config).unwrap();

    registry
        .publish(PublishRequest::new("Tool", "Webhook").with_extension(json!({"tool_name": "webhook"})))
        .unwrap();
    assert!(matches!(
        registry.build_install_package("webhook"),
        Err(Error::Conflict(_))
    ));

    registry
        .set_trust_status("webhook", TrustStatus::Approved)
        .unwrap();
    assert_eq!(
        registry.build_install_package("webhook").unwrap().slugs(),
        vec!["webhook"]
    );
}

#[test]
fn test_delete_cascades_through_the_store() {
    let registry = Registry::new(registry_store::MemoryStore::new());
    registry.seed_external_tools().unwrap();
    registry.publish(mail_agent()).unwrap();
    registry.add_tag("mail-assistant", "email").unwrap();
    let agent = registry.item_by_slug("mail-assistant").unwrap();

    registry.delete_item("mail-assistant").unwrap();

    let store = registry.store();
    let no_rows = Filter::new().eq("parent", agent.extension_ref.clone().unwrap());
    assert_eq!(store.count("agent_tool", &no_rows).unwrap(), 0);
    assert_eq!(
        store
            .count("registry_tag", &Filter::new().eq("item", agent.id.as_str()))
            .unwrap(),
        0
    );
    assert!(
        store
            .get("agent_extension", agent.extension_ref.as_deref().unwrap())
            .unwrap()
            .is_none()
    );

    // Dependencies survive their dependent
    assert_eq!(
        registry.item_by_slug("gmail").unwrap().item_type,
        ItemType::Tool
    );
    assert!(registry.get_item_detail("gmail").unwrap().parents.is_none());
}
