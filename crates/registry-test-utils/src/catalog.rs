//! [`TestCatalog`] builder for registry test scenarios.

use registry_core::{NewItem, PublishOutcome, PublishRequest, Registry};
use registry_meta::{Item, ItemType, TrustStatus};
use registry_store::MemoryStore;
use serde_json::{Value, json};

/// An in-memory registry with helpers that publish linked items.
///
/// Every helper panics on failure, so a broken fixture fails the test that
/// built it.
///
/// # Example
///
/// ```
/// use registry_test_utils::TestCatalog;
///
/// let catalog = TestCatalog::new();
/// catalog.tool("Gmail", "gmail");
/// let agent = catalog.agent("Mail Agent", None, None, &["gmail"], &[]);
/// assert_eq!(agent, "mail-agent");
/// ```
pub struct TestCatalog {
    registry: Registry<MemoryStore>,
}

impl Default for TestCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCatalog {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(MemoryStore::new()),
        }
    }

    /// The `gmail-agent` catalog: an agent wired to two tools, two skills,
    /// a UI and a logic module. The agent itself is left pending.
    pub fn gmail_agent() -> Self {
        let catalog = Self::new();
        catalog.skill("Email Triage");
        catalog.tool("Gmail", "gmail");
        catalog.ui("Inbox View");
        catalog.skill("Reply Drafting");
        catalog.logic("Mail Rules");
        catalog.tool("Google Calendar", "googlecalendar");
        catalog.agent(
            "Gmail Agent",
            Some("inbox-view"),
            Some("mail-rules"),
            &["gmail", "google-calendar"],
            &["email-triage", "reply-drafting"],
        );
        catalog.set_trust_status("gmail-agent", TrustStatus::Pending);
        catalog
    }

    pub fn registry(&self) -> &Registry<MemoryStore> {
        &self.registry
    }

    pub fn store(&self) -> &MemoryStore {
        self.registry.store()
    }

    /// Publish an item and return the outcome.
    pub fn publish(&self, item_type: &str, title: &str, extension: Value) -> PublishOutcome {
        self.registry
            .publish(PublishRequest::new(item_type, title).with_extension(extension))
            .unwrap_or_else(|e| panic!("TestCatalog::publish({item_type}, {title}): {e}"))
    }

    /// Publish a tool and return its slug.
    pub fn tool(&self, title: &str, tool_name: &str) -> String {
        self.publish("Tool", title, json!({"tool_name": tool_name}))
            .slug
    }

    pub fn skill(&self, title: &str) -> String {
        self.publish("Skill", title, json!({"skill_type": "prompt"}))
            .slug
    }

    pub fn ui(&self, title: &str) -> String {
        self.publish("UI", title, json!({"ui_mode": "panel"})).slug
    }

    pub fn logic(&self, title: &str) -> String {
        self.publish("Logic", title, json!({"module_name": title.to_lowercase()}))
            .slug
    }

    /// Publish an agent linked to the given slugs and return its slug.
    pub fn agent(
        &self,
        title: &str,
        ui: Option<&str>,
        logic: Option<&str>,
        tools: &[&str],
        skills: &[&str],
    ) -> String {
        let mut extension = json!({
            "model": "default",
            "agent_tools": tools.iter().map(|t| json!({"tool_slug": t})).collect::<Vec<_>>(),
            "agent_skills": skills.iter().map(|s| json!({"skill_slug": s})).collect::<Vec<_>>(),
        });
        if let Some(ui) = ui {
            extension["ui_slug"] = json!(ui);
        }
        if let Some(logic) = logic {
            extension["logic_slug"] = json!(logic);
        }
        self.publish("Agent", title, extension).slug
    }

    /// Create an item directly, bypassing publish.
    pub fn create(&self, new: NewItem) -> Item {
        self.registry
            .create_item(new)
            .unwrap_or_else(|e| panic!("TestCatalog::create: {e}"))
    }

    pub fn item(&self, slug: &str) -> Item {
        self.registry
            .item_by_slug(slug)
            .unwrap_or_else(|e| panic!("TestCatalog::item({slug}): {e}"))
    }

    pub fn extension_ref(&self, slug: &str) -> String {
        self.item(slug)
            .extension_ref
            .unwrap_or_else(|| panic!("item '{slug}' has no extension"))
    }

    pub fn set_trust_status(&self, slug: &str, trust_status: TrustStatus) {
        self.registry
            .set_trust_status(slug, trust_status)
            .unwrap_or_else(|e| panic!("TestCatalog::set_trust_status({slug}): {e}"));
    }

    pub fn delete(&self, slug: &str) {
        self.registry
            .delete_item(slug)
            .unwrap_or_else(|e| panic!("TestCatalog::delete({slug}): {e}"));
    }

    /// Slugs of every item of `item_type`, in creation order.
    pub fn slugs_of(&self, item_type: ItemType) -> Vec<String> {
        registry_core::catalog::list_items(
            self.store(),
            &registry_store::Filter::new().eq("item_type", item_type.as_str()),
        )
        .unwrap_or_else(|e| panic!("TestCatalog::slugs_of: {e}"))
        .into_iter()
        .map(|item| item.slug)
        .collect()
    }
}
