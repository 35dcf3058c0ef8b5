//! Publish: create-or-update of an item and its extension
//!
//! A request either names the item to update by slug, or leaves the choice
//! to the configured [`UpsertMatcher`] chain. When no matcher claims an
//! existing item a new one is created. In every case the request's extension
//! payload is then applied with patch semantics.

use std::fmt;

use registry_meta::schema::{OWNER_FIELD, variant};
use registry_meta::{Item, ItemType, PublishConfig, TrustStatus};
use registry_store::{EntityStore, Filter};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::{self, NewItem};
use crate::extension::link_value;
use crate::populate::populate_extension;
use crate::{Error, Result};

/// Incoming publish payload.
///
/// Every field is optional on the wire; `item_type` and `title` are checked
/// at publish time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishRequest {
    #[serde(default)]
    pub item_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// Slug of the item to update; absent to create or upsert
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Extension fields, as a JSON object
    #[serde(default)]
    pub extension: Option<Value>,
}

impl PublishRequest {
    pub fn new(item_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            item_type: Some(item_type.into()),
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Decode a request from a JSON payload.
    pub fn from_json(payload: Value) -> Result<Self> {
        Ok(serde_json::from_value(payload)?)
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_extension(mut self, extension: Value) -> Self {
        self.extension = Some(extension);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishAction {
    Created,
    Updated,
}

impl fmt::Display for PublishAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishAction::Created => f.write_str("created"),
            PublishAction::Updated => f.write_str("updated"),
        }
    }
}

/// Result of a publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub slug: String,
    pub extension_ref: Option<String>,
    pub action: PublishAction,
}

/// Strategy for finding the item a slug-less publish should update.
pub trait UpsertMatcher: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// The existing item this publish targets, if any.
    fn find_existing(
        &self,
        store: &dyn EntityStore,
        item_type: ItemType,
        title: &str,
        extension: &Map<String, Value>,
    ) -> Result<Option<Item>>;
}

/// Matches an item with the same title and type.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleMatcher;

impl UpsertMatcher for TitleMatcher {
    fn name(&self) -> &'static str {
        "title"
    }

    fn find_existing(
        &self,
        store: &dyn EntityStore,
        item_type: ItemType,
        title: &str,
        _extension: &Map<String, Value>,
    ) -> Result<Option<Item>> {
        catalog::find_item(
            store,
            &Filter::new()
                .eq("title", title)
                .eq("item_type", item_type.as_str()),
        )
    }
}

/// Matches on the variant's unique extension key (`tool_name` for tools).
#[derive(Debug, Clone, Copy, Default)]
pub struct UniqueKeyMatcher;

impl UpsertMatcher for UniqueKeyMatcher {
    fn name(&self) -> &'static str {
        "unique-key"
    }

    fn find_existing(
        &self,
        store: &dyn EntityStore,
        item_type: ItemType,
        _title: &str,
        extension: &Map<String, Value>,
    ) -> Result<Option<Item>> {
        let v = variant(item_type);
        let Some(key) = v.unique_key() else {
            return Ok(None);
        };
        let Some(value) = extension.get(key).filter(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }) else {
            return Ok(None);
        };

        let Some(record) = store.find(v.table(), &Filter::new().eq(key, value.clone()))? else {
            return Ok(None);
        };
        let Some(owner) = link_value(&record, OWNER_FIELD) else {
            return Ok(None);
        };
        Ok(catalog::get_item(store, owner)?.filter(|item| item.item_type == item_type))
    }
}

/// Runs publish requests against a store.
pub struct Publisher {
    matchers: Vec<Box<dyn UpsertMatcher>>,
    default_trust_status: TrustStatus,
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(&PublishConfig::default())
    }
}

impl fmt::Debug for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field(
                "matchers",
                &self.matchers.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("default_trust_status", &self.default_trust_status)
            .finish()
    }
}

impl Publisher {
    /// Publisher with the default matcher chain: title, then unique key.
    pub fn new(config: &PublishConfig) -> Self {
        Self {
            matchers: vec![Box::new(TitleMatcher), Box::new(UniqueKeyMatcher)],
            default_trust_status: config.default_trust_status,
        }
    }

    /// Replace the matcher chain. Matchers run in order; the first hit wins.
    pub fn with_matchers(mut self, matchers: Vec<Box<dyn UpsertMatcher>>) -> Self {
        self.matchers = matchers;
        self
    }

    pub fn default_trust_status(&self) -> TrustStatus {
        self.default_trust_status
    }

    /// Create or update an item from `request`.
    ///
    /// # Errors
    ///
    /// - `Validation` for a missing title, a missing or unknown item type,
    ///   a non-object extension, or a slug naming an item of another type
    /// - `NotFound` when `slug` names no item
    pub fn publish(&self, store: &dyn EntityStore, request: PublishRequest) -> Result<PublishOutcome> {
        let (Some(item_type), Some(title)) = (
            non_empty(request.item_type.as_deref()),
            non_empty(request.title.as_deref()),
        ) else {
            return Err(Error::Validation("item_type and title are required".to_string()));
        };
        let item_type: ItemType = item_type
            .parse()
            .map_err(|_| Error::Validation(format!("Invalid item_type: {item_type}")))?;
        let title = title.to_string();

        let extension = match request.extension.clone() {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(Error::Validation("extension must be an object".to_string()));
            }
        };

        let (item, action) = match non_empty(request.slug.as_deref()) {
            Some(slug) => {
                let mut item = catalog::require_by_slug(store, slug)?;
                if item.item_type != item_type {
                    return Err(Error::Validation(format!(
                        "Registry item '{slug}' is a {}, not a {item_type}",
                        item.item_type
                    )));
                }
                apply_update(store, &mut item, &title, &request)?;
                (item, PublishAction::Updated)
            }
            None => match self.find_existing(store, item_type, &title, &extension)? {
                Some(mut item) => {
                    apply_update(store, &mut item, &title, &request)?;
                    (item, PublishAction::Updated)
                }
                None => {
                    let mut new = NewItem::new(title, item_type)
                        .with_trust_status(self.default_trust_status);
                    if let Some(description) = &request.description {
                        new = new.with_description(description.clone());
                    }
                    if let Some(version) = non_empty(request.version.as_deref()) {
                        new = new.with_version(version);
                    }
                    if let Some(author) = non_empty(request.author.as_deref()) {
                        new = new.with_author(author);
                    }
                    (catalog::create_item(store, new)?, PublishAction::Created)
                }
            },
        };

        match item.extension_ref.as_deref() {
            Some(extension_id) => populate_extension(store, item_type, extension_id, &extension)?,
            None => tracing::warn!(slug = %item.slug, "Published item has no extension record"),
        }

        tracing::info!(slug = %item.slug, %item_type, %action, "Published registry item");
        Ok(PublishOutcome {
            slug: item.slug,
            extension_ref: item.extension_ref,
            action,
        })
    }

    fn find_existing(
        &self,
        store: &dyn EntityStore,
        item_type: ItemType,
        title: &str,
        extension: &Map<String, Value>,
    ) -> Result<Option<Item>> {
        for matcher in &self.matchers {
            if let Some(item) = matcher.find_existing(store, item_type, title, extension)? {
                tracing::debug!(matcher = matcher.name(), slug = %item.slug, "Publish matched existing item");
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

fn apply_update(
    store: &dyn EntityStore,
    item: &mut Item,
    title: &str,
    request: &PublishRequest,
) -> Result<()> {
    item.title = title.to_string();
    if let Some(description) = &request.description {
        item.description = description.clone();
    }
    if let Some(version) = non_empty(request.version.as_deref()) {
        item.version = Some(version.to_string());
    }
    if let Some(author) = non_empty(request.author.as_deref()) {
        item.author = Some(author.to_string());
    }
    catalog::save_item(store, item)
}
