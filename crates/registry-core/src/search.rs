//! Catalog search and browse
//!
//! Ranking lives outside the core, behind [`SearchBackend`]. A text query is
//! tried against the semantic backend first, then the fulltext backend, and
//! when the fulltext backend fails the core falls back to a substring scan
//! of the store. Browsing without a query always scans the store.

use std::cmp::Ordering;

use registry_meta::schema::ITEM_TABLE;
use registry_meta::{Item, ItemType, SearchConfig, SortOrder, TrustStatus};
use registry_store::{EntityStore, Filter};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, catalog};

/// Exact-match filters shared by every search path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    pub item_type: Option<ItemType>,
    pub category: Option<String>,
    pub trust_status: Option<TrustStatus>,
    pub featured_only: bool,
}

impl SearchFilters {
    /// The filters as a store filter.
    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(trust_status) = self.trust_status {
            filter = filter.eq("trust_status", trust_status.as_str());
        }
        if let Some(item_type) = self.item_type {
            filter = filter.eq("item_type", item_type.as_str());
        }
        if let Some(category) = &self.category {
            filter = filter.eq("category", category.as_str());
        }
        if self.featured_only {
            filter = filter.eq("featured", true);
        }
        filter
    }
}

/// A search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchQuery {
    /// Free-text query
    pub q: Option<String>,
    pub item_type: Option<ItemType>,
    pub category: Option<String>,
    /// Comma separated; every tag must be present
    pub tags: Option<String>,
    /// `None` searches every trust state
    pub trust_status: Option<TrustStatus>,
    pub featured_only: bool,
    /// Sort key; unknown keys fall back to `featured`
    pub sort_by: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            q: None,
            item_type: None,
            category: None,
            tags: None,
            trust_status: Some(TrustStatus::Approved),
            featured_only: false,
            sort_by: None,
            limit: None,
            offset: 0,
        }
    }
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }

    pub fn with_item_type(mut self, item_type: ItemType) -> Self {
        self.item_type = Some(item_type);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn with_trust_status(mut self, trust_status: Option<TrustStatus>) -> Self {
        self.trust_status = trust_status;
        self
    }

    pub fn featured_only(mut self) -> Self {
        self.featured_only = true;
        self
    }

    pub fn sorted_by(mut self, sort_by: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn filters(&self) -> SearchFilters {
        SearchFilters {
            item_type: self.item_type,
            category: self.category.clone(),
            trust_status: self.trust_status,
            featured_only: self.featured_only,
        }
    }

    /// Requested tags, trimmed and lowercased.
    pub fn tag_list(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Ranked lookup service behind text queries.
pub trait SearchBackend: Send + Sync {
    /// Embedding search. `Ok(None)` means the service is unavailable.
    fn semantic_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        limit: usize,
    ) -> Result<Option<Vec<Item>>>;

    /// Fulltext search returning one page and the total match count.
    fn fulltext_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        sort: SortOrder,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Item>, usize)>;
}

/// Backend for deployments without a search service.
///
/// Semantic search is unavailable and fulltext search always fails, so text
/// queries are answered by the store scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSearchBackend;

impl SearchBackend for NoSearchBackend {
    fn semantic_search(&self, _: &str, _: &SearchFilters, _: usize) -> Result<Option<Vec<Item>>> {
        Ok(None)
    }

    fn fulltext_search(
        &self,
        _: &str,
        _: &SearchFilters,
        _: SortOrder,
        _: usize,
        _: usize,
    ) -> Result<(Vec<Item>, usize)> {
        Err(Error::Search("no fulltext index configured".to_string()))
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub slug: String,
    pub title: String,
    pub item_type: ItemType,
    pub category: Option<String>,
    pub description: String,
    pub trust_status: TrustStatus,
    pub featured: bool,
    pub author: Option<String>,
    pub install_count: u64,
    pub image: Option<String>,
    pub tags: Vec<String>,
}

impl ItemSummary {
    fn new(item: Item, tags: Vec<String>) -> Self {
        Self {
            slug: item.slug,
            title: item.title,
            item_type: item.item_type,
            category: item.category,
            description: item.description,
            trust_status: item.trust_status,
            featured: item.featured,
            author: item.author,
            install_count: item.install_count,
            image: item.image,
            tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub items: Vec<ItemSummary>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Run a search.
pub fn search(
    store: &dyn EntityStore,
    backend: &dyn SearchBackend,
    config: &SearchConfig,
    query: &SearchQuery,
) -> Result<SearchResults> {
    let limit = query.limit.unwrap_or(config.default_limit).min(config.max_limit);
    let offset = query.offset;
    let sort = query
        .sort_by
        .as_deref()
        .map(SortOrder::parse_lenient)
        .unwrap_or(config.default_sort);
    let filters = query.filters();
    let tags = query.tag_list();
    let text = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let (items, total) = match text {
        Some(text) => match backend.semantic_search(text, &filters, limit)? {
            Some(hits) => {
                let hits = with_tags(store, hits, &tags)?;
                let total = hits.len();
                (hits, total)
            }
            None => match backend.fulltext_search(text, &filters, sort, limit, offset) {
                Ok((hits, total)) if tags.is_empty() => (with_tags(store, hits, &tags)?, total),
                Ok((hits, _)) => {
                    let hits = with_tags(store, hits, &tags)?;
                    let total = hits.len();
                    (hits, total)
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Fulltext search failed, scanning the store");
                    scan(store, &filters, Some(text), &tags, sort, limit, offset)?
                }
            },
        },
        None => scan(store, &filters, None, &tags, sort, limit, offset)?,
    };

    Ok(SearchResults {
        items: items
            .into_iter()
            .map(|(item, tags)| ItemSummary::new(item, tags))
            .collect(),
        total,
        limit,
        offset,
    })
}

type Tagged = (Item, Vec<String>);

/// Attach tags to backend hits, keeping those that carry every wanted tag.
fn with_tags(store: &dyn EntityStore, items: Vec<Item>, wanted: &[String]) -> Result<Vec<Tagged>> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let tags = catalog::tags_for(store, &item.id)?;
        if has_all_tags(&tags, wanted) {
            out.push((item, tags));
        }
    }
    Ok(out)
}

fn has_all_tags(tags: &[String], wanted: &[String]) -> bool {
    wanted
        .iter()
        .all(|w| tags.iter().any(|t| t.to_lowercase() == *w))
}

/// Substring match over title, description and tags.
fn matches_text(item: &Item, tags: &[String], needle: &str) -> bool {
    let needle = needle.to_lowercase();
    item.title.to_lowercase().contains(&needle)
        || item.description.to_lowercase().contains(&needle)
        || tags.iter().any(|t| t.to_lowercase().contains(&needle))
}

fn scan(
    store: &dyn EntityStore,
    filters: &SearchFilters,
    text: Option<&str>,
    wanted: &[String],
    sort: SortOrder,
    limit: usize,
    offset: usize,
) -> Result<(Vec<Tagged>, usize)> {
    let mut hits = Vec::new();
    for item in catalog::list_items(store, &filters.to_filter())? {
        let tags = catalog::tags_for(store, &item.id)?;
        if !has_all_tags(&tags, wanted) {
            continue;
        }
        if text.is_some_and(|t| !matches_text(&item, &tags, t)) {
            continue;
        }
        hits.push((item, tags));
    }

    hits.sort_by(|(a, _), (b, _)| compare(a, b, sort));
    let total = hits.len();
    let page = hits.into_iter().skip(offset).take(limit).collect();
    tracing::debug!(table = ITEM_TABLE, total, %sort, "Store scan search");
    Ok((page, total))
}

fn compare(a: &Item, b: &Item, sort: SortOrder) -> Ordering {
    let newest = |x: &Option<String>, y: &Option<String>| y.cmp(x);
    match sort {
        SortOrder::Featured => b
            .featured
            .cmp(&a.featured)
            .then_with(|| newest(&a.modified, &b.modified)),
        SortOrder::Newest => newest(&a.created, &b.created),
        SortOrder::Updated => newest(&a.modified, &b.modified),
        SortOrder::Popular => b.install_count.cmp(&a.install_count),
        SortOrder::Alpha => a.title.cmp(&b.title),
    }
}
