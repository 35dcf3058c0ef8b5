//! Built-in catalog of external toolkits
//!
//! Seeding is idempotent: toolkits already in the catalog (same title, type
//! `Tool` and author) are refreshed in place instead of duplicated.

use registry_meta::schema::EXTENSION_REF_FIELD;
use registry_meta::{ItemType, TrustStatus};
use registry_store::{EntityStore, Filter, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::{self, NewItem};
use crate::{Error, Result, extension};

/// Author recorded on every seeded toolkit.
pub const TOOLKIT_AUTHOR: &str = "Composio";

const LOGO_BASE_URL: &str = "https://logos.composio.dev/api";

/// One external toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalToolkit {
    /// Provider key, stored as the tool's `tool_name`
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

impl ExternalToolkit {
    pub fn logo_url(&self) -> String {
        format!("{LOGO_BASE_URL}/{}", self.key)
    }
}

pub const EXTERNAL_TOOLKITS: &[ExternalToolkit] = &[
    ExternalToolkit {
        key: "gmail",
        title: "Gmail",
        description: "Send, read, and manage Gmail emails. Actions: send email, read inbox, search messages, manage labels, drafts, and threads.",
    },
    ExternalToolkit {
        key: "slack",
        title: "Slack",
        description: "Send messages, manage channels, and interact with Slack workspaces. Actions: post message, list channels, upload files, manage users.",
    },
    ExternalToolkit {
        key: "github",
        title: "GitHub",
        description: "Manage repositories, issues, pull requests, and GitHub workflows. Actions: create issue, list PRs, manage repos, review code.",
    },
    ExternalToolkit {
        key: "googlecalendar",
        title: "Google Calendar",
        description: "Create, read, and manage Google Calendar events. Actions: create event, list events, update event, delete event.",
    },
    ExternalToolkit {
        key: "notion",
        title: "Notion",
        description: "Create and manage Notion pages, databases, and blocks. Actions: create page, query database, update block, search.",
    },
    ExternalToolkit {
        key: "googlesheets",
        title: "Google Sheets",
        description: "Read and write Google Sheets data. Actions: read range, write range, create spreadsheet, manage sheets.",
    },
    ExternalToolkit {
        key: "outlook",
        title: "Outlook",
        description: "Send, read, and manage Outlook/Microsoft 365 emails. Actions: send email, read inbox, manage folders, search messages.",
    },
    ExternalToolkit {
        key: "googledrive",
        title: "Google Drive",
        description: "Manage files and folders in Google Drive. Actions: upload file, list files, share file, create folder.",
    },
    ExternalToolkit {
        key: "googledocs",
        title: "Google Docs",
        description: "Create and edit Google Docs. Actions: create document, read content, insert text, update formatting.",
    },
    ExternalToolkit {
        key: "hubspot",
        title: "HubSpot",
        description: "Manage CRM contacts, deals, and companies in HubSpot. Actions: create contact, update deal, list companies, manage pipelines.",
    },
    ExternalToolkit {
        key: "linear",
        title: "Linear",
        description: "Manage issues, projects, and teams in Linear. Actions: create issue, update status, list projects, manage cycles.",
    },
    ExternalToolkit {
        key: "airtable",
        title: "Airtable",
        description: "Read and write Airtable records. Actions: list records, create record, update record, delete record.",
    },
    ExternalToolkit {
        key: "jira",
        title: "Jira",
        description: "Manage Jira issues, projects, and sprints. Actions: create issue, update issue, search, manage transitions.",
    },
    ExternalToolkit {
        key: "twitter",
        title: "Twitter / X",
        description: "Post tweets, read timelines, and manage Twitter/X interactions. Actions: post tweet, search tweets, like, retweet.",
    },
    ExternalToolkit {
        key: "discord",
        title: "Discord",
        description: "Send messages and manage Discord servers. Actions: send message, list channels, manage roles, create webhooks.",
    },
    ExternalToolkit {
        key: "figma",
        title: "Figma",
        description: "Read and interact with Figma design files. Actions: get file, list components, export assets, read comments.",
    },
    ExternalToolkit {
        key: "supabase",
        title: "Supabase",
        description: "Query and manage Supabase databases. Actions: select, insert, update, delete rows, manage tables.",
    },
    ExternalToolkit {
        key: "youtube",
        title: "YouTube",
        description: "Manage YouTube videos and channels. Actions: search videos, get video details, list playlists, manage comments.",
    },
    ExternalToolkit {
        key: "reddit",
        title: "Reddit",
        description: "Browse and interact with Reddit. Actions: get posts, submit post, list subreddits, manage comments.",
    },
    ExternalToolkit {
        key: "googletasks",
        title: "Google Tasks",
        description: "Create and manage Google Tasks. Actions: create task, list tasks, update task, complete task.",
    },
];

/// Counts from a seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedReport {
    pub created: usize,
    pub updated: usize,
}

/// Register or refresh every built-in toolkit.
pub fn seed_external_tools(store: &dyn EntityStore) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for toolkit in EXTERNAL_TOOLKITS {
        let filter = Filter::new()
            .eq("title", toolkit.title)
            .eq("item_type", ItemType::Tool.as_str())
            .eq("author", TOOLKIT_AUTHOR);

        let item = match catalog::find_item(store, &filter)? {
            Some(mut item) => {
                item.image = Some(toolkit.logo_url());
                catalog::save_item(store, &mut item)?;
                report.updated += 1;
                item
            }
            None => {
                let item = catalog::create_item(
                    store,
                    NewItem::new(toolkit.title, ItemType::Tool)
                        .with_description(toolkit.description)
                        .with_trust_status(TrustStatus::Approved)
                        .with_author(TOOLKIT_AUTHOR)
                        .with_image(toolkit.logo_url()),
                )?;
                report.created += 1;
                item
            }
        };

        let extension_id = item.extension_ref.ok_or_else(|| {
            Error::NotFound(format!("Registry item '{}' has no {EXTENSION_REF_FIELD}", item.slug))
        })?;
        let mut fields = Record::new();
        fields.insert("tool_name".to_string(), Value::String(toolkit.key.to_string()));
        fields.insert("tool_class".to_string(), Value::String("external".to_string()));
        fields.insert(
            "description".to_string(),
            Value::String(toolkit.description.to_string()),
        );
        extension::patch(store, ItemType::Tool, &extension_id, fields)?;
    }

    tracing::info!(
        created = report.created,
        updated = report.updated,
        "Seeded external toolkits"
    );
    Ok(report)
}
