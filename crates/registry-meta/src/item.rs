//! Catalog items.

use std::fmt;
use std::str::FromStr;

use registry_store::{CREATED_FIELD, ID_FIELD, MODIFIED_FIELD, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::EXTENSION_REF_FIELD;

/// Kind of installable item. Each kind owns one extension variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    Agent,
    Tool,
    Skill,
    #[serde(rename = "UI")]
    Ui,
    Logic,
}

impl ItemType {
    /// Every item type, in declaration order.
    pub const ALL: [ItemType; 5] = [
        ItemType::Agent,
        ItemType::Tool,
        ItemType::Skill,
        ItemType::Ui,
        ItemType::Logic,
    ];

    /// Wire name (`"Agent"`, `"Tool"`, `"Skill"`, `"UI"`, `"Logic"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Agent => "Agent",
            ItemType::Tool => "Tool",
            ItemType::Skill => "Skill",
            ItemType::Ui => "UI",
            ItemType::Logic => "Logic",
        }
    }

    /// Install priority: lower installs first.
    ///
    /// Agents reference the four other kinds and nothing references an
    /// agent, so installing in ascending priority puts every dependency
    /// before its dependents.
    pub fn install_priority(&self) -> u8 {
        match self {
            ItemType::Skill => 1,
            ItemType::Tool => 2,
            ItemType::Ui => 3,
            ItemType::Logic => 4,
            ItemType::Agent => 5,
        }
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ItemType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::UnknownItemType {
                value: s.to_string(),
            })
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation state of an item. Only approved items can be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl TrustStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustStatus::Pending => "pending",
            TrustStatus::Approved => "approved",
            TrustStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for TrustStatus {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TrustStatus::Pending),
            "approved" => Ok(TrustStatus::Approved),
            "rejected" => Ok(TrustStatus::Rejected),
            _ => Err(Error::UnknownTrustStatus {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A catalog entry as stored in the item table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identifier, never exposed publicly
    pub id: String,
    /// Unique public identifier
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub item_type: ItemType,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub trust_status: TrustStatus,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub readme: Option<String>,
    #[serde(default)]
    pub install_count: u64,
    #[serde(default)]
    pub image: Option<String>,
    /// Identifier of the paired extension record, set once at creation
    #[serde(default)]
    pub extension_ref: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

impl Item {
    /// Decode a stored item record.
    pub fn from_record(record: Record) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }

    /// The mutable fields of this item, ready for an insert or update.
    ///
    /// Identity, the extension reference and store bookkeeping are left out:
    /// they are written exactly once by the store or by item creation.
    pub fn to_record(&self) -> Result<Record> {
        let mut record = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Record::new(),
        };
        for key in [ID_FIELD, CREATED_FIELD, MODIFIED_FIELD, EXTENSION_REF_FIELD] {
            record.remove(key);
        }
        Ok(record)
    }
}
