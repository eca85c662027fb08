//! Catalog data model.
//!
//! Three kinds of types live here:
//! - stored records (`TextGroup`, `Work`, `Text`): what the store keeps in
//!   its collections and identifier index, with children reduced to URN
//!   stubs;
//! - wire payloads (`TextInventory`, `TextGroupDetail`, `TextDetail`,
//!   `VectorResponse`): the JSON shapes the library API serves, decoded at
//!   the boundary;
//! - hydrated views (`HydratedTextGroup`, `HydratedWork`): read-time
//!   projections with children inlined, handed to the display layer.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::urn::Urn;

/// A text group as stored: child works reduced to identifier stubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextGroup {
    pub urn: Urn,
    pub label: String,
    #[serde(default)]
    pub works: Vec<WorkStub>,
}

/// A work's identifier plus the identifiers of its texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkStub {
    pub urn: Urn,
    #[serde(default)]
    pub texts: Vec<TextStub>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStub {
    pub urn: Urn,
}

/// A work record with its texts as stubs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Work {
    pub urn: Urn,
    pub label: String,
    #[serde(default)]
    pub texts: Vec<TextStub>,
}

/// A text (version) record. No children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    pub urn: Urn,
    pub label: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Any record the identifier index can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogEntry {
    TextGroup(TextGroup),
    Work(Work),
    Text(Text),
}

impl CatalogEntry {
    pub fn urn(&self) -> &Urn {
        match self {
            CatalogEntry::TextGroup(group) => &group.urn,
            CatalogEntry::Work(work) => &work.urn,
            CatalogEntry::Text(text) => &text.urn,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CatalogEntry::TextGroup(group) => &group.label,
            CatalogEntry::Work(work) => &work.label,
            CatalogEntry::Text(text) => &text.label,
        }
    }
}

/// The text inventory served by the text-group list endpoint.
///
/// The current shape is `{text_groups, works, texts}` with flattened work
/// and text records alongside the nested groups. The older shape named the
/// group list `object` and carried no flattened records; the store derives
/// them from the nested entries in that case.
#[derive(Debug, Deserialize)]
pub struct TextInventory {
    #[serde(alias = "object")]
    pub text_groups: Vec<InventoryTextGroup>,
    #[serde(default)]
    pub works: Vec<Work>,
    #[serde(default)]
    pub texts: Vec<Text>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryTextGroup {
    pub urn: Urn,
    pub label: String,
    #[serde(default)]
    pub works: Vec<InventoryWork>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryWork {
    pub urn: Urn,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub texts: Vec<InventoryText>,
}

#[derive(Debug, Deserialize)]
pub struct InventoryText {
    pub urn: Urn,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Per-text-group detail: the group's work identifier list.
#[derive(Debug, Deserialize)]
pub struct TextGroupDetail {
    pub urn: Urn,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub works: Vec<WorkStub>,
}

/// Per-text detail. Only the table of contents is consumed here.
#[derive(Debug, Deserialize)]
pub struct TextDetail {
    pub urn: Urn,
    #[serde(default)]
    pub toc: Vec<Value>,
}

/// A batched (vector) resolution response: many records keyed by URN.
#[derive(Debug, Deserialize)]
pub struct VectorResponse<T> {
    pub collections: HashMap<Urn, T>,
}

/// A light reference to a work's owning text group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextGroupRef {
    pub urn: Urn,
    pub label: String,
}

/// A work with its texts inlined, produced by hydration or by the
/// two-stage work load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydratedWork {
    pub urn: Urn,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_group: Option<TextGroupRef>,
    pub texts: Vec<Text>,
}

/// A text group with its works and their texts inlined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydratedTextGroup {
    pub urn: Urn,
    pub label: String,
    pub works: Vec<HydratedWork>,
}
