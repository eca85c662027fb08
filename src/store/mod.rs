//! In-memory catalog store.
//!
//! The store owns an identifier index (URN → record) and, for each
//! collection the browsing surface displays, a pair of views: the "full"
//! snapshot committed by the last successful load, and the "current" view
//! that filtering narrows and reset restores. Loads fetch JSON from the
//! library API, normalize it into records, and commit wholesale — a failed
//! load leaves every view and the index untouched. Hydration is a read-time
//! join through the index and never mutates stored state.
//!
//! Load methods take `&mut self` across their await points, so two loads
//! can never overlap on one store; commits are single assignments of fully
//! built collections.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::Transport;
use crate::error::{CatalogError, Result};
use crate::model::{
    CatalogEntry, HydratedTextGroup, HydratedWork, Text, TextDetail, TextGroup, TextGroupDetail,
    TextGroupRef, TextInventory, TextStub, VectorResponse, Work, WorkStub,
};
use crate::urn::{Urn, UrnLevel};


/// Sort order for the text-group listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKind {
    /// By group label.
    #[default]
    TextGroup,
    /// By URN.
    Urn,
}

/// Client-side state container for a library catalog.
pub struct CatalogStore {
    transport: Box<dyn Transport>,
    base_url: String,

    index: HashMap<Urn, CatalogEntry>,

    text_groups: Vec<TextGroup>,
    all_text_groups: Option<Vec<TextGroup>>,

    group_works: Vec<Work>,
    all_group_works: Option<Vec<Work>>,

    group_texts: Vec<Text>,

    works: Vec<HydratedWork>,
    all_works: Option<Vec<HydratedWork>>,

    toc: Vec<Value>,
    sort_kind: SortKind,
}

impl CatalogStore {
    pub fn new(transport: Box<dyn Transport>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            index: HashMap::new(),
            text_groups: Vec::new(),
            all_text_groups: None,
            group_works: Vec::new(),
            all_group_works: None,
            group_texts: Vec::new(),
            works: Vec::new(),
            all_works: None,
            toc: Vec::new(),
            sort_kind: SortKind::default(),
        }
    }

    fn inventory_url(&self) -> String {
        format!("{}/library/json/", self.base_url)
    }

    fn detail_url(&self, urn: &Urn) -> String {
        format!("{}/library/{}/json/", self.base_url, urn)
    }

    fn vector_url(&self, urn: &Urn) -> String {
        format!("{}/library/vector/{}/", self.base_url, urn)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        let value = self.transport.get_json(url, query).await?;
        serde_json::from_value(value).map_err(|source| CatalogError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Load the text-group catalog.
    ///
    /// Rebuilds the identifier index from the inventory and replaces both
    /// the full snapshots and the current views for text groups and the
    /// flattened work/text collections. A repeat call is an explicit
    /// reload.
    pub async fn load_text_groups(&mut self) -> Result<()> {
        let url = self.inventory_url();
        let inventory: TextInventory = self.get(&url, &[]).await?;

        let mut index = HashMap::new();
        let mut text_groups = Vec::with_capacity(inventory.text_groups.len());

        for group in &inventory.text_groups {
            let record = TextGroup {
                urn: group.urn.clone(),
                label: group.label.clone(),
                works: group
                    .works
                    .iter()
                    .map(|work| WorkStub {
                        urn: work.urn.clone(),
                        texts: work
                            .texts
                            .iter()
                            .map(|text| TextStub { urn: text.urn.clone() })
                            .collect(),
                    })
                    .collect(),
            };
            index.insert(record.urn.clone(), CatalogEntry::TextGroup(record.clone()));
            text_groups.push(record);
        }

        // Flattened companion collections: taken from the inventory when
        // present, derived from the nested group entries for the older
        // shape that carries none.
        let (works, texts) = if inventory.works.is_empty() && inventory.texts.is_empty() {
            flatten_nested(&inventory)
        } else {
            (inventory.works, inventory.texts)
        };

        for work in &works {
            index.insert(work.urn.clone(), CatalogEntry::Work(work.clone()));
        }
        for text in &texts {
            index.insert(text.urn.clone(), CatalogEntry::Text(text.clone()));
        }

        tracing::debug!(
            groups = text_groups.len(),
            works = works.len(),
            texts = texts.len(),
            "loaded text inventory"
        );

        self.index = index;
        self.text_groups = text_groups.clone();
        self.all_text_groups = Some(text_groups);
        self.group_works = works.clone();
        self.all_group_works = Some(works);
        self.group_texts = texts;
        Ok(())
    }

    /// Load the works of one text group, with their texts inlined.
    ///
    /// Two-stage batched fetch: the group detail names the works, one
    /// vector call resolves every work record, a second resolves every
    /// text record those works name. Exactly 2 vector calls are issued
    /// regardless of how many works and texts the group has.
    pub async fn load_works(&mut self, text_group: &Urn) -> Result<()> {
        let detail_url = self.detail_url(text_group);
        let detail: TextGroupDetail = self.get(&detail_url, &[]).await?;

        let vector_url = self.vector_url(&detail.urn);

        let mut query: Vec<(&str, String)> = Vec::with_capacity(detail.works.len());
        for stub in &detail.works {
            let rel = stub
                .urn
                .relative_to(&detail.urn)
                .ok_or_else(|| CatalogError::ForeignUrn {
                    urn: stub.urn.clone(),
                    parent: detail.urn.clone(),
                })?;
            query.push(("e", rel.to_string()));
        }
        let work_vector: VectorResponse<Work> = self.get(&vector_url, &query).await?;

        let mut resolved = Vec::with_capacity(detail.works.len());
        for stub in &detail.works {
            let work = work_vector
                .collections
                .get(&stub.urn)
                .ok_or_else(|| CatalogError::MissingRecord {
                    urn: stub.urn.clone(),
                })?;
            resolved.push(work);
        }

        let mut query: Vec<(&str, String)> = Vec::new();
        for work in &resolved {
            for stub in &work.texts {
                let rel = stub
                    .urn
                    .relative_to(&detail.urn)
                    .ok_or_else(|| CatalogError::ForeignUrn {
                        urn: stub.urn.clone(),
                        parent: detail.urn.clone(),
                    })?;
                query.push(("e", rel.to_string()));
            }
        }
        let text_vector: VectorResponse<Text> = self.get(&vector_url, &query).await?;

        let group_ref = match &detail.label {
            Some(label) => Some(TextGroupRef {
                urn: detail.urn.clone(),
                label: label.clone(),
            }),
            None => self.index.get(&detail.urn).map(|entry| TextGroupRef {
                urn: detail.urn.clone(),
                label: entry.label().to_string(),
            }),
        };

        let mut works = Vec::with_capacity(resolved.len());
        for work in &resolved {
            let mut texts = Vec::with_capacity(work.texts.len());
            for stub in &work.texts {
                let text = text_vector
                    .collections
                    .get(&stub.urn)
                    .ok_or_else(|| CatalogError::MissingRecord {
                        urn: stub.urn.clone(),
                    })?;
                texts.push(text.clone());
            }
            works.push(HydratedWork {
                urn: work.urn.clone(),
                label: work.label.clone(),
                text_group: group_ref.clone(),
                texts,
            });
        }

        tracing::debug!(group = %detail.urn, works = works.len(), "loaded work list");

        if let Some(label) = detail.label {
            self.index.insert(
                detail.urn.clone(),
                CatalogEntry::TextGroup(TextGroup {
                    urn: detail.urn.clone(),
                    label,
                    works: detail.works,
                }),
            );
        }
        for work in work_vector.collections.into_values() {
            self.index.insert(work.urn.clone(), CatalogEntry::Work(work));
        }
        for text in text_vector.collections.into_values() {
            self.index.insert(text.urn.clone(), CatalogEntry::Text(text));
        }

        self.works = works.clone();
        self.all_works = Some(works);
        Ok(())
    }

    /// Load the table of contents of one text.
    pub async fn load_toc(&mut self, text: &Urn) -> Result<()> {
        let url = self.detail_url(text);
        let detail: TextDetail = self.get(&url, &[]).await?;

        tracing::debug!(text = %detail.urn, entries = detail.toc.len(), "loaded toc");

        self.toc = detail.toc;
        Ok(())
    }

    /// Narrow the current text-group view.
    ///
    /// A group matches when its own label contains the query
    /// (case-insensitive), or when any of its works' labels does; a group
    /// kept only for its works is narrowed to the matching work stubs.
    /// No-op before the first load.
    pub fn filter_text_groups(&mut self, query: &str) {
        let Some(all) = &self.all_text_groups else {
            return;
        };
        let needle = query.to_lowercase();

        let mut filtered = Vec::new();
        for group in all {
            if group.label.to_lowercase().contains(&needle) {
                filtered.push(group.clone());
                continue;
            }
            let works: Vec<WorkStub> = group
                .works
                .iter()
                .filter(|stub| {
                    self.index
                        .get(&stub.urn)
                        .is_some_and(|entry| entry.label().to_lowercase().contains(&needle))
                })
                .cloned()
                .collect();
            if !works.is_empty() {
                filtered.push(TextGroup {
                    urn: group.urn.clone(),
                    label: group.label.clone(),
                    works,
                });
            }
        }
        self.text_groups = filtered;
    }

    /// Restore the current text-group view to the full snapshot.
    pub fn reset_text_groups(&mut self) {
        if let Some(all) = &self.all_text_groups {
            self.text_groups = all.clone();
        }
    }

    /// Narrow the flattened work view: a work matches on its own label or
    /// on its text group's label.
    pub fn filter_group_works(&mut self, query: &str) {
        let Some(all) = &self.all_group_works else {
            return;
        };
        let needle = query.to_lowercase();

        let mut filtered = Vec::new();
        for work in all {
            let group_matches = work
                .urn
                .up_to(UrnLevel::TextGroup)
                .and_then(|urn| self.index.get(&urn))
                .is_some_and(|entry| entry.label().to_lowercase().contains(&needle));
            if work.label.to_lowercase().contains(&needle) || group_matches {
                filtered.push(work.clone());
            }
        }
        self.group_works = filtered;
    }

    /// Restore the current flattened work view to the full snapshot.
    pub fn reset_group_works(&mut self) {
        if let Some(all) = &self.all_group_works {
            self.group_works = all.clone();
        }
    }

    /// Narrow the per-group work view by work label.
    pub fn filter_works(&mut self, query: &str) {
        let Some(all) = &self.all_works else {
            return;
        };
        let needle = query.to_lowercase();
        self.works = all
            .iter()
            .filter(|work| work.label.to_lowercase().contains(&needle))
            .cloned()
            .collect();
    }

    /// Restore the current per-group work view to the full snapshot.
    pub fn reset_works(&mut self) {
        if let Some(all) = &self.all_works {
            self.works = all.clone();
        }
    }

    pub fn set_sort(&mut self, kind: SortKind) {
        self.sort_kind = kind;
    }

    pub fn sort_kind(&self) -> SortKind {
        self.sort_kind
    }

    /// Resolve a record by URN.
    pub fn lookup(&self, urn: &Urn) -> Option<&CatalogEntry> {
        self.index.get(urn)
    }

    /// The current (possibly filtered) text-group view, as stored stubs.
    pub fn text_groups(&self) -> &[TextGroup] {
        &self.text_groups
    }

    /// The current flattened work collection.
    pub fn group_works(&self) -> &[Work] {
        &self.group_works
    }

    /// The flattened text collection.
    pub fn group_texts(&self) -> &[Text] {
        &self.group_texts
    }

    /// The current per-group work view.
    pub fn works(&self) -> &[HydratedWork] {
        &self.works
    }

    /// The current table of contents.
    pub fn toc(&self) -> &[Value] {
        &self.toc
    }

    fn hydrate_work(&self, urn: &Urn, texts: &[TextStub]) -> Option<HydratedWork> {
        let entry = self.index.get(urn)?;
        let text_group = urn
            .up_to(UrnLevel::TextGroup)
            .and_then(|group_urn| {
                self.index.get(&group_urn).map(|parent| TextGroupRef {
                    urn: group_urn.clone(),
                    label: parent.label().to_string(),
                })
            });
        let texts = texts
            .iter()
            .filter_map(|stub| match self.index.get(&stub.urn) {
                Some(CatalogEntry::Text(text)) => Some(text.clone()),
                _ => None,
            })
            .collect();
        Some(HydratedWork {
            urn: urn.clone(),
            label: entry.label().to_string(),
            text_group,
            texts,
        })
    }

    /// The current text-group view with works and texts inlined.
    ///
    /// A pure projection through the identifier index; safe to call on
    /// every read. Children missing from the index are skipped.
    pub fn hydrated_text_groups(&self) -> Vec<HydratedTextGroup> {
        self.text_groups
            .iter()
            .map(|group| HydratedTextGroup {
                urn: group.urn.clone(),
                label: group.label.clone(),
                works: group
                    .works
                    .iter()
                    .filter_map(|stub| self.hydrate_work(&stub.urn, &stub.texts))
                    .collect(),
            })
            .collect()
    }

    /// The current flattened work view with texts inlined and the owning
    /// group resolved.
    pub fn hydrated_works(&self) -> Vec<HydratedWork> {
        self.group_works
            .iter()
            .filter_map(|work| self.hydrate_work(&work.urn, &work.texts))
            .collect()
    }

    /// Hydrated text groups ordered by URN.
    pub fn sorted_by_urn(&self) -> Vec<HydratedTextGroup> {
        let mut groups = self.hydrated_text_groups();
        groups.sort_by(|a, b| a.urn.cmp(&b.urn));
        groups
    }

    /// Hydrated text groups ordered by label, case-folded.
    pub fn sorted_by_text_group(&self) -> Vec<HydratedTextGroup> {
        let mut groups = self.hydrated_text_groups();
        groups.sort_by_key(|group| group.label.to_lowercase());
        groups
    }

    /// Hydrated flattened works ordered by label, case-folded.
    pub fn sorted_by_work(&self) -> Vec<HydratedWork> {
        let mut works = self.hydrated_works();
        works.sort_by_key(|work| work.label.to_lowercase());
        works
    }

    /// Hydrated text groups in the configured sort order.
    pub fn sorted_text_groups(&self) -> Vec<HydratedTextGroup> {
        match self.sort_kind {
            SortKind::TextGroup => self.sorted_by_text_group(),
            SortKind::Urn => self.sorted_by_urn(),
        }
    }
}

/// Derive flattened work and text records from nested inventory groups.
fn flatten_nested(inventory: &TextInventory) -> (Vec<Work>, Vec<Text>) {
    let mut works = Vec::new();
    let mut texts = Vec::new();
    for group in &inventory.text_groups {
        for work in &group.works {
            works.push(Work {
                urn: work.urn.clone(),
                label: work.label.clone().unwrap_or_default(),
                texts: work
                    .texts
                    .iter()
                    .map(|text| TextStub { urn: text.urn.clone() })
                    .collect(),
            });
            for text in &work.texts {
                texts.push(Text {
                    urn: text.urn.clone(),
                    label: text.label.clone().unwrap_or_default(),
                    lang: text.lang.clone(),
                    kind: text.kind.clone(),
                    description: text.description.clone(),
                });
            }
        }
    }
    (works, texts)
}
