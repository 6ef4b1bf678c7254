//! Shot tags, grouped and ordered, persisted in the durable store.
//!
//! The whole catalog is one JSON list under [`TAGS_KEY`]. Every mutation
//! reads, edits and writes it back, then renumbers `sort_index` so each
//! group is ordered `0..n` with no gaps.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DEFAULT_TAG_GROUP;
use crate::error::{Result, ShootError};
use crate::store::KeyValueStore;

pub const TAGS_KEY: &str = "tags.v1";

const MAX_NAME_CHARS: usize = 64;

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub group: String,
    pub sort_index: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagGroup {
    pub name: String,
    pub tags: Vec<Tag>,
}

pub struct TagCatalog<K: KeyValueStore> {
    store: K,
    default_group: String,
}

impl<K: KeyValueStore> TagCatalog<K> {
    pub fn new(store: K) -> Self {
        Self::with_default_group(store, DEFAULT_TAG_GROUP)
    }

    pub fn with_default_group(store: K, default_group: &str) -> Self {
        let default_group = clean_label(default_group);
        Self {
            store,
            default_group: if default_group.is_empty() {
                DEFAULT_TAG_GROUP.to_string()
            } else {
                default_group
            },
        }
    }

    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    /// All tags, ordered by group name then position.
    pub fn list(&self) -> Result<Vec<Tag>> {
        let mut tags = self.load()?;
        tags.sort_by(|a, b| {
            a.group
                .cmp(&b.group)
                .then(a.sort_index.cmp(&b.sort_index))
        });
        Ok(tags)
    }

    pub fn list_by_group(&self) -> Result<Vec<TagGroup>> {
        let mut groups: BTreeMap<String, Vec<Tag>> = BTreeMap::new();
        for tag in self.list()? {
            groups.entry(tag.group.clone()).or_default().push(tag);
        }
        Ok(groups
            .into_iter()
            .map(|(name, tags)| TagGroup { name, tags })
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Tag> {
        self.load()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(id))
    }

    /// Appends a new active tag at the end of its group.
    pub fn add(&self, name: &str, group: Option<&str>) -> Result<Tag> {
        let name = validate_name(name)?;
        let group = self.resolve_group(group);
        let mut tags = self.load()?;

        let tag = Tag {
            id: ulid::Ulid::new().to_string(),
            name,
            sort_index: next_index(&tags, &group),
            group,
            is_active: true,
        };
        tags.push(tag.clone());
        self.save(tags)?;

        info!(id = %tag.id, name = %tag.name, group = %tag.group, "Tag added");
        Ok(tag)
    }

    /// Renames a tag and optionally regroups it. A tag moved to another group
    /// lands at the end of that group.
    pub fn update(&self, id: &str, name: &str, group: Option<&str>) -> Result<Tag> {
        let name = validate_name(name)?;
        let mut tags = self.load()?;
        let position = position_of(&tags, id)?;

        let target_group = match group {
            Some(g) => self.resolve_group(Some(g)),
            None => tags[position].group.clone(),
        };
        if target_group != tags[position].group {
            tags[position].sort_index = next_index(&tags, &target_group);
            tags[position].group = target_group;
        }
        tags[position].name = name;

        let id = tags[position].id.clone();
        let tags = self.save(tags)?;
        debug!(id = %id, "Tag updated");
        find_saved(&tags, &id)
    }

    pub fn set_active(&self, id: &str, active: bool) -> Result<Tag> {
        let mut tags = self.load()?;
        let position = position_of(&tags, id)?;
        tags[position].is_active = active;

        let tags = self.save(tags)?;
        debug!(id, active, "Tag activation changed");
        find_saved(&tags, id)
    }

    /// Moves a tag to `to_index` within its group, clamped to the group's end.
    pub fn move_tag(&self, id: &str, to_index: u32) -> Result<Tag> {
        let tags = self.load()?;
        let moving = tags
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))?;

        let (mut siblings, rest): (Vec<Tag>, Vec<Tag>) = tags
            .into_iter()
            .filter(|t| t.id != id)
            .partition(|t| t.group == moving.group);
        siblings.sort_by_key(|t| t.sort_index);

        let slot = (to_index as usize).min(siblings.len());
        siblings.insert(slot, moving);
        for (index, tag) in siblings.iter_mut().enumerate() {
            tag.sort_index = index as u32;
        }

        let mut tags = rest;
        tags.extend(siblings);
        let tags = self.save(tags)?;
        find_saved(&tags, id)
    }

    pub fn remove(&self, id: &str) -> Result<()> {
        let mut tags = self.load()?;
        let position = position_of(&tags, id)?;
        let removed = tags.remove(position);
        self.save(tags)?;
        info!(id = %removed.id, name = %removed.name, "Tag removed");
        Ok(())
    }

    fn resolve_group(&self, group: Option<&str>) -> String {
        let label = group.map(clean_label).unwrap_or_default();
        if label.is_empty() {
            self.default_group.clone()
        } else {
            label
        }
    }

    fn load(&self) -> Result<Vec<Tag>> {
        match self.store.get(TAGS_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| ShootError::Json {
                context: format!("parsing {}", TAGS_KEY),
                source: e,
            }),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, mut tags: Vec<Tag>) -> Result<Vec<Tag>> {
        normalize(&mut tags);
        let raw = serde_json::to_string(&tags).map_err(|e| ShootError::Json {
            context: format!("serializing {}", TAGS_KEY),
            source: e,
        })?;
        self.store.put(TAGS_KEY, &raw)?;
        Ok(tags)
    }
}

/// Renumbers each group densely, preserving relative order.
fn normalize(tags: &mut [Tag]) {
    tags.sort_by(|a, b| {
        a.group
            .cmp(&b.group)
            .then(a.sort_index.cmp(&b.sort_index))
    });
    let mut current_group: Option<String> = None;
    let mut next = 0u32;
    for tag in tags.iter_mut() {
        if current_group.as_deref() != Some(tag.group.as_str()) {
            current_group = Some(tag.group.clone());
            next = 0;
        }
        tag.sort_index = next;
        next += 1;
    }
}

fn next_index(tags: &[Tag], group: &str) -> u32 {
    tags.iter().filter(|t| t.group == group).count() as u32
}

fn position_of(tags: &[Tag], id: &str) -> Result<usize> {
    tags.iter()
        .position(|t| t.id == id)
        .ok_or_else(|| not_found(id))
}

fn find_saved(tags: &[Tag], id: &str) -> Result<Tag> {
    tags.iter()
        .find(|t| t.id == id)
        .cloned()
        .ok_or_else(|| not_found(id))
}

fn not_found(id: &str) -> ShootError {
    ShootError::TagNotFound { id: id.to_string() }
}

/// Collapses runs of whitespace (newlines included) and trims.
fn clean_label(raw: &str) -> String {
    let collapsed = RE_WHITESPACE.replace_all(raw.trim(), " ");
    collapsed.chars().take(MAX_NAME_CHARS).collect::<String>().trim_end().to_string()
}

fn validate_name(raw: &str) -> Result<String> {
    let name = clean_label(raw);
    if name.is_empty() {
        return Err(ShootError::InvalidTagName(raw.to_string()));
    }
    Ok(name)
}
