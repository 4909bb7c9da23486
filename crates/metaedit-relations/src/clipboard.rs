//! Cut/copy/create intents carried between requests.
//!
//! The clipboard also tracks the *circular* id set: the records being cut and
//! everything below them. Pasting into or after one of those would detach a
//! subtree from the tree, so such targets are rejected. A cut's subtree stays
//! in the set only while the cut entry is on the clipboard.

use metaedit_model::ModelId;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};

use crate::collector::ModelCollector;
use crate::error::RelationshipError;

/// Session key the clipboard is stored under.
pub const CLIPBOARD_SESSION_KEY: &str = "CLIPBOARD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardAction {
    Cut,
    Copy,
    DeepCopy,
    Create,
}

impl ClipboardAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cut => "cut",
            Self::Copy => "copy",
            Self::DeepCopy => "deep_copy",
            Self::Create => "create",
        }
    }
}

impl Display for ClipboardAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClipboardItem {
    Cut {
        model: ModelId,
    },
    Copy {
        model: ModelId,
    },
    DeepCopy {
        model: ModelId,
    },
    /// A new record of `provider`, optionally below `parent`.
    Create {
        provider: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent: Option<ModelId>,
    },
}

impl ClipboardItem {
    pub fn cut(model: ModelId) -> Self {
        Self::Cut { model }
    }

    pub fn copy(model: ModelId) -> Self {
        Self::Copy { model }
    }

    pub fn deep_copy(model: ModelId) -> Self {
        Self::DeepCopy { model }
    }

    pub fn create(provider: impl Into<String>, parent: Option<ModelId>) -> Self {
        Self::Create {
            provider: provider.into(),
            parent,
        }
    }

    pub fn action(&self) -> ClipboardAction {
        match self {
            Self::Cut { .. } => ClipboardAction::Cut,
            Self::Copy { .. } => ClipboardAction::Copy,
            Self::DeepCopy { .. } => ClipboardAction::DeepCopy,
            Self::Create { .. } => ClipboardAction::Create,
        }
    }

    pub fn model_id(&self) -> Option<&ModelId> {
        match self {
            Self::Cut { model } | Self::Copy { model } | Self::DeepCopy { model } => Some(model),
            Self::Create { .. } => None,
        }
    }

    pub fn parent_id(&self) -> Option<&ModelId> {
        match self {
            Self::Create { parent, .. } => parent.as_ref(),
            _ => None,
        }
    }

    pub fn provider_name(&self) -> &str {
        match self {
            Self::Cut { model } | Self::Copy { model } | Self::DeepCopy { model } => model.provider_name(),
            Self::Create { provider, .. } => provider,
        }
    }

    /// Key identifying the entry: `action::model` or
    /// `create::provider::parent`.
    pub fn clipboard_id(&self) -> String {
        match self {
            Self::Create { provider, parent } => format!(
                "{}::{provider}::{}",
                self.action(),
                parent.as_ref().map(ModelId::serialized).unwrap_or_default()
            ),
            _ => format!(
                "{}::{}",
                self.action(),
                self.model_id().map(ModelId::serialized).unwrap_or_default()
            ),
        }
    }
}

/// Criteria for selecting clipboard entries. Unset criteria match everything;
/// set criteria must all hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardFilter {
    actions: BTreeSet<ClipboardAction>,
    provider: Option<String>,
    parent: Option<Option<ModelId>>,
    models: Vec<ModelId>,
}

impl ClipboardFilter {
    pub fn any() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_action(mut self, action: ClipboardAction) -> Self {
        self.actions.insert(action);
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Only entries whose parent is `parent` (`None`: entries without one).
    #[must_use]
    pub fn with_parent(mut self, parent: Option<ModelId>) -> Self {
        self.parent = Some(parent);
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: ModelId) -> Self {
        self.models.push(model);
        self
    }

    pub fn matches(&self, item: &ClipboardItem) -> bool {
        if !self.actions.is_empty() && !self.actions.contains(&item.action()) {
            return false;
        }
        if self.provider.as_deref().is_some_and(|p| p != item.provider_name()) {
            return false;
        }
        if let Some(parent) = &self.parent {
            if item.parent_id() != parent.as_ref() {
                return false;
            }
        }
        if !self.models.is_empty() && !item.model_id().is_some_and(|m| self.models.contains(m)) {
            return false;
        }
        true
    }
}

/// Ordered clipboard entries plus the circular id set.
///
/// The circular set is the union of the ids marked with
/// [`Clipboard::set_circular_ids`] and the subtree of every pending cut.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clipboard {
    #[serde(default)]
    items: Vec<ClipboardItem>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    circular: BTreeSet<ModelId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    cut_subtrees: BTreeMap<ModelId, BTreeSet<ModelId>>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry; an entry with the same clipboard id is replaced in place.
    pub fn push(&mut self, item: ClipboardItem) {
        let key = item.clipboard_id();
        match self.items.iter_mut().find(|i| i.clipboard_id() == key) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, item: &ClipboardItem) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i != item);
        self.prune_cut_subtrees();
        self.items.len() != before
    }

    /// Remove every entry referencing `id`, whatever its action.
    pub fn remove_by_id(&mut self, id: &ModelId) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.model_id() != Some(id));
        self.prune_cut_subtrees();
        before - self.items.len()
    }

    /// Remove exactly the entry with this clipboard id.
    pub fn remove_by_clipboard_id(&mut self, clipboard_id: &str) -> Option<ClipboardItem> {
        let idx = self.items.iter().position(|i| i.clipboard_id() == clipboard_id)?;
        let removed = self.items.remove(idx);
        self.prune_cut_subtrees();
        Some(removed)
    }

    /// Forget the subtrees of cuts no longer on the clipboard.
    fn prune_cut_subtrees(&mut self) {
        let items = &self.items;
        self.cut_subtrees.retain(|id, _| {
            items
                .iter()
                .any(|i| i.action() == ClipboardAction::Cut && i.model_id() == Some(id))
        });
    }

    /// Push a cut of `id` and mark `subtree` circular while the cut is pending.
    pub fn push_cut(&mut self, id: ModelId, subtree: impl IntoIterator<Item = ModelId>) {
        self.push(ClipboardItem::cut(id.clone()));
        self.cut_subtrees.insert(id, subtree.into_iter().collect());
    }

    pub fn has(&self, item: &ClipboardItem) -> bool {
        self.items.contains(item)
    }

    pub fn has_id(&self, id: &ModelId) -> bool {
        self.items.iter().any(|i| i.model_id() == Some(id))
    }

    pub fn fetch(&self, filter: &ClipboardFilter) -> Vec<&ClipboardItem> {
        self.items.iter().filter(|i| filter.matches(i)).collect()
    }

    pub fn is_empty(&self, filter: &ClipboardFilter) -> bool {
        !self.items.iter().any(|i| filter.matches(i))
    }

    /// Drop every entry and the circular set.
    pub fn clear(&mut self) {
        self.items.clear();
        self.circular.clear();
        self.cut_subtrees.clear();
    }

    pub fn items(&self) -> &[ClipboardItem] {
        &self.items
    }

    pub fn set_circular_ids(&mut self, ids: impl IntoIterator<Item = ModelId>) {
        self.circular = ids.into_iter().collect();
    }

    pub fn circular_ids(&self) -> BTreeSet<ModelId> {
        let mut ids = self.circular.clone();
        for subtree in self.cut_subtrees.values() {
            ids.extend(subtree.iter().cloned());
        }
        ids
    }

    pub fn is_circular(&self, id: &ModelId) -> bool {
        self.circular.contains(id) || self.cut_subtrees.values().any(|subtree| subtree.contains(id))
    }

    /// The candidates that may serve as paste targets.
    pub fn filter_paste_targets<'a>(&self, candidates: impl IntoIterator<Item = &'a ModelId>) -> Vec<&'a ModelId> {
        candidates
            .into_iter()
            .filter(|id| !self.is_circular(id))
            .collect()
    }

    /// Restore from the session; missing or unreadable state yields an empty
    /// clipboard.
    pub fn load_from(session: &dyn SessionStorage) -> Self {
        let Some(raw) = session.get(CLIPBOARD_SESSION_KEY) else {
            return Self::new();
        };
        serde_json::from_value(raw).unwrap_or_else(|err| {
            tracing::warn!(%err, "discarding unreadable clipboard session state");
            Self::new()
        })
    }

    pub fn save_to(&self, session: &dyn SessionStorage) {
        match serde_json::to_value(self) {
            Ok(value) => session.set(CLIPBOARD_SESSION_KEY, value),
            Err(err) => tracing::warn!(%err, "clipboard could not be serialized"),
        }
    }
}

/// Cut `id` and mark it and all of its descendants as circular until the cut
/// leaves the clipboard. Returns the marked ids.
pub fn cut_with_descendants(
    clipboard: &mut Clipboard,
    collector: &ModelCollector<'_>,
    id: &ModelId,
) -> Result<Vec<ModelId>, RelationshipError> {
    let descendants = collector.collect_descendant_ids(id)?;
    clipboard.push_cut(id.clone(), descendants.iter().cloned());

    tracing::debug!(%id, marked = descendants.len(), "cut with descendants");
    Ok(descendants)
}

/// Per-user key/value storage that outlives a request.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value);

    fn remove(&self, key: &str) -> Option<Value>;
}

#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    values: RwLock<BTreeMap<String, Value>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values.write().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(id: i64) -> ModelId {
        ModelId::new("tl_page", id)
    }

    #[test]
    fn push_replaces_same_clipboard_id() {
        let mut clipboard = Clipboard::new();
        clipboard.push(ClipboardItem::cut(page(1)));
        clipboard.push(ClipboardItem::copy(page(1)));
        clipboard.push(ClipboardItem::cut(page(1)));
        assert_eq!(clipboard.items().len(), 2);
        assert_eq!(ClipboardItem::cut(page(1)).clipboard_id(), "cut::tl_page::1");
        assert_eq!(
            ClipboardItem::create("tl_content", Some(ModelId::new("tl_article", 3))).clipboard_id(),
            "create::tl_content::tl_article::3"
        );
    }

    #[test]
    fn removal_granularity() {
        let mut clipboard = Clipboard::new();
        clipboard.push(ClipboardItem::cut(page(1)));
        clipboard.push(ClipboardItem::copy(page(1)));
        clipboard.push(ClipboardItem::copy(page(2)));

        let removed = clipboard.remove_by_clipboard_id("copy::tl_page::1");
        assert_eq!(removed, Some(ClipboardItem::copy(page(1))));
        assert!(clipboard.has_id(&page(1)));

        clipboard.push(ClipboardItem::deep_copy(page(1)));
        assert_eq!(clipboard.remove_by_id(&page(1)), 2);
        assert!(!clipboard.has_id(&page(1)));
        assert!(clipboard.has(&ClipboardItem::copy(page(2))));
        assert!(clipboard.remove(&ClipboardItem::copy(page(2))));
        assert!(clipboard.is_empty(&ClipboardFilter::any()));
    }

    #[test]
    fn filters_combine_with_and() {
        let mut clipboard = Clipboard::new();
        clipboard.push(ClipboardItem::cut(page(1)));
        clipboard.push(ClipboardItem::copy(ModelId::new("tl_article", 4)));
        clipboard.push(ClipboardItem::create("tl_content", Some(ModelId::new("tl_article", 4))));
        clipboard.push(ClipboardItem::create("tl_content", None));

        let cuts = ClipboardFilter::any().with_action(ClipboardAction::Cut);
        assert_eq!(clipboard.fetch(&cuts).len(), 1);

        let articles = ClipboardFilter::any()
            .with_action(ClipboardAction::Cut)
            .with_action(ClipboardAction::Copy)
            .with_provider("tl_article");
        assert_eq!(clipboard.fetch(&articles), vec![&ClipboardItem::copy(ModelId::new("tl_article", 4))]);

        let below_article = ClipboardFilter::any().with_parent(Some(ModelId::new("tl_article", 4)));
        assert_eq!(clipboard.fetch(&below_article).len(), 1);
        let without_parent = ClipboardFilter::any()
            .with_action(ClipboardAction::Create)
            .with_parent(None);
        assert_eq!(clipboard.fetch(&without_parent).len(), 1);

        assert!(!clipboard.is_empty(&ClipboardFilter::any().with_model(page(1))));
        assert!(clipboard.is_empty(&ClipboardFilter::any().with_model(page(9))));
    }

    #[test]
    fn circular_targets_are_filtered() {
        let mut clipboard = Clipboard::new();
        clipboard.set_circular_ids([page(1), page(2)]);
        assert!(clipboard.is_circular(&page(2)));
        let candidates = [page(1), page(3), page(2), page(4)];
        assert_eq!(clipboard.filter_paste_targets(&candidates), vec![&page(3), &page(4)]);
        clipboard.clear();
        assert!(clipboard.circular_ids().is_empty());
    }

    #[test]
    fn removing_a_cut_releases_its_subtree() {
        let mut clipboard = Clipboard::new();
        clipboard.set_circular_ids([page(9)]);
        clipboard.push_cut(page(1), [page(1), page(2), page(3)]);
        clipboard.push_cut(page(5), [page(5), page(6)]);
        clipboard.push(ClipboardItem::copy(page(1)));
        assert!(clipboard.is_circular(&page(3)));
        assert_eq!(clipboard.circular_ids().len(), 6);

        assert!(clipboard.remove_by_clipboard_id("copy::tl_page::1").is_some());
        assert!(clipboard.is_circular(&page(2)));

        assert_eq!(clipboard.remove_by_id(&page(1)), 1);
        assert!(!clipboard.is_circular(&page(2)));
        assert!(clipboard.is_circular(&page(6)));
        assert!(clipboard.is_circular(&page(9)));

        assert!(clipboard.remove(&ClipboardItem::cut(page(5))));
        assert_eq!(clipboard.circular_ids(), BTreeSet::from([page(9)]));
    }

    #[test]
    fn session_round_trip() {
        let session = InMemorySessionStorage::new();
        assert_eq!(Clipboard::load_from(&session), Clipboard::new());

        let mut clipboard = Clipboard::new();
        clipboard.push(ClipboardItem::cut(ModelId::new("tl_news", "intro")));
        clipboard.push(ClipboardItem::create("tl_content", None));
        clipboard.set_circular_ids([ModelId::new("tl_news", "intro")]);
        clipboard.save_to(&session);

        let stored = session.get(CLIPBOARD_SESSION_KEY).unwrap();
        assert_eq!(stored["items"][0], json!({"action": "cut", "model": "tl_news::\"intro\""}));
        assert_eq!(Clipboard::load_from(&session), clipboard);

        session.set(CLIPBOARD_SESSION_KEY, json!({"items": [{"action": "teleport"}]}));
        assert_eq!(Clipboard::load_from(&session), Clipboard::new());
    }
}
