//! Resolving records and walking the structure between them.

use std::collections::{BTreeSet, VecDeque};

use metaedit_model::{DataProvider, FetchConfig, Model, ModelId, ProviderRegistry, Record};

use crate::condition::ParentChildCondition;
use crate::config::ContainerDefinition;
use crate::definition::ContainerMode;
use crate::error::RelationshipError;
use crate::manager::RelationshipManager;

/// Fetches records for a container through its providers.
#[derive(Debug, Clone, Copy)]
pub struct ModelCollector<'a> {
    definition: &'a ContainerDefinition,
    providers: &'a ProviderRegistry,
}

impl<'a> ModelCollector<'a> {
    pub fn new(definition: &'a ContainerDefinition, providers: &'a ProviderRegistry) -> Self {
        Self {
            definition,
            providers,
        }
    }

    pub fn manager(&self) -> RelationshipManager<'a> {
        RelationshipManager::new(self.definition.relationships(), self.definition.basic().mode)
    }

    fn provider(&self, name: &str) -> Result<&'a dyn DataProvider, RelationshipError> {
        Ok(&**self.providers.get(name)?)
    }

    /// `Ok(None)` when the record does not exist.
    pub fn get_model(&self, id: &ModelId) -> Result<Option<Model>, RelationshipError> {
        Ok(self.provider(id.provider_name())?.fetch_one(id.id())?)
    }

    pub fn get_model_from_serialized(&self, serialized: &str) -> Result<Option<Model>, RelationshipError> {
        let id = ModelId::from_serialized(serialized)?;
        self.get_model(&id)
    }

    /// The structural parent of `child`, if it has one.
    pub fn search_parent_of(&self, child: &Model) -> Result<Option<Model>, RelationshipError> {
        let basic = self.definition.basic();
        match basic.mode {
            ContainerMode::Flat => Ok(None),
            ContainerMode::ParentedList => {
                let parent_provider = basic.parent_data_provider.as_deref().ok_or_else(|| {
                    RelationshipError::config("parented list container has no parent data provider")
                })?;
                let condition = self
                    .definition
                    .relationships()
                    .child_condition(parent_provider, child.provider_name())
                    .ok_or_else(|| {
                        RelationshipError::config(format!(
                            "no relationship from `{parent_provider}` to `{}`",
                            child.provider_name()
                        ))
                    })?;
                self.fetch_parent(condition, child)
            }
            ContainerMode::Hierarchical => self.search_parent_from_hierarchical(child),
        }
    }

    /// Try every condition ending in the child's provider; the first parent
    /// found wins. Roots have no parent.
    pub fn search_parent_from_hierarchical(&self, child: &Model) -> Result<Option<Model>, RelationshipError> {
        if self.manager().is_root(child) {
            return Ok(None);
        }
        for condition in self
            .definition
            .relationships()
            .child_conditions_to(child.provider_name())
        {
            if let Some(parent) = self.fetch_parent(condition, child)? {
                return Ok(Some(parent));
            }
        }
        Ok(None)
    }

    fn fetch_parent(
        &self,
        condition: &ParentChildCondition,
        child: &Model,
    ) -> Result<Option<Model>, RelationshipError> {
        let filter = condition.inverse_filter_for(child)?;
        let found = self
            .provider(condition.source_name())?
            .fetch_first(&FetchConfig::with_filter(filter))?;
        tracing::trace!(
            child = ?child.model_id(),
            source = %condition.source_name(),
            found = found.is_some(),
            "parent lookup"
        );
        Ok(found)
    }

    /// Direct children of `parent`, optionally only those of `provider`.
    pub fn collect_children_of(
        &self,
        parent: &Model,
        provider: Option<&str>,
    ) -> Result<Vec<Model>, RelationshipError> {
        let mut children = Vec::new();
        for condition in self
            .definition
            .relationships()
            .child_conditions_from(parent.provider_name())
        {
            if provider.is_some_and(|p| p != condition.destination_name()) {
                continue;
            }
            let filter = condition.build_filter(parent)?;
            let found = self
                .provider(condition.destination_name())?
                .fetch_all(&FetchConfig::with_filter(filter))?;
            children.extend(found);
        }
        Ok(children)
    }

    /// Records sharing `model`'s parent (or its root level), including
    /// `model` itself. `parent_provider` narrows the parent search.
    pub fn collect_siblings_of(
        &self,
        model: &Model,
        parent_provider: Option<&str>,
    ) -> Result<Vec<Model>, RelationshipError> {
        let own_provider = model.provider_name();

        let parent = match (self.definition.basic().mode, parent_provider) {
            (ContainerMode::Hierarchical, Some(parent_provider)) if !self.manager().is_root(model) => {
                match self.definition.relationships().child_condition(parent_provider, own_provider) {
                    Some(condition) => self.fetch_parent(condition, model)?,
                    None => None,
                }
            }
            _ => self.search_parent_of(model)?,
        };

        if let Some(parent) = parent {
            return self.collect_children_of(&parent, Some(own_provider));
        }

        let filter = match self.definition.basic().mode {
            ContainerMode::Hierarchical => match self.definition.relationships().root_condition() {
                Some(root) if root.provider_name() == own_provider => root.filter()?,
                _ => Vec::new(),
            },
            ContainerMode::ParentedList => {
                tracing::warn!(model = ?model.model_id(), "record without parent in a parented list");
                return Ok(vec![model.clone()]);
            }
            ContainerMode::Flat => Vec::new(),
        };
        Ok(self
            .provider(own_provider)?
            .fetch_all(&FetchConfig::with_filter(filter))?)
    }

    /// Ids of the top-level records: the roots of a tree, every record of a
    /// flat container. Parented lists have no top level.
    pub fn collect_root_ids(&self) -> Result<Vec<ModelId>, RelationshipError> {
        let basic = self.definition.basic();
        let (provider, filter) = match basic.mode {
            ContainerMode::Hierarchical => {
                let root = self.definition.relationships().root_condition().ok_or_else(|| {
                    RelationshipError::config("hierarchical container has no root condition")
                })?;
                (root.provider_name(), root.filter()?)
            }
            ContainerMode::Flat => (basic.data_provider.as_str(), Vec::new()),
            ContainerMode::ParentedList => return Ok(Vec::new()),
        };
        Ok(self
            .provider(provider)?
            .fetch_all(&FetchConfig::with_filter(filter))?
            .iter()
            .filter_map(Record::model_id)
            .collect())
    }

    /// `id` and every record below it, breadth first. Ids already visited are
    /// not expanded again, so cyclic data terminates.
    pub fn collect_descendant_ids(&self, id: &ModelId) -> Result<Vec<ModelId>, RelationshipError> {
        let mut seen: BTreeSet<ModelId> = BTreeSet::new();
        let mut ordered = Vec::new();
        let mut queue = VecDeque::from([id.clone()]);

        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                tracing::debug!(id = %current, "cycle in record structure");
                continue;
            }
            ordered.push(current.clone());

            let Some(model) = self.get_model(&current)? else {
                continue;
            };
            for child in self.collect_children_of(&model, None)? {
                if let Some(child_id) = child.model_id() {
                    queue.push_back(child_id);
                }
            }
        }
        Ok(ordered)
    }
}
