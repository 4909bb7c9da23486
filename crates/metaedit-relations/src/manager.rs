use metaedit_model::{Model, Record};

use crate::definition::{ContainerMode, ModelRelationshipDefinition};
use crate::error::RelationshipError;

/// Applies a container's relationship definition to records, dispatching on
/// the container mode.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipManager<'a> {
    definition: &'a ModelRelationshipDefinition,
    mode: ContainerMode,
}

impl<'a> RelationshipManager<'a> {
    pub fn new(definition: &'a ModelRelationshipDefinition, mode: ContainerMode) -> Self {
        Self { definition, mode }
    }

    pub fn mode(&self) -> ContainerMode {
        self.mode
    }

    pub fn definition(&self) -> &'a ModelRelationshipDefinition {
        self.definition
    }

    /// Only hierarchical containers have roots.
    pub fn is_root(&self, model: &dyn Record) -> bool {
        match self.mode {
            ContainerMode::Hierarchical => self
                .definition
                .root_condition()
                .is_some_and(|root| root.matches(model)),
            ContainerMode::Flat | ContainerMode::ParentedList => false,
        }
    }

    pub fn set_root(&self, model: &mut dyn Record) -> Result<(), RelationshipError> {
        match self.mode {
            ContainerMode::Hierarchical => {
                let root = self.definition.root_condition().ok_or_else(|| {
                    RelationshipError::config("hierarchical container has no root condition")
                })?;
                root.apply_to(model)
            }
            ContainerMode::Flat | ContainerMode::ParentedList => Ok(()),
        }
    }

    pub fn set_parent(&self, child: &mut dyn Record, parent: &dyn Record) -> Result<(), RelationshipError> {
        if self.mode == ContainerMode::Flat {
            return Ok(());
        }
        let condition = self
            .definition
            .child_condition(parent.provider_name(), child.provider_name())
            .ok_or_else(|| {
                RelationshipError::config(format!(
                    "no relationship from `{}` to `{}`",
                    parent.provider_name(),
                    child.provider_name()
                ))
            })?;
        condition.apply_to(parent, child)
    }

    pub fn set_all_root(&self, models: &mut [Model]) -> Result<(), RelationshipError> {
        models.iter_mut().try_for_each(|m| self.set_root(m))
    }

    pub fn set_parent_for_all(&self, models: &mut [Model], parent: &dyn Record) -> Result<(), RelationshipError> {
        models.iter_mut().try_for_each(|m| self.set_parent(m, parent))
    }

    /// Give `receiver` the same structural position as `source`: a root when
    /// `source` is a root, otherwise the same parent (of `parent_provider`).
    pub fn set_same_parent(
        &self,
        receiver: &mut dyn Record,
        source: &dyn Record,
        parent_provider: &str,
    ) -> Result<(), RelationshipError> {
        if self.is_root(source) {
            return self.set_root(receiver);
        }
        if self.mode == ContainerMode::Flat {
            return Ok(());
        }
        let condition = self
            .definition
            .child_condition(parent_provider, source.provider_name())
            .ok_or_else(|| {
                RelationshipError::config(format!(
                    "no relationship from `{parent_provider}` to `{}`",
                    source.provider_name()
                ))
            })?;
        condition.copy_from(source, receiver)
    }

    pub fn set_same_parent_for_all(
        &self,
        models: &mut [Model],
        source: &dyn Record,
        parent_provider: &str,
    ) -> Result<(), RelationshipError> {
        models
            .iter_mut()
            .try_for_each(|m| self.set_same_parent(m, source, parent_provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{FilterTemplateRule, ParentChildCondition, RelationshipSetter, RootCondition};
    use serde_json::json;

    fn pages() -> ModelRelationshipDefinition {
        ModelRelationshipDefinition::new()
            .with_root_condition(
                RootCondition::new("tl_page")
                    .with_filter(vec![FilterTemplateRule::literal("pid", 0)])
                    .with_setters(vec![RelationshipSetter::literal("pid", 0)]),
            )
            .with_child_condition(
                ParentChildCondition::new("tl_page", "tl_page")
                    .with_filter(vec![FilterTemplateRule::link("id", "pid")])
                    .with_setters(vec![RelationshipSetter::link("pid", "id")]),
            )
    }

    #[test]
    fn hierarchical_dispatch() {
        let definition = pages();
        let manager = RelationshipManager::new(&definition, ContainerMode::Hierarchical);
        let parent = Model::with_id("tl_page", 1).with_property("pid", 0);
        let mut child = Model::with_id("tl_page", 2).with_property("pid", 0);

        assert!(manager.is_root(&child));
        manager.set_parent(&mut child, &parent).unwrap();
        assert_eq!(child.property("pid"), Some(&json!(1)));
        assert!(!manager.is_root(&child));

        manager.set_root(&mut child).unwrap();
        assert!(manager.is_root(&child));
    }

    #[test]
    fn flat_mode_ignores_structure() {
        let definition = pages();
        let manager = RelationshipManager::new(&definition, ContainerMode::Flat);
        let parent = Model::with_id("tl_page", 1);
        let mut child = Model::with_id("tl_page", 2).with_property("pid", 0);
        manager.set_parent(&mut child, &parent).unwrap();
        manager.set_root(&mut child).unwrap();
        assert_eq!(child.property("pid"), Some(&json!(0)));
        assert!(!manager.is_root(&child));
    }

    #[test]
    fn missing_condition_is_a_configuration_error() {
        let definition = pages();
        let manager = RelationshipManager::new(&definition, ContainerMode::ParentedList);
        let parent = Model::with_id("tl_article", 1);
        let mut child = Model::with_id("tl_content", 2);
        assert!(matches!(
            manager.set_parent(&mut child, &parent),
            Err(RelationshipError::Configuration(_))
        ));

        let empty = ModelRelationshipDefinition::new();
        let manager = RelationshipManager::new(&empty, ContainerMode::Hierarchical);
        assert!(manager.set_root(&mut child).is_err());
    }

    #[test]
    fn same_parent_follows_the_source() {
        let definition = pages();
        let manager = RelationshipManager::new(&definition, ContainerMode::Hierarchical);

        let nested = Model::with_id("tl_page", 5).with_property("pid", 3);
        let root = Model::with_id("tl_page", 6).with_property("pid", 0);
        let mut pasted = vec![
            Model::with_id("tl_page", 7).with_property("pid", 9),
            Model::with_id("tl_page", 8),
        ];

        manager.set_same_parent_for_all(&mut pasted, &nested, "tl_page").unwrap();
        assert!(pasted.iter().all(|m| m.property("pid") == Some(&json!(3))));

        manager.set_same_parent_for_all(&mut pasted, &root, "tl_page").unwrap();
        assert!(pasted.iter().all(|m| manager.is_root(m)));

        let parent = Model::with_id("tl_page", 2);
        manager.set_parent_for_all(&mut pasted, &parent).unwrap();
        assert!(pasted.iter().all(|m| m.property("pid") == Some(&json!(2))));
        manager.set_all_root(&mut pasted).unwrap();
        assert!(pasted.iter().all(|m| manager.is_root(m)));
    }
}
