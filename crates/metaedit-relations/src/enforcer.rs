//! Positioning pasted and created records.
//!
//! A paste request names where the record goes through request parameters:
//!
//! - `into=<model id>`: become a child of that record (`provider::0` means the
//!   tree root level)
//! - `after=<model id>`: become a sibling following that record
//! - `pid=<model id>`: the parent, set last and overriding the above
//!
//! Every one of them is rejected when it names a record in the clipboard's
//! circular set.
//!
//! In a hierarchical container the enforcer walks
//! `Idle → TargetResolved → ParentDetermined → RelationshipApplied`, or ends in
//! `RootAssigned` when the record lands on the root level.

use metaedit_model::{Model, ModelId, ProviderRegistry, Record};
use std::collections::BTreeMap;

use crate::clipboard::Clipboard;
use crate::collector::ModelCollector;
use crate::config::ContainerDefinition;
use crate::definition::ContainerMode;
use crate::error::RelationshipError;
use crate::manager::RelationshipManager;

pub const PARAM_INTO: &str = "into";
pub const PARAM_AFTER: &str = "after";
pub const PARAM_PID: &str = "pid";

/// Read access to request parameters.
pub trait InputProvider {
    fn parameter(&self, name: &str) -> Option<&str>;

    fn has_parameter(&self, name: &str) -> bool {
        self.parameter(name).is_some()
    }
}

/// Request parameters held in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParameters {
    values: BTreeMap<String, String>,
}

impl RequestParameters {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }
}

impl InputProvider for RequestParameters {
    fn parameter(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteTarget {
    Into(ModelId),
    After(ModelId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PasteState {
    Idle,
    TargetResolved(PasteTarget),
    ParentDetermined(Model),
    RelationshipApplied { parent: Option<ModelId> },
    RootAssigned,
}

/// Applies paste/create positioning to records.
#[derive(Debug, Clone, Copy)]
pub struct RelationshipEnforcer<'a> {
    mode: ContainerMode,
    manager: RelationshipManager<'a>,
    collector: ModelCollector<'a>,
}

impl<'a> RelationshipEnforcer<'a> {
    pub fn new(definition: &'a ContainerDefinition, providers: &'a ProviderRegistry) -> Self {
        let collector = ModelCollector::new(definition, providers);
        Self {
            mode: definition.basic().mode,
            manager: collector.manager(),
            collector,
        }
    }

    /// Position `model` according to the request. Returns the final state.
    pub fn enforce(
        &self,
        model: &mut Model,
        input: &dyn InputProvider,
        clipboard: &Clipboard,
    ) -> Result<PasteState, RelationshipError> {
        let mut state = match self.mode {
            ContainerMode::Flat => PasteState::Idle,
            ContainerMode::Hierarchical | ContainerMode::ParentedList => {
                Self::resolve_target(input, clipboard)?
            }
        };

        let mut state = loop {
            tracing::trace!(?state, "paste state");
            state = match state {
                PasteState::TargetResolved(target) => self.determine_parent(model, target)?,
                PasteState::ParentDetermined(parent) => self.apply_parent(model, &parent)?,
                terminal => break terminal,
            };
        };

        if let Some(pid) = Self::model_id_parameter(input, PARAM_PID)? {
            Self::reject_circular(&pid, clipboard)?;
            let parent = self.fetch_required(&pid)?;
            state = self.apply_parent(model, &parent)?;
        }
        tracing::debug!(model = ?model.id(), ?state, "paste enforced");
        Ok(state)
    }

    /// `TargetResolved → ParentDetermined`, or straight to a terminal state.
    fn determine_parent(&self, model: &mut Model, target: PasteTarget) -> Result<PasteState, RelationshipError> {
        let hierarchical = self.mode == ContainerMode::Hierarchical;
        match target {
            PasteTarget::Into(id) if id.id().is_zero() => {
                if hierarchical {
                    self.assign_root(model)
                } else {
                    Ok(PasteState::Idle)
                }
            }
            PasteTarget::Into(id) => Ok(PasteState::ParentDetermined(self.fetch_required(&id)?)),
            PasteTarget::After(id) => {
                let sibling = match self.collector.get_model(&id)? {
                    Some(sibling) if !self.manager.is_root(&sibling) => sibling,
                    _ if hierarchical => return self.assign_root(model),
                    _ => return Ok(PasteState::Idle),
                };
                match self.collector.search_parent_of(&sibling)? {
                    Some(parent) => Ok(PasteState::ParentDetermined(parent)),
                    None if hierarchical => {
                        tracing::warn!(sibling = %id, "sibling has no parent, inserting at root");
                        self.assign_root(model)
                    }
                    None => {
                        tracing::warn!(sibling = %id, "sibling has no parent, position unchanged");
                        Ok(PasteState::Idle)
                    }
                }
            }
        }
    }

    /// `Idle → TargetResolved`. Circular targets are rejected.
    fn resolve_target(input: &dyn InputProvider, clipboard: &Clipboard) -> Result<PasteState, RelationshipError> {
        let target = match Self::model_id_parameter(input, PARAM_INTO)? {
            Some(id) => PasteTarget::Into(id),
            None => match Self::model_id_parameter(input, PARAM_AFTER)? {
                Some(id) => PasteTarget::After(id),
                None => return Ok(PasteState::Idle),
            },
        };

        let (PasteTarget::Into(id) | PasteTarget::After(id)) = &target;
        Self::reject_circular(id, clipboard)?;
        Ok(PasteState::TargetResolved(target))
    }

    fn reject_circular(id: &ModelId, clipboard: &Clipboard) -> Result<(), RelationshipError> {
        if clipboard.is_circular(id) {
            return Err(RelationshipError::CircularReference(id.serialized()));
        }
        Ok(())
    }

    fn model_id_parameter(input: &dyn InputProvider, name: &str) -> Result<Option<ModelId>, RelationshipError> {
        match input.parameter(name) {
            Some(raw) if !raw.is_empty() => Ok(Some(ModelId::from_serialized(raw)?)),
            _ => Ok(None),
        }
    }

    fn fetch_required(&self, id: &ModelId) -> Result<Model, RelationshipError> {
        self.collector
            .get_model(id)?
            .ok_or_else(|| RelationshipError::ModelNotFound(id.serialized()))
    }

    /// `ParentDetermined → RelationshipApplied`.
    fn apply_parent(&self, model: &mut Model, parent: &Model) -> Result<PasteState, RelationshipError> {
        self.manager.set_parent(model, parent)?;
        Ok(PasteState::RelationshipApplied {
            parent: parent.model_id(),
        })
    }

    fn assign_root(&self, model: &mut Model) -> Result<PasteState, RelationshipError> {
        self.manager.set_root(model)?;
        Ok(PasteState::RootAssigned)
    }
}
