//! Data providers.
//!
//! The engine never executes storage queries itself; it hands filters to a
//! [`DataProvider`] and works with the returned [`Model`]s. Hosts plug in
//! their own providers; [`InMemoryProvider`] backs tests and the CLI.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ModelError;
use crate::filter::{matches_all, FilterRule};
use crate::id::RecordId;
use crate::model::{Model, Record};
use crate::value::compare_values;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// What to fetch: a filter (implicit AND), an optional sort order and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchConfig {
    pub filter: Vec<FilterRule>,
    pub sorting: Vec<(String, SortDirection)>,
    pub limit: Option<usize>,
}

impl FetchConfig {
    pub fn with_filter(filter: Vec<FilterRule>) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn sorted_by(mut self, property: &str, direction: SortDirection) -> Self {
        self.sorting.push((property.to_string(), direction));
        self
    }

    #[must_use]
    pub fn limited_to(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A logical data source (one table).
pub trait DataProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    fn fetch_all(&self, config: &FetchConfig) -> Result<Vec<Model>, ModelError>;

    fn fetch_one(&self, id: &RecordId) -> Result<Option<Model>, ModelError>;

    /// Insert or update; returns the (possibly assigned) id.
    fn save(&self, model: &Model) -> Result<RecordId, ModelError>;

    fn delete(&self, id: &RecordId) -> Result<bool, ModelError>;

    fn empty_model(&self) -> Model {
        Model::new(self.provider_name())
    }

    /// First record matching `config`, if any.
    fn fetch_first(&self, config: &FetchConfig) -> Result<Option<Model>, ModelError> {
        let mut config = config.clone();
        config.limit = Some(1);
        Ok(self.fetch_all(&config)?.into_iter().next())
    }
}

/// Provider holding its records in memory, in insertion order.
pub struct InMemoryProvider {
    name: String,
    records: RwLock<Vec<Model>>,
}

impl InMemoryProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RwLock::new(Vec::new()),
        }
    }

    /// Seed with records; models are re-homed to this provider.
    pub fn with_records(name: impl Into<String>, records: impl IntoIterator<Item = Model>) -> Self {
        let provider = Self::new(name);
        {
            let mut guard = provider.records.write();
            for record in records {
                guard.push(Model::from_json_object(provider.name.clone(), record.to_json_object()));
            }
        }
        provider
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    fn next_id(records: &[Model]) -> RecordId {
        let max = records
            .iter()
            .filter_map(|m| match m.id() {
                Some(RecordId::Int(i)) => Some(i),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        RecordId::Int(max + 1)
    }
}

impl DataProvider for InMemoryProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn fetch_all(&self, config: &FetchConfig) -> Result<Vec<Model>, ModelError> {
        let records = self.records.read();
        let mut out: Vec<Model> = records
            .iter()
            .filter(|m| matches_all(&config.filter, *m))
            .cloned()
            .collect();

        if !config.sorting.is_empty() {
            out.sort_by(|a, b| {
                for (property, direction) in &config.sorting {
                    let ord = compare_values(a.property(property), b.property(property))
                        .unwrap_or(std::cmp::Ordering::Equal);
                    let ord = match direction {
                        SortDirection::Ascending => ord,
                        SortDirection::Descending => ord.reverse(),
                    };
                    if ord != std::cmp::Ordering::Equal {
                        return ord;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }
        if let Some(limit) = config.limit {
            out.truncate(limit);
        }

        tracing::trace!(
            provider = %self.name,
            matched = out.len(),
            "in-memory fetch"
        );
        Ok(out)
    }

    fn fetch_one(&self, id: &RecordId) -> Result<Option<Model>, ModelError> {
        let wanted = id.to_value();
        Ok(self
            .records
            .read()
            .iter()
            .find(|m| m.property(crate::model::ID_PROPERTY) == Some(&wanted))
            .cloned())
    }

    fn save(&self, model: &Model) -> Result<RecordId, ModelError> {
        if model.provider_name() != self.name {
            return Err(ModelError::Provider {
                provider: self.name.clone(),
                message: format!(
                    "cannot save a model of provider `{}`",
                    model.provider_name()
                ),
            });
        }

        let mut records = self.records.write();
        let mut stored = model.clone();
        let id = match stored.id() {
            Some(id) => id,
            None => {
                let id = Self::next_id(&records);
                stored.set_id(id.clone());
                id
            }
        };

        let id_value: Value = id.to_value();
        match records
            .iter_mut()
            .find(|m| m.property(crate::model::ID_PROPERTY) == Some(&id_value))
        {
            Some(existing) => *existing = stored,
            None => records.push(stored),
        }
        Ok(id)
    }

    fn delete(&self, id: &RecordId) -> Result<bool, ModelError> {
        let wanted = id.to_value();
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|m| m.property(crate::model::ID_PROPERTY) != Some(&wanted));
        Ok(records.len() != before)
    }
}

/// Providers by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Arc<dyn DataProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, provider: Arc<dyn DataProvider>) {
        self.providers
            .insert(provider.provider_name().to_string(), provider);
    }

    #[must_use]
    pub fn with(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Result<&Arc<dyn DataProvider>, ModelError> {
        self.providers
            .get(name)
            .ok_or_else(|| ModelError::UnknownProvider(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers.keys().collect::<Vec<_>>())
            .finish()
    }
}
