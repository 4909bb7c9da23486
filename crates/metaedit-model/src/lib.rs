//! Metaedit record layer
//!
//! The data the condition and relationship engines operate on:
//!
//! - **Records**: [`Record`] capability trait and the bundled [`Model`]
//! - **Pending input**: [`PropertyValueBag`] (values submitted but not yet committed)
//! - **Identity**: [`ModelId`] with its canonical `provider::id` form
//! - **Filters**: [`FilterRule`] / [`FilterBuilder`], evaluated by providers
//! - **Providers**: [`DataProvider`], [`ProviderRegistry`], [`InMemoryProvider`]
//!
//! Values are plain JSON values compared with legacy loose semantics
//! (see [`value`]).

pub mod error;
pub mod filter;
pub mod id;
pub mod model;
pub mod provider;
pub mod value;

pub use error::ModelError;
pub use filter::{matches_all, ComparisonOperator, FilterBuilder, FilterRule};
pub use id::{ModelId, RecordId};
pub use model::{effective_value, Model, PropertyValueBag, Record, ID_PROPERTY};
pub use provider::{DataProvider, FetchConfig, InMemoryProvider, ProviderRegistry, SortDirection};

pub use serde_json::Value;
