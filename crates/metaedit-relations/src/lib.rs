//! Metaedit relationships
//!
//! Structural rules between records, resolved against data providers:
//!
//! ```text
//!   container JSON ──► ContainerDefinition ──┬─► PaletteCollection
//!                                            └─► ModelRelationshipDefinition
//!                                                   │ root / parent→child templates
//!                          ┌────────────────────────┼──────────────────────┐
//!                          ▼                        ▼                      ▼
//!                RelationshipManager          ModelCollector       RelationshipEnforcer
//!                set_parent / set_root     parents, children,     into / after / pid
//!                                          descendants             paste positioning
//!                                                   │
//!                                                   ▼
//!                                              Clipboard
//!                                    cut/copy/create + circular ids
//! ```
//!
//! Everything here is request scoped: definitions are immutable and borrowed,
//! records are owned by the caller.

pub mod clipboard;
pub mod collector;
pub mod condition;
pub mod config;
pub mod definition;
pub mod enforcer;
pub mod error;
pub mod manager;

#[cfg(test)]
mod tests;

pub use clipboard::{
    cut_with_descendants, Clipboard, ClipboardAction, ClipboardFilter, ClipboardItem, InMemorySessionStorage,
    SessionStorage, CLIPBOARD_SESSION_KEY,
};
pub use collector::ModelCollector;
pub use condition::{
    FilterTemplateRule, ParentChildCondition, RelationshipSetter, RootCondition, SetterKind, TemplateOperation,
};
pub use config::{ContainerConfig, ContainerDefinition};
pub use definition::{BasicDefinition, ContainerMode, ModelRelationshipDefinition};
pub use enforcer::{
    InputProvider, PasteState, PasteTarget, RelationshipEnforcer, RequestParameters, PARAM_AFTER, PARAM_INTO,
    PARAM_PID,
};
pub use error::{ConfigError, RelationshipError};
pub use manager::RelationshipManager;
