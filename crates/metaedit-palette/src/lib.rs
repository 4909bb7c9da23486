//! Metaedit palettes
//!
//! Edit forms are described by palettes: a palette is chosen per record by a
//! weighted [`Condition`], and groups fields into [`Legend`]s whose
//! [`Property`] entries carry their own visibility conditions.
//!
//! Palettes are usually compiled from the legacy string mini-language by
//! [`LegacyPaletteParser`]; the compiled [`PaletteCollection`] is immutable
//! configuration and can be shared across requests.

pub mod condition;
pub mod error;
pub mod legacy;
pub mod legend;
pub mod palette;
pub mod property;

pub use condition::{Condition, ConditionChain, Conjunction, MatchResult};
pub use error::PaletteError;
pub use legacy::{parse_legend_token, LegacyPaletteParser, LegacyPalettes, SubPalettes, SELECTOR_KEY};
pub use legend::{Legend, UNNAMED_LEGEND};
pub use palette::{Palette, PaletteCollection, DEFAULT_PALETTE};
pub use property::Property;
