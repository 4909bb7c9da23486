//! Compiler for the legacy palette mini-language.
//!
//! A legacy definition is a map `selector -> field list` plus an optional map
//! of sub-palettes (`selector_value -> field list`). Selectors are either
//! `default` or a concatenation of selector-field values and names; field
//! lists are `;`/`,` separated, with `{name_legend}` tokens opening legends:
//!
//! ```text
//! __selector__ = ["type", "addImage"]
//! default      = "{title_legend},title,type"
//! textaddImage = "{title_legend},title,type;{image_legend:hide},addImage"
//! addImage     = "singleSRC,size"            (sub-palette)
//! ```
//!
//! Sub-palette fields are inserted right after their selector field with a
//! visible condition derived from the sub-palette key.

use std::collections::BTreeMap;

use nom::{
    bytes::complete::{tag, take_till1},
    character::complete::char as pchar,
    combinator::{all_consuming, opt},
    IResult,
};
use serde_json::Value;

use crate::condition::{Condition, ConditionChain, Conjunction};
use crate::error::PaletteError;
use crate::legend::UNNAMED_LEGEND;
use crate::palette::{Palette, PaletteCollection, DEFAULT_PALETTE};
use crate::property::Property;

/// Reserved palette key listing the selector field names.
pub const SELECTOR_KEY: &str = "__selector__";

// ============================================================================
// Source
// ============================================================================

/// Raw legacy palette definitions. Builder calls keep their call order;
/// [`LegacyPalettes::from_json`] yields entries sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyPalettes {
    selectors: Vec<String>,
    palettes: Vec<(String, String)>,
    subpalettes: Vec<(String, String)>,
}

impl LegacyPalettes {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_selector(mut self, name: impl Into<String>) -> Self {
        self.selectors.push(name.into());
        self
    }

    #[must_use]
    pub fn with_palette(mut self, selector: impl Into<String>, fields: impl Into<String>) -> Self {
        self.palettes.push((selector.into(), fields.into()));
        self
    }

    #[must_use]
    pub fn with_subpalette(mut self, key: impl Into<String>, fields: impl Into<String>) -> Self {
        self.subpalettes.push((key.into(), fields.into()));
        self
    }

    /// Read the JSON shape used by container definitions: `palettes` is an
    /// object of strings with an optional `__selector__` array, `subpalettes`
    /// an object of strings. Non-string entries are skipped. Entries come out
    /// in the map's key order (sorted), not the order written in the file.
    pub fn from_json(palettes: &Value, subpalettes: Option<&Value>) -> Result<Self, PaletteError> {
        let palettes = palettes
            .as_object()
            .ok_or_else(|| PaletteError::Configuration {
                selector: "palettes".to_string(),
                message: "expected an object of field lists".to_string(),
            })?;

        let mut source = Self::new();
        for (key, value) in palettes {
            if key == SELECTOR_KEY {
                let names = value.as_array().ok_or_else(|| PaletteError::Configuration {
                    selector: SELECTOR_KEY.to_string(),
                    message: "expected an array of field names".to_string(),
                })?;
                for name in names {
                    match name.as_str() {
                        Some(name) => source.selectors.push(name.to_string()),
                        None => tracing::debug!(%name, "skipping non-string selector name"),
                    }
                }
                continue;
            }
            match value.as_str() {
                Some(fields) => source.palettes.push((key.clone(), fields.to_string())),
                None => tracing::debug!(selector = %key, "skipping non-string palette"),
            }
        }

        if let Some(subpalettes) = subpalettes {
            let map = subpalettes
                .as_object()
                .ok_or_else(|| PaletteError::Configuration {
                    selector: "subpalettes".to_string(),
                    message: "expected an object of field lists".to_string(),
                })?;
            for (key, value) in map {
                match value.as_str() {
                    Some(fields) => source.subpalettes.push((key.clone(), fields.to_string())),
                    None => tracing::debug!(subpalette = %key, "skipping non-string sub-palette"),
                }
            }
        }

        Ok(source)
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }

    pub fn palettes(&self) -> &[(String, String)] {
        &self.palettes
    }

    pub fn subpalettes(&self) -> &[(String, String)] {
        &self.subpalettes
    }
}

/// Sub-palette fields keyed by the selector field that owns them.
pub type SubPalettes = BTreeMap<String, Vec<Property>>;

// ============================================================================
// Grammar
// ============================================================================

fn legend_token(input: &str) -> IResult<&str, (&str, bool)> {
    let (input, _) = pchar('{')(input)?;
    let (input, name) = take_till1(|c| c == ':' || c == '}')(input)?;
    let (input, hide) = opt(tag(":hide"))(input)?;
    let (input, _) = pchar('}')(input)?;
    let name = name.strip_suffix("_legend").unwrap_or(name);
    Ok((input, (name, hide.is_some())))
}

/// `{name}`, `{name_legend}`, `{name:hide}` or `{name_legend:hide}` →
/// `(name, hidden)`.
pub fn parse_legend_token(token: &str) -> Option<(&str, bool)> {
    all_consuming(legend_token)(token).ok().map(|(_, parsed)| parsed)
}

fn split_fields(fields: &str) -> impl Iterator<Item = &str> {
    fields
        .split(|c| c == ';' || c == ',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
}

/// Selector names in first-seen order without duplicates.
fn merge_selectors(declared: &[String], extra: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(declared.len() + extra.len());
    for name in declared.iter().chain(extra) {
        if !merged.contains(name) {
            merged.push(name.clone());
        }
    }
    merged
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyPaletteParser;

impl LegacyPaletteParser {
    pub fn new() -> Self {
        Self
    }

    /// Compile `source` into `collection` (or a fresh one).
    pub fn parse(
        &self,
        source: &LegacyPalettes,
        extra_selectors: &[String],
        collection: Option<PaletteCollection>,
    ) -> PaletteCollection {
        let selectors = merge_selectors(source.selectors(), extra_selectors);
        let subpalettes = self.parse_subpalettes(source.subpalettes(), &selectors);
        let mut collection = collection.unwrap_or_default();
        self.parse_palettes(source.palettes(), &subpalettes, &selectors, &mut collection);
        collection
    }

    pub fn parse_subpalettes(&self, subpalettes: &[(String, String)], selectors: &[String]) -> SubPalettes {
        let mut parsed = SubPalettes::new();
        for (key, fields) in subpalettes {
            let field_name = self.create_subpalette_selector_field_name(key, selectors);
            let condition = self.create_subpalette_condition(key, selectors);
            tracing::debug!(subpalette = %key, selector = %field_name, %condition, "sub-palette");

            let children = parsed.entry(field_name).or_default();
            for field in split_fields(fields) {
                children.push(Property::new(field).with_visible_condition(condition.clone()));
            }
        }
        parsed
    }

    pub fn parse_palettes(
        &self,
        palettes: &[(String, String)],
        subpalettes: &SubPalettes,
        selectors: &[String],
        collection: &mut PaletteCollection,
    ) {
        for (selector, fields) in palettes {
            if selector == SELECTOR_KEY {
                continue;
            }
            let existing = collection.palette_by_name(selector).ok().cloned();
            let palette = self.parse_palette(selector, fields, subpalettes, selectors, existing);
            collection.add_palette(palette);
        }
    }

    /// Build one palette, merging into `existing` when given. The palette's
    /// condition is always the freshly derived one.
    pub fn parse_palette(
        &self,
        selector: &str,
        fields: &str,
        subpalettes: &SubPalettes,
        selectors: &[String],
        existing: Option<Palette>,
    ) -> Palette {
        let mut palette = existing.unwrap_or_else(|| Palette::new(selector));
        palette.set_condition(self.create_palette_condition(selector, selectors));

        let mut current = UNNAMED_LEGEND.to_string();
        let mut path = Vec::new();
        for field in split_fields(fields) {
            if let Some((legend, hidden)) = parse_legend_token(field) {
                current = legend.to_string();
                palette.legend_or_insert(&current).set_initially_visible(!hidden);
                continue;
            }
            if field.starts_with('{') {
                tracing::debug!(%selector, token = %field, "malformed legend token kept as field");
            }
            place_field(&mut palette, &current, Property::new(field), subpalettes, &mut path);
        }
        palette
    }

    /// Condition selecting a palette from its selector string.
    pub fn create_palette_condition(&self, selector: &str, selectors: &[String]) -> Condition {
        if selector == DEFAULT_PALETTE {
            return Condition::Default;
        }

        let mut working = selector.to_string();
        if !working.contains('|') {
            for name in selectors.iter().filter(|name| !name.is_empty()) {
                working = working.replace(name.as_str(), &format!("|{name}|"));
            }
        }

        let mut chain = ConditionChain::new(Conjunction::And);
        for token in working.split('|').map(str::trim).filter(|t| !t.is_empty()) {
            if selectors.iter().any(|name| name == token) {
                chain.add_condition(Condition::property_true(token));
            } else {
                chain.add_condition(Condition::or(
                    selectors
                        .iter()
                        .map(|name| Condition::property_value(name.as_str(), token))
                        .collect(),
                ));
            }
        }
        chain.into()
    }

    /// Field owning the sub-palette `key`: the key itself when it is a
    /// selector, else the shortest `_`-delimited prefix that is one, else the
    /// whole key.
    pub fn create_subpalette_selector_field_name(&self, key: &str, selectors: &[String]) -> String {
        if is_selector(key, selectors) {
            return key.to_string();
        }
        underscore_splits(key)
            .find(|(prefix, _)| is_selector(prefix, selectors))
            .map_or_else(
                || {
                    tracing::debug!(subpalette = %key, "no selector prefix, using the whole key");
                    key.to_string()
                },
                |(prefix, _)| prefix.to_string(),
            )
    }

    pub fn create_subpalette_condition(&self, key: &str, selectors: &[String]) -> Condition {
        if is_selector(key, selectors) {
            return Condition::property_true(key);
        }
        underscore_splits(key)
            .find(|(prefix, rest)| !rest.is_empty() && is_selector(prefix, selectors))
            .map_or_else(
                || Condition::property_true(key),
                |(prefix, rest)| Condition::property_value(prefix, rest),
            )
    }
}

fn is_selector(name: &str, selectors: &[String]) -> bool {
    selectors.iter().any(|s| s == name)
}

/// `(prefix, remainder)` for every `_` in `key`, shortest prefix first.
fn underscore_splits(key: &str) -> impl Iterator<Item = (&str, &str)> {
    key.match_indices('_')
        .map(move |(idx, _)| (&key[..idx], &key[idx + 1..]))
}

/// Append `property` to `legend`, followed by the sub-palette fields it owns.
/// Nested sub-palette fields require every enclosing condition.
fn place_field(
    palette: &mut Palette,
    legend: &str,
    property: Property,
    subpalettes: &SubPalettes,
    path: &mut Vec<String>,
) {
    let name = property.name().to_string();
    let outer = property.visible_condition().cloned();
    palette.legend_or_insert(legend).add_property(property);

    let Some(children) = subpalettes.get(&name) else {
        return;
    };
    if path.contains(&name) {
        tracing::debug!(selector = %name, "sub-palette cycle, not expanding again");
        return;
    }

    path.push(name);
    for child in children {
        let mut child = child.clone();
        if let (Some(outer), Some(inner)) = (outer.as_ref(), child.visible_condition()) {
            let combined = Condition::and(vec![outer.clone(), inner.clone()]);
            child.set_visible_condition(Some(combined));
        }
        place_field(palette, legend, child, subpalettes, path);
    }
    path.pop();
}
