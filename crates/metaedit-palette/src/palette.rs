//! Palettes and palette collections.

use metaedit_model::{PropertyValueBag, Record};
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, MatchResult};
use crate::error::PaletteError;
use crate::legend::Legend;
use crate::property::Property;

/// Selector of the unconditional palette.
pub const DEFAULT_PALETTE: &str = "default";

/// A named, conditionally selected layout of legends.
///
/// `Clone` is deep: the condition tree and every legend (with their property
/// conditions) are copied, so request-scoped copies never alias the compiled
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    name: String,
    condition: Condition,
    #[serde(default)]
    legends: Vec<Legend>,
}

impl Palette {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            condition: Condition::Default,
            legends: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    pub fn condition_mut(&mut self) -> &mut Condition {
        &mut self.condition
    }

    pub fn set_condition(&mut self, condition: Condition) {
        self.condition = condition;
    }

    pub fn match_count(
        &self,
        record: Option<&dyn Record>,
        input: Option<&PropertyValueBag>,
    ) -> MatchResult {
        self.condition.match_count(record, input)
    }

    /// Append a legend, or insert it before the legend named `before`.
    pub fn add_legend(&mut self, legend: Legend, before: Option<&str>) {
        let position = before
            .and_then(|name| self.legends.iter().position(|l| l.name() == name))
            .unwrap_or(self.legends.len());
        self.legends.insert(position, legend);
    }

    pub fn has_legend(&self, name: &str) -> bool {
        self.legends.iter().any(|l| l.name() == name)
    }

    pub fn legend(&self, name: &str) -> Option<&Legend> {
        self.legends.iter().find(|l| l.name() == name)
    }

    pub fn legend_mut(&mut self, name: &str) -> Option<&mut Legend> {
        self.legends.iter_mut().find(|l| l.name() == name)
    }

    /// The legend named `name`, created (appended) when missing.
    pub fn legend_or_insert(&mut self, name: &str) -> &mut Legend {
        let idx = match self.legends.iter().position(|l| l.name() == name) {
            Some(idx) => idx,
            None => {
                self.legends.push(Legend::new(name));
                self.legends.len() - 1
            }
        };
        &mut self.legends[idx]
    }

    pub fn remove_legend(&mut self, name: &str) -> Option<Legend> {
        let idx = self.legends.iter().position(|l| l.name() == name)?;
        Some(self.legends.remove(idx))
    }

    pub fn legends(&self) -> &[Legend] {
        &self.legends
    }

    /// Visible properties across all legends, in layout order.
    pub fn properties(
        &self,
        record: Option<&dyn Record>,
        input: Option<&PropertyValueBag>,
    ) -> Vec<&Property> {
        self.legends
            .iter()
            .flat_map(|l| l.visible_properties(record, input))
            .collect()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.legends.iter().find_map(|l| l.property(name))
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.legends.iter_mut().find_map(|l| l.property_mut(name))
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }
}

/// All palettes of a container, in definition order. Names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaletteCollection {
    palettes: Vec<Palette>,
}

impl PaletteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a palette; a palette with the same name is replaced in place.
    pub fn add_palette(&mut self, palette: Palette) {
        match self.palettes.iter_mut().find(|p| p.name() == palette.name()) {
            Some(existing) => *existing = palette,
            None => self.palettes.push(palette),
        }
    }

    pub fn has_palette(&self, name: &str) -> bool {
        self.palettes.iter().any(|p| p.name() == name)
    }

    pub fn palette_by_name(&self, name: &str) -> Result<&Palette, PaletteError> {
        self.palettes
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| PaletteError::UnknownPalette(name.to_string()))
    }

    pub fn palette_by_name_mut(&mut self, name: &str) -> Result<&mut Palette, PaletteError> {
        self.palettes
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| PaletteError::UnknownPalette(name.to_string()))
    }

    pub fn remove_palette(&mut self, name: &str) -> Option<Palette> {
        let idx = self.palettes.iter().position(|p| p.name() == name)?;
        Some(self.palettes.remove(idx))
    }

    pub fn palettes(&self) -> &[Palette] {
        &self.palettes
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    pub fn clear(&mut self) {
        self.palettes.clear();
    }

    /// Pick the palette with the highest match score.
    ///
    /// Fails with [`PaletteError::NoMatch`] when nothing matches and with
    /// [`PaletteError::Ambiguous`] when several palettes share the top score.
    pub fn find_palette(
        &self,
        record: Option<&dyn Record>,
        input: Option<&PropertyValueBag>,
    ) -> Result<&Palette, PaletteError> {
        let mut best: Option<u32> = None;
        let mut winners: Vec<&Palette> = Vec::new();

        for palette in &self.palettes {
            let MatchResult::Match(score) = palette.match_count(record, input) else {
                continue;
            };
            match best {
                Some(top) if score < top => {}
                Some(top) if score == top => winners.push(palette),
                _ => {
                    best = Some(score);
                    winners.clear();
                    winners.push(palette);
                }
            }
        }

        match (best, winners.as_slice()) {
            (Some(_), [single]) => {
                tracing::debug!(palette = %single.name(), "palette selected");
                Ok(*single)
            }
            (Some(score), many) if !many.is_empty() => Err(PaletteError::Ambiguous {
                score,
                names: many.iter().map(|p| p.name().to_string()).collect(),
            }),
            _ => Err(PaletteError::NoMatch),
        }
    }
}
