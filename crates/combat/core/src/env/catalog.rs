//! In-memory oracle implementations backed by maps.
//!
//! Content loaders fill these; tests build them directly.

use std::collections::HashMap;

use crate::state::SpellId;

use super::{ProcBehavior, SpecialCaseOracle, SpellTemplate, TemplateOracle};

#[derive(Clone, Debug, Default)]
pub struct TemplateCatalog {
    templates: HashMap<SpellId, SpellTemplate>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a template, returning the one it replaced.
    pub fn insert(&mut self, template: SpellTemplate) -> Option<SpellTemplate> {
        self.templates.insert(template.id, template)
    }

    pub fn with(mut self, template: SpellTemplate) -> Self {
        self.insert(template);
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn contains(&self, id: SpellId) -> bool {
        self.templates.contains_key(&id)
    }

    /// Templates ordered by id.
    pub fn sorted(&self) -> Vec<&SpellTemplate> {
        let mut templates: Vec<_> = self.templates.values().collect();
        templates.sort_by_key(|template| template.id);
        templates
    }
}

impl FromIterator<SpellTemplate> for TemplateCatalog {
    fn from_iter<T: IntoIterator<Item = SpellTemplate>>(iter: T) -> Self {
        let mut catalog = Self::new();
        for template in iter {
            catalog.insert(template);
        }
        catalog
    }
}

impl TemplateOracle for TemplateCatalog {
    fn template(&self, id: SpellId) -> Option<&SpellTemplate> {
        self.templates.get(&id)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SpecialTable {
    procs: HashMap<SpellId, ProcBehavior>,
    damage_bonus: HashMap<SpellId, i32>,
}

impl SpecialTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proc(mut self, spell: SpellId, behavior: ProcBehavior) -> Self {
        self.procs.insert(spell, behavior);
        self
    }

    pub fn with_damage_bonus(mut self, spell: SpellId, pct: i32) -> Self {
        self.damage_bonus.insert(spell, pct);
        self
    }

    pub fn insert_proc(&mut self, spell: SpellId, behavior: ProcBehavior) {
        self.procs.insert(spell, behavior);
    }

    pub fn insert_damage_bonus(&mut self, spell: SpellId, pct: i32) {
        self.damage_bonus.insert(spell, pct);
    }

    pub fn len(&self) -> usize {
        self.procs.len() + self.damage_bonus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn spells(&self) -> impl Iterator<Item = SpellId> + '_ {
        self.procs.keys().chain(self.damage_bonus.keys()).copied()
    }
}

impl SpecialCaseOracle for SpecialTable {
    fn proc_behavior(&self, spell: SpellId) -> Option<&ProcBehavior> {
        self.procs.get(&spell)
    }

    fn damage_bonus_pct(&self, spell: SpellId) -> Option<i32> {
        self.damage_bonus.get(&spell).copied()
    }
}
