//! In-memory document store.
//!
//! Implements every store port over plain fields.  Used by the
//! integration tests and by `--ticks` dry runs where nothing should touch
//! the filesystem.

use std::collections::BTreeMap;

use crate::app::ports::{
    ControlStore, HistoryEntry, HistorySink, Recipe, RecipeBook, SettingsStore, StoreError,
};
use crate::config::Settings;
use crate::control_state::ControlState;

#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Option<Settings>,
    control: Option<ControlState>,
    history: Vec<HistoryEntry>,
    recipes: BTreeMap<String, Recipe>,
    control_writes: usize,
}

impl MemoryStore {
    /// A store holding `settings` and no control document yet.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Some(settings),
            ..Self::default()
        }
    }

    pub fn with_control(mut self, control: ControlState) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_recipe(mut self, recipe: Recipe) -> Self {
        self.recipes.insert(recipe.name.clone(), recipe);
        self
    }

    pub fn insert_recipe(&mut self, recipe: Recipe) {
        self.recipes.insert(recipe.name.clone(), recipe);
    }

    /// Replace the settings document, as an external editor would.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = Some(settings);
    }

    pub fn settings_mut(&mut self) -> Option<&mut Settings> {
        self.settings.as_mut()
    }

    /// Mutable access to the stored control document, as an external
    /// writer (web UI) would have.  Creates a default document if none
    /// was written yet.
    pub fn control_mut(&mut self) -> &mut ControlState {
        let settings = self.settings.clone().unwrap_or_default();
        self.control
            .get_or_insert_with(|| ControlState::with_defaults(&settings))
    }

    pub fn control(&self) -> Option<&ControlState> {
        self.control.as_ref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Number of control-document writes seen so far.
    pub fn control_writes(&self) -> usize {
        self.control_writes
    }
}

impl SettingsStore for MemoryStore {
    fn read_settings(&self) -> Result<Settings, StoreError> {
        self.settings.clone().ok_or(StoreError::NotFound)
    }
}

impl ControlStore for MemoryStore {
    fn read_control(&self) -> Result<ControlState, StoreError> {
        self.control.clone().ok_or(StoreError::NotFound)
    }

    fn write_control(&mut self, control: &ControlState) -> Result<(), StoreError> {
        self.control = Some(control.clone());
        self.control_writes += 1;
        Ok(())
    }
}

impl HistorySink for MemoryStore {
    fn write_history(&mut self, entry: &HistoryEntry) -> Result<(), StoreError> {
        self.history.push(entry.clone());
        Ok(())
    }
}

impl RecipeBook for MemoryStore {
    fn find_recipe(&self, name: &str) -> Option<Recipe> {
        self.recipes.get(name).cloned()
    }
}
