//! JSON file store.
//!
//! Implements the store ports over plain files so the web UI (or an
//! operator with an editor) can share documents with the controller.
//!
//! - `settings.json`: read-only from the controller's side.
//! - `control.json`: written through a temporary file and renamed into
//!   place, so a reader never observes a half-written document.
//! - history: one [`HistoryEntry`] per line, appended.
//! - recipes: a JSON array of [`Recipe`].

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::app::ports::{
    ControlStore, HistoryEntry, HistorySink, Recipe, RecipeBook, SettingsStore, StoreError,
};
use crate::config::Settings;
use crate::control_state::ControlState;

pub struct JsonFileStore {
    settings_path: PathBuf,
    control_path: PathBuf,
    history_path: Option<PathBuf>,
    recipes_path: Option<PathBuf>,
}

impl JsonFileStore {
    pub fn new(settings_path: impl Into<PathBuf>, control_path: impl Into<PathBuf>) -> Self {
        Self {
            settings_path: settings_path.into(),
            control_path: control_path.into(),
            history_path: None,
            recipes_path: None,
        }
    }

    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    pub fn with_recipes(mut self, path: impl Into<PathBuf>) -> Self {
        self.recipes_path = Some(path.into());
        self
    }

    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    pub fn control_path(&self) -> &Path {
        &self.control_path
    }

    /// Write a settings document.  The controller never calls this; it
    /// exists for the `init` command and for tests.
    pub fn write_settings(&self, settings: &Settings) -> Result<(), StoreError> {
        write_atomic(&self.settings_path, settings)
    }
}

fn io_error(path: &Path, e: &io::Error) -> StoreError {
    if e.kind() == io::ErrorKind::NotFound {
        StoreError::NotFound
    } else {
        StoreError::Io(format!("{}: {e}", path.display()))
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(path, &e))?;
    serde_json::from_str(&text)
        .map_err(|e| StoreError::Corrupted(format!("{}: {e}", path.display())))
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| StoreError::Corrupted(format!("{}: {e}", path.display())))?;
    fs::write(&tmp, json).map_err(|e| io_error(&tmp, &e))?;
    fs::rename(&tmp, path).map_err(|e| io_error(path, &e))
}

impl SettingsStore for JsonFileStore {
    fn read_settings(&self) -> Result<Settings, StoreError> {
        read_json(&self.settings_path)
    }
}

impl ControlStore for JsonFileStore {
    fn read_control(&self) -> Result<ControlState, StoreError> {
        read_json(&self.control_path)
    }

    fn write_control(&mut self, control: &ControlState) -> Result<(), StoreError> {
        write_atomic(&self.control_path, control)
    }
}

impl HistorySink for JsonFileStore {
    fn write_history(&mut self, entry: &HistoryEntry) -> Result<(), StoreError> {
        let Some(path) = self.history_path.as_deref() else {
            return Ok(());
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_error(path, &e))?;
        let mut out = BufWriter::new(file);
        serde_json::to_writer(&mut out, entry)
            .map_err(|e| StoreError::Io(format!("{}: {e}", path.display())))?;
        out.write_all(b"\n")
            .and_then(|()| out.flush())
            .map_err(|e| io_error(path, &e))
    }
}

impl RecipeBook for JsonFileStore {
    fn find_recipe(&self, name: &str) -> Option<Recipe> {
        let path = self.recipes_path.as_deref()?;
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                debug!("recipe book {} unavailable: {e}", path.display());
                return None;
            }
        };
        match serde_json::from_reader::<_, Vec<Recipe>>(io::BufReader::new(file)) {
            Ok(recipes) => recipes.into_iter().find(|r| r.name == name),
            Err(e) => {
                warn!("recipe book {} is not valid JSON: {e}", path.display());
                None
            }
        }
    }
}
