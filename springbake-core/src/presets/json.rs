//! Preset store backed by one JSON file, usually on a shared drive.
//!
//! The file is re-read on every call so edits by other artists are picked
//! up. Writing is opt-in: a store opened without `writable` refuses every
//! mutation, which keeps casual users from clobbering the team file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::info;

use super::{PresetError, PresetKey, PresetRecord, PresetStore};

pub const DEFAULT_FILENAME: &str = "springbake_presets.json";

type PresetFile = BTreeMap<String, BTreeMap<String, PresetRecord>>;

/// Where the preset file lives and whether this process may edit it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetStoreConfig {
    pub path: PathBuf,
    pub writable: bool,
}

impl PresetStoreConfig {
    pub fn new(path: impl Into<PathBuf>, writable: bool) -> Self {
        Self { path: path.into(), writable }
    }

    /// Build the file path from a directory, an optional filename and an
    /// optional root (typically read from an environment variable by the
    /// caller). A relative `dir` is joined onto `root`; `.json` is appended
    /// when missing.
    pub fn resolve(root: Option<&Path>, dir: &Path, filename: Option<&str>, writable: bool) -> Self {
        let dir = match root {
            Some(root) if dir.is_relative() => root.join(dir),
            _ => dir.to_path_buf(),
        };
        let mut name = filename.unwrap_or(DEFAULT_FILENAME).to_string();
        if !name.ends_with(".json") {
            name.push_str(".json");
        }
        Self { path: dir.join(name), writable }
    }
}

#[derive(Debug, Clone)]
pub struct JsonPresetStore {
    config: PresetStoreConfig,
}

impl JsonPresetStore {
    pub fn open(config: PresetStoreConfig) -> Self { Self { config } }

    pub fn path(&self) -> &Path { &self.config.path }

    /// Create an empty file if none exists yet.
    pub fn create_if_missing(&self) -> Result<(), PresetError> {
        self.ensure_writable()?;
        if self.config.path.exists() {
            return Ok(());
        }
        self.write_file(&PresetFile::new())
    }

    fn ensure_writable(&self) -> Result<(), PresetError> {
        if self.config.writable { Ok(()) } else { Err(PresetError::ReadOnly(self.config.path.clone())) }
    }

    fn io_err(&self, source: std::io::Error) -> PresetError {
        PresetError::Io { path: self.config.path.clone(), source }
    }

    fn read_file(&self) -> Result<PresetFile, PresetError> {
        let data = match fs::read_to_string(&self.config.path) {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(PresetFile::new()),
            Err(e) => return Err(self.io_err(e)),
        };
        if data.trim().is_empty() {
            return Ok(PresetFile::new());
        }
        serde_json::from_str(&data).map_err(|source| PresetError::Json { path: self.config.path.clone(), source })
    }

    /// Write through a sibling temp file and rename, so readers never see half a file.
    fn write_file(&self, presets: &PresetFile) -> Result<(), PresetError> {
        let data = serde_json::to_string_pretty(presets)
            .map_err(|source| PresetError::Json { path: self.config.path.clone(), source })?;
        let tmp = self.config.path.with_extension("json.tmp");
        fs::write(&tmp, data).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.config.path).map_err(|e| self.io_err(e))
    }

    fn edit<F>(&mut self, f: F) -> Result<(), PresetError>
    where
        F: FnOnce(&mut PresetFile) -> Result<(), PresetError>,
    {
        self.ensure_writable()?;
        let mut presets = self.read_file()?;
        f(&mut presets)?;
        self.write_file(&presets)
    }
}

fn take(presets: &mut PresetFile, key: &PresetKey) -> Result<PresetRecord, PresetError> {
    let parts = presets
        .get_mut(&key.character)
        .ok_or_else(|| PresetError::NotFound(key.to_string()))?;
    let record = parts.remove(&key.body_part).ok_or_else(|| PresetError::NotFound(key.to_string()))?;
    if parts.is_empty() {
        presets.remove(&key.character);
    }
    Ok(record)
}

impl PresetStore for JsonPresetStore {
    fn load(&self, key: &PresetKey) -> Result<PresetRecord, PresetError> {
        self.read_file()?
            .get(&key.character)
            .and_then(|parts| parts.get(&key.body_part))
            .cloned()
            .ok_or_else(|| PresetError::NotFound(key.to_string()))
    }

    fn save(&mut self, key: &PresetKey, record: &PresetRecord) -> Result<(), PresetError> {
        self.edit(|presets| {
            let parts = presets.entry(key.character.clone()).or_default();
            if parts.contains_key(&key.body_part) {
                return Err(PresetError::Exists(key.clone()));
            }
            parts.insert(key.body_part.clone(), record.clone());
            Ok(())
        })?;
        info!("saved preset {key} to {}", self.config.path.display());
        Ok(())
    }

    fn overwrite(&mut self, key: &PresetKey, record: &PresetRecord) -> Result<(), PresetError> {
        self.edit(|presets| {
            presets
                .entry(key.character.clone())
                .or_default()
                .insert(key.body_part.clone(), record.clone());
            Ok(())
        })?;
        info!("updated preset {key}");
        Ok(())
    }

    fn list(&self) -> Result<Vec<PresetKey>, PresetError> {
        Ok(self
            .read_file()?
            .iter()
            .flat_map(|(c, parts)| parts.keys().map(move |b| PresetKey::new(c.clone(), b.clone())))
            .collect())
    }

    fn remove(&mut self, key: &PresetKey) -> Result<(), PresetError> {
        self.edit(|presets| take(presets, key).map(|_| ()))?;
        info!("removed preset {key}");
        Ok(())
    }

    fn remove_character(&mut self, character: &str) -> Result<(), PresetError> {
        self.edit(|presets| {
            presets
                .remove(character)
                .map(|_| ())
                .ok_or_else(|| PresetError::NotFound(character.to_string()))
        })?;
        info!("removed character {character}");
        Ok(())
    }

    fn rename(&mut self, from: &PresetKey, to: &PresetKey) -> Result<(), PresetError> {
        self.edit(|presets| {
            let exists = presets.get(&to.character).is_some_and(|p| p.contains_key(&to.body_part));
            if exists && from != to {
                return Err(PresetError::Exists(to.clone()));
            }
            let record = take(presets, from)?;
            presets.entry(to.character.clone()).or_default().insert(to.body_part.clone(), record);
            Ok(())
        })?;
        info!("renamed preset {from} to {to}");
        Ok(())
    }
}
