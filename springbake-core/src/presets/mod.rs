//! Named, shareable bundles of spring settings, grouped by character and body part.

pub mod json;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::secondary::SpringParameters;

pub use json::{JsonPresetStore, PresetStoreConfig};

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("preset file {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
    #[error("preset file {path} is not valid: {source}")]
    Json { path: PathBuf, #[source] source: serde_json::Error },
    #[error("no preset `{0}`")]
    NotFound(String),
    #[error("preset `{0}` already exists")]
    Exists(PresetKey),
    #[error("preset store {0} is read-only")]
    ReadOnly(PathBuf),
    #[error("bad preset key `{0}`, expected `character/body_part`")]
    BadKey(String),
}

/// `character/body_part`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PresetKey {
    pub character: String,
    pub body_part: String,
}

impl PresetKey {
    pub fn new(character: impl Into<String>, body_part: impl Into<String>) -> Self {
        Self { character: character.into(), body_part: body_part.into() }
    }
}

impl fmt::Display for PresetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.character, self.body_part)
    }
}

impl FromStr for PresetKey {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((c, b)) if !c.is_empty() && !b.is_empty() && !b.contains('/') => Ok(Self::new(c, b)),
            _ => Err(PresetError::BadKey(s.to_string())),
        }
    }
}

/// Which channel the spring drives. Only rotation is simulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpringMode {
    #[default]
    Rotation,
    Translation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetRecord {
    pub spring_mode: SpringMode,
    pub params: SpringParameters,
    /// Per-link stiffness falloff down the chain.
    pub decay: f64,
    /// Where the aim locator sat relative to the root controller.
    pub locator_offset: [f64; 3],
    /// Divisor applied to the locator's world position; rig scale.
    pub locator_scale: f64,
}

impl Default for PresetRecord {
    fn default() -> Self {
        Self {
            spring_mode: SpringMode::Rotation,
            params: SpringParameters::default(),
            decay: 1.0,
            locator_offset: [0.0; 3],
            locator_scale: 1.0,
        }
    }
}

/// Access to a preset collection. The engine only ever sees the resolved
/// [`SpringParameters`]; where they came from is the store's business.
pub trait PresetStore {
    fn load(&self, key: &PresetKey) -> Result<PresetRecord, PresetError>;

    /// Add a new preset. Fails with [`PresetError::Exists`] if the key is taken.
    fn save(&mut self, key: &PresetKey, record: &PresetRecord) -> Result<(), PresetError>;

    /// Replace or add a preset.
    fn overwrite(&mut self, key: &PresetKey, record: &PresetRecord) -> Result<(), PresetError>;

    /// Every key, sorted by character then body part.
    fn list(&self) -> Result<Vec<PresetKey>, PresetError>;

    /// Remove one preset; a character left with none is removed too.
    fn remove(&mut self, key: &PresetKey) -> Result<(), PresetError>;

    /// Remove a character and all of its presets.
    fn remove_character(&mut self, character: &str) -> Result<(), PresetError>;

    fn rename(&mut self, from: &PresetKey, to: &PresetKey) -> Result<(), PresetError>;

    fn characters(&self) -> Result<Vec<String>, PresetError> {
        let mut out: Vec<String> = self.list()?.into_iter().map(|k| k.character).collect();
        out.dedup();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_from_slash_form() {
        let k: PresetKey = "fox/tail".parse().unwrap();
        assert_eq!(k, PresetKey::new("fox", "tail"));
        assert_eq!(k.to_string(), "fox/tail");
        assert!("fox".parse::<PresetKey>().is_err());
        assert!("fox/".parse::<PresetKey>().is_err());
        assert!("a/b/c".parse::<PresetKey>().is_err());
    }

    #[test]
    fn record_defaults_fill_partial_json() {
        let r: PresetRecord = serde_json::from_str(r#"{"decay": 1.2, "params": {"stiffness": 30}}"#).unwrap();
        assert_eq!(r.spring_mode, SpringMode::Rotation);
        assert_eq!(r.decay, 1.2);
        assert_eq!(r.params.stiffness, 30.0);
        assert_eq!(r.params.mass, 1.0);
        assert_eq!(r.locator_scale, 1.0);
    }
}
