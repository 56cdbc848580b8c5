//! Baked orientation tables and the keyframe writers that persist them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::orientation::Orientation;
use crate::rig::ControllerId;

/// Dense samples for one controller, one per sampled frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub controller: ControllerId,
    pub samples: Vec<Orientation>,
}

/// Every controller's orientation for every sampled frame of a bake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BakeTable {
    pub start: i64,
    pub frame_step: i64,
    /// Chain order, root first.
    pub tracks: Vec<Track>,
}

impl BakeTable {
    pub fn new<'a>(start: i64, frame_step: i64, controllers: impl IntoIterator<Item = &'a ControllerId>) -> Self {
        let tracks = controllers
            .into_iter()
            .map(|c| Track { controller: c.clone(), samples: Vec::new() })
            .collect();
        Self { start, frame_step, tracks }
    }

    /// Append one frame's orientations, in chain order.
    pub(crate) fn push_frame(&mut self, orientations: &[Orientation]) {
        for (track, o) in self.tracks.iter_mut().zip(orientations) {
            track.samples.push(*o);
        }
    }

    pub fn controllers(&self) -> impl Iterator<Item = &ControllerId> {
        self.tracks.iter().map(|t| &t.controller)
    }

    pub fn frame_count(&self) -> usize {
        self.tracks.first().map_or(0, |t| t.samples.len())
    }

    pub fn frames(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.frame_count()).map(move |i| self.frame_at(i))
    }

    fn frame_at(&self, index: usize) -> i64 {
        let index = i64::try_from(index).unwrap_or(i64::MAX);
        self.start.saturating_add(index.saturating_mul(self.frame_step))
    }

    pub fn track(&self, controller: &ControllerId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.controller == controller)
    }

    pub fn get(&self, controller: &ControllerId, frame: i64) -> Option<Orientation> {
        let offset = frame.checked_sub(self.start)?;
        if self.frame_step < 1 || offset < 0 || offset % self.frame_step != 0 {
            return None;
        }
        let i = usize::try_from(offset / self.frame_step).ok()?;
        self.track(controller)?.samples.get(i).copied()
    }

    /// `(controller, frame, orientation)` for every sample, controller-major.
    pub fn triples(&self) -> impl Iterator<Item = (&ControllerId, i64, Orientation)> + '_ {
        self.tracks.iter().flat_map(move |t| {
            t.samples
                .iter()
                .enumerate()
                .map(move |(i, o)| (&t.controller, self.frame_at(i), *o))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize bake table")
    }
}

/// Persists a finished bake into host animation data.
///
/// Called at most once per bake, with a complete table of finite samples.
pub trait KeyframeWriter {
    fn write_table(&mut self, table: &BakeTable) -> Result<()>;
}

/// Keeps every written triple in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    pub keys: Vec<(ControllerId, i64, Orientation)>,
    pub writes: usize,
}

impl KeyframeWriter for MemoryWriter {
    fn write_table(&mut self, table: &BakeTable) -> Result<()> {
        self.writes += 1;
        self.keys.extend(table.triples().map(|(c, f, o)| (c.clone(), f, o)));
        Ok(())
    }
}

/// Writes the table as pretty JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonTableWriter {
    path: PathBuf,
}

impl JsonTableWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

    pub fn path(&self) -> &Path { &self.path }
}

impl KeyframeWriter for JsonTableWriter {
    fn write_table(&mut self, table: &BakeTable) -> Result<()> {
        let data = table.to_json()?;
        std::fs::write(&self.path, data).with_context(|| format!("write {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> BakeTable {
        let ids = [ControllerId::from("a"), ControllerId::from("b")];
        let mut t = BakeTable::new(10, 2, &ids);
        t.push_frame(&[Orientation::splat(1.0), Orientation::splat(2.0)]);
        t.push_frame(&[Orientation::splat(3.0), Orientation::splat(4.0)]);
        t
    }

    #[test]
    fn lookup_by_controller_and_frame() {
        let t = table();
        assert_eq!(t.frames().collect::<Vec<_>>(), vec![10, 12]);
        assert_eq!(t.get(&"b".into(), 12), Some(Orientation::splat(4.0)));
        assert_eq!(t.get(&"b".into(), 11), None);
        assert_eq!(t.get(&"a".into(), 8), None);
        assert_eq!(t.get(&"c".into(), 10), None);
        assert_eq!(t.get(&"a".into(), i64::MIN), None);
        assert_eq!(t.controllers().map(|c| c.as_str()).collect::<Vec<_>>(), ["a", "b"]);
    }

    #[test]
    fn memory_writer_receives_every_triple() {
        let mut w = MemoryWriter::default();
        w.write_table(&table()).unwrap();
        assert_eq!(w.writes, 1);
        assert_eq!(w.keys.len(), 4);
        assert_eq!(w.keys[1], (ControllerId::from("a"), 12, Orientation::splat(3.0)));
    }

    #[test]
    fn json_writer_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = JsonTableWriter::new(dir.path().join("table.json"));
        w.write_table(&table()).unwrap();
        let back: BakeTable = serde_json::from_str(&std::fs::read_to_string(w.path()).unwrap()).unwrap();
        assert_eq!(back, table());
    }
}
