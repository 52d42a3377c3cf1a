//! Ordered keyframe store.
//!
//! Positions are dense (`0..len`) and renumbered after every insert, delete
//! and move. Every mutation bumps [`KeyframeStore::revision`], which frame
//! caches use to detect stale entries. The store has no internal locking;
//! callers serialize access.

use std::sync::Arc;
use tracing::debug;

use crate::easing::Easing;
use crate::error::KeyreelError;
use crate::keyframe::{check_steps, Keyframe, KeyframeRecord, KeyframeRecordRef};
use crate::snapshot::Snapshot;

const DEFAULT_NAME_PREFIX: &str = "Key Frame ";

fn default_name_index(name: &str) -> Option<u64> {
    name.strip_prefix(DEFAULT_NAME_PREFIX)?.parse().ok()
}

#[derive(Clone, Debug, Default)]
pub struct KeyframeStore {
    keyframes: Vec<Keyframe>,
    revision: u64,
    name_counter: u64,
}

impl KeyframeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a keyframe at `position` (`0..=len`), shifting later ones back.
    /// The keyframe is named `Key Frame N` from a running counter.
    pub fn insert(
        &mut self,
        snapshot: impl Into<Arc<Snapshot>>,
        steps: u32,
        ease: Easing,
        position: usize,
    ) -> Result<&Keyframe, KeyreelError> {
        let name = self.next_default_name();
        self.insert_named(name, snapshot, steps, ease, position)
    }

    /// Insert with an explicit name. The name counter still advances.
    pub fn insert_named(
        &mut self,
        name: impl Into<String>,
        snapshot: impl Into<Arc<Snapshot>>,
        steps: u32,
        ease: Easing,
        position: usize,
    ) -> Result<&Keyframe, KeyreelError> {
        if position > self.keyframes.len() {
            return Err(KeyreelError::IndexOutOfRange {
                index: position,
                len: self.keyframes.len(),
            });
        }
        let keyframe = Keyframe::new(name.into(), snapshot.into(), steps, ease)?;
        debug!(name = %keyframe.name, position, steps, ease = %ease, "insert keyframe");
        self.keyframes.insert(position, keyframe);
        self.name_counter += 1;
        self.touch();
        Ok(&self.keyframes[position])
    }

    /// Append at the end.
    pub fn push(
        &mut self,
        snapshot: impl Into<Arc<Snapshot>>,
        steps: u32,
        ease: Easing,
    ) -> Result<&Keyframe, KeyreelError> {
        let len = self.keyframes.len();
        self.insert(snapshot, steps, ease, len)
    }

    /// Remove and return the keyframe at `position`.
    pub fn delete(&mut self, position: usize) -> Result<Keyframe, KeyreelError> {
        self.check_index(position)?;
        let removed = self.keyframes.remove(position);
        debug!(name = %removed.name, position, "delete keyframe");
        self.touch();
        Ok(removed)
    }

    /// Edit the transition parameters of a keyframe. Snapshots are immutable;
    /// use [`KeyframeStore::replace`] to change one.
    pub fn update(
        &mut self,
        position: usize,
        steps: Option<u32>,
        ease: Option<Easing>,
    ) -> Result<(), KeyreelError> {
        self.check_index(position)?;
        if let Some(steps) = steps {
            check_steps(steps)?;
        }
        let kf = &mut self.keyframes[position];
        if let Some(steps) = steps {
            kf.steps = steps;
        }
        if let Some(ease) = ease {
            kf.ease = ease;
        }
        self.touch();
        Ok(())
    }

    pub fn rename(&mut self, position: usize, name: impl Into<String>) -> Result<(), KeyreelError> {
        self.check_index(position)?;
        self.keyframes[position].name = name.into();
        self.touch();
        Ok(())
    }

    /// Move the keyframe at `from` so that it ends up at `to` (both `< len`).
    pub fn move_keyframe(&mut self, from: usize, to: usize) -> Result<(), KeyreelError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let kf = self.keyframes.remove(from);
            debug!(name = %kf.name, from, to, "move keyframe");
            self.keyframes.insert(to, kf);
        }
        self.touch();
        Ok(())
    }

    /// Replace the keyframe at `position` with a freshly captured one
    /// (delete + insert at the same position). Returns the old keyframe.
    pub fn replace(
        &mut self,
        position: usize,
        snapshot: impl Into<Arc<Snapshot>>,
        steps: u32,
        ease: Easing,
    ) -> Result<Keyframe, KeyreelError> {
        self.check_index(position)?;
        check_steps(steps)?;
        let old = self.delete(position)?;
        self.insert(snapshot, steps, ease, position)?;
        Ok(old)
    }

    pub fn get(&self, position: usize) -> Option<&Keyframe> {
        self.keyframes.get(position)
    }

    pub fn list(&self) -> &[Keyframe] {
        &self.keyframes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Keyframe> {
        self.keyframes.iter()
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Monotonic counter bumped on every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of frames playback produces: the sum of the steps of every
    /// keyframe after the first, plus the closing frame.
    pub fn frame_count(&self) -> usize {
        match self.keyframes.split_first() {
            None => 0,
            Some((_, rest)) => rest.iter().map(|kf| kf.steps as usize).sum::<usize>() + 1,
        }
    }

    /// Frame at which the keyframe at `position` is shown verbatim.
    pub fn keyframe_frame_index(&self, position: usize) -> Result<usize, KeyreelError> {
        self.check_index(position)?;
        Ok(self.keyframes[1..=position]
            .iter()
            .map(|kf| kf.steps as usize)
            .sum())
    }

    /// Continuous animation needs at least two keyframes.
    pub fn validate_animatable(&self) -> Result<(), KeyreelError> {
        if self.keyframes.len() < 2 {
            return Err(KeyreelError::InsufficientKeyframes {
                count: self.keyframes.len(),
            });
        }
        Ok(())
    }

    /// Serialize as an ordered JSON array of `{ name, snapshot, steps, ease }`.
    pub fn to_json(&self) -> Result<String, KeyreelError> {
        let records: Vec<KeyframeRecordRef<'_>> = self.keyframes.iter().map(Into::into).collect();
        Ok(serde_json::to_string(&records)?)
    }

    /// Rebuild a store from [`KeyframeStore::to_json`] output. Records
    /// without a name get the default one.
    pub fn from_json(json: &str) -> Result<Self, KeyreelError> {
        let records: Vec<KeyframeRecord> = serde_json::from_str(json)?;
        let mut store = Self::new();
        for record in records {
            let position = store.len();
            match record.name {
                Some(name) => store.insert_named(name, record.snapshot, record.steps, record.ease, position)?,
                None => store.insert(record.snapshot, record.steps, record.ease, position)?,
            };
        }
        // Resume the counter past any default name already in use.
        let next = store
            .keyframes
            .iter()
            .filter_map(|kf| default_name_index(&kf.name))
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);
        store.name_counter = store.name_counter.max(next);
        Ok(store)
    }

    /// Next `Key Frame N` name not already taken.
    fn next_default_name(&mut self) -> String {
        loop {
            let name = format!("{DEFAULT_NAME_PREFIX}{}", self.name_counter);
            if self.keyframes.iter().all(|kf| kf.name != name) {
                return name;
            }
            self.name_counter += 1;
        }
    }

    fn check_index(&self, index: usize) -> Result<(), KeyreelError> {
        if index >= self.keyframes.len() {
            return Err(KeyreelError::IndexOutOfRange {
                index,
                len: self.keyframes.len(),
            });
        }
        Ok(())
    }

    /// Renumber positions and bump the revision.
    fn touch(&mut self) {
        for (i, kf) in self.keyframes.iter_mut().enumerate() {
            kf.position = i;
        }
        self.revision += 1;
    }
}

impl<'a> IntoIterator for &'a KeyframeStore {
    type Item = &'a Keyframe;
    type IntoIter = std::slice::Iter<'a, Keyframe>;

    fn into_iter(self) -> Self::IntoIter {
        self.keyframes.iter()
    }
}
