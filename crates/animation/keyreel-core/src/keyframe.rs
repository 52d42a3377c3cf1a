//! Keyframes and their serialized record form.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::easing::Easing;
use crate::error::KeyreelError;
use crate::snapshot::Snapshot;

/// A captured point on the timeline.
///
/// `steps` is the number of frames spent transitioning *into* this keyframe
/// from its predecessor, and `ease` shapes that transition. The first
/// keyframe's `steps` and `ease` are unused by playback.
#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub name: String,
    pub snapshot: Arc<Snapshot>,
    pub steps: u32,
    pub ease: Easing,
    /// Dense position in the owning store, maintained by the store.
    pub position: usize,
}

impl Keyframe {
    pub(crate) fn new(
        name: String,
        snapshot: Arc<Snapshot>,
        steps: u32,
        ease: Easing,
    ) -> Result<Self, KeyreelError> {
        check_steps(steps)?;
        Ok(Self {
            name,
            snapshot,
            steps,
            ease,
            position: 0,
        })
    }
}

pub(crate) fn check_steps(steps: u32) -> Result<(), KeyreelError> {
    if steps == 0 {
        Err(KeyreelError::InvalidStepCount { steps })
    } else {
        Ok(())
    }
}

/// Persisted form of a keyframe: `{ name, snapshot, steps, ease }`.
/// Position is implied by the record's index in the list.
#[derive(Serialize)]
pub(crate) struct KeyframeRecordRef<'a> {
    pub name: &'a str,
    pub snapshot: &'a Snapshot,
    pub steps: u32,
    pub ease: Easing,
}

impl<'a> From<&'a Keyframe> for KeyframeRecordRef<'a> {
    fn from(kf: &'a Keyframe) -> Self {
        Self {
            name: &kf.name,
            snapshot: &kf.snapshot,
            steps: kf.steps,
            ease: kf.ease,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct KeyframeRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub snapshot: Snapshot,
    pub steps: u32,
    #[serde(default)]
    pub ease: Easing,
}
