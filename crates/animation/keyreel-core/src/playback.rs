//! Playback: expansion of a keyframe store into a per-frame snapshot sequence.
//!
//! For each consecutive pair `(k[i-1], k[i])`, frames `s = 0..k[i].steps`
//! interpolate at `t = k[i].ease(s / k[i].steps)`; the destination keyframe's
//! easing shapes the transition. The last keyframe is then emitted verbatim
//! as the closing frame. Total length is `sum(steps[1..]) + 1`, or zero for
//! an empty store. Frames whose fraction is exactly zero borrow the source
//! keyframe's snapshot rather than interpolating.

use lru::LruCache;
use std::borrow::Cow;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

use crate::error::KeyreelError;
use crate::interpolation::interpolate;
use crate::snapshot::Snapshot;
use crate::store::KeyframeStore;

/// Where a frame comes from: keyframe positions and the eased fraction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FrameIndex {
    pub from: usize,
    pub to: usize,
    pub fraction: f64,
}

/// One playback frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame<'a> {
    pub index: usize,
    pub state: Cow<'a, Snapshot>,
}

impl Frame<'_> {
    pub fn into_snapshot(self) -> Snapshot {
        self.state.into_owned()
    }
}

/// Frame map derived from a store. Holds no interpolated state, so iterating
/// it twice yields the same sequence.
#[derive(Clone, Debug)]
pub struct FrameSequence<'a> {
    store: &'a KeyframeStore,
    index: Vec<FrameIndex>,
}

impl<'a> FrameSequence<'a> {
    pub fn new(store: &'a KeyframeStore) -> Self {
        Self {
            store,
            index: build_index(store),
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn frame_index(&self, frame: usize) -> Option<FrameIndex> {
        self.index.get(frame).copied()
    }

    /// Frame `frame`, interpolated on demand.
    pub fn get(&self, frame: usize) -> Result<Frame<'a>, KeyreelError> {
        let entry = self.frame_index(frame).ok_or(KeyreelError::IndexOutOfRange {
            index: frame,
            len: self.len(),
        })?;
        let state = self.resolve(entry)?;
        Ok(Frame {
            index: frame,
            state,
        })
    }

    /// Frame counted from the end: `get_from_end(1)` is the closing frame.
    pub fn get_from_end(&self, back: usize) -> Result<Frame<'a>, KeyreelError> {
        match self.len().checked_sub(back) {
            Some(frame) if back > 0 => self.get(frame),
            _ => Err(KeyreelError::IndexOutOfRange {
                index: back,
                len: self.len(),
            }),
        }
    }

    /// Lazy iterator over all frames in order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Frame<'a>, KeyreelError>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }

    fn resolve(&self, entry: FrameIndex) -> Result<Cow<'a, Snapshot>, KeyreelError> {
        let keyframes = self.store.list();
        let from: &'a Snapshot = &keyframes[entry.from].snapshot;
        if entry.fraction == 0.0 {
            return Ok(Cow::Borrowed(from));
        }
        let to: &'a Snapshot = &keyframes[entry.to].snapshot;
        Ok(Cow::Owned(interpolate(from, to, entry.fraction)?))
    }
}

fn build_index(store: &KeyframeStore) -> Vec<FrameIndex> {
    let keyframes = store.list();
    let Some(last) = keyframes.len().checked_sub(1) else {
        return Vec::new();
    };
    let mut index = Vec::with_capacity(store.frame_count());
    for (i, pair) in keyframes.windows(2).enumerate() {
        let to = &pair[1];
        for s in 0..to.steps {
            let u = f64::from(s) / f64::from(to.steps);
            index.push(FrameIndex {
                from: i,
                to: i + 1,
                fraction: to.ease.ease(u),
            });
        }
    }
    index.push(FrameIndex {
        from: last,
        to: last,
        fraction: 0.0,
    });
    index
}

/// Frame sequence of `store`.
pub fn play(store: &KeyframeStore) -> FrameSequence<'_> {
    FrameSequence::new(store)
}

/// LRU of interpolated frames for scrubbing. Entries are dropped as soon as
/// the store revision changes.
#[derive(Debug)]
pub struct FrameCache {
    cache: LruCache<usize, Arc<Snapshot>>,
    revision: Option<u64>,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            revision: None,
        }
    }

    /// Frame `frame` of `store`, interpolated once and then served from cache.
    pub fn get(&mut self, store: &KeyframeStore, frame: usize) -> Result<Arc<Snapshot>, KeyreelError> {
        if self.revision != Some(store.revision()) {
            if !self.cache.is_empty() {
                debug!(revision = store.revision(), "store changed; frame cache cleared");
            }
            self.cache.clear();
            self.revision = Some(store.revision());
        }
        if let Some(state) = self.cache.get(&frame) {
            return Ok(Arc::clone(state));
        }
        let state = Arc::new(play(store).get(frame)?.into_snapshot());
        self.cache.put(frame, Arc::clone(&state));
        Ok(state)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn clear(&mut self) {
        self.cache.clear();
        self.revision = None;
    }
}
