//! Animation session: the store plus the capture/scrub/export workflow.

use std::path::Path;
use tracing::debug;

use crate::config::Config;
use crate::easing::Easing;
use crate::error::KeyreelError;
use crate::extract::{apply, extract, ApplyReport, LiveScene};
use crate::keyframe::Keyframe;
use crate::playback::FrameCache;
use crate::render::{
    render_animation, FrameEncoder, Progress, RenderOptions, RenderSummary, Renderer, StopHandle,
};
use crate::schema::AttributeRegistry;
use crate::store::KeyframeStore;

/// Where a newly captured keyframe goes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Placement {
    Append,
    /// Directly after the keyframe at this position.
    InsertAfter(usize),
    /// In place of the keyframe at this position.
    Replace(usize),
}

/// Owns the keyframe store, the capture registry and the scrub cache.
/// The live scene is passed to each call that reads or writes it.
#[derive(Debug)]
pub struct AnimationSession {
    config: Config,
    registry: AttributeRegistry,
    store: KeyframeStore,
    cache: FrameCache,
    current_frame: usize,
}

impl AnimationSession {
    /// Session with the default viewer registry plus the config's overrides.
    pub fn new(config: Config) -> Result<Self, KeyreelError> {
        let registry = AttributeRegistry::viewer_default().with_overrides(&config)?;
        Self::with_registry(config, registry)
    }

    pub fn with_registry(config: Config, registry: AttributeRegistry) -> Result<Self, KeyreelError> {
        config.validate()?;
        let cache = FrameCache::new(config.frame_cache_size);
        Ok(Self {
            config,
            registry,
            store: KeyframeStore::new(),
            cache,
            current_frame: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &AttributeRegistry {
        &self.registry
    }

    pub fn store(&self) -> &KeyframeStore {
        &self.store
    }

    /// Direct store access; the scrub cache notices edits through the revision.
    pub fn store_mut(&mut self) -> &mut KeyframeStore {
        &mut self.store
    }

    /// Capture the scene with the configured default steps and easing.
    pub fn capture_keyframe<S>(
        &mut self,
        scene: &S,
        placement: Placement,
    ) -> Result<&Keyframe, KeyreelError>
    where
        S: LiveScene + ?Sized,
    {
        let (steps, ease) = (self.config.default_steps, self.config.default_ease);
        self.capture_keyframe_with(scene, steps, ease, placement)
    }

    pub fn capture_keyframe_with<S>(
        &mut self,
        scene: &S,
        steps: u32,
        ease: Easing,
        placement: Placement,
    ) -> Result<&Keyframe, KeyreelError>
    where
        S: LiveScene + ?Sized,
    {
        let snapshot = extract(scene, &self.registry);
        let position = match placement {
            Placement::Append => {
                let position = self.store.len();
                self.store.insert(snapshot, steps, ease, position)?;
                position
            }
            Placement::InsertAfter(after) => {
                if after >= self.store.len() {
                    return Err(KeyreelError::IndexOutOfRange {
                        index: after,
                        len: self.store.len(),
                    });
                }
                self.store.insert(snapshot, steps, ease, after + 1)?;
                after + 1
            }
            Placement::Replace(position) => {
                self.store.replace(position, snapshot, steps, ease)?;
                position
            }
        };
        self.current_frame = self.store.keyframe_frame_index(position)?;
        debug!(position, ?placement, "captured keyframe");
        self.store.get(position).ok_or(KeyreelError::IndexOutOfRange {
            index: position,
            len: self.store.len(),
        })
    }

    /// Restore the scene to a keyframe's snapshot.
    pub fn set_to_keyframe<S>(&mut self, position: usize, scene: &mut S) -> Result<ApplyReport, KeyreelError>
    where
        S: LiveScene + ?Sized,
    {
        let frame = self.store.keyframe_frame_index(position)?;
        let report = self
            .store
            .get(position)
            .map(|kf| apply(&kf.snapshot, scene))
            .ok_or(KeyreelError::IndexOutOfRange {
                index: position,
                len: self.store.len(),
            })?;
        self.current_frame = frame;
        Ok(report)
    }

    /// Show movie frame `index` on the scene. Negative indices count from the
    /// end (`-1` is the closing frame). Interpolated frames are cached.
    pub fn set_movie_frame_index<S>(&mut self, index: isize, scene: &mut S) -> Result<ApplyReport, KeyreelError>
    where
        S: LiveScene + ?Sized,
    {
        let total = self.store.frame_count();
        let resolved = if index < 0 {
            total.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs())
        };
        let frame = resolved
            .filter(|f| *f < total)
            .ok_or(KeyreelError::IndexOutOfRange {
                index: index.unsigned_abs(),
                len: total,
            })?;
        let state = self.cache.get(&self.store, frame)?;
        let report = apply(&state, scene);
        self.current_frame = frame;
        Ok(report)
    }

    /// Frame last shown through this session.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.store.frame_count()
    }

    /// Render the whole animation to `path` with the configured capture and
    /// encoder settings.
    pub fn animate<S, E>(
        &self,
        scene: &mut S,
        encoder: &mut E,
        path: &Path,
        stop: &StopHandle,
        progress: impl FnMut(Progress),
    ) -> Result<RenderSummary, KeyreelError>
    where
        S: LiveScene + Renderer + ?Sized,
        E: FrameEncoder + ?Sized,
    {
        let options = RenderOptions::from(&self.config);
        render_animation(&self.store, scene, encoder, path, &options, stop, progress)
    }
}
