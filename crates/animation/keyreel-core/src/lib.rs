//! Keyreel Core (engine-agnostic)
//!
//! Keyframe animation for multi-dimensional scene viewers: capture viewer
//! state into snapshots, interpolate between them per attribute type, and
//! expand a keyframe list into an ordered frame sequence that is applied,
//! rendered and encoded one frame at a time.
//!
//! The live scene, renderer and encoder are external collaborators reached
//! through the [`LiveScene`], [`Renderer`] and [`FrameEncoder`] traits.

pub mod config;
pub mod easing;
pub mod error;
pub mod extract;
pub mod interpolation;
pub mod keyframe;
pub mod path;
pub mod playback;
pub mod render;
pub mod schema;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod value;

// Re-exports for consumers (adapters)
pub use config::{CaptureOptions, Config, EncoderSettings};
pub use easing::{Curve, Easing};
pub use error::{BoxError, KeyreelError};
pub use extract::{apply, extract, ApplyReport, LayerInfo, LiveScene};
pub use interpolation::{interpolate, interpolate_leaf};
pub use keyframe::Keyframe;
pub use path::AttrPath;
pub use playback::{play, Frame, FrameCache, FrameIndex, FrameSequence};
pub use render::{
    render_animation, EncoderOptions, FrameEncoder, OutputFormat, PixelBuffer, Progress,
    RenderOptions, RenderSummary, Renderer, StopHandle,
};
pub use schema::{AttributeRegistry, AttributeSpec, EntityKind};
pub use session::{AnimationSession, Placement};
pub use snapshot::{Node, Snapshot, SnapshotEntry};
pub use store::KeyframeStore;
pub use value::{InterpolationKind, Leaf, Value, ValueKind};

pub type Result<T> = core::result::Result<T, KeyreelError>;
