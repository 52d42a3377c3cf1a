//! Error types for keyframe capture, interpolation and playback.

use crate::path::AttrPath;

/// Boxed error returned by external collaborators (renderer, encoder).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by the keyframe engine.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum KeyreelError {
    /// Two snapshots do not share the same paths or leaf shapes.
    #[error("Snapshot structure mismatch at '{path}': {reason}")]
    StructureMismatch { path: AttrPath, reason: String },

    /// A keyframe was given a step count below one.
    #[error("Invalid step count: {steps} (must be >= 1)")]
    InvalidStepCount { steps: u32 },

    /// A store or frame position outside the valid range.
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// Continuous animation needs at least two keyframes.
    #[error("Must have at least 2 keyframes, found {count}")]
    InsufficientKeyframes { count: usize },

    /// Interpolation fraction is NaN or infinite.
    #[error("Invalid interpolation fraction: {t}")]
    InvalidFraction { t: f64 },

    /// Log-space interpolation over a value that is not strictly positive.
    #[error("Log interpolation at '{path}' requires positive values, got {value}")]
    NonPositiveLogValue { path: AttrPath, value: f64 },

    /// Interpolation rule that cannot apply to the leaf's value kind.
    #[error("Interpolation '{rule}' at '{path}' does not apply to {found}")]
    UnsupportedRule {
        path: AttrPath,
        rule: &'static str,
        found: String,
    },

    /// Malformed attribute path.
    #[error("Invalid attribute path: {reason}")]
    InvalidPath { reason: String },

    /// Easing preset name not recognised.
    #[error("Unknown easing function: {name}")]
    UnknownEasing { name: String },

    /// Rendered frame dimensions changed during a run.
    #[error("Frame {frame} is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    FrameSizeMismatch {
        frame: usize,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Pixel data does not match the declared dimensions.
    #[error("Pixel buffer of {len} bytes does not fit {width}x{height} RGBA")]
    InvalidPixelBuffer { width: u32, height: u32, len: usize },

    /// Playback stopped by the caller before the given frame.
    #[error("Rendering cancelled before frame {frame}")]
    Cancelled { frame: usize },

    /// Renderer failure, carried verbatim.
    #[error("Render failed at frame {frame}")]
    Render {
        frame: usize,
        #[source]
        source: BoxError,
    },

    /// Encoder failure, carried verbatim.
    #[error("Encoder failed: {stage}")]
    Encode {
        stage: &'static str,
        #[source]
        source: BoxError,
    },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    Serialization { reason: String },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl KeyreelError {
    pub(crate) fn mismatch(path: &AttrPath, reason: impl Into<String>) -> Self {
        Self::StructureMismatch {
            path: path.clone(),
            reason: reason.into(),
        }
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::StructureMismatch { .. } => "structure",
            Self::InvalidStepCount { .. }
            | Self::InvalidFraction { .. }
            | Self::NonPositiveLogValue { .. }
            | Self::UnsupportedRule { .. }
            | Self::InvalidPath { .. }
            | Self::UnknownEasing { .. } => "validation",
            Self::IndexOutOfRange { .. } => "store",
            Self::InsufficientKeyframes { .. } | Self::Cancelled { .. } => "playback",
            Self::FrameSizeMismatch { .. }
            | Self::InvalidPixelBuffer { .. }
            | Self::Render { .. }
            | Self::Encode { .. } => "collaborator",
            Self::Serialization { .. } => "serialization",
            Self::InvalidConfig { .. } => "config",
        }
    }

    /// True when the error came from the renderer or encoder rather than the engine.
    #[inline]
    pub fn is_collaborator_failure(&self) -> bool {
        self.category() == "collaborator"
    }
}

impl From<serde_json::Error> for KeyreelError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            reason: err.to_string(),
        }
    }
}
