//! Session configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::KeyreelError;
use crate::value::InterpolationKind;

/// Configuration for capture defaults, scrubbing and output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Steps given to newly captured keyframes.
    pub default_steps: u32,
    /// Easing given to newly captured keyframes.
    pub default_ease: Easing,
    /// Interpolated frames kept for scrubbing.
    pub frame_cache_size: usize,
    /// Per-path interpolation rules (dotted paths, e.g. `layers.cells.opacity`).
    pub interpolation_overrides: IndexMap<String, InterpolationKind>,
    pub capture: CaptureOptions,
    pub encoder: EncoderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_steps: 15,
            default_ease: Easing::Linear,
            frame_cache_size: 10,
            interpolation_overrides: IndexMap::new(),
            capture: CaptureOptions::default(),
            encoder: EncoderSettings::default(),
        }
    }
}

/// Options passed to the renderer for each frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Capture only the canvas, without surrounding UI chrome.
    pub canvas_only: bool,
    /// Rescale each rendered frame by this factor before encoding.
    pub scale_factor: Option<f64>,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            canvas_only: true,
            scale_factor: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub fps: u32,
    /// Video quality, 1 (worst) to 9 (best). Ignored for GIF and image sequences.
    pub quality: u8,
    /// Explicit container/codec name; inferred from the output path when unset.
    pub format: Option<String>,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            fps: 20,
            quality: 5,
            format: None,
        }
    }
}

impl Config {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, KeyreelError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), KeyreelError> {
        let invalid = |reason: String| Err(KeyreelError::InvalidConfig { reason });
        if self.default_steps == 0 {
            return invalid("default_steps must be >= 1".to_string());
        }
        if self.frame_cache_size == 0 {
            return invalid("frame_cache_size must be >= 1".to_string());
        }
        if self.encoder.fps == 0 {
            return invalid("encoder.fps must be >= 1".to_string());
        }
        if !(1..=9).contains(&self.encoder.quality) {
            return invalid(format!(
                "encoder.quality must be in 1..=9, got {}",
                self.encoder.quality
            ));
        }
        if let Some(factor) = self.capture.scale_factor {
            if !(factor.is_finite() && factor > 0.0) {
                return invalid(format!("capture.scale_factor must be positive, got {factor}"));
            }
        }
        for path in self.interpolation_overrides.keys() {
            crate::path::AttrPath::parse(path).map_err(|e| KeyreelError::InvalidConfig {
                reason: format!("interpolation_overrides: {e}"),
            })?;
        }
        Ok(())
    }
}
