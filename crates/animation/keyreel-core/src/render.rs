//! Frame-synchronous render loop.
//!
//! Each frame runs apply -> render -> encode to completion before the next
//! frame starts, since the live scene can only hold one state at a time.
//! A stop request is honoured between frames. Any failure aborts the encoder
//! and ends the run; frames are never skipped or retried.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{CaptureOptions, Config, EncoderSettings};
use crate::error::{BoxError, KeyreelError};
use crate::extract::{apply, LiveScene};
use crate::playback::play;
use crate::store::KeyframeStore;

/// Extensions handed to a video encoder together with a quality setting.
const VIDEO_EXTENSIONS: [&str; 7] = ["mp4", "mov", "avi", "mpg", "mpeg", "mkv", "wmv"];

/// RGBA8 pixels, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Result<Self, KeyreelError> {
        let buffer = Self {
            width,
            height,
            data,
        };
        buffer.validate()?;
        Ok(buffer)
    }

    /// Checks that `data` holds exactly `width * height` RGBA pixels.
    pub fn validate(&self) -> Result<(), KeyreelError> {
        if self.data.len() != self.width as usize * self.height as usize * 4 {
            return Err(KeyreelError::InvalidPixelBuffer {
                width: self.width,
                height: self.height,
                len: self.data.len(),
            });
        }
        Ok(())
    }

    /// Buffer filled with a single colour.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Nearest-neighbour rescale. Each output dimension is at least 1.
    /// Pixels missing from a short buffer come out transparent black.
    pub fn scaled(&self, factor: f64) -> PixelBuffer {
        let scale = |n: u32| ((f64::from(n) * factor).round() as u32).max(1);
        let (w, h) = (scale(self.width), scale(self.height));
        if (w, h) == (self.width, self.height) || self.data.is_empty() {
            return self.clone();
        }
        let (sw, sh) = (self.width as usize, self.height as usize);
        let mut data = Vec::with_capacity(w as usize * h as usize * 4);
        for y in 0..h as usize {
            let sy = (y * sh / h as usize).min(sh - 1);
            for x in 0..w as usize {
                let sx = (x * sw / w as usize).min(sw - 1);
                let i = (sy * sw + sx) * 4;
                data.extend_from_slice(self.data.get(i..i + 4).unwrap_or(&[0; 4]));
            }
        }
        PixelBuffer {
            width: w,
            height: h,
            data,
        }
    }
}

/// Output kind chosen from the target path's extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputFormat {
    /// No extension: a directory of PNG files named `<stem>_<index:06>.png`.
    ImageSequence { directory: PathBuf, stem: String },
    Gif,
    /// Video container; takes a quality setting.
    Video { extension: String },
    /// Anything else, left to the encoder.
    Other { extension: String },
}

impl OutputFormat {
    pub fn for_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            None | Some("") => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "frame".to_string());
                let directory = path
                    .parent()
                    .map(|p| p.join(&stem))
                    .unwrap_or_else(|| PathBuf::from(&stem));
                OutputFormat::ImageSequence { directory, stem }
            }
            Some("gif") => OutputFormat::Gif,
            Some(ext) if VIDEO_EXTENSIONS.contains(&ext) => OutputFormat::Video {
                extension: ext.to_string(),
            },
            Some(ext) => OutputFormat::Other {
                extension: ext.to_string(),
            },
        }
    }

    pub fn accepts_quality(&self) -> bool {
        matches!(self, OutputFormat::Video { .. })
    }

    /// File for frame `index` of an image sequence.
    pub fn frame_path(&self, index: usize) -> Option<PathBuf> {
        match self {
            OutputFormat::ImageSequence { directory, stem } => {
                Some(directory.join(format!("{stem}_{index:06}.png")))
            }
            _ => None,
        }
    }
}

/// Everything an encoder needs to open its output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncoderOptions {
    pub format: OutputFormat,
    pub fps: u32,
    /// Only set for video outputs.
    pub quality: Option<u8>,
    /// Explicit container/codec override.
    pub codec: Option<String>,
    pub frame_count: usize,
}

impl EncoderOptions {
    pub fn new(path: &Path, settings: &EncoderSettings, frame_count: usize) -> Self {
        let format = OutputFormat::for_path(path);
        let quality = format.accepts_quality().then_some(settings.quality);
        Self {
            format,
            fps: settings.fps,
            quality,
            codec: settings.format.clone(),
            frame_count,
        }
    }
}

/// Renders the live scene's current state.
pub trait Renderer {
    /// Must reflect every write made before the call.
    fn render(&mut self, options: &CaptureOptions) -> Result<PixelBuffer, BoxError>;
}

/// Consumes rendered frames in order.
pub trait FrameEncoder {
    fn open(&mut self, path: &Path, options: &EncoderOptions) -> Result<(), BoxError>;
    /// All frames of one run have the same dimensions.
    fn append_frame(&mut self, frame: &PixelBuffer) -> Result<(), BoxError>;
    fn close(&mut self) -> Result<(), BoxError>;
    /// Called instead of `close` when the run fails or is cancelled.
    fn abort(&mut self) {}
}

/// Shared cancellation flag, checked before each frame.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub capture: CaptureOptions,
    pub encoder: EncoderSettings,
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            capture: config.capture.clone(),
            encoder: config.encoder.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSummary {
    pub frames: usize,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
}

/// Render every frame of `store` through `scene` into `encoder`.
///
/// Requires at least two keyframes. Renderer and encoder errors are returned
/// with their source intact; after any failure (including cancellation) the
/// encoder is aborted rather than closed.
pub fn render_animation<S, E>(
    store: &KeyframeStore,
    scene: &mut S,
    encoder: &mut E,
    path: &Path,
    options: &RenderOptions,
    stop: &StopHandle,
    mut progress: impl FnMut(Progress),
) -> Result<RenderSummary, KeyreelError>
where
    S: LiveScene + Renderer + ?Sized,
    E: FrameEncoder + ?Sized,
{
    store.validate_animatable()?;
    let total = store.frame_count();
    let encoder_options = EncoderOptions::new(path, &options.encoder, total);
    info!(frames = total, path = %path.display(), format = ?encoder_options.format, "rendering animation");

    match run(store, scene, encoder, path, options, &encoder_options, stop, &mut progress) {
        Ok((width, height)) => {
            info!(frames = total, width, height, "animation rendered");
            Ok(RenderSummary {
                frames: total,
                width,
                height,
                format: encoder_options.format,
            })
        }
        Err(err) => {
            match &err {
                KeyreelError::Cancelled { frame } => warn!(frame, "rendering cancelled"),
                other => warn!(error = %other, category = other.category(), "rendering failed"),
            }
            encoder.abort();
            Err(err)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run<S, E>(
    store: &KeyframeStore,
    scene: &mut S,
    encoder: &mut E,
    path: &Path,
    options: &RenderOptions,
    encoder_options: &EncoderOptions,
    stop: &StopHandle,
    progress: &mut impl FnMut(Progress),
) -> Result<(u32, u32), KeyreelError>
where
    S: LiveScene + Renderer + ?Sized,
    E: FrameEncoder + ?Sized,
{
    let frames = play(store);
    let total = frames.len();
    encoder
        .open(path, encoder_options)
        .map_err(|source| KeyreelError::Encode {
            stage: "open",
            source,
        })?;

    let mut size: Option<(u32, u32)> = None;
    for index in 0..total {
        if stop.is_stopped() {
            return Err(KeyreelError::Cancelled { frame: index });
        }
        let frame = frames.get(index)?;
        apply(&frame.state, scene);
        let mut pixels = scene
            .render(&options.capture)
            .map_err(|source| KeyreelError::Render {
                frame: index,
                source,
            })?;
        pixels.validate()?;
        if let Some(factor) = options.capture.scale_factor {
            pixels = pixels.scaled(factor);
        }
        match size {
            None => size = Some((pixels.width, pixels.height)),
            Some((w, h)) if (w, h) != (pixels.width, pixels.height) => {
                return Err(KeyreelError::FrameSizeMismatch {
                    frame: index,
                    expected_width: w,
                    expected_height: h,
                    actual_width: pixels.width,
                    actual_height: pixels.height,
                });
            }
            Some(_) => {}
        }
        encoder
            .append_frame(&pixels)
            .map_err(|source| KeyreelError::Encode {
                stage: "append_frame",
                source,
            })?;
        progress(Progress {
            completed: index + 1,
            total,
        });
    }

    encoder.close().map_err(|source| KeyreelError::Encode {
        stage: "close",
        source,
    })?;
    Ok(size.unwrap_or((0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_from_extension() {
        assert_eq!(OutputFormat::for_path(Path::new("movie.gif")), OutputFormat::Gif);
        assert_eq!(
            OutputFormat::for_path(Path::new("out/movie.MP4")),
            OutputFormat::Video {
                extension: "mp4".to_string()
            }
        );
        assert_eq!(
            OutputFormat::for_path(Path::new("movie.webm")),
            OutputFormat::Other {
                extension: "webm".to_string()
            }
        );
        let seq = OutputFormat::for_path(Path::new("renders/take1"));
        assert_eq!(
            seq.frame_path(42),
            Some(PathBuf::from("renders/take1/take1_000042.png"))
        );
        assert!(!seq.accepts_quality());
    }

    #[test]
    fn quality_only_for_video() {
        let settings = EncoderSettings::default();
        let gif = EncoderOptions::new(Path::new("a.gif"), &settings, 3);
        assert_eq!(gif.quality, None);
        let mov = EncoderOptions::new(Path::new("a.mov"), &settings, 3);
        assert_eq!(mov.quality, Some(5));
        assert_eq!(mov.fps, 20);
    }

    #[test]
    fn pixel_buffer_checks_length() {
        assert!(PixelBuffer::new(2, 2, vec![0; 16]).is_ok());
        assert!(matches!(
            PixelBuffer::new(2, 2, vec![0; 15]),
            Err(KeyreelError::InvalidPixelBuffer { len: 15, .. })
        ));
    }

    #[test]
    fn scaled_tolerates_short_buffers() {
        let short = PixelBuffer {
            width: 4,
            height: 4,
            data: vec![9; 4],
        };
        assert!(short.validate().is_err());
        let up = short.scaled(2.0);
        assert_eq!(up.data.len(), 8 * 8 * 4);
        assert_eq!(up.pixel(0, 0), Some([9, 9, 9, 9]));
        assert_eq!(up.pixel(7, 7), Some([0, 0, 0, 0]));
    }

    #[test]
    fn scaled_uses_nearest_neighbour() {
        let mut data = Vec::new();
        for px in [[1, 0, 0, 255], [2, 0, 0, 255], [3, 0, 0, 255], [4, 0, 0, 255]] {
            data.extend_from_slice(&px);
        }
        let img = PixelBuffer::new(2, 2, data).unwrap();
        let up = img.scaled(2.0);
        assert_eq!((up.width, up.height), (4, 4));
        assert_eq!(up.pixel(0, 0), Some([1, 0, 0, 255]));
        assert_eq!(up.pixel(3, 0), Some([2, 0, 0, 255]));
        assert_eq!(up.pixel(3, 3), Some([4, 0, 0, 255]));
        let down = up.scaled(0.25);
        assert_eq!((down.width, down.height), (1, 1));
        assert_eq!(down.pixel(0, 0), Some([1, 0, 0, 255]));
    }

    #[test]
    fn stop_handle_is_shared() {
        let stop = StopHandle::new();
        let other = stop.clone();
        other.stop();
        assert!(stop.is_stopped());
        stop.reset();
        assert!(!other.is_stopped());
    }
}
