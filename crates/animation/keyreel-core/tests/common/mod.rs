#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use keyreel_core::{
    AttrPath, BoxError, CaptureOptions, EncoderOptions, FrameEncoder, KeyframeStore, LayerInfo,
    LiveScene, PixelBuffer, Renderer, Snapshot, Value,
};

pub fn snapshot(name: &str) -> Snapshot {
    keyreel_test_fixtures::snapshots::load(name).expect("snapshot fixture")
}

pub fn store(name: &str) -> KeyframeStore {
    let json = keyreel_test_fixtures::stores::json(name).expect("store fixture");
    KeyframeStore::from_json(&json).expect("store should parse")
}

pub fn path(s: &str) -> AttrPath {
    AttrPath::parse(s).unwrap()
}

pub fn scalar(snapshot: &Snapshot, at: &str) -> f64 {
    snapshot.value(&path(at)).and_then(Value::as_scalar).unwrap()
}

/// In-memory viewer: a flat attribute table plus a fake canvas whose red
/// channel encodes the opacity of the first layer.
#[derive(Debug, Default)]
pub struct MockViewer {
    pub layers: Vec<LayerInfo>,
    pub values: HashMap<AttrPath, Value>,
    pub width: u32,
    pub height: u32,
    pub renders: usize,
    pub writes: usize,
    pub fail_render_at: Option<usize>,
    pub resize_at: Option<(usize, u32, u32)>,
    /// From this render on, return only one pixel's worth of data.
    pub truncate_at: Option<usize>,
}

impl MockViewer {
    /// Viewer whose attributes are exactly those of `snapshot`; every layer is an image layer.
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        let layers = snapshot
            .layer_names()
            .into_iter()
            .map(|name| LayerInfo::new(name, "image"))
            .collect();
        let values = snapshot
            .leaves()
            .into_iter()
            .map(|(p, leaf)| (p, leaf.value.clone()))
            .collect();
        Self {
            layers,
            values,
            width: 8,
            height: 6,
            ..Default::default()
        }
    }

    pub fn scalar(&self, at: &str) -> f64 {
        self.values.get(&path(at)).and_then(Value::as_scalar).unwrap()
    }

    /// The viewer's live state matches `snapshot` on every snapshot path.
    pub fn shows(&self, snapshot: &Snapshot) -> bool {
        snapshot
            .leaves()
            .iter()
            .all(|(p, leaf)| self.values.get(p) == Some(&leaf.value))
    }
}

impl LiveScene for MockViewer {
    fn layers(&self) -> Vec<LayerInfo> {
        self.layers.clone()
    }

    fn read(&self, path: &AttrPath) -> Option<Value> {
        self.values.get(path).cloned()
    }

    fn write(&mut self, path: &AttrPath, value: &Value) -> bool {
        match self.values.get_mut(path) {
            Some(slot) => {
                *slot = value.clone();
                self.writes += 1;
                true
            }
            None => false,
        }
    }
}

impl Renderer for MockViewer {
    fn render(&mut self, _options: &CaptureOptions) -> Result<PixelBuffer, BoxError> {
        let index = self.renders;
        self.renders += 1;
        if self.fail_render_at == Some(index) {
            return Err(format!("GL context lost at render {index}").into());
        }
        if let Some((at, w, h)) = self.resize_at {
            if index >= at {
                self.width = w;
                self.height = h;
            }
        }
        let opacity = self
            .layers
            .first()
            .and_then(|l| AttrPath::layer(&l.name, &path("opacity")).ok())
            .and_then(|p| self.values.get(&p))
            .and_then(Value::as_scalar)
            .unwrap_or(0.0);
        let red = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let mut pixels = PixelBuffer::filled(self.width, self.height, [red, 0, 0, 255]);
        if self.truncate_at.is_some_and(|at| index >= at) {
            pixels.data.truncate(4);
        }
        Ok(pixels)
    }
}

/// Encoder that keeps every frame in memory.
#[derive(Debug, Default)]
pub struct RecordingEncoder {
    pub opened: Option<(PathBuf, EncoderOptions)>,
    pub frames: Vec<PixelBuffer>,
    pub closed: bool,
    pub aborted: bool,
    pub fail_append_at: Option<usize>,
}

impl FrameEncoder for RecordingEncoder {
    fn open(&mut self, path: &Path, options: &EncoderOptions) -> Result<(), BoxError> {
        self.opened = Some((path.to_path_buf(), options.clone()));
        Ok(())
    }

    fn append_frame(&mut self, frame: &PixelBuffer) -> Result<(), BoxError> {
        if self.fail_append_at == Some(self.frames.len()) {
            return Err("disk full".into());
        }
        self.frames.push(frame.clone());
        Ok(())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.closed = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}
