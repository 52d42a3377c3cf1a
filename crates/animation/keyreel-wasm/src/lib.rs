use js_sys::Array;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use keyreel_core::{Config, Easing, FrameCache, KeyframeStore, KeyreelError, Snapshot};

fn js_err(context: &str, err: impl std::fmt::Display) -> JsError {
    JsError::new(&format!("{context}: {err}"))
}

fn parse_snapshot(value: JsValue, context: &str) -> Result<Snapshot, JsError> {
    swb::from_value(value).map_err(|e| js_err(context, e))
}

fn to_js(snapshot: &Snapshot) -> Result<JsValue, JsError> {
    swb::to_value(snapshot).map_err(|e| js_err("snapshot serialize error", e))
}

fn parse_easing(name: Option<String>) -> Result<Easing, KeyreelError> {
    match name {
        Some(name) => name.parse(),
        None => Ok(Easing::Linear),
    }
}

/// Evaluate a named easing preset at linear progress `u`.
#[wasm_bindgen]
pub fn ease(name: &str, u: f64) -> Result<f64, JsError> {
    let easing: Easing = name.parse().map_err(|e| js_err("ease", e))?;
    Ok(easing.ease(u))
}

/// Interpolate two snapshots (flat `{ path, value, interpolation }` arrays) at `t`.
#[wasm_bindgen]
pub fn interpolate(a: JsValue, b: JsValue, t: f64) -> Result<JsValue, JsError> {
    let a = parse_snapshot(a, "interpolate: start snapshot")?;
    let b = parse_snapshot(b, "interpolate: end snapshot")?;
    let out = keyreel_core::interpolate(&a, &b, t).map_err(|e| js_err("interpolate", e))?;
    to_js(&out)
}

/// Keyframe store plus a scrub cache of interpolated frames.
#[wasm_bindgen]
pub struct KeyreelStore {
    store: KeyframeStore,
    cache: FrameCache,
}

impl KeyreelStore {
    fn with_store(store: KeyframeStore) -> Self {
        Self {
            store,
            cache: FrameCache::new(Config::default().frame_cache_size),
        }
    }

    fn frame_snapshot(&mut self, index: i32) -> Result<std::sync::Arc<Snapshot>, KeyreelError> {
        let len = self.store.frame_count();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs() as usize)
        } else {
            Some(index as usize)
        };
        let frame = resolved.filter(|f| *f < len).ok_or(KeyreelError::IndexOutOfRange {
            index: index.unsigned_abs() as usize,
            len,
        })?;
        self.cache.get(&self.store, frame)
    }
}

#[wasm_bindgen]
impl KeyreelStore {
    #[wasm_bindgen(constructor)]
    pub fn new() -> KeyreelStore {
        console_error_panic_hook::set_once();
        KeyreelStore::with_store(KeyframeStore::new())
    }

    /// Load a store from its JSON record list.
    #[wasm_bindgen(js_name = fromJson)]
    pub fn from_json(json: &str) -> Result<KeyreelStore, JsError> {
        console_error_panic_hook::set_once();
        let store = KeyframeStore::from_json(json).map_err(|e| js_err("from_json", e))?;
        Ok(KeyreelStore::with_store(store))
    }

    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsError> {
        self.store.to_json().map_err(|e| js_err("to_json", e))
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[wasm_bindgen(js_name = isEmpty)]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[wasm_bindgen(js_name = frameCount)]
    pub fn frame_count(&self) -> usize {
        self.store.frame_count()
    }

    /// Append a keyframe. `ease` defaults to linear.
    pub fn push(&mut self, snapshot: JsValue, steps: u32, ease: Option<String>) -> Result<usize, JsError> {
        let snapshot = parse_snapshot(snapshot, "push: snapshot")?;
        let ease = parse_easing(ease).map_err(|e| js_err("push", e))?;
        let kf = self
            .store
            .push(snapshot, steps, ease)
            .map_err(|e| js_err("push", e))?;
        Ok(kf.position)
    }

    pub fn delete(&mut self, position: usize) -> Result<(), JsError> {
        self.store
            .delete(position)
            .map(|_| ())
            .map_err(|e| js_err("delete", e))
    }

    pub fn update(&mut self, position: usize, steps: Option<u32>, ease: Option<String>) -> Result<(), JsError> {
        let ease = match ease {
            Some(name) => Some(name.parse::<Easing>().map_err(|e| js_err("update", e))?),
            None => None,
        };
        self.store
            .update(position, steps, ease)
            .map_err(|e| js_err("update", e))
    }

    #[wasm_bindgen(js_name = moveKeyframe)]
    pub fn move_keyframe(&mut self, from: usize, to: usize) -> Result<(), JsError> {
        self.store
            .move_keyframe(from, to)
            .map_err(|e| js_err("move_keyframe", e))
    }

    /// Keyframe names in order.
    pub fn names(&self) -> Array {
        self.store
            .iter()
            .map(|kf| JsValue::from_str(&kf.name))
            .collect()
    }

    /// Snapshot shown at movie frame `index`; negative indices count from the end.
    pub fn frame(&mut self, index: i32) -> Result<JsValue, JsError> {
        let snapshot = self.frame_snapshot(index).map_err(|e| js_err("frame", e))?;
        to_js(&snapshot)
    }

    #[wasm_bindgen(js_name = keyframeFrameIndex)]
    pub fn keyframe_frame_index(&self, position: usize) -> Result<usize, JsError> {
        self.store
            .keyframe_frame_index(position)
            .map_err(|e| js_err("keyframe_frame_index", e))
    }
}

impl Default for KeyreelStore {
    fn default() -> Self {
        Self::with_store(KeyframeStore::new())
    }
}
