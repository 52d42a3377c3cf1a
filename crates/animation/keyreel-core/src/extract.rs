//! Capture and restore of live scene state.
//!
//! The live scene is the one mutable resource shared by capture, playback and
//! rendering; it is always passed in explicitly as a [`LiveScene`] handle.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::path::AttrPath;
use crate::schema::{AttributeRegistry, AttributeSpec, EntityKind, CAMERA_ROOT, DIMS_ROOT};
use crate::snapshot::Snapshot;
use crate::value::{Leaf, Value};

/// A layer as seen by the extractor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    /// Layer kind, e.g. `"image"`, `"labels"`, `"points"`.
    pub kind: String,
}

impl LayerInfo {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

/// Read/write access to the live viewer.
pub trait LiveScene {
    /// Layers in viewer order.
    fn layers(&self) -> Vec<LayerInfo>;
    /// Current value at a full snapshot path, `None` if the attribute does
    /// not exist on this scene (e.g. `shear` on a layer kind without it).
    fn read(&self, path: &AttrPath) -> Option<Value>;
    /// Set a value. Returns false if the path is unknown; that is not an error.
    fn write(&mut self, path: &AttrPath, value: &Value) -> bool;
}

/// Outcome of [`apply`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub written: usize,
    /// Leaves whose live value already matched and were not rewritten.
    pub unchanged: usize,
    /// Leaves whose path the scene did not recognise.
    pub skipped: usize,
}

/// Capture the registered attributes of `scene` into a snapshot.
///
/// Read-only. Attributes the scene does not expose are omitted, so snapshots
/// of scenes with different layers may differ in structure; that is only
/// detected when two of them are interpolated.
pub fn extract<S>(scene: &S, registry: &AttributeRegistry) -> Snapshot
where
    S: LiveScene + ?Sized,
{
    let mut snapshot = Snapshot::new();
    let roots = [(EntityKind::Camera, CAMERA_ROOT), (EntityKind::Dims, DIMS_ROOT)];
    for (entity, root) in roots {
        let base = AttrPath::from_stack(&[root]);
        for spec in registry.attributes(&entity) {
            capture(scene, registry, &mut snapshot, base.concat(&spec.path), spec);
        }
    }
    for layer in scene.layers() {
        for spec in registry.layer_attributes(&layer.kind) {
            match AttrPath::layer(&layer.name, &spec.path) {
                Ok(path) => capture(scene, registry, &mut snapshot, path, spec),
                Err(err) => {
                    debug!(kind = %layer.kind, error = %err, "layer not captured");
                    break;
                }
            }
        }
    }
    debug!(leaves = snapshot.len(), "extracted scene snapshot");
    snapshot
}

fn capture<S>(
    scene: &S,
    registry: &AttributeRegistry,
    snapshot: &mut Snapshot,
    path: AttrPath,
    spec: &AttributeSpec,
) where
    S: LiveScene + ?Sized,
{
    let Some(value) = scene.read(&path) else {
        return;
    };
    let kind = registry.resolve(&path, spec.interpolation);
    // Only fails when two registrations overlap (`a` and `a.b`).
    if let Err(err) = snapshot.insert(&path, Leaf::new(value, kind)) {
        debug!(%path, error = %err, "attribute not captured");
    }
}

/// Write a snapshot back onto the scene, skipping values that are already live.
pub fn apply<S>(snapshot: &Snapshot, scene: &mut S) -> ApplyReport
where
    S: LiveScene + ?Sized,
{
    let mut report = ApplyReport::default();
    for (path, leaf) in snapshot.leaves() {
        if scene.read(&path).as_ref() == Some(&leaf.value) {
            report.unchanged += 1;
        } else if scene.write(&path, &leaf.value) {
            report.written += 1;
        } else {
            debug!(%path, "scene has no such attribute; write skipped");
            report.skipped += 1;
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::InterpolationKind;
    use indexmap::IndexMap;

    #[derive(Default)]
    struct MapScene {
        layers: Vec<LayerInfo>,
        values: IndexMap<String, Value>,
        writes: usize,
    }

    impl LiveScene for MapScene {
        fn layers(&self) -> Vec<LayerInfo> {
            self.layers.clone()
        }
        fn read(&self, path: &AttrPath) -> Option<Value> {
            self.values.get(&path.to_string()).cloned()
        }
        fn write(&mut self, path: &AttrPath, value: &Value) -> bool {
            match self.values.get_mut(&path.to_string()) {
                Some(slot) => {
                    *slot = value.clone();
                    self.writes += 1;
                    true
                }
                None => false,
            }
        }
    }

    fn scene() -> MapScene {
        let mut s = MapScene {
            layers: vec![LayerInfo::new("cells", "image"), LayerInfo::new("spots", "points")],
            ..Default::default()
        };
        for (k, v) in [
            ("camera.zoom", Value::Scalar(1.5)),
            ("camera.angles", Value::vec3(0.0, 0.0, 90.0)),
            ("dims.ndisplay", Value::Integer(3)),
            ("layers.cells.opacity", Value::Scalar(0.8)),
            ("layers.cells.gamma", Value::Scalar(1.0)),
            ("layers.cells.shear", Value::Vector(vec![0.0; 3])),
            ("layers.spots.opacity", Value::Scalar(1.0)),
            ("layers.spots.visible", Value::Bool(true)),
        ] {
            s.values.insert(k.to_string(), v);
        }
        s
    }

    #[test]
    fn extract_captures_registered_attributes_only() {
        let s = scene();
        let snap = extract(&s, &AttributeRegistry::viewer_default());
        assert_eq!(snap.len(), 8);
        let zoom = snap.get(&AttrPath::parse("camera.zoom").unwrap()).unwrap();
        assert_eq!(zoom.interpolation, InterpolationKind::Log);
        // Attributes the scene lacks are omitted.
        assert!(snap.get(&AttrPath::parse("layers.spots.shear").unwrap()).is_none());
        assert_eq!(snap.layer_names(), vec!["cells", "spots"]);
    }

    #[test]
    fn unnamed_layers_are_skipped() {
        let mut s = scene();
        s.layers.push(LayerInfo::new("", "image"));
        s.values.insert("layers..opacity".to_string(), Value::Scalar(0.3));
        let snap = extract(&s, &AttributeRegistry::viewer_default());
        assert_eq!(snap.len(), 8);
        assert_eq!(snap.layer_names(), vec!["cells", "spots"]);

        let json = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn apply_only_writes_changes() {
        let mut s = scene();
        let registry = AttributeRegistry::viewer_default();
        let mut snap = extract(&s, &registry);
        snap.insert(
            &AttrPath::parse("camera.zoom").unwrap(),
            Leaf::new(Value::Scalar(3.0), InterpolationKind::Log),
        )
        .unwrap();
        snap.insert(
            &AttrPath::parse("layers.gone.opacity").unwrap(),
            Value::Scalar(0.5).into(),
        )
        .unwrap();

        let report = apply(&snap, &mut s);
        assert_eq!(report.written, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.unchanged, 8 - 1);
        assert_eq!(s.writes, 1);
        assert_eq!(s.values["camera.zoom"], Value::Scalar(3.0));
    }
}
