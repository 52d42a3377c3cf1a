//! Registry of animatable attributes.
//!
//! Maps an entity kind (camera, dims, any layer, a specific layer kind) to an
//! ordered list of attribute paths and the interpolation rule each one uses.
//! New attributes are added by registering entries, not by changing the
//! extractor.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::KeyreelError;
use crate::path::AttrPath;
use crate::value::InterpolationKind;

/// Top-level group holding the camera attributes.
pub const CAMERA_ROOT: &str = "camera";
/// Top-level group holding the dims (display-dimension controller) attributes.
pub const DIMS_ROOT: &str = "dims";
/// Top-level group holding one sub-group per layer, keyed by layer name.
pub const LAYERS_ROOT: &str = "layers";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Camera,
    Dims,
    /// Attributes common to every layer kind.
    AnyLayer,
    /// Attributes specific to one layer kind (`"image"`, `"points"`, ...).
    Layer(String),
}

/// One registered attribute, relative to its entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub path: AttrPath,
    #[serde(default)]
    pub interpolation: InterpolationKind,
}

impl AttributeSpec {
    pub fn new(path: &str, interpolation: InterpolationKind) -> Result<Self, KeyreelError> {
        Ok(Self {
            path: AttrPath::parse(path)?,
            interpolation,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct AttributeRegistry {
    entries: HashMap<EntityKind, Vec<AttributeSpec>>,
    overrides: HashMap<AttrPath, InterpolationKind>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes captured from a scene viewer by default: camera, dims, the
    /// transform/appearance of every layer, and image-layer display settings.
    pub fn viewer_default() -> Self {
        use InterpolationKind::{Default as Lin, Log, Slerp, Step};
        let table: &[(EntityKind, &[(&str, InterpolationKind)])] = &[
            (
                EntityKind::Camera,
                &[
                    ("center", Lin),
                    ("zoom", Log),
                    ("angles", Slerp),
                    ("perspective", Lin),
                    ("interactive", Step),
                ],
            ),
            (
                EntityKind::Dims,
                &[("ndisplay", Step), ("order", Step), ("current_step", Lin)],
            ),
            (
                EntityKind::AnyLayer,
                &[
                    ("visible", Step),
                    ("opacity", Lin),
                    ("blending", Step),
                    ("scale", Lin),
                    ("translate", Lin),
                    ("rotate", Lin),
                    ("shear", Lin),
                ],
            ),
            (
                EntityKind::Layer("image".to_string()),
                &[
                    ("contrast_limits", Lin),
                    ("gamma", Lin),
                    ("colormap", Step),
                    ("interpolation", Step),
                    ("rendering", Step),
                    ("iso_threshold", Lin),
                    ("attenuation", Lin),
                ],
            ),
        ];

        let mut registry = Self::new();
        for (entity, attrs) in table {
            for (name, kind) in attrs.iter() {
                registry.entries.entry(entity.clone()).or_default().push(AttributeSpec {
                    path: AttrPath::from_stack(&[*name]),
                    interpolation: *kind,
                });
            }
        }
        registry
    }

    /// Register an attribute; re-registering a path replaces its rule.
    pub fn register(&mut self, entity: EntityKind, spec: AttributeSpec) {
        let list = self.entries.entry(entity).or_default();
        match list.iter_mut().find(|s| s.path == spec.path) {
            Some(existing) => existing.interpolation = spec.interpolation,
            None => list.push(spec),
        }
    }

    /// Override the rule for a full snapshot path (`camera.zoom`,
    /// `layers.cells.opacity`). Overrides win over registered rules.
    pub fn set_override(&mut self, path: AttrPath, kind: InterpolationKind) {
        self.overrides.insert(path, kind);
    }

    /// Apply the interpolation overrides from a config.
    pub fn with_overrides(mut self, config: &Config) -> Result<Self, KeyreelError> {
        for (path, kind) in &config.interpolation_overrides {
            self.set_override(AttrPath::parse(path)?, *kind);
        }
        Ok(self)
    }

    pub fn attributes(&self, entity: &EntityKind) -> &[AttributeSpec] {
        self.entries.get(entity).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Common layer attributes followed by those of the given layer kind.
    pub fn layer_attributes<'a>(
        &'a self,
        layer_kind: &str,
    ) -> impl Iterator<Item = &'a AttributeSpec> + 'a {
        self.attributes(&EntityKind::AnyLayer)
            .iter()
            .chain(self.attributes(&EntityKind::Layer(layer_kind.to_string())).iter())
    }

    /// Effective rule for a full snapshot path.
    pub fn resolve(&self, full_path: &AttrPath, registered: InterpolationKind) -> InterpolationKind {
        self.overrides.get(full_path).copied().unwrap_or(registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_default_registers_camera_rules() {
        let reg = AttributeRegistry::viewer_default();
        let camera = reg.attributes(&EntityKind::Camera);
        let zoom = camera.iter().find(|s| s.path.to_string() == "zoom").unwrap();
        assert_eq!(zoom.interpolation, InterpolationKind::Log);
        let angles = camera.iter().find(|s| s.path.to_string() == "angles").unwrap();
        assert_eq!(angles.interpolation, InterpolationKind::Slerp);
    }

    #[test]
    fn image_layers_get_extra_attributes() {
        let reg = AttributeRegistry::viewer_default();
        let image: Vec<String> = reg.layer_attributes("image").map(|s| s.path.to_string()).collect();
        let points: Vec<String> = reg.layer_attributes("points").map(|s| s.path.to_string()).collect();
        assert!(image.contains(&"gamma".to_string()));
        assert!(image.contains(&"opacity".to_string()));
        assert!(!points.contains(&"gamma".to_string()));
        assert_eq!(points.len(), 7);
    }

    #[test]
    fn register_replaces_existing_rule() {
        let mut reg = AttributeRegistry::viewer_default();
        reg.register(
            EntityKind::Camera,
            AttributeSpec::new("zoom", InterpolationKind::Default).unwrap(),
        );
        let count = reg.attributes(&EntityKind::Camera).len();
        assert_eq!(count, 5);
        let zoom = reg
            .attributes(&EntityKind::Camera)
            .iter()
            .find(|s| s.path.to_string() == "zoom")
            .unwrap();
        assert_eq!(zoom.interpolation, InterpolationKind::Default);
    }

    #[test]
    fn overrides_win() {
        let mut config = Config::default();
        config
            .interpolation_overrides
            .insert("layers.cells.opacity".to_string(), InterpolationKind::Step);
        let reg = AttributeRegistry::viewer_default().with_overrides(&config).unwrap();
        let p = AttrPath::parse("layers.cells.opacity").unwrap();
        assert_eq!(reg.resolve(&p, InterpolationKind::Default), InterpolationKind::Step);
        let other = AttrPath::parse("layers.other.opacity").unwrap();
        assert_eq!(reg.resolve(&other, InterpolationKind::Default), InterpolationKind::Default);
    }
}
