//! Snapshot: immutable nested record of captured attribute values.
//!
//! Model:
//! - A tree of named groups (`camera`, `dims`, `layers.<name>`) whose leaves
//!   carry a [`Value`] plus its [`InterpolationKind`].
//! - Groups preserve capture order (so applying a snapshot touches layers in
//!   viewer order) while equality ignores order.
//! - On the wire a snapshot is a flat, ordered list of `{ path, value, interpolation }`
//!   entries, which keeps layer names containing dots unambiguous.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::KeyreelError;
use crate::path::AttrPath;
use crate::value::{InterpolationKind, Leaf, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Group(IndexMap<String, Node>),
    Leaf(Leaf),
}

impl Node {
    pub fn as_leaf(&self) -> Option<&Leaf> {
        if let Node::Leaf(leaf) = self {
            Some(leaf)
        } else {
            None
        }
    }

    pub fn as_group(&self) -> Option<&IndexMap<String, Node>> {
        if let Node::Group(children) = self {
            Some(children)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<SnapshotEntry>", try_from = "Vec<SnapshotEntry>")]
pub struct Snapshot {
    root: IndexMap<String, Node>,
}

/// Flat serialized form of one snapshot leaf.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub path: AttrPath,
    pub value: Value,
    #[serde(default)]
    pub interpolation: InterpolationKind,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_root(root: IndexMap<String, Node>) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &IndexMap<String, Node> {
        &self.root
    }

    /// Insert (or overwrite) a leaf, creating intermediate groups.
    /// Fails if the path would pass through an existing leaf or replace a group.
    pub fn insert(&mut self, path: &AttrPath, leaf: Leaf) -> Result<(), KeyreelError> {
        let (last, parents) = match path.segments().split_last() {
            Some(split) => split,
            None => {
                return Err(KeyreelError::InvalidPath {
                    reason: "empty path".to_string(),
                })
            }
        };
        let mut group = &mut self.root;
        for seg in parents {
            let node = group
                .entry(seg.clone())
                .or_insert_with(|| Node::Group(IndexMap::new()));
            group = match node {
                Node::Group(children) => children,
                Node::Leaf(_) => {
                    return Err(KeyreelError::InvalidPath {
                        reason: format!("'{path}' passes through leaf '{seg}'"),
                    })
                }
            };
        }
        if let Some(Node::Group(_)) = group.get(last) {
            return Err(KeyreelError::InvalidPath {
                reason: format!("'{path}' would replace a group with a leaf"),
            });
        }
        group.insert(last.clone(), Node::Leaf(leaf));
        Ok(())
    }

    /// Builder-style insert of a value with the given interpolation rule.
    pub fn with(
        mut self,
        path: &str,
        value: Value,
        interpolation: InterpolationKind,
    ) -> Result<Self, KeyreelError> {
        let path = AttrPath::parse(path)?;
        self.insert(&path, Leaf::new(value, interpolation))?;
        Ok(self)
    }

    pub fn node(&self, path: &AttrPath) -> Option<&Node> {
        let (first, rest) = path.segments().split_first()?;
        let mut node = self.root.get(first)?;
        for seg in rest {
            node = node.as_group()?.get(seg)?;
        }
        Some(node)
    }

    pub fn get(&self, path: &AttrPath) -> Option<&Leaf> {
        self.node(path).and_then(Node::as_leaf)
    }

    pub fn value(&self, path: &AttrPath) -> Option<&Value> {
        self.get(path).map(|leaf| &leaf.value)
    }

    /// All leaves, depth-first in capture order.
    pub fn leaves(&self) -> Vec<(AttrPath, &Leaf)> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = Vec::new();
        collect_leaves(&self.root, &mut stack, &mut out);
        out
    }

    pub fn paths(&self) -> Vec<AttrPath> {
        self.leaves().into_iter().map(|(p, _)| p).collect()
    }

    /// Number of leaves.
    pub fn len(&self) -> usize {
        fn count(group: &IndexMap<String, Node>) -> usize {
            group
                .values()
                .map(|node| match node {
                    Node::Group(children) => count(children),
                    Node::Leaf(_) => 1,
                })
                .sum()
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layer names present under `layers`, in capture order.
    pub fn layer_names(&self) -> Vec<&str> {
        self.root
            .get(crate::schema::LAYERS_ROOT)
            .and_then(Node::as_group)
            .map(|layers| layers.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Check that `other` has the same paths, value shapes and interpolation
    /// rules as `self`; the first difference is reported.
    pub fn structure_matches(&self, other: &Snapshot) -> Result<(), KeyreelError> {
        let mut stack: Vec<&str> = Vec::new();
        match_groups(&self.root, &other.root, &mut stack)
    }
}

fn collect_leaves<'a>(
    group: &'a IndexMap<String, Node>,
    stack: &mut Vec<&'a str>,
    out: &mut Vec<(AttrPath, &'a Leaf)>,
) {
    for (key, node) in group {
        stack.push(key);
        match node {
            Node::Group(children) => collect_leaves(children, stack, out),
            Node::Leaf(leaf) => out.push((AttrPath::from_stack(stack), leaf)),
        }
        stack.pop();
    }
}

pub(crate) fn missing_key<'a>(
    a: &'a IndexMap<String, Node>,
    b: &'a IndexMap<String, Node>,
) -> Option<(&'a str, bool)> {
    if let Some(key) = a.keys().find(|k| !b.contains_key(k.as_str())) {
        return Some((key, false));
    }
    b.keys()
        .find(|k| !a.contains_key(k.as_str()))
        .map(|key| (key.as_str(), true))
}

fn match_groups<'a>(
    a: &'a IndexMap<String, Node>,
    b: &'a IndexMap<String, Node>,
    stack: &mut Vec<&'a str>,
) -> Result<(), KeyreelError> {
    if let Some((key, only_in_b)) = missing_key(a, b) {
        stack.push(key);
        let side = if only_in_b { "start" } else { "end" };
        return Err(KeyreelError::mismatch(
            &AttrPath::from_stack(stack),
            format!("missing from {side} snapshot"),
        ));
    }
    for (key, na) in a {
        stack.push(key);
        let nb = &b[key.as_str()];
        match (na, nb) {
            (Node::Group(ga), Node::Group(gb)) => match_groups(ga, gb, stack)?,
            (Node::Leaf(la), Node::Leaf(lb)) => check_leaves(&AttrPath::from_stack(stack), la, lb)?,
            _ => {
                return Err(KeyreelError::mismatch(
                    &AttrPath::from_stack(stack),
                    "group in one snapshot, leaf in the other",
                ))
            }
        }
        stack.pop();
    }
    Ok(())
}

pub(crate) fn check_leaves(path: &AttrPath, a: &Leaf, b: &Leaf) -> Result<(), KeyreelError> {
    if a.interpolation != b.interpolation {
        return Err(KeyreelError::mismatch(
            path,
            format!(
                "interpolation {} vs {}",
                a.interpolation.name(),
                b.interpolation.name()
            ),
        ));
    }
    if !a.value.same_shape(&b.value) {
        return Err(KeyreelError::mismatch(
            path,
            format!("{} vs {}", a.value.shape(), b.value.shape()),
        ));
    }
    Ok(())
}

impl From<Snapshot> for Vec<SnapshotEntry> {
    fn from(snapshot: Snapshot) -> Self {
        snapshot
            .leaves()
            .into_iter()
            .map(|(path, leaf)| SnapshotEntry {
                path,
                value: leaf.value.clone(),
                interpolation: leaf.interpolation,
            })
            .collect()
    }
}

impl TryFrom<Vec<SnapshotEntry>> for Snapshot {
    type Error = KeyreelError;

    fn try_from(entries: Vec<SnapshotEntry>) -> Result<Self, Self::Error> {
        let mut snapshot = Snapshot::new();
        for entry in entries {
            if snapshot.node(&entry.path).is_some() {
                return Err(KeyreelError::InvalidPath {
                    reason: format!("duplicate snapshot entry '{}'", entry.path),
                });
            }
            snapshot.insert(&entry.path, Leaf::new(entry.value, entry.interpolation))?;
        }
        Ok(snapshot)
    }
}
