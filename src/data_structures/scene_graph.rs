//! Scene graph and part-to-node material binding.
//!
//! The studio asset is loaded into a tree of [`SceneNode`]s that mirrors the
//! node hierarchy of the glTF file. Node names are the only link between
//! the authored asset and the configurator, so material rebinding goes
//! through a typed [`PartManifest`] that is validated when it is applied:
//! every path that cannot be resolved ends up in the [`BindingReport`]
//! instead of aborting the load.

use std::{fmt, str::FromStr};

use anyhow::Context;
use log::warn;

use crate::data_structures::{instance::Transform, material::Part};

/// A node of the loaded studio.
///
/// Meshes with several primitives are expanded into one unnamed child per
/// primitive, placed before the node's own children, so that `Body/0`
/// addresses the first primitive of a multi-material `Body` mesh.
#[derive(Clone, Debug, Default)]
pub struct SceneNode {
    pub name: Option<String>,
    pub local: Transform,
    world: Transform,
    /// Indices into the owning asset's mesh list.
    pub meshes: Vec<usize>,
    /// Material override, set by [`PartManifest::bind`].
    pub binding: Option<Part>,
    pub children: Vec<SceneNode>,
}

/// One drawable primitive with its resolved world transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub mesh: usize,
    pub world: Transform,
    pub binding: Option<Part>,
}

impl SceneNode {
    pub fn new(name: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn named(name: &str) -> Self {
        Self::new(Some(name))
    }

    pub fn with_mesh(mut self, mesh: usize) -> Self {
        self.meshes.push(mesh);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn add_child(&mut self, child: SceneNode) {
        self.children.push(child);
    }

    pub fn world_transform(&self) -> &Transform {
        &self.world
    }

    /// Depth-first search, the node itself first; the first match wins.
    pub fn find(&self, name: &str) -> Option<&SceneNode> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut SceneNode> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(name))
    }

    pub fn resolve(&self, path: &NodePath) -> Option<&SceneNode> {
        let node = self.find(&path.name)?;
        match path.child {
            Some(idx) => node.children.get(idx),
            None => Some(node),
        }
    }

    pub fn resolve_mut(&mut self, path: &NodePath) -> Option<&mut SceneNode> {
        let node = self.find_mut(&path.name)?;
        match path.child {
            Some(idx) => node.children.get_mut(idx),
            None => Some(node),
        }
    }

    /// Visit every node, parents before children.
    pub fn traverse(&self, f: &mut dyn FnMut(&SceneNode)) {
        f(self);
        for child in &self.children {
            child.traverse(f);
        }
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(SceneNode::node_count)
            .sum::<usize>()
    }

    /// Recompute world transforms below `parent`.
    pub fn update_world_transforms(&mut self, parent: &Transform) {
        self.world = parent * &self.local;
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }

    /// Flatten the tree into one entry per primitive.
    pub fn draw_items(&self) -> Vec<DrawItem> {
        let mut items = Vec::new();
        self.traverse(&mut |node| {
            items.extend(node.meshes.iter().map(|&mesh| DrawItem {
                mesh,
                world: node.world,
                binding: node.binding,
            }))
        });
        items
    }
}

/// A node name plus an optional index into that node's children.
///
/// Written as `Name` or `Name/<index>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodePath {
    pub name: String,
    pub child: Option<usize>,
}

impl NodePath {
    pub fn node(name: &str) -> Self {
        Self {
            name: name.to_string(),
            child: None,
        }
    }

    pub fn child(name: &str, idx: usize) -> Self {
        Self {
            name: name.to_string(),
            child: Some(idx),
        }
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.child {
            Some(idx) => write!(f, "{}/{}", self.name, idx),
            None => f.write_str(&self.name),
        }
    }
}

impl FromStr for NodePath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('/') {
            Some((name, idx)) => {
                let idx = idx
                    .parse()
                    .with_context(|| format!("invalid child index in node path {s:?}"))?;
                Ok(Self::child(name, idx))
            }
            None => Ok(Self::node(s)),
        }
    }
}

/// Which scene nodes receive which part material.
#[derive(Clone, Debug, PartialEq)]
pub struct PartManifest {
    entries: Vec<(Part, Vec<NodePath>)>,
}

impl PartManifest {
    pub fn new(entries: Vec<(Part, Vec<NodePath>)>) -> Self {
        Self { entries }
    }

    pub fn paths(&self, part: Part) -> &[NodePath] {
        self.entries
            .iter()
            .find(|(p, _)| *p == part)
            .map(|(_, paths)| paths.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Part, &NodePath)> {
        self.entries
            .iter()
            .flat_map(|(part, paths)| paths.iter().map(move |path| (*part, path)))
    }

    /// Bind every resolvable path to its part material.
    ///
    /// Unresolvable paths are collected and logged, never fatal.
    pub fn bind(&self, root: &mut SceneNode) -> BindingReport {
        let mut report = BindingReport::default();
        for (part, path) in self.iter() {
            match root.resolve_mut(path) {
                Some(node) => {
                    if node.meshes.is_empty() {
                        warn!("node {path} bound to {part} has no geometry of its own");
                        report.empty.push((part, path.clone()));
                    }
                    node.binding = Some(part);
                    report.bound.push((part, path.clone()));
                }
                None => {
                    warn!("node {path} for part {part} not found in the loaded model");
                    report.missing.push((part, path.clone()));
                }
            }
        }
        report
    }
}

impl Default for PartManifest {
    fn default() -> Self {
        let wheels = ["FtL", "FtR", "BkL", "BkR"];
        Self::new(vec![
            (Part::Body, vec![NodePath::child("Body", 0)]),
            (Part::Spoiler, vec![NodePath::node("Spoiler")]),
            (Part::Diffusers, vec![NodePath::node("Diffusers")]),
            (
                Part::Wheels,
                wheels
                    .iter()
                    .map(|w| NodePath::node(&format!("Spyder-wheel{w}")))
                    .collect(),
            ),
            (
                Part::Brakes,
                wheels
                    .iter()
                    .map(|w| NodePath::child(&format!("Spyder-wheelbrake{w}"), 0))
                    .collect(),
            ),
            (Part::Glass, vec![NodePath::node("Glasses")]),
        ])
    }
}

/// Outcome of [`PartManifest::bind`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BindingReport {
    pub bound: Vec<(Part, NodePath)>,
    pub missing: Vec<(Part, NodePath)>,
    /// Bound, but the node draws nothing itself.
    pub empty: Vec<(Part, NodePath)>,
}

impl BindingReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}
