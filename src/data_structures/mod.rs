//! Showroom data structures: meshes, materials, textures, scene graphs, and transforms.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains the vertex layout, CPU mesh data and uploaded GPU meshes
//! - `material` holds the part color registry and the PBR material of every part
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds node transforms and their GPU layout
//! - `scene_graph` mirrors the loaded node hierarchy and binds parts to nodes

pub mod instance;
pub mod material;
pub mod model;
pub mod scene_graph;
pub mod texture;
