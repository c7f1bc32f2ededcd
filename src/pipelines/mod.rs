//! Render pipelines and the GPU resources bound to them.
//!
//! - `basic` holds the shared pipeline builder and the opaque PBR pipeline
//! - `transparent` draws blended glass after the opaque pass
//! - `light` owns the area light, the environment map and the background
//! - `post` runs bloom, output encoding, the lookup table and FXAA
//! - `marker` draws the numbered annotation badges

pub mod basic;
pub mod light;
pub mod marker;
pub mod post;
pub mod transparent;
