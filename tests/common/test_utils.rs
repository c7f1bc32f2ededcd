use std::time::Duration;

use showroom::{Config, FramePlan, Showroom, cgmath::Point3};

/// One display refresh at 20 fps.
pub(crate) const FRAME: Duration = Duration::from_millis(50);

pub(crate) fn new_showroom(width: u32, height: u32, pixel_ratio: f64) -> Showroom {
    Showroom::new(Config::default(), width, height, pixel_ratio)
}

pub(crate) fn showroom_with(config: Config, width: u32, height: u32) -> Showroom {
    Showroom::new(config, width, height, 1.0)
}

/// Advance `n` frames and return the last plan, `None` if paused throughout.
pub(crate) fn run_frames(showroom: &mut Showroom, n: usize) -> Option<FramePlan> {
    let mut last = None;
    for _ in 0..n {
        if let Some(plan) = showroom.frame(FRAME) {
            last = Some(plan);
        }
    }
    last
}

pub(crate) fn assert_close(actual: f32, expected: f32, eps: f32) {
    assert!(
        (actual - expected).abs() <= eps,
        "expected {expected}, got {actual} (eps {eps})"
    );
}

pub(crate) fn assert_point_close(actual: Point3<f32>, expected: Point3<f32>, eps: f32) {
    assert_close(actual.x, expected.x, eps);
    assert_close(actual.y, expected.y, eps);
    assert_close(actual.z, expected.z, eps);
}

/// Little-endian float bytes of a single triangle in the XY plane.
pub(crate) fn triangle_bytes() -> Vec<u8> {
    [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
        .iter()
        .flat_map(|v| v.to_le_bytes())
        .collect()
}

/// A studio with a two-primitive `Body` (with a `Spoiler` child), and an
/// empty `Glasses` node. Every primitive reuses the triangle in buffer 0.
pub(crate) const STUDIO_GLTF: &str = r#"{
    "asset": { "version": "2.0" },
    "scene": 0,
    "scenes": [ { "name": "studio", "nodes": [0, 2] } ],
    "nodes": [
        { "name": "Body", "mesh": 0, "children": [1] },
        { "name": "Spoiler", "mesh": 1, "translation": [0.0, 1.0, 0.0] },
        { "name": "Glasses" }
    ],
    "meshes": [
        {
            "name": "body",
            "primitives": [
                { "attributes": { "POSITION": 0 }, "material": 0 },
                { "attributes": { "POSITION": 0 } }
            ]
        },
        { "name": "spoiler", "primitives": [ { "attributes": { "POSITION": 0 } } ] }
    ],
    "materials": [
        {
            "name": "paint",
            "pbrMetallicRoughness": {
                "baseColorFactor": [1.0, 0.0, 0.0, 1.0],
                "metallicFactor": 0.5,
                "roughnessFactor": 0.25
            }
        }
    ],
    "buffers": [ { "byteLength": 36, "uri": "triangle.bin" } ],
    "bufferViews": [ { "buffer": 0, "byteLength": 36 } ],
    "accessors": [
        {
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }
    ]
}"#;
