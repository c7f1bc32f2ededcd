//! Startup configuration.

use cgmath::Point3;
use instant::Duration;

use crate::data_structures::{material::MaterialRegistry, scene_graph::PartManifest};

#[derive(Clone, Debug)]
pub struct Config {
    pub title: String,
    pub environment_path: String,
    pub model_path: String,
    pub lut_path: String,
    pub marker_sprite_path: String,

    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
    /// Viewports narrower than this (logical pixels) use the far home pose.
    pub breakpoint: f32,
    pub home_wide: Point3<f32>,
    pub home_narrow: Point3<f32>,
    pub home_target: Point3<f32>,
    pub max_polar_degrees: f32,
    pub damping_factor: f32,

    pub max_pixel_ratio: f64,
    pub environment_intensity: f32,
    /// Also draw the environment map behind the scene instead of the clear color.
    pub environment_background: bool,
    pub clear_colour: wgpu::Color,
    /// Run bloom, grading and FXAA. When off the scene is only tone mapped.
    pub post_processing: bool,

    pub colors: MaterialRegistry,
    pub manifest: PartManifest,

    pub asset_timeout: Duration,
    /// Draw only the clear color until every asset load has settled.
    pub wait_for_assets: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Showroom".to_string(),
            environment_path: "textures/poly_haven_studio_4k.hdr".to_string(),
            model_path: "models/studio/spyder_studio.gltf".to_string(),
            lut_path: "luts/Presetpro-Cinematic.3dl".to_string(),
            marker_sprite_path: "circle.png".to_string(),
            fovy_degrees: 40.0,
            znear: 0.01,
            zfar: 1000.0,
            breakpoint: 992.0,
            home_wide: Point3::new(3.5, 2.5, 4.5),
            home_narrow: Point3::new(3.5, 5.0, 10.0),
            home_target: Point3::new(0.0, 0.0, 0.0),
            max_polar_degrees: 89.0,
            damping_factor: 0.1,
            max_pixel_ratio: 2.0,
            environment_intensity: 0.1,
            environment_background: false,
            clear_colour: wgpu::Color::WHITE,
            post_processing: true,
            colors: MaterialRegistry::default(),
            manifest: PartManifest::default(),
            asset_timeout: Duration::from_secs(30),
            wait_for_assets: false,
        }
    }
}
