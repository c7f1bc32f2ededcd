//! Post-processing chain state.
//!
//! The scene is rendered into an HDR target and then passed through
//! bloom, tone mapping with sRGB output encoding, the color lookup table
//! and FXAA, in that order. This module only holds the parameters and sizes;
//! [`crate::pipelines::post::Composer`] owns the GPU side.

use crate::sketch::Viewport;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BloomParams {
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
}

impl Default for BloomParams {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            strength: 0.2,
            radius: 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneMapping {
    None,
    AcesFilmic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputParams {
    pub tone_mapping: ToneMapping,
    pub exposure: f32,
    pub srgb: bool,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            tone_mapping: ToneMapping::AcesFilmic,
            exposure: 1.0,
            srgb: true,
        }
    }
}

/// The attached lookup table as the grade pass samples it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LutTable {
    pub size: u32,
    /// Input colors are remapped from this box onto the table's `[0, 1]` cube.
    pub domain_min: [f32; 3],
    pub domain_max: [f32; 3],
}

impl LutTable {
    /// A table over the unit domain.
    pub fn new(size: u32) -> Self {
        Self {
            size,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stage {
    Geometry,
    Bloom(BloomParams),
    Output(OutputParams),
    Lut {
        intensity: f32,
        /// `None` passes colors through.
        table: Option<LutTable>,
    },
    Fxaa {
        /// Size of one device pixel in UV units.
        resolution: [f32; 2],
    },
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Geometry => "geometry",
            Stage::Bloom(_) => "bloom",
            Stage::Output(_) => "output",
            Stage::Lut { .. } => "lut",
            Stage::Fxaa { .. } => "fxaa",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PostChain {
    stages: Vec<Stage>,
    size: [u32; 2],
}

impl PostChain {
    pub fn new(bloom: BloomParams, output: OutputParams, viewport: &Viewport) -> Self {
        let mut chain = Self {
            stages: vec![
                Stage::Geometry,
                Stage::Bloom(bloom),
                Stage::Output(output),
                Stage::Lut {
                    intensity: 1.0,
                    table: None,
                },
                Stage::Fxaa {
                    resolution: [1.0, 1.0],
                },
            ],
            size: [1, 1],
        };
        chain.resize(viewport);
        chain
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Drawing-buffer size shared by every stage.
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Follow the viewport's drawing buffer. FXAA samples one device pixel
    /// apart, i.e. `1 / (logical size * pixel ratio)`.
    pub fn resize(&mut self, viewport: &Viewport) {
        self.size = viewport.drawing_buffer_size();
        let pr = viewport.pixel_ratio();
        let resolution = [
            (1.0 / (viewport.width() as f64 * pr)) as f32,
            (1.0 / (viewport.height() as f64 * pr)) as f32,
        ];
        for stage in self.stages.iter_mut() {
            if let Stage::Fxaa { resolution: r } = stage {
                *r = resolution;
            }
        }
    }

    pub fn bloom(&self) -> BloomParams {
        self.stages
            .iter()
            .find_map(|s| match s {
                Stage::Bloom(params) => Some(*params),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn output(&self) -> OutputParams {
        self.stages
            .iter()
            .find_map(|s| match s {
                Stage::Output(params) => Some(*params),
                _ => None,
            })
            .unwrap_or_default()
    }

    pub fn fxaa_resolution(&self) -> [f32; 2] {
        self.stages
            .iter()
            .find_map(|s| match s {
                Stage::Fxaa { resolution } => Some(*resolution),
                _ => None,
            })
            .unwrap_or([1.0, 1.0])
    }

    pub fn lut_intensity(&self) -> f32 {
        self.stages
            .iter()
            .find_map(|s| match s {
                Stage::Lut { intensity, .. } => Some(*intensity),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    pub fn lut_table(&self) -> Option<LutTable> {
        self.stages.iter().find_map(|s| match s {
            Stage::Lut { table, .. } => *table,
            _ => None,
        })
    }

    pub fn lut_table_size(&self) -> Option<u32> {
        self.lut_table().map(|table| table.size)
    }

    pub fn attach_lut(&mut self, lut: LutTable) {
        for stage in self.stages.iter_mut() {
            if let Stage::Lut { table, .. } = stage {
                *table = Some(lut);
            }
        }
    }
}
