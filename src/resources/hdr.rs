//! Equirectangular HDR environment maps.
//!
//! The panorama is decoded with the `image` crate's Radiance reader and a
//! box-filtered mip chain is built on the CPU. The shader picks a level
//! from the surface roughness, which is a cheap stand-in for a prefiltered
//! radiance map, and samples the smallest level for diffuse irradiance.

use anyhow::Context;

#[derive(Clone, Debug, PartialEq)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<[f32; 4]>,
}

impl MipLevel {
    fn at(&self, x: u32, y: u32) -> [f32; 4] {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.texels[(y * self.width + x) as usize]
    }

    /// Little-endian `Rgba16Float` bytes for texture upload.
    pub fn to_rgba16f_bytes(&self) -> Vec<u8> {
        self.texels
            .iter()
            .flat_map(|texel| texel.iter())
            .flat_map(|&v| half::f16::from_f32(v).to_le_bytes())
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentMap {
    /// Level 0 is the full-resolution panorama.
    pub levels: Vec<MipLevel>,
}

impl EnvironmentMap {
    pub fn from_texels(width: u32, height: u32, texels: Vec<[f32; 4]>) -> anyhow::Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "empty environment map");
        anyhow::ensure!(
            texels.len() == (width * height) as usize,
            "expected {} texels, found {}",
            width * height,
            texels.len()
        );
        let base = MipLevel {
            width,
            height,
            texels,
        };
        Ok(Self {
            levels: build_mip_chain(base),
        })
    }

    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    pub fn mip_count(&self) -> u32 {
        self.levels.len() as u32
    }
}

/// Decode a Radiance `.hdr` file into linear RGBA.
pub fn decode_hdr(bytes: &[u8]) -> anyhow::Result<EnvironmentMap> {
    let img = image::load_from_memory_with_format(bytes, image::ImageFormat::Hdr)
        .context("decoding Radiance HDR")?;
    let rgba = img.to_rgba32f();
    let (width, height) = rgba.dimensions();
    let texels = rgba
        .pixels()
        .map(|p| [p.0[0], p.0[1], p.0[2], 1.0])
        .collect();
    EnvironmentMap::from_texels(width, height, texels)
}

/// Halve the level until one side reaches a single texel.
pub fn build_mip_chain(base: MipLevel) -> Vec<MipLevel> {
    let mut levels = vec![base];
    loop {
        let prev = &levels[levels.len() - 1];
        if prev.width == 1 || prev.height == 1 {
            break;
        }
        let width = (prev.width / 2).max(1);
        let height = (prev.height / 2).max(1);
        let mut texels = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let samples = [
                    prev.at(2 * x, 2 * y),
                    prev.at(2 * x + 1, 2 * y),
                    prev.at(2 * x, 2 * y + 1),
                    prev.at(2 * x + 1, 2 * y + 1),
                ];
                let mut sum = [0.0f32; 4];
                for s in samples {
                    for c in 0..4 {
                        sum[c] += s[c] * 0.25;
                    }
                }
                texels.push(sum);
            }
        }
        levels.push(MipLevel {
            width,
            height,
            texels,
        });
    }
    levels
}
