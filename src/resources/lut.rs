//! 3D color lookup tables for the grading pass.
//!
//! Two text formats are understood:
//!
//! - `.3dl` (Autodesk/Lustre): optional header lines (`3DMESH`,
//!   `Mesh 4 12`), then the first line made only of integers is the grid,
//!   followed by integer `r g b` rows with blue varying fastest. Lines that
//!   are not three numbers are skipped. Values are normalized by the
//!   smallest power of two that covers the largest entry, so 10-, 12- and
//!   16-bit tables all map to `[0, 1]`.
//! - `.cube` (Adobe/Resolve): `LUT_3D_SIZE`, optional `DOMAIN_MIN` /
//!   `DOMAIN_MAX`, then float rows with red varying fastest.
//!
//! Both are stored red-fastest (`x = r, y = g, z = b`), which is the layout
//! a 3D texture upload expects.

use std::ops::RangeInclusive;

use anyhow::{Context, bail};

use crate::post::LutTable;

/// Edge lengths accepted from a file. 256 is the smallest
/// `max_texture_dimension_3d` wgpu guarantees.
pub const LUT_SIZES: RangeInclusive<usize> = 2..=256;

#[derive(Clone, Debug, PartialEq)]
pub struct Lut3d {
    pub size: u32,
    /// `size³` RGBA texels, red fastest.
    pub data: Vec<[f32; 4]>,
    pub domain_min: [f32; 3],
    pub domain_max: [f32; 3],
}

impl Lut3d {
    /// A table that maps every color to itself.
    pub fn identity(size: u32) -> Self {
        let size = size.clamp(*LUT_SIZES.start() as u32, *LUT_SIZES.end() as u32);
        let max = (size - 1) as f32;
        let mut data = Vec::with_capacity((size * size * size) as usize);
        for b in 0..size {
            for g in 0..size {
                for r in 0..size {
                    data.push([r as f32 / max, g as f32 / max, b as f32 / max, 1.0]);
                }
            }
        }
        Self {
            size,
            data,
            domain_min: [0.0; 3],
            domain_max: [1.0; 3],
        }
    }

    /// What the grade pass needs to know about this table.
    pub fn table(&self) -> LutTable {
        LutTable {
            size: self.size,
            domain_min: self.domain_min,
            domain_max: self.domain_max,
        }
    }

    pub fn texel(&self, r: u32, g: u32, b: u32) -> [f32; 4] {
        let size = self.size as usize;
        self.data[(b as usize * size + g as usize) * size + r as usize]
    }

    /// Quantize to RGBA8 for an `Rgba8Unorm` texture.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|texel| texel.map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8))
            .collect()
    }
}

/// Pick the parser from the file extension.
pub fn parse_lut(file_name: &str, text: &str) -> anyhow::Result<Lut3d> {
    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".3dl") {
        parse_3dl(text).with_context(|| format!("parsing {file_name}"))
    } else if lower.ends_with(".cube") {
        parse_cube(text).with_context(|| format!("parsing {file_name}"))
    } else {
        bail!("unsupported LUT format: {file_name}")
    }
}

fn data_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Number of texels in a `size³` table.
fn texel_count(size: usize) -> anyhow::Result<usize> {
    if !LUT_SIZES.contains(&size) {
        bail!(
            "table size {size} outside {}..={}",
            LUT_SIZES.start(),
            LUT_SIZES.end()
        );
    }
    size.checked_pow(3).context("table size overflows")
}

fn is_grid_line(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
        && line.chars().all(|c| c.is_ascii_digit() || c.is_ascii_whitespace())
}

/// `r g b` with nothing else on the line.
fn data_row(line: &str) -> Option<[f32; 3]> {
    let mut values = line.split_whitespace().map(|token| {
        token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
            .then(|| token.parse::<f32>().ok())
            .flatten()
    });
    let row = [values.next()??, values.next()??, values.next()??];
    values.next().is_none().then_some(row)
}

pub fn parse_3dl(text: &str) -> anyhow::Result<Lut3d> {
    let mut lines = data_lines(text);
    let grid: Vec<u32> = lines
        .by_ref()
        .find(|line| is_grid_line(line))
        .context("missing grid information")?
        .split_whitespace()
        .map(str::parse::<u32>)
        .collect::<Result<_, _>>()
        .context("grid values out of range")?;
    if grid.len() < 2 {
        bail!("grid must have at least two entries, found {}", grid.len());
    }
    let step = grid[1] as i64 - grid[0] as i64;
    if grid.windows(2).any(|w| w[1] as i64 - w[0] as i64 != step) {
        bail!("inconsistent grid size");
    }
    let size = grid.len();
    let count = texel_count(size)?;

    let mut data = vec![[0.0, 0.0, 0.0, 1.0]; count];
    let mut max_value = 0.0f32;
    let mut index = 0;
    for [r, g, b] in lines.filter_map(data_row) {
        if index >= count {
            bail!("more than {count} data rows for a {size}³ grid");
        }
        max_value = max_value.max(r).max(g).max(b);
        // blue grows first, then green, then red
        let b_layer = index % size;
        let g_layer = (index / size) % size;
        let r_layer = index / (size * size);
        data[(b_layer * size + g_layer) * size + r_layer] = [r, g, b, 1.0];
        index += 1;
    }
    if index != count {
        bail!("expected {count} data rows, found {index}");
    }

    let bits = max_value.log2().ceil();
    let scale = if bits > 0.0 { 2f32.powf(bits) } else { 1.0 };
    for texel in data.iter_mut() {
        texel[0] /= scale;
        texel[1] /= scale;
        texel[2] /= scale;
    }

    Ok(Lut3d {
        size: size as u32,
        data,
        domain_min: [0.0; 3],
        domain_max: [1.0; 3],
    })
}

pub fn parse_cube(text: &str) -> anyhow::Result<Lut3d> {
    let mut size = None;
    let mut domain_min = [0.0; 3];
    let mut domain_max = [1.0; 3];
    let mut data = Vec::new();

    let triple = |rest: &[&str], line: &str| -> anyhow::Result<[f32; 3]> {
        let values: Vec<f32> = rest
            .iter()
            .map(|v| v.parse::<f32>())
            .collect::<Result<_, _>>()
            .with_context(|| format!("invalid row {line:?}"))?;
        match values.as_slice() {
            &[a, b, c] => Ok([a, b, c]),
            _ => bail!("expected three values in {line:?}"),
        }
    };

    for line in data_lines(text) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens[0] {
            "TITLE" | "LUT_1D_INPUT_RANGE" | "LUT_3D_INPUT_RANGE" => {}
            "LUT_1D_SIZE" => bail!("1D LUTs are not supported"),
            "LUT_3D_SIZE" => {
                let value = tokens.get(1).context("LUT_3D_SIZE without a value")?;
                let value = value.parse::<usize>().context("invalid LUT_3D_SIZE")?;
                texel_count(value).context("invalid LUT_3D_SIZE")?;
                size = Some(value);
            }
            "DOMAIN_MIN" => domain_min = triple(&tokens[1..], line)?,
            "DOMAIN_MAX" => domain_max = triple(&tokens[1..], line)?,
            _ => {
                let [r, g, b] = triple(&tokens, line)?;
                data.push([r, g, b, 1.0]);
            }
        }
    }

    let size = size.context("missing LUT_3D_SIZE")?;
    let count = texel_count(size)?;
    if data.len() != count {
        bail!("expected {count} data rows, found {}", data.len());
    }
    if (0..3).any(|i| domain_max[i] <= domain_min[i]) {
        bail!("DOMAIN_MAX {domain_max:?} must exceed DOMAIN_MIN {domain_min:?}");
    }
    Ok(Lut3d {
        size: size as u32,
        data,
        domain_min,
        domain_max,
    })
}
