//! Car part materials and the color registry that drives them.
//!
//! The registry is the single source of truth for the user-editable base
//! colors. Every [`Part`] has exactly one entry from construction on; there
//! is no API to add or remove parts. [`MaterialSet`] owns one
//! [`PbrMaterial`] per part and keeps it in sync with the registry through
//! [`MaterialSet::set_color`].

use std::{fmt, str::FromStr};

use anyhow::{Context, bail};

/// The visually distinct, user-configurable parts of the car.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    Body,
    Wheels,
    Spoiler,
    Diffusers,
    Brakes,
    Glass,
}

impl Part {
    pub const ALL: [Part; 6] = [
        Part::Body,
        Part::Wheels,
        Part::Spoiler,
        Part::Diffusers,
        Part::Brakes,
        Part::Glass,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Part::Body => "Body",
            Part::Wheels => "Wheels",
            Part::Spoiler => "Spoiler",
            Part::Diffusers => "Diffusers",
            Part::Brakes => "Brakes",
            Part::Glass => "Glass",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Part {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Part::ALL
            .into_iter()
            .find(|part| part.name().eq_ignore_ascii_case(s))
            .with_context(|| format!("unknown part {s:?}"))
    }
}

/// An 8-bit sRGB color as typed into a color picker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb` or the `#rgb` shorthand.
    pub fn from_hex(hex: &str) -> anyhow::Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("invalid color {hex:?}, expected #rrggbb");
        }
        let channel = |s: &str| {
            u8::from_str_radix(s, 16).with_context(|| format!("invalid color {hex:?}"))
        };
        match digits.len() {
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            3 => {
                let mut rgb = [0u8; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = channel(&c.to_string())?;
                    rgb[i] = v * 17;
                }
                Ok(Self::rgb(rgb[0], rgb[1], rgb[2]))
            }
            _ => bail!("invalid color {hex:?}, expected #rrggbb"),
        }
    }

    /// Linear RGB in `[0, 1]`, which is what the shaders expect.
    pub fn to_linear(&self) -> [f32; 3] {
        let decode = |c: u8| {
            let c = c as f32 / 255.0;
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        [decode(self.r), decode(self.g), decode(self.b)]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Part name to base color. Keys are fixed for the registry's lifetime.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialRegistry {
    colors: [Color; 6],
}

impl MaterialRegistry {
    pub fn new(colors: [(Part, Color); 6]) -> Self {
        let mut registry = Self::default();
        for (part, color) in colors {
            registry.colors[part.index()] = color;
        }
        registry
    }

    pub fn get(&self, part: Part) -> Color {
        self.colors[part.index()]
    }

    pub(crate) fn set(&mut self, part: Part, color: Color) {
        self.colors[part.index()] = color;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Part, Color)> + '_ {
        Part::ALL.into_iter().map(|part| (part, self.get(part)))
    }
}

impl Default for MaterialRegistry {
    fn default() -> Self {
        let dark = Color::rgb(0x26, 0x26, 0x26);
        let white = Color::rgb(0xff, 0xff, 0xff);
        Self {
            colors: [
                dark,                         // Body
                white,                        // Wheels
                dark,                         // Spoiler
                dark,                         // Diffusers
                Color::rgb(0xa1, 0xff, 0x00), // Brakes
                white,                        // Glass
            ],
        }
    }
}

/// A metallic-roughness material with the clearcoat and transmission
/// extensions the car paint and glass need.
#[derive(Clone, Debug, PartialEq)]
pub struct PbrMaterial {
    pub name: String,
    pub color: Color,
    pub metalness: f32,
    pub roughness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub transmission: f32,
    pub reflectivity: f32,
    pub transparent: bool,
    /// Set whenever a uniform-visible field changes; cleared by the renderer
    /// once the new values are on the GPU.
    pub dirty: bool,
}

impl PbrMaterial {
    fn new(name: &str, color: Color) -> Self {
        Self {
            name: name.to_string(),
            color,
            metalness: 0.0,
            roughness: 1.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            transmission: 0.0,
            reflectivity: 0.5,
            transparent: false,
            dirty: true,
        }
    }

    fn for_part(part: Part, color: Color) -> Self {
        let mut material = Self::new(part.name(), color);
        match part {
            Part::Body => {
                material.metalness = 0.8;
                material.roughness = 0.3;
                material.clearcoat = 1.0;
                material.clearcoat_roughness = 0.1;
            }
            Part::Wheels => {
                material.metalness = 1.0;
                material.roughness = 0.3;
                material.clearcoat = 0.5;
                material.clearcoat_roughness = 0.1;
            }
            Part::Spoiler | Part::Diffusers | Part::Brakes => {
                material.metalness = 0.5;
                material.roughness = 0.1;
                material.clearcoat = 0.2;
                material.clearcoat_roughness = 0.0;
            }
            Part::Glass => {
                material.metalness = 0.0;
                material.roughness = 0.0;
                material.reflectivity = 0.2;
                material.transmission = 1.0;
                material.clearcoat = 1.0;
                material.transparent = true;
            }
        }
        material
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// The registry together with the live material of every part.
#[derive(Clone, Debug)]
pub struct MaterialSet {
    registry: MaterialRegistry,
    materials: Vec<PbrMaterial>,
}

impl MaterialSet {
    /// Build one material per part, colored from `registry`.
    pub fn build(registry: MaterialRegistry) -> Self {
        let materials = Part::ALL
            .iter()
            .map(|&part| PbrMaterial::for_part(part, registry.get(part)))
            .collect();
        Self {
            registry,
            materials,
        }
    }

    pub fn registry(&self) -> &MaterialRegistry {
        &self.registry
    }

    pub fn get(&self, part: Part) -> &PbrMaterial {
        &self.materials[part.index()]
    }

    pub fn get_mut(&mut self, part: Part) -> &mut PbrMaterial {
        &mut self.materials[part.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Part, &PbrMaterial)> {
        Part::ALL.into_iter().zip(self.materials.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Part, &mut PbrMaterial)> {
        Part::ALL.into_iter().zip(self.materials.iter_mut())
    }

    /// Write `color` to the registry and to the part's material, flagging
    /// only that material for re-upload.
    pub fn set_color(&mut self, part: Part, color: Color) {
        self.registry.set(part, color);
        let material = self.get_mut(part);
        material.color = color;
        material.dirty = true;
        log::debug!("{part} color changed to {color}");
    }
}

impl Default for MaterialSet {
    fn default() -> Self {
        Self::build(MaterialRegistry::default())
    }
}

/// Colors offered when cycling a part through presets from the keyboard.
pub const SWATCHES: [Color; 8] = [
    Color::rgb(0x26, 0x26, 0x26),
    Color::rgb(0xff, 0xff, 0xff),
    Color::rgb(0xa1, 0xff, 0x00),
    Color::rgb(0xc4, 0x12, 0x1a),
    Color::rgb(0x12, 0x4e, 0xc4),
    Color::rgb(0xf2, 0xb7, 0x05),
    Color::rgb(0x8a, 0x8d, 0x91),
    Color::rgb(0x0b, 0x6e, 0x4f),
];

/// The swatch after `current`, or the first one if `current` is custom.
pub fn next_swatch(current: Color) -> Color {
    SWATCHES
        .iter()
        .position(|&c| c == current)
        .map(|i| SWATCHES[(i + 1) % SWATCHES.len()])
        .unwrap_or(SWATCHES[0])
}
