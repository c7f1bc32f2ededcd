use std::f32::consts::PI;

use cgmath::{Matrix3, Rad, Vector3};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::Texture,
    pipelines::basic::{DepthMode, mk_render_pipeline},
    resources::hdr::EnvironmentMap,
};

/// A one-sided rectangular light. Its surface spans the local X (width) and
/// Y (height) axes and it emits along local -Z.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AreaLight {
    pub color: [f32; 3],
    pub intensity: f32,
    pub width: f32,
    pub height: f32,
    /// Euler angles applied in XYZ order.
    pub rotation: [f32; 3],
    pub position: [f32; 3],
}

impl Default for AreaLight {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            intensity: 2.0,
            width: 4.0,
            height: 8.0,
            rotation: [PI / 2.0, PI, 0.0],
            position: [0.0, 3.0, 0.0],
        }
    }
}

impl AreaLight {
    fn basis(&self) -> Matrix3<f32> {
        let [x, y, z] = self.rotation;
        Matrix3::from_angle_x(Rad(x)) * Matrix3::from_angle_y(Rad(y)) * Matrix3::from_angle_z(Rad(z))
    }

    /// World-space half extents along the width and height.
    pub fn half_axes(&self) -> (Vector3<f32>, Vector3<f32>) {
        let basis = self.basis();
        (
            basis * Vector3::unit_x() * (self.width * 0.5),
            basis * Vector3::unit_y() * (self.height * 0.5),
        )
    }

    /// Direction the light shines in.
    pub fn normal(&self) -> Vector3<f32> {
        self.basis() * -Vector3::unit_z()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    position: [f32; 3],
    intensity: f32,
    color: [f32; 3],
    env_intensity: f32,
    half_width: [f32; 3],
    env_mip_count: f32,
    half_height: [f32; 3],
    // 1.0 once an environment map is bound
    env_present: f32,
    normal: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: f32,
}

impl LightUniform {
    pub fn new(light: &AreaLight, env_intensity: f32) -> Self {
        let (half_width, half_height) = light.half_axes();
        Self {
            position: light.position,
            intensity: light.intensity,
            color: light.color,
            env_intensity,
            half_width: half_width.into(),
            env_mip_count: 1.0,
            half_height: half_height.into(),
            env_present: 0.0,
            normal: light.normal().into(),
            _padding: 0.0,
        }
    }
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub environment: Texture,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        light: &AreaLight,
        env_intensity: f32,
    ) -> anyhow::Result<Self> {
        let uniform = LightUniform::new(light, env_intensity);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        // black until the HDR arrives
        let placeholder = EnvironmentMap::from_texels(1, 1, vec![[0.0, 0.0, 0.0, 1.0]])?;
        let environment = Texture::from_environment(device, queue, &placeholder);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer, &environment);
        Ok(Self {
            uniform,
            buffer,
            environment,
            bind_group,
            bind_group_layout,
        })
    }

    pub fn set_environment(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, env: &EnvironmentMap) {
        self.environment = Texture::from_environment(device, queue, env);
        self.uniform.env_mip_count = env.mip_count() as f32;
        self.uniform.env_present = 1.0;
        self.bind_group = mk_bind_group(device, &self.bind_group_layout, &self.buffer, &self.environment);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
    environment: &Texture,
) -> wgpu::BindGroup {
    let sampler = environment
        .sampler
        .clone()
        .unwrap_or_else(|| crate::data_structures::texture::create_default_sampler(device));
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&environment.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some("light_bind_group"),
    })
}

/// Draws the environment panorama behind everything, for when it is used
/// as the visible background.
pub fn mk_background_pipeline(
    device: &wgpu::Device,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
    light_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Background Pipeline Layout"),
        bind_group_layouts: &[camera_bind_group_layout, light_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Background Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("background.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        "Background Pipeline",
        &layout,
        Texture::HDR_FORMAT,
        Some(wgpu::BlendState::REPLACE),
        DepthMode::Ignore,
        &[],
        shader,
    )
}
