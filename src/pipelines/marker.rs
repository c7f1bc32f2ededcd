use image::DynamicImage;
use wgpu::util::DeviceExt;

use crate::{
    annotation::{LABEL_RADIUS, Label},
    data_structures::{model::Vertex, texture::Texture},
    pipelines::basic::{DepthMode, mk_render_pipeline},
};

/// One label badge in normalized device coordinates.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarkerInstance {
    pub center: [f32; 2],
    pub half_size: [f32; 2],
    pub number: u32,
    _padding: [u32; 3],
}

impl MarkerInstance {
    /// Convert a label placed in logical pixels (origin top-left) for a
    /// viewport of `width` x `height` logical pixels.
    pub fn from_label(label: &Label, width: f32, height: f32) -> Self {
        let width = width.max(1.0);
        let height = height.max(1.0);
        Self {
            center: [
                label.center.x / width * 2.0 - 1.0,
                1.0 - label.center.y / height * 2.0,
            ],
            half_size: [LABEL_RADIUS / width * 2.0, LABEL_RADIUS / height * 2.0],
            number: label.number as u32,
            _padding: [0; 3],
        }
    }
}

impl Vertex for MarkerInstance {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<MarkerInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Uint32,
                },
            ],
        }
    }
}

/// Visible labels ordered back to front, so the nearest badge is drawn last.
pub fn marker_instances(labels: &[Label], width: f32, height: f32) -> Vec<MarkerInstance> {
    let mut visible: Vec<&Label> = labels.iter().filter(|l| l.visible).collect();
    visible.sort_by(|a, b| b.depth.total_cmp(&a.depth));
    visible
        .into_iter()
        .map(|l| MarkerInstance::from_label(l, width, height))
        .collect()
}

#[derive(Debug)]
pub struct Markers {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    count: u32,
}

impl Markers {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, format: wgpu::TextureFormat, capacity: usize) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
            label: Some("marker_bind_group_layout"),
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Marker Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });
        let pipeline = mk_render_pipeline(
            device,
            "Marker Pipeline",
            &layout,
            format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
            DepthMode::None,
            &[MarkerInstance::desc()],
            wgpu::ShaderModuleDescriptor {
                label: Some("Marker Shader"),
                source: wgpu::ShaderSource::Wgsl(include_str!("marker.wgsl").into()),
            },
        );

        // plain white disc until the sprite arrives
        let sprite = Texture::create_solid(device, queue, [255, 255, 255, 255], "marker sprite");
        let bind_group = mk_bind_group(device, &bind_group_layout, &sprite);
        let capacity = capacity.max(1);
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Marker Instance Buffer"),
            size: (capacity * std::mem::size_of::<MarkerInstance>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_group_layout,
            bind_group,
            instance_buffer,
            capacity,
            count: 0,
        }
    }

    pub fn set_sprite(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, img: &DynamicImage) -> anyhow::Result<()> {
        let sprite = Texture::from_image(device, queue, img, Some("marker sprite"), true)?;
        self.bind_group = mk_bind_group(device, &self.bind_group_layout, &sprite);
        Ok(())
    }

    pub fn write_labels(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, labels: &[Label], size: (f32, f32)) {
        let instances = marker_instances(labels, size.0, size.1);
        if instances.len() > self.capacity {
            self.capacity = instances.len();
            self.instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Marker Instance Buffer"),
                contents: bytemuck::cast_slice(&instances),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });
        } else if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }
        self.count = instances.len() as u32;
    }

    /// Draw the badges over whatever is already in `view`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, view: &wgpu::TextureView) {
        if self.count == 0 {
            return;
        }
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Marker Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.instance_buffer.slice(..));
        render_pass.draw(0..6, 0..self.count);
    }
}

fn mk_bind_group(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, sprite: &Texture) -> wgpu::BindGroup {
    let sampler = sprite
        .sampler
        .clone()
        .unwrap_or_else(|| crate::data_structures::texture::create_clamped_sampler(device));
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&sprite.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&sampler),
            },
        ],
        label: Some("marker_bind_group"),
    })
}
