//! GPU side of the post-processing chain.
//!
//! Every pass is a fullscreen triangle reading the previous target:
//!
//! ```text
//! scene (HDR) -> threshold (half) -> blur h -> blur v
//! scene + blur -> output (LDR) -> lut (LDR) -> fxaa -> surface
//! ```

use wgpu::util::DeviceExt;

use crate::{
    data_structures::texture::{Texture, create_clamped_sampler},
    pipelines::basic::{DepthMode, mk_render_pipeline},
    post::{LutTable, PostChain, ToneMapping},
    resources::lut::Lut3d,
};

/// Luminance band over which the bloom high-pass fades in.
const BLOOM_SMOOTH_WIDTH: f32 = 0.01;

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PostUniform {
    pub params: [f32; 4],
    pub extra: [f32; 4],
    pub upper: [f32; 4],
}

/// Uniform values of every pass for one state of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostUniforms {
    pub threshold: PostUniform,
    pub blur_h: PostUniform,
    pub blur_v: PostUniform,
    pub output: PostUniform,
    pub lut: PostUniform,
    pub fxaa: PostUniform,
    /// Tone mapping straight to the surface when post-processing is off.
    pub direct: PostUniform,
}

impl PostUniforms {
    pub fn from_chain(chain: &PostChain) -> Self {
        let [w, h] = half_size(chain.size());
        let bloom = chain.bloom();
        let output = chain.output();
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        // without a table the grade pass is a passthrough
        let (lut_intensity, table) = match chain.lut_table() {
            Some(table) => (chain.lut_intensity(), table),
            None => (0.0, LutTable::new(2)),
        };
        let [min_r, min_g, min_b] = table.domain_min;
        let [max_r, max_g, max_b] = table.domain_max;
        let output_params = [
            output.exposure,
            flag(output.tone_mapping == ToneMapping::AcesFilmic),
            flag(output.srgb),
            bloom.strength,
        ];
        let [rx, ry] = chain.fxaa_resolution();
        Self {
            threshold: PostUniform {
                params: [bloom.threshold, BLOOM_SMOOTH_WIDTH, 0.0, 0.0],
                ..Default::default()
            },
            blur_h: PostUniform {
                params: [1.0 / w as f32, 0.0, bloom.radius, 0.0],
                ..Default::default()
            },
            blur_v: PostUniform {
                params: [0.0, 1.0 / h as f32, bloom.radius, 0.0],
                ..Default::default()
            },
            output: PostUniform {
                params: output_params,
                ..Default::default()
            },
            lut: PostUniform {
                params: [lut_intensity, table.size as f32, 0.0, 0.0],
                extra: [min_r, min_g, min_b, 0.0],
                upper: [max_r, max_g, max_b, 0.0],
            },
            fxaa: PostUniform {
                params: [rx, ry, 0.0, 0.0],
                ..Default::default()
            },
            direct: PostUniform {
                // no bloom target is rendered on this path
                params: [output_params[0], output_params[1], output_params[2], 0.0],
                ..Default::default()
            },
        }
    }
}

fn half_size(size: [u32; 2]) -> [u32; 2] {
    [(size[0] / 2).max(1), (size[1] / 2).max(1)]
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

#[derive(Debug)]
struct PostPass {
    label: &'static str,
    pipeline: wgpu::RenderPipeline,
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: Option<wgpu::BindGroup>,
}

impl PostPass {
    fn new(
        device: &wgpu::Device,
        label: &'static str,
        source: &'static str,
        format: wgpu::TextureFormat,
        extra_entries: &[wgpu::BindGroupLayoutEntry],
    ) -> Self {
        let mut entries = vec![
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture_entry(1, wgpu::TextureViewDimension::D2),
            sampler_entry(2),
        ];
        entries.extend_from_slice(extra_entries);
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            entries: &entries,
            label: Some(label),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });
        let pipeline = mk_render_pipeline(
            device,
            label,
            &pipeline_layout,
            format,
            Some(wgpu::BlendState::REPLACE),
            DepthMode::None,
            &[],
            wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            },
        );
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[PostUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        Self {
            label,
            pipeline,
            layout,
            buffer,
            bind_group: None,
        }
    }

    fn bind(
        &mut self,
        device: &wgpu::Device,
        input: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
        extra: &[wgpu::BindGroupEntry],
    ) {
        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: self.buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(input),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ];
        entries.extend_from_slice(extra);
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &self.layout,
            entries: &entries,
            label: Some(self.label),
        }));
    }

    fn write(&self, queue: &wgpu::Queue, uniform: PostUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    fn draw(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        let Some(bind_group) = &self.bind_group else {
            log::warn!("{} has no inputs bound, skipping", self.label);
            return;
        };
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}

/// Offscreen targets and passes between the scene and the surface.
#[derive(Debug)]
pub struct Composer {
    size: [u32; 2],
    pub scene: Texture,
    pub depth: Texture,
    bright: Texture,
    blur_a: Texture,
    blur_b: Texture,
    ldr_a: Texture,
    ldr_b: Texture,
    lut: Texture,
    sampler: wgpu::Sampler,
    threshold: PostPass,
    blur_h: PostPass,
    blur_v: PostPass,
    output: PostPass,
    grade: PostPass,
    fxaa: PostPass,
    direct: PostPass,
}

impl Composer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        chain: &PostChain,
    ) -> Self {
        let size = chain.size();
        let (scene, depth, bright, blur_a, blur_b, ldr_a, ldr_b) = mk_targets(device, size);
        let lut = Texture::from_lut(device, queue, &Lut3d::identity(2));

        let threshold = PostPass::new(
            device,
            "Bloom Threshold Pass",
            concat!(include_str!("fullscreen.wgsl"), include_str!("bloom_threshold.wgsl")),
            Texture::HDR_FORMAT,
            &[],
        );
        let blur_source = concat!(include_str!("fullscreen.wgsl"), include_str!("bloom_blur.wgsl"));
        let blur_h = PostPass::new(device, "Bloom Blur H Pass", blur_source, Texture::HDR_FORMAT, &[]);
        let blur_v = PostPass::new(device, "Bloom Blur V Pass", blur_source, Texture::HDR_FORMAT, &[]);
        let output_source = concat!(include_str!("fullscreen.wgsl"), include_str!("output.wgsl"));
        let output = PostPass::new(
            device,
            "Output Pass",
            output_source,
            Texture::LDR_FORMAT,
            &[texture_entry(3, wgpu::TextureViewDimension::D2)],
        );
        let direct = PostPass::new(
            device,
            "Direct Output Pass",
            output_source,
            surface_format,
            &[texture_entry(3, wgpu::TextureViewDimension::D2)],
        );
        let grade = PostPass::new(
            device,
            "LUT Pass",
            concat!(include_str!("fullscreen.wgsl"), include_str!("lut.wgsl")),
            Texture::LDR_FORMAT,
            &[texture_entry(3, wgpu::TextureViewDimension::D3), sampler_entry(4)],
        );
        let fxaa = PostPass::new(
            device,
            "FXAA Pass",
            concat!(include_str!("fullscreen.wgsl"), include_str!("fxaa.wgsl")),
            surface_format,
            &[],
        );

        let mut composer = Self {
            size,
            scene,
            depth,
            bright,
            blur_a,
            blur_b,
            ldr_a,
            ldr_b,
            lut,
            sampler: create_clamped_sampler(device),
            threshold,
            blur_h,
            blur_v,
            output,
            grade,
            fxaa,
            direct,
        };
        composer.rebind(device);
        composer.update(queue, chain);
        composer
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    /// Recreate the targets when the drawing buffer changed size.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, chain: &PostChain) {
        let size = chain.size();
        if size != self.size {
            let (scene, depth, bright, blur_a, blur_b, ldr_a, ldr_b) = mk_targets(device, size);
            self.scene = scene;
            self.depth = depth;
            self.bright = bright;
            self.blur_a = blur_a;
            self.blur_b = blur_b;
            self.ldr_a = ldr_a;
            self.ldr_b = ldr_b;
            self.size = size;
            self.rebind(device);
        }
        self.update(queue, chain);
    }

    pub fn set_lut(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, lut: &Lut3d, chain: &PostChain) {
        self.lut = Texture::from_lut(device, queue, lut);
        self.rebind(device);
        self.update(queue, chain);
    }

    pub fn update(&self, queue: &wgpu::Queue, chain: &PostChain) {
        let uniforms = PostUniforms::from_chain(chain);
        self.threshold.write(queue, uniforms.threshold);
        self.blur_h.write(queue, uniforms.blur_h);
        self.blur_v.write(queue, uniforms.blur_v);
        self.output.write(queue, uniforms.output);
        self.grade.write(queue, uniforms.lut);
        self.fxaa.write(queue, uniforms.fxaa);
        self.direct.write(queue, uniforms.direct);
    }

    fn rebind(&mut self, device: &wgpu::Device) {
        let sampler = &self.sampler;
        self.threshold.bind(device, &self.scene.view, sampler, &[]);
        self.blur_h.bind(device, &self.bright.view, sampler, &[]);
        self.blur_v.bind(device, &self.blur_a.view, sampler, &[]);
        let bloom = [wgpu::BindGroupEntry {
            binding: 3,
            resource: wgpu::BindingResource::TextureView(&self.blur_b.view),
        }];
        self.output.bind(device, &self.scene.view, sampler, &bloom);
        self.direct.bind(device, &self.scene.view, sampler, &bloom);
        let lut_sampler = self.lut.sampler.as_ref().unwrap_or(sampler);
        self.grade.bind(
            device,
            &self.ldr_a.view,
            sampler,
            &[
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.lut.view),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(lut_sampler),
                },
            ],
        );
        self.fxaa.bind(device, &self.ldr_b.view, sampler, &[]);
    }

    /// Run everything after the geometry pass, ending in `target`.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        self.threshold.draw(encoder, &self.bright.view);
        self.blur_h.draw(encoder, &self.blur_a.view);
        self.blur_v.draw(encoder, &self.blur_b.view);
        self.output.draw(encoder, &self.ldr_a.view);
        self.grade.draw(encoder, &self.ldr_b.view);
        self.fxaa.draw(encoder, target);
    }

    /// Tone map the scene straight into `target`, skipping bloom, grading and FXAA.
    pub fn render_direct(&self, encoder: &mut wgpu::CommandEncoder, target: &wgpu::TextureView) {
        self.direct.draw(encoder, target);
    }
}

#[allow(clippy::type_complexity)]
fn mk_targets(
    device: &wgpu::Device,
    size: [u32; 2],
) -> (Texture, Texture, Texture, Texture, Texture, Texture, Texture) {
    let half = half_size(size);
    (
        Texture::create_render_target(device, size, Texture::HDR_FORMAT, "scene target"),
        Texture::create_depth_texture(device, size, "depth_texture"),
        Texture::create_render_target(device, half, Texture::HDR_FORMAT, "bloom bright target"),
        Texture::create_render_target(device, half, Texture::HDR_FORMAT, "bloom blur target a"),
        Texture::create_render_target(device, half, Texture::HDR_FORMAT, "bloom blur target b"),
        Texture::create_render_target(device, size, Texture::LDR_FORMAT, "output target"),
        Texture::create_render_target(device, size, Texture::LDR_FORMAT, "graded target"),
    )
}
