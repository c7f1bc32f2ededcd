//! Per-frame GPU rendering of the showroom.
//!
//! [`Renderer`] owns every GPU object: pipelines, uniform buffers, the
//! uploaded studio meshes and the post-processing targets. Each frame it
//! reads the CPU-side [`Showroom`] state, uploads what changed and records
//!
//! 1. the scene pass into the HDR target (background, opaque, then glass)
//! 2. the post chain down to the surface, or only tone mapping when
//!    post-processing is off
//! 3. the annotation badges on top
//!

use image::DynamicImage;
use wgpu::util::DeviceExt;

use crate::{
    camera::CameraResources,
    context::Context,
    data_structures::{
        material::Part,
        model::{DrawMesh, GpuMesh, MeshData},
        scene_graph::SceneNode,
        texture::Texture,
    },
    pipelines::{
        basic::{self, MaterialResources, MaterialUniform},
        light::{self, AreaLight, LightResources},
        marker::Markers,
        post::Composer,
        transparent,
    },
    resources::{AssetMaterial, hdr::EnvironmentMap, lut::Lut3d},
    sketch::{FramePlan, Showroom},
};

/// Which material a scene primitive is drawn with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawMaterial {
    Part(Part),
    /// Index into the studio's own materials.
    Asset(usize),
    Fallback,
}

/// A part binding wins over the material authored in the file.
pub fn resolve_material(
    binding: Option<Part>,
    mesh_material: Option<usize>,
    asset_material_count: usize,
) -> DrawMaterial {
    match (binding, mesh_material) {
        (Some(part), _) => DrawMaterial::Part(part),
        (None, Some(idx)) if idx < asset_material_count => DrawMaterial::Asset(idx),
        _ => DrawMaterial::Fallback,
    }
}

#[derive(Debug)]
struct SceneDraw {
    mesh: usize,
    transform: wgpu::Buffer,
    material: DrawMaterial,
}

#[derive(Debug)]
pub struct Renderer {
    camera: CameraResources,
    light: LightResources,
    material_layout: wgpu::BindGroupLayout,
    opaque: wgpu::RenderPipeline,
    glass: wgpu::RenderPipeline,
    background: wgpu::RenderPipeline,
    white: Texture,
    parts: Vec<(Part, MaterialResources)>,
    asset_materials: Vec<MaterialResources>,
    fallback: MaterialResources,
    meshes: Vec<GpuMesh>,
    draws: Vec<SceneDraw>,
    composer: Composer,
    markers: Markers,
    environment_background: bool,
    clear_colour: wgpu::Color,
}

impl Renderer {
    pub fn new(ctx: &Context, showroom: &Showroom) -> anyhow::Result<Self> {
        let device = &ctx.device;
        let queue = &ctx.queue;
        let config = showroom.config();

        let camera = CameraResources::new(device);
        let light = LightResources::new(device, queue, &AreaLight::default(), config.environment_intensity)?;
        let material_layout = basic::material_layout(device);
        let pbr_layout = basic::mk_pbr_layout(
            device,
            &camera.bind_group_layout,
            &light.bind_group_layout,
            &material_layout,
        );
        let opaque = basic::mk_basic_pipeline(device, &pbr_layout);
        let glass = transparent::mk_transparent_pipeline(device, &pbr_layout);
        let background =
            light::mk_background_pipeline(device, &camera.bind_group_layout, &light.bind_group_layout);

        let white = Texture::create_solid(device, queue, [255, 255, 255, 255], "white texture");
        let parts = showroom
            .materials()
            .iter()
            .map(|(part, material)| {
                let resources = MaterialResources::new(
                    device,
                    &material_layout,
                    part.name(),
                    MaterialUniform::from_material(material),
                    &white,
                    material.transparent,
                );
                (part, resources)
            })
            .collect();
        let fallback = MaterialResources::new(
            device,
            &material_layout,
            "fallback",
            MaterialUniform::from_factors([1.0; 4], 0.0, 1.0),
            &white,
            false,
        );

        let composer = Composer::new(device, queue, ctx.render_format, showroom.post());
        let markers = Markers::new(device, queue, ctx.render_format, showroom.annotations().len());

        Ok(Self {
            camera,
            light,
            material_layout,
            opaque,
            glass,
            background,
            white,
            parts,
            asset_materials: Vec::new(),
            fallback,
            meshes: Vec::new(),
            draws: Vec::new(),
            composer,
            markers,
            environment_background: config.environment_background,
            clear_colour: config.clear_colour,
        })
    }

    /// Upload the studio geometry. `root` must already carry its part bindings.
    pub fn upload_studio(
        &mut self,
        ctx: &Context,
        meshes: &[MeshData],
        materials: &[AssetMaterial],
        images: &[Option<DynamicImage>],
        root: &SceneNode,
    ) {
        let device = &ctx.device;
        let queue = &ctx.queue;

        self.asset_materials = materials
            .iter()
            .enumerate()
            .map(|(idx, material)| {
                let label = material.name.clone().unwrap_or_else(|| format!("material {idx}"));
                let texture = material
                    .base_color_image
                    .and_then(|image| images.get(image)?.as_ref())
                    .and_then(|img| match Texture::from_image(device, queue, img, Some(label.as_str()), true) {
                        Ok(texture) => Some(texture),
                        Err(e) => {
                            log::warn!("{label}: base color texture skipped: {e:#}");
                            None
                        }
                    });
                MaterialResources::new(
                    device,
                    &self.material_layout,
                    &label,
                    MaterialUniform::from_factors(material.base_color_factor, material.metallic, material.roughness),
                    texture.as_ref().unwrap_or(&self.white),
                    false,
                )
            })
            .collect();

        self.meshes = meshes.iter().map(|data| GpuMesh::from_data(device, data)).collect();
        self.draws = root
            .draw_items()
            .into_iter()
            .filter(|item| self.meshes.get(item.mesh).is_some_and(|mesh| mesh.num_elements > 0))
            .map(|item| {
                let transform = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Node Transform Buffer"),
                    contents: bytemuck::cast_slice(&[item.world.to_raw()]),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                SceneDraw {
                    mesh: item.mesh,
                    transform,
                    material: resolve_material(
                        item.binding,
                        self.meshes[item.mesh].material,
                        self.asset_materials.len(),
                    ),
                }
            })
            .collect();
        log::info!("uploaded {} meshes, {} draws", self.meshes.len(), self.draws.len());
    }

    pub fn set_environment(&mut self, ctx: &Context, env: &EnvironmentMap) {
        self.light.set_environment(&ctx.device, &ctx.queue, env);
    }

    pub fn set_lut(&mut self, ctx: &Context, lut: &Lut3d, showroom: &Showroom) {
        self.composer.set_lut(&ctx.device, &ctx.queue, lut, showroom.post());
    }

    pub fn set_marker_sprite(&mut self, ctx: &Context, img: &DynamicImage) -> anyhow::Result<()> {
        self.markers.set_sprite(&ctx.device, &ctx.queue, img)
    }

    /// Follow the showroom's drawing buffer size.
    pub fn resize(&mut self, ctx: &Context, showroom: &Showroom) {
        self.composer.resize(&ctx.device, &ctx.queue, showroom.post());
    }

    fn material(&self, material: DrawMaterial) -> &MaterialResources {
        match material {
            DrawMaterial::Part(part) => self
                .parts
                .iter()
                .find(|(p, _)| *p == part)
                .map(|(_, resources)| resources)
                .unwrap_or(&self.fallback),
            DrawMaterial::Asset(idx) => self.asset_materials.get(idx).unwrap_or(&self.fallback),
            DrawMaterial::Fallback => &self.fallback,
        }
    }

    fn upload_materials(&mut self, queue: &wgpu::Queue, showroom: &mut Showroom) {
        for (part, material) in showroom.materials_mut().iter_mut() {
            if !material.dirty {
                continue;
            }
            if let Some((_, resources)) = self.parts.iter().find(|(p, _)| *p == part) {
                resources.write(queue, MaterialUniform::from_material(material));
            }
            material.mark_clean();
        }
    }

    pub fn render(
        &mut self,
        ctx: &Context,
        showroom: &mut Showroom,
        plan: &FramePlan,
    ) -> Result<(), wgpu::SurfaceError> {
        self.upload_materials(&ctx.queue, showroom);
        self.camera
            .write(&ctx.queue, showroom.camera(), showroom.projection());
        self.markers
            .write_labels(&ctx.device, &ctx.queue, &plan.labels, showroom.labels().size());

        let output = ctx.surface.get_current_texture()?;
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor {
            format: Some(ctx.render_format),
            ..Default::default()
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        if plan.draw_scene {
            self.scene_pass(&mut encoder, plan);
            if plan.post_enabled {
                self.composer.render(&mut encoder, &view);
            } else {
                self.composer.render_direct(&mut encoder, &view);
            }
            self.markers.render(&mut encoder, &view);
        } else {
            // still loading: only the clear color
            let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_colour),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
        }

        ctx.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    fn scene_pass(&self, encoder: &mut wgpu::CommandEncoder, plan: &FramePlan) {
        let mut render_pass: wgpu::RenderPass<'_> = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.composer.scene.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.composer.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
        render_pass.set_bind_group(1, &self.light.bind_group, &[]);

        if self.environment_background && plan.environment_present {
            render_pass.set_pipeline(&self.background);
            render_pass.draw(0..3, 0..1);
        }
        if !plan.model_present {
            return;
        }

        // Actual rendering:
        let (glass, opaque): (Vec<&SceneDraw>, Vec<&SceneDraw>) = self
            .draws
            .iter()
            .partition(|draw| self.material(draw.material).transparent);

        render_pass.set_pipeline(&self.opaque);
        for draw in opaque {
            render_pass.draw_mesh(
                &self.meshes[draw.mesh],
                &draw.transform,
                &self.material(draw.material).bind_group,
            );
        }

        render_pass.set_pipeline(&self.glass);
        for draw in glass {
            render_pass.draw_mesh(
                &self.meshes[draw.mesh],
                &draw.transform,
                &self.material(draw.material).bind_group,
            );
        }
    }
}
