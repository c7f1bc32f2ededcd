use crate::{
    data_structures::{
        instance::TransformRaw,
        model::{ModelVertex, Vertex},
        texture::Texture,
    },
    pipelines::basic::{DepthMode, mk_render_pipeline, pbr_shader},
};

/**
 * Pipeline for materials flagged transparent, i.e. the glass.
 *
 * Shares the PBR shader; the shader derives coverage from the material's
 * transmission and the view-dependent Fresnel term. Blended surfaces are
 * depth-tested against the opaque pass but do not write depth, so they must
 * be drawn after all opaque geometry.
 */
pub fn mk_transparent_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
) -> wgpu::RenderPipeline {
    mk_render_pipeline(
        device,
        "Transparent Pipeline",
        layout,
        Texture::HDR_FORMAT,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        DepthMode::ReadOnly,
        &[ModelVertex::desc(), TransformRaw::desc()],
        pbr_shader(),
    )
}
