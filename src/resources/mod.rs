/**
 * This module contains all logic for loading the studio model, the environment map and the color
 * lookup table from external files. Everything here produces CPU data only so that loads can run
 * on any task; GPU upload happens on the event-loop thread.
 */
pub mod hdr;
pub mod lut;

use std::io::{BufReader, Cursor};

use anyhow::{Context, bail};

use crate::data_structures::{
    instance::Transform,
    model::{MeshData, ModelVertex},
    scene_graph::SceneNode,
};

const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_string(file_name: &str) -> anyhow::Result<String> {
    #[cfg(target_arch = "wasm32")]
    let txt = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.text().await?
    };
    #[cfg(not(target_arch = "wasm32"))]
    let txt = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(txt)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

pub async fn load_image(file_name: &str) -> anyhow::Result<image::DynamicImage> {
    let data = load_binary(file_name).await?;
    image::load_from_memory(&data).with_context(|| format!("decoding {file_name}"))
}

pub async fn load_environment(file_name: &str) -> anyhow::Result<hdr::EnvironmentMap> {
    let data = load_binary(file_name).await?;
    hdr::decode_hdr(&data).with_context(|| format!("loading environment {file_name}"))
}

pub async fn load_lut(file_name: &str) -> anyhow::Result<lut::Lut3d> {
    let text = load_string(file_name).await?;
    lut::parse_lut(file_name, &text)
}

/// Material of a studio primitive that is not rebound to a car part.
#[derive(Clone, Debug)]
pub struct AssetMaterial {
    pub name: Option<String>,
    /// Linear RGBA.
    pub base_color_factor: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    /// Index into [`StudioAsset::images`].
    pub base_color_image: Option<usize>,
}

impl Default for AssetMaterial {
    fn default() -> Self {
        Self {
            name: None,
            base_color_factor: [1.0; 4],
            metallic: 1.0,
            roughness: 1.0,
            base_color_image: None,
        }
    }
}

/// The decoded studio: scene graph, flattened primitives and their materials.
#[derive(Debug)]
pub struct StudioAsset {
    pub root: SceneNode,
    /// One entry per glTF primitive; scene nodes index into this list.
    pub meshes: Vec<MeshData>,
    pub materials: Vec<AssetMaterial>,
    /// `None` where an image failed to decode.
    pub images: Vec<Option<image::DynamicImage>>,
}

/// Whether the raw `.gltf` or `.glb` bytes mention Draco compression.
pub fn uses_draco(bytes: &[u8]) -> bool {
    bytes
        .windows(DRACO_EXTENSION.len())
        .any(|w| w == DRACO_EXTENSION.as_bytes())
}

/// Parse the glTF document, rejecting Draco-compressed assets up front.
pub fn parse_gltf(file_name: &str, bytes: Vec<u8>) -> anyhow::Result<gltf::Gltf> {
    if uses_draco(&bytes) {
        bail!("{file_name} uses {DRACO_EXTENSION}, which this viewer cannot decode");
    }
    let reader = BufReader::new(Cursor::new(bytes));
    gltf::Gltf::from_reader(reader).with_context(|| format!("parsing {file_name}"))
}

fn relative_to(file_name: &str, uri: &str) -> String {
    match file_name.rsplit_once('/') {
        Some((dir, _)) => format!("{dir}/{uri}"),
        None => uri.to_string(),
    }
}

pub async fn load_studio(file_name: &str) -> anyhow::Result<StudioAsset> {
    let bytes = load_binary(file_name).await?;
    let gltf = parse_gltf(file_name, bytes)?;

    // Load buffers concurrently
    let buffer_data = futures::future::try_join_all(gltf.buffers().map(|buffer| {
        let blob = gltf.blob.as_deref();
        async move {
            match buffer.source() {
                gltf::buffer::Source::Bin => blob
                    .map(<[u8]>::to_vec)
                    .with_context(|| format!("{file_name} references a missing binary chunk")),
                gltf::buffer::Source::Uri(uri) => {
                    if uri.starts_with("data:") {
                        bail!("{file_name}: embedded data URIs are not supported");
                    }
                    load_binary(&relative_to(file_name, uri)).await
                }
            }
        }
    }))
    .await?;

    // Load images; a broken texture degrades to the material's flat color
    let mut images = Vec::new();
    for image in gltf.images() {
        let decoded = match image.source() {
            gltf::image::Source::View { view, mime_type } => {
                let start = view.offset();
                let end = start + view.length();
                match buffer_data[view.buffer().index()].get(start..end) {
                    Some(bytes) => decode_image(bytes, Some(mime_type)),
                    None => Err(anyhow::anyhow!("buffer view {} out of range", view.index())),
                }
            }
            gltf::image::Source::Uri { uri, mime_type } => {
                match load_binary(&relative_to(file_name, uri)).await {
                    Ok(bytes) => decode_image(&bytes, mime_type),
                    Err(e) => Err(e),
                }
            }
        };
        images.push(match decoded {
            Ok(img) => Some(img),
            Err(e) => {
                log::warn!("image {} of {file_name} skipped: {e:#}", image.index());
                None
            }
        });
    }

    let mut asset = build_studio(&gltf.document, &buffer_data)?;
    asset.images = images;
    log::info!(
        "loaded {file_name}: {} nodes, {} primitives, {} materials",
        asset.root.node_count(),
        asset.meshes.len(),
        asset.materials.len()
    );
    Ok(asset)
}

fn decode_image(bytes: &[u8], mime_type: Option<&str>) -> anyhow::Result<image::DynamicImage> {
    let img = match mime_type.and_then(image::ImageFormat::from_mime_type) {
        Some(format) => image::load_from_memory_with_format(bytes, format)?,
        None => image::load_from_memory(bytes)?,
    };
    Ok(img)
}

/// Build the scene graph and primitive list of the default scene.
///
/// The returned asset has no images; [`load_studio`] fills them in.
pub fn build_studio(
    document: &gltf::Document,
    buffer_data: &[Vec<u8>],
) -> anyhow::Result<StudioAsset> {
    let mut meshes = Vec::new();
    // first flattened primitive of every glTF mesh
    let mut mesh_offsets = Vec::new();
    for mesh in document.meshes() {
        mesh_offsets.push(meshes.len());
        for primitive in mesh.primitives() {
            meshes.push(read_primitive(&mesh, &primitive, buffer_data)?);
        }
    }

    let materials = document
        .materials()
        .map(|material| {
            let pbr = material.pbr_metallic_roughness();
            AssetMaterial {
                name: material.name().map(str::to_string),
                base_color_factor: pbr.base_color_factor(),
                metallic: pbr.metallic_factor(),
                roughness: pbr.roughness_factor(),
                base_color_image: pbr
                    .base_color_texture()
                    .map(|info| info.texture().source().index()),
            }
        })
        .collect();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .context("the glTF file contains no scene")?;
    let mut root = SceneNode::new(scene.name());
    for node in scene.nodes() {
        root.add_child(to_scene_node(&node, &mesh_offsets));
    }
    root.update_world_transforms(&Transform::new());

    Ok(StudioAsset {
        root,
        meshes,
        materials,
        images: Vec::new(),
    })
}

fn to_scene_node(node: &gltf::Node, mesh_offsets: &[usize]) -> SceneNode {
    let (t, r, s) = node.transform().decomposed();
    let mut scene_node = SceneNode::new(node.name());
    scene_node.local = Transform::from_decomposed(t, r, s);

    if let Some(mesh) = node.mesh() {
        let first = mesh_offsets[mesh.index()];
        let count = mesh.primitives().len();
        if count == 1 {
            scene_node.meshes.push(first);
        } else {
            // one unnamed child per primitive, ahead of the node's own children
            for idx in first..first + count {
                scene_node.add_child(SceneNode::new(None).with_mesh(idx));
            }
        }
    }
    for child in node.children() {
        scene_node.add_child(to_scene_node(&child, mesh_offsets));
    }
    scene_node
}

fn read_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffer_data: &[Vec<u8>],
) -> anyhow::Result<MeshData> {
    let name = format!(
        "{}#{}",
        mesh.name().unwrap_or("mesh"),
        primitive.index()
    );
    let mut data = MeshData {
        name,
        material: primitive.material().index(),
        ..Default::default()
    };
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::warn!("{}: primitive mode {:?} is not drawn", data.name, primitive.mode());
        return Ok(data);
    }

    let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
    let positions = reader
        .read_positions()
        .with_context(|| format!("{} has no positions", data.name))?;
    data.vertices = positions
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();
    if let Some(normals) = reader.read_normals() {
        for (vertex, normal) in data.vertices.iter_mut().zip(normals) {
            vertex.normal = normal;
        }
    }
    if let Some(tex_coords) = reader.read_tex_coords(0) {
        for (vertex, uv) in data.vertices.iter_mut().zip(tex_coords.into_f32()) {
            vertex.tex_coords = uv;
        }
    }
    data.indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..data.vertices.len() as u32).collect(),
    };
    data.ensure_normals();
    Ok(data)
}
