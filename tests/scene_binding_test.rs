mod common;

use crate::common::test_utils::{STUDIO_GLTF, new_showroom, triangle_bytes};
use showroom::{
    Part,
    data_structures::scene_graph::{NodePath, PartManifest, SceneNode},
    render::{DrawMaterial, resolve_material},
    resources::{build_studio, parse_gltf, uses_draco},
};

fn full_car() -> SceneNode {
    let mut root = SceneNode::named("studio")
        .with_child(SceneNode::named("Body").with_child(SceneNode::new(None).with_mesh(0)))
        .with_child(SceneNode::named("Spoiler").with_mesh(1))
        .with_child(SceneNode::named("Diffusers").with_mesh(2))
        .with_child(SceneNode::named("Glasses").with_mesh(3));
    for (i, wheel) in ["FtL", "FtR", "BkL", "BkR"].iter().enumerate() {
        root.add_child(SceneNode::named(&format!("Spyder-wheel{wheel}")).with_mesh(4 + i));
        root.add_child(
            SceneNode::named(&format!("Spyder-wheelbrake{wheel}"))
                .with_child(SceneNode::new(None).with_mesh(8 + i)),
        );
    }
    root
}

#[test]
fn should_bind_every_default_path() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    let report = showroom.attach_model(full_car()).clone();

    assert!(report.is_complete());
    assert_eq!(report.bound.len(), 12);
    assert!(report.empty.is_empty());

    let studio = showroom.studio().expect("attached");
    let brake = studio
        .resolve(&NodePath::child("Spyder-wheelbrakeBkR", 0))
        .expect("brake primitive");
    assert_eq!(brake.binding, Some(Part::Brakes));
    let body = studio.find("Body").expect("body");
    assert_eq!(body.binding, None);
    assert_eq!(body.children[0].binding, Some(Part::Body));
}

#[test]
fn should_report_missing_spoiler() {
    let mut root = full_car();
    root.children
        .retain(|child| child.name.as_deref() != Some("Spoiler"));

    let report = PartManifest::default().bind(&mut root);

    assert!(!report.is_complete());
    assert_eq!(report.missing, vec![(Part::Spoiler, NodePath::node("Spoiler"))]);
    assert_eq!(report.bound.len(), 11);
    assert_eq!(
        root.find("Diffusers").and_then(|n| n.binding),
        Some(Part::Diffusers)
    );
}

#[test]
fn should_parse_node_paths() {
    assert_eq!(
        "Body/0".parse::<NodePath>().unwrap(),
        NodePath::child("Body", 0)
    );
    assert_eq!(
        "Glasses".parse::<NodePath>().unwrap(),
        NodePath::node("Glasses")
    );
    assert!("Body/x".parse::<NodePath>().is_err());
    assert_eq!(NodePath::child("Spyder-wheelbrakeFtL", 0).to_string(), "Spyder-wheelbrakeFtL/0");
}

#[test]
fn should_build_scene_graph_from_gltf() {
    let gltf = parse_gltf("studio.gltf", STUDIO_GLTF.as_bytes().to_vec()).expect("valid glTF");
    let mut asset = build_studio(&gltf, &[triangle_bytes()]).expect("studio builds");

    assert_eq!(asset.meshes.len(), 3);
    assert_eq!(asset.meshes[0].vertices.len(), 3);
    assert_eq!(asset.meshes[0].indices, vec![0, 1, 2]);
    assert_eq!(asset.meshes[0].material, Some(0));
    assert_eq!(asset.meshes[1].material, None);
    assert_eq!(asset.meshes[0].vertices[0].normal, [0.0, 0.0, 1.0]);

    assert_eq!(asset.materials.len(), 1);
    assert_eq!(asset.materials[0].base_color_factor, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(asset.materials[0].metallic, 0.5);
    assert_eq!(asset.materials[0].roughness, 0.25);

    // two primitives under Body, then its Spoiler child
    let body = asset.root.find("Body").expect("body node");
    assert_eq!(body.children.len(), 3);
    assert!(body.meshes.is_empty());
    assert_eq!(body.children[0].meshes, vec![0]);
    assert_eq!(body.children[1].meshes, vec![1]);

    let report = PartManifest::default().bind(&mut asset.root);
    assert_eq!(report.bound.len(), 3);
    assert_eq!(report.missing.len(), 9);
    assert_eq!(report.empty, vec![(Part::Glass, NodePath::node("Glasses"))]);

    let items = asset.root.draw_items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].binding, Some(Part::Body));
    assert_eq!(items[1].binding, None);
    assert_eq!(items[2].binding, Some(Part::Spoiler));
    assert_eq!(items[2].world.position.y, 1.0);
}

#[test]
fn should_reject_draco_compressed_models() {
    let draco = r#"{
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_draco_mesh_compression"],
        "extensionsRequired": ["KHR_draco_mesh_compression"]
    }"#;

    assert!(uses_draco(draco.as_bytes()));
    assert!(!uses_draco(STUDIO_GLTF.as_bytes()));
    let err = parse_gltf("car.gltf", draco.as_bytes().to_vec()).unwrap_err();
    assert!(format!("{err:#}").contains("KHR_draco_mesh_compression"));
}

#[test]
fn should_prefer_part_binding_over_authored_material() {
    assert_eq!(
        resolve_material(Some(Part::Body), Some(0), 1),
        DrawMaterial::Part(Part::Body)
    );
    assert_eq!(resolve_material(None, Some(0), 1), DrawMaterial::Asset(0));
    assert_eq!(resolve_material(None, Some(4), 1), DrawMaterial::Fallback);
    assert_eq!(resolve_material(None, None, 1), DrawMaterial::Fallback);
}
