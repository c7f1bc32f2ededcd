mod common;

use crate::common::test_utils::{FRAME, assert_close, new_showroom, run_frames, showroom_with};
use showroom::{
    Config, Shortcut,
    assets::{AssetKind, LoadState},
    cgmath::Vector2,
    data_structures::scene_graph::SceneNode,
    post::LutTable,
    sketch::PointerState,
};

#[test]
fn should_render_without_model() {
    let mut showroom = new_showroom(1200, 800, 1.0);

    for _ in 0..1000 {
        let plan = showroom.frame(FRAME).expect("playing");
        assert!(plan.draw_scene);
        assert!(!plan.model_present);
        assert!(!plan.environment_present);
    }
    assert_close(showroom.time(), 50.0, 1e-2);
}

#[test]
fn should_skip_frames_while_paused() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    run_frames(&mut showroom, 3);
    let time = showroom.time();

    showroom.on_shortcut(Shortcut::TogglePlay);
    assert!(!showroom.is_playing());
    assert_eq!(showroom.frame(FRAME), None);
    assert_eq!(showroom.time(), time);

    showroom.set_playing(true);
    assert!(showroom.frame(FRAME).is_some());
    assert!(showroom.time() > time);
}

#[test]
fn should_show_every_label_from_home() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    let plan = run_frames(&mut showroom, 1).expect("playing");

    assert_eq!(plan.labels.len(), 6);
    assert!(plan.labels.iter().all(|l| l.visible));
    let numbers: Vec<usize> = plan.labels.iter().map(|l| l.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    for label in &plan.labels {
        assert!(label.center.x >= 0.0 && label.center.x <= 1200.0);
        assert!(label.center.y >= 0.0 && label.center.y <= 800.0);
    }
}

#[test]
fn should_wait_for_assets_when_configured() {
    let config = Config {
        wait_for_assets: true,
        ..Config::default()
    };
    let mut showroom = showroom_with(config, 1200, 800);
    for kind in AssetKind::ALL {
        showroom.assets_mut().start(kind, "somewhere");
    }

    let plan = showroom.frame(FRAME).expect("playing");
    assert!(!plan.draw_scene);
    assert!(plan.labels.is_empty());

    showroom.attach_environment();
    showroom.attach_lut(LutTable::new(33));
    showroom
        .assets_mut()
        .finish(AssetKind::MarkerSprite, Err("404".to_string()));
    assert!(!showroom.frame(FRAME).expect("playing").draw_scene);

    showroom.attach_model(SceneNode::named("studio"));
    let plan = showroom.frame(FRAME).expect("playing");
    assert!(plan.draw_scene);
    assert!(plan.model_present);
    assert!(plan.environment_present);
    assert_eq!(
        showroom.assets().state(AssetKind::MarkerSprite),
        Some(&LoadState::Failed("404".to_string()))
    );
}

#[test]
fn should_draw_immediately_by_default() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    for kind in AssetKind::ALL {
        showroom.assets_mut().start(kind, "somewhere");
    }
    assert!(showroom.frame(FRAME).expect("playing").draw_scene);
}

#[test]
fn should_fly_to_clicked_label() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    let plan = run_frames(&mut showroom, 1).expect("playing");
    let center = plan.labels[0].center;

    showroom.pointer_moved(center.x, center.y);
    showroom.pointer_pressed();
    let clicked = showroom.pointer_released().expect("a label was hit");

    assert_eq!(showroom.focused(), Some(clicked));
    assert!(showroom.transition().is_running());
    assert!(showroom.panels().reset_visible());
}

#[test]
fn should_ignore_clicks_on_empty_space() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    run_frames(&mut showroom, 1);

    showroom.pointer_moved(1.0, 1.0);
    showroom.pointer_pressed();
    assert_eq!(showroom.pointer_released(), None);
    assert_eq!(showroom.focused(), None);
    assert!(!showroom.transition().is_running());
}

#[test]
fn should_ignore_unknown_label_shortcut() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.on_shortcut(Shortcut::Label(9));
    showroom.on_shortcut(Shortcut::Label(0));

    assert_eq!(showroom.focused(), None);
    assert!(!showroom.transition().is_running());
}

#[test]
fn should_plan_post_chain_unless_disabled() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    assert!(showroom.frame(FRAME).expect("playing").post_enabled);

    let config = Config {
        post_processing: false,
        ..Config::default()
    };
    let mut showroom = showroom_with(config, 1200, 800);
    let plan = showroom.frame(FRAME).expect("playing");
    assert!(plan.draw_scene);
    assert!(!plan.post_enabled);
}

#[test]
fn should_start_with_idle_pointer() {
    let pointer = PointerState::default();
    assert_eq!(pointer.position, None);
    assert_eq!(pointer.velocity, Vector2::new(0.0, 0.0));
    assert!(!pointer.pressed);

    let mut showroom = new_showroom(1200, 800, 1.0);
    assert_eq!(*showroom.pointer(), pointer);
    showroom.pointer_moved(10.0, 20.0);
    showroom.pointer_moved(13.0, 24.0);
    assert_eq!(showroom.pointer().velocity, Vector2::new(3.0, 4.0));
}
