mod common;

use crate::common::test_utils::{FRAME, assert_close, assert_point_close, new_showroom, run_frames};
use showroom::{
    camera::{self, Spherical},
    cgmath::{InnerSpace, MetricSpace, Point3, Vector3},
    tween::{Easing, TRANSITION_SECONDS, TransitionSlot},
};

#[test]
fn should_land_exactly_on_annotation() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    let spoiler = showroom.annotations()[3].clone();
    assert_eq!(spoiler.title, "Spoiler");

    assert!(showroom.click_label(3));
    run_frames(&mut showroom, 50);

    assert!(!showroom.transition().is_running());
    assert_eq!(showroom.camera().position, spoiler.position);
    assert_eq!(showroom.controls().target, spoiler.target);
    assert_eq!(showroom.camera().target, spoiler.target);
}

#[test]
fn should_ease_through_midpoint() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.click_label(0);
    run_frames(&mut showroom, 20);

    assert!(showroom.transition().is_running());
    assert_point_close(showroom.camera().position, Point3::new(0.0, 4.25, 5.25), 1e-2);
    assert_point_close(showroom.controls().target, Point3::new(0.0, 0.5, 0.0), 1e-2);
}

#[test]
fn should_supersede_running_transition() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.click_label(0);
    run_frames(&mut showroom, 10);
    let midway = showroom.camera().position;

    showroom.click_label(3);
    let current = showroom.transition().current().expect("running");
    assert_eq!(current.position.start, midway);

    run_frames(&mut showroom, 50);
    assert_eq!(showroom.camera().position, Point3::new(0.0, 2.0, -4.0));
    assert_eq!(showroom.focused(), Some(3));
}

#[test]
fn should_return_home_on_reset() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.click_label(1);
    run_frames(&mut showroom, 50);
    showroom.click_reset();
    run_frames(&mut showroom, 50);

    let (home, target) = showroom.home();
    assert_eq!(showroom.camera().position, home);
    assert_eq!(showroom.controls().target, target);
    assert_eq!(showroom.focused(), None);
}

#[test]
fn should_ease_in_and_out() {
    let easing = Easing::Power3InOut;
    assert_eq!(easing.apply(0.0), 0.0);
    assert_eq!(easing.apply(1.0), 1.0);
    assert_close(easing.apply(0.5), 0.5, 1e-6);
    assert!(easing.apply(0.25) < 0.25);
    assert!(easing.apply(0.75) > 0.75);
    assert_eq!(easing.apply(2.0), 1.0);
}

#[test]
fn should_empty_slot_on_final_step() {
    let mut slot = TransitionSlot::default();
    let from = (Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0));
    let to = (Point3::new(1.0, 2.0, 3.0), Point3::new(0.0, 1.0, 0.0));
    slot.start(from, to);

    assert!(slot.step(TRANSITION_SECONDS * 0.5).is_some());
    assert!(slot.is_running());
    assert_eq!(slot.step(TRANSITION_SECONDS), Some(to));
    assert!(!slot.is_running());
    assert_eq!(slot.step(FRAME.as_secs_f32()), None);
}

#[test]
fn should_ignore_zoom() {
    let showroom = new_showroom(1200, 800, 1.0);
    let mut controls = showroom.controls().clone();
    let mut camera = *showroom.camera();

    assert!(!controls.zoom(&mut camera, 0.5));
    assert_eq!(camera.position, showroom.camera().position);
}

#[test]
fn should_orbit_at_constant_distance_when_dragged() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    let target = showroom.controls().target;
    let distance = showroom.camera().position.distance(target);

    showroom.pointer_moved(300.0, 300.0);
    showroom.pointer_pressed();
    showroom.pointer_moved(380.0, 310.0);
    assert_eq!(showroom.pointer_released(), None);
    run_frames(&mut showroom, 60);

    assert_ne!(showroom.camera().position, showroom.home().0);
    assert_close(showroom.camera().position.distance(target), distance, 1e-3);
}

#[test]
fn should_stay_above_the_floor() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.pointer_moved(300.0, 700.0);
    showroom.pointer_pressed();
    showroom.pointer_moved(300.0, 0.0);
    showroom.pointer_released();
    run_frames(&mut showroom, 100);

    assert!(showroom.camera().position.y > showroom.controls().target.y);
}

#[test]
fn should_project_target_to_screen_center() {
    let showroom = new_showroom(1200, 800, 1.0);
    let ndc = camera::project(
        showroom.camera(),
        showroom.projection(),
        showroom.controls().target,
    )
    .expect("target is in front of the camera");

    assert_close(ndc.x, 0.0, 1e-5);
    assert_close(ndc.y, 0.0, 1e-5);
    assert!(ndc.z > 0.0 && ndc.z < 1.0);
}

#[test]
fn should_round_trip_spherical_offsets() {
    let offset = Vector3::new(3.5, 2.5, 4.5);
    let back = Spherical::from_offset(offset).to_offset();
    assert_close((back - offset).magnitude(), 0.0, 1e-5);
}
