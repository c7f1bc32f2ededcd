mod common;

use crate::common::test_utils::{assert_close, new_showroom, run_frames};
use showroom::{Config, cgmath::Point3};

#[test]
fn should_size_buffers_for_pixel_ratio_one() {
    let showroom = new_showroom(800, 600, 1.0);

    assert_close(showroom.projection().aspect, 800.0 / 600.0, 1e-6);
    assert_eq!(showroom.post().size(), [800, 600]);
    let [x, y] = showroom.post().fxaa_resolution();
    assert_close(x, 1.0 / 800.0, 1e-9);
    assert_close(y, 1.0 / 600.0, 1e-9);
}

#[test]
fn should_scale_fxaa_with_pixel_ratio() {
    let showroom = new_showroom(800, 600, 2.0);

    assert_close(showroom.projection().aspect, 800.0 / 600.0, 1e-6);
    assert_eq!(showroom.post().size(), [1600, 1200]);
    let [x, y] = showroom.post().fxaa_resolution();
    assert_close(x, 1.0 / 1600.0, 1e-9);
    assert_close(y, 1.0 / 1200.0, 1e-9);
}

#[test]
fn should_follow_resize_events() {
    let mut showroom = new_showroom(800, 600, 1.0);
    showroom.resize_with_ratio(1024, 768, 1.5);

    assert_eq!(showroom.viewport().width(), 1024);
    assert_eq!(showroom.viewport().height(), 768);
    assert_close(showroom.projection().aspect, 1024.0 / 768.0, 1e-6);
    assert_eq!(showroom.post().size(), [1536, 1152]);
    let [x, y] = showroom.post().fxaa_resolution();
    assert_close(x, 1.0 / 1536.0, 1e-9);
    assert_close(y, 1.0 / 1152.0, 1e-9);
    assert_eq!(showroom.labels().size(), (1024.0, 768.0));
}

#[test]
fn should_cap_pixel_ratio() {
    let showroom = new_showroom(800, 600, 3.0);

    assert_eq!(showroom.viewport().pixel_ratio(), 2.0);
    assert_eq!(showroom.post().size(), [1600, 1200]);
}

#[test]
fn should_treat_zero_size_as_one_pixel() {
    let mut showroom = new_showroom(800, 600, 1.0);
    showroom.resize(0, 0);

    assert_eq!(showroom.viewport().width(), 1);
    assert_eq!(showroom.viewport().height(), 1);
    assert_close(showroom.projection().aspect, 1.0, 1e-6);
    assert_eq!(showroom.post().size(), [1, 1]);
    assert!(showroom.frame(std::time::Duration::from_millis(16)).is_some());
}

#[test]
fn should_pick_home_by_breakpoint() {
    let config = Config::default();
    let wide = new_showroom(1200, 800, 1.0);
    let narrow = new_showroom(800, 800, 1.0);

    assert_eq!(wide.camera().position, config.home_wide);
    assert_eq!(narrow.camera().position, config.home_narrow);
    assert_eq!(wide.home().1, config.home_target);
}

#[test]
fn should_snap_camera_when_crossing_breakpoint() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.resize(800, 800);

    assert_eq!(showroom.camera().position, Point3::new(3.5, 5.0, 10.0));
    assert_eq!(showroom.home().0, Point3::new(3.5, 5.0, 10.0));

    showroom.resize(1200, 800);
    assert_eq!(showroom.camera().position, Point3::new(3.5, 2.5, 4.5));
}

#[test]
fn should_keep_focused_view_on_same_side_resize() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    assert!(showroom.click_label(0));
    run_frames(&mut showroom, 5);
    assert!(showroom.transition().is_running());

    showroom.resize(1100, 700);
    assert!(showroom.transition().is_running());
    assert_eq!(showroom.focused(), Some(0));
}

#[test]
fn should_cancel_transition_when_crossing_breakpoint() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    assert!(showroom.click_label(1));
    run_frames(&mut showroom, 5);

    showroom.resize(600, 800);
    assert!(!showroom.transition().is_running());
    assert_eq!(showroom.camera().position, Point3::new(3.5, 5.0, 10.0));
}
