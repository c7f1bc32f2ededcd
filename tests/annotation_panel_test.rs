mod common;

use crate::common::test_utils::new_showroom;
use showroom::{
    Part,
    annotation::{Annotation, LABEL_RADIUS, LabelOverlay, Panels, default_annotations},
    camera::{Camera, Projection},
    cgmath::{Deg, Point3},
};

#[test]
fn should_start_with_everything_hidden() {
    let showroom = new_showroom(1200, 800, 1.0);

    assert!(!showroom.panels().reset_visible());
    assert_eq!(showroom.panels().visible_panel(), None);
    assert_eq!(showroom.focused(), None);
}

#[test]
fn should_open_matching_panel_only() {
    let mut showroom = new_showroom(1200, 800, 1.0);

    assert!(showroom.click_label(0));
    assert!(showroom.panels().reset_visible());
    assert!(showroom.panels().is_visible(Part::Body));
    for part in Part::ALL.into_iter().filter(|p| *p != Part::Body) {
        assert!(!showroom.panels().is_visible(part), "{part} panel is open");
    }

    assert!(showroom.click_label(2));
    assert_eq!(showroom.panels().visible_panel(), Some(Part::Glass));
}

#[test]
fn should_hide_panels_for_interior() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.click_label(0);
    showroom.click_label(4);

    assert!(showroom.panels().reset_visible());
    assert_eq!(showroom.panels().visible_panel(), None);
}

#[test]
fn should_hide_everything_on_reset() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    showroom.click_label(1);
    showroom.click_reset();

    assert!(!showroom.panels().reset_visible());
    assert_eq!(showroom.panels().visible_panel(), None);
    assert_eq!(showroom.focused(), None);
    assert!(showroom.transition().is_running());
}

#[test]
fn should_ignore_out_of_range_label() {
    let mut showroom = new_showroom(1200, 800, 1.0);

    assert!(!showroom.click_label(6));
    assert!(!showroom.panels().reset_visible());
    assert!(!showroom.transition().is_running());
}

#[test]
fn should_number_annotations_in_order() {
    let titles: Vec<String> = default_annotations()
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(
        titles,
        vec!["Body", "Wheels", "Glass", "Spoiler", "Interior", "Brakes"]
    );
    assert_eq!(default_annotations()[4].part(), None);
    assert_eq!(default_annotations()[5].part(), Some(Part::Brakes));
}

#[test]
fn should_apply_panel_rules_directly() {
    let mut panels = Panels::default();
    panels.on_label_clicked(&Annotation::new("Wheels", [1.0; 3], [0.0; 3]));
    assert_eq!(panels.visible_panel(), Some(Part::Wheels));
    panels.on_reset_clicked();
    assert_eq!(panels, Panels::new());
}

fn overlay_for(annotations: &[Annotation]) -> LabelOverlay {
    let camera = Camera::new(Point3::new(0.0, 0.0, 5.0), Point3::new(0.0, 0.0, 0.0));
    let projection = Projection::new(800, 600, Deg(40.0), 0.01, 1000.0);
    let mut overlay = LabelOverlay::new(annotations.len(), 800.0, 600.0);
    overlay.update(&camera, &projection, annotations);
    overlay
}

#[test]
fn should_hit_nearest_overlapping_label() {
    let annotations = [
        Annotation::new("far", [0.0, 0.0, 9.0], [0.0, 0.0, -2.0]),
        Annotation::new("near", [0.0, 0.0, 9.0], [0.0, 0.0, 0.0]),
    ];
    let overlay = overlay_for(&annotations);

    assert!(overlay.labels().iter().all(|l| l.visible));
    assert!(overlay.labels()[1].depth < overlay.labels()[0].depth);
    assert_eq!(overlay.hit_test(400.0, 300.0), Some(1));
    assert_eq!(overlay.hit_test(400.0 + LABEL_RADIUS - 4.0, 300.0), Some(1));
    assert_eq!(overlay.hit_test(400.0 + LABEL_RADIUS + 6.0, 300.0), None);
}

#[test]
fn should_hide_labels_behind_camera() {
    let annotations = [Annotation::new("behind", [0.0; 3], [0.0, 0.0, 10.0])];
    let overlay = overlay_for(&annotations);

    assert!(!overlay.labels()[0].visible);
    assert_eq!(overlay.hit_test(400.0, 300.0), None);
}
